//! Lenient HTML tree builder
//!
//! Not a full HTML5 tree construction algorithm. It handles what editor documents
//! contain: void elements, raw-text content, the common implied end tags and
//! unbalanced markup (stray end tags are dropped, unclosed elements are closed at
//! the end of input).

use crate::error::{MarkupError, MarkupResult};
use crate::lexer::{decode_entities, end_tag_name, parse_start_tag, Token};
use crate::node::{DomNode, Element};
use crate::{is_void, ESCAPABLE_RAW_TEXT_ELEMENTS, RAW_TEXT_ELEMENTS};
use logos::Logos;

/// Elements that implicitly close an open `<p>`
const CLOSES_PARAGRAPH: &[&str] = &[
    "address", "article", "aside", "blockquote", "details", "div", "dl", "fieldset",
    "figcaption", "figure", "footer", "form", "h1", "h2", "h3", "h4", "h5", "h6", "header",
    "hgroup", "hr", "main", "menu", "nav", "ol", "p", "pre", "search", "section", "table", "ul",
];

/// Elements whose children keep their tag and attribute case
const FOREIGN_ROOTS: &[&str] = &["svg", "math"];

/// Parse markup into a list of top-level nodes.
pub fn parse_fragment(source: &str) -> MarkupResult<Vec<DomNode>> {
    let mut builder = TreeBuilder::default();
    let mut lexer = Token::lexer(source);

    while let Some(token) = lexer.next() {
        match token {
            Ok(Token::CommentOpen) => {
                let start = lexer.span().start;
                let remainder = lexer.remainder();
                let end = remainder
                    .find("-->")
                    .ok_or_else(|| MarkupError::unterminated_comment(start))?;
                builder.append(DomNode::Comment(remainder[..end].to_string()));
                lexer.bump(end + 3);
            }
            Ok(Token::Doctype(_)) => {}
            Ok(Token::StartTag(slice)) => {
                let tag = parse_start_tag(slice, builder.in_foreign_content());
                let name = tag.name.clone();
                let is_raw = RAW_TEXT_ELEMENTS.contains(&name.as_str());
                let is_escapable = ESCAPABLE_RAW_TEXT_ELEMENTS.contains(&name.as_str());
                let element = Element {
                    tag: tag.name,
                    attributes: tag.attributes,
                    children: Vec::new(),
                };

                if tag.self_closing || is_void(&name) {
                    builder.close_implied(&name);
                    builder.append(DomNode::Element(element));
                    continue;
                }

                builder.open(element);

                if is_raw || is_escapable {
                    let start = lexer.span().end;
                    let remainder = lexer.remainder();
                    let end = find_end_tag(remainder, &name)
                        .ok_or_else(|| MarkupError::unterminated_raw_text(name.clone(), start))?;
                    let content = &remainder[..end];
                    if !content.is_empty() {
                        let text = if is_escapable {
                            decode_entities(content)
                        } else {
                            content.to_string()
                        };
                        builder.append_text(&text);
                    }
                    lexer.bump(end);
                }
            }
            Ok(Token::EndTag(slice)) => {
                let name = end_tag_name(slice, builder.in_foreign_content());
                builder.close(&name);
            }
            Ok(Token::Text(text)) => {
                builder.append_text(&decode_entities(text));
            }
            Err(()) => {
                // A `<` that does not start a tag is text
                builder.append_text(lexer.slice());
            }
        }
    }

    Ok(builder.finish())
}

/// Byte offset of `</name` (ASCII case-insensitive) in `haystack`
fn find_end_tag(haystack: &str, name: &str) -> Option<usize> {
    let lowered = haystack.to_ascii_lowercase();
    let needle = format!("</{}", name.to_ascii_lowercase());
    lowered.find(&needle)
}

#[derive(Default)]
struct TreeBuilder {
    roots: Vec<DomNode>,
    stack: Vec<Element>,
}

impl TreeBuilder {
    fn in_foreign_content(&self) -> bool {
        self.stack
            .iter()
            .any(|el| FOREIGN_ROOTS.contains(&el.tag.as_str()))
    }

    fn current_tag(&self) -> Option<&str> {
        self.stack.last().map(|el| el.tag.as_str())
    }

    fn append(&mut self, node: DomNode) {
        match self.stack.last_mut() {
            Some(parent) => parent.children.push(node),
            None => self.roots.push(node),
        }
    }

    fn append_text(&mut self, text: &str) {
        let siblings = match self.stack.last_mut() {
            Some(parent) => &mut parent.children,
            None => &mut self.roots,
        };
        match siblings.last_mut() {
            Some(DomNode::Text(existing)) => existing.push_str(text),
            _ => siblings.push(DomNode::Text(text.to_string())),
        }
    }

    fn open(&mut self, element: Element) {
        self.close_implied(&element.tag);
        self.stack.push(element);
    }

    /// Close the current element when `incoming` cannot be its child
    fn close_implied(&mut self, incoming: &str) {
        let Some(current) = self.current_tag().map(str::to_string) else {
            return;
        };
        let implied = match current.as_str() {
            "p" => CLOSES_PARAGRAPH.contains(&incoming),
            "li" => incoming == "li",
            "dt" | "dd" => incoming == "dt" || incoming == "dd",
            "tr" => incoming == "tr" || incoming == "tbody" || incoming == "tfoot",
            "td" | "th" => matches!(incoming, "td" | "th" | "tr" | "tbody" | "tfoot"),
            "option" => incoming == "option" || incoming == "optgroup",
            _ => false,
        };
        if implied {
            self.pop();
            // `<td><tr>` closes both the cell and its row
            if matches!(current.as_str(), "td" | "th") && incoming != "td" && incoming != "th" {
                self.close_implied(incoming);
            }
        }
    }

    fn pop(&mut self) {
        if let Some(element) = self.stack.pop() {
            self.append(DomNode::Element(element));
        }
    }

    fn close(&mut self, name: &str) {
        let Some(index) = self.stack.iter().rposition(|el| el.tag == name) else {
            tracing::debug!(tag = name, "ignoring stray end tag");
            return;
        };
        while self.stack.len() > index {
            self.pop();
        }
    }

    fn finish(mut self) -> Vec<DomNode> {
        if !self.stack.is_empty() {
            tracing::debug!(open = self.stack.len(), "closing unclosed elements at end of input");
        }
        while !self.stack.is_empty() {
            self.pop();
        }
        self.roots
    }
}

/// A full document split into its `<html>` attributes, `<head>` and `<body>`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedDocument {
    pub html_attrs: Vec<(String, String)>,
    pub head: Element,
    pub body: Element,
}

impl ParsedDocument {
    /// Serialize back into a full document with a doctype
    pub fn to_html(&self, options: &crate::SerializeOptions) -> String {
        let html = Element {
            tag: "html".to_string(),
            attributes: self.html_attrs.clone(),
            children: vec![
                DomNode::Element(self.head.clone()),
                DomNode::Element(self.body.clone()),
            ],
        };
        let mut out = String::from("<!DOCTYPE html>");
        if options.pretty {
            out.push('\n');
        }
        out.push_str(&crate::to_html(&[DomNode::Element(html)], options));
        out
    }
}

/// Parse a full document. Missing `<html>`, `<head>` or `<body>` elements are synthesized,
/// loose top-level content lands in the body.
pub fn parse_document(source: &str) -> MarkupResult<ParsedDocument> {
    let nodes = parse_fragment(source)?;

    let mut html_attrs = Vec::new();
    let mut top = Vec::new();
    for node in nodes {
        match node {
            DomNode::Element(el) if el.tag == "html" => {
                html_attrs = el.attributes;
                top.extend(el.children);
            }
            other => top.push(other),
        }
    }

    let mut head: Option<Element> = None;
    let mut body: Option<Element> = None;
    let mut loose = Vec::new();
    for node in top {
        match node {
            DomNode::Element(el) if el.tag == "head" && head.is_none() => head = Some(el),
            DomNode::Element(el) if el.tag == "body" && body.is_none() => body = Some(el),
            DomNode::Text(text) if text.trim().is_empty() => {}
            other => loose.push(other),
        }
    }

    let head = head.unwrap_or_else(|| Element::new("head"));
    let mut body = body.unwrap_or_else(|| Element::new("body"));
    if !loose.is_empty() {
        let mut children = loose;
        children.append(&mut body.children);
        body.children = children;
    }

    Ok(ParsedDocument {
        html_attrs,
        head,
        body,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn element(node: &DomNode) -> &Element {
        node.as_element().unwrap()
    }

    #[test]
    fn test_parse_nested_elements() {
        let nodes = parse_fragment("<p>Hello <b>world</b></p>").unwrap();
        assert_eq!(nodes.len(), 1);
        let p = element(&nodes[0]);
        assert_eq!(p.tag, "p");
        assert_eq!(p.children[0], DomNode::text("Hello "));
        assert_eq!(element(&p.children[1]).text_content(), "world");
    }

    #[test]
    fn test_void_elements_have_no_children() {
        let nodes = parse_fragment("<p>a<br>b</p>").unwrap();
        let p = element(&nodes[0]);
        assert_eq!(p.children.len(), 3);
        assert_eq!(element(&p.children[1]).tag, "br");
    }

    #[test]
    fn test_raw_text_keeps_markup() {
        let nodes = parse_fragment("<script>if (a < b) { x = '<p>'; }</script><style>p>a{}</style>").unwrap();
        assert_eq!(element(&nodes[0]).text_content(), "if (a < b) { x = '<p>'; }");
        assert_eq!(element(&nodes[1]).text_content(), "p>a{}");
    }

    #[test]
    fn test_title_decodes_entities() {
        let nodes = parse_fragment("<title>Fish &amp; <Chips></title>").unwrap();
        assert_eq!(element(&nodes[0]).text_content(), "Fish & <Chips>");
    }

    #[test]
    fn test_comments_are_preserved() {
        let nodes = parse_fragment("<!--id☛c-0♦--><p>x</p><!-- <b>not a tag</b> -->").unwrap();
        assert_eq!(nodes[0], DomNode::comment("id☛c-0♦"));
        assert_eq!(nodes[2], DomNode::comment(" <b>not a tag</b> "));
    }

    #[test]
    fn test_unterminated_comment_is_error() {
        let result = parse_fragment("<p>a</p><!-- open");
        assert_eq!(result, Err(MarkupError::UnterminatedComment { pos: 8 }));
    }

    #[test]
    fn test_stray_end_tags_and_unclosed_elements() {
        let nodes = parse_fragment("</div><section><p>text").unwrap();
        assert_eq!(nodes.len(), 1);
        let section = element(&nodes[0]);
        assert_eq!(section.tag, "section");
        assert_eq!(element(&section.children[0]).text_content(), "text");
    }

    #[test]
    fn test_implied_end_tags() {
        let nodes = parse_fragment("<ul><li>a<li>b</ul><p>one<p>two").unwrap();
        let ul = element(&nodes[0]);
        assert_eq!(ul.elements().count(), 2);
        assert_eq!(nodes.len(), 3);
    }

    #[test]
    fn test_cells_and_rows_close_implicitly() {
        let nodes = parse_fragment("<table><tr><td>a<td>b<tr><td>c</table>").unwrap();
        let table = element(&nodes[0]);
        let rows: Vec<&Element> = table.elements().collect();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].elements().count(), 2);
        assert_eq!(rows[1].text_content(), "c");
    }

    #[test]
    fn test_svg_keeps_case() {
        let nodes = parse_fragment(r#"<svg viewBox="0 0 1 1"><linearGradient gradientUnits="x"/></svg>"#).unwrap();
        let svg = element(&nodes[0]);
        assert_eq!(svg.get_attribute("viewbox"), Some("0 0 1 1"));
        let gradient = svg.elements().next().unwrap();
        assert_eq!(gradient.tag, "linearGradient");
        assert_eq!(gradient.get_attribute("gradientUnits"), Some("x"));
    }

    #[test]
    fn test_lone_angle_bracket_is_text() {
        let nodes = parse_fragment("<p>1 < 2</p>").unwrap();
        assert_eq!(element(&nodes[0]).text_content(), "1 < 2");
    }

    #[test]
    fn test_parse_document_synthesizes_parts() {
        let doc = parse_document("<!DOCTYPE html><html lang=\"de\"><head><title>T</title></head><body><p>x</p></body></html>").unwrap();
        assert_eq!(doc.html_attrs, vec![("lang".to_string(), "de".to_string())]);
        assert_eq!(doc.head.elements().next().unwrap().tag, "title");
        assert_eq!(doc.body.elements().next().unwrap().tag, "p");

        let bare = parse_document("<p>loose</p>").unwrap();
        assert!(bare.head.children.is_empty());
        assert_eq!(bare.body.text_content(), "loose");
    }
}
