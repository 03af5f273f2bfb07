use crate::node::{DomNode, Element};
use crate::{is_void, RAW_TEXT_ELEMENTS};

/// Output options for the markup serializer
#[derive(Debug, Clone)]
pub struct SerializeOptions {
    /// Put each element on its own line, indented by depth
    pub pretty: bool,
    pub indent: String,
}

impl Default for SerializeOptions {
    fn default() -> Self {
        Self {
            pretty: false,
            indent: "  ".to_string(),
        }
    }
}

impl SerializeOptions {
    pub fn pretty() -> Self {
        Self {
            pretty: true,
            ..Self::default()
        }
    }
}

struct Context<'a> {
    options: &'a SerializeOptions,
    depth: usize,
    buffer: String,
}

impl<'a> Context<'a> {
    fn new(options: &'a SerializeOptions) -> Self {
        Self {
            options,
            depth: 0,
            buffer: String::new(),
        }
    }

    fn add(&mut self, text: &str) {
        self.buffer.push_str(text);
    }

    fn add_indent(&mut self) {
        if !self.options.pretty {
            return;
        }
        if !self.buffer.is_empty() && !self.buffer.ends_with('\n') {
            self.buffer.push('\n');
        }
        for _ in 0..self.depth {
            self.buffer.push_str(&self.options.indent);
        }
    }

    fn indent(&mut self) {
        self.depth += 1;
    }

    fn dedent(&mut self) {
        if self.depth > 0 {
            self.depth -= 1;
        }
    }

    fn get_output(self) -> String {
        self.buffer
    }
}

/// Serialize nodes to markup
pub fn to_html(nodes: &[DomNode], options: &SerializeOptions) -> String {
    let mut ctx = Context::new(options);
    for node in nodes {
        write_node(node, &mut ctx, false);
    }
    ctx.get_output()
}

/// Serialize a single element to markup
pub fn element_to_html(element: &Element, options: &SerializeOptions) -> String {
    let mut ctx = Context::new(options);
    write_element(element, &mut ctx, false);
    ctx.get_output()
}

fn write_node(node: &DomNode, ctx: &mut Context, inline: bool) {
    match node {
        DomNode::Element(el) => write_element(el, ctx, inline),
        DomNode::Text(text) => ctx.add(&escape_text(text)),
        DomNode::Comment(content) => {
            if !inline {
                ctx.add_indent();
            }
            ctx.add("<!--");
            ctx.add(content);
            ctx.add("-->");
        }
    }
}

fn write_element(el: &Element, ctx: &mut Context, inline: bool) {
    if !inline {
        ctx.add_indent();
    }
    ctx.add("<");
    ctx.add(&el.tag);
    for (name, value) in &el.attributes {
        ctx.add(" ");
        ctx.add(name);
        if !value.is_empty() {
            ctx.add("=\"");
            ctx.add(&escape_attribute(value));
            ctx.add("\"");
        }
    }
    ctx.add(">");

    if is_void(&el.tag) {
        return;
    }

    if RAW_TEXT_ELEMENTS.contains(&el.tag.as_str()) {
        for child in &el.children {
            if let DomNode::Text(text) = child {
                ctx.add(text);
            }
        }
    } else {
        // Mixed content stays on one line so whitespace is not altered
        let has_text = el.children.iter().any(|c| matches!(c, DomNode::Text(_)));
        let child_inline = inline || has_text;
        ctx.indent();
        for child in &el.children {
            write_node(child, ctx, child_inline);
        }
        ctx.dedent();
        if !child_inline && el.children.iter().any(|c| c.as_element().is_some()) {
            ctx.add_indent();
        }
    }

    ctx.add("</");
    ctx.add(&el.tag);
    ctx.add(">");
}

pub fn escape_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '\u{a0}' => out.push_str("&nbsp;"),
            _ => out.push(ch),
        }
    }
    out
}

pub fn escape_attribute(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            '\u{a0}' => out.push_str("&nbsp;"),
            _ => out.push(ch),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse_fragment;

    #[test]
    fn test_serialize_compact() {
        let el = Element::new("p")
            .with_attr("class", "intro")
            .with_attr("hidden", "")
            .with_text("a < b & c")
            .with_child(Element::new("br"));

        assert_eq!(
            element_to_html(&el, &SerializeOptions::default()),
            r#"<p class="intro" hidden>a &lt; b &amp; c<br></p>"#
        );
    }

    #[test]
    fn test_raw_text_is_not_escaped() {
        let el = Element::new("script").with_text("if (a < b && c) {}");
        assert_eq!(
            element_to_html(&el, &SerializeOptions::default()),
            "<script>if (a < b && c) {}</script>"
        );
    }

    #[test]
    fn test_attribute_quotes_are_escaped() {
        let el = Element::new("meta").with_attr("content", r#"say "hi""#);
        assert_eq!(
            element_to_html(&el, &SerializeOptions::default()),
            r#"<meta content="say &quot;hi&quot;">"#
        );
    }

    #[test]
    fn test_pretty_output() {
        let head = Element::new("head")
            .with_child(Element::new("meta").with_attr("charset", "utf-8"))
            .with_child(Element::new("title").with_text("Doc"));

        assert_eq!(
            element_to_html(&head, &SerializeOptions::pretty()),
            "<head>\n  <meta charset=\"utf-8\">\n  <title>Doc</title>\n</head>"
        );
    }

    #[test]
    fn test_reparse_is_stable() {
        let source = r#"<section><h1 id="t">Title</h1><!--note--><p>a <em>b</em> &amp; c</p></section>"#;
        let nodes = parse_fragment(source).unwrap();
        assert_eq!(to_html(&nodes, &SerializeOptions::default()), source);
    }
}
