//! Markup lexer using logos
//!
//! Only the coarse structure is tokenized here: tags, comment openers, doctypes and
//! text runs. Comment bodies and raw-text element content are scanned by the parser
//! directly from the lexer's remainder, since their terminators are not regular
//! with respect to the surrounding grammar.

use logos::Logos;

#[derive(Logos, Debug, Clone, PartialEq, Eq)]
pub enum Token<'src> {
    #[token("<!--")]
    CommentOpen,

    #[regex(r"<![dD][oO][cC][tT][yY][pP][eE][^>]*>", |lex| lex.slice())]
    Doctype(&'src str),

    #[regex(r#"<[a-zA-Z][a-zA-Z0-9:_.\-]*([^>"']|"[^"]*"|'[^']*')*>"#, |lex| lex.slice())]
    StartTag(&'src str),

    #[regex(r"</[a-zA-Z][a-zA-Z0-9:_.\-]*[ \t\r\n]*>", |lex| lex.slice())]
    EndTag(&'src str),

    #[regex(r"[^<]+", |lex| lex.slice())]
    Text(&'src str),
}

/// A start tag broken into its parts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartTag {
    pub name: String,
    pub attributes: Vec<(String, String)>,
    pub self_closing: bool,
}

/// Split a start tag slice (`<name a="b" c>`) into name and attributes.
///
/// Tag and attribute names are lowercased, except inside foreign (SVG) content where
/// the caller keeps case by passing `preserve_case`.
pub fn parse_start_tag(slice: &str, preserve_case: bool) -> StartTag {
    let inner = slice
        .strip_prefix('<')
        .unwrap_or(slice)
        .strip_suffix('>')
        .unwrap_or(slice);
    let (inner, self_closing) = match inner.strip_suffix('/') {
        Some(rest) => (rest, true),
        None => (inner, false),
    };

    let chars: Vec<char> = inner.chars().collect();
    let mut i = 0;
    while i < chars.len() && !chars[i].is_whitespace() {
        i += 1;
    }
    let raw_name: String = chars[..i].iter().collect();
    let name = normalize_name(&raw_name, preserve_case);

    let mut attributes: Vec<(String, String)> = Vec::new();
    loop {
        while i < chars.len() && chars[i].is_whitespace() {
            i += 1;
        }
        if i >= chars.len() {
            break;
        }

        let start = i;
        while i < chars.len() && !chars[i].is_whitespace() && chars[i] != '=' {
            i += 1;
        }
        let attr_name: String = chars[start..i].iter().collect();

        while i < chars.len() && chars[i].is_whitespace() {
            i += 1;
        }

        let mut value = String::new();
        if i < chars.len() && chars[i] == '=' {
            i += 1;
            while i < chars.len() && chars[i].is_whitespace() {
                i += 1;
            }
            if i < chars.len() && (chars[i] == '"' || chars[i] == '\'') {
                let quote = chars[i];
                i += 1;
                let value_start = i;
                while i < chars.len() && chars[i] != quote {
                    i += 1;
                }
                value = chars[value_start..i].iter().collect();
                i += 1;
            } else {
                let value_start = i;
                while i < chars.len() && !chars[i].is_whitespace() {
                    i += 1;
                }
                value = chars[value_start..i].iter().collect();
            }
        }

        if attr_name.is_empty() {
            i += 1;
            continue;
        }
        let attr_name = normalize_name(&attr_name, preserve_case);
        // First occurrence wins, as in browsers
        if !attributes.iter().any(|(k, _)| *k == attr_name) {
            attributes.push((attr_name, decode_entities(&value)));
        }
    }

    StartTag {
        name,
        attributes,
        self_closing,
    }
}

/// Name of an end tag slice (`</name >`)
pub fn end_tag_name(slice: &str, preserve_case: bool) -> String {
    let name = slice
        .trim_start_matches("</")
        .trim_end_matches('>')
        .trim();
    normalize_name(name, preserve_case)
}

fn normalize_name(name: &str, preserve_case: bool) -> String {
    if preserve_case {
        name.to_string()
    } else {
        name.to_ascii_lowercase()
    }
}

/// Decode the character references that matter for round-tripping editor markup.
pub fn decode_entities(text: &str) -> String {
    if !text.contains('&') {
        return text.to_string();
    }

    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let candidate = &rest[amp..];
        match candidate.find(';') {
            Some(semi) if semi <= 10 => {
                let entity = &candidate[1..semi];
                match decode_entity(entity) {
                    Some(ch) => {
                        out.push(ch);
                        rest = &candidate[semi + 1..];
                    }
                    None => {
                        out.push('&');
                        rest = &candidate[1..];
                    }
                }
            }
            _ => {
                out.push('&');
                rest = &candidate[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

fn decode_entity(entity: &str) -> Option<char> {
    match entity {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        "nbsp" => Some('\u{a0}'),
        _ => {
            let number = entity.strip_prefix('#')?;
            let code = match number.strip_prefix(['x', 'X']) {
                Some(hex) => u32::from_str_radix(hex, 16).ok()?,
                None => number.parse::<u32>().ok()?,
            };
            char::from_u32(code)
        }
    }
}
