//! Legacy presentation attributes upgraded to inline style

/// Deprecated attributes without a style equivalent. They are kept as they are.
pub const OTHER_DEPRECATED_ATTRIBUTES: &[&str] = &["alink", "compact", "link", "size", "value", "vlink"];

/// CSS declarations replacing a deprecated presentation attribute, or `None`
/// when `name` has no style equivalent.
pub fn deprecated_style(name: &str, value: &str) -> Option<Vec<(String, String)>> {
    let decl = |property: &str, value: &str| (property.to_string(), value.to_string());
    let decls = match name {
        "align" => vec![decl("text-align", value)],
        "background" => vec![decl("background", &format!("url({value})"))],
        "bgcolor" => vec![decl("background-color", value)],
        "border" => vec![decl("border-width", &css_length(value))],
        "clear" => vec![decl("clear", "both")],
        "height" => vec![decl("height", &css_length(value))],
        "hspace" => {
            let length = css_length(value);
            vec![decl("padding-left", &length), decl("padding-right", &length)]
        }
        "noshade" => vec![decl("border-style", "solid")],
        "nowrap" => vec![decl("white-space", "nowrap")],
        "start" => vec![decl("counter-reset", &format!("list-item {}", start_counter(value)))],
        "text" => vec![decl("color", value)],
        "type" => vec![decl("list-style-type", list_style_type(value))],
        "vspace" => {
            let length = css_length(value);
            vec![decl("padding-top", &length), decl("padding-bottom", &length)]
        }
        "width" => vec![decl("width", &css_length(value))],
        _ => return None,
    };
    Some(decls)
}

/// Bare numbers in legacy attributes are pixels
fn css_length(value: &str) -> String {
    let trimmed = value.trim();
    if !trimmed.is_empty() && trimmed.chars().all(|c| c.is_ascii_digit() || c == '.') {
        format!("{trimmed}px")
    } else {
        trimmed.to_string()
    }
}

/// `start="3"` means the first item shows 3, so the counter starts one lower
fn start_counter(value: &str) -> String {
    match value.trim().parse::<i64>() {
        Ok(start) => (start - 1).to_string(),
        Err(_) => value.trim().to_string(),
    }
}

fn list_style_type(value: &str) -> &str {
    match value {
        "1" => "decimal",
        "a" => "lower-alpha",
        "A" => "upper-alpha",
        "i" => "lower-roman",
        "I" => "upper-roman",
        other => other,
    }
}

/// Append declarations to an existing inline style
pub fn merge_style(existing: &str, declarations: &[(String, String)]) -> String {
    let mut parts: Vec<String> = existing
        .split(';')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(str::to_string)
        .collect();
    for (property, value) in declarations {
        parts.push(format!("{property}: {value}"));
    }
    parts.join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lengths_get_units() {
        assert_eq!(
            deprecated_style("hspace", "4"),
            Some(vec![
                ("padding-left".to_string(), "4px".to_string()),
                ("padding-right".to_string(), "4px".to_string()),
            ])
        );
        assert_eq!(
            deprecated_style("width", "50%"),
            Some(vec![("width".to_string(), "50%".to_string())])
        );
    }

    #[test]
    fn test_list_attributes() {
        assert_eq!(
            deprecated_style("type", "I"),
            Some(vec![("list-style-type".to_string(), "upper-roman".to_string())])
        );
        assert_eq!(
            deprecated_style("start", "3"),
            Some(vec![("counter-reset".to_string(), "list-item 2".to_string())])
        );
    }

    #[test]
    fn test_other_deprecated_pass_through() {
        for name in OTHER_DEPRECATED_ATTRIBUTES {
            assert_eq!(deprecated_style(name, "x"), None);
        }
    }

    #[test]
    fn test_merge_style() {
        let decls = vec![("color".to_string(), "red".to_string())];
        assert_eq!(merge_style("margin: 0;", &decls), "margin: 0; color: red");
        assert_eq!(merge_style("", &decls), "color: red");
    }
}
