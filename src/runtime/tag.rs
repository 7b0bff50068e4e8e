use super::buffer::{SafeString, escape_html};
use crate::html::{is_prefixed_attribute, is_void_element};
use serde_json::Value;

/// Attribute and component arguments, keyed by underscored name
pub type Props = serde_json::Map<String, Value>;

/// Builds primitive elements for `tag.name(...)` calls
pub trait TagBuilder {
    fn build_tag(&self, name: &str, props: &Props, content: Option<SafeString>) -> SafeString;
}

/// Renders HTML the way Rails' tag helper does
#[derive(Debug, Clone, Copy, Default)]
pub struct HtmlTagBuilder;

impl TagBuilder for HtmlTagBuilder {
    fn build_tag(&self, name: &str, props: &Props, content: Option<SafeString>) -> SafeString {
        let tag = name.replace('_', "-");
        let mut html = format!("<{}", tag);
        for (key, value) in props {
            render_attribute(&mut html, &key.replace('_', "-"), value);
        }
        html.push('>');

        if is_void_element(&tag) {
            return SafeString::new(html);
        }
        if let Some(content) = content {
            html.push_str(content.as_str());
        }
        html.push_str("</");
        html.push_str(&tag);
        html.push('>');
        SafeString::new(html)
    }
}

fn render_attribute(html: &mut String, name: &str, value: &Value) {
    match value {
        Value::Null | Value::Bool(false) => {}
        Value::Bool(true) => {
            html.push(' ');
            html.push_str(name);
        }
        Value::Object(entries) if is_prefixed_attribute(name) => {
            for (key, nested) in entries {
                let nested_name = format!("{}-{}", name, key.replace('_', "-"));
                render_attribute(html, &nested_name, nested);
            }
        }
        Value::Array(items) => {
            let tokens: Vec<String> = items
                .iter()
                .filter(|item| !matches!(item, Value::Null | Value::Bool(false)))
                .map(value_text)
                .collect();
            push_pair(html, name, &tokens.join(" "));
        }
        _ => push_pair(html, name, &value_text(value)),
    }
}

fn push_pair(html: &mut String, name: &str, value: &str) {
    html.push(' ');
    html.push_str(name);
    html.push_str("=\"");
    html.push_str(&escape_html(value));
    html.push('"');
}

fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn props(value: Value) -> Props {
        match value {
            Value::Object(map) => map,
            _ => Props::new(),
        }
    }

    #[test]
    fn test_element_with_content() {
        let html = HtmlTagBuilder.build_tag(
            "div",
            &props(json!({"class": "box"})),
            Some(SafeString::new("<b>hi</b>")),
        );
        assert_eq!(html.as_str(), r#"<div class="box"><b>hi</b></div>"#);
    }

    #[test]
    fn test_void_element_drops_content() {
        let html = HtmlTagBuilder.build_tag(
            "img",
            &props(json!({"src": "/a.png", "alt": "A \"quote\""})),
            Some(SafeString::new("ignored")),
        );
        assert_eq!(html.as_str(), r#"<img alt="A &quot;quote&quot;" src="/a.png">"#);
    }

    #[test]
    fn test_boolean_and_null_attributes() {
        let html = HtmlTagBuilder.build_tag(
            "input",
            &props(json!({"disabled": true, "checked": false, "value": null, "max_length": 3})),
            None,
        );
        assert_eq!(html.as_str(), r#"<input disabled max-length="3">"#);
    }

    #[test]
    fn test_array_and_prefixed_attributes() {
        let html = HtmlTagBuilder.build_tag(
            "custom_el",
            &props(json!({
                "class": ["btn", null, "primary"],
                "data": {"user_id": 7, "role": "admin"},
            })),
            None,
        );
        assert_eq!(
            html.as_str(),
            r#"<custom-el class="btn primary" data-role="admin" data-user-id="7"></custom-el>"#
        );
    }
}
