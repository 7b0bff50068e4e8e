//! Name and literal normalization for generated Ruby.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref ACRONYM_BOUNDARY: Regex = Regex::new(r"([A-Z\d]+)([A-Z][a-z])").unwrap();
    static ref CAMEL_BOUNDARY: Regex = Regex::new(r"([a-z\d])([A-Z])").unwrap();
    static ref SYMBOL_LABEL: Regex = Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*[?!]?$").unwrap();
}

/// Escape text for a double-quoted Ruby string literal
pub fn escape_string(s: &str) -> String {
    let mut escaped = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            '\\' => escaped.push_str("\\\\"),
            '"' => escaped.push_str("\\\""),
            '\n' => escaped.push_str("\\n"),
            '\r' => escaped.push_str("\\r"),
            '\t' => escaped.push_str("\\t"),
            // #{...}, #@ivar and #$global would interpolate
            '#' if matches!(chars.peek(), Some('{' | '@' | '$')) => escaped.push_str("\\#"),
            _ => escaped.push(ch),
        }
    }
    escaped
}

/// Quote text as a Ruby string literal
pub fn string_literal(s: &str) -> String {
    format!("\"{}\"", escape_string(s))
}

/// Tag name usable as a Ruby method name: `Ui.Button` -> `Ui__Button`
pub fn safe_tag_name(name: &str) -> String {
    name.replace('.', "__").replace('-', "_")
}

/// Rails-style underscore: `ariaLabel` -> `aria_label`, `HTMLClass` -> `html_class`
pub fn underscore(name: &str) -> String {
    let word = name.replace("::", "/");
    let word = ACRONYM_BOUNDARY.replace_all(&word, "${1}_${2}");
    let word = CAMEL_BOUNDARY.replace_all(&word, "${1}_${2}");
    word.replace('-', "_").to_lowercase()
}

/// Keyword-argument key for an attribute, colon included.
///
/// Keys that are not plain labels are quoted, e.g. `"x_on:click":`.
pub fn attribute_key(name: &str) -> String {
    let key = underscore(name);
    if SYMBOL_LABEL.is_match(&key) {
        format!("{}:", key)
    } else {
        format!("{}:", string_literal(&key))
    }
}
