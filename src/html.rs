//! HTML vocabulary used by the runtime tag builder.

/// Void elements: rendered without content or a closing tag.
/// https://html.spec.whatwg.org/multipage/syntax.html#void-elements
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input",
    "link", "meta", "param", "source", "track", "wbr",
];

/// Attributes whose hash values expand into prefixed attributes,
/// e.g. `data: {user_id: 1}` becomes `data-user-id="1"`.
const PREFIXED_ATTRIBUTES: &[&str] = &["data", "aria"];

pub fn is_void_element(tag: &str) -> bool {
    VOID_ELEMENTS.contains(&tag.to_ascii_lowercase().as_str())
}

pub fn is_prefixed_attribute(name: &str) -> bool {
    PREFIXED_ATTRIBUTES.contains(&name)
}
