use serde::Serialize;
use std::fmt;

/// Markup that has already been escaped and is appended verbatim
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(transparent)]
pub struct SafeString(String);

impl SafeString {
    /// Trust `html` as already escaped
    pub fn new(html: impl Into<String>) -> Self {
        Self(html.into())
    }

    /// Escape plain text into safe markup
    pub fn escape(text: &str) -> Self {
        Self(escape_html(text))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for SafeString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<SafeString> for String {
    fn from(safe: SafeString) -> Self {
        safe.0
    }
}

/// Escape the five HTML-significant characters
pub fn escape_html(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}

/// Anything that can be appended to an output buffer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Content {
    Safe(SafeString),
    /// Plain text, escaped when appended
    Text(String),
    /// Appended in order, flattening nested lists
    List(Vec<Content>),
    Empty,
}

impl From<SafeString> for Content {
    fn from(safe: SafeString) -> Self {
        Content::Safe(safe)
    }
}

impl From<&str> for Content {
    fn from(text: &str) -> Self {
        if text.is_empty() {
            Content::Empty
        } else {
            Content::Text(text.to_string())
        }
    }
}

impl From<String> for Content {
    fn from(text: String) -> Self {
        if text.is_empty() {
            Content::Empty
        } else {
            Content::Text(text)
        }
    }
}

impl<T: Into<Content>> From<Option<T>> for Content {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(Content::Empty)
    }
}

impl<T: Into<Content>> From<Vec<T>> for Content {
    fn from(items: Vec<T>) -> Self {
        Content::List(items.into_iter().map(Into::into).collect())
    }
}

/// Accumulates rendered output for one template or tag body
#[derive(Debug, Clone, Default)]
pub struct OutputBuffer {
    html: String,
}

impl OutputBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, content: impl Into<Content>) -> &mut Self {
        self.append_content(content.into());
        self
    }

    fn append_content(&mut self, content: Content) {
        match content {
            Content::Safe(safe) => self.html.push_str(safe.as_str()),
            Content::Text(text) => self.html.push_str(&escape_html(&text)),
            Content::List(items) => {
                for item in items {
                    self.append_content(item);
                }
            }
            Content::Empty => {}
        }
    }

    pub fn is_empty(&self) -> bool {
        self.html.is_empty()
    }

    pub fn finish(self) -> SafeString {
        SafeString(self.html)
    }
}
