use crate::parser::tokenizer::Span;
use std::fmt;

/// Kind of compile error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    UnterminatedExpression,
    UnterminatedDeclaration,
    UnterminatedString,
    UnterminatedTag,
    InvalidTagName,
    UnclosedTag,
    MismatchedCloseTag,
    UnexpectedCloseTag,
    MalformedAttribute,
    DuplicateAttribute,
    UnexpectedToken,
    NestingTooDeep,
}

/// Which stage of the front end rejected the source
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Raised while splitting source into tokens
    Lexical,
    /// Raised while matching tags and building the tree
    Structural,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::UnterminatedExpression => "Unterminated expression",
            ErrorKind::UnterminatedDeclaration => "Unterminated declaration",
            ErrorKind::UnterminatedString => "Unterminated string",
            ErrorKind::UnterminatedTag => "Unterminated tag",
            ErrorKind::InvalidTagName => "Invalid tag name",
            ErrorKind::UnclosedTag => "Unclosed tag",
            ErrorKind::MismatchedCloseTag => "Mismatched close tag",
            ErrorKind::UnexpectedCloseTag => "Unexpected close tag",
            ErrorKind::MalformedAttribute => "Malformed attribute",
            ErrorKind::DuplicateAttribute => "Duplicate attribute",
            ErrorKind::UnexpectedToken => "Unexpected token",
            ErrorKind::NestingTooDeep => "Nesting too deep",
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            ErrorKind::UnterminatedExpression
            | ErrorKind::UnterminatedDeclaration
            | ErrorKind::UnterminatedString
            | ErrorKind::UnterminatedTag
            | ErrorKind::InvalidTagName => ErrorCategory::Lexical,
            ErrorKind::UnclosedTag
            | ErrorKind::MismatchedCloseTag
            | ErrorKind::UnexpectedCloseTag
            | ErrorKind::MalformedAttribute
            | ErrorKind::DuplicateAttribute
            | ErrorKind::UnexpectedToken
            | ErrorKind::NestingTooDeep => ErrorCategory::Structural,
        }
    }
}

/// Error raised while lexing or parsing a template
#[derive(Debug, Clone, PartialEq)]
pub struct ParseError {
    pub kind: ErrorKind,
    pub message: String,
    pub span: Span,
    pub related_span: Option<Span>,
    pub related_label: Option<String>,
    pub help: Option<String>,
}

impl ParseError {
    /// Create a new parse error
    pub fn new(kind: ErrorKind, message: impl Into<String>, span: Span) -> Self {
        Self {
            kind,
            message: message.into(),
            span,
            related_span: None,
            related_label: None,
            help: None,
        }
    }

    /// Add a related span (e.g. where the unclosed tag was opened)
    pub fn with_related(mut self, span: Span) -> Self {
        self.related_span = Some(span);
        self
    }

    /// Set the label for the related span
    pub fn with_related_label(mut self, label: impl Into<String>) -> Self {
        self.related_label = Some(label.into());
        self
    }

    /// Add help text
    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }

    pub fn category(&self) -> ErrorCategory {
        self.kind.category()
    }

    /// Render the error with source context
    pub fn render(&self, source: &str, filename: &str) -> String {
        self.render_inner(source, filename, false)
    }

    /// Render the error with ANSI color codes
    pub fn render_color(&self, source: &str, filename: &str) -> String {
        self.render_inner(source, filename, true)
    }

    fn render_inner(&self, source: &str, filename: &str, color: bool) -> String {
        let red = if color { "\x1b[1;31m" } else { "" };
        let dim = if color { "\x1b[2m" } else { "" };
        let underline = if color { "\x1b[4m" } else { "" };
        let cyan = if color { "\x1b[1;38;5;73m" } else { "" };
        let reset = if color { "\x1b[0m" } else { "" };

        let mut output = String::new();
        output.push('\n');

        let location = format!(
            "{}:{}:{}",
            filename,
            self.span.start.line + 1,
            self.span.start.col + 1
        );
        if color {
            // OSC 8 hyperlink
            let abs_path = std::path::Path::new(filename)
                .canonicalize()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|_| filename.to_string());
            output.push_str(&format!(
                " {}file:{} \x1b]8;;file://{}\x07{}{}{}\x1b]8;;\x07\n",
                dim, reset, abs_path, underline, location, reset
            ));
        } else {
            output.push_str(&format!(" file: {}\n", location));
        }

        output.push_str(&format!(
            "{}error[{}]:{} {}\n",
            red,
            self.kind.as_str(),
            reset,
            self.message
        ));

        let width = self
            .related_span
            .iter()
            .chain(std::iter::once(&self.span))
            .map(|span| (span.start.line + 1).to_string().len())
            .max()
            .unwrap_or(1)
            .max(2);

        // Related span comes first when it precedes the error, as an opened tag does
        let mut snippets = vec![(self.span, None)];
        if let Some(related) = self.related_span {
            let label = self.related_label.as_deref().unwrap_or("opened here");
            if related.start.byte <= self.span.start.byte {
                snippets.insert(0, (related, Some(label)));
            } else {
                snippets.push((related, Some(label)));
            }
        }

        output.push_str(&format!("{}{:>width$} |{}\n", dim, "", reset, width = width));
        for (span, label) in snippets {
            let Some(source_line) = source.lines().nth(span.start.line) else {
                continue;
            };
            let shown = if color {
                highlight_markup(source_line)
            } else {
                source_line.to_string()
            };
            output.push_str(&format!(
                "{}{:>width$} |{} {}\n",
                dim,
                span.start.line + 1,
                reset,
                shown,
                width = width
            ));

            let start = span.start.col;
            let len = if span.end.line == span.start.line {
                span.end.col.saturating_sub(start).max(1)
            } else {
                source_line.chars().count().saturating_sub(start).max(1)
            };
            let spaces = " ".repeat(start);
            let carets = "^".repeat(len);
            match label {
                Some(label) => output.push_str(&format!(
                    "{}{:>width$} |{} {}{}{} {}{}\n",
                    dim, "", reset, spaces, dim, carets, label, reset,
                    width = width
                )),
                None => output.push_str(&format!(
                    "{}{:>width$} |{} {}{}{}{}\n",
                    dim, "", reset, spaces, red, carets, reset,
                    width = width
                )),
            }
        }

        if let Some(ref help) = self.help {
            output.push('\n');
            for (i, help_line) in help.lines().enumerate() {
                if i == 0 {
                    output.push_str(&format!(" {}help:{} {}\n", cyan, reset, help_line));
                } else {
                    output.push_str(&format!("       {}\n", help_line));
                }
            }
        }

        output.push('\n');
        output
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ParseError {}

/// Error raised while rendering compiled templates
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RuntimeError {
    #[error("no parent context `{name}`")]
    ContextNotFound { name: String },
    #[error("no component registered as `{name}`")]
    UnknownComponent { name: String },
    #[error("{0}")]
    Host(String),
}

/// Color tag names and expression braces in a source line
fn highlight_markup(line: &str) -> String {
    const TAG: &str = "\x1b[38;5;180m";
    const EXPR: &str = "\x1b[38;5;72m";
    const RESET: &str = "\x1b[0m";

    let mut result = String::with_capacity(line.len() * 2);
    let mut chars = line.chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            '<' if chars
                .peek()
                .is_some_and(|c| c.is_ascii_alphabetic() || *c == '/') =>
            {
                result.push_str(TAG);
                result.push('<');
                while let Some(&c) = chars.peek() {
                    if c.is_ascii_alphanumeric() || matches!(c, '/' | '.' | '-' | '_') {
                        result.push(c);
                        chars.next();
                    } else {
                        break;
                    }
                }
                result.push_str(RESET);
            }
            '>' => {
                result.push_str(TAG);
                result.push('>');
                result.push_str(RESET);
            }
            '{' | '}' => {
                result.push_str(EXPR);
                result.push(ch);
                result.push_str(RESET);
            }
            _ => result.push(ch),
        }
    }
    result
}
