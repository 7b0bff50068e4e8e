pub mod tokenizer;
mod tree_builder;

pub use tokenizer::{Position, Span, Token, TokenKind, Tokenizer, tokenize};
pub use tree_builder::TreeBuilder;

use crate::ast::Template;
use crate::error::{ErrorKind, ParseError};

/// Deepest element nesting the lexer and tree builder accept
pub const MAX_NESTING: usize = 256;

/// Error for an element opened `MAX_NESTING` elements deep
fn nesting_too_deep(name: &str, open_span: Span) -> ParseError {
    ParseError::new(
        ErrorKind::NestingTooDeep,
        format!("<{}> is nested more than {} elements deep.", name, MAX_NESTING),
        open_span,
    )
    .with_help("Move part of the markup into a component.")
}

/// Parser trait - converts source code to AST
pub trait Parser {
    fn parse(&self, source: &str) -> Result<Template, ParseError>;
}

/// Rbx template parser
pub struct RbxParser {
    // Configuration only, no state
}

impl RbxParser {
    pub fn new() -> Self {
        Self {}
    }
}

impl Default for RbxParser {
    fn default() -> Self {
        Self::new()
    }
}

impl Parser for RbxParser {
    fn parse(&self, source: &str) -> Result<Template, ParseError> {
        let tokens = tokenize(source)?;
        log::debug!("tokenized {} bytes into {} tokens", source.len(), tokens.len());

        let template = parse(tokens)?;
        log::debug!("built template with {} top-level nodes", template.children.len());
        Ok(template)
    }
}

/// Build a template from a token stream
pub fn parse(tokens: Vec<Token>) -> Result<Template, ParseError> {
    TreeBuilder::new(tokens).build()
}
