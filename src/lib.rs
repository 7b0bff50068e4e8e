//! Compiler for `.rbx` templates: JSX-style markup with embedded Ruby,
//! compiled to a Ruby program that builds the rendered output.
//!
//! ```text
//! source -> tokenize -> parse -> Template -> RubyGenerator -> Ruby
//! ```

pub mod ast;
pub mod error;
pub mod generate;
pub mod html;
pub mod names;
pub mod parser;
pub mod runtime;
pub mod transform;

pub use ast::{Attr, Node, Template, XmlAttr, XmlNode};
pub use error::{ErrorCategory, ErrorKind, ParseError, RuntimeError};
pub use generate::{GenerateOptions, Generator, RubyGenerator};
pub use parser::{MAX_NESTING, Position, RbxParser, Span, Token, TokenKind, parse, tokenize};
pub use transform::{TemplateMetadata, Transformer};

use parser::Parser;
use serde::Serialize;

/// Generated code plus what the template was found to use
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompileResult {
    pub code: String,
    pub metadata: TemplateMetadata,
}

/// Parser, analysis plugins and generator wired together
pub struct Pipeline {
    parser: Box<dyn Parser + Send + Sync>,
    transformer: Transformer,
    generator: Box<dyn Generator + Send + Sync>,
}

impl Pipeline {
    pub fn new(
        parser: impl Parser + Send + Sync + 'static,
        transformer: Transformer,
        generator: impl Generator + Send + Sync + 'static,
    ) -> Self {
        Self {
            parser: Box::new(parser),
            transformer,
            generator: Box::new(generator),
        }
    }

    /// Rbx parser, standard plugins, Ruby generator
    pub fn standard() -> Self {
        Self::new(
            RbxParser::new(),
            transform::standard_plugins(),
            RubyGenerator::new(),
        )
    }

    pub fn compile(
        &mut self,
        source: &str,
        options: &GenerateOptions,
    ) -> Result<CompileResult, ParseError> {
        let template = self.parser.parse(source)?;
        let metadata = self.transformer.analyze(&template);
        let code = self.generator.generate(&template, options);
        log::debug!(
            "compiled {} bytes of template into {} bytes of ruby",
            source.len(),
            code.len()
        );
        Ok(CompileResult { code, metadata })
    }
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::standard()
    }
}

/// Compile template source to Ruby with default options
pub fn compile(source: &str) -> Result<String, ParseError> {
    Pipeline::standard()
        .compile(source, &GenerateOptions::default())
        .map(|result| result.code)
}
