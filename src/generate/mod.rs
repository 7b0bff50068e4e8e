mod output;
mod ruby;

pub use output::Output;
pub use ruby::RubyGenerator;

use crate::ast::Template;
use serde::{Deserialize, Serialize};

/// Generator options
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerateOptions {
    /// Class instantiated for every output buffer
    pub buffer_class: String,
    /// Receiver of tag calls, e.g. `tag.div(...)`
    pub tag_helper: String,
    /// Prepend a definition of the buffer class
    pub prelude: bool,
}

impl Default for GenerateOptions {
    fn default() -> Self {
        Self {
            buffer_class: "OutputBuffer".to_string(),
            tag_helper: "tag".to_string(),
            prelude: false,
        }
    }
}

/// Generator trait - converts AST to code
pub trait Generator {
    fn generate(&self, template: &Template, options: &GenerateOptions) -> String;
}
