use super::{TemplateMetadata, Visitor};
use crate::ast::Node;

/// Counts `{% ... %}` statements
pub struct DeclarationDetectionPlugin;

impl Visitor for DeclarationDetectionPlugin {
    fn enter(&mut self, node: &Node, metadata: &mut TemplateMetadata) -> bool {
        if matches!(node, Node::Declaration(_)) {
            metadata.declarations += 1;
        }
        true
    }
}
