use super::{TemplateMetadata, Visitor};
use crate::ast::{Attr, Node};

/// Records which components and elements a template uses
pub struct TagDetectionPlugin;

impl Visitor for TagDetectionPlugin {
    fn enter(&mut self, node: &Node, metadata: &mut TemplateMetadata) -> bool {
        if let Node::XmlNode(xml) = node {
            if xml.is_component() {
                metadata.components.insert(xml.name.clone());
            } else {
                metadata.elements.insert(xml.name.clone());
            }
            metadata.spreads += xml
                .attrs
                .iter()
                .filter(|attr| matches!(attr, Attr::Spread(_)))
                .count();
        }
        true
    }
}
