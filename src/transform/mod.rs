mod declaration_detect;
mod metadata;
mod tag_detect;

pub use declaration_detect::DeclarationDetectionPlugin;
pub use metadata::TemplateMetadata;
pub use tag_detect::TagDetectionPlugin;

use crate::ast::{Attr, Node, Template};

/// Visitor trait for read-only AST analysis
pub trait Visitor {
    /// Called before visiting children. Return `false` to skip children.
    fn enter(&mut self, _node: &Node, _metadata: &mut TemplateMetadata) -> bool {
        true
    }

    /// Called after visiting children.
    fn exit(&mut self, _node: &Node, _metadata: &mut TemplateMetadata) {}
}

/// Runs a series of analysis plugins over a template
pub struct Transformer {
    plugins: Vec<Box<dyn Visitor + Send + Sync>>,
}

impl Transformer {
    pub fn new() -> Self {
        Self {
            plugins: Vec::new(),
        }
    }

    pub fn add<V: Visitor + Send + Sync + 'static>(mut self, visitor: V) -> Self {
        self.plugins.push(Box::new(visitor));
        self
    }

    pub fn analyze(&mut self, template: &Template) -> TemplateMetadata {
        let mut metadata = TemplateMetadata::new();
        for plugin in &mut self.plugins {
            Self::visit_nodes(&template.children, plugin.as_mut(), &mut metadata);
        }
        metadata
    }

    fn visit_nodes(nodes: &[Node], visitor: &mut dyn Visitor, metadata: &mut TemplateMetadata) {
        for node in nodes {
            if visitor.enter(node, metadata) {
                match node {
                    Node::XmlNode(xml) => {
                        // Attribute values may embed markup too
                        for attr in &xml.attrs {
                            match attr {
                                Attr::Named(named) => {
                                    Self::visit_nodes(std::slice::from_ref(&*named.value), visitor, metadata)
                                }
                                Attr::Spread(group) => Self::visit_nodes(&group.statements, visitor, metadata),
                            }
                        }
                        Self::visit_nodes(&xml.children, visitor, metadata);
                    }
                    Node::ExpressionGroup(group) => {
                        Self::visit_nodes(&group.statements, visitor, metadata);
                    }
                    // Leaf nodes
                    Node::Text(_) | Node::Expression(_) | Node::Declaration(_) => {}
                }
            }
            visitor.exit(node, metadata);
        }
    }
}

impl Default for Transformer {
    fn default() -> Self {
        Self::new()
    }
}

/// Create a transformer with the standard plugins
pub fn standard_plugins() -> Transformer {
    Transformer::new()
        .add(TagDetectionPlugin)
        .add(DeclarationDetectionPlugin)
}

/// Collect metadata with the standard plugins
pub fn analyze(template: &Template) -> TemplateMetadata {
    standard_plugins().analyze(template)
}
