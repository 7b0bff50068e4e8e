use serde::Serialize;
use std::collections::BTreeSet;

/// Facts about a template collected by the analysis plugins
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TemplateMetadata {
    /// Component tag names as written, e.g. `Ui.Button`
    pub components: BTreeSet<String>,
    /// Primitive element names
    pub elements: BTreeSet<String>,
    pub declarations: usize,
    pub spreads: usize,
}

impl TemplateMetadata {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn uses_component(&self, name: &str) -> bool {
        self.components.contains(name)
    }

    pub fn uses_element(&self, name: &str) -> bool {
        self.elements.contains(name)
    }
}
