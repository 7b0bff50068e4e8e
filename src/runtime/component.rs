use super::Runtime;
use super::buffer::SafeString;
use super::tag::Props;
use crate::error::RuntimeError;
use std::collections::HashMap;
use std::sync::Arc;

/// Deferred rendering of a tag's children.
///
/// Like the block passed to `tag.name(...) do ... end`, content runs only
/// when the receiving tag or component asks for it, so it sees every
/// context that component has created.
pub type ContentFn<'a> = &'a dyn Fn(&mut Runtime) -> Result<SafeString, RuntimeError>;

/// A template-backed or native component
pub trait Component: Send + Sync {
    fn render(
        &self,
        runtime: &mut Runtime,
        props: &Props,
        content: Option<ContentFn<'_>>,
    ) -> Result<SafeString, RuntimeError>;
}

impl<F> Component for F
where
    F: Fn(&mut Runtime, &Props, Option<ContentFn<'_>>) -> Result<SafeString, RuntimeError>
        + Send
        + Sync,
{
    fn render(
        &self,
        runtime: &mut Runtime,
        props: &Props,
        content: Option<ContentFn<'_>>,
    ) -> Result<SafeString, RuntimeError> {
        self(runtime, props, content)
    }
}

/// Components by template name.
///
/// `Ui.Button` and its generated method name `Ui__Button` resolve to the
/// same entry.
#[derive(Clone, Default)]
pub struct ComponentRegistry {
    components: HashMap<String, Arc<dyn Component>>,
}

impl ComponentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, name: &str, component: impl Component + 'static) -> &mut Self {
        log::debug!("registering component {}", name);
        self.components
            .insert(registry_key(name), Arc::new(component));
        self
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Component>> {
        self.components.get(&registry_key(name)).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.components.contains_key(&registry_key(name))
    }

    /// Registered names in template form, sorted
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.components.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }
}

impl std::fmt::Debug for ComponentRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ComponentRegistry")
            .field("components", &self.names())
            .finish()
    }
}

fn registry_key(name: &str) -> String {
    name.replace("__", ".")
}
