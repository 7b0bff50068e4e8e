//! Reference implementation of the contracts generated code relies on:
//! output buffers, the tag builder, component dispatch and the context
//! stack.

mod buffer;
mod component;
mod context;
mod tag;

pub use buffer::{Content, OutputBuffer, SafeString, escape_html};
pub use component::{Component, ComponentRegistry, ContentFn};
pub use context::ContextStack;
pub use tag::{HtmlTagBuilder, Props, TagBuilder};

use crate::error::RuntimeError;
use serde_json::Value;
use std::ops::{Deref, DerefMut};

/// Render-time state threaded through every `tag` call
pub struct Runtime {
    registry: ComponentRegistry,
    tag_builder: Box<dyn TagBuilder + Send + Sync>,
    contexts: ContextStack,
}

impl Runtime {
    pub fn new(registry: ComponentRegistry) -> Self {
        Self::with_tag_builder(registry, HtmlTagBuilder)
    }

    pub fn with_tag_builder(
        registry: ComponentRegistry,
        tag_builder: impl TagBuilder + Send + Sync + 'static,
    ) -> Self {
        Self {
            registry,
            tag_builder: Box::new(tag_builder),
            contexts: ContextStack::new(),
        }
    }

    pub fn registry(&self) -> &ComponentRegistry {
        &self.registry
    }

    pub fn contexts(&self) -> &ContextStack {
        &self.contexts
    }

    /// Share `value` with every component rendered inside the current one
    pub fn create_context(&mut self, name: impl Into<String>, value: Value) {
        self.contexts.create_context(name, value);
    }

    pub fn use_context(&self, name: &str) -> Result<Value, RuntimeError> {
        self.contexts.use_context(name).cloned()
    }

    /// Render a `tag.name(...)` call.
    ///
    /// Capitalized and compound names render the registered component,
    /// which decides when its content runs. Everything else goes to the
    /// tag builder with the content rendered first.
    pub fn tag(
        &mut self,
        name: &str,
        props: &Props,
        content: Option<ContentFn<'_>>,
    ) -> Result<SafeString, RuntimeError> {
        if !is_component_name(name) {
            let content = self.render_content(content)?;
            return Ok(self.tag_builder.build_tag(name, props, content));
        }

        let component = self
            .registry
            .get(name)
            .ok_or_else(|| RuntimeError::UnknownComponent {
                name: name.to_string(),
            })?;

        log::trace!("rendering component {}", name);
        let mut scope = ContextScope::enter(self);
        component.render(&mut scope, props, content)
    }

    /// Run deferred content against the current context stack
    pub fn render_content(
        &mut self,
        content: Option<ContentFn<'_>>,
    ) -> Result<Option<SafeString>, RuntimeError> {
        content.map(|render| render(self)).transpose()
    }
}

impl std::fmt::Debug for Runtime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Runtime")
            .field("registry", &self.registry)
            .field("contexts", &self.contexts)
            .finish()
    }
}

/// Pushes a context frame for one component render and pops it on drop,
/// including when the render returns an error or panics.
struct ContextScope<'a> {
    runtime: &'a mut Runtime,
}

impl<'a> ContextScope<'a> {
    fn enter(runtime: &'a mut Runtime) -> Self {
        runtime.contexts.push_frame();
        Self { runtime }
    }
}

impl Deref for ContextScope<'_> {
    type Target = Runtime;

    fn deref(&self) -> &Runtime {
        self.runtime
    }
}

impl DerefMut for ContextScope<'_> {
    fn deref_mut(&mut self) -> &mut Runtime {
        self.runtime
    }
}

impl Drop for ContextScope<'_> {
    fn drop(&mut self) {
        self.runtime.contexts.pop_frame();
    }
}

fn is_component_name(name: &str) -> bool {
    name.starts_with(|c: char| c.is_ascii_uppercase()) || name.contains('.') || name.contains("__")
}
