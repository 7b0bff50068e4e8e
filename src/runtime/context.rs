use crate::error::RuntimeError;
use serde_json::Value;
use std::collections::HashMap;

type Frame = HashMap<String, Value>;

/// Named values shared from a component to its descendants.
///
/// One frame is pushed per component render; lookups search from the
/// innermost frame outwards.
#[derive(Debug, Clone, Default)]
pub struct ContextStack {
    frames: Vec<Frame>,
}

impl ContextStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_frame(&mut self) {
        self.frames.push(Frame::new());
    }

    pub fn pop_frame(&mut self) {
        self.frames.pop();
    }

    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    /// Bind `name` in the innermost frame
    pub fn create_context(&mut self, name: impl Into<String>, value: Value) {
        if self.frames.is_empty() {
            self.push_frame();
        }
        if let Some(frame) = self.frames.last_mut() {
            frame.insert(name.into(), value);
        }
    }

    /// Nearest binding of `name`
    pub fn use_context(&self, name: &str) -> Result<&Value, RuntimeError> {
        self.frames
            .iter()
            .rev()
            .find_map(|frame| frame.get(name))
            .ok_or_else(|| RuntimeError::ContextNotFound {
                name: name.to_string(),
            })
    }
}
