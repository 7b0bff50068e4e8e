/// Output buffer that accumulates generated code line by line
pub struct Output {
    lines: Vec<String>,
    current_line: String,
}

impl Output {
    pub fn new() -> Self {
        Self {
            lines: Vec::new(),
            current_line: String::new(),
        }
    }

    /// Add text to the current line
    pub fn push(&mut self, text: &str) {
        self.current_line.push_str(text);
    }

    /// Add two spaces of indentation per level
    pub fn indent(&mut self, level: usize) {
        for _ in 0..level {
            self.current_line.push_str("  ");
        }
    }

    /// Add a newline
    pub fn newline(&mut self) {
        self.current_line.push('\n');
        self.lines.push(std::mem::take(&mut self.current_line));
    }

    /// Number of completed lines
    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    /// Finish and return the generated code
    pub fn finish(mut self) -> String {
        // Final line keeps no trailing newline unless one was pushed
        if !self.current_line.is_empty() {
            self.lines.push(std::mem::take(&mut self.current_line));
        }
        self.lines.join("")
    }
}

impl Default for Output {
    fn default() -> Self {
        Self::new()
    }
}
