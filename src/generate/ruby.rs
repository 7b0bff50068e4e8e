use super::{GenerateOptions, Generator, Output};
use crate::ast::*;
use crate::names::{attribute_key, safe_tag_name, string_literal};

/// Generates Ruby that builds the template output in nested buffers
pub struct RubyGenerator;

impl RubyGenerator {
    pub fn new() -> Self {
        Self
    }

    fn emit_prelude(&self, output: &mut Output, options: &GenerateOptions) {
        let lines = [
            format!("class {} < String", options.buffer_class),
            "  def <<(content)".to_string(),
            "    value = content.is_a?(Array) ? content.join : content".to_string(),
            "    super(value.to_s)".to_string(),
            "  end".to_string(),
            "end".to_string(),
            String::new(),
        ];
        for line in lines {
            output.push(&line);
            output.newline();
        }
    }

    /// Emit `Buffer.new.tap do |output| ... end` for `children`.
    ///
    /// The opening line is written at the current cursor; the body is
    /// indented one level deeper than `indent`.
    fn emit_buffer(&self, children: &[Node], output: &mut Output, indent: usize, options: &GenerateOptions) {
        output.push(&options.buffer_class);
        output.push(".new.tap do |output|");
        output.newline();

        for child in children {
            output.indent(indent + 1);
            match child {
                Node::Declaration(decl) => self.emit_declaration(decl, output),
                _ => {
                    output.push("output << (");
                    self.emit_node(child, output, indent + 1, options);
                    output.push(")");
                }
            }
            output.newline();
        }

        output.indent(indent);
        output.push("end");
    }

    fn emit_node(&self, node: &Node, output: &mut Output, indent: usize, options: &GenerateOptions) {
        match node {
            Node::Text(text) => self.emit_text(text, output),
            Node::Expression(expr) => self.emit_expression(expr, output),
            Node::ExpressionGroup(group) => self.emit_group(group, output, indent, options),
            Node::XmlNode(xml) => self.emit_xml(xml, output, indent, options),
            Node::Declaration(decl) => self.emit_declaration(decl, output),
        }
    }

    fn emit_text(&self, text: &Text, output: &mut Output) {
        output.push(&string_literal(&text.content));
    }

    fn emit_expression(&self, expr: &Expression, output: &mut Output) {
        output.push(&expr.content);
    }

    fn emit_group(&self, group: &ExpressionGroup, output: &mut Output, indent: usize, options: &GenerateOptions) {
        for statement in &group.statements {
            self.emit_node(statement, output, indent, options);
        }
    }

    fn emit_declaration(&self, decl: &Declaration, output: &mut Output) {
        output.push(decl.content.trim());
    }

    fn emit_xml(&self, xml: &XmlNode, output: &mut Output, indent: usize, options: &GenerateOptions) {
        output.push(&options.tag_helper);
        output.push(".");
        output.push(&safe_tag_name(&xml.name));
        output.push("(");
        for (i, attr) in xml.attrs.iter().enumerate() {
            if i > 0 {
                output.push(", ");
            }
            self.emit_attr(attr, output, indent, options);
        }
        output.push(")");

        if xml.children.is_empty() {
            return;
        }

        output.push(" do");
        output.newline();
        output.indent(indent + 1);
        self.emit_buffer(&xml.children, output, indent + 1, options);
        output.push(".html_safe");
        output.newline();
        output.indent(indent);
        output.push("end");
    }

    fn emit_attr(&self, attr: &Attr, output: &mut Output, indent: usize, options: &GenerateOptions) {
        match attr {
            Attr::Named(named) => {
                output.push(&attribute_key(&named.name));
                output.push(" ");
                self.emit_node(&named.value, output, indent, options);
            }
            Attr::Spread(group) => {
                output.push("**");
                self.emit_group(group, output, indent, options);
            }
        }
    }
}

impl Default for RubyGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl Generator for RubyGenerator {
    fn generate(&self, template: &Template, options: &GenerateOptions) -> String {
        let mut output = Output::new();
        if options.prelude {
            self.emit_prelude(&mut output, options);
        }
        self.emit_buffer(&template.children, &mut output, 0, options);
        output.newline();

        log::debug!("generated {} lines of ruby", output.line_count());
        output.finish()
    }
}
