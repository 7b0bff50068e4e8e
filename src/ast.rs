use serde::Serialize;

/// Root of a compiled template
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct Template {
    pub children: Vec<Node>,
}

impl Template {
    pub fn new(children: Vec<Node>) -> Self {
        Self { children }
    }
}

/// AST Node
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type")]
pub enum Node {
    Text(Text),
    Expression(Expression),
    ExpressionGroup(ExpressionGroup),
    XmlNode(XmlNode),
    Declaration(Declaration),
}

impl Node {
    pub fn text(content: impl Into<String>) -> Self {
        Node::Text(Text {
            content: content.into(),
        })
    }

    pub fn expression(content: impl Into<String>) -> Self {
        Node::Expression(Expression {
            content: content.into(),
        })
    }

    pub fn declaration(content: impl Into<String>) -> Self {
        Node::Declaration(Declaration {
            content: content.into(),
        })
    }
}

/// Literal template text
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Text {
    pub content: String,
}

/// Host expression, emitted verbatim
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Expression {
    pub content: String,
}

/// Pieces of an expression site emitted back to back.
///
/// Also used as the attribute spread marker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExpressionGroup {
    pub statements: Vec<Node>,
}

impl ExpressionGroup {
    pub fn new(statements: Vec<Node>) -> Self {
        Self { statements }
    }
}

/// A tag occurrence
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct XmlNode {
    /// Name as written, e.g. `div` or `Ui.Button`
    pub name: String,
    pub attrs: Vec<Attr>,
    pub children: Vec<Node>,
}

impl XmlNode {
    pub fn new(name: impl Into<String>, attrs: Vec<Attr>, children: Vec<Node>) -> Self {
        Self {
            name: name.into(),
            attrs,
            children,
        }
    }

    /// Capitalized or compound names conventionally refer to components
    pub fn is_component(&self) -> bool {
        self.name.starts_with(|c: char| c.is_ascii_uppercase()) || self.name.contains('.')
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type")]
pub enum Attr {
    Named(XmlAttr),
    Spread(ExpressionGroup),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct XmlAttr {
    /// Name as written; normalized at code generation
    pub name: String,
    pub value: Box<Node>,
}

impl XmlAttr {
    pub fn new(name: impl Into<String>, value: Node) -> Self {
        Self {
            name: name.into(),
            value: Box::new(value),
        }
    }
}

/// Host statement emitted as raw code
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Declaration {
    pub content: String,
}
