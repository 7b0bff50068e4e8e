use super::tokenizer::{Span, Token, TokenKind};
use super::{MAX_NESTING, nesting_too_deep};
use crate::ast::*;
use crate::error::{ErrorKind, ParseError};
use crate::names::underscore;
use std::collections::HashMap;

/// Element whose attributes or children are still being read
struct OpenElement {
    name: String,
    open_span: Span,
    attrs: Vec<Attr>,
    /// Generated key -> (name as written, span of its first use)
    seen: HashMap<String, (String, Span)>,
}

impl OpenElement {
    fn new(name: String, open_span: Span) -> Self {
        Self {
            name,
            open_span,
            attrs: Vec::new(),
            seen: HashMap::new(),
        }
    }

    /// Add a named attribute, rejecting names that compile to a key
    /// already present
    fn add_attr(&mut self, attr: XmlAttr, span: Span) -> Result<(), ParseError> {
        let key = underscore(&attr.name);
        if let Some((first_name, first_span)) = self.seen.get(&key) {
            let err = ParseError::new(
                ErrorKind::DuplicateAttribute,
                format!("'{}' is set twice on <{}>.", attr.name, self.name),
                span,
            )
            .with_related(*first_span)
            .with_related_label("first use");
            return Err(if *first_name == attr.name {
                err
            } else {
                err.with_help(format!(
                    "'{}' and '{}' both become the key {}.",
                    first_name, attr.name, key
                ))
            });
        }
        self.seen.insert(key, (attr.name.clone(), span));
        self.attrs.push(Attr::Named(attr));
        Ok(())
    }

    fn finish(self, children: Vec<Node>) -> Node {
        Node::XmlNode(XmlNode::new(self.name, self.attrs, children))
    }
}

/// Where the pieces of an expression site go once its `}` is reached
enum PieceTarget {
    Child,
    Attr { name: String, name_span: Span, span: Span },
    Spread { span: Span },
}

/// Unfinished construct, innermost last
enum Frame {
    Attributes(OpenElement),
    Children {
        element: OpenElement,
        children: Vec<Node>,
    },
    Pieces {
        target: PieceTarget,
        pieces: Vec<Node>,
    },
}

/// Builds an AST from a token stream
pub struct TreeBuilder {
    tokens: Vec<Token>,
    pos: usize,
}

impl TreeBuilder {
    pub fn new(tokens: Vec<Token>) -> Self {
        Self { tokens, pos: 0 }
    }

    /// Build the template.
    ///
    /// Open elements and expression sites live on an explicit frame stack;
    /// each step either finishes a node for the frame below or pushes a
    /// new frame.
    pub fn build(&mut self) -> Result<Template, ParseError> {
        let mut root = Vec::new();
        let mut frames: Vec<Frame> = Vec::new();

        loop {
            let finished = match frames.pop() {
                None if self.is_at_end() => return Ok(Template::new(root)),
                None => self.parse_content(&mut frames)?,
                Some(Frame::Attributes(element)) => self.parse_attributes(element, &mut frames)?,
                Some(Frame::Children { element, children }) => {
                    self.parse_children(element, children, &mut frames)?
                }
                Some(Frame::Pieces { target, pieces }) => {
                    self.parse_pieces(target, pieces, &mut frames)?
                }
            };

            if let Some(node) = finished {
                match frames.last_mut() {
                    Some(Frame::Children { children, .. }) => children.push(node),
                    Some(Frame::Pieces { pieces, .. }) => pieces.push(node),
                    // Attribute values always arrive through `Pieces`
                    Some(Frame::Attributes(_)) | None => root.push(node),
                }
            }
        }
    }

    /// Span of the current token, or of the last one once the stream runs out
    fn current_span(&self) -> Span {
        self.peek()
            .or_else(|| self.tokens.last())
            .map(|token| token.span)
            .unwrap_or_default()
    }

    /// Read one child. Leaves come back directly; elements and expression
    /// sites push a frame and finish later.
    fn parse_content(&mut self, frames: &mut Vec<Frame>) -> Result<Option<Node>, ParseError> {
        let Some(token) = self.peek() else {
            return Ok(None);
        };

        match token.kind {
            TokenKind::Text => {
                let node = Node::text(token.value.clone());
                self.advance();
                Ok(Some(node))
            }
            TokenKind::Declaration => {
                let node = Node::declaration(token.value.clone());
                self.advance();
                Ok(Some(node))
            }
            TokenKind::ExpressionStart => {
                self.advance();
                frames.push(Frame::Pieces {
                    target: PieceTarget::Child,
                    pieces: Vec::new(),
                });
                Ok(None)
            }
            TokenKind::TagOpen => {
                self.open_element(frames)?;
                Ok(None)
            }
            TokenKind::TagClose => {
                let span = token.span;
                let name = self
                    .tokens
                    .get(self.pos + 1)
                    .map(|t| t.value.clone())
                    .unwrap_or_default();
                Err(ParseError::new(
                    ErrorKind::UnexpectedCloseTag,
                    format!("</{}> has no matching opening tag.", name),
                    span,
                ))
            }
            TokenKind::Eof => Ok(None),
            _ => Err(self.unexpected("text, a tag or an {expression}")),
        }
    }

    /// Read `<name` and push its attribute frame
    fn open_element(&mut self, frames: &mut Vec<Frame>) -> Result<(), ParseError> {
        let open_start = self.expect(TokenKind::TagOpen)?.span;
        let name_token = self.expect(TokenKind::TagName)?;
        let open_span = Span::new(open_start.start, name_token.span.end);

        let depth = frames
            .iter()
            .filter(|frame| !matches!(frame, Frame::Pieces { .. }))
            .count();
        if depth >= MAX_NESTING {
            return Err(nesting_too_deep(&name_token.value, open_span));
        }

        frames.push(Frame::Attributes(OpenElement::new(name_token.value, open_span)));
        Ok(())
    }

    fn parse_attributes(
        &mut self,
        mut element: OpenElement,
        frames: &mut Vec<Frame>,
    ) -> Result<Option<Node>, ParseError> {
        loop {
            let Some(token) = self.peek() else {
                return Err(self.unterminated_tag(&element.name, element.open_span));
            };

            match token.kind {
                TokenKind::TagSelfClose => {
                    self.advance();
                    return Ok(Some(element.finish(Vec::new())));
                }
                TokenKind::TagEnd => {
                    self.advance();
                    log::trace!("parsing children of <{}>", element.name);
                    frames.push(Frame::Children {
                        element,
                        children: Vec::new(),
                    });
                    return Ok(None);
                }
                TokenKind::AttrName => {
                    let name_span = token.span;
                    let name = token.value.clone();
                    self.advance();

                    if self.peek().map(|t| t.kind) != Some(TokenKind::AttrEquals) {
                        // Bare attribute
                        let value = Node::expression("true");
                        element.add_attr(XmlAttr::new(name, value), name_span)?;
                        continue;
                    }
                    self.advance();

                    let Some(token) = self.peek() else {
                        return Err(self.unexpected("an attribute value"));
                    };
                    match token.kind {
                        TokenKind::StringLiteral => {
                            let value = Node::text(token.value.clone());
                            self.advance();
                            element.add_attr(XmlAttr::new(name, value), name_span)?;
                        }
                        TokenKind::ExpressionStart => {
                            let span = token.span;
                            self.advance();
                            frames.push(Frame::Attributes(element));
                            frames.push(Frame::Pieces {
                                target: PieceTarget::Attr { name, name_span, span },
                                pieces: Vec::new(),
                            });
                            return Ok(None);
                        }
                        _ => return Err(self.unexpected("a quoted string or {expression}")),
                    }
                }
                TokenKind::SpreadStart => {
                    let span = token.span;
                    self.advance();
                    frames.push(Frame::Attributes(element));
                    frames.push(Frame::Pieces {
                        target: PieceTarget::Spread { span },
                        pieces: Vec::new(),
                    });
                    return Ok(None);
                }
                TokenKind::Eof => {
                    return Err(self.unterminated_tag(&element.name, element.open_span));
                }
                _ => return Err(self.unexpected("an attribute, '>' or '/>'")),
            }
        }
    }

    /// Read one child of `element`, or its matching close tag
    fn parse_children(
        &mut self,
        element: OpenElement,
        children: Vec<Node>,
        frames: &mut Vec<Frame>,
    ) -> Result<Option<Node>, ParseError> {
        match self.peek().map(|t| t.kind) {
            Some(TokenKind::TagClose) => {
                let close_start = self.current_span();
                self.advance();
                let close_name = self.expect(TokenKind::TagName)?;
                let close_end = self.expect(TokenKind::TagEnd)?;
                if close_name.value != element.name {
                    return Err(ParseError::new(
                        ErrorKind::MismatchedCloseTag,
                        format!(
                            "Expected </{}> but found </{}>.",
                            element.name, close_name.value
                        ),
                        Span::new(close_start.start, close_end.span.end),
                    )
                    .with_related(element.open_span));
                }
                Ok(Some(element.finish(children)))
            }
            Some(TokenKind::Eof) | None => Err(ParseError::new(
                ErrorKind::UnclosedTag,
                format!("<{}> is never closed.", element.name),
                element.open_span,
            )
            .with_help(format!(
                "Close it with </{}> or write it as <{} />.",
                element.name, element.name
            ))),
            Some(_) => {
                frames.push(Frame::Children { element, children });
                self.parse_content(frames)
            }
        }
    }

    /// Read the pieces of an expression site up to and including its `}`
    fn parse_pieces(
        &mut self,
        target: PieceTarget,
        mut pieces: Vec<Node>,
        frames: &mut Vec<Frame>,
    ) -> Result<Option<Node>, ParseError> {
        loop {
            let Some(token) = self.peek() else {
                return Err(ParseError::new(
                    ErrorKind::UnterminatedExpression,
                    "This expression is never closed.",
                    self.current_span(),
                ));
            };

            match token.kind {
                TokenKind::Expression => {
                    pieces.push(Node::expression(token.value.clone()));
                    self.advance();
                }
                TokenKind::TagOpen => {
                    frames.push(Frame::Pieces { target, pieces });
                    self.open_element(frames)?;
                    return Ok(None);
                }
                TokenKind::ExpressionEnd => {
                    self.advance();
                    return Self::finish_pieces(target, pieces, frames);
                }
                TokenKind::Eof => {
                    return Err(ParseError::new(
                        ErrorKind::UnterminatedExpression,
                        "This expression is never closed.",
                        token.span,
                    ));
                }
                _ => return Err(self.unexpected("an expression or '}'")),
            }
        }
    }

    /// Hand finished pieces to whatever opened the expression site. Attribute
    /// and spread values land on the element frame below.
    fn finish_pieces(
        target: PieceTarget,
        pieces: Vec<Node>,
        frames: &mut [Frame],
    ) -> Result<Option<Node>, ParseError> {
        let element = match (&target, frames.last_mut()) {
            (PieceTarget::Child, _) => return Ok(group_pieces(pieces)),
            (_, Some(Frame::Attributes(element))) => element,
            _ => return Ok(None),
        };

        match target {
            PieceTarget::Attr { name, name_span, span } => {
                let Some(value) = group_pieces(pieces) else {
                    return Err(ParseError::new(
                        ErrorKind::MalformedAttribute,
                        format!("Attribute '{}' has an empty expression.", name),
                        span,
                    ));
                };
                element.add_attr(XmlAttr::new(name, value), name_span)?;
            }
            PieceTarget::Spread { span } => {
                if pieces.is_empty() {
                    return Err(ParseError::new(
                        ErrorKind::MalformedAttribute,
                        format!("Empty spread on <{}>.", element.name),
                        span,
                    )
                    .with_help("Write {...expression} with a hash to spread."));
                }
                element.attrs.push(Attr::Spread(ExpressionGroup::new(pieces)));
            }
            PieceTarget::Child => {}
        }
        Ok(None)
    }

    fn unterminated_tag(&self, name: &str, open_span: Span) -> ParseError {
        ParseError::new(
            ErrorKind::UnterminatedTag,
            format!("<{}> is missing its closing '>'.", name),
            open_span,
        )
    }

    fn unexpected(&self, expected: &str) -> ParseError {
        let found = self
            .peek()
            .map(|t| t.kind.describe())
            .unwrap_or("end of input");
        ParseError::new(
            ErrorKind::UnexpectedToken,
            format!("Expected {}, found {}.", expected, found),
            self.current_span(),
        )
    }

    fn expect(&mut self, kind: TokenKind) -> Result<Token, ParseError> {
        match self.peek() {
            Some(token) if token.kind == kind => {
                let token = token.clone();
                self.advance();
                Ok(token)
            }
            _ => Err(self.unexpected(kind.describe())),
        }
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn advance(&mut self) {
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }
    }

    fn is_at_end(&self) -> bool {
        self.pos >= self.tokens.len()
            || matches!(self.peek(), Some(token) if token.kind == TokenKind::Eof)
    }
}

/// Zero pieces yield nothing and a lone expression stays an `Expression`
fn group_pieces(mut pieces: Vec<Node>) -> Option<Node> {
    match pieces.len() {
        0 => None,
        1 if matches!(pieces[0], Node::Expression(_)) => pieces.pop(),
        _ => Some(Node::ExpressionGroup(ExpressionGroup::new(pieces))),
    }
}
