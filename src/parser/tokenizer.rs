use super::{MAX_NESTING, nesting_too_deep};
use crate::error::{ErrorKind, ParseError};
use serde::Serialize;

/// Position in source code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Position {
    /// Byte offset in source
    pub byte: usize,
    /// Line number (0-indexed)
    pub line: usize,
    /// Column number (0-indexed, in characters)
    pub col: usize,
}

impl Position {
    pub fn new() -> Self {
        Self { byte: 0, line: 0, col: 0 }
    }
}

/// Span in source code (a range from start position to end position)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Span {
    pub start: Position,
    pub end: Position,
}

impl Span {
    pub fn new(start: Position, end: Position) -> Self {
        Self { start, end }
    }

    /// Zero-width span at a single position
    pub fn point(position: Position) -> Self {
        Self { start: position, end: position }
    }
}

/// Kind of token produced by the lexer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TokenKind {
    /// Literal content between constructs
    Text,
    /// `<` starting an opening tag
    TagOpen,
    /// `</` starting a closing tag
    TagClose,
    /// `>` finishing an opening or closing tag
    TagEnd,
    /// `/>` finishing a self-closing tag
    TagSelfClose,
    TagName,
    AttrName,
    AttrEquals,
    /// Quoted attribute value, quotes excluded
    StringLiteral,
    /// `{` opening an expression site
    ExpressionStart,
    /// Raw host-language code inside an expression site
    Expression,
    /// `}` closing an expression site or spread
    ExpressionEnd,
    /// `{...` opening a spread attribute
    SpreadStart,
    /// Body of a `{% ... %}` host statement
    Declaration,
    Eof,
}

impl TokenKind {
    /// Human readable name used in error messages
    pub fn describe(&self) -> &'static str {
        match self {
            TokenKind::Text => "text",
            TokenKind::TagOpen => "'<'",
            TokenKind::TagClose => "'</'",
            TokenKind::TagEnd => "'>'",
            TokenKind::TagSelfClose => "'/>'",
            TokenKind::TagName => "a tag name",
            TokenKind::AttrName => "an attribute name",
            TokenKind::AttrEquals => "'='",
            TokenKind::StringLiteral => "a quoted string",
            TokenKind::ExpressionStart => "'{'",
            TokenKind::Expression => "an expression",
            TokenKind::ExpressionEnd => "'}'",
            TokenKind::SpreadStart => "'{...'",
            TokenKind::Declaration => "a {% declaration %}",
            TokenKind::Eof => "end of input",
        }
    }
}

/// Tokens produced by the lexer
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Token {
    pub kind: TokenKind,
    pub value: String,
    pub span: Span,
}

impl Token {
    pub fn new(kind: TokenKind, value: impl Into<String>, span: Span) -> Self {
        Self {
            kind,
            value: value.into(),
            span,
        }
    }
}

/// Characters after which a `<` inside an expression starts embedded markup
const MARKUP_PRECEDERS: &[char] = &['(', '[', '{', ',', '|', '?', ':', '=', '&', '!', '>', ';'];

/// Keywords after which a `<` inside an expression starts embedded markup
const MARKUP_KEYWORDS: &[&str] = &["do", "then", "else", "return", "and", "or"];

/// Tag currently waiting for its closing tag
struct OpenTag {
    name: String,
    span: Span,
}

/// Expression site waiting for its closing brace
struct ExpressionSite {
    open_span: Span,
    /// Index of the first token after the opening delimiter
    first_piece: usize,
    depth: usize,
    piece: String,
    quote: Option<char>,
}

/// What the lexer is in the middle of, innermost last.
///
/// Nested constructs push a new mode instead of recursing, so deeply
/// nested markup cannot exhaust the call stack.
enum Mode {
    /// Free text at the top level or inside an open tag
    Text(Option<OpenTag>),
    /// Between `<name` and `>` or `/>`
    Attributes(OpenTag),
    Expression(ExpressionSite),
}

/// Tokenizer for rbx template source
pub struct Tokenizer<'a> {
    source: &'a str,
    position: Position,
    tokens: Vec<Token>,
    open_elements: usize,
}

impl<'a> Tokenizer<'a> {
    pub fn new(source: &'a str) -> Self {
        Self {
            source,
            position: Position::new(),
            tokens: Vec::new(),
            open_elements: 0,
        }
    }

    /// Tokenize the entire source
    pub fn tokenize(mut self) -> Result<Vec<Token>, ParseError> {
        let mut modes = vec![Mode::Text(None)];
        while let Some(mode) = modes.pop() {
            match mode {
                Mode::Text(parent) => self.lex_text(parent, &mut modes)?,
                Mode::Attributes(open) => self.lex_attributes(open, &mut modes)?,
                Mode::Expression(site) => self.lex_expression(site, &mut modes)?,
            }
        }

        let eof = Span::point(self.position);
        self.tokens.push(Token::new(TokenKind::Eof, "", eof));
        Ok(self.tokens)
    }

    /// Lex free text until end of input, the close tag of `parent`, or the
    /// start of a nested construct.
    fn lex_text(&mut self, parent: Option<OpenTag>, modes: &mut Vec<Mode>) -> Result<(), ParseError> {
        let mut text = String::new();
        let mut text_start = self.position;

        loop {
            let Some(ch) = self.peek_char() else {
                self.flush_text(&mut text, text_start);
                return match parent {
                    Some(tag) => Err(ParseError::new(
                        ErrorKind::UnclosedTag,
                        format!("<{}> is never closed.", tag.name),
                        tag.span,
                    )
                    .with_help(format!(
                        "Close it with </{}> or write it as <{} />.",
                        tag.name, tag.name
                    ))),
                    None => Ok(()),
                };
            };

            match ch {
                // Escaped delimiters: \{ \} \<
                '\\' if matches!(self.peek_nth(1), Some('{' | '}' | '<')) => {
                    self.advance();
                    if let Some(escaped) = self.peek_char() {
                        text.push(escaped);
                        self.advance();
                    }
                }
                '<' if self.peek_nth(1) == Some('/')
                    && self.peek_nth(2).is_some_and(|c| c.is_ascii_alphabetic()) =>
                {
                    self.flush_text(&mut text, text_start);
                    return self.lex_close_tag(parent.as_ref());
                }
                '<' if self.peek_nth(1).is_some_and(|c| c.is_ascii_alphabetic()) => {
                    self.flush_text(&mut text, text_start);
                    let open = self.lex_open_tag()?;
                    modes.push(Mode::Text(parent));
                    modes.push(Mode::Attributes(open));
                    return Ok(());
                }
                '{' if self.peek_nth(1) == Some('%') => {
                    self.flush_text(&mut text, text_start);
                    self.lex_declaration()?;
                    text_start = self.position;
                }
                '{' => {
                    self.flush_text(&mut text, text_start);
                    let site = self.open_expression_site(TokenKind::ExpressionStart);
                    modes.push(Mode::Text(parent));
                    modes.push(Mode::Expression(site));
                    return Ok(());
                }
                _ => {
                    text.push(ch);
                    self.advance();
                }
            }
        }
    }

    fn flush_text(&mut self, text: &mut String, start: Position) {
        if !text.is_empty() {
            let span = Span::new(start, self.position);
            self.tokens
                .push(Token::new(TokenKind::Text, std::mem::take(text), span));
        }
    }

    /// Lex `<name`, opening an element
    fn lex_open_tag(&mut self) -> Result<OpenTag, ParseError> {
        let start = self.position;
        self.advance(); // <
        self.push(TokenKind::TagOpen, "<", start);

        let name = self.lex_tag_name()?;
        let open = OpenTag {
            name,
            span: Span::new(start, self.position),
        };
        if self.open_elements >= MAX_NESTING {
            return Err(nesting_too_deep(&open.name, open.span));
        }
        self.open_elements += 1;

        log::trace!(
            "lexing <{}> at {}:{}",
            open.name,
            start.line + 1,
            start.col + 1
        );
        Ok(open)
    }

    /// Lex the attributes of `open` up to `>` or `/>`
    fn lex_attributes(&mut self, open: OpenTag, modes: &mut Vec<Mode>) -> Result<(), ParseError> {
        loop {
            self.skip_whitespace();

            let Some(ch) = self.peek_char() else {
                return Err(ParseError::new(
                    ErrorKind::UnterminatedTag,
                    format!("<{}> is missing its closing '>'.", open.name),
                    open.span,
                )
                .with_help("Finish the tag with '>' or '/>'."));
            };

            match ch {
                '/' if self.peek_nth(1) == Some('>') => {
                    let close_start = self.position;
                    self.advance();
                    self.advance();
                    self.push(TokenKind::TagSelfClose, "/>", close_start);
                    self.open_elements -= 1;
                    return Ok(());
                }
                '>' => {
                    let close_start = self.position;
                    self.advance();
                    self.push(TokenKind::TagEnd, ">", close_start);
                    modes.push(Mode::Text(Some(open)));
                    return Ok(());
                }
                '{' => {
                    self.check_spread(&open)?;
                    let site = self.open_expression_site(TokenKind::SpreadStart);
                    modes.push(Mode::Attributes(open));
                    modes.push(Mode::Expression(site));
                    return Ok(());
                }
                c if is_attr_name_start(c) => {
                    if let Some(site) = self.lex_attribute()? {
                        modes.push(Mode::Attributes(open));
                        modes.push(Mode::Expression(site));
                        return Ok(());
                    }
                }
                _ => {
                    return Err(ParseError::new(
                        ErrorKind::MalformedAttribute,
                        format!("Unexpected '{}' inside <{}>.", ch, open.name),
                        Span::point(self.position),
                    )
                    .with_related(open.span)
                    .with_related_label("in this tag")
                    .with_help(
                        "Attributes look like name=\"value\", name={expression} or {...spread}.",
                    ));
                }
            }
        }
    }

    fn lex_tag_name(&mut self) -> Result<String, ParseError> {
        let start = self.position;
        let name = self.consume_while(is_tag_name_char);
        let span = Span::new(start, self.position);

        if name.ends_with('.') || name.contains("..") {
            return Err(ParseError::new(
                ErrorKind::InvalidTagName,
                format!("'{}' is not a valid tag name.", name),
                span,
            )
            .with_help("Compound names separate segments with a single '.', e.g. <Ui.Button />."));
        }

        self.tokens
            .push(Token::new(TokenKind::TagName, name.clone(), span));
        Ok(name)
    }

    fn lex_close_tag(&mut self, parent: Option<&OpenTag>) -> Result<(), ParseError> {
        let start = self.position;
        self.advance(); // <
        self.advance(); // /

        let name_start = self.position;
        let name = self.consume_while(is_tag_name_char);
        let name_span = Span::new(name_start, self.position);
        self.skip_whitespace();

        if self.peek_char() != Some('>') {
            return Err(ParseError::new(
                ErrorKind::UnterminatedTag,
                format!("</{}> is missing its closing '>'.", name),
                Span::new(start, self.position),
            ));
        }
        let end_start = self.position;
        self.advance(); // >
        let close_span = Span::new(start, self.position);

        match parent {
            None => Err(ParseError::new(
                ErrorKind::UnexpectedCloseTag,
                format!("</{}> has no matching opening tag.", name),
                close_span,
            )),
            Some(tag) if tag.name != name => Err(ParseError::new(
                ErrorKind::MismatchedCloseTag,
                format!("Expected </{}> but found </{}>.", tag.name, name),
                close_span,
            )
            .with_related(tag.span)
            .with_help(format!("<{}> must be closed before </{}>.", tag.name, name))),
            Some(_) => {
                self.tokens.push(Token::new(
                    TokenKind::TagClose,
                    "</",
                    Span::new(start, name_start),
                ));
                self.tokens
                    .push(Token::new(TokenKind::TagName, name, name_span));
                self.push(TokenKind::TagEnd, ">", end_start);
                self.open_elements -= 1;
                Ok(())
            }
        }
    }

    /// Lex `name`, `name="value"`, `name='value'` or the start of `name={expr}`.
    ///
    /// Returns the expression site still to be lexed, if any.
    fn lex_attribute(&mut self) -> Result<Option<ExpressionSite>, ParseError> {
        let start = self.position;
        let name = self.consume_while(is_attr_name_char);
        self.tokens.push(Token::new(
            TokenKind::AttrName,
            name.clone(),
            Span::new(start, self.position),
        ));

        self.skip_whitespace();
        if self.peek_char() != Some('=') {
            // Bare attribute
            return Ok(None);
        }

        let equals_start = self.position;
        self.advance();
        self.push(TokenKind::AttrEquals, "=", equals_start);
        self.skip_whitespace();

        match self.peek_char() {
            Some(quote @ ('"' | '\'')) => {
                self.lex_string_literal(quote)?;
                Ok(None)
            }
            Some('{') => Ok(Some(self.open_expression_site(TokenKind::ExpressionStart))),
            _ => Err(ParseError::new(
                ErrorKind::MalformedAttribute,
                format!("Attribute '{}' needs a value after '='.", name),
                Span::new(start, self.position),
            )
            .with_help(format!(
                "Write {}=\"text\" or {}={{expression}}.",
                name, name
            ))),
        }
    }

    fn lex_string_literal(&mut self, quote: char) -> Result<(), ParseError> {
        let start = self.position;
        self.advance(); // opening quote

        let mut value = String::new();
        loop {
            match self.peek_char() {
                Some(ch) if ch == quote => {
                    self.advance();
                    break;
                }
                Some(ch) => {
                    value.push(ch);
                    self.advance();
                }
                None => {
                    return Err(ParseError::new(
                        ErrorKind::UnterminatedString,
                        "This attribute value is never closed.",
                        Span::new(start, self.position),
                    )
                    .with_help(format!("Add a closing {}.", quote)));
                }
            }
        }

        self.push(TokenKind::StringLiteral, value, start);
        Ok(())
    }

    /// Only `{...expr}` may stand among attributes
    fn check_spread(&self, open: &OpenTag) -> Result<(), ParseError> {
        if (1..=3).all(|n| self.peek_nth(n) == Some('.')) {
            return Ok(());
        }
        Err(ParseError::new(
            ErrorKind::MalformedAttribute,
            format!("Only {{...spread}} expressions may appear among the attributes of <{}>.", open.name),
            Span::point(self.position),
        )
        .with_related(open.span)
        .with_related_label("in this tag")
        .with_help("Use name={expression} for a single attribute."))
    }

    /// Consume `{` (or `{...`) and emit the opening token
    fn open_expression_site(&mut self, start_kind: TokenKind) -> ExpressionSite {
        let start = self.position;
        self.advance(); // {
        let delimiter = if start_kind == TokenKind::SpreadStart {
            self.advance();
            self.advance();
            self.advance();
            "{..."
        } else {
            "{"
        };
        self.push(start_kind, delimiter, start);

        ExpressionSite {
            open_span: Span::new(start, self.position),
            first_piece: self.tokens.len(),
            depth: 1,
            piece: String::new(),
            quote: None,
        }
    }

    /// Lex the body of an expression site with depth tracking.
    ///
    /// Braces inside quoted strings do not count towards depth. Markup that
    /// appears where a value is expected is lexed as a nested element, so the
    /// site becomes a run of `Expression` pieces and element tokens.
    fn lex_expression(&mut self, mut site: ExpressionSite, modes: &mut Vec<Mode>) -> Result<(), ParseError> {
        let mut piece_start = self.position;

        loop {
            let Some(ch) = self.peek_char() else {
                return Err(ParseError::new(
                    ErrorKind::UnterminatedExpression,
                    "This expression is never closed.",
                    site.open_span,
                )
                .with_help("Add a matching '}'."));
            };

            if let Some(q) = site.quote {
                site.piece.push(ch);
                self.advance();
                if ch == '\\' {
                    if let Some(next) = self.peek_char() {
                        site.piece.push(next);
                        self.advance();
                    }
                } else if ch == q {
                    site.quote = None;
                }
                continue;
            }

            match ch {
                '"' | '\'' | '`' => {
                    site.quote = Some(ch);
                    site.piece.push(ch);
                    self.advance();
                }
                '{' => {
                    site.depth += 1;
                    site.piece.push(ch);
                    self.advance();
                }
                '}' => {
                    site.depth -= 1;
                    if site.depth == 0 {
                        self.flush_piece(&mut site.piece, piece_start);
                        let end_start = self.position;
                        self.advance();
                        self.push(TokenKind::ExpressionEnd, "}", end_start);
                        self.trim_expression_pieces(site.first_piece);
                        return Ok(());
                    }
                    site.piece.push(ch);
                    self.advance();
                }
                '<' if self.peek_nth(1).is_some_and(|c| c.is_ascii_alphabetic())
                    && starts_markup(&site.piece) =>
                {
                    self.flush_piece(&mut site.piece, piece_start);
                    let open = self.lex_open_tag()?;
                    modes.push(Mode::Expression(site));
                    modes.push(Mode::Attributes(open));
                    return Ok(());
                }
                _ => {
                    site.piece.push(ch);
                    self.advance();
                }
            }
        }
    }

    fn flush_piece(&mut self, piece: &mut String, start: Position) {
        if !piece.is_empty() {
            let span = Span::new(start, self.position);
            self.tokens
                .push(Token::new(TokenKind::Expression, std::mem::take(piece), span));
        }
    }

    /// Trim the outer whitespace of an expression site, dropping pieces
    /// that end up empty.
    fn trim_expression_pieces(&mut self, first: usize) {
        let end = self.tokens.len() - 1; // ExpressionEnd
        if end <= first {
            return;
        }

        if self.tokens[first].kind == TokenKind::Expression {
            let trimmed = self.tokens[first].value.trim_start().to_string();
            self.tokens[first].value = trimmed;
        }
        if self.tokens[end - 1].kind == TokenKind::Expression {
            let trimmed = self.tokens[end - 1].value.trim_end().to_string();
            self.tokens[end - 1].value = trimmed;
        }

        for index in [end - 1, first] {
            let token = &self.tokens[index];
            if token.kind == TokenKind::Expression && token.value.is_empty() {
                self.tokens.remove(index);
            }
        }
    }

    /// Lex `{% statement %}`. Braces are not balanced here so a declaration
    /// can open a block that a later declaration closes.
    fn lex_declaration(&mut self) -> Result<(), ParseError> {
        let start = self.position;
        self.advance(); // {
        self.advance(); // %

        let mut body = String::new();
        let mut quote: Option<char> = None;

        loop {
            let Some(ch) = self.peek_char() else {
                return Err(ParseError::new(
                    ErrorKind::UnterminatedDeclaration,
                    "This declaration is never closed.",
                    Span::new(start, self.position),
                )
                .with_help("Finish it with '%}'."));
            };

            if let Some(q) = quote {
                body.push(ch);
                self.advance();
                if ch == '\\' {
                    if let Some(next) = self.peek_char() {
                        body.push(next);
                        self.advance();
                    }
                } else if ch == q {
                    quote = None;
                }
                continue;
            }

            match ch {
                '%' if self.peek_nth(1) == Some('}') => {
                    self.advance();
                    self.advance();
                    break;
                }
                '"' | '\'' | '`' => {
                    quote = Some(ch);
                    body.push(ch);
                    self.advance();
                }
                _ => {
                    body.push(ch);
                    self.advance();
                }
            }
        }

        self.push(TokenKind::Declaration, body.trim(), start);
        Ok(())
    }

    // === Cursor helpers ===

    /// Push a token spanning from `start` to the current position
    fn push(&mut self, kind: TokenKind, value: impl Into<String>, start: Position) {
        let span = Span::new(start, self.position);
        self.tokens.push(Token::new(kind, value, span));
    }

    fn peek_char(&self) -> Option<char> {
        self.source[self.position.byte..].chars().next()
    }

    fn peek_nth(&self, n: usize) -> Option<char> {
        self.source[self.position.byte..].chars().nth(n)
    }

    fn advance(&mut self) {
        if let Some(ch) = self.peek_char() {
            self.position.byte += ch.len_utf8();
            if ch == '\n' {
                self.position.line += 1;
                self.position.col = 0;
            } else {
                self.position.col += 1;
            }
        }
    }

    fn skip_whitespace(&mut self) {
        while self.peek_char().is_some_and(char::is_whitespace) {
            self.advance();
        }
    }

    fn consume_while<F: Fn(char) -> bool>(&mut self, pred: F) -> String {
        let mut result = String::new();
        while let Some(ch) = self.peek_char() {
            if !pred(ch) {
                break;
            }
            result.push(ch);
            self.advance();
        }
        result
    }
}

fn is_tag_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '-' || c == '.'
}

fn is_attr_name_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_' || c == '@' || c == ':'
}

fn is_attr_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | ':' | '@' | '.')
}

/// Whether a `<` following `code` (the expression text so far) opens markup
/// rather than being a comparison or shift operator.
fn starts_markup(code: &str) -> bool {
    let code = code.trim_end();
    let Some(last) = code.chars().last() else {
        return true;
    };
    if MARKUP_PRECEDERS.contains(&last) {
        return true;
    }

    let word_start = code
        .char_indices()
        .rev()
        .find(|(_, c)| !(c.is_alphanumeric() || *c == '_'))
        .map(|(i, c)| i + c.len_utf8())
        .unwrap_or(0);
    MARKUP_KEYWORDS.contains(&&code[word_start..])
}

/// Tokenize template source
pub fn tokenize(source: &str) -> Result<Vec<Token>, ParseError> {
    Tokenizer::new(source).tokenize()
}
