use rbx_transpiler::ast::ExpressionGroup;
use rbx_transpiler::{
    Attr, ErrorCategory, ErrorKind, GenerateOptions, MAX_NESTING, Node, Pipeline, Template,
    XmlAttr, XmlNode, compile, parse, tokenize,
};

fn parse_source(source: &str) -> Template {
    parse(tokenize(source).unwrap()).unwrap()
}

fn compile_err(source: &str) -> rbx_transpiler::ParseError {
    compile(source).unwrap_err()
}

#[test]
fn test_parse_element_tree() {
    let template = parse_source(r#"<div class="box">Hi <b>{name}</b></div>"#);

    let expected = Template::new(vec![Node::XmlNode(XmlNode::new(
        "div",
        vec![Attr::Named(XmlAttr::new("class", Node::text("box")))],
        vec![
            Node::text("Hi "),
            Node::XmlNode(XmlNode::new("b", vec![], vec![Node::expression("name")])),
        ],
    ))]);
    assert_eq!(template, expected);
}

#[test]
fn test_self_closing_and_empty_elements_match() {
    let self_closing = parse_source("<p />");
    let empty = parse_source("<p></p>");
    assert_eq!(self_closing, empty);
}

#[test]
fn test_parse_bare_and_spread_attributes() {
    let template = parse_source(r#"<Foo {...props} bar="1" disabled />"#);

    let expected = Template::new(vec![Node::XmlNode(XmlNode::new(
        "Foo",
        vec![
            Attr::Spread(ExpressionGroup::new(vec![Node::expression("props")])),
            Attr::Named(XmlAttr::new("bar", Node::text("1"))),
            Attr::Named(XmlAttr::new("disabled", Node::expression("true"))),
        ],
        vec![],
    ))]);
    assert_eq!(template, expected);
}

#[test]
fn test_parse_declarations_in_document_order() {
    let template = parse_source("{% if ok %}yes{% else %}no{% end %}");
    assert_eq!(
        template.children,
        vec![
            Node::declaration("if ok"),
            Node::text("yes"),
            Node::declaration("else"),
            Node::text("no"),
            Node::declaration("end"),
        ]
    );
}

#[test]
fn test_parse_expression_group_with_markup() {
    let template = parse_source("{show && <em>!</em>}");
    assert_eq!(
        template.children,
        vec![Node::ExpressionGroup(ExpressionGroup::new(vec![
            Node::expression("show && "),
            Node::XmlNode(XmlNode::new("em", vec![], vec![Node::text("!")])),
        ]))]
    );
}

#[test]
fn test_empty_expression_emits_nothing() {
    let template = parse_source("a{}b{  }");
    assert_eq!(template.children, vec![Node::text("a"), Node::text("b")]);
}

#[test]
fn test_brace_in_string_is_one_expression() {
    let template = parse_source(r#"{ "}" }"#);
    assert_eq!(template.children, vec![Node::expression(r#""}""#)]);
}

#[test]
fn test_spread_compiles_to_splat() {
    let code = compile(r#"<Foo {...props} bar="1" />"#).unwrap();
    assert!(code.contains(r#"tag.Foo(**props, bar: "1")"#));
}

#[test]
fn test_mismatched_close_tag_names_both() {
    let err = compile_err("<a><b></a>");
    assert_eq!(err.kind, ErrorKind::MismatchedCloseTag);
    assert_eq!(err.category(), ErrorCategory::Structural);
    assert!(err.message.contains("</b>"));
    assert!(err.message.contains("</a>"));
}

#[test]
fn test_lexical_errors() {
    for source in ["{open", "{% open", "<a href=\"x", "<div", "<a..b />"] {
        let err = compile_err(source);
        assert_eq!(err.category(), ErrorCategory::Lexical, "{}: {:?}", source, err.kind);
    }
}

#[test]
fn test_structural_errors() {
    let cases = [
        ("<div>", ErrorKind::UnclosedTag),
        ("</div>", ErrorKind::UnexpectedCloseTag),
        ("<div {x}></div>", ErrorKind::MalformedAttribute),
        ("<div a={}></div>", ErrorKind::MalformedAttribute),
        ("<div {...}></div>", ErrorKind::MalformedAttribute),
        ("<div a=\"1\" a=\"2\" />", ErrorKind::DuplicateAttribute),
        ("<div ariaLabel=\"a\" aria-label=\"b\" />", ErrorKind::DuplicateAttribute),
    ];
    for (source, kind) in cases {
        let err = compile_err(source);
        assert_eq!(err.kind, kind, "{}", source);
        assert_eq!(err.category(), ErrorCategory::Structural);
    }
}

fn nested(depth: usize) -> String {
    format!("{}{}", "<a>".repeat(depth), "</a>".repeat(depth))
}

#[test]
fn test_deep_nesting_is_an_error() {
    let err = compile_err(&nested(10_000));
    assert_eq!(err.kind, ErrorKind::NestingTooDeep);
    assert_eq!(err.category(), ErrorCategory::Structural);
    assert_eq!(err.span.start.byte, MAX_NESTING * "<a>".len());
    assert!(err.render(&nested(10_000), "deep.rbx").contains("Move part of the markup"));
}

#[test]
fn test_nesting_at_limit_compiles() {
    let code = compile(&nested(MAX_NESTING)).unwrap();
    assert_eq!(code.matches("tag.a()").count(), MAX_NESTING);
}

#[test]
fn test_parser_rejects_unbalanced_token_stream() {
    use rbx_transpiler::{Span, Token, TokenKind};

    let tokens = vec![
        Token::new(TokenKind::TagOpen, "<", Span::default()),
        Token::new(TokenKind::TagName, "p", Span::default()),
        Token::new(TokenKind::TagEnd, ">", Span::default()),
        Token::new(TokenKind::Text, "x", Span::default()),
        Token::new(TokenKind::Eof, "", Span::default()),
    ];
    assert_eq!(parse(tokens).unwrap_err().kind, ErrorKind::UnclosedTag);

    let tokens = vec![
        Token::new(TokenKind::AttrEquals, "=", Span::default()),
        Token::new(TokenKind::Eof, "", Span::default()),
    ];
    assert_eq!(parse(tokens).unwrap_err().kind, ErrorKind::UnexpectedToken);
}

#[test]
fn test_error_positions() {
    let err = compile_err("<ul>\n  <li>\n</ul>");
    assert_eq!(err.kind, ErrorKind::MismatchedCloseTag);
    assert_eq!(err.span.start.line, 2);
    assert_eq!(err.span.start.col, 0);
    let related = err.related_span.unwrap();
    assert_eq!((related.start.line, related.start.col), (1, 2));
}

#[test]
fn test_options_change_helpers() {
    let options = GenerateOptions {
        buffer_class: "ActionView::OutputBuffer".to_string(),
        tag_helper: "helpers.tag".to_string(),
        prelude: false,
    };
    let mut pipeline = Pipeline::standard();
    let result = pipeline.compile("<hr />", &options).unwrap();
    assert_eq!(
        result.code,
        "ActionView::OutputBuffer.new.tap do |output|\n  output << (helpers.tag.hr())\nend\n"
    );
}

#[test]
fn test_prelude_defines_buffer() {
    let options = GenerateOptions {
        prelude: true,
        ..GenerateOptions::default()
    };
    let mut pipeline = Pipeline::standard();
    let code = pipeline.compile("x", &options).unwrap().code;
    assert!(code.starts_with("class OutputBuffer < String\n  def <<(content)\n"));
    assert!(code.ends_with("OutputBuffer.new.tap do |output|\n  output << (\"x\")\nend\n"));
}

#[test]
fn test_options_deserialize_with_defaults() {
    let options: GenerateOptions = serde_json::from_str(r#"{"prelude": true}"#).unwrap();
    assert!(options.prelude);
    assert_eq!(options.buffer_class, "OutputBuffer");
    assert_eq!(options.tag_helper, "tag");
}

#[test]
fn test_compile_is_deterministic() {
    let source = r#"<Ui.Card b={2} a="1" {...rest}>{% x = 1 %}{x}</Ui.Card>"#;
    assert_eq!(compile(source).unwrap(), compile(source).unwrap());
}

#[test]
fn test_concurrent_compiles() {
    let handles: Vec<_> = (0..4)
        .map(|i| {
            std::thread::spawn(move || {
                let source = format!("<p>{}</p>", i);
                (source.clone(), compile(&source).unwrap())
            })
        })
        .collect();

    for handle in handles {
        let (source, code) = handle.join().unwrap();
        assert_eq!(code, compile(&source).unwrap());
    }
}
