//! Property checks over generated templates
//!
//! Every trial builds a batch of random templates from a fixed seed, so
//! failures are reproducible.
//!
//! Run with: cargo test --test invariants

use libtest_mimic::{Arguments, Failed, Trial};
use rbx_transpiler::ast::ExpressionGroup;
use rbx_transpiler::{
    Attr, Node, Template, TokenKind, XmlAttr, XmlNode, compile, parse, tokenize,
};

const SEED: u64 = 0x5eed_7e3b_1a7e_0001;
const CASES: usize = 200;

fn main() {
    let args = Arguments::from_args();
    let trials = vec![
        Trial::test("text_survives_compilation", text_survives_compilation),
        Trial::test("parse_inverts_render", parse_inverts_render),
        Trial::test("one_node_per_tag_open", one_node_per_tag_open),
        Trial::test("blocks_are_balanced", blocks_are_balanced),
        Trial::test("compilation_is_idempotent", compilation_is_idempotent),
        Trial::test("prefixes_fail_cleanly", prefixes_fail_cleanly),
    ];
    libtest_mimic::run(&args, trials).exit();
}

/// xorshift64*, enough to drive the generators
struct Rng(u64);

impl Rng {
    fn new(seed: u64) -> Self {
        Self(seed)
    }

    fn next(&mut self) -> u64 {
        let mut x = self.0;
        x ^= x >> 12;
        x ^= x << 25;
        x ^= x >> 27;
        self.0 = x;
        x.wrapping_mul(0x2545_f491_4f6c_dd1d)
    }

    fn below(&mut self, n: usize) -> usize {
        (self.next() % n as u64) as usize
    }

    fn pick<'a>(&mut self, items: &[&'a str]) -> &'a str {
        items[self.below(items.len())]
    }
}

const TEXT_CHARS: &[char] = &[
    'a', 'b', 'Z', ' ', ' ', '\n', '\t', '"', '\'', '#', '@', '$', '{', '}', '<', '>', '\\', '%',
    '&', 'é', '✓',
];
const ELEMENTS: &[&str] = &["div", "p", "span", "my-widget", "Card", "Ui.Button"];
const ATTRS: &[&str] = &["class", "id", "data-role", "aria-label", "hx-get", "title"];
const EXPRESSIONS: &[&str] = &["name", "user.name", "items.count", "format(price)", "@title"];

/// Random text content and the source that spells it
fn random_text(rng: &mut Rng) -> (String, String) {
    let len = 1 + rng.below(12);
    let mut content: String = (0..len).map(|_| TEXT_CHARS[rng.below(TEXT_CHARS.len())]).collect();
    if content.ends_with('\\') {
        content.push('x');
    }

    let mut source = String::new();
    for ch in content.chars() {
        if matches!(ch, '{' | '}' | '<') {
            source.push('\\');
        }
        source.push(ch);
    }
    (content, source)
}

/// Random element tree and its source
fn random_element(rng: &mut Rng, depth: usize) -> (Node, String) {
    let name = rng.pick(ELEMENTS);
    let mut source = format!("<{}", name);
    let mut attrs = Vec::new();

    let attr_count = rng.below(3);
    let offset = rng.below(ATTRS.len());
    for i in 0..attr_count {
        let attr_name = ATTRS[(offset + i) % ATTRS.len()];
        match rng.below(3) {
            0 => {
                let value = rng.pick(&["box", "a b", "x-1", "#top"]);
                source.push_str(&format!(" {}=\"{}\"", attr_name, value));
                attrs.push(Attr::Named(XmlAttr::new(attr_name, Node::text(value))));
            }
            1 => {
                let expr = rng.pick(EXPRESSIONS);
                source.push_str(&format!(" {}={{{}}}", attr_name, expr));
                attrs.push(Attr::Named(XmlAttr::new(attr_name, Node::expression(expr))));
            }
            _ => {
                let expr = rng.pick(&["props", "opts.merge(x: 1)"]);
                source.push_str(&format!(" {{...{}}}", expr));
                attrs.push(Attr::Spread(ExpressionGroup::new(vec![Node::expression(expr)])));
            }
        }
    }

    let (children, body) = random_children(rng, depth + 1);
    if children.is_empty() && rng.below(2) == 0 {
        source.push_str(" />");
    } else {
        source.push('>');
        source.push_str(&body);
        source.push_str(&format!("</{}>", name));
    }

    (Node::XmlNode(XmlNode::new(name, attrs, children)), source)
}

/// Random sibling list with no two adjacent text nodes
fn random_children(rng: &mut Rng, depth: usize) -> (Vec<Node>, String) {
    let mut nodes = Vec::new();
    let mut source = String::new();
    if depth > 3 {
        return (nodes, source);
    }

    let mut last_was_text = false;
    for _ in 0..rng.below(4) {
        let choice = rng.below(4);
        if choice == 0 && !last_was_text {
            let (content, text_source) = random_text(rng);
            nodes.push(Node::text(content));
            source.push_str(&text_source);
            last_was_text = true;
            continue;
        }

        last_was_text = false;
        if choice == 1 {
            let expr = rng.pick(EXPRESSIONS);
            source.push_str(&format!("{{{}}}", expr));
            nodes.push(Node::expression(expr));
        } else {
            let (node, element_source) = random_element(rng, depth);
            nodes.push(node);
            source.push_str(&element_source);
        }
    }
    (nodes, source)
}

fn random_template(rng: &mut Rng) -> (Template, String) {
    let (children, source) = random_children(rng, 0);
    (Template::new(children), source)
}

/// Read back a double-quoted Ruby literal written by the generator
fn unquote_ruby(literal: &str) -> Option<String> {
    let inner = literal.strip_prefix('"')?.strip_suffix('"')?;
    let mut out = String::new();
    let mut chars = inner.chars();
    while let Some(ch) = chars.next() {
        if ch != '\\' {
            out.push(ch);
            continue;
        }
        match chars.next()? {
            'n' => out.push('\n'),
            'r' => out.push('\r'),
            't' => out.push('\t'),
            other => out.push(other),
        }
    }
    Some(out)
}

/// Whether Ruby would interpolate anything inside the literal
fn interpolates(literal: &str) -> bool {
    let mut chars = literal.chars().peekable();
    while let Some(ch) = chars.next() {
        match ch {
            '\\' => {
                chars.next();
            }
            '#' if matches!(chars.peek(), Some('{' | '@' | '$')) => return true,
            _ => {}
        }
    }
    false
}

fn text_survives_compilation() -> Result<(), Failed> {
    let mut rng = Rng::new(SEED);
    for _ in 0..CASES {
        let (content, source) = random_text(&mut rng);
        let code = compile(&source).map_err(|e| format!("{:?}: {}", source, e))?;

        let line = code
            .lines()
            .nth(1)
            .ok_or_else(|| format!("no body line for {:?}", source))?;
        let literal = line
            .trim()
            .strip_prefix("output << (")
            .and_then(|rest| rest.strip_suffix(')'))
            .ok_or_else(|| format!("unexpected line {:?}", line))?;

        if interpolates(literal) {
            return Err(format!("interpolation left in {:?}", literal).into());
        }
        if unquote_ruby(literal).as_deref() != Some(content.as_str()) {
            return Err(format!("{:?} compiled to {}", content, literal).into());
        }
    }
    Ok(())
}

fn parse_inverts_render() -> Result<(), Failed> {
    let mut rng = Rng::new(SEED ^ 1);
    for _ in 0..CASES {
        let (expected, source) = random_template(&mut rng);
        let tokens = tokenize(&source).map_err(|e| format!("{:?}: {}", source, e))?;
        let template = parse(tokens).map_err(|e| format!("{:?}: {}", source, e))?;
        if template != expected {
            return Err(format!(
                "{:?}\n--- expected ---\n{:#?}\n--- actual ---\n{:#?}",
                source, expected, template
            )
            .into());
        }
    }
    Ok(())
}

fn count_elements(nodes: &[Node]) -> usize {
    nodes
        .iter()
        .map(|node| match node {
            Node::XmlNode(xml) => {
                let in_attrs: usize = xml
                    .attrs
                    .iter()
                    .map(|attr| match attr {
                        Attr::Named(named) => count_elements(std::slice::from_ref(&named.value)),
                        Attr::Spread(group) => count_elements(&group.statements),
                    })
                    .sum();
                1 + in_attrs + count_elements(&xml.children)
            }
            Node::ExpressionGroup(group) => count_elements(&group.statements),
            _ => 0,
        })
        .sum()
}

fn one_node_per_tag_open() -> Result<(), Failed> {
    let mut rng = Rng::new(SEED ^ 2);
    for _ in 0..CASES {
        let (_, source) = random_template(&mut rng);
        let tokens = tokenize(&source).map_err(|e| e.to_string())?;
        let opens = tokens
            .iter()
            .filter(|t| t.kind == TokenKind::TagOpen)
            .count();
        let template = parse(tokens).map_err(|e| e.to_string())?;
        let nodes = count_elements(&template.children);
        if nodes != opens {
            return Err(format!("{:?}: {} tags, {} nodes", source, opens, nodes).into());
        }
    }
    Ok(())
}

fn blocks_are_balanced() -> Result<(), Failed> {
    let mut rng = Rng::new(SEED ^ 3);
    for _ in 0..CASES {
        let (_, source) = random_template(&mut rng);
        let code = compile(&source).map_err(|e| e.to_string())?;

        let mut depth: i64 = 0;
        for line in code.lines() {
            let trimmed = line.trim();
            if trimmed.ends_with(" do") || trimmed.ends_with(" do |output|") {
                depth += 1;
            }
            if trimmed.starts_with("end") {
                depth -= 1;
            }
            if depth < 0 {
                return Err(format!("{:?}: early end\n{}", source, code).into());
            }
        }
        if depth != 0 {
            return Err(format!("{:?}: {} open blocks\n{}", source, depth, code).into());
        }
    }
    Ok(())
}

fn compilation_is_idempotent() -> Result<(), Failed> {
    let mut rng = Rng::new(SEED ^ 4);
    for _ in 0..CASES {
        let (_, source) = random_template(&mut rng);
        let first = compile(&source).map_err(|e| e.to_string())?;
        let second = compile(&source).map_err(|e| e.to_string())?;
        if first != second {
            return Err(format!("{:?} compiled two ways", source).into());
        }
    }
    Ok(())
}

fn prefixes_fail_cleanly() -> Result<(), Failed> {
    let mut rng = Rng::new(SEED ^ 5);
    for _ in 0..CASES / 4 {
        let (_, source) = random_template(&mut rng);
        for (cut, _) in source.char_indices() {
            let prefix = &source[..cut];
            let Err(err) = compile(prefix) else {
                continue;
            };
            let in_bounds = |byte: usize| byte <= prefix.len();
            if !in_bounds(err.span.start.byte) || !in_bounds(err.span.end.byte) {
                return Err(format!("{:?}: span out of bounds {:?}", prefix, err.span).into());
            }
            if let Some(related) = err.related_span {
                if !in_bounds(related.end.byte) {
                    return Err(format!("{:?}: related span out of bounds", prefix).into());
                }
            }
            // Rendering must cope with every error position
            err.render(prefix, "prefix.rbx");
        }
    }
    Ok(())
}
