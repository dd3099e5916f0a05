//! Fallback-chain grammar parser.
//!
//! Turns raw markup into the immutable node tree [`super::Template`]
//! evaluates. Two passes: a scanner splits the text into literal runs and
//! `{{…}}` tags, then a stack builds the section tree and rejects
//! structural errors. All errors here are configuration errors — callers
//! compile at definition-load time, never at render time.

use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum CompileError {
    #[error("unterminated {{{{ token at byte {0}")]
    UnterminatedToken(usize),
    #[error("empty {{{{}}}} token")]
    EmptyToken,
    #[error("unterminated quoted literal in \"{0}\"")]
    UnterminatedLiteral(String),
    #[error("field lookup after the literal default in \"{0}\" — the literal must come last")]
    LookupAfterDefault(String),
    #[error("invalid field path \"{0}\"")]
    InvalidPath(String),
    #[error("{{{{else}}}} outside a section block")]
    MisplacedElse,
    #[error("second {{{{else}}}} in section \"{0}\"")]
    DuplicateElse(String),
    #[error("{{{{/{0}}}}} without a matching open tag")]
    UnmatchedClose(String),
    #[error("section \"{0}\" closed as \"{1}\"")]
    MismatchedClose(String, String),
    #[error("section \"{0}\" is never closed")]
    UnclosedSection(String),
}

/// Dot-separated lookup path, split into segments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldPath(pub Vec<String>);

impl FieldPath {
    pub fn dotted(&self) -> String {
        self.0.join(".")
    }
}

/// An ordered fallback chain: lookups tried first-match-wins, then the
/// literal default (empty string when omitted).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldChain {
    pub lookups: Vec<FieldPath>,
    pub default: Option<String>,
}

/// One instruction in a compiled template.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Literal(String),
    Field(FieldChain),
    Section {
        path: FieldPath,
        body: Vec<Node>,
        else_body: Vec<Node>,
    },
}

/// Scanner output: literal runs and the inside of `{{…}}` tags.
enum Token {
    Literal(String),
    Tag(String),
}

pub fn parse(markup: &str) -> Result<Vec<Node>, CompileError> {
    build_tree(scan(markup)?)
}

fn scan(markup: &str) -> Result<Vec<Token>, CompileError> {
    let mut tokens = Vec::new();
    let mut rest = markup;
    let mut offset = 0;

    while let Some(open) = rest.find("{{") {
        if open > 0 {
            tokens.push(Token::Literal(rest[..open].to_string()));
        }
        let after_open = &rest[open + 2..];
        let close = after_open
            .find("}}")
            .ok_or(CompileError::UnterminatedToken(offset + open))?;
        let inner = after_open[..close].trim();
        if inner.is_empty() {
            return Err(CompileError::EmptyToken);
        }
        tokens.push(Token::Tag(inner.to_string()));
        let consumed = open + 2 + close + 2;
        offset += consumed;
        rest = &rest[consumed..];
    }
    if !rest.is_empty() {
        tokens.push(Token::Literal(rest.to_string()));
    }
    Ok(tokens)
}

/// A frame on the section stack while the tree is assembled.
struct Frame {
    path: FieldPath,
    body: Vec<Node>,
    else_body: Vec<Node>,
    in_else: bool,
}

impl Frame {
    fn push(&mut self, node: Node) {
        if self.in_else {
            self.else_body.push(node);
        } else {
            self.body.push(node);
        }
    }
}

fn build_tree(tokens: Vec<Token>) -> Result<Vec<Node>, CompileError> {
    let mut root = Vec::new();
    let mut stack: Vec<Frame> = Vec::new();

    let emit = |stack: &mut Vec<Frame>, root: &mut Vec<Node>, node: Node| {
        match stack.last_mut() {
            Some(frame) => frame.push(node),
            None => root.push(node),
        }
    };

    for token in tokens {
        match token {
            Token::Literal(text) => emit(&mut stack, &mut root, Node::Literal(text)),
            Token::Tag(tag) => {
                if let Some(path) = tag.strip_prefix('#') {
                    stack.push(Frame {
                        path: parse_path(path.trim())?,
                        body: Vec::new(),
                        else_body: Vec::new(),
                        in_else: false,
                    });
                } else if tag == "else" {
                    let frame = stack.last_mut().ok_or(CompileError::MisplacedElse)?;
                    if frame.in_else {
                        return Err(CompileError::DuplicateElse(frame.path.dotted()));
                    }
                    frame.in_else = true;
                } else if let Some(path) = tag.strip_prefix('/') {
                    let close = parse_path(path.trim())?;
                    let frame = stack
                        .pop()
                        .ok_or_else(|| CompileError::UnmatchedClose(close.dotted()))?;
                    if frame.path != close {
                        return Err(CompileError::MismatchedClose(
                            frame.path.dotted(),
                            close.dotted(),
                        ));
                    }
                    emit(
                        &mut stack,
                        &mut root,
                        Node::Section {
                            path: frame.path,
                            body: frame.body,
                            else_body: frame.else_body,
                        },
                    );
                } else {
                    emit(&mut stack, &mut root, Node::Field(parse_chain(&tag)?));
                }
            }
        }
    }

    if let Some(frame) = stack.pop() {
        return Err(CompileError::UnclosedSection(frame.path.dotted()));
    }
    Ok(root)
}

/// Parse the inside of a field token: `path | path | 'literal'`.
fn parse_chain(tag: &str) -> Result<FieldChain, CompileError> {
    let mut lookups = Vec::new();
    let mut default = None;

    for part in split_chain(tag)? {
        let part = part.trim();
        if part.is_empty() {
            return Err(CompileError::InvalidPath(tag.to_string()));
        }
        if default.is_some() {
            // Nothing may follow the literal default.
            return Err(CompileError::LookupAfterDefault(tag.to_string()));
        }
        if let Some(stripped) = strip_literal(part) {
            default = Some(stripped?);
        } else {
            lookups.push(parse_path(part)?);
        }
    }

    if lookups.is_empty() && default.is_none() {
        return Err(CompileError::EmptyToken);
    }
    Ok(FieldChain { lookups, default })
}

/// Split chain parts on `|`, honouring quotes so literals may contain pipes.
fn split_chain(tag: &str) -> Result<Vec<String>, CompileError> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut quote: Option<char> = None;

    for c in tag.chars() {
        match quote {
            Some(q) => {
                current.push(c);
                if c == q {
                    quote = None;
                }
            }
            None => match c {
                '\'' | '"' => {
                    quote = Some(c);
                    current.push(c);
                }
                '|' => {
                    parts.push(std::mem::take(&mut current));
                }
                _ => current.push(c),
            },
        }
    }
    if quote.is_some() {
        return Err(CompileError::UnterminatedLiteral(tag.to_string()));
    }
    parts.push(current);
    Ok(parts)
}

/// A part is a literal when it starts with a quote. Returns its unquoted
/// contents, or an error when the closing quote is missing.
fn strip_literal(part: &str) -> Option<Result<String, CompileError>> {
    let quote = part.chars().next().filter(|c| *c == '\'' || *c == '"')?;
    let inner = &part[1..];
    Some(match inner.strip_suffix(quote) {
        Some(text) if !text.contains(quote) => Ok(text.to_string()),
        _ => Err(CompileError::UnterminatedLiteral(part.to_string())),
    })
}

fn parse_path(raw: &str) -> Result<FieldPath, CompileError> {
    if raw.is_empty() {
        return Err(CompileError::InvalidPath(raw.to_string()));
    }
    let segments: Vec<String> = raw.split('.').map(str::to_string).collect();
    for segment in &segments {
        let valid = !segment.is_empty()
            && segment
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if !valid {
            return Err(CompileError::InvalidPath(raw.to_string()));
        }
    }
    Ok(FieldPath(segments))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path(p: &str) -> FieldPath {
        FieldPath(p.split('.').map(str::to_string).collect())
    }

    #[test]
    fn plain_text_is_one_literal() {
        let nodes = parse("<h1>Hello</h1>").unwrap();
        assert_eq!(nodes, vec![Node::Literal("<h1>Hello</h1>".to_string())]);
    }

    #[test]
    fn single_lookup_no_default() {
        let nodes = parse("{{catalogue.name}}").unwrap();
        assert_eq!(
            nodes,
            vec![Node::Field(FieldChain {
                lookups: vec![path("catalogue.name")],
                default: None,
            })]
        );
    }

    #[test]
    fn three_part_chain() {
        let nodes = parse("{{catalogue.name | profile.company_name | 'Untitled'}}").unwrap();
        assert_eq!(
            nodes,
            vec![Node::Field(FieldChain {
                lookups: vec![path("catalogue.name"), path("profile.company_name")],
                default: Some("Untitled".to_string()),
            })]
        );
    }

    #[test]
    fn double_quoted_literal() {
        let nodes = parse("{{name | \"n/a\"}}").unwrap();
        match &nodes[0] {
            Node::Field(chain) => assert_eq!(chain.default.as_deref(), Some("n/a")),
            other => panic!("expected field node, got {other:?}"),
        }
    }

    #[test]
    fn literal_may_contain_pipes() {
        let nodes = parse("{{name | 'a | b'}}").unwrap();
        match &nodes[0] {
            Node::Field(chain) => assert_eq!(chain.default.as_deref(), Some("a | b")),
            other => panic!("expected field node, got {other:?}"),
        }
    }

    #[test]
    fn section_with_else() {
        let nodes = parse("{{#products}}x{{else}}y{{/products}}").unwrap();
        assert_eq!(
            nodes,
            vec![Node::Section {
                path: path("products"),
                body: vec![Node::Literal("x".to_string())],
                else_body: vec![Node::Literal("y".to_string())],
            }]
        );
    }

    #[test]
    fn nested_sections() {
        let nodes =
            parse("{{#categories}}{{#products}}{{name}}{{/products}}{{/categories}}").unwrap();
        match &nodes[0] {
            Node::Section { path: outer, body, .. } => {
                assert_eq!(outer, &path("categories"));
                assert!(matches!(&body[0], Node::Section { path: p, .. } if p == &path("products")));
            }
            other => panic!("expected section, got {other:?}"),
        }
    }

    #[test]
    fn literal_text_surrounding_tokens_is_preserved() {
        let nodes = parse("a{{x}}b{{y}}c").unwrap();
        assert_eq!(nodes.len(), 5);
        assert_eq!(nodes[0], Node::Literal("a".to_string()));
        assert_eq!(nodes[4], Node::Literal("c".to_string()));
    }

    // =========================================================================
    // Errors
    // =========================================================================

    #[test]
    fn unterminated_token() {
        assert_eq!(parse("hi {{name"), Err(CompileError::UnterminatedToken(3)));
    }

    #[test]
    fn empty_token() {
        assert_eq!(parse("{{}}"), Err(CompileError::EmptyToken));
        assert_eq!(parse("{{   }}"), Err(CompileError::EmptyToken));
    }

    #[test]
    fn lookup_after_default_is_rejected() {
        assert_eq!(
            parse("{{'lit' | name}}"),
            Err(CompileError::LookupAfterDefault("'lit' | name".to_string()))
        );
    }

    #[test]
    fn unterminated_literal() {
        assert!(matches!(
            parse("{{name | 'oops}}"),
            Err(CompileError::UnterminatedLiteral(_))
        ));
    }

    #[test]
    fn invalid_path_characters() {
        assert!(matches!(
            parse("{{pro ducts}}"),
            Err(CompileError::InvalidPath(_))
        ));
        assert!(matches!(parse("{{a..b}}"), Err(CompileError::InvalidPath(_))));
    }

    #[test]
    fn unclosed_section() {
        assert_eq!(
            parse("{{#products}}x"),
            Err(CompileError::UnclosedSection("products".to_string()))
        );
    }

    #[test]
    fn unmatched_close() {
        assert_eq!(
            parse("x{{/products}}"),
            Err(CompileError::UnmatchedClose("products".to_string()))
        );
    }

    #[test]
    fn mismatched_close() {
        assert_eq!(
            parse("{{#products}}x{{/categories}}"),
            Err(CompileError::MismatchedClose(
                "products".to_string(),
                "categories".to_string()
            ))
        );
    }

    #[test]
    fn else_outside_section() {
        assert_eq!(parse("{{else}}"), Err(CompileError::MisplacedElse));
    }

    #[test]
    fn duplicate_else() {
        assert_eq!(
            parse("{{#p}}a{{else}}b{{else}}c{{/p}}"),
            Err(CompileError::DuplicateElse("p".to_string()))
        );
    }
}
