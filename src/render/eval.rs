//! Instruction-tree evaluation.
//!
//! Walks a compiled node tree against a JSON scope. Lookup scopes form a
//! stack: section iteration pushes the current element as the innermost
//! frame, and paths resolve innermost-first, so `{{name}}` inside
//! `{{#products}}` means the product's name while `{{catalogue.name}}`
//! still reaches the root.

use super::parser::{FieldChain, FieldPath, Node};
use serde_json::Value;

/// The uniform presence rule, shared by scalar fallback, section fallback
/// and content-gap validation: not null, strings non-blank, arrays
/// non-empty.
pub fn is_present(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::String(s) => !s.trim().is_empty(),
        Value::Array(items) => !items.is_empty(),
        _ => true,
    }
}

pub(super) fn render(nodes: &[Node], scope: &Value) -> String {
    let mut out = String::new();
    let mut frames = vec![scope];
    render_nodes(nodes, &mut frames, &mut out);
    out
}

fn render_nodes<'a>(nodes: &'a [Node], frames: &mut Vec<&'a Value>, out: &mut String) {
    for node in nodes {
        match node {
            Node::Literal(text) => out.push_str(text),
            Node::Field(chain) => out.push_str(&resolve_chain(chain, frames)),
            Node::Section { path, body, else_body } => {
                match lookup(frames, path).filter(|v| is_present(v)) {
                    Some(Value::Array(items)) => {
                        for item in items {
                            frames.push(item);
                            render_nodes(body, frames, out);
                            frames.pop();
                        }
                    }
                    Some(object @ Value::Object(_)) => {
                        frames.push(object);
                        render_nodes(body, frames, out);
                        frames.pop();
                    }
                    Some(_) => render_nodes(body, frames, out),
                    None => render_nodes(else_body, frames, out),
                }
            }
        }
    }
}

/// First present lookup wins; otherwise the literal default; otherwise "".
fn resolve_chain(chain: &FieldChain, frames: &[&Value]) -> String {
    chain
        .lookups
        .iter()
        .find_map(|path| lookup(frames, path).and_then(scalar_string))
        .or_else(|| chain.default.clone())
        .unwrap_or_default()
}

/// Resolve a path against the scope stack, innermost frame first. A frame
/// only matches when the full path traverses — a partial match does not
/// shadow outer frames.
fn lookup<'a>(frames: &[&'a Value], path: &FieldPath) -> Option<&'a Value> {
    frames.iter().rev().find_map(|frame| {
        path.0
            .iter()
            .try_fold(*frame, |value, segment| value.get(segment))
    })
}

/// Substitutable value for a scalar field reference. Collections and
/// objects have no text form and count as absent, so the chain keeps
/// falling back.
fn scalar_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => {
            let trimmed = s.trim();
            (!trimmed.is_empty()).then(|| s.clone())
        }
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}
