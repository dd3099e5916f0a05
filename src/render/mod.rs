//! Fallback-chain markup rendering.
//!
//! Markup templates embed field references with a first-match-wins fallback
//! grammar:
//!
//! ```text
//! {{catalogue.name | profile.company_name | 'Product Catalogue'}}
//! ```
//!
//! An ordered list of dot-separated field lookups, optionally ending in a
//! quoted literal default. The first lookup resolving to a present,
//! non-empty value wins; if nothing resolves and no literal is given, the
//! token renders as the empty string (defined behaviour, not an error).
//!
//! Collections render through section blocks:
//!
//! ```text
//! {{#products}}
//!   <article>{{name | 'Untitled'}} — {{price_display | 'Price on request'}}</article>
//! {{else}}
//!   <p>No products yet.</p>
//! {{/products}}
//! ```
//!
//! An array iterates the body once per element with the element as the
//! innermost lookup scope; an empty or absent array falls through to the
//! `else` branch. A present object renders the body once inside that
//! object's scope.
//!
//! ## Compile once, render many
//!
//! Raw markup is parsed exactly once ([`Template::compile`]) into an
//! immutable node tree; rendering evaluates that tree against a JSON scope.
//! Syntax errors (unterminated tokens, unbalanced or mismatched section
//! tags) surface at compile time — which the store runs at template load —
//! so rendering itself cannot fail: same template, same scope, same output,
//! no I/O, no mutation.
//!
//! ## Presence
//!
//! One rule for every field kind: a value is *present* iff the path exists,
//! the value is not null, strings are non-blank, arrays are non-empty.

mod eval;
mod parser;

pub use eval::is_present;
pub use parser::{CompileError, FieldChain, FieldPath, Node};

use serde_json::Value;

/// A compiled markup template: an immutable instruction tree ready to
/// evaluate against any content scope.
#[derive(Debug, Clone)]
pub struct Template {
    nodes: Vec<Node>,
}

impl Template {
    /// Parse raw markup into a template. All grammar errors surface here.
    pub fn compile(markup: &str) -> Result<Self, CompileError> {
        Ok(Self {
            nodes: parser::parse(markup)?,
        })
    }

    /// Evaluate against a scope. Pure: borrows the scope, allocates only
    /// the output string.
    pub fn render(&self, scope: &Value) -> String {
        eval::render(&self.nodes, scope)
    }

    /// The parsed instruction tree (used by tests and diagnostics).
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn render_twice_is_byte_identical() {
        let template = Template::compile(
            "{{catalogue.name | 'Untitled'}}: {{#products}}[{{name}}]{{else}}none{{/products}}",
        )
        .unwrap();
        let scope = json!({
            "catalogue": {"name": "Autumn"},
            "products": [{"name": "Chair"}, {"name": "Table"}],
        });

        let first = template.render(&scope);
        let second = template.render(&scope);
        assert_eq!(first, second);
        assert_eq!(first, "Autumn: [Chair][Table]");
    }

    #[test]
    fn render_does_not_mutate_the_scope() {
        let template = Template::compile("{{#products}}{{name}}{{/products}}").unwrap();
        let scope = json!({"products": [{"name": "Chair"}]});
        let before = scope.clone();
        template.render(&scope);
        assert_eq!(scope, before);
    }
}
