//! Textual rendering of nodes.

use std::fmt;

use crate::errors::DispatchError;
use crate::hierarchy::{Node, View};
use crate::traversal::Handlers;

/// Output syntax of [`format`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Syntax {
    /// Fully parenthesised infix, e.g. `(p U (! q))`.
    #[default]
    Native,
    /// Prefix form, e.g. `(U p (! q))`.
    SExpression,
}

fn call(name: &str, args: &[String]) -> String {
    format!("{name}({})", args.join(", "))
}

fn render(syntax: Syntax, node: &Node, children: Vec<String>) -> String {
    let view = node.view();
    match (syntax, view) {
        (_, View::Boolean(b)) => b.to_string(),
        (_, View::Proposition(s)) | (_, View::Variable(s)) => s.name().to_string(),
        (_, View::Constant(n)) => n.to_string(),

        (Syntax::Native, View::Atom(s, _)) | (Syntax::Native, View::Application(s, _)) => {
            call(s.name(), &children)
        }
        (Syntax::Native, View::Quantifier(tag, s, _)) => {
            format!("({} {} . {})", tag.symbol(), s.name(), children[0])
        }
        (Syntax::Native, View::Unary(tag, _)) | (Syntax::Native, View::UnaryTerm(tag, _)) => {
            format!("({} {})", tag.symbol(), children[0])
        }
        (Syntax::Native, View::Binary(tag, _, _))
        | (Syntax::Native, View::BinaryTerm(tag, _, _))
        | (Syntax::Native, View::Comparison(tag, _, _)) => {
            format!("({} {} {})", children[0], tag.symbol(), children[1])
        }

        (Syntax::SExpression, View::Atom(s, _))
        | (Syntax::SExpression, View::Application(s, _)) => {
            let mut parts = vec![s.name().to_string()];
            parts.extend(children);
            format!("({})", parts.join(" "))
        }
        (Syntax::SExpression, View::Quantifier(tag, s, _)) => {
            format!("({} {} {})", tag.symbol(), s.name(), children[0])
        }
        (Syntax::SExpression, _) => {
            let mut parts = vec![node.tag().symbol().to_string()];
            parts.extend(children);
            format!("({})", parts.join(" "))
        }
    }
}

/// Render `node` in the given syntax.
pub fn format(syntax: Syntax, node: &Node) -> String {
    let handlers: Handlers<'_, String, DispatchError> =
        Handlers::new().otherwise(move |n, children| Ok(render(syntax, n, children)));
    // The catch-all accepts every tag.
    handlers.rewrite(node).unwrap_or_default()
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&format(Syntax::Native, self))
    }
}
