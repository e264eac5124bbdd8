//! Tag-dispatch traversal over hierarchy nodes.
//!
//! A [`Handlers`] value maps tags (or whole tag classes) to functions that
//! receive a node together with the already-computed results of its
//! children. [`Handlers::rewrite`] walks the node bottom-up with an explicit
//! stack and a memo keyed by node identity, so shared subterms are processed
//! once and arbitrarily deep formulas cannot overflow the call stack.
//!
//! [`scan`] is the eager counterpart for existence queries: it walks
//! top-down and stops at the first hit.

use indexmap::IndexSet;
use std::collections::{HashMap, HashSet};
use std::fmt;

use crate::alphabet::Alphabet;
use crate::errors::{ConstructionError, DispatchError};
use crate::hierarchy::{Node, Tag, TagClass};
use crate::symbol::Symbol;

/// What a handler matches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Pattern {
    Tag(Tag),
    Class(TagClass),
}

impl Pattern {
    pub fn matches(self, tag: Tag) -> bool {
        match self {
            Pattern::Tag(t) => t == tag,
            Pattern::Class(class) => tag.is(class),
        }
    }
}

impl From<Tag> for Pattern {
    fn from(tag: Tag) -> Self {
        Pattern::Tag(tag)
    }
}

impl From<TagClass> for Pattern {
    fn from(class: TagClass) -> Self {
        Pattern::Class(class)
    }
}

type Handler<'h, R, E> = Box<dyn Fn(&Node, Vec<R>) -> Result<R, E> + 'h>;

/// Ordered set of handlers with an optional catch-all.
///
/// Dispatch picks an exact tag handler first, then a class handler, then the
/// catch-all. Among handlers of the same kind the one declared first wins.
pub struct Handlers<'h, R, E> {
    entries: Vec<(Pattern, Handler<'h, R, E>)>,
    fallback: Option<Handler<'h, R, E>>,
}

impl<'h, R, E> Default for Handlers<'h, R, E> {
    fn default() -> Self {
        Handlers {
            entries: Vec::new(),
            fallback: None,
        }
    }
}

impl<'h, R, E> fmt::Debug for Handlers<'h, R, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let patterns: Vec<_> = self.entries.iter().map(|(p, _)| p).collect();
        f.debug_struct("Handlers")
            .field("patterns", &patterns)
            .field("catch_all", &self.fallback.is_some())
            .finish()
    }
}

impl<'h, R, E> Handlers<'h, R, E>
where
    R: Clone,
    E: From<DispatchError>,
{
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler for a tag or a tag class.
    pub fn on(
        mut self,
        pattern: impl Into<Pattern>,
        handler: impl Fn(&Node, Vec<R>) -> Result<R, E> + 'h,
    ) -> Self {
        self.entries.push((pattern.into(), Box::new(handler)));
        self
    }

    /// Register the catch-all. A later call replaces an earlier one.
    pub fn otherwise(mut self, handler: impl Fn(&Node, Vec<R>) -> Result<R, E> + 'h) -> Self {
        self.fallback = Some(Box::new(handler));
        self
    }

    fn handler_for(&self, tag: Tag) -> Option<&Handler<'h, R, E>> {
        let exact = self
            .entries
            .iter()
            .find(|(p, _)| matches!(p, Pattern::Tag(t) if *t == tag));
        let class = || {
            self.entries
                .iter()
                .find(|(p, _)| matches!(p, Pattern::Class(_)) && p.matches(tag))
        };
        exact
            .or_else(class)
            .map(|(_, h)| h)
            .or(self.fallback.as_ref())
    }

    /// Whether some handler (or the catch-all) accepts `tag`.
    pub fn covers(&self, tag: Tag) -> bool {
        self.handler_for(tag).is_some()
    }

    /// Rewrite `node` bottom-up.
    pub fn rewrite(&self, node: &Node) -> Result<R, E> {
        let mut memo = HashMap::new();
        self.rewrite_into(node, &mut memo)
    }

    /// Rewrite several roots, sharing results between them.
    pub fn rewrite_all<'n>(
        &self,
        nodes: impl IntoIterator<Item = &'n Node>,
    ) -> Result<Vec<R>, E> {
        let mut memo = HashMap::new();
        nodes
            .into_iter()
            .map(|node| self.rewrite_into(node, &mut memo))
            .collect()
    }

    fn rewrite_into(&self, root: &Node, memo: &mut HashMap<Node, R>) -> Result<R, E> {
        let mut stack: Vec<(Node, bool)> = vec![(root.clone(), false)];
        while let Some((node, expanded)) = stack.pop() {
            if memo.contains_key(&node) {
                continue;
            }
            if !expanded {
                stack.push((node.clone(), true));
                for child in node.children().iter().rev() {
                    if !memo.contains_key(child) {
                        stack.push((child.clone(), false));
                    }
                }
                continue;
            }
            let handler = self
                .handler_for(node.tag())
                .ok_or(DispatchError { tag: node.tag() })?;
            let args = node.children().iter().map(|c| memo[c].clone()).collect();
            let value = handler(&node, args)?;
            memo.insert(node, value);
        }
        Ok(memo[root].clone())
    }
}

impl<'h, E> Handlers<'h, Node, E>
where
    E: From<DispatchError> + From<ConstructionError>,
{
    /// Handlers whose catch-all rebuilds each node over its rewritten
    /// children. Add specific handlers with [`Handlers::on`].
    pub fn rebuilding(sigma: &Alphabet) -> Self {
        let sigma = sigma.clone();
        Handlers::new().otherwise(move |node, children| Ok(sigma.rebuild(node, children)?))
    }
}

/// Result of a [`scan`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanOutcome {
    /// First node satisfying the predicate, in pre-order.
    pub found: Option<Node>,
    /// Distinct nodes inspected before stopping.
    pub visited: usize,
}

/// Pre-order search that stops at the first node satisfying `pred`.
pub fn scan(node: &Node, mut pred: impl FnMut(&Node) -> bool) -> ScanOutcome {
    let mut seen: HashSet<Node> = HashSet::new();
    let mut stack = vec![node.clone()];
    let mut visited = 0;
    while let Some(current) = stack.pop() {
        if !seen.insert(current.clone()) {
            continue;
        }
        visited += 1;
        if pred(&current) {
            return ScanOutcome {
                found: Some(current),
                visited,
            };
        }
        stack.extend(current.children().iter().rev().cloned());
    }
    ScanOutcome {
        found: None,
        visited,
    }
}

/// Whether `node` or one of its descendants carries `tag`.
pub fn has_element(tag: Tag, node: &Node) -> bool {
    find_element(tag, node).is_some()
}

/// First node carrying `tag`, in pre-order.
pub fn find_element(tag: Tag, node: &Node) -> Option<Node> {
    scan(node, |n| n.tag() == tag).found
}

/// Whether `node` or one of its descendants carries a tag of `class`.
pub fn has_class(class: TagClass, node: &Node) -> bool {
    scan(node, |n| n.tag().is(class)).found.is_some()
}

/// Symbols occurring in `node` outside the scope of a quantifier binding them.
pub fn free_symbols(node: &Node) -> IndexSet<Symbol> {
    let handlers: Handlers<'_, IndexSet<Symbol>, DispatchError> = Handlers::new()
        .on(TagClass::Quantifier, |n, mut children: Vec<IndexSet<Symbol>>| {
            let mut body: IndexSet<Symbol> = children.pop().unwrap_or_default();
            if let Some(bound) = n.symbol() {
                body.shift_remove(bound);
            }
            Ok(body)
        })
        .otherwise(|n, children| {
            let mut out: IndexSet<Symbol> = n.symbol().cloned().into_iter().collect();
            for set in children {
                out.extend(set);
            }
            Ok(out)
        });
    handlers.rewrite(node).unwrap_or_default()
}

/// Every symbol occurring in `node`, bound or free, in pre-order.
pub fn symbols(node: &Node) -> IndexSet<Symbol> {
    let mut out = IndexSet::new();
    let mut seen: HashSet<Node> = HashSet::new();
    let mut stack = vec![node.clone()];
    while let Some(current) = stack.pop() {
        if !seen.insert(current.clone()) {
            continue;
        }
        if let Some(symbol) = current.symbol() {
            out.insert(symbol.clone());
        }
        stack.extend(current.children().iter().rev().cloned());
    }
    out
}
