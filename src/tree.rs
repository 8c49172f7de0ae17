//! Syntax tree for TINY programs.
//!
//! Nodes live in a single arena owned by [`SyntaxTree`] and refer to each other
//! by [`NodeId`]. A statement sequence is a chain of `next` links rather than a
//! list, because the parser builds each statement as its own subtree before
//! linking it to the previous one.

use std::fmt::Write;

use serde::Serialize;

use crate::error::TreeError;

/// Index of a node inside its [`SyntaxTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct NodeId(pub(crate) usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SyntaxNode {
    pub label: String,
    pub children: Vec<NodeId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next: Option<NodeId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SyntaxTree {
    nodes: Vec<SyntaxNode>,
    root: NodeId,
}

impl SyntaxTree {
    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, id: NodeId) -> &SyntaxNode {
        &self.nodes[id.0]
    }

    pub fn label(&self, id: NodeId) -> &str {
        &self.nodes[id.0].label
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.0].children
    }

    pub fn next(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0].next
    }

    pub fn ids(&self) -> impl Iterator<Item = NodeId> {
        (0..self.nodes.len()).map(NodeId)
    }

    /// Walks the statement chain starting at `first`, including `first`.
    pub fn statements(&self, first: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::successors(Some(first), move |&id| self.next(id))
    }

    /// Checks the forest invariant: the root has no incoming edge, every other
    /// node has exactly one, and all nodes are reachable from the root.
    pub fn validate(&self) -> Result<(), TreeError> {
        if self.nodes.is_empty() {
            return Err(TreeError::Empty);
        }

        let mut incoming = vec![0usize; self.nodes.len()];
        for (index, node) in self.nodes.iter().enumerate() {
            for target in node.children.iter().chain(node.next.iter()) {
                let Some(count) = incoming.get_mut(target.0) else {
                    return Err(TreeError::Dangling {
                        node: index,
                        target: target.0,
                    });
                };
                *count += 1;
            }
        }

        if self.root.0 >= self.nodes.len() {
            return Err(TreeError::Dangling {
                node: self.root.0,
                target: self.root.0,
            });
        }
        if incoming[self.root.0] > 0 {
            return Err(TreeError::RootReferenced(self.root.0));
        }
        if let Some(shared) = incoming.iter().position(|&count| count > 1) {
            return Err(TreeError::Shared(shared));
        }

        // With at most one incoming edge per node, a walk from the root can
        // only miss nodes that sit on a detached cycle or fragment.
        let mut seen = vec![false; self.nodes.len()];
        let mut stack = vec![self.root];
        while let Some(id) = stack.pop() {
            if std::mem::replace(&mut seen[id.0], true) {
                continue;
            }
            let node = &self.nodes[id.0];
            stack.extend(node.children.iter().copied());
            stack.extend(node.next);
        }
        match seen.iter().position(|&reached| !reached) {
            Some(unreachable) => Err(TreeError::Unreachable(unreachable)),
            None => Ok(()),
        }
    }

    /// Indented text rendering: children two spaces deeper than their parent,
    /// chained statements at the same depth.
    pub fn outline(&self) -> String {
        let mut out = String::new();
        if self.is_empty() {
            return out;
        }

        let mut stack = vec![(self.root, 0)];
        while let Some((id, depth)) = stack.pop() {
            let _ = writeln!(out, "{:indent$}{}", "", self.label(id), indent = depth * 2);
            stack.extend(self.next(id).map(|next| (next, depth)));
            stack.extend(self.children(id).iter().rev().map(|&child| (child, depth + 1)));
        }
        out
    }
}

/// Arena builder used by the parser. Nodes are appended and never removed.
#[derive(Debug, Default)]
pub(crate) struct TreeBuilder {
    nodes: Vec<SyntaxNode>,
}

impl TreeBuilder {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn node(&mut self, label: impl Into<String>, children: Vec<NodeId>) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(SyntaxNode {
            label: label.into(),
            children,
            next: None,
        });
        id
    }

    pub(crate) fn leaf(&mut self, label: impl Into<String>) -> NodeId {
        self.node(label, Vec::new())
    }

    pub(crate) fn link_next(&mut self, statement: NodeId, next: NodeId) {
        debug_assert!(self.nodes[statement.0].next.is_none(), "statement already linked");
        self.nodes[statement.0].next = Some(next);
    }

    pub(crate) fn len(&self) -> usize {
        self.nodes.len()
    }

    pub(crate) fn finish(self, root: NodeId) -> SyntaxTree {
        SyntaxTree {
            nodes: self.nodes,
            root,
        }
    }
}
