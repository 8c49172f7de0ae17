//! Layout engine: assigns canvas coordinates to the nodes of a [`SyntaxTree`].
//!
//! Every subtree gets a horizontal span measured in width units. Children are
//! tiled left to right on the row below their parent; chained statements
//! continue to the right on the same row. The output is a flat list of
//! [`Instruction`]s for a renderer to draw.

use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::tree::{NodeId, SyntaxTree};

// Shape sizes, in canvas units.
pub const BOX_WIDTH: f64 = 80.0;
pub const BOX_HEIGHT: f64 = 40.0;
pub const CIRCLE_RADIUS: f64 = 20.0;

pub const DEFAULT_X_SPACING: f64 = 50.0;
pub const DEFAULT_Y_SPACING: f64 = 60.0;

/// Size of one width unit (`x`) and of one tree level (`y`).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Spacing {
    pub x: f64,
    pub y: f64,
}

impl Default for Spacing {
    fn default() -> Self {
        Self {
            x: DEFAULT_X_SPACING,
            y: DEFAULT_Y_SPACING,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Shape {
    /// Statements.
    Box,
    /// Operators and literals.
    Circle,
}

fn statement_label() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^(?:(?:assign|read)\(.*\)|write|repeat|if|else)$")
            .expect("statement label pattern is valid")
    })
}

impl Shape {
    pub fn classify(label: &str) -> Self {
        if statement_label().is_match(label) {
            Shape::Box
        } else {
            Shape::Circle
        }
    }

    pub fn half_width(self) -> f64 {
        match self {
            Shape::Box => BOX_WIDTH / 2.0,
            Shape::Circle => CIRCLE_RADIUS,
        }
    }

    pub fn half_height(self) -> f64 {
        match self {
            Shape::Box => BOX_HEIGHT / 2.0,
            Shape::Circle => CIRCLE_RADIUS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Instruction {
    PlaceNode {
        node: NodeId,
        label: String,
        x: f64,
        y: f64,
        shape: Shape,
    },
    DrawConnector {
        from_x: f64,
        from_y: f64,
        to_x: f64,
        to_y: f64,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Layout {
    pub width: f64,
    pub height: f64,
    pub instructions: Vec<Instruction>,
}

/// Per-pass subtree measurements, indexed by node.
#[derive(Debug, Clone)]
pub struct Metrics {
    own_units: Vec<usize>,
    width_units: Vec<usize>,
    depth: Vec<usize>,
    measured: Vec<bool>,
}

impl Metrics {
    pub fn compute(tree: &SyntaxTree) -> Self {
        let mut metrics = Self {
            own_units: vec![1; tree.len()],
            width_units: vec![1; tree.len()],
            depth: vec![1; tree.len()],
            measured: vec![false; tree.len()],
        };
        if !tree.is_empty() {
            metrics.measure(tree);
        }
        metrics
    }

    /// Units spanned by the node and its children, excluding later statements.
    pub fn own_units(&self, id: NodeId) -> usize {
        self.own_units[id.index()]
    }

    /// Units spanned by the node, its children and every later statement.
    pub fn width_units(&self, id: NodeId) -> usize {
        self.width_units[id.index()]
    }

    pub fn depth(&self, id: NodeId) -> usize {
        self.depth[id.index()]
    }

    /// Deepest subtree among `first` and the statements chained after it.
    pub fn chain_depth(&self, tree: &SyntaxTree, first: NodeId) -> usize {
        tree.statements(first)
            .take(tree.len())
            .map(|id| self.depth(id))
            .max()
            .unwrap_or(1)
    }

    /// Post-order walk over children and successors. The stack holds each
    /// node twice: once to expand it and once to settle it after everything
    /// below and after it is measured.
    fn measure(&mut self, tree: &SyntaxTree) {
        let mut stack = vec![(tree.root(), false)];

        while let Some((id, expanded)) = stack.pop() {
            if expanded {
                self.settle(tree, id);
                continue;
            }

            debug_assert!(!self.measured[id.index()], "node {} reached twice", id.index());
            if self.measured[id.index()] {
                continue;
            }
            self.measured[id.index()] = true;

            stack.push((id, true));
            stack.extend(tree.next(id).map(|next| (next, false)));
            stack.extend(tree.children(id).iter().map(|&child| (child, false)));
        }
    }

    fn settle(&mut self, tree: &SyntaxTree, id: NodeId) {
        let children = tree.children(id);
        let children_units: usize = children.iter().map(|&child| self.width_units(child)).sum();
        let deepest = children.iter().map(|&child| self.depth(child)).max().unwrap_or(0);

        let own = children_units.max(1);
        self.own_units[id.index()] = own;
        self.depth[id.index()] = deepest + 1;
        self.width_units[id.index()] = own + tree.next(id).map_or(0, |next| self.width_units(next));
    }
}

/// Lays the tree out with its left edge at 0 and the root row half a level
/// below the top, so every node centre lies inside the reported canvas.
pub fn layout(tree: &SyntaxTree, spacing: Spacing) -> Layout {
    if tree.is_empty() {
        return Layout::default();
    }
    let metrics = Metrics::compute(tree);
    let root_x = units(metrics.own_units(tree.root())) * spacing.x / 2.0;
    place(tree, &metrics, spacing, root_x, spacing.y / 2.0)
}

/// Lays the tree out with the root centred at `root_x` on row `top_y`.
pub fn layout_at(tree: &SyntaxTree, spacing: Spacing, root_x: f64, top_y: f64) -> Layout {
    let metrics = Metrics::compute(tree);
    place(tree, &metrics, spacing, root_x, top_y)
}

#[tracing::instrument(level = "trace", skip_all, fields(nodes = tree.len()))]
fn place(
    tree: &SyntaxTree,
    metrics: &Metrics,
    spacing: Spacing,
    root_x: f64,
    top_y: f64,
) -> Layout {
    if tree.is_empty() {
        return Layout::default();
    }

    let root = tree.root();
    let mut placer = Placer {
        tree,
        metrics,
        spacing,
        placed: vec![false; tree.len()],
        instructions: Vec::with_capacity(tree.len() * 2),
    };
    let left = root_x - units(metrics.own_units(root)) * spacing.x / 2.0;
    placer.place_all(Visit {
        id: root,
        left,
        y: top_y,
        link: Link::Root,
    });

    let layout = Layout {
        width: units(metrics.width_units(root)) * spacing.x,
        height: units(metrics.chain_depth(tree, root)) * spacing.y,
        instructions: placer.instructions,
    };
    debug!(
        instructions = layout.instructions.len(),
        width = layout.width,
        height = layout.height,
        "laid out syntax tree"
    );
    layout
}

#[allow(clippy::cast_precision_loss)]
fn units(count: usize) -> f64 {
    count as f64
}

/// Where the connector into a node starts.
#[derive(Clone, Copy)]
enum Link {
    Root,
    /// Bottom anchor of the parent; the connector ends at the child's top.
    Parent { from_x: f64, from_y: f64 },
    /// Right anchor of the previous statement; the connector ends at the
    /// node's left anchor.
    Sibling { from_x: f64, from_y: f64 },
}

/// A node waiting to be placed with the left edge of its span.
struct Visit {
    id: NodeId,
    left: f64,
    y: f64,
    link: Link,
}

struct Placer<'t> {
    tree: &'t SyntaxTree,
    metrics: &'t Metrics,
    spacing: Spacing,
    placed: Vec<bool>,
    instructions: Vec<Instruction>,
}

impl Placer<'_> {
    fn span(&self, id: NodeId) -> f64 {
        units(self.metrics.own_units(id)) * self.spacing.x
    }

    /// Places every node reachable from `start`. A node is emitted before its
    /// children's subtrees, which come before its successor.
    fn place_all(&mut self, start: Visit) {
        let mut pending = vec![start];

        while let Some(Visit { id, left, y, link }) = pending.pop() {
            debug_assert!(!self.placed[id.index()], "node {} placed twice", id.index());
            if self.placed[id.index()] {
                continue;
            }
            self.placed[id.index()] = true;

            let shape = Shape::classify(self.tree.label(id));
            let span = self.span(id);
            let x = left + span / 2.0;
            match link {
                Link::Root => {}
                Link::Parent { from_x, from_y } => {
                    self.connect(from_x, from_y, x, y - shape.half_height());
                }
                Link::Sibling { from_x, from_y } => {
                    self.connect(from_x, from_y, x - shape.half_width(), y);
                }
            }
            self.instructions.push(Instruction::PlaceNode {
                node: id,
                label: self.tree.label(id).to_string(),
                x,
                y,
                shape,
            });

            if let Some(next) = self.tree.next(id) {
                pending.push(Visit {
                    id: next,
                    left: left + span,
                    y,
                    link: Link::Sibling {
                        from_x: x + shape.half_width(),
                        from_y: y,
                    },
                });
            }

            let mut children = Vec::with_capacity(self.tree.children(id).len());
            let mut child_left = left;
            for &child in self.tree.children(id) {
                children.push(Visit {
                    id: child,
                    left: child_left,
                    y: y + self.spacing.y,
                    link: Link::Parent {
                        from_x: x,
                        from_y: y + shape.half_height(),
                    },
                });
                child_left += units(self.metrics.width_units(child)) * self.spacing.x;
            }
            pending.extend(children.into_iter().rev());
        }
    }

    fn connect(&mut self, from_x: f64, from_y: f64, to_x: f64, to_y: f64) {
        self.instructions.push(Instruction::DrawConnector {
            from_x,
            from_y,
            to_x,
            to_y,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::tokenize;
    use crate::parser::parse;

    fn tree_of(input: &str) -> SyntaxTree {
        parse(&tokenize(input).unwrap()).unwrap()
    }

    fn placements(layout: &Layout) -> Vec<(String, f64, f64, Shape)> {
        layout
            .instructions
            .iter()
            .filter_map(|instruction| match instruction {
                Instruction::PlaceNode { label, x, y, shape, .. } => {
                    Some((label.clone(), *x, *y, *shape))
                }
                Instruction::DrawConnector { .. } => None,
            })
            .collect()
    }

    fn connectors(layout: &Layout) -> Vec<(f64, f64, f64, f64)> {
        layout
            .instructions
            .iter()
            .filter_map(|instruction| match instruction {
                Instruction::DrawConnector { from_x, from_y, to_x, to_y } => {
                    Some((*from_x, *from_y, *to_x, *to_y))
                }
                Instruction::PlaceNode { .. } => None,
            })
            .collect()
    }

    #[test]
    fn classifies_statements_as_boxes() {
        for label in ["if", "else", "repeat", "write", "assign(x)", "read(count)"] {
            assert_eq!(Shape::classify(label), Shape::Box, "{label}");
        }
        for label in ["+", "<", "42", "x", "reader", "writer", "iffy"] {
            assert_eq!(Shape::classify(label), Shape::Circle, "{label}");
        }
    }

    #[test]
    fn leaf_metrics() {
        let tree = tree_of("read x");
        let metrics = Metrics::compute(&tree);
        assert_eq!(metrics.width_units(tree.root()), 1);
        assert_eq!(metrics.depth(tree.root()), 1);
    }

    #[test]
    fn siblings_extend_width_not_depth() {
        let tree = tree_of("read x; write x + 1");
        let metrics = Metrics::compute(&tree);
        let read = tree.root();
        let write = tree.next(read).unwrap();

        assert_eq!(metrics.own_units(read), 1);
        assert_eq!(metrics.width_units(write), 2);
        assert_eq!(metrics.width_units(read), 3);
        assert_eq!(metrics.depth(read), 1);
        assert_eq!(metrics.depth(write), 3);
        assert_eq!(metrics.chain_depth(&tree, read), 3);
    }

    #[test]
    fn width_is_at_least_one_everywhere() {
        let tree = tree_of(
            "read x; if 0 < x then fact := 1; repeat fact := fact * x; x := x - 1 until x = 0; write fact end",
        );
        let metrics = Metrics::compute(&tree);
        for id in tree.ids() {
            assert!(metrics.width_units(id) >= 1);
            assert!(metrics.own_units(id) <= metrics.width_units(id));
        }
    }

    #[test]
    fn operator_children_are_centred_below() {
        let tree = tree_of("write 1 + 2");
        let layout = layout(&tree, Spacing::default());

        assert_eq!(layout.width, 100.0);
        assert_eq!(layout.height, 180.0);
        assert_eq!(
            placements(&layout),
            vec![
                ("write".to_string(), 50.0, 30.0, Shape::Box),
                ("+".to_string(), 50.0, 90.0, Shape::Circle),
                ("1".to_string(), 25.0, 150.0, Shape::Circle),
                ("2".to_string(), 75.0, 150.0, Shape::Circle),
            ]
        );
        assert_eq!(
            connectors(&layout),
            vec![
                (50.0, 50.0, 50.0, 70.0),
                (50.0, 110.0, 25.0, 130.0),
                (50.0, 110.0, 75.0, 130.0),
            ]
        );
    }

    #[test]
    fn chained_statements_share_a_row() {
        let tree = tree_of("read x; write x");
        let layout = layout(&tree, Spacing::default());

        assert_eq!(
            placements(&layout),
            vec![
                ("read(x)".to_string(), 25.0, 30.0, Shape::Box),
                ("write".to_string(), 75.0, 30.0, Shape::Box),
                ("x".to_string(), 75.0, 90.0, Shape::Circle),
            ]
        );
        assert_eq!(connectors(&layout)[0], (65.0, 30.0, 35.0, 30.0));
    }

    #[test]
    fn child_sequences_reserve_their_full_width() {
        let tree = tree_of("if x then read a; read b else read c end");
        let layout = layout(&tree, Spacing { x: 10.0, y: 10.0 });
        let nodes = placements(&layout);

        let x_of = |label: &str| nodes.iter().find(|n| n.0 == label).unwrap().1;
        assert_eq!(x_of("x"), 5.0);
        assert_eq!(x_of("read(a)"), 15.0);
        assert_eq!(x_of("read(b)"), 25.0);
        assert_eq!(x_of("read(c)"), 35.0);
        assert_eq!(x_of("if"), 20.0);
        assert_eq!(layout.width, 40.0);
    }

    #[test]
    fn nodes_on_a_row_never_share_a_slot() {
        let tree = tree_of(
            "read x; if 0 < x then fact := 1; repeat fact := fact * x; x := x - 1 until x = 0; write fact end; write x",
        );
        let layout = layout(&tree, Spacing { x: 1.0, y: 1.0 });
        let nodes = placements(&layout);
        assert_eq!(nodes.len(), tree.len());

        for (i, a) in nodes.iter().enumerate() {
            for b in &nodes[i + 1..] {
                assert!(a.1 != b.1 || a.2 != b.2, "{} and {} overlap", a.0, b.0);
            }
            assert!(a.1 > 0.0 && a.1 < layout.width);
            assert!(a.2 > 0.0 && a.2 < layout.height);
        }
    }

    #[test]
    fn layout_at_centres_root_on_origin() {
        let tree = tree_of("write 1 + 2");
        let layout = layout_at(&tree, Spacing::default(), 300.0, 55.0);
        assert_eq!(placements(&layout)[0].1, 300.0);
        assert_eq!(placements(&layout)[0].2, 55.0);
        assert_eq!(placements(&layout)[2].1, 275.0);
    }

    #[test]
    fn identical_input_gives_identical_layout() {
        let source = "repeat x := x - 1; write x until x < 1";
        let first = layout(&tree_of(source), Spacing::default());
        let second = layout(&tree_of(source), Spacing::default());
        assert_eq!(first, second);
    }

    #[test]
    fn long_operator_chains_lay_out_without_recursion() {
        let source = format!("write 1{}", "+1".repeat(100_000));
        let tree = tree_of(&source);
        let metrics = Metrics::compute(&tree);
        assert_eq!(metrics.depth(tree.root()), 100_002);
        assert_eq!(metrics.width_units(tree.root()), 100_001);

        let layout = layout(&tree, Spacing { x: 1.0, y: 1.0 });
        // one placement per node and one connector into every node but the root
        assert_eq!(layout.instructions.len(), 2 * tree.len() - 1);
        assert_eq!(layout.height, 100_002.0);
    }

    #[test]
    fn long_statement_chains_stay_on_one_row() {
        let source = vec!["read x"; 50_000].join(";");
        let tree = tree_of(&source);
        let layout = layout(&tree, Spacing::default());

        assert_eq!(placements(&layout).len(), 50_000);
        assert!(placements(&layout).iter().all(|node| node.2 == 30.0));
        assert_eq!(layout.width, 50_000.0 * DEFAULT_X_SPACING);
    }

    #[test]
    fn layout_serializes_with_kind_tags() {
        let layout = layout(&tree_of("read x"), Spacing::default());
        let json = serde_json::to_value(&layout).unwrap();
        assert_eq!(json["instructions"][0]["kind"], "place_node");
        assert_eq!(json["instructions"][0]["shape"], "box");
        assert_eq!(json["instructions"][0]["node"], 0);
    }
}
