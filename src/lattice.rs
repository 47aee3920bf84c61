//! Hasse diagram of the knowledge structure.
//!
//! Nodes are feasible knowledge states; an edge `A → B` is a covering pair,
//! `A ⊂ B` with exactly one item added. The edge carries that item.

use std::fmt;

use petgraph::dot::{Config, Dot};
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;

use crate::item::{ItemId, format_set};
use crate::states::{KnowledgeState, sort_states};

/// A knowledge state as a graph node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateNode(pub KnowledgeState);

impl fmt::Display for StateNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            f.write_str("∅")
        } else {
            f.write_str(&format_set(&self.0))
        }
    }
}

/// The covering graph of a family of knowledge states.
#[derive(Debug, Clone)]
pub struct Lattice {
    graph: DiGraph<StateNode, ItemId>,
}

impl Lattice {
    /// Build from any family of states; they are sorted by `(size, items)`.
    pub fn new(mut states: Vec<KnowledgeState>) -> Self {
        sort_states(&mut states);
        states.dedup();

        let mut graph = DiGraph::with_capacity(states.len(), states.len());
        let nodes: Vec<NodeIndex> = states
            .into_iter()
            .map(|s| graph.add_node(StateNode(s)))
            .collect();

        for (i, &lower) in nodes.iter().enumerate() {
            for &upper in &nodes[i + 1..] {
                if let Some(item) = covering_item(&graph[lower].0, &graph[upper].0) {
                    graph.add_edge(lower, upper, item);
                }
            }
        }
        Self { graph }
    }

    pub fn graph(&self) -> &DiGraph<StateNode, ItemId> {
        &self.graph
    }

    pub fn states(&self) -> impl Iterator<Item = &KnowledgeState> {
        self.graph.node_weights().map(|n| &n.0)
    }

    pub fn state_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Covering pairs as `(lower, upper)` node positions in state order.
    pub fn covering_edges(&self) -> Vec<(usize, usize)> {
        let mut edges: Vec<(usize, usize)> = self
            .graph
            .edge_references()
            .map(|e| (e.source().index(), e.target().index()))
            .collect();
        edges.sort_unstable();
        edges
    }

    /// Graphviz source, drawn bottom to top.
    pub fn to_dot(&self) -> String {
        let dot = format!("{}", Dot::with_config(&self.graph, &[Config::GraphContentOnly]));
        format!("digraph {{\n    rankdir = BT\n{dot}}}\n")
    }
}

/// The single item `upper` adds to `lower`, if `upper` covers `lower`.
fn covering_item(lower: &KnowledgeState, upper: &KnowledgeState) -> Option<ItemId> {
    if upper.len() != lower.len() + 1 || !lower.is_subset(upper) {
        return None;
    }
    upper.difference(lower).next().cloned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::item_set;

    fn chain_states() -> Vec<KnowledgeState> {
        vec![
            item_set(["a", "b"]),
            item_set::<_, &str>([]),
            item_set(["a"]),
            item_set(["a", "b", "c"]),
        ]
    }

    #[test]
    fn chain_has_three_covering_edges() {
        let lattice = Lattice::new(chain_states());
        assert_eq!(lattice.state_count(), 4);
        assert_eq!(lattice.covering_edges(), vec![(0, 1), (1, 2), (2, 3)]);
        assert!(lattice.states().next().unwrap().is_empty());
    }

    #[test]
    fn non_covering_pairs_are_skipped() {
        // {} ⊂ {a, b} but two items apart; {a} and {b} incomparable.
        let lattice = Lattice::new(vec![
            item_set::<_, &str>([]),
            item_set(["a"]),
            item_set(["b"]),
            item_set(["a", "b"]),
        ]);
        assert_eq!(
            lattice.covering_edges(),
            vec![(0, 1), (0, 2), (1, 3), (2, 3)]
        );
    }

    #[test]
    fn edges_carry_added_item() {
        let lattice = Lattice::new(chain_states());
        let labels: Vec<&str> = lattice
            .graph()
            .edge_weights()
            .map(ItemId::as_str)
            .collect();
        assert_eq!(labels, vec!["a", "b", "c"]);
    }

    #[test]
    fn dot_is_bottom_to_top() {
        let dot = Lattice::new(chain_states()).to_dot();
        assert!(dot.starts_with("digraph {"));
        assert!(dot.contains("rankdir = BT"));
        assert!(dot.contains("label = \"∅\""));
        assert!(dot.contains("label = \"{a, b}\""));
        assert!(dot.contains("0 -> 1"));
        assert!(dot.trim_end().ends_with('}'));
    }
}
