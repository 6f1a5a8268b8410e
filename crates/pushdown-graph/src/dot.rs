//! Graphviz rendering of a transition graph.

use crate::graph::Graph;
use crate::node::Node;
use crate::symbol::Symbol;
use std::collections::HashMap;

/// Escape a label for inclusion in a double-quoted DOT string.
fn escape(label: &str) -> String {
    label.replace('\\', "\\\\").replace('"', "\\\"")
}

impl<St: Symbol, El: Symbol, Ta: Symbol, Ua: Symbol> Graph<St, El, Ta, Ua> {
    /// Render the graph as a Graphviz digraph.
    ///
    /// State nodes are boxes, intermediate nodes are ellipses, summary
    /// (`Nop`) edges are dashed, and untargeted dynamic-pop associations
    /// appear as dotted half-edges to point nodes.
    pub fn to_dot(&self) -> Result<String, std::fmt::Error> {
        use std::fmt::Write as _;

        // Sort nodes for a deterministic rendering.
        let mut nodes: Vec<&Node<St, El, Ta>> = self.nodes().collect();
        nodes.sort();
        let ids: HashMap<&Node<St, El, Ta>, usize> =
            nodes.iter().enumerate().map(|(i, &n)| (n, i)).collect();

        let mut dot = String::new();
        writeln!(dot, "digraph {{")?;
        writeln!(dot, "rankdir=LR;")?;

        for (i, node) in nodes.iter().enumerate() {
            let shape = match node {
                Node::State(_) => "box",
                Node::Intermediate(_) => "ellipse",
            };
            writeln!(
                dot,
                "n{} [shape={}, label=\"{}\"];",
                i,
                shape,
                escape(&node.to_string())
            )?;
        }

        let mut edges: Vec<_> = self.edges().collect();
        edges.sort();
        for edge in edges {
            let style = if edge.action.is_nop() {
                ", style=dashed"
            } else {
                ""
            };
            writeln!(
                dot,
                "n{} -> n{} [label=\"{}\"{}];",
                ids[&edge.source],
                ids[&edge.target],
                escape(&edge.action.to_string()),
                style
            )?;
        }

        let mut untargeted: Vec<_> = self.untargeted_pops().collect();
        untargeted.sort();
        for (i, (node, action)) in untargeted.into_iter().enumerate() {
            writeln!(dot, "u{} [shape=point];", i)?;
            writeln!(
                dot,
                "n{} -> u{} [label=\"dynpop {}\", style=dotted];",
                ids[node],
                i,
                escape(&action.to_string())
            )?;
        }

        writeln!(dot, "}}")?;
        Ok(dot)
    }
}
