//! Indexed storage for edges and untargeted dynamic-pop associations.

use crate::action::StackAction;
use crate::edge::Edge;
use crate::node::Node;
use crate::symbol::Symbol;
use std::collections::{HashMap, HashSet};

type Map<K, V> = HashMap<K, V, ahash::RandomState>;
type Set<T> = HashSet<T, ahash::RandomState>;

/// The transition graph the saturation engine closes.
///
/// Stores the edge set, the node set, and untargeted dynamic-pop
/// associations, and keeps a secondary index for every lookup direction
/// the closure rules consult, so each lookup is O(k) in the number of
/// matches rather than a scan of the edge set. Inserts are idempotent and
/// report whether anything new was stored.
pub struct Graph<St, El, Ta, Ua> {
    edges: Set<Edge<St, El, Ta>>,
    nodes: Set<Node<St, El, Ta>>,
    /// Push edges keyed by their target: `p --push k--> n` under `n`.
    push_by_target: Map<Node<St, El, Ta>, Set<(Node<St, El, Ta>, El)>>,
    /// Nop edges keyed by source.
    nop_by_source: Map<Node<St, El, Ta>, Set<Node<St, El, Ta>>>,
    /// Nop edges keyed by target; consulted by summary-composition rules.
    nop_by_target: Map<Node<St, El, Ta>, Set<Node<St, El, Ta>>>,
    /// Pop edges keyed by source.
    pop_by_source: Map<Node<St, El, Ta>, Set<(Node<St, El, Ta>, El)>>,
    /// Targeted dynamic-pop edges keyed by source.
    targeted_pop_by_source: Map<Node<St, El, Ta>, Set<(Node<St, El, Ta>, Ta)>>,
    /// Untargeted dynamic-pop actions associated with a node.
    untargeted_by_node: Map<Node<St, El, Ta>, Set<Ua>>,
    untargeted_count: usize,
}

impl<St, El, Ta, Ua> Default for Graph<St, El, Ta, Ua> {
    fn default() -> Self {
        Self {
            edges: Set::default(),
            nodes: Set::default(),
            push_by_target: Map::default(),
            nop_by_source: Map::default(),
            nop_by_target: Map::default(),
            pop_by_source: Map::default(),
            targeted_pop_by_source: Map::default(),
            untargeted_by_node: Map::default(),
            untargeted_count: 0,
        }
    }
}

impl<St: Symbol, El: Symbol, Ta: Symbol, Ua: Symbol> Graph<St, El, Ta, Ua> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an edge and index it. Returns false if it was already
    /// present (the graph never stores duplicates).
    pub fn add_edge(&mut self, edge: Edge<St, El, Ta>) -> bool {
        if !self.edges.insert(edge.clone()) {
            return false;
        }

        let Edge {
            source,
            target,
            action,
        } = edge;
        self.nodes.insert(source.clone());
        self.nodes.insert(target.clone());

        match action {
            StackAction::Nop => {
                self.nop_by_source
                    .entry(source.clone())
                    .or_default()
                    .insert(target.clone());
                self.nop_by_target.entry(target).or_default().insert(source);
            }
            StackAction::Push(el) => {
                self.push_by_target
                    .entry(target)
                    .or_default()
                    .insert((source, el));
            }
            StackAction::Pop(el) => {
                self.pop_by_source
                    .entry(source)
                    .or_default()
                    .insert((target, el));
            }
            StackAction::DynamicPop(action) => {
                self.targeted_pop_by_source
                    .entry(source)
                    .or_default()
                    .insert((target, action));
            }
        }
        true
    }

    pub fn has_edge(&self, edge: &Edge<St, El, Ta>) -> bool {
        self.edges.contains(edge)
    }

    /// Associate an untargeted dynamic-pop action with a node. Returns
    /// false if the association was already present.
    pub fn add_untargeted_pop(&mut self, node: Node<St, El, Ta>, action: Ua) -> bool {
        self.nodes.insert(node.clone());
        let fresh = self.untargeted_by_node.entry(node).or_default().insert(action);
        if fresh {
            self.untargeted_count += 1;
        }
        fresh
    }

    pub fn has_untargeted_pop(&self, node: &Node<St, El, Ta>, action: &Ua) -> bool {
        self.untargeted_by_node
            .get(node)
            .is_some_and(|set| set.contains(action))
    }

    /// All push edges ending at `node`, as `(source, element)` pairs.
    pub fn push_edges_by_target<'a>(
        &'a self,
        node: &Node<St, El, Ta>,
    ) -> impl Iterator<Item = &'a (Node<St, El, Ta>, El)> + 'a {
        self.push_by_target.get(node).into_iter().flatten()
    }

    /// Targets of all nop edges leaving `node`.
    pub fn nop_edges_by_source<'a>(
        &'a self,
        node: &Node<St, El, Ta>,
    ) -> impl Iterator<Item = &'a Node<St, El, Ta>> + 'a {
        self.nop_by_source.get(node).into_iter().flatten()
    }

    /// Sources of all nop edges ending at `node`.
    pub fn nop_edges_by_target<'a>(
        &'a self,
        node: &Node<St, El, Ta>,
    ) -> impl Iterator<Item = &'a Node<St, El, Ta>> + 'a {
        self.nop_by_target.get(node).into_iter().flatten()
    }

    /// All pop edges leaving `node`, as `(target, element)` pairs.
    pub fn pop_edges_by_source<'a>(
        &'a self,
        node: &Node<St, El, Ta>,
    ) -> impl Iterator<Item = &'a (Node<St, El, Ta>, El)> + 'a {
        self.pop_by_source.get(node).into_iter().flatten()
    }

    /// All targeted dynamic-pop edges leaving `node`, as
    /// `(target, action)` pairs.
    pub fn targeted_pop_edges_by_source<'a>(
        &'a self,
        node: &Node<St, El, Ta>,
    ) -> impl Iterator<Item = &'a (Node<St, El, Ta>, Ta)> + 'a {
        self.targeted_pop_by_source.get(node).into_iter().flatten()
    }

    /// Untargeted dynamic-pop actions associated with `node`.
    pub fn untargeted_pops_at<'a>(
        &'a self,
        node: &Node<St, El, Ta>,
    ) -> impl Iterator<Item = &'a Ua> + 'a {
        self.untargeted_by_node.get(node).into_iter().flatten()
    }

    /// All untargeted dynamic-pop associations.
    pub fn untargeted_pops(&self) -> impl Iterator<Item = (&Node<St, El, Ta>, &Ua)> {
        self.untargeted_by_node
            .iter()
            .flat_map(|(node, actions)| actions.iter().map(move |a| (node, a)))
    }

    pub fn nodes(&self) -> impl Iterator<Item = &Node<St, El, Ta>> {
        self.nodes.iter()
    }

    pub fn edges(&self) -> impl Iterator<Item = &Edge<St, El, Ta>> {
        self.edges.iter()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn untargeted_pop_count(&self) -> usize {
        self.untargeted_count
    }
}
