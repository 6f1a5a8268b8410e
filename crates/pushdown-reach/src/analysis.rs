//! The saturation engine: registration, closure, and queries.

use crate::error::{AnalysisError, AnalysisResult};
use crate::handler::{
    ActionListOf, DynamicPopHandler, EdgeOf, ElementOf, GraphOf, NodeOf, StateOf, TargetedOf,
    UntargetedOf,
};
use crate::work::{WorkCollection, WorkItem, WorkItemOf, WorkQueue};
use pushdown_graph::{Edge, Node, StackAction};
use smallvec::SmallVec;
use std::collections::{HashMap, HashSet};
use tracing::{debug, trace};

type Map<K, V> = HashMap<K, V, ahash::RandomState>;
type Set<T> = HashSet<T, ahash::RandomState>;

/// An edge-generating function: for an expanded state, the edges it
/// originates, each as an action list plus destination state.
pub type EdgeFunction<H> = Box<dyn Fn(&StateOf<H>) -> Vec<(ActionListOf<H>, StateOf<H>)>>;

/// An untargeted-dynamic-pop-generating function: for an expanded state,
/// the untargeted pop actions available at it.
pub type UntargetedPopFunction<H> = Box<dyn Fn(&StateOf<H>) -> Vec<UntargetedOf<H>>>;

/// Where a node stands in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Awareness {
    /// Created and awaiting expansion in the work collection.
    Seen,
    /// Run through the expansion step; state nodes have been presented to
    /// every registered generating function exactly once.
    Expanded,
}

/// Compile an action list into the first edge of its chain.
///
/// An empty list yields a single nop edge, a singleton yields its one
/// action, and a longer list yields the head action into an intermediate
/// node owing the tail. The rest of the chain materializes when that
/// intermediate node is expanded.
fn decompose<St, El, Ta>(
    source: Node<St, El, Ta>,
    mut actions: Vec<StackAction<El, Ta>>,
    target: Node<St, El, Ta>,
) -> Edge<St, El, Ta> {
    match actions.len() {
        0 => Edge {
            source,
            target,
            action: StackAction::Nop,
        },
        1 => {
            let action = actions.remove(0);
            Edge {
                source,
                target,
                action,
            }
        }
        _ => {
            let action = actions.remove(0);
            Edge {
                source,
                target: Node::intermediate(target, actions),
                action,
            }
        }
    }
}

/// A reachability analysis over a user-defined pushdown system.
///
/// The analysis owns its graph, awareness map, state set, generating
/// functions, and work collection; registrations enqueue work, closure
/// steps drain it, and queries read summary edges off the graph. All
/// registrations are additive and may re-open a closed analysis.
pub struct Analysis<H: DynamicPopHandler, W = WorkQueue<WorkItemOf<H>>> {
    handler: H,
    graph: GraphOf<H>,
    work: W,
    awareness: Map<NodeOf<H>, Awareness>,
    known_states: Set<StateOf<H>>,
    start_nodes: Set<NodeOf<H>>,
    edge_functions: Vec<EdgeFunction<H>>,
    untargeted_pop_functions: Vec<UntargetedPopFunction<H>>,
}

impl<H, W> Analysis<H, W>
where
    H: DynamicPopHandler,
    W: WorkCollection<WorkItemOf<H>>,
{
    pub fn new(handler: H) -> Self
    where
        W: Default,
    {
        Self::with_work_collection(handler, W::default())
    }

    /// Build an analysis over a caller-chosen work collection.
    pub fn with_work_collection(handler: H, work: W) -> Self {
        Self {
            handler,
            graph: GraphOf::<H>::default(),
            work,
            awareness: Map::default(),
            known_states: Set::default(),
            start_nodes: Set::default(),
            edge_functions: Vec::new(),
            untargeted_pop_functions: Vec::new(),
        }
    }

    /// Register an edge: from `from`, perform `actions`, arrive at `to`.
    pub fn add_edge(&mut self, from: StateOf<H>, actions: ActionListOf<H>, to: StateOf<H>) {
        let edge = decompose(Node::state(from), actions, Node::state(to));
        self.enqueue_edge(edge);
    }

    /// Register an edge-generating function and catch it up on every
    /// state already expanded.
    pub fn add_edge_function<F>(&mut self, function: F)
    where
        F: Fn(&StateOf<H>) -> Vec<(ActionListOf<H>, StateOf<H>)> + 'static,
    {
        let mut edges = Vec::new();
        for state in &self.known_states {
            for (actions, to) in function(state) {
                edges.push(decompose(
                    Node::state(state.clone()),
                    actions,
                    Node::state(to),
                ));
            }
        }
        debug!(catch_up = edges.len(), "registered edge function");
        for edge in edges {
            self.enqueue_edge(edge);
        }
        self.edge_functions.push(Box::new(function));
    }

    /// Register an untargeted dynamic-pop action at a state.
    pub fn add_untargeted_pop_action(&mut self, state: StateOf<H>, action: UntargetedOf<H>) {
        self.enqueue_untargeted_pop(Node::state(state), action);
    }

    /// Register an untargeted-dynamic-pop-generating function and catch
    /// it up on every state already expanded.
    pub fn add_untargeted_pop_action_function<F>(&mut self, function: F)
    where
        F: Fn(&StateOf<H>) -> Vec<UntargetedOf<H>> + 'static,
    {
        let mut associations = Vec::new();
        for state in &self.known_states {
            for action in function(state) {
                associations.push((Node::state(state.clone()), action));
            }
        }
        debug!(
            catch_up = associations.len(),
            "registered untargeted pop function"
        );
        for (node, action) in associations {
            self.enqueue_untargeted_pop(node, action);
        }
        self.untargeted_pop_functions.push(Box::new(function));
    }

    /// Register a start state with its initial stack word, given as the
    /// actions that lay the word down. The anchor node's structural
    /// identity is how [`reachable_states`](Self::reachable_states)
    /// locates it later.
    pub fn add_start_state(&mut self, state: StateOf<H>, actions: ActionListOf<H>) {
        let anchor = Node::intermediate(Node::state(state), actions);
        self.start_nodes.insert(anchor.clone());
        self.ensure_node(anchor);
    }

    /// True when the work collection is drained; queries are then
    /// complete with respect to everything registered.
    pub fn is_closed(&self) -> bool {
        self.work.is_empty()
    }

    /// Perform one closure step. Returns false (a no-op) on a closed
    /// analysis.
    pub fn closure_step(&mut self) -> bool {
        let Some(item) = self.work.take() else {
            return false;
        };
        match item {
            WorkItem::Expand(node) => self.expand(node),
            WorkItem::IntroduceEdge(edge) => self.introduce_edge(edge),
            WorkItem::IntroduceUntargetedPop(node, action) => {
                self.introduce_untargeted_pop(node, action)
            }
        }
        true
    }

    /// Run closure steps until the analysis is closed. Returns the
    /// number of steps performed. Termination is the caller's
    /// responsibility: the reachable portion of the system and every
    /// handler output must be finite.
    pub fn fully_close(&mut self) -> usize {
        let mut steps = 0;
        while self.closure_step() {
            steps += 1;
        }
        debug!(
            steps,
            nodes = self.graph.node_count(),
            edges = self.graph.edge_count(),
            "analysis closed"
        );
        steps
    }

    /// Run at most `max_steps` closure steps. Returns true if the
    /// analysis is closed afterwards.
    pub fn close_up_to(&mut self, max_steps: usize) -> bool {
        for _ in 0..max_steps {
            if !self.closure_step() {
                return true;
            }
        }
        self.is_closed()
    }

    /// The states reachable with an empty stack from `state` with the
    /// given initial stack word.
    ///
    /// Fails if `(state, actions)` was never registered via
    /// [`add_start_state`](Self::add_start_state). On a non-closed
    /// analysis the sequence may be incomplete; pair with
    /// [`fully_close`](Self::fully_close) when completeness matters.
    pub fn reachable_states(
        &self,
        state: &StateOf<H>,
        actions: &[StackAction<ElementOf<H>, TargetedOf<H>>],
    ) -> AnalysisResult<impl Iterator<Item = &StateOf<H>> + '_, StateOf<H>> {
        let anchor = Node::intermediate(Node::state(state.clone()), actions.to_vec());
        if !self.start_nodes.contains(&anchor) {
            return Err(AnalysisError::ReachabilityRequestForNonStartState {
                state: state.clone(),
            });
        }
        Ok(self
            .graph
            .nop_edges_by_source(&anchor)
            .filter_map(Node::as_state))
    }

    /// `(node_count, edge_count)` of the current graph.
    pub fn size(&self) -> (usize, usize) {
        (self.graph.node_count(), self.graph.edge_count())
    }

    /// The states expanded so far.
    pub fn known_states(&self) -> impl Iterator<Item = &StateOf<H>> {
        self.known_states.iter()
    }

    /// The underlying transition graph, for introspection and DOT dumps.
    pub fn graph(&self) -> &GraphOf<H> {
        &self.graph
    }

    /// Create the node if it has never been referenced, marking it Seen
    /// and scheduling its expansion.
    fn ensure_node(&mut self, node: NodeOf<H>) {
        if !self.awareness.contains_key(&node) {
            self.awareness.insert(node.clone(), Awareness::Seen);
            self.work.offer(WorkItem::Expand(node));
        }
    }

    /// Offer an edge introduction unless the graph already holds it.
    fn enqueue_edge(&mut self, edge: EdgeOf<H>) {
        if !self.graph.has_edge(&edge) {
            self.work.offer(WorkItem::IntroduceEdge(edge));
        }
    }

    /// Offer an untargeted-pop introduction unless already associated.
    fn enqueue_untargeted_pop(&mut self, node: NodeOf<H>, action: UntargetedOf<H>) {
        if !self.graph.has_untargeted_pop(&node, &action) {
            self.work
                .offer(WorkItem::IntroduceUntargetedPop(node, action));
        }
    }

    fn expand(&mut self, node: NodeOf<H>) {
        // Duplicate Expand items may linger in the collection; a node is
        // only ever expanded once.
        if self.awareness.insert(node.clone(), Awareness::Expanded) == Some(Awareness::Expanded) {
            return;
        }
        trace!(node = %node, "expanding node");

        match node {
            Node::State(state) => {
                self.known_states.insert(state.clone());

                let mut edges = Vec::new();
                for function in &self.edge_functions {
                    for (actions, to) in function(&state) {
                        edges.push(decompose(
                            Node::state(state.clone()),
                            actions,
                            Node::state(to),
                        ));
                    }
                }
                let mut associations = Vec::new();
                for function in &self.untargeted_pop_functions {
                    for action in function(&state) {
                        associations.push((Node::state(state.clone()), action));
                    }
                }
                for edge in edges {
                    self.enqueue_edge(edge);
                }
                for (node, action) in associations {
                    self.enqueue_untargeted_pop(node, action);
                }
            }
            Node::Intermediate(chain) => {
                // Advance one action along the owed suffix.
                let edge = decompose(
                    Node::Intermediate(chain.clone()),
                    chain.actions.clone(),
                    chain.target.clone(),
                );
                self.enqueue_edge(edge);
            }
        }
    }

    /// Close a candidate edge against the graph, enqueue the consequent
    /// work, then insert it.
    fn introduce_edge(&mut self, edge: EdgeOf<H>) {
        if self.graph.has_edge(&edge) {
            return;
        }
        trace!(edge = %edge, "introducing edge");

        let mut consequences: SmallVec<[EdgeOf<H>; 8]> = SmallVec::new();
        let graph = &self.graph;
        let handler = &self.handler;
        match &edge.action {
            StackAction::Nop => {
                // p --push k--> source --nop--> target
                for (p, k) in graph.push_edges_by_target(&edge.source) {
                    consequences.push(Edge {
                        source: p.clone(),
                        target: edge.target.clone(),
                        action: StackAction::Push(k.clone()),
                    });
                }
                // p --nop--> source --nop--> target
                for p in graph.nop_edges_by_target(&edge.source) {
                    consequences.push(Edge {
                        source: p.clone(),
                        target: edge.target.clone(),
                        action: StackAction::Nop,
                    });
                }
                // source --nop--> target --nop--> t
                for t in graph.nop_edges_by_source(&edge.target) {
                    consequences.push(Edge {
                        source: edge.source.clone(),
                        target: t.clone(),
                        action: StackAction::Nop,
                    });
                }
            }
            StackAction::Push(k) => {
                // source --push k--> target --nop--> t
                for t in graph.nop_edges_by_source(&edge.target) {
                    consequences.push(Edge {
                        source: edge.source.clone(),
                        target: t.clone(),
                        action: StackAction::Push(k.clone()),
                    });
                }
                // source --push k--> target --pop k--> t
                for (t, popped) in graph.pop_edges_by_source(&edge.target) {
                    if popped == k {
                        consequences.push(Edge {
                            source: edge.source.clone(),
                            target: t.clone(),
                            action: StackAction::Nop,
                        });
                    }
                }
                // source --push k--> target --dynpop a--> t
                for (t, action) in graph.targeted_pop_edges_by_source(&edge.target) {
                    for actions in handler.perform_targeted_pop(k, action) {
                        consequences.push(decompose(edge.source.clone(), actions, t.clone()));
                    }
                }
                // source --push k--> target, untargeted pop at target
                for action in graph.untargeted_pops_at(&edge.target) {
                    for (actions, state) in handler.perform_untargeted_pop(k, action) {
                        consequences.push(decompose(
                            edge.source.clone(),
                            actions,
                            Node::state(state),
                        ));
                    }
                }
            }
            StackAction::Pop(k) => {
                // p --push k--> source --pop k--> target
                for (p, pushed) in graph.push_edges_by_target(&edge.source) {
                    if pushed == k {
                        consequences.push(Edge {
                            source: p.clone(),
                            target: edge.target.clone(),
                            action: StackAction::Nop,
                        });
                    }
                }
            }
            StackAction::DynamicPop(action) => {
                // p --push k--> source --dynpop a--> target
                for (p, k) in graph.push_edges_by_target(&edge.source) {
                    for actions in handler.perform_targeted_pop(k, action) {
                        consequences.push(decompose(p.clone(), actions, edge.target.clone()));
                    }
                }
            }
        }

        for consequence in consequences {
            self.enqueue_edge(consequence);
        }

        let source = edge.source.clone();
        let target = edge.target.clone();
        self.graph.add_edge(edge);
        self.ensure_node(source);
        self.ensure_node(target);
    }

    /// Close a candidate untargeted-pop association against the graph,
    /// enqueue the consequent work, then insert it.
    fn introduce_untargeted_pop(&mut self, node: NodeOf<H>, action: UntargetedOf<H>) {
        if self.graph.has_untargeted_pop(&node, &action) {
            return;
        }
        trace!(node = %node, action = %action, "introducing untargeted pop");

        let mut consequences: SmallVec<[EdgeOf<H>; 4]> = SmallVec::new();
        for (p, k) in self.graph.push_edges_by_target(&node) {
            for (actions, state) in self.handler.perform_untargeted_pop(k, &action) {
                consequences.push(decompose(p.clone(), actions, Node::state(state)));
            }
        }

        for consequence in consequences {
            self.enqueue_edge(consequence);
        }

        self.graph.add_untargeted_pop(node.clone(), action);
        self.ensure_node(node);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::NoDynamicPops;

    type TestAnalysis = Analysis<NoDynamicPops<&'static str, char>>;
    type Act = StackAction<char, crate::handler::NoAction>;

    fn analysis() -> TestAnalysis {
        Analysis::new(NoDynamicPops::new())
    }

    fn reachable(analysis: &TestAnalysis, state: &'static str, actions: &[Act]) -> Vec<&'static str> {
        let mut states: Vec<_> = analysis
            .reachable_states(&state, actions)
            .unwrap()
            .copied()
            .collect();
        states.sort();
        states
    }

    #[test]
    fn test_decompose_empty_list_is_nop() {
        let edge = decompose::<&str, char, char>(Node::state("A"), vec![], Node::state("B"));
        assert_eq!(edge.action, StackAction::Nop);
        assert_eq!(edge.target, Node::state("B"));
    }

    #[test]
    fn test_decompose_singleton_keeps_target() {
        let edge = decompose::<&str, char, char>(
            Node::state("A"),
            vec![StackAction::Push('x')],
            Node::state("B"),
        );
        assert_eq!(edge.action, StackAction::Push('x'));
        assert_eq!(edge.target, Node::state("B"));
    }

    #[test]
    fn test_decompose_longer_list_owes_suffix() {
        let edge = decompose::<&str, char, char>(
            Node::state("A"),
            vec![StackAction::Push('x'), StackAction::Pop('y')],
            Node::state("B"),
        );
        assert_eq!(edge.action, StackAction::Push('x'));
        assert_eq!(
            edge.target,
            Node::intermediate(Node::state("B"), vec![StackAction::Pop('y')])
        );
    }

    #[test]
    fn test_empty_analysis_is_closed() {
        let mut a = analysis();
        assert!(a.is_closed());
        assert!(!a.closure_step());
        assert_eq!(a.fully_close(), 0);
        assert_eq!(a.size(), (0, 0));
    }

    #[test]
    fn test_push_pop_summary() {
        let mut a = analysis();
        a.add_edge("A", vec![Act::Push('x')], "B");
        a.add_edge("B", vec![Act::Pop('x')], "C");
        a.add_start_state("A", vec![]);
        a.fully_close();

        assert!(a.is_closed());
        assert_eq!(reachable(&a, "A", &[]), vec!["A", "C"]);
    }

    #[test]
    fn test_query_for_non_start_state_fails() {
        let mut a = analysis();
        a.add_start_state("A", vec![]);
        a.fully_close();

        let err = a.reachable_states(&"Q", &[]).err().unwrap();
        assert_eq!(
            err,
            AnalysisError::ReachabilityRequestForNonStartState { state: "Q" }
        );

        // The same state under a different word is also not a start.
        assert!(a.reachable_states(&"A", &[Act::Push('x')]).is_err());
    }

    #[test]
    fn test_registration_reopens_closed_analysis() {
        let mut a = analysis();
        a.add_start_state("A", vec![]);
        a.fully_close();
        assert_eq!(reachable(&a, "A", &[]), vec!["A"]);

        a.add_edge("A", vec![Act::Push('x')], "B");
        a.add_edge("B", vec![Act::Pop('x')], "A");
        assert!(!a.is_closed());
        a.fully_close();
        assert_eq!(reachable(&a, "A", &[]), vec!["A"]);

        a.add_edge("B", vec![Act::Pop('x')], "C");
        a.fully_close();
        assert_eq!(reachable(&a, "A", &[]), vec!["A", "C"]);
    }

    #[test]
    fn test_close_up_to_bounds_steps() {
        let mut a = analysis();
        a.add_edge("A", vec![Act::Push('x')], "B");
        a.add_edge("B", vec![Act::Pop('x')], "C");
        a.add_start_state("A", vec![]);

        assert!(!a.close_up_to(1));
        assert!(a.close_up_to(10_000));
        assert_eq!(reachable(&a, "A", &[]), vec!["A", "C"]);
    }

    #[test]
    fn test_known_states_after_close() {
        let mut a = analysis();
        a.add_edge("A", vec![Act::Push('x')], "B");
        a.add_start_state("A", vec![]);
        a.fully_close();

        let mut known: Vec<_> = a.known_states().copied().collect();
        known.sort();
        assert_eq!(known, vec!["A", "B"]);
    }
}
