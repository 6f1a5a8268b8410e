//! Property tests over randomly generated pushdown systems.
//!
//! A small reference interpreter executes the PDS directly (bounded
//! stack depth, bounded configuration budget) and every state it finds
//! co-reachable with an empty stack must also be reported by the closed
//! analysis. The remaining properties compare whole analyses against
//! each other: ordering policy, duplicate registration, catch-up timing,
//! monotonicity, and finality must all be observationally irrelevant.

use proptest::prelude::*;
use pushdown_reach::{
    Analysis, DynamicPopHandler, StackAction, WorkCollection, WorkItemOf, WorkQueue, WorkStack,
};
use std::collections::{BTreeSet, HashSet, VecDeque};

type Act = StackAction<u8, u8>;
type PdsEdge = (u8, Vec<Act>, u8);

/// Deterministic handler over `u8` sorts: a targeted pop succeeds (with
/// an empty continuation) when the popped element has the token's
/// parity; an untargeted pop fires on an exact element match and routes
/// to the element plus ten.
struct ParityHandler;

impl DynamicPopHandler for ParityHandler {
    type State = u8;
    type Element = u8;
    type TargetedAction = u8;
    type UntargetedAction = u8;

    fn perform_targeted_pop(&self, top: &u8, action: &u8) -> Vec<Vec<Act>> {
        if top % 2 == action % 2 {
            vec![vec![]]
        } else {
            vec![]
        }
    }

    fn perform_untargeted_pop(&self, top: &u8, action: &u8) -> Vec<(Vec<Act>, u8)> {
        if top == action {
            vec![(vec![], top.wrapping_add(10))]
        } else {
            vec![]
        }
    }
}

fn word_actions(word: &[u8]) -> Vec<Act> {
    word.iter().copied().map(StackAction::Push).collect()
}

fn build<W>(edges: &[PdsEdge], untargeted: &[(u8, u8)], start: u8, word: &[u8]) -> Analysis<ParityHandler, W>
where
    W: WorkCollection<WorkItemOf<ParityHandler>> + Default,
{
    let mut analysis = Analysis::<ParityHandler, W>::new(ParityHandler);
    for (from, actions, to) in edges {
        analysis.add_edge(*from, actions.clone(), *to);
    }
    for (at, token) in untargeted {
        analysis.add_untargeted_pop_action(*at, *token);
    }
    analysis.add_start_state(start, word_actions(word));
    analysis.fully_close();
    analysis
}

fn result_of<W>(analysis: &Analysis<ParityHandler, W>, start: u8, word: &[u8]) -> Vec<u8>
where
    W: WorkCollection<WorkItemOf<ParityHandler>>,
{
    let mut states: Vec<u8> = analysis
        .reachable_states(&start, &word_actions(word))
        .expect("start state was registered")
        .copied()
        .collect();
    states.sort_unstable();
    states
}

/// Execute one action list against a stack; `None` when a pop fails.
fn apply_actions(stack: &[u8], actions: &[Act]) -> Option<Vec<u8>> {
    let mut stack = stack.to_vec();
    for action in actions {
        match action {
            Act::Nop => {}
            Act::Push(k) => stack.push(*k),
            Act::Pop(k) => {
                if stack.pop() != Some(*k) {
                    return None;
                }
            }
            Act::DynamicPop(token) => {
                let top = stack.pop()?;
                if top % 2 != token % 2 {
                    return None;
                }
            }
        }
    }
    Some(stack)
}

/// Direct BFS over configurations, mirroring `ParityHandler` semantics.
/// Bounded in stack depth and visited configurations, so the result is a
/// subset of the true empty-stack-reachable set.
fn reference_reachable(
    edges: &[PdsEdge],
    untargeted: &[(u8, u8)],
    start: u8,
    word: &[u8],
) -> BTreeSet<u8> {
    let mut reachable = BTreeSet::new();
    let mut seen = HashSet::new();
    let mut queue = VecDeque::new();
    queue.push_back((start, word.to_vec()));

    let mut budget = 20_000usize;
    while let Some((state, stack)) = queue.pop_front() {
        if !seen.insert((state, stack.clone())) {
            continue;
        }
        if stack.is_empty() {
            reachable.insert(state);
        }
        if stack.len() > 8 {
            continue;
        }
        budget -= 1;
        if budget == 0 {
            break;
        }

        for (from, actions, to) in edges {
            if *from == state {
                if let Some(next) = apply_actions(&stack, actions) {
                    queue.push_back((*to, next));
                }
            }
        }
        for (at, token) in untargeted {
            if *at == state {
                if let Some((&top, rest)) = stack.split_last() {
                    if top == *token {
                        queue.push_back((top.wrapping_add(10), rest.to_vec()));
                    }
                }
            }
        }
    }
    reachable
}

fn action_strategy() -> impl Strategy<Value = Act> {
    prop_oneof![
        (0u8..3).prop_map(StackAction::Push),
        (0u8..3).prop_map(StackAction::Pop),
        (0u8..3).prop_map(StackAction::DynamicPop),
    ]
}

fn edges_strategy() -> impl Strategy<Value = Vec<PdsEdge>> {
    prop::collection::vec(
        (0u8..4, prop::collection::vec(action_strategy(), 0..3), 0u8..4),
        0..10,
    )
}

fn untargeted_strategy() -> impl Strategy<Value = Vec<(u8, u8)>> {
    prop::collection::vec((0u8..4, 0u8..3), 0..4)
}

fn word_strategy() -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(0u8..3, 0..3)
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 64,
        .. ProptestConfig::default()
    })]

    #[test]
    fn reference_states_are_all_found(
        edges in edges_strategy(),
        untargeted in untargeted_strategy(),
        start in 0u8..4,
        word in word_strategy(),
    ) {
        let analysis = build::<WorkQueue<_>>(&edges, &untargeted, start, &word);
        let found = result_of(&analysis, start, &word);
        let reference = reference_reachable(&edges, &untargeted, start, &word);

        for state in &reference {
            prop_assert!(
                found.binary_search(state).is_ok(),
                "state {} co-reachable by direct execution but missing from analysis ({:?})",
                state,
                found
            );
        }
    }

    #[test]
    fn work_order_does_not_change_results(
        edges in edges_strategy(),
        untargeted in untargeted_strategy(),
        start in 0u8..4,
        word in word_strategy(),
    ) {
        let fifo = build::<WorkQueue<_>>(&edges, &untargeted, start, &word);
        let lifo = build::<WorkStack<_>>(&edges, &untargeted, start, &word);

        prop_assert_eq!(result_of(&fifo, start, &word), result_of(&lifo, start, &word));
        prop_assert_eq!(fifo.size(), lifo.size());
    }

    #[test]
    fn duplicate_registration_is_idempotent(
        edges in edges_strategy(),
        untargeted in untargeted_strategy(),
        start in 0u8..4,
        word in word_strategy(),
    ) {
        let once = build::<WorkQueue<_>>(&edges, &untargeted, start, &word);

        let mut twice = Analysis::<ParityHandler, WorkQueue<_>>::new(ParityHandler);
        for (from, actions, to) in edges.iter().chain(edges.iter()) {
            twice.add_edge(*from, actions.clone(), *to);
        }
        for (at, token) in untargeted.iter().chain(untargeted.iter()) {
            twice.add_untargeted_pop_action(*at, *token);
        }
        twice.add_start_state(start, word_actions(&word));
        twice.add_start_state(start, word_actions(&word));
        twice.fully_close();

        prop_assert_eq!(result_of(&once, start, &word), result_of(&twice, start, &word));
        prop_assert_eq!(once.size(), twice.size());
    }

    #[test]
    fn closure_is_monotone(
        edges in edges_strategy(),
        extra in edges_strategy(),
        start in 0u8..4,
        word in word_strategy(),
    ) {
        let smaller = build::<WorkQueue<_>>(&edges, &[], start, &word);

        let mut all = edges.clone();
        all.extend(extra);
        let larger = build::<WorkQueue<_>>(&all, &[], start, &word);

        let small_result = result_of(&smaller, start, &word);
        let large_result = result_of(&larger, start, &word);
        for state in &small_result {
            prop_assert!(large_result.binary_search(state).is_ok());
        }
    }

    #[test]
    fn closure_is_final(
        edges in edges_strategy(),
        untargeted in untargeted_strategy(),
        start in 0u8..4,
        word in word_strategy(),
    ) {
        let mut analysis = build::<WorkQueue<_>>(&edges, &untargeted, start, &word);
        let size = analysis.size();
        let result = result_of(&analysis, start, &word);

        prop_assert!(analysis.is_closed());
        prop_assert_eq!(analysis.fully_close(), 0);
        prop_assert_eq!(analysis.size(), size);
        prop_assert_eq!(result_of(&analysis, start, &word), result);
    }

    #[test]
    fn catch_up_matches_up_front_registration(
        static_edges in edges_strategy(),
        generated_edges in edges_strategy(),
        start in 0u8..4,
        word in word_strategy(),
    ) {
        let function_edges = generated_edges.clone();
        let make_function = move || {
            let function_edges = function_edges.clone();
            move |state: &u8| {
                function_edges
                    .iter()
                    .filter(|(from, _, _)| from == state)
                    .map(|(_, actions, to)| (actions.clone(), *to))
                    .collect::<Vec<_>>()
            }
        };

        // Function registered before anything else.
        let mut up_front = Analysis::<ParityHandler, WorkQueue<_>>::new(ParityHandler);
        up_front.add_edge_function(make_function());
        for (from, actions, to) in &static_edges {
            up_front.add_edge(*from, actions.clone(), *to);
        }
        up_front.add_start_state(start, word_actions(&word));
        up_front.fully_close();

        // Function registered only after the analysis was fully closed.
        let mut late = Analysis::<ParityHandler, WorkQueue<_>>::new(ParityHandler);
        for (from, actions, to) in &static_edges {
            late.add_edge(*from, actions.clone(), *to);
        }
        late.add_start_state(start, word_actions(&word));
        late.fully_close();
        late.add_edge_function(make_function());
        late.fully_close();

        prop_assert_eq!(
            result_of(&up_front, start, &word),
            result_of(&late, start, &word)
        );
    }
}
