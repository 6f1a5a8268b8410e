//! The dynamic-pop handler contract and derived type aliases.

use pushdown_graph::{Edge, Graph, Node, StackAction, Symbol};
use std::fmt;
use std::marker::PhantomData;

/// A list of stack actions, as accepted by registration operations and
/// produced by dynamic-pop handlers.
pub type ActionList<El, Ta> = Vec<StackAction<El, Ta>>;

/// User-supplied behavior for dynamic pop actions.
///
/// The handler fixes the four sorts of a pushdown system (states, stack
/// elements, targeted and untargeted dynamic-pop action tokens) and
/// explains, at saturation time, what a dynamic pop does given the
/// element actually popped.
///
/// Both operations must be deterministic and total over the alphabet:
/// the engine may call them repeatedly and assumes the results depend
/// only on the arguments. Nondeterministic or impure handlers may yield
/// stale or duplicate results but never a crash.
pub trait DynamicPopHandler {
    type State: Symbol;
    type Element: Symbol;
    type TargetedAction: Symbol;
    type UntargetedAction: Symbol;

    /// Given the popped element and a targeted action token, the zero or
    /// more ways the pop succeeds; each way is a (possibly empty) action
    /// list to continue with toward the edge's fixed target.
    fn perform_targeted_pop(
        &self,
        top: &Self::Element,
        action: &Self::TargetedAction,
    ) -> Vec<ActionList<Self::Element, Self::TargetedAction>>;

    /// As [`perform_targeted_pop`](Self::perform_targeted_pop), but each
    /// alternative also names its destination state.
    fn perform_untargeted_pop(
        &self,
        top: &Self::Element,
        action: &Self::UntargetedAction,
    ) -> Vec<(ActionList<Self::Element, Self::TargetedAction>, Self::State)>;
}

/// The state sort of a handler.
pub type StateOf<H> = <H as DynamicPopHandler>::State;
/// The stack-element sort of a handler.
pub type ElementOf<H> = <H as DynamicPopHandler>::Element;
/// The targeted dynamic-pop action sort of a handler.
pub type TargetedOf<H> = <H as DynamicPopHandler>::TargetedAction;
/// The untargeted dynamic-pop action sort of a handler.
pub type UntargetedOf<H> = <H as DynamicPopHandler>::UntargetedAction;

pub type ActionListOf<H> = ActionList<ElementOf<H>, TargetedOf<H>>;
pub type NodeOf<H> = Node<StateOf<H>, ElementOf<H>, TargetedOf<H>>;
pub type EdgeOf<H> = Edge<StateOf<H>, ElementOf<H>, TargetedOf<H>>;
pub type GraphOf<H> = Graph<StateOf<H>, ElementOf<H>, TargetedOf<H>, UntargetedOf<H>>;

/// An uninhabited dynamic-pop action token, for systems without dynamic
/// pops.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum NoAction {}

impl fmt::Display for NoAction {
    fn fmt(&self, _f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {}
    }
}

/// A handler for pushdown systems that use no dynamic pops at all. Its
/// action sorts are uninhabited, so neither operation can ever be
/// reached.
pub struct NoDynamicPops<St, El> {
    _marker: PhantomData<(St, El)>,
}

impl<St, El> NoDynamicPops<St, El> {
    pub fn new() -> Self {
        Self {
            _marker: PhantomData,
        }
    }
}

impl<St, El> Default for NoDynamicPops<St, El> {
    fn default() -> Self {
        Self::new()
    }
}

impl<St: Symbol, El: Symbol> DynamicPopHandler for NoDynamicPops<St, El> {
    type State = St;
    type Element = El;
    type TargetedAction = NoAction;
    type UntargetedAction = NoAction;

    fn perform_targeted_pop(
        &self,
        _top: &Self::Element,
        action: &Self::TargetedAction,
    ) -> Vec<ActionList<Self::Element, Self::TargetedAction>> {
        match *action {}
    }

    fn perform_untargeted_pop(
        &self,
        _top: &Self::Element,
        action: &Self::UntargetedAction,
    ) -> Vec<(ActionList<Self::Element, Self::TargetedAction>, Self::State)> {
        match *action {}
    }
}
