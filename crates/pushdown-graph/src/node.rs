//! Graph vertices: PDS states and intermediate action-chain nodes.

use crate::action::StackAction;
use std::fmt;
use std::sync::Arc;

/// A vertex of the transition graph.
///
/// Equality, ordering and hashing are structural: two independently built
/// `Intermediate` nodes with the same `(target, actions)` are the same
/// node. The saturation engine relies on this for deduplication, and the
/// query surface relies on it to locate start-state anchors. The `Arc`
/// makes clones reference bumps and shares chain suffixes between edges.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Node<St, El, Ta> {
    /// A node identifying a PDS state.
    State(St),
    /// An anonymous node owing an action suffix before reaching `target`.
    Intermediate(Arc<Intermediate<St, El, Ta>>),
}

/// The payload of an intermediate node: execute `actions`, then continue
/// from `target`.
///
/// Decomposition always creates these with the nonempty suffix still
/// owed; start-state anchors may carry an empty list (the anchor's
/// structural identity is the query key).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Intermediate<St, El, Ta> {
    pub target: Node<St, El, Ta>,
    pub actions: Vec<StackAction<El, Ta>>,
}

impl<St, El, Ta> Node<St, El, Ta> {
    /// Wrap a PDS state.
    pub fn state(state: St) -> Self {
        Node::State(state)
    }

    /// Build an intermediate node for an owed action suffix.
    pub fn intermediate(target: Node<St, El, Ta>, actions: Vec<StackAction<El, Ta>>) -> Self {
        Node::Intermediate(Arc::new(Intermediate { target, actions }))
    }

    /// The PDS state this node identifies, if it is a state node.
    pub fn as_state(&self) -> Option<&St> {
        match self {
            Node::State(s) => Some(s),
            Node::Intermediate(_) => None,
        }
    }
}

impl<St: fmt::Display, El: fmt::Display, Ta: fmt::Display> fmt::Display for Node<St, El, Ta> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Node::State(s) => write!(f, "{}", s),
            Node::Intermediate(im) => {
                write!(f, "[")?;
                for (i, action) in im.actions.iter().enumerate() {
                    if i > 0 {
                        write!(f, "; ")?;
                    }
                    write!(f, "{}", action)?;
                }
                write!(f, " => {}]", im.target)
            }
        }
    }
}
