//! Bounds for user-supplied symbol types.

use std::fmt;
use std::hash::Hash;

/// The contract every user-supplied sort must satisfy: PDS states, stack
/// elements, and dynamic-pop action tokens.
///
/// Value equality, total ordering, and pretty printing are part of the
/// engine's interface contract; `Hash` is required because the graph
/// indexes nodes and elements with hash maps. The blanket impl means
/// users never implement this trait by hand.
pub trait Symbol: Clone + Eq + Ord + Hash + fmt::Debug + fmt::Display {}

impl<T: Clone + Eq + Ord + Hash + fmt::Debug + fmt::Display> Symbol for T {}
