//! Saturation-based reachability analysis for pushdown systems.
//!
//! A pushdown system (PDS) is a transition system over pairs of a state
//! and a stack word, whose edges push, pop, or leave the stack unchanged.
//! This crate answers queries of the form "starting at state `s` with an
//! initial stack word `w`, which states are reachable when the stack
//! becomes empty?" by closing a graph of single-action edges under
//! CFL-reachability saturation rules, then reading summary (`Nop`) edges
//! off the closed graph.
//!
//! The PDS is described through a [`DynamicPopHandler`], which fixes the
//! user sorts and supplies element-dependent pop behavior; edges, edge
//! generating functions, dynamic pops, and start states are registered on
//! an [`Analysis`], which is then driven to its fixpoint:
//!
//! ```
//! use pushdown_reach::{Analysis, NoDynamicPops, StackAction};
//!
//! let mut analysis = Analysis::<NoDynamicPops<&str, char>>::new(NoDynamicPops::new());
//! analysis.add_edge("A", vec![StackAction::Push('x')], "B");
//! analysis.add_edge("B", vec![StackAction::Pop('x')], "C");
//! analysis.add_start_state("A", vec![]);
//! analysis.fully_close();
//!
//! let mut reachable: Vec<_> = analysis.reachable_states(&"A", &[]).unwrap().collect();
//! reachable.sort();
//! assert_eq!(reachable, [&"A", &"C"]);
//! ```
//!
//! The engine does not execute the PDS, and termination of the closure is
//! the caller's responsibility: the user-supplied abstract domains must
//! be finite.

pub mod analysis;
pub mod error;
pub mod handler;
pub mod work;

pub use analysis::{Analysis, EdgeFunction, UntargetedPopFunction};
pub use error::{AnalysisError, AnalysisResult};
pub use handler::{
    ActionList, ActionListOf, DynamicPopHandler, EdgeOf, ElementOf, GraphOf, NoAction,
    NoDynamicPops, NodeOf, StateOf, TargetedOf, UntargetedOf,
};
pub use work::{WorkCollection, WorkItem, WorkItemOf, WorkQueue, WorkStack};

pub use pushdown_graph::{Edge, Graph, Intermediate, Node, StackAction, Symbol};
