//! AST for the strict-assembly language
//!
//! The tree is produced by a parser and borrowed immutably by the
//! analysis passes. Every node carries a [`NodeId`] so analysis results
//! can be keyed without back-pointers into the tree.

mod expr;
mod stmt;
pub mod value;

pub use expr::*;
pub use stmt::*;

use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_NODE_ID: AtomicU64 = AtomicU64::new(0);

/// Stable identity of an AST node, assigned at construction.
///
/// Ids are unique within the process, so the same tree keeps the same
/// ids across analysis runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u64);

impl NodeId {
    pub fn fresh() -> Self {
        Self(NEXT_NODE_ID.fetch_add(1, Ordering::Relaxed))
    }
}
