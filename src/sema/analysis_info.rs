//! Analysis results shared between the two passes

use std::collections::HashMap;

use super::scope::{ScopeId, ScopeTree};
use crate::ast::NodeId;

/// Everything the passes learn about a tree.
///
/// Filled by [`ScopeFiller`] (scopes, virtual blocks) and extended by
/// [`Analyzer`] (stack heights). Grows monotonically for the duration
/// of a run and stays valid as long as the analyzed tree does.
///
/// [`ScopeFiller`]: super::ScopeFiller
/// [`Analyzer`]: super::Analyzer
#[derive(Debug, Default)]
pub struct AnalysisInfo {
    /// Arena owning every scope of the run
    pub scope_tree: ScopeTree,
    /// Scope owned by each block
    pub scopes: HashMap<NodeId, ScopeId>,
    /// Synthetic scope holding each function's parameters and return
    /// variables, distinct from the body scope chained beneath it
    pub virtual_blocks: HashMap<NodeId, ScopeId>,
    /// Simulated stack height after visiting each node
    pub stack_height_info: HashMap<NodeId, i32>,
}

impl AnalysisInfo {
    pub fn new() -> Self {
        Self::default()
    }
}
