//! Semantic analysis
//!
//! Two passes run over a parsed tree: [`ScopeFiller`] builds the scope
//! tree and registers declarations, then [`Analyzer`] resolves names,
//! checks types and simulates the evaluation stack. Results land in
//! [`AnalysisInfo`]; diagnostics land in the caller's
//! [`ErrorReporter`](crate::common::ErrorReporter).

mod analysis_info;
mod analyzer;
mod scope;
mod scope_filler;

pub use analysis_info::AnalysisInfo;
pub use analyzer::{analyze_strict_assert_correct, Analyzer};
pub use scope::{Function, Scope, ScopeEntry, ScopeId, ScopeTree, Variable};
pub use scope_filler::ScopeFiller;

use crate::ast::Identifier;
use crate::common::ErrorReporter;

/// Where an externally resolved identifier occurs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentifierContext {
    RValue,
    LValue,
    VariableDeclaration,
}

/// Callback resolving identifiers not bound in any scope.
///
/// Returns the number of stack items the identifier occupies, or
/// `None` when the identifier is not handled. The callback may report
/// diagnostics of its own through the passed reporter; the analyzer
/// then suppresses its generic not-found message.
pub type Resolver<'a> =
    Box<dyn FnMut(&Identifier, IdentifierContext, bool, &mut ErrorReporter) -> Option<usize> + 'a>;
