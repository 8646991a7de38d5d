//! Semantic analyzer for an EVM-flavoured inline-assembly language
//!
//! This library checks a parsed strict-assembly tree for semantic
//! validity: scoping, name resolution, type consistency, stack-height
//! balance, builtin usage, and per-VM-version instruction legality.
//!
//! ## Architecture
//!
//! The crate is organized into:
//! - **AST** (`ast/`): the immutable input tree and literal semantics
//! - **Dialect** (`dialect/`): builtin tables, type rules, VM versions
//! - **Sema** (`sema/`): the two analysis passes and their results
//! - **Object** (`object.rs`): code/data containers at the boundary
//! - **Common** (`common/`): shared infrastructure (errors, spans,
//!   interned strings)
//!
//! Analysis never aborts on the first problem: diagnostics accumulate
//! in an [`ErrorReporter`] and the walk keeps going where it can.

pub mod ast;
pub mod common;
pub mod dialect;
pub mod object;
pub mod sema;

// Re-exports for convenience
pub use common::{CompileError, DiagnosticReporter, ErrorKind, ErrorReporter, Span, YulString};
pub use dialect::{BuiltinFunction, Dialect, EvmDialect, EvmVersion};
pub use object::{Data, Object, ObjectMember};
pub use sema::{
    analyze_strict_assert_correct, AnalysisInfo, Analyzer, IdentifierContext, Resolver,
    ScopeFiller,
};
