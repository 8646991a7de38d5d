//! Dialect abstraction
//!
//! A dialect supplies the set of builtin functions, the valid type
//! tags, and the literal-typing rules the analyzer enforces. The EVM
//! strict-assembly dialect is the prominent implementation; tests and
//! embedders may plug in their own.

pub mod evm;
mod evm_version;

pub use evm::{instruction_by_name, instruction_info, EvmDialect, Instruction, InstructionInfo};
pub use evm_version::EvmVersion;

use std::collections::HashSet;

use crate::ast::LiteralKind;
use crate::common::YulString;

/// A function supplied by the dialect rather than defined in source
#[derive(Debug, Clone)]
pub struct BuiltinFunction {
    pub name: YulString,
    pub parameters: Vec<YulString>,
    pub returns: Vec<YulString>,
    /// Arguments must be literals naming known data objects
    pub literal_arguments: bool,
    /// The VM instruction this builtin lowers to, if any
    pub instruction: Option<Instruction>,
}

/// Trait for language dialects
pub trait Dialect {
    /// The finite set of valid type tags
    fn types(&self) -> &HashSet<YulString>;

    /// Type assumed where no tag is given
    fn default_type(&self) -> YulString;

    /// Type required of `if`, `for` and switch-case conditions
    fn bool_type(&self) -> YulString;

    fn builtin(&self, name: YulString) -> Option<&BuiltinFunction>;

    /// Whether a literal of the given kind and text may carry the given
    /// type tag
    fn valid_type_for_literal(
        &self,
        kind: LiteralKind,
        value: YulString,
        ty: YulString,
    ) -> bool {
        let _ = value;
        match kind {
            LiteralKind::Boolean => ty == self.bool_type(),
            _ => true,
        }
    }
}
