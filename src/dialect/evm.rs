//! EVM instruction set and the strict-assembly dialect
//!
//! The dialect materializes one builtin per functional instruction the
//! target VM version supports. The low-level jump instructions are
//! never builtins; strict assembly expresses control flow structurally.

use lazy_static::lazy_static;
use std::collections::{HashMap, HashSet};

use super::evm_version::EvmVersion;
use super::{BuiltinFunction, Dialect};
use crate::common::YulString;

/// An EVM instruction reachable from strict assembly
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Instruction {
    Stop,
    Add,
    Mul,
    Sub,
    Div,
    Sdiv,
    Mod,
    Smod,
    AddMod,
    MulMod,
    Exp,
    SignExtend,
    Lt,
    Gt,
    Slt,
    Sgt,
    Eq,
    IsZero,
    And,
    Or,
    Xor,
    Not,
    Byte,
    Shl,
    Shr,
    Sar,
    Keccak256,
    Address,
    Balance,
    Origin,
    Caller,
    CallValue,
    CallDataLoad,
    CallDataSize,
    CallDataCopy,
    CodeSize,
    CodeCopy,
    GasPrice,
    ExtCodeSize,
    ExtCodeCopy,
    ReturndataSize,
    ReturndataCopy,
    ExtCodeHash,
    BlockHash,
    Coinbase,
    Timestamp,
    Number,
    Difficulty,
    GasLimit,
    ChainId,
    SelfBalance,
    Pop,
    Mload,
    Mstore,
    Mstore8,
    Sload,
    Sstore,
    Jump,
    Jumpi,
    Pc,
    Msize,
    Gas,
    JumpDest,
    Log0,
    Log1,
    Log2,
    Log3,
    Log4,
    Create,
    Call,
    CallCode,
    Return,
    DelegateCall,
    Create2,
    StaticCall,
    Revert,
    Invalid,
    SelfDestruct,
}

/// Static facts about an instruction
#[derive(Debug, Clone, Copy)]
pub struct InstructionInfo {
    pub name: &'static str,
    pub args: usize,
    pub returns: usize,
}

/// Name, instruction, stack arguments consumed, stack items returned
const INSTRUCTIONS: &[(&str, Instruction, usize, usize)] = &[
    ("stop", Instruction::Stop, 0, 0),
    ("add", Instruction::Add, 2, 1),
    ("mul", Instruction::Mul, 2, 1),
    ("sub", Instruction::Sub, 2, 1),
    ("div", Instruction::Div, 2, 1),
    ("sdiv", Instruction::Sdiv, 2, 1),
    ("mod", Instruction::Mod, 2, 1),
    ("smod", Instruction::Smod, 2, 1),
    ("addmod", Instruction::AddMod, 3, 1),
    ("mulmod", Instruction::MulMod, 3, 1),
    ("exp", Instruction::Exp, 2, 1),
    ("signextend", Instruction::SignExtend, 2, 1),
    ("lt", Instruction::Lt, 2, 1),
    ("gt", Instruction::Gt, 2, 1),
    ("slt", Instruction::Slt, 2, 1),
    ("sgt", Instruction::Sgt, 2, 1),
    ("eq", Instruction::Eq, 2, 1),
    ("iszero", Instruction::IsZero, 1, 1),
    ("and", Instruction::And, 2, 1),
    ("or", Instruction::Or, 2, 1),
    ("xor", Instruction::Xor, 2, 1),
    ("not", Instruction::Not, 1, 1),
    ("byte", Instruction::Byte, 2, 1),
    ("shl", Instruction::Shl, 2, 1),
    ("shr", Instruction::Shr, 2, 1),
    ("sar", Instruction::Sar, 2, 1),
    ("keccak256", Instruction::Keccak256, 2, 1),
    ("address", Instruction::Address, 0, 1),
    ("balance", Instruction::Balance, 1, 1),
    ("origin", Instruction::Origin, 0, 1),
    ("caller", Instruction::Caller, 0, 1),
    ("callvalue", Instruction::CallValue, 0, 1),
    ("calldataload", Instruction::CallDataLoad, 1, 1),
    ("calldatasize", Instruction::CallDataSize, 0, 1),
    ("calldatacopy", Instruction::CallDataCopy, 3, 0),
    ("codesize", Instruction::CodeSize, 0, 1),
    ("codecopy", Instruction::CodeCopy, 3, 0),
    ("gasprice", Instruction::GasPrice, 0, 1),
    ("extcodesize", Instruction::ExtCodeSize, 1, 1),
    ("extcodecopy", Instruction::ExtCodeCopy, 4, 0),
    ("returndatasize", Instruction::ReturndataSize, 0, 1),
    ("returndatacopy", Instruction::ReturndataCopy, 3, 0),
    ("extcodehash", Instruction::ExtCodeHash, 1, 1),
    ("blockhash", Instruction::BlockHash, 1, 1),
    ("coinbase", Instruction::Coinbase, 0, 1),
    ("timestamp", Instruction::Timestamp, 0, 1),
    ("number", Instruction::Number, 0, 1),
    ("difficulty", Instruction::Difficulty, 0, 1),
    ("gaslimit", Instruction::GasLimit, 0, 1),
    ("chainid", Instruction::ChainId, 0, 1),
    ("selfbalance", Instruction::SelfBalance, 0, 1),
    ("pop", Instruction::Pop, 1, 0),
    ("mload", Instruction::Mload, 1, 1),
    ("mstore", Instruction::Mstore, 2, 0),
    ("mstore8", Instruction::Mstore8, 2, 0),
    ("sload", Instruction::Sload, 1, 1),
    ("sstore", Instruction::Sstore, 2, 0),
    ("jump", Instruction::Jump, 1, 0),
    ("jumpi", Instruction::Jumpi, 2, 0),
    ("pc", Instruction::Pc, 0, 1),
    ("msize", Instruction::Msize, 0, 1),
    ("gas", Instruction::Gas, 0, 1),
    ("jumpdest", Instruction::JumpDest, 0, 0),
    ("log0", Instruction::Log0, 2, 0),
    ("log1", Instruction::Log1, 3, 0),
    ("log2", Instruction::Log2, 4, 0),
    ("log3", Instruction::Log3, 5, 0),
    ("log4", Instruction::Log4, 6, 0),
    ("create", Instruction::Create, 3, 1),
    ("call", Instruction::Call, 7, 1),
    ("callcode", Instruction::CallCode, 7, 1),
    ("return", Instruction::Return, 2, 0),
    ("delegatecall", Instruction::DelegateCall, 6, 1),
    ("create2", Instruction::Create2, 4, 1),
    ("staticcall", Instruction::StaticCall, 6, 1),
    ("revert", Instruction::Revert, 2, 0),
    ("invalid", Instruction::Invalid, 0, 0),
    ("selfdestruct", Instruction::SelfDestruct, 1, 0),
];

lazy_static! {
    static ref INSTRUCTIONS_BY_NAME: HashMap<&'static str, (Instruction, InstructionInfo)> = {
        let mut map = HashMap::new();
        for &(name, instruction, args, returns) in INSTRUCTIONS {
            map.insert(
                name,
                (
                    instruction,
                    InstructionInfo {
                        name,
                        args,
                        returns,
                    },
                ),
            );
        }
        map
    };
    static ref INFO_BY_INSTRUCTION: HashMap<Instruction, InstructionInfo> = {
        INSTRUCTIONS
            .iter()
            .map(|&(name, instruction, args, returns)| {
                (
                    instruction,
                    InstructionInfo {
                        name,
                        args,
                        returns,
                    },
                )
            })
            .collect()
    };
}

/// Looks up an instruction by its assembly mnemonic, independently of
/// any VM version. Used to recognize instructions the active dialect
/// does not expose.
pub fn instruction_by_name(name: &str) -> Option<Instruction> {
    INSTRUCTIONS_BY_NAME.get(name).map(|&(instruction, _)| instruction)
}

pub fn instruction_info(instruction: Instruction) -> InstructionInfo {
    INFO_BY_INSTRUCTION[&instruction]
}

/// The strict-assembly dialect for a given target VM version.
///
/// The dialect is untyped: its only type tag is the empty string, which
/// doubles as default and boolean type.
pub struct EvmDialect {
    types: HashSet<YulString>,
    default_type: YulString,
    bool_type: YulString,
    builtins: HashMap<YulString, BuiltinFunction>,
}

impl EvmDialect {
    /// Dialect without object access (no `datasize`/`dataoffset`/`datacopy`)
    pub fn strict_assembly(version: EvmVersion) -> Self {
        Self::new(version, false)
    }

    /// Dialect with the object-access builtins enabled
    pub fn strict_assembly_with_objects(version: EvmVersion) -> Self {
        Self::new(version, true)
    }

    fn new(version: EvmVersion, object_access: bool) -> Self {
        let default_type = YulString::default();
        let mut builtins = HashMap::new();

        for &(name, instruction, args, returns) in INSTRUCTIONS {
            if matches!(
                instruction,
                Instruction::Jump | Instruction::Jumpi | Instruction::JumpDest
            ) {
                continue;
            }
            if !version.has_opcode(instruction) {
                continue;
            }
            let name = YulString::new(name);
            builtins.insert(
                name,
                BuiltinFunction {
                    name,
                    parameters: vec![default_type; args],
                    returns: vec![default_type; returns],
                    literal_arguments: false,
                    instruction: Some(instruction),
                },
            );
        }

        if object_access {
            for name in ["datasize", "dataoffset"] {
                let name = YulString::new(name);
                builtins.insert(
                    name,
                    BuiltinFunction {
                        name,
                        parameters: vec![default_type],
                        returns: vec![default_type],
                        literal_arguments: true,
                        instruction: None,
                    },
                );
            }
            let datacopy = YulString::new("datacopy");
            builtins.insert(
                datacopy,
                BuiltinFunction {
                    name: datacopy,
                    parameters: vec![default_type; 3],
                    returns: Vec::new(),
                    literal_arguments: false,
                    instruction: None,
                },
            );
        }

        Self {
            types: HashSet::from([default_type]),
            default_type,
            bool_type: default_type,
            builtins,
        }
    }
}

impl Dialect for EvmDialect {
    fn types(&self) -> &HashSet<YulString> {
        &self.types
    }

    fn default_type(&self) -> YulString {
        self.default_type
    }

    fn bool_type(&self) -> YulString {
        self.bool_type
    }

    fn builtin(&self, name: YulString) -> Option<&BuiltinFunction> {
        self.builtins.get(&name)
    }
}
