//! Target VM versions and their feature sets

use std::fmt;

use super::evm::Instruction;

/// An EVM hard-fork version the compiler can target.
///
/// Ordering follows release order, so feature predicates are simple
/// comparisons against the fork that introduced the feature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum EvmVersion {
    Homestead,
    TangerineWhistle,
    SpuriousDragon,
    Byzantium,
    Constantinople,
    Petersburg,
    #[default]
    Istanbul,
}

impl EvmVersion {
    pub fn name(self) -> &'static str {
        match self {
            EvmVersion::Homestead => "homestead",
            EvmVersion::TangerineWhistle => "tangerineWhistle",
            EvmVersion::SpuriousDragon => "spuriousDragon",
            EvmVersion::Byzantium => "byzantium",
            EvmVersion::Constantinople => "constantinople",
            EvmVersion::Petersburg => "petersburg",
            EvmVersion::Istanbul => "istanbul",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        [
            EvmVersion::Homestead,
            EvmVersion::TangerineWhistle,
            EvmVersion::SpuriousDragon,
            EvmVersion::Byzantium,
            EvmVersion::Constantinople,
            EvmVersion::Petersburg,
            EvmVersion::Istanbul,
        ]
        .into_iter()
        .find(|v| v.name() == name)
    }

    pub fn supports_returndata(self) -> bool {
        self >= EvmVersion::Byzantium
    }

    pub fn has_static_call(self) -> bool {
        self >= EvmVersion::Byzantium
    }

    pub fn has_bitwise_shifting(self) -> bool {
        self >= EvmVersion::Constantinople
    }

    pub fn has_create2(self) -> bool {
        self >= EvmVersion::Constantinople
    }

    pub fn has_ext_code_hash(self) -> bool {
        self >= EvmVersion::Constantinople
    }

    pub fn has_chain_id(self) -> bool {
        self >= EvmVersion::Istanbul
    }

    pub fn has_self_balance(self) -> bool {
        self >= EvmVersion::Istanbul
    }

    /// Whether this version's instruction set contains `instruction`
    pub fn has_opcode(self, instruction: Instruction) -> bool {
        use Instruction::*;
        match instruction {
            ReturndataCopy | ReturndataSize => self.supports_returndata(),
            StaticCall => self.has_static_call(),
            Shl | Shr | Sar => self.has_bitwise_shifting(),
            Create2 => self.has_create2(),
            ExtCodeHash => self.has_ext_code_hash(),
            ChainId => self.has_chain_id(),
            SelfBalance => self.has_self_balance(),
            _ => true,
        }
    }
}

impl fmt::Display for EvmVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
