//! Code and data object containers
//!
//! An object bundles a code block with named data sections and nested
//! sub-objects. The analyzer only consumes the set of names visible to
//! the object-access builtins; assembling and linking live elsewhere.

use std::collections::HashSet;

use crate::ast::Block;
use crate::common::YulString;

/// A named blob of raw bytes embedded alongside code
#[derive(Debug, Clone)]
pub struct Data {
    pub name: YulString,
    pub data: Vec<u8>,
}

/// A nested member of an object
#[derive(Debug, Clone)]
pub enum ObjectMember {
    Object(Object),
    Data(Data),
}

impl ObjectMember {
    pub fn name(&self) -> YulString {
        match self {
            ObjectMember::Object(object) => object.name,
            ObjectMember::Data(data) => data.name,
        }
    }
}

/// A code block with its named data sections and sub-objects
#[derive(Debug, Clone)]
pub struct Object {
    pub name: YulString,
    pub code: Block,
    pub members: Vec<ObjectMember>,
}

impl Object {
    pub fn new(name: YulString, code: Block) -> Self {
        Self {
            name,
            code,
            members: Vec::new(),
        }
    }

    /// Names addressable by the object-access builtins: the object's
    /// own name and the names of its direct members. The empty name is
    /// not valid and never appears in the result.
    pub fn data_names(&self) -> HashSet<YulString> {
        let mut names: HashSet<YulString> = self
            .members
            .iter()
            .map(ObjectMember::name)
            .collect();
        names.insert(self.name);
        names.remove(&YulString::default());
        names
    }
}
