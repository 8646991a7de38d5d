//! Scopes and the symbol table
//!
//! Scopes form a tree owned by a [`ScopeTree`] arena; tree nodes refer
//! to each other through [`ScopeId`] handles so analysis results can
//! hold onto scopes without lifetimes tying them to the walk.

use std::collections::HashMap;

use crate::common::YulString;

/// Handle of a scope inside a [`ScopeTree`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScopeId(usize);

/// A variable binding with its type tag
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Variable {
    pub ty: YulString,
}

/// A function binding with its signature
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Function {
    pub arguments: Vec<YulString>,
    pub returns: Vec<YulString>,
}

/// What a name is bound to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScopeEntry {
    Variable(Variable),
    Function(Function),
}

/// One node of the scope tree
#[derive(Debug, Default)]
pub struct Scope {
    parent: Option<ScopeId>,
    /// Set on the scope holding a function's parameters and return
    /// variables; lookups walking past it stop seeing outer variables.
    function_scope: bool,
    identifiers: HashMap<YulString, ScopeEntry>,
}

impl Scope {
    /// Binds a variable. Fails if the name is already bound here.
    pub fn register_variable(&mut self, name: YulString, ty: YulString) -> bool {
        if self.identifiers.contains_key(&name) {
            return false;
        }
        self.identifiers.insert(name, ScopeEntry::Variable(Variable { ty }));
        true
    }

    /// Binds a function. Fails if the name is already bound here.
    pub fn register_function(
        &mut self,
        name: YulString,
        arguments: Vec<YulString>,
        returns: Vec<YulString>,
    ) -> bool {
        if self.identifiers.contains_key(&name) {
            return false;
        }
        self.identifiers
            .insert(name, ScopeEntry::Function(Function { arguments, returns }));
        true
    }

    /// Entry bound directly in this scope, ignoring ancestors
    pub fn entry(&self, name: YulString) -> Option<&ScopeEntry> {
        self.identifiers.get(&name)
    }

    pub fn parent(&self) -> Option<ScopeId> {
        self.parent
    }

    pub fn is_function_scope(&self) -> bool {
        self.function_scope
    }

    /// Count of variables declared directly in this scope
    pub fn number_of_variables(&self) -> usize {
        self.identifiers
            .values()
            .filter(|entry| matches!(entry, ScopeEntry::Variable(_)))
            .count()
    }
}

/// Arena owning every scope created during analysis
#[derive(Debug, Default)]
pub struct ScopeTree {
    scopes: Vec<Scope>,
}

impl ScopeTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create(&mut self, parent: Option<ScopeId>) -> ScopeId {
        self.scopes.push(Scope {
            parent,
            ..Scope::default()
        });
        ScopeId(self.scopes.len() - 1)
    }

    /// Creates the scope holding a function's parameters and returns
    pub fn create_function_scope(&mut self, parent: Option<ScopeId>) -> ScopeId {
        let id = self.create(parent);
        self.scopes[id.0].function_scope = true;
        id
    }

    pub fn get(&self, id: ScopeId) -> &Scope {
        &self.scopes[id.0]
    }

    pub fn get_mut(&mut self, id: ScopeId) -> &mut Scope {
        &mut self.scopes[id.0]
    }

    /// Resolves `name` starting at `from` and walking outward.
    ///
    /// Walking past a function scope hides outer variables: the IL's
    /// functions cannot capture. Outer functions stay visible.
    pub fn lookup(&self, from: ScopeId, name: YulString) -> Option<(ScopeId, &ScopeEntry)> {
        let mut crossed_function_boundary = false;
        let mut current = Some(from);
        while let Some(id) = current {
            let scope = self.get(id);
            if let Some(entry) = scope.entry(name) {
                if crossed_function_boundary && matches!(entry, ScopeEntry::Variable(_)) {
                    return None;
                }
                return Some((id, entry));
            }
            if scope.function_scope {
                crossed_function_boundary = true;
            }
            current = scope.parent;
        }
        None
    }

    /// True iff any ancestor of `id` is a function scope
    pub fn inside_function(&self, id: ScopeId) -> bool {
        let mut current = self.get(id).parent;
        while let Some(id) = current {
            let scope = self.get(id);
            if scope.function_scope {
                return true;
            }
            current = scope.parent;
        }
        false
    }
}
