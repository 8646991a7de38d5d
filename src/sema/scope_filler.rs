//! First analysis pass: scope construction and declaration registration

use super::analysis_info::AnalysisInfo;
use super::scope::ScopeId;
use crate::ast::{
    Block, ForLoop, FunctionDefinition, If, Statement, Switch, TypedName, VariableDeclaration,
};
use crate::common::{ErrorReporter, Span};

/// Walks the tree once, materializing a scope for every block and a
/// virtual scope for every function definition, and binding every
/// declared name in the innermost active scope.
///
/// Functions are registered when their enclosing block is entered, so
/// calls may precede the definition textually. Variables are registered
/// at their declaration statement; use-before-declaration is enforced
/// by the second pass.
pub struct ScopeFiller<'a> {
    info: &'a mut AnalysisInfo,
    reporter: &'a mut ErrorReporter,
    current_scope: Option<ScopeId>,
}

impl<'a> ScopeFiller<'a> {
    pub fn new(info: &'a mut AnalysisInfo, reporter: &'a mut ErrorReporter) -> Self {
        Self {
            info,
            reporter,
            current_scope: None,
        }
    }

    /// Runs the pass. Returns false if any declaration error was
    /// reported; the caller then skips the analyzer pass.
    pub fn fill(&mut self, block: &Block) -> bool {
        self.visit_block(block)
    }

    fn visit_block(&mut self, block: &Block) -> bool {
        let mut success = true;
        let scope = self.block_scope(block);
        let previous_scope = self.current_scope;
        self.current_scope = Some(scope);

        // Functions are visible throughout the block
        for statement in &block.statements {
            if let Statement::FunctionDefinition(fun) = statement {
                if !self.register_function(fun) {
                    success = false;
                }
            }
        }

        for statement in &block.statements {
            if !self.visit_statement(statement) {
                success = false;
            }
        }

        self.current_scope = previous_scope;
        success
    }

    fn visit_statement(&mut self, statement: &Statement) -> bool {
        match statement {
            Statement::Expression(_)
            | Statement::Assignment(_)
            | Statement::Break(_)
            | Statement::Continue(_)
            | Statement::Leave(_) => true,
            Statement::VariableDeclaration(decl) => self.visit_variable_declaration(decl),
            Statement::FunctionDefinition(fun) => self.visit_function_definition(fun),
            Statement::If(if_stmt) => self.visit_if(if_stmt),
            Statement::Switch(switch) => self.visit_switch(switch),
            Statement::ForLoop(for_loop) => self.visit_for_loop(for_loop),
            Statement::Block(block) => self.visit_block(block),
        }
    }

    fn visit_variable_declaration(&mut self, decl: &VariableDeclaration) -> bool {
        let scope = self.current_scope.expect("variable declaration outside any block");
        for variable in &decl.variables {
            if !self.register_variable(variable, decl.span, scope) {
                return false;
            }
        }
        true
    }

    fn visit_function_definition(&mut self, fun: &FunctionDefinition) -> bool {
        let mut success = true;

        let virtual_scope = self
            .info
            .scope_tree
            .create_function_scope(self.current_scope);
        self.info.virtual_blocks.insert(fun.id, virtual_scope);

        let previous_scope = self.current_scope;
        self.current_scope = Some(virtual_scope);

        for variable in fun.parameters.iter().chain(&fun.return_variables) {
            if !self.register_variable(variable, fun.span, virtual_scope) {
                success = false;
            }
        }

        if !self.visit_block(&fun.body) {
            success = false;
        }

        self.current_scope = previous_scope;
        success
    }

    fn visit_if(&mut self, if_stmt: &If) -> bool {
        self.visit_block(&if_stmt.body)
    }

    fn visit_switch(&mut self, switch: &Switch) -> bool {
        let mut success = true;
        for case in &switch.cases {
            if !self.visit_block(&case.body) {
                success = false;
            }
        }
        success
    }

    /// The scope of `pre` applies to the whole loop
    fn visit_for_loop(&mut self, for_loop: &ForLoop) -> bool {
        let original_scope = self.current_scope;
        let mut success = true;

        if !self.visit_block(&for_loop.pre) {
            success = false;
        }
        self.current_scope = self.info.scopes.get(&for_loop.pre.id).copied();

        if !self.visit_block(&for_loop.body) {
            success = false;
        }
        if !self.visit_block(&for_loop.post) {
            success = false;
        }

        self.current_scope = original_scope;
        success
    }

    fn register_variable(&mut self, variable: &TypedName, span: Span, scope: ScopeId) -> bool {
        if !self
            .info
            .scope_tree
            .get_mut(scope)
            .register_variable(variable.name, variable.ty)
        {
            self.reporter.declaration_error(
                span,
                format!(
                    "Variable name {} already taken in this scope.",
                    variable.name
                ),
            );
            return false;
        }
        true
    }

    fn register_function(&mut self, fun: &FunctionDefinition) -> bool {
        let arguments = fun.parameters.iter().map(|p| p.ty).collect();
        let returns = fun.return_variables.iter().map(|r| r.ty).collect();
        let scope = self.current_scope.expect("function definition outside any block");
        if !self
            .info
            .scope_tree
            .get_mut(scope)
            .register_function(fun.name, arguments, returns)
        {
            self.reporter.declaration_error(
                fun.span,
                format!("Function name {} already taken in this scope.", fun.name),
            );
            return false;
        }
        true
    }

    fn block_scope(&mut self, block: &Block) -> ScopeId {
        if let Some(&scope) = self.info.scopes.get(&block.id) {
            return scope;
        }
        let scope = self.info.scope_tree.create(self.current_scope);
        self.info.scopes.insert(block.id, scope);
        scope
    }
}
