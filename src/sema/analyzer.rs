//! Second analysis pass: name resolution, type checking and
//! stack-height accounting
//!
//! The analyzer walks the tree using the scopes built by the first
//! pass, simulating the evaluation stack as it goes. Errors are
//! accumulated in the reporter rather than aborting the walk, so one
//! run surfaces as many problems as possible; visitor results only
//! gate dependent checks that would otherwise produce noise.

use std::collections::HashSet;

use super::analysis_info::AnalysisInfo;
use super::scope::{ScopeEntry, ScopeId};
use super::scope_filler::ScopeFiller;
use super::{IdentifierContext, Resolver};
use crate::ast::value;
use crate::ast::{
    Assignment, Block, Expression, ExpressionStatement, ForLoop, FunctionCall,
    FunctionDefinition, Identifier, If, Literal, LiteralKind, NodeId, Statement, Switch,
    VariableDeclaration,
};
use crate::common::{ErrorReporter, Span, YulString};
use crate::dialect::{evm, Dialect, EvmVersion, Instruction};
use crate::object::Object;

/// The semantic analyzer.
///
/// Holds the walk's mutable state: the active scope, the set of
/// variables whose declarations have executed, the simulated stack
/// height, and the types produced by the most recently analyzed
/// expression.
pub struct Analyzer<'a> {
    info: &'a mut AnalysisInfo,
    reporter: &'a mut ErrorReporter,
    dialect: &'a dyn Dialect,
    evm_version: EvmVersion,
    resolver: Option<Resolver<'a>>,
    data_names: HashSet<YulString>,
    current_scope: Option<ScopeId>,
    active_variables: HashSet<(ScopeId, YulString)>,
    current_for_loop: Option<NodeId>,
    stack_height: i32,
    current_expr_types: Vec<YulString>,
}

impl<'a> Analyzer<'a> {
    pub fn new(
        info: &'a mut AnalysisInfo,
        reporter: &'a mut ErrorReporter,
        dialect: &'a dyn Dialect,
        evm_version: EvmVersion,
    ) -> Self {
        Self {
            info,
            reporter,
            dialect,
            evm_version,
            resolver: None,
            data_names: HashSet::new(),
            current_scope: None,
            active_variables: HashSet::new(),
            current_for_loop: None,
            stack_height: 0,
            current_expr_types: Vec::new(),
        }
    }

    /// Installs a callback resolving identifiers the scopes do not bind
    pub fn with_resolver(mut self, resolver: Resolver<'a>) -> Self {
        self.resolver = Some(resolver);
        self
    }

    /// Supplies the names of data objects embedded alongside the code
    pub fn with_data_names(mut self, data_names: HashSet<YulString>) -> Self {
        self.data_names = data_names;
        self
    }

    /// Runs both passes over `block`. Returns true iff both succeed
    /// and no error was reported.
    pub fn analyze(&mut self, block: &Block) -> bool {
        if !ScopeFiller::new(self.info, self.reporter).fill(block) {
            return false;
        }
        let success = self.visit_block(block);
        debug_assert!(
            success || self.reporter.has_errors(),
            "analysis failed without reporting an error"
        );
        success && !self.reporter.has_errors()
    }

    fn visit_statement(&mut self, statement: &Statement) -> bool {
        match statement {
            Statement::Expression(stmt) => self.visit_expression_statement(stmt),
            Statement::Assignment(stmt) => self.visit_assignment(stmt),
            Statement::VariableDeclaration(stmt) => self.visit_variable_declaration(stmt),
            Statement::FunctionDefinition(stmt) => self.visit_function_definition(stmt),
            Statement::If(stmt) => self.visit_if(stmt),
            Statement::Switch(stmt) => self.visit_switch(stmt),
            Statement::ForLoop(stmt) => self.visit_for_loop(stmt),
            Statement::Break(stmt) => {
                // Nesting is enforced by the parser
                debug_assert!(self.current_for_loop.is_some(), "break outside of a for loop");
                self.record(stmt.id);
                true
            }
            Statement::Continue(stmt) => {
                debug_assert!(
                    self.current_for_loop.is_some(),
                    "continue outside of a for loop"
                );
                self.record(stmt.id);
                true
            }
            Statement::Leave(stmt) => {
                self.record(stmt.id);
                true
            }
            Statement::Block(block) => self.visit_block(block),
        }
    }

    fn visit_expression(&mut self, expression: &Expression) -> bool {
        match expression {
            Expression::Literal(literal) => self.visit_literal(literal),
            Expression::Identifier(identifier) => self.visit_identifier(identifier),
            Expression::FunctionCall(call) => self.visit_function_call(call),
        }
    }

    fn visit_literal(&mut self, literal: &Literal) -> bool {
        self.expect_valid_type(literal.ty, literal.span);
        self.stack_height += 1;

        match literal.kind {
            LiteralKind::String if literal.value.as_str().len() > value::WORD_SIZE => {
                self.reporter.type_error(
                    literal.span,
                    format!(
                        "String literal too long ({} > {})",
                        literal.value.as_str().len(),
                        value::WORD_SIZE
                    ),
                );
                return false;
            }
            LiteralKind::Number
                if value::value_of_number_literal(literal.value)
                    .map_or(true, |v| v > *value::word_max()) =>
            {
                self.reporter
                    .type_error(literal.span, "Number literal too large (> 256 bits)");
                return false;
            }
            LiteralKind::Boolean => {
                debug_assert!(matches!(literal.value.as_str(), "true" | "false"));
            }
            _ => {}
        }

        if !self
            .dialect
            .valid_type_for_literal(literal.kind, literal.value, literal.ty)
        {
            self.reporter.type_error(
                literal.span,
                format!(
                    "Invalid type \"{}\" for literal \"{}\".",
                    literal.ty, literal.value
                ),
            );
        }

        self.record(literal.id);
        self.current_expr_types = vec![literal.ty];
        true
    }

    fn visit_identifier(&mut self, identifier: &Identifier) -> bool {
        debug_assert!(!identifier.name.is_empty());
        let errors_before = self.reporter.error_count();
        let mut success = true;

        self.current_expr_types = vec![self.dialect.default_type()];

        let looked_up = self.current_scope.and_then(|scope| {
            self.info
                .scope_tree
                .lookup(scope, identifier.name)
                .map(|(found_in, entry)| (found_in, entry.clone()))
        });

        match looked_up {
            Some((found_in, ScopeEntry::Variable(variable))) => {
                if !self.active_variables.contains(&(found_in, identifier.name)) {
                    self.reporter.declaration_error(
                        identifier.span,
                        format!(
                            "Variable {} used before it was declared.",
                            identifier.name
                        ),
                    );
                    success = false;
                }
                self.current_expr_types = vec![variable.ty];
                self.stack_height += 1;
            }
            Some((_, ScopeEntry::Function(_))) => {
                self.reporter.type_error(
                    identifier.span,
                    format!("Function {} used without being called.", identifier.name),
                );
                success = false;
            }
            None => {
                let inside_function = self.inside_function();
                let stack_size = match self.resolver.as_mut() {
                    Some(resolver) => resolver(
                        identifier,
                        IdentifierContext::RValue,
                        inside_function,
                        self.reporter,
                    ),
                    None => None,
                };
                match stack_size {
                    Some(size) => self.stack_height += size as i32,
                    None => {
                        // Only report if the callback did not
                        if self.reporter.error_count() == errors_before {
                            self.reporter
                                .declaration_error(identifier.span, "Identifier not found.");
                        }
                        success = false;
                    }
                }
            }
        }

        self.record(identifier.id);
        success
    }

    fn visit_expression_statement(&mut self, statement: &ExpressionStatement) -> bool {
        let initial_height = self.stack_height;
        let mut success = self.visit_expression(&statement.expression);
        if success && self.stack_height != initial_height {
            let returned = self.stack_height - initial_height;
            self.reporter.type_error(
                statement.span,
                format!(
                    "Top-level expressions are not supposed to return values \
                     (this expression returns {} value{}). Use ``pop()`` or assign them.",
                    returned,
                    if returned == 1 { "" } else { "s" }
                ),
            );
            success = false;
        }
        self.record(statement.id);
        success
    }

    fn visit_assignment(&mut self, assignment: &Assignment) -> bool {
        let expected_items = assignment.variable_names.len() as i32;
        debug_assert!(expected_items >= 1);
        let initial_height = self.stack_height;

        let mut success = self.visit_expression(&assignment.value);
        if success && self.stack_height - initial_height != expected_items {
            self.reporter.declaration_error(
                assignment.span,
                format!(
                    "Variable count does not match number of values ({} vs. {})",
                    expected_items,
                    self.stack_height - initial_height
                ),
            );
            return false;
        }

        for (i, variable) in assignment.variable_names.iter().enumerate() {
            let given_type = self
                .current_expr_types
                .get(i)
                .copied()
                .unwrap_or_else(|| self.dialect.default_type());
            if !self.check_assignment(variable, given_type) {
                success = false;
            }
        }

        self.record(assignment.id);
        success
    }

    fn visit_variable_declaration(&mut self, declaration: &VariableDeclaration) -> bool {
        let num_variables = declaration.variables.len() as i32;

        // Announce the names so external layers may flag shadowing
        if self.resolver.is_some() {
            let inside_function = self.inside_function();
            for variable in &declaration.variables {
                let identifier = Identifier::new(variable.span, variable.name);
                if let Some(resolver) = self.resolver.as_mut() {
                    resolver(
                        &identifier,
                        IdentifierContext::VariableDeclaration,
                        inside_function,
                        self.reporter,
                    );
                }
            }
        }

        let mut success = true;
        let mut value_ok = true;
        if let Some(value) = &declaration.value {
            let initial_height = self.stack_height;
            value_ok = self.visit_expression(value);
            let num_values = self.stack_height - initial_height;
            if !value_ok {
                // Pad the stack so later diagnostics stay meaningful
                self.stack_height = initial_height + num_variables;
                success = false;
            } else if num_values != num_variables {
                self.reporter.declaration_error(
                    declaration.span,
                    format!(
                        "Variable count mismatch: {} variables and {} values.",
                        num_variables, num_values
                    ),
                );
                self.stack_height += num_variables - num_values;
                return false;
            }
        } else {
            self.stack_height += num_variables;
        }

        let scope = self
            .current_scope
            .expect("variable declaration outside any block");
        for (i, variable) in declaration.variables.iter().enumerate() {
            let given_type = if declaration.value.is_some() && value_ok {
                self.current_expr_types
                    .get(i)
                    .copied()
                    .unwrap_or_else(|| self.dialect.default_type())
            } else {
                self.dialect.default_type()
            };
            self.expect_valid_type(variable.ty, variable.span);
            if variable.ty != given_type {
                self.reporter.type_error(
                    variable.span,
                    format!(
                        "Assigning value of type \"{}\" to variable of type \"{}\".",
                        given_type, variable.ty
                    ),
                );
                success = false;
            }
            debug_assert!(
                self.info.scope_tree.get(scope).entry(variable.name).is_some(),
                "declared variable missing from its scope"
            );
            self.active_variables.insert((scope, variable.name));
        }

        self.record(declaration.id);
        success
    }

    fn visit_function_definition(&mut self, fun: &FunctionDefinition) -> bool {
        debug_assert!(!fun.name.is_empty());
        let virtual_scope = *self
            .info
            .virtual_blocks
            .get(&fun.id)
            .expect("virtual block requested but not present");

        for variable in fun.parameters.iter().chain(&fun.return_variables) {
            self.expect_valid_type(variable.ty, variable.span);
            debug_assert!(
                self.info
                    .scope_tree
                    .get(virtual_scope)
                    .entry(variable.name)
                    .is_some(),
                "function variable missing from its scope"
            );
            self.active_variables.insert((virtual_scope, variable.name));
        }

        // The body starts with parameters and return variables on the
        // stack; the definition itself is neutral to its context.
        let initial_height = self.stack_height;
        self.stack_height = (fun.parameters.len() + fun.return_variables.len()) as i32;

        let success = self.visit_block(&fun.body);

        self.stack_height = initial_height;
        self.record(fun.id);
        success
    }

    fn visit_function_call(&mut self, call: &FunctionCall) -> bool {
        debug_assert!(!call.function_name.name.is_empty());
        let mut success = true;
        let mut parameter_types: Option<Vec<YulString>> = None;
        let mut return_types: Option<Vec<YulString>> = None;
        let mut needs_literal_arguments = false;

        if let Some(builtin) = self.dialect.builtin(call.function_name.name) {
            parameter_types = Some(builtin.parameters.clone());
            return_types = Some(builtin.returns.clone());
            needs_literal_arguments = builtin.literal_arguments;
        } else {
            let looked_up = self.current_scope.and_then(|scope| {
                self.info
                    .scope_tree
                    .lookup(scope, call.function_name.name)
                    .map(|(_, entry)| entry.clone())
            });
            match looked_up {
                Some(ScopeEntry::Variable(_)) => {
                    self.reporter.type_error(
                        call.function_name.span,
                        "Attempt to call variable instead of function.",
                    );
                    success = false;
                }
                Some(ScopeEntry::Function(fun)) => {
                    parameter_types = Some(fun.arguments);
                    return_types = Some(fun.returns);
                }
                None => {
                    if !self
                        .warn_on_instruction(call.function_name.name, call.function_name.span)
                    {
                        self.reporter
                            .declaration_error(call.function_name.span, "Function not found.");
                    }
                    success = false;
                }
            }
        }

        if success {
            let expected = parameter_types.as_ref().map_or(0, Vec::len);
            if call.arguments.len() != expected {
                self.reporter.type_error(
                    call.function_name.span,
                    format!(
                        "Function expects {} arguments but got {}.",
                        expected,
                        call.arguments.len()
                    ),
                );
                success = false;
            }
        }

        // Arguments are evaluated right to left
        let mut argument_types = Vec::new();
        for argument in call.arguments.iter().rev() {
            if !self.expect_expression(argument) {
                success = false;
                continue;
            }
            argument_types.push(
                self.current_expr_types
                    .first()
                    .copied()
                    .unwrap_or_else(|| self.dialect.default_type()),
            );

            if needs_literal_arguments {
                match argument {
                    Expression::Literal(literal) => {
                        if !self.data_names.contains(&literal.value) {
                            self.reporter.type_error(
                                call.function_name.span,
                                format!("Unknown data object \"{}\".", literal.value),
                            );
                        }
                    }
                    _ => {
                        self.reporter.type_error(
                            call.function_name.span,
                            "Function expects direct literals as arguments.",
                        );
                    }
                }
            }
        }
        argument_types.reverse();

        if success {
            let parameters = parameter_types
                .as_ref()
                .expect("parameter types missing for resolved call");
            debug_assert_eq!(parameters.len(), argument_types.len());
            for ((parameter, argument_type), argument) in parameters
                .iter()
                .zip(&argument_types)
                .zip(&call.arguments)
            {
                if !self.expect_type(*parameter, *argument_type, argument.span()) {
                    success = false;
                }
            }
        }

        // Height moves by what was actually provided, not the declared
        // arity, to avoid cascading errors after a bad call.
        let returns_len = return_types.as_ref().map_or(0, Vec::len);
        self.stack_height += returns_len as i32 - call.arguments.len() as i32;
        self.record(call.id);

        if success {
            self.current_expr_types =
                return_types.expect("return types missing for resolved call");
        } else {
            self.current_expr_types = vec![self.dialect.default_type(); returns_len];
        }
        success
    }

    fn visit_if(&mut self, if_stmt: &If) -> bool {
        let mut success = true;
        let initial_height = self.stack_height;

        if !self.expect_expression(&if_stmt.condition) {
            success = false;
        } else {
            let bool_type = self.dialect.bool_type();
            let given = self.current_expression_type();
            if !self.expect_type(bool_type, given, if_stmt.condition.span()) {
                success = false;
            }
        }

        self.stack_height = initial_height;

        if !self.visit_block(&if_stmt.body) {
            success = false;
        }

        self.record(if_stmt.id);
        success
    }

    fn visit_switch(&mut self, switch: &Switch) -> bool {
        let mut success = true;
        let initial_height = self.stack_height;

        if !self.expect_expression(&switch.expression) {
            success = false;
        }

        let value_type = if success {
            self.current_expression_type()
        } else {
            self.dialect.default_type()
        };

        for case in &switch.cases {
            if let Some(value) = &case.value {
                if !self.expect_type(value_type, value.ty, value.span) {
                    success = false;
                }
            }
        }

        let mut seen_cases = HashSet::new();
        for case in &switch.cases {
            if let Some(value) = &case.value {
                let case_height = self.stack_height;
                // Not expect_expression: the value must stay a literal
                let case_value_valid = self.visit_literal(value);
                if !case_value_valid {
                    success = false;
                }
                self.expect_deposit(1, case_height, value.span);
                self.stack_height -= 1;

                debug_assert!(case_value_valid || self.reporter.has_errors());
                // The parser guarantees at most one default case, so
                // only explicit values need the duplicate check. Cases
                // collide by semantic value, not by spelling.
                if case_value_valid {
                    if let Some(semantic_value) = value::value_of_literal(value) {
                        if !seen_cases.insert(semantic_value) {
                            self.reporter
                                .declaration_error(case.span, "Duplicate case defined.");
                            success = false;
                        }
                    }
                }
            }

            if !self.visit_block(&case.body) {
                success = false;
            }
        }

        self.stack_height = initial_height;
        self.record(switch.id);
        success
    }

    fn visit_for_loop(&mut self, for_loop: &ForLoop) -> bool {
        let outer_scope = self.current_scope;
        let initial_height = self.stack_height;
        let mut success = true;

        if !self.visit_block(&for_loop.pre) {
            success = false;
        }
        // The pre block closed its scope, but its variables stay live
        // for the condition, the body and the post part: re-open it.
        let pre_scope = self.scope_of(&for_loop.pre);
        self.stack_height += self.info.scope_tree.get(pre_scope).number_of_variables() as i32;
        self.current_scope = Some(pre_scope);

        if !self.expect_expression(&for_loop.condition) {
            success = false;
        } else {
            let bool_type = self.dialect.bool_type();
            let given = self.current_expression_type();
            if !self.expect_type(bool_type, given, for_loop.condition.span()) {
                success = false;
            }
        }
        self.stack_height -= 1;

        let outer_for_loop = self.current_for_loop;
        self.current_for_loop = Some(for_loop.id);

        if !self.visit_block(&for_loop.body) {
            success = false;
        }
        if !self.visit_block(&for_loop.post) {
            success = false;
        }

        self.stack_height = initial_height;
        self.record(for_loop.id);
        self.current_scope = outer_scope;
        self.current_for_loop = outer_for_loop;
        success
    }

    fn visit_block(&mut self, block: &Block) -> bool {
        let mut success = true;
        let previous_scope = self.current_scope;
        let block_scope = self.scope_of(block);
        self.current_scope = Some(block_scope);

        let initial_height = self.stack_height;

        for statement in &block.statements {
            if self.reporter.has_overflown() {
                // Error budget exhausted, stop producing more
                success = false;
                break;
            }
            if !self.visit_statement(statement) {
                success = false;
            }
        }

        self.stack_height -= self
            .info
            .scope_tree
            .get(block_scope)
            .number_of_variables() as i32;

        let height_diff = self.stack_height - initial_height;
        if success && height_diff != 0 {
            let detail = if height_diff > 0 {
                format!("{} surplus item(s).", height_diff)
            } else {
                format!("{} missing item(s).", -height_diff)
            };
            self.reporter.declaration_error(
                block.span,
                format!("Unbalanced stack at the end of a block: {}", detail),
            );
            success = false;
        }

        self.record(block.id);
        self.current_scope = previous_scope;
        success
    }

    /// Visits `expression` and requires it to leave exactly one item
    fn expect_expression(&mut self, expression: &Expression) -> bool {
        let mut success = true;
        let initial_height = self.stack_height;
        if !self.visit_expression(expression) {
            success = false;
        }
        if success && !self.expect_deposit(1, initial_height, expression.span()) {
            success = false;
        }
        success
    }

    fn expect_deposit(&mut self, deposit: i32, old_height: i32, span: Span) -> bool {
        if self.stack_height - old_height != deposit {
            self.reporter.type_error(
                span,
                format!(
                    "Expected expression to return one item to the stack, \
                     but did return {} items.",
                    self.stack_height - old_height
                ),
            );
            return false;
        }
        true
    }

    /// Resolves an assignment target and consumes one stack item
    fn check_assignment(&mut self, variable: &Identifier, value_type: YulString) -> bool {
        debug_assert!(!variable.name.is_empty());
        let errors_before = self.reporter.error_count();
        let mut success = true;
        let mut variable_size: Option<usize> = None;
        let mut variable_type = self.dialect.default_type();

        let looked_up = self.current_scope.and_then(|scope| {
            self.info
                .scope_tree
                .lookup(scope, variable.name)
                .map(|(found_in, entry)| (found_in, entry.clone()))
        });

        if let Some((found_in, entry)) = looked_up {
            match entry {
                ScopeEntry::Function(_) => {
                    self.reporter
                        .type_error(variable.span, "Assignment requires variable.");
                    success = false;
                }
                ScopeEntry::Variable(var) => {
                    if !self.active_variables.contains(&(found_in, variable.name)) {
                        self.reporter.declaration_error(
                            variable.span,
                            format!(
                                "Variable {} used before it was declared.",
                                variable.name
                            ),
                        );
                        success = false;
                    } else {
                        variable_type = var.ty;
                    }
                }
            }
            variable_size = Some(1);
        } else {
            let inside_function = self.inside_function();
            if let Some(resolver) = self.resolver.as_mut() {
                variable_size = resolver(
                    variable,
                    IdentifierContext::LValue,
                    inside_function,
                    self.reporter,
                );
            }
        }

        if variable_size.is_none() {
            // Only report if the callback did not
            if self.reporter.error_count() == errors_before {
                self.reporter.declaration_error(
                    variable.span,
                    "Variable not found or variable not lvalue.",
                );
            }
            success = false;
        }

        self.stack_height -= 1;

        if let Some(size) = variable_size {
            if size != 1 {
                self.reporter.type_error(
                    variable.span,
                    format!("Variable size ({}) and value size (1) do not match.", size),
                );
                success = false;
            }
        }

        if success && variable_type != value_type {
            self.reporter.type_error(
                variable.span,
                format!(
                    "Assigning a value of type \"{}\" to a variable of type \"{}\".",
                    value_type, variable_type
                ),
            );
            success = false;
        }

        success
    }

    fn expect_type(&mut self, expected: YulString, given: YulString, span: Span) -> bool {
        if expected != given {
            self.reporter.type_error(
                span,
                format!(
                    "Expected a value of type \"{}\" but got \"{}\".",
                    expected, given
                ),
            );
            return false;
        }
        true
    }

    fn expect_valid_type(&mut self, ty: YulString, span: Span) {
        if !self.dialect.types().contains(&ty) {
            self.reporter.type_error(
                span,
                format!(
                    "\"{}\" is not a valid type (user defined types are not yet supported).",
                    ty
                ),
            );
        }
    }

    /// Classifies an unresolved name as a known VM instruction and
    /// reports a targeted diagnostic. Returns true iff one was
    /// reported; the caller then suppresses its generic error.
    fn warn_on_instruction(&mut self, name: YulString, span: Span) -> bool {
        use Instruction::*;

        let instruction = match evm::instruction_by_name(name.as_str()) {
            Some(instruction) => instruction,
            None => return false,
        };

        // Returndata access and staticcall arrived together, as did
        // bitwise shifting and create2.
        debug_assert_eq!(
            self.evm_version.supports_returndata(),
            self.evm_version.has_static_call()
        );
        debug_assert_eq!(
            self.evm_version.has_bitwise_shifting(),
            self.evm_version.has_create2()
        );

        let required_fork = match instruction {
            ReturndataCopy | ReturndataSize if !self.evm_version.supports_returndata() => {
                Some("Byzantium")
            }
            StaticCall if !self.evm_version.has_static_call() => Some("Byzantium"),
            Shl | Shr | Sar if !self.evm_version.has_bitwise_shifting() => {
                Some("Constantinople")
            }
            Create2 if !self.evm_version.has_create2() => Some("Constantinople"),
            ExtCodeHash if !self.evm_version.has_ext_code_hash() => Some("Constantinople"),
            ChainId if !self.evm_version.has_chain_id() => Some("Istanbul"),
            SelfBalance if !self.evm_version.has_self_balance() => Some("Istanbul"),
            _ => None,
        };

        if let Some(fork) = required_fork {
            self.reporter.type_error(
                span,
                format!(
                    "The \"{}\" instruction is only available for {}-compatible VMs \
                     (you are currently compiling for \"{}\").",
                    evm::instruction_info(instruction).name,
                    fork,
                    self.evm_version.name()
                ),
            );
            return true;
        }

        if matches!(instruction, Jump | Jumpi | JumpDest) {
            self.reporter.syntax_error(
                span,
                "Jump instructions and labels are low-level EVM features that can lead to \
                 incorrect stack access. Because of that they are disallowed in strict \
                 assembly. Use functions, \"switch\", \"if\" or \"for\" statements instead.",
            );
            return true;
        }

        false
    }

    fn current_expression_type(&self) -> YulString {
        self.current_expr_types
            .first()
            .copied()
            .unwrap_or_else(|| self.dialect.default_type())
    }

    fn inside_function(&self) -> bool {
        self.current_scope
            .map_or(false, |scope| self.info.scope_tree.inside_function(scope))
    }

    fn scope_of(&self, block: &Block) -> ScopeId {
        *self
            .info
            .scopes
            .get(&block.id)
            .expect("scope requested but not present")
    }

    fn record(&mut self, id: NodeId) {
        self.info.stack_height_info.insert(id, self.stack_height);
    }
}

/// Analyzes an object's code, asserting it is valid. Panics on any
/// diagnostic; intended for code already known to pass analysis.
pub fn analyze_strict_assert_correct(dialect: &dyn Dialect, object: &Object) -> AnalysisInfo {
    let mut reporter = ErrorReporter::new();
    let mut info = AnalysisInfo::new();
    let success = Analyzer::new(&mut info, &mut reporter, dialect, EvmVersion::default())
        .with_data_names(object.data_names())
        .analyze(&object.code);
    assert!(
        success && !reporter.has_errors(),
        "invalid assembly code: {:?}",
        reporter.errors()
    );
    info
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{Break, Continue, FunctionDefinition, Leave, Statement, TypedName};
    use crate::common::ErrorKind;
    use crate::dialect::{BuiltinFunction, EvmDialect};
    use crate::sema::test_util::*;
    use std::cell::RefCell;

    /// Minimal typed dialect for exercising the type checks the
    /// untyped EVM dialect cannot reach
    struct TypedTestDialect {
        types: HashSet<YulString>,
        default_type: YulString,
        bool_type: YulString,
    }

    impl TypedTestDialect {
        fn new() -> Self {
            Self {
                types: ["u256", "bool"].into_iter().map(YulString::new).collect(),
                default_type: YulString::new("u256"),
                bool_type: YulString::new("bool"),
            }
        }
    }

    impl Dialect for TypedTestDialect {
        fn types(&self) -> &HashSet<YulString> {
            &self.types
        }

        fn default_type(&self) -> YulString {
            self.default_type
        }

        fn bool_type(&self) -> YulString {
            self.bool_type
        }

        fn builtin(&self, _name: YulString) -> Option<&BuiltinFunction> {
            None
        }
    }

    fn assert_single_error(reporter: &ErrorReporter, fragment: &str) {
        assert_eq!(
            reporter.error_count(),
            1,
            "expected one error, got {:?}",
            reporter.errors()
        );
        assert!(
            reporter.errors()[0].message().contains(fragment),
            "expected {:?} in {:?}",
            fragment,
            reporter.errors()[0].message()
        );
    }

    #[test]
    fn test_declaration_then_use_accepted() {
        let root = block(vec![
            decl(&["x"], Some(num("1"))),
            decl(&["y"], Some(ident("x"))),
        ]);
        let (info, reporter, success) = run(&root);
        assert!(success);
        assert!(!reporter.has_errors());
        // Blocks are stack-neutral at their boundary
        assert_eq!(info.stack_height_info[&root.id], 0);
    }

    #[test]
    fn test_use_before_declaration_rejected() {
        let root = block(vec![
            decl(&["x"], Some(ident("y"))),
            decl(&["y"], Some(num("1"))),
        ]);
        let (_, reporter, success) = run(&root);
        assert!(!success);
        assert_single_error(&reporter, "Variable y used before it was declared.");
    }

    #[test]
    fn test_function_hoisting_accepted() {
        let root = block(vec![
            decl(&["a"], Some(call("f", vec![]))),
            fundef(
                "f",
                &[],
                &["r"],
                block(vec![assign(&["r"], num("1"))]),
            ),
        ]);
        let (_, reporter, success) = run(&root);
        assert!(success, "{:?}", reporter.errors());
    }

    #[test]
    fn test_top_level_expression_value_rejected() {
        let root = block(vec![decl(&["a"], Some(num("1"))), estmt(ident("a"))]);
        let (_, reporter, success) = run(&root);
        assert!(!success);
        assert_single_error(&reporter, "Top-level expressions are not supposed to return values");
        assert!(reporter.errors()[0].message().contains("returns 1 value)"));
    }

    #[test]
    fn test_duplicate_case_by_semantic_value_rejected() {
        // 1 and 0x1 are spelled differently but denote the same word
        let root = block(vec![switch(
            num("1"),
            vec![
                case(Some(lit_num("1")), block(vec![])),
                case(Some(lit_num("0x1")), block(vec![])),
                case(None, block(vec![])),
            ],
        )]);
        let (_, reporter, success) = run(&root);
        assert!(!success);
        assert_single_error(&reporter, "Duplicate case defined.");
    }

    #[test]
    fn test_distinct_cases_accepted() {
        let root = block(vec![switch(
            num("1"),
            vec![
                case(Some(lit_num("0")), block(vec![])),
                case(Some(lit_num("1")), block(vec![])),
                case(None, block(vec![])),
            ],
        )]);
        let (_, reporter, success) = run(&root);
        assert!(success, "{:?}", reporter.errors());
    }

    #[test]
    fn test_variable_not_visible_after_block() {
        let inner = block(vec![
            decl(&["x"], Some(num("1"))),
            assign(&["x"], num("2")),
        ]);
        let root = block(vec![Statement::Block(inner), assign(&["x"], num("3"))]);
        let (_, reporter, success) = run(&root);
        assert!(!success);
        assert_single_error(&reporter, "Variable not found or variable not lvalue.");
    }

    #[test]
    fn test_number_literal_word_boundary() {
        let max = format!("0x{}", "f".repeat(64));
        let root = block(vec![decl(&["x"], Some(num(&max)))]);
        let (_, reporter, success) = run(&root);
        assert!(success, "{:?}", reporter.errors());

        let over = format!("0x1{}", "0".repeat(64));
        let root = block(vec![decl(&["x"], Some(num(&over)))]);
        let (_, reporter, success) = run(&root);
        assert!(!success);
        assert_single_error(&reporter, "Number literal too large (> 256 bits)");
    }

    #[test]
    fn test_string_literal_length_boundary() {
        let root = block(vec![decl(&["x"], Some(str_lit(&"a".repeat(32))))]);
        let (_, reporter, success) = run(&root);
        assert!(success, "{:?}", reporter.errors());

        let root = block(vec![decl(&["x"], Some(str_lit(&"a".repeat(33))))]);
        let (_, reporter, success) = run(&root);
        assert!(!success);
        assert_single_error(&reporter, "String literal too long (33 > 32)");
    }

    #[test]
    fn test_for_loop_pre_variable_visible_throughout() {
        let pre = block(vec![decl(&["i"], Some(num("0")))]);
        let condition = call("lt", vec![ident("i"), num("10")]);
        let post = block(vec![assign(
            &["i"],
            call("add", vec![ident("i"), num("1")]),
        )]);
        let body = block(vec![estmt(call("pop", vec![ident("i")]))]);
        let root = block(vec![forloop(pre, condition, post, body)]);
        let (_, reporter, success) = run(&root);
        assert!(success, "{:?}", reporter.errors());
    }

    #[test]
    fn test_for_loop_variable_not_visible_after_loop() {
        let pre = block(vec![decl(&["i"], Some(num("0")))]);
        let root = block(vec![
            forloop(pre, btrue(), block(vec![]), block(vec![])),
            estmt(call("pop", vec![ident("i")])),
        ]);
        let (_, reporter, success) = run(&root);
        assert!(!success);
        assert_single_error(&reporter, "Identifier not found.");
    }

    #[test]
    fn test_staticcall_needs_byzantium() {
        let arguments = (0..6).map(|_| num("1")).collect();
        let root = block(vec![estmt(call(
            "pop",
            vec![call("staticcall", arguments)],
        ))]);

        let dialect = EvmDialect::strict_assembly(EvmVersion::Homestead);
        let (_, reporter, success) = run_with(&dialect, EvmVersion::Homestead, &root);
        assert!(!success);
        assert_single_error(&reporter, "Byzantium-compatible");
        assert!(reporter.errors()[0].message().contains("\"staticcall\""));
        assert!(reporter.errors()[0]
            .message()
            .contains("compiling for \"homestead\""));
        assert_eq!(reporter.errors()[0].kind(), ErrorKind::Type);

        let dialect = EvmDialect::strict_assembly(EvmVersion::Istanbul);
        let arguments = (0..6).map(|_| num("1")).collect();
        let root = block(vec![estmt(call(
            "pop",
            vec![call("staticcall", arguments)],
        ))]);
        let (_, reporter, success) = run_with(&dialect, EvmVersion::Istanbul, &root);
        assert!(success, "{:?}", reporter.errors());
    }

    #[test]
    fn test_shift_instructions_need_constantinople() {
        let root = block(vec![estmt(call(
            "pop",
            vec![call("shl", vec![num("1"), num("2")])],
        ))]);
        let dialect = EvmDialect::strict_assembly(EvmVersion::Byzantium);
        let (_, reporter, success) = run_with(&dialect, EvmVersion::Byzantium, &root);
        assert!(!success);
        assert_single_error(&reporter, "Constantinople-compatible");
    }

    #[test]
    fn test_jump_rejected_at_any_version() {
        let root = block(vec![estmt(call("jump", vec![num("1")]))]);
        let (_, reporter, success) = run(&root);
        assert!(!success);
        assert_single_error(&reporter, "disallowed in strict assembly");
        assert_eq!(reporter.errors()[0].kind(), ErrorKind::Syntax);
    }

    #[test]
    fn test_calling_a_variable_rejected() {
        let root = block(vec![
            decl(&["x"], Some(num("1"))),
            estmt(call("x", vec![])),
        ]);
        let (_, reporter, success) = run(&root);
        assert!(!success);
        assert_single_error(&reporter, "Attempt to call variable instead of function.");
    }

    #[test]
    fn test_function_used_without_call_rejected() {
        let root = block(vec![
            fundef("f", &[], &[], block(vec![])),
            decl(&["a"], Some(ident("f"))),
        ]);
        let (_, reporter, success) = run(&root);
        assert!(!success);
        assert_single_error(&reporter, "Function f used without being called.");
    }

    #[test]
    fn test_unknown_function_rejected() {
        let root = block(vec![estmt(call("foo", vec![]))]);
        let (_, reporter, success) = run(&root);
        assert!(!success);
        assert_single_error(&reporter, "Function not found.");
    }

    #[test]
    fn test_function_not_visible_outside_its_block() {
        let inner = block(vec![fundef("g", &[], &[], block(vec![]))]);
        let root = block(vec![Statement::Block(inner), estmt(call("g", vec![]))]);
        let (_, reporter, success) = run(&root);
        assert!(!success);
        assert_single_error(&reporter, "Function not found.");
    }

    #[test]
    fn test_argument_count_mismatch_rejected() {
        let root = block(vec![estmt(call("pop", vec![call("add", vec![num("1")])]))]);
        let (_, reporter, success) = run(&root);
        assert!(!success);
        assert_single_error(&reporter, "Function expects 2 arguments but got 1.");
    }

    #[test]
    fn test_declaration_count_mismatch_rejected() {
        let root = block(vec![decl(&["x", "y"], Some(num("1")))]);
        let (_, reporter, success) = run(&root);
        assert!(!success);
        assert_single_error(&reporter, "Variable count mismatch: 2 variables and 1 values.");
    }

    #[test]
    fn test_assignment_count_mismatch_rejected() {
        let root = block(vec![
            decl(&["x"], Some(num("1"))),
            decl(&["y"], Some(num("2"))),
            assign(&["x", "y"], call("add", vec![num("1"), num("2")])),
        ]);
        let (_, reporter, success) = run(&root);
        assert!(!success);
        assert_single_error(&reporter, "Variable count does not match number of values (2 vs. 1)");
    }

    #[test]
    fn test_literal_arguments_check_data_names() {
        let dialect = EvmDialect::strict_assembly_with_objects(EvmVersion::Istanbul);

        let run_with_data = |root: &crate::ast::Block| {
            let mut info = AnalysisInfo::new();
            let mut reporter = ErrorReporter::new();
            let success = Analyzer::new(&mut info, &mut reporter, &dialect, EvmVersion::Istanbul)
                .with_data_names(HashSet::from([yname("data1")]))
                .analyze(root);
            (reporter, success)
        };

        let root = block(vec![estmt(call(
            "pop",
            vec![call("datasize", vec![str_lit("data1")])],
        ))]);
        let (reporter, success) = run_with_data(&root);
        assert!(success, "{:?}", reporter.errors());

        let root = block(vec![estmt(call(
            "pop",
            vec![call("datasize", vec![str_lit("nope")])],
        ))]);
        let (reporter, success) = run_with_data(&root);
        assert!(!success);
        assert_single_error(&reporter, "Unknown data object \"nope\".");

        let root = block(vec![
            decl(&["x"], Some(num("1"))),
            estmt(call("pop", vec![call("datasize", vec![ident("x")])])),
        ]);
        let (reporter, success) = run_with_data(&root);
        assert!(!success);
        assert_single_error(&reporter, "Function expects direct literals as arguments.");
    }

    #[test]
    fn test_if_condition_must_be_bool() {
        let dialect = TypedTestDialect::new();

        let root = block(vec![if_stmt(num_typed("1", "u256"), block(vec![]))]);
        let (_, reporter, success) = run_with(&dialect, EvmVersion::Istanbul, &root);
        assert!(!success);
        assert_single_error(&reporter, "Expected a value of type \"bool\" but got \"u256\".");

        let root = block(vec![if_stmt(bool_typed(true, "bool"), block(vec![]))]);
        let (_, reporter, success) = run_with(&dialect, EvmVersion::Istanbul, &root);
        assert!(success, "{:?}", reporter.errors());
    }

    #[test]
    fn test_invalid_type_tag_rejected() {
        // The EVM dialect only knows the empty type
        let root = block(vec![decl_typed(
            &[("x", "u256")],
            Some(num_typed("1", "u256")),
        )]);
        let (_, reporter, success) = run(&root);
        assert!(!success);
        assert_eq!(reporter.error_count(), 2);
        for error in reporter.errors() {
            assert!(error.message().contains("\"u256\" is not a valid type"));
        }
    }

    #[test]
    fn test_assignment_type_mismatch_rejected() {
        let dialect = TypedTestDialect::new();
        let body = block(vec![assign(&["r"], num_typed("1", "u256"))]);
        let root = block(vec![Statement::FunctionDefinition(FunctionDefinition::new(
            Span::default(),
            yname("f"),
            vec![],
            vec![TypedName::new(Span::default(), yname("r"), yname("bool"))],
            body,
        ))]);
        let (_, reporter, success) = run_with(&dialect, EvmVersion::Istanbul, &root);
        assert!(!success);
        assert_single_error(
            &reporter,
            "Assigning a value of type \"u256\" to a variable of type \"bool\".",
        );
    }

    #[test]
    fn test_declaration_type_mismatch_rejected() {
        let dialect = TypedTestDialect::new();
        let root = block(vec![decl_typed(
            &[("x", "bool")],
            Some(num_typed("1", "u256")),
        )]);
        let (_, reporter, success) = run_with(&dialect, EvmVersion::Istanbul, &root);
        assert!(!success);
        assert_single_error(
            &reporter,
            "Assigning value of type \"u256\" to variable of type \"bool\".",
        );
    }

    #[test]
    fn test_switch_case_type_must_match_scrutinee() {
        let dialect = TypedTestDialect::new();
        let root = block(vec![switch(
            num_typed("1", "u256"),
            vec![
                case(Some(lit_bool_typed(true, "bool")), block(vec![])),
                case(None, block(vec![])),
            ],
        )]);
        let (_, reporter, success) = run_with(&dialect, EvmVersion::Istanbul, &root);
        assert!(!success);
        assert!(reporter.errors()[0]
            .message()
            .contains("Expected a value of type \"u256\" but got \"bool\"."));
    }

    #[test]
    fn test_stack_heights_recorded_per_node() {
        let declaration = decl(&["x"], Some(num("1")));
        let declaration_id = declaration.id();
        let statement = estmt(call("pop", vec![ident("x")]));
        let statement_id = statement.id();
        let root = block(vec![declaration, statement]);

        let (info, reporter, success) = run(&root);
        assert!(success, "{:?}", reporter.errors());
        assert_eq!(info.stack_height_info[&declaration_id], 1);
        assert_eq!(info.stack_height_info[&statement_id], 1);
        assert_eq!(info.stack_height_info[&root.id], 0);
    }

    #[test]
    fn test_break_continue_leave_recorded() {
        let break_stmt = Statement::Break(Break::new(Span::default()));
        let break_id = break_stmt.id();
        let continue_stmt = Statement::Continue(Continue::new(Span::default()));
        let continue_id = continue_stmt.id();
        let leave_stmt = Statement::Leave(Leave::new(Span::default()));
        let leave_id = leave_stmt.id();

        let root = block(vec![
            fundef("f", &[], &[], block(vec![leave_stmt])),
            forloop(
                block(vec![]),
                btrue(),
                block(vec![]),
                block(vec![break_stmt, continue_stmt]),
            ),
        ]);
        let (info, reporter, success) = run(&root);
        assert!(success, "{:?}", reporter.errors());
        for id in [break_id, continue_id, leave_id] {
            assert!(info.stack_height_info.contains_key(&id));
        }
    }

    #[test]
    fn test_outer_variables_hidden_from_functions() {
        let root = block(vec![
            decl(&["x"], Some(num("1"))),
            fundef(
                "f",
                &[],
                &["r"],
                block(vec![assign(&["r"], ident("x"))]),
            ),
            estmt(call("pop", vec![ident("x")])),
        ]);
        let (_, reporter, success) = run(&root);
        assert!(!success);
        assert_single_error(&reporter, "Identifier not found.");
    }

    #[test]
    fn test_function_parameters_usable_in_body() {
        let root = block(vec![
            fundef(
                "f",
                &["a"],
                &["r"],
                block(vec![assign(&["r"], ident("a"))]),
            ),
            estmt(call("pop", vec![call("f", vec![num("1")])])),
        ]);
        let (_, reporter, success) = run(&root);
        assert!(success, "{:?}", reporter.errors());
    }

    #[test]
    fn test_resolver_handles_externals() {
        let seen = RefCell::new(Vec::new());
        let root = block(vec![decl(&["a"], Some(ident("ext")))]);

        let mut info = AnalysisInfo::new();
        let mut reporter = ErrorReporter::new();
        let dialect = EvmDialect::strict_assembly(EvmVersion::Istanbul);
        let success = Analyzer::new(&mut info, &mut reporter, &dialect, EvmVersion::Istanbul)
            .with_resolver(Box::new(|identifier, context, inside_function, _reporter| {
                seen.borrow_mut()
                    .push((identifier.name, context, inside_function));
                if identifier.name == yname("ext") {
                    Some(1)
                } else {
                    None
                }
            }))
            .analyze(&root);
        assert!(success, "{:?}", reporter.errors());

        let seen = seen.into_inner();
        assert!(seen.contains(&(yname("ext"), IdentifierContext::RValue, false)));
        assert!(seen.contains(&(yname("a"), IdentifierContext::VariableDeclaration, false)));
    }

    #[test]
    fn test_resolver_handles_lvalues() {
        let root = block(vec![assign(&["ext"], num("1"))]);

        let mut info = AnalysisInfo::new();
        let mut reporter = ErrorReporter::new();
        let dialect = EvmDialect::strict_assembly(EvmVersion::Istanbul);
        let success = Analyzer::new(&mut info, &mut reporter, &dialect, EvmVersion::Istanbul)
            .with_resolver(Box::new(|_identifier, context, _inside_function, _reporter| {
                (context == IdentifierContext::LValue).then_some(1)
            }))
            .analyze(&root);
        assert!(success, "{:?}", reporter.errors());
    }

    #[test]
    fn test_resolver_errors_suppress_generic_message() {
        let root = block(vec![decl(&["a"], Some(ident("ext")))]);

        let mut info = AnalysisInfo::new();
        let mut reporter = ErrorReporter::new();
        let dialect = EvmDialect::strict_assembly(EvmVersion::Istanbul);
        let success = Analyzer::new(&mut info, &mut reporter, &dialect, EvmVersion::Istanbul)
            .with_resolver(Box::new(|identifier, _context, _inside_function, reporter| {
                if _context == IdentifierContext::RValue {
                    reporter.declaration_error(identifier.span, "ext is reserved here");
                }
                None
            }))
            .analyze(&root);
        assert!(!success);
        assert_single_error(&reporter, "ext is reserved here");
    }

    #[test]
    fn test_deterministic_across_runs() {
        let root = block(vec![
            decl(&["x"], Some(ident("y"))),
            estmt(call("jump", vec![num("1")])),
            decl(&["y"], Some(num("1"))),
        ]);
        let (first_info, first_reporter, first_success) = run(&root);
        let (second_info, second_reporter, second_success) = run(&root);

        assert_eq!(first_success, second_success);
        assert_eq!(first_reporter.errors(), second_reporter.errors());
        assert_eq!(first_info.stack_height_info, second_info.stack_height_info);
    }

    #[test]
    fn test_error_overflow_stops_the_walk() {
        let statements = (0..ErrorReporter::MAX_ERRORS + 10)
            .map(|_| estmt(ident("nope")))
            .collect();
        let root = block(statements);
        let (_, reporter, success) = run(&root);
        assert!(!success);
        assert!(reporter.has_overflown());
        assert_eq!(reporter.error_count(), ErrorReporter::MAX_ERRORS);
    }

    #[test]
    fn test_analyze_strict_assert_correct_returns_info() {
        let dialect = EvmDialect::strict_assembly_with_objects(EvmVersion::Istanbul);
        let object = Object::new(
            yname("obj"),
            block(vec![estmt(call(
                "pop",
                vec![call("datasize", vec![str_lit("obj")])],
            ))]),
        );
        let info = analyze_strict_assert_correct(&dialect, &object);
        assert!(!info.stack_height_info.is_empty());
        assert!(!info.scopes.is_empty());
    }

    #[test]
    #[should_panic(expected = "invalid assembly code")]
    fn test_analyze_strict_assert_correct_panics_on_invalid() {
        let dialect = EvmDialect::strict_assembly(EvmVersion::Istanbul);
        let object = Object::new(yname("obj"), block(vec![estmt(call("foo", vec![]))]));
        analyze_strict_assert_correct(&dialect, &object);
    }
}
