//! Statement execution.

use ember_diagnostic::RuntimeErrorKind;
use ember_ir::{
    Expr, ExprKind, Name, Stmt, StmtKind, SwitchCase, TypeUsage, VariableDeclaration,
    VariableStorage,
};
use ember_stack::ensure_sufficient_stack;
use ember_value::{Address, Value};
use tracing::trace;

use super::{unresolved, Interpreter};
use crate::{EvalResult, Flow, LocalSlot};

impl Interpreter<'_> {
    /// Execute one statement. Errors that escape it are attributed to its
    /// line unless a nested statement claimed them first.
    pub(crate) fn execute(&mut self, stmt: &Stmt) -> EvalResult<Flow> {
        ensure_sufficient_stack(|| {
            self.run_statement(stmt)
                .map_err(|error| self.locate(error, stmt.line))
        })
    }

    fn run_statement(&mut self, stmt: &Stmt) -> EvalResult<Flow> {
        if !matches!(stmt.kind, StmtKind::Block(_)) {
            self.context.call_stack.set_line(stmt.line);
            self.runtime
                .run_hook(self.registry, &self.context.call_stack)?;
        }
        trace!(line = stmt.line, "execute");
        match &stmt.kind {
            StmtKind::Expression(expr) => {
                self.full_expression(|interpreter| interpreter.eval(expr).map(drop))?;
                Ok(Flow::Normal)
            }
            StmtKind::Block(statements) => {
                self.with_scope(|scoped| scoped.execute_sequence(statements))
            }
            StmtKind::NamespaceDeclaration { statements, .. } => self.execute_sequence(statements),
            StmtKind::VariableDeclaration(declaration) => {
                self.declare_variable(declaration)?;
                Ok(Flow::Normal)
            }
            StmtKind::StructDeclaration { static_members, .. } => {
                for member in static_members {
                    self.declare_variable(member)?;
                }
                Ok(Flow::Normal)
            }
            StmtKind::UsingDirective(_)
            | StmtKind::TypeDefinition(_)
            | StmtKind::FunctionDeclaration(_)
            | StmtKind::EnumDeclaration(_) => Ok(Flow::Normal),
            StmtKind::If {
                condition,
                then_branch,
                else_branch,
            } => {
                if self.condition(condition)? {
                    self.execute_scoped(then_branch)
                } else if let Some(else_branch) = else_branch {
                    self.execute_scoped(else_branch)
                } else {
                    Ok(Flow::Normal)
                }
            }
            StmtKind::While { condition, body } => {
                while self.condition(condition)? {
                    match self.execute_scoped(body)? {
                        Flow::Break => break,
                        Flow::Return => return Ok(Flow::Return),
                        Flow::Normal | Flow::Continue => {}
                    }
                }
                Ok(Flow::Normal)
            }
            StmtKind::DoWhile { body, condition } => {
                loop {
                    match self.execute_scoped(body)? {
                        Flow::Break => break,
                        Flow::Return => return Ok(Flow::Return),
                        Flow::Normal | Flow::Continue => {}
                    }
                    if !self.condition(condition)? {
                        break;
                    }
                }
                Ok(Flow::Normal)
            }
            StmtKind::For {
                initialization,
                condition,
                increment,
                body,
            } => self.with_scope(|scoped| {
                if let Some(initialization) = initialization {
                    scoped.execute(initialization)?;
                }
                loop {
                    if let Some(condition) = condition {
                        if !scoped.condition(condition)? {
                            break;
                        }
                    }
                    match scoped.execute_scoped(body)? {
                        Flow::Break => break,
                        Flow::Return => return Ok(Flow::Return),
                        Flow::Normal | Flow::Continue => {}
                    }
                    if let Some(increment) = increment {
                        scoped.full_expression(|interpreter| interpreter.eval(increment).map(drop))?;
                    }
                }
                Ok(Flow::Normal)
            }),
            StmtKind::ForRange {
                variable,
                collection,
                body,
            } => self.execute_range_for(variable, collection, body),
            StmtKind::Switch { condition, cases } => self.execute_switch(condition, cases),
            StmtKind::Break => Ok(Flow::Break),
            StmtKind::Continue => Ok(Flow::Continue),
            StmtKind::Return(value) => self.execute_return(value.as_ref()),
        }
    }

    /// Run statements until one leaves the normal flow.
    fn execute_sequence(&mut self, statements: &[Stmt]) -> EvalResult<Flow> {
        for statement in statements {
            let flow = self.execute(statement)?;
            if flow != Flow::Normal {
                return Ok(flow);
            }
        }
        Ok(Flow::Normal)
    }

    /// A branch or loop body, which owns a scope even without braces.
    fn execute_scoped(&mut self, stmt: &Stmt) -> EvalResult<Flow> {
        self.with_scope(|scoped| scoped.execute(stmt))
    }

    pub(crate) fn condition(&mut self, condition: &Expr) -> EvalResult<bool> {
        self.full_expression(|interpreter| interpreter.truthy(condition))
    }

    fn execute_range_for(
        &mut self,
        variable: &VariableDeclaration,
        collection: &Expr,
        body: &Stmt,
    ) -> EvalResult<Flow> {
        self.with_scope(|scoped| {
            let base = scoped.eval_place(collection)?;
            let element = collection.type_usage.element();
            let element_size = i64::from(scoped.registry.size_of(element));
            for index in 0..i64::from(collection.type_usage.array_size) {
                let address = base.offset_by(index * element_size);
                let flow = scoped.with_scope(|scoped| {
                    scoped.bind_range_variable(variable, address, element)?;
                    scoped.execute(body)
                })?;
                match flow {
                    Flow::Break => break,
                    Flow::Return => return Ok(Flow::Return),
                    Flow::Normal | Flow::Continue => {}
                }
            }
            Ok(Flow::Normal)
        })
    }

    fn bind_range_variable(
        &mut self,
        variable: &VariableDeclaration,
        element: Address,
        element_usage: TypeUsage,
    ) -> EvalResult<()> {
        let usage = variable.type_usage.value_usage();
        if variable.type_usage.is_reference() {
            self.context.declare(LocalSlot {
                name: variable.name,
                type_usage: usage,
                address: element,
                owned: false,
            });
            return Ok(());
        }
        let address = self.stack_slot(usage)?;
        self.convert_object(address, usage, element, element_usage)?;
        self.context.declare(LocalSlot {
            name: variable.name,
            type_usage: usage,
            address,
            owned: true,
        });
        Ok(())
    }

    /// Cases fall through until a `break`. Without a matching case the
    /// `default` case runs, if there is one.
    fn execute_switch(&mut self, condition: &Expr, cases: &[SwitchCase]) -> EvalResult<Flow> {
        let value = self.full_expression(|interpreter| interpreter.eval_number(condition))?;
        let value = value.as_i64();
        let mut start = None;
        let mut default = None;
        for (index, case) in cases.iter().enumerate() {
            match &case.value {
                Some(label) => {
                    let label = self.full_expression(|interpreter| interpreter.eval_number(label))?;
                    if label.as_i64() == value {
                        start = Some(index);
                        break;
                    }
                }
                None => default = default.or(Some(index)),
            }
        }
        let Some(start) = start.or(default) else {
            return Ok(Flow::Normal);
        };
        self.with_scope(|scoped| {
            for case in &cases[start..] {
                match scoped.execute_sequence(&case.statements)? {
                    Flow::Normal => {}
                    Flow::Break => return Ok(Flow::Normal),
                    flow => return Ok(flow),
                }
            }
            Ok(Flow::Normal)
        })
    }

    fn execute_return(&mut self, value: Option<&Expr>) -> EvalResult<Flow> {
        let Some(expr) = value else {
            return Ok(Flow::Return);
        };
        let frame = self
            .context
            .frame()
            .ok_or_else(|| RuntimeErrorKind::custom("return outside of a function"))?;
        let return_slot = frame.return_slot;
        let return_type = frame
            .function
            .map_or(expr.type_usage, |id| self.registry.function(id).return_type);
        let usage = return_type.value_usage();
        let size = self.registry.size_of(usage) as usize;

        let value = if return_type.is_reference() {
            let address = self.full_expression(|interpreter| interpreter.eval_place(expr))?;
            Value::external(usage, address, size)
        } else if self.registry.is_struct_value(usage) {
            let slot = return_slot.ok_or(RuntimeErrorKind::InvalidMemoryAccess)?;
            if let Some(index) = self.returned_local(expr, usage) {
                // The local becomes the caller's object.
                let local = self.context.locals[index];
                self.memory.copy(slot, local.address, size)?;
                self.memory.forget_object(local.address);
                self.memory.record_object(slot, usage.type_id);
                self.context.locals[index].owned = false;
            } else {
                self.full_expression(|interpreter| interpreter.initialize(slot, usage, expr))?;
            }
            Value::external(usage, slot, size)
        } else {
            self.full_expression(|interpreter| {
                let value = interpreter.eval(expr)?;
                let bytes = interpreter.converted_bytes(&value, usage)?;
                Ok(Value::from_bytes(usage, &bytes))
            })?
        };
        if let Some(frame) = self.context.frame_mut() {
            frame.return_value = Some(value);
        }
        Ok(Flow::Return)
    }

    /// Index of the owned local of the current frame that `expr` names, when
    /// it holds an object of exactly the returned type.
    fn returned_local(&self, expr: &Expr, usage: TypeUsage) -> Option<usize> {
        let ExprKind::Local(name) = &expr.kind else {
            return None;
        };
        let index = self.context.local_index(*name)?;
        let local = &self.context.locals[index];
        (local.owned && local.type_usage.type_id == usage.type_id && !local.type_usage.is_array())
            .then_some(index)
    }

    fn declare_variable(&mut self, declaration: &VariableDeclaration) -> EvalResult<()> {
        let usage = declaration.type_usage;
        let initializer = declaration.initializer.as_ref();
        match declaration.storage {
            VariableStorage::Local => {
                let (address, owned) = if usage.is_reference() {
                    (self.bind_reference(usage.value_usage(), initializer, false)?, false)
                } else {
                    let address = self.stack_slot(usage)?;
                    self.initialize_variable(address, usage, initializer)?;
                    (address, true)
                };
                self.context.declare(LocalSlot {
                    name: declaration.name,
                    type_usage: usage.value_usage(),
                    address,
                    owned,
                });
            }
            VariableStorage::Static(slot) => {
                let storage = self.registry.static_address(slot);
                if !self.runtime.is_static_initialized(slot) {
                    self.initialize_storage(storage, usage, initializer)?;
                    self.runtime.mark_static_initialized(slot);
                }
                let address = if usage.is_reference() {
                    self.memory.read_scalar::<Address>(storage)?
                } else {
                    storage
                };
                self.context.declare(LocalSlot {
                    name: declaration.name,
                    type_usage: usage.value_usage(),
                    address,
                    owned: false,
                });
            }
            VariableStorage::Global(owner) => {
                let instance = self
                    .registry
                    .instance_in(owner, declaration.name)
                    .ok_or_else(|| unresolved("variable", self.registry.name(declaration.name)))?;
                self.initialize_storage(instance.address, usage, initializer)?;
            }
        }
        Ok(())
    }

    /// Initialize a local's storage, or default-construct it without an
    /// initializer.
    fn initialize_variable(
        &mut self,
        address: Address,
        usage: TypeUsage,
        initializer: Option<&Expr>,
    ) -> EvalResult<()> {
        match initializer {
            Some(expr) => self.full_expression(|interpreter| interpreter.initialize(address, usage, expr)),
            None => self.default_construct(address, usage),
        }
    }

    /// Initialize storage outliving the current scope. A reference stores
    /// the address it is bound to.
    fn initialize_storage(
        &mut self,
        storage: Address,
        usage: TypeUsage,
        initializer: Option<&Expr>,
    ) -> EvalResult<()> {
        if usage.is_reference() {
            let target = self.bind_reference(usage.value_usage(), initializer, true)?;
            self.memory.write_scalar(storage, target)?;
            return Ok(());
        }
        self.initialize_variable(storage, usage, initializer)
    }

    /// Address a reference binds to. An initializer that designates an
    /// object binds to it; anything else initializes a new object that
    /// lives as long as the reference: in the enclosing scope, or on the
    /// heap when `persistent`.
    fn bind_reference(
        &mut self,
        target: TypeUsage,
        initializer: Option<&Expr>,
        persistent: bool,
    ) -> EvalResult<Address> {
        let expr = initializer.ok_or(RuntimeErrorKind::NullPointerAccess)?;
        if self.binds_directly(expr) {
            return self.full_expression(|interpreter| interpreter.eval_place(expr));
        }
        let address = if persistent {
            self.memory
                .allocate(self.registry.size_of(target).max(1) as usize)
        } else {
            self.stack_slot(target)?
        };
        self.full_expression(|interpreter| interpreter.initialize(address, target, expr))?;
        if !persistent {
            self.context.declare(LocalSlot {
                name: Name::EMPTY,
                type_usage: target,
                address,
                owned: true,
            });
        }
        Ok(address)
    }
}
