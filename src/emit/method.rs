//! Method and constructor emitters with their statement accumulators.

use crate::emit::ast::{LocalHandle, Statement};
use crate::metadata::{ParamKind, ValueKind};

/// Imperative accumulator for one method body.
///
/// Statements are appended in execution order; locals are declared up front by the code that
/// assembles the body and referenced by handle.
#[derive(Debug, Default)]
pub struct CodeBuilder {
    locals: Vec<ValueKind>,
    statements: Vec<Statement>,
}

impl CodeBuilder {
    /// Declares a local variable of the given kind and returns its handle.
    pub fn declare_local(&mut self, kind: ValueKind) -> LocalHandle {
        self.locals.push(kind);
        LocalHandle(self.locals.len() - 1)
    }

    /// Appends a statement to the body.
    pub fn add_statement(&mut self, statement: Statement) {
        self.statements.push(statement);
    }

    /// Declared locals, by slot index.
    #[must_use]
    pub fn locals(&self) -> &[ValueKind] {
        &self.locals
    }

    /// Accumulated statements, in execution order.
    #[must_use]
    pub fn statements(&self) -> &[Statement] {
        &self.statements
    }

    pub(crate) fn into_parts(self) -> (Vec<ValueKind>, Vec<Statement>) {
        (self.locals, self.statements)
    }
}

/// Emitter for one method on the type under construction.
#[derive(Debug)]
pub struct MethodEmitter {
    name: String,
    params: Vec<ParamKind>,
    code: CodeBuilder,
}

impl MethodEmitter {
    pub(crate) fn new(name: &str, params: Vec<ParamKind>) -> Self {
        MethodEmitter {
            name: name.to_string(),
            params,
            code: CodeBuilder::default(),
        }
    }

    /// Name of the method being emitted.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Parameter signature of the method.
    #[must_use]
    pub fn params(&self) -> &[ParamKind] {
        &self.params
    }

    /// The body accumulator.
    pub fn code_builder(&mut self) -> &mut CodeBuilder {
        &mut self.code
    }

    pub(crate) fn into_parts(self) -> (String, Vec<ParamKind>, CodeBuilder) {
        (self.name, self.params, self.code)
    }
}

/// Emitter for one constructor on the type under construction.
#[derive(Debug)]
pub struct ConstructorEmitter {
    params: Vec<ParamKind>,
    code: CodeBuilder,
}

impl ConstructorEmitter {
    pub(crate) fn new(params: Vec<ParamKind>) -> Self {
        ConstructorEmitter {
            params,
            code: CodeBuilder::default(),
        }
    }

    /// Parameter signature of the constructor.
    #[must_use]
    pub fn params(&self) -> &[ParamKind] {
        &self.params
    }

    /// The body accumulator.
    pub fn code_builder(&mut self) -> &mut CodeBuilder {
        &mut self.code
    }

    pub(crate) fn into_parts(self) -> (Vec<ParamKind>, CodeBuilder) {
        (self.params, self.code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::emit::ast::{Expression, Statement};

    #[test]
    fn test_locals_get_sequential_slots() {
        let mut code = CodeBuilder::default();
        let a = code.declare_local(ValueKind::Object);
        let b = code.declare_local(ValueKind::Array);
        assert_eq!(a.index(), 0);
        assert_eq!(b.index(), 1);
        assert_eq!(code.locals(), [ValueKind::Object, ValueKind::Array]);
    }

    #[test]
    fn test_statements_keep_order() {
        let mut code = CodeBuilder::default();
        code.add_statement(Statement::Eval(Expression::Arg(0)));
        code.add_statement(Statement::Return(None));
        assert_eq!(code.statements().len(), 2);
        assert!(matches!(code.statements()[1], Statement::Return(None)));
    }
}
