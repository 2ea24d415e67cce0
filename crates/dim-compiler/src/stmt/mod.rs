//! Statement compiler.
//!
//! Lowers a method body into C statements on a [`CEmitter`]. Expressions
//! are delegated to [`ExprCompiler`]; this module owns control flow, local
//! frames and the GC root bookkeeping that goes with them.
//!
//! Every `return` becomes an assignment to `l_retval` and a jump to the
//! method's single `_ret` label, where the epilogue restores the root list.

mod assignment;
mod block;
mod control;
mod try_catch;

use dim_core::{CompilationError, Expr, LocalId, Span, Stmt, StmtKind, Type};
use rustc_hash::FxHashSet;
use tracing::trace;

use crate::context::CompilationContext;
use crate::conversion::type_matches;
use crate::emit::CEmitter;
use crate::expr::ExprCompiler;

type Result<T> = std::result::Result<T, CompilationError>;

/// Lowers the statements of one method.
pub struct StmtCompiler<'a, 'r> {
    ctx: &'a mut CompilationContext<'r>,
    out: &'a mut CEmitter,
    return_type: Option<&'a Type>,
    volatiles: &'a FxHashSet<LocalId>,
    /// Next `block_enter` id.
    blocks: usize,
    /// Next exception frame id.
    tries: usize,
}

impl<'a, 'r> StmtCompiler<'a, 'r> {
    pub fn new(
        ctx: &'a mut CompilationContext<'r>,
        out: &'a mut CEmitter,
        return_type: Option<&'a Type>,
        volatiles: &'a FxHashSet<LocalId>,
    ) -> Self {
        Self {
            ctx,
            out,
            return_type,
            volatiles,
            blocks: 0,
            tries: 0,
        }
    }

    fn expr(&mut self) -> ExprCompiler<'_, 'r> {
        ExprCompiler::new(self.ctx)
    }

    pub fn compile(&mut self, stmt: &Stmt) -> Result<()> {
        trace!(line = stmt.line, "lowering statement");
        let span = Span::line(stmt.line);
        match &stmt.kind {
            StmtKind::Call(expr) => self.compile_call(expr, span),
            StmtKind::Return(value) => self.compile_return(value.as_ref(), span),
            StmtKind::Gc => {
                self.out.line("gc_force;");
                Ok(())
            }
            StmtKind::Assignment { name, value } => self.compile_name_assignment(name, value, span),
            StmtKind::LocalAssignment { id, value } => self.compile_local_assignment(*id, value, span),
            StmtKind::StaticFieldAssignment { class, field, value } => {
                self.compile_static_assignment(class, field, value, span)
            }
            StmtKind::InstanceFieldAssignment { instance, field, value } => {
                self.compile_instance_assignment(instance, field, value, span)
            }
            StmtKind::While { condition, body } => self.compile_while(condition, body),
            StmtKind::If {
                condition,
                then_branch,
                else_branch,
            } => self.compile_if(condition, then_branch, else_branch.as_deref()),
            StmtKind::Block(block) => self.compile_block(block, span),
            StmtKind::Try(try_stmt) => self.compile_try(try_stmt, span),
            StmtKind::Throw(value) => self.compile_throw(value, span),
            StmtKind::Is(is_stmt) => self.compile_is(is_stmt, span),
            StmtKind::Empty => Ok(()),
        }
    }

    /// A call evaluated for its effect.
    fn compile_call(&mut self, expr: &Expr, span: Span) -> Result<()> {
        if !expr.is_call() {
            return Err(CompilationError::invalid("expression statement must be a call", span));
        }
        let info = self.expr().infer(expr)?;
        self.out.line(format!("(void){};", info.code));
        Ok(())
    }

    fn compile_return(&mut self, value: Option<&Expr>, span: Span) -> Result<()> {
        match (value, self.return_type) {
            (Some(value), Some(expected)) => {
                let (ty, code) = self.expr().value(value)?;
                if !type_matches(self.ctx, expected, &ty, false, span)? {
                    return Err(CompilationError::mismatch(
                        format!("cannot return {ty} from a method returning {expected}"),
                        span,
                    ));
                }
                let code = self.coerce(expected, code, span)?;
                self.out.line(format!("l_retval = {code};"));
            }
            (Some(_), None) => {
                return Err(CompilationError::mismatch("cannot return a value from a void method", span));
            }
            (None, Some(expected)) => {
                return Err(CompilationError::mismatch(
                    format!("missing return value of type {expected}"),
                    span,
                ));
            }
            (None, None) => {}
        }
        self.out.line("goto _ret;");
        Ok(())
    }

    fn compile_throw(&mut self, value: &Expr, span: Span) -> Result<()> {
        let (class, code) = self.expr().class_value(value, "throw")?;
        if class.is_nil() {
            return Err(CompilationError::invalid("cannot throw nil", span));
        }
        self.out.line(format!("runtime_throw(state, (Instance*)({code}));"));
        Ok(())
    }

    /// Cast class-typed values to the slot's C type; values pass through.
    fn coerce(&self, slot: &Type, code: String, span: Span) -> Result<String> {
        match slot {
            Type::Class(_) => Ok(format!("({})({code})", self.ctx.c_type(slot, span)?)),
            Type::Value(_) => Ok(code),
        }
    }

    /// Lower a nested statement as a braced body.
    fn body(&mut self, stmt: &Stmt) -> Result<()> {
        if matches!(stmt.kind, StmtKind::Block(_)) {
            return self.compile(stmt);
        }
        self.out.open();
        self.compile(stmt)?;
        self.out.close();
        Ok(())
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;
    use dim_core::ValueKind;

    #[test]
    fn call_statement_discards_result() {
        let registry = registry();
        let body = Stmt::call(Expr::call("Make", vec![], 1));
        assert_eq!(
            lower(&registry, &[], None, &body).unwrap(),
            "(void)(static_method_call((Geo_Circle* (*)(void)), Geo_Main, 1, ));\n"
        );
    }

    #[test]
    fn return_value_and_jump() {
        let registry = registry();
        let ret = Type::value(ValueKind::Int);
        let body = Stmt::ret(Some(Expr::number("4", 2)), 2);
        assert_eq!(
            lower(&registry, &[], Some(&ret), &body).unwrap(),
            "l_retval = 4;\ngoto _ret;\n"
        );
    }

    #[test]
    fn class_return_is_cast() {
        let registry = registry();
        let ret = geo("Shape");
        let body = Stmt::ret(Some(Expr::argument(0, 2)), 2);
        assert_eq!(
            lower(&registry, &[geo("Circle")], Some(&ret), &body).unwrap(),
            "l_retval = (Geo_Shape*)(p_0);\ngoto _ret;\n"
        );
    }

    #[test]
    fn return_checks() {
        let registry = registry();
        let ret = geo("Circle");
        assert!(matches!(
            lower(&registry, &[], Some(&ret), &Stmt::ret(None, 3)),
            Err(CompilationError::TypeMismatch { span, .. }) if span.line == 3
        ));
        assert!(matches!(
            lower(&registry, &[], None, &Stmt::ret(Some(Expr::number("1", 4)), 4)),
            Err(CompilationError::TypeMismatch { .. })
        ));
        assert!(matches!(
            lower(&registry, &[geo_nullable("Circle")], Some(&ret), &Stmt::ret(Some(Expr::argument(0, 5)), 5)),
            Err(CompilationError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn throw_and_gc() {
        let registry = registry();
        let body = Stmt::block(
            vec![Stmt::gc(1), Stmt::throw(Expr::argument(0, 2), 2)],
            vec![],
            1,
        );
        assert_eq!(
            lower(&registry, &[geo("Circle")], None, &body).unwrap(),
            "{\n    gc_force;\n    runtime_throw(state, (Instance*)(p_0));\n}\n"
        );
    }

    #[test]
    fn non_call_expression_statement_rejected() {
        let registry = registry();
        let body = Stmt::call(Expr::number("1", 7));
        assert!(matches!(
            lower(&registry, &[], None, &body),
            Err(CompilationError::InvalidOperation { .. })
        ));
    }
}
