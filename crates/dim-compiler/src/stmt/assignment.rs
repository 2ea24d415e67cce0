//! Assignments to locals and fields.

use dim_core::{ClassType, CompilationError, Expr, LocalId, Span, Type};

use super::StmtCompiler;
use crate::conversion::type_matches;
use crate::expr::identifiers::static_field_access;
use crate::expr::member::instance_field_access;
use crate::overload::{ResolvedStaticField, resolve_static_field, resolve_unqualified_static_field};

type Result<T> = std::result::Result<T, CompilationError>;

impl StmtCompiler<'_, '_> {
    pub(super) fn compile_local_assignment(&mut self, id: LocalId, value: &Expr, span: Span) -> Result<()> {
        let target = self.ctx.scope().declared(id, span)?.clone();
        self.assign(&target, format!("l_{id}"), value, span)
    }

    /// `name = value` where `name` is a static field found by unqualified lookup.
    pub(super) fn compile_name_assignment(&mut self, name: &str, value: &Expr, span: Span) -> Result<()> {
        let resolved = resolve_unqualified_static_field(self.ctx, name, span)?;
        self.assign_static(resolved, value, span)
    }

    pub(super) fn compile_static_assignment(
        &mut self,
        class: &ClassType,
        field: &str,
        value: &Expr,
        span: Span,
    ) -> Result<()> {
        let resolved = resolve_static_field(self.ctx, class, field, span)?;
        self.assign_static(resolved, value, span)
    }

    pub(super) fn compile_instance_assignment(
        &mut self,
        instance: &Expr,
        field: &str,
        value: &Expr,
        span: Span,
    ) -> Result<()> {
        let mut exprs = self.expr();
        let (class, code) = exprs.class_value(instance, "field assignment")?;
        let (target, lvalue) = instance_field_access(&exprs, &class, &code, field, span)?;
        self.assign(&target, lvalue, value, span)
    }

    fn assign_static(&mut self, resolved: ResolvedStaticField<'_>, value: &Expr, span: Span) -> Result<()> {
        let lvalue = static_field_access(&self.ctx.class(resolved.owner).c_name(), resolved.index);
        self.assign(&resolved.field.ty, lvalue, value, span)
    }

    fn assign(&mut self, target: &Type, lvalue: String, value: &Expr, span: Span) -> Result<()> {
        let (ty, code) = self.expr().value(value)?;
        if !type_matches(self.ctx, target, &ty, false, span)? {
            return Err(CompilationError::mismatch(
                format!("cannot assign {ty} to {lvalue} of type {target}"),
                span,
            ));
        }
        let code = self.coerce(target, code, span)?;
        self.out.line(format!("{lvalue} = {code};"));
        Ok(())
    }
}
