//! `if`, `while` and statement-form `is`.

use dim_core::{CompilationError, Expr, IsStmt, Span, Stmt, Type};

use super::StmtCompiler;
use crate::emit::strip_parens;
use crate::expr::narrowing::{narrowing_check, narrowing_source};

type Result<T> = std::result::Result<T, CompilationError>;

impl StmtCompiler<'_, '_> {
    pub(super) fn compile_while(&mut self, condition: &Expr, body: &Stmt) -> Result<()> {
        let condition = self.expr().condition(condition)?;
        self.out.line(format!("while ({condition})"));
        self.body(body)
    }

    pub(super) fn compile_if(
        &mut self,
        condition: &Expr,
        then_branch: &Stmt,
        else_branch: Option<&Stmt>,
    ) -> Result<()> {
        let condition = self.expr().condition(condition)?;
        self.out.line(format!("if ({condition})"));
        self.body(then_branch)?;
        if let Some(else_branch) = else_branch {
            self.out.line("else");
            self.body(else_branch)?;
        }
        Ok(())
    }

    /// `is Target bind = source; then else otherwise`.
    ///
    /// The bound local is a real reference local living in its own frame
    /// around the true branch.
    pub(super) fn compile_is(&mut self, is_stmt: &IsStmt, span: Span) -> Result<()> {
        let source = narrowing_source(&mut self.expr(), &is_stmt.source, "is")?;
        let check = narrowing_check(self.ctx, &source, &is_stmt.target, span)?;

        let bound = Type::Class(is_stmt.target.with_nullable(false));
        let c_type = self.ctx.c_type(&bound, span)?;

        self.out.line(format!("if ({})", strip_parens(&check)));
        self.out.open();
        let frame = self.enter_frame(&[(is_stmt.bind, bound)], span)?;
        self.out
            .line(format!("l_{} = ({c_type})({});", is_stmt.bind, source.code));
        self.body(&is_stmt.then_branch)?;
        self.exit_frame(frame);
        self.out.close();

        if let Some(else_branch) = &is_stmt.else_branch {
            self.out.line("else");
            self.body(else_branch)?;
        }
        Ok(())
    }
}
