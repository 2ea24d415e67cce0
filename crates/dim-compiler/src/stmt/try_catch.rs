//! `try`/`catch` over `setjmp`.
//!
//! ```text
//! {
//!     ExceptionFrame l_try_0;
//!     runtime_try_push(state, &l_try_0);
//!     if (!setjmp(l_try_0.env))
//!     {
//!         (void)<call>;
//!         runtime_try_pop(state);
//!     }
//!     else
//!     {
//!         Instance *l_ex_0 = runtime_exception(state);
//!         runtime_try_pop(state);
//!         if (<exact match on namespace and name>)
//!         {
//!             (void)<handler>;
//!         }
//!         else
//!         {
//!             runtime_rethrow(state, l_ex_0);
//!         }
//!     }
//! }
//! ```
//!
//! Catch clauses match the thrown object's class exactly; a subclass of the
//! caught type is not caught.

use dim_core::{CompilationError, Span, Stmt, StmtKind, TryStmt};
use dim_registry::TypeTarget;

use super::StmtCompiler;

type Result<T> = std::result::Result<T, CompilationError>;

impl StmtCompiler<'_, '_> {
    pub(super) fn compile_try(&mut self, try_stmt: &TryStmt, span: Span) -> Result<()> {
        require_call(&try_stmt.body, "try")?;
        if try_stmt.catches.is_empty() {
            return Err(CompilationError::MalformedTry {
                message: "try without catch".to_string(),
                span,
            });
        }

        // Resolve every catch type before emitting anything.
        let mut clauses = Vec::with_capacity(try_stmt.catches.len());
        for catch in &try_stmt.catches {
            require_call(&catch.handler, "catch")?;
            let class = match self.ctx.resolve_target(&catch.exception, catch.line)? {
                TypeTarget::Class(id) => self.ctx.class(id),
                TypeTarget::Interface(_) => {
                    return Err(CompilationError::invalid(
                        format!("cannot catch interface {}", catch.exception),
                        catch.line,
                    ));
                }
            };
            clauses.push((class, &catch.handler));
        }

        let frame = self.tries;
        self.tries += 1;
        let env = format!("l_try_{frame}");
        let ex = format!("l_ex_{frame}");

        self.out.open();
        self.out.line(format!("ExceptionFrame {env};"));
        self.out.line(format!("runtime_try_push(state, &{env});"));
        self.out.line(format!("if (!setjmp({env}.env))"));
        self.out.open();
        self.compile(&try_stmt.body)?;
        self.out.line("runtime_try_pop(state);");
        self.out.close();
        self.out.line("else");
        self.out.open();
        self.out.line(format!("Instance *{ex} = runtime_exception(state);"));
        self.out.line("runtime_try_pop(state);");
        for (i, (class, handler)) in clauses.into_iter().enumerate() {
            let keyword = if i == 0 { "if" } else { "else if" };
            self.out.line(format!(
                "{keyword} (strcmp({ex}->definition->namespace_, \"{}\") == 0 && strcmp({ex}->definition->name, \"{}\") == 0)",
                class.namespace, class.name
            ));
            self.out.open();
            self.compile(handler)?;
            self.out.close();
        }
        self.out.line("else");
        self.out.open();
        self.out.line(format!("runtime_rethrow(state, {ex});"));
        self.out.close();
        self.out.close();
        self.out.close();
        Ok(())
    }
}

fn require_call(stmt: &Stmt, what: &str) -> Result<()> {
    match &stmt.kind {
        StmtKind::Call(expr) if expr.is_call() => Ok(()),
        _ => Err(CompilationError::MalformedTry {
            message: format!("{what} must wrap a single call"),
            span: Span::line(stmt.line),
        }),
    }
}
