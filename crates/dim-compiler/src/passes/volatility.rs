//! Volatile-local analysis.
//!
//! A `catch` resumes execution through `longjmp`, after which non-volatile
//! automatic variables modified since the `setjmp` have indeterminate
//! values. Any local read lexically after a `try` in the same or an
//! enclosing statement sequence is therefore declared `volatile`.
//!
//! The rule is conservative:
//! - catch handlers count as coming after their `try`
//! - a `try` nested in a statement marks everything after that statement
//! - a loop containing a `try` makes every read in the loop volatile,
//!   since later iterations run after earlier ones

use dim_core::{Expr, ExprKind, LocalId, Stmt, StmtKind};
use rustc_hash::FxHashSet;

/// Locals of `body` that must be declared `volatile`.
pub fn volatile_locals(body: &Stmt) -> FxHashSet<LocalId> {
    let mut volatiles = FxHashSet::default();
    visit_stmt(body, false, &mut volatiles);
    volatiles
}

/// Returns whether `stmt` contains a `try`.
fn visit_stmt(stmt: &Stmt, after_try: bool, out: &mut FxHashSet<LocalId>) -> bool {
    match &stmt.kind {
        StmtKind::Block(block) => {
            let mut after = after_try;
            let mut contains = false;
            for child in &block.body {
                if visit_stmt(child, after, out) {
                    after = true;
                    contains = true;
                }
            }
            contains
        }
        StmtKind::Try(try_stmt) => {
            visit_stmt(&try_stmt.body, after_try, out);
            for catch in &try_stmt.catches {
                visit_stmt(&catch.handler, true, out);
            }
            true
        }
        StmtKind::While { condition, body } => {
            let after = after_try || contains_try(body);
            visit_expr(condition, after, out);
            visit_stmt(body, after, out)
        }
        StmtKind::If {
            condition,
            then_branch,
            else_branch,
        } => {
            visit_expr(condition, after_try, out);
            let then_try = visit_stmt(then_branch, after_try, out);
            let else_try = else_branch
                .as_deref()
                .is_some_and(|branch| visit_stmt(branch, after_try, out));
            then_try || else_try
        }
        StmtKind::Is(is_stmt) => {
            visit_expr(&is_stmt.source, after_try, out);
            let then_try = visit_stmt(&is_stmt.then_branch, after_try, out);
            let else_try = is_stmt
                .else_branch
                .as_deref()
                .is_some_and(|branch| visit_stmt(branch, after_try, out));
            then_try || else_try
        }
        StmtKind::Call(expr) | StmtKind::Throw(expr) => {
            visit_expr(expr, after_try, out);
            false
        }
        StmtKind::Return(value) => {
            if let Some(value) = value {
                visit_expr(value, after_try, out);
            }
            false
        }
        StmtKind::Assignment { value, .. }
        | StmtKind::LocalAssignment { value, .. }
        | StmtKind::StaticFieldAssignment { value, .. } => {
            visit_expr(value, after_try, out);
            false
        }
        StmtKind::InstanceFieldAssignment { instance, value, .. } => {
            visit_expr(instance, after_try, out);
            visit_expr(value, after_try, out);
            false
        }
        StmtKind::Gc | StmtKind::Empty => false,
    }
}

fn contains_try(stmt: &Stmt) -> bool {
    match &stmt.kind {
        StmtKind::Try(_) => true,
        StmtKind::Block(block) => block.body.iter().any(contains_try),
        StmtKind::While { body, .. } => contains_try(body),
        StmtKind::If {
            then_branch,
            else_branch,
            ..
        } => contains_try(then_branch) || else_branch.as_deref().is_some_and(contains_try),
        StmtKind::Is(is_stmt) => {
            contains_try(&is_stmt.then_branch) || is_stmt.else_branch.as_deref().is_some_and(contains_try)
        }
        _ => false,
    }
}

fn visit_expr(expr: &Expr, after_try: bool, out: &mut FxHashSet<LocalId>) {
    if !after_try {
        return;
    }
    match &expr.kind {
        ExprKind::Local(id) => {
            out.insert(*id);
        }
        ExprKind::Call { args, .. }
        | ExprKind::CallStatic { args, .. }
        | ExprKind::CallInstance { args, .. } => {
            for arg in args {
                visit_expr(arg, after_try, out);
            }
        }
        ExprKind::InstanceField { instance, .. } => visit_expr(instance, after_try, out),
        ExprKind::Binary { left, right, .. } => {
            visit_expr(left, after_try, out);
            visit_expr(right, after_try, out);
        }
        ExprKind::Unary { operand, .. } | ExprKind::Unwrap(operand) => visit_expr(operand, after_try, out),
        ExprKind::If {
            condition,
            then_branch,
            else_branch,
        } => {
            visit_expr(condition, after_try, out);
            visit_expr(then_branch, after_try, out);
            visit_expr(else_branch, after_try, out);
        }
        ExprKind::Is {
            source,
            then_branch,
            else_branch,
            ..
        } => {
            visit_expr(source, after_try, out);
            visit_expr(then_branch, after_try, out);
            visit_expr(else_branch, after_try, out);
        }
        ExprKind::As { source, .. } => visit_expr(source, after_try, out),
        ExprKind::Argument(_)
        | ExprKind::Class(_)
        | ExprKind::StaticField { .. }
        | ExprKind::Number(_)
        | ExprKind::String(_)
        | ExprKind::New
        | ExprKind::Nil => {}
    }
}
