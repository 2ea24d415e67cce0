//! Blocks and local declarations.
//!
//! A block that declares locals opens a GC frame:
//!
//! ```text
//! {
//!     block_enter(0)
//!     value_local(int32_t, 1)
//!     class_local(Geo_Circle*, 2)
//!     ...
//!     block_exit(0)
//! }
//! ```
//!
//! Volatile locals are spelled out instead of using the macros, because the
//! qualifier has to sit on the declaration itself.

use dim_core::{Block, CompilationError, LocalId, Span, Type};

use super::StmtCompiler;

type Result<T> = std::result::Result<T, CompilationError>;

impl StmtCompiler<'_, '_> {
    pub(super) fn compile_block(&mut self, block: &Block, span: Span) -> Result<()> {
        self.out.open();
        if block.locals.is_empty() {
            for stmt in &block.body {
                self.compile(stmt)?;
            }
            self.out.close();
            return Ok(());
        }

        let frame = self.enter_frame(&block.locals, span)?;
        for stmt in &block.body {
            self.compile(stmt)?;
        }
        self.exit_frame(frame);
        self.out.close();
        Ok(())
    }

    /// Emit `block_enter`, declare `locals` and bring them into scope.
    /// Returns the frame id for [`exit_frame`](Self::exit_frame).
    pub(super) fn enter_frame(&mut self, locals: &[(LocalId, Type)], span: Span) -> Result<usize> {
        let frame = self.blocks;
        self.blocks += 1;
        self.out.line(format!("block_enter({frame})"));
        for (id, ty) in locals {
            self.declare_local(*id, ty, span)?;
        }
        self.ctx.scope_mut().push_frame(locals.iter().cloned());
        Ok(frame)
    }

    pub(super) fn exit_frame(&mut self, frame: usize) {
        self.ctx.scope_mut().pop_frame();
        self.out.line(format!("block_exit({frame})"));
    }

    fn declare_local(&mut self, id: LocalId, ty: &Type, span: Span) -> Result<()> {
        let c_type = self.ctx.c_type(ty, span)?;
        let volatile = self.volatiles.contains(&id);
        match (ty.is_class(), volatile) {
            (false, false) => self.out.line(format!("value_local({c_type}, {id})")),
            (true, false) => self.out.line(format!("class_local({c_type}, {id})")),
            (false, true) => {
                self.out.line(format!("volatile {c_type} l_{id} = 0;"));
                self.out.line(format!("(void)l_{id};"));
            }
            (true, true) => {
                self.out.line(format!("{c_type} volatile l_{id} = NULL;"));
                self.out.line(format!(
                    "runtime_reference_local(state, (Instance **)&l_{id}, l_r_{id});"
                ));
                self.out.line(format!("(void)l_{id};"));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use dim_core::{CatchClause, ClassType, CompilationError, Expr, Stmt, Type, ValueKind};

    #[test]
    fn locals_get_frame_and_roots() {
        let registry = registry();
        let body = Stmt::block(
            vec![Stmt::assign_local(1, Expr::number("3", 2), 2)],
            vec![(1, Type::value(ValueKind::Int)), (2, geo("Circle"))],
            1,
        );
        assert_eq!(
            lower(&registry, &[], None, &body).unwrap(),
            "{\n    block_enter(0)\n    value_local(int32_t, 1)\n    class_local(Geo_Circle*, 2)\n    l_1 = 3;\n    block_exit(0)\n}\n"
        );
    }

    #[test]
    fn nested_blocks_number_frames_and_scope() {
        let registry = registry();
        let inner = Stmt::block(
            vec![Stmt::assign_local(1, Expr::local(0, 3), 3)],
            vec![(1, Type::value(ValueKind::Int))],
            2,
        );
        let body = Stmt::block(vec![inner], vec![(0, Type::value(ValueKind::Int))], 1);
        let text = lower(&registry, &[], None, &body).unwrap();
        assert!(text.contains("block_enter(0)"));
        assert!(text.contains("block_enter(1)"));
        assert!(text.find("block_exit(1)") < text.find("block_exit(0)"));

        let undeclared = Stmt::block(vec![Stmt::assign_local(1, Expr::number("1", 4), 4)], vec![], 1);
        assert!(matches!(
            lower(&registry, &[], None, &undeclared),
            Err(CompilationError::UnknownVariable { id: 1, .. })
        ));
    }

    #[test]
    fn locals_read_after_try_are_volatile() {
        let registry = registry();
        let guarded = Stmt::try_catch(
            Stmt::call(Expr::call("Run", vec![], 3)),
            vec![CatchClause::new(
                ClassType::unqualified("Circle"),
                Stmt::call(Expr::call("Run", vec![], 4)),
            )],
            3,
        );
        let body = Stmt::block(
            vec![
                Stmt::assign_local(0, Expr::number("1", 2), 2),
                guarded,
                Stmt::ret(Some(Expr::local(0, 5)), 5),
            ],
            vec![(0, Type::value(ValueKind::Int)), (1, geo_nullable("Circle"))],
            1,
        );
        let ret = Type::value(ValueKind::Int);
        let text = lower(&registry, &[], Some(&ret), &body).unwrap();
        assert!(text.contains("    volatile int32_t l_0 = 0;\n    (void)l_0;\n"), "{text}");
        assert!(text.contains("    class_local(Geo_Circle*, 1)\n"), "{text}");
    }
}
