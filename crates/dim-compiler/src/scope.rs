//! Local scope management for method lowering.
//!
//! Tracks, for the method currently being lowered:
//! - parameter types by position
//! - one frame of declared locals per open block
//! - inline bindings introduced by expression-form `is`, which substitute a
//!   narrowed expression for the bound id instead of declaring a C local
//! - scratch roots holding a narrowing source that must be evaluated once

use dim_core::{CompilationError, LocalId, Span, Type};
use rustc_hash::FxHashMap;

/// What a local id refers to at the current point.
#[derive(Debug, Clone, PartialEq)]
pub enum LocalLookup<'s> {
    /// A declared local, spelled `l_<id>`.
    Declared(&'s Type),
    /// An inline `is` binding, spelled as the substituted C expression.
    Inline { ty: &'s Type, code: &'s str },
}

#[derive(Debug, Clone)]
struct InlineBinding {
    id: LocalId,
    ty: Type,
    code: String,
}

/// Locals and parameters of one method.
#[derive(Debug, Default)]
pub struct LocalScope {
    arguments: Vec<Type>,
    frames: Vec<FxHashMap<LocalId, Type>>,
    inline: Vec<InlineBinding>,
    scratch: usize,
}

impl LocalScope {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reset for a new method with the given parameter types.
    pub fn enter_method(&mut self, arguments: &[Type]) {
        self.arguments = arguments.to_vec();
        self.frames.clear();
        self.inline.clear();
        self.scratch = 0;
    }

    // === Scratch roots ===

    /// Claim the next scratch root, spelled `l_t<n>`.
    pub fn scratch(&mut self) -> usize {
        self.scratch += 1;
        self.scratch - 1
    }

    /// Scratch roots claimed since the method was entered.
    pub fn scratch_count(&self) -> usize {
        self.scratch
    }

    // === Arguments ===

    pub fn argument(&self, index: usize, span: impl Into<Span>) -> Result<&Type, CompilationError> {
        self.arguments
            .get(index)
            .ok_or_else(|| CompilationError::UnknownVariable {
                kind: "argument",
                id: index,
                span: span.into(),
            })
    }

    // === Frames ===

    pub fn push_frame<I>(&mut self, locals: I)
    where
        I: IntoIterator<Item = (LocalId, Type)>,
    {
        self.frames.push(locals.into_iter().collect());
    }

    pub fn pop_frame(&mut self) {
        self.frames.pop();
    }

    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    // === Inline bindings ===

    pub fn push_inline(&mut self, id: LocalId, ty: Type, code: String) {
        self.inline.push(InlineBinding { id, ty, code });
    }

    pub fn pop_inline(&mut self) {
        self.inline.pop();
    }

    // === Lookup ===

    /// Innermost binding for `id`: inline bindings shadow declared locals,
    /// inner frames shadow outer ones.
    pub fn lookup(&self, id: LocalId, span: impl Into<Span>) -> Result<LocalLookup<'_>, CompilationError> {
        if let Some(binding) = self.inline.iter().rev().find(|b| b.id == id) {
            return Ok(LocalLookup::Inline {
                ty: &binding.ty,
                code: &binding.code,
            });
        }
        self.frames
            .iter()
            .rev()
            .find_map(|frame| frame.get(&id))
            .map(LocalLookup::Declared)
            .ok_or_else(|| CompilationError::UnknownVariable {
                kind: "local",
                id: id as usize,
                span: span.into(),
            })
    }

    /// Declared type of a local that can be assigned (inline bindings cannot).
    pub fn declared(&self, id: LocalId, span: impl Into<Span>) -> Result<&Type, CompilationError> {
        let span = span.into();
        match self.lookup(id, span)? {
            LocalLookup::Declared(ty) => Ok(ty),
            LocalLookup::Inline { .. } => Err(CompilationError::InvalidTarget {
                what: format!("assignment to narrowed binding {id}"),
                span,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dim_core::{ClassType, ValueKind};

    #[test]
    fn frames_shadow_and_unwind() {
        let mut scope = LocalScope::new();
        scope.push_frame([(0, Type::value(ValueKind::Int))]);
        scope.push_frame([(0, Type::value(ValueKind::Double))]);
        assert_eq!(
            scope.lookup(0, 1).unwrap(),
            LocalLookup::Declared(&Type::value(ValueKind::Double))
        );
        scope.pop_frame();
        assert_eq!(
            scope.lookup(0, 1).unwrap(),
            LocalLookup::Declared(&Type::value(ValueKind::Int))
        );
        scope.pop_frame();
        assert!(matches!(
            scope.lookup(0, 4),
            Err(CompilationError::UnknownVariable { kind: "local", id: 0, .. })
        ));
    }

    #[test]
    fn scratch_roots_restart_per_method() {
        let mut scope = LocalScope::new();
        assert_eq!(scope.scratch(), 0);
        assert_eq!(scope.scratch(), 1);
        assert_eq!(scope.scratch_count(), 2);
        scope.enter_method(&[]);
        assert_eq!(scope.scratch_count(), 0);
        assert_eq!(scope.scratch(), 0);
    }

    #[test]
    fn inline_binding_shadows_and_is_not_assignable() {
        let mut scope = LocalScope::new();
        let circle = Type::Class(ClassType::new("Geo", "Circle"));
        scope.push_inline(3, circle.clone(), "((Geo_Circle*)(p_0))".into());
        match scope.lookup(3, 1).unwrap() {
            LocalLookup::Inline { ty, code } => {
                assert_eq!(ty, &circle);
                assert_eq!(code, "((Geo_Circle*)(p_0))");
            }
            other => panic!("expected inline binding, got {other:?}"),
        }
        assert!(matches!(
            scope.declared(3, 1),
            Err(CompilationError::InvalidTarget { .. })
        ));
        scope.pop_inline();
        assert!(scope.lookup(3, 1).is_err());
    }

    #[test]
    fn arguments_by_position() {
        let mut scope = LocalScope::new();
        scope.enter_method(&[Type::class("Geo", "Circle"), Type::value(ValueKind::Int)]);
        assert_eq!(scope.argument(1, 1).unwrap(), &Type::value(ValueKind::Int));
        assert!(matches!(
            scope.argument(2, 9),
            Err(CompilationError::UnknownVariable { kind: "argument", id: 2, .. })
        ));
    }
}
