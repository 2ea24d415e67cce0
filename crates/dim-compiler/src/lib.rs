//! Dim Compiler
//!
//! Semantic checking and C lowering for dim modules.
//!
//! ## Architecture
//!
//! - **Resolution**: names, overloads and hierarchy queries against a shared
//!   [`ClassRegistry`](dim_registry::ClassRegistry)
//! - **Lowering**: one [`CompilationContext`] per module walks every method
//!   body and writes C text in the same pass
//!
//! ## Modules
//!
//! - [`context`]: per-module compilation state
//! - [`conversion`]: the type compatibility relation
//! - [`emit`]: C text emitter and naming helpers
//! - [`expr`]: expression typing and lowering
//! - [`overload`]: call binding and static field lookup
//! - [`passes`]: pre-lowering analyses (volatile locals)
//! - [`scope`]: locals, parameters and narrowed bindings
//! - [`stmt`]: statement lowering
//! - [`function_compiler`]: method prologue, epilogue and boxing bodies
//! - [`module`]: per-module header and source
//! - [`output`]: package types header, aggregate header, definitions unit

pub mod context;
pub mod conversion;
pub mod emit;
pub mod expr;
mod expr_info;
pub mod function_compiler;
pub mod module;
pub mod output;
pub mod overload;
pub mod passes;
pub mod scope;
pub mod stmt;

pub use context::CompilationContext;
pub use conversion::{same_identity, type_matches};
pub use emit::CEmitter;
pub use expr::{ExprCompiler, identity_check};
pub use expr_info::ExprInfo;
pub use function_compiler::{compile_method, method_c_name, method_signature};
pub use module::{ModuleHeaders, ModuleOutput, compile_module};
pub use output::{OutputError, all_header, definitions, types_header};
pub use overload::{MethodLookup, ResolvedMethod, resolve_method};
pub use passes::volatile_locals;
pub use scope::{LocalLookup, LocalScope};
pub use stmt::StmtCompiler;

// Re-export CompilationError from core for convenience
pub use dim_core::CompilationError;
