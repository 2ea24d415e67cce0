//! Package-level C artifacts.
//!
//! Besides one header/source pair per module (see [`crate::module`]), a
//! package build produces three shared files:
//!
//! - [`types_header`]: instance and static structs of the compiled classes
//! - [`all_header`]: the aggregate header every module source includes
//! - [`definitions`]: the `Definition` table and the `getDefinitions` entry
//!   point the runtime calls when it loads the package
//!
//! Generators take classes that are already registered (and, in a package
//! build, already qualified), so they resolve types from each class's own
//! namespace.

mod all_header;
mod definitions;
mod types_header;

pub use all_header::all_header;
pub use definitions::definitions;
pub use types_header::types_header;

use dim_core::{Class, CompilationError, Field};
use dim_registry::{ClassId, ClassRegistry, Visibility};
use thiserror::Error;

use crate::context::CompilationContext;

/// Errors raised while generating package artifacts.
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("a package name is required to generate the types header")]
    MissingPackageName,

    #[error("no package header is known for imported namespace {namespace}")]
    UnknownNamespace { namespace: String },

    #[error(transparent)]
    Compilation(#[from] CompilationError),
}

/// A class together with its flattened instance layout.
pub(crate) struct ClassLayout<'r> {
    pub class: &'r Class,
    pub c_name: String,
    /// `f_<i>` slots, root ancestor first.
    pub instance_fields: Vec<&'r Field>,
}

impl<'r> ClassLayout<'r> {
    pub fn new(ctx: &CompilationContext<'r>, id: ClassId) -> Result<Self, CompilationError> {
        let class = ctx.class(id);
        Ok(Self {
            class,
            c_name: class.c_name(),
            instance_fields: ctx.resolver().all_instance_fields(id)?,
        })
    }

    /// Whether the runtime can allocate instances (`new_`/`free_` exist).
    pub fn instantiable(&self) -> bool {
        !self.instance_fields.is_empty()
    }

    pub fn has_statics(&self) -> bool {
        !self.class.static_fields.is_empty()
    }

    pub fn has_instance_refs(&self) -> bool {
        self.instance_fields.iter().any(|f| f.ty.is_class())
    }

    pub fn has_static_refs(&self) -> bool {
        self.class.static_fields.iter().any(|f| f.ty.is_class())
    }
}

/// Resolution context seen from the namespace `id` is declared in.
pub(crate) fn class_context(registry: &ClassRegistry, id: ClassId) -> CompilationContext<'_> {
    let namespace = registry.class(id).namespace.clone();
    CompilationContext::new(registry, Visibility::new(namespace, Vec::new()))
}
