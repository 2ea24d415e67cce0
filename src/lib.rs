//! dim: compile parsed dim modules to C for the dim runtime.
//!
//! This is the facade over the workspace crates:
//!
//! - `dim-core`: type model, AST and class entries
//! - `dim-registry`: the class/interface graph and name resolution
//! - `dim-compiler`: lowering to C and the package-level C artifacts
//! - `dim-metadata`: the package metadata codec
//!
//! A build starts from [`Module`]s produced by a parser and the metadata of
//! the packages they import. [`Package::build`] produces every artifact the
//! native build step needs; see [`package`] for the steps.

pub mod config;
pub mod package;
mod qualify;

pub use config::{CompilerConfig, ConfigError};
pub use package::{BuildError, ImportedPackage, ModuleArtifact, Package, PackageOutput};

pub use dim_compiler::{CompilationError, ModuleOutput, OutputError};
pub use dim_core::{Class, ClassType, Field, InterfaceDef, Method, Module, Type, ValueKind};
pub use dim_metadata::MetadataError;
