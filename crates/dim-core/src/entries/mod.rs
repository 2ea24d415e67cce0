//! Program entries handed to the compiler by the parser.
//!
//! - [`Class`] - a class with methods, fields, base and interfaces
//! - [`InterfaceDef`] - an interface (method signatures only)
//! - [`Method`] / [`MethodBody`] - a method and its body kind
//! - [`Field`] - a static or instance field
//! - [`Module`] - one parsed source file

mod class;
mod interface;
mod method;
mod module;

pub use class::{BOX_METHOD, Class, UNBOX_METHOD};
pub use interface::{InterfaceDef, InterfaceMethod};
pub use method::{Field, Method, MethodBody};
pub use module::{Module, STANDARD_USING_TYPE};
