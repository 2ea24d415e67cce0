//! Namespace qualification of class and interface signatures.
//!
//! Parsed signatures name classes the way the source did, often without a
//! namespace. Two passes fill namespaces in:
//!
//! - [`qualify_visible`] runs before lowering and resolves each reference
//!   from the declaring module's point of view.
//! - [`qualify_for_metadata`] runs on the copies written to package
//!   metadata and settles whatever is still bare by global name: a unique
//!   interface, else a unique class, else the candidate in the package's
//!   own namespace.

use dim_core::{Class, ClassType, InterfaceDef, InterfaceMethod, Method, Type};
use dim_registry::{ClassRegistry, Resolver};
use tracing::{debug, trace};

/// Qualify every reference `resolver` can see. Unresolvable references are
/// left alone; lowering reports them where they are used.
pub(crate) fn qualify_visible(class: &mut Class, resolver: &Resolver<'_>) {
    qualify_refs_visible(class_refs_mut(class), resolver);
}

pub(crate) fn qualify_interface_visible(interface: &mut InterfaceDef, resolver: &Resolver<'_>) {
    qualify_refs_visible(interface_refs_mut(interface), resolver);
}

/// Qualify the bare references that remain, by name across the registry.
pub(crate) fn qualify_for_metadata(class: &mut Class, registry: &ClassRegistry, package: &str) {
    let owner = class.qualified_name();
    qualify_refs_globally(class_refs_mut(class), registry, package, &owner.to_string());
}

pub(crate) fn qualify_interface_for_metadata(
    interface: &mut InterfaceDef,
    registry: &ClassRegistry,
    package: &str,
) {
    let owner = interface.qualified_name();
    qualify_refs_globally(interface_refs_mut(interface), registry, package, &owner.to_string());
}

fn qualify_refs_visible<'a>(refs: impl Iterator<Item = (&'a mut ClassType, u32)>, resolver: &Resolver<'_>) {
    for (ty, line) in refs {
        if ty.is_nil() {
            continue;
        }
        match resolver.qualify(ty, line) {
            Ok(qualified) => *ty = qualified,
            Err(err) => trace!(reference = %ty, %err, "left unqualified"),
        }
    }
}

fn qualify_refs_globally<'a>(
    refs: impl Iterator<Item = (&'a mut ClassType, u32)>,
    registry: &ClassRegistry,
    package: &str,
    owner: &str,
) {
    for (ty, _) in refs {
        if ty.is_qualified() {
            continue;
        }
        match global_namespace(registry, &ty.name, package) {
            Some(namespace) => *ty = ty.qualified(namespace),
            None => debug!(owner, reference = %ty, "no namespace for reference"),
        }
    }
}

fn global_namespace(registry: &ClassRegistry, name: &str, package: &str) -> Option<String> {
    if let [id] = registry.interfaces_named(name) {
        return Some(registry.interface(*id).namespace.clone());
    }
    match registry.classes_named(name) {
        [] => None,
        [id] => Some(registry.class(*id).namespace.clone()),
        candidates => candidates
            .iter()
            .map(|id| &registry.class(*id).namespace)
            .find(|ns| ns.eq_ignore_ascii_case(package))
            .cloned(),
    }
}

/// Base, interfaces, method parameter and return types, then static and
/// instance field types, each with the line it was declared on.
fn class_refs_mut(class: &mut Class) -> impl Iterator<Item = (&mut ClassType, u32)> {
    let Class {
        line,
        methods,
        static_fields,
        instance_fields,
        base,
        interfaces,
        ..
    } = class;
    let line = *line;

    let inheritance = base
        .iter_mut()
        .chain(interfaces.iter_mut())
        .map(move |ty| (ty, line));
    let signatures = methods.iter_mut().flat_map(
        |Method {
             params,
             return_type,
             line,
             ..
         }| {
            let line = *line;
            params
                .iter_mut()
                .chain(return_type.iter_mut())
                .filter_map(move |ty| class_mut(ty).map(|ty| (ty, line)))
        },
    );
    let fields = static_fields
        .iter_mut()
        .chain(instance_fields.iter_mut())
        .filter_map(|field| {
            let line = field.line;
            class_mut(&mut field.ty).map(|ty| (ty, line))
        });

    inheritance.chain(signatures).chain(fields)
}

/// Method parameter and return types of an interface.
fn interface_refs_mut(interface: &mut InterfaceDef) -> impl Iterator<Item = (&mut ClassType, u32)> {
    interface.methods.iter_mut().flat_map(
        |InterfaceMethod {
             params,
             return_type,
             line,
             ..
         }| {
            let line = *line;
            params
                .iter_mut()
                .chain(return_type.iter_mut())
                .filter_map(move |ty| class_mut(ty).map(|ty| (ty, line)))
        },
    )
}

fn class_mut(ty: &mut Type) -> Option<&mut ClassType> {
    match ty {
        Type::Class(class) => Some(class),
        Type::Value(_) => None,
    }
}
