//! Package builds.
//!
//! A [`Package`] collects parsed modules and the packages they import, then
//! [`Package::build`] turns them into every generated artifact:
//!
//! 1. Box/Unbox synthesis and the local duplicate check
//! 2. merging local and imported classes and interfaces (local wins) into
//!    one registry
//! 3. lowering each module, in parallel when configured
//! 4. the types header, aggregate header and definitions unit
//! 5. the package metadata file
//!
//! # Example
//!
//! ```
//! use dim::{CompilerConfig, ImportedPackage, Package};
//! use dim_core::{Class, Field, Module, ValueKind};
//!
//! let std = ImportedPackage::new("STD", "std_types.h", vec![Class::new("STD", "Any", 0)]);
//! let module = Module::new("geo/point.dim").with_class(
//!     Class::new("Geo", "Point", 1).with_instance_field(Field::new("x", ValueKind::Int, 2)),
//! );
//!
//! let mut package = Package::new(CompilerConfig::new("Geo"));
//! package.add_import(std).unwrap();
//! package.add_module(module).unwrap();
//! package.build().unwrap();
//!
//! let output = package.output().unwrap();
//! assert!(output.types_header.contains("struct Geo_Point"));
//! assert_eq!(output.metadata_file, "Geo.bin");
//! ```

use std::path::{Path, PathBuf};

use dim_compiler::{
    CompilationError, ModuleHeaders, ModuleOutput, OutputError, all_header, compile_module,
    definitions, types_header,
};
use dim_core::{Class, InterfaceDef, Module, QualifiedName};
use dim_metadata::{MetadataError, PackageMetadata, read_package, write_package};
use dim_registry::{ClassId, ClassRegistry, InterfaceId, Resolver, Visibility};
use rayon::prelude::*;
use rustc_hash::{FxHashMap, FxHashSet};
use tracing::{debug, info};

use crate::config::{CompilerConfig, ConfigError};
use crate::qualify::{
    qualify_for_metadata, qualify_interface_for_metadata, qualify_interface_visible, qualify_visible,
};

/// Classes and interfaces of a package compiled elsewhere, known only
/// through metadata.
#[derive(Debug, Clone)]
pub struct ImportedPackage {
    pub name: String,
    /// Types header of the package, included for its namespaces.
    pub header: String,
    pub classes: Vec<Class>,
    pub interfaces: Vec<InterfaceDef>,
}

impl ImportedPackage {
    pub fn new(name: impl Into<String>, header: impl Into<String>, classes: Vec<Class>) -> Self {
        Self {
            name: name.into(),
            header: header.into(),
            classes,
            interfaces: Vec::new(),
        }
    }

    pub fn with_interfaces(mut self, interfaces: Vec<InterfaceDef>) -> Self {
        self.interfaces = interfaces;
        self
    }

    /// Decode a package's metadata file.
    pub fn from_metadata(
        name: impl Into<String>,
        header: impl Into<String>,
        bytes: &[u8],
    ) -> Result<Self, BuildError> {
        let name = name.into();
        let PackageMetadata { classes, interfaces } =
            read_package(bytes).map_err(|source| BuildError::Metadata {
                package: name.clone(),
                source,
            })?;
        debug!(
            package = %name,
            classes = classes.len(),
            interfaces = interfaces.len(),
            "imported package"
        );
        Ok(Self::new(name, header, classes).with_interfaces(interfaces))
    }

    /// Namespaces declared by the package, first occurrence order.
    fn namespaces(&self) -> Vec<&str> {
        let mut namespaces: Vec<&str> = vec![self.name.as_str()];
        let declared = self
            .classes
            .iter()
            .map(|c| c.namespace.as_str())
            .chain(self.interfaces.iter().map(|i| i.namespace.as_str()));
        for namespace in declared {
            if !namespaces.iter().any(|ns| ns.eq_ignore_ascii_case(namespace)) {
                namespaces.push(namespace);
            }
        }
        namespaces
    }
}

/// Generated C for one module, with the file names the package uses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleArtifact {
    pub output: ModuleOutput,
    /// `<module path>.c`
    pub source_file: PathBuf,
}

/// Everything a successful build produces.
#[derive(Debug, Clone)]
pub struct PackageOutput {
    /// In the order the modules were added.
    pub modules: Vec<ModuleArtifact>,
    pub types_header: String,
    pub all_header: String,
    pub definitions: String,
    pub metadata: Vec<u8>,
    pub metadata_file: String,
}

/// A package under construction.
pub struct Package {
    config: CompilerConfig,
    modules: Vec<Module>,
    imports: Vec<ImportedPackage>,
    output: Option<PackageOutput>,
}

impl Package {
    pub fn new(config: CompilerConfig) -> Self {
        Self {
            config,
            modules: Vec::new(),
            imports: Vec::new(),
            output: None,
        }
    }

    pub fn config(&self) -> &CompilerConfig {
        &self.config
    }

    /// Add a parsed source module.
    ///
    /// # Errors
    ///
    /// Returns [`BuildError::AlreadyBuilt`] once the package is built; call
    /// [`Package::clear`] to start over.
    pub fn add_module(&mut self, module: Module) -> Result<(), BuildError> {
        if self.is_built() {
            return Err(BuildError::AlreadyBuilt);
        }
        self.modules.push(module);
        Ok(())
    }

    pub fn add_import(&mut self, package: ImportedPackage) -> Result<(), BuildError> {
        if self.is_built() {
            return Err(BuildError::AlreadyBuilt);
        }
        self.imports.push(package);
        Ok(())
    }

    /// Decode a metadata file and add it as an import.
    pub fn import_metadata(
        &mut self,
        name: impl Into<String>,
        header: impl Into<String>,
        bytes: &[u8],
    ) -> Result<(), BuildError> {
        let package = ImportedPackage::from_metadata(name, header, bytes)?;
        self.add_import(package)
    }

    pub fn is_built(&self) -> bool {
        self.output.is_some()
    }

    pub fn module_count(&self) -> usize {
        self.modules.len()
    }

    pub fn import_count(&self) -> usize {
        self.imports.len()
    }

    /// Build output (available after [`Package::build`]).
    pub fn output(&self) -> Option<&PackageOutput> {
        self.output.as_ref()
    }

    pub fn into_output(self) -> Option<PackageOutput> {
        self.output
    }

    /// Drop modules and output. Imports stay for the next build.
    pub fn clear(&mut self) {
        self.modules.clear();
        self.output = None;
    }

    /// Compile every module and generate the package artifacts.
    ///
    /// The first error aborts the build and leaves the package unbuilt.
    #[tracing::instrument(level = "info", skip_all, fields(package = ?self.config.package_name))]
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn build(&mut self) -> Result<(), BuildError> {
        if self.is_built() {
            return Err(BuildError::AlreadyBuilt);
        }
        if self.modules.is_empty() {
            return Err(BuildError::NoModules);
        }
        self.config.validate()?;
        let package_name = self.config.package_name()?.to_string();

        let locals = self.local_modules()?;
        let registry = self.registry(&locals)?;
        let compiled: Vec<ClassId> = locals
            .iter()
            .flat_map(|local| &local.classes)
            .filter_map(|class| registry.class_id(&class.qualified_name()))
            .collect();
        let declared: Vec<InterfaceId> = locals
            .iter()
            .flat_map(|local| &local.interfaces)
            .filter_map(|interface| registry.interface_id(&interface.qualified_name()))
            .collect();

        let modules = self.lower_modules(&registry)?;

        let types_header = types_header(
            &registry,
            &compiled,
            &package_name,
            &self.imported_namespaces(),
            &self.package_headers(),
        )?;
        let module_headers: Vec<&str> = modules.iter().map(|m| m.output.header.as_str()).collect();
        let all_header = all_header(&registry, &self.config.types_header, &module_headers);
        let definitions = definitions(&registry, &compiled, &self.config.all_header)?;

        let metadata_classes: Vec<Class> = compiled
            .iter()
            .map(|id| {
                let mut class = registry.class(*id).clone();
                qualify_for_metadata(&mut class, &registry, &package_name);
                class
            })
            .collect();
        let metadata_interfaces: Vec<InterfaceDef> = declared
            .iter()
            .map(|id| {
                let mut interface = registry.interface(*id).clone();
                qualify_interface_for_metadata(&mut interface, &registry, &package_name);
                interface
            })
            .collect();
        let metadata = write_package(&PackageMetadata::new(metadata_classes, metadata_interfaces))
            .map_err(|source| BuildError::Metadata {
                package: package_name.clone(),
                source,
            })?;

        info!(
            modules = modules.len(),
            classes = compiled.len(),
            interfaces = declared.len(),
            metadata_bytes = metadata.len(),
            "package built"
        );
        self.output = Some(PackageOutput {
            modules,
            types_header,
            all_header,
            definitions,
            metadata,
            metadata_file: self.config.metadata_file()?,
        });
        Ok(())
    }

    // === Build steps ===

    /// Each module's classes with Box/Unbox synthesized, checked for
    /// duplicate names across the package, and its interfaces.
    fn local_modules(&self) -> Result<Vec<LocalModule<'_>>, BuildError> {
        let mut seen: FxHashSet<String> = FxHashSet::default();
        let mut locals = Vec::with_capacity(self.modules.len());
        for module in &self.modules {
            let mut classes = Vec::with_capacity(module.classes.len());
            for class in &module.classes {
                let key = class_key(&class.qualified_name());
                if !seen.insert(key) {
                    return Err(BuildError::DuplicateClass {
                        name: class.qualified_name().to_string(),
                        path: module.path.clone(),
                    });
                }
                let mut class = class.clone();
                class
                    .synthesize_boxing()
                    .map_err(|source| compilation(&module.path, source))?;
                classes.push(class);
            }
            locals.push(LocalModule {
                module,
                classes,
                interfaces: module.interfaces.clone(),
            });
        }
        Ok(locals)
    }

    /// The registry lowering runs against.
    ///
    /// Local classes come first, then imported classes whose names are not
    /// taken; interfaces follow the same rule. A first registry is used to
    /// qualify local signatures from each module's point of view; the final
    /// one holds the qualified entries.
    fn registry(&self, locals: &[LocalModule<'_>]) -> Result<ClassRegistry, BuildError> {
        let draft = self.register(locals)?;

        let qualified: Vec<LocalModule<'_>> = locals
            .iter()
            .map(|local| {
                let resolver = Resolver::new(&draft, module_visibility(local.module));
                let mut local = local.clone();
                for class in &mut local.classes {
                    qualify_visible(class, &resolver);
                }
                for interface in &mut local.interfaces {
                    qualify_interface_visible(interface, &resolver);
                }
                local
            })
            .collect();

        self.register(&qualified)
    }

    fn register(&self, locals: &[LocalModule<'_>]) -> Result<ClassRegistry, BuildError> {
        let mut registry = ClassRegistry::new();

        let mut taken: FxHashSet<String> = FxHashSet::default();
        for local in locals {
            for class in &local.classes {
                taken.insert(class_key(&class.qualified_name()));
                registry
                    .register_class(class.clone())
                    .map_err(|source| compilation(&local.module.path, source))?;
            }
        }
        for package in &self.imports {
            for class in &package.classes {
                if !taken.insert(class_key(&class.qualified_name())) {
                    debug!(class = %class.qualified_name(), package = %package.name, "shadowed import");
                    continue;
                }
                registry
                    .register_class(class.clone())
                    .map_err(|source| compilation(Path::new(&package.name), source))?;
            }
        }

        let mut taken: FxHashSet<String> = FxHashSet::default();
        for local in locals {
            for interface in &local.interfaces {
                taken.insert(class_key(&interface.qualified_name()));
                registry
                    .register_interface(interface.clone())
                    .map_err(|source| compilation(&local.module.path, source))?;
            }
        }
        for package in &self.imports {
            for interface in &package.interfaces {
                if !taken.insert(class_key(&interface.qualified_name())) {
                    debug!(
                        interface = %interface.qualified_name(),
                        package = %package.name,
                        "shadowed import"
                    );
                    continue;
                }
                registry
                    .register_interface(interface.clone())
                    .map_err(|source| compilation(Path::new(&package.name), source))?;
            }
        }
        Ok(registry)
    }

    fn lower_modules(&self, registry: &ClassRegistry) -> Result<Vec<ModuleArtifact>, BuildError> {
        let headers = ModuleHeaders {
            types_header: &self.config.types_header,
            all_header: &self.config.all_header,
        };
        let lower = |module: &Module| {
            compile_module(registry, module, headers)
                .map(|output| ModuleArtifact {
                    source_file: source_file(&module.path),
                    output,
                })
                .map_err(|source| compilation(&module.path, source))
        };

        if !self.config.parallel {
            return self.modules.iter().map(lower).collect();
        }
        match self.config.threads {
            Some(threads) => {
                let pool = rayon::ThreadPoolBuilder::new().num_threads(threads).build()?;
                pool.install(|| self.modules.par_iter().map(lower).collect())
            }
            None => self.modules.par_iter().map(lower).collect(),
        }
    }

    /// Every imported namespace across modules, without repeats.
    fn imported_namespaces(&self) -> Vec<String> {
        let mut namespaces: Vec<String> = Vec::new();
        for namespace in self.modules.iter().flat_map(|m| &m.imported_namespaces) {
            if !namespaces.iter().any(|ns| ns.eq_ignore_ascii_case(namespace)) {
                namespaces.push(namespace.clone());
            }
        }
        namespaces
    }

    /// Namespace to types header, for every imported package.
    fn package_headers(&self) -> FxHashMap<String, String> {
        let mut headers = FxHashMap::default();
        for package in &self.imports {
            for namespace in package.namespaces() {
                headers
                    .entry(namespace.to_string())
                    .or_insert_with(|| package.header.clone());
            }
        }
        headers
    }
}

/// A module's entries as they go into the registry.
#[derive(Clone)]
struct LocalModule<'m> {
    module: &'m Module,
    classes: Vec<Class>,
    interfaces: Vec<InterfaceDef>,
}

/// Case-insensitive `"NS Name"` key.
fn class_key(name: &QualifiedName) -> String {
    name.key().to_ascii_lowercase()
}

fn module_visibility(module: &Module) -> Visibility {
    Visibility::new(module.namespace(), module.imported_namespaces.clone())
}

fn source_file(path: &Path) -> PathBuf {
    let mut file = path.as_os_str().to_owned();
    file.push(".c");
    PathBuf::from(file)
}

fn compilation(path: &Path, source: CompilationError) -> BuildError {
    BuildError::Compilation {
        path: path.to_path_buf(),
        source,
    }
}

/// Errors that can occur during a package build.
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("no modules added to package")]
    NoModules,

    #[error("package has already been built")]
    AlreadyBuilt,

    #[error("metadata of package {package}: {source}")]
    Metadata {
        package: String,
        #[source]
        source: MetadataError,
    },

    #[error("{}: {source}", .path.display())]
    Compilation {
        path: PathBuf,
        #[source]
        source: CompilationError,
    },

    #[error("class {name} is defined twice (again in {})", .path.display())]
    DuplicateClass { name: String, path: PathBuf },

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Output(#[from] OutputError),

    #[error("failed to start worker threads: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

impl BuildError {
    /// The underlying compilation error, if the build failed in lowering
    /// or artifact generation.
    pub fn compilation_error(&self) -> Option<&CompilationError> {
        match self {
            BuildError::Compilation { source, .. } => Some(source),
            BuildError::Output(OutputError::Compilation(source)) => Some(source),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dim_core::{ClassType, Field, Method, Stmt, ValueKind};

    fn point_module() -> Module {
        Module::new("geo/point.dim").with_class(
            Class::new("Geo", "Point", 1)
                .with_instance_field(Field::new("x", ValueKind::Int, 2))
                .with_method(Method::new("Reset", vec![], None, Stmt::empty(4), 3)),
        )
    }

    fn std_package() -> ImportedPackage {
        ImportedPackage::new(
            "STD",
            "std_types.h",
            vec![Class::new("STD", "Any", 0).with_instance_field(Field::new("value", ValueKind::Inst, 0))],
        )
    }

    fn package() -> Package {
        let mut package = Package::new(CompilerConfig::new("Geo").with_parallel(false));
        package.add_import(std_package()).unwrap();
        package
    }

    #[test]
    fn create_empty_package() {
        let package = package();
        assert!(!package.is_built());
        assert_eq!(package.module_count(), 0);
    }

    #[test]
    fn build_fails_with_no_modules() {
        let mut package = package();
        assert!(matches!(package.build(), Err(BuildError::NoModules)));
    }

    #[test]
    fn build_requires_package_name() {
        let mut package = Package::new(CompilerConfig::default());
        package.add_module(point_module()).unwrap();
        assert!(matches!(
            package.build(),
            Err(BuildError::Config(ConfigError::MissingPackageName))
        ));
        assert!(!package.is_built());
    }

    #[test]
    fn cannot_add_after_build() {
        let mut package = package();
        package.add_module(point_module()).unwrap();
        package.build().unwrap();

        assert!(matches!(
            package.add_module(Module::new("late.dim")),
            Err(BuildError::AlreadyBuilt)
        ));
        assert!(matches!(package.build(), Err(BuildError::AlreadyBuilt)));
    }

    #[test]
    fn can_rebuild_after_clear() {
        let mut package = package();
        package.add_module(point_module()).unwrap();
        package.build().unwrap();

        package.clear();
        assert!(!package.is_built());
        assert_eq!(package.module_count(), 0);
        assert_eq!(package.import_count(), 1);

        package.add_module(point_module()).unwrap();
        package.build().unwrap();
        assert!(package.is_built());
    }

    #[test]
    fn artifacts_are_named_after_the_module() {
        let mut package = package();
        package.add_module(point_module()).unwrap();
        package.build().unwrap();

        let output = package.output().unwrap();
        assert_eq!(output.modules[0].source_file, PathBuf::from("geo/point.dim.c"));
        assert!(output.modules[0].output.header.starts_with("#pragma once\n#include \"all_types.h\"\n"));
        assert!(output.all_header.contains("extern Method Geo_Point_methods[];"));
        assert_eq!(output.metadata_file, "Geo.bin");
    }

    #[test]
    fn duplicate_class_names_ignore_case() {
        let mut package = package();
        package.add_module(point_module()).unwrap();
        package
            .add_module(Module::new("geo/other.dim").with_class(Class::new("geo", "point", 1)))
            .unwrap();
        match package.build() {
            Err(BuildError::DuplicateClass { name, path }) => {
                assert_eq!(name, "geo::point");
                assert_eq!(path, PathBuf::from("geo/other.dim"));
            }
            other => panic!("expected duplicate class, got {other:?}"),
        }
    }

    #[test]
    fn local_class_shadows_import() {
        let imported = ImportedPackage::new(
            "Geo",
            "geo_old.h",
            vec![Class::new("Geo", "Point", 0).with_instance_field(Field::new("y", ValueKind::Int, 0))],
        );
        let mut package = package();
        package.add_module(point_module()).unwrap();
        package.add_import(imported).unwrap();
        package.build().unwrap();

        let output = package.output().unwrap();
        assert!(output.types_header.contains("int32_t f_0; // Geo::Point.x"));
        assert!(!output.types_header.contains("Geo::Point.y"));
    }

    #[test]
    fn lowering_errors_name_the_module() {
        let broken = Module::new("geo/broken.dim").with_class(
            Class::new("Geo", "Broken", 1)
                .with_instance_field(Field::new("ghost", ClassType::unqualified("Ghost"), 2)),
        );
        let mut package = package();
        package.add_module(broken).unwrap();
        let err = package.build().unwrap_err();
        assert!(matches!(
            err.compilation_error(),
            Some(CompilationError::UnknownType { name, .. }) if name == "Ghost"
        ));
    }

    #[test]
    fn bad_metadata_names_the_package() {
        match ImportedPackage::from_metadata("Draw", "draw.h", &[1, 0]) {
            Err(BuildError::Metadata { package, source }) => {
                assert_eq!(package, "Draw");
                assert!(matches!(source, MetadataError::UnexpectedEof { offset: 0 }));
            }
            other => panic!("expected metadata error, got {other:?}"),
        }
    }

    #[test]
    fn import_namespaces_map_to_package_header() {
        let imported = ImportedPackage::new(
            "Draw",
            "draw_types.h",
            vec![Class::new("Draw", "Canvas", 0), Class::new("Ink", "Pen", 0)],
        );
        let mut package = package();
        package.add_import(imported).unwrap();
        let headers = package.package_headers();
        assert_eq!(headers["Draw"], "draw_types.h");
        assert_eq!(headers["Ink"], "draw_types.h");
    }
}
