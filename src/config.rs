//! Package build configuration.
//!
//! A [`CompilerConfig`] can be built in code with the `with_*` setters or
//! read from TOML. Omitted TOML keys keep their defaults:
//!
//! ```toml
//! package_name = "Geo"
//! all_header = "all.h"
//! types_header = "all_types.h"
//! parallel = true
//! threads = 4
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while loading or validating a [`CompilerConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to parse compiler config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("a package name is required")]
    MissingPackageName,

    #[error("thread count must be at least 1")]
    ZeroThreads,
}

/// Settings for one package build.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompilerConfig {
    /// Names the types header guard and the metadata file.
    pub package_name: Option<String>,
    /// Aggregate header included by every module source.
    pub all_header: String,
    /// Struct header included by every module header.
    pub types_header: String,
    /// Lower modules on worker threads.
    pub parallel: bool,
    /// Size of a dedicated thread pool. `None` uses rayon's global pool.
    pub threads: Option<usize>,
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self {
            package_name: None,
            all_header: "all.h".to_string(),
            types_header: "all_types.h".to_string(),
            parallel: true,
            threads: None,
        }
    }
}

impl CompilerConfig {
    pub fn new(package_name: impl Into<String>) -> Self {
        Self::default().with_package_name(package_name)
    }

    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    pub fn with_package_name(mut self, name: impl Into<String>) -> Self {
        self.package_name = Some(name.into());
        self
    }

    pub fn with_all_header(mut self, name: impl Into<String>) -> Self {
        self.all_header = name.into();
        self
    }

    pub fn with_types_header(mut self, name: impl Into<String>) -> Self {
        self.types_header = name.into();
        self
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = Some(threads);
        self
    }

    /// The package name, which every build needs.
    pub fn package_name(&self) -> Result<&str, ConfigError> {
        self.package_name
            .as_deref()
            .filter(|name| !name.trim().is_empty())
            .ok_or(ConfigError::MissingPackageName)
    }

    /// File name of the package metadata (`<package>.bin`).
    pub fn metadata_file(&self) -> Result<String, ConfigError> {
        Ok(format!("{}.bin", self.package_name()?))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.threads == Some(0) {
            return Err(ConfigError::ZeroThreads);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = CompilerConfig::default();
        assert_eq!(config.all_header, "all.h");
        assert_eq!(config.types_header, "all_types.h");
        assert!(config.parallel);
        assert!(config.threads.is_none());
        assert!(matches!(config.package_name(), Err(ConfigError::MissingPackageName)));
    }

    #[test]
    fn toml_overrides_only_given_keys() {
        let config = CompilerConfig::from_toml_str("package_name = \"Geo\"\nthreads = 2\n").unwrap();
        assert_eq!(config.package_name().unwrap(), "Geo");
        assert_eq!(config.threads, Some(2));
        assert_eq!(config.types_header, "all_types.h");
        assert_eq!(config.metadata_file().unwrap(), "Geo.bin");
    }

    #[test]
    fn empty_toml_is_default() {
        assert_eq!(CompilerConfig::from_toml_str("").unwrap(), CompilerConfig::default());
    }

    #[test]
    fn zero_threads_rejected() {
        assert!(matches!(
            CompilerConfig::from_toml_str("threads = 0"),
            Err(ConfigError::ZeroThreads)
        ));
    }

    #[test]
    fn malformed_toml() {
        match CompilerConfig::from_toml_str("parallel = \"yes\"") {
            Err(ConfigError::Parse(_)) => {}
            other => panic!("expected parse error, got {other:?}"),
        }
    }

    #[test]
    fn blank_package_name_is_missing() {
        let config = CompilerConfig::new("  ");
        assert!(matches!(config.package_name(), Err(ConfigError::MissingPackageName)));
    }

    #[test]
    fn serializes_back_to_toml() {
        let config = CompilerConfig::new("Geo").with_parallel(false).with_all_header("geo.h");
        let text = toml::to_string(&config).unwrap();
        assert_eq!(CompilerConfig::from_toml_str(&text).unwrap(), config);
    }
}
