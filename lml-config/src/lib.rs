//! Shared configuration loader for the LML toolchain.
//!
//! `defaults/lml.default.toml` is embedded into every binary so that docs and
//! runtime behavior stay in sync. Applications layer user-specific files on top
//! of those defaults via [`Loader`] before deserializing into [`LmlConfig`].

use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError, File, FileFormat, ValueKind};
use lml_babel::ImportOptions;
use lml_core::SerializeOptions;
use serde::Deserialize;
use std::path::Path;

const DEFAULT_TOML: &str = include_str!("../defaults/lml.default.toml");

/// Top-level configuration consumed by LML applications.
#[derive(Debug, Clone, Deserialize)]
pub struct LmlConfig {
    pub serialize: SerializeConfig,
    pub import: ImportConfig,
    pub convert: ConvertConfig,
}

/// Mirrors the knobs exposed by the canonical serializer.
#[derive(Debug, Clone, Deserialize)]
pub struct SerializeConfig {
    pub compact_paragraph_limit: usize,
    pub blank_lines_between: usize,
}

impl From<SerializeConfig> for SerializeOptions {
    fn from(config: SerializeConfig) -> Self {
        SerializeOptions {
            compact_paragraph_limit: config.compact_paragraph_limit,
            blank_lines_between: config.blank_lines_between,
        }
    }
}

impl From<&SerializeConfig> for SerializeOptions {
    fn from(config: &SerializeConfig) -> Self {
        SerializeOptions {
            compact_paragraph_limit: config.compact_paragraph_limit,
            blank_lines_between: config.blank_lines_between,
        }
    }
}

/// Mirrors the knobs exposed by the LaTeX importer.
#[derive(Debug, Clone, Deserialize)]
pub struct ImportConfig {
    pub preserve_labels: bool,
    pub parse_inline_math: bool,
    pub strict_mode: bool,
}

impl From<ImportConfig> for ImportOptions {
    fn from(config: ImportConfig) -> Self {
        ImportOptions {
            preserve_labels: config.preserve_labels,
            parse_inline_math: config.parse_inline_math,
            strict_mode: config.strict_mode,
        }
    }
}

impl From<&ImportConfig> for ImportOptions {
    fn from(config: &ImportConfig) -> Self {
        ImportOptions {
            preserve_labels: config.preserve_labels,
            parse_inline_math: config.parse_inline_math,
            strict_mode: config.strict_mode,
        }
    }
}

/// Conversion defaults used by the CLI.
#[derive(Debug, Clone, Deserialize)]
pub struct ConvertConfig {
    pub default_format: String,
}

/// Helper for layering user overrides over the built-in defaults.
#[derive(Debug, Clone)]
pub struct Loader {
    builder: ConfigBuilder<DefaultState>,
}

impl Loader {
    /// Start a loader seeded with the embedded defaults.
    pub fn new() -> Self {
        let builder = Config::builder().add_source(File::from_str(DEFAULT_TOML, FileFormat::Toml));
        Self { builder }
    }

    /// Layer a configuration file. Missing files trigger an error.
    pub fn with_file(mut self, path: impl AsRef<Path>) -> Self {
        let source = File::from(path.as_ref())
            .format(FileFormat::Toml)
            .required(true);
        self.builder = self.builder.add_source(source);
        self
    }

    /// Layer an optional configuration file (ignored if the file is absent).
    pub fn with_optional_file(mut self, path: impl AsRef<Path>) -> Self {
        let source = File::from(path.as_ref())
            .format(FileFormat::Toml)
            .required(false);
        self.builder = self.builder.add_source(source);
        self
    }

    /// Apply a single key/value override (useful for CLI settings).
    pub fn set_override<I>(mut self, key: &str, value: I) -> Result<Self, ConfigError>
    where
        I: Into<ValueKind>,
    {
        self.builder = self.builder.set_override(key, value)?;
        Ok(self)
    }

    /// Finalize the builder and deserialize the resulting configuration.
    pub fn build(self) -> Result<LmlConfig, ConfigError> {
        self.builder.build()?.try_deserialize()
    }
}

impl Default for Loader {
    fn default() -> Self {
        Self::new()
    }
}

/// Convenience helper for callers that only need the defaults.
pub fn load_defaults() -> Result<LmlConfig, ConfigError> {
    Loader::new().build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loads_default_config() {
        let config = load_defaults().expect("defaults to deserialize");
        assert_eq!(config.serialize.compact_paragraph_limit, 80);
        assert!(config.import.preserve_labels);
        assert_eq!(config.convert.default_format, "lml");
    }

    #[test]
    fn supports_overrides() {
        let config = Loader::new()
            .set_override("import.strict_mode", true)
            .expect("override to apply")
            .build()
            .expect("config to build");
        assert!(config.import.strict_mode);
    }

    #[test]
    fn serialize_config_converts_to_serialize_options() {
        let config = load_defaults().expect("defaults to deserialize");
        let options: SerializeOptions = config.serialize.into();
        assert_eq!(options.compact_paragraph_limit, 80);
        assert_eq!(options.blank_lines_between, 1);
    }

    #[test]
    fn import_config_converts_to_import_options() {
        let config = load_defaults().expect("defaults to deserialize");
        let options: ImportOptions = (&config.import).into();
        assert!(options.parse_inline_math);
        assert!(!options.strict_mode);
    }
}
