// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Codec configuration.
//!
//! ```toml
//! [body]
//! max_body_size = 1048576
//! default_charset = "utf-8"
//!
//! [output]
//! pretty = false
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

use crate::codec::Codec;
use crate::ingress::BodyLimits;
use crate::registry::Registry;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CodecConfig {
    #[serde(default)]
    pub body: BodyConfig,

    #[serde(default)]
    pub output: OutputConfig,
}

/// Request body limits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BodyConfig {
    /// Largest body accepted, in bytes.
    #[serde(default = "default_max_body_size")]
    pub max_body_size: u64,

    /// Charset assumed when the content type does not name one.
    #[serde(default = "default_charset")]
    pub default_charset: String,
}

/// Serialized output settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Indent dumped JSON.
    #[serde(default)]
    pub pretty: bool,
}

fn default_max_body_size() -> u64 {
    1024 * 1024
}

fn default_charset() -> String {
    "utf-8".to_string()
}

impl Default for BodyConfig {
    fn default() -> Self {
        Self {
            max_body_size: default_max_body_size(),
            default_charset: default_charset(),
        }
    }
}

impl CodecConfig {
    /// Load configuration from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from TOML text.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.body.max_body_size == 0 {
            return Err(ConfigError::Invalid("max_body_size must be positive".into()));
        }
        if !crate::ingress::is_supported_charset(&self.body.default_charset) {
            return Err(ConfigError::Invalid(format!(
                "unsupported default charset {:?}",
                self.body.default_charset
            )));
        }
        Ok(())
    }

    /// Body limits for [`read_json_body`](crate::ingress::read_json_body).
    pub fn body_limits(&self) -> BodyLimits {
        self.body.clone().into()
    }

    /// Codec over `registry` with these output settings.
    pub fn codec<'r>(&self, registry: &'r Registry) -> Codec<'r> {
        Codec::new(registry).pretty(self.output.pretty)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn empty_toml_uses_defaults() {
        let config = CodecConfig::from_toml_str("").unwrap();
        assert_eq!(config, CodecConfig::default());
        assert_eq!(config.body.max_body_size, 1024 * 1024);
        assert_eq!(config.body.default_charset, "utf-8");
        assert!(!config.output.pretty);
    }

    #[test]
    fn parse_full_config() {
        let config = CodecConfig::from_toml_str(
            r#"
            [body]
            max_body_size = 4096
            default_charset = "us-ascii"

            [output]
            pretty = true
            "#,
        )
        .unwrap();
        assert_eq!(config.body.max_body_size, 4096);
        assert_eq!(config.body_limits().default_charset, "us-ascii");
        assert!(config.output.pretty);
    }

    #[test]
    fn invalid_values_rejected() {
        assert!(matches!(
            CodecConfig::from_toml_str("[body]\nmax_body_size = 0\n"),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            CodecConfig::from_toml_str("[body]\ndefault_charset = \"latin-1\"\n"),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            CodecConfig::from_toml_str("[body\n"),
            Err(ConfigError::Toml(_))
        ));
    }

    #[test]
    fn load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[output]\npretty = true").unwrap();
        let config = CodecConfig::from_file(file.path()).unwrap();
        assert!(config.output.pretty);
        assert_eq!(config.body, BodyConfig::default());
    }

    #[test]
    fn missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            CodecConfig::from_file(dir.path().join("absent.toml")),
            Err(ConfigError::Io(_))
        ));
    }
}
