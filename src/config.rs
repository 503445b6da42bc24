//! Configuration management for the exporter
//!
//! Supports loading configuration from:
//! - Default values
//! - Config file (ocds-export.toml)
//! - Environment variables (OCDS__*)
//!
//! ## Example config file (ocds-export.toml):
//! ```toml
//! [release]
//! prefix = "ocds-be6bcu"
//! uri = "https://example.org/packages"
//! license = "https://creativecommons.org/licenses/by/4.0/"
//! publication_policy = "https://example.org/policy"
//!
//! [release.publisher]
//! name = "Open Procurement"
//! scheme = "UA-EDR"
//! uid = "00000000"
//!
//! [export]
//! variant = "ocds_1_1"
//! mode = "records"
//! batch_size = 5000
//!
//! [output]
//! path = "./packages"
//! format = "compact"
//! ```

use config_crate::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::Result;
use crate::schemas::SchemaVariant;

/// Main configuration for the exporter
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExportConfig {
    /// Package metadata
    #[serde(default)]
    pub release: PackageConfig,

    /// Export settings
    #[serde(default)]
    pub export: ExportSettings,

    /// Output settings
    #[serde(default)]
    pub output: OutputConfig,
}

/// Metadata attached to every published package
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PackageConfig {
    /// OCID prefix assigned to the publisher
    #[serde(default = "default_prefix")]
    pub prefix: String,

    /// Base URI of published packages
    #[serde(default)]
    pub uri: Option<String>,

    #[serde(default)]
    pub publisher: Publisher,

    #[serde(default)]
    pub license: Option<String>,

    #[serde(default)]
    pub publication_policy: Option<String>,
}

/// Publishing organization
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Publisher {
    #[serde(default)]
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scheme: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uid: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uri: Option<String>,
}

/// What gets exported
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportSettings {
    #[serde(default)]
    pub variant: SchemaVariant,

    #[serde(default)]
    pub mode: PackageMode,

    /// Tenders per written package
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
}

/// Release or record packages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PackageMode {
    #[default]
    Releases,
    Records,
}

/// Output configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Directory packages are written to
    #[serde(default = "default_output_path")]
    pub path: PathBuf,

    #[serde(default)]
    pub format: OutputFormat,
}

/// Output format for JSON
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Pretty,
    Compact,
}

// Default value functions
fn default_prefix() -> String {
    "ocds".to_string()
}

fn default_batch_size() -> usize {
    10_000
}

fn default_output_path() -> PathBuf {
    PathBuf::from("./packages")
}

impl Default for PackageConfig {
    fn default() -> Self {
        Self {
            prefix: default_prefix(),
            uri: None,
            publisher: Publisher::default(),
            license: None,
            publication_policy: None,
        }
    }
}

impl Default for ExportSettings {
    fn default() -> Self {
        Self {
            variant: SchemaVariant::default(),
            mode: PackageMode::default(),
            batch_size: default_batch_size(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            path: default_output_path(),
            format: OutputFormat::default(),
        }
    }
}

impl ExportConfig {
    /// Load configuration from default locations
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load configuration, layering a specific file over the defaults
    pub fn load_from(config_path: Option<&str>) -> Result<Self> {
        let mut builder = Config::builder();

        let config_locations = [
            "ocds-export.toml",
            ".ocds-export.toml",
            "config/ocds-export.toml",
        ];

        for location in config_locations {
            builder = builder.add_source(File::with_name(location).required(false));
        }

        // XDG config directory
        if let Some(config_dir) =
            directories::ProjectDirs::from("org", "openprocurement", "ocds-export")
        {
            let xdg_config = config_dir.config_dir().join("ocds-export.toml");
            if xdg_config.exists() {
                builder = builder.add_source(File::from(xdg_config).required(false));
            }
        }

        if let Some(path) = config_path {
            builder = builder.add_source(File::with_name(path).required(true));
        }

        // OCDS__RELEASE__PREFIX=... etc.
        builder = builder.add_source(
            Environment::with_prefix("OCDS")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );

        Ok(builder.build()?.try_deserialize()?)
    }

    /// Save configuration to a file
    pub fn save(&self, path: &str) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Output directory (resolves relative paths)
    pub fn output_path(&self) -> PathBuf {
        if self.output.path.is_absolute() {
            self.output.path.clone()
        } else {
            std::env::current_dir()
                .unwrap_or_default()
                .join(&self.output.path)
        }
    }
}
