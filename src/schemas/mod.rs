//! Concrete schema variants
//!
//! Each variant is built by deriving copies of the [`standard`] registries
//! and overriding entries; nothing is shared mutably between them.

pub mod extended;
pub mod helpers;
pub mod ocds_1_1;
pub mod standard;

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::model::ExportSchema;

pub use extended::extended;
pub use ocds_1_1::ocds_1_1;
pub use standard::standard;

/// Selectable schema variant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum SchemaVariant {
    #[default]
    Standard,
    Extended,
    #[serde(rename = "ocds_1_1")]
    #[value(name = "ocds_1_1")]
    Ocds11,
}

impl SchemaVariant {
    pub fn schema(&self) -> ExportSchema {
        match self {
            SchemaVariant::Standard => standard(),
            SchemaVariant::Extended => extended(),
            SchemaVariant::Ocds11 => ocds_1_1(),
        }
    }
}

impl fmt::Display for SchemaVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SchemaVariant::Standard => write!(f, "standard"),
            SchemaVariant::Extended => write!(f, "extended"),
            SchemaVariant::Ocds11 => write!(f, "ocds_1_1"),
        }
    }
}
