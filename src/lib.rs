//! OCDS Export
//!
//! Turns procurement tenders, as stored internally, into Open Contracting
//! Data Standard releases, records and packages.
//!
//! ## Features
//!
//! - **Schema-driven export**: raw documents are projected onto per-entity
//!   allow-lists, recursing through nested entities and lists
//! - **Composable variants**: OCDS 1.0, an extended profile and OCDS 1.1 are
//!   derived from one base by copy-and-override, never by mutation
//! - **Release sequencing**: a tender's patch history is replayed into a
//!   chain of snapshots, each tagged from a diff against its predecessor
//! - **Records and packages**: release chains compile into records and are
//!   wrapped with publisher metadata
//!
//! ## Pipeline
//!
//! ```text
//! raw tender ──► Exporter ──► build_release / sequence_releases
//!                                   │
//!                                   ▼
//!                         Record (RecordCompiler)
//!                                   │
//!                                   ▼
//!                    ReleasePackage / RecordPackage
//! ```

pub mod checksum;
pub mod config;
pub mod error;
pub mod exporter;
pub mod model;
pub mod package;
pub mod patch;
pub mod record;
pub mod release;
pub mod schemas;
pub mod version;

pub use checksum::Checksum;
pub use config::{ExportConfig, PackageConfig, PackageMode, Publisher};
pub use error::{ExportError, Result};
pub use exporter::{export, Exporter};
pub use model::{
    CallbackRegistry, ComputedField, ContainerShape, ExportSchema, ExportType, FieldDef, FieldSpec,
    FieldTypeRegistry, TypeCatalog,
};
pub use package::{build_package, package_records, package_releases, RecordPackage, ReleasePackage};
pub use patch::{apply_patch, diff, Patch, PatchError, PatchOp};
pub use record::{build_record, MergeCompiler, Record, RecordCompiler};
pub use release::{build_release, sequence_releases, Release, Tag, TagRules, TagSet};
pub use schemas::SchemaVariant;
pub use version::StandardVersion;
