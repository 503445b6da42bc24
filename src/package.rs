//! Release and record packages
//!
//! A package wraps releases or records with publication metadata. The batch
//! drivers here own the per-document failure policy: a tender that cannot be
//! exported is logged and skipped, the rest of the batch carries on.

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::config::{PackageConfig, Publisher};
use crate::error::Result;
use crate::model::ExportSchema;
use crate::record::{build_record, Record, RecordCompiler};
use crate::release::{build_release, has_patches, sequence_releases, Release};
use crate::version::StandardVersion;

/// Publication metadata shared by release and record packages
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PackageShell {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uri: Option<String>,
    pub version: String,
    pub published_date: String,
    pub publisher: Publisher,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub license: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub publication_policy: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReleasePackage {
    #[serde(flatten)]
    pub shell: PackageShell,
    pub releases: Vec<Release>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordPackage {
    #[serde(flatten)]
    pub shell: PackageShell,
    pub records: Vec<Record>,
}

/// Empty package shell for `config`, stamped now
pub fn build_package(config: &PackageConfig, version: &StandardVersion) -> PackageShell {
    PackageShell {
        uri: config.uri.clone(),
        version: version.package_version(),
        published_date: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
        publisher: config.publisher.clone(),
        license: config.license.clone(),
        publication_policy: config.publication_policy.clone(),
    }
}

/// Null or `{}` documents carry nothing to export
fn is_empty(tender: &Value) -> bool {
    match tender {
        Value::Null => true,
        Value::Object(map) => map.is_empty(),
        _ => false,
    }
}

/// Releases of one tender: its patch history if it has one, else a single release
pub fn tender_releases(tender: Value, schema: &ExportSchema, prefix: &str) -> Result<Vec<Release>> {
    if has_patches(&tender) {
        sequence_releases(tender, schema, prefix)
    } else {
        build_release(&tender, schema, prefix).map(|release| vec![release])
    }
}

/// Package every exportable tender's releases
pub fn package_releases<I>(
    tenders: I,
    schema: &ExportSchema,
    config: &PackageConfig,
) -> ReleasePackage
where
    I: IntoIterator<Item = Value>,
{
    let shell = build_package(config, &schema.version);
    let mut releases = Vec::new();
    let mut skipped = 0usize;

    for (index, tender) in tenders.into_iter().enumerate() {
        if is_empty(&tender) {
            debug!(index, "skipping empty tender");
            continue;
        }
        match tender_releases(tender, schema, &config.prefix) {
            Ok(mut batch) => releases.append(&mut batch),
            Err(e) => {
                warn!(index, error = %e, "failed to export tender, skipping");
                skipped += 1;
            }
        }
    }

    info!(releases = releases.len(), skipped, "release package built");
    ReleasePackage { shell, releases }
}

/// Package one record per exportable tender
pub fn package_records<I>(
    tenders: I,
    schema: &ExportSchema,
    config: &PackageConfig,
    compiler: &dyn RecordCompiler,
) -> RecordPackage
where
    I: IntoIterator<Item = Value>,
{
    let shell = build_package(config, &schema.version);
    let mut records = Vec::new();
    let mut skipped = 0usize;

    for (index, tender) in tenders.into_iter().enumerate() {
        if is_empty(&tender) {
            debug!(index, "skipping empty tender");
            continue;
        }
        let record = if has_patches(&tender) {
            build_record(tender, schema, &config.prefix, compiler)
        } else {
            build_release(&tender, schema, &config.prefix)
                .and_then(|release| Record::from_releases(vec![release], compiler))
        };
        match record {
            Ok(record) => records.push(record),
            Err(e) => {
                warn!(index, error = %e, "failed to build record, skipping");
                skipped += 1;
            }
        }
    }

    info!(records = records.len(), skipped, "record package built");
    RecordPackage { shell, records }
}
