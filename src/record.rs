//! Records: a tender's full release history plus its compiled state

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{ExportError, Result};
use crate::model::ExportSchema;
use crate::release::{sequence_releases, Release, Tag};

/// Merges an ordered release sequence into one current-state document
///
/// Implementations must be deterministic and leave their input untouched.
pub trait RecordCompiler {
    fn compile(&self, releases: &[Release]) -> Result<Value>;
}

/// Default compiler: later releases win, entity lists merge by `id`
#[derive(Debug, Clone, Copy, Default)]
pub struct MergeCompiler;

impl RecordCompiler for MergeCompiler {
    fn compile(&self, releases: &[Release]) -> Result<Value> {
        let mut compiled = Value::Object(Map::new());
        for release in releases {
            merge_into(&mut compiled, &Value::Object(release.document().clone()));
        }

        if let Value::Object(map) = &mut compiled {
            if let Some(ocid) = releases.first().and_then(Release::ocid) {
                map.insert("id".to_string(), Value::from(format!("{}-compiled", ocid)));
            }
            map.insert("tag".to_string(), Value::from(vec![Tag::Compiled.as_str()]));
        }
        Ok(compiled)
    }
}

fn merge_into(target: &mut Value, update: &Value) {
    match (target, update) {
        (Value::Object(target), Value::Object(update)) => {
            for (key, value) in update {
                match target.get_mut(key) {
                    Some(existing) => merge_into(existing, value),
                    None => {
                        target.insert(key.clone(), value.clone());
                    }
                }
            }
        }
        (Value::Array(target), Value::Array(update)) => {
            if !(is_identified(target) && is_identified(update)) {
                *target = update.clone();
                return;
            }
            for item in update {
                match target.iter_mut().find(|t| t.get("id") == item.get("id")) {
                    Some(existing) => merge_into(existing, item),
                    None => target.push(item.clone()),
                }
            }
        }
        (target, update) => *target = update.clone(),
    }
}

/// Every element is an object carrying an `id`
fn is_identified(items: &[Value]) -> bool {
    items.iter().all(|item| item.get("id").is_some())
}

/// Release history and compiled state of one tender
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Record {
    pub releases: Vec<Release>,
    pub compiled_release: Value,
    pub ocid: String,
}

impl Record {
    /// Compile an already-built release sequence
    pub fn from_releases(releases: Vec<Release>, compiler: &dyn RecordCompiler) -> Result<Self> {
        let ocid = releases
            .first()
            .and_then(Release::ocid)
            .ok_or(ExportError::MissingOcid)?
            .to_string();
        let compiled_release = compiler.compile(&releases)?;
        Ok(Self {
            releases,
            compiled_release,
            ocid,
        })
    }
}

/// Sequence a patched tender's releases and compile them into a record
pub fn build_record(
    tender: Value,
    schema: &ExportSchema,
    prefix: &str,
    compiler: &dyn RecordCompiler,
) -> Result<Record> {
    let releases = sequence_releases(tender, schema, prefix)?;
    Record::from_releases(releases, compiler)
}
