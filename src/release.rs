//! Releases and release sequencing
//!
//! A release is one tagged snapshot of a tender. [`build_release`] exports a
//! single snapshot; [`sequence_releases`] replays a tender's patch history,
//! re-exporting after every patch and tagging each new snapshot by diffing it
//! against the previous one.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

use crate::error::{ExportError, Result};
use crate::exporter::Exporter;
use crate::model::ExportSchema;
use crate::patch::{apply_patch, diff, Patch, PatchOp};

/// Export type every release is rendered as
pub const RELEASE_TYPE: &str = "Release";

/// Raw key holding a tender's patch history
pub const PATCHES_KEY: &str = "patches";

/// Release classification labels
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Tag {
    Planning,
    PlanningUpdate,
    Tender,
    TenderAmendment,
    TenderUpdate,
    TenderCancellation,
    Award,
    AwardUpdate,
    AwardCancellation,
    Contract,
    ContractUpdate,
    ContractAmendment,
    Bid,
    BidUpdate,
    Implementation,
    ImplementationUpdate,
    ContractTermination,
    Compiled,
}

impl Tag {
    pub fn as_str(&self) -> &'static str {
        match self {
            Tag::Planning => "planning",
            Tag::PlanningUpdate => "planningUpdate",
            Tag::Tender => "tender",
            Tag::TenderAmendment => "tenderAmendment",
            Tag::TenderUpdate => "tenderUpdate",
            Tag::TenderCancellation => "tenderCancellation",
            Tag::Award => "award",
            Tag::AwardUpdate => "awardUpdate",
            Tag::AwardCancellation => "awardCancellation",
            Tag::Contract => "contract",
            Tag::ContractUpdate => "contractUpdate",
            Tag::ContractAmendment => "contractAmendment",
            Tag::Bid => "bid",
            Tag::BidUpdate => "bidUpdate",
            Tag::Implementation => "implementation",
            Tag::ImplementationUpdate => "implementationUpdate",
            Tag::ContractTermination => "contractTermination",
            Tag::Compiled => "compiled",
        }
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Deduplicated set of tags, serialised as an array
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TagSet(BTreeSet<Tag>);

impl TagSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, tag: Tag) -> bool {
        self.0.insert(tag)
    }

    pub fn contains(&self, tag: Tag) -> bool {
        self.0.contains(&tag)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = Tag> + '_ {
        self.0.iter().copied()
    }
}

impl FromIterator<Tag> for TagSet {
    fn from_iter<I: IntoIterator<Item = Tag>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Tags contributed by diff operations under one path segment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagRule {
    /// Substring matched against operation paths (and top-level release keys)
    pub segment: String,
    /// Tag for additions
    pub on_add: Option<Tag>,
    /// Tag for replacements and removals
    pub on_change: Option<Tag>,
}

impl TagRule {
    pub fn new(segment: impl Into<String>, on_add: Option<Tag>, on_change: Option<Tag>) -> Self {
        Self {
            segment: segment.into(),
            on_add,
            on_change,
        }
    }
}

/// Table driving release tagging
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagRules {
    /// Paths never tagged
    pub skip_paths: Vec<String>,
    pub rules: Vec<TagRule>,
    /// Tag always present on a first release
    pub initial: Tag,
    /// Tag for a replacement or removal no rule matches
    pub fallback_change: Option<Tag>,
}

impl Default for TagRules {
    fn default() -> Self {
        Self {
            skip_paths: vec!["/tag".to_string(), "/id".to_string()],
            rules: vec![
                TagRule::new("awards", Some(Tag::Award), Some(Tag::AwardUpdate)),
                TagRule::new("contracts", Some(Tag::Contract), Some(Tag::ContractUpdate)),
                TagRule::new("bids", Some(Tag::Bid), None),
            ],
            initial: Tag::Tender,
            fallback_change: Some(Tag::TenderUpdate),
        }
    }
}

impl TagRules {
    /// Set the change tag for rules matching `segment`
    pub fn with_change_tag(mut self, segment: &str, tag: Option<Tag>) -> Self {
        for rule in self.rules.iter_mut().filter(|r| r.segment == segment) {
            rule.on_change = tag;
        }
        self
    }

    /// Tag bid replacements and removals as `bidUpdate`
    pub fn with_bid_updates(self) -> Self {
        self.with_change_tag("bids", Some(Tag::BidUpdate))
    }

    /// Tags of a first release: the initial tag plus one per present section
    pub fn initial_tags(&self, document: &Map<String, Value>) -> TagSet {
        let mut tags = TagSet::new();
        tags.insert(self.initial);
        for rule in &self.rules {
            if let Some(tag) = rule.on_add {
                if document.contains_key(&rule.segment) {
                    tags.insert(tag);
                }
            }
        }
        tags
    }

    /// Tags describing a diff between consecutive releases
    pub fn classify(&self, ops: &[PatchOp]) -> TagSet {
        let mut tags = TagSet::new();
        for op in ops {
            let path = op.path();
            if self.skip_paths.iter().any(|skip| skip == path) {
                continue;
            }

            let mut matched = false;
            for rule in self.rules.iter().filter(|r| path.contains(r.segment.as_str())) {
                matched = true;
                let tag = if op.is_add() { rule.on_add } else { rule.on_change };
                if let Some(tag) = tag {
                    tags.insert(tag);
                }
            }

            if !matched && !op.is_add() {
                if let Some(tag) = self.fallback_change {
                    tags.insert(tag);
                }
            }
        }
        tags
    }
}

/// One tagged snapshot of a tender
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Release {
    #[serde(flatten)]
    document: Map<String, Value>,
    tag: TagSet,
}

impl Release {
    pub fn new(document: Map<String, Value>, tag: TagSet) -> Self {
        Self { document, tag }
    }

    pub fn ocid(&self) -> Option<&str> {
        self.document.get("ocid").and_then(Value::as_str)
    }

    pub fn id(&self) -> Option<&str> {
        self.document.get("id").and_then(Value::as_str)
    }

    pub fn date(&self) -> Option<&str> {
        self.document.get("date").and_then(Value::as_str)
    }

    pub fn tags(&self) -> &TagSet {
        &self.tag
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.document.get(field)
    }

    /// Exported document, without the tag
    pub fn document(&self) -> &Map<String, Value> {
        &self.document
    }

    /// Exported document with the tag array
    pub fn to_value(&self) -> Value {
        let mut value = self.document.clone();
        value.insert(
            "tag".to_string(),
            Value::Array(self.tag.iter().map(|t| Value::from(t.as_str())).collect()),
        );
        Value::Object(value)
    }
}

/// Export a single release of `tender`
pub fn build_release(tender: &Value, schema: &ExportSchema, prefix: &str) -> Result<Release> {
    let document = Exporter::new(schema)
        .with_prefix(Some(prefix))
        .export_object(tender, RELEASE_TYPE)?;
    if !document.contains_key("ocid") {
        return Err(ExportError::MissingSourceId {
            key: schema.source_id_key.clone(),
        });
    }
    let tag = schema.tag_rules.initial_tags(&document);
    Ok(Release::new(document, tag))
}

/// Replay a tender's patch history into an ordered release sequence
///
/// The tender must carry a `patches` list. The first release is exported
/// with `prefix`; every later one is a fresh export of the patched tender
/// carrying the first release's ocid. A patch whose export matches the
/// previous release emits nothing.
pub fn sequence_releases(
    mut tender: Value,
    schema: &ExportSchema,
    prefix: &str,
) -> Result<Vec<Release>> {
    let patches = take_patches(&mut tender)?;

    let first = build_release(&tender, schema, prefix)?;
    let ocid = first.document.get("ocid").cloned();
    let mut previous = first.document.clone();
    let mut releases = vec![first];

    for (index, patch) in patches.iter().enumerate() {
        apply_patch(&mut tender, patch)
            .map_err(|source| ExportError::PatchApply { index, source })?;

        let mut next = Exporter::new(schema).export_object(&tender, RELEASE_TYPE)?;
        if let Some(ocid) = &ocid {
            next.insert("ocid".to_string(), ocid.clone());
        }

        if same_content(&previous, &next) {
            debug!(patch = index, "patch leaves exported release unchanged, skipping");
            continue;
        }

        let ops = diff(&Value::Object(previous), &Value::Object(next.clone()));
        let tag = schema.tag_rules.classify(&ops);
        debug!(patch = index, ops = ops.len(), tags = tag.len(), "new release");

        previous = next.clone();
        releases.push(Release::new(next, tag));
    }

    Ok(releases)
}

/// Remove and decode the patch list of `tender`
pub fn take_patches(tender: &mut Value) -> Result<Vec<Patch>> {
    let patches = tender
        .as_object_mut()
        .and_then(|map| map.remove(PATCHES_KEY))
        .ok_or(ExportError::PatchPrecondition)?;
    serde_json::from_value(patches).map_err(ExportError::InvalidPatch)
}

/// Whether a raw tender carries a patch history
pub fn has_patches(tender: &Value) -> bool {
    tender.get(PATCHES_KEY).is_some()
}

/// Equality ignoring the bookkeeping fields `id` and `tag`
fn same_content(a: &Map<String, Value>, b: &Map<String, Value>) -> bool {
    let content = |map: &Map<String, Value>| {
        map.iter()
            .filter(|(key, _)| key.as_str() != "id" && key.as_str() != "tag")
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect::<Map<String, Value>>()
    };
    content(a) == content(b)
}
