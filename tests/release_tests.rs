//! Release sequencing, record and package tests

use ocds_export::schemas::{extended, ocds_1_1, standard};
use ocds_export::{
    build_record, build_release, package_releases, sequence_releases, ExportError, MergeCompiler,
    PackageConfig, PatchError, Publisher, Release, Tag,
};
use serde_json::{json, Value};

const PREFIX: &str = "test";

fn tender() -> Value {
    serde_json::from_str(include_str!("fixtures/tender.json")).unwrap()
}

fn award() -> Value {
    serde_json::from_str(include_str!("fixtures/award.json")).unwrap()
}

fn contract() -> Value {
    serde_json::from_str(include_str!("fixtures/contract.json")).unwrap()
}

fn with_patches(mut tender: Value, patches: Value) -> Value {
    tender["patches"] = patches;
    tender
}

fn tags(release: &Release) -> Vec<&'static str> {
    release.tags().iter().map(|t| t.as_str()).collect()
}

// =============================================================================
// Single releases
// =============================================================================

#[test]
fn test_release_tender() {
    let mut raw = tender();
    raw["awards"] = json!([award()]);
    raw["contracts"] = json!([contract()]);

    let release = build_release(&raw, &standard(), PREFIX).unwrap();
    assert_eq!(tags(&release), vec!["tender", "award", "contract"]);
    assert_eq!(release.ocid(), Some("test-UA-2024-01-15-000123-a"));
    assert_eq!(release.date(), Some("2024-01-20T10:00:00+02:00"));
    assert_eq!(release.id().map(str::len), Some(32));
    assert!(release.get("bids").is_none());

    let value = release.to_value();
    assert_eq!(value["tag"], json!(["tender", "award", "contract"]));
    assert_eq!(value["tender"]["title"], "Office paper");
}

#[test]
fn test_release_without_source_id() {
    let err = build_release(&json!({"title": "x"}), &standard(), PREFIX).unwrap_err();
    assert!(matches!(err, ExportError::MissingSourceId { ref key } if key == "tenderID"));
}

#[test]
fn test_zero_patches_single_release() {
    let schema = standard().with_source_id_key("sourceId");
    let raw = json!({"sourceId": "T1", "patches": []});

    let releases = sequence_releases(raw, &schema, PREFIX).unwrap();
    assert_eq!(releases.len(), 1);
    assert_eq!(releases[0].ocid(), Some("test-T1"));
    assert_eq!(tags(&releases[0]), vec!["tender"]);
}

// =============================================================================
// Sequencing
// =============================================================================

#[test]
fn test_noop_patch_emits_nothing() {
    let raw = with_patches(
        tender(),
        json!([[{"op": "add", "path": "/test", "value": "test"}]]),
    );
    let releases = sequence_releases(raw, &standard(), PREFIX).unwrap();
    assert_eq!(releases.len(), 1);
}

#[test]
fn test_award_status_update() {
    let mut raw = tender();
    raw["awards"] = json!([award()]);
    let raw = with_patches(
        raw,
        json!([[{"op": "replace", "path": "/awards/0/status", "value": "cancelled"}]]),
    );

    let releases = sequence_releases(raw, &standard(), PREFIX).unwrap();
    assert_eq!(releases.len(), 2);
    assert_eq!(releases[0].get("awards").unwrap()[0]["status"], "pending");
    assert_eq!(releases[1].get("awards").unwrap()[0]["status"], "cancelled");
    assert!(releases[1].tags().contains(Tag::AwardUpdate));
    assert!(!releases[1].tags().contains(Tag::TenderUpdate));
}

#[test]
fn test_description_update() {
    let raw = with_patches(
        tender(),
        json!([[{"op": "replace", "path": "/description", "value": "Supply of A3 paper"}]]),
    );

    let releases = sequence_releases(raw, &standard(), PREFIX).unwrap();
    assert_eq!(releases.len(), 2);
    assert_eq!(tags(&releases[1]), vec!["tenderUpdate"]);
    assert_eq!(releases[1].get("tender").unwrap()["description"], "Supply of A3 paper");
}

#[test]
fn test_chained_patches() {
    let mut raw = tender();
    raw["awards"] = json!([award()]);
    raw["contracts"] = json!([contract()]);
    let raw = with_patches(
        raw,
        json!([
            [{"op": "replace", "path": "/awards/0/status", "value": "active"}],
            [{"op": "replace", "path": "/contracts/0/status", "value": "active"}]
        ]),
    );

    let releases = sequence_releases(raw, &standard(), PREFIX).unwrap();
    assert_eq!(releases.len(), 3);
    assert_eq!(tags(&releases[1]), vec!["awardUpdate"]);
    assert!(releases[2].tags().contains(Tag::ContractUpdate));
    assert!(!releases[2].tags().contains(Tag::AwardUpdate));
    // the second snapshot keeps the first patch applied
    assert_eq!(releases[2].get("awards").unwrap()[0]["status"], "active");
}

#[test]
fn test_new_contract() {
    let raw = with_patches(
        tender(),
        json!([[{"op": "add", "path": "/contracts", "value": [contract()]}]]),
    );

    let releases = sequence_releases(raw, &standard(), PREFIX).unwrap();
    assert_eq!(releases.len(), 2);
    assert_eq!(tags(&releases[1]), vec!["contract"]);
}

#[test]
fn test_releases_share_ocid_and_differ_in_id() {
    let raw = with_patches(
        tender(),
        json!([
            [{"op": "replace", "path": "/title", "value": "Paper"}],
            [{"op": "replace", "path": "/title", "value": "Office paper, A4"}]
        ]),
    );

    let releases = sequence_releases(raw, &standard(), PREFIX).unwrap();
    assert_eq!(releases.len(), 3);
    for release in &releases {
        assert_eq!(release.ocid(), Some("test-UA-2024-01-15-000123-a"));
    }
    assert_ne!(releases[0].id(), releases[1].id());
    assert_ne!(releases[1].id(), releases[2].id());
}

#[test]
fn test_first_release_matches_single_export() {
    let raw = with_patches(
        tender(),
        json!([[{"op": "replace", "path": "/description", "value": "x"}]]),
    );
    let releases = sequence_releases(raw, &standard(), PREFIX).unwrap();
    let single = build_release(&tender(), &standard(), PREFIX).unwrap();
    assert_eq!(releases[0], single);
}

#[test]
fn test_new_bids_extended() {
    let mut raw = tender();
    let bids = raw.as_object_mut().unwrap().remove("bids").unwrap();
    let raw = with_patches(raw, json!([[{"op": "add", "path": "/bids", "value": bids}]]));

    let releases = sequence_releases(raw, &extended(), PREFIX).unwrap();
    assert_eq!(releases.len(), 2);
    assert!(releases[0].get("bids").is_none());
    assert!(releases[1].tags().contains(Tag::Bid));
    assert!(!releases[1].tags().contains(Tag::BidUpdate));
}

#[test]
fn test_new_bid_into_empty_list() {
    let mut raw = tender();
    let bid = raw["bids"][0].take();
    raw["bids"] = json!([]);
    let raw = with_patches(raw, json!([[{"op": "add", "path": "/bids/0", "value": bid}]]));

    let releases = sequence_releases(raw, &extended(), PREFIX).unwrap();
    assert_eq!(releases.len(), 2);
    assert!(releases[1].tags().contains(Tag::Bid));
    assert!(!releases[1].tags().contains(Tag::BidUpdate));
}

#[test]
fn test_new_bids_ocds_1_1() {
    let mut raw = tender();
    let bids = raw.as_object_mut().unwrap().remove("bids").unwrap();
    let raw = with_patches(raw, json!([[{"op": "add", "path": "/bids", "value": bids}]]));

    let releases = sequence_releases(raw, &ocds_1_1(), PREFIX).unwrap();
    assert_eq!(releases.len(), 2);
    assert!(releases[1].tags().contains(Tag::Bid));
    assert_eq!(releases[1].get("bids").unwrap()["statistics"][0]["value"], 1);
}

#[test]
fn test_bid_update_tagging() {
    let patch = json!([[{"op": "replace", "path": "/bids/0/status", "value": "invalid"}]]);

    let raw = with_patches(tender(), patch.clone());
    let releases = sequence_releases(raw, &extended(), PREFIX).unwrap();
    assert_eq!(releases.len(), 2);
    assert_eq!(tags(&releases[1]), vec!["bidUpdate"]);

    // without the extended table a bid change carries no tag
    let schema = extended().with_tag_rules(Default::default());
    let releases = sequence_releases(with_patches(tender(), patch), &schema, PREFIX).unwrap();
    assert_eq!(releases.len(), 2);
    assert!(releases[1].tags().is_empty());
}

#[test]
fn test_failing_patch_reports_index() {
    let raw = with_patches(
        tender(),
        json!([
            [{"op": "replace", "path": "/description", "value": "x"}],
            [{"op": "remove", "path": "/awards/0"}]
        ]),
    );
    let err = sequence_releases(raw, &standard(), PREFIX).unwrap_err();
    match err {
        ExportError::PatchApply { index, source } => {
            assert_eq!(index, 1);
            assert!(matches!(source, PatchError::PathNotFound(_)));
        }
        other => panic!("unexpected error: {}", other),
    }
}

#[test]
fn test_sequencing_requires_patches() {
    let err = sequence_releases(tender(), &standard(), PREFIX).unwrap_err();
    assert!(matches!(err, ExportError::PatchPrecondition));
}

// =============================================================================
// Records and packages
// =============================================================================

#[test]
fn test_record() {
    let mut raw = tender();
    raw["awards"] = json!([award()]);
    let raw = with_patches(
        raw,
        json!([
            [{"op": "replace", "path": "/awards/0/status", "value": "active"}],
            [{"op": "add", "path": "/contracts", "value": [contract()]}]
        ]),
    );

    let record = build_record(raw, &standard(), PREFIX, &MergeCompiler).unwrap();
    assert_eq!(record.ocid, "test-UA-2024-01-15-000123-a");
    assert_eq!(record.releases.len(), 3);
    assert_eq!(record.compiled_release["awards"][0]["status"], "active");
    assert_eq!(record.compiled_release["contracts"][0]["id"], "c1");
    assert_eq!(record.compiled_release["id"], "test-UA-2024-01-15-000123-a-compiled");
    assert_eq!(record.compiled_release["tag"], json!(["compiled"]));

    let value = serde_json::to_value(&record).unwrap();
    assert!(value["compiledRelease"].is_object());
}

#[test]
fn test_package_metadata() {
    let config = PackageConfig {
        prefix: PREFIX.to_string(),
        uri: None,
        publisher: Publisher {
            name: "test".to_string(),
            ..Publisher::default()
        },
        license: Some("test".to_string()),
        publication_policy: Some("test".to_string()),
    };
    let package = package_releases(vec![tender()], &ocds_1_1(), &config);
    let value = serde_json::to_value(&package).unwrap();

    assert_eq!(value["version"], "1.1");
    assert_eq!(value["license"], "test");
    assert_eq!(value["publicationPolicy"], "test");
    assert_eq!(value["publisher"]["name"], "test");
    assert!(value.get("uri").is_none());
    assert_eq!(value["releases"].as_array().unwrap().len(), 1);
    assert_eq!(value["releases"][0]["ocid"], "test-UA-2024-01-15-000123-a");
}
