//! Model export tests
//!
//! Checks field filtering for each schema variant against stored-tender
//! fixtures.

use ocds_export::schemas::{extended, ocds_1_1, standard};
use ocds_export::{export, ExportSchema, Exporter};
use serde_json::{json, Value};

fn fixture(content: &str) -> Value {
    serde_json::from_str(content).unwrap()
}

fn tender() -> Value {
    fixture(include_str!("fixtures/tender.json"))
}

fn award() -> Value {
    fixture(include_str!("fixtures/award.json"))
}

fn contract() -> Value {
    fixture(include_str!("fixtures/contract.json"))
}

/// Assert every key of `value` (recursively, through declared nested types)
/// is allowed by its export type
fn assert_allowed(schema: &ExportSchema, type_name: &str, value: &Value) {
    let ty = schema.export_type(type_name).unwrap();
    let Some(map) = value.as_object() else { return };
    for (key, nested) in map {
        assert!(ty.allows(key), "{}.{} is not in the allow-list", type_name, key);
        let Some(spec) = schema.fields.get(key) else { continue };
        match nested {
            Value::Array(items) => {
                for item in items {
                    assert_allowed(schema, &spec.export_type, item);
                }
            }
            other => assert_allowed(schema, &spec.export_type, other),
        }
    }
}

// =============================================================================
// Standard (OCDS 1.0)
// =============================================================================

#[test]
fn test_award_model() {
    let new = export(&award(), &standard(), "Award").unwrap();
    assert!(new.get("lotID").is_none());
    assert!(new.get("bidID").is_none());
    assert!(new.get("complaintPeriod").is_none());
    assert_eq!(new["suppliers"][0]["name"], "Paper Supplier");
}

#[test]
fn test_contract_model() {
    let new = export(&contract(), &standard(), "Contract").unwrap();
    assert!(new.get("suppliers").is_none());
    assert!(new.get("contractID").is_none());
    assert!(new.get("contractNumber").is_none());
    assert_eq!(new["awardID"], "a1");
}

#[test]
fn test_tender_model() {
    let new = export(&tender(), &standard(), "Tender").unwrap();
    assert!(new.get("bids").is_none());
    assert!(new.get("lots").is_none());
    assert!(new.get("tenderID").is_none());
    assert_eq!(new["numberOfTenderers"], 1);
    assert_eq!(new["procuringEntity"]["identifier"]["id"], "00012345");
    assert!(new["procuringEntity"].get("kind").is_none());
    assert!(new["items"][0].get("deliveryDate").is_none());
    assert_eq!(new["value"], json!({"amount": 50000, "currency": "UAH"}));
}

#[test]
fn test_release_fields_are_allow_listed() {
    let schema = standard();
    let mut raw = tender();
    raw["awards"] = json!([award()]);
    raw["contracts"] = json!([contract()]);

    let release = Exporter::new(&schema)
        .with_prefix(Some("test"))
        .export(&raw, "Release")
        .unwrap();
    assert_allowed(&schema, "Release", &release);
    assert_eq!(release["buyer"]["name"], "City Council");
    assert_eq!(release["initiationType"], "tender");
}

#[test]
fn test_export_is_idempotent() {
    let schema = standard();
    let raw = tender();
    let exporter = Exporter::new(&schema).with_prefix(Some("test"));
    let first = serde_json::to_string(&exporter.export(&raw, "Release").unwrap()).unwrap();
    let second = serde_json::to_string(&exporter.export(&raw, "Release").unwrap()).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_fields_outside_allow_list_do_not_matter() {
    let schema = standard();
    let a = tender();
    let mut b = tender();
    b["owner"] = json!("broker2");
    b["procurementMethodType"] = json!("belowThreshold");
    b["items"][0]["relatedLot"] = json!("l2");

    let exporter = Exporter::new(&schema).with_prefix(Some("test"));
    assert_eq!(
        exporter.export(&a, "Release").unwrap(),
        exporter.export(&b, "Release").unwrap()
    );
}

// =============================================================================
// Extended
// =============================================================================

#[test]
fn test_ext_award_model() {
    let new = export(&award(), &extended(), "Award").unwrap();
    assert_eq!(new["lotID"], "l1");
    assert!(new.get("bidID").is_none());
}

#[test]
fn test_ext_tender_model() {
    let new = export(&tender(), &extended(), "Tender").unwrap();
    assert_eq!(new["tenderID"], "UA-2024-01-15-000123-a");
    assert_eq!(new["lots"].as_array().unwrap().len(), 2);
    assert!(new["lots"][0].get("status").is_some());
}

#[test]
fn test_ext_contract_model() {
    let new = export(&contract(), &extended(), "Contract").unwrap();
    assert_eq!(new["contractNumber"], "42/2024");
    assert_eq!(new["contractID"], "UA-2024-01-15-000123-a-c1");
}

#[test]
fn test_ext_release_has_bids() {
    let schema = extended();
    let release = Exporter::new(&schema)
        .with_prefix(Some("test"))
        .export(&tender(), "Release")
        .unwrap();
    assert_eq!(release["bids"][0]["tenderers"][0]["name"], "Paper Supplier");
    assert_allowed(&schema, "Release", &release);
}

// =============================================================================
// OCDS 1.1
// =============================================================================

#[test]
fn test_ocds_1_1_tender_model() {
    let mut raw = tender();
    raw["contracts"] = json!([contract()]);
    let new = export(&raw, &ocds_1_1(), "Tender").unwrap();
    assert_eq!(
        new["contractPeriod"],
        json!({
            "startDate": "2024-02-15T00:00:00+02:00",
            "endDate": "2024-12-31T00:00:00+02:00",
            "durationInDays": 320
        })
    );
    assert_eq!(new["minValue"], json!({"amount": 20000, "currency": "UAH"}));
    assert!(new.get("procuringEntity").is_none());
    assert_eq!(new["tenderPeriod"]["durationInDays"], 15);
}

#[test]
fn test_ocds_1_1_period_model() {
    let period = fixture(include_str!("fixtures/period.json"));
    let new = export(&period, &ocds_1_1(), "Period").unwrap();
    assert_eq!(new["durationInDays"], 15);

    let old = export(&period, &standard(), "Period").unwrap();
    assert!(old.get("durationInDays").is_none());
}

#[test]
fn test_ocds_1_1_organization_model() {
    let org = fixture(include_str!("fixtures/organization.json"));
    let new = export(&org, &ocds_1_1(), "Organization").unwrap();
    assert_eq!(new["roles"], json!(["buyer", "procuringEntity"]));
    assert_eq!(new["id"], "UA-EDR-00012345");
    assert!(new.get("kind").is_none());
}

#[test]
fn test_ocds_1_1_release_model() {
    let schema = ocds_1_1();
    let mut raw = tender();
    raw["awards"] = json!([award()]);

    let release = Exporter::new(&schema)
        .with_prefix(Some("test"))
        .export(&raw, "Release")
        .unwrap();

    let parties = release["parties"].as_array().unwrap();
    assert_eq!(parties.len(), 2);
    assert_eq!(parties[0]["id"], "UA-EDR-00012345");
    assert_eq!(parties[1]["roles"], json!(["tenderer", "supplier"]));

    assert_eq!(release["bids"]["details"][0]["id"], "b1");
    assert!(release["bids"]["details"][0].get("tenderers").is_none());
    assert_eq!(release["bids"]["statistics"][0]["value"], 1);
    assert!(release.get("buyer").is_none());
    assert_allowed(&schema, "Release", &release);
}
