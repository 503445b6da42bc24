//! OCDS 1.0 catalogue, the base every other variant derives from

use crate::model::{
    CallbackRegistry, ComputedField, ExportSchema, ExportType, FieldDef, FieldSpec,
    FieldTypeRegistry, TypeCatalog,
};
use crate::version::StandardVersion;

use super::helpers;

pub fn release_type() -> ExportType {
    ExportType::new(
        "Release",
        ["language", "initiationType", "tender", "awards", "contracts", "buyer"],
    )
    .with_field(FieldDef::renamed("date", "dateModified"))
    .with_computed(ComputedField::new("ocid", helpers::release_ocid))
    .with_computed(ComputedField::new("id", helpers::release_id))
}

pub fn tender_type() -> ExportType {
    ExportType::new(
        "Tender",
        [
            "id",
            "title",
            "description",
            "status",
            "items",
            "minValue",
            "value",
            "procurementMethod",
            "procurementMethodRationale",
            "awardCriteria",
            "awardCriteriaDetails",
            "submissionMethod",
            "submissionMethodDetails",
            "tenderPeriod",
            "enquiryPeriod",
            "hasEnquiries",
            "eligibilityCriteria",
            "awardPeriod",
            "numberOfTenderers",
            "tenderers",
            "procuringEntity",
            "documents",
        ],
    )
}

pub fn award_type() -> ExportType {
    ExportType::new(
        "Award",
        [
            "id",
            "title",
            "description",
            "status",
            "date",
            "value",
            "suppliers",
            "items",
            "contractPeriod",
            "documents",
        ],
    )
}

pub fn contract_type() -> ExportType {
    ExportType::new(
        "Contract",
        [
            "id",
            "awardID",
            "title",
            "description",
            "status",
            "period",
            "value",
            "items",
            "dateSigned",
            "documents",
        ],
    )
}

pub fn organization_type() -> ExportType {
    ExportType::new(
        "Organization",
        ["identifier", "additionalIdentifiers", "name", "address", "contactPoint"],
    )
}

pub fn unit_type() -> ExportType {
    ExportType::new("Unit", ["name", "value"])
}

pub fn period_type() -> ExportType {
    ExportType::new("Period", ["startDate", "endDate"])
}

fn catalog() -> TypeCatalog {
    TypeCatalog::new()
        .with(release_type())
        .with(tender_type())
        .with(award_type())
        .with(contract_type())
        .with(organization_type())
        .with(unit_type())
        .with(period_type())
        .with(ExportType::new("Identifier", ["scheme", "id", "legalName", "uri"]))
        .with(ExportType::new(
            "Address",
            ["streetAddress", "locality", "region", "postalCode", "countryName"],
        ))
        .with(ExportType::new(
            "ContactPoint",
            ["name", "email", "telephone", "faxNumber", "url"],
        ))
        .with(ExportType::new(
            "Item",
            [
                "id",
                "description",
                "classification",
                "additionalClassifications",
                "quantity",
                "unit",
            ],
        ))
        .with(ExportType::new("Classification", ["scheme", "id", "description", "uri"]))
        .with(ExportType::new("Value", ["amount", "currency"]))
        .with(ExportType::new(
            "Document",
            [
                "id",
                "documentType",
                "title",
                "description",
                "url",
                "datePublished",
                "dateModified",
                "format",
                "language",
            ],
        ))
}

fn field_types() -> FieldTypeRegistry {
    FieldTypeRegistry::new()
        .with("tender", FieldSpec::object("Tender"))
        .with("awards", FieldSpec::list("Award"))
        .with("contracts", FieldSpec::list("Contract"))
        .with("buyer", FieldSpec::object("Organization"))
        .with("procuringEntity", FieldSpec::object("Organization"))
        .with("tenderers", FieldSpec::list("Organization"))
        .with("suppliers", FieldSpec::list("Organization"))
        .with("identifier", FieldSpec::object("Identifier"))
        .with("additionalIdentifiers", FieldSpec::list("Identifier"))
        .with("address", FieldSpec::object("Address"))
        .with("contactPoint", FieldSpec::object("ContactPoint"))
        .with("items", FieldSpec::list("Item"))
        .with("classification", FieldSpec::object("Classification"))
        .with("additionalClassifications", FieldSpec::list("Classification"))
        .with("unit", FieldSpec::object("Unit"))
        .with("value", FieldSpec::object("Value"))
        .with("minValue", FieldSpec::object("Value"))
        .with("tenderPeriod", FieldSpec::object("Period"))
        .with("enquiryPeriod", FieldSpec::object("Period"))
        .with("awardPeriod", FieldSpec::object("Period"))
        .with("contractPeriod", FieldSpec::object("Period"))
        .with("period", FieldSpec::object("Period"))
        .with("documents", FieldSpec::list("Document"))
}

fn callbacks() -> CallbackRegistry {
    CallbackRegistry::new()
        .with("tender", helpers::tender_root)
        .with("buyer", helpers::buyer)
        .with("initiationType", helpers::initiation_type)
        .with("numberOfTenderers", helpers::number_of_tenderers)
}

/// OCDS 1.0 export schema
pub fn standard() -> ExportSchema {
    ExportSchema::new(StandardVersion::new(1, 0), catalog(), field_types(), callbacks())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exporter::export;
    use serde_json::json;

    #[test]
    fn test_registries_resolve() {
        let schema = standard();
        for name in ["Release", "Tender", "Award", "Contract", "Organization", "Document"] {
            assert!(schema.export_type(name).is_some(), "missing {}", name);
        }
        assert!(schema.fields.contains("tenderers"));
        assert!(schema.callbacks.contains("tender"));
    }

    #[test]
    fn test_contract_hides_internal_fields() {
        let contract = json!({
            "id": "c1",
            "contractID": "UA-2024-0001-c1",
            "contractNumber": "42",
            "suppliers": [{"name": "S"}],
            "status": "active"
        });
        let out = export(&contract, &standard(), "Contract").unwrap();
        assert_eq!(out, json!({"id": "c1", "status": "active"}));
    }

    #[test]
    fn test_unit_value_is_nested() {
        let item = json!({
            "id": "i1",
            "unit": {
                "name": "kg",
                "code": "KGM",
                "value": {"amount": 3, "currency": "UAH", "valueAddedTaxIncluded": true}
            }
        });
        let out = export(&item, &standard(), "Item").unwrap();
        assert_eq!(
            out["unit"],
            json!({"name": "kg", "value": {"amount": 3, "currency": "UAH"}})
        );
    }
}
