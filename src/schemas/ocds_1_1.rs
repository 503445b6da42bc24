//! OCDS 1.1 variant
//!
//! Organizations move from the tender into a top-level `parties` list, bids
//! gain a details/statistics section and periods report their length.

use tracing::debug;

use crate::model::{ComputedField, ExportSchema, ExportType, FieldDef, FieldSpec};
use crate::version::StandardVersion;

use super::{helpers, standard};

fn release_type() -> ExportType {
    ExportType::new(
        "Release",
        ["language", "initiationType", "tender", "awards", "contracts", "bids", "parties"],
    )
    .with_field(FieldDef::renamed("date", "dateModified"))
    .with_computed(ComputedField::new("ocid", helpers::release_ocid))
    .with_computed(ComputedField::new("id", helpers::release_id))
}

fn tender_type() -> ExportType {
    ExportType::new(
        "Tender",
        [
            "id",
            "title",
            "description",
            "status",
            "items",
            "value",
            "minValue",
            "procurementMethod",
            "procurementMethodRationale",
            "awardCriteria",
            "awardCriteriaDetails",
            "submissionMethod",
            "submissionMethodDetails",
            "tenderPeriod",
            "contractPeriod",
            "enquiryPeriod",
            "hasEnquiries",
            "eligibilityCriteria",
            "awardPeriod",
            "documents",
        ],
    )
}

fn award_type() -> ExportType {
    ExportType::new(
        "Award",
        [
            "id",
            "title",
            "description",
            "status",
            "date",
            "value",
            "items",
            "contractPeriod",
            "documents",
        ],
    )
}

/// OCDS 1.1 export schema
pub fn ocds_1_1() -> ExportSchema {
    let base = standard::standard();

    let types = base
        .types
        .derive()
        .with(release_type())
        .with(tender_type())
        .with(award_type())
        .with(
            standard::period_type()
                .with_computed(ComputedField::new("durationInDays", helpers::duration_in_days)),
        )
        .with(
            ExportType::extend(&standard::organization_type(), ["roles"])
                .with_computed(ComputedField::new("id", helpers::organization_id)),
        )
        .with(ExportType::extend(&standard::unit_type(), ["uri"]))
        .with(ExportType::new("Bids", ["details", "statistics"]))
        .with(ExportType::new(
            "Bid",
            [
                "id",
                "date",
                "status",
                "value",
                "documents",
                "relatedLot",
                "participationUrl",
                "selfQualified",
                "selfEligible",
                "subcontractingDetails",
                "eligibilityDocuments",
            ],
        ))
        .with(
            ExportType::new("BidStatistics", ["id", "measure", "date", "notes"])
                .with_field(FieldDef::renamed("value", "number")),
        );

    let fields = base
        .fields
        .derive()
        .without("tenderers")
        .without("suppliers")
        .without("procuringEntity")
        .without("buyer")
        .with("parties", FieldSpec::list("Organization"))
        .with("bids", FieldSpec::object("Bids"))
        .with("details", FieldSpec::list("Bid"))
        .with("statistics", FieldSpec::list("BidStatistics"))
        .with("eligibilityDocuments", FieldSpec::list("Document"));

    let callbacks = base
        .callbacks
        .derive()
        .without("buyer")
        .with("contractPeriod", helpers::contract_period)
        .with("parties", helpers::parties)
        .with("minValue", helpers::min_value)
        .with("bids", helpers::bids)
        .with("details", helpers::details)
        .with("statistics", helpers::statistics);

    debug!(types = types.len(), "derived OCDS 1.1 schema");
    ExportSchema::new(StandardVersion::new(1, 1), types, fields, callbacks)
        .with_source_id_key(base.source_id_key)
}
