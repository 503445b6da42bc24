//! Extended variant: OCDS 1.0 plus lots, internal identifiers and bids

use tracing::debug;

use crate::model::{ExportSchema, ExportType, FieldSpec};
use crate::release::TagRules;

use super::standard;

/// Standard schema with lot and bid data exposed
pub fn extended() -> ExportSchema {
    let base = standard::standard();

    let types = base
        .types
        .derive()
        .with(ExportType::extend(&standard::release_type(), ["bids"]))
        .with(ExportType::extend(&standard::tender_type(), ["lots", "tenderID"]))
        .with(ExportType::extend(&standard::award_type(), ["lotID"]))
        .with(ExportType::extend(
            &standard::contract_type(),
            ["contractID", "contractNumber", "suppliers"],
        ))
        .with(ExportType::new(
            "Lot",
            ["id", "title", "description", "status", "value", "minimalStep"],
        ))
        .with(ExportType::new(
            "Bid",
            ["id", "date", "status", "value", "tenderers", "documents", "lotValues"],
        ))
        .with(ExportType::new("LotValue", ["relatedLot", "value", "date"]));

    let fields = base
        .fields
        .derive()
        .with("lots", FieldSpec::list("Lot"))
        .with("minimalStep", FieldSpec::object("Value"))
        .with("bids", FieldSpec::list("Bid"))
        .with("lotValues", FieldSpec::list("LotValue"));

    debug!(types = types.len(), "derived extended schema");
    ExportSchema::new(base.version.clone(), types, fields, base.callbacks.derive())
        .with_tag_rules(TagRules::default().with_bid_updates())
        .with_source_id_key(base.source_id_key)
}
