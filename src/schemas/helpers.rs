//! Callbacks and computed fields shared by the schema variants

use anyhow::Context;
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde_json::{json, Map, Value};

use crate::checksum::Checksum;
use crate::model::ComputeInput;

/// Length of release identifiers, in hex characters
const RELEASE_ID_LEN: usize = 32;

/// The release's tender is the raw document itself
pub fn tender_root(raw: &Value) -> anyhow::Result<Option<Value>> {
    Ok(Some(raw.clone()))
}

pub fn buyer(raw: &Value) -> anyhow::Result<Option<Value>> {
    Ok(raw.get("procuringEntity").cloned())
}

pub fn initiation_type(_raw: &Value) -> anyhow::Result<Option<Value>> {
    Ok(Some(Value::from("tender")))
}

pub fn number_of_tenderers(raw: &Value) -> anyhow::Result<Option<Value>> {
    Ok(raw
        .get("bids")
        .and_then(Value::as_array)
        .map(|bids| Value::from(bids.len())))
}

/// Lowest lot value, by amount
pub fn min_value(raw: &Value) -> anyhow::Result<Option<Value>> {
    let lots = match raw.get("lots").and_then(Value::as_array) {
        Some(lots) => lots,
        None => return Ok(None),
    };

    let mut lowest: Option<(f64, &Value)> = None;
    for value in lots.iter().filter_map(|lot| lot.get("value")) {
        let Some(amount) = value.get("amount").and_then(Value::as_f64) else {
            continue;
        };
        if lowest.map_or(true, |(current, _)| amount < current) {
            lowest = Some((amount, value));
        }
    }
    Ok(lowest.map(|(_, value)| value.clone()))
}

/// Every organization taking part in the tender, once, with its roles
pub fn parties(raw: &Value) -> anyhow::Result<Option<Value>> {
    let mut parties: Vec<(Option<String>, Map<String, Value>, Vec<&'static str>)> = Vec::new();

    let mut add = |org: &Value, role: &'static str| {
        let Some(obj) = org.as_object() else { return };
        let key = party_key(org);
        // organizations without any identity are never merged
        let existing = match &key {
            Some(key) => parties.iter_mut().find(|(k, _, _)| k.as_ref() == Some(key)),
            None => None,
        };
        match existing {
            Some((_, _, roles)) => {
                if !roles.contains(&role) {
                    roles.push(role);
                }
            }
            None => parties.push((key, obj.clone(), vec![role])),
        }
    };

    if let Some(entity) = raw.get("procuringEntity") {
        add(entity, "buyer");
        add(entity, "procuringEntity");
    }
    for bid in array(raw, "bids") {
        for tenderer in array(bid, "tenderers") {
            add(tenderer, "tenderer");
        }
    }
    for section in ["awards", "contracts"] {
        for entry in array(raw, section) {
            for supplier in array(entry, "suppliers") {
                add(supplier, "supplier");
            }
        }
    }

    if parties.is_empty() {
        return Ok(None);
    }
    Ok(Some(Value::Array(
        parties
            .into_iter()
            .map(|(_, mut org, roles)| {
                org.insert("roles".to_string(), json!(roles));
                Value::Object(org)
            })
            .collect(),
    )))
}

/// `scheme-id` of the identifier, else the name
fn party_key(org: &Value) -> Option<String> {
    let identifier = org.get("identifier");
    let scheme = identifier.and_then(|i| i.get("scheme")).and_then(Value::as_str);
    let id = identifier.and_then(|i| i.get("id")).and_then(Value::as_str);
    match (scheme, id) {
        (Some(scheme), Some(id)) => Some(format!("{}-{}", scheme, id)),
        _ => org
            .get("name")
            .and_then(Value::as_str)
            .filter(|name| !name.is_empty())
            .map(str::to_string),
    }
}

fn array<'v>(value: &'v Value, key: &str) -> impl Iterator<Item = &'v Value> {
    value
        .get(key)
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
}

/// Declared contract period, or the span covered by the contracts' periods
pub fn contract_period(raw: &Value) -> anyhow::Result<Option<Value>> {
    if let Some(period) = raw.get("contractPeriod").filter(|p| !p.is_null()) {
        return Ok(Some(period.clone()));
    }

    let mut start: Option<(DateTime<FixedOffset>, &str)> = None;
    let mut end: Option<(DateTime<FixedOffset>, &str)> = None;
    for period in array(raw, "contracts").filter_map(|c| c.get("period")) {
        if let Some(s) = period.get("startDate").and_then(Value::as_str) {
            let date = parse_date(s)?;
            if start.map_or(true, |(current, _)| date < current) {
                start = Some((date, s));
            }
        }
        if let Some(s) = period.get("endDate").and_then(Value::as_str) {
            let date = parse_date(s)?;
            if end.map_or(true, |(current, _)| date > current) {
                end = Some((date, s));
            }
        }
    }

    let mut period = Map::new();
    if let Some((_, s)) = start {
        period.insert("startDate".to_string(), Value::from(s));
    }
    if let Some((_, s)) = end {
        period.insert("endDate".to_string(), Value::from(s));
    }
    Ok((!period.is_empty()).then(|| Value::Object(period)))
}

/// Bids section: the bid list plus a count statistic
pub fn bids(raw: &Value) -> anyhow::Result<Option<Value>> {
    let Some(details) = raw.get("bids").and_then(Value::as_array) else {
        return Ok(None);
    };
    let mut statistic = json!({
        "id": "1",
        "measure": "bids",
        "number": details.len(),
    });
    if let Some(date) = raw.get("dateModified") {
        statistic["date"] = date.clone();
    }
    Ok(Some(json!({
        "details": details,
        "statistics": [statistic],
    })))
}

pub fn details(raw: &Value) -> anyhow::Result<Option<Value>> {
    Ok(raw.get("details").cloned())
}

pub fn statistics(raw: &Value) -> anyhow::Result<Option<Value>> {
    Ok(raw.get("statistics").cloned())
}

/// `prefix-sourceId`; absent without a prefix or a source identifier
pub fn release_ocid(input: &ComputeInput<'_>) -> anyhow::Result<Option<Value>> {
    let Some(prefix) = input.prefix else {
        return Ok(None);
    };
    let source_id = match input.raw.get(input.source_id_key) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => return Ok(None),
    };
    Ok(Some(Value::from(format!("{}-{}", prefix, source_id))))
}

/// Checksum of the release content assembled so far
pub fn release_id(input: &ComputeInput<'_>) -> anyhow::Result<Option<Value>> {
    let checksum = Checksum::from_json(&Value::Object(input.entity.clone()));
    Ok(Some(Value::from(checksum.short(RELEASE_ID_LEN))))
}

/// Whole days between `startDate` and `endDate`
pub fn duration_in_days(input: &ComputeInput<'_>) -> anyhow::Result<Option<Value>> {
    let start = input.entity.get("startDate").and_then(Value::as_str);
    let end = input.entity.get("endDate").and_then(Value::as_str);
    let (Some(start), Some(end)) = (start, end) else {
        return Ok(None);
    };
    let days = (parse_date(end)? - parse_date(start)?).num_days();
    Ok(Some(Value::from(days)))
}

/// `scheme-id` of the organization's identifier
pub fn organization_id(input: &ComputeInput<'_>) -> anyhow::Result<Option<Value>> {
    let identifier = input.entity.get("identifier");
    let scheme = identifier.and_then(|i| i.get("scheme")).and_then(Value::as_str);
    let id = identifier.and_then(|i| i.get("id")).and_then(Value::as_str);
    Ok(match (scheme, id) {
        (Some(scheme), Some(id)) => Some(Value::from(format!("{}-{}", scheme, id))),
        _ => None,
    })
}

/// RFC 3339 timestamp; a timestamp without offset or a bare date is taken as UTC
fn parse_date(s: &str) -> anyhow::Result<DateTime<FixedOffset>> {
    if let Ok(date) = DateTime::parse_from_rfc3339(s) {
        return Ok(date);
    }
    let naive = match NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f") {
        Ok(naive) => naive,
        Err(_) => NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .ok()
            .and_then(|date| date.and_hms_opt(0, 0, 0))
            .with_context(|| format!("invalid date '{}'", s))?,
    };
    Ok(Utc.from_utc_datetime(&naive).into())
}
