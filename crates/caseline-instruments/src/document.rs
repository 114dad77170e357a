//! Instrument documents as exchanged with the storage layer.
//!
//! Documents carry a `schema_version`. Older shapes are migrated on the raw
//! JSON before deserializing, then the instrument is normalized and checked
//! against the [`AuthoringPolicy`].

use serde_json::{Map, Value, json};

use caseline_core::models::risk_level::RiskLevel;

use crate::config::AuthoringPolicy;
use crate::error::InstrumentError;
use crate::model::Instrument;

/// Bump when the document shape changes; add a step to [`migrate`].
pub const SCHEMA_VERSION: u32 = 1;

pub fn load_instrument(json: &str, policy: &AuthoringPolicy) -> Result<Instrument, InstrumentError> {
    let value: Value = serde_json::from_str(json)?;
    instrument_from_value(value, policy)
}

pub fn instrument_from_value(value: Value, policy: &AuthoringPolicy) -> Result<Instrument, InstrumentError> {
    let on_disk_version = match value.get("schema_version").and_then(Value::as_u64) {
        None => 0,
        Some(raw) => u32::try_from(raw).map_err(|_| InstrumentError::UnsupportedVersion {
            found: raw,
            supported: SCHEMA_VERSION,
        })?,
    };

    let migrated = migrate(value, on_disk_version)?;
    let mut instrument: Instrument = serde_json::from_value(migrated)?;
    normalize(&mut instrument);

    let errors = instrument.validate(policy);
    if !errors.is_empty() {
        return Err(InstrumentError::InvalidDocument(errors));
    }
    for overlap in instrument.overlapping_rules() {
        tracing::warn!(
            instrument_id = %instrument.id(),
            first = %overlap.first,
            second = %overlap.second,
            "overlapping scoring rules, earlier rule wins"
        );
    }
    Ok(instrument)
}

/// Validate and serialize for storage, stamped with the current version.
pub fn save_instrument(instrument: &Instrument, policy: &AuthoringPolicy) -> Result<String, InstrumentError> {
    let errors = instrument.validate(policy);
    if !errors.is_empty() {
        return Err(InstrumentError::InvalidDocument(errors));
    }
    let mut value = serde_json::to_value(instrument)?;
    if let Some(obj) = value.as_object_mut() {
        obj.insert("schema_version".to_string(), json!(SCHEMA_VERSION));
    }
    Ok(serde_json::to_string_pretty(&value)?)
}

/// Domains are ordered by `order_index` (stable for ties), then renumbered
/// so the index matches the position.
fn normalize(instrument: &mut Instrument) {
    instrument.domains.sort_by_key(|d| d.order_index);
    instrument.renumber_domains();
}

/// Run sequential migrations from `from_version` up to [`SCHEMA_VERSION`].
fn migrate(mut json: Value, from_version: u32) -> Result<Value, InstrumentError> {
    if from_version > SCHEMA_VERSION {
        return Err(InstrumentError::UnsupportedVersion {
            found: from_version.into(),
            supported: SCHEMA_VERSION,
        });
    }

    // v0 → v1: flat `scoring_matrix` becomes total-scope rules, option
    // `score` becomes `points`, options without a `value` answer to their label
    if from_version < 1 {
        let obj = json
            .as_object_mut()
            .ok_or_else(|| InstrumentError::Malformed("instrument is not a JSON object".into()))?;

        if let Some(matrix) = obj.remove("scoring_matrix") {
            let has_tables = obj
                .get("scoring_tables")
                .and_then(Value::as_array)
                .is_some_and(|t| !t.is_empty());
            if has_tables {
                tracing::warn!("document has both scoring_matrix and scoring_tables, keeping scoring_tables");
            } else {
                let rows = matrix_to_rules(&matrix)?;
                obj.insert("scoring_tables".to_string(), Value::Array(rows));
            }
        }

        if let Some(domains) = obj.get_mut("domains").and_then(Value::as_array_mut) {
            for (index, domain) in domains.iter_mut().enumerate() {
                let Some(domain) = domain.as_object_mut() else {
                    continue;
                };
                domain.entry("order_index").or_insert(json!(index));
                let items = domain.get_mut("items").and_then(Value::as_array_mut);
                for item in items.into_iter().flatten() {
                    let options = item.get_mut("options").and_then(Value::as_array_mut);
                    for option in options.into_iter().flatten().filter_map(Value::as_object_mut) {
                        rename_key(option, "score", "points");
                        if !option.contains_key("value")
                            && let Some(label) = option.get("label").cloned()
                        {
                            option.insert("value".to_string(), label);
                        }
                    }
                }
            }
        }

        obj.insert("schema_version".to_string(), json!(1));
        tracing::info!("migrated instrument document v0 → v1");
    }

    Ok(json)
}

/// Legacy rows look like `{"label": "Low", "min": 0, "max": 14}`. Missing
/// bounds were treated as -999 and 999.
fn matrix_to_rules(matrix: &Value) -> Result<Vec<Value>, InstrumentError> {
    let rows = matrix
        .as_array()
        .ok_or_else(|| InstrumentError::Malformed("scoring_matrix is not an array".into()))?;
    rows.iter()
        .map(|row| -> Result<Value, InstrumentError> {
            let label = row.get("label").and_then(Value::as_str).unwrap_or_default();
            let level: RiskLevel = label.parse()?;
            Ok(json!({
                "domain_id": null,
                "population_filter": "All",
                "min_score": row.get("min").and_then(Value::as_i64).unwrap_or(-999),
                "max_score": row.get("max").and_then(Value::as_i64).unwrap_or(999),
                "result_level": level,
                "recommendation": row.get("recommendation").and_then(Value::as_str).unwrap_or_default(),
            }))
        })
        .collect()
}

fn rename_key(obj: &mut Map<String, Value>, from: &str, to: &str) {
    if obj.contains_key(to) {
        return;
    }
    if let Some(value) = obj.remove(from) {
        obj.insert(to.to_string(), value);
    }
}
