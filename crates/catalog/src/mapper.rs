//! Explicit mapping from GraphQL search results to the monitor model.
//!
//! The search response nests the asserted entity inside a relationships
//! block and the monitor/assertion types inside `info`, so the mapping is
//! done field by field instead of deserializing the entity wholesale.
//! Monitors that fail to map are logged and skipped; one malformed
//! monitor must not hide the rest of the list.

use serde_json::Value;
use tracing::warn;

use vigil_core::model::{
    Assertion, AssertionEntity, AssertionEvaluationParameters, AssertionEvaluationSpec,
    AssertionMonitor, AssertionType, CronSchedule, FreshnessAssertion, Monitor, MonitorType,
};

use crate::client::CatalogError;

/// Convert the raw search-result entities into monitors, skipping any
/// that fail to map.
pub fn monitors_from_search(entities: &[Value]) -> Vec<Monitor> {
    let mut monitors = Vec::with_capacity(entities.len());
    for entity in entities {
        match monitor_from_entity(entity) {
            Ok(monitor) => monitors.push(monitor),
            Err(e) => {
                warn!(error = %e, "skipping monitor that failed to map");
            }
        }
    }
    monitors
}

/// Map a single search-result entity to a [`Monitor`].
pub fn monitor_from_entity(entity: &Value) -> Result<Monitor, CatalogError> {
    let urn = str_field(entity, "urn")?;
    let info = entity
        .get("info")
        .filter(|v| !v.is_null())
        .ok_or_else(|| parse_err(&urn, "missing info"))?;

    let kind: MonitorType = from_json(info.get("type"), &urn, "info.type")?;

    let assertion_monitor = match info.get("assertionMonitor").filter(|v| !v.is_null()) {
        Some(am) => {
            let raw_specs = am
                .get("assertions")
                .and_then(Value::as_array)
                .ok_or_else(|| parse_err(&urn, "assertionMonitor missing assertions"))?;
            let mut specs = Vec::with_capacity(raw_specs.len());
            for raw in raw_specs {
                specs.push(spec_from_value(raw, &urn)?);
            }
            Some(AssertionMonitor { assertions: specs })
        }
        None => None,
    };

    Ok(Monitor {
        urn,
        kind,
        assertion_monitor,
    })
}

fn spec_from_value(value: &Value, monitor_urn: &str) -> Result<AssertionEvaluationSpec, CatalogError> {
    let assertion = assertion_from_value(
        value
            .get("assertion")
            .ok_or_else(|| parse_err(monitor_urn, "spec missing assertion"))?,
    )?;

    let schedule: CronSchedule = from_json(value.get("schedule"), monitor_urn, "spec.schedule")?;

    let parameters: Option<AssertionEvaluationParameters> =
        match value.get("parameters").filter(|v| !v.is_null()) {
            Some(p) => Some(from_json(Some(p), monitor_urn, "spec.parameters")?),
            None => None,
        };

    Ok(AssertionEvaluationSpec {
        assertion,
        schedule,
        parameters,
    })
}

fn assertion_from_value(value: &Value) -> Result<Assertion, CatalogError> {
    let urn = str_field(value, "urn")?;
    let info = value
        .get("info")
        .filter(|v| !v.is_null())
        .ok_or_else(|| parse_err(&urn, "assertion missing info"))?;

    let kind: AssertionType = from_json(info.get("type"), &urn, "assertion info.type")?;

    let freshness_assertion: Option<FreshnessAssertion> =
        match info.get("freshnessAssertion").filter(|v| !v.is_null()) {
            Some(f) => Some(from_json(Some(f), &urn, "freshnessAssertion")?),
            None => None,
        };

    // The asserted entity arrives through the relationships block.
    let related = value
        .pointer("/relationships/relationships/0/entity")
        .ok_or_else(|| parse_err(&urn, "assertion missing asserted entity"))?;

    let entity_urn = str_field(related, "urn")?;
    let platform_urn = related
        .pointer("/platform/urn")
        .and_then(Value::as_str)
        .ok_or_else(|| parse_err(&urn, "asserted entity missing platform urn"))?
        .to_string();
    let sub_types = related
        .pointer("/subTypes/typeNames")
        .and_then(Value::as_array)
        .map(|names| {
            names
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        });

    // Current contract: the connection is keyed by the entity's platform.
    let connection_urn = Some(platform_urn.clone());

    Ok(Assertion {
        urn,
        kind,
        entity: AssertionEntity {
            urn: entity_urn,
            platform_urn,
            platform_instance: None,
            sub_types,
        },
        connection_urn,
        freshness_assertion,
    })
}

fn str_field(value: &Value, key: &str) -> Result<String, CatalogError> {
    value
        .get(key)
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| CatalogError::Parse(format!("missing string field {key:?}")))
}

fn from_json<T: serde::de::DeserializeOwned>(
    value: Option<&Value>,
    urn: &str,
    what: &str,
) -> Result<T, CatalogError> {
    let value = value
        .filter(|v| !v.is_null())
        .ok_or_else(|| parse_err(urn, &format!("missing {what}")))?;
    serde_json::from_value(value.clone())
        .map_err(|e| parse_err(urn, &format!("invalid {what}: {e}")))
}

fn parse_err(urn: &str, reason: &str) -> CatalogError {
    CatalogError::Parse(format!("{urn}: {reason}"))
}
