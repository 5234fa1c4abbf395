//! BigQuery query and audit-filter construction.

use chrono::{TimeZone, Utc};

use vigil_core::model::{AuditLogSpec, ValidationWindow};
use vigil_core::urn::DatasetName;

use crate::error::SourceError;

/// Statement types considered dataset mutations by default. ALTER is
/// deliberately excluded.
pub const DEFAULT_STATEMENT_TYPES: &[&str] = &[
    "INSERT",
    "UPDATE",
    "CREATE_TABLE",
    "CREATE_TABLE_AS_SELECT",
    "CREATE_EXTERNAL_TABLE",
    "CREATE_SNAPSHOT_TABLE",
];

/// Column types usable as a freshness watermark.
pub const SUPPORTED_COLUMN_TYPES: &[&str] = &["DATE", "DATETIME", "TIMESTAMP"];

/// Timestamp format expected by Cloud Logging filters.
const LOG_TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// Render the statement-type allowlist as an OR-joined quoted list.
pub fn statement_types_filter(spec: Option<&AuditLogSpec>) -> String {
    let types: Vec<String> = match spec.and_then(|s| s.operation_types.as_ref()) {
        Some(requested) if !requested.is_empty() => {
            requested.iter().map(|t| format!("\"{t}\"")).collect()
        }
        _ => DEFAULT_STATEMENT_TYPES
            .iter()
            .map(|t| format!("\"{t}\""))
            .collect(),
    };
    types.join(" OR ")
}

/// Lower-cased principal email filter, when requested. Only email
/// addresses are supported as the user filter for this source.
pub fn user_name_filter(spec: Option<&AuditLogSpec>) -> Option<String> {
    spec.and_then(|s| s.user_name.as_ref())
        .map(|u| u.to_lowercase())
}

/// Convert epoch millis to a comparison expression in the column's
/// native type. DATETIME columns are assumed to be stored in UTC.
pub fn millis_to_timestamp_expr(millis: i64, column_type: &str) -> Result<String, SourceError> {
    let expr = match column_type.to_uppercase().as_str() {
        "DATE" => format!("DATE(TIMESTAMP_MILLIS({millis}))"),
        "DATETIME" => format!("DATETIME(TIMESTAMP_MILLIS({millis}), 'UTC')"),
        "TIMESTAMP" => format!("TIMESTAMP_MILLIS({millis})"),
        other => return Err(SourceError::UnsupportedColumnType(other.to_string())),
    };
    Ok(expr)
}

/// Table last-modified scan over the dataset's `__TABLES__` metadata.
pub fn information_schema_query(name: &DatasetName, window: &ValidationWindow) -> String {
    format!(
        "SELECT last_modified_time \
         FROM `{project}.{dataset}.__TABLES__` \
         WHERE table_id=\"{table}\" \
         AND last_modified_time >= {start} \
         AND last_modified_time <= {end}",
        project = name.catalog,
        dataset = name.schema,
        table = name.table,
        start = window.start_ms,
        end = window.end_ms,
    )
}

/// High-watermark query for a field-value freshness check.
pub fn field_query(name: &DatasetName, path: &str, start_expr: &str, end_expr: &str) -> String {
    format!(
        "SELECT {path} FROM {dotted} \
         WHERE {path} >= {start_expr} \
         AND {path} <= {end_expr} \
         ORDER BY {path} DESC",
        dotted = name.dotted(),
    )
}

/// Cloud Logging filter matching completed insert-job operations that
/// wrote to the target table within the window.
pub fn audit_log_filter(
    name: &DatasetName,
    window: &ValidationWindow,
    statement_types: &str,
    principal_email: Option<&str>,
) -> String {
    let start = Utc
        .timestamp_millis_opt(window.start_ms)
        .single()
        .unwrap_or_default()
        .format(LOG_TIMESTAMP_FORMAT);
    let end = Utc
        .timestamp_millis_opt(window.end_ms)
        .single()
        .unwrap_or_default()
        .format(LOG_TIMESTAMP_FORMAT);

    let principal_clause = match principal_email {
        Some(email) => format!("\nAND protoPayload.authenticationInfo.principalEmail=\"{email}\""),
        None => String::new(),
    };

    format!(
        "resource.type=(\"bigquery_project\" OR \"bigquery_dataset\")\n\
         AND\n\
         (\n\
         protoPayload.methodName=\"google.cloud.bigquery.v2.JobService.InsertJob\"\n\
         AND protoPayload.metadata.jobChange.job.jobStatus.jobState=\"DONE\"\n\
         AND NOT protoPayload.metadata.jobChange.job.jobStatus.errorResult:*\n\
         AND protoPayload.metadata.jobChange.job.jobConfig.queryConfig.destinationTable=\"projects/{project}/datasets/{dataset}/tables/{table}\"\n\
         AND protoPayload.metadata.jobChange.job.jobConfig.queryConfig.statementType=({statement_types})\n\
         ){principal_clause}\n\
         AND timestamp >= \"{start}\"\n\
         AND timestamp < \"{end}\"",
        project = name.catalog,
        dataset = name.schema,
        table = name.table,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn name() -> DatasetName {
        DatasetName {
            catalog: "p".to_string(),
            schema: "d".to_string(),
            table: "t".to_string(),
        }
    }

    fn window() -> ValidationWindow {
        ValidationWindow::new(1_690_000_000_000, 1_690_086_400_000)
    }

    #[test]
    fn default_statement_filter() {
        assert_eq!(
            statement_types_filter(None),
            "\"INSERT\" OR \"UPDATE\" OR \"CREATE_TABLE\" OR \"CREATE_TABLE_AS_SELECT\" \
             OR \"CREATE_EXTERNAL_TABLE\" OR \"CREATE_SNAPSHOT_TABLE\""
        );
    }

    #[test]
    fn field_query_with_date_column() {
        let start = millis_to_timestamp_expr(window().start_ms, "DATE").unwrap();
        let end = millis_to_timestamp_expr(window().end_ms, "DATE").unwrap();
        let sql = field_query(&name(), "updated_at", &start, &end);

        assert_eq!(
            sql,
            "SELECT updated_at FROM p.d.t \
             WHERE updated_at >= DATE(TIMESTAMP_MILLIS(1690000000000)) \
             AND updated_at <= DATE(TIMESTAMP_MILLIS(1690086400000)) \
             ORDER BY updated_at DESC"
        );
    }

    #[test]
    fn cast_table() {
        assert_eq!(
            millis_to_timestamp_expr(1, "TIMESTAMP").unwrap(),
            "TIMESTAMP_MILLIS(1)"
        );
        assert_eq!(
            millis_to_timestamp_expr(1, "DATETIME").unwrap(),
            "DATETIME(TIMESTAMP_MILLIS(1), 'UTC')"
        );
        assert!(millis_to_timestamp_expr(1, "STRING").is_err());
    }

    #[test]
    fn information_schema_query_shape() {
        let sql = information_schema_query(&name(), &window());
        assert!(sql.contains("FROM `p.d.__TABLES__`"));
        assert!(sql.contains("table_id=\"t\""));
        assert!(sql.contains("last_modified_time >= 1690000000000"));
        assert!(sql.contains("last_modified_time <= 1690086400000"));
    }

    #[test]
    fn audit_filter_shape() {
        let filter = audit_log_filter(&name(), &window(), "\"INSERT\"", Some("svc@proj.iam"));
        assert!(filter.contains("resource.type=(\"bigquery_project\" OR \"bigquery_dataset\")"));
        assert!(filter
            .contains("destinationTable=\"projects/p/datasets/d/tables/t\""));
        assert!(filter.contains("statementType=(\"INSERT\")"));
        assert!(filter.contains("principalEmail=\"svc@proj.iam\""));
        assert!(filter.contains("timestamp >= \"2023-07-22T05:06:40Z\""));
        assert!(filter.contains("timestamp < \"2023-07-23T05:06:40Z\""));
    }
}
