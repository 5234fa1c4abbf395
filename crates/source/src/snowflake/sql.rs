//! Snowflake query construction.

use vigil_core::model::{AuditLogSpec, ValidationWindow};
use vigil_core::urn::DatasetName;

use crate::error::SourceError;

/// Operation types considered dataset mutations by default. ALTER is
/// deliberately excluded.
pub const DEFAULT_OPERATION_TYPES: &[&str] = &[
    "INSERT",
    "UPDATE",
    "CREATE",
    "CREATE_TABLE",
    "CREATE_TABLE_AS_SELECT",
    "COPY",
];

/// Column types usable as a freshness watermark.
pub const SUPPORTED_COLUMN_TYPES: &[&str] = &[
    "DATE",
    "TIMESTAMP",
    "TIMESTAMP_TZ",
    "TIMESTAMP_LTZ",
    "TIMESTAMP_NTZ",
    "DATETIME",
];

/// Render the operation-type allowlist as a quoted SQL `IN` list.
pub fn operation_types_filter(spec: Option<&AuditLogSpec>) -> String {
    let types: Vec<String> = match spec.and_then(|s| s.operation_types.as_ref()) {
        Some(requested) if !requested.is_empty() => {
            requested.iter().map(|t| format!("'{t}'")).collect()
        }
        _ => DEFAULT_OPERATION_TYPES
            .iter()
            .map(|t| format!("'{t}'"))
            .collect(),
    };
    types.join(", ")
}

/// Lower-cased user-name filter, when requested.
pub fn user_name_filter(spec: Option<&AuditLogSpec>) -> Option<String> {
    spec.and_then(|s| s.user_name.as_ref())
        .map(|u| u.to_lowercase())
}

/// Convert epoch millis to a comparison expression in the column's
/// native type, per the supported cast table.
pub fn millis_to_timestamp_expr(millis: i64, column_type: &str) -> Result<String, SourceError> {
    let expr = match column_type.to_uppercase().as_str() {
        "DATE" => format!("DATE(TO_TIMESTAMP({millis}, 3))"),
        "TIMESTAMP" => format!("TO_TIMESTAMP({millis}, 3)"),
        "TIMESTAMP_TZ" => format!("TO_TIMESTAMP({millis}, 3)::TIMESTAMP_TZ"),
        "TIMESTAMP_LTZ" => format!("TO_TIMESTAMP({millis}, 3)::TIMESTAMP_LTZ"),
        // DATETIME is an alias of TIMESTAMP_NTZ.
        "TIMESTAMP_NTZ" | "DATETIME" => format!("TO_TIMESTAMP({millis}, 3)::TIMESTAMP_NTZ"),
        other => return Err(SourceError::UnsupportedColumnType(other.to_string())),
    };
    Ok(expr)
}

/// Table last-altered scan over the catalog's information schema.
pub fn information_schema_query(name: &DatasetName, window: &ValidationWindow) -> String {
    format!(
        "SELECT table_name, table_type, (DATE_PART('EPOCH', last_altered) * 1000) AS last_altered \
         FROM {catalog}.information_schema.tables \
         WHERE last_altered >= to_timestamp_ltz({start}, 3) \
         AND last_altered < to_timestamp_ltz({end}, 3) \
         AND table_name = '{table}' \
         AND table_schema = '{schema}' \
         AND table_catalog = '{catalog}'",
        catalog = name.catalog.to_uppercase(),
        schema = name.schema.to_uppercase(),
        table = name.table.to_uppercase(),
        start = window.start_ms,
        end = window.end_ms,
    )
}

/// Audit-log scan: the account-usage access history (flattened over the
/// objects each query modified) joined with the query history, filtered
/// to mutating operation types within the window.
///
/// The account-usage views may lag by up to three hours, so audit-log
/// freshness is a poor fit for short windows.
pub fn audit_log_query(
    name: &DatasetName,
    window: &ValidationWindow,
    operation_types: &str,
    user_name: Option<&str>,
) -> String {
    let user_clause = match user_name {
        Some(user) => format!("AND LOWER(access_history.user_name) = '{user}'"),
        None => String::new(),
    };

    format!(
        "WITH exploded_access_history AS ( \
         SELECT access_history.query_id AS query_id, \
         access_history.user_name AS user_name, \
         access_history.query_start_time AS query_start_time, \
         updated_objects.value AS updated_objects \
         FROM snowflake.account_usage.access_history access_history, \
         LATERAL FLATTEN(input => access_history.objects_modified) updated_objects \
         WHERE access_history.query_start_time >= to_timestamp_ltz({start}, 3) \
         AND access_history.query_start_time < to_timestamp_ltz({end}, 3) \
         {user_clause} \
         ) \
         SELECT query_history.query_text AS \"QUERY_TEXT\", \
         query_history.query_type AS \"OPERATION_TYPE\", \
         query_history.rows_inserted AS \"ROWS_INSERTED\", \
         query_history.rows_updated AS \"ROWS_UPDATED\", \
         query_history.rows_deleted AS \"ROWS_DELETED\", \
         exploded_access_history.user_name AS \"USER_NAME\", \
         (DATE_PART('EPOCH', exploded_access_history.query_start_time) * 1000) AS \"QUERY_START_MS\", \
         exploded_access_history.updated_objects:objectName::STRING AS \"MODIFIED_OBJECT\" \
         FROM exploded_access_history AS exploded_access_history \
         INNER JOIN \
         (SELECT * FROM snowflake.account_usage.query_history \
         WHERE query_history.start_time >= to_timestamp_ltz({start}, 3) \
         AND query_history.start_time < to_timestamp_ltz({end}, 3) \
         AND query_history.query_type IN ({operation_types})) query_history \
         ON exploded_access_history.query_id = query_history.query_id \
         WHERE REGEXP_REPLACE(LOWER(exploded_access_history.updated_objects:objectName::STRING), '\\\"\\'', '') IN ('{dotted}') \
         ORDER BY query_history.start_time DESC",
        start = window.start_ms,
        end = window.end_ms,
        dotted = name.dotted(),
    )
}

/// High-watermark query for a field-value freshness check.
pub fn field_query(name: &DatasetName, path: &str, start_expr: &str, end_expr: &str) -> String {
    format!(
        "SELECT {path} AS last_altered_date \
         FROM {dotted} \
         WHERE {path} >= ({start_expr}) \
         AND {path} <= ({end_expr}) \
         ORDER BY {path} DESC",
        dotted = name.dotted(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn name() -> DatasetName {
        DatasetName {
            catalog: "db".to_string(),
            schema: "sch".to_string(),
            table: "tbl".to_string(),
        }
    }

    fn window() -> ValidationWindow {
        ValidationWindow::new(1_690_000_000_000, 1_690_086_400_000)
    }

    #[test]
    fn default_operation_filter() {
        let filter = operation_types_filter(None);
        assert_eq!(
            filter,
            "'INSERT', 'UPDATE', 'CREATE', 'CREATE_TABLE', 'CREATE_TABLE_AS_SELECT', 'COPY'"
        );
    }

    #[test]
    fn explicit_operation_filter() {
        let spec = AuditLogSpec {
            operation_types: Some(vec!["INSERT".to_string(), "COPY".to_string()]),
            user_name: Some("Admin".to_string()),
        };
        assert_eq!(operation_types_filter(Some(&spec)), "'INSERT', 'COPY'");
        assert_eq!(user_name_filter(Some(&spec)).as_deref(), Some("admin"));
    }

    #[test]
    fn information_schema_query_shape() {
        let sql = information_schema_query(&name(), &window());
        assert!(sql.contains("FROM DB.information_schema.tables"));
        assert!(sql.contains("last_altered >= to_timestamp_ltz(1690000000000, 3)"));
        assert!(sql.contains("last_altered < to_timestamp_ltz(1690086400000, 3)"));
        assert!(sql.contains("table_name = 'TBL'"));
        assert!(sql.contains("table_schema = 'SCH'"));
    }

    #[test]
    fn audit_log_query_shape() {
        let sql = audit_log_query(&name(), &window(), "'INSERT'", Some("admin"));
        assert!(sql.contains("snowflake.account_usage.access_history"));
        assert!(sql.contains("LATERAL FLATTEN(input => access_history.objects_modified)"));
        assert!(sql.contains("query_history.query_type IN ('INSERT')"));
        assert!(sql.contains("LOWER(access_history.user_name) = 'admin'"));
        assert!(sql.contains("IN ('db.sch.tbl')"));
    }

    #[test]
    fn cast_table() {
        assert_eq!(
            millis_to_timestamp_expr(1_690_000_000_000, "DATE").unwrap(),
            "DATE(TO_TIMESTAMP(1690000000000, 3))"
        );
        assert_eq!(
            millis_to_timestamp_expr(1_690_000_000_000, "DATETIME").unwrap(),
            "TO_TIMESTAMP(1690000000000, 3)::TIMESTAMP_NTZ"
        );
        assert!(millis_to_timestamp_expr(0, "VARCHAR").is_err());
    }

    #[test]
    fn field_query_shape() {
        let sql = field_query(&name(), "updated_at", "expr_a", "expr_b");
        assert!(sql.starts_with("SELECT updated_at AS last_altered_date FROM db.sch.tbl"));
        assert!(sql.contains("updated_at >= (expr_a)"));
        assert!(sql.contains("updated_at <= (expr_b)"));
        assert!(sql.ends_with("ORDER BY updated_at DESC"));
    }
}
