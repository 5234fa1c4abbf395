//! Redshift query construction.

use vigil_core::model::{AuditLogSpec, ValidationWindow};
use vigil_core::urn::DatasetName;

use crate::error::SourceError;

/// Column types usable as a freshness watermark.
pub const SUPPORTED_COLUMN_TYPES: &[&str] = &[
    "DATE",
    "TIMESTAMP",
    "TIMESTAMP WITHOUT TIME ZONE",
    "TIMESTAMPTZ",
    "TIMESTAMP WITH TIME ZONE",
];

/// Lower-cased user-name filter, when requested.
pub fn user_name_filter(spec: Option<&AuditLogSpec>) -> Option<String> {
    spec.and_then(|s| s.user_name.as_ref())
        .map(|u| u.to_lowercase())
}

/// Convert epoch millis to a comparison expression in the column's
/// native type.
pub fn millis_to_timestamp_expr(millis: i64, column_type: &str) -> Result<String, SourceError> {
    let seconds = millis as f64 / 1000.0;
    let expr = match column_type.to_uppercase().as_str() {
        "TIMESTAMP" | "TIMESTAMP WITHOUT TIME ZONE" => {
            format!("TIMESTAMP 'epoch' + {seconds} * INTERVAL '1 second'")
        }
        "TIMESTAMPTZ" | "TIMESTAMP WITH TIME ZONE" => {
            format!("TIMESTAMPTZ 'epoch' + {seconds} * INTERVAL '1 second'")
        }
        "DATE" => format!("(TIMESTAMP 'epoch' + {seconds} * INTERVAL '1 second')::DATE"),
        other => return Err(SourceError::UnsupportedColumnType(other.to_string())),
    };
    Ok(expr)
}

/// Insert-operation scan over the STL insert log.
///
/// The system tables cannot be filtered by table id up front, so the
/// join against `svv_table_info` narrows to the target table. Aborted
/// queries and zero-row inserts are excluded.
pub fn insert_audit_query(
    name: &DatasetName,
    window: &ValidationWindow,
    user_name: Option<&str>,
) -> String {
    let start_secs = window.start_ms as f64 / 1000.0;
    let end_secs = window.end_ms as f64 / 1000.0;

    let user_clause = match user_name {
        Some(user) => format!("AND sui.usename = '{user}'"),
        None => String::new(),
    };

    format!(
        "SELECT sq.querytxt AS query, sui.usename AS username, si.endtime AS endtime \
         FROM stl_insert si \
         JOIN svv_table_info sti ON si.tbl = sti.table_id \
         JOIN stl_query sq ON si.query = sq.query \
         JOIN svl_user_info sui ON sq.userid = sui.usesysid \
         WHERE si.endtime >= (TIMESTAMP 'epoch' + {start_secs} * interval '1 second') \
         AND si.endtime < (TIMESTAMP 'epoch' + {end_secs} * interval '1 second') \
         AND sq.starttime >= (TIMESTAMP 'epoch' + {start_secs} * interval '1 second') \
         AND sq.endtime < (TIMESTAMP 'epoch' + {end_secs} * interval '1 second') \
         AND sq.aborted = 0 \
         AND si.rows > 0 \
         AND sti.database = '{database}' \
         AND sti.schema = '{schema}' \
         AND sti.table = '{table}' \
         {user_clause} \
         ORDER BY endtime DESC",
        database = name.catalog,
        schema = name.schema,
        table = name.table,
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
