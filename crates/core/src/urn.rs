//! Catalog URN decoding.
//!
//! Dataset urns look like
//! `urn:li:dataset:(urn:li:dataPlatform:snowflake,db.sch.tbl,PROD)`:
//! a parenthesised tuple of (platform urn, dotted dataset name, fabric).
//! The dotted name may carry a leading platform-instance token, which is
//! stripped by keeping the first three parts.

use crate::error::MonitorError;

/// Entity type token of a urn, e.g. `dataset` or `dataPlatform`.
pub fn entity_type(urn: &str) -> Result<&str, MonitorError> {
    let mut parts = urn.splitn(4, ':');
    match (parts.next(), parts.next(), parts.next()) {
        (Some("urn"), Some("li"), Some(entity)) => Ok(entity),
        _ => Err(MonitorError::InvalidUrn {
            urn: urn.to_string(),
            reason: "expected urn:li:<type>:... prefix".to_string(),
        }),
    }
}

/// Platform token from a data platform urn,
/// e.g. `urn:li:dataPlatform:snowflake` → `snowflake`.
pub fn platform_name(platform_urn: &str) -> Result<&str, MonitorError> {
    if entity_type(platform_urn)? != "dataPlatform" {
        return Err(MonitorError::InvalidUrn {
            urn: platform_urn.to_string(),
            reason: "not a dataPlatform urn".to_string(),
        });
    }
    platform_urn
        .rsplit(':')
        .next()
        .filter(|s| !s.is_empty())
        .ok_or_else(|| MonitorError::InvalidUrn {
            urn: platform_urn.to_string(),
            reason: "missing platform name".to_string(),
        })
}

/// The three-part dataset coordinates decoded from a dataset urn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatasetName {
    pub catalog: String,
    pub schema: String,
    pub table: String,
}

impl DatasetName {
    /// Render as the lower-cased dotted name `catalog.schema.table`.
    pub fn dotted(&self) -> String {
        format!("{}.{}.{}", self.catalog, self.schema, self.table)
    }
}

/// Decode the dotted dataset name from a dataset urn.
///
/// The name is lower-cased and split on `.`. Names with more than three
/// parts are assumed to be prefixed with a platform-instance token; only
/// the first three parts are kept.
pub fn dataset_name(dataset_urn: &str) -> Result<DatasetName, MonitorError> {
    if entity_type(dataset_urn)? != "dataset" {
        return Err(MonitorError::InvalidUrn {
            urn: dataset_urn.to_string(),
            reason: "not a dataset urn".to_string(),
        });
    }

    let invalid = |reason: &str| MonitorError::InvalidUrn {
        urn: dataset_urn.to_string(),
        reason: reason.to_string(),
    };

    let open = dataset_urn.find('(').ok_or_else(|| invalid("missing tuple"))?;
    let close = dataset_urn.rfind(')').ok_or_else(|| invalid("missing tuple"))?;
    if close <= open {
        return Err(invalid("malformed tuple"));
    }

    let tuple = &dataset_urn[open + 1..close];
    let name = tuple
        .split(',')
        .nth(1)
        .ok_or_else(|| invalid("tuple missing dataset name"))?;

    let name = name.to_lowercase();
    let mut parts: Vec<&str> = name.split('.').collect();
    if parts.len() > 3 {
        // Handle platform-instance prefixed names.
        parts.truncate(3);
    }
    if parts.len() != 3 || parts.iter().any(|p| p.is_empty()) {
        return Err(invalid("expected catalog.schema.table name"));
    }

    Ok(DatasetName {
        catalog: parts[0].to_string(),
        schema: parts[1].to_string(),
        table: parts[2].to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const SNOWFLAKE_URN: &str =
        "urn:li:dataset:(urn:li:dataPlatform:snowflake,Db.Sch.Tbl,PROD)";

    #[test]
    fn decodes_entity_type() {
        assert_eq!(entity_type(SNOWFLAKE_URN).unwrap(), "dataset");
        assert_eq!(
            entity_type("urn:li:dataPlatform:snowflake").unwrap(),
            "dataPlatform"
        );
        assert!(entity_type("not-a-urn").is_err());
    }

    #[test]
    fn decodes_platform_name() {
        assert_eq!(
            platform_name("urn:li:dataPlatform:bigquery").unwrap(),
            "bigquery"
        );
        assert!(platform_name(SNOWFLAKE_URN).is_err());
    }

    #[test]
    fn decodes_dataset_name_lowercased() {
        let name = dataset_name(SNOWFLAKE_URN).unwrap();
        assert_eq!(
            name,
            DatasetName {
                catalog: "db".to_string(),
                schema: "sch".to_string(),
                table: "tbl".to_string(),
            }
        );
        assert_eq!(name.dotted(), "db.sch.tbl");
    }

    #[test]
    fn strips_platform_instance_prefix() {
        let urn = "urn:li:dataset:(urn:li:dataPlatform:snowflake,instance1.db.sch.tbl,PROD)";
        let name = dataset_name(urn).unwrap();
        assert_eq!(name.catalog, "instance1");
        assert_eq!(name.schema, "db");
        assert_eq!(name.table, "sch");
    }

    #[test]
    fn rejects_short_names() {
        let urn = "urn:li:dataset:(urn:li:dataPlatform:snowflake,only.two,PROD)";
        assert!(dataset_name(urn).is_err());
    }
}
