//! Ingestion-recipe parsing and secret substitution.
//!
//! Recipes arrive as serialized text (JSON or YAML) and may reference
//! secrets as `${NAME}` or `${NAME:-default}`. References are resolved
//! through the configured secret stores before the recipe is parsed.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;

use crate::error::ConnectionError;
use crate::secret::SecretStore;

/// One `${...}` reference found in recipe text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecretRef {
    pub name: String,
    pub default: Option<String>,
}

/// Scan recipe text for `${NAME}` / `${NAME:-default}` references.
pub fn find_secret_refs(text: &str) -> Vec<SecretRef> {
    let mut refs = Vec::new();
    let mut rest = text;

    while let Some(start) = rest.find("${") {
        let after = &rest[start + 2..];
        let Some(end) = after.find('}') else {
            break;
        };
        let body = &after[..end];
        let (name, default) = match body.split_once(":-") {
            Some((name, default)) => (name, Some(default.to_string())),
            None => (body, None),
        };
        if !name.is_empty() && refs.iter().all(|r: &SecretRef| r.name != name) {
            refs.push(SecretRef {
                name: name.to_string(),
                default,
            });
        }
        rest = &after[end + 1..];
    }

    refs
}

/// Substitute secret references and parse the recipe.
///
/// Stores are consulted in order; the first value found for a name wins.
/// A reference with no resolved value and no default is an error, since
/// a recipe with an unresolved password is useless downstream.
pub async fn resolve_recipe(
    text: &str,
    stores: &[Arc<dyn SecretStore>],
) -> Result<Value, ConnectionError> {
    let refs = find_secret_refs(text);

    let mut values: HashMap<String, String> = HashMap::new();
    if !refs.is_empty() {
        let names: Vec<String> = refs.iter().map(|r| r.name.clone()).collect();
        for store in stores {
            let outstanding: Vec<String> = names
                .iter()
                .filter(|n| !values.contains_key(*n))
                .cloned()
                .collect();
            if outstanding.is_empty() {
                break;
            }
            for (name, value) in store.resolve(&outstanding).await? {
                values.entry(name).or_insert(value);
            }
        }
    }

    let mut resolved = text.to_string();
    for r in &refs {
        let replacement = match values.get(&r.name).cloned().or_else(|| r.default.clone()) {
            Some(v) => v,
            None => {
                return Err(ConnectionError::Secret(format!(
                    "no value for secret {:?}",
                    r.name
                )))
            }
        };
        let pattern = match &r.default {
            Some(default) => format!("${{{}:-{}}}", r.name, default),
            None => format!("${{{}}}", r.name),
        };
        resolved = resolved.replace(&pattern, &replacement);
    }

    parse_recipe(&resolved)
}

/// Parse recipe text as JSON first, falling back to YAML.
pub fn parse_recipe(text: &str) -> Result<Value, ConnectionError> {
    if let Ok(value) = serde_json::from_str::<Value>(text) {
        return Ok(value);
    }
    serde_yaml::from_str::<Value>(text)
        .map_err(|e| ConnectionError::Config(format!("unparseable recipe: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    struct FixedStore(HashMap<String, String>);

    #[async_trait]
    impl SecretStore for FixedStore {
        fn store_name(&self) -> &str {
            "fixed"
        }
        async fn resolve(
            &self,
            names: &[String],
        ) -> Result<HashMap<String, String>, ConnectionError> {
            Ok(names
                .iter()
                .filter_map(|n| self.0.get(n).map(|v| (n.clone(), v.clone())))
                .collect())
        }
    }

    #[test]
    fn finds_refs_with_defaults() {
        let refs = find_secret_refs("user: ${SNOW_USER}\npass: ${SNOW_PASS:-fallback}");
        assert_eq!(refs.len(), 2);
        assert_eq!(refs[0].name, "SNOW_USER");
        assert_eq!(refs[1].default.as_deref(), Some("fallback"));
    }

    #[tokio::test]
    async fn substitutes_and_parses_json() {
        let store: Arc<dyn SecretStore> = Arc::new(FixedStore(HashMap::from([(
            "PASSWORD".to_string(),
            "hunter2".to_string(),
        )])));

        let recipe = r#"{"source":{"type":"snowflake","config":{"password":"${PASSWORD}"}}}"#;
        let value = resolve_recipe(recipe, &[store]).await.unwrap();
        assert_eq!(value["source"]["config"]["password"], "hunter2");
    }

    #[tokio::test]
    async fn substitutes_and_parses_yaml() {
        let store: Arc<dyn SecretStore> = Arc::new(FixedStore(HashMap::new()));

        let recipe = "source:\n  type: redshift\n  config:\n    database: ${DB:-analytics}\n";
        let value = resolve_recipe(recipe, &[store]).await.unwrap();
        assert_eq!(value["source"]["config"]["database"], "analytics");
    }

    #[tokio::test]
    async fn missing_secret_is_an_error() {
        let store: Arc<dyn SecretStore> = Arc::new(FixedStore(HashMap::new()));
        let recipe = r#"{"password":"${NOPE}"}"#;
        assert!(resolve_recipe(recipe, &[store]).await.is_err());
    }
}
