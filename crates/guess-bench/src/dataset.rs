//! Loads the identity catalog from a JSON file.
//!
//! The expected layout is an array of `{"name": ..., "attributes": {attr: 0 | 1 | bool}}`.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use guess_core::{Catalog, GameError, Identity};
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("failed to read catalog {path:?}: {source}")]
    Read {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },
    #[error("failed to parse catalog JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("identity '{identity}' has non-binary value {value} for '{attribute}'")]
    InvalidValue {
        identity: String,
        attribute: String,
        value: String,
    },
    #[error("invalid catalog: {0}")]
    Catalog(#[from] GameError),
}

#[derive(Debug, Deserialize)]
struct RawIdentity {
    name: String,
    #[serde(default)]
    attributes: BTreeMap<String, Value>,
}

pub fn load_catalog(path: impl AsRef<Path>) -> Result<Catalog, DatasetError> {
    let path = path.as_ref();
    let json = fs::read_to_string(path).map_err(|source| DatasetError::Read {
        source,
        path: path.to_path_buf(),
    })?;
    parse_catalog(&json)
}

pub fn parse_catalog(json: &str) -> Result<Catalog, DatasetError> {
    let raw: Vec<RawIdentity> = serde_json::from_str(json)?;
    let mut identities = Vec::with_capacity(raw.len());
    for entry in raw {
        let mut attributes = Vec::with_capacity(entry.attributes.len());
        for (attribute, value) in &entry.attributes {
            let Some(flag) = binary(value) else {
                return Err(DatasetError::InvalidValue {
                    identity: entry.name.clone(),
                    attribute: attribute.clone(),
                    value: value.to_string(),
                });
            };
            attributes.push((attribute.clone(), flag));
        }
        identities.push(Identity::new(entry.name, attributes));
    }
    Ok(Catalog::new(identities)?)
}

fn binary(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(flag) => Some(*flag),
        Value::Number(number) => match number.as_f64() {
            Some(v) if v == 0.0 => Some(false),
            Some(v) if v == 1.0 => Some(true),
            _ => None,
        },
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_numeric_and_boolean_flags() {
        let catalog = parse_catalog(
            r#"[
                {"name": "Ada", "attributes": {"scientist": 1, "alive": false}},
                {"name": "Bo", "attributes": {"singer": true, "alive": 1.0}}
            ]"#,
        )
        .expect("valid catalog");

        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.attributes(), ["alive", "scientist", "singer"]);
        let bo = catalog.identity("Bo").expect("Bo present");
        assert!(bo.has("alive"));
        assert!(!bo.has("scientist"));
    }

    #[test]
    fn rejects_non_binary_values() {
        let err = parse_catalog(r#"[{"name": "Ada", "attributes": {"tall": 0.5}}]"#)
            .expect_err("fractional value");
        assert!(matches!(
            err,
            DatasetError::InvalidValue { ref attribute, .. } if attribute == "tall"
        ));
    }

    #[test]
    fn empty_catalog_is_a_configuration_error() {
        let err = parse_catalog("[]").expect_err("empty");
        assert!(matches!(err, DatasetError::Catalog(GameError::EmptyCatalog)));
    }
}
