use std::path::Path;

use serde::Deserialize;

use crate::{ser::TableTemplate, Error};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub layer: LayerConfig,
    pub table: TableTemplate,
    pub duplicates: DuplicatePolicy,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LayerConfig {
    pub id: String,
    pub label_prefix: String,
}

impl Default for LayerConfig {
    fn default() -> Self {
        Self {
            id: "nodeslayer".to_string(),
            label_prefix: "FN".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DuplicatePolicy {
    #[default]
    Keep,
    Reject,
}

impl Config {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, Error> {
        let path = path.as_ref();
        let error = |message: String| Error::Config {
            path: path.to_path_buf(),
            message,
        };
        let content = std::fs::read_to_string(path).map_err(|err| error(err.to_string()))?;
        Self::from_toml(&content).map_err(|err| error(err.to_string()))
    }

    pub fn from_toml(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }
}

#[test]
fn empty_file_is_the_default() {
    let config = Config::from_toml("").unwrap();
    assert_eq!(config.layer.id, "nodeslayer");
    assert_eq!(config.layer.label_prefix, "FN");
    assert_eq!(config.duplicates, DuplicatePolicy::Keep);
    assert_eq!(config.table, TableTemplate::default());
}

#[test]
fn partial_sections_keep_defaults() {
    let config = Config::from_toml(
        r#"
        duplicates = "reject"

        [layer]
        id = "markers"

        [table]
        includes = []
        "#,
    )
    .unwrap();
    assert_eq!(config.layer.id, "markers");
    assert_eq!(config.layer.label_prefix, "FN");
    assert_eq!(config.duplicates, DuplicatePolicy::Reject);
    assert!(config.table.includes.is_empty());
    assert_eq!(config.table.close, TableTemplate::default().close);
}

#[test]
fn unknown_keys_are_rejected() {
    assert!(Config::from_toml("[layer]\nname = \"x\"").is_err());
    assert!(Config::from_toml("duplicates = \"merge\"").is_err());
}
