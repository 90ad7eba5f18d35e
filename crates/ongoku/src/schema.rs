//! Schema documents exchanged with the project service.
//!
//! A schema document is a plain mapping. On disk it is YAML, but a file that
//! fails to parse as YAML is given a second chance as JSON before it is
//! rejected. The service does the semantic validation.

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{Result, SyncError};

/// Encoding a document was successfully decoded from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoding {
    Yaml,
    Json,
}

impl fmt::Display for Encoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Encoding::Yaml => write!(f, "yaml"),
            Encoding::Json => write!(f, "json"),
        }
    }
}

/// Neither decoder accepted the document.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("not valid YAML ({yaml}) and not valid JSON ({json})")]
pub struct SchemaFormatError {
    pub yaml: String,
    pub json: String,
}

/// A project's declarative definition.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SchemaDocument(Map<String, Value>);

impl SchemaDocument {
    pub fn new(map: Map<String, Value>) -> Self {
        Self(map)
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn into_map(self) -> Map<String, Value> {
        self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Decodes YAML, falling back to JSON. The first decoder that yields a
    /// mapping wins.
    pub fn decode(text: &str) -> std::result::Result<(Self, Encoding), SchemaFormatError> {
        let yaml = match serde_yaml::from_str::<Value>(text) {
            Ok(value) => match into_mapping(value) {
                Ok(document) => return Ok((document, Encoding::Yaml)),
                Err(reason) => reason,
            },
            Err(e) => e.to_string(),
        };

        let json = match serde_json::from_str::<Value>(text) {
            Ok(value) => match into_mapping(value) {
                Ok(document) => {
                    log::debug!("Schema is not valid YAML, decoded as JSON");
                    return Ok((document, Encoding::Json));
                }
                Err(reason) => reason,
            },
            Err(e) => e.to_string(),
        };

        Err(SchemaFormatError { yaml, json })
    }

    /// Reads and decodes a schema file.
    pub fn read(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| SyncError::ReadFile {
            path: path.to_path_buf(),
            source: e,
        })?;

        Self::decode(&text)
            .map(|(document, _)| document)
            .map_err(|source| SyncError::SchemaFormat {
                path: path.to_path_buf(),
                source,
            })
    }

    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(&self.0).map_err(|e| SyncError::SerializeYaml(e.to_string()))
    }

    /// Writes the document as YAML.
    pub fn write(&self, path: &Path) -> Result<()> {
        let yaml = self.to_yaml()?;
        std::fs::write(path, yaml).map_err(|e| SyncError::WriteFile {
            path: path.to_path_buf(),
            source: e,
        })
    }
}

fn into_mapping(value: Value) -> std::result::Result<SchemaDocument, String> {
    match value {
        Value::Object(map) => Ok(SchemaDocument(map)),
        Value::Null => Err("document is empty".to_string()),
        other => Err(format!(
            "expected a mapping at the top level, found {}",
            kind_of(&other)
        )),
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a sequence",
        Value::Object(_) => "a mapping",
    }
}
