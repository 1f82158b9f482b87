//! Declarative schema types.
//!
//! A region document describes one form:
//!
//! ```json
//! {
//!   "country": "Netherlands",
//!   "fields": [
//!     { "id": "first_name", "label": "First Name", "type": "text", "required": true },
//!     { "id": "bsn", "label": "BSN", "type": "text", "required": true,
//!       "validation": { "regex": "^[0-9]{9}$", "message": "BSN must be 9 digits." } }
//!   ]
//! }
//! ```
//!
//! The manifest lists the selectable regions and the document for each:
//!
//! ```json
//! [{ "code": "NL", "name": "Netherlands", "configFile": "NL.json" }]
//! ```

use std::{collections::HashSet, fmt, path::PathBuf};

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Errors raised while loading or checking schema documents.
#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    /// A field has an empty identifier.
    #[error("field #{index} has an empty id")]
    EmptyId { index: usize },
    /// Two fields share the same identifier.
    #[error("duplicate field id `{id}`")]
    DuplicateId { id: String },
    /// The region code is not listed in the manifest.
    #[error("region `{code}` is not listed in the manifest")]
    UnknownRegion { code: String },
    /// A document could not be read.
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// A document is not valid JSON for the expected shape.
    #[error("invalid schema document: {0}")]
    Json(#[from] serde_json::Error),
}

/// Value semantics of a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    /// Free text.
    Text,
    /// Integer input; numeric bounds apply when the value parses.
    Number,
    /// Date in `dd/MM/yyyy` form, defaulted to today.
    Date,
}

impl FieldType {
    /// Name used in schema documents.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Number => "number",
            Self::Date => "date",
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Optional rule set attached to a field.
///
/// Every bound is checked on its own; `min_length > max_length` is not an
/// error, it simply makes the field impossible to satisfy.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ValidationRules {
    /// Pattern the whole trimmed value must match.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub regex: Option<String>,
    /// Message used instead of the generated one for any failing rule.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Minimum number of characters.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_length: Option<usize>,
    /// Maximum number of characters.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_length: Option<usize>,
    /// Minimum integer value.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_value: Option<i64>,
    /// Maximum integer value.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_value: Option<i64>,
}

/// Declarative description of one form field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct FieldSchema {
    /// Unique within a form. Used as payload key and prefill key.
    pub id: String,
    /// Display text.
    pub label: String,
    /// Field type.
    #[serde(rename = "type")]
    pub field_type: FieldType,
    /// Whether an empty value is rejected.
    pub required: bool,
    /// Optional validation rules.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validation: Option<ValidationRules>,
}

impl FieldSchema {
    /// Create a field without validation rules.
    pub fn new(
        id: impl Into<String>,
        label: impl Into<String>,
        field_type: FieldType,
        required: bool,
    ) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            field_type,
            required,
            validation: None,
        }
    }

    /// Attach a rule set.
    pub fn with_validation(mut self, rules: ValidationRules) -> Self {
        self.validation = Some(rules);
        self
    }
}

/// A complete per-region form document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct FormSchema {
    /// Display name of the region the form belongs to.
    pub country: String,
    /// Fields in display order.
    pub fields: Vec<FieldSchema>,
}

impl FormSchema {
    /// Parse a region document and check its field ids.
    pub fn from_json(content: &str) -> Result<Self, SchemaError> {
        let schema: FormSchema = serde_json::from_str(content)?;
        schema.check()?;
        Ok(schema)
    }

    /// Check that every field id is non-empty and unique.
    pub fn check(&self) -> Result<(), SchemaError> {
        let mut seen = HashSet::new();
        for (index, field) in self.fields.iter().enumerate() {
            if field.id.is_empty() {
                return Err(SchemaError::EmptyId { index });
            }
            if !seen.insert(field.id.as_str()) {
                return Err(SchemaError::DuplicateId {
                    id: field.id.clone(),
                });
            }
        }
        Ok(())
    }

    /// Look up a field by id.
    pub fn field(&self, id: &str) -> Option<&FieldSchema> {
        self.fields.iter().find(|f| f.id == id)
    }
}

/// One entry of the region manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegionInfo {
    /// Selectable region id, also the key for prefill sources.
    pub code: String,
    /// Display name.
    pub name: String,
    /// Name of the region document, relative to the manifest.
    pub config_file: String,
}
