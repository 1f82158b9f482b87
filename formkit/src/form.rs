//! The form aggregator.
//!
//! A [`Form`] owns the ordered [`FieldState`]s of one submission. Enablement
//! is derived on every call rather than cached, so it can never go stale
//! after an edit.

use std::{fmt, sync::Arc};

use chrono::{Local, NaiveDate};
use serde::{Serialize, Serializer};

use crate::{field::FieldState, schema::FormSchema};

/// Returned by [`FormSubmission::to_json_pretty`] if encoding fails.
pub const ENCODE_ERROR_MESSAGE: &str = "Error: Could not encode data.";

/// Validated payload: field id → value, in schema order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormSubmission {
    entries: Vec<(String, String)>,
}

impl FormSubmission {
    /// Submitted value of a field.
    pub fn get(&self, id: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == id)
            .map(|(_, v)| v.as_str())
    }

    /// `(id, value)` pairs in schema order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Number of submitted fields.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the form had no fields.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Pretty-printed JSON object, or [`ENCODE_ERROR_MESSAGE`].
    pub fn to_json_pretty(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_else(|e| {
            log::error!("Failed to encode submission: {e}");
            ENCODE_ERROR_MESSAGE.to_string()
        })
    }
}

impl Serialize for FormSubmission {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(self.entries.iter().map(|(k, v)| (k, v)))
    }
}

/// One failing field of a rejected submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    /// Id of the failing field.
    pub field_id: String,
    /// Message stored on the field.
    pub message: String,
}

/// Every field error of a rejected submission, in schema order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationFailure {
    /// One entry per failing field.
    pub errors: Vec<FieldError>,
}

impl fmt::Display for ValidationFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} field(s) failed validation", self.errors.len())?;
        for e in &self.errors {
            write!(f, "\n  {}: {}", e.field_id, e.message)?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationFailure {}

/// Ordered collection of field states for one submission.
#[derive(Debug, Clone)]
pub struct Form {
    fields: Vec<FieldState>,
}

impl Form {
    /// Build one field state per schema field, in order.
    pub fn from_schema(schema: &FormSchema) -> Self {
        Self::new_on(schema, Local::now().date_naive())
    }

    /// Like [`from_schema`](Self::from_schema) with an explicit date for
    /// date field defaults.
    pub fn new_on(schema: &FormSchema, today: NaiveDate) -> Self {
        let fields = schema
            .fields
            .iter()
            .map(|f| FieldState::new_on(Arc::new(f.clone()), today))
            .collect();
        Self { fields }
    }

    /// Field states in schema order.
    pub fn fields(&self) -> &[FieldState] {
        &self.fields
    }

    /// Mutable field states, for the prefill merge.
    pub fn fields_mut(&mut self) -> &mut [FieldState] {
        &mut self.fields
    }

    /// Look up a field by id.
    pub fn field(&self, id: &str) -> Option<&FieldState> {
        self.fields.iter().find(|f| f.id() == id)
    }

    /// Look up a field by id for mutation.
    pub fn field_mut(&mut self, id: &str) -> Option<&mut FieldState> {
        self.fields.iter_mut().find(|f| f.id() == id)
    }

    /// Route a user edit. `false` for an unknown id or a read-only field.
    pub fn set_value(&mut self, id: &str, value: impl Into<String>) -> bool {
        match self.field_mut(id) {
            Some(field) => field.set_value(value),
            None => false,
        }
    }

    /// Whether the submit action is currently permitted.
    ///
    /// Only checks that required fields are non-empty. Pattern, length and
    /// bound rules run in [`Form::submit`], which can still fail while this
    /// returns `true`.
    pub fn is_submit_enabled(&self) -> bool {
        self.fields.iter().all(FieldState::is_valid_for_submission)
    }

    /// Validate every field and build the payload if all of them pass.
    ///
    /// All fields are validated, so each one carries its error afterwards.
    pub fn submit(&mut self) -> Result<FormSubmission, ValidationFailure> {
        let mut errors = Vec::new();
        for field in &mut self.fields {
            if !field.validate() {
                errors.push(FieldError {
                    field_id: field.id().to_string(),
                    message: field.error().unwrap_or_default().to_string(),
                });
            }
        }

        if !errors.is_empty() {
            return Err(ValidationFailure { errors });
        }

        Ok(FormSubmission {
            entries: self
                .fields
                .iter()
                .map(|f| (f.id().to_string(), f.value().to_string()))
                .collect(),
        })
    }

    /// Current per-field errors, in schema order.
    pub fn errors(&self) -> Vec<FieldError> {
        self.fields
            .iter()
            .filter_map(|f| {
                f.error().map(|m| FieldError {
                    field_id: f.id().to_string(),
                    message: m.to_string(),
                })
            })
            .collect()
    }
}
