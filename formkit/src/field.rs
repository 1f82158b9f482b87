use std::sync::{Arc, OnceLock};

use chrono::{Local, NaiveDate};
use regex::Regex;

use crate::{
    DATE_FORMAT,
    rules::{compile_pattern, evaluate_with},
    schema::{FieldSchema, FieldType},
};

/// Live state of one field during a form session.
#[derive(Debug, Clone)]
pub struct FieldState {
    schema: Arc<FieldSchema>,
    value: String,
    error: Option<String>,
    read_only: bool,
    /// `regex` rule compiled on first validation.
    pattern: OnceLock<Option<Regex>>,
}

impl FieldState {
    /// Create the state for a field, using the local date for date defaults.
    pub fn new(schema: Arc<FieldSchema>) -> Self {
        Self::new_on(schema, Local::now().date_naive())
    }

    /// Create the state for a field with an explicit "today".
    ///
    /// Date fields never start empty: they are initialised to `today`
    /// formatted as `dd/MM/yyyy`.
    pub fn new_on(schema: Arc<FieldSchema>, today: NaiveDate) -> Self {
        let value = match schema.field_type {
            FieldType::Date => today.format(DATE_FORMAT).to_string(),
            FieldType::Text | FieldType::Number => String::new(),
        };
        Self {
            schema,
            value,
            error: None,
            read_only: false,
            pattern: OnceLock::new(),
        }
    }

    /// Field id: payload key and prefill lookup key.
    pub fn id(&self) -> &str {
        &self.schema.id
    }

    /// Display label.
    pub fn label(&self) -> &str {
        &self.schema.label
    }

    /// Value semantics of the field.
    pub fn field_type(&self) -> FieldType {
        self.schema.field_type
    }

    /// Whether an empty value fails validation.
    pub fn is_required(&self) -> bool {
        self.schema.required
    }

    /// Current raw value, untrimmed.
    pub fn value(&self) -> &str {
        &self.value
    }

    /// Error from the last validation, cleared on the next edit.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Whether user edits are rejected.
    pub fn is_read_only(&self) -> bool {
        self.read_only
    }

    /// Apply a user edit.
    ///
    /// Returns `false` without touching anything when the field is read-only.
    /// Otherwise the value is stored and any pending error is cleared.
    pub fn set_value(&mut self, value: impl Into<String>) -> bool {
        if self.read_only {
            return false;
        }
        self.value = value.into();
        self.error = None;
        true
    }

    /// Lock or unlock the field against user edits.
    pub fn set_read_only(&mut self, read_only: bool) {
        self.read_only = read_only;
    }

    /// Value written by the prefill merge; bypasses the read-only guard.
    pub(crate) fn fill(&mut self, value: &str) {
        self.value = value.to_string();
        self.error = None;
    }

    /// Run the full rule set and record the outcome.
    pub fn validate(&mut self) -> bool {
        self.error = None;
        let rules = self.schema.validation.as_ref();
        let pattern = self
            .pattern
            .get_or_init(|| rules.and_then(|r| r.regex.as_deref()).and_then(compile_pattern));
        match evaluate_with(&self.value, self.schema.required, rules, pattern.as_ref()) {
            Ok(()) => true,
            Err(e) => {
                self.error = Some(e.message);
                false
            }
        }
    }

    /// Cheap check used for submit enablement: optional, or non-empty.
    ///
    /// Weaker than [`validate`](Self::validate); pattern, length and bound
    /// rules are only enforced at submit time.
    pub fn is_valid_for_submission(&self) -> bool {
        !self.schema.required || !self.value.trim().is_empty()
    }
}
