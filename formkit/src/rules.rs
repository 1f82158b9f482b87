//! Field rule evaluation.
//!
//! [`evaluate`] runs the checks of a field in a fixed order and stops at the
//! first failure:
//!
//! 1. required: an empty (trimmed) value fails when the field is required
//! 2. an empty value on an optional field passes without further checks
//! 3. `minLength` / `maxLength` on the trimmed character count
//! 4. `minValue` / `maxValue`, only when the trimmed value is an integer;
//!    integers too large for `i64` fail the bound on their side
//! 5. `regex`, which must match the whole trimmed value
//!
//! "Trimmed" strips Unicode whitespace, line breaks included.
//!
//! The evaluator is a pure function of its inputs. Callers that validate the
//! same field repeatedly can compile its pattern once with
//! [`compile_pattern`] and use [`evaluate_with`].

use std::num::IntErrorKind;

use log::warn;
use regex::Regex;

use crate::schema::ValidationRules;

/// Message reported for an empty required field.
pub const REQUIRED_MESSAGE: &str = "This field is required.";

/// Message reported for a pattern mismatch without a custom message.
pub const INVALID_FORMAT_MESSAGE: &str = "Invalid format.";

/// A user-facing validation failure for one field.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct ValidationError {
    /// Message to display next to the field.
    pub message: String,
}

impl ValidationError {
    /// An error carrying `message`.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// Use the rule set's custom message if it has one.
    fn from_rules(rules: &ValidationRules, generated: impl FnOnce() -> String) -> Self {
        match &rules.message {
            Some(m) => Self::new(m.clone()),
            None => Self::new(generated()),
        }
    }
}

/// Compile a `regex` rule so that it must match a whole value.
///
/// Returns `None`, with a warning, when the pattern does not compile; the
/// pattern check is then skipped.
pub fn compile_pattern(pattern: &str) -> Option<Regex> {
    match Regex::new(&format!("^(?:{pattern})$")) {
        Ok(re) => Some(re),
        Err(e) => {
            warn!("Skipping invalid validation pattern {pattern:?}: {e}");
            None
        }
    }
}

/// Evaluate a field value against its required flag and optional rules.
pub fn evaluate(
    value: &str,
    required: bool,
    rules: Option<&ValidationRules>,
) -> Result<(), ValidationError> {
    let pattern = rules
        .and_then(|r| r.regex.as_deref())
        .and_then(compile_pattern);
    evaluate_with(value, required, rules, pattern.as_ref())
}

/// [`evaluate`] with the `regex` rule already compiled by [`compile_pattern`].
///
/// `pattern` stands in for `rules.regex`; `None` skips the pattern check.
pub fn evaluate_with(
    value: &str,
    required: bool,
    rules: Option<&ValidationRules>,
    pattern: Option<&Regex>,
) -> Result<(), ValidationError> {
    let trimmed = value.trim();

    if trimmed.is_empty() {
        if required {
            return Err(ValidationError::new(REQUIRED_MESSAGE));
        }
        return Ok(());
    }

    let Some(rules) = rules else {
        return Ok(());
    };

    check_length(trimmed, rules)?;
    check_value(trimmed, rules)?;
    check_pattern(trimmed, rules, pattern)?;

    Ok(())
}

fn check_length(trimmed: &str, rules: &ValidationRules) -> Result<(), ValidationError> {
    let len = trimmed.chars().count();

    if let Some(min) = rules.min_length
        && len < min
    {
        return Err(ValidationError::from_rules(rules, || {
            format!("Must be at least {min} characters.")
        }));
    }
    if let Some(max) = rules.max_length
        && len > max
    {
        return Err(ValidationError::from_rules(rules, || {
            format!("Must be at most {max} characters.")
        }));
    }
    Ok(())
}

fn check_value(trimmed: &str, rules: &ValidationRules) -> Result<(), ValidationError> {
    if rules.min_value.is_none() && rules.max_value.is_none() {
        return Ok(());
    }
    let (below, above) = match trimmed.parse::<i64>() {
        Ok(n) => (
            rules.min_value.is_some_and(|min| n < min),
            rules.max_value.is_some_and(|max| n > max),
        ),
        Err(e) => match e.kind() {
            IntErrorKind::PosOverflow => (false, rules.max_value.is_some()),
            IntErrorKind::NegOverflow => (rules.min_value.is_some(), false),
            // Non-numeric input is not this check's concern.
            _ => return Ok(()),
        },
    };

    if below && let Some(min) = rules.min_value {
        return Err(ValidationError::from_rules(rules, || {
            format!("Must be at least {min}.")
        }));
    }
    if above && let Some(max) = rules.max_value {
        return Err(ValidationError::from_rules(rules, || {
            format!("Must be at most {max}.")
        }));
    }
    Ok(())
}

fn check_pattern(
    trimmed: &str,
    rules: &ValidationRules,
    pattern: Option<&Regex>,
) -> Result<(), ValidationError> {
    let Some(re) = pattern else {
        return Ok(());
    };

    if re.is_match(trimmed) {
        Ok(())
    } else {
        Err(ValidationError::from_rules(rules, || {
            INVALID_FORMAT_MESSAGE.to_string()
        }))
    }
}
