//! Terminal form filling.
//!
//! Drives a [`FormSession`] from the command line: waits for prefill data,
//! applies `FIELD=VALUE` edits, optionally prompts for each editable field,
//! then submits and prints either the JSON payload or the field errors.

use std::time::Duration;

use anyhow::Context;
use colored::Colorize;
use formkit::{FieldState, FormSession, SessionError};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines, Stdin};

use crate::{ctx::AppContext, utils::parse_assignment};

/// Handler for the `fill` command.
pub struct FillHandler;

impl FillHandler {
    /// Fills in and submits the form for a region.
    ///
    /// # Arguments
    ///
    /// * `ctx` - The application context.
    /// * `code` - Region code from the manifest.
    /// * `assignments` - `FIELD=VALUE` edits applied before submitting.
    /// * `interactive` - Prompt for editable fields, and again for failing ones.
    ///
    /// # Returns
    ///
    /// `true` if the form was submitted, `false` if validation failed.
    ///
    /// # Errors
    ///
    /// Returns an error for unknown regions or fields, or malformed edits.
    pub async fn handle_fill(
        ctx: &AppContext,
        code: &str,
        assignments: &[String],
        interactive: bool,
    ) -> anyhow::Result<bool> {
        let mut session = ctx.open_session(code)?;
        println!("{}", session.title().bold().cyan());

        wait_for_prefill(&mut session).await;

        for raw in assignments {
            let (id, value) = parse_assignment(raw)?;
            apply_edit(&mut session, &id, value)?;
        }

        let mut input = BufReader::new(tokio::io::stdin()).lines();
        if interactive {
            let ids: Vec<String> = session
                .fields()
                .iter()
                .filter(|f| !f.is_read_only())
                .map(|f| f.id().to_string())
                .collect();
            if !prompt_fields(&mut session, &ids, &mut input).await? {
                return Ok(false);
            }
        }

        loop {
            print_fields(&session);
            match session.submit() {
                Ok(_) => {
                    println!("{}", "Submission Successful".green().bold());
                    println!("{}", session.submission_result().unwrap_or_default());
                    session.dismiss_result();
                    return Ok(true);
                }
                Err(SessionError::Invalid(failure)) => {
                    println!("{}", failure.to_string().red());
                    if !interactive {
                        return Ok(false);
                    }
                    let ids = editable_failures(&session);
                    if ids.is_empty() {
                        return Ok(false);
                    }
                    if !prompt_fields(&mut session, &ids, &mut input).await? {
                        return Ok(false);
                    }
                }
                Err(e @ SessionError::NotReady) => return Err(e.into()),
            }
        }
    }
}

async fn wait_for_prefill(session: &mut FormSession) {
    if !session.is_loading() {
        return;
    }
    print!("{}", "Fetching profile data".dimmed());
    while !session.poll_ready() {
        print!("{}", ".".dimmed());
        let _ = std::io::Write::flush(&mut std::io::stdout());
        tokio::time::sleep(Duration::from_millis(200)).await;
    }
    println!();
}

fn apply_edit(session: &mut FormSession, id: &str, value: String) -> anyhow::Result<()> {
    let Some(field) = session.field(id) else {
        bail!("form has no field `{id}`");
    };
    if field.is_read_only() {
        warn_locked(field);
        return Ok(());
    }
    session.set_value(id, value);
    Ok(())
}

/// Prompts for each listed field. Returns `false` when input ends.
async fn prompt_fields(
    session: &mut FormSession,
    ids: &[String],
    input: &mut Lines<BufReader<Stdin>>,
) -> anyhow::Result<bool> {
    let mut stdout = tokio::io::stdout();
    for id in ids {
        let Some(field) = session.field(id) else {
            continue;
        };
        let mut prompt = format!("{}{}", field.label(), if field.is_required() { "*" } else { "" });
        if !field.value().is_empty() {
            prompt += &format!(" [{}]", field.value());
        }
        if let Some(err) = field.error() {
            prompt += &format!(" ({})", err.red());
        }
        stdout.write_all(format!("{prompt}: ").as_bytes()).await?;
        stdout.flush().await?;

        let Some(line) = input.next_line().await.context("Failed to read input")? else {
            println!();
            return Ok(false);
        };
        // Enter keeps the current value.
        if !line.trim().is_empty()
            && !session.set_value(id, line.trim())
            && let Some(field) = session.field(id)
        {
            warn_locked(field);
        }
    }
    Ok(true)
}

fn warn_locked(field: &FieldState) {
    println!(
        "{}",
        format!("{} is provided by your profile and cannot be changed", field.label()).yellow()
    );
}

/// Failing fields the user can still fix. Locked failures are reported
/// instead, since no input can change them.
fn editable_failures(session: &FormSession) -> Vec<String> {
    let mut ids = Vec::new();
    for error in session.form().errors() {
        match session.field(&error.field_id) {
            Some(field) if field.is_read_only() => warn_locked(field),
            Some(_) => ids.push(error.field_id),
            None => {}
        }
    }
    ids
}

fn print_fields(session: &FormSession) {
    for field in session.fields() {
        println!("  {}", describe(field));
    }
    let submit = if session.is_submit_enabled() {
        "enabled".green()
    } else {
        "disabled".red()
    };
    println!("  Submit: {submit}");
}

fn describe(field: &FieldState) -> String {
    let mut line = format!(
        "{:<20} {:<8} {}",
        field.label().bold(),
        field.field_type().to_string().dimmed(),
        if field.value().is_empty() {
            "-".dimmed().to_string()
        } else {
            field.value().to_string()
        }
    );
    if field.is_required() {
        line += &"  required".dimmed().to_string();
    }
    if field.is_read_only() {
        line += &"  locked".yellow().to_string();
    }
    if let Some(err) = field.error() {
        line += &format!("  {}", err.red());
    }
    line
}

#[cfg(test)]
mod tests {
    use std::{collections::HashMap, sync::Arc};

    use formkit::{
        FieldSchema, FieldType, FormSchema, ProfileFetcher, SessionOptions, ValidationRules,
        prefill::StaticProfileFetcher,
    };

    use super::*;

    #[test]
    fn test_describe_marks_locked_and_errors() {
        let mut field = FieldState::new(Arc::new(FieldSchema::new(
            "first_name",
            "First Name",
            FieldType::Text,
            true,
        )));
        field.validate();
        let line = describe(&field);
        assert!(line.contains("This field is required."));
        assert!(line.contains("required"));

        field.set_value("Alex");
        field.set_read_only(true);
        let line = describe(&field);
        assert!(line.contains("Alex"));
        assert!(line.contains("locked"));
    }

    #[tokio::test]
    async fn test_locked_failures_are_not_reprompted() {
        let schema = FormSchema {
            country: "Netherlands".into(),
            fields: vec![
                FieldSchema::new("first_name", "First Name", FieldType::Text, true),
                FieldSchema::new("bsn", "BSN", FieldType::Text, true).with_validation(
                    ValidationRules {
                        regex: Some("[0-9]{9}".into()),
                        message: Some("BSN must be 9 digits.".into()),
                        ..Default::default()
                    },
                ),
            ],
        };
        let fetcher: Arc<dyn ProfileFetcher> = Arc::new(StaticProfileFetcher::new(HashMap::from([(
            "bsn".to_string(),
            "123".to_string(),
        )])));
        let mut session =
            FormSession::start("NL", &schema, Some(fetcher), SessionOptions::default());
        session.ready().await;
        assert!(session.field("bsn").unwrap().is_read_only());

        assert!(session.submit().is_err());
        assert_eq!(editable_failures(&session), vec!["first_name".to_string()]);

        assert!(session.set_value("first_name", "Alex"));
        assert!(session.submit().is_err());
        assert!(editable_failures(&session).is_empty());
    }
}
