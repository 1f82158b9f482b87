//! Form session orchestration.
//!
//! A session walks through `Loading -> Ready -> (Submitting -> Ready)*`.
//! It starts in `Loading` only when the region has a profile source; the
//! fields are then read-only placeholders until the fetch resolves and the
//! prefill merge has run. Fetch failures and timeouts degrade to "no
//! prefill" and never reach the caller.
//!
//! Dropping a session aborts an in-flight fetch, so a late answer can never
//! touch discarded field state.

use std::{sync::Arc, time::Duration};

use futures::FutureExt;
use log::{debug, info, warn};
use tokio::{runtime::Handle, task::JoinHandle};

use crate::{
    field::FieldState,
    form::{Form, FormSubmission, ValidationFailure},
    prefill::{self, FetcherFactory, PrefillResult, ProfileFetcher},
    schema::FormSchema,
};

/// Lifecycle phase of a [`FormSession`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    /// Waiting for the prefill fetch; edits are ignored.
    Loading,
    /// Accepting edits and submissions.
    Ready,
    /// Running submit-time validation.
    Submitting,
}

/// Tunables for a session.
#[derive(Debug, Clone)]
pub struct SessionOptions {
    /// Upper bound on the prefill fetch. `None` waits indefinitely.
    pub prefill_timeout: Option<Duration>,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            prefill_timeout: Some(Duration::from_secs(10)),
        }
    }
}

/// Errors returned by [`FormSession::submit`].
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// Submitted while loading or mid-submit.
    #[error("the form is still loading prefill data")]
    NotReady,
    /// At least one field failed its rules.
    #[error(transparent)]
    Invalid(#[from] ValidationFailure),
}

/// One form being filled in, from load to submit.
pub struct FormSession {
    region: String,
    country: String,
    form: Form,
    phase: SessionPhase,
    pending: Option<JoinHandle<PrefillResult>>,
    submission_result: Option<String>,
    result_presented: bool,
}

impl FormSession {
    /// Start a session, resolving the region's profile source from `factory`.
    pub fn open(
        region: &str,
        schema: &FormSchema,
        factory: &dyn FetcherFactory,
        options: SessionOptions,
    ) -> Self {
        Self::start(region, schema, factory.make_fetcher(region), options)
    }

    /// Start a session with an explicit profile source.
    ///
    /// With a source the fetch is spawned on the current Tokio runtime and
    /// the session begins in [`SessionPhase::Loading`]. Without one (or
    /// outside a runtime) the session is `Ready` with every field editable.
    pub fn start(
        region: &str,
        schema: &FormSchema,
        fetcher: Option<Arc<dyn ProfileFetcher>>,
        options: SessionOptions,
    ) -> Self {
        let mut session = Self {
            region: region.to_string(),
            country: schema.country.clone(),
            form: Form::from_schema(schema),
            phase: SessionPhase::Ready,
            pending: None,
            submission_result: None,
            result_presented: false,
        };

        let Some(fetcher) = fetcher else {
            debug!("No profile source for {region}");
            prefill::merge(session.form.fields_mut(), &PrefillResult::none());
            return session;
        };

        let handle = match Handle::try_current() {
            Ok(handle) => handle,
            Err(e) => {
                warn!("Cannot fetch prefill for {region} outside a runtime: {e}");
                prefill::merge(session.form.fields_mut(), &PrefillResult::none());
                return session;
            }
        };

        for field in session.form.fields_mut() {
            field.set_read_only(true);
        }
        session.pending = Some(handle.spawn(fetch_prefill(
            fetcher,
            region.to_string(),
            options.prefill_timeout,
        )));
        session.phase = SessionPhase::Loading;
        session
    }

    /// Navigation title, e.g. `"Netherlands KYC Form"`.
    pub fn title(&self) -> String {
        format!("{} KYC Form", self.country)
    }

    /// Current lifecycle phase.
    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    /// Whether the prefill fetch is still outstanding.
    pub fn is_loading(&self) -> bool {
        self.phase == SessionPhase::Loading
    }

    /// The underlying form.
    pub fn form(&self) -> &Form {
        &self.form
    }

    /// Field states in schema order.
    pub fn fields(&self) -> &[FieldState] {
        self.form.fields()
    }

    /// Look up a field by id.
    pub fn field(&self, id: &str) -> Option<&FieldState> {
        self.form.field(id)
    }

    /// Wait for the prefill fetch and apply it.
    ///
    /// Returns immediately when the session is not loading. Safe to cancel:
    /// the fetch keeps running and a later call picks it up.
    pub async fn ready(&mut self) {
        let Some(handle) = self.pending.as_mut() else {
            return;
        };
        let result = handle.await.unwrap_or_else(|e| {
            warn!("Prefill task for {} failed: {e}", self.region);
            PrefillResult::none()
        });
        self.finish_loading(result);
    }

    /// Non-blocking variant of [`ready`](Self::ready) for render loops.
    ///
    /// Returns `true` once the session has left `Loading`.
    pub fn poll_ready(&mut self) -> bool {
        let Some(handle) = self.pending.as_mut() else {
            return !self.is_loading();
        };
        if !handle.is_finished() {
            return false;
        }
        let result = match handle.now_or_never() {
            Some(Ok(result)) => result,
            Some(Err(e)) => {
                warn!("Prefill task for {} failed: {e}", self.region);
                PrefillResult::none()
            }
            None => return false,
        };
        self.finish_loading(result);
        true
    }

    fn finish_loading(&mut self, result: PrefillResult) {
        self.pending = None;
        match &result.mapping {
            Some(m) => debug!("Prefill for {} supplied {} value(s)", self.region, m.len()),
            None => debug!("No prefill data for {}", self.region),
        }
        prefill::merge(self.form.fields_mut(), &result);
        self.phase = SessionPhase::Ready;
    }

    /// Apply a user edit. Ignored while loading and for read-only fields.
    pub fn set_value(&mut self, id: &str, value: impl Into<String>) -> bool {
        if self.phase != SessionPhase::Ready {
            debug!("Ignoring edit of {id} while {:?}", self.phase);
            return false;
        }
        self.form.set_value(id, value)
    }

    /// Whether the submit action is currently permitted.
    pub fn is_submit_enabled(&self) -> bool {
        self.phase == SessionPhase::Ready && self.form.is_submit_enabled()
    }

    /// Validate every field and, on success, publish the payload.
    ///
    /// On success the pretty JSON payload becomes the
    /// [`submission_result`](Self::submission_result) and the result flag is
    /// raised. On failure the per-field errors stay on the fields.
    pub fn submit(&mut self) -> Result<FormSubmission, SessionError> {
        if self.phase != SessionPhase::Ready {
            return Err(SessionError::NotReady);
        }

        self.phase = SessionPhase::Submitting;
        let outcome = self.form.submit();
        self.phase = SessionPhase::Ready;

        let payload = outcome?;
        info!("Form for {} submitted with {} field(s)", self.region, payload.len());
        self.submission_result = Some(payload.to_json_pretty());
        self.result_presented = true;
        Ok(payload)
    }

    /// Serialized payload of the last successful submission.
    pub fn submission_result(&self) -> Option<&str> {
        self.submission_result.as_deref()
    }

    /// Whether a submission result is waiting to be acknowledged.
    pub fn is_result_presented(&self) -> bool {
        self.result_presented
    }

    /// Acknowledge the submission result.
    pub fn dismiss_result(&mut self) {
        self.submission_result = None;
        self.result_presented = false;
    }
}

impl Drop for FormSession {
    fn drop(&mut self) {
        if let Some(handle) = self.pending.take() {
            debug!("Cancelling prefill fetch for {}", self.region);
            handle.abort();
        }
    }
}

async fn fetch_prefill(
    fetcher: Arc<dyn ProfileFetcher>,
    region: String,
    timeout: Option<Duration>,
) -> PrefillResult {
    let fetch = fetcher.fetch_profile(&region);
    let mapping = match timeout {
        Some(limit) => match tokio::time::timeout(limit, fetch).await {
            Ok(mapping) => mapping,
            Err(_) => {
                warn!("Prefill for {region} timed out after {limit:?}");
                None
            }
        },
        None => fetch.await,
    };
    PrefillResult::from(mapping)
}
