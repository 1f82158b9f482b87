//! # formkit
//!
//! A configuration-driven form engine.
//!
//! formkit turns a declarative field schema (usually a per-region JSON
//! document) into live form state that can be edited, validated and
//! submitted. The shape of the form is never hardcoded: fields, types,
//! required-ness and validation rules all come from configuration.
//!
//! ## Features
//!
//! - Schema documents and region manifests deserialized with serde
//! - Ordered, short-circuiting rule evaluation (required, length, numeric bounds, pattern)
//! - Cheap live submit-enablement separate from full submit-time validation
//! - Externally sourced prefill that locks the fields it covers
//! - Async prefill fetch with timeout and cancellation on teardown
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use formkit::{catalog::Catalog, session::{FormSession, SessionOptions}};
//!
//! # async fn demo() {
//! let catalog = Catalog::open("config");
//! let schema = catalog.load_schema("DE").unwrap();
//!
//! let mut session = FormSession::start("DE", &schema, None, SessionOptions::default());
//! session.ready().await;
//! session.set_value("first_name", "Sam");
//!
//! match session.submit() {
//!     Ok(payload) => println!("{}", payload.to_json_pretty()),
//!     Err(e) => println!("{e}"),
//! }
//! # }
//! ```
//!
//! ## Modules
//!
//! - [`schema`] - Field schema, validation rules and region manifest types
//! - [`rules`] - The field rule evaluator
//! - [`field`] - Runtime state of a single field
//! - [`form`] - The form aggregator and submission payload
//! - [`prefill`] - Prefill merge policy and the profile fetcher seam
//! - [`session`] - The load → edit → submit lifecycle
//! - [`catalog`] - Manifest and per-region schema loading

/// Manifest and per-region schema loading.
pub mod catalog;

/// Runtime state of a single form field.
pub mod field;

/// The form aggregator: enablement, full validation and submission payload.
pub mod form;

/// Prefill merge policy and external profile sources.
pub mod prefill;

/// The field rule evaluator.
pub mod rules;

/// Declarative schema types parsed from configuration.
pub mod schema;

/// Form session orchestration.
pub mod session;

pub use field::FieldState;
pub use form::{FieldError, Form, FormSubmission, ValidationFailure};
pub use prefill::{FetcherFactory, FetcherRegistry, PrefillResult, ProfileFetcher};
pub use rules::{ValidationError, evaluate};
pub use schema::{FieldSchema, FieldType, FormSchema, RegionInfo, SchemaError, ValidationRules};
pub use session::{FormSession, SessionError, SessionOptions, SessionPhase};

/// Textual format used for date field values (`dd/MM/yyyy`).
pub const DATE_FORMAT: &str = "%d/%m/%Y";
