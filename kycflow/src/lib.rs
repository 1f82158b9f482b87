//! # kycflow
//!
//! Terminal front-end for configuration-driven KYC forms.
//!
//! `kycflow` reads a region manifest and per-region form documents, starts a
//! [`formkit`] session for the selected region (with prefilled profile data
//! when the region has a profile source), and lets the user fill in and
//! submit the form from the command line.
//!
//! ## Modules
//!
//! - [`ctx`] - Application context: paths, settings, catalog and profile sources
//! - [`fill`] - The `fill` command
//! - [`settings`] - The `.kycflow.toml` settings file
//! - [`utils`] - Common utilities and helper functions

/// Application context and state management.
pub mod ctx;

/// Interactive and scripted form filling.
pub mod fill;

/// Settings file handling.
pub mod settings;

/// Common utilities and helper functions.
pub mod utils;

#[macro_use]
extern crate log;
#[macro_use]
extern crate anyhow;

pub use formkit;
