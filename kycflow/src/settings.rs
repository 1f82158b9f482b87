//! Application settings.
//!
//! Settings live in a TOML file, `.kycflow.toml` in the working directory
//! by default. Every key is optional:
//!
//! ```toml
//! config_dir = "${env:KYC_CONFIG}/forms"
//! manifest = "Manifest.json"
//! prefill_timeout_ms = 5000
//!
//! [prefill.NL]
//! delay_ms = 1000
//! values = { first_name = "Alex", last_name = "Visser", birth_date = "15/08/1990" }
//! ```
//!
//! Without a `[prefill]` table the built-in NL profile is used.

use std::{collections::BTreeMap, path::Path, time::Duration};

use anyhow::Context;
use formkit::catalog::DEFAULT_MANIFEST;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Default settings file name.
pub const SETTINGS_FILE: &str = ".kycflow.toml";

/// Root settings structure.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(default)]
pub struct Settings {
    /// Directory holding the manifest and region documents.
    ///
    /// Relative paths are resolved against the workspace directory.
    /// `${env:VAR}` placeholders are expanded.
    pub config_dir: String,
    /// Manifest file name inside `config_dir`.
    pub manifest: String,
    /// Upper bound for a prefill fetch, in milliseconds. `0` disables it.
    pub prefill_timeout_ms: u64,
    /// Profile sources keyed by region code.
    pub prefill: BTreeMap<String, PrefillProfile>,
}

/// A fixed profile served for one region.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(default)]
pub struct PrefillProfile {
    /// Simulated latency before the profile is returned.
    pub delay_ms: u64,
    /// Field id to value.
    pub values: BTreeMap<String, String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            config_dir: "config".to_string(),
            manifest: DEFAULT_MANIFEST.to_string(),
            prefill_timeout_ms: 10_000,
            prefill: BTreeMap::from([("NL".to_string(), PrefillProfile::netherlands())]),
        }
    }
}

impl PrefillProfile {
    /// The demo profile served for the Netherlands.
    pub fn netherlands() -> Self {
        Self {
            delay_ms: 1000,
            values: BTreeMap::from([
                ("first_name".to_string(), "Alex".to_string()),
                ("last_name".to_string(), "Visser".to_string()),
                ("birth_date".to_string(), "15/08/1990".to_string()),
            ]),
        }
    }

    /// Simulated latency of the profile source.
    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }
}

impl Settings {
    /// Parse settings from TOML text.
    pub fn from_toml(content: &str) -> anyhow::Result<Self> {
        let settings: Settings = toml::from_str(content)?;
        Ok(settings)
    }

    /// Load settings from `path`, falling back to defaults if it does not exist.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            debug!("No settings file at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        Self::from_toml(&content).with_context(|| format!("Invalid settings in {}", path.display()))
    }

    /// Prefill timeout; `0` in the file means no limit.
    pub fn prefill_timeout(&self) -> Option<Duration> {
        match self.prefill_timeout_ms {
            0 => None,
            ms => Some(Duration::from_millis(ms)),
        }
    }
}
