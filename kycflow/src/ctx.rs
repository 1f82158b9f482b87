//! Application context and state management.
//!
//! [`AppContext`] holds the resolved paths, the loaded settings, the schema
//! catalog and the profile source registry for one run of the tool.

use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use formkit::{
    FetcherRegistry, FormSession, SessionOptions,
    catalog::Catalog,
    prefill::{ProfileFetcher, StaticProfileFetcher},
};

use crate::{
    settings::{SETTINGS_FILE, Settings},
    utils::replace_env_placeholders,
};

/// Path configuration grouping all path-related fields.
#[derive(Debug, Default, Clone)]
pub struct PathConfig {
    /// Settings file that was (or would have been) read.
    pub settings: PathBuf,
    /// Directory holding the manifest and region documents.
    pub config_dir: PathBuf,
}

/// The main application context holding all state.
pub struct AppContext {
    /// Resolved paths.
    pub paths: PathConfig,
    /// Loaded settings.
    pub settings: Settings,
    /// Manifest and region documents.
    pub catalog: Catalog,
    /// Profile sources keyed by region code.
    pub registry: FetcherRegistry,
}

impl AppContext {
    /// Builds the context for a workspace directory.
    ///
    /// # Arguments
    ///
    /// * `workspace` - Directory relative paths are resolved against.
    /// * `settings` - Settings file; defaults to `.kycflow.toml` in the workspace.
    /// * `config_dir` - Overrides the settings' `config_dir`.
    ///
    /// # Errors
    ///
    /// Returns an error if an existing settings file cannot be read or parsed.
    pub fn new(
        workspace: impl AsRef<Path>,
        settings: Option<PathBuf>,
        config_dir: Option<PathBuf>,
    ) -> anyhow::Result<Self> {
        let workspace = workspace.as_ref().to_path_buf();
        let settings_path = settings.unwrap_or_else(|| workspace.join(SETTINGS_FILE));
        let settings = Settings::load(&settings_path)?;

        let config_dir = match config_dir {
            Some(dir) => dir,
            None => PathBuf::from(replace_env_placeholders(&settings.config_dir)),
        };
        let config_dir = if config_dir.is_relative() {
            workspace.join(config_dir)
        } else {
            config_dir
        };

        info!("Using form configuration from {}", config_dir.display());
        let catalog = Catalog::with_manifest(&config_dir, &settings.manifest);
        let registry = build_registry(&settings);

        Ok(Self {
            paths: PathConfig {
                settings: settings_path,
                config_dir,
            },
            settings,
            catalog,
            registry,
        })
    }

    /// Session options derived from the settings.
    pub fn session_options(&self) -> SessionOptions {
        SessionOptions {
            prefill_timeout: self.settings.prefill_timeout(),
        }
    }

    /// Loads the region's form and starts a session for it.
    ///
    /// # Errors
    ///
    /// Returns an error if the region is unknown or its document is unusable.
    pub fn open_session(&self, code: &str) -> anyhow::Result<FormSession> {
        if self.catalog.region(code).is_none() {
            let known: Vec<_> = self.catalog.regions().iter().map(|r| r.code.as_str()).collect();
            bail!("unknown region `{code}`, available: {}", known.join(", "));
        }
        let schema = self.catalog.read_schema(code)?;
        Ok(FormSession::open(
            code,
            &schema,
            &self.registry,
            self.session_options(),
        ))
    }
}

/// Registers one static profile source per `[prefill.<CODE>]` table.
pub fn build_registry(settings: &Settings) -> FetcherRegistry {
    let mut registry = FetcherRegistry::new();
    for (code, profile) in &settings.prefill {
        let values = profile
            .values
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        let fetcher: Arc<dyn ProfileFetcher> =
            Arc::new(StaticProfileFetcher::new(values).with_delay(profile.delay()));
        registry.register(code.clone(), fetcher);
    }
    registry
}

#[cfg(test)]
mod tests {
    use std::fs;

    use formkit::FetcherFactory;

    use super::*;

    fn workspace() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        let forms = dir.path().join("forms");
        fs::create_dir(&forms).unwrap();
        fs::write(
            forms.join("Manifest.json"),
            r#"[{"code": "DE", "name": "Germany", "configFile": "DE.json"}]"#,
        )
        .unwrap();
        fs::write(
            forms.join("DE.json"),
            r#"{"country": "Germany", "fields": [
                {"id": "first_name", "label": "Vorname", "type": "text", "required": true}
            ]}"#,
        )
        .unwrap();
        fs::write(
            dir.path().join(SETTINGS_FILE),
            "config_dir = \"forms\"\nprefill_timeout_ms = 250\n",
        )
        .unwrap();
        dir
    }

    #[test]
    fn test_context_resolves_relative_config_dir() {
        let dir = workspace();
        let ctx = AppContext::new(dir.path(), None, None).unwrap();
        assert_eq!(ctx.paths.config_dir, dir.path().join("forms"));
        assert_eq!(ctx.paths.settings, dir.path().join(SETTINGS_FILE));
        assert_eq!(ctx.catalog.regions().len(), 1);
        assert_eq!(
            ctx.session_options().prefill_timeout,
            Some(std::time::Duration::from_millis(250))
        );
    }

    #[test]
    fn test_registry_from_default_settings() {
        let registry = build_registry(&Settings::default());
        assert!(registry.make_fetcher("NL").is_some());
        assert!(registry.make_fetcher("DE").is_none());
    }

    #[test]
    fn test_open_session() {
        let dir = workspace();
        let ctx = AppContext::new(dir.path(), None, None).unwrap();

        let session = ctx.open_session("DE").unwrap();
        assert!(!session.is_loading());
        assert_eq!(session.title(), "Germany KYC Form");

        let err = ctx.open_session("FR").err().unwrap();
        assert!(err.to_string().contains("available: DE"));
    }
}
