//! Prefill: externally supplied values that pre-populate and lock fields.
//!
//! The merge policy is all-or-nothing per field: a field covered by the
//! prefill mapping takes the supplied value and becomes read-only, every
//! other field stays editable. Without a mapping every field is editable.
//!
//! Profile sources are resolved per region code through a [`FetcherFactory`]
//! that the caller injects into the session.

use std::{collections::HashMap, sync::Arc, time::Duration};

use futures::{FutureExt, future::BoxFuture};
use log::debug;

use crate::field::FieldState;

/// Outcome of a prefill fetch.
///
/// `mapping` is `None` both when the region has no data source and when the
/// fetch failed or returned nothing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PrefillResult {
    /// Field id → value.
    pub mapping: Option<HashMap<String, String>>,
}

impl PrefillResult {
    /// No prefill data.
    pub fn none() -> Self {
        Self { mapping: None }
    }

    /// Prefill data for the fields named in `mapping`.
    pub fn from_mapping(mapping: HashMap<String, String>) -> Self {
        Self {
            mapping: Some(mapping),
        }
    }
}

impl From<Option<HashMap<String, String>>> for PrefillResult {
    fn from(mapping: Option<HashMap<String, String>>) -> Self {
        Self { mapping }
    }
}

/// Apply a prefill result to a field collection.
///
/// Idempotent: merging the same result twice leaves the same state.
pub fn merge(fields: &mut [FieldState], prefill: &PrefillResult) {
    let Some(mapping) = &prefill.mapping else {
        for field in fields.iter_mut() {
            field.set_read_only(false);
        }
        return;
    };

    for field in fields.iter_mut() {
        match mapping.get(field.id()) {
            Some(value) => {
                field.fill(value);
                field.set_read_only(true);
            }
            None => field.set_read_only(false),
        }
    }
}

/// An asynchronous source of profile data for a region.
///
/// Failures are reported as `None`; no error detail crosses this boundary.
pub trait ProfileFetcher: Send + Sync {
    fn fetch_profile(&self, region: &str) -> BoxFuture<'_, Option<HashMap<String, String>>>;
}

/// Resolves the profile source for a region code, if it has one.
pub trait FetcherFactory {
    fn make_fetcher(&self, region: &str) -> Option<Arc<dyn ProfileFetcher>>;
}

/// Table-backed [`FetcherFactory`].
#[derive(Default, Clone)]
pub struct FetcherRegistry {
    fetchers: HashMap<String, Arc<dyn ProfileFetcher>>,
}

impl FetcherRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) the source for a region code.
    pub fn register(&mut self, region: impl Into<String>, fetcher: Arc<dyn ProfileFetcher>) {
        self.fetchers.insert(region.into(), fetcher);
    }

    /// Builder form of [`register`](Self::register).
    pub fn with(mut self, region: impl Into<String>, fetcher: Arc<dyn ProfileFetcher>) -> Self {
        self.register(region, fetcher);
        self
    }

    /// Region codes with a registered source, sorted.
    pub fn regions(&self) -> Vec<&str> {
        let mut codes: Vec<&str> = self.fetchers.keys().map(String::as_str).collect();
        codes.sort_unstable();
        codes
    }
}

impl FetcherFactory for FetcherRegistry {
    fn make_fetcher(&self, region: &str) -> Option<Arc<dyn ProfileFetcher>> {
        self.fetchers.get(region).cloned()
    }
}

/// A profile source that answers with a fixed mapping after a delay.
#[derive(Debug, Clone, Default)]
pub struct StaticProfileFetcher {
    values: HashMap<String, String>,
    delay: Duration,
}

impl StaticProfileFetcher {
    /// A source that always answers with `values`.
    pub fn new(values: HashMap<String, String>) -> Self {
        Self {
            values,
            delay: Duration::ZERO,
        }
    }

    /// Simulated latency before the answer arrives.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

impl ProfileFetcher for StaticProfileFetcher {
    fn fetch_profile(&self, region: &str) -> BoxFuture<'_, Option<HashMap<String, String>>> {
        debug!("Fetching static profile for {region} ({:?})", self.delay);
        async move {
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            Some(self.values.clone())
        }
        .boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{FieldSchema, FieldType};

    fn fields() -> Vec<FieldState> {
        ["first_name", "last_name", "email"]
            .into_iter()
            .map(|id| FieldState::new(Arc::new(FieldSchema::new(id, id, FieldType::Text, true))))
            .collect()
    }

    fn snapshot(fields: &[FieldState]) -> Vec<(String, bool)> {
        fields
            .iter()
            .map(|f| (f.value().to_string(), f.is_read_only()))
            .collect()
    }

    fn alex() -> PrefillResult {
        PrefillResult::from_mapping(HashMap::from([(
            "first_name".to_string(),
            "Alex".to_string(),
        )]))
    }

    #[test]
    fn test_merge_locks_covered_fields_only() {
        let mut fields = fields();
        merge(&mut fields, &alex());

        assert_eq!(fields[0].value(), "Alex");
        assert!(fields[0].is_read_only());
        assert!(!fields[1].is_read_only());
        assert!(!fields[2].is_read_only());
    }

    #[test]
    fn test_merge_is_idempotent() {
        let mut fields = fields();
        merge(&mut fields, &alex());
        let first = snapshot(&fields);
        merge(&mut fields, &alex());
        assert_eq!(snapshot(&fields), first);
        assert_eq!(first[0], ("Alex".to_string(), true));
    }

    #[test]
    fn test_absent_mapping_unlocks_and_keeps_values() {
        let mut fields = fields();
        fields[1].set_value("Visser");
        merge(&mut fields, &alex());
        merge(&mut fields, &PrefillResult::none());

        assert!(fields.iter().all(|f| !f.is_read_only()));
        assert_eq!(fields[0].value(), "Alex");
        assert_eq!(fields[1].value(), "Visser");
    }

    #[test]
    fn test_registry_resolves_by_region() {
        let registry = FetcherRegistry::new().with(
            "NL",
            Arc::new(StaticProfileFetcher::new(HashMap::new())) as Arc<dyn ProfileFetcher>,
        );
        assert!(registry.make_fetcher("NL").is_some());
        assert!(registry.make_fetcher("DE").is_none());
        assert_eq!(registry.regions(), vec!["NL"]);
    }

    #[tokio::test]
    async fn test_static_fetcher_returns_values() {
        let fetcher = StaticProfileFetcher::new(HashMap::from([(
            "last_name".to_string(),
            "Visser".to_string(),
        )]))
        .with_delay(Duration::from_millis(5));

        let values = fetcher.fetch_profile("NL").await.unwrap();
        assert_eq!(values.get("last_name").map(String::as_str), Some("Visser"));
    }
}
