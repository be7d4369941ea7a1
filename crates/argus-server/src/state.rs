//! Application state for the API server.

use std::collections::HashSet;
use std::sync::Arc;

use argus_core::{Analyzer, Metrics};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Analysis pipeline, shared by all requests.
    pub analyzer: Arc<Analyzer>,
    /// Accepted API keys. Empty disables the key check.
    pub api_keys: Arc<HashSet<String>>,
}

impl AppState {
    /// Creates state with the key check disabled.
    pub fn new(analyzer: Analyzer) -> Self {
        Self::with_api_keys(analyzer, std::iter::empty::<String>())
    }

    pub fn with_api_keys<I, S>(analyzer: Analyzer, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            analyzer: Arc::new(analyzer),
            api_keys: Arc::new(keys.into_iter().map(Into::into).collect()),
        }
    }

    pub fn metrics(&self) -> &Metrics {
        self.analyzer.metrics()
    }

    pub fn requires_api_key(&self) -> bool {
        !self.api_keys.is_empty()
    }
}
