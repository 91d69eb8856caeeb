//! Aggregator behaviour switches.

use serde::{Deserialize, Serialize};

use crate::error::{invalid_argument, WatchResult};

/// Configuration of a `WatchChangeAggregator`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct WatchAggregatorSettings {
    /// Synthesize a deleted document for a current single-document target
    /// whose document was never sent, so storage learns that it is missing.
    pub synthesize_document_query_deletes: bool,
    /// Report documents whose only interested targets are limbo resolutions.
    pub resolve_limbo_documents: bool,
}

impl Default for WatchAggregatorSettings {
    fn default() -> Self {
        Self {
            synthesize_document_query_deletes: true,
            resolve_limbo_documents: true,
        }
    }
}

impl WatchAggregatorSettings {
    /// Parses settings from JSON; absent fields keep their defaults.
    pub fn from_json(value: &serde_json::Value) -> WatchResult<Self> {
        serde_json::from_value(value.clone())
            .map_err(|err| invalid_argument(format!("Invalid watch aggregator settings: {err}")))
    }
}
