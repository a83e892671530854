use std::sync::Arc;

use crate::analysis::analyzer::Analyzer;
use crate::cms::airtable::AirtableClient;
use crate::cms::webflow::WebflowClient;
use crate::cms::Publisher;
use crate::players::store::PlayerStore;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn PlayerStore>,
    pub analyzer: Analyzer,
    /// Background sinks (n8n, Airtable) notified after each stored analysis.
    pub publisher: Publisher,
    /// Present only when token, collection and site id are all configured.
    pub webflow: Option<WebflowClient>,
    pub airtable: Option<AirtableClient>,
}
