//! Pill Lookup Layer
//!
//! Queries the national drug identification service for pills matching a
//! shape and imprint. Two interchangeable transports are supported (key-based
//! XML/REST and WSDL-described SOAP); the orchestrator and the UI never see
//! which one is configured.

pub mod rest;
pub mod soap;

pub use rest::RestLookup;
pub use soap::SoapLookup;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde::Deserialize;
use std::collections::HashMap;
use thiserror::Error;
use tracing::{debug, info};

use crate::vision::ShapeLabel;

/// Number of records requested per lookup; only the first page is ever fetched
pub const PAGE_SIZE: u32 = 5;

/// Page index sent with every lookup
pub const PAGE_NO: u32 = 1;

/// Placeholder rendered when an upstream record omits a field
pub const FIELD_PLACEHOLDER: &str = "not available";

/// One search request: the classified shape plus the extracted imprint
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PillQuery {
    /// Classified silhouette shape
    pub shape: ShapeLabel,
    /// Normalized imprint text, possibly empty
    pub imprint: String,
}

/// One matching pill, normalized from the service's loosely-typed records
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PillRecord {
    /// Product display name
    pub name: String,
    /// Manufacturer name
    pub manufacturer: String,
    /// Product photo URL, when the service supplies one
    pub image_url: Option<String>,
}

/// Errors surfaced when a lookup cannot complete
///
/// An empty result list is a normal outcome and is never represented here.
#[derive(Debug, Error)]
pub enum LookupError {
    #[error("drug service request failed: {0}")]
    Transport(String),
    #[error("drug service returned status {0}")]
    Status(u16),
    #[error("drug service response could not be parsed: {0}")]
    Malformed(String),
    #[error("drug service reported an error: {0}")]
    Service(String),
    #[error("drug service fault: {0}")]
    Fault(String),
}

/// Raw record fields shared by both transports before normalization
#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct RawPillItem {
    pub item_name: Option<String>,
    pub entp_name: Option<String>,
    pub item_image: Option<String>,
}

impl From<RawPillItem> for PillRecord {
    fn from(raw: RawPillItem) -> Self {
        Self {
            name: present(raw.item_name).unwrap_or_else(|| FIELD_PLACEHOLDER.to_string()),
            manufacturer: present(raw.entp_name)
                .unwrap_or_else(|| FIELD_PLACEHOLDER.to_string()),
            image_url: present(raw.item_image),
        }
    }
}

/// Treat missing and blank fields the same way
fn present(field: Option<String>) -> Option<String> {
    field.filter(|s| !s.trim().is_empty())
}

/// Remote identification transport
#[async_trait]
pub trait PillLookup: Send + Sync {
    /// Fetch the first page of records matching `query`.
    /// Zero records is `Ok(vec![])`, distinct from every error variant.
    async fn search(&self, query: &PillQuery) -> Result<Vec<PillRecord>, LookupError>;
}

/// Lookup orchestrator: one transport plus an advisory session cache
///
/// Cache entries are keyed by the full query and never expire; only a process
/// restart clears them. Failed lookups are not cached, so the same query can
/// be retried by the user.
pub struct PillSearchClient {
    transport: Box<dyn PillLookup>,
    cache: Mutex<HashMap<PillQuery, Vec<PillRecord>>>,
}

impl PillSearchClient {
    /// Create a client over the given transport
    pub fn new(transport: Box<dyn PillLookup>) -> Self {
        Self {
            transport,
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// Look up matching pills, serving repeat queries from the session cache
    pub async fn lookup(&self, query: &PillQuery) -> Result<Vec<PillRecord>, LookupError> {
        if let Some(records) = self.cache.lock().get(query) {
            debug!("Cache hit for {:?}", query);
            return Ok(records.clone());
        }

        let records = self.transport.search(query).await?;
        info!(
            "Lookup for shape {} imprint {:?} returned {} record(s)",
            query.shape,
            query.imprint,
            records.len()
        );

        self.cache.lock().insert(query.clone(), records.clone());
        Ok(records)
    }
}
