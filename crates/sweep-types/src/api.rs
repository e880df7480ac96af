use serde::{Deserialize, Serialize};

use crate::models::Message;

// -- Search --

/// One entry inside a search result block. Blocks mix the actual hit with
/// surrounding context messages; only the hit carries `hit: true`.
#[derive(Debug, Clone, Deserialize)]
pub struct SearchEntry {
    #[serde(flatten)]
    pub message: Message,
    #[serde(default)]
    pub hit: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub total_results: u64,
    #[serde(default)]
    pub messages: Vec<Vec<SearchEntry>>,
}

impl SearchResponse {
    /// Number of result blocks on this page. The server's `offset` counts blocks.
    pub fn page_size(&self) -> usize {
        self.messages.len()
    }

    /// The first flagged hit from each block, in server order.
    /// Blocks without a hit are dropped.
    pub fn into_hits(self) -> Vec<Message> {
        self.messages
            .into_iter()
            .filter_map(|block| block.into_iter().find(|entry| entry.hit))
            .map(|entry| entry.message)
            .collect()
    }
}

// -- Mutations --

#[derive(Debug, Serialize)]
pub struct EditMessageRequest<'a> {
    pub content: &'a str,
}

// -- Rate limits --

/// Body of a 429 response. `retry_after` is in milliseconds.
#[derive(Debug, Clone, Deserialize)]
pub struct RateLimitResponse {
    pub retry_after: f64,
    #[serde(default)]
    pub global: bool,
}
