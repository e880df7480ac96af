pub mod client;
pub mod error;
pub mod mutate;
pub mod search;
pub mod transport;

#[cfg(test)]
pub(crate) mod testing;

pub use client::{ApiClient, RATE_LIMITED_RETRY};
pub use error::TransportError;
pub use search::{SearchBatch, SearchCursor, SearchPager};
pub use reqwest::Method;
pub use transport::{ApiRequest, ApiResponse, HttpTransport, Transport};
