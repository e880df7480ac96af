use reqwest::Method;
use tracing::warn;

use sweep_types::api::EditMessageRequest;

use crate::client::ApiClient;
use crate::error::TransportError;
use crate::transport::{ApiRequest, Transport};

impl<T: Transport> ApiClient<T> {
    /// Overwrite a message's content.
    ///
    /// `Ok(false)` when the server refused it; retry exhaustion and network
    /// failures are returned as errors.
    pub async fn replace_message(
        &self,
        channel_id: u64,
        message_id: u64,
        content: &str,
    ) -> Result<bool, TransportError> {
        let body = serde_json::to_string(&EditMessageRequest { content })?;
        let request = ApiRequest::new(Method::PATCH, message_path(channel_id, message_id))
            .json_body(body);

        absorb(self.request(request).await.map(drop), message_id, "modify")
    }

    /// Delete a message. Same failure handling as [`Self::replace_message`].
    pub async fn delete_message(
        &self,
        channel_id: u64,
        message_id: u64,
    ) -> Result<bool, TransportError> {
        let request = ApiRequest::new(Method::DELETE, message_path(channel_id, message_id));

        absorb(self.request(request).await.map(drop), message_id, "delete")
    }
}

fn message_path(channel_id: u64, message_id: u64) -> String {
    format!("/channels/{}/messages/{}", channel_id, message_id)
}

fn absorb(
    result: Result<(), TransportError>,
    message_id: u64,
    action: &str,
) -> Result<bool, TransportError> {
    match result {
        Ok(()) => Ok(true),
        Err(e) if e.is_http() => {
            warn!(message_id, "{}", e);
            warn!(message_id, "Skip this message which cannot be done to {}.", action);
            Ok(false)
        }
        Err(e) => Err(e),
    }
}
