use std::time::Duration;

use tracing::{error, warn};

use sweep_types::api::RateLimitResponse;

use crate::error::{TransportError, explain_status};
use crate::transport::{ApiRequest, ApiResponse, Transport};

/// Attempts per request before a run of 429s is given up on.
pub const RATE_LIMITED_RETRY: u32 = 5;

/// Backoff used when a 429 body carries no readable `retry_after`.
const FALLBACK_RETRY_AFTER: Duration = Duration::from_millis(1000);

/// Longest backoff honoured for a single 429, whatever the server asks for.
const MAX_RETRY_AFTER: Duration = Duration::from_secs(60);

/// API client with a fixed per-request throttle and 429 handling.
pub struct ApiClient<T> {
    transport: T,
    default_sleep: Duration,
    max_attempts: u32,
}

impl<T: Transport> ApiClient<T> {
    pub fn new(transport: T, default_sleep: Duration) -> Self {
        Self {
            transport,
            default_sleep,
            max_attempts: RATE_LIMITED_RETRY,
        }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Send a request, sleeping `default_sleep` before every attempt.
    ///
    /// Terminal statuses fail immediately with [`TransportError::Http`]. A 429
    /// sleeps for the server's `retry_after` and tries again, up to
    /// [`RATE_LIMITED_RETRY`] attempts; the last 429 gives up without waiting.
    /// Everything else is returned as-is.
    pub async fn request(&self, request: ApiRequest) -> Result<ApiResponse, TransportError> {
        for attempt in 1..=self.max_attempts {
            if !self.default_sleep.is_zero() {
                tokio::time::sleep(self.default_sleep).await;
            }

            let response = self.transport.send(&request).await?;

            if let Some(explanation) = explain_status(response.status) {
                return Err(TransportError::Http {
                    code: response.status,
                    details: format!("{}\n{}", explanation, response.body),
                });
            }

            if response.status == 429 {
                let (retry_after, global) = retry_after(&response);
                if attempt == self.max_attempts {
                    break;
                }
                warn!(
                    method = %request.method,
                    path = %request.path,
                    attempt,
                    max_attempts = self.max_attempts,
                    global,
                    "Rate limited. We will sleep {} ms, and retry it.",
                    retry_after.as_millis(),
                );
                tokio::time::sleep(retry_after).await;
                continue;
            }

            return Ok(response);
        }

        error!(
            method = %request.method,
            path = %request.path,
            "Failed to request it, although we tried {} times.",
            self.max_attempts,
        );
        Err(TransportError::RateLimitExhausted {
            method: request.method,
            path: request.path,
            attempts: self.max_attempts,
        })
    }
}

/// Backoff requested by a 429 body, capped at [`MAX_RETRY_AFTER`], and
/// whether the limit is global.
fn retry_after(response: &ApiResponse) -> (Duration, bool) {
    match response.json::<RateLimitResponse>() {
        Ok(body) if body.retry_after.is_finite() && body.retry_after >= 0.0 => {
            let wait = Duration::try_from_secs_f64(body.retry_after / 1000.0)
                .map_or(MAX_RETRY_AFTER, |wait| wait.min(MAX_RETRY_AFTER));
            (wait, body.global)
        }
        _ => {
            warn!(body = %response.body, "429 without a usable retry_after, using fallback");
            (FALLBACK_RETRY_AFTER, false)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedTransport;
    use reqwest::Method;
    use tokio::time::Instant;

    fn get() -> ApiRequest {
        ApiRequest::new(Method::GET, "/channels/1/messages/search")
    }

    #[tokio::test(start_paused = true)]
    async fn retries_once_after_rate_limit() {
        let transport = ScriptedTransport::new([
            (429, r#"{"retry_after": 200}"#),
            (200, r#"{"ok": true}"#),
        ]);
        let client = ApiClient::new(transport, Duration::ZERO);

        let start = Instant::now();
        let response = client.request(get()).await.unwrap();
        let elapsed = start.elapsed();

        assert_eq!(response.status, 200);
        assert_eq!(client.transport().attempts(), 2);
        assert!(elapsed >= Duration::from_millis(200), "slept {:?}", elapsed);
        assert!(elapsed < Duration::from_millis(250), "slept {:?}", elapsed);
    }

    #[tokio::test(start_paused = true)]
    async fn gives_up_after_five_rate_limits() {
        let transport = ScriptedTransport::new(
            std::iter::repeat((429, r#"{"retry_after": 10}"#)).take(6),
        );
        let client = ApiClient::new(transport, Duration::ZERO);

        let start = Instant::now();
        let err = client.request(get()).await.unwrap_err();
        let elapsed = start.elapsed();

        assert!(matches!(
            err,
            TransportError::RateLimitExhausted { attempts: 5, .. }
        ));
        assert_eq!(client.transport().attempts(), 5);
        // Four backoffs; the fifth 429 is not waited out.
        assert!(elapsed >= Duration::from_millis(40), "slept {:?}", elapsed);
        assert!(elapsed < Duration::from_millis(50), "slept {:?}", elapsed);
    }

    #[tokio::test(start_paused = true)]
    async fn oversized_retry_after_is_capped() {
        let transport = ScriptedTransport::new([
            (429, r#"{"retry_after": 1e25, "global": true}"#),
            (200, "{}"),
        ]);
        let client = ApiClient::new(transport, Duration::ZERO);

        let start = Instant::now();
        let response = client.request(get()).await.unwrap();

        assert_eq!(response.status, 200);
        assert!(start.elapsed() >= MAX_RETRY_AFTER);
        assert!(start.elapsed() < MAX_RETRY_AFTER + Duration::from_secs(1));
    }

    #[tokio::test(start_paused = true)]
    async fn default_sleep_precedes_every_attempt() {
        let transport = ScriptedTransport::new([
            (429, r#"{"retry_after": 100}"#),
            (204, ""),
        ]);
        let client = ApiClient::new(transport, Duration::from_millis(500));

        let start = Instant::now();
        client.request(get()).await.unwrap();

        // 500 + 100 + 500
        assert!(start.elapsed() >= Duration::from_millis(1100));
        assert!(start.elapsed() < Duration::from_millis(1150));
    }

    #[tokio::test(start_paused = true)]
    async fn terminal_status_is_not_retried() {
        let transport = ScriptedTransport::new([(403, "Missing Access"), (200, "{}")]);
        let client = ApiClient::new(transport, Duration::ZERO);

        let err = client.request(get()).await.unwrap_err();

        assert_eq!(err.code(), Some(403));
        assert!(err.to_string().contains("did not have permission"));
        assert!(err.to_string().contains("Missing Access"));
        assert_eq!(client.transport().attempts(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn unlisted_status_passes_through() {
        let transport = ScriptedTransport::new([(409, "conflict")]);
        let client = ApiClient::new(transport, Duration::ZERO);

        let response = client.request(get()).await.unwrap();
        assert_eq!(response.status, 409);
    }

    #[tokio::test(start_paused = true)]
    async fn unreadable_retry_after_uses_fallback() {
        let transport = ScriptedTransport::new([(429, "slow down"), (200, "{}")]);
        let client = ApiClient::new(transport, Duration::ZERO);

        let start = Instant::now();
        client.request(get()).await.unwrap();
        assert!(start.elapsed() >= FALLBACK_RETRY_AFTER);
    }
}
