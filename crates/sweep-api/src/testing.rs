use std::collections::VecDeque;
use std::sync::Mutex;

use crate::error::TransportError;
use crate::transport::{ApiRequest, ApiResponse, Transport};

/// Replays canned responses in order and records every request it sees.
pub struct ScriptedTransport {
    responses: Mutex<VecDeque<ApiResponse>>,
    requests: Mutex<Vec<ApiRequest>>,
}

impl ScriptedTransport {
    pub fn new<'a>(script: impl IntoIterator<Item = (u16, &'a str)>) -> Self {
        Self {
            responses: Mutex::new(
                script
                    .into_iter()
                    .map(|(status, body)| ApiResponse {
                        status,
                        body: body.to_string(),
                    })
                    .collect(),
            ),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn attempts(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn requests(&self) -> Vec<ApiRequest> {
        self.requests.lock().unwrap().clone()
    }
}

impl Transport for ScriptedTransport {
    async fn send(&self, request: &ApiRequest) -> Result<ApiResponse, TransportError> {
        self.requests.lock().unwrap().push(request.clone());
        let next = self.responses.lock().unwrap().pop_front();
        Ok(next.unwrap_or_else(|| panic!("no scripted response left for {}", request.path)))
    }
}
