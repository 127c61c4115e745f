// Scripted transport for tests.
// Replays canned responses per URL and records every request issued.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use crate::error::Result;

use super::transport::{ApiResponse, Transport};

#[derive(Debug, Clone, PartialEq)]
pub struct RecordedRequest {
    pub method: &'static str,
    pub url: String,
    pub body: Option<serde_json::Value>,
}

#[derive(Default)]
pub struct ScriptedTransport {
    routes: Mutex<HashMap<String, VecDeque<ApiResponse>>>,
    requests: Mutex<Vec<RecordedRequest>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a response for `url`. Responses for the same URL are served in order.
    pub fn on(self, url: &str, response: ApiResponse) -> Self {
        self.routes
            .lock()
            .unwrap()
            .entry(url.to_string())
            .or_default()
            .push_back(response);
        self
    }

    pub fn on_json(self, url: &str, value: serde_json::Value) -> Self {
        self.on(url, ApiResponse::new(200, value.to_string()))
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    fn respond(&self, method: &'static str, url: &str, body: Option<serde_json::Value>) -> ApiResponse {
        self.requests.lock().unwrap().push(RecordedRequest {
            method,
            url: url.to_string(),
            body,
        });
        self.routes
            .lock()
            .unwrap()
            .get_mut(url)
            .and_then(VecDeque::pop_front)
            .unwrap_or_else(|| ApiResponse::new(404, format!("no scripted response for {url}")))
    }
}

impl Transport for ScriptedTransport {
    async fn get(&self, url: &str) -> Result<ApiResponse> {
        Ok(self.respond("GET", url, None))
    }

    async fn post_json(&self, url: &str, body: &serde_json::Value) -> Result<ApiResponse> {
        Ok(self.respond("POST", url, Some(body.clone())))
    }
}
