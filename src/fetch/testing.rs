//! Scripted [`HttpClient`] used by unit tests.

use super::client::HttpClient;
use async_trait::async_trait;
use reqwest::header::HeaderMap;
use std::collections::VecDeque;
use std::sync::Mutex;

#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: reqwest::Method,
    pub url: reqwest::Url,
    pub headers: HeaderMap,
    pub body: Option<Vec<u8>>,
}

impl RecordedRequest {
    pub fn body_str(&self) -> String {
        String::from_utf8(self.body.clone().unwrap_or_default()).unwrap()
    }
}

/// Replays `(status, body)` pairs in order and records every request.
pub struct ScriptedClient {
    responses: Mutex<VecDeque<(u16, String)>>,
    requests: Mutex<Vec<RecordedRequest>>,
}

impl ScriptedClient {
    pub fn new(responses: Vec<(u16, String)>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl HttpClient for ScriptedClient {
    async fn execute(&self, req: reqwest::Request) -> reqwest::Result<reqwest::Response> {
        self.requests.lock().unwrap().push(RecordedRequest {
            method: req.method().clone(),
            url: req.url().clone(),
            headers: req.headers().clone(),
            body: req.body().and_then(|b| b.as_bytes()).map(|b| b.to_vec()),
        });

        let (status, body) = self
            .responses
            .lock()
            .unwrap()
            .pop_front()
            .expect("ScriptedClient: no response left");

        let response = http::Response::builder()
            .status(status)
            .header("content-type", "application/json")
            .body(body)
            .unwrap();
        Ok(reqwest::Response::from(response))
    }
}
