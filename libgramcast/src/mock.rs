//! Scripted mock Graph API for testing
//!
//! Responses are queued ahead of time and played back in order, while every
//! request is recorded for verification. Available to all builds so the
//! integration tests of the binaries can use it too.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::Mutex;

use crate::api::GraphApi;
use crate::error::{ApiError, Result};

/// A request the mock has seen
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedRequest {
    pub method: &'static str,
    pub endpoint: String,
    pub params: Vec<(String, String)>,
}

/// Mock Graph API with scripted responses
#[derive(Default)]
pub struct MockGraph {
    responses: Mutex<VecDeque<std::result::Result<Value, ApiError>>>,
    requests: Mutex<Vec<RecordedRequest>>,
}

impl MockGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a successful response
    pub fn push_ok(&self, value: Value) {
        self.responses.lock().unwrap().push_back(Ok(value));
    }

    /// Queue a failure
    pub fn push_err(&self, error: ApiError) {
        self.responses.lock().unwrap().push_back(Err(error));
    }

    /// All requests seen so far, in order
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// Number of requests seen so far
    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    fn record_and_pop(
        &self,
        method: &'static str,
        endpoint: &str,
        params: &[(&str, String)],
    ) -> Result<Value> {
        self.requests.lock().unwrap().push(RecordedRequest {
            method,
            endpoint: endpoint.to_string(),
            params: params
                .iter()
                .map(|(k, v)| (k.to_string(), v.clone()))
                .collect(),
        });

        match self.responses.lock().unwrap().pop_front() {
            Some(Ok(value)) => Ok(value),
            Some(Err(e)) => Err(e.into()),
            None => Err(ApiError::Network("mock: no scripted response left".to_string()).into()),
        }
    }
}

#[async_trait]
impl GraphApi for MockGraph {
    async fn get(&self, endpoint: &str, params: &[(&str, String)]) -> Result<Value> {
        self.record_and_pop("GET", endpoint, params)
    }

    async fn post_form(&self, endpoint: &str, params: &[(&str, String)]) -> Result<Value> {
        self.record_and_pop("POST", endpoint, params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_mock_plays_back_in_order() {
        let mock = MockGraph::new();
        mock.push_ok(json!({"id": "1"}));
        mock.push_ok(json!({"id": "2"}));

        let first = mock.get("me/accounts", &[]).await.unwrap();
        let second = mock.post_form("x/media", &[]).await.unwrap();
        assert_eq!(first["id"], "1");
        assert_eq!(second["id"], "2");
    }

    #[tokio::test]
    async fn test_mock_records_requests() {
        let mock = MockGraph::new();
        mock.push_ok(json!({}));

        mock.post_form("123/media", &[("image_url", "https://example.com/a.jpg".to_string())])
            .await
            .unwrap();

        let requests = mock.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].method, "POST");
        assert_eq!(requests[0].endpoint, "123/media");
        assert_eq!(
            requests[0].params[0],
            ("image_url".to_string(), "https://example.com/a.jpg".to_string())
        );
    }

    #[tokio::test]
    async fn test_mock_exhausted_is_an_error() {
        let mock = MockGraph::new();
        assert!(mock.get("me/accounts", &[]).await.is_err());
    }
}
