//! The seam between orchestration code and the Graph API transport
//!
//! Publishing, feed, and insights code talk to this trait rather than to the
//! HTTP client directly, so tests can swap in a scripted mock.

use async_trait::async_trait;
use serde_json::Value;

use crate::error::{ApiError, Result};

/// Minimal Graph API surface: authenticated GET and form-encoded POST.
///
/// Endpoints are given relative to the versioned base URL, e.g.
/// `"me/accounts"` or `"{ig-user-id}/media_publish"`. Implementations attach
/// the access token and app id to every request.
#[async_trait]
pub trait GraphApi: Send + Sync {
    /// GET with query parameters, returning the decoded JSON body
    async fn get(&self, endpoint: &str, params: &[(&str, String)]) -> Result<Value>;

    /// POST with a form-encoded body, returning the decoded JSON body
    async fn post_form(&self, endpoint: &str, params: &[(&str, String)]) -> Result<Value>;
}

/// Pull the `id` field out of a Graph response.
///
/// Container creation and publishing both signal success solely through the
/// presence of an `id`.
pub fn expect_id(value: &Value) -> Result<String> {
    value
        .get("id")
        .and_then(|v| v.as_str())
        .map(|s| s.to_string())
        .ok_or_else(|| {
            ApiError::Decode(format!("response carried no id field: {}", value)).into()
        })
}
