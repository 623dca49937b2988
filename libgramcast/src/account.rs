//! Business-account resolution and account details
//!
//! The Graph API has no direct "my Instagram account" endpoint: the account
//! is reached through the Facebook pages the token can manage. The first page
//! carrying an `instagram_business_account` wins.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::api::GraphApi;
use crate::error::{ApiError, Result};

/// Fields requested for the account-details view
pub const DETAIL_FIELDS: &str =
    "followers_count,follows_count,media_count,name,biography,username,profile_picture_url";

#[derive(Debug, Clone, Deserialize)]
struct PageList {
    #[serde(default)]
    data: Vec<PageEntry>,
}

#[derive(Debug, Clone, Deserialize)]
struct PageEntry {
    name: Option<String>,
    instagram_business_account: Option<IgRef>,
}

#[derive(Debug, Clone, Deserialize)]
struct IgRef {
    id: String,
}

/// The Instagram business account behind a Facebook page
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BusinessAccount {
    pub ig_user_id: String,
    pub page_name: String,
}

/// Profile-level details of the Instagram business account
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AccountDetails {
    pub followers_count: Option<i64>,
    pub follows_count: Option<i64>,
    pub media_count: Option<i64>,
    pub name: Option<String>,
    pub biography: Option<String>,
    pub username: Option<String>,
    pub profile_picture_url: Option<String>,
}

/// Find the Instagram business account linked to the token's pages
pub async fn resolve_business_account(api: &dyn GraphApi) -> Result<BusinessAccount> {
    let response = api
        .get(
            "me/accounts",
            &[("fields", "instagram_business_account,name".to_string())],
        )
        .await?;

    let pages: PageList = serde_json::from_value(response)
        .map_err(|e| ApiError::Decode(format!("me/accounts: {}", e)))?;

    pages
        .data
        .into_iter()
        .find_map(|page| {
            page.instagram_business_account.map(|ig| BusinessAccount {
                ig_user_id: ig.id,
                page_name: page.name.unwrap_or_default(),
            })
        })
        .ok_or_else(|| {
            ApiError::Decode("no Instagram business account linked to this token".to_string())
                .into()
        })
}

/// Fetch the raw account-overview response, suitable for snapshot export
pub async fn fetch_account_overview(api: &dyn GraphApi) -> Result<Value> {
    api.get(
        "me/accounts",
        &[(
            "fields",
            format!("instagram_business_account{{{}}}", DETAIL_FIELDS),
        )],
    )
    .await
}

/// Fetch typed details for the first linked Instagram business account
pub async fn fetch_account_details(api: &dyn GraphApi) -> Result<AccountDetails> {
    let response = fetch_account_overview(api).await?;

    let pages = response
        .get("data")
        .and_then(|d| d.as_array())
        .ok_or_else(|| ApiError::Decode("me/accounts: missing data array".to_string()))?;

    for page in pages {
        if let Some(account) = page.get("instagram_business_account") {
            return serde_json::from_value(account.clone())
                .map_err(|e| ApiError::Decode(format!("account details: {}", e)).into());
        }
    }

    Err(ApiError::Decode("no Instagram business account linked to this token".to_string()).into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockGraph;
    use serde_json::json;

    #[tokio::test]
    async fn test_resolve_business_account() {
        let mock = MockGraph::new();
        mock.push_ok(json!({
            "data": [
                {"name": "Plain Page", "id": "111"},
                {
                    "name": "Shop Page",
                    "id": "222",
                    "instagram_business_account": {"id": "17841475801593188"}
                }
            ]
        }));

        let account = resolve_business_account(&mock).await.unwrap();
        assert_eq!(account.ig_user_id, "17841475801593188");
        assert_eq!(account.page_name, "Shop Page");

        let requests = mock.requests();
        assert_eq!(requests[0].endpoint, "me/accounts");
        assert_eq!(
            requests[0].params[0].1,
            "instagram_business_account,name"
        );
    }

    #[tokio::test]
    async fn test_resolve_business_account_none_linked() {
        let mock = MockGraph::new();
        mock.push_ok(json!({"data": [{"name": "Plain Page", "id": "111"}]}));

        assert!(resolve_business_account(&mock).await.is_err());
    }

    #[tokio::test]
    async fn test_resolve_business_account_empty_data() {
        let mock = MockGraph::new();
        mock.push_ok(json!({"data": []}));

        assert!(resolve_business_account(&mock).await.is_err());
    }

    #[tokio::test]
    async fn test_fetch_account_details() {
        let mock = MockGraph::new();
        mock.push_ok(json!({
            "data": [{
                "instagram_business_account": {
                    "followers_count": 154,
                    "follows_count": 12,
                    "media_count": 33,
                    "name": "Shop",
                    "biography": "We sell things",
                    "username": "shop.example",
                    "profile_picture_url": "https://cdn.example/pic.jpg",
                    "id": "17841475801593188"
                },
                "id": "222"
            }]
        }));

        let details = fetch_account_details(&mock).await.unwrap();
        assert_eq!(details.followers_count, Some(154));
        assert_eq!(details.username.as_deref(), Some("shop.example"));

        // The nested-fields syntax must be used on the wire
        let requests = mock.requests();
        assert!(requests[0].params[0]
            .1
            .starts_with("instagram_business_account{"));
    }

    #[tokio::test]
    async fn test_fetch_account_details_missing_data() {
        let mock = MockGraph::new();
        mock.push_ok(json!({"paging": {}}));

        assert!(fetch_account_details(&mock).await.is_err());
    }
}
