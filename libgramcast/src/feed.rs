//! Published media and active stories
//!
//! Read-side Graph operations: the paginated media list, per-post details
//! with engagement insights, and the active-story feed.

use serde_json::{json, Value};
use tracing::{debug, info};

use crate::api::GraphApi;
use crate::error::{ApiError, GramcastError, Result};

/// Fields for the media listing
pub const MEDIA_LIST_FIELDS: &str = "id,caption,timestamp,media_type";

/// Fields for a single post's detail view
pub const POST_DETAIL_FIELDS: &str = "like_count,media_url,caption,comments_count,comments,media_type,children{media_url,media_type},insights.metric(impressions,reach,saved,total_interactions){title,values}";

/// Fields for the active-story listing
pub const STORY_LIST_FIELDS: &str = "id,media_type,media_url,thumbnail_url,timestamp,permalink";

/// Fields for a single story's detail view
pub const STORY_DETAIL_FIELDS: &str = "id,media_type,media_url,thumbnail_url,timestamp,permalink,like_count,is_shared_to_feed,username,caption,comments_count,owner,shortcode";

/// Story insight metrics
pub const STORY_INSIGHT_METRICS: &str = "impressions,reach,replies,navigation";

/// The API caps `limit` at 100 per page
const PAGE_LIMIT: &str = "100";

/// List every media object on the account, following pagination cursors
pub async fn fetch_media_list(api: &dyn GraphApi, ig_user_id: &str) -> Result<Vec<Value>> {
    let endpoint = format!("{}/media", ig_user_id);
    let mut all = Vec::new();
    let mut after: Option<String> = None;
    let mut page = 0usize;

    loop {
        page += 1;
        let mut params = vec![
            ("fields", MEDIA_LIST_FIELDS.to_string()),
            ("limit", PAGE_LIMIT.to_string()),
        ];
        if let Some(cursor) = &after {
            params.push(("after", cursor.clone()));
        }

        let response = api.get(&endpoint, &params).await?;
        let data = response
            .get("data")
            .and_then(|d| d.as_array())
            .ok_or_else(|| ApiError::Decode(format!("media page {}: missing data", page)))?;

        debug!(page, count = data.len(), "media page fetched");
        all.extend(data.iter().cloned());

        after = response
            .get("paging")
            .and_then(|p| p.get("cursors"))
            .and_then(|c| c.get("after"))
            .and_then(|a| a.as_str())
            .map(|s| s.to_string());

        if after.is_none() {
            break;
        }
    }

    info!(total = all.len(), "media list fetched");
    Ok(all)
}

/// Detail view of one post, engagement insights included
pub async fn fetch_post_details(api: &dyn GraphApi, media_id: &str) -> Result<Value> {
    api.get(media_id, &[("fields", POST_DETAIL_FIELDS.to_string())])
        .await
}

/// The whole account feed with per-post details.
///
/// Posts whose detail fetch fails are skipped, not fatal; one deleted or
/// restricted post should not sink a snapshot of the rest.
pub async fn fetch_all_post_details(api: &dyn GraphApi, ig_user_id: &str) -> Result<Vec<Value>> {
    let posts = fetch_media_list(api, ig_user_id).await?;
    let mut details = Vec::with_capacity(posts.len());

    for post in &posts {
        let Some(id) = post.get("id").and_then(|v| v.as_str()) else {
            continue;
        };
        match fetch_post_details(api, id).await {
            Ok(detail) => details.push(detail),
            Err(e) => debug!(media_id = id, "skipping post details: {}", e),
        }
    }

    Ok(details)
}

/// Currently active stories
pub async fn fetch_active_stories(api: &dyn GraphApi, ig_user_id: &str) -> Result<Vec<Value>> {
    let response = api
        .get(
            &format!("{}/stories", ig_user_id),
            &[("fields", STORY_LIST_FIELDS.to_string())],
        )
        .await?;

    response
        .get("data")
        .and_then(|d| d.as_array())
        .map(|d| d.to_vec())
        .ok_or_else(|| ApiError::Decode("stories: missing data array".to_string()).into())
}

/// Detail view of one story
pub async fn fetch_story_details(api: &dyn GraphApi, story_id: &str) -> Result<Value> {
    api.get(story_id, &[("fields", STORY_DETAIL_FIELDS.to_string())])
        .await
}

/// Story insights, flattened to metric → value.
///
/// Stories with too few viewers produce a Graph error (code 10) instead of a
/// series; that case is reported as data, not as a failure.
pub async fn fetch_story_insights(api: &dyn GraphApi, story_id: &str) -> Result<Value> {
    let result = api
        .get(
            &format!("{}/insights", story_id),
            &[("metric", STORY_INSIGHT_METRICS.to_string())],
        )
        .await;

    match result {
        Ok(response) => {
            let mut metrics = serde_json::Map::new();
            if let Some(data) = response.get("data").and_then(|d| d.as_array()) {
                for insight in data {
                    let name = insight
                        .get("name")
                        .and_then(|n| n.as_str())
                        .unwrap_or("unknown");
                    let value = insight
                        .get("values")
                        .and_then(|v| v.get(0))
                        .and_then(|v| v.get("value"))
                        .cloned()
                        .unwrap_or(json!(0));
                    metrics.insert(name.to_string(), value);
                }
            }
            Ok(Value::Object(metrics))
        }
        Err(GramcastError::Api(ApiError::Graph(e)))
            if e.code == Some(10) || e.message.to_lowercase().contains("not enough viewers") =>
        {
            Ok(json!({
                "status": "insufficient_data",
                "message": e.message,
                "error_code": e.code.unwrap_or(10),
            }))
        }
        Err(e) => Err(e),
    }
}

/// Assemble the exportable view of the active stories: details plus insights
pub async fn fetch_story_feed(api: &dyn GraphApi, ig_user_id: &str) -> Result<Vec<Value>> {
    let stories = fetch_active_stories(api, ig_user_id).await?;
    let mut assembled = Vec::with_capacity(stories.len());

    for story in &stories {
        let Some(id) = story.get("id").and_then(|v| v.as_str()) else {
            continue;
        };

        // Fall back to the listing entry when the detail view fails
        let mut detail = match fetch_story_details(api, id).await {
            Ok(d) => d,
            Err(e) => {
                debug!(story_id = id, "story details unavailable: {}", e);
                story.clone()
            }
        };

        let insights = match fetch_story_insights(api, id).await {
            Ok(i) => i,
            Err(e) => json!({"status": "error", "message": e.to_string()}),
        };
        if let Some(map) = detail.as_object_mut() {
            map.insert("insights".to_string(), insights);
        }
        assembled.push(detail);
    }

    Ok(assembled)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GraphErrorBody;
    use crate::mock::MockGraph;

    #[tokio::test]
    async fn test_fetch_media_list_single_page() {
        let mock = MockGraph::new();
        mock.push_ok(json!({
            "data": [{"id": "1", "media_type": "IMAGE"}, {"id": "2", "media_type": "VIDEO"}],
            "paging": {"cursors": {"before": "b"}}
        }));

        let posts = fetch_media_list(&mock, "178").await.unwrap();
        assert_eq!(posts.len(), 2);

        let requests = mock.requests();
        assert_eq!(requests.len(), 1);
        assert!(requests[0]
            .params
            .contains(&("limit".to_string(), "100".to_string())));
    }

    #[tokio::test]
    async fn test_fetch_media_list_follows_cursor() {
        let mock = MockGraph::new();
        mock.push_ok(json!({
            "data": [{"id": "1"}],
            "paging": {"cursors": {"after": "CURSOR1"}}
        }));
        mock.push_ok(json!({
            "data": [{"id": "2"}]
        }));

        let posts = fetch_media_list(&mock, "178").await.unwrap();
        assert_eq!(posts.len(), 2);

        let requests = mock.requests();
        assert_eq!(requests.len(), 2);
        assert!(requests[1]
            .params
            .contains(&("after".to_string(), "CURSOR1".to_string())));
    }

    #[tokio::test]
    async fn test_fetch_all_post_details_skips_failures() {
        let mock = MockGraph::new();
        mock.push_ok(json!({"data": [{"id": "1"}, {"id": "2"}]}));
        mock.push_err(ApiError::Network("gone".to_string()));
        mock.push_ok(json!({"id": "2", "like_count": 5}));

        let details = fetch_all_post_details(&mock, "178").await.unwrap();
        assert_eq!(details.len(), 1);
        assert_eq!(details[0]["id"], "2");
    }

    #[tokio::test]
    async fn test_fetch_story_insights_flattens_metrics() {
        let mock = MockGraph::new();
        mock.push_ok(json!({
            "data": [
                {"name": "impressions", "values": [{"value": 42}]},
                {"name": "reach", "values": [{"value": 30}]}
            ]
        }));

        let insights = fetch_story_insights(&mock, "999").await.unwrap();
        assert_eq!(insights["impressions"], 42);
        assert_eq!(insights["reach"], 30);
    }

    #[tokio::test]
    async fn test_fetch_story_insights_insufficient_viewers() {
        let mock = MockGraph::new();
        mock.push_err(ApiError::Graph(GraphErrorBody {
            message: "Not enough viewers for the media to show insights".to_string(),
            error_type: Some("OAuthException".to_string()),
            code: Some(10),
            error_subcode: None,
            fbtrace_id: None,
        }));

        let insights = fetch_story_insights(&mock, "999").await.unwrap();
        assert_eq!(insights["status"], "insufficient_data");
        assert_eq!(insights["error_code"], 10);
    }

    #[tokio::test]
    async fn test_fetch_story_feed_attaches_insights() {
        let mock = MockGraph::new();
        mock.push_ok(json!({"data": [{"id": "s1", "media_type": "IMAGE"}]}));
        mock.push_ok(json!({"id": "s1", "media_type": "IMAGE", "like_count": 2}));
        mock.push_ok(json!({"data": [{"name": "reach", "values": [{"value": 12}]}]}));

        let feed = fetch_story_feed(&mock, "178").await.unwrap();
        assert_eq!(feed.len(), 1);
        assert_eq!(feed[0]["like_count"], 2);
        assert_eq!(feed[0]["insights"]["reach"], 12);
    }

    #[tokio::test]
    async fn test_fetch_active_stories_empty() {
        let mock = MockGraph::new();
        mock.push_ok(json!({"data": []}));
        let stories = fetch_active_stories(&mock, "178").await.unwrap();
        assert!(stories.is_empty());
    }
}
