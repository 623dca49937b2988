//! Follower insights and audience demographics
//!
//! Wraps `{ig-user-id}/insights`. Demographic metrics come back as a
//! `total_value.breakdowns` structure keyed by dimension; the extraction here
//! flattens one dimension into a plain name → count map.

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use crate::api::GraphApi;
use crate::error::Result;

/// A demographics dimension the API can break follower counts down by
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Breakdown {
    Gender,
    Age,
    City,
}

impl Breakdown {
    pub fn as_str(&self) -> &'static str {
        match self {
            Breakdown::Gender => "gender",
            Breakdown::Age => "age",
            Breakdown::City => "city",
        }
    }
}

impl std::fmt::Display for Breakdown {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One day's demographics, one map per dimension
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DemographicsSnapshot {
    pub gender: BTreeMap<String, i64>,
    pub age: BTreeMap<String, i64>,
    pub city: BTreeMap<String, i64>,
}

/// The follower-insights window: the 30 days leading up to `today`
pub fn follower_window(today: NaiveDate) -> (NaiveDate, NaiveDate) {
    (today - Duration::days(30), today)
}

/// Raw daily follower_count series over the given window
pub async fn fetch_follower_series(
    api: &dyn GraphApi,
    ig_user_id: &str,
    since: NaiveDate,
    until: NaiveDate,
) -> Result<Value> {
    api.get(
        &format!("{}/insights", ig_user_id),
        &[
            ("metric", "follower_count".to_string()),
            ("period", "day".to_string()),
            ("since", since.format("%Y-%m-%d").to_string()),
            ("until", until.format("%Y-%m-%d").to_string()),
        ],
    )
    .await
}

/// Raw lifetime follower demographics for one breakdown dimension
pub async fn fetch_demographics(
    api: &dyn GraphApi,
    ig_user_id: &str,
    breakdown: Breakdown,
) -> Result<Value> {
    api.get(
        &format!("{}/insights", ig_user_id),
        &[
            ("metric", "follower_demographics".to_string()),
            ("period", "lifetime".to_string()),
            ("breakdown", breakdown.as_str().to_string()),
            ("metric_type", "total_value".to_string()),
        ],
    )
    .await
}

/// Flatten one dimension out of a demographics response.
///
/// Missing pieces yield an empty map rather than an error; accounts with few
/// followers legitimately get empty breakdowns.
pub fn extract_breakdown(response: &Value, dimension: &str) -> BTreeMap<String, i64> {
    let mut values = BTreeMap::new();

    let breakdowns = response
        .get("data")
        .and_then(|d| d.get(0))
        .and_then(|first| first.get("total_value"))
        .and_then(|tv| tv.get("breakdowns"))
        .and_then(|b| b.as_array());

    let Some(breakdowns) = breakdowns else {
        return values;
    };

    for entry in breakdowns {
        let matches_dimension = entry
            .get("dimension_keys")
            .and_then(|k| k.get(0))
            .and_then(|k| k.as_str())
            == Some(dimension);
        if !matches_dimension {
            continue;
        }

        if let Some(results) = entry.get("results").and_then(|r| r.as_array()) {
            for result in results {
                let name = result
                    .get("dimension_values")
                    .and_then(|v| v.get(0))
                    .and_then(|v| v.as_str());
                let count = result.get("value").and_then(|v| v.as_i64());
                if let (Some(name), Some(count)) = (name, count) {
                    values.insert(name.to_string(), count);
                }
            }
        }
        break;
    }

    values
}

/// Fetch all three demographic dimensions as one snapshot
pub async fn fetch_demographics_snapshot(
    api: &dyn GraphApi,
    ig_user_id: &str,
) -> Result<DemographicsSnapshot> {
    let gender = fetch_demographics(api, ig_user_id, Breakdown::Gender).await?;
    let age = fetch_demographics(api, ig_user_id, Breakdown::Age).await?;
    let city = fetch_demographics(api, ig_user_id, Breakdown::City).await?;

    Ok(DemographicsSnapshot {
        gender: extract_breakdown(&gender, "gender"),
        age: extract_breakdown(&age, "age"),
        city: extract_breakdown(&city, "city"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockGraph;
    use serde_json::json;

    fn demographics_body(dimension: &str) -> Value {
        json!({
            "data": [{
                "name": "follower_demographics",
                "period": "lifetime",
                "total_value": {
                    "breakdowns": [{
                        "dimension_keys": [dimension],
                        "results": [
                            {"dimension_values": ["F"], "value": 62},
                            {"dimension_values": ["M"], "value": 38}
                        ]
                    }]
                }
            }]
        })
    }

    #[test]
    fn test_extract_breakdown() {
        let body = demographics_body("gender");
        let values = extract_breakdown(&body, "gender");
        assert_eq!(values.get("F"), Some(&62));
        assert_eq!(values.get("M"), Some(&38));
    }

    #[test]
    fn test_extract_breakdown_wrong_dimension() {
        let body = demographics_body("age");
        assert!(extract_breakdown(&body, "gender").is_empty());
    }

    #[test]
    fn test_extract_breakdown_empty_response() {
        assert!(extract_breakdown(&json!({"data": []}), "gender").is_empty());
        assert!(extract_breakdown(&json!({}), "gender").is_empty());
    }

    #[test]
    fn test_follower_window() {
        let today = NaiveDate::from_ymd_opt(2026, 8, 7).unwrap();
        let (since, until) = follower_window(today);
        assert_eq!(since, NaiveDate::from_ymd_opt(2026, 7, 8).unwrap());
        assert_eq!(until, today);
    }

    #[tokio::test]
    async fn test_fetch_follower_series_params() {
        let mock = MockGraph::new();
        mock.push_ok(json!({"data": []}));

        let since = NaiveDate::from_ymd_opt(2026, 7, 8).unwrap();
        let until = NaiveDate::from_ymd_opt(2026, 8, 7).unwrap();
        fetch_follower_series(&mock, "178", since, until)
            .await
            .unwrap();

        let requests = mock.requests();
        assert_eq!(requests[0].endpoint, "178/insights");
        assert!(requests[0]
            .params
            .contains(&("metric".to_string(), "follower_count".to_string())));
        assert!(requests[0]
            .params
            .contains(&("since".to_string(), "2026-07-08".to_string())));
        assert!(requests[0]
            .params
            .contains(&("until".to_string(), "2026-08-07".to_string())));
    }

    #[tokio::test]
    async fn test_fetch_demographics_snapshot() {
        let mock = MockGraph::new();
        mock.push_ok(demographics_body("gender"));
        mock.push_ok(json!({
            "data": [{
                "total_value": {
                    "breakdowns": [{
                        "dimension_keys": ["age"],
                        "results": [
                            {"dimension_values": ["25-34"], "value": 40},
                            {"dimension_values": ["35-44"], "value": 21}
                        ]
                    }]
                }
            }]
        }));
        mock.push_ok(json!({
            "data": [{
                "total_value": {
                    "breakdowns": [{
                        "dimension_keys": ["city"],
                        "results": [
                            {"dimension_values": ["Madrid, Comunidad de Madrid"], "value": 17}
                        ]
                    }]
                }
            }]
        }));

        let snapshot = fetch_demographics_snapshot(&mock, "178").await.unwrap();
        assert_eq!(snapshot.gender.get("F"), Some(&62));
        assert_eq!(snapshot.age.get("25-34"), Some(&40));
        assert_eq!(
            snapshot.city.get("Madrid, Comunidad de Madrid"),
            Some(&17)
        );

        // One request per dimension, each carrying its breakdown parameter
        let requests = mock.requests();
        assert_eq!(requests.len(), 3);
        assert!(requests[1]
            .params
            .contains(&("breakdown".to_string(), "age".to_string())));
    }
}
