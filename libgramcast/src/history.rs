//! Local JSON statistics stores
//!
//! Follower counts and demographics accumulate one sample per day in flat
//! JSON maps keyed by `YYYY-MM-DD`; snapshot exports overwrite their file
//! wholesale. Everything is written the same way the queue is: temp file,
//! then rename.

use chrono::{DateTime, NaiveDate, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::config::Config;
use crate::error::{Result, StoreError};
use crate::insights::DemographicsSnapshot;
use crate::media::MediaKind;
use crate::publisher::PublishOutcome;

pub const FOLLOWERS_FILE: &str = "followers_history.json";
pub const DEMOGRAPHICS_FILE: &str = "demographics_history.json";
pub const POSTS_FILE: &str = "instagram_posts.json";
pub const DETAILS_FILE: &str = "instagram_details.json";
pub const STORIES_FILE: &str = "instagram_stories.json";
pub const INSIGHTS_FILE: &str = "follower_insights.json";

/// What recording a daily sample did
#[derive(Debug, Clone, PartialEq)]
pub enum RecordOutcome {
    /// Today's sample already existed; nothing written
    AlreadyRecorded,
    /// Sample written; delta versus the previous recorded day, if any
    Recorded { delta: Option<i64> },
}

/// File-backed statistics store rooted at the data directory
pub struct HistoryStore {
    dir: PathBuf,
}

impl HistoryStore {
    pub fn new(dir: &Path) -> Self {
        Self {
            dir: dir.to_path_buf(),
        }
    }

    pub fn open(config: &Config) -> Self {
        Self::new(&config.data_dir())
    }

    fn path(&self, file: &str) -> PathBuf {
        self.dir.join(file)
    }

    fn load_or_default<T: DeserializeOwned + Default>(&self, file: &str) -> Result<T> {
        let path = self.path(file);
        if !path.exists() {
            return Ok(T::default());
        }
        let content = std::fs::read_to_string(&path).map_err(StoreError::IoError)?;
        serde_json::from_str(&content)
            .map_err(|e| {
                StoreError::ParseError {
                    file: file.to_string(),
                    source: e,
                }
                .into()
            })
    }

    fn save<T: Serialize>(&self, file: &str, value: &T) -> Result<()> {
        std::fs::create_dir_all(&self.dir).map_err(StoreError::IoError)?;

        let content =
            serde_json::to_string_pretty(value).map_err(|e| StoreError::SerializeError {
                file: file.to_string(),
                source: e,
            })?;

        let path = self.path(file);
        let tmp_path = path.with_extension("json.tmp");
        std::fs::write(&tmp_path, content).map_err(StoreError::IoError)?;
        std::fs::rename(&tmp_path, &path).map_err(StoreError::IoError)?;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Follower history
    // ------------------------------------------------------------------

    pub fn load_followers(&self) -> Result<BTreeMap<String, i64>> {
        self.load_or_default(FOLLOWERS_FILE)
    }

    /// Record one follower sample for the given day.
    ///
    /// A day is sampled at most once; re-runs on the same day are no-ops.
    pub fn record_followers(&self, date: NaiveDate, count: i64) -> Result<RecordOutcome> {
        let mut history = self.load_followers()?;
        let key = date.format("%Y-%m-%d").to_string();

        if history.contains_key(&key) {
            return Ok(RecordOutcome::AlreadyRecorded);
        }

        let previous = history
            .range(..key.clone())
            .next_back()
            .map(|(_, count)| *count);

        history.insert(key, count);
        self.save(FOLLOWERS_FILE, &history)?;

        Ok(RecordOutcome::Recorded {
            delta: previous.map(|prev| count - prev),
        })
    }

    // ------------------------------------------------------------------
    // Demographics history
    // ------------------------------------------------------------------

    pub fn load_demographics(&self) -> Result<BTreeMap<String, DemographicsSnapshot>> {
        self.load_or_default(DEMOGRAPHICS_FILE)
    }

    /// Most recent day a demographics snapshot was recorded
    pub fn last_demographics_date(&self) -> Result<Option<String>> {
        Ok(self.load_demographics()?.keys().next_back().cloned())
    }

    /// Record one demographics snapshot for the given day; same-day re-runs
    /// are no-ops.
    pub fn record_demographics(
        &self,
        date: NaiveDate,
        snapshot: &DemographicsSnapshot,
    ) -> Result<RecordOutcome> {
        let mut history = self.load_demographics()?;
        let key = date.format("%Y-%m-%d").to_string();

        if history.contains_key(&key) {
            return Ok(RecordOutcome::AlreadyRecorded);
        }

        history.insert(key, snapshot.clone());
        self.save(DEMOGRAPHICS_FILE, &history)?;
        Ok(RecordOutcome::Recorded { delta: None })
    }

    // ------------------------------------------------------------------
    // Published-post log and snapshot exports
    // ------------------------------------------------------------------

    /// Append one record to the local post log
    pub fn append_post_record(&self, record: Value) -> Result<()> {
        let mut posts: Vec<Value> = self.load_or_default(POSTS_FILE)?;
        posts.push(record);
        self.save(POSTS_FILE, &posts)
    }

    /// Overwrite a snapshot file wholesale
    pub fn write_snapshot(&self, file: &str, value: &Value) -> Result<()> {
        self.save(file, value)
    }

    pub fn snapshot_path(&self, file: &str) -> PathBuf {
        self.path(file)
    }
}

/// Per-day rows for the follower-history display: (date, count, delta)
pub fn follower_variations(history: &BTreeMap<String, i64>) -> Vec<(String, i64, Option<i64>)> {
    let mut rows = Vec::with_capacity(history.len());
    let mut previous: Option<i64> = None;

    for (date, count) in history {
        rows.push((date.clone(), *count, previous.map(|prev| count - prev)));
        previous = Some(*count);
    }

    rows
}

/// The local record appended to the post log after a publication
pub fn published_post_record(
    outcome: &PublishOutcome,
    kind: MediaKind,
    caption: Option<&str>,
    media_urls: &[String],
    published_at: DateTime<Utc>,
) -> Value {
    let mut record = json!({
        "id": outcome.media_id,
        "media_type": kind,
        "caption": caption,
        "timestamp": published_at.to_rfc3339(),
        "like_count": 0,
        "comments_count": 0,
    });

    let extra = match kind {
        MediaKind::Carousel => json!({
            "children": media_urls
                .iter()
                .map(|url| {
                    json!({
                        "media_url": url,
                        "media_type": if crate::media::is_video_url(url) { "VIDEO" } else { "IMAGE" },
                    })
                })
                .collect::<Vec<_>>(),
        }),
        MediaKind::Reels => json!({"video_url": media_urls.first()}),
        _ => json!({"media_url": media_urls.first()}),
    };

    if let (Some(record_map), Some(extra_map)) = (record.as_object_mut(), extra.as_object()) {
        for (k, v) in extra_map {
            record_map.insert(k.clone(), v.clone());
        }
    }

    record
}
