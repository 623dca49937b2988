//! The scheduled-post queue
//!
//! Deferred publications live in a flat JSON file: the container is created
//! up front, and the queue entry carries everything the daemon needs to
//! publish it later. The file is rewritten as a whole on every change, via a
//! temp file renamed into place so a crash never leaves a torn queue behind.
//! There is no cross-process locking; a single scheduler is assumed.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use uuid::Uuid;

use crate::config::Config;
use crate::error::{Result, StoreError};
use crate::media::MediaKind;

/// Queue file name inside the store directory
pub const QUEUE_FILE: &str = "scheduled_posts.json";

/// One deferred publication
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScheduledPost {
    /// Local handle used by the queue tools
    pub id: String,
    /// Instagram business account the container belongs to
    pub ig_user_id: String,
    /// Graph container id, ready to publish
    pub creation_id: String,
    /// Unix seconds at which to publish
    pub scheduled_at: i64,
    /// Unix seconds at which the entry was queued
    pub created_at: i64,
    pub kind: MediaKind,
    pub caption: Option<String>,
    pub media_urls: Vec<String>,
    /// Publish attempts made so far
    #[serde(default)]
    pub attempts: u32,
}

impl ScheduledPost {
    pub fn new(
        ig_user_id: String,
        creation_id: String,
        scheduled_at: i64,
        kind: MediaKind,
        caption: Option<String>,
        media_urls: Vec<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            ig_user_id,
            creation_id,
            scheduled_at,
            created_at: Utc::now().timestamp(),
            kind,
            caption,
            media_urls,
            attempts: 0,
        }
    }

    pub fn is_due(&self, now: i64) -> bool {
        self.scheduled_at <= now
    }
}

/// Queue statistics for `gram-queue stats`
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct QueueStats {
    pub total: usize,
    pub due: usize,
    pub upcoming: usize,
    pub next_scheduled_at: Option<i64>,
}

/// Summarize a queue snapshot
pub fn stats(posts: &[ScheduledPost], now: i64) -> QueueStats {
    let due = posts.iter().filter(|p| p.is_due(now)).count();
    QueueStats {
        total: posts.len(),
        due,
        upcoming: posts.len() - due,
        next_scheduled_at: posts.iter().map(|p| p.scheduled_at).min(),
    }
}

/// File-backed queue store
pub struct QueueStore {
    path: PathBuf,
}

impl QueueStore {
    /// Store rooted at the given data directory
    pub fn new(dir: &Path) -> Self {
        Self {
            path: dir.join(QUEUE_FILE),
        }
    }

    /// Store rooted at the configured data directory
    pub fn open(config: &Config) -> Self {
        Self::new(&config.data_dir())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the whole queue; a missing file is an empty queue
    pub fn load(&self) -> Result<Vec<ScheduledPost>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let content = std::fs::read_to_string(&self.path).map_err(StoreError::IoError)?;
        let posts = serde_json::from_str(&content).map_err(|e| StoreError::ParseError {
            file: QUEUE_FILE.to_string(),
            source: e,
        })?;
        Ok(posts)
    }

    /// Rewrite the whole queue atomically (temp file + rename)
    pub fn save(&self, posts: &[ScheduledPost]) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(StoreError::IoError)?;
        }

        let content =
            serde_json::to_string_pretty(posts).map_err(|e| StoreError::SerializeError {
                file: QUEUE_FILE.to_string(),
                source: e,
            })?;

        let tmp_path = self.path.with_extension("json.tmp");
        std::fs::write(&tmp_path, content).map_err(StoreError::IoError)?;
        std::fs::rename(&tmp_path, &self.path).map_err(StoreError::IoError)?;
        Ok(())
    }

    /// Add one entry
    pub fn append(&self, post: ScheduledPost) -> Result<()> {
        let mut posts = self.load()?;
        posts.push(post);
        self.save(&posts)
    }

    /// Find an entry by its local id
    pub fn find(&self, id: &str) -> Result<ScheduledPost> {
        self.load()?
            .into_iter()
            .find(|p| p.id == id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()).into())
    }

    /// Remove an entry by its local id, returning it
    pub fn remove(&self, id: &str) -> Result<ScheduledPost> {
        let mut posts = self.load()?;
        let index = posts
            .iter()
            .position(|p| p.id == id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        let removed = posts.remove(index);
        self.save(&posts)?;
        Ok(removed)
    }

    /// Drop every entry, returning how many were removed
    pub fn clear(&self) -> Result<usize> {
        let posts = self.load()?;
        let count = posts.len();
        self.save(&[])?;
        Ok(count)
    }

    /// Move an entry to a new time, resetting its attempt counter
    pub fn reschedule(&self, id: &str, scheduled_at: i64) -> Result<ScheduledPost> {
        let mut posts = self.load()?;
        let post = posts
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        post.scheduled_at = scheduled_at;
        post.attempts = 0;
        let updated = post.clone();
        self.save(&posts)?;
        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_post(scheduled_at: i64) -> ScheduledPost {
        ScheduledPost::new(
            "17841475801593188".to_string(),
            "18012345678901234".to_string(),
            scheduled_at,
            MediaKind::Image,
            Some("queued".to_string()),
            vec!["https://cdn.example/a.jpg".to_string()],
        )
    }

    #[test]
    fn test_load_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = QueueStore::new(dir.path());
        assert_eq!(store.load().unwrap(), Vec::new());
    }

    #[test]
    fn test_append_and_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let store = QueueStore::new(dir.path());

        let post = sample_post(2_000_000_000);
        store.append(post.clone()).unwrap();

        let loaded = store.load().unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0], post);
    }

    #[test]
    fn test_save_leaves_no_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = QueueStore::new(dir.path());
        store.save(&[sample_post(0)]).unwrap();

        let entries: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
            .collect();
        assert_eq!(entries, vec![QUEUE_FILE.to_string()]);
    }

    #[test]
    fn test_save_creates_store_directory() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("deep/store");
        let store = QueueStore::new(&nested);
        store.save(&[sample_post(0)]).unwrap();
        assert!(nested.join(QUEUE_FILE).exists());
    }

    #[test]
    fn test_remove_returns_entry() {
        let dir = tempfile::tempdir().unwrap();
        let store = QueueStore::new(dir.path());
        let post = sample_post(2_000_000_000);
        store.append(post.clone()).unwrap();
        store.append(sample_post(2_100_000_000)).unwrap();

        let removed = store.remove(&post.id).unwrap();
        assert_eq!(removed.id, post.id);
        assert_eq!(store.load().unwrap().len(), 1);
    }

    #[test]
    fn test_remove_unknown_id() {
        let dir = tempfile::tempdir().unwrap();
        let store = QueueStore::new(dir.path());
        assert!(store.remove("no-such-id").is_err());
    }

    #[test]
    fn test_clear() {
        let dir = tempfile::tempdir().unwrap();
        let store = QueueStore::new(dir.path());
        store.append(sample_post(1)).unwrap();
        store.append(sample_post(2)).unwrap();

        assert_eq!(store.clear().unwrap(), 2);
        assert!(store.load().unwrap().is_empty());
    }

    #[test]
    fn test_reschedule_resets_attempts() {
        let dir = tempfile::tempdir().unwrap();
        let store = QueueStore::new(dir.path());
        let mut post = sample_post(1_000);
        post.attempts = 2;
        let id = post.id.clone();
        store.append(post).unwrap();

        let updated = store.reschedule(&id, 2_000_000_000).unwrap();
        assert_eq!(updated.scheduled_at, 2_000_000_000);
        assert_eq!(updated.attempts, 0);
        assert_eq!(store.find(&id).unwrap().scheduled_at, 2_000_000_000);
    }

    #[test]
    fn test_is_due() {
        let post = sample_post(100);
        assert!(post.is_due(100));
        assert!(post.is_due(101));
        assert!(!post.is_due(99));
    }

    #[test]
    fn test_stats() {
        let posts = vec![sample_post(50), sample_post(150), sample_post(250)];
        let summary = stats(&posts, 100);
        assert_eq!(summary.total, 3);
        assert_eq!(summary.due, 1);
        assert_eq!(summary.upcoming, 2);
        assert_eq!(summary.next_scheduled_at, Some(50));
    }

    #[test]
    fn test_stats_empty() {
        let summary = stats(&[], 100);
        assert_eq!(summary.total, 0);
        assert_eq!(summary.next_scheduled_at, None);
    }

    #[test]
    fn test_attempts_default_when_absent() {
        // Queue files written before the attempt counter existed still load
        let dir = tempfile::tempdir().unwrap();
        let store = QueueStore::new(dir.path());
        let json = r#"[{
            "id": "abc",
            "ig_user_id": "178",
            "creation_id": "180",
            "scheduled_at": 1900000000,
            "created_at": 1890000000,
            "kind": "IMAGE",
            "caption": null,
            "media_urls": []
        }]"#;
        std::fs::write(store.path(), json).unwrap();

        let posts = store.load().unwrap();
        assert_eq!(posts[0].attempts, 0);
    }
}
