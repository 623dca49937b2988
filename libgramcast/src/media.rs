//! Media kinds and container request parameters
//!
//! Builds the form parameters for `POST {ig-user-id}/media` for every kind of
//! container the toolkit creates. Whether a URL points at a video is decided
//! the same way everywhere: by extension or by a `video`/`reel` marker in the
//! URL, since the Graph API offers no probe endpoint.

use serde::{Deserialize, Serialize};

use crate::error::{GramcastError, Result};

/// Carousels must carry between 2 and 10 items
pub const MIN_CAROUSEL_ITEMS: usize = 2;
pub const MAX_CAROUSEL_ITEMS: usize = 10;

const VIDEO_EXTENSIONS: &[&str] = &[".mp4", ".mov", ".avi", ".wmv", ".flv", ".webm", ".mkv"];

/// What a container holds, named after the Graph `media_type` values
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum MediaKind {
    Image,
    Reels,
    Stories,
    Carousel,
}

impl std::fmt::Display for MediaKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MediaKind::Image => write!(f, "IMAGE"),
            MediaKind::Reels => write!(f, "REELS"),
            MediaKind::Stories => write!(f, "STORIES"),
            MediaKind::Carousel => write!(f, "CAROUSEL"),
        }
    }
}

/// Guess whether a URL points at a video
pub fn is_video_url(url: &str) -> bool {
    let lower = url.to_lowercase();
    VIDEO_EXTENSIONS.iter().any(|ext| lower.contains(ext))
        || lower.contains("video")
        || lower.contains("reel")
}

/// Parameters for a single-image post container
pub fn image_post_params(image_url: &str, caption: &str) -> Vec<(&'static str, String)> {
    vec![
        ("image_url", image_url.to_string()),
        ("caption", caption.to_string()),
    ]
}

/// Parameters for a Reels (video post) container
pub fn reel_post_params(video_url: &str, caption: &str) -> Vec<(&'static str, String)> {
    vec![
        ("video_url", video_url.to_string()),
        ("media_type", "REELS".to_string()),
        ("caption", caption.to_string()),
    ]
}

/// Parameters for a story container; the media slot depends on the URL kind
pub fn story_params(media_url: &str) -> Vec<(&'static str, String)> {
    let slot = if is_video_url(media_url) {
        "video_url"
    } else {
        "image_url"
    };
    vec![
        ("media_type", "STORIES".to_string()),
        (slot, media_url.to_string()),
    ]
}

/// Parameters for one carousel item container.
///
/// Image items must NOT carry a `media_type`; video items ride as REELS.
/// Captions belong on the parent container only.
pub fn carousel_item_params(media_url: &str) -> Vec<(&'static str, String)> {
    if is_video_url(media_url) {
        vec![
            ("media_type", "REELS".to_string()),
            ("video_url", media_url.to_string()),
            ("is_carousel_item", "true".to_string()),
        ]
    } else {
        vec![
            ("image_url", media_url.to_string()),
            ("is_carousel_item", "true".to_string()),
        ]
    }
}

/// Parameters for the parent carousel container
pub fn carousel_parent_params(children: &[String], caption: &str) -> Vec<(&'static str, String)> {
    vec![
        ("children", children.join(",")),
        ("media_type", "CAROUSEL".to_string()),
        ("caption", caption.to_string()),
    ]
}

/// Enforce the 2..=10 item rule before any request goes out
pub fn validate_carousel_size(count: usize) -> Result<()> {
    if count < MIN_CAROUSEL_ITEMS {
        return Err(GramcastError::InvalidInput(format!(
            "a carousel needs at least {} items, got {}",
            MIN_CAROUSEL_ITEMS, count
        )));
    }
    if count > MAX_CAROUSEL_ITEMS {
        return Err(GramcastError::InvalidInput(format!(
            "a carousel allows at most {} items, got {}",
            MAX_CAROUSEL_ITEMS, count
        )));
    }
    Ok(())
}
