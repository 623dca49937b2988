//! Publishing orchestration
//!
//! Every publication follows the same two-step shape: create a media
//! container, then publish it by creation id. Videos and stories need
//! processing time on Instagram's side before a publish succeeds, so those
//! paths retry with fixed pauses. All timing knobs live in [`Tuning`] so
//! tests can run the same paths without sleeping.

use std::time::Duration;
use tokio::time::sleep;
use tracing::{error, info, warn};

use crate::api::{expect_id, GraphApi};
use crate::config::SchedulingConfig;
use crate::error::{ApiError, GramcastError, Result};
use crate::media;
use crate::queue::QueueStore;

/// Bounded retries with a fixed pause between attempts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts,
            delay,
        }
    }

    /// One attempt, no pause
    pub fn single() -> Self {
        Self::new(1, Duration::ZERO)
    }
}

/// Timing knobs for the publish paths
#[derive(Debug, Clone)]
pub struct Tuning {
    /// Reels publish: the video transcodes for a while after upload
    pub reel_publish: RetryPolicy,
    /// Story publish retries
    pub story_publish: RetryPolicy,
    /// Parent carousel container creation when any item is a video
    pub carousel_parent: RetryPolicy,
    /// Carousel publish when any item is a video
    pub carousel_publish: RetryPolicy,
    /// Per-item video container creation inside a carousel
    pub video_container: RetryPolicy,
    /// Pause between carousel item container creations
    pub item_gap: Duration,
    /// Wait after creating a video item container
    pub video_processing_wait: Duration,
    /// Wait between story container creation and publish
    pub story_processing_wait: Duration,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            reel_publish: RetryPolicy::new(5, Duration::from_secs(10)),
            story_publish: RetryPolicy::new(10, Duration::from_secs(5)),
            carousel_parent: RetryPolicy::new(10, Duration::from_secs(10)),
            carousel_publish: RetryPolicy::new(10, Duration::from_secs(10)),
            video_container: RetryPolicy::new(3, Duration::from_secs(5)),
            item_gap: Duration::from_secs(1),
            video_processing_wait: Duration::from_secs(5),
            story_processing_wait: Duration::from_secs(10),
        }
    }
}

impl Tuning {
    /// Same attempt counts, zero pauses. For tests.
    pub fn immediate() -> Self {
        let zero = Duration::ZERO;
        Self {
            reel_publish: RetryPolicy::new(5, zero),
            story_publish: RetryPolicy::new(10, zero),
            carousel_parent: RetryPolicy::new(10, zero),
            carousel_publish: RetryPolicy::new(10, zero),
            video_container: RetryPolicy::new(3, zero),
            item_gap: zero,
            video_processing_wait: zero,
            story_processing_wait: zero,
        }
    }
}

/// A completed publication
#[derive(Debug, Clone, serde::Serialize)]
pub struct PublishOutcome {
    /// Container that was published
    pub creation_id: String,
    /// Id of the published media object
    pub media_id: String,
}

/// What one daemon pass over the queue did
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize)]
pub struct ProcessSummary {
    pub published: usize,
    pub retried: usize,
    pub dropped: usize,
}

/// Authentication failures never heal by waiting
fn is_permanent(error: &GramcastError) -> bool {
    matches!(error, GramcastError::Api(ApiError::Authentication(_)))
}

pub struct Publisher<'a> {
    api: &'a dyn GraphApi,
    tuning: Tuning,
}

impl<'a> Publisher<'a> {
    pub fn new(api: &'a dyn GraphApi) -> Self {
        Self {
            api,
            tuning: Tuning::default(),
        }
    }

    pub fn with_tuning(api: &'a dyn GraphApi, tuning: Tuning) -> Self {
        Self { api, tuning }
    }

    /// Create a media container, returning its creation id
    pub async fn create_container(
        &self,
        ig_user_id: &str,
        params: &[(&str, String)],
    ) -> Result<String> {
        let endpoint = format!("{}/media", ig_user_id);
        let response = self.api.post_form(&endpoint, params).await?;
        expect_id(&response)
    }

    /// Publish a container once
    pub async fn publish(&self, ig_user_id: &str, creation_id: &str) -> Result<String> {
        let endpoint = format!("{}/media_publish", ig_user_id);
        let response = self
            .api
            .post_form(&endpoint, &[("creation_id", creation_id.to_string())])
            .await?;
        expect_id(&response)
    }

    /// Publish a container under a retry policy
    async fn publish_with_retry(
        &self,
        ig_user_id: &str,
        creation_id: &str,
        policy: RetryPolicy,
    ) -> Result<String> {
        retry(policy, "publish", || self.publish(ig_user_id, creation_id)).await
    }

    /// Single-image post: container, then one publish attempt
    pub async fn publish_image(
        &self,
        ig_user_id: &str,
        image_url: &str,
        caption: &str,
    ) -> Result<PublishOutcome> {
        let creation_id = self
            .create_container(ig_user_id, &media::image_post_params(image_url, caption))
            .await?;
        info!(creation_id, "image container created");
        let media_id = self.publish(ig_user_id, &creation_id).await?;
        Ok(PublishOutcome {
            creation_id,
            media_id,
        })
    }

    /// Reels post: container, then publish with retries while it transcodes
    pub async fn publish_reel(
        &self,
        ig_user_id: &str,
        video_url: &str,
        caption: &str,
    ) -> Result<PublishOutcome> {
        let creation_id = self
            .create_container(ig_user_id, &media::reel_post_params(video_url, caption))
            .await?;
        info!(creation_id, "reel container created");
        let media_id = self
            .publish_with_retry(ig_user_id, &creation_id, self.tuning.reel_publish)
            .await?;
        Ok(PublishOutcome {
            creation_id,
            media_id,
        })
    }

    /// Story: container, processing wait, publish with retries
    pub async fn publish_story(
        &self,
        ig_user_id: &str,
        media_url: &str,
    ) -> Result<PublishOutcome> {
        let creation_id = self.stage_story(ig_user_id, media_url).await?;
        let media_id = self
            .publish_with_retry(ig_user_id, &creation_id, self.tuning.story_publish)
            .await?;
        Ok(PublishOutcome {
            creation_id,
            media_id,
        })
    }

    /// Create a story container and give the media time to process
    pub async fn stage_story(&self, ig_user_id: &str, media_url: &str) -> Result<String> {
        let creation_id = self
            .create_container(ig_user_id, &media::story_params(media_url))
            .await?;
        info!(creation_id, "story container created");
        sleep(self.tuning.story_processing_wait).await;
        Ok(creation_id)
    }

    /// Build the item containers and parent container of a carousel.
    ///
    /// Returns the parent creation id and whether any item was a video.
    pub async fn stage_carousel(
        &self,
        ig_user_id: &str,
        media_urls: &[String],
        caption: &str,
    ) -> Result<(String, bool)> {
        media::validate_carousel_size(media_urls.len())?;

        let mut children = Vec::with_capacity(media_urls.len());
        let mut has_video = false;

        for url in media_urls {
            let params = media::carousel_item_params(url);
            let item_id = if media::is_video_url(url) {
                has_video = true;
                let id = retry(self.tuning.video_container, "video item container", || {
                    self.create_container(ig_user_id, &params)
                })
                .await?;
                sleep(self.tuning.video_processing_wait).await;
                id
            } else {
                self.create_container(ig_user_id, &params).await?
            };
            info!(item_id, url = url.as_str(), "carousel item container created");
            children.push(item_id);
            sleep(self.tuning.item_gap).await;
        }

        let parent_policy = if has_video {
            self.tuning.carousel_parent
        } else {
            RetryPolicy::single()
        };
        let parent_params = media::carousel_parent_params(&children, caption);
        let creation_id = retry(parent_policy, "carousel container", || {
            self.create_container(ig_user_id, &parent_params)
        })
        .await?;
        info!(creation_id, "carousel container created");

        Ok((creation_id, has_video))
    }

    /// Full carousel publication
    pub async fn publish_carousel(
        &self,
        ig_user_id: &str,
        media_urls: &[String],
        caption: &str,
    ) -> Result<PublishOutcome> {
        let (creation_id, has_video) = self.stage_carousel(ig_user_id, media_urls, caption).await?;

        let policy = if has_video {
            self.tuning.carousel_publish
        } else {
            RetryPolicy::single()
        };
        let media_id = self
            .publish_with_retry(ig_user_id, &creation_id, policy)
            .await?;
        Ok(PublishOutcome {
            creation_id,
            media_id,
        })
    }

    /// One pass over the queue: publish due entries, keep the rest.
    ///
    /// A failed entry stays queued with its attempt counter bumped until
    /// `max_attempts` is reached, then it is dropped with an error log. The
    /// queue file is only rewritten when something changed.
    pub async fn process_due(
        &self,
        store: &QueueStore,
        scheduling: &SchedulingConfig,
        now: i64,
    ) -> Result<ProcessSummary> {
        let posts = store.load()?;
        let mut summary = ProcessSummary::default();
        let mut retained = Vec::with_capacity(posts.len());
        let mut changed = false;

        for mut post in posts {
            if !post.is_due(now) {
                retained.push(post);
                continue;
            }

            info!(
                id = post.id.as_str(),
                creation_id = post.creation_id.as_str(),
                scheduled_at = post.scheduled_at,
                "publishing due post"
            );

            match self.publish(&post.ig_user_id, &post.creation_id).await {
                Ok(media_id) => {
                    info!(id = post.id.as_str(), media_id, "scheduled post published");
                    summary.published += 1;
                    changed = true;
                }
                Err(e) => {
                    post.attempts += 1;
                    changed = true;
                    if is_permanent(&e) || post.attempts >= scheduling.max_attempts {
                        error!(
                            id = post.id.as_str(),
                            attempts = post.attempts,
                            "giving up on scheduled post: {}",
                            e
                        );
                        summary.dropped += 1;
                    } else {
                        warn!(
                            id = post.id.as_str(),
                            attempts = post.attempts,
                            "publish failed, will retry next poll: {}",
                            e
                        );
                        summary.retried += 1;
                        retained.push(post);
                    }
                    sleep(Duration::from_secs(scheduling.retry_delay)).await;
                }
            }
        }

        if changed {
            store.save(&retained)?;
        }
        Ok(summary)
    }
}

/// Run an operation under a retry policy.
///
/// Permanent errors bail out immediately; anything else is retried after the
/// policy's pause until attempts run out.
async fn retry<F, Fut>(policy: RetryPolicy, what: &str, op: F) -> Result<String>
where
    F: Fn() -> Fut,
    Fut: std::future::Future<Output = Result<String>>,
{
    let mut attempt = 1;
    loop {
        match op().await {
            Ok(id) => {
                if attempt > 1 {
                    info!("{} succeeded on attempt {}", what, attempt);
                }
                return Ok(id);
            }
            Err(e) => {
                if is_permanent(&e) || attempt >= policy.max_attempts {
                    if attempt > 1 {
                        warn!("{} failed after {} attempts: {}", what, attempt, e);
                    }
                    return Err(e);
                }
                warn!(
                    "{} failed (attempt {}/{}): {}. Retrying in {:?}",
                    what, attempt, policy.max_attempts, e, policy.delay
                );
                sleep(policy.delay).await;
                attempt += 1;
            }
        }
    }
}
