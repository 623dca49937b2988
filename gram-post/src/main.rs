//! gram-post - Publish or schedule Instagram media

use clap::{Parser, Subcommand};
use libgramcast::account;
use libgramcast::history::{published_post_record, HistoryStore};
use libgramcast::media::{self, MediaKind};
use libgramcast::publisher::Publisher;
use libgramcast::schedule;
use libgramcast::{Config, GraphClient, QueueStore, Result, ScheduledPost};

#[derive(Parser, Debug)]
#[command(name = "gram-post")]
#[command(version)]
#[command(about = "Publish or schedule Instagram media")]
#[command(long_about = "\
gram-post - Publish or schedule Instagram media

DESCRIPTION:
    gram-post publishes an image, video (Reel), carousel, or story to the
    Instagram business account linked to your access token. With --at, the
    media container is created immediately but queued for later publication
    by gram-send.

USAGE EXAMPLES:
    # Publish an image now
    gram-post image --image-url https://cdn.example/a.jpg --caption \"hello\"

    # Publish a Reel
    gram-post video --video-url https://cdn.example/clip.mp4 --caption \"clip\"

    # Publish a carousel of 2-10 items (images and videos may be mixed)
    gram-post carousel --media-urls https://cdn.example/a.jpg https://cdn.example/b.mp4 --caption \"both\"

    # Publish a story (image or video, no caption)
    gram-post story --media-url https://cdn.example/a.jpg

    # Schedule instead of publishing (time formats: unix seconds, \"2h\",
    # \"2026-09-01 18:30\", \"tomorrow 3pm\")
    gram-post image --image-url https://cdn.example/a.jpg --caption \"later\" --at \"tomorrow 9am\"

CONFIGURATION:
    Configuration file: ~/.config/gramcast/config.toml
    Override with GRAMCAST_CONFIG; token via GRAMCAST_TOKEN or the
    configured token file.

EXIT CODES:
    0 - Success
    1 - Operation failed
    2 - Authentication error
    3 - Invalid input (bad URL count, bad time format, etc.)
")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format: text or json
    #[arg(short, long, global = true, default_value = "text")]
    format: String,

    /// Enable verbose logging to stderr
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Publish a single image
    Image {
        /// Public URL of the image
        #[arg(long)]
        image_url: String,

        /// Post caption
        #[arg(long)]
        caption: String,

        /// Publish at a future time instead of now
        #[arg(long)]
        at: Option<String>,
    },

    /// Publish a video as a Reel
    Video {
        /// Public URL of the video
        #[arg(long)]
        video_url: String,

        /// Post caption
        #[arg(long)]
        caption: String,

        /// Publish at a future time instead of now
        #[arg(long)]
        at: Option<String>,
    },

    /// Publish a carousel of 2-10 images and/or videos
    Carousel {
        /// Public URLs of the items, in order
        #[arg(long, num_args = 1.., required = true)]
        media_urls: Vec<String>,

        /// Carousel caption
        #[arg(long)]
        caption: String,

        /// Publish at a future time instead of now
        #[arg(long)]
        at: Option<String>,
    },

    /// Publish a story (image or video)
    Story {
        /// Public URL of the media
        #[arg(long)]
        media_url: String,

        /// Publish at a future time instead of now
        #[arg(long)]
        at: Option<String>,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if cli.verbose {
        libgramcast::logging::LoggingConfig::new(
            libgramcast::logging::LogFormat::Text,
            "debug".to_string(),
            true,
        )
        .init();
    } else {
        libgramcast::logging::init_default();
    }

    if let Err(e) = run(cli).await {
        eprintln!("Error: {}", e);
        std::process::exit(e.exit_code());
    }
}

async fn run(cli: Cli) -> Result<()> {
    // Validate everything local before touching config or network
    validate(&cli.command)?;
    let scheduled_at = parse_at(&cli.command)?;

    let config = Config::load()?;
    let client = GraphClient::from_config(&config)?;
    let account = account::resolve_business_account(&client).await?;
    tracing::info!(
        ig_user_id = account.ig_user_id.as_str(),
        page = account.page_name.as_str(),
        "resolved business account"
    );

    let publisher = Publisher::new(&client);
    let ig = &account.ig_user_id;

    match scheduled_at {
        Some(at) => {
            let creation_id = stage(&publisher, ig, &cli.command).await?;
            let post = ScheduledPost::new(
                ig.clone(),
                creation_id,
                at,
                kind_of(&cli.command),
                caption_of(&cli.command).map(|s| s.to_string()),
                urls_of(&cli.command),
            );
            QueueStore::open(&config).append(post.clone())?;
            report_scheduled(&cli.format, &post);
        }
        None => {
            let (outcome, kind, urls, caption) = match &cli.command {
                Commands::Image {
                    image_url, caption, ..
                } => (
                    publisher.publish_image(ig, image_url, caption).await?,
                    MediaKind::Image,
                    vec![image_url.clone()],
                    Some(caption.as_str()),
                ),
                Commands::Video {
                    video_url, caption, ..
                } => (
                    publisher.publish_reel(ig, video_url, caption).await?,
                    MediaKind::Reels,
                    vec![video_url.clone()],
                    Some(caption.as_str()),
                ),
                Commands::Carousel {
                    media_urls,
                    caption,
                    ..
                } => (
                    publisher.publish_carousel(ig, media_urls, caption).await?,
                    MediaKind::Carousel,
                    media_urls.clone(),
                    Some(caption.as_str()),
                ),
                Commands::Story { media_url, .. } => (
                    publisher.publish_story(ig, media_url).await?,
                    MediaKind::Stories,
                    vec![media_url.clone()],
                    None,
                ),
            };

            // Stories are ephemeral and stay out of the local post log
            if kind != MediaKind::Stories {
                let record =
                    published_post_record(&outcome, kind, caption, &urls, chrono::Utc::now());
                if let Err(e) = HistoryStore::open(&config).append_post_record(record) {
                    tracing::warn!("could not record published post locally: {}", e);
                }
            }

            report_published(&cli.format, &outcome.media_id, &outcome.creation_id);
        }
    }

    Ok(())
}

/// Local input validation, before any config or network access
fn validate(command: &Commands) -> Result<()> {
    if let Commands::Carousel { media_urls, .. } = command {
        media::validate_carousel_size(media_urls.len())?;
    }
    Ok(())
}

/// Resolve --at to a future Unix timestamp, if present
fn parse_at(command: &Commands) -> Result<Option<i64>> {
    let at = match command {
        Commands::Image { at, .. }
        | Commands::Video { at, .. }
        | Commands::Carousel { at, .. }
        | Commands::Story { at, .. } => at,
    };

    match at {
        Some(input) => {
            let scheduled = schedule::parse_schedule(input)?;
            schedule::ensure_future(scheduled, chrono::Utc::now())?;
            Ok(Some(scheduled.timestamp()))
        }
        None => Ok(None),
    }
}

/// Create the container(s) for a deferred publication
async fn stage(publisher: &Publisher<'_>, ig: &str, command: &Commands) -> Result<String> {
    match command {
        Commands::Image {
            image_url, caption, ..
        } => {
            publisher
                .create_container(ig, &media::image_post_params(image_url, caption))
                .await
        }
        Commands::Video {
            video_url, caption, ..
        } => {
            publisher
                .create_container(ig, &media::reel_post_params(video_url, caption))
                .await
        }
        Commands::Carousel {
            media_urls,
            caption,
            ..
        } => {
            let (creation_id, _) = publisher.stage_carousel(ig, media_urls, caption).await?;
            Ok(creation_id)
        }
        Commands::Story { media_url, .. } => {
            publisher
                .create_container(ig, &media::story_params(media_url))
                .await
        }
    }
}

fn kind_of(command: &Commands) -> MediaKind {
    match command {
        Commands::Image { .. } => MediaKind::Image,
        Commands::Video { .. } => MediaKind::Reels,
        Commands::Carousel { .. } => MediaKind::Carousel,
        Commands::Story { .. } => MediaKind::Stories,
    }
}

fn caption_of(command: &Commands) -> Option<&str> {
    match command {
        Commands::Image { caption, .. }
        | Commands::Video { caption, .. }
        | Commands::Carousel { caption, .. } => Some(caption),
        Commands::Story { .. } => None,
    }
}

fn urls_of(command: &Commands) -> Vec<String> {
    match command {
        Commands::Image { image_url, .. } => vec![image_url.clone()],
        Commands::Video { video_url, .. } => vec![video_url.clone()],
        Commands::Carousel { media_urls, .. } => media_urls.clone(),
        Commands::Story { media_url, .. } => vec![media_url.clone()],
    }
}

fn report_published(format: &str, media_id: &str, creation_id: &str) {
    if format == "json" {
        let out = serde_json::json!({
            "success": true,
            "id": media_id,
            "creation_id": creation_id,
        });
        println!("{}", serde_json::to_string_pretty(&out).unwrap());
    } else {
        println!("Published: {}", media_id);
    }
}

fn report_scheduled(format: &str, post: &ScheduledPost) {
    if format == "json" {
        let out = serde_json::json!({
            "success": true,
            "scheduled": post,
        });
        println!("{}", serde_json::to_string_pretty(&out).unwrap());
    } else {
        let when = chrono::DateTime::from_timestamp(post.scheduled_at, 0)
            .map(|dt| dt.to_rfc3339())
            .unwrap_or_else(|| post.scheduled_at.to_string());
        println!("Scheduled {} for {} (queue id {})", post.kind, when, post.id);
    }
}
