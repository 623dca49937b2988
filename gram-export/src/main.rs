//! gram-export - Snapshot account data into local JSON files

use clap::{Parser, Subcommand};
use libgramcast::history::{HistoryStore, DETAILS_FILE, POSTS_FILE, STORIES_FILE};
use libgramcast::{account, feed, Config, GraphClient, Result};
use serde_json::json;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "gram-export")]
#[command(version)]
#[command(about = "Snapshot account data into local JSON files")]
#[command(long_about = "\
gram-export - Snapshot account data into local JSON files

DESCRIPTION:
    gram-export pulls account data from the Graph API and rewrites one
    snapshot file per command in the store directory:

        instagram_details.json  account profile and counters
        instagram_posts.json    every post with details and insights
        instagram_stories.json  active stories with details and insights

COMMANDS:
    details   Export the account overview
    posts     Export all posts (paginated) with per-post details
    stories   Export active stories with insights

USAGE EXAMPLES:
    gram-export details
    gram-export posts
    gram-export stories

CONFIGURATION:
    Configuration file: ~/.config/gramcast/config.toml
    Snapshots are written to <store.dir>.

EXIT CODES:
    0 - Success
    1 - Operation failed
    2 - Authentication error
")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging to stderr
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Export the account overview
    Details,

    /// Export all posts with per-post details
    Posts,

    /// Export active stories with insights
    Stories,
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
    let config = Config::load()?;
    let store = HistoryStore::open(&config);
    let client = GraphClient::from_config(&config)?;

    match cli.command {
        Commands::Details => {
            let overview = account::fetch_account_overview(&client).await?;
            store.write_snapshot(DETAILS_FILE, &overview)?;
            info!(file = DETAILS_FILE, "account details exported");
            println!("Saved {}", store.snapshot_path(DETAILS_FILE).display());
        }
        Commands::Posts => {
            let ig = account::resolve_business_account(&client).await?.ig_user_id;
            let details = feed::fetch_all_post_details(&client, &ig).await?;
            let count = details.len();
            store.write_snapshot(POSTS_FILE, &json!(details))?;
            info!(file = POSTS_FILE, count, "posts exported");
            println!(
                "Saved {} post(s) to {}",
                count,
                store.snapshot_path(POSTS_FILE).display()
            );
        }
        Commands::Stories => {
            let ig = account::resolve_business_account(&client).await?.ig_user_id;
            let stories = feed::fetch_story_feed(&client, &ig).await?;
            let count = stories.len();
            let snapshot = json!({
                "metadata": {
                    "total_stories": count,
                    "extracted_at": chrono::Utc::now().to_rfc3339(),
                    "source": "Instagram Stories API",
                },
                "stories": stories,
            });
            store.write_snapshot(STORIES_FILE, &snapshot)?;
            info!(file = STORIES_FILE, count, "stories exported");
            println!(
                "Saved {} stor{} to {}",
                count,
                if count == 1 { "y" } else { "ies" },
                store.snapshot_path(STORIES_FILE).display()
            );
        }
    }

    Ok(())
}
