//! Gramcast - command-line tools for the Instagram Graph API
//!
//! This library provides the shared pieces behind the gram-* binaries:
//! the Graph API client, the scheduled-post queue, publishing orchestration,
//! and the local JSON statistics stores.

pub mod account;
pub mod api;
pub mod client;
pub mod config;
pub mod error;
pub mod feed;
pub mod history;
pub mod insights;
pub mod logging;
pub mod media;
pub mod mock;
pub mod publisher;
pub mod queue;
pub mod schedule;

// Re-export commonly used types
pub use account::BusinessAccount;
pub use api::GraphApi;
pub use client::GraphClient;
pub use config::Config;
pub use error::{GramcastError, Result};
pub use media::MediaKind;
pub use publisher::RetryPolicy;
pub use queue::{QueueStore, ScheduledPost};
