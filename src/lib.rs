//! # pagemeta
//!
//! A URL task queue with a background worker that scrapes page metadata.
//!
//! ## Architecture
//!
//! ```text
//! submit → Validator → Store (pending) → Worker → Fetcher → Extractor → Store (completed | failed)
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! # Queue some URLs
//! pagemeta submit --owner alice https://www.rust-lang.org example.com/docs
//!
//! # Process the queue until Ctrl+C
//! pagemeta worker
//!
//! # Inspect results
//! pagemeta list --owner alice
//! pagemeta stats --owner alice
//! ```

/// Application context, admission and error handling.
///
/// The [`AppContext`](app::AppContext) struct wires together the store,
/// fetcher and worker configuration.
pub mod app;

/// Command-line interface using clap.
pub mod cli;

/// Configuration loaded from `~/.config/pagemeta/config.toml`.
pub mod config;

/// Core domain models.
///
/// - [`Task`](domain::Task): a queued URL and its outcome
/// - [`TaskStatus`](domain::TaskStatus): pending, completed or failed
/// - [`Metadata`](domain::Metadata): title, description and keywords
pub mod domain;

/// HTML metadata extraction with fallback chains.
pub mod extractor;

/// HTTP page fetching.
///
/// - [`Fetcher`](fetcher::Fetcher): async trait for page retrieval
/// - [`HttpFetcher`](fetcher::HttpFetcher): reqwest-based implementation
pub mod fetcher;

/// SQLite persistence layer.
///
/// - [`Store`](store::Store): trait defining queue and result operations
/// - [`SqliteStore`](store::SqliteStore): SQLite implementation
pub mod store;

/// Syntactic URL validation.
pub mod validator;

/// Batch-polling scraper worker.
pub mod worker;
