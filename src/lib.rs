//! # thumbfeed
//!
//! A terminal news reader that lazily loads list thumbnails through a
//! byte-bounded image cache.
//!
//! ## Overview
//!
//! Rows of a scrolling list are reused as the list moves. Thumbnails are
//! fetched only for the rows on screen and only once scrolling stops;
//! starting to scroll cancels what is in flight. A fetch that finishes after
//! its row was reused still fills the cache but never lands on that row.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                          App                                │
//! │  Recycled rows, key handling, settle timer, event loop      │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!          ┌───────────────────┼───────────────────┐
//!          ▼                   ▼                   ▼
//! ┌─────────────────┐ ┌─────────────────┐ ┌─────────────────┐
//! │     Config      │ │       API       │ │     Images      │
//! │                 │ │                 │ │                 │
//! │ • Load/Save     │ │ • Feed client   │ │ • Viewport      │
//! │ • Theme         │ │ • JSON items    │ │ • Task registry │
//! │ • Cache budget  │ │                 │ │ • LRU cache     │
//! └─────────────────┘ └─────────────────┘ └─────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`api`] — News feed client
//! - [`app`] — TUI application state and event loop
//! - [`config`] — Configuration management
//! - [`images`] — Thumbnail cache, fetch registry and viewport loader
//! - [`models`] — Data models
//! - [`theme`] — Theme support via ratatui-themes
//!
//! ## Example
//!
//! ```no_run
//! use std::num::NonZeroUsize;
//! use std::sync::Arc;
//! use thumbfeed::images::{HttpFetcher, ImageCache, ViewportLoader};
//!
//! # async fn demo() {
//! let cache = ImageCache::new(NonZeroUsize::new(64 << 20).unwrap());
//! let mut loader = ViewportLoader::new(
//!     Arc::new(HttpFetcher::default()),
//!     cache,
//!     tokio::runtime::Handle::current(),
//! );
//! loader.set_keys(vec!["https://example.com/a.png".into()]);
//! # }
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::items_after_statements)]
#![allow(clippy::option_if_let_else)]
#![allow(clippy::if_not_else)]
#![allow(clippy::single_match_else)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::trivially_copy_pass_by_ref)]
#![allow(clippy::match_same_arms)]
#![allow(clippy::use_self)]
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::manual_let_else)]
#![allow(clippy::return_self_not_must_use)]

pub mod api;
pub mod app;
pub mod config;
pub mod images;
pub mod models;
pub mod paths;
pub mod theme;

// Re-export main types for convenience
pub use app::AppState;
pub use config::{Config, ConfigError};
pub use images::{ImageCache, Thumbnail, ViewportLoader};
pub use models::NewsItem;
pub use theme::{Palette, Theme};

// Re-export theme types from ratatui-themes crate
pub use ratatui_themes::{ThemeName, ThemePalette};

/// ASCII logo for the application
pub const LOGO: &str = r"
  _   _                 _      __             _
 | |_| |__  _   _ _ __ ___ | |__  / _| ___  ___  __| |
 | __| '_ \| | | | '_ ` _ \| '_ \| |_ / _ \/ _ \/ _` |
 | |_| | | | |_| | | | | | | |_) |  _|  __/  __/ (_| |
  \__|_| |_|\__,_|_| |_| |_|_.__/|_|  \___|\___|\__,_|
";

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
