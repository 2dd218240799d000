//! Thumbnail loading and caching.
//!
//! This module is the core of thumbfeed: a byte-bounded LRU
//! [`ImageCache`], a [`TaskRegistry`] that keeps at most one fetch in flight
//! per key, a [`BindingGuard`] that stops results from landing on recycled
//! rows, and the [`ViewportLoader`] that drives them from scroll events.
//!
//! ```text
//!   scroll / range events
//!            │
//!            ▼
//!    ┌───────────────┐   hit    ┌────────────┐
//!    │ViewportLoader │─────────▶│ ImageCache │◀──────────┐
//!    └───────────────┘          └────────────┘           │ put
//!            │ miss                                      │
//!            ▼                                           │
//!    ┌───────────────┐  spawn   ┌────────────┐           │
//!    │ TaskRegistry  │─────────▶│  Fetcher   │───────────┘
//!    └───────────────┘          └────────────┘
//!            │ completion (mpsc)
//!            ▼
//!    ┌───────────────┐
//!    │ BindingGuard  │──▶ DisplaySurface::set_image
//!    └───────────────┘
//! ```

mod binding;
mod cache;
mod fetcher;
mod loader;
mod registry;
mod thumbnail;

pub use binding::{BindingGuard, TargetId};
pub use cache::{CacheStats, ImageCache};
pub use fetcher::{
    DEFAULT_MAX_BODY_BYTES, FetchError, Fetcher, HttpFetcher, decode_thumbnail, parse_key,
};
pub use loader::{DisplaySurface, LoadResult, Preview, ScrollState, ViewportLoader};
pub use registry::{Completion, FetchHandle, FetchResult, FetchState, TaskId, TaskRegistry};
pub use thumbnail::Thumbnail;
