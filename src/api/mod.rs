//! Network clients for the list's data source

pub mod feed;

pub use feed::{FeedClient, FeedError, parse_feed};
