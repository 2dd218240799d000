//! Data models for thumbfeed

mod news_item;

pub use news_item::NewsItem;
