//! Application state

use std::time::{Duration, Instant};

use crate::api::FeedError;
use crate::config::Config;
use crate::images::{
    DisplaySurface, Fetcher, HttpFetcher, LoadResult, Preview, ScrollState, TargetId,
    ViewportLoader,
};
use crate::models::NewsItem;
use crate::theme::Theme;

use super::surface::RowSurface;

/// Application state
pub struct AppState<F: Fetcher = HttpFetcher> {
    /// Configuration
    pub config: Config,
    /// Current theme
    pub theme: Theme,
    /// Feed shown this session; may differ from the configured one
    pub feed_url: String,
    /// Whether to quit
    pub should_quit: bool,

    /// Items in the list
    pub items: Vec<NewsItem>,
    /// Selected item index
    pub selected: usize,
    /// First visible item index
    pub offset: usize,

    /// On-screen rows
    pub rows: RowSurface,
    /// Thumbnail loader
    pub loader: ViewportLoader<F>,

    /// Status message (bottom bar)
    pub status: String,
    /// Is the feed loading?
    pub loading: bool,

    last_scroll: Option<Instant>,
    settle_delay: Duration,
}

impl<F: Fetcher> AppState<F> {
    /// Create a new app state
    pub fn new(config: Config, loader: ViewportLoader<F>, rows: RowSurface) -> Self {
        let settle_delay = Duration::from_millis(config.settle_delay_ms);
        Self {
            theme: config.theme,
            feed_url: config.feed_url.clone(),
            config,
            should_quit: false,
            items: Vec::new(),
            selected: 0,
            offset: 0,
            rows,
            loader,
            status: String::new(),
            loading: false,
            last_scroll: None,
            settle_delay,
        }
    }

    /// Configuration to persist on exit.
    ///
    /// Only the theme picked in the UI is carried over; a feed URL given on
    /// the command line stays a one-off.
    pub fn config_to_save(&self) -> Config {
        let mut config = self.config.clone();
        config.theme = self.theme;
        config
    }

    /// Set status message
    pub fn set_status(&mut self, msg: impl Into<String>) {
        self.status = msg.into();
    }

    /// Number of on-screen rows
    pub fn page_rows(&self) -> usize {
        self.rows.len()
    }

    /// Replace the list contents after a feed load.
    pub fn set_items(&mut self, items: Vec<NewsItem>) {
        let keys = items.iter().map(|item| item.thumbnail_url.clone()).collect();
        self.items = items;
        self.loader.set_keys(keys);
        self.selected = 0;
        self.offset = 0;
        // Force every row to rebind against the new list.
        for slot in 0..self.rows.len() {
            self.rows.clear(slot);
        }
        self.refresh_viewport();
    }

    /// Apply the outcome of a feed load.
    pub fn handle_feed(&mut self, result: Result<Vec<NewsItem>, FeedError>) {
        self.loading = false;
        match result {
            Ok(items) => {
                let count = items.len();
                self.set_items(items);
                self.set_status(format!("Loaded {count} items"));
            }
            Err(e) => {
                tracing::warn!("Feed load failed: {e}");
                self.set_status(format!("Feed failed: {e}"));
            }
        }
    }

    /// Adapt to a new number of on-screen rows.
    ///
    /// Rows that appear while the list is settled load right away; no
    /// scroll event will come to trigger them.
    pub fn resize(&mut self, rows: usize) {
        if rows == self.rows.len() {
            return;
        }
        let grew = rows > self.rows.len();
        for slot in rows..self.rows.len() {
            self.loader.unbind_target(TargetId(slot));
        }
        self.rows.resize(rows);
        self.offset = self.clamp_offset(self.offset);
        self.refresh_viewport();

        if grew && !self.loader.scroll_state().is_moving() {
            let range = self.loader.visible_range();
            self.loader.load_visible(range.start, range.end, &mut self.rows);
        }
    }

    /// Move selection down one item
    pub fn select_next(&mut self) {
        self.select(self.selected.saturating_add(1), ScrollState::Dragging);
    }

    /// Move selection up one item
    pub fn select_prev(&mut self) {
        self.select(self.selected.saturating_sub(1), ScrollState::Dragging);
    }

    /// Move selection down one page
    pub fn page_down(&mut self) {
        let page = self.page_rows().max(1);
        self.select(self.selected.saturating_add(page), ScrollState::Flinging);
    }

    /// Move selection up one page
    pub fn page_up(&mut self) {
        let page = self.page_rows().max(1);
        self.select(self.selected.saturating_sub(page), ScrollState::Flinging);
    }

    /// Jump to the first item
    pub fn select_first(&mut self) {
        self.select(0, ScrollState::Flinging);
    }

    /// Jump to the last item
    pub fn select_last(&mut self) {
        self.select(self.items.len().saturating_sub(1), ScrollState::Flinging);
    }

    /// Report the list as settled once no scroll input arrived for the
    /// configured delay.
    pub fn tick(&mut self, now: Instant) {
        let Some(last) = self.last_scroll else {
            return;
        };
        if now.saturating_duration_since(last) >= self.settle_delay {
            self.last_scroll = None;
            self.loader
                .on_scroll_state_changed(ScrollState::Settled, &mut self.rows);
        }
    }

    /// Apply finished thumbnail loads. Returns how many were shown.
    pub fn poll_thumbnails(&mut self) -> usize {
        self.loader
            .poll_completions(&mut self.rows)
            .iter()
            .filter(|result| matches!(result, LoadResult::Applied { .. }))
            .count()
    }

    fn select(&mut self, index: usize, motion: ScrollState) {
        if self.items.is_empty() {
            return;
        }
        let index = index.min(self.items.len() - 1);
        self.selected = index;

        let page = self.page_rows().max(1);
        let offset = if index < self.offset {
            index
        } else if index >= self.offset + page {
            index + 1 - page
        } else {
            self.offset
        };
        let offset = self.clamp_offset(offset);

        if offset != self.offset {
            self.loader.on_scroll_state_changed(motion, &mut self.rows);
            self.last_scroll = Some(Instant::now());
            self.offset = offset;
            self.refresh_viewport();
        }
    }

    fn clamp_offset(&self, offset: usize) -> usize {
        offset.min(self.items.len().saturating_sub(self.page_rows()))
    }

    /// Rebind recycled rows to the items now under them and report the
    /// visible range.
    fn refresh_viewport(&mut self) {
        for slot in 0..self.rows.len() {
            let index = self.offset + slot;
            match self.items.get(index) {
                Some(item) => {
                    if !self.rows.assign(slot, index, &item.thumbnail_url) {
                        continue;
                    }
                    let target = TargetId(slot);
                    if let Preview::Ready(thumbnail) =
                        self.loader.bind_target(target, &item.thumbnail_url)
                    {
                        self.rows.set_image(target, &thumbnail);
                    }
                }
                None => {
                    self.rows.clear(slot);
                    self.loader.unbind_target(TargetId(slot));
                }
            }
        }

        let end = (self.offset + self.rows.len()).min(self.items.len());
        self.loader
            .on_visible_range_changed(self.offset, end, &mut self.rows);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::images::{FetchError, ImageCache, Thumbnail};
    use std::num::NonZeroUsize;
    use std::sync::Arc;
    use tokio::runtime::Handle;

    /// Never finishes, so tasks stay in flight for the whole test.
    struct StalledFetcher;

    impl Fetcher for StalledFetcher {
        async fn fetch(&self, _key: &str) -> Result<Thumbnail, FetchError> {
            std::future::pending().await
        }
    }

    fn items(n: usize) -> Vec<NewsItem> {
        (0..n)
            .map(|i| {
                NewsItem::new(
                    format!("Item {i}"),
                    "desc",
                    format!("http://img.example.com/{i}.jpg"),
                )
            })
            .collect()
    }

    fn state() -> AppState<StalledFetcher> {
        let cache = ImageCache::new(NonZeroUsize::new(1 << 20).unwrap());
        let loader = ViewportLoader::new(Arc::new(StalledFetcher), cache, Handle::current());
        AppState::new(Config::default(), loader, RowSurface::new(None))
    }

    #[tokio::test]
    async fn test_items_bind_rows_and_bootstrap_load() {
        let mut state = state();
        state.resize(3);
        state.set_items(items(10));

        assert_eq!(state.rows.slot(2).unwrap().index, Some(2));
        assert_eq!(
            state.loader.bindings().key_for(TargetId(2)),
            Some("http://img.example.com/2.jpg")
        );
        assert_eq!(state.loader.registry().len(), 3);
        state.loader.shutdown();
    }

    #[tokio::test]
    async fn test_scrolling_recycles_rows_and_cancels() {
        let mut state = state();
        state.resize(3);
        state.set_items(items(10));

        state.select_next();
        state.select_next();
        assert_eq!(state.offset, 0);
        assert_eq!(state.loader.registry().len(), 3);

        // Moving past the last row scrolls by one.
        state.select_next();
        assert_eq!(state.offset, 1);
        assert_eq!(state.loader.scroll_state(), ScrollState::Dragging);
        assert!(state.loader.registry().is_empty());
        assert_eq!(
            state.loader.bindings().key_for(TargetId(0)),
            Some("http://img.example.com/1.jpg")
        );

        // Quiet for long enough: the list settles and loads rows 1..4.
        state.tick(Instant::now() + Duration::from_secs(5));
        assert_eq!(state.loader.scroll_state(), ScrollState::Settled);
        assert_eq!(state.loader.registry().len(), 3);
        assert!(state.loader.registry().contains("http://img.example.com/3.jpg"));
        state.loader.shutdown();
    }

    #[tokio::test]
    async fn test_page_down_clamps_to_end() {
        let mut state = state();
        state.resize(4);
        state.set_items(items(6));

        state.page_down();
        state.page_down();
        assert_eq!(state.selected, 5);
        assert_eq!(state.offset, 2);
        assert_eq!(state.loader.scroll_state(), ScrollState::Flinging);
        assert_eq!(state.rows.slot(3).unwrap().index, Some(5));
        state.loader.shutdown();
    }

    #[tokio::test]
    async fn test_failed_feed_keeps_items() {
        let mut state = state();
        state.resize(2);
        state.loading = true;
        state.handle_feed(Ok(items(3)));
        assert_eq!(state.status, "Loaded 3 items");

        state.loading = true;
        state.handle_feed(Err(FeedError::Status(reqwest::StatusCode::NOT_FOUND)));
        assert!(!state.loading);
        assert_eq!(state.items.len(), 3);
        assert!(state.status.starts_with("Feed failed"));
        state.loader.shutdown();
    }

    #[tokio::test]
    async fn test_growing_rows_while_settled_loads_new_rows() {
        let mut state = state();
        state.resize(2);
        state.set_items(items(10));
        assert_eq!(state.loader.registry().len(), 2);

        state.resize(6);
        assert_eq!(state.loader.registry().len(), 6);
        assert!(state.loader.registry().contains("http://img.example.com/5.jpg"));
        assert_eq!(
            state.loader.bindings().key_for(TargetId(5)),
            Some("http://img.example.com/5.jpg")
        );
        state.loader.shutdown();
    }

    #[tokio::test]
    async fn test_feed_override_is_not_saved() {
        let mut state = state();
        state.feed_url = "http://other.example.com/feed.json".to_string();
        state.theme = state.theme.next();

        let saved = state.config_to_save();
        assert_eq!(saved.feed_url, crate::config::DEFAULT_FEED_URL);
        assert_eq!(saved.theme, state.theme);
        state.loader.shutdown();
    }

    #[tokio::test]
    async fn test_shrinking_rows_unbinds_targets() {
        let mut state = state();
        state.resize(4);
        state.set_items(items(10));
        state.resize(2);

        assert_eq!(state.loader.bindings().key_for(TargetId(3)), None);
        assert_eq!(state.page_rows(), 2);
        state.loader.shutdown();
    }
}
