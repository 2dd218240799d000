//! Event handling

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use super::state::AppState;
use crate::images::Fetcher;

/// Work the event loop has to start on behalf of a key press
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppCommand {
    /// Download the feed again
    RefreshFeed,
}

/// Handle key events, returning an optional command
pub fn handle_key<F: Fetcher>(state: &mut AppState<F>, key: KeyEvent) -> Option<AppCommand> {
    match (key.modifiers, key.code) {
        (KeyModifiers::CONTROL, KeyCode::Char('c')) | (_, KeyCode::Char('q') | KeyCode::Esc) => {
            state.should_quit = true;
            None
        }

        // Navigation
        (_, KeyCode::Char('j') | KeyCode::Down) => {
            state.select_next();
            None
        }
        (_, KeyCode::Char('k') | KeyCode::Up) => {
            state.select_prev();
            None
        }
        (KeyModifiers::CONTROL, KeyCode::Char('d')) | (_, KeyCode::PageDown | KeyCode::Char(' ')) => {
            state.page_down();
            None
        }
        (KeyModifiers::CONTROL, KeyCode::Char('u')) | (_, KeyCode::PageUp) => {
            state.page_up();
            None
        }
        (_, KeyCode::Char('g') | KeyCode::Home) => {
            state.select_first();
            None
        }
        (_, KeyCode::Char('G') | KeyCode::End) => {
            state.select_last();
            None
        }

        (_, KeyCode::Char('r')) => {
            if state.loading {
                return None;
            }
            state.loading = true;
            state.set_status("Loading feed...");
            Some(AppCommand::RefreshFeed)
        }

        // Theme
        (_, KeyCode::Char('t')) => {
            state.theme = state.theme.next();
            state.set_status(format!("Theme: {}", state.theme));
            None
        }
        (_, KeyCode::Char('T')) => {
            state.theme = state.theme.prev();
            state.set_status(format!("Theme: {}", state.theme));
            None
        }

        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::surface::RowSurface;
    use crate::config::Config;
    use crate::images::{FetchError, ImageCache, ScrollState, Thumbnail, ViewportLoader};
    use crate::models::NewsItem;
    use std::num::NonZeroUsize;
    use std::sync::Arc;
    use tokio::runtime::Handle;

    struct StalledFetcher;

    impl Fetcher for StalledFetcher {
        async fn fetch(&self, _key: &str) -> Result<Thumbnail, FetchError> {
            std::future::pending().await
        }
    }

    fn state_with_items(n: usize) -> AppState<StalledFetcher> {
        let cache = ImageCache::new(NonZeroUsize::new(1 << 20).unwrap());
        let loader = ViewportLoader::new(Arc::new(StalledFetcher), cache, Handle::current());
        let mut state = AppState::new(Config::default(), loader, RowSurface::new(None));
        state.resize(2);
        state.set_items(
            (0..n)
                .map(|i| NewsItem::new(format!("{i}"), "", format!("http://x.test/{i}.png")))
                .collect(),
        );
        state
    }

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[tokio::test]
    async fn test_quit_keys() {
        let mut state = state_with_items(0);
        assert_eq!(handle_key(&mut state, press(KeyCode::Char('q'))), None);
        assert!(state.should_quit);

        let mut state = state_with_items(0);
        handle_key(
            &mut state,
            KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL),
        );
        assert!(state.should_quit);
    }

    #[tokio::test]
    async fn test_navigation_keys() {
        let mut state = state_with_items(5);
        handle_key(&mut state, press(KeyCode::Char('j')));
        handle_key(&mut state, press(KeyCode::Down));
        assert_eq!(state.selected, 2);
        assert_eq!(state.loader.scroll_state(), ScrollState::Dragging);

        handle_key(&mut state, press(KeyCode::Char('G')));
        assert_eq!(state.selected, 4);
        handle_key(&mut state, press(KeyCode::Home));
        assert_eq!(state.selected, 0);
        assert_eq!(state.offset, 0);
        state.loader.shutdown();
    }

    #[tokio::test]
    async fn test_refresh_only_when_idle() {
        let mut state = state_with_items(1);
        assert_eq!(
            handle_key(&mut state, press(KeyCode::Char('r'))),
            Some(AppCommand::RefreshFeed)
        );
        assert!(state.loading);
        assert_eq!(handle_key(&mut state, press(KeyCode::Char('r'))), None);
        state.loader.shutdown();
    }

    #[tokio::test]
    async fn test_theme_cycles() {
        let mut state = state_with_items(0);
        let original = state.theme;
        handle_key(&mut state, press(KeyCode::Char('t')));
        assert_ne!(state.theme, original);
        handle_key(&mut state, press(KeyCode::Char('T')));
        assert_eq!(state.theme, original);
    }
}
