//! TUI Application module
//!
//! Hosts the thumbnail loader on a scrolling list of feed items. Each
//! on-screen row is a recycled display target; key presses map onto the
//! loader's scroll states and a short quiet period counts as settling.

mod events;
mod state;
mod surface;
mod ui;

pub use events::{AppCommand, handle_key};
pub use state::AppState;
pub use surface::{RowSlot, RowSurface};
pub use ui::{ROW_HEIGHT, rows_for_height};

use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::prelude::*;
use ratatui_image::picker::Picker;
use std::io::stdout;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::runtime::Handle;
use tokio::sync::mpsc;

use crate::api::{FeedClient, FeedError};
use crate::config::Config;
use crate::images::{HttpFetcher, ImageCache, ViewportLoader};
use crate::models::NewsItem;

type FeedResult = Result<Vec<NewsItem>, FeedError>;

/// Run the TUI application.
///
/// Blocks the calling thread; network work runs on `runtime`. `feed_url`
/// overrides the configured feed for this session only.
pub fn run(runtime: Handle, config: Config, feed_url: Option<String>) -> Result<()> {
    let budget = config.cache_budget_bytes()?;
    let cache = ImageCache::new(budget);
    let fetcher = Arc::new(HttpFetcher::from_config(&config));
    let loader = ViewportLoader::new(fetcher, cache, runtime.clone());
    tracing::info!("Thumbnail cache budget: {} bytes", budget);

    // Must happen before raw mode: the query talks to the terminal directly.
    let picker = if config.show_thumbnails {
        Some(init_picker())
    } else {
        None
    };

    let timeout = Duration::from_secs(config.request_timeout_secs);
    let mut state = AppState::new(config, loader, RowSurface::new(picker));
    if let Some(url) = feed_url {
        state.feed_url = url;
    }
    let feed = FeedClient::new(&state.feed_url, timeout);

    // Initialize terminal
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;
    terminal.clear()?;

    let result = run_app(&mut terminal, &mut state, &feed, &runtime);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    state.loader.shutdown();

    state.config_to_save().save()?;

    result
}

fn run_app(
    terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>,
    state: &mut AppState<HttpFetcher>,
    feed: &FeedClient,
    runtime: &Handle,
) -> Result<()> {
    let (feed_tx, mut feed_rx) = mpsc::unbounded_channel::<FeedResult>();
    request_feed(state, feed, runtime, &feed_tx);

    let mut tick: usize = 0;
    loop {
        // Feed results (non-blocking)
        while let Ok(result) = feed_rx.try_recv() {
            state.handle_feed(result);
        }

        let size = terminal.size()?;
        state.resize(rows_for_height(size.height));

        state.poll_thumbnails();
        state.tick(Instant::now());

        terminal.draw(|frame| ui::render(frame, state, tick))?;

        if event::poll(Duration::from_millis(50))?
            && let Event::Key(key) = event::read()?
            && key.kind == KeyEventKind::Press
            && let Some(AppCommand::RefreshFeed) = handle_key(state, key)
        {
            request_feed(state, feed, runtime, &feed_tx);
        }

        tick = tick.wrapping_add(1);

        if state.should_quit {
            break;
        }
    }

    Ok(())
}

fn request_feed(
    state: &mut AppState<HttpFetcher>,
    feed: &FeedClient,
    runtime: &Handle,
    tx: &mpsc::UnboundedSender<FeedResult>,
) {
    state.loading = true;
    state.set_status(format!("Loading {}", feed.url()));

    let feed = feed.clone();
    let tx = tx.clone();
    runtime.spawn(async move {
        let _ = tx.send(feed.fetch().await);
    });
}

/// Query the terminal for a graphics protocol, falling back to halfblocks.
fn init_picker() -> Picker {
    match Picker::from_query_stdio() {
        Ok(picker) => {
            tracing::info!("Image support detected: {:?}", picker.protocol_type());
            picker
        }
        Err(e) => {
            tracing::debug!("No image protocol support: {e}");
            Picker::halfblocks()
        }
    }
}
