//! thumbfeed - a terminal news reader with lazily loaded thumbnails
#![allow(clippy::uninlined_format_args)]

use anyhow::{Context, Result};
use humansize::{BINARY, format_size};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use thumbfeed::Config;
use thumbfeed::api::FeedClient;
use thumbfeed::images::{Fetcher, HttpFetcher};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging (RUST_LOG=debug for verbose output)
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    // Parse CLI arguments
    match parse_args()? {
        Command::Run { feed_url } => run_tui(feed_url).await,
        Command::Feed { url } => feed_cli(url).await,
        Command::Fetch { url } => fetch_cli(&url).await,
        Command::Help => {
            print_help();
            Ok(())
        }
        Command::Version => {
            print_version();
            Ok(())
        }
    }
}

/// CLI commands
enum Command {
    Run { feed_url: Option<String> },
    Feed { url: Option<String> },
    Fetch { url: String },
    Help,
    Version,
}

fn parse_args() -> Result<Command> {
    let args: Vec<String> = std::env::args().collect();

    if args.len() == 1 {
        return Ok(Command::Run { feed_url: None });
    }

    match args[1].as_str() {
        "-h" | "--help" | "help" => Ok(Command::Help),
        "-v" | "--version" | "version" => Ok(Command::Version),

        "feed" => Ok(Command::Feed {
            url: args.get(2).cloned(),
        }),

        "fetch" => {
            let url = args
                .get(2)
                .ok_or_else(|| anyhow::anyhow!("Missing image URL"))?
                .clone();
            Ok(Command::Fetch { url })
        }

        url if url.starts_with("http://") || url.starts_with("https://") => Ok(Command::Run {
            feed_url: Some(url.to_string()),
        }),

        other => Err(anyhow::anyhow!(
            "Unknown command: {other}\nRun 'thumbfeed --help' for usage"
        )),
    }
}

fn print_help() {
    let config_path = Config::default_path()
        .map_or_else(|_| "Unknown".to_string(), |p| p.display().to_string());

    println!(
        r#"{}
thumbfeed - a terminal news reader with lazily loaded thumbnails

USAGE:
    thumbfeed                          Launch TUI with the configured feed
    thumbfeed <feed-url>               Launch TUI with another feed
    thumbfeed [COMMAND]

COMMANDS:
    feed [url]                         Print the items of a feed
    fetch <image-url>                  Download one thumbnail and describe it

OPTIONS:
    -h, --help                         Show this help message
    -v, --version                      Show version information

KEYBINDINGS (TUI):
    Navigation
      j/↓  k/↑      Move down/up
      Space/PgDn    Page down
      PgUp          Page up
      g/G           Jump to top/bottom

    Actions
      r             Reload feed
      t/T           Next/previous theme
      q/Esc         Quit

Thumbnails load once scrolling stops; fetches in flight are cancelled when
scrolling starts and their results are kept in the cache.

ENVIRONMENT:
    RUST_LOG=debug                     Log cache and fetch activity to stderr

CONFIG:
    {}
"#,
        thumbfeed::LOGO,
        config_path
    );
}

fn print_version() {
    println!("thumbfeed {}", thumbfeed::VERSION);
}

async fn run_tui(feed_url: Option<String>) -> Result<()> {
    let config = Config::load()?;
    let runtime = tokio::runtime::Handle::current();
    tokio::task::spawn_blocking(move || thumbfeed::app::run(runtime, config, feed_url))
        .await
        .context("TUI thread panicked")?
}

async fn feed_cli(url: Option<String>) -> Result<()> {
    let config = Config::load()?;
    let url = url.unwrap_or(config.feed_url);
    let client = FeedClient::new(
        &url,
        std::time::Duration::from_secs(config.request_timeout_secs),
    );

    let items = client
        .fetch()
        .await
        .with_context(|| format!("Failed to load feed {url}"))?;

    println!("{} ({} items)", client.url(), items.len());
    println!("{}", "─".repeat(60));
    for item in items {
        println!("\n{}", item.title);
        if !item.description.is_empty() {
            println!("{}", item.description);
        }
        if item.has_thumbnail() {
            println!("🖼  {}", item.thumbnail_url);
        }
    }

    Ok(())
}

async fn fetch_cli(url: &str) -> Result<()> {
    let config = Config::load()?;
    let fetcher = HttpFetcher::from_config(&config);

    let thumbnail = fetcher
        .fetch(url)
        .await
        .with_context(|| format!("Failed to fetch {url}"))?;

    println!("✓ {}", url);
    println!(
        "  {}x{}, {} decoded",
        thumbnail.width(),
        thumbnail.height(),
        format_size(thumbnail.size_bytes() as u64, BINARY)
    );

    Ok(())
}
