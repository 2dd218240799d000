//! UI rendering for the TUI

use humansize::{BINARY, format_size};
use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Paragraph},
};
use ratatui_image::StatefulImage;
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use super::state::AppState;
use crate::images::Fetcher;
use crate::theme::Palette;

/// Terminal lines taken by one list row
pub const ROW_HEIGHT: u16 = 4;

/// Columns taken by the thumbnail cell
const THUMB_WIDTH: u16 = 10;

/// Spinner animation frames
const SPINNER: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

/// Number of list rows that fit in a terminal of `height` lines.
pub const fn rows_for_height(height: u16) -> usize {
    // Header (3), list borders (2), status bar (1).
    (height.saturating_sub(6) / ROW_HEIGHT) as usize
}

/// Main render function
pub fn render<F: Fetcher>(frame: &mut Frame, state: &mut AppState<F>, tick: usize) {
    let colors = state.theme.palette();

    let area = frame.area();
    let bg_block = Block::default().style(Style::default().bg(colors.background));
    frame.render_widget(bg_block, area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Min(0),    // List
            Constraint::Length(1), // Status bar
        ])
        .split(area);

    render_header(frame, state, &colors, chunks[0]);
    render_list(frame, state, &colors, chunks[1]);
    render_status_bar(frame, state, &colors, chunks[2], tick);
}

fn render_header<F: Fetcher>(
    frame: &mut Frame,
    state: &AppState<F>,
    colors: &Palette,
    area: Rect,
) {
    let position = if state.items.is_empty() {
        String::from("no items")
    } else {
        format!("{}/{}", state.selected + 1, state.items.len())
    };

    let header = Paragraph::new(Line::from(vec![
        Span::styled(" ", Style::default()),
        Span::styled(
            truncate_str(&state.feed_url, area.width.saturating_sub(20) as usize),
            colors.secondary(),
        ),
        Span::styled("  ", Style::default()),
        Span::styled(position, colors.accented()),
    ]))
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(colors.border())
            .title(" thumbfeed ")
            .title_style(colors.accented().add_modifier(Modifier::BOLD)),
    );

    frame.render_widget(header, area);
}

fn render_list<F: Fetcher>(
    frame: &mut Frame,
    state: &mut AppState<F>,
    colors: &Palette,
    area: Rect,
) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(colors.border());
    let inner = block.inner(area);
    frame.render_widget(block, area);

    if state.items.is_empty() {
        let message = if state.loading {
            "  Loading feed..."
        } else {
            "  Nothing to show. Press r to reload."
        };
        frame.render_widget(
            Paragraph::new(vec![Line::from(""), Line::styled(message, colors.secondary())]),
            inner,
        );
        return;
    }

    let text_width = inner.width.saturating_sub(THUMB_WIDTH + 1) as usize;
    let selected = state.selected;

    for (slot, row) in state.rows.slots_mut().iter_mut().enumerate() {
        let Some(index) = row.index else {
            continue;
        };
        let Some(item) = state.items.get(index) else {
            continue;
        };

        let Ok(offset) = u16::try_from(slot) else {
            break;
        };
        let y = inner.y + offset * ROW_HEIGHT;
        if y + ROW_HEIGHT > inner.y + inner.height {
            break;
        }
        let row_area = Rect {
            x: inner.x,
            y,
            width: inner.width,
            height: ROW_HEIGHT,
        };
        if index == selected {
            frame.render_widget(Block::default().style(colors.selected_row()), row_area);
        }

        let thumb_area = Rect {
            width: THUMB_WIDTH.min(row_area.width),
            height: ROW_HEIGHT - 1,
            ..row_area
        };
        let text_area = Rect {
            x: row_area.x + THUMB_WIDTH + 1,
            width: row_area.width.saturating_sub(THUMB_WIDTH + 1),
            ..row_area
        };

        let (marker, marker_style) = if let Some(protocol) = row.protocol.as_mut() {
            frame.render_stateful_widget(StatefulImage::new(), thumb_area, protocol);
            ("", colors.loaded_marker())
        } else if row.thumbnail.is_some() {
            ("▣ loaded", colors.loaded_marker())
        } else if state.loader.registry().contains(&item.thumbnail_url) {
            ("◌ loading", colors.loading_marker())
        } else if item.has_thumbnail() {
            ("□", colors.secondary())
        } else {
            ("□ no image", colors.secondary())
        };
        if !marker.is_empty() {
            frame.render_widget(
                Paragraph::new(Line::styled(format!(" {marker}"), marker_style)),
                thumb_area,
            );
        }

        let title_style = if index == selected {
            colors.selected_row()
        } else {
            colors.title()
        };
        let lines = vec![
            Line::styled(truncate_str(&item.title, text_width), title_style),
            Line::styled(truncate_str(&item.description, text_width), colors.secondary()),
            Line::styled(
                truncate_str(&item.thumbnail_url, text_width),
                colors.secondary().add_modifier(Modifier::DIM),
            ),
        ];
        frame.render_widget(Paragraph::new(lines), text_area);
    }
}

fn render_status_bar<F: Fetcher>(
    frame: &mut Frame,
    state: &AppState<F>,
    colors: &Palette,
    area: Rect,
    tick: usize,
) {
    let loading_indicator = if state.loading || !state.loader.registry().is_empty() {
        format!("{} ", SPINNER[(tick / 2) % SPINNER.len()])
    } else {
        String::new()
    };

    let cache = state.loader.cache();
    let stats = cache.stats();
    let cache_summary = format!(
        "cache {}/{} ({} items, {} hits, {} misses)  fetching {}  {}",
        format_bytes(cache.size_bytes()),
        format_bytes(cache.budget_bytes()),
        cache.len(),
        stats.hits,
        stats.misses,
        state.loader.registry().len(),
        state.loader.scroll_state().name(),
    );

    let mut content = vec![
        Span::styled(" ", Style::default()),
        Span::styled(loading_indicator, colors.loading_marker()),
    ];
    if state.status.is_empty() {
        content.extend([
            Span::styled("j/k", colors.key_hint()),
            Span::styled(": move  ", colors.secondary()),
            Span::styled("r", colors.key_hint()),
            Span::styled(": reload  ", colors.secondary()),
            Span::styled("t", colors.key_hint()),
            Span::styled(": theme  ", colors.secondary()),
            Span::styled("q", colors.key_hint()),
            Span::styled(": quit  ", colors.secondary()),
        ]);
    } else {
        content.push(Span::styled(format!("{}  ", state.status), colors.body()));
    }
    content.push(Span::styled(cache_summary, colors.secondary()));

    let status = Paragraph::new(Line::from(content)).style(colors.status_bar());
    frame.render_widget(status, area);
}

fn format_bytes(bytes: usize) -> String {
    format_size(u64::try_from(bytes).unwrap_or(u64::MAX), BINARY)
}

/// Truncate a string to fit within `max_width` display columns, adding "…" if needed
fn truncate_str(s: &str, max_width: usize) -> String {
    if s.width() <= max_width {
        return s.to_string();
    }

    let target_width = max_width.saturating_sub(1);
    let mut truncated = String::new();
    let mut current_width = 0;
    for c in s.chars() {
        let char_width = c.width().unwrap_or(0);
        if current_width + char_width > target_width {
            break;
        }
        truncated.push(c);
        current_width += char_width;
    }
    truncated.push('…');
    truncated
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rows_for_height() {
        assert_eq!(rows_for_height(0), 0);
        assert_eq!(rows_for_height(9), 0);
        assert_eq!(rows_for_height(10), 1);
        assert_eq!(rows_for_height(46), 10);
    }

    #[test]
    fn test_truncate_str() {
        assert_eq!(truncate_str("short", 10), "short");
        assert_eq!(truncate_str("exactly10!", 10), "exactly10!");
        assert_eq!(truncate_str("a longer title", 8), "a longe…");
        // Wide characters take two columns each.
        assert_eq!(truncate_str("图片加载中", 5), "图片…");
    }

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(0), "0 B");
        assert!(format_bytes(2048).ends_with("KiB"));
    }
}
