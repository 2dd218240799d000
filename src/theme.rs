//! Theme selection and the feed list's palette.
//!
//! Base colors come from the `ratatui-themes` crate; [`Palette`] maps them
//! onto the roles the list draws: rows, thumbnail markers and the status bar.

use ratatui::style::{Color, Modifier, Style};
use ratatui_themes::{ThemeName, ThemePalette};
use serde::{Deserialize, Serialize};

/// Theme wrapper around `ThemeName` from ratatui-themes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Theme(pub ThemeName);

impl Theme {
    /// Get the next theme in rotation
    #[must_use]
    pub fn next(&self) -> Self {
        Self(self.0.next())
    }

    /// Get the previous theme in rotation
    #[must_use]
    pub fn prev(&self) -> Self {
        Self(self.0.prev())
    }

    /// Get the display name for the theme.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.0.display_name()
    }

    /// Colors for the feed list under this theme
    #[must_use]
    pub fn palette(&self) -> Palette {
        Palette::from(self.0.palette())
    }
}

impl From<ThemeName> for Theme {
    fn from(name: ThemeName) -> Self {
        Self(name)
    }
}

impl std::fmt::Display for Theme {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Colors the feed list draws with, by role.
#[derive(Debug, Clone, Copy)]
pub struct Palette {
    /// Screen background
    pub background: Color,
    /// Status bar background, a step lighter than the screen
    pub status_background: Color,
    /// Item titles and status messages
    pub text: Color,
    /// Descriptions, URLs, borders and idle placeholders
    pub muted: Color,
    /// Header title and item position
    pub accent: Color,
    /// Key names in the status bar
    pub hint: Color,
    /// Marker for a row whose thumbnail has arrived
    pub loaded: Color,
    /// Marker for a row whose thumbnail is being fetched
    pub loading: Color,
    /// Background of the selected row
    pub selection: Color,
}

impl From<ThemePalette> for Palette {
    fn from(p: ThemePalette) -> Self {
        Self {
            background: p.bg,
            status_background: lighten(p.bg, 10),
            text: p.fg,
            muted: p.muted,
            accent: p.accent,
            hint: p.secondary,
            loaded: p.success,
            loading: p.warning,
            selection: p.selection,
        }
    }
}

fn lighten(color: Color, amount: u8) -> Color {
    match color {
        Color::Rgb(r, g, b) => Color::Rgb(
            r.saturating_add(amount),
            g.saturating_add(amount),
            b.saturating_add(amount),
        ),
        other => other,
    }
}

impl Palette {
    /// Title text
    #[must_use]
    pub fn title(&self) -> Style {
        Style::default().fg(self.text).add_modifier(Modifier::BOLD)
    }

    /// Plain text
    #[must_use]
    pub fn body(&self) -> Style {
        Style::default().fg(self.text)
    }

    /// Secondary text
    #[must_use]
    pub fn secondary(&self) -> Style {
        Style::default().fg(self.muted)
    }

    /// Header accents
    #[must_use]
    pub fn accented(&self) -> Style {
        Style::default().fg(self.accent)
    }

    /// Thumbnail marker for a loaded row
    #[must_use]
    pub fn loaded_marker(&self) -> Style {
        Style::default().fg(self.loaded)
    }

    /// Thumbnail marker for a row with a fetch in flight
    #[must_use]
    pub fn loading_marker(&self) -> Style {
        Style::default().fg(self.loading)
    }

    /// Block borders
    #[must_use]
    pub fn border(&self) -> Style {
        Style::default().fg(self.muted)
    }

    /// The selected row
    #[must_use]
    pub fn selected_row(&self) -> Style {
        Style::default()
            .bg(self.selection)
            .fg(self.text)
            .add_modifier(Modifier::BOLD)
    }

    /// Status bar line
    #[must_use]
    pub fn status_bar(&self) -> Style {
        Style::default().bg(self.status_background).fg(self.text)
    }

    /// Key names in hints
    #[must_use]
    pub fn key_hint(&self) -> Style {
        Style::default().fg(self.hint).add_modifier(Modifier::BOLD)
    }
}
