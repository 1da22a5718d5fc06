//! Theme configuration for the TUI.
//!
//! Supports light and dark themes with automatic terminal detection.

use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::block::BorderType;

/// Color and style theme for the TUI.
///
/// Use [`Theme::auto_detect()`] for automatic theme selection based on
/// terminal background, or [`Theme::dark()`]/[`Theme::light()`] explicitly.
#[derive(Debug, Clone)]
pub struct Theme {
    /// Accent color for highlights and active elements.
    pub highlight: Color,
    /// Events overlapping a known anomaly.
    pub labeled: Color,
    /// Events matching no label.
    pub unknown: Color,
    /// Importance no component accounts for.
    pub unmapped: Color,
    /// Color for borders and separators.
    pub border: Color,
    /// Style for table header rows.
    pub header: Style,
    /// Style for the selected row.
    pub selected: Style,
    /// Style for the active tab.
    pub tab_active: Style,
    /// Style for inactive tabs.
    pub tab_inactive: Style,
    /// Border style (rounded, plain, etc.).
    pub border_type: BorderType,
}

impl Theme {
    /// Create a dark theme suitable for dark terminal backgrounds.
    pub fn dark() -> Self {
        Self {
            highlight: Color::Cyan,
            labeled: Color::Red,
            unknown: Color::Yellow,
            unmapped: Color::Gray,
            border: Color::Gray,
            header: Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
            selected: Style::default().bg(Color::DarkGray).add_modifier(Modifier::BOLD),
            tab_active: Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
            tab_inactive: Style::default().fg(Color::Gray),
            border_type: BorderType::Rounded,
        }
    }

    /// Create a light theme suitable for light terminal backgrounds.
    pub fn light() -> Self {
        Self {
            highlight: Color::Blue,
            labeled: Color::Red,
            unknown: Color::Magenta,
            unmapped: Color::DarkGray,
            border: Color::DarkGray,
            header: Style::default().fg(Color::Blue).add_modifier(Modifier::BOLD),
            selected: Style::default().bg(Color::LightBlue).add_modifier(Modifier::BOLD),
            tab_active: Style::default().fg(Color::Blue).add_modifier(Modifier::BOLD),
            tab_inactive: Style::default().fg(Color::DarkGray),
            border_type: BorderType::Rounded,
        }
    }

    /// Auto-detect based on terminal background luminance.
    ///
    /// Falls back to the dark theme when the terminal cannot be queried.
    pub fn auto_detect() -> Self {
        match terminal_light::luma() {
            Ok(luma) if luma > 0.5 => Self::light(),
            _ => Self::dark(),
        }
    }

    /// Style for an event row, by whether it overlaps a label.
    pub fn event_style(&self, labeled: bool) -> Style {
        if labeled {
            Style::default().fg(self.labeled)
        } else {
            Style::default().fg(self.unknown).add_modifier(Modifier::BOLD)
        }
    }

    /// Style for the unmapped row and unresolved sensor cells.
    pub fn unmapped_style(&self) -> Style {
        Style::default().fg(self.unmapped).add_modifier(Modifier::ITALIC)
    }
}
