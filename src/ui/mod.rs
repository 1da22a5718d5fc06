//! Terminal UI rendering using ratatui.
//!
//! ## Submodules
//!
//! - [`ranges`]: Predicted ranges with their top sensor and component
//! - [`components`]: Window importance rolled up to components
//! - [`sensors`]: Duration-weighted importance per sensor
//! - [`detail`]: Modal overlay for one event
//! - [`common`]: Shared components (header, tabs, status bar, help overlay)
//! - [`theme`]: Light/dark theme support with terminal auto-detection
//!
//! ## Layout
//!
//! ```text
//! ┌──────────────────────────────────────┐
//! │ Header (common::render_header)       │
//! ├──────────────────────────────────────┤
//! │ Tabs (common::render_tabs)           │
//! ├──────────────────────────────────────┤
//! │ View Content                         │
//! │ (ranges/components/sensors::render)  │
//! ├──────────────────────────────────────┤
//! │ Status Bar (common::render_status)   │
//! └──────────────────────────────────────┘
//!    Overlays: detail::render_overlay, common::render_help
//! ```

pub mod common;
pub mod components;
pub mod detail;
pub mod ranges;
pub mod sensors;
pub mod theme;

pub use theme::Theme;

use ratatui::{
    layout::{Alignment, Constraint, Layout, Rect},
    style::{Color, Style},
    widgets::Paragraph,
    Frame,
};

use crate::app::{App, View};

/// Minimum terminal size for usable display.
pub const MIN_WIDTH: u16 = 60;
pub const MIN_HEIGHT: u16 = 12;

/// First table row on screen: header bar, tabs, table border and header.
pub const CONTENT_START_ROW: u16 = 3;

/// Draw one frame.
pub fn draw(frame: &mut Frame, app: &App) {
    let area = frame.area();

    if area.width < MIN_WIDTH || area.height < MIN_HEIGHT {
        let msg = format!(
            "Terminal too small: {}x{}\nMinimum: {}x{}\n\nResize to continue",
            area.width, area.height, MIN_WIDTH, MIN_HEIGHT
        );
        let paragraph = Paragraph::new(msg)
            .alignment(Alignment::Center)
            .style(Style::default().fg(Color::Yellow));
        let centered = Rect::new(0, (area.height / 2).saturating_sub(2), area.width, 5.min(area.height));
        frame.render_widget(paragraph, centered);
        return;
    }

    let chunks = Layout::vertical([
        Constraint::Length(1), // Header bar
        Constraint::Length(1), // Tabs
        Constraint::Min(8),    // Content
        Constraint::Length(1), // Status bar
    ])
    .split(area);

    common::render_header(frame, app, chunks[0]);
    common::render_tabs(frame, app, chunks[1]);

    match app.current_view {
        View::Events => ranges::render(frame, app, chunks[2]),
        View::Components => components::render(frame, app, chunks[2]),
        View::Sensors => sensors::render(frame, app, chunks[2]),
    }

    common::render_status_bar(frame, app, chunks[3]);

    if app.show_detail_overlay {
        detail::render_overlay(frame, app, area);
    }
    if app.show_help {
        common::render_help(frame, app, area);
    }
}
