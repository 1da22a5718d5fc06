//! Common UI components shared across views.
//!
//! This module contains the header bar, tab bar, status bar, and help overlay.

use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Tabs},
    Frame,
};

use crate::app::{App, View};
use crate::data::duration::format_duration;

/// Render the header bar: model, detection counts, window.
///
/// Shows a loading placeholder until the first evaluation arrives.
pub fn render_header(frame: &mut Frame, app: &App, area: Rect) {
    let Some(ref data) = app.data else {
        let line = Line::from(vec![
            Span::styled(" EQWATCH ", Style::default().add_modifier(Modifier::BOLD)),
            Span::raw("| Loading..."),
        ]);
        frame.render_widget(Paragraph::new(line), area);
        return;
    };

    let labeled = data.summary.matches.len();
    let detected = data.summary.detected_count();
    let unknown = data.unknown_count();

    let (icon_style, recall) = match data.summary.recall() {
        Some(r) if r >= 1.0 => (Style::default().fg(app.theme.highlight), format!("{:.0}%", r * 100.0)),
        Some(r) => (app.theme.event_style(true), format!("{:.0}%", r * 100.0)),
        None => (Style::default().add_modifier(Modifier::DIM), "-".to_string()),
    };

    let mut spans = vec![
        Span::styled(" ● ", icon_style),
        Span::styled(format!("{} ", data.model_name), Style::default().add_modifier(Modifier::BOLD)),
    ];
    if let Some(ref status) = data.status {
        spans.push(Span::styled(format!("[{status}] "), Style::default().add_modifier(Modifier::DIM)));
    }
    spans.extend([
        Span::raw("│ "),
        Span::styled(format!("{detected}/{labeled}"), app.theme.event_style(true)),
        Span::raw(" labels detected "),
        Span::raw(format!("({recall}) │ ")),
        if unknown > 0 {
            Span::styled(format!("{unknown}"), app.theme.event_style(false))
        } else {
            Span::styled("0", Style::default().add_modifier(Modifier::DIM))
        },
        Span::raw(" unknown │ "),
        Span::styled(format!("{}", data.events.len()), Style::default().add_modifier(Modifier::BOLD)),
        Span::raw(" events"),
    ]);
    if let Some(window) = data.window {
        spans.push(Span::raw(format!(
            " │ {} → {} ({})",
            window.start.format("%Y-%m-%d"),
            window.end.format("%Y-%m-%d"),
            format_duration(window.duration())
        )));
    }

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

/// Format an importance value for a table cell.
///
/// Large values are abbreviated with K/M suffixes, small ones keep three
/// decimals.
pub fn format_value(v: f64) -> String {
    if v.abs() >= 1_000_000.0 {
        format!("{:.2}M", v / 1_000_000.0)
    } else if v.abs() >= 1_000.0 {
        format!("{:.1}K", v / 1_000.0)
    } else {
        format!("{:.3}", v)
    }
}

/// Format a 0..1 share as a percentage with one decimal.
pub fn format_share(share: f64) -> String {
    format!("{:.1}%", share * 100.0)
}

/// Render the tab bar showing available views.
pub fn render_tabs(frame: &mut Frame, app: &App, area: Rect) {
    let titles: Vec<Line> = vec![
        Line::from(" 1:Events "),
        Line::from(" 2:Components "),
        Line::from(" 3:Sensors "),
    ];

    let selected = match app.current_view {
        View::Events => 0,
        View::Components => 1,
        View::Sensors => 2,
    };

    let tabs = Tabs::new(titles)
        .select(selected)
        .style(app.theme.tab_inactive)
        .highlight_style(app.theme.tab_active)
        .divider("|");

    frame.render_widget(tabs, area);
}

/// Render the status bar at the bottom.
///
/// Shows: breadcrumb trail, policy, time since last update, available
/// controls. Also displays temporary status messages and errors.
pub fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    if let Some(msg) = app.get_status_message() {
        let paragraph =
            Paragraph::new(format!(" {} ", msg)).style(Style::default().fg(app.theme.highlight));
        frame.render_widget(paragraph, area);
        return;
    }

    let status = if let Some(ref err) = app.load_error {
        format!(" Error: {} | p:policy r:retry q:quit", err)
    } else if let Some(ref data) = app.data {
        let controls = if app.filter_active {
            "Type to search | Enter:apply Esc:cancel"
        } else {
            match app.current_view {
                View::Events => "/:search s:sort S:reverse Enter:detail p:policy ?:help q:quit",
                View::Components | View::Sensors => "/:search Enter:events p:policy ?:help q:quit",
            }
        };

        format!(
            " {} | {} | unresolved:{} | Updated {:.1}s ago | {}",
            app.breadcrumb(),
            app.source_description(),
            data.policy.name(),
            data.last_updated.elapsed().as_secs_f64(),
            controls,
        )
    } else {
        " Loading... | q:quit".to_string()
    };

    let paragraph = Paragraph::new(status).style(Style::default().add_modifier(Modifier::DIM));
    frame.render_widget(paragraph, area);
}

/// Render the help overlay with keyboard shortcuts.
///
/// Drawn centered over the current view; any key closes it.
pub fn render_help(frame: &mut Frame, app: &App, area: Rect) {
    let section = |title: &'static str| {
        Line::from(vec![Span::styled(title, Style::default().add_modifier(Modifier::BOLD))])
    };
    let help_text = vec![
        Line::from(vec![Span::styled("Keyboard Shortcuts", app.theme.header)]),
        Line::from(""),
        section(" Navigation"),
        Line::from("  ←/→ h/l     Switch views"),
        Line::from("  ↑/↓ j/k     Navigate list"),
        Line::from("  PgUp/PgDn   Jump 10 items"),
        Line::from("  Home/End    Jump to first/last"),
        Line::from("  Enter       Event detail / related events"),
        Line::from("  Esc         Go back"),
        Line::from(""),
        section(" Lists"),
        Line::from("  /         Start filter/search"),
        Line::from("  c         Clear filter"),
        Line::from("  s         Cycle sort column (Events)"),
        Line::from("  S         Toggle sort direction"),
        Line::from(""),
        section(" General"),
        Line::from("  p         Cycle unresolved-sensor policy"),
        Line::from("  r         Reload model document"),
        Line::from("  e         Export to JSON"),
        Line::from("  q         Quit"),
        Line::from(""),
        Line::from(vec![Span::styled(
            "Press any key to close",
            Style::default().add_modifier(Modifier::DIM),
        )]),
    ];

    let block = Block::default()
        .title(" Help ")
        .borders(Borders::ALL)
        .border_type(app.theme.border_type)
        .border_style(Style::default().fg(app.theme.highlight));

    let paragraph = Paragraph::new(help_text).block(block);

    let help_width = 50u16.min(area.width.saturating_sub(4));
    let help_height = 25u16.min(area.height.saturating_sub(2));
    let x = area.x + (area.width.saturating_sub(help_width)) / 2;
    let y = area.y + (area.height.saturating_sub(help_height)) / 2;
    let help_area = Rect::new(x, y, help_width, help_height);

    frame.render_widget(Clear, help_area);
    frame.render_widget(paragraph, help_area);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_value() {
        assert_eq!(format_value(0.25), "0.250");
        assert_eq!(format_value(1234.0), "1.2K");
        assert_eq!(format_value(2_500_000.0), "2.50M");
        assert_eq!(format_share(0.4213), "42.1%");
    }
}
