//! Detail overlay rendering.
//!
//! Displays a modal overlay with the sensors and components behind the
//! selected event.

use eqwatch_types::tag_of;
use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table},
    Frame,
};

use super::common::{format_share, format_value};
use crate::app::App;
use crate::data::duration::format_duration;
use crate::data::EventData;
use crate::plot::UNMAPPED_LABEL;

/// Minimum width required for the detail overlay to render properly.
const MIN_OVERLAY_WIDTH: u16 = 50;
/// Minimum height required for the detail overlay to render properly.
const MIN_OVERLAY_HEIGHT: u16 = 16;

/// Render the event detail as a modal overlay.
pub fn render_overlay(frame: &mut Frame, app: &App, area: Rect) {
    if area.width < MIN_OVERLAY_WIDTH || area.height < MIN_OVERLAY_HEIGHT {
        return;
    }
    let Some(event) = app.selected_event() else {
        return;
    };

    let overlay_width = (area.width * 95 / 100).clamp(MIN_OVERLAY_WIDTH, 110);
    let overlay_height = (area.height * 90 / 100).clamp(MIN_OVERLAY_HEIGHT, 50);
    let x = area.x + (area.width.saturating_sub(overlay_width)) / 2;
    let y = area.y + (area.height.saturating_sub(overlay_height)) / 2;
    let overlay_area = Rect::new(x, y, overlay_width, overlay_height);

    frame.render_widget(Clear, overlay_area);

    let chunks = Layout::vertical([
        Constraint::Length(5), // Event info
        Constraint::Min(10),   // Sensors and components
        Constraint::Length(1), // Footer
    ])
    .split(overlay_area);

    render_header(frame, app, event, chunks[0]);

    let content = Layout::horizontal([Constraint::Percentage(60), Constraint::Percentage(40)]).split(chunks[1]);
    render_sensors(frame, app, event, content[0]);
    render_components(frame, app, event, content[1]);

    let footer = Paragraph::new(Line::from(vec![Span::styled(
        " ↑/↓:previous/next event  Esc:close ",
        Style::default().add_modifier(Modifier::DIM),
    )]));
    frame.render_widget(footer, chunks[2]);
}

fn render_header(frame: &mut Frame, app: &App, event: &EventData, area: Rect) {
    let bold = Style::default().add_modifier(Modifier::BOLD);
    let label = if event.labeled {
        "overlaps a known anomaly"
    } else {
        "unknown event"
    };

    let lines = vec![
        Line::from(vec![Span::styled(format!(" Event #{} ", event.index), bold)]),
        Line::from(""),
        Line::from(vec![
            Span::raw(" "),
            Span::styled(event.range.start.format("%Y-%m-%d %H:%M:%S").to_string(), bold),
            Span::raw(" → "),
            Span::styled(event.range.end.format("%Y-%m-%d %H:%M:%S").to_string(), bold),
            Span::raw(format!("    Duration: {}    ", format_duration(event.duration()))),
            Span::styled(label, app.theme.event_style(event.labeled).add_modifier(Modifier::BOLD)),
        ]),
    ];

    let block = Block::default()
        .title(" Event Detail ")
        .borders(Borders::ALL)
        .border_type(app.theme.border_type)
        .border_style(Style::default().fg(app.theme.highlight));
    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_sensors(frame: &mut Frame, app: &App, event: &EventData, area: Rect) {
    let total: f64 = event.sensors.iter().map(|s| s.value).sum();
    let header = Row::new(vec!["Tag", "Component", "Value", "Share"])
        .height(1)
        .style(app.theme.header);

    let rows: Vec<Row> = event
        .sensors
        .iter()
        .map(|s| {
            let component = match app.map().resolve(&s.sensor) {
                Some(c) => Cell::from(c.to_string()),
                None => Cell::from(UNMAPPED_LABEL).style(app.theme.unmapped_style()),
            };
            Row::new(vec![
                Cell::from(tag_of(&s.sensor).to_string()),
                component,
                Cell::from(format_value(s.value)),
                Cell::from(format_share(if total > 0.0 { s.value / total } else { 0.0 })),
            ])
        })
        .collect();

    let widths = [
        Constraint::Fill(2),
        Constraint::Fill(2),
        Constraint::Length(10),
        Constraint::Length(8),
    ];

    let table = Table::new(rows, widths).header(header).block(
        Block::default()
            .title(format!(" Sensors ({}) ", event.sensors.len()))
            .borders(Borders::ALL)
            .border_type(app.theme.border_type)
            .border_style(Style::default().fg(app.theme.border)),
    );
    frame.render_widget(table, area);
}

fn render_components(frame: &mut Frame, app: &App, event: &EventData, area: Rect) {
    let block = Block::default()
        .title(format!(" Components ({}) ", event.components.components.len()))
        .borders(Borders::ALL)
        .border_type(app.theme.border_type)
        .border_style(Style::default().fg(app.theme.border));

    if event.components.is_empty() {
        let empty = Paragraph::new(vec![
            Line::from(""),
            Line::from(Span::styled(
                "  No diagnostics for this event",
                Style::default().add_modifier(Modifier::DIM),
            )),
        ])
        .block(block);
        frame.render_widget(empty, area);
        return;
    }

    let normalized = event.components.normalized();
    let header = Row::new(vec!["Component", "Value", "Share"])
        .height(1)
        .style(app.theme.header);

    let mut rows: Vec<Row> = event
        .components
        .components
        .iter()
        .zip(&normalized.components)
        .map(|(c, n)| {
            Row::new(vec![
                Cell::from(c.component.clone()),
                Cell::from(format_value(c.value)),
                Cell::from(format_share(n.value)),
            ])
        })
        .collect();
    if !event.components.unresolved.is_empty() {
        rows.push(
            Row::new(vec![
                Cell::from(UNMAPPED_LABEL),
                Cell::from(format_value(event.components.unresolved_total())),
                Cell::from(format_share(normalized.unresolved_total())),
            ])
            .style(app.theme.unmapped_style()),
        );
    }

    let widths = [Constraint::Fill(2), Constraint::Length(10), Constraint::Length(8)];
    frame.render_widget(Table::new(rows, widths).header(header).block(block), area);
}
