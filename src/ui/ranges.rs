//! Events view: one row per predicted range.

use std::cmp::Ordering;

use eqwatch_types::tag_of;
use ratatui::{
    layout::{Constraint, Rect},
    style::Style,
    text::Span,
    widgets::{Block, Borders, Cell, Row, Table, TableState},
    Frame,
};

use super::common::format_value;
use crate::app::App;
use crate::data::duration::format_duration;
use crate::data::EventData;

/// Column to sort by in the Events view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortColumn {
    /// Chronological.
    #[default]
    Start,
    Duration,
    /// Summed importance of the event's top sensor.
    Importance,
    /// Unknown events before labeled ones when ascending.
    Labeled,
}

impl SortColumn {
    pub fn next(self) -> Self {
        match self {
            SortColumn::Start => SortColumn::Duration,
            SortColumn::Duration => SortColumn::Importance,
            SortColumn::Importance => SortColumn::Labeled,
            SortColumn::Labeled => SortColumn::Start,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            SortColumn::Start => "start",
            SortColumn::Duration => "duration",
            SortColumn::Importance => "importance",
            SortColumn::Labeled => "labeled",
        }
    }
}

fn top_value(event: &EventData) -> f64 {
    event.top_sensor().map(|s| s.value).unwrap_or(0.0)
}

/// Sort events by column and direction, ties broken by start time.
pub fn sort_events_by(events: &mut [&EventData], column: SortColumn, ascending: bool) {
    events.sort_by(|a, b| {
        let primary = match column {
            SortColumn::Start => a.range.start.cmp(&b.range.start),
            SortColumn::Duration => a.duration().cmp(&b.duration()),
            SortColumn::Importance => top_value(a).total_cmp(&top_value(b)),
            SortColumn::Labeled => a.labeled.cmp(&b.labeled),
        };
        let primary = if ascending { primary } else { primary.reverse() };
        if primary == Ordering::Equal {
            a.range.start.cmp(&b.range.start)
        } else {
            primary
        }
    });
}

pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let Some(ref data) = app.data else {
        return;
    };
    let events = app.visible_events();

    let header = Row::new(vec![
        Cell::from(format_header("#", None, app)),
        Cell::from(format_header("Start", Some(SortColumn::Start), app)),
        Cell::from(format_header("Duration", Some(SortColumn::Duration), app)),
        Cell::from(format_header("Top sensor", Some(SortColumn::Importance), app)),
        Cell::from(format_header("Top component", None, app)),
        Cell::from(format_header("Label", Some(SortColumn::Labeled), app)),
    ])
    .height(1)
    .style(app.theme.header);

    let rows: Vec<Row> = events
        .iter()
        .map(|e| {
            let sensor = e
                .top_sensor()
                .map(|s| format!("{} ({})", tag_of(&s.sensor), format_value(s.value)))
                .unwrap_or_else(|| "-".to_string());
            let component = match e.top_component() {
                Some(c) => Cell::from(c.to_string()),
                None if !e.components.unresolved.is_empty() => {
                    Cell::from(crate::plot::UNMAPPED_LABEL).style(app.theme.unmapped_style())
                }
                None => Cell::from("-"),
            };
            Row::new(vec![
                Cell::from(e.index.to_string()),
                Cell::from(e.range.start.format("%Y-%m-%d %H:%M").to_string()),
                Cell::from(format_duration(e.duration())),
                Cell::from(sensor),
                component,
                Cell::from(if e.labeled { "known" } else { "unknown" }).style(app.theme.event_style(e.labeled)),
            ])
        })
        .collect();

    let widths = [
        Constraint::Length(5),
        Constraint::Length(17),
        Constraint::Length(9),
        Constraint::Fill(2),
        Constraint::Fill(2),
        Constraint::Length(8),
    ];

    let selected = app.selected_index.min(events.len().saturating_sub(1));
    let sort_dir = if app.sort_ascending { "↑" } else { "↓" };

    let filter_info = if app.filter_active {
        format!(" /{}_", app.filter_text)
    } else if !app.filter_text.is_empty() {
        format!(" /{}/ [c:clear]", app.filter_text)
    } else {
        String::new()
    };
    let position_info = if events.is_empty() {
        String::new()
    } else {
        format!(" [{}/{}]", selected + 1, events.len())
    };

    let title = format!(
        " Events ({}/{}) [s:sort {}{}]{}{} ",
        events.len(),
        data.events.len(),
        app.sort_column.label(),
        sort_dir,
        filter_info,
        position_info
    );

    let table = Table::new(rows, widths)
        .header(header)
        .block(
            Block::default()
                .title(title)
                .borders(Borders::ALL)
                .border_type(app.theme.border_type)
                .border_style(Style::default().fg(app.theme.border)),
        )
        .row_highlight_style(app.theme.selected)
        .highlight_symbol("▶ ");

    let mut state = TableState::default();
    state.select(Some(selected));

    frame.render_stateful_widget(table, area, &mut state);
}

fn format_header(name: &str, col: Option<SortColumn>, app: &App) -> Span<'static> {
    if col == Some(app.sort_column) {
        let arrow = if app.sort_ascending { "↑" } else { "↓" };
        Span::raw(format!("{}{}", name, arrow))
    } else {
        Span::raw(name.to_string())
    }
}
