//! Sensors view: duration-weighted importance over the window.

use eqwatch_types::tag_of;
use ratatui::{
    layout::{Constraint, Rect},
    style::Style,
    widgets::{Block, Borders, Cell, Row, Table, TableState},
    Frame,
};

use super::common::{format_share, format_value};
use super::components::share_bar;
use crate::app::App;

pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let Some(ref data) = app.data else {
        return;
    };
    let sensors = app.sensor_rows();

    let header = Row::new(vec!["#", "Tag", "Component", "Importance", "Share", ""])
        .height(1)
        .style(app.theme.header);

    let rows: Vec<Row> = sensors
        .iter()
        .enumerate()
        .map(|(rank, s)| {
            let component = match s.component {
                Some(c) => Cell::from(c.to_string()),
                None => Cell::from(crate::plot::UNMAPPED_LABEL).style(app.theme.unmapped_style()),
            };
            Row::new(vec![
                Cell::from((rank + 1).to_string()),
                Cell::from(tag_of(s.sensor).to_string()),
                component,
                Cell::from(format_value(s.value)),
                Cell::from(format_share(s.share)),
                Cell::from(share_bar(s.share)).style(Style::default().fg(app.theme.highlight)),
            ])
        })
        .collect();

    let widths = [
        Constraint::Length(4),
        Constraint::Fill(2),
        Constraint::Fill(2),
        Constraint::Length(12),
        Constraint::Length(8),
        Constraint::Length(21),
    ];

    let selected = app.selected_index.min(sensors.len().saturating_sub(1));
    let step = app.options().step;
    let title = format!(
        " Sensors ({}/{}) [weighted per {}] ",
        sensors.len(),
        data.sensors.len(),
        crate::data::duration::format_duration(step)
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
