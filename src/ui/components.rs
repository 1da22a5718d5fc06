//! Components view: window importance rolled up through the tag map.

use ratatui::{
    layout::{Constraint, Rect},
    style::Style,
    widgets::{Block, Borders, Cell, Row, Table, TableState},
    Frame,
};

use super::common::{format_share, format_value};
use crate::app::App;

const BAR_WIDTH: usize = 20;

/// Eighth-block characters for the fractional end of a bar.
const PARTIAL: [char; 8] = [' ', '▏', '▎', '▍', '▌', '▋', '▊', '▉'];

/// A text bar `share` of [`BAR_WIDTH`] cells long.
pub fn share_bar(share: f64) -> String {
    let eighths = (share.clamp(0.0, 1.0) * (BAR_WIDTH * 8) as f64).round() as usize;
    let mut bar = "█".repeat(eighths / 8);
    if eighths % 8 > 0 {
        bar.push(PARTIAL[eighths % 8]);
    }
    bar
}

pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let Some(ref data) = app.data else {
        return;
    };
    let rows_data = app.component_rows();

    let header = Row::new(vec!["Component", "Sensors", "Importance", "Share", ""])
        .height(1)
        .style(app.theme.header);

    let rows: Vec<Row> = rows_data
        .iter()
        .map(|r| {
            let sensors = if r.unmapped {
                data.components.unresolved.len()
            } else {
                app.map().tags_of(r.label).count()
            };
            let style = if r.unmapped {
                app.theme.unmapped_style()
            } else {
                Style::default()
            };
            Row::new(vec![
                Cell::from(r.label.to_string()),
                Cell::from(sensors.to_string()),
                Cell::from(format_value(r.value)),
                Cell::from(format_share(r.share)),
                Cell::from(share_bar(r.share)).style(Style::default().fg(app.theme.highlight)),
            ])
            .style(style)
        })
        .collect();

    let widths = [
        Constraint::Fill(2),
        Constraint::Length(8),
        Constraint::Length(12),
        Constraint::Length(8),
        Constraint::Length(BAR_WIDTH as u16 + 1),
    ];

    let selected = app.selected_index.min(rows_data.len().saturating_sub(1));
    let filter_info = if !app.filter_text.is_empty() {
        format!(" /{}/", app.filter_text)
    } else {
        String::new()
    };
    let title = format!(
        " Components ({}) [{} mapped tags]{} ",
        data.components.components.len(),
        app.map().len(),
        filter_info
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_share_bar() {
        assert_eq!(share_bar(0.0), "");
        assert_eq!(share_bar(1.0).chars().count(), BAR_WIDTH);
        assert_eq!(share_bar(0.5), "█".repeat(10));
        assert_eq!(share_bar(1.0 / 160.0), "▏");
        assert_eq!(share_bar(2.0).chars().count(), BAR_WIDTH);
    }
}
