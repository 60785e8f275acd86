use ratatui::{
    layout::{Constraint, Rect},
    text::Span,
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState},
    Frame,
};

use crate::app::App;
use crate::ui::styles;

pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .title(" Today's Classes - [i]n person [o]nline [r]ecording [a]bsent ")
        .title_style(styles::muted_style())
        .borders(Borders::ALL)
        .border_style(styles::border_style(true));

    if app.check_in.is_empty() {
        let empty = Paragraph::new(Span::styled(" Nothing to check in for today.", styles::muted_style())).block(block);
        frame.render_widget(empty, area);
        return;
    }

    let header = Row::new(vec![Cell::from("Date"), Cell::from("Class"), Cell::from("Status")])
        .style(styles::title_style())
        .height(1);

    let rows: Vec<Row> = app
        .check_in
        .iter()
        .enumerate()
        .map(|(i, row)| {
            let style = if i == app.check_in_selection {
                styles::selected_style()
            } else {
                styles::list_item_style()
            };
            Row::new(vec![
                Cell::from(row.record.short_date()),
                Cell::from(row.class_name.clone()),
                Cell::from(Span::styled(row.record.status.as_str(), styles::status_color(row.record.status))),
            ])
            .style(style)
        })
        .collect();

    let widths = [Constraint::Length(6), Constraint::Fill(1), Constraint::Length(10)];

    let table = Table::new(rows, widths)
        .header(header)
        .block(block)
        .row_highlight_style(styles::selected_style());

    let mut state = TableState::default();
    state.select(Some(app.check_in_selection));
    frame.render_stateful_widget(table, area, &mut state);
}
