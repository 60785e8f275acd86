//! Student view of their own attendance, one row per enrolled class.

use ratatui::{
    layout::{Constraint, Rect},
    text::Span,
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState},
    Frame,
};

use kufah_core::attendance::AttendanceSummary;

use crate::app::App;
use crate::ui::styles;

fn summary_cells(label: String, summary: &AttendanceSummary) -> Vec<Cell<'static>> {
    let percent = summary.percentage();
    vec![
        Cell::from(label),
        Cell::from(format!("{:>9}", summary.in_person)),
        Cell::from(format!("{:>6}", summary.online)),
        Cell::from(format!("{:>9}", summary.recording)),
        Cell::from(format!("{:>6}", summary.absent)),
        Cell::from(Span::styled(format!("{:>4}%", percent), styles::percentage_style(percent))),
    ]
}

pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .title(" My Attendance ")
        .title_style(styles::muted_style())
        .borders(Borders::ALL)
        .border_style(styles::border_style(true));

    let Some(overview) = &app.student_overview else {
        let loading = Paragraph::new(Span::styled(" Loading attendance...", styles::muted_style())).block(block);
        frame.render_widget(loading, area);
        return;
    };

    if overview.classes.is_empty() {
        let empty = Paragraph::new(Span::styled(" You are not enrolled in any classes yet.", styles::muted_style()))
            .block(block);
        frame.render_widget(empty, area);
        return;
    }

    let header = Row::new(vec![
        Cell::from("Class"),
        Cell::from("In Person"),
        Cell::from("Online"),
        Cell::from("Recording"),
        Cell::from("Absent"),
        Cell::from("    %"),
    ])
    .style(styles::title_style())
    .height(1);

    let mut rows: Vec<Row> = overview
        .classes
        .iter()
        .enumerate()
        .map(|(i, progress)| {
            let style = if i == app.progress_selection {
                styles::selected_style()
            } else {
                styles::list_item_style()
            };
            Row::new(summary_cells(progress.class.name.clone(), &progress.summary)).style(style)
        })
        .collect();
    rows.push(Row::new(summary_cells("Overall".to_string(), &overview.overall())).style(styles::highlight_style()));

    let widths = [
        Constraint::Fill(1),
        Constraint::Length(9),
        Constraint::Length(6),
        Constraint::Length(9),
        Constraint::Length(6),
        Constraint::Length(5),
    ];

    let table = Table::new(rows, widths)
        .header(header)
        .block(block)
        .row_highlight_style(styles::selected_style());

    let mut state = TableState::default();
    state.select(Some(app.progress_selection));
    frame.render_stateful_widget(table, area, &mut state);
}
