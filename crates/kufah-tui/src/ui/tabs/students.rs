use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState},
    Frame,
};

use kufah_core::dashboard::StudentOverview;
use kufah_core::models::Student;
use kufah_core::utils::{format_optional, format_phone};

use crate::app::{App, Focus};
use crate::ui::styles;

pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
        .split(area);

    render_student_table(frame, app, chunks[0]);
    render_student_detail(frame, app, chunks[1]);
}

fn render_student_table(frame: &mut Frame, app: &App, area: Rect) {
    let students = app.filtered_students();
    let focused = app.focus == Focus::List;

    let header = Row::new(vec![Cell::from("Name"), Cell::from("Email"), Cell::from("Phone")])
        .style(styles::title_style())
        .height(1);

    let rows: Vec<Row> = students
        .iter()
        .enumerate()
        .map(|(i, student)| {
            let style = if i == app.student_selection {
                styles::selected_style()
            } else {
                styles::list_item_style()
            };
            Row::new(vec![
                Cell::from(student.display_name()),
                Cell::from(format_optional(student.email.as_deref(), "-")),
                Cell::from(student.phone.as_deref().map(format_phone).unwrap_or_default()),
            ])
            .style(style)
        })
        .collect();

    let widths = [Constraint::Percentage(35), Constraint::Fill(2), Constraint::Length(14)];

    let count = if app.search_query.is_empty() {
        format!("{}", app.students.len())
    } else {
        format!("{} of {}", students.len(), app.students.len())
    };
    let title = format!(" Students ({}) - [n]ew [e]dit [c]lasses [i]mport ", count);

    let table = Table::new(rows, widths)
        .header(header)
        .block(
            Block::default()
                .title(title)
                .title_style(styles::muted_style())
                .borders(Borders::ALL)
                .border_style(styles::border_style(focused)),
        )
        .row_highlight_style(styles::selected_style());

    let mut state = TableState::default();
    state.select(Some(app.student_selection));

    frame.render_stateful_widget(table, area, &mut state);
}

fn render_student_detail(frame: &mut Frame, app: &App, area: Rect) {
    let focused = app.focus == Focus::Detail;
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(styles::border_style(focused));

    let Some(student) = app.selected_student() else {
        frame.render_widget(
            Paragraph::new(Span::styled(" No student selected", styles::muted_style())).block(block),
            area,
        );
        return;
    };

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(9), Constraint::Min(4)])
        .split(area);

    frame.render_widget(Paragraph::new(contact_lines(student)).block(block), chunks[0]);

    let overview = app.student_overview.as_ref().filter(|o| o.student.id == student.id);
    render_class_progress(frame, app, overview, focused, chunks[1]);
}

fn contact_lines(student: &Student) -> Vec<Line<'static>> {
    let goals = student.goals();
    vec![
        Line::from(Span::styled(student.full_name(), styles::title_style())),
        Line::from(vec![
            Span::styled("Email:      ", styles::muted_style()),
            Span::raw(format_optional(student.email.as_deref(), "-")),
        ]),
        Line::from(vec![
            Span::styled("Phone:      ", styles::muted_style()),
            Span::raw(student.phone.as_deref().map(format_phone).unwrap_or_else(|| "-".to_string())),
        ]),
        Line::from(""),
        Line::from(Span::styled("Daily goals", styles::highlight_style())),
        Line::from(vec![
            Span::styled("Salawat ", styles::muted_style()),
            Span::raw(format!("{:<6}", goals.salawat)),
            Span::styled("Adhkar ", styles::muted_style()),
            Span::raw(format!("{:<6}", goals.adhkar)),
            Span::styled("Istighfar ", styles::muted_style()),
            Span::raw(goals.istighfar.to_string()),
        ]),
    ]
}

fn render_class_progress(frame: &mut Frame, app: &App, overview: Option<&StudentOverview>, focused: bool, area: Rect) {
    let Some(overview) = overview else {
        let hint = Paragraph::new(Span::styled(" [Tab] to load attendance", styles::muted_style())).block(
            Block::default()
                .title(" Attendance ")
                .title_style(styles::muted_style())
                .borders(Borders::ALL)
                .border_style(styles::border_style(focused)),
        );
        frame.render_widget(hint, area);
        return;
    };

    let header = Row::new(vec![
        Cell::from("Class"),
        Cell::from("Present"),
        Cell::from("Absent"),
        Cell::from("  %"),
    ])
    .style(styles::title_style());

    let rows: Vec<Row> = overview
        .classes
        .iter()
        .enumerate()
        .map(|(i, progress)| {
            let style = if focused && i == app.student_class_selection {
                styles::selected_style()
            } else {
                styles::list_item_style()
            };
            let percent = progress.summary.percentage();
            Row::new(vec![
                Cell::from(progress.class.name.clone()),
                Cell::from(format!("{:>7}", progress.summary.attended())),
                Cell::from(format!("{:>6}", progress.summary.absent)),
                Cell::from(Span::styled(format!("{:>3}", percent), styles::percentage_style(percent))),
            ])
            .style(style)
        })
        .collect();

    let widths = [Constraint::Fill(1), Constraint::Length(7), Constraint::Length(6), Constraint::Length(3)];
    let overall = overview.overall().percentage();
    let title = format!(" Attendance - {}% overall - [Enter] edit ", overall);

    let table = Table::new(rows, widths)
        .header(header)
        .block(
            Block::default()
                .title(title)
                .title_style(styles::muted_style())
                .borders(Borders::ALL)
                .border_style(styles::border_style(focused)),
        )
        .row_highlight_style(styles::selected_style());

    let mut state = TableState::default();
    if focused {
        state.select(Some(app.student_class_selection));
    }
    frame.render_stateful_widget(table, area, &mut state);
}
