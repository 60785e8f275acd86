//! Classes tab: class list on the left, the selected class's roster with
//! per-student attendance counts on the right.

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState},
    Frame,
};

use kufah_core::models::Class;
use kufah_core::utils::format::{format_optional, truncate_string};

use crate::app::{App, Focus};
use crate::ui::styles;

pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(40), Constraint::Percentage(60)])
        .split(area);

    render_class_list(frame, app, chunks[0]);
    render_class_detail(frame, app, chunks[1]);
}

fn render_class_list(frame: &mut Frame, app: &App, area: Rect) {
    let focused = app.focus == Focus::List;

    let header = Row::new(vec![
        Cell::from("Class"),
        Cell::from("Schedule"),
        Cell::from("Enr"),
        Cell::from("Avg"),
    ])
    .style(styles::title_style())
    .height(1);

    let rows: Vec<Row> = app
        .classes
        .iter()
        .enumerate()
        .map(|(i, class)| {
            let style = if i == app.class_selection {
                styles::selected_style()
            } else {
                styles::list_item_style()
            };

            let (enrolled, average) = match app.roster_for(class.id) {
                Some(roster) => (
                    Cell::from(format!("{:>3}", roster.enrolled_count())),
                    Cell::from(Span::styled(
                        format!("{:>3}%", roster.average_percentage()),
                        styles::percentage_style(roster.average_percentage()),
                    )),
                ),
                None => (Cell::from("  -"), Cell::from("   -")),
            };

            Row::new(vec![
                Cell::from(class.name.clone()),
                Cell::from(class.schedule()),
                enrolled,
                average,
            ])
            .style(style)
        })
        .collect();

    let widths = [
        Constraint::Fill(2),
        Constraint::Fill(2),
        Constraint::Length(4),
        Constraint::Length(5),
    ];

    let title = format!(" Classes ({}) - [n]ew [e]dit [l]inks [a]dd ", app.classes.len());
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
    state.select(Some(app.class_selection));

    frame.render_stateful_widget(table, area, &mut state);
}

fn render_class_detail(frame: &mut Frame, app: &App, area: Rect) {
    let Some(class) = app.selected_class() else {
        let empty = Paragraph::new(Span::styled(" No classes yet. Press [n] to create one.", styles::muted_style()))
            .block(Block::default().borders(Borders::ALL).border_style(styles::border_style(false)));
        frame.render_widget(empty, area);
        return;
    };

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(6), Constraint::Min(5)])
        .split(area);

    render_class_info(frame, class, chunks[0]);
    render_roster(frame, app, class, chunks[1]);
}

fn render_class_info(frame: &mut Frame, class: &Class, area: Rect) {
    let link_width = (area.width as usize).saturating_sub(16);
    let lines = vec![
        Line::from(Span::styled(class.name.clone(), styles::title_style())),
        Line::from(vec![
            Span::styled("Schedule:   ", styles::muted_style()),
            Span::raw(class.schedule()),
        ]),
        Line::from(vec![
            Span::styled("Zoom:       ", styles::muted_style()),
            Span::raw(truncate_string(&format_optional(class.zoom_link.as_deref(), "-"), link_width)),
        ]),
        Line::from(vec![
            Span::styled("Recordings: ", styles::muted_style()),
            Span::raw(truncate_string(
                &format_optional(class.recordings_folder_link.as_deref(), "-"),
                link_width,
            )),
        ]),
    ];

    let info = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(styles::border_style(false)),
    );
    frame.render_widget(info, area);
}

fn render_roster(frame: &mut Frame, app: &App, class: &Class, area: Rect) {
    let focused = app.focus == Focus::Detail;
    let roster = app.roster_for(class.id);

    let header = Row::new(vec![
        Cell::from("Student"),
        Cell::from("In P"),
        Cell::from("Onl"),
        Cell::from("Rec"),
        Cell::from("Abs"),
        Cell::from("  %"),
    ])
    .style(styles::title_style())
    .height(1);

    let rows: Vec<Row> = roster
        .map(|r| r.rows.as_slice())
        .unwrap_or_default()
        .iter()
        .enumerate()
        .map(|(i, row)| {
            let style = if focused && i == app.roster_selection {
                styles::selected_style()
            } else {
                styles::list_item_style()
            };
            let summary = row.summary;
            let percent = summary.percentage();
            Row::new(vec![
                Cell::from(row.student.display_name()),
                Cell::from(format!("{:>4}", summary.in_person)),
                Cell::from(format!("{:>3}", summary.online)),
                Cell::from(format!("{:>3}", summary.recording)),
                Cell::from(format!("{:>3}", summary.absent)),
                Cell::from(Span::styled(format!("{:>3}", percent), styles::percentage_style(percent))),
            ])
            .style(style)
        })
        .collect();

    let widths = [
        Constraint::Fill(1),
        Constraint::Length(4),
        Constraint::Length(3),
        Constraint::Length(3),
        Constraint::Length(3),
        Constraint::Length(3),
    ];

    let title = match roster {
        Some(r) => format!(" Roster ({}) - [Enter] attendance ", r.enrolled_count()),
        None => " Roster (loading...) ".to_string(),
    };

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
        state.select(Some(app.roster_selection));
    }

    frame.render_stateful_widget(table, area, &mut state);
}
