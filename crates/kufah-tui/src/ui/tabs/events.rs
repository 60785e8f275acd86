use chrono::Local;
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState, Wrap},
    Frame,
};

use kufah_core::models::{no_school_window, DEFAULT_NO_SCHOOL_REASON};
use kufah_core::utils::{format_date, format_optional};

use crate::app::{App, EventsView, Focus};
use crate::ui::styles;

pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    match app.events_view {
        EventsView::Events => render_events(frame, app, area),
        EventsView::NoSchool => render_no_school(frame, app, area),
    }
}

fn render_events(frame: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(area);

    render_event_list(frame, app, chunks[0]);
    render_event_detail(frame, app, chunks[1]);
}

fn render_event_list(frame: &mut Frame, app: &App, area: Rect) {
    let focused = app.focus == Focus::List;
    let now = Local::now().naive_local();

    let header = Row::new(vec![Cell::from("When"), Cell::from("Title")])
        .style(styles::title_style())
        .height(1);

    let rows: Vec<Row> = app
        .events
        .iter()
        .enumerate()
        .map(|(i, event)| {
            let style = if i == app.event_selection {
                styles::selected_style()
            } else if event.is_upcoming(now) {
                styles::list_item_style()
            } else {
                styles::muted_style()
            };
            Row::new(vec![Cell::from(event.formatted_when()), Cell::from(event.title.clone())]).style(style)
        })
        .collect();

    let widths = [Constraint::Length(24), Constraint::Fill(1)];

    let filter = if app.upcoming_only { "upcoming" } else { "all" };
    let title = format!(
        " Events ({}, {}) - [n]ew [e]dit [d]elete [f]ilter [v] no-school ",
        app.events.len(),
        filter
    );

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
    state.select(Some(app.event_selection));

    frame.render_stateful_widget(table, area, &mut state);
}

fn render_event_detail(frame: &mut Frame, app: &App, area: Rect) {
    let focused = app.focus == Focus::Detail;

    let content = match app.selected_event() {
        Some(event) => vec![
            Line::from(Span::styled(event.title.clone(), styles::title_style())),
            Line::from(""),
            Line::from(vec![
                Span::styled("When:       ", styles::muted_style()),
                Span::raw(event.formatted_when()),
            ]),
            Line::from(vec![
                Span::styled("Image:      ", styles::muted_style()),
                Span::raw(format_optional(event.image_url.as_deref(), "-")),
            ]),
            Line::from(""),
            Line::from(Span::raw(format_optional(event.description.as_deref(), "(no description)"))),
        ],
        None => vec![Line::from(Span::styled("No event selected", styles::muted_style()))],
    };

    let detail = Paragraph::new(content).wrap(Wrap { trim: false }).block(
        Block::default()
            .title(" Event Details ")
            .title_style(styles::muted_style())
            .borders(Borders::ALL)
            .border_style(styles::border_style(focused)),
    );
    frame.render_widget(detail, area);
}

fn render_no_school(frame: &mut Frame, app: &App, area: Rect) {
    let (from, to) = no_school_window(app.no_school_month);

    let header = Row::new(vec![Cell::from("Date"), Cell::from("Reason")])
        .style(styles::title_style())
        .height(1);

    let rows: Vec<Row> = app
        .no_school
        .iter()
        .enumerate()
        .map(|(i, day)| {
            let style = if i == app.no_school_selection {
                styles::selected_style()
            } else {
                styles::list_item_style()
            };
            let weekday = day.day().map(|d| d.format("%a ").to_string()).unwrap_or_default();
            Row::new(vec![
                Cell::from(format!("{}{}", weekday, format_date(&day.date))),
                Cell::from(format_optional(day.reason.as_deref(), DEFAULT_NO_SCHOOL_REASON)),
            ])
            .style(style)
        })
        .collect();

    let widths = [Constraint::Length(18), Constraint::Fill(1)];
    let title = format!(
        " No-School Days {} ({} to {}) - [<>] month [n] toggle date [d] remove [v] events ",
        app.no_school_month.format("%B %Y"),
        from.format("%b %-d"),
        to.format("%b %-d"),
    );

    let table = Table::new(rows, widths)
        .header(header)
        .block(
            Block::default()
                .title(title)
                .title_style(styles::muted_style())
                .borders(Borders::ALL)
                .border_style(styles::border_style(true)),
        )
        .row_highlight_style(styles::selected_style());

    let mut state = TableState::default();
    state.select(Some(app.no_school_selection));

    frame.render_stateful_widget(table, area, &mut state);
}
