//! Goals tab: every student's daily ibadah goals next to what they logged
//! for the selected day.

use ratatui::{
    layout::{Constraint, Rect},
    text::Span,
    widgets::{Block, Borders, Cell, Row, Table, TableState},
    Frame,
};

use kufah_core::goals::{GoalCounter, GoalRow};

use crate::app::App;
use crate::ui::styles;

fn counter_cell(row: &GoalRow, counter: GoalCounter, active: bool) -> Cell<'static> {
    let goal = row.goals.get(counter);
    let done = row.progress.done(counter);
    let text = format!("{:>4}/{:<4} ({:>3} left)", done, goal, row.remaining(counter));
    let style = if goal > 0 && row.remaining(counter) == 0 {
        styles::success_style()
    } else if active {
        styles::highlight_style()
    } else {
        styles::list_item_style()
    };
    Cell::from(Span::styled(text, style))
}

pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let board = &app.goal_board;
    let rows_shown = board.filtered();

    let header_cells: Vec<Cell> = std::iter::once(Cell::from("Student"))
        .chain(GoalCounter::ALL.iter().map(|counter| {
            let marker = if *counter == app.goal_counter { "▸ " } else { "  " };
            Cell::from(format!("{}{}", marker, counter.label()))
        }))
        .chain(std::iter::once(Cell::from("")))
        .collect();
    let header = Row::new(header_cells).style(styles::title_style()).height(1);

    let rows: Vec<Row> = rows_shown
        .iter()
        .enumerate()
        .map(|(i, row)| {
            let style = if i == app.goal_selection {
                styles::selected_style()
            } else if row.is_dirty() {
                styles::changed_style()
            } else {
                styles::list_item_style()
            };

            let mut cells = vec![Cell::from(row.student.display_name())];
            for counter in GoalCounter::ALL {
                cells.push(counter_cell(row, counter, counter == app.goal_counter));
            }
            let flag = if row.is_dirty() {
                Span::styled("edited", styles::changed_style())
            } else if row.is_fully_done() {
                Span::styled("✓ done", styles::success_style())
            } else {
                Span::raw("")
            };
            cells.push(Cell::from(flag));
            Row::new(cells).style(style)
        })
        .collect();

    let widths = [
        Constraint::Fill(1),
        Constraint::Length(20),
        Constraint::Length(20),
        Constraint::Length(20),
        Constraint::Length(7),
    ];

    let title = format!(
        " Goals for {} - {} of {} complete{} - [<>] day [[]] counter [+-] adjust [s]ave [x] revert [e]dit ",
        app.goal_day.format("%a %b %-d"),
        board.fully_done_count(),
        board.rows().len(),
        match board.dirty_count() {
            0 => String::new(),
            n => format!(", {} unsaved", n),
        },
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
    state.select(Some(app.goal_selection));

    frame.render_stateful_widget(table, area, &mut state);
}
