//! Attendance reconciliation overlay: one student's sessions in one class,
//! edited locally and saved as a batch.

use ratatui::{
    layout::{Constraint, Direction, Layout},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table, TableState, Wrap},
    Frame,
};

use kufah_core::attendance::panel::EMPTY_PANEL_MESSAGE;
use kufah_core::attendance::AttendancePanel;
use kufah_core::models::AttendanceStatus;

use crate::app::App;
use crate::ui::render::centered_rect_fixed;
use crate::ui::styles;

pub fn render(frame: &mut Frame, app: &App) {
    let Some(view) = &app.panel_view else {
        return;
    };

    let screen = frame.area();
    let area = centered_rect_fixed(screen.width.saturating_sub(8).min(76), screen.height.saturating_sub(4), screen);
    frame.render_widget(Clear, area);

    let block = Block::default()
        .title(format!(" Attendance: {} - {} ", view.student_name, view.class_name))
        .title_style(styles::title_style())
        .borders(Borders::ALL)
        .border_style(styles::border_style(true));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(2), Constraint::Min(3), Constraint::Length(3)])
        .split(inner);

    let Some(panel) = &view.panel else {
        let text = if view.saving { " Saving..." } else { " Loading attendance..." };
        frame.render_widget(Paragraph::new(Span::styled(text, styles::muted_style())), chunks[1]);
        return;
    };

    render_summary(frame, panel, chunks[0]);

    if panel.is_empty() {
        frame.render_widget(
            Paragraph::new(Span::styled(format!(" {}", EMPTY_PANEL_MESSAGE), styles::muted_style())),
            chunks[1],
        );
    } else {
        render_records(frame, panel, view.selection, chunks[1]);
    }

    let mut footer = vec![Line::from(vec![
        Span::styled(" [i]", styles::help_key_style()),
        Span::styled("n person ", styles::help_desc_style()),
        Span::styled("[o]", styles::help_key_style()),
        Span::styled("nline ", styles::help_desc_style()),
        Span::styled("[r]", styles::help_key_style()),
        Span::styled("ecording ", styles::help_desc_style()),
        Span::styled("[a]", styles::help_key_style()),
        Span::styled("bsent  ", styles::help_desc_style()),
        Span::styled("[s]", styles::help_key_style()),
        Span::styled("ave  ", styles::help_desc_style()),
        Span::styled("[Esc]", styles::help_key_style()),
        Span::styled(" close", styles::help_desc_style()),
    ])];
    if let Some(error) = &view.error {
        footer.push(Line::from(Span::styled(format!(" {}", error), styles::error_style())));
    }
    frame.render_widget(Paragraph::new(footer).wrap(Wrap { trim: false }), chunks[2]);
}

fn render_summary(frame: &mut Frame, panel: &AttendancePanel, area: ratatui::layout::Rect) {
    let summary = panel.summary();
    let percent = summary.percentage();

    let mut spans = vec![Span::raw(" ")];
    for status in AttendanceStatus::ALL {
        spans.push(Span::styled(format!("{}: ", status), styles::muted_style()));
        spans.push(Span::styled(format!("{}  ", summary.count(status)), styles::status_color(status)));
    }
    spans.push(Span::styled(format!("{}%", percent), styles::percentage_style(percent)));

    let changed = panel.changed_count();
    if changed > 0 {
        spans.push(Span::styled(format!("   {} unsaved", changed), styles::changed_style()));
    }

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn render_records(frame: &mut Frame, panel: &AttendancePanel, selection: usize, area: ratatui::layout::Rect) {
    let header = Row::new(vec![Cell::from("Date"), Cell::from("Status"), Cell::from("Saved as")])
        .style(styles::title_style())
        .height(1);

    let rows: Vec<Row> = panel
        .records()
        .iter()
        .enumerate()
        .map(|(i, record)| {
            let changed = panel.is_changed(record);
            let style = if i == selection {
                styles::selected_style()
            } else if changed {
                styles::changed_style()
            } else {
                styles::list_item_style()
            };
            let was = if changed {
                panel
                    .baseline_status(record.id)
                    .map(|s| s.as_str().to_string())
                    .unwrap_or_default()
            } else {
                String::new()
            };
            let date = record
                .day()
                .map(|d| d.format("%a %b %-d, %Y").to_string())
                .unwrap_or_else(|| record.date.clone());
            Row::new(vec![
                Cell::from(date),
                Cell::from(Span::styled(record.status.as_str(), styles::status_color(record.status))),
                Cell::from(Span::styled(was, styles::muted_style())),
            ])
            .style(style)
        })
        .collect();

    let widths = [Constraint::Length(18), Constraint::Length(11), Constraint::Fill(1)];
    let table = Table::new(rows, widths)
        .header(header)
        .row_highlight_style(styles::selected_style());

    let mut state = TableState::default();
    state.select(Some(selection));
    frame.render_stateful_widget(table, area, &mut state);
}
