use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Wrap},
    Frame,
};

use crate::app::{App, Focus};
use crate::ui::styles;

pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(30), Constraint::Percentage(70)])
        .split(area);

    render_class_picker(frame, app, chunks[0]);

    let right = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
        .split(chunks[1]);
    render_question_list(frame, app, right[0]);
    render_question_detail(frame, app, right[1]);
}

fn render_class_picker(frame: &mut Frame, app: &App, area: Rect) {
    let focused = app.focus == Focus::List;

    let items: Vec<ListItem> = app
        .classes
        .iter()
        .map(|class| {
            let marker = if app.questions_class == Some(class.id) { "● " } else { "  " };
            ListItem::new(format!("{}{}", marker, class.name))
        })
        .collect();

    let list = List::new(items)
        .block(
            Block::default()
                .title(" Class - [Enter] load ")
                .title_style(styles::muted_style())
                .borders(Borders::ALL)
                .border_style(styles::border_style(focused)),
        )
        .style(styles::list_item_style())
        .highlight_style(styles::selected_style());

    let mut state = ListState::default();
    state.select(Some(app.question_class_selection));
    frame.render_stateful_widget(list, area, &mut state);
}

fn render_question_list(frame: &mut Frame, app: &App, area: Rect) {
    let focused = app.focus == Focus::Detail;

    let items: Vec<ListItem> = app
        .questions
        .iter()
        .map(|q| {
            let (flag, style) = if q.is_answered() {
                (if q.is_public { "public " } else { "private" }, styles::success_style())
            } else {
                ("new    ", styles::highlight_style())
            };
            ListItem::new(Line::from(vec![
                Span::styled(format!("{} ", flag), style),
                Span::raw(q.question.clone()),
            ]))
        })
        .collect();

    let title = match app.questions_class {
        Some(_) => format!(
            " Questions ({}, {} unanswered) - [a]nswer ",
            app.questions.len(),
            app.questions.iter().filter(|q| !q.is_answered()).count()
        ),
        None => " Questions - pick a class ".to_string(),
    };

    let list = List::new(items)
        .block(
            Block::default()
                .title(title)
                .title_style(styles::muted_style())
                .borders(Borders::ALL)
                .border_style(styles::border_style(focused)),
        )
        .highlight_style(styles::selected_style());

    let mut state = ListState::default();
    if !app.questions.is_empty() {
        state.select(Some(app.question_selection));
    }
    frame.render_stateful_widget(list, area, &mut state);
}

fn render_question_detail(frame: &mut Frame, app: &App, area: Rect) {
    let content = match app.selected_question() {
        Some(q) => vec![
            Line::from(Span::styled("Question", styles::highlight_style())),
            Line::from(q.question.clone()),
            Line::from(""),
            Line::from(Span::styled("Answer", styles::highlight_style())),
            match &q.answer {
                Some(answer) => Line::from(answer.clone()),
                None => Line::from(Span::styled("(not answered yet)", styles::muted_style())),
            },
        ],
        None => vec![],
    };

    let detail = Paragraph::new(content).wrap(Wrap { trim: false }).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(styles::border_style(false)),
    );
    frame.render_widget(detail, area);
}
