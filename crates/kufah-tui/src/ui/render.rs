use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};

use crate::app::{App, AppState, LoginFocus, LoginMode, Role, Tab};
use crate::ui::styles;
use crate::ui::tabs;

const TITLE: &str = "Kufah Attendance";

pub fn render(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),  // Title bar
            Constraint::Length(3),  // Tabs
            Constraint::Min(10),    // Content
            Constraint::Length(2),  // Status bar
        ])
        .split(frame.area());

    render_title_bar(frame, app, chunks[0]);
    render_tabs(frame, app, chunks[1]);
    if app.role.is_some() {
        render_content(frame, app, chunks[2]);
    }
    render_status_bar(frame, app, chunks[3]);

    match app.state {
        AppState::ShowingHelp => render_help_overlay(frame, app),
        AppState::LoggingIn => render_login_overlay(frame, app),
        AppState::ConfirmingQuit => render_confirm_overlay(
            frame,
            " Quit ",
            "Are you sure you want to quit?",
            "[Y]es    [N]o",
        ),
        AppState::EditingForm => tabs::form::render(frame, app),
        AppState::ViewingAttendance => tabs::panel::render(frame, app),
        AppState::ConfirmingDiscard => {
            tabs::panel::render(frame, app);
            render_confirm_overlay(
                frame,
                " Unsaved Changes ",
                kufah_core::attendance::panel::DISCARD_PROMPT,
                "[Y]es, discard    [N]o, keep editing",
            );
        }
        AppState::ConfirmingDelete => render_confirm_overlay(
            frame,
            " Delete Event ",
            "Delete this event? This cannot be undone.",
            "[Y]es    [N]o",
        ),
        _ => {}
    }
}

fn render_title_bar(frame: &mut Frame, app: &App, area: Rect) {
    let who = match &app.role {
        Some(Role::Teacher) => "Teacher".to_string(),
        Some(Role::Student { .. }) => app
            .student_overview
            .as_ref()
            .map(|o| o.student.full_name())
            .unwrap_or_else(|| "Student".to_string()),
        None => "Not signed in".to_string(),
    };

    let help_hint = "[?] Help";
    let used = TITLE.len() + who.chars().count() + help_hint.len() + 6;
    let padding = " ".repeat((area.width as usize).saturating_sub(used));

    let title = Line::from(vec![
        Span::styled(format!(" {}", TITLE), styles::title_style()),
        Span::styled(format!("  {}", who), styles::highlight_style()),
        Span::raw(padding),
        Span::styled(help_hint, styles::muted_style()),
    ]);

    let block = Block::default()
        .borders(Borders::BOTTOM)
        .border_style(styles::muted_style());

    frame.render_widget(Paragraph::new(title).block(block), area);
}

fn render_tabs(frame: &mut Frame, app: &App, area: Rect) {
    if app.role.is_none() {
        return;
    }

    let mut spans = vec![Span::raw(" ")];
    for (i, tab) in app.tabs().iter().enumerate() {
        if i > 0 {
            spans.push(Span::styled(" | ", styles::muted_style()));
        }
        let style = styles::tab_style(*tab == app.current_tab);
        spans.push(Span::styled(format!("[{}] {}", i + 1, tab.title()), style));
    }

    let block = Block::default()
        .borders(Borders::BOTTOM)
        .border_style(styles::muted_style());

    frame.render_widget(Paragraph::new(Line::from(spans)).block(block), area);
}

fn render_content(frame: &mut Frame, app: &App, area: Rect) {
    match app.current_tab {
        Tab::Classes => tabs::classes::render(frame, app, area),
        Tab::Students => tabs::students::render(frame, app, area),
        Tab::Goals => tabs::goals::render(frame, app, area),
        Tab::Events => tabs::events::render(frame, app, area),
        Tab::Questions => tabs::questions::render(frame, app, area),
        Tab::Progress => tabs::progress::render(frame, app, area),
        Tab::CheckIn => tabs::checkin::render(frame, app, area),
    }
}

fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let left = if app.state == AppState::Searching {
        format!(" Search: {}▌", app.search_query)
    } else if let Some(msg) = &app.status_message {
        format!(" {}", msg)
    } else if let Some(updated) = app.last_updated {
        format!(" Updated {}", updated.format("%H:%M"))
    } else {
        String::new()
    };

    let right = if app.role.is_some() { "[u]pdate | [q]uit " } else { "" };
    let padding = (area.width as usize).saturating_sub(left.chars().count() + right.len());

    let line = Line::from(vec![
        Span::raw(left),
        Span::raw(" ".repeat(padding)),
        Span::styled(right, styles::muted_style()),
    ]);

    frame.render_widget(Paragraph::new(line).style(styles::status_bar_style()), area);
}

fn help_line(key: &'static str, desc: &'static str) -> Line<'static> {
    Line::from(vec![
        Span::styled(format!("  {:<10}", key), styles::help_key_style()),
        Span::styled(desc, styles::help_desc_style()),
    ])
}

fn render_help_overlay(frame: &mut Frame, app: &App) {
    let mut lines = vec![
        Line::from(Span::styled(format!(" {}", TITLE), styles::title_style())),
        Line::from(Span::styled(
            format!(" version {}", env!("CARGO_PKG_VERSION")),
            styles::muted_style(),
        )),
        Line::from(""),
        Line::from(Span::styled(" Navigation", styles::highlight_style())),
        help_line("1-9", "Switch tabs"),
        help_line("←/→", "Prev/next tab"),
        help_line("Tab", "Switch focus (list ↔ detail)"),
        help_line("↑/↓", "Navigate list"),
        help_line("Esc", "Go back"),
        Line::from(""),
        Line::from(Span::styled(" Actions", styles::highlight_style())),
        help_line("u", "Refresh data"),
        help_line("q", "Quit"),
    ];

    match &app.role {
        Some(Role::Teacher) => {
            lines.push(help_line("/", "Search students"));
            lines.push(Line::from(""));
            lines.push(Line::from(Span::styled(" Classes / Students", styles::highlight_style())));
            lines.push(help_line("n / e", "New / edit"));
            lines.push(help_line("l", "Class Zoom and recordings links"));
            lines.push(help_line("a", "Add students to class"));
            lines.push(help_line("c / i", "Student classes / import CSV"));
            lines.push(help_line("Enter", "Open attendance for a student"));
            lines.push(Line::from(""));
            lines.push(Line::from(Span::styled(" Attendance Panel", styles::highlight_style())));
            lines.push(help_line("i o r a", "In person / online / recording / absent"));
            lines.push(help_line("Space", "Cycle status"));
            lines.push(help_line("s", "Save changes"));
            lines.push(Line::from(""));
            lines.push(Line::from(Span::styled(" Goals / Events", styles::highlight_style())));
            lines.push(help_line("[ ]  + -", "Pick counter, adjust goal"));
            lines.push(help_line("s  x", "Save / revert row"));
            lines.push(help_line("< >", "Previous / next day or month"));
            lines.push(help_line("d f v", "Delete, upcoming filter, no-school"));
        }
        Some(Role::Student { .. }) => {
            lines.push(Line::from(""));
            lines.push(Line::from(Span::styled(" Check In", styles::highlight_style())));
            lines.push(help_line("i o r a", "Mark in person / online / recording / absent"));
        }
        None => {}
    }

    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(" Press any key to close", styles::muted_style())));

    let height = (lines.len() as u16 + 2).min(frame.area().height);
    let area = centered_rect_fixed(56, height, frame.area());
    frame.render_widget(Clear, area);

    let help = Paragraph::new(lines).block(
        Block::default()
            .title(" Help ")
            .title_style(styles::title_style())
            .borders(Borders::ALL)
            .border_style(styles::border_style(true)),
    );
    frame.render_widget(help, area);
}

fn input_field<'a>(label: &'a str, value: String, focused: bool) -> Line<'a> {
    let cursor = if focused { "▌" } else { "" };
    let style = if focused {
        styles::selected_style()
    } else {
        styles::list_item_style()
    };
    Line::from(vec![
        Span::raw("  "),
        Span::styled(label, styles::muted_style()),
        Span::styled(" [", styles::muted_style()),
        Span::styled(format!("{:<24}{}", value, cursor), style),
        Span::styled("]", styles::muted_style()),
    ])
}

fn render_login_overlay(frame: &mut Frame, app: &App) {
    let mut lines = vec![
        Line::from(Span::styled(format!("  {}", TITLE), styles::title_style())),
        Line::from(""),
    ];

    let mode_focused = app.login_focus == LoginFocus::Mode;
    let mode_span = |mode: LoginMode, label: &'static str| {
        let style = if app.login_mode == mode {
            styles::tab_style(true)
        } else {
            styles::muted_style()
        };
        Span::styled(label, style)
    };
    lines.push(Line::from(vec![
        Span::styled(if mode_focused { "▶ " } else { "  " }, styles::highlight_style()),
        Span::styled("Sign in as: ", styles::muted_style()),
        mode_span(LoginMode::Teacher, "Teacher"),
        Span::styled(" / ", styles::muted_style()),
        mode_span(LoginMode::Student, "Student"),
    ]));
    lines.push(Line::from(""));

    match app.login_mode {
        LoginMode::Teacher => {
            lines.push(input_field(
                "Username:",
                app.login_username.chars().take(24).collect(),
                app.login_focus == LoginFocus::Username,
            ));
            lines.push(input_field(
                "Password:",
                "*".repeat(app.login_password.chars().count().min(24)),
                app.login_focus == LoginFocus::Password,
            ));
        }
        LoginMode::Student => {
            let token: String = app.login_token.chars().rev().take(24).collect::<Vec<_>>().into_iter().rev().collect();
            lines.push(input_field(
                "Link/token:",
                token,
                app.login_focus == LoginFocus::Token,
            ));
            lines.push(Line::from(Span::styled(
                "  Paste the personal link from your email",
                styles::muted_style(),
            )));
        }
    }
    lines.push(Line::from(""));

    let button_style = if app.login_focus == LoginFocus::Button {
        styles::selected_style()
    } else {
        styles::list_item_style()
    };
    let button = if app.login_pending { "[ Checking... ]" } else { "[ ▶ Sign in ◀ ]" };
    lines.push(Line::from(Span::styled(button, button_style)).alignment(Alignment::Center));

    if let Some(error) = &app.login_error {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(format!("  {}", error), styles::error_style())));
    }

    let height = lines.len() as u16 + 2;
    let area = centered_rect_fixed(52, height, frame.area());
    frame.render_widget(Clear, area);

    let login = Paragraph::new(lines).wrap(Wrap { trim: false }).block(
        Block::default()
            .title(" Sign In ")
            .title_style(styles::title_style())
            .borders(Borders::ALL)
            .border_style(styles::border_style(true)),
    );
    frame.render_widget(login, area);
}

fn render_confirm_overlay(frame: &mut Frame, title: &str, message: &str, choices: &str) {
    let width = (message.chars().count().max(choices.chars().count()) as u16 + 6).max(36);
    let area = centered_rect_fixed(width, 6, frame.area());
    frame.render_widget(Clear, area);

    let text = vec![
        Line::from(""),
        Line::from(Span::styled(message.to_string(), styles::list_item_style())),
        Line::from(""),
        Line::from(Span::styled(choices.to_string(), styles::help_key_style())),
    ];

    let dialog = Paragraph::new(text).alignment(Alignment::Center).block(
        Block::default()
            .title(title.to_string())
            .title_style(styles::title_style())
            .borders(Borders::ALL)
            .border_style(styles::border_style(true)),
    );
    frame.render_widget(dialog, area);
}

/// A rect of fixed size centered in `r`, clipped to `r`.
pub fn centered_rect_fixed(width: u16, height: u16, r: Rect) -> Rect {
    let width = width.min(r.width);
    let height = height.min(r.height);
    Rect {
        x: r.x + (r.width - width) / 2,
        y: r.y + (r.height - height) / 2,
        width,
        height,
    }
}
