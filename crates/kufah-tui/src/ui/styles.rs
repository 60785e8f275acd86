use ratatui::style::{Color, Modifier, Style};

use kufah_core::models::AttendanceStatus;

// Color palette
pub const PRIMARY: Color = Color::Rgb(46, 125, 110);
pub const SECONDARY: Color = Color::Rgb(96, 160, 96);
pub const ACCENT: Color = Color::Rgb(204, 164, 72);
pub const ERROR: Color = Color::Rgb(192, 64, 64);
pub const MUTED: Color = Color::Rgb(128, 128, 128);
pub const HIGHLIGHT: Color = Color::Rgb(40, 52, 56);
pub const STATUS_BAR_BG: Color = Color::Rgb(28, 34, 36);

// Styles
pub fn title_style() -> Style {
    Style::default().fg(PRIMARY).add_modifier(Modifier::BOLD)
}

pub fn selected_style() -> Style {
    Style::default().bg(HIGHLIGHT).add_modifier(Modifier::BOLD)
}

pub fn list_item_style() -> Style {
    Style::default().fg(Color::White)
}

pub fn muted_style() -> Style {
    Style::default().fg(MUTED)
}

pub fn highlight_style() -> Style {
    Style::default().fg(ACCENT)
}

pub fn success_style() -> Style {
    Style::default().fg(SECONDARY)
}

pub fn error_style() -> Style {
    Style::default().fg(ERROR)
}

/// Rows with edits that have not been saved yet
pub fn changed_style() -> Style {
    Style::default().fg(ACCENT).add_modifier(Modifier::ITALIC)
}

pub fn tab_style(selected: bool) -> Style {
    if selected {
        Style::default()
            .fg(PRIMARY)
            .add_modifier(Modifier::BOLD | Modifier::UNDERLINED)
    } else {
        Style::default().fg(Color::White)
    }
}

pub fn border_style(focused: bool) -> Style {
    if focused {
        Style::default().fg(PRIMARY)
    } else {
        Style::default().fg(MUTED)
    }
}

pub fn input_style(focused: bool) -> Style {
    if focused {
        Style::default().fg(Color::White).bg(HIGHLIGHT)
    } else {
        Style::default().fg(Color::White)
    }
}

pub fn status_bar_style() -> Style {
    Style::default().fg(Color::White).bg(STATUS_BAR_BG)
}

pub fn help_key_style() -> Style {
    Style::default().fg(ACCENT).add_modifier(Modifier::BOLD)
}

pub fn help_desc_style() -> Style {
    Style::default().fg(Color::White)
}

pub fn status_color(status: AttendanceStatus) -> Style {
    match status {
        AttendanceStatus::InPerson => Style::default().fg(SECONDARY),
        AttendanceStatus::Online => Style::default().fg(PRIMARY),
        AttendanceStatus::Recording => Style::default().fg(ACCENT),
        AttendanceStatus::Absent => Style::default().fg(ERROR),
    }
}

/// Color an attendance percentage: green at 80+, amber at 50+, red below
pub fn percentage_style(percent: u32) -> Style {
    match percent {
        80.. => Style::default().fg(SECONDARY),
        50..=79 => Style::default().fg(ACCENT),
        _ => Style::default().fg(ERROR),
    }
}
