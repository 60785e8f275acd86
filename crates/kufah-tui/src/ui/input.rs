//! Keyboard input handling for the TUI.
//!
//! Overlays take keys first (login, help, confirmations, forms, the
//! attendance panel), then global keys, then the current tab.

use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent};

use kufah_core::models::AttendanceStatus;

use crate::app::{
    can_add_password_char, can_add_token_char, can_add_username_char, App, AppState, EventsView, Focus, LoginFocus,
    Tab, PAGE_SCROLL_SIZE,
};

/// Move a list selection for navigation keys. Returns true if the key was handled.
fn navigate(selection: &mut usize, len: usize, code: KeyCode) -> bool {
    let max = len.saturating_sub(1);
    match code {
        KeyCode::Char('j') | KeyCode::Down => *selection = (*selection + 1).min(max),
        KeyCode::Char('k') | KeyCode::Up => *selection = selection.saturating_sub(1),
        KeyCode::PageDown => *selection = (*selection + PAGE_SCROLL_SIZE).min(max),
        KeyCode::PageUp => *selection = selection.saturating_sub(PAGE_SCROLL_SIZE),
        KeyCode::Home => *selection = 0,
        KeyCode::End => *selection = max,
        _ => return false,
    }
    true
}

/// Handle keyboard input. Returns true if the app should quit.
pub fn handle_input(app: &mut App, key: KeyEvent) -> Result<bool> {
    match app.state {
        AppState::LoggingIn => return handle_login_input(app, key),
        AppState::ShowingHelp => {
            app.state = AppState::Normal;
            return Ok(false);
        }
        AppState::ConfirmingQuit => {
            match key.code {
                KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => {
                    app.state = AppState::Quitting;
                    return Ok(true);
                }
                KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
                    app.state = AppState::Normal;
                }
                _ => {}
            }
            return Ok(false);
        }
        AppState::ConfirmingDiscard => {
            match key.code {
                KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => app.close_panel(),
                KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
                    app.state = AppState::ViewingAttendance;
                }
                _ => {}
            }
            return Ok(false);
        }
        AppState::ConfirmingDelete => {
            match key.code {
                KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => app.confirm_delete(),
                KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => app.cancel_delete(),
                _ => {}
            }
            return Ok(false);
        }
        AppState::EditingForm => {
            handle_form_input(app, key);
            return Ok(false);
        }
        AppState::ViewingAttendance => {
            handle_panel_input(app, key);
            return Ok(false);
        }
        AppState::Searching => {
            handle_search_input(app, key);
            return Ok(false);
        }
        AppState::Quitting => return Ok(true),
        AppState::Normal => {}
    }

    // Global keys
    match key.code {
        KeyCode::Char('q') => {
            app.state = AppState::ConfirmingQuit;
            return Ok(false);
        }
        KeyCode::Char('?') => {
            app.state = AppState::ShowingHelp;
            return Ok(false);
        }
        KeyCode::Char(c @ '1'..='9') => {
            app.select_tab_index(c as usize - '1' as usize);
            return Ok(false);
        }
        KeyCode::Left => {
            app.prev_tab();
            return Ok(false);
        }
        KeyCode::Right => {
            app.next_tab();
            return Ok(false);
        }
        KeyCode::Char('u') => {
            app.refresh_all_background();
            return Ok(false);
        }
        KeyCode::Char('/') if matches!(app.current_tab, Tab::Students | Tab::Goals) => {
            app.state = AppState::Searching;
            app.set_search_query(String::new());
            return Ok(false);
        }
        KeyCode::Tab => {
            app.focus = match app.focus {
                Focus::List => Focus::Detail,
                Focus::Detail => Focus::List,
            };
            if app.current_tab == Tab::Students && app.focus == Focus::Detail {
                load_selected_student_overview(app);
            }
            return Ok(false);
        }
        KeyCode::Esc if app.focus == Focus::Detail => {
            app.focus = Focus::List;
            return Ok(false);
        }
        KeyCode::Esc if !app.search_query.is_empty() => {
            app.set_search_query(String::new());
            return Ok(false);
        }
        _ => {}
    }

    match app.current_tab {
        Tab::Classes => handle_classes_input(app, key),
        Tab::Students => handle_students_input(app, key),
        Tab::Goals => handle_goals_input(app, key),
        Tab::Events => handle_events_input(app, key),
        Tab::Questions => handle_questions_input(app, key),
        Tab::Progress => {
            let len = app.student_overview.as_ref().map(|o| o.classes.len()).unwrap_or(0);
            navigate(&mut app.progress_selection, len, key.code);
        }
        Tab::CheckIn => handle_check_in_input(app, key),
    }

    Ok(false)
}

fn handle_search_input(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => {
            app.state = AppState::Normal;
            app.set_search_query(String::new());
        }
        KeyCode::Enter => {
            // Keep the query applied
            app.state = AppState::Normal;
        }
        KeyCode::Backspace => {
            let mut query = app.search_query.clone();
            query.pop();
            app.set_search_query(query);
        }
        KeyCode::Char(c) if !c.is_control() => {
            let mut query = app.search_query.clone();
            query.push(c);
            app.set_search_query(query);
        }
        _ => {}
    }
}

fn handle_login_input(app: &mut App, key: KeyEvent) -> Result<bool> {
    match key.code {
        KeyCode::Esc => {
            app.state = AppState::Quitting;
            return Ok(true);
        }
        KeyCode::Down | KeyCode::Tab => {
            app.login_focus = app.login_focus.next(app.login_mode);
        }
        KeyCode::Up | KeyCode::BackTab => {
            app.login_focus = app.login_focus.prev(app.login_mode);
        }
        KeyCode::Left | KeyCode::Right | KeyCode::Char(' ') if app.login_focus == LoginFocus::Mode => {
            app.toggle_login_mode();
        }
        KeyCode::Enter => match app.login_focus {
            LoginFocus::Button => {
                if !app.login_pending {
                    app.attempt_login();
                }
            }
            LoginFocus::Password | LoginFocus::Token => {
                if !app.login_pending {
                    app.attempt_login();
                }
            }
            focus => app.login_focus = focus.next(app.login_mode),
        },
        KeyCode::Backspace => match app.login_focus {
            LoginFocus::Username => {
                app.login_username.pop();
            }
            LoginFocus::Password => {
                app.login_password.pop();
            }
            LoginFocus::Token => {
                app.login_token.pop();
            }
            LoginFocus::Mode | LoginFocus::Button => {}
        },
        KeyCode::Char(c) => match app.login_focus {
            LoginFocus::Username => {
                if can_add_username_char(app.login_username.chars().count(), c) {
                    app.login_username.push(c);
                }
            }
            LoginFocus::Password => {
                if can_add_password_char(app.login_password.chars().count(), c) {
                    app.login_password.push(c);
                }
            }
            LoginFocus::Token => {
                if can_add_token_char(app.login_token.chars().count(), c) {
                    app.login_token.push(c);
                }
            }
            LoginFocus::Mode | LoginFocus::Button => {}
        },
        _ => {}
    }
    Ok(false)
}

fn handle_form_input(app: &mut App, key: KeyEvent) {
    if key.code == KeyCode::Esc {
        app.close_form();
        return;
    }
    if key.code == KeyCode::Enter {
        app.submit_form();
        return;
    }

    let Some(form) = app.form.as_mut() else {
        app.state = AppState::Normal;
        return;
    };
    match key.code {
        KeyCode::Tab | KeyCode::Down => form.focus_next(),
        KeyCode::BackTab | KeyCode::Up => form.focus_prev(),
        KeyCode::Backspace => form.pop_char(),
        KeyCode::Char(c) => form.push_char(c),
        _ => {}
    }
}

fn handle_panel_input(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc | KeyCode::Char('q') => app.request_close_panel(),
        KeyCode::Char('j') | KeyCode::Down => app.move_panel_selection(true),
        KeyCode::Char('k') | KeyCode::Up => app.move_panel_selection(false),
        KeyCode::Char('s') => app.save_panel(),
        KeyCode::Char(' ') => {
            let current = app.panel_view.as_ref().and_then(|view| {
                view.panel
                    .as_ref()
                    .and_then(|p| p.records().get(view.selection).map(|r| r.status))
            });
            if let Some(status) = current {
                app.set_panel_status(status.next());
            }
        }
        KeyCode::Char(c) => {
            if let Some(status) = AttendanceStatus::from_key(c) {
                app.set_panel_status(status);
            }
        }
        _ => {}
    }
}

fn handle_classes_input(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('n') => return app.open_new_class_form(),
        KeyCode::Char('e') => return app.open_edit_class_form(),
        KeyCode::Char('l') => return app.open_class_links_form(),
        KeyCode::Char('a') => return app.open_add_students_form(),
        _ => {}
    }

    match app.focus {
        Focus::List => {
            if navigate(&mut app.class_selection, app.classes.len(), key.code) {
                app.roster_selection = 0;
            } else if key.code == KeyCode::Enter {
                app.focus = Focus::Detail;
            }
        }
        Focus::Detail => {
            let len = app.selected_roster().map(|r| r.rows.len()).unwrap_or(0);
            if navigate(&mut app.roster_selection, len, key.code) {
                return;
            }
            if key.code == KeyCode::Enter {
                let target = app.selected_roster().and_then(|roster| {
                    roster.rows.get(app.roster_selection).map(|row| {
                        (
                            row.student.id,
                            row.student.full_name(),
                            roster.class.id,
                            roster.class.name.clone(),
                        )
                    })
                });
                if let Some((student_id, student_name, class_id, class_name)) = target {
                    app.open_attendance_panel(student_id, student_name, class_id, class_name);
                }
            }
        }
    }
}

fn load_selected_student_overview(app: &mut App) {
    let Some(id) = app.selected_student().map(|s| s.id) else {
        return;
    };
    let loaded = app.student_overview.as_ref().is_some_and(|o| o.student.id == id);
    if !loaded {
        app.load_student_overview(id);
    }
}

fn handle_students_input(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('n') => return app.open_new_student_form(),
        KeyCode::Char('e') => return app.open_edit_student_form(),
        KeyCode::Char('c') => return app.open_student_classes_form(),
        KeyCode::Char('i') => return app.open_import_form(),
        _ => {}
    }

    match app.focus {
        Focus::List => {
            let len = app.filtered_students().len();
            if navigate(&mut app.student_selection, len, key.code) {
                app.student_class_selection = 0;
            } else if key.code == KeyCode::Enter {
                app.focus = Focus::Detail;
                load_selected_student_overview(app);
            }
        }
        Focus::Detail => {
            let Some(student_id) = app.selected_student().map(|s| s.id) else {
                return;
            };
            let Some(overview) = app.student_overview.as_ref().filter(|o| o.student.id == student_id) else {
                return;
            };
            let len = overview.classes.len();
            let target = overview.classes.get(app.student_class_selection).map(|progress| {
                (
                    overview.student.full_name(),
                    progress.class.id,
                    progress.class.name.clone(),
                )
            });

            if navigate(&mut app.student_class_selection, len, key.code) {
                return;
            }
            if key.code == KeyCode::Enter {
                if let Some((student_name, class_id, class_name)) = target {
                    app.open_attendance_panel(student_id, student_name, class_id, class_name);
                }
            }
        }
    }
}

fn handle_goals_input(app: &mut App, key: KeyEvent) {
    let len = app.goal_board.filtered().len();
    if navigate(&mut app.goal_selection, len, key.code) {
        return;
    }

    match key.code {
        KeyCode::Char('[') => app.goal_counter = app.goal_counter.prev(),
        KeyCode::Char(']') => app.goal_counter = app.goal_counter.next(),
        KeyCode::Char('+') | KeyCode::Char('=') => app.adjust_selected_goal(1),
        KeyCode::Char('-') => app.adjust_selected_goal(-1),
        KeyCode::Char('s') | KeyCode::Enter => app.save_selected_goals(),
        KeyCode::Char('x') => app.revert_selected_goal(),
        KeyCode::Char('e') => app.open_goals_form(),
        KeyCode::Char('<') | KeyCode::Char(',') => app.shift_goal_day(-1),
        KeyCode::Char('>') | KeyCode::Char('.') => app.shift_goal_day(1),
        _ => {}
    }
}

fn handle_events_input(app: &mut App, key: KeyEvent) {
    if key.code == KeyCode::Char('v') {
        app.events_view = match app.events_view {
            EventsView::Events => EventsView::NoSchool,
            EventsView::NoSchool => EventsView::Events,
        };
        app.focus = Focus::List;
        return;
    }

    match app.events_view {
        EventsView::Events => {
            if navigate(&mut app.event_selection, app.events.len(), key.code) {
                return;
            }
            match key.code {
                KeyCode::Char('n') => app.open_new_event_form(),
                KeyCode::Char('e') => app.open_edit_event_form(),
                KeyCode::Char('d') => app.request_delete_event(),
                KeyCode::Char('f') => app.toggle_upcoming_only(),
                KeyCode::Enter => app.focus = Focus::Detail,
                _ => {}
            }
        }
        EventsView::NoSchool => {
            if navigate(&mut app.no_school_selection, app.no_school.len(), key.code) {
                return;
            }
            match key.code {
                KeyCode::Char('n') | KeyCode::Enter => app.open_no_school_form(),
                KeyCode::Char('d') => app.remove_selected_no_school(),
                KeyCode::Char('<') | KeyCode::Char(',') => app.shift_no_school_month(false),
                KeyCode::Char('>') | KeyCode::Char('.') => app.shift_no_school_month(true),
                _ => {}
            }
        }
    }
}

fn handle_questions_input(app: &mut App, key: KeyEvent) {
    match app.focus {
        Focus::List => {
            if navigate(&mut app.question_class_selection, app.classes.len(), key.code) {
                return;
            }
            if key.code == KeyCode::Enter {
                if let Some(class_id) = app.classes.get(app.question_class_selection).map(|c| c.id) {
                    app.load_questions(class_id);
                    app.focus = Focus::Detail;
                }
            }
        }
        Focus::Detail => {
            if navigate(&mut app.question_selection, app.questions.len(), key.code) {
                return;
            }
            if matches!(key.code, KeyCode::Char('a') | KeyCode::Enter) {
                app.open_answer_form();
            }
        }
    }
}

fn handle_check_in_input(app: &mut App, key: KeyEvent) {
    if navigate(&mut app.check_in_selection, app.check_in.len(), key.code) {
        return;
    }
    if let KeyCode::Char(c) = key.code {
        if let Some(status) = AttendanceStatus::from_key(c) {
            app.mark_check_in(status);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::PanelView;
    use crossterm::event::KeyModifiers;
    use kufah_core::attendance::AttendancePanel;
    use kufah_core::models::AttendanceRecord;
    use kufah_core::Config;

    fn press(app: &mut App, code: KeyCode) {
        let quit = handle_input(app, KeyEvent::new(code, KeyModifiers::NONE)).expect("input handled");
        assert!(!quit);
    }

    fn app_with_edited_panel() -> App {
        let mut app = App::new(Config::default()).expect("app should build");
        let record = AttendanceRecord {
            id: 4,
            date: "2025-02-02".to_string(),
            student_id: 1,
            class_id: 2,
            status: AttendanceStatus::Absent,
            token: None,
        };
        app.panel_view = Some(PanelView {
            student_name: "Student".to_string(),
            class_name: "Class".to_string(),
            panel: Some(AttendancePanel::from_records(1, 2, vec![record])),
            selection: 0,
            saving: false,
            error: None,
        });
        app.state = AppState::ViewingAttendance;
        app.set_panel_status(AttendanceStatus::Recording);
        app
    }

    #[test]
    fn test_discard_prompt_keys() {
        let mut app = app_with_edited_panel();
        press(&mut app, KeyCode::Esc);
        assert_eq!(app.state, AppState::ConfirmingDiscard);

        press(&mut app, KeyCode::Char('n'));
        assert_eq!(app.state, AppState::ViewingAttendance);
        assert_eq!(
            app.panel_view.as_ref().and_then(|v| v.panel.as_ref()).map(|p| p.changed_count()),
            Some(1)
        );

        press(&mut app, KeyCode::Char('q'));
        assert_eq!(app.state, AppState::ConfirmingDiscard);
        press(&mut app, KeyCode::Char('y'));
        assert_eq!(app.state, AppState::Normal);
        assert!(app.panel_view.is_none());
    }

    #[test]
    fn test_navigate_clamps() {
        let mut selection = 0;
        assert!(navigate(&mut selection, 3, KeyCode::Up));
        assert_eq!(selection, 0);
        navigate(&mut selection, 3, KeyCode::Down);
        navigate(&mut selection, 3, KeyCode::Char('j'));
        navigate(&mut selection, 3, KeyCode::Down);
        assert_eq!(selection, 2);
        navigate(&mut selection, 30, KeyCode::PageDown);
        assert_eq!(selection, 12);
        navigate(&mut selection, 30, KeyCode::Home);
        assert_eq!(selection, 0);
        assert!(!navigate(&mut selection, 30, KeyCode::Enter));
    }

    #[test]
    fn test_navigate_empty_list() {
        let mut selection = 0;
        navigate(&mut selection, 0, KeyCode::Down);
        assert_eq!(selection, 0);
        navigate(&mut selection, 0, KeyCode::End);
        assert_eq!(selection, 0);
    }
}
