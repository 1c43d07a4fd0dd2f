//! Keyboard input handling for the dashboard.
//!
//! Translates key events into application state changes. Anything that
//! talks to the backend is spawned by `App`, so no handler blocks a frame.

use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent};

use optica_core::models::AppointmentStatus;

use crate::app::{
    can_add_password_char, can_add_username_char, next_status, App, AppState, LoginFocus, Tab,
    PAGE_SCROLL_SIZE,
};

/// Returns `Ok(true)` when the dashboard should exit.
pub async fn handle_input(app: &mut App, key: KeyEvent) -> Result<bool> {
    match app.state {
        AppState::LoggingIn => return handle_login_input(app, key).await,
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
        AppState::Quitting => return Ok(true),
        AppState::Normal => {}
    }

    match key.code {
        KeyCode::Char('q') | KeyCode::Esc => app.state = AppState::ConfirmingQuit,
        KeyCode::Char('?') => app.state = AppState::ShowingHelp,

        KeyCode::Char('1') => app.current_tab = Tab::Products,
        KeyCode::Char('2') => app.current_tab = Tab::Appointments,
        KeyCode::Char('3') => app.current_tab = Tab::Store,
        KeyCode::Tab | KeyCode::Right => app.current_tab = app.current_tab.next(),
        KeyCode::BackTab | KeyCode::Left => app.current_tab = app.current_tab.prev(),

        KeyCode::Down | KeyCode::Char('j') => app.move_selection(1),
        KeyCode::Up | KeyCode::Char('k') => app.move_selection(-1),
        KeyCode::PageDown => app.move_selection(PAGE_SCROLL_SIZE as isize),
        KeyCode::PageUp => app.move_selection(-(PAGE_SCROLL_SIZE as isize)),
        KeyCode::Home => app.move_selection(isize::MIN),
        KeyCode::End => app.move_selection(isize::MAX),

        KeyCode::Char('r') => app.refresh_all_background(),
        KeyCode::Char('c') => app.reconnect_background(),
        KeyCode::Char('l') => app.start_login(),

        KeyCode::Char('s') if app.current_tab == Tab::Appointments => {
            if let Some(status) = app.selected_appointment().map(|a| next_status(a.status)) {
                app.set_selected_status(status);
            }
        }
        KeyCode::Char('x') if app.current_tab == Tab::Appointments => {
            app.set_selected_status(AppointmentStatus::Cancelled);
        }
        _ => {}
    }

    Ok(false)
}

async fn handle_login_input(app: &mut App, key: KeyEvent) -> Result<bool> {
    match key.code {
        KeyCode::Esc => {
            // Browse without logging in; public data and the snapshot still work
            app.state = AppState::Normal;
            app.login_error = None;
            app.login_password.clear();
            if app.products.is_empty() {
                app.refresh_all_background();
            }
        }
        KeyCode::Tab | KeyCode::BackTab | KeyCode::Down | KeyCode::Up => {
            app.login_focus = match app.login_focus {
                LoginFocus::Username => LoginFocus::Password,
                LoginFocus::Password => LoginFocus::Username,
            };
        }
        KeyCode::Enter => match app.login_focus {
            LoginFocus::Username => app.login_focus = LoginFocus::Password,
            LoginFocus::Password => app.attempt_login(),
        },
        KeyCode::Backspace => match app.login_focus {
            LoginFocus::Username => {
                app.login_username.pop();
            }
            LoginFocus::Password => {
                app.login_password.pop();
            }
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
        },
        _ => {}
    }
    Ok(false)
}
