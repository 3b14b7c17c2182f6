//! Keyboard input handling.

use crate::app::App;
use crate::feed::PageSource;
use crate::util::validate_url_for_open;
use crossterm::event::{KeyCode, KeyModifiers};

use super::Action;

/// Handle a key press.
pub(super) fn handle_input<S: PageSource>(
    app: &mut App<S>,
    code: KeyCode,
    modifiers: KeyModifiers,
) -> Action {
    if modifiers.contains(KeyModifiers::CONTROL) {
        match code {
            KeyCode::Char('c') => return Action::Quit,
            KeyCode::Char('d') => app.page_down(),
            KeyCode::Char('u') => app.page_up(),
            _ => {}
        }
        return Action::Continue;
    }

    match code {
        KeyCode::Char('q') | KeyCode::Esc => return Action::Quit,
        KeyCode::Char('j') | KeyCode::Down => app.select_next(),
        KeyCode::Char('k') | KeyCode::Up => app.select_previous(),
        KeyCode::Char('g') | KeyCode::Home => app.select_first(),
        KeyCode::Char('G') | KeyCode::End => app.select_last(),
        KeyCode::PageDown => app.page_down(),
        KeyCode::PageUp => app.page_up(),
        KeyCode::Char('r') => app.retry(),
        KeyCode::Char('o') | KeyCode::Enter => open_selected(app),
        _ => {}
    }

    Action::Continue
}

fn open_selected<S: PageSource>(app: &mut App<S>) {
    let Some(url) = app.selected_item().map(|item| item.url.clone()) else {
        return;
    };

    // Validate before open::that() so post links cannot launch local handlers
    match validate_url_for_open(&url) {
        Err(e) => app.set_status(e.to_string()),
        Ok(url) => match open::that(url.as_str()) {
            Ok(()) => app.set_status("Opened in browser"),
            Err(e) => {
                tracing::warn!(url = %url, error = %e, "Failed to open browser");
                app.set_status(format!("Failed to open browser: {}", e));
            }
        },
    }
}
