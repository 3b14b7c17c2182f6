//! Render functions for the TUI.
//!
//! Lays out the post list, the loading/end footer, and the status bar.

use crate::app::{App, Viewport};
use crate::feed::{project, PageSource};
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    widgets::Paragraph,
    Frame,
};

use super::{posts, status};

/// Minimum terminal dimensions required for normal operation.
pub(super) const MIN_WIDTH: u16 = 30;
pub(super) const MIN_HEIGHT: u16 = 8;

/// Braille spinner shown while a page is loading.
pub(super) const SPINNER: [&str; 10] = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

/// Main render function.
///
/// Updates `app.viewport` as a side effect so the intersection trigger can be
/// synced against what was actually drawn.
pub(super) fn render<S: PageSource>(f: &mut Frame, app: &mut App<S>) {
    let area = f.area();

    if area.width < MIN_WIDTH || area.height < MIN_HEIGHT {
        // No cards drawn, so none can be in view.
        app.viewport = Viewport::default();
    }

    if area.width < 1 || area.height < 1 {
        return;
    }

    if area.width < MIN_WIDTH || area.height < MIN_HEIGHT {
        let msg = if area.height < 3 || area.width < 20 {
            Paragraph::new("Too small")
        } else {
            Paragraph::new(format!(
                "Terminal too small\n\nMinimum: {}x{}\nCurrent: {}x{}",
                MIN_WIDTH, MIN_HEIGHT, area.width, area.height
            ))
            .alignment(Alignment::Center)
        };
        f.render_widget(msg, area);
        return;
    }

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(0),
            Constraint::Length(1),
            Constraint::Length(1),
        ])
        .split(area);

    posts::render(f, app, chunks[0]);
    render_footer(f, app, chunks[1]);
    status::render(f, app, chunks[2]);
}

/// Loading indicator or end-of-feed message below the list.
fn render_footer<S: PageSource>(f: &mut Frame, app: &App<S>, area: Rect) {
    let view = project(app.controller.current_state());

    let footer = if view.show_loading {
        Paragraph::new(format!(
            "{} Loading posts...",
            SPINNER[app.spinner_frame % SPINNER.len()]
        ))
        .style(Style::default().fg(Color::Cyan))
    } else if view.show_end {
        Paragraph::new("No more posts to load.")
            .style(Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC))
    } else {
        return;
    };

    f.render_widget(footer.alignment(Alignment::Center), area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feed::{FeedController, FetchError, Item, Page};
    use ratatui::backend::TestBackend;
    use ratatui::Terminal;
    use std::sync::Arc;

    struct OpenFeed;

    impl PageSource for OpenFeed {
        async fn fetch_page(&self, _cursor: &str, _limit: u32) -> Result<Page, FetchError> {
            Ok(Page {
                items: ["u1", "u2"]
                    .iter()
                    .map(|u| Item {
                        title: u.to_string(),
                        description: "d".into(),
                        url: u.to_string(),
                    })
                    .collect(),
                after: Some("c2".into()),
            })
        }
    }

    async fn loaded_app() -> App<OpenFeed> {
        let mut app = App::new(FeedController::new(Arc::new(OpenFeed), 10), "r/test");
        app.start();
        app.controller.settle().await;
        app.on_feed_update();
        app
    }

    #[tokio::test]
    async fn test_full_draw_records_viewport() {
        let mut app = loaded_app().await;
        let mut terminal = Terminal::new(TestBackend::new(80, 24)).unwrap();
        terminal.draw(|f| render(f, &mut app)).unwrap();

        assert!(app.viewport.contains(1));
    }

    #[tokio::test]
    async fn test_too_small_terminal_hides_cards_from_trigger() {
        let mut app = loaded_app().await;

        let mut terminal = Terminal::new(TestBackend::new(80, 24)).unwrap();
        terminal.draw(|f| render(f, &mut app)).unwrap();

        let mut small = Terminal::new(TestBackend::new(20, 5)).unwrap();
        small.draw(|f| render(f, &mut app)).unwrap();

        assert_eq!(app.viewport, Viewport::default());
        assert!(!app.sync_trigger());
        assert!(!app.controller.is_fetching());
    }
}
