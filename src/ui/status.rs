use crate::app::App;
use crate::feed::PageSource;
use ratatui::{
    layout::Rect,
    style::{Color, Style},
    widgets::Paragraph,
    Frame,
};
use std::borrow::Cow;

const KEY_HINTS: &str = "[j/k]move [g/G]top/bottom [o]pen [r]etry [q]uit";

/// Render the status bar
pub fn render<S: PageSource>(f: &mut Frame, app: &App<S>, area: Rect) {
    if area.width < 1 || area.height < 1 {
        return;
    }

    let text: Cow<'_, str> = match &app.status_message {
        Some((msg, _)) => Cow::Borrowed(msg.as_ref()),
        None => Cow::Borrowed(KEY_HINTS),
    };

    let style = Style::default().bg(Color::DarkGray).fg(Color::White);
    f.render_widget(Paragraph::new(text).style(style), area);
}
