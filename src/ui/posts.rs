use crate::app::{App, Viewport};
use crate::feed::{project, PageSource, Row};
use crate::util::{preview, strip_control_chars, truncate_to_width};
use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, List, ListItem},
    Frame,
};

/// Lines per card: title, description preview, spacer.
pub(super) const CARD_HEIGHT: u16 = 3;

const HIGHLIGHT_SYMBOL: &str = "▌ ";

fn card(row: &Row<'_>, width: usize) -> ListItem<'static> {
    let title = truncate_to_width(&strip_control_chars(row.title), width).into_owned();
    let description = truncate_to_width(&preview(row.description), width).into_owned();

    ListItem::new(Text::from(vec![
        Line::from(Span::styled(
            title,
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled(description, Style::default().fg(Color::Gray))),
        Line::from(""),
    ]))
}

/// Render the post list and record which cards ended up on screen.
pub fn render<S: PageSource>(f: &mut Frame, app: &mut App<S>, area: Rect) {
    let view = project(app.controller.current_state());

    // Borders plus the highlight gutter.
    let width = area.width.saturating_sub(2 + HIGHLIGHT_SYMBOL.chars().count() as u16) as usize;

    let items: Vec<ListItem> = if view.rows.is_empty() {
        let placeholder = if view.show_loading {
            "Loading posts..."
        } else if view.show_end {
            "No posts."
        } else {
            "No posts loaded. Press r to retry."
        };
        vec![ListItem::new(placeholder)]
    } else {
        view.rows.iter().map(|row| card(row, width)).collect()
    };

    let title = format!("{} ({} posts)", app.feed_label, view.rows.len());

    let list = List::new(items)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Cyan))
                .title(title),
        )
        .highlight_style(Style::default().bg(Color::DarkGray))
        .highlight_symbol(HIGHLIGHT_SYMBOL);

    f.render_stateful_widget(list, area, &mut app.list_state);

    let visible_cards = (area.height.saturating_sub(2) / CARD_HEIGHT).max(1) as usize;
    app.viewport = Viewport {
        first: app.list_state.offset(),
        len: visible_cards,
    };
}
