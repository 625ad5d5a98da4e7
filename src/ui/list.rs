// User list rendering.
// Shared by the Search and Favorites tabs, with loading and empty states.

use ratatui::{prelude::*, widgets::*};

use crate::state::{AvatarState, EmptyKind, ListBody, ListView, Row};

/// Render a loading indicator.
pub fn render_loading(frame: &mut Frame, area: Rect, message: &str) {
    let text = Paragraph::new(format!("⏳ {}...", message))
        .alignment(Alignment::Center)
        .style(Style::default().fg(Color::Yellow));
    frame.render_widget(text, area);
}

/// Render an empty state with a title and a hint line.
pub fn render_empty(frame: &mut Frame, area: Rect, kind: EmptyKind) {
    let lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            kind.title(),
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled(
            kind.message(),
            Style::default().fg(Color::DarkGray),
        )),
    ];
    let text = Paragraph::new(lines).alignment(Alignment::Center);
    frame.render_widget(text, area);
}

fn avatar_marker(avatar: &AvatarState) -> Span<'static> {
    match avatar {
        AvatarState::Pending => Span::styled("◌ ", Style::default().fg(Color::DarkGray)),
        AvatarState::Loaded(_) => Span::styled("● ", Style::default().fg(Color::Green)),
        AvatarState::Missing => Span::styled("○ ", Style::default().fg(Color::Red)),
    }
}

fn row_item(row: &Row) -> ListItem<'_> {
    let star = if row.favorite {
        Span::styled("★ ", Style::default().fg(Color::Yellow))
    } else {
        Span::styled("☆ ", Style::default().fg(Color::DarkGray))
    };
    ListItem::new(Line::from(vec![
        avatar_marker(&row.avatar),
        star,
        Span::styled(&row.item.login, Style::default().fg(Color::Cyan)),
    ]))
}

/// Render a list of users.
pub fn render_user_list(frame: &mut Frame, view: &mut ListView, area: Rect, title: &str) {
    let title = match &view.body {
        ListBody::Rows(rows) => format!(" {} ({}) ", title, rows.len()),
        _ => format!(" {} ", title),
    };
    let block = Block::default().borders(Borders::ALL).title(title);

    match &view.body {
        ListBody::Loading => {
            let inner = block.inner(area);
            frame.render_widget(block, area);
            render_loading(frame, inner, "Searching");
        }
        ListBody::Empty(kind) => {
            let inner = block.inner(area);
            frame.render_widget(block, area);
            render_empty(frame, inner, *kind);
        }
        ListBody::Rows(rows) => {
            let items: Vec<ListItem> = rows.iter().map(row_item).collect();
            let list_widget = List::new(items)
                .block(block)
                .highlight_style(
                    Style::default()
                        .bg(Color::DarkGray)
                        .add_modifier(Modifier::BOLD),
                )
                .highlight_symbol("> ");

            frame.render_stateful_widget(list_widget, area, &mut view.list_state);
        }
    }
}
