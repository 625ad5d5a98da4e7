// Modal UI components.
// Error alert and user detail popups drawn over the current view.

use ratatui::{prelude::*, widgets::*};

use crate::app::ErrorAlert;
use crate::state::{AvatarState, DetailView};

/// Centered rect of at most `width` x `height` inside `area`.
fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    let x = area.x + (area.width.saturating_sub(width)) / 2;
    let y = area.y + (area.height.saturating_sub(height)) / 2;
    Rect::new(x, y, width, height)
}

/// Draw an error alert with a dismiss hint.
pub fn draw_error_modal(frame: &mut Frame, alert: &ErrorAlert) {
    let modal_area = centered(frame.area(), 56, 7);
    frame.render_widget(Clear, modal_area);

    let text = vec![
        Line::from(""),
        Line::from(Span::raw(alert.message.as_str())),
        Line::from(""),
        Line::from(vec![
            Span::styled("Enter", Style::default().fg(Color::Yellow)),
            Span::styled(" = OK", Style::default().fg(Color::DarkGray)),
        ]),
    ];

    let widget = Paragraph::new(text)
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true })
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Red))
                .title(format!(" {} ", alert.title))
                .title_style(Style::default().fg(Color::Red).add_modifier(Modifier::BOLD)),
        );
    frame.render_widget(widget, modal_area);
}

/// Draw the detail popup for one user.
pub fn draw_detail_modal(frame: &mut Frame, view: &DetailView) {
    let modal_area = centered(frame.area(), 60, 11);
    frame.render_widget(Clear, modal_area);

    let label = Style::default().fg(Color::DarkGray);
    let favorite = if view.favorite {
        Span::styled("★ Favorite", Style::default().fg(Color::Yellow))
    } else {
        Span::styled("☆ Not a favorite", label)
    };
    let avatar = match (&view.avatar, view.avatar.dimensions()) {
        (AvatarState::Loaded(bytes), Some((w, h))) => {
            format!("{}x{} ({:.1} KB)", w, h, bytes.len() as f64 / 1024.0)
        }
        (AvatarState::Pending, _) => "loading...".to_string(),
        _ => "unavailable".to_string(),
    };

    let mut lines = vec![Line::from(vec![
        Span::styled("Login:   ", label),
        Span::styled(
            view.item.login.as_str(),
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        ),
    ])];

    match &view.detail {
        Some(detail) => {
            lines.push(Line::from(vec![
                Span::styled("Name:    ", label),
                Span::raw(detail.display_name.as_deref().unwrap_or("-")),
            ]));
            lines.push(Line::from(vec![
                Span::styled("Profile: ", label),
                Span::raw(detail.profile_url.as_str()),
            ]));
        }
        None if view.loading => lines.push(Line::from(Span::styled(
            "⏳ Loading profile...",
            Style::default().fg(Color::Yellow),
        ))),
        None => lines.push(Line::from(Span::styled("Profile unavailable", label))),
    }

    lines.push(Line::from(vec![Span::styled("Avatar:  ", label), Span::raw(avatar)]));
    lines.push(Line::from(""));
    lines.push(Line::from(favorite));
    lines.push(Line::from(""));
    lines.push(Line::from(vec![
        Span::styled(" f", Style::default().fg(Color::Yellow)),
        Span::styled(" = Toggle favorite  ", label),
        Span::styled("Esc", Style::default().fg(Color::Yellow)),
        Span::styled(" = Close ", label),
    ]));

    let widget = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan))
            .title(" User ")
            .title_style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)),
    );
    frame.render_widget(widget, modal_area);
}
