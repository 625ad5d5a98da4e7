// UI module for rendering the TUI.
// Contains widgets for tabs, the search input, user lists and popups.

mod list;
mod modal;
mod tabs;

use ratatui::{prelude::*, widgets::*};

use crate::app::{App, Focus, Tab};

/// Main draw function that renders the entire UI.
pub fn draw(frame: &mut Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Tab bar
            Constraint::Length(3), // Search input
            Constraint::Min(1),    // Main content
            Constraint::Length(1), // Status bar
        ])
        .split(frame.area());

    tabs::draw_tabs(frame, app, chunks[0]);

    match app.active_tab {
        Tab::Search => {
            draw_search_input(frame, app, chunks[1]);
            list::render_user_list(frame, &mut app.search_view, chunks[2], "Users");
        }
        Tab::Favorites => {
            let block = Block::default()
                .borders(Borders::BOTTOM)
                .border_style(Style::default().fg(Color::DarkGray));
            frame.render_widget(block, chunks[1]);
            list::render_user_list(frame, &mut app.favorites_view, chunks[2], "Favorites");
        }
    }

    draw_status_bar(frame, app, chunks[3]);

    // Overlays, topmost last
    if let Some(detail) = &app.detail_view {
        modal::draw_detail_modal(frame, detail);
    }
    if app.show_help {
        draw_help_overlay(frame);
    }
    if let Some(alert) = &app.error {
        modal::draw_error_modal(frame, alert);
    }
}

/// Draw the search input line with its cancel hint.
fn draw_search_input(frame: &mut Frame, app: &App, area: Rect) {
    let focused = app.focus == Focus::Input;
    let border = if focused { Color::Cyan } else { Color::DarkGray };

    let mut spans = vec![
        Span::styled("🔍 ", Style::default().fg(Color::DarkGray)),
        Span::raw(app.input.as_str()),
    ];
    if focused {
        spans.push(Span::styled("█", Style::default().fg(Color::Yellow)));
    }

    let mut block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border))
        .title(" Search ");
    if app.show_cancel {
        block = block.title(
            Line::from(Span::styled(" Esc ✕ ", Style::default().fg(Color::Red))).right_aligned(),
        );
    }

    frame.render_widget(Paragraph::new(Line::from(spans)).block(block), area);
}

/// Draw the status bar with keybinding hints and rate limit.
fn draw_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let typing = app.active_tab == Tab::Search && app.focus == Focus::Input;

    let bindings: &[(&str, &str)] = if app.detail_view.is_some() {
        &[("f", "Favorite"), ("Esc", "Close")]
    } else if typing {
        &[
            ("↵", "Search"),
            ("↓", "Results"),
            ("Esc", "Clear"),
            ("Tab", "Switch"),
            ("^C", "Quit"),
        ]
    } else {
        &[
            ("↑↓", "Navigate"),
            ("↵", "Open"),
            ("f", "Favorite"),
            ("Tab", "Switch"),
            ("?", "Help"),
            ("q", "Quit"),
        ]
    };
    let mut hints: Vec<Span> = bindings
        .iter()
        .flat_map(|(key, action)| {
            [
                Span::raw(format!(" {} ", key)),
                Span::styled(format!("{} ", action), Style::default().fg(Color::DarkGray)),
            ]
        })
        .collect();

    // Rate limit is unknown until the first API response.
    let rate = app.rate_limit();
    if rate.limit > 0 {
        let rate_color = if rate.remaining == 0 {
            Color::Red
        } else if rate.remaining * 10 < rate.limit {
            Color::Yellow
        } else {
            Color::DarkGray
        };
        hints.push(Span::styled(
            format!("  API: {}/{}", rate.remaining, rate.limit),
            Style::default().fg(rate_color),
        ));
    }

    frame.render_widget(Paragraph::new(Line::from(hints)), area);
}

const HELP_KEYS: &[(&str, &str)] = &[
    ("type", "Search as you type"),
    ("Enter", "Search now / open user"),
    ("↑/↓ or j/k", "Navigate list"),
    ("f", "Toggle favorite"),
    ("o", "Open user detail"),
    ("/ or Esc", "Back to search input"),
    ("Tab", "Switch tabs"),
    ("?", "Show/hide this help"),
    ("q or ^C", "Quit"),
];

/// Draw the help overlay.
fn draw_help_overlay(frame: &mut Frame) {
    let area = frame.area();
    let width = 50.min(area.width);
    let height = (HELP_KEYS.len() as u16 + 6).min(area.height);
    let popup_area = Rect::new(
        (area.width.saturating_sub(width)) / 2,
        (area.height.saturating_sub(height)) / 2,
        width,
        height,
    );
    frame.render_widget(Clear, popup_area);

    let dim = Style::default().fg(Color::DarkGray);
    let mut lines = vec![
        Line::from(Span::styled(
            "Keyboard Shortcuts",
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
    ];
    lines.extend(HELP_KEYS.iter().map(|(keys, action)| {
        Line::from(vec![
            Span::styled(format!("  {:<14}", keys), Style::default().fg(Color::Cyan)),
            Span::raw(*action),
        ])
    }));
    lines.push(Line::from(""));
    lines.push(Line::from(vec![
        Span::styled("Press ", dim),
        Span::styled("Esc", Style::default().fg(Color::Yellow)),
        Span::styled(" or ", dim),
        Span::styled("?", Style::default().fg(Color::Yellow)),
        Span::styled(" to close", dim),
    ]));

    let popup = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan))
            .title(" Help ")
            .title_style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)),
    );
    frame.render_widget(popup, popup_area);
}
