// Tab bar across the top of the screen.
// The Favorites tab carries a count of saved users once there are any.

use ratatui::{prelude::*, widgets::*};

use crate::app::{App, Tab};

const TABS: [Tab; 2] = [Tab::Search, Tab::Favorites];

fn tab_label(tab: Tab, active: bool, favorites: usize) -> Line<'static> {
    let text = match tab {
        Tab::Favorites if favorites > 0 => format!("{} ★{}", tab.title(), favorites),
        _ => tab.title().to_string(),
    };
    let style = if active {
        Style::default().fg(Color::Yellow).bold()
    } else {
        Style::default().fg(Color::White)
    };
    Line::styled(text, style)
}

pub fn draw_tabs(frame: &mut Frame, app: &App, area: Rect) {
    let favorites = app.favorites_view.rows().len();
    let labels = TABS
        .iter()
        .map(|&tab| tab_label(tab, tab == app.active_tab, favorites));
    let selected = TABS.iter().position(|&tab| tab == app.active_tab);

    let header = Block::new()
        .borders(Borders::BOTTOM)
        .border_style(Style::new().dark_gray())
        .title(Line::styled(" ghsearch ", Style::new().cyan().bold()));

    let bar = Tabs::new(labels)
        .block(header)
        .select(selected)
        .highlight_style(Style::new().yellow())
        .divider(" │ ");

    frame.render_widget(bar, area);
}
