use ratatui::Frame;
use ratatui::layout::{Alignment, Rect};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph};

use crate::config::KeyBindings;
use crate::tui::widgets::color::Palette;
use crate::tui::widgets::confirm::popup_area;
use crate::utils::format_key_binding_for_display;

/// (keys, description) rows for the help popup
pub fn help_rows(kb: &KeyBindings) -> Vec<(String, &'static str)> {
    let key = |binding: &str| format_key_binding_for_display(binding);
    vec![
        (format!("{}/{}/{} or Tab", key(&kb.tab_1), key(&kb.tab_2), key(&kb.tab_3)), "Switch tab"),
        (format!("{}/{} or ↑/↓", key(&kb.list_up), key(&kb.list_down)), "Move selection"),
        (key(&kb.new), "New item (Home/Stock) or task (Calendar)"),
        (key(&kb.restock), "Add again from item history"),
        (key(&kb.edit), "Edit selected item"),
        (key(&kb.delete), "Delete selected item or task"),
        (format!("{}/{}", key(&kb.increment), key(&kb.decrement)), "Change quantity (Stock)"),
        (format!("{}/{}", key(&kb.prev_month), key(&kb.next_month)), "Previous/next month"),
        ("←/→ ↑/↓".to_string(), "Move day (Calendar)"),
        (key(&kb.search), "Search calendar"),
        (key(&kb.help), "Toggle help"),
        (key(&kb.logout), "Sign out"),
        (key(&kb.quit), "Quit"),
    ]
}

pub fn render_help(f: &mut Frame, area: Rect, kb: &KeyBindings, palette: &Palette) {
    let popup = popup_area(area, 70, 70);
    f.render_widget(Clear, popup);

    let rows = help_rows(kb);
    let width = rows.iter().map(|(k, _)| k.chars().count()).max().unwrap_or(0);
    let lines: Vec<Line> = rows
        .into_iter()
        .map(|(keys, what)| {
            Line::from(vec![
                Span::styled(format!("{:<width$}  ", keys, width = width), palette.accent()),
                Span::styled(what, palette.base()),
            ])
        })
        .collect();

    let paragraph = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .title("Help")
            .title_alignment(Alignment::Center)
            .style(palette.base()),
    );
    f.render_widget(paragraph, popup);
}
