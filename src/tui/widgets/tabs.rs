use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::text::{Line, Span};
use ratatui::widgets::Tabs;

use crate::tui::app::Tab;
use crate::tui::widgets::color::Palette;

pub fn render_tabs(f: &mut Frame, area: Rect, current_tab: Tab, palette: &Palette) {
    let titles: Vec<Line> = Tab::ALL
        .iter()
        .map(|tab| Line::from(Span::raw(format!("  {}  ", tab.title()))))
        .collect();

    let tabs = Tabs::new(titles)
        .select(current_tab.index())
        .style(palette.base())
        .highlight_style(palette.highlight())
        .divider(" ")
        .padding("", "");

    f.render_widget(tabs, area);
}
