use ratatui::Frame;
use ratatui::layout::{Alignment, Constraint, Flex, Layout, Rect};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};

use crate::tui::app::ConfirmTarget;
use crate::tui::widgets::color::Palette;

pub fn render_confirm(f: &mut Frame, area: Rect, target: &ConfirmTarget, selection: usize, palette: &Palette) {
    let popup_area = popup_area(area, 50, 35);
    f.render_widget(Clear, popup_area);

    let mut lines = vec![
        Line::from(Span::styled(target.question(), palette.base())),
        Line::from(""),
        Line::from(Span::styled(target.label().to_string(), palette.accent())),
        Line::from(""),
    ];

    for (index, option) in [target.action(), "Cancel"].iter().enumerate() {
        let selected = index == selection;
        let prefix = if selected { "> " } else { "  " };
        let style = if selected { palette.highlight() } else { palette.base() };
        lines.push(Line::from(Span::styled(format!("{}{}", prefix, option), style)));
    }

    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        "↑↓ to choose, Enter to confirm, Esc to cancel",
        palette.base(),
    )));

    let paragraph = Paragraph::new(lines)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(format!("Confirm {}", target.action()))
                .title_alignment(Alignment::Center)
                .style(palette.base()),
        )
        .style(palette.base())
        .wrap(Wrap { trim: true })
        .alignment(Alignment::Center);

    f.render_widget(paragraph, popup_area);
}

/// Centered rect taking the given percentages of `area`
pub fn popup_area(area: Rect, percent_x: u16, percent_y: u16) -> Rect {
    let vertical = Layout::vertical([Constraint::Percentage(percent_y)]).flex(Flex::Center);
    let horizontal = Layout::horizontal([Constraint::Percentage(percent_x)]).flex(Flex::Center);
    let [area] = vertical.areas(area);
    let [area] = horizontal.areas(area);
    area
}
