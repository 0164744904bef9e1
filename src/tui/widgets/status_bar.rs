use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::widgets::Paragraph;

use crate::tui::widgets::color::Palette;

const SEPARATOR: &str = " • ";
const ELLIPSIS: &str = "...";

/// Join as many hints as fit in `max_width`, ending with "..." when some are cut
pub fn fit_hints(hints: &[String], max_width: usize) -> String {
    let mut text = String::new();
    for (i, hint) in hints.iter().enumerate() {
        let extra = if i == 0 { 0 } else { SEPARATOR.chars().count() };
        let would_be = text.chars().count() + extra + hint.chars().count();
        if would_be > max_width {
            return truncate(&format!("{}{}", text, ELLIPSIS), max_width);
        }
        if i > 0 {
            text.push_str(SEPARATOR);
        }
        text.push_str(hint);
    }
    text
}

fn truncate(text: &str, max_width: usize) -> String {
    if text.chars().count() <= max_width {
        return text.to_string();
    }
    let keep = max_width.saturating_sub(ELLIPSIS.len());
    let mut out: String = text.chars().take(keep).collect();
    out.push_str(ELLIPSIS);
    out
}

pub fn render_status_bar(
    f: &mut Frame,
    area: Rect,
    message: Option<&str>,
    key_hints: &[String],
    palette: &Palette,
) {
    let width = area.width as usize;
    let paragraph = match message {
        Some(msg) => Paragraph::new(truncate(msg, width)).style(palette.highlight()),
        None => Paragraph::new(fit_hints(key_hints, width)).style(palette.base()),
    };
    f.render_widget(paragraph, area);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hints() -> Vec<String> {
        vec!["q: Quit".to_string(), "n: New".to_string(), "F1: Help".to_string()]
    }

    #[test]
    fn all_hints_fit() {
        assert_eq!(fit_hints(&hints(), 80), "q: Quit • n: New • F1: Help");
    }

    #[test]
    fn overflow_is_marked() {
        let text = fit_hints(&hints(), 20);
        assert_eq!(text, "q: Quit • n: New...");
        assert!(text.chars().count() <= 20);
    }

    #[test]
    fn long_messages_are_cut() {
        assert_eq!(truncate("Deleted item 'Produce: Potato'", 10), "Deleted...");
        assert_eq!(truncate("ok", 10), "ok");
    }
}
