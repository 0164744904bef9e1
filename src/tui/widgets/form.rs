use ratatui::Frame;
use ratatui::layout::{Alignment, Position, Rect};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};

use crate::tui::app::{Form, FormKind};
use crate::tui::widgets::color::Palette;
use crate::tui::widgets::confirm::popup_area;

const LABEL_WIDTH: usize = 10;

/// Text shown for a field value; passwords are masked
pub fn display_value(value: &str, masked: bool) -> String {
    if masked {
        "*".repeat(value.chars().count())
    } else {
        value.to_string()
    }
}

pub fn render_form(f: &mut Frame, area: Rect, form: &Form, palette: &Palette) {
    let popup = popup_area(area, 60, 60);
    f.render_widget(Clear, popup);

    let mut lines = Vec::new();
    let mut cursor = None;
    for (index, field) in form.fields.iter().enumerate() {
        let focused = index == form.current;
        let label = format!("{:<width$}", field.label, width = LABEL_WIDTH);
        let value = display_value(&field.value, field.masked);
        if focused {
            cursor = Some((lines.len() as u16, (LABEL_WIDTH + 2 + value.chars().count()) as u16));
        }
        let value_style = if focused { palette.highlight() } else { palette.base() };
        lines.push(Line::from(vec![
            Span::styled(label, palette.accent()),
            Span::styled(": ", palette.base()),
            Span::styled(value, value_style),
        ]));
    }

    if !form.staged.is_empty() {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            format!("Queued ({})", form.staged.len()),
            palette.accent(),
        )));
        for draft in &form.staged {
            lines.push(Line::from(Span::styled(
                format!("  {}: {} x{}", draft.genre.trim(), draft.name.trim(), draft.quantity),
                palette.base(),
            )));
        }
    }

    lines.push(Line::from(""));
    if let Some(error) = &form.error {
        lines.push(Line::from(Span::styled(error.clone(), palette.highlight())));
    }
    lines.push(Line::from(Span::styled(footer(&form.kind), palette.base())));

    let block = Block::default()
        .borders(Borders::ALL)
        .title(form.kind.title())
        .title_alignment(Alignment::Center)
        .style(palette.base());
    let inner = block.inner(popup);
    let paragraph = Paragraph::new(lines)
        .block(block)
        .style(palette.base())
        .wrap(Wrap { trim: false });
    f.render_widget(paragraph, popup);

    if let Some((row, col)) = cursor {
        let x = inner.x.saturating_add(col).min(inner.right().saturating_sub(1));
        let y = inner.y.saturating_add(row);
        if y < inner.bottom() {
            f.set_cursor_position(Position::new(x, y));
        }
    }
}

fn footer(kind: &FormKind) -> &'static str {
    match kind {
        FormKind::Login => "Enter: Next/Sign in • Ctrl+t: Create account • Esc: Quit",
        FormKind::Signup => "Enter: Next/Sign up • Ctrl+t: I have an account • Esc: Quit",
        FormKind::NewItem => "Enter on Barcode: Look up • Ctrl+a: Queue • Ctrl+x: Unqueue • Enter on Quantity: Add all • Esc: Cancel",
        FormKind::Restock => "Ctrl+a: Queue • Ctrl+x: Unqueue • Enter on Quantity: Add all • +/-: Quantity • Esc: Cancel",
        FormKind::EditItem { .. } => "Enter: Next/Save • +/-: Quantity • Esc: Cancel",
        FormKind::NewEvent => "Enter: Next/Save • Date is YYYY-MM-DD • Esc: Cancel",
    }
}
