//! Month grid and the entry list beside it.

use chrono::{Datelike, NaiveDate};
use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, List, ListItem, ListState, Paragraph};

use crate::calendar::{is_synthetic_event, month_grid};
use crate::models::CalendarEvent;
use crate::tui::widgets::color::Palette;

const WEEKDAYS: &str = " Su  Mo  Tu  We  Th  Fr  Sa";

/// Month cells split into Sunday-first weeks; the last week is padded
pub fn weeks(cells: &[Option<u32>]) -> Vec<[Option<u32>; 7]> {
    cells
        .chunks(7)
        .map(|chunk| {
            let mut week = [None; 7];
            week[..chunk.len()].copy_from_slice(chunk);
            week
        })
        .collect()
}

pub fn render_month(f: &mut Frame, area: Rect, selected: NaiveDate, marked_days: &[u32], palette: &Palette) {
    let title = selected.format("%B %Y").to_string();
    let block = Block::default()
        .borders(Borders::ALL)
        .title(title)
        .style(palette.base());

    let cells = month_grid(selected.year(), selected.month()).unwrap_or_default();
    let mut lines = vec![Line::from(Span::styled(WEEKDAYS, palette.accent()))];
    for week in weeks(&cells) {
        let spans: Vec<Span> = week
            .iter()
            .map(|cell| match cell {
                None => Span::raw("    "),
                Some(day) => {
                    let marker = if marked_days.contains(day) { "•" } else { " " };
                    let text = format!("{:>3}{}", day, marker);
                    if *day == selected.day() {
                        Span::styled(text, palette.highlight())
                    } else if marked_days.contains(day) {
                        Span::styled(text, palette.accent())
                    } else {
                        Span::styled(text, palette.base())
                    }
                }
            })
            .collect();
        lines.push(Line::from(spans));
    }

    f.render_widget(Paragraph::new(lines).block(block), area);
}

pub fn render_entries(
    f: &mut Frame,
    area: Rect,
    title: &str,
    entries: &[CalendarEvent],
    selected: usize,
    palette: &Palette,
) {
    let block = Block::default()
        .borders(Borders::ALL)
        .title(title.to_string())
        .style(palette.base());

    if entries.is_empty() {
        f.render_widget(
            Paragraph::new("Nothing here. Press n to add a task.")
                .block(block)
                .style(palette.base()),
            area,
        );
        return;
    }

    let dim = Style::default().add_modifier(Modifier::DIM);
    let items: Vec<ListItem> = entries
        .iter()
        .map(|event| {
            let kind = if is_synthetic_event(event) { "purchase" } else { "task" };
            let mut lines = vec![Line::from(vec![
                Span::raw(format!("{}  ", event.date)),
                Span::styled(event.title.clone(), Style::default().add_modifier(Modifier::BOLD)),
                Span::styled(format!("  [{}]", kind), dim),
            ])];
            if let Some(description) = &event.description {
                lines.extend(
                    description
                        .lines()
                        .map(|l| Line::from(Span::styled(format!("    {}", l), dim))),
                );
            }
            ListItem::new(lines)
        })
        .collect();

    let mut state = ListState::default();
    state.select(Some(selected.min(entries.len() - 1)));

    let list = List::new(items)
        .block(block)
        .style(palette.base())
        .highlight_style(palette.highlight());
    f.render_stateful_widget(list, area, &mut state);
}
