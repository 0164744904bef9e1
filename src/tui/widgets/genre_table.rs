use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, List, ListItem, ListState, Paragraph};

use crate::inventory::{GenreGroups, genre_totals};
use crate::models::Item;
use crate::tui::widgets::color::Palette;

/// One visual line of the grouped list
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Row<'a> {
    Header { genre: &'a str, total: u64 },
    Item(&'a Item),
}

/// Headers interleaved with their items, in group order
pub fn rows(groups: &GenreGroups) -> Vec<Row<'_>> {
    let totals = genre_totals(groups);
    let mut out = Vec::new();
    for ((genre, items), (_, total)) in groups.iter().zip(totals) {
        out.push(Row::Header { genre, total });
        out.extend(items.iter().map(Row::Item));
    }
    out
}

/// Visual line of the `item_index`-th item, skipping headers
pub fn visual_index(rows: &[Row<'_>], item_index: usize) -> Option<usize> {
    rows.iter()
        .enumerate()
        .filter(|(_, row)| matches!(row, Row::Item(_)))
        .nth(item_index)
        .map(|(line, _)| line)
}

pub fn render_genre_table(
    f: &mut Frame,
    area: Rect,
    groups: &GenreGroups,
    selected: usize,
    title: &str,
    show_quantity_controls: bool,
    palette: &Palette,
) {
    let block = Block::default()
        .borders(Borders::ALL)
        .title(title.to_string())
        .style(palette.base());

    if groups.is_empty() {
        let paragraph = Paragraph::new("No items yet. Press n to add one.")
            .block(block)
            .style(palette.base());
        f.render_widget(paragraph, area);
        return;
    }

    let rows = rows(groups);
    let list_items: Vec<ListItem> = rows
        .iter()
        .map(|row| match row {
            Row::Header { genre, total } => ListItem::new(Line::from(Span::styled(
                format!("{} ({})", genre, total),
                palette.accent(),
            ))),
            Row::Item(item) => {
                let quantity = if show_quantity_controls {
                    format!("[-] {:>3} [+]", item.quantity)
                } else {
                    format!("x{}", item.quantity)
                };
                ListItem::new(Line::from(vec![
                    Span::raw(format!("  {:<24} ", item.name)),
                    Span::raw(quantity),
                    Span::raw(format!("  {}", item.added_day())),
                ]))
            }
        })
        .collect();

    let mut state = ListState::default();
    state.select(visual_index(&rows, selected));

    let list = List::new(list_items)
        .block(block)
        .style(palette.base())
        .highlight_style(palette.highlight());
    f.render_stateful_widget(list, area, &mut state);
}
