use ratatui::Frame;
use ratatui::layout::Alignment;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};

use crate::inventory::{history_genres, history_names_for};
use crate::tui::app::{App, Mode, Tab};
use crate::tui::layout::Layout;
use crate::tui::widgets::{
    calendar_view::{render_entries, render_month},
    color::Palette,
    confirm::render_confirm,
    form::render_form,
    genre_table::render_genre_table,
    help::render_help,
    status_bar::render_status_bar,
    tabs::render_tabs,
};
use crate::utils::format_key_binding_for_display;

pub fn render(f: &mut Frame, app: &App) {
    let palette = Palette::from_theme(&app.config.theme);
    let layout = Layout::calculate(f.area());

    let title = match app.household() {
        Some(household) => format!("Larder · {}", household.user().name),
        None => "Larder".to_string(),
    };
    let outer_block = Block::default()
        .borders(Borders::ALL)
        .title(title)
        .title_alignment(Alignment::Center)
        .style(palette.base());
    f.render_widget(outer_block, f.area());

    render_tabs(f, layout.tabs_area, app.tab, &palette);

    if app.is_signed_in() {
        match app.tab {
            Tab::Home => render_home(f, app, &layout, &palette),
            Tab::Calendar => render_calendar(f, app, &layout, &palette),
            Tab::Stock => render_stock(f, app, &layout, &palette),
        }
    }

    match app.mode {
        Mode::Help => render_help(f, f.area(), &app.config.key_bindings, &palette),
        Mode::Form => {
            if let Some(form) = &app.form {
                render_form(f, f.area(), form, &palette);
            }
        }
        Mode::Confirm => {
            if let Some(target) = &app.confirm_target {
                render_confirm(f, f.area(), target, app.confirm_selection, &palette);
            }
        }
        Mode::View | Mode::Search => {}
    }

    let hints = get_key_hints(app);
    render_status_bar(
        f,
        layout.status_area,
        app.status_message.as_deref(),
        &hints,
        &palette,
    );
}

fn render_home(f: &mut Frame, app: &App, layout: &Layout, palette: &Palette) {
    let Some(household) = app.household() else {
        return;
    };
    let (left, right) = layout.split_main(60);
    render_genre_table(f, left, &household.groups(), app.selected_item, "Inventory", false, palette);

    let history = household.history();
    let lines: Vec<Line> = if history.is_empty() {
        vec![Line::from("Items you add are remembered here.")]
    } else {
        history_genres(history)
            .into_iter()
            .map(|genre| {
                Line::from(vec![
                    Span::styled(format!("{}: ", genre), palette.accent()),
                    Span::raw(history_names_for(history, genre).join(", ")),
                ])
            })
            .collect()
    };
    let paragraph = Paragraph::new(lines)
        .block(Block::default().borders(Borders::ALL).title("Item history"))
        .style(palette.base())
        .wrap(Wrap { trim: true });
    f.render_widget(paragraph, right);
}

fn render_stock(f: &mut Frame, app: &App, layout: &Layout, palette: &Palette) {
    let Some(household) = app.household() else {
        return;
    };
    render_genre_table(
        f,
        layout.main_area,
        &household.groups(),
        app.selected_item,
        "Stock",
        true,
        palette,
    );
}

fn render_calendar(f: &mut Frame, app: &App, layout: &Layout, palette: &Palette) {
    let (left, right) = layout.split_main(40);
    render_month(f, left, app.selected_date, &app.marked_days(), palette);

    let title = if app.search_query.is_empty() {
        app.selected_day_key()
    } else {
        format!("Search: {}", app.search_query)
    };
    render_entries(
        f,
        right,
        &title,
        &app.calendar_entries(),
        app.selected_entry,
        palette,
    );

    if app.mode == Mode::Search {
        let cursor_x = right.x + 1 + "Search: ".len() as u16 + app.search_query.chars().count() as u16;
        if cursor_x < right.right() {
            f.set_cursor_position((cursor_x, right.y));
        }
    }
}

fn get_key_hints(app: &App) -> Vec<String> {
    let kb = &app.config.key_bindings;
    let key = |binding: &str| format_key_binding_for_display(binding);

    match app.mode {
        Mode::Help => vec![format!("Esc or {}: Close help", key(&kb.help))],
        Mode::Search => vec![
            "Type to search".to_string(),
            "Enter: Keep results".to_string(),
            "Esc: Clear".to_string(),
        ],
        Mode::Form => {
            let mut hints = vec![
                "Tab/Enter: Next field".to_string(),
                "Shift+Tab: Previous field".to_string(),
            ];
            if app.form.as_ref().is_some_and(|f| f.kind.stages_items()) {
                hints.push("Ctrl+a: Queue item".to_string());
            }
            hints.push("Esc: Cancel".to_string());
            hints
        }
        Mode::Confirm => vec!["Enter: Confirm".to_string(), "Esc: Cancel".to_string()],
        Mode::View => {
            let mut hints = vec![
                format!("{}: Quit", key(&kb.quit)),
                format!("{}: New", key(&kb.new)),
            ];
            match app.tab {
                Tab::Home => {
                    hints.push(format!("{}: Restock", key(&kb.restock)));
                    hints.push(format!("{}: Edit", key(&kb.edit)));
                }
                Tab::Stock => {
                    hints.push(format!("{}/{}: Quantity", key(&kb.increment), key(&kb.decrement)));
                    hints.push(format!("{}: Edit", key(&kb.edit)));
                }
                Tab::Calendar => {
                    hints.push(format!("{}/{}: Month", key(&kb.prev_month), key(&kb.next_month)));
                    hints.push("←→↑↓: Day".to_string());
                }
            }
            hints.push(format!("{}: Delete", key(&kb.delete)));
            hints.push(format!("{}: Search", key(&kb.search)));
            hints.push(format!("{}: Help", key(&kb.help)));
            hints.push(format!("{}: Sign out", key(&kb.logout)));
            hints
        }
    }
}
