use std::io;
use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode, size as terminal_size,
};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;

use crate::Config;
use crate::tui::app::{App, FormKind, Mode, Tab};
use crate::tui::error::TuiError;
use crate::tui::layout::Layout;
use crate::tui::render::render;
use crate::utils::{ParsedKeyBinding, has_primary_modifier, parse_key_binding};

/// Restores the terminal even if the loop panics
struct TerminalGuard {
    raw_mode_enabled: bool,
    alternate_screen_enabled: bool,
}

impl TerminalGuard {
    fn new() -> Result<Self, TuiError> {
        enable_raw_mode()?;
        execute!(io::stdout(), EnterAlternateScreen)?;

        Ok(Self {
            raw_mode_enabled: true,
            alternate_screen_enabled: true,
        })
    }

    /// Normal exit path; dropping afterwards does nothing
    fn restore(&mut self) -> Result<(), TuiError> {
        if self.raw_mode_enabled {
            disable_raw_mode()?;
            self.raw_mode_enabled = false;
        }
        if self.alternate_screen_enabled {
            execute!(io::stdout(), LeaveAlternateScreen)?;
            self.alternate_screen_enabled = false;
        }
        Ok(())
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        if self.raw_mode_enabled {
            let _ = disable_raw_mode();
        }
        if self.alternate_screen_enabled {
            let _ = execute!(io::stdout(), LeaveAlternateScreen);
        }
    }
}

/// Key bindings from the config, parsed once at startup
#[derive(Debug, Clone)]
pub struct KeyMap {
    pub quit: ParsedKeyBinding,
    pub new: ParsedKeyBinding,
    pub edit: ParsedKeyBinding,
    pub delete: ParsedKeyBinding,
    pub search: ParsedKeyBinding,
    pub restock: ParsedKeyBinding,
    pub list_up: ParsedKeyBinding,
    pub list_down: ParsedKeyBinding,
    pub prev_month: ParsedKeyBinding,
    pub next_month: ParsedKeyBinding,
    pub increment: ParsedKeyBinding,
    pub decrement: ParsedKeyBinding,
    pub tab_1: ParsedKeyBinding,
    pub tab_2: ParsedKeyBinding,
    pub tab_3: ParsedKeyBinding,
    pub help: ParsedKeyBinding,
    pub logout: ParsedKeyBinding,
}

impl KeyMap {
    pub fn from_config(config: &Config) -> Result<Self, TuiError> {
        let kb = &config.key_bindings;
        let parse = |action: &str, binding: &str| {
            parse_key_binding(binding)
                .map_err(|e| TuiError::KeyBindingError(format!("{}: {}", action, e)))
        };

        Ok(Self {
            quit: parse("quit", &kb.quit)?,
            new: parse("new", &kb.new)?,
            edit: parse("edit", &kb.edit)?,
            delete: parse("delete", &kb.delete)?,
            search: parse("search", &kb.search)?,
            restock: parse("restock", &kb.restock)?,
            list_up: parse("list_up", &kb.list_up)?,
            list_down: parse("list_down", &kb.list_down)?,
            prev_month: parse("prev_month", &kb.prev_month)?,
            next_month: parse("next_month", &kb.next_month)?,
            increment: parse("increment", &kb.increment)?,
            decrement: parse("decrement", &kb.decrement)?,
            tab_1: parse("tab_1", &kb.tab_1)?,
            tab_2: parse("tab_2", &kb.tab_2)?,
            tab_3: parse("tab_3", &kb.tab_3)?,
            help: parse("help", &kb.help)?,
            logout: parse("logout", &kb.logout)?,
        })
    }
}

pub fn run_event_loop(mut app: App) -> Result<(), TuiError> {
    // Checked before the alternate screen so the message stays readable
    let (width, height) = terminal_size()?;
    let min_width = Layout::MIN_WIDTH + 2;
    let min_height = Layout::MIN_HEIGHT + 2;
    if width < min_width || height < min_height {
        return Err(TuiError::RenderError(format!(
            "Terminal size too small. Current: {}x{}, Minimum required: {}x{}. Please resize your terminal window.",
            width, height, min_width, min_height
        )));
    }

    let mut guard = TerminalGuard::new()?;
    let backend = CrosstermBackend::new(io::stdout());
    let mut terminal = Terminal::new(backend)?;
    tracing::info!("tui started");

    while !app.should_quit {
        app.check_status_message_timeout();
        terminal.draw(|f| render(f, &app))?;

        if event::poll(Duration::from_millis(250))? {
            if let Event::Key(key_event) = event::read()? {
                if key_event.kind == KeyEventKind::Press {
                    handle_key_event(&mut app, key_event);
                }
            }
        }
    }

    guard.restore()?;
    tracing::info!("tui stopped");
    Ok(())
}

fn matches_key_event(key_event: KeyEvent, binding: &ParsedKeyBinding) -> bool {
    if binding.requires_ctrl != has_primary_modifier(key_event.modifiers) {
        return false;
    }
    binding.key_code == key_event.code
}

pub fn handle_key_event(app: &mut App, key_event: KeyEvent) {
    if key_event.code == KeyCode::Char('c') && key_event.modifiers.contains(KeyModifiers::CONTROL) {
        app.should_quit = true;
        return;
    }

    match app.mode {
        Mode::Help => handle_help_mode(app, key_event),
        Mode::Confirm => handle_confirm(app, key_event),
        Mode::Search => handle_search_mode(app, key_event),
        Mode::Form => handle_form_mode(app, key_event),
        Mode::View => handle_view_mode(app, key_event),
    }
}

fn handle_help_mode(app: &mut App, key_event: KeyEvent) {
    if key_event.code == KeyCode::Esc || matches_key_event(key_event, &app.keys.help) {
        app.mode = Mode::View;
    }
}

fn handle_confirm(app: &mut App, key_event: KeyEvent) {
    match key_event.code {
        KeyCode::Up | KeyCode::Down | KeyCode::Left | KeyCode::Right | KeyCode::Tab => {
            app.confirm_selection = 1 - app.confirm_selection.min(1);
        }
        KeyCode::Char('y') => app.confirm_pending(),
        KeyCode::Enter if app.confirm_selection == 0 => app.confirm_pending(),
        KeyCode::Enter | KeyCode::Esc | KeyCode::Char('n') => app.cancel_confirm(),
        _ => {}
    }
}

fn handle_search_mode(app: &mut App, key_event: KeyEvent) {
    match key_event.code {
        KeyCode::Esc => app.exit_search_mode(true),
        KeyCode::Enter => app.exit_search_mode(false),
        KeyCode::Backspace => app.search_backspace(),
        KeyCode::Char(c) if !has_primary_modifier(key_event.modifiers) => app.search_input(c),
        _ => {}
    }
}

fn handle_form_mode(app: &mut App, key_event: KeyEvent) {
    let Some(kind) = app.form.as_ref().map(|f| f.kind.clone()) else {
        app.mode = Mode::View;
        return;
    };

    if kind.is_auth()
        && key_event.code == KeyCode::Char('t')
        && has_primary_modifier(key_event.modifiers)
    {
        app.toggle_auth_form();
        return;
    }

    if kind.stages_items() && has_primary_modifier(key_event.modifiers) {
        match key_event.code {
            KeyCode::Char('a') => app.stage_entry(),
            KeyCode::Char('x') => app.unstage_last(),
            _ => {}
        }
        return;
    }

    match key_event.code {
        KeyCode::Esc => app.cancel_form(),
        KeyCode::Enter | KeyCode::Tab | KeyCode::Down => app.form_advance(),
        KeyCode::BackTab | KeyCode::Up => {
            if let Some(form) = app.form.as_mut() {
                form.prev_field();
            }
        }
        KeyCode::Backspace => {
            if let Some(form) = app.form.as_mut() {
                form.backspace();
            }
        }
        KeyCode::Char(c) if !has_primary_modifier(key_event.modifiers) => {
            if let Some(form) = app.form.as_mut() {
                let stepped = matches!(kind, FormKind::EditItem { .. } | FormKind::NewItem | FormKind::Restock)
                    && (c == '+' || c == '-')
                    && form.step_quantity(c == '+');
                if !stepped {
                    form.input_char(c);
                }
            }
        }
        _ => {}
    }
}

fn handle_view_mode(app: &mut App, key_event: KeyEvent) {
    let keys = app.keys.clone();

    if matches_key_event(key_event, &keys.quit) {
        app.should_quit = true;
    } else if matches_key_event(key_event, &keys.help) {
        app.mode = Mode::Help;
    } else if matches_key_event(key_event, &keys.logout) {
        app.request_sign_out();
    } else if matches_key_event(key_event, &keys.tab_1) {
        app.switch_tab(Tab::Home);
    } else if matches_key_event(key_event, &keys.tab_2) {
        app.switch_tab(Tab::Calendar);
    } else if matches_key_event(key_event, &keys.tab_3) {
        app.switch_tab(Tab::Stock);
    } else if key_event.code == KeyCode::Tab {
        app.switch_tab(app.tab.next());
    } else if matches_key_event(key_event, &keys.new) {
        app.open_new_form();
    } else if matches_key_event(key_event, &keys.search) {
        app.enter_search_mode();
    } else if matches_key_event(key_event, &keys.delete) {
        app.request_delete();
    } else if key_event.code == KeyCode::Esc && !app.search_query.is_empty() {
        app.exit_search_mode(true);
    } else {
        match app.tab {
            Tab::Calendar => handle_calendar_keys(app, &keys, key_event),
            Tab::Home | Tab::Stock => handle_inventory_keys(app, &keys, key_event),
        }
    }
}

fn handle_inventory_keys(app: &mut App, keys: &KeyMap, key_event: KeyEvent) {
    if matches_key_event(key_event, &keys.list_up) || key_event.code == KeyCode::Up {
        app.move_selection(-1);
    } else if matches_key_event(key_event, &keys.list_down) || key_event.code == KeyCode::Down {
        app.move_selection(1);
    } else if matches_key_event(key_event, &keys.restock) {
        app.open_restock_form();
    } else if matches_key_event(key_event, &keys.edit) {
        app.open_edit_form();
    } else if app.tab == Tab::Stock && matches_key_event(key_event, &keys.increment) {
        app.adjust_quantity(true);
    } else if app.tab == Tab::Stock && matches_key_event(key_event, &keys.decrement) {
        app.adjust_quantity(false);
    }
}

fn handle_calendar_keys(app: &mut App, keys: &KeyMap, key_event: KeyEvent) {
    if matches_key_event(key_event, &keys.list_up) {
        app.move_entry(-1);
    } else if matches_key_event(key_event, &keys.list_down) {
        app.move_entry(1);
    } else if matches_key_event(key_event, &keys.prev_month) {
        app.shift_month(false);
    } else if matches_key_event(key_event, &keys.next_month) {
        app.shift_month(true);
    } else {
        match key_event.code {
            KeyCode::Left => app.shift_day(-1),
            KeyCode::Right => app.shift_day(1),
            KeyCode::Up => app.shift_day(-7),
            KeyCode::Down => app.shift_day(7),
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Database;

    fn press(app: &mut App, code: KeyCode) {
        handle_key_event(app, KeyEvent::new(code, KeyModifiers::NONE));
    }

    fn type_str(app: &mut App, text: &str) {
        for c in text.chars() {
            press(app, KeyCode::Char(c));
        }
    }

    fn signed_in_app() -> App {
        let mut app = App::new(Config::default(), Database::in_memory().unwrap()).unwrap();
        handle_key_event(&mut app, KeyEvent::new(KeyCode::Char('t'), KeyModifiers::CONTROL));
        type_str(&mut app, "Ann");
        press(&mut app, KeyCode::Enter);
        type_str(&mut app, "ann@example.com");
        press(&mut app, KeyCode::Enter);
        type_str(&mut app, "pw");
        press(&mut app, KeyCode::Enter);
        app
    }

    #[test]
    fn keyboard_signup_and_add_item() {
        let mut app = signed_in_app();
        assert!(app.is_signed_in());
        assert_eq!(app.mode, Mode::View);

        press(&mut app, KeyCode::Char('n'));
        press(&mut app, KeyCode::Enter); // no barcode
        type_str(&mut app, "Produce");
        press(&mut app, KeyCode::Tab);
        type_str(&mut app, "Potato");
        press(&mut app, KeyCode::Tab);
        press(&mut app, KeyCode::Char('+'));
        press(&mut app, KeyCode::Enter);

        assert_eq!(app.mode, Mode::View);
        let item = app.selected().unwrap();
        assert_eq!((item.name.as_str(), item.quantity), ("Potato", 2));
    }

    #[test]
    fn esc_on_sign_in_quits() {
        let mut app = App::new(Config::default(), Database::in_memory().unwrap()).unwrap();
        press(&mut app, KeyCode::Esc);
        assert!(app.should_quit);
    }

    #[test]
    fn tabs_and_help() {
        let mut app = signed_in_app();
        press(&mut app, KeyCode::Char('2'));
        assert_eq!(app.tab, Tab::Calendar);
        press(&mut app, KeyCode::Tab);
        assert_eq!(app.tab, Tab::Stock);
        press(&mut app, KeyCode::F(1));
        assert_eq!(app.mode, Mode::Help);
        press(&mut app, KeyCode::Char('q'));
        assert!(!app.should_quit);
        press(&mut app, KeyCode::Esc);
        press(&mut app, KeyCode::Char('q'));
        assert!(app.should_quit);
    }

    #[test]
    fn search_typing_goes_to_query() {
        let mut app = signed_in_app();
        press(&mut app, KeyCode::Char('/'));
        assert_eq!(app.mode, Mode::Search);
        type_str(&mut app, "qn");
        assert_eq!(app.search_query, "qn");
        assert!(!app.should_quit);
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.mode, Mode::View);
        press(&mut app, KeyCode::Esc);
        assert!(app.search_query.is_empty());
    }

    #[test]
    fn delete_confirmation_defaults_to_delete() {
        let mut app = signed_in_app();
        press(&mut app, KeyCode::Char('n'));
        press(&mut app, KeyCode::Enter);
        type_str(&mut app, "Dairy");
        press(&mut app, KeyCode::Enter);
        type_str(&mut app, "Milk");
        press(&mut app, KeyCode::Enter);
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.ordered_items().len(), 1);

        press(&mut app, KeyCode::Char('d'));
        press(&mut app, KeyCode::Down);
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.ordered_items().len(), 1);

        press(&mut app, KeyCode::Char('d'));
        press(&mut app, KeyCode::Enter);
        assert!(app.ordered_items().is_empty());
    }

    fn ctrl(app: &mut App, c: char) {
        handle_key_event(app, KeyEvent::new(KeyCode::Char(c), KeyModifiers::CONTROL));
    }

    #[test]
    fn queue_several_items_then_add_them_together() {
        let mut app = signed_in_app();
        press(&mut app, KeyCode::Char('n'));
        press(&mut app, KeyCode::Enter);
        type_str(&mut app, "Produce");
        press(&mut app, KeyCode::Tab);
        type_str(&mut app, "Potato");
        ctrl(&mut app, 'a');

        press(&mut app, KeyCode::Enter);
        type_str(&mut app, "Dairy");
        press(&mut app, KeyCode::Tab);
        type_str(&mut app, "Milk");
        ctrl(&mut app, 'a');
        type_str(&mut app, "x");
        ctrl(&mut app, 'a');
        ctrl(&mut app, 'x');
        assert_eq!(app.form.as_ref().unwrap().staged.len(), 1);
        ctrl(&mut app, 'x');
        assert!(app.form.as_ref().unwrap().staged.is_empty());
        assert!(app.ordered_items().is_empty());
        press(&mut app, KeyCode::Backspace);

        press(&mut app, KeyCode::Enter);
        type_str(&mut app, "Dairy");
        press(&mut app, KeyCode::Tab);
        type_str(&mut app, "Milk");
        ctrl(&mut app, 'a');
        press(&mut app, KeyCode::Enter);
        type_str(&mut app, "Frozen");
        press(&mut app, KeyCode::Tab);
        type_str(&mut app, "Peas");
        press(&mut app, KeyCode::Tab);
        press(&mut app, KeyCode::Enter);

        assert_eq!(app.mode, Mode::View);
        assert_eq!(app.ordered_items().len(), 2);
        assert_eq!(app.status_message.as_deref(), Some("Added 2 items"));
    }

    #[test]
    fn sign_out_returns_to_sign_in() {
        let mut app = signed_in_app();
        ctrl(&mut app, 'o');
        assert_eq!(app.mode, Mode::Confirm);
        press(&mut app, KeyCode::Esc);
        assert!(app.is_signed_in());

        ctrl(&mut app, 'o');
        press(&mut app, KeyCode::Enter);
        assert!(!app.is_signed_in());
        assert_eq!(app.mode, Mode::Form);
        let form = app.form.as_ref().unwrap();
        assert_eq!(form.kind, FormKind::Login);
        assert_eq!(form.value("Email"), "ann@example.com");
    }

    #[test]
    fn bad_binding_is_rejected() {
        let mut config = Config::default();
        config.key_bindings.quit = "Hyper+q".to_string();
        assert!(matches!(
            KeyMap::from_config(&config),
            Err(TuiError::KeyBindingError(_))
        ));
    }
}
