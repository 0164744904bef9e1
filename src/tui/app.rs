use std::rc::Rc;
use std::time::Instant;

use chrono::{Datelike, Days, Local, Months, NaiveDate};
use thiserror::Error;

use crate::calendar::{day_key, events_on, is_synthetic_event};
use crate::household::{Household, HouseholdError};
use crate::inventory::history_contains;
use crate::lookup::{CatalogLookup, Enrichment, LookupError, LookupGate, enrich_draft};
use crate::models::{CalendarEvent, Item, ItemDraft, ValidationError, parse_quantity};
use crate::session::{self, AuthError};
use crate::stock::step_quantity;
use crate::tui::error::TuiError;
use crate::tui::events::KeyMap;
use crate::utils::parse_date;
use crate::{Config, Database};

/// The TUI shares one database between the session and the household
pub type Store = Rc<Database>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tab {
    Home,
    Calendar,
    Stock,
}

impl Tab {
    pub const ALL: [Tab; 3] = [Tab::Home, Tab::Calendar, Tab::Stock];

    pub fn title(self) -> &'static str {
        match self {
            Tab::Home => "Home",
            Tab::Calendar => "Calendar",
            Tab::Stock => "Stock",
        }
    }

    pub fn index(self) -> usize {
        match self {
            Tab::Home => 0,
            Tab::Calendar => 1,
            Tab::Stock => 2,
        }
    }

    pub fn next(self) -> Tab {
        Self::ALL[(self.index() + 1) % Self::ALL.len()]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    View,
    Search,
    Form,
    Confirm,
    Help,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormKind {
    Login,
    Signup,
    NewItem,
    Restock,
    EditItem { id: String },
    NewEvent,
}

impl FormKind {
    pub fn title(&self) -> &'static str {
        match self {
            FormKind::Login => "Sign in",
            FormKind::Signup => "Create account",
            FormKind::NewItem => "New item",
            FormKind::Restock => "Add from history",
            FormKind::EditItem { .. } => "Edit item",
            FormKind::NewEvent => "New task",
        }
    }

    pub fn is_auth(&self) -> bool {
        matches!(self, FormKind::Login | FormKind::Signup)
    }

    /// Forms that collect several items before adding them together
    pub fn stages_items(&self) -> bool {
        matches!(self, FormKind::NewItem | FormKind::Restock)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormField {
    pub label: &'static str,
    pub value: String,
    pub masked: bool,
    pub numeric: bool,
}

impl FormField {
    fn text(label: &'static str, value: &str) -> Self {
        Self {
            label,
            value: value.to_string(),
            masked: false,
            numeric: false,
        }
    }

    fn masked(label: &'static str) -> Self {
        Self {
            masked: true,
            ..Self::text(label, "")
        }
    }

    fn numeric(label: &'static str, value: u32) -> Self {
        Self {
            numeric: true,
            ..Self::text(label, &value.to_string())
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Form {
    pub kind: FormKind,
    pub fields: Vec<FormField>,
    pub current: usize,
    pub error: Option<String>,
    /// Items queued on this form, added together on submit
    pub staged: Vec<ItemDraft>,
}

impl Form {
    fn with_fields(kind: FormKind, fields: Vec<FormField>) -> Self {
        Self {
            kind,
            fields,
            current: 0,
            error: None,
            staged: Vec::new(),
        }
    }

    pub fn login(email: &str) -> Self {
        Self::with_fields(
            FormKind::Login,
            vec![FormField::text("Email", email), FormField::masked("Password")],
        )
    }

    pub fn signup(email: &str) -> Self {
        Self::with_fields(
            FormKind::Signup,
            vec![
                FormField::text("Name", ""),
                FormField::text("Email", email),
                FormField::masked("Password"),
            ],
        )
    }

    /// Barcode comes first so a lookup can fill genre and name
    pub fn new_item() -> Self {
        Self::with_fields(
            FormKind::NewItem,
            vec![
                FormField::text("Barcode", ""),
                FormField::text("Genre", ""),
                FormField::text("Name", ""),
                FormField::numeric("Quantity", 1),
            ],
        )
    }

    pub fn restock(genre: &str, name: &str) -> Self {
        Self::with_fields(
            FormKind::Restock,
            vec![
                FormField::text("Genre", genre),
                FormField::text("Name", name),
                FormField::numeric("Quantity", 1),
            ],
        )
    }

    pub fn edit_item(item: &Item) -> Self {
        Self::with_fields(
            FormKind::EditItem { id: item.id.clone() },
            vec![
                FormField::text("Name", &item.name),
                FormField::numeric("Quantity", item.quantity),
            ],
        )
    }

    pub fn new_event(date: &str) -> Self {
        Self::with_fields(
            FormKind::NewEvent,
            vec![
                FormField::text("Title", ""),
                FormField::text("Date", date),
                FormField::text("Details", ""),
            ],
        )
    }

    pub fn value(&self, label: &str) -> &str {
        self.fields
            .iter()
            .find(|f| f.label == label)
            .map(|f| f.value.as_str())
            .unwrap_or("")
    }

    fn set_value(&mut self, label: &str, value: &str) {
        if let Some(field) = self.fields.iter_mut().find(|f| f.label == label) {
            field.value = value.to_string();
        }
    }

    pub fn current_label(&self) -> &'static str {
        self.fields.get(self.current).map(|f| f.label).unwrap_or("")
    }

    pub fn is_last_field(&self) -> bool {
        self.current + 1 >= self.fields.len()
    }

    pub fn next_field(&mut self) {
        if !self.fields.is_empty() {
            self.current = (self.current + 1) % self.fields.len();
        }
    }

    pub fn prev_field(&mut self) {
        if !self.fields.is_empty() {
            self.current = (self.current + self.fields.len() - 1) % self.fields.len();
        }
    }

    /// Numeric fields only take digits
    pub fn input_char(&mut self, c: char) {
        if let Some(field) = self.fields.get_mut(self.current) {
            if field.numeric && !c.is_ascii_digit() {
                return;
            }
            field.value.push(c);
        }
    }

    pub fn backspace(&mut self) {
        if let Some(field) = self.fields.get_mut(self.current) {
            field.value.pop();
        }
    }

    /// The item currently typed into the form, unvalidated
    fn draft(&self) -> Result<ItemDraft, ValidationError> {
        let quantity = parse_quantity(self.value("Quantity"))?;
        let mut draft = ItemDraft::new(self.value("Genre"), self.value("Name"), quantity);
        let barcode = self.value("Barcode").trim();
        if !barcode.is_empty() {
            draft.barcode = Some(barcode.to_string());
        }
        Ok(draft)
    }

    /// Nothing typed for the current item
    pub fn entry_is_blank(&self) -> bool {
        ["Barcode", "Genre", "Name"]
            .iter()
            .all(|label| self.value(label).trim().is_empty())
    }

    fn reset_entry(&mut self) {
        let fresh = match self.kind {
            FormKind::NewItem => Form::new_item(),
            FormKind::Restock => Form::restock("", ""),
            _ => return,
        };
        self.fields = fresh.fields;
        self.current = 0;
        self.error = None;
    }

    /// +/- on the focused quantity field. Returns false if the field is not numeric.
    pub fn step_quantity(&mut self, increment: bool) -> bool {
        match self.fields.get_mut(self.current) {
            Some(field) if field.numeric => {
                let current = parse_quantity(&field.value).unwrap_or(0);
                field.value = step_quantity(current, increment).to_string();
                true
            }
            _ => false,
        }
    }
}

/// Action waiting on a yes/no popup
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfirmTarget {
    Item { id: String, label: String },
    Event { id: String, label: String },
    SignOut { label: String },
}

impl ConfirmTarget {
    pub fn question(&self) -> &'static str {
        match self {
            ConfirmTarget::Item { .. } => "Delete this item?",
            ConfirmTarget::Event { .. } => "Delete this task?",
            ConfirmTarget::SignOut { .. } => "Sign out?",
        }
    }

    /// Verb on the confirming button
    pub fn action(&self) -> &'static str {
        match self {
            ConfirmTarget::SignOut { .. } => "Sign out",
            ConfirmTarget::Item { .. } | ConfirmTarget::Event { .. } => "Delete",
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            ConfirmTarget::Item { .. } => "item",
            ConfirmTarget::Event { .. } => "task",
            ConfirmTarget::SignOut { .. } => "session",
        }
    }

    pub fn label(&self) -> &str {
        match self {
            ConfirmTarget::Item { label, .. }
            | ConfirmTarget::Event { label, .. }
            | ConfirmTarget::SignOut { label } => label,
        }
    }
}

#[derive(Debug, Error)]
enum FormError {
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error(transparent)]
    Household(#[from] HouseholdError),
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Lookup(#[from] LookupError),
    #[error("Please sign in first")]
    SignedOut,
}

pub struct App {
    pub config: Config,
    pub keys: KeyMap,
    store: Store,
    household: Option<Household<Store>>,
    pub tab: Tab,
    pub mode: Mode,
    pub selected_item: usize,
    pub selected_date: NaiveDate,
    pub selected_entry: usize,
    pub search_query: String,
    pub form: Option<Form>,
    pub confirm_target: Option<ConfirmTarget>,
    pub confirm_selection: usize,
    pub status_message: Option<String>,
    status_message_time: Option<Instant>,
    lookup: CatalogLookup,
    gate: LookupGate,
    pub should_quit: bool,
}

impl App {
    pub fn new(config: Config, db: Database) -> Result<Self, TuiError> {
        let keys = KeyMap::from_config(&config)?;
        let lookup = config.catalog_lookup();
        let store = Rc::new(db);
        let household = match session::current_user(&*store)? {
            Some(user) => Some(Household::load(Rc::clone(&store), user)?),
            None => None,
        };

        let mut app = Self {
            config,
            keys,
            store,
            household,
            tab: Tab::Home,
            mode: Mode::View,
            selected_item: 0,
            selected_date: Local::now().date_naive(),
            selected_entry: 0,
            search_query: String::new(),
            form: None,
            confirm_target: None,
            confirm_selection: 0,
            status_message: None,
            status_message_time: None,
            lookup,
            gate: LookupGate::new(),
            should_quit: false,
        };
        if app.household.is_none() {
            app.open_form(Form::login(""));
        }
        Ok(app)
    }

    pub fn household(&self) -> Option<&Household<Store>> {
        self.household.as_ref()
    }

    pub fn is_signed_in(&self) -> bool {
        self.household.is_some()
    }

    pub fn set_status_message(&mut self, message: impl Into<String>) {
        self.status_message = Some(message.into());
        self.status_message_time = Some(Instant::now());
    }

    pub fn clear_status_message(&mut self) {
        self.status_message = None;
        self.status_message_time = None;
    }

    pub fn check_status_message_timeout(&mut self) {
        const STATUS_MESSAGE_TIMEOUT_SECS: u64 = 3;
        if let Some(time) = self.status_message_time {
            if time.elapsed().as_secs() >= STATUS_MESSAGE_TIMEOUT_SECS {
                self.clear_status_message();
            }
        }
    }

    pub fn switch_tab(&mut self, tab: Tab) {
        self.tab = tab;
        self.selected_entry = 0;
    }

    // Inventory

    /// Items in display order: grouped by genre, first-seen order
    pub fn ordered_items(&self) -> Vec<Item> {
        match &self.household {
            Some(household) => household.groups().flatten().into_iter().cloned().collect(),
            None => Vec::new(),
        }
    }

    pub fn selected(&self) -> Option<Item> {
        self.ordered_items().into_iter().nth(self.selected_item)
    }

    pub fn move_selection(&mut self, delta: isize) {
        let len = self.ordered_items().len();
        if len == 0 {
            self.selected_item = 0;
            return;
        }
        let next = (self.selected_item as isize + delta).clamp(0, len as isize - 1);
        self.selected_item = next as usize;
    }

    fn clamp_selection(&mut self) {
        let len = self.ordered_items().len();
        self.selected_item = self.selected_item.min(len.saturating_sub(1));
        let entries = self.calendar_entries().len();
        self.selected_entry = self.selected_entry.min(entries.saturating_sub(1));
    }

    fn select_item_id(&mut self, id: &str) {
        if let Some(index) = self.ordered_items().iter().position(|i| i.id == id) {
            self.selected_item = index;
        }
    }

    /// One +/- step on the selected item's quantity (Stock tab)
    pub fn adjust_quantity(&mut self, increment: bool) {
        let Some(item) = self.selected() else {
            self.set_status_message("No item selected");
            return;
        };
        let quantity = step_quantity(item.quantity, increment);
        if quantity == item.quantity {
            return;
        }
        let Some(household) = self.household.as_mut() else {
            return;
        };
        if let Err(e) = household.edit_item(&item.id, &item.name, &quantity.to_string()) {
            tracing::warn!(error = %e, id = %item.id, "quantity change failed");
            self.set_status_message(format!("Failed to update quantity: {}", e));
        }
    }

    // Calendar

    pub fn selected_day_key(&self) -> String {
        day_key(
            self.selected_date.year(),
            self.selected_date.month(),
            self.selected_date.day(),
        )
    }

    /// Search results while a query is set, otherwise the selected day's entries
    pub fn calendar_entries(&self) -> Vec<CalendarEvent> {
        let Some(household) = &self.household else {
            return Vec::new();
        };
        if self.search_query.trim().is_empty() {
            let all = household.all_events();
            events_on(&all, &self.selected_day_key()).into_iter().cloned().collect()
        } else {
            household.search(&self.search_query)
        }
    }

    pub fn selected_calendar_entry(&self) -> Option<CalendarEvent> {
        self.calendar_entries().into_iter().nth(self.selected_entry)
    }

    /// Days of the displayed month that have at least one entry
    pub fn marked_days(&self) -> Vec<u32> {
        let Some(household) = &self.household else {
            return Vec::new();
        };
        let mut days: Vec<u32> = household
            .all_events()
            .iter()
            .filter_map(|e| parse_date(&e.date).ok())
            .filter(|d| d.year() == self.selected_date.year() && d.month() == self.selected_date.month())
            .map(|d| d.day())
            .collect();
        days.sort_unstable();
        days.dedup();
        days
    }

    pub fn shift_day(&mut self, days: i64) {
        let moved = if days >= 0 {
            self.selected_date.checked_add_days(Days::new(days as u64))
        } else {
            self.selected_date.checked_sub_days(Days::new(days.unsigned_abs()))
        };
        if let Some(date) = moved {
            self.selected_date = date;
            self.selected_entry = 0;
        }
    }

    /// Day of month is clamped when the target month is shorter
    pub fn shift_month(&mut self, forward: bool) {
        let moved = if forward {
            self.selected_date.checked_add_months(Months::new(1))
        } else {
            self.selected_date.checked_sub_months(Months::new(1))
        };
        if let Some(date) = moved {
            self.selected_date = date;
            self.selected_entry = 0;
        }
    }

    pub fn move_entry(&mut self, delta: isize) {
        let len = self.calendar_entries().len();
        if len == 0 {
            self.selected_entry = 0;
            return;
        }
        let next = (self.selected_entry as isize + delta).clamp(0, len as isize - 1);
        self.selected_entry = next as usize;
    }

    // Search

    pub fn enter_search_mode(&mut self) {
        self.tab = Tab::Calendar;
        self.mode = Mode::Search;
        self.selected_entry = 0;
    }

    /// Leave search; the query stays applied unless `clear` is set
    pub fn exit_search_mode(&mut self, clear: bool) {
        if clear {
            self.search_query.clear();
        }
        self.mode = Mode::View;
        self.selected_entry = 0;
    }

    pub fn search_input(&mut self, c: char) {
        self.search_query.push(c);
        self.selected_entry = 0;
    }

    pub fn search_backspace(&mut self) {
        self.search_query.pop();
        self.selected_entry = 0;
    }

    // Forms

    pub fn open_form(&mut self, form: Form) {
        self.form = Some(form);
        self.mode = Mode::Form;
    }

    pub fn close_form(&mut self) {
        self.form = None;
        self.mode = Mode::View;
    }

    /// Esc on a form. Signed-out users can only leave by quitting.
    pub fn cancel_form(&mut self) {
        if self.household.is_none() {
            self.should_quit = true;
        } else {
            self.close_form();
        }
    }

    pub fn toggle_auth_form(&mut self) {
        let next = match &self.form {
            Some(form) if form.kind == FormKind::Login => Form::signup(form.value("Email")),
            Some(form) if form.kind == FormKind::Signup => Form::login(form.value("Email")),
            _ => return,
        };
        self.form = Some(next);
    }

    pub fn open_new_form(&mut self) {
        match self.tab {
            Tab::Calendar => {
                let date = self.selected_day_key();
                self.open_form(Form::new_event(&date));
            }
            Tab::Home | Tab::Stock => self.open_form(Form::new_item()),
        }
    }

    /// Prefilled from the selected item, or the first history entry
    pub fn open_restock_form(&mut self) {
        let Some(household) = &self.household else {
            return;
        };
        let Some(first) = household.history().first() else {
            self.set_status_message("Item history is empty; add an item first");
            return;
        };
        let form = match self.selected() {
            Some(item) => Form::restock(&item.genre, &item.name),
            None => Form::restock(&first.genre, &first.name),
        };
        self.open_form(form);
    }

    pub fn open_edit_form(&mut self) {
        if self.tab == Tab::Calendar {
            return;
        }
        match self.selected() {
            Some(item) => self.open_form(Form::edit_item(&item)),
            None => self.set_status_message("No item selected"),
        }
    }

    /// Enter/Tab on a form: look up a barcode when leaving that field,
    /// submit on the last field, otherwise move on
    pub fn form_advance(&mut self) {
        let (on_barcode, on_last) = match &self.form {
            Some(form) => (
                form.kind == FormKind::NewItem && form.current_label() == "Barcode",
                form.is_last_field(),
            ),
            None => return,
        };
        if on_barcode {
            self.lookup_barcode();
        }
        if on_last {
            self.submit_form();
        } else if let Some(form) = self.form.as_mut() {
            form.next_field();
        }
    }

    /// Fill empty genre/name fields of the new-item form from the catalog
    pub fn lookup_barcode(&mut self) {
        let Some(form) = self.form.as_mut() else {
            return;
        };
        let barcode = form.value("Barcode").trim().to_string();
        if barcode.is_empty() {
            return;
        }
        let mut draft = ItemDraft::new(form.value("Genre"), form.value("Name"), 0).with_barcode(barcode);

        match enrich_draft(&mut draft, &self.lookup, &self.gate) {
            Ok(Enrichment::Filled(_)) => {
                form.set_value("Genre", &draft.genre);
                form.set_value("Name", &draft.name);
                form.error = None;
            }
            Ok(Enrichment::NotFound) => {
                form.error = Some("No product found for that barcode; enter it manually".to_string());
            }
            Err(e) => form.error = Some(e.to_string()),
        }
    }

    pub fn submit_form(&mut self) {
        let Some(form) = self.form.clone() else {
            return;
        };
        let outcome = match &form.kind {
            FormKind::Login => self.sign_in(&form),
            FormKind::Signup => self.sign_up(&form),
            FormKind::NewItem => self.submit_new_item(&form),
            FormKind::Restock => self.submit_restock(&form),
            FormKind::EditItem { id } => self.submit_edit(id, &form),
            FormKind::NewEvent => self.submit_event(&form),
        };

        match outcome {
            Ok(message) => {
                self.close_form();
                self.clamp_selection();
                self.set_status_message(message);
            }
            Err(e) => {
                tracing::debug!(form = form.kind.title(), error = %e, "form rejected");
                if let Some(current) = self.form.as_mut() {
                    current.error = Some(e.to_string());
                }
            }
        }
    }

    fn sign_in(&mut self, form: &Form) -> Result<String, FormError> {
        let user = session::login(&*self.store, form.value("Email"), form.value("Password"))?;
        let message = format!("Welcome back, {}", user.name);
        self.household = Some(Household::load(Rc::clone(&self.store), user)?);
        Ok(message)
    }

    fn sign_up(&mut self, form: &Form) -> Result<String, FormError> {
        let user = session::signup(
            &*self.store,
            form.value("Name"),
            form.value("Email"),
            form.value("Password"),
        )?;
        let message = format!("Welcome, {}", user.name);
        self.household = Some(Household::load(Rc::clone(&self.store), user)?);
        Ok(message)
    }

    /// The typed item, filled from the catalog when a barcode is set and
    /// genre or name is still empty
    fn entry_draft(&self, form: &Form) -> Result<ItemDraft, FormError> {
        let mut draft = form.draft()?;
        let incomplete = draft.genre.trim().is_empty() || draft.name.trim().is_empty();
        if form.kind == FormKind::NewItem && draft.barcode.is_some() && incomplete {
            enrich_draft(&mut draft, &self.lookup, &self.gate)?;
        }
        Ok(draft)
    }

    fn check_history(&self, draft: &ItemDraft) -> Result<(), FormError> {
        let household = self.household.as_ref().ok_or(FormError::SignedOut)?;
        let (genre, name) = (draft.genre.trim(), draft.name.trim());
        if history_contains(household.history(), genre, name) {
            Ok(())
        } else {
            Err(HouseholdError::NotInHistory {
                genre: genre.to_string(),
                name: name.to_string(),
            }
            .into())
        }
    }

    /// Queue the typed item on the form and clear the fields for the next one
    pub fn stage_entry(&mut self) {
        let Some(form) = self.form.clone() else {
            return;
        };
        if !form.kind.stages_items() {
            return;
        }
        let staged = self.entry_draft(&form).and_then(|draft| {
            draft.validate()?;
            if form.kind == FormKind::Restock {
                self.check_history(&draft)?;
            }
            Ok(draft)
        });

        let Some(current) = self.form.as_mut() else {
            return;
        };
        match staged {
            Ok(draft) => {
                current.staged.push(draft);
                current.reset_entry();
            }
            Err(e) => current.error = Some(e.to_string()),
        }
    }

    /// Drop the most recently queued item
    pub fn unstage_last(&mut self) {
        if let Some(form) = self.form.as_mut() {
            form.error = match form.staged.pop() {
                Some(_) => None,
                None => Some("No items queued".to_string()),
            };
        }
    }

    /// Queued items plus the typed one. A blank entry is skipped when
    /// something is already queued.
    fn batch(&self, form: &Form) -> Result<Vec<ItemDraft>, FormError> {
        let mut drafts = form.staged.clone();
        if drafts.is_empty() || !form.entry_is_blank() {
            drafts.push(self.entry_draft(form)?);
        }
        Ok(drafts)
    }

    fn added_message(&mut self, verb: &str, added: &[Item]) -> String {
        let Some(last) = added.last() else {
            return "Nothing added".to_string();
        };
        let id = last.id.clone();
        let message = match added {
            [item] => format!("{} {} x{}", verb, item.name, item.quantity),
            _ => format!("{} {} items", verb, added.len()),
        };
        self.select_item_id(&id);
        message
    }

    fn submit_new_item(&mut self, form: &Form) -> Result<String, FormError> {
        let drafts = self.batch(form)?;
        let household = self.household.as_mut().ok_or(FormError::SignedOut)?;
        let added = household.add_items(&drafts)?;
        Ok(self.added_message("Added", &added))
    }

    fn submit_restock(&mut self, form: &Form) -> Result<String, FormError> {
        let drafts = self.batch(form)?;
        let household = self.household.as_mut().ok_or(FormError::SignedOut)?;
        let added = household.add_from_history(&drafts)?;
        Ok(self.added_message("Restocked", &added))
    }

    fn submit_edit(&mut self, id: &str, form: &Form) -> Result<String, FormError> {
        let household = self.household.as_mut().ok_or(FormError::SignedOut)?;
        let found = household.edit_item(id, form.value("Name"), form.value("Quantity"))?;
        Ok(if found {
            "Item updated".to_string()
        } else {
            "Item no longer exists".to_string()
        })
    }

    fn submit_event(&mut self, form: &Form) -> Result<String, FormError> {
        let household = self.household.as_mut().ok_or(FormError::SignedOut)?;
        let event = household.add_event(
            form.value("Title"),
            form.value("Date"),
            Some(form.value("Details")),
        )?;
        if let Ok(date) = parse_date(&event.date) {
            self.selected_date = date;
        }
        Ok(format!("Task '{}' added", event.title))
    }

    // Deletion

    pub fn request_delete(&mut self) {
        let target = if self.tab == Tab::Calendar {
            match self.selected_calendar_entry() {
                Some(event) if is_synthetic_event(&event) => {
                    self.set_status_message("Purchases come from items; delete the item on the Stock tab");
                    return;
                }
                Some(event) => ConfirmTarget::Event {
                    id: event.id,
                    label: event.title,
                },
                None => {
                    self.set_status_message("Nothing selected");
                    return;
                }
            }
        } else {
            match self.selected() {
                Some(item) => ConfirmTarget::Item {
                    id: item.id,
                    label: format!("{}: {}", item.genre, item.name),
                },
                None => {
                    self.set_status_message("No item selected");
                    return;
                }
            }
        };
        self.confirm_target = Some(target);
        self.confirm_selection = 0;
        self.mode = Mode::Confirm;
    }

    pub fn cancel_confirm(&mut self) {
        self.confirm_target = None;
        self.mode = Mode::View;
    }

    pub fn request_sign_out(&mut self) {
        let Some(household) = &self.household else {
            return;
        };
        let user = household.user();
        self.confirm_target = Some(ConfirmTarget::SignOut {
            label: format!("{} <{}>", user.name, user.email),
        });
        self.confirm_selection = 0;
        self.mode = Mode::Confirm;
    }

    /// End the session and go back to the sign-in form
    fn sign_out(&mut self) {
        if let Err(e) = session::logout(&*self.store) {
            tracing::warn!(error = %e, "sign out failed");
            self.set_status_message(format!("Failed to sign out: {}", e));
            return;
        }
        let email = self
            .household
            .take()
            .map(|h| h.user().email.clone())
            .unwrap_or_default();
        self.tab = Tab::Home;
        self.selected_item = 0;
        self.selected_entry = 0;
        self.search_query.clear();
        self.open_form(Form::login(&email));
        self.set_status_message("Signed out");
    }

    pub fn confirm_pending(&mut self) {
        self.mode = Mode::View;
        let Some(target) = self.confirm_target.take() else {
            return;
        };
        if let ConfirmTarget::SignOut { .. } = target {
            self.sign_out();
            return;
        }
        let Some(household) = self.household.as_mut() else {
            return;
        };
        let result = match &target {
            ConfirmTarget::Item { id, .. } => household.delete_item(id),
            ConfirmTarget::Event { id, .. } => household.delete_event(id),
            ConfirmTarget::SignOut { .. } => return,
        };
        match result {
            Ok(true) => self.set_status_message(format!("Deleted {} '{}'", target.kind(), target.label())),
            Ok(false) => self.set_status_message(format!("That {} no longer exists", target.kind())),
            Err(e) => {
                tracing::warn!(error = %e, "delete failed");
                self.set_status_message(format!("Failed to delete: {}", e));
            }
        }
        self.clamp_selection();
    }
}
