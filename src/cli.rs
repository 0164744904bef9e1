use clap::{Parser, Subcommand};
use thiserror::Error;

use crate::calendar::{canonical_date, events_on, is_synthetic_event};
use crate::household::{Household, HouseholdError};
use crate::inventory::{GenreGroups, genre_totals, history_genres, history_names_for};
use crate::lookup::{Enrichment, LookupError, LookupGate, ProductLookup, enrich_draft};
use crate::models::{CalendarEvent, ItemDraft, ItemHistoryEntry, parse_quantity};
use crate::session::{self, AuthError};
use crate::storage::KeyValueStore;

#[derive(Parser)]
#[command(name = "larder")]
#[command(about = "Household inventory and shopping list - groceries, stock and a calendar of purchases")]
#[command(version)]
pub struct Cli {
    /// Custom config file path
    #[arg(short, long)]
    pub config: Option<String>,

    /// Use development mode (uses separate dev config/database)
    #[arg(long)]
    pub dev: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Launch interactive TUI (default if no subcommand)
    Tui,
    /// Create an account and sign in
    Signup {
        name: String,
        email: String,
        #[arg(long)]
        password: String,
    },
    /// Sign in to an existing account
    Login {
        email: String,
        #[arg(long)]
        password: String,
    },
    /// Sign out
    Logout,
    /// Show the signed-in user
    Whoami,
    /// Add newly bought items. Either all of them are added or none.
    Add {
        /// Genre (category), e.g. Produce. May be filled from --barcode
        genre: Option<String>,
        /// Item name. May be filled from --barcode
        name: Option<String>,
        #[arg(long, default_value_t = 1)]
        quantity: u32,
        /// Barcode; looked up in the config catalog
        #[arg(long)]
        barcode: Option<String>,
        /// Further items as GENRE:NAME[:QUANTITY]; repeatable
        #[arg(long = "item", value_name = "GENRE:NAME[:QUANTITY]", value_parser = parse_item_spec)]
        items: Vec<ItemDraft>,
    },
    /// Add items again from your item history. Either all of them are added or none.
    Restock {
        genre: Option<String>,
        name: Option<String>,
        #[arg(long, default_value_t = 1)]
        quantity: u32,
        /// Further items as GENRE:NAME[:QUANTITY]; repeatable
        #[arg(long = "item", value_name = "GENRE:NAME[:QUANTITY]", value_parser = parse_item_spec)]
        items: Vec<ItemDraft>,
    },
    /// List items grouped by genre
    List,
    /// Show remembered genre/name pairs
    History,
    /// Change an item's name and quantity
    Edit {
        id: String,
        #[arg(long)]
        name: String,
        #[arg(long)]
        quantity: String,
    },
    /// Delete an item
    Delete { id: String },
    /// Show calendar entries (manual events and purchases)
    Calendar {
        /// Only this day (YYYY-MM-DD)
        #[arg(long)]
        date: Option<String>,
        /// Only this month (YYYY-MM)
        #[arg(long, conflicts_with = "date")]
        month: Option<String>,
        /// Case-insensitive search over title, details and date
        #[arg(long)]
        search: Option<String>,
    },
    /// Add a calendar task or reminder
    AddEvent {
        title: String,
        /// Date (YYYY-MM-DD)
        date: String,
        #[arg(long)]
        description: Option<String>,
    },
    /// Delete a calendar task (purchases cannot be deleted here)
    DeleteEvent { id: String },
}

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error(transparent)]
    Household(#[from] HouseholdError),
    #[error(transparent)]
    Lookup(#[from] LookupError),
    #[error("Failed to parse date: {0}")]
    DateParseError(String),
    #[error("Nothing to add; give a genre and name or at least one --item")]
    NothingToAdd,
}

/// Parse `GENRE:NAME` or `GENRE:NAME:QUANTITY`. Quantity defaults to 1.
pub fn parse_item_spec(spec: &str) -> Result<ItemDraft, String> {
    let mut parts = spec.splitn(3, ':');
    let genre = parts.next().unwrap_or_default();
    let Some(name) = parts.next() else {
        return Err(format!("expected GENRE:NAME[:QUANTITY], got '{}'", spec));
    };
    let quantity = match parts.next() {
        Some(raw) => parse_quantity(raw).map_err(|e| e.to_string())?,
        None => 1,
    };
    Ok(ItemDraft::new(genre.trim(), name.trim(), quantity))
}

pub fn handle_signup<S>(name: &str, email: &str, password: &str, store: &S) -> Result<(), CliError>
where
    S: KeyValueStore + ?Sized,
{
    let user = session::signup(store, name, email, password)?;
    println!("Welcome, {}! You are signed in as {}", user.name, user.email);
    Ok(())
}

pub fn handle_login<S>(email: &str, password: &str, store: &S) -> Result<(), CliError>
where
    S: KeyValueStore + ?Sized,
{
    let user = session::login(store, email, password)?;
    println!("Signed in as {} <{}>", user.name, user.email);
    Ok(())
}

pub fn handle_logout<S>(store: &S) -> Result<(), CliError>
where
    S: KeyValueStore + ?Sized,
{
    session::logout(store)?;
    println!("Signed out");
    Ok(())
}

pub fn handle_whoami<S>(store: &S) -> Result<(), CliError>
where
    S: KeyValueStore + ?Sized,
{
    match session::current_user(store)? {
        Some(user) => println!("{} <{}>", user.name, user.email),
        None => println!("Not signed in"),
    }
    Ok(())
}

/// Handle the add command, consulting the catalog when a barcode is given
pub fn handle_add<S>(
    genre: Option<String>,
    name: Option<String>,
    quantity: u32,
    barcode: Option<String>,
    items: Vec<ItemDraft>,
    store: &S,
    lookup: &dyn ProductLookup,
) -> Result<(), CliError>
where
    S: KeyValueStore + ?Sized,
{
    let mut household = Household::for_current_user(store)?;

    let mut drafts = Vec::with_capacity(items.len() + 1);
    if genre.is_some() || name.is_some() || barcode.is_some() {
        let mut draft = ItemDraft::new(genre.unwrap_or_default(), name.unwrap_or_default(), quantity);
        draft.barcode = barcode;
        if draft.barcode.is_some() {
            let gate = LookupGate::new();
            if enrich_draft(&mut draft, lookup, &gate)? == Enrichment::NotFound {
                println!("No product found for that barcode; using the values you entered");
            }
        }
        drafts.push(draft);
    }
    drafts.extend(items);
    if drafts.is_empty() {
        return Err(CliError::NothingToAdd);
    }

    let added = household.add_items(&drafts)?;
    for item in added {
        println!(
            "Added {} x{} to {} (ID: {})",
            item.name, item.quantity, item.genre, item.id
        );
    }
    Ok(())
}

pub fn handle_restock<S>(
    genre: Option<String>,
    name: Option<String>,
    quantity: u32,
    items: Vec<ItemDraft>,
    store: &S,
) -> Result<(), CliError>
where
    S: KeyValueStore + ?Sized,
{
    let mut household = Household::for_current_user(store)?;

    let mut drafts = Vec::with_capacity(items.len() + 1);
    if genre.is_some() || name.is_some() {
        drafts.push(ItemDraft::new(genre.unwrap_or_default(), name.unwrap_or_default(), quantity));
    }
    drafts.extend(items);
    if drafts.is_empty() {
        return Err(CliError::NothingToAdd);
    }

    let added = household.add_from_history(&drafts)?;
    for item in added {
        println!("Restocked {} x{} (ID: {})", item.name, item.quantity, item.id);
    }
    Ok(())
}

pub fn handle_list<S>(store: &S) -> Result<(), CliError>
where
    S: KeyValueStore + ?Sized,
{
    let household = Household::for_current_user(store)?;
    print!("{}", format_groups(&household.groups()));
    Ok(())
}

pub fn handle_history<S>(store: &S) -> Result<(), CliError>
where
    S: KeyValueStore + ?Sized,
{
    let household = Household::for_current_user(store)?;
    print!("{}", format_history(household.history()));
    Ok(())
}

pub fn handle_edit<S>(id: &str, name: &str, quantity: &str, store: &S) -> Result<(), CliError>
where
    S: KeyValueStore + ?Sized,
{
    let mut household = Household::for_current_user(store)?;
    if household.edit_item(id, name, quantity)? {
        println!("Item {} updated", id);
    } else {
        println!("No item with ID {}; nothing changed", id);
    }
    Ok(())
}

pub fn handle_delete<S>(id: &str, store: &S) -> Result<(), CliError>
where
    S: KeyValueStore + ?Sized,
{
    let mut household = Household::for_current_user(store)?;
    if household.delete_item(id)? {
        println!("Item {} deleted", id);
    } else {
        println!("No item with ID {}; nothing changed", id);
    }
    Ok(())
}

pub fn handle_calendar<S>(
    date: Option<String>,
    month: Option<String>,
    search: Option<String>,
    store: &S,
) -> Result<(), CliError>
where
    S: KeyValueStore + ?Sized,
{
    let household = Household::for_current_user(store)?;
    let events = household.search(search.as_deref().unwrap_or(""));

    let selected: Vec<CalendarEvent> = if let Some(day) = date {
        let day = canonical_date(&day).map_err(|e| CliError::DateParseError(e.to_string()))?;
        events_on(&events, &day).into_iter().cloned().collect()
    } else if let Some(month) = month {
        crate::utils::parse_date(&format!("{}-01", month))
            .map_err(|e| CliError::DateParseError(format!("Invalid month format '{}': {}", month, e)))?;
        let prefix = format!("{}-", month);
        events.into_iter().filter(|e| e.date.starts_with(&prefix)).collect()
    } else {
        events
    };

    print!("{}", format_events(&selected));
    Ok(())
}

pub fn handle_add_event<S>(
    title: &str,
    date: &str,
    description: Option<&str>,
    store: &S,
) -> Result<(), CliError>
where
    S: KeyValueStore + ?Sized,
{
    let mut household = Household::for_current_user(store)?;
    let event = household.add_event(title, date, description)?;
    println!("Event created successfully (ID: {})", event.id);
    Ok(())
}

pub fn handle_delete_event<S>(id: &str, store: &S) -> Result<(), CliError>
where
    S: KeyValueStore + ?Sized,
{
    let mut household = Household::for_current_user(store)?;
    if household.delete_event(id)? {
        println!("Event {} deleted", id);
    } else {
        println!("No event with ID {}; nothing changed", id);
    }
    Ok(())
}

/// Genre sections with one line per item
pub fn format_groups(groups: &GenreGroups) -> String {
    if groups.is_empty() {
        return "No items yet. Add one with `larder add <genre> <name>`\n".to_string();
    }

    let totals = genre_totals(groups);
    let mut out = String::new();
    for ((genre, items), (_, total)) in groups.iter().zip(totals) {
        out.push_str(&format!("== {} ({} units) ==\n", genre, total));
        for item in items {
            out.push_str(&format!(
                "  {:<24} {:>5}  {}  {:<7}  {}\n",
                item.name,
                item.quantity,
                item.added_day(),
                item.source,
                item.id
            ));
        }
    }
    out
}

pub fn format_history(history: &[ItemHistoryEntry]) -> String {
    if history.is_empty() {
        return "No item history yet\n".to_string();
    }
    let mut out = String::new();
    for genre in history_genres(history) {
        out.push_str(&format!("{}: {}\n", genre, history_names_for(history, genre).join(", ")));
    }
    out
}

pub fn format_events(events: &[CalendarEvent]) -> String {
    if events.is_empty() {
        return "No calendar entries\n".to_string();
    }
    let mut out = String::new();
    for event in events {
        let marker = if is_synthetic_event(event) { "purchase" } else { "task" };
        out.push_str(&format!("{}  [{}] {}  ({})\n", event.date, marker, event.title, event.id));
        if let Some(description) = &event.description {
            for line in description.lines() {
                out.push_str(&format!("    {}\n", line));
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::project_items_as_events;
    use crate::inventory::fixtures::sample;
    use crate::inventory::group_by_genre;
    use crate::lookup::CatalogLookup;
    use crate::storage::MemoryStore;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_add_with_barcode() {
        let cli = Cli::try_parse_from(["larder", "add", "--barcode", "4901234567894"]).unwrap();
        match cli.command {
            Some(Commands::Add { genre, name, quantity, barcode, items }) => {
                assert_eq!(genre, None);
                assert_eq!(name, None);
                assert_eq!(quantity, 1);
                assert_eq!(barcode.as_deref(), Some("4901234567894"));
                assert!(items.is_empty());
            }
            _ => panic!("expected add"),
        }
    }

    #[test]
    fn groups_are_listed_in_first_seen_order() {
        let out = format_groups(&group_by_genre(&sample()));
        let produce = out.find("== Produce (2 units) ==").unwrap();
        let dairy = out.find("== Dairy (1 units) ==").unwrap();
        assert!(produce < dairy);
        assert!(out.contains("Potato"));
    }

    #[test]
    fn events_show_kind_and_details() {
        let out = format_events(&project_items_as_events(&sample()[..1]));
        assert!(out.starts_with("2024-12-01  [purchase] Produce: Potato  (item_1)"));
        assert!(out.contains("    Quantity: 2"));
        assert_eq!(format_events(&[]), "No calendar entries\n");
    }

    #[test]
    fn history_lists_names_per_genre() {
        let history = vec![
            ItemHistoryEntry { genre: "Dairy".into(), name: "Milk".into() },
            ItemHistoryEntry { genre: "Dairy".into(), name: "Butter".into() },
        ];
        assert_eq!(format_history(&history), "Dairy: Milk, Butter\n");
    }

    #[test]
    fn commands_need_a_session() {
        let store = MemoryStore::new();
        assert!(matches!(
            handle_list(&store),
            Err(CliError::Household(HouseholdError::Auth(AuthError::NotSignedIn)))
        ));
    }

    #[test]
    fn add_fills_from_catalog() {
        let store = MemoryStore::new();
        handle_signup("Ann", "ann@example.com", "pw", &store).unwrap();

        let mut entries = std::collections::HashMap::new();
        entries.insert(
            "4901234567894".to_string(),
            crate::lookup::ProductInfo { name: "Soy Sauce".into(), genre: "Seasonings".into() },
        );
        let catalog = CatalogLookup::new(entries);

        handle_add(None, None, 2, Some("4901234567894".into()), Vec::new(), &store, &catalog).unwrap();
        let household = Household::for_current_user(&store).unwrap();
        let item = &household.items()[0];
        assert_eq!(item.name, "Soy Sauce");
        assert_eq!(item.genre, "Seasonings");
        assert_eq!(item.barcode.as_deref(), Some("4901234567894"));
    }

    #[test]
    fn add_with_unknown_barcode_needs_manual_fields() {
        let store = MemoryStore::new();
        handle_signup("Ann", "ann@example.com", "pw", &store).unwrap();
        let catalog = CatalogLookup::default();
        assert!(matches!(
            handle_add(None, None, 1, Some("000".into()), Vec::new(), &store, &catalog),
            Err(CliError::Household(HouseholdError::Validation(_)))
        ));
        handle_add(
            Some("Misc".into()),
            Some("Mystery jar".into()),
            1,
            Some("000".into()),
            Vec::new(),
            &store,
            &catalog,
        )
        .unwrap();
    }

    #[test]
    fn item_specs() {
        assert_eq!(parse_item_spec("Dairy:Milk"), Ok(ItemDraft::new("Dairy", "Milk", 1)));
        assert_eq!(parse_item_spec(" Produce : Potato :3"), Ok(ItemDraft::new("Produce", "Potato", 3)));
        assert!(parse_item_spec("Milk").is_err());
        assert!(parse_item_spec("Dairy:Milk:two").is_err());

        let cli = Cli::try_parse_from([
            "larder", "add", "Produce", "Potato", "--item", "Dairy:Milk", "--item", "Frozen:Peas:2",
        ])
        .unwrap();
        match cli.command {
            Some(Commands::Add { items, .. }) => assert_eq!(items.len(), 2),
            _ => panic!("expected add"),
        }
    }

    #[test]
    fn batch_add_is_all_or_nothing() {
        let store = MemoryStore::new();
        handle_signup("Ann", "ann@example.com", "pw", &store).unwrap();
        let catalog = CatalogLookup::default();

        let batch = vec![ItemDraft::new("Dairy", "Milk", 1), ItemDraft::new("Dairy", "", 1)];
        assert!(matches!(
            handle_add(Some("Produce".into()), Some("Potato".into()), 2, None, batch, &store, &catalog),
            Err(CliError::Household(HouseholdError::Validation(_)))
        ));
        assert!(Household::for_current_user(&store).unwrap().items().is_empty());

        let batch = vec![ItemDraft::new("Dairy", "Milk", 1), ItemDraft::new("Frozen", "Peas", 2)];
        handle_add(None, None, 1, None, batch, &store, &catalog).unwrap();
        assert_eq!(Household::for_current_user(&store).unwrap().items().len(), 2);

        assert!(matches!(
            handle_add(None, None, 1, None, Vec::new(), &store, &catalog),
            Err(CliError::NothingToAdd)
        ));
    }

    #[test]
    fn batch_restock_needs_every_pair_in_history() {
        let store = MemoryStore::new();
        handle_signup("Ann", "ann@example.com", "pw", &store).unwrap();
        let catalog = CatalogLookup::default();
        handle_add(Some("Dairy".into()), Some("Milk".into()), 1, None, Vec::new(), &store, &catalog).unwrap();

        let unknown = vec![ItemDraft::new("Frozen", "Peas", 1)];
        assert!(matches!(
            handle_restock(Some("Dairy".into()), Some("Milk".into()), 2, unknown, &store),
            Err(CliError::Household(HouseholdError::NotInHistory { .. }))
        ));
        assert_eq!(Household::for_current_user(&store).unwrap().items().len(), 1);

        handle_restock(None, None, 1, vec![ItemDraft::new("Dairy", "Milk", 3)], &store).unwrap();
        assert_eq!(Household::for_current_user(&store).unwrap().items().len(), 2);
    }

    #[test]
    fn calendar_day_filter_accepts_short_dates() {
        let store = MemoryStore::new();
        handle_signup("Ann", "ann@example.com", "pw", &store).unwrap();
        handle_add_event("Dentist", "2024-12-5", None, &store).unwrap();
        let household = Household::for_current_user(&store).unwrap();
        assert_eq!(household.events()[0].date, "2024-12-05");
        handle_calendar(Some("2024-12-5".into()), None, None, &store).unwrap();
    }

    #[test]
    fn calendar_rejects_bad_filters() {
        let store = MemoryStore::new();
        handle_signup("Ann", "ann@example.com", "pw", &store).unwrap();
        assert!(matches!(
            handle_calendar(Some("2024-99-01".into()), None, None, &store),
            Err(CliError::DateParseError(_))
        ));
        assert!(matches!(
            handle_calendar(None, Some("2024-13".into()), None, &store),
            Err(CliError::DateParseError(_))
        ));
        handle_calendar(None, Some("2024-12".into()), Some("milk".into()), &store).unwrap();
    }
}
