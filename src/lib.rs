pub mod calendar;
pub mod cli;
pub mod config;
pub mod database;
pub mod household;
pub mod inventory;
pub mod logging;
pub mod lookup;
pub mod models;
pub mod session;
pub mod stock;
pub mod storage;
pub mod tui;
pub mod utils;

pub use config::Config;
pub use database::Database;
pub use household::Household;
pub use models::{CalendarEvent, Item, ItemDraft, ItemHistoryEntry, Source, User};
pub use storage::{KeyValueStore, MemoryStore};
pub use utils::Profile;
