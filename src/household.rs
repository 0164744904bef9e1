//! Per-user application state.
//!
//! A [`Household`] is the signed-in user's items, item history and calendar
//! events, loaded from a [`KeyValueStore`]. Every mutation runs the pure
//! operations from `inventory`, `stock` and `calendar`, then writes back only
//! this user's slice of each blob.

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::calendar::{self, CalendarError};
use crate::inventory::{self, GenreGroups};
use crate::models::{
    CalendarEvent, Item, ItemDraft, ItemHistoryEntry, Source, User, ValidationError, parse_records,
};
use crate::session::{self, AuthError};
use crate::stock::{self, EditError};
use crate::storage::{KeyValueStore, StoreError, get_partition, keys, put_partition};

#[derive(Debug, Error)]
pub enum HouseholdError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Edit(#[from] EditError),
    #[error(transparent)]
    Calendar(#[from] CalendarError),
    #[error("'{genre}: {name}' is not in your item history")]
    NotInHistory { genre: String, name: String },
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

pub struct Household<S: KeyValueStore> {
    store: S,
    user: User,
    items: Vec<Item>,
    history: Vec<ItemHistoryEntry>,
    events: Vec<CalendarEvent>,
}

fn load_slice<S, T>(store: &S, key: &str, email: &str) -> Result<Vec<T>, StoreError>
where
    S: KeyValueStore,
    T: serde::de::DeserializeOwned + crate::models::Validate,
{
    match get_partition(store, key, email)? {
        Some(value) => parse_records(value).map_err(|source| StoreError::Invalid {
            key: key.to_string(),
            source,
        }),
        None => Ok(Vec::new()),
    }
}

impl<S: KeyValueStore> Household<S> {
    /// Load everything stored for `user`
    pub fn load(store: S, user: User) -> Result<Self, HouseholdError> {
        let items = load_slice(&store, keys::ALL_USER_ITEMS, &user.email)?;
        let history = load_slice(&store, keys::USER_ITEM_HISTORIES, &user.email)?;
        let events = load_slice(&store, keys::CALENDAR_EVENTS, &user.email)?;
        tracing::debug!(
            email = %user.email,
            items = items.len(),
            history = history.len(),
            events = events.len(),
            "household loaded"
        );

        Ok(Self {
            store,
            user,
            items,
            history,
            events,
        })
    }

    /// Load the household of whoever is signed in
    pub fn for_current_user(store: S) -> Result<Self, HouseholdError> {
        let user = session::require_user(&store)?;
        Self::load(store, user)
    }

    pub fn user(&self) -> &User {
        &self.user
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn items(&self) -> &[Item] {
        &self.items
    }

    pub fn history(&self) -> &[ItemHistoryEntry] {
        &self.history
    }

    /// Manually created events only
    pub fn events(&self) -> &[CalendarEvent] {
        &self.events
    }

    pub fn find_item(&self, id: &str) -> Option<&Item> {
        self.items.iter().find(|i| i.id == id)
    }

    pub fn groups(&self) -> GenreGroups {
        inventory::group_by_genre(&self.items)
    }

    /// Manual events plus item-derived ones, derived fresh on each call
    pub fn all_events(&self) -> Vec<CalendarEvent> {
        calendar::all_events(&self.events, &self.items)
    }

    pub fn search(&self, query: &str) -> Vec<CalendarEvent> {
        calendar::search_events(&self.all_events(), query)
    }

    /// Add freshly entered items and remember their `(genre, name)` pairs
    pub fn add_items(&mut self, drafts: &[ItemDraft]) -> Result<Vec<Item>, HouseholdError> {
        self.add_items_at(drafts, Utc::now())
    }

    pub fn add_items_at(
        &mut self,
        drafts: &[ItemDraft],
        now: DateTime<Utc>,
    ) -> Result<Vec<Item>, HouseholdError> {
        let added = inventory::materialize(drafts, Source::New, now)?;

        let mut history = self.history.clone();
        let mut history_changed = false;
        for item in &added {
            history_changed |= inventory::record_history(&mut history, &item.genre, &item.name);
        }
        let mut items = self.items.clone();
        items.extend(added.iter().cloned());

        self.save_items(&items)?;
        self.items = items;
        if history_changed {
            self.save_history(&history)?;
            self.history = history;
        }
        tracing::info!(count = added.len(), "items added");
        Ok(added)
    }

    /// Re-add items recalled from the history. Every pair must already be known.
    pub fn add_from_history(&mut self, drafts: &[ItemDraft]) -> Result<Vec<Item>, HouseholdError> {
        self.add_from_history_at(drafts, Utc::now())
    }

    pub fn add_from_history_at(
        &mut self,
        drafts: &[ItemDraft],
        now: DateTime<Utc>,
    ) -> Result<Vec<Item>, HouseholdError> {
        for draft in drafts {
            let (genre, name) = (draft.genre.trim(), draft.name.trim());
            if !inventory::history_contains(&self.history, genre, name) {
                return Err(HouseholdError::NotInHistory {
                    genre: genre.to_string(),
                    name: name.to_string(),
                });
            }
        }
        let added = inventory::materialize(drafts, Source::History, now)?;
        let mut items = self.items.clone();
        items.extend(added.iter().cloned());
        self.save_items(&items)?;
        self.items = items;
        tracing::info!(count = added.len(), "items restocked from history");
        Ok(added)
    }

    /// Edit name and quantity. Returns false when no item has `id`.
    pub fn edit_item(&mut self, id: &str, name: &str, quantity: &str) -> Result<bool, HouseholdError> {
        let updated = stock::apply_edit(&self.items, id, name, quantity)?;
        let found = self.find_item(id).is_some();
        if found {
            self.save_items(&updated)?;
            self.items = updated;
            tracing::info!(%id, "item edited");
        }
        Ok(found)
    }

    /// Delete an item. Returns false when no item has `id`.
    pub fn delete_item(&mut self, id: &str) -> Result<bool, HouseholdError> {
        let remaining = stock::apply_delete(&self.items, id);
        let removed = remaining.len() != self.items.len();
        if removed {
            self.save_items(&remaining)?;
            self.items = remaining;
            tracing::info!(%id, "item deleted");
        }
        Ok(removed)
    }

    pub fn add_event(
        &mut self,
        title: &str,
        date: &str,
        description: Option<&str>,
    ) -> Result<CalendarEvent, HouseholdError> {
        let event = calendar::new_event(title, date, description)?;
        let mut events = self.events.clone();
        events.push(event.clone());
        self.save_events(&events)?;
        self.events = events;
        tracing::info!(id = %event.id, date = %event.date, "event added");
        Ok(event)
    }

    /// Delete a manual event. Item-derived events are refused.
    pub fn delete_event(&mut self, id: &str) -> Result<bool, HouseholdError> {
        let remaining = calendar::delete_event(&self.events, id)?;
        let removed = remaining.len() != self.events.len();
        if removed {
            self.save_events(&remaining)?;
            self.events = remaining;
            tracing::info!(%id, "event deleted");
        }
        Ok(removed)
    }

    // Mutations persist the new slice first and only then replace the
    // in-memory copy, so a failed write leaves the household unchanged.
    fn save_items(&self, items: &[Item]) -> Result<(), StoreError> {
        put_partition(&self.store, keys::ALL_USER_ITEMS, &self.user.email, items)
    }

    fn save_history(&self, history: &[ItemHistoryEntry]) -> Result<(), StoreError> {
        put_partition(&self.store, keys::USER_ITEM_HISTORIES, &self.user.email, history)
    }

    fn save_events(&self, events: &[CalendarEvent]) -> Result<(), StoreError> {
        put_partition(&self.store, keys::CALENDAR_EVENTS, &self.user.email, events)
    }
}
