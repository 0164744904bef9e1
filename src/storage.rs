use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use serde::Serialize;
use thiserror::Error;

use crate::database::DatabaseError;
use crate::models::ParseError;

/// Fixed key names of the persisted blobs
pub mod keys {
    pub const CURRENT_USER: &str = "currentUser";
    pub const USERS: &str = "users";
    pub const ALL_USER_ITEMS: &str = "allUserItems";
    pub const USER_ITEM_HISTORIES: &str = "userItemHistories";
    pub const CALENDAR_EVENTS: &str = "calendarEvents";
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Storage backend error: {0}")]
    Backend(#[from] DatabaseError),
    #[error("Failed to encode value for '{key}': {source}")]
    Encode {
        key: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("Stored value for '{key}' is invalid: {source}")]
    Invalid {
        key: String,
        #[source]
        source: ParseError,
    },
}

/// Key → JSON text storage port
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;
    fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;
    fn remove(&self, key: &str) -> Result<(), StoreError>;
}

impl<T: KeyValueStore + ?Sized> KeyValueStore for &T {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        (**self).set(key, value)
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        (**self).remove(key)
    }
}

impl<T: KeyValueStore + ?Sized> KeyValueStore for Rc<T> {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        (**self).set(key, value)
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        (**self).remove(key)
    }
}

/// Read a key as parsed JSON. Missing keys yield None.
pub fn get_value<S>(store: &S, key: &str) -> Result<Option<serde_json::Value>, StoreError>
where
    S: KeyValueStore + ?Sized,
{
    let Some(text) = store.get(key)? else {
        return Ok(None);
    };
    serde_json::from_str(&text)
        .map(Some)
        .map_err(|e| StoreError::Invalid {
            key: key.to_string(),
            source: ParseError::Json(e),
        })
}

pub fn put_json<S, T>(store: &S, key: &str, value: &T) -> Result<(), StoreError>
where
    S: KeyValueStore + ?Sized,
    T: Serialize + ?Sized,
{
    let text = serde_json::to_string(value).map_err(|source| StoreError::Encode {
        key: key.to_string(),
        source,
    })?;
    store.set(key, &text)
}

/// Read one user's slice of an `email → value` blob
pub fn get_partition<S>(store: &S, key: &str, email: &str) -> Result<Option<serde_json::Value>, StoreError>
where
    S: KeyValueStore + ?Sized,
{
    let Some(value) = get_value(store, key)? else {
        return Ok(None);
    };
    match value {
        serde_json::Value::Object(mut map) => Ok(map.remove(email)),
        serde_json::Value::Null => Ok(None),
        _ => Err(StoreError::Invalid {
            key: key.to_string(),
            source: ParseError::Json(serde::de::Error::custom("expected an object keyed by email")),
        }),
    }
}

/// Replace one user's slice of an `email → value` blob, keeping every other user's entry as stored
pub fn put_partition<S, T>(store: &S, key: &str, email: &str, value: &T) -> Result<(), StoreError>
where
    S: KeyValueStore + ?Sized,
    T: Serialize + ?Sized,
{
    let mut map = match get_value(store, key)? {
        Some(serde_json::Value::Object(map)) => map,
        _ => serde_json::Map::new(),
    };
    let encoded = serde_json::to_value(value).map_err(|source| StoreError::Encode {
        key: key.to_string(),
        source,
    })?;
    map.insert(email.to_string(), encoded);
    put_json(store, key, &map)
}

/// In-process store, used by tests and throwaway sessions
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RefCell<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.entries.borrow().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.entries
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.entries.borrow_mut().remove(key);
        Ok(())
    }
}
