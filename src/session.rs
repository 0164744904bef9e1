//! Sign-up, login and the persisted current user.
//!
//! Accounts live in the `users` blob with their password as typed, mirroring
//! the browser app this data is shared with.

use thiserror::Error;

use crate::models::{StoredUser, User, parse_record, parse_records};
use crate::storage::{KeyValueStore, StoreError, get_value, keys, put_json};

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("{0} is required")]
    Required(&'static str),
    #[error("The email address {0} is already registered")]
    EmailTaken(String),
    #[error("Email address or password is incorrect")]
    InvalidCredentials,
    #[error("Not signed in")]
    NotSignedIn,
    #[error(transparent)]
    Store(#[from] StoreError),
}

fn load_users<S>(store: &S) -> Result<Vec<StoredUser>, StoreError>
where
    S: KeyValueStore + ?Sized,
{
    match get_value(store, keys::USERS)? {
        Some(value) => parse_records(value).map_err(|source| StoreError::Invalid {
            key: keys::USERS.to_string(),
            source,
        }),
        None => Ok(Vec::new()),
    }
}

fn set_current_user<S>(store: &S, user: &User) -> Result<(), StoreError>
where
    S: KeyValueStore + ?Sized,
{
    put_json(store, keys::CURRENT_USER, user)
}

/// Register a new account and sign it in
pub fn signup<S>(store: &S, name: &str, email: &str, password: &str) -> Result<User, AuthError>
where
    S: KeyValueStore + ?Sized,
{
    let (name, email) = (name.trim(), email.trim());
    if name.is_empty() {
        return Err(AuthError::Required("name"));
    }
    if email.is_empty() {
        return Err(AuthError::Required("email"));
    }
    if password.is_empty() {
        return Err(AuthError::Required("password"));
    }

    let mut users = load_users(store)?;
    if users.iter().any(|u| u.email == email) {
        return Err(AuthError::EmailTaken(email.to_string()));
    }

    let stored = StoredUser {
        name: name.to_string(),
        email: email.to_string(),
        password: password.to_string(),
    };
    let user = stored.user();
    users.push(stored);
    put_json(store, keys::USERS, &users)?;
    set_current_user(store, &user)?;

    tracing::info!(email = %user.email, "account created");
    Ok(user)
}

pub fn login<S>(store: &S, email: &str, password: &str) -> Result<User, AuthError>
where
    S: KeyValueStore + ?Sized,
{
    let email = email.trim();
    let users = load_users(store)?;
    let Some(found) = users
        .iter()
        .find(|u| u.email == email && u.password == password)
    else {
        tracing::warn!(%email, "login rejected");
        return Err(AuthError::InvalidCredentials);
    };

    let user = found.user();
    set_current_user(store, &user)?;
    tracing::info!(email = %user.email, "signed in");
    Ok(user)
}

/// Forget the current user. Calling it while signed out is fine.
pub fn logout<S>(store: &S) -> Result<(), AuthError>
where
    S: KeyValueStore + ?Sized,
{
    store.remove(keys::CURRENT_USER)?;
    tracing::info!("signed out");
    Ok(())
}

pub fn current_user<S>(store: &S) -> Result<Option<User>, AuthError>
where
    S: KeyValueStore + ?Sized,
{
    match get_value(store, keys::CURRENT_USER)? {
        Some(serde_json::Value::Null) | None => Ok(None),
        Some(value) => {
            let user = parse_record(value).map_err(|source| StoreError::Invalid {
                key: keys::CURRENT_USER.to_string(),
                source,
            })?;
            Ok(Some(user))
        }
    }
}

pub fn require_user<S>(store: &S) -> Result<User, AuthError>
where
    S: KeyValueStore + ?Sized,
{
    current_user(store)?.ok_or(AuthError::NotSignedIn)
}
