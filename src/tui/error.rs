use thiserror::Error;

use crate::database::DatabaseError;
use crate::household::HouseholdError;
use crate::session::AuthError;

#[derive(Debug, Error)]
pub enum TuiError {
    #[error("IO/Terminal error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Database error: {0}")]
    DatabaseError(#[from] DatabaseError),

    #[error("Session error: {0}")]
    AuthError(#[from] AuthError),

    #[error("Failed to load household: {0}")]
    HouseholdError(#[from] HouseholdError),

    #[error("Key binding error: {0}")]
    KeyBindingError(String),

    #[error("Render error: {0}")]
    RenderError(String),
}
