use chrono::{DateTime, SecondsFormat, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::utils::parse_date;

/// How an item entered the inventory
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    New,
    History,
}

impl Source {
    pub fn as_str(&self) -> &'static str {
        match self {
            Source::New => "new",
            Source::History => "history",
        }
    }
}

impl std::fmt::Display for Source {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    pub id: String,
    pub genre: String,
    pub name: String,
    pub quantity: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub barcode: Option<String>,
    pub added_date: String, // ISO 8601 timestamp, e.g. 2024-12-01T09:30:00.000Z
    pub source: Source,
}

impl Item {
    /// Stamp a validated draft with an id, the creation time and its source tag
    pub fn from_draft(draft: &ItemDraft, source: Source, now: DateTime<Utc>) -> Self {
        Self {
            id: format!("{}_{}", source.as_str(), Uuid::now_v7()),
            genre: draft.genre.trim().to_string(),
            name: draft.name.trim().to_string(),
            quantity: draft.quantity,
            barcode: draft
                .barcode
                .as_deref()
                .map(str::trim)
                .filter(|b| !b.is_empty())
                .map(str::to_string),
            added_date: now.to_rfc3339_opts(SecondsFormat::Millis, true),
            source,
        }
    }

    /// Calendar-date portion of `added_date` (time of day discarded)
    pub fn added_day(&self) -> &str {
        self.added_date
            .split_once('T')
            .map(|(day, _)| day)
            .unwrap_or(&self.added_date)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarEvent {
    pub id: String,
    pub title: String,
    pub date: String, // YYYY-MM-DD
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub name: String,
    pub email: String,
}

/// A registered account as kept in the `users` blob.
/// The password is stored as entered; hardening it is out of scope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredUser {
    pub name: String,
    pub email: String,
    pub password: String,
}

impl StoredUser {
    pub fn user(&self) -> User {
        User {
            name: self.name.clone(),
            email: self.email.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ItemHistoryEntry {
    pub genre: String,
    pub name: String,
}

/// An item being composed before it is added to the inventory
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ItemDraft {
    pub genre: String,
    pub name: String,
    pub quantity: u32,
    pub barcode: Option<String>,
}

impl ItemDraft {
    pub fn new(genre: impl Into<String>, name: impl Into<String>, quantity: u32) -> Self {
        Self {
            genre: genre.into(),
            name: name.into(),
            quantity,
            barcode: None,
        }
    }

    pub fn with_barcode(mut self, barcode: impl Into<String>) -> Self {
        self.barcode = Some(barcode.into());
        self
    }

    /// Genre, name and a quantity of at least one are required to add an item
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.genre.trim().is_empty() {
            return Err(ValidationError::Required("genre"));
        }
        if self.name.trim().is_empty() {
            return Err(ValidationError::Required("name"));
        }
        if self.quantity == 0 {
            return Err(ValidationError::ZeroQuantity);
        }
        Ok(())
    }
}

/// User input rejected before it reaches the inventory
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{0} is required")]
    Required(&'static str),
    #[error("Quantity must be a whole number of 0 or more, got '{0}'")]
    InvalidQuantity(String),
    #[error("Quantity must be at least 1")]
    ZeroQuantity,
    #[error("Invalid date '{0}' (expected YYYY-MM-DD)")]
    InvalidDate(String),
}

/// Parse a quantity typed by the user. Surrounding whitespace is ignored.
pub fn parse_quantity(raw: &str) -> Result<u32, ValidationError> {
    raw.trim()
        .parse::<u32>()
        .map_err(|_| ValidationError::InvalidQuantity(raw.to_string()))
}

/// Persisted data that fails to decode or breaks an entity invariant
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("Malformed JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("{entity} '{id}': {field} must not be empty")]
    EmptyField {
        entity: &'static str,
        id: String,
        field: &'static str,
    },
    #[error("Item '{id}': invalid addedDate '{value}'")]
    InvalidTimestamp { id: String, value: String },
    #[error("Event '{id}': invalid date '{value}'")]
    InvalidDate { id: String, value: String },
}

/// Invariants checked after a record is decoded from storage
pub trait Validate {
    fn validate(&self) -> Result<(), ParseError>;
}

fn require(entity: &'static str, id: &str, field: &'static str, value: &str) -> Result<(), ParseError> {
    if value.trim().is_empty() {
        return Err(ParseError::EmptyField {
            entity,
            id: id.to_string(),
            field,
        });
    }
    Ok(())
}

impl Validate for Item {
    fn validate(&self) -> Result<(), ParseError> {
        require("Item", &self.id, "id", &self.id)?;
        require("Item", &self.id, "genre", &self.genre)?;
        require("Item", &self.id, "name", &self.name)?;
        let invalid = || ParseError::InvalidTimestamp {
            id: self.id.clone(),
            value: self.added_date.clone(),
        };
        DateTime::parse_from_rfc3339(&self.added_date).map_err(|_| invalid())?;
        // the calendar day is read up to the 'T' separator
        if self.added_date.as_bytes().get(10) != Some(&b'T') {
            return Err(invalid());
        }
        Ok(())
    }
}

impl Validate for CalendarEvent {
    fn validate(&self) -> Result<(), ParseError> {
        require("Event", &self.id, "id", &self.id)?;
        require("Event", &self.id, "title", &self.title)?;
        let day = parse_date(&self.date).map_err(|_| ParseError::InvalidDate {
            id: self.id.clone(),
            value: self.date.clone(),
        })?;
        // day lookups compare the stored string, so it must be zero-padded
        if day.format("%Y-%m-%d").to_string() != self.date {
            return Err(ParseError::InvalidDate {
                id: self.id.clone(),
                value: self.date.clone(),
            });
        }
        Ok(())
    }
}

impl Validate for ItemHistoryEntry {
    fn validate(&self) -> Result<(), ParseError> {
        require("History entry", &self.name, "genre", &self.genre)?;
        require("History entry", &self.genre, "name", &self.name)
    }
}

impl Validate for User {
    fn validate(&self) -> Result<(), ParseError> {
        require("User", &self.name, "email", &self.email)
    }
}

impl Validate for StoredUser {
    fn validate(&self) -> Result<(), ParseError> {
        require("User", &self.name, "email", &self.email)
    }
}

/// Decode and validate a single record
pub fn parse_record<T>(value: serde_json::Value) -> Result<T, ParseError>
where
    T: DeserializeOwned + Validate,
{
    let record: T = serde_json::from_value(value)?;
    record.validate()?;
    Ok(record)
}

/// Decode and validate a JSON array of records
pub fn parse_records<T>(value: serde_json::Value) -> Result<Vec<T>, ParseError>
where
    T: DeserializeOwned + Validate,
{
    let records: Vec<T> = serde_json::from_value(value)?;
    for record in &records {
        record.validate()?;
    }
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    #[test]
    fn item_uses_camel_case_field_names() {
        let item = Item {
            id: "1".to_string(),
            genre: "Produce".to_string(),
            name: "Potato".to_string(),
            quantity: 2,
            barcode: None,
            added_date: "2024-12-01T00:00:00Z".to_string(),
            source: Source::New,
        };
        let value = serde_json::to_value(&item).unwrap();
        assert_eq!(value["addedDate"], "2024-12-01T00:00:00Z");
        assert_eq!(value["source"], "new");
        assert!(value.get("barcode").is_none());
    }

    #[test]
    fn parse_records_rejects_negative_quantity() {
        let value = json!([{
            "id": "1", "genre": "Dairy", "name": "Milk", "quantity": -1,
            "addedDate": "2024-12-02T00:00:00Z", "source": "history"
        }]);
        let err = parse_records::<Item>(value).unwrap_err();
        assert!(matches!(err, ParseError::Json(_)));
    }

    #[test]
    fn parse_records_rejects_bad_timestamp() {
        let value = json!([{
            "id": "1", "genre": "Dairy", "name": "Milk", "quantity": 1,
            "addedDate": "yesterday", "source": "new"
        }]);
        let err = parse_records::<Item>(value).unwrap_err();
        assert!(matches!(err, ParseError::InvalidTimestamp { .. }));
    }

    #[test]
    fn parse_records_rejects_unknown_source() {
        let value = json!([{
            "id": "1", "genre": "Dairy", "name": "Milk", "quantity": 1,
            "addedDate": "2024-12-02T00:00:00Z", "source": "gift"
        }]);
        assert!(parse_records::<Item>(value).is_err());
    }

    #[test]
    fn parse_records_accepts_browser_timestamps() {
        let value = json!([{
            "id": "new_1733011200000_0.42", "genre": "Dairy", "name": "Milk", "quantity": 0,
            "barcode": "4901234567894",
            "addedDate": "2024-12-02T03:04:05.678Z", "source": "new"
        }]);
        let items = parse_records::<Item>(value).unwrap();
        assert_eq!(items[0].barcode.as_deref(), Some("4901234567894"));
        assert_eq!(items[0].added_day(), "2024-12-02");
    }

    #[test]
    fn timestamps_need_the_t_separator() {
        let value = json!([{
            "id": "1", "genre": "Produce", "name": "Potato", "quantity": 2,
            "addedDate": "2024-12-01 00:00:00Z", "source": "new"
        }]);
        let err = parse_records::<Item>(value).unwrap_err();
        assert!(matches!(err, ParseError::InvalidTimestamp { .. }));
    }

    #[test]
    fn event_date_must_be_a_real_day() {
        let value = json!({"id": "e1", "title": "Shopping", "date": "2024-02-30"});
        let err = parse_record::<CalendarEvent>(value).unwrap_err();
        assert!(matches!(err, ParseError::InvalidDate { .. }));
    }

    #[test]
    fn event_date_must_be_zero_padded() {
        let value = json!({"id": "e1", "title": "Dentist", "date": "2024-12-5"});
        let err = parse_record::<CalendarEvent>(value).unwrap_err();
        assert!(matches!(err, ParseError::InvalidDate { .. }));

        let value = json!({"id": "e1", "title": "Dentist", "date": "2024-12-05"});
        assert!(parse_record::<CalendarEvent>(value).is_ok());
    }

    #[test]
    fn draft_validation() {
        assert_eq!(
            ItemDraft::new(" ", "Milk", 1).validate(),
            Err(ValidationError::Required("genre"))
        );
        assert_eq!(
            ItemDraft::new("Dairy", "", 1).validate(),
            Err(ValidationError::Required("name"))
        );
        assert_eq!(
            ItemDraft::new("Dairy", "Milk", 0).validate(),
            Err(ValidationError::ZeroQuantity)
        );
        assert!(ItemDraft::new("Dairy", "Milk", 3).validate().is_ok());
    }

    #[test]
    fn from_draft_stamps_metadata() {
        let now = Utc.with_ymd_and_hms(2024, 12, 1, 8, 0, 0).unwrap();
        let draft = ItemDraft::new(" Produce ", "Potato", 2).with_barcode("  ");
        let item = Item::from_draft(&draft, Source::History, now);

        assert!(item.id.starts_with("history_"));
        assert_eq!(item.genre, "Produce");
        assert_eq!(item.barcode, None);
        assert_eq!(item.added_date, "2024-12-01T08:00:00.000Z");
        assert_eq!(item.source, Source::History);
    }

    #[test]
    fn from_draft_ids_are_unique() {
        let now = Utc::now();
        let draft = ItemDraft::new("Produce", "Potato", 2);
        let a = Item::from_draft(&draft, Source::New, now);
        let b = Item::from_draft(&draft, Source::New, now);
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn quantity_parsing() {
        assert_eq!(parse_quantity(" 5 "), Ok(5));
        assert_eq!(parse_quantity("0"), Ok(0));
        assert!(parse_quantity("-1").is_err());
        assert!(parse_quantity("two").is_err());
        assert!(parse_quantity("").is_err());
    }
}
