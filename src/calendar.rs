use chrono::{Datelike, Months, NaiveDate};
use thiserror::Error;
use uuid::Uuid;

use crate::models::{CalendarEvent, Item, ValidationError};
use crate::utils::parse_date;

/// Id prefix marking events derived from items
pub const SYNTHETIC_PREFIX: &str = "item_";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CalendarError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("Event '{0}' is derived from an item and cannot be changed here")]
    ReadOnly(String),
}

/// Project one item onto the calendar as a read-only event
pub fn project_item_as_event(item: &Item) -> CalendarEvent {
    let mut description = format!(
        "Item: {}\nGenre: {}\nQuantity: {}\nSource: {}",
        item.name, item.genre, item.quantity, item.source
    );
    if let Some(barcode) = &item.barcode {
        description.push_str("\nBarcode: ");
        description.push_str(barcode);
    }

    CalendarEvent {
        id: format!("{}{}", SYNTHETIC_PREFIX, item.id),
        title: format!("{}: {}", item.genre, item.name),
        date: item.added_day().to_string(),
        description: Some(description),
    }
}

pub fn project_items_as_events(items: &[Item]) -> Vec<CalendarEvent> {
    items.iter().map(project_item_as_event).collect()
}

pub fn is_synthetic_event(event: &CalendarEvent) -> bool {
    event.id.starts_with(SYNTHETIC_PREFIX)
}

/// Manual events first, then one synthetic event per item
pub fn all_events(manual: &[CalendarEvent], items: &[Item]) -> Vec<CalendarEvent> {
    let mut events = manual.to_vec();
    events.extend(project_items_as_events(items));
    events
}

/// Case-insensitive substring search over title and description, plain
/// substring over the date. A blank query returns every event.
pub fn search_events(events: &[CalendarEvent], query: &str) -> Vec<CalendarEvent> {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return events.to_vec();
    }

    events
        .iter()
        .filter(|event| {
            event.title.to_lowercase().contains(&needle)
                || event
                    .description
                    .as_deref()
                    .is_some_and(|d| d.to_lowercase().contains(&needle))
                || event.date.contains(&needle)
        })
        .cloned()
        .collect()
}

pub fn events_on<'a>(events: &'a [CalendarEvent], date: &str) -> Vec<&'a CalendarEvent> {
    events.iter().filter(|e| e.date == date).collect()
}

pub fn items_on<'a>(items: &'a [Item], date: &str) -> Vec<&'a Item> {
    items.iter().filter(|i| i.added_day() == date).collect()
}

/// Parse a calendar date and render it as zero-padded `YYYY-MM-DD`
pub fn canonical_date(date: &str) -> Result<String, ValidationError> {
    let date = date.trim();
    parse_date(date)
        .map(|d| d.format("%Y-%m-%d").to_string())
        .map_err(|_| ValidationError::InvalidDate(date.to_string()))
}

/// Build a manual event. A blank description is dropped.
pub fn new_event(title: &str, date: &str, description: Option<&str>) -> Result<CalendarEvent, CalendarError> {
    let title = title.trim();
    if title.is_empty() {
        return Err(ValidationError::Required("title").into());
    }
    let date = canonical_date(date)?;

    Ok(CalendarEvent {
        id: Uuid::now_v7().to_string(),
        title: title.to_string(),
        date,
        description: description
            .map(str::trim)
            .filter(|d| !d.is_empty())
            .map(str::to_string),
    })
}

/// Remove a manual event. Unknown ids leave the list unchanged.
pub fn delete_event(events: &[CalendarEvent], id: &str) -> Result<Vec<CalendarEvent>, CalendarError> {
    if id.starts_with(SYNTHETIC_PREFIX) {
        return Err(CalendarError::ReadOnly(id.to_string()));
    }
    Ok(events.iter().filter(|e| e.id != id).cloned().collect())
}

/// Cells of a Sunday-first month view: leading blanks, then day numbers.
/// Returns None for an invalid year/month.
pub fn month_grid(year: i32, month: u32) -> Option<Vec<Option<u32>>> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    let last = first.checked_add_months(Months::new(1))?.pred_opt()?;
    let leading = first.weekday().num_days_from_sunday() as usize;

    let mut cells = vec![None; leading];
    cells.extend((1..=last.day()).map(Some));
    Some(cells)
}

/// `YYYY-MM-DD` for a day of the given month
pub fn day_key(year: i32, month: u32, day: u32) -> String {
    format!("{:04}-{:02}-{:02}", year, month, day)
}
