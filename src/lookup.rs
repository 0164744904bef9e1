//! Barcode → product enrichment for the add-item flow.
//!
//! Lookups are single-flight: while one is running, [`LookupGate`] refuses to
//! start another for the same trigger. A miss is not a failure of the flow, it
//! just leaves the draft for manual entry.

use std::cell::Cell;
use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::ItemDraft;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductInfo {
    pub name: String,
    pub genre: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LookupError {
    #[error("No product found for barcode {0}")]
    NotFound(String),
    #[error("A barcode lookup is already in progress")]
    Busy,
}

pub trait ProductLookup {
    fn lookup(&self, barcode: &str) -> Result<ProductInfo, LookupError>;
}

/// Lookup backed by the `[catalog]` table of the config file
#[derive(Debug, Clone, Default)]
pub struct CatalogLookup {
    entries: HashMap<String, ProductInfo>,
}

impl CatalogLookup {
    pub fn new(entries: HashMap<String, ProductInfo>) -> Self {
        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl ProductLookup for CatalogLookup {
    fn lookup(&self, barcode: &str) -> Result<ProductInfo, LookupError> {
        let code = barcode.trim();
        self.entries
            .get(code)
            .cloned()
            .ok_or_else(|| LookupError::NotFound(code.to_string()))
    }
}

/// Boolean gate preventing duplicate concurrent lookups
#[derive(Debug, Default)]
pub struct LookupGate {
    in_flight: Cell<bool>,
}

impl LookupGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_busy(&self) -> bool {
        self.in_flight.get()
    }

    /// Claim the gate. Returns None while another lookup holds it.
    pub fn try_begin(&self) -> Option<LookupGuard<'_>> {
        if self.in_flight.replace(true) {
            return None;
        }
        Some(LookupGuard { gate: self })
    }
}

/// Holds the gate until dropped
#[derive(Debug)]
pub struct LookupGuard<'a> {
    gate: &'a LookupGate,
}

impl LookupGuard<'_> {
    /// Release early. Consumes the guard so a claim is cleared exactly once.
    pub fn release(self) {}
}

impl Drop for LookupGuard<'_> {
    fn drop(&mut self) {
        self.gate.in_flight.set(false);
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Enrichment {
    Filled(ProductInfo),
    NotFound,
}

/// Look the draft's barcode up and fill in whichever of genre and name are
/// still empty. Fields the user already typed are kept.
pub fn enrich_draft(
    draft: &mut ItemDraft,
    lookup: &dyn ProductLookup,
    gate: &LookupGate,
) -> Result<Enrichment, LookupError> {
    let Some(barcode) = draft.barcode.as_deref().map(str::trim).filter(|b| !b.is_empty()) else {
        return Ok(Enrichment::NotFound);
    };
    let barcode = barcode.to_string();
    let _guard = gate.try_begin().ok_or(LookupError::Busy)?;

    match lookup.lookup(&barcode) {
        Ok(info) => {
            tracing::debug!(%barcode, name = %info.name, "barcode lookup hit");
            if draft.genre.trim().is_empty() {
                draft.genre = info.genre.clone();
            }
            if draft.name.trim().is_empty() {
                draft.name = info.name.clone();
            }
            Ok(Enrichment::Filled(info))
        }
        Err(LookupError::NotFound(_)) => {
            tracing::debug!(%barcode, "barcode lookup miss");
            Ok(Enrichment::NotFound)
        }
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> CatalogLookup {
        let mut entries = HashMap::new();
        entries.insert(
            "4901234567894".to_string(),
            ProductInfo {
                name: "Soy Sauce".to_string(),
                genre: "Seasonings".to_string(),
            },
        );
        CatalogLookup::new(entries)
    }

    struct ReentrantLookup<'a> {
        gate: &'a LookupGate,
    }

    impl ProductLookup for ReentrantLookup<'_> {
        fn lookup(&self, _barcode: &str) -> Result<ProductInfo, LookupError> {
            // A second trigger arriving mid-lookup must be refused
            assert!(self.gate.is_busy());
            assert!(self.gate.try_begin().is_none());
            Err(LookupError::NotFound("x".to_string()))
        }
    }

    #[test]
    fn hit_fills_empty_fields_only() {
        let gate = LookupGate::new();
        let mut draft = ItemDraft::new("", "Dark Soy", 1).with_barcode("4901234567894");

        let outcome = enrich_draft(&mut draft, &catalog(), &gate).unwrap();
        assert!(matches!(outcome, Enrichment::Filled(_)));
        assert_eq!(draft.genre, "Seasonings");
        assert_eq!(draft.name, "Dark Soy");
        assert!(!gate.is_busy());
    }

    #[test]
    fn miss_leaves_draft_for_manual_entry() {
        let gate = LookupGate::new();
        let mut draft = ItemDraft::new("", "", 1).with_barcode("000");
        assert_eq!(enrich_draft(&mut draft, &catalog(), &gate), Ok(Enrichment::NotFound));
        assert_eq!(draft.name, "");
        assert!(!gate.is_busy());
    }

    #[test]
    fn gate_is_single_flight_and_released_after_failure() {
        let gate = LookupGate::new();
        let lookup = ReentrantLookup { gate: &gate };
        let mut draft = ItemDraft::new("", "", 1).with_barcode("123");

        assert_eq!(enrich_draft(&mut draft, &lookup, &gate), Ok(Enrichment::NotFound));
        assert!(!gate.is_busy());
    }

    #[test]
    fn busy_gate_rejects_lookup() {
        let gate = LookupGate::new();
        let guard = gate.try_begin().unwrap();
        let mut draft = ItemDraft::new("", "", 1).with_barcode("4901234567894");
        assert_eq!(enrich_draft(&mut draft, &catalog(), &gate), Err(LookupError::Busy));

        guard.release();
        assert!(!gate.is_busy());
        assert!(gate.try_begin().is_some());
    }

    #[test]
    fn released_guard_cannot_clear_a_later_claim() {
        let gate = LookupGate::new();
        let first = gate.try_begin().unwrap();
        first.release();

        let second = gate.try_begin().unwrap();
        assert!(gate.try_begin().is_none());
        assert!(gate.is_busy());

        drop(second);
        assert!(!gate.is_busy());
    }

    #[test]
    fn no_barcode_means_no_lookup() {
        let gate = LookupGate::new();
        let mut draft = ItemDraft::new("", "", 1);
        assert_eq!(enrich_draft(&mut draft, &catalog(), &gate), Ok(Enrichment::NotFound));
    }
}
