use std::collections::HashMap;

use chrono::{DateTime, Utc};

use crate::models::{Item, ItemDraft, ItemHistoryEntry, Source, ValidationError};

/// Items grouped by genre, keys kept in the order each genre first appeared
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GenreGroups {
    groups: Vec<(String, Vec<Item>)>,
}

impl GenreGroups {
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn genres(&self) -> impl Iterator<Item = &str> {
        self.groups.iter().map(|(genre, _)| genre.as_str())
    }

    pub fn get(&self, genre: &str) -> Option<&[Item]> {
        self.groups
            .iter()
            .find(|(g, _)| g == genre)
            .map(|(_, items)| items.as_slice())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[Item])> {
        self.groups
            .iter()
            .map(|(genre, items)| (genre.as_str(), items.as_slice()))
    }

    /// Items in display order: group by group, input order inside a group
    pub fn flatten(&self) -> Vec<&Item> {
        self.groups.iter().flat_map(|(_, items)| items.iter()).collect()
    }
}

/// Partition items by genre. Genres keep first-occurrence order; items keep input order.
pub fn group_by_genre(items: &[Item]) -> GenreGroups {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut groups: Vec<(String, Vec<Item>)> = Vec::new();

    for item in items {
        let slot = *index.entry(item.genre.as_str()).or_insert_with(|| {
            groups.push((item.genre.clone(), Vec::new()));
            groups.len() - 1
        });
        groups[slot].1.push(item.clone());
    }

    GenreGroups { groups }
}

/// Remember a `(genre, name)` pair. Returns false if the exact pair was already known.
pub fn record_history(history: &mut Vec<ItemHistoryEntry>, genre: &str, name: &str) -> bool {
    if history_contains(history, genre, name) {
        return false;
    }
    history.push(ItemHistoryEntry {
        genre: genre.to_string(),
        name: name.to_string(),
    });
    true
}

pub fn history_contains(history: &[ItemHistoryEntry], genre: &str, name: &str) -> bool {
    history.iter().any(|h| h.genre == genre && h.name == name)
}

/// Distinct non-empty genres in the history, first-seen order
pub fn history_genres(history: &[ItemHistoryEntry]) -> Vec<&str> {
    let mut genres: Vec<&str> = Vec::new();
    for entry in history {
        let genre = entry.genre.as_str();
        if !genre.is_empty() && !genres.contains(&genre) {
            genres.push(genre);
        }
    }
    genres
}

pub fn history_names_for<'a>(history: &'a [ItemHistoryEntry], genre: &str) -> Vec<&'a str> {
    history
        .iter()
        .filter(|h| h.genre == genre)
        .map(|h| h.name.as_str())
        .collect()
}

/// Validate every draft, then turn them into items sharing one timestamp.
/// Nothing is produced if any draft is invalid.
pub fn materialize(
    drafts: &[ItemDraft],
    source: Source,
    now: DateTime<Utc>,
) -> Result<Vec<Item>, ValidationError> {
    for draft in drafts {
        draft.validate()?;
    }
    Ok(drafts
        .iter()
        .map(|draft| Item::from_draft(draft, source, now))
        .collect())
}

/// Total units held per genre, in group order
pub fn genre_totals(groups: &GenreGroups) -> Vec<(&str, u64)> {
    groups
        .iter()
        .map(|(genre, items)| (genre, items.iter().map(|i| u64::from(i.quantity)).sum()))
        .collect()
}

#[cfg(test)]
pub(crate) mod fixtures {
    use crate::models::{Item, Source};

    pub fn item(id: &str, genre: &str, name: &str, quantity: u32, added: &str, source: Source) -> Item {
        Item {
            id: id.to_string(),
            genre: genre.to_string(),
            name: name.to_string(),
            quantity,
            barcode: None,
            added_date: added.to_string(),
            source,
        }
    }

    /// The potato/milk pair used throughout the docs
    pub fn sample() -> Vec<Item> {
        vec![
            item("1", "Produce", "Potato", 2, "2024-12-01T00:00:00Z", Source::New),
            item("2", "Dairy", "Milk", 1, "2024-12-02T00:00:00Z", Source::History),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::{item, sample};
    use super::*;
    use chrono::TimeZone;
    use proptest::prelude::*;

    #[test]
    fn groups_sample_in_first_seen_order() {
        let items = sample();
        let groups = group_by_genre(&items);

        assert_eq!(groups.genres().collect::<Vec<_>>(), vec!["Produce", "Dairy"]);
        assert_eq!(groups.get("Produce").unwrap(), &items[0..1]);
        assert_eq!(groups.get("Dairy").unwrap(), &items[1..2]);
    }

    #[test]
    fn empty_input_gives_empty_groups() {
        let groups = group_by_genre(&[]);
        assert!(groups.is_empty());
        assert_eq!(groups.len(), 0);
    }

    #[test]
    fn interleaved_genres_keep_item_order() {
        let items = vec![
            item("a", "Dairy", "Milk", 1, "2024-12-01T00:00:00Z", Source::New),
            item("b", "Produce", "Onion", 1, "2024-12-01T00:00:00Z", Source::New),
            item("c", "Dairy", "Butter", 1, "2024-12-01T00:00:00Z", Source::New),
        ];
        let groups = group_by_genre(&items);
        let dairy: Vec<_> = groups.get("Dairy").unwrap().iter().map(|i| i.id.as_str()).collect();
        assert_eq!(dairy, vec!["a", "c"]);
        let flat: Vec<_> = groups.flatten().iter().map(|i| i.id.as_str()).collect();
        assert_eq!(flat, vec!["a", "c", "b"]);
    }

    #[test]
    fn genre_labels_are_case_sensitive() {
        let items = vec![
            item("a", "dairy", "Milk", 1, "2024-12-01T00:00:00Z", Source::New),
            item("b", "Dairy", "Cream", 1, "2024-12-01T00:00:00Z", Source::New),
        ];
        assert_eq!(group_by_genre(&items).len(), 2);
    }

    #[test]
    fn history_is_deduplicated_by_pair() {
        let mut history = Vec::new();
        assert!(record_history(&mut history, "Dairy", "Milk"));
        assert!(!record_history(&mut history, "Dairy", "Milk"));
        assert!(record_history(&mut history, "Dairy", "Butter"));
        assert!(record_history(&mut history, "Baking", "Butter"));
        assert_eq!(history.len(), 3);

        assert_eq!(history_genres(&history), vec!["Dairy", "Baking"]);
        assert_eq!(history_names_for(&history, "Dairy"), vec!["Milk", "Butter"]);
        assert!(history_names_for(&history, "Frozen").is_empty());
    }

    #[test]
    fn materialize_is_all_or_nothing() {
        let now = Utc.with_ymd_and_hms(2024, 12, 3, 0, 0, 0).unwrap();
        let drafts = vec![
            ItemDraft::new("Dairy", "Milk", 1),
            ItemDraft::new("Dairy", "", 1),
        ];
        assert_eq!(
            materialize(&drafts, Source::New, now),
            Err(ValidationError::Required("name"))
        );

        let items = materialize(&drafts[..1], Source::New, now).unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].added_day(), "2024-12-03");
    }

    #[test]
    fn totals_per_genre() {
        let mut items = sample();
        items.push(item("3", "Produce", "Onion", 4, "2024-12-03T00:00:00Z", Source::New));
        let groups = group_by_genre(&items);
        assert_eq!(genre_totals(&groups), vec![("Produce", 6), ("Dairy", 1)]);
    }

    fn arb_items() -> impl Strategy<Value = Vec<Item>> {
        prop::collection::vec(("[A-C]", "[a-z]{1,6}", 0u32..20), 0..40).prop_map(|rows| {
            rows.into_iter()
                .enumerate()
                .map(|(i, (genre, name, qty))| {
                    item(&i.to_string(), &genre, &name, qty, "2024-12-01T00:00:00Z", Source::New)
                })
                .collect()
        })
    }

    proptest! {
        #[test]
        fn grouping_partitions_input_exactly(items in arb_items()) {
            let groups = group_by_genre(&items);
            let total: usize = groups.iter().map(|(_, g)| g.len()).sum();
            prop_assert_eq!(total, items.len());

            for (genre, group) in groups.iter() {
                prop_assert!(group.iter().all(|i| i.genre == genre));
                let expected: Vec<&Item> = items.iter().filter(|i| i.genre == genre).collect();
                let actual: Vec<&Item> = group.iter().collect();
                prop_assert_eq!(actual, expected);
            }
        }

        #[test]
        fn genre_keys_follow_first_appearance(items in arb_items()) {
            let mut expected: Vec<&str> = Vec::new();
            for i in &items {
                if !expected.contains(&i.genre.as_str()) {
                    expected.push(i.genre.as_str());
                }
            }
            let groups = group_by_genre(&items);
            prop_assert_eq!(groups.genres().collect::<Vec<_>>(), expected);
        }
    }
}
