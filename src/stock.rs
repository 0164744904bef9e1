use thiserror::Error;

use crate::models::{Item, ValidationError, parse_quantity};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EditError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
}

/// Replace the name and quantity of the item with `id`.
///
/// The name must not be blank and the quantity must parse as a whole number
/// of zero or more; otherwise nothing changes and the error is returned.
/// An unknown id is not an error: the collection comes back unchanged.
pub fn apply_edit(
    items: &[Item],
    id: &str,
    new_name: &str,
    new_quantity: &str,
) -> Result<Vec<Item>, EditError> {
    let name = new_name.trim();
    if name.is_empty() {
        return Err(ValidationError::Required("name").into());
    }
    let quantity = parse_quantity(new_quantity)?;

    Ok(items
        .iter()
        .map(|item| {
            if item.id == id {
                Item {
                    name: name.to_string(),
                    quantity,
                    ..item.clone()
                }
            } else {
                item.clone()
            }
        })
        .collect())
}

/// Drop the item with `id`. Unknown ids are a no-op.
pub fn apply_delete(items: &[Item], id: &str) -> Vec<Item> {
    items.iter().filter(|item| item.id != id).cloned().collect()
}

/// One step of the +/- quantity buttons; never goes below zero
pub fn step_quantity(current: u32, increment: bool) -> u32 {
    if increment {
        current.saturating_add(1)
    } else {
        current.saturating_sub(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inventory::fixtures::sample;
    use proptest::prelude::*;

    #[test]
    fn edit_replaces_name_and_quantity_only() {
        let items = sample();
        let edited = apply_edit(&items, "1", "Sweet Potato", "5").unwrap();

        assert_eq!(edited[0].name, "Sweet Potato");
        assert_eq!(edited[0].quantity, 5);
        assert_eq!(edited[0].id, items[0].id);
        assert_eq!(edited[0].genre, items[0].genre);
        assert_eq!(edited[0].added_date, items[0].added_date);
        assert_eq!(edited[0].source, items[0].source);
        assert_eq!(edited[1], items[1]);
    }

    #[test]
    fn edit_rejects_blank_name() {
        let items = sample();
        assert_eq!(
            apply_edit(&items, "1", "", "5"),
            Err(EditError::Validation(ValidationError::Required("name")))
        );
        assert!(apply_edit(&items, "1", "   ", "5").is_err());
    }

    #[test]
    fn edit_rejects_bad_quantity() {
        let items = sample();
        for raw in ["-1", "abc", "", "1.5"] {
            assert!(
                matches!(
                    apply_edit(&items, "1", "Potato", raw),
                    Err(EditError::Validation(ValidationError::InvalidQuantity(_)))
                ),
                "quantity {raw:?} should be rejected"
            );
        }
    }

    #[test]
    fn edit_accepts_zero_and_trims() {
        let items = sample();
        let edited = apply_edit(&items, "2", "  Oat Milk ", " 0 ").unwrap();
        assert_eq!(edited[1].name, "Oat Milk");
        assert_eq!(edited[1].quantity, 0);
    }

    #[test]
    fn edit_of_unknown_id_is_a_no_op() {
        let items = sample();
        assert_eq!(apply_edit(&items, "404", "Anything", "1").unwrap(), items);
    }

    #[test]
    fn delete_removes_only_the_target() {
        let items = sample();
        let remaining = apply_delete(&items, "1");
        assert_eq!(remaining, items[1..].to_vec());
        assert_eq!(apply_delete(&remaining, "1"), remaining);
        assert_eq!(apply_delete(&items, "404"), items);
    }

    #[test]
    fn quantity_steps_floor_at_zero() {
        assert_eq!(step_quantity(0, false), 0);
        assert_eq!(step_quantity(0, true), 1);
        assert_eq!(step_quantity(3, false), 2);
        assert_eq!(step_quantity(u32::MAX, true), u32::MAX);
    }

    proptest! {
        #[test]
        fn edit_is_idempotent(name in "[A-Za-z][A-Za-z ]{0,20}", quantity in 0u32..1000) {
            let items = sample();
            let qty = quantity.to_string();
            let once = apply_edit(&items, "1", &name, &qty).unwrap();
            let twice = apply_edit(&once, "1", &name, &qty).unwrap();
            prop_assert_eq!(once, twice);
        }

        #[test]
        fn second_delete_is_a_no_op(index in 0usize..2) {
            let items = sample();
            let id = items[index].id.clone();
            let once = apply_delete(&items, &id);
            let twice = apply_delete(&once, &id);
            prop_assert_eq!(once, twice);
        }
    }
}
