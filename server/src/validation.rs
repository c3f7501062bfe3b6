//! Input validation for list names and todo text.
//!
//! Lengths are counted in characters. When several rules fail, the first one
//! checked wins: length is checked before uniqueness.

use crate::error::{Field, ListError};
use crate::types::TodoList;

/// Shortest accepted name, in characters.
pub const MIN_NAME_LENGTH: usize = 1;

/// Longest accepted name, in characters.
pub const MAX_NAME_LENGTH: usize = 100;

fn check_length(value: &str, field: Field) -> Result<(), ListError> {
    let len = value.chars().count();
    if (MIN_NAME_LENGTH..=MAX_NAME_LENGTH).contains(&len) {
        Ok(())
    } else {
        Err(ListError::InvalidLength {
            field,
            min: MIN_NAME_LENGTH,
            max: MAX_NAME_LENGTH,
        })
    }
}

/// Validates a list name against length limits and the names already used
/// by `existing` lists.
///
/// Comparison is exact and case-sensitive. No list is exempted, so renaming
/// a list to its current name reports [`ListError::DuplicateName`].
///
/// # Errors
///
/// - [`ListError::InvalidLength`] if the name is empty or over 100 characters
/// - [`ListError::DuplicateName`] if any existing list has the same name
pub fn validate_list_name(name: &str, existing: &[TodoList]) -> Result<(), ListError> {
    check_length(name, Field::ListName)?;

    if existing.iter().any(|list| list.name == name) {
        return Err(ListError::DuplicateName);
    }

    Ok(())
}

/// Validates the text of a todo item.
///
/// # Errors
///
/// Returns [`ListError::InvalidLength`] if the text is empty or over 100
/// characters.
pub fn validate_todo_text(text: &str) -> Result<(), ListError> {
    check_length(text, Field::Todo)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lists(names: &[&str]) -> Vec<TodoList> {
        names
            .iter()
            .enumerate()
            .map(|(i, name)| TodoList::new(i as u64 + 1, *name))
            .collect()
    }

    #[test]
    fn accepts_boundary_lengths() {
        assert!(validate_list_name("a", &[]).is_ok());
        assert!(validate_list_name(&"a".repeat(100), &[]).is_ok());
        assert!(validate_todo_text("a").is_ok());
        assert!(validate_todo_text(&"a".repeat(100)).is_ok());
    }

    #[test]
    fn rejects_empty_and_too_long_list_names() {
        for name in [String::new(), "a".repeat(101)] {
            let err = validate_list_name(&name, &[]).unwrap_err();
            assert!(matches!(
                err,
                ListError::InvalidLength {
                    field: Field::ListName,
                    ..
                }
            ));
        }
    }

    #[test]
    fn length_is_checked_before_uniqueness() {
        let long = "a".repeat(101);
        let existing = lists(&[long.as_str(), ""]);

        assert!(matches!(
            validate_list_name(&long, &existing),
            Err(ListError::InvalidLength { .. })
        ));
        assert!(matches!(
            validate_list_name("", &existing),
            Err(ListError::InvalidLength { .. })
        ));
    }

    #[test]
    fn rejects_duplicate_names() {
        let existing = lists(&["Groceries", "Chores"]);
        assert_eq!(
            validate_list_name("Chores", &existing),
            Err(ListError::DuplicateName)
        );
    }

    #[test]
    fn uniqueness_is_case_sensitive() {
        let existing = lists(&["Groceries"]);
        assert!(validate_list_name("groceries", &existing).is_ok());
    }

    #[test]
    fn accepts_unused_name() {
        let existing = lists(&["Groceries"]);
        assert!(validate_list_name("Chores", &existing).is_ok());
    }

    #[test]
    fn counts_characters_not_bytes() {
        // 100 two-byte characters
        let name = "é".repeat(100);
        assert!(validate_list_name(&name, &[]).is_ok());
        assert!(validate_todo_text(&name).is_ok());
        assert!(validate_todo_text(&"é".repeat(101)).is_err());
    }

    #[test]
    fn rejects_empty_todo() {
        assert_eq!(
            validate_todo_text(""),
            Err(ListError::InvalidLength {
                field: Field::Todo,
                min: 1,
                max: 100
            })
        );
    }
}
