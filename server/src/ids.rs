//! Identifier allocation for lists and todos.

use crate::types::Identified;

/// Returns the id for a new sibling: the largest existing id plus one, or `1`
/// when there are no siblings.
///
/// Ids are not tracked anywhere else, so deleting the entity with the largest
/// id makes that id available again.
///
/// # Example
///
/// ```rust
/// use listkeeper_server::ids::next_id;
/// use listkeeper_server::types::Todo;
///
/// assert_eq!(next_id::<Todo>(&[]), 1);
/// assert_eq!(next_id(&[Todo::new(3, "a"), Todo::new(7, "b")]), 8);
/// ```
pub fn next_id<T: Identified>(siblings: &[T]) -> u64 {
    siblings.iter().map(Identified::id).max().unwrap_or(0) + 1
}
