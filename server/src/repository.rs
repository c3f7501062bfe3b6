//! The per-session list collection and its CRUD operations.
//!
//! [`ListCollection`] owns the session's lists in insertion order. All
//! mutations edit that collection in place; callers reach it through
//! [`SessionStore::with_session`](crate::session::SessionStore::with_session),
//! so nothing is copied out and written back.
//!
//! Validation is not performed here. Handlers validate input with
//! [`crate::validation`] before calling the create/rename operations.

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::error::ListError;
use crate::ids::next_id;
use crate::types::{Todo, TodoList};

/// The ordered lists belonging to one session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ListCollection {
    lists: Vec<TodoList>,
}

impl ListCollection {
    /// Creates an empty collection.
    pub fn new() -> Self {
        Self::default()
    }

    /// All lists in insertion order.
    pub fn lists(&self) -> &[TodoList] {
        &self.lists
    }

    pub fn len(&self) -> usize {
        self.lists.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lists.is_empty()
    }

    /// Appends a new, empty list and returns it.
    pub fn create_list(&mut self, name: impl Into<String>) -> &TodoList {
        let id = next_id(&self.lists);
        let list = TodoList::new(id, name);
        trace!(list_id = id, name = %list.name, "Creating list");
        self.lists.push(list);
        &self.lists[self.lists.len() - 1]
    }

    /// Looks up a list by id.
    ///
    /// # Errors
    ///
    /// Returns [`ListError::ListNotFound`] if no list has that id.
    pub fn find_list(&self, id: u64) -> Result<&TodoList, ListError> {
        self.lists
            .iter()
            .find(|list| list.id == id)
            .ok_or(ListError::ListNotFound { id })
    }

    fn find_list_mut(&mut self, id: u64) -> Result<&mut TodoList, ListError> {
        self.lists
            .iter_mut()
            .find(|list| list.id == id)
            .ok_or(ListError::ListNotFound { id })
    }

    /// Replaces a list's name. Its id and todos are untouched.
    ///
    /// # Errors
    ///
    /// Returns [`ListError::ListNotFound`] if no list has that id.
    pub fn rename_list(&mut self, id: u64, new_name: impl Into<String>) -> Result<(), ListError> {
        let list = self.find_list_mut(id)?;
        list.name = new_name.into();
        trace!(list_id = id, name = %list.name, "Renamed list");
        Ok(())
    }

    /// Removes the list with the given id, returning it if it existed.
    ///
    /// Deleting a missing id is a no-op.
    pub fn delete_list(&mut self, id: u64) -> Option<TodoList> {
        let index = self.lists.iter().position(|list| list.id == id)?;
        trace!(list_id = id, "Deleting list");
        Some(self.lists.remove(index))
    }

    /// Appends an incomplete todo to a list and returns it.
    ///
    /// # Errors
    ///
    /// Returns [`ListError::ListNotFound`] if no list has that id.
    pub fn add_todo(&mut self, list_id: u64, text: impl Into<String>) -> Result<&Todo, ListError> {
        let list = self.find_list_mut(list_id)?;
        let id = next_id(&list.todos);
        list.todos.push(Todo::new(id, text));
        trace!(list_id, todo_id = id, "Added todo");
        Ok(&list.todos[list.todos.len() - 1])
    }

    /// Marks a single todo as complete or incomplete.
    ///
    /// # Errors
    ///
    /// - [`ListError::ListNotFound`] if the list does not exist
    /// - [`ListError::TodoNotFound`] if the list has no todo with that id
    pub fn set_todo_completed(
        &mut self,
        list_id: u64,
        todo_id: u64,
        completed: bool,
    ) -> Result<(), ListError> {
        let todo = self
            .find_list_mut(list_id)?
            .todo_mut(todo_id)
            .ok_or(ListError::TodoNotFound { list_id, todo_id })?;
        todo.completed = completed;
        trace!(list_id, todo_id, completed, "Updated todo");
        Ok(())
    }

    /// Marks every todo in a list as complete.
    ///
    /// # Errors
    ///
    /// Returns [`ListError::ListNotFound`] if no list has that id.
    pub fn complete_all_todos(&mut self, list_id: u64) -> Result<(), ListError> {
        let list = self.find_list_mut(list_id)?;
        for todo in &mut list.todos {
            todo.completed = true;
        }
        trace!(list_id, todo_count = list.todos.len(), "Completed all todos");
        Ok(())
    }

    /// Removes a todo from a list, returning it if it existed.
    ///
    /// A missing todo is a no-op; a missing list is still an error.
    ///
    /// # Errors
    ///
    /// Returns [`ListError::ListNotFound`] if no list has that id.
    pub fn delete_todo(&mut self, list_id: u64, todo_id: u64) -> Result<Option<Todo>, ListError> {
        let list = self.find_list_mut(list_id)?;
        let removed = list
            .todos
            .iter()
            .position(|todo| todo.id == todo_id)
            .map(|index| list.todos.remove(index));
        if removed.is_some() {
            trace!(list_id, todo_id, "Deleted todo");
        }
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collection_with(names: &[&str]) -> ListCollection {
        let mut lists = ListCollection::new();
        for name in names {
            lists.create_list(*name);
        }
        lists
    }

    #[test]
    fn create_list_appends_in_order_with_sequential_ids() {
        let lists = collection_with(&["Groceries", "Chores", "Work"]);

        let ids: Vec<u64> = lists.lists().iter().map(|l| l.id).collect();
        let names: Vec<&str> = lists.lists().iter().map(|l| l.name.as_str()).collect();
        assert_eq!(ids, vec![1, 2, 3]);
        assert_eq!(names, vec!["Groceries", "Chores", "Work"]);
        assert!(lists.lists().iter().all(|l| l.todos.is_empty()));
    }

    #[test]
    fn create_list_after_delete_reuses_max_id() {
        let mut lists = collection_with(&["a", "b"]);
        lists.delete_list(2);
        assert_eq!(lists.create_list("c").id, 2);

        lists.delete_list(1);
        assert_eq!(lists.create_list("d").id, 3);
    }

    #[test]
    fn find_list_reports_not_found_without_mutating() {
        let lists = collection_with(&["Groceries"]);
        let before = lists.clone();

        assert_eq!(
            lists.find_list(42),
            Err(ListError::ListNotFound { id: 42 })
        );
        assert_eq!(lists, before);
    }

    #[test]
    fn rename_list_keeps_id_and_todos() {
        let mut lists = collection_with(&["Groceries"]);
        lists.add_todo(1, "Milk").unwrap();

        lists.rename_list(1, "Shopping").unwrap();

        let list = lists.find_list(1).unwrap();
        assert_eq!(list.name, "Shopping");
        assert_eq!(list.todos.len(), 1);
    }

    #[test]
    fn rename_missing_list_is_not_found() {
        let mut lists = ListCollection::new();
        assert_eq!(
            lists.rename_list(1, "x"),
            Err(ListError::ListNotFound { id: 1 })
        );
    }

    #[test]
    fn delete_list_is_idempotent() {
        let mut lists = collection_with(&["a", "b", "c"]);

        assert_eq!(lists.delete_list(2).map(|l| l.name), Some("b".to_string()));
        assert!(lists.delete_list(2).is_none());
        assert_eq!(lists.len(), 2);
        assert_eq!(lists.lists()[1].name, "c");
    }

    #[test]
    fn add_todo_allocates_ids_per_list() {
        let mut lists = collection_with(&["a", "b"]);
        lists.add_todo(1, "one").unwrap();
        lists.add_todo(1, "two").unwrap();
        let todo = lists.add_todo(2, "first").unwrap();

        assert_eq!(todo.id, 1);
        assert!(!todo.completed);
        let ids: Vec<u64> = lists.find_list(1).unwrap().todos.iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![1, 2]);
    }

    #[test]
    fn add_todo_to_missing_list_is_not_found() {
        let mut lists = ListCollection::new();
        assert_eq!(
            lists.add_todo(3, "x").unwrap_err(),
            ListError::ListNotFound { id: 3 }
        );
    }

    #[test]
    fn add_then_delete_todo_round_trips() {
        let mut lists = collection_with(&["a"]);
        lists.add_todo(1, "keep").unwrap();
        let before = lists.find_list(1).unwrap().todos.clone();

        let id = lists.add_todo(1, "x").unwrap().id;
        lists.delete_todo(1, id).unwrap();

        assert_eq!(lists.find_list(1).unwrap().todos, before);
    }

    #[test]
    fn delete_missing_todo_is_noop() {
        let mut lists = collection_with(&["a"]);
        lists.add_todo(1, "x").unwrap();

        assert_eq!(lists.delete_todo(1, 99).unwrap(), None);
        assert_eq!(lists.find_list(1).unwrap().todo_count(), 1);
    }

    #[test]
    fn set_todo_completed_toggles_flag() {
        let mut lists = collection_with(&["a"]);
        lists.add_todo(1, "x").unwrap();

        lists.set_todo_completed(1, 1, true).unwrap();
        assert!(lists.find_list(1).unwrap().todos[0].completed);

        lists.set_todo_completed(1, 1, false).unwrap();
        assert!(!lists.find_list(1).unwrap().todos[0].completed);
    }

    #[test]
    fn set_todo_completed_on_missing_todo_is_not_found() {
        let mut lists = collection_with(&["a"]);
        assert_eq!(
            lists.set_todo_completed(1, 5, true),
            Err(ListError::TodoNotFound {
                list_id: 1,
                todo_id: 5
            })
        );
    }

    #[test]
    fn complete_all_marks_every_todo_and_is_idempotent() {
        let mut lists = collection_with(&["a"]);
        for text in ["x", "y", "z"] {
            lists.add_todo(1, text).unwrap();
        }
        lists.set_todo_completed(1, 2, true).unwrap();

        lists.complete_all_todos(1).unwrap();
        let once = lists.clone();
        assert!(lists.find_list(1).unwrap().todos.iter().all(|t| t.completed));

        lists.complete_all_todos(1).unwrap();
        assert_eq!(lists, once);
    }

    #[test]
    fn collection_serializes_as_plain_array() {
        let lists = collection_with(&["a"]);
        let json = serde_json::to_value(&lists).unwrap();
        assert!(json.is_array());
        assert_eq!(json[0]["name"], "a");
    }
}
