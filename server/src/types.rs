//! Domain types for todo lists.
//!
//! A session owns an ordered sequence of [`TodoList`]s, each of which owns an
//! ordered sequence of [`Todo`]s. Ids are scoped: list ids are unique within
//! a session, todo ids are unique within their parent list only.

use serde::{Deserialize, Serialize};

/// Anything carrying a sibling-unique integer id.
pub trait Identified {
    /// Returns the entity's id.
    fn id(&self) -> u64;
}

/// A single todo item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Todo {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub completed: bool,
}

impl Todo {
    /// Creates an incomplete todo.
    pub fn new(id: u64, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            completed: false,
        }
    }
}

impl Identified for Todo {
    fn id(&self) -> u64 {
        self.id
    }
}

/// A named list of todos.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TodoList {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub todos: Vec<Todo>,
}

impl TodoList {
    /// Creates a list with no todos.
    pub fn new(id: u64, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            todos: Vec::new(),
        }
    }

    /// Number of todos in the list.
    pub fn todo_count(&self) -> usize {
        self.todos.len()
    }

    /// Number of todos not yet completed.
    pub fn undone_count(&self) -> usize {
        self.todos.iter().filter(|todo| !todo.completed).count()
    }

    /// A list is complete when it has todos and none of them are undone.
    ///
    /// An empty list is never complete.
    pub fn is_complete(&self) -> bool {
        self.todo_count() > 0 && self.undone_count() == 0
    }

    pub(crate) fn todo_mut(&mut self, todo_id: u64) -> Option<&mut Todo> {
        self.todos.iter_mut().find(|todo| todo.id == todo_id)
    }
}

impl Identified for TodoList {
    fn id(&self) -> u64 {
        self.id
    }
}
