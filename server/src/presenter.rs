//! Display ordering and summaries for lists and todos.
//!
//! Both orderings are stable partitions: incomplete entries first, complete
//! entries after, each group keeping its original relative order. Nothing
//! here mutates its input.

use serde::Serialize;

use crate::types::{Todo, TodoList};

/// CSS class applied to complete lists and todos.
const COMPLETE_CLASS: &str = "complete";

fn stable_partition<T>(items: &[T], is_complete: impl Fn(&T) -> bool) -> Vec<&T> {
    let (complete, mut incomplete): (Vec<&T>, Vec<&T>) =
        items.iter().partition(|item| is_complete(*item));
    incomplete.extend(complete);
    incomplete
}

/// Orders lists for display: incomplete lists (including empty ones) before
/// complete lists.
pub fn sort_lists(lists: &[TodoList]) -> Vec<&TodoList> {
    stable_partition(lists, TodoList::is_complete)
}

/// Orders todos for display: undone todos before completed ones.
pub fn sort_todos(todos: &[Todo]) -> Vec<&Todo> {
    stable_partition(todos, |todo| todo.completed)
}

/// A list as shown on the index page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ListSummary {
    pub id: u64,
    pub name: String,
    pub todo_count: usize,
    pub undone_count: usize,
    pub complete: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub class: Option<&'static str>,
}

impl From<&TodoList> for ListSummary {
    fn from(list: &TodoList) -> Self {
        let complete = list.is_complete();
        Self {
            id: list.id,
            name: list.name.clone(),
            todo_count: list.todo_count(),
            undone_count: list.undone_count(),
            complete,
            class: complete.then_some(COMPLETE_CLASS),
        }
    }
}

/// A todo as shown on a list page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TodoView {
    pub id: u64,
    pub name: String,
    pub completed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub class: Option<&'static str>,
}

impl From<&Todo> for TodoView {
    fn from(todo: &Todo) -> Self {
        Self {
            id: todo.id,
            name: todo.name.clone(),
            completed: todo.completed,
            class: todo.completed.then_some(COMPLETE_CLASS),
        }
    }
}

/// A single list with its todos in display order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ListDetail {
    #[serde(flatten)]
    pub summary: ListSummary,
    pub todos: Vec<TodoView>,
}

/// Summaries of every list, in display order.
pub fn present_lists(lists: &[TodoList]) -> Vec<ListSummary> {
    sort_lists(lists).into_iter().map(ListSummary::from).collect()
}

/// A list's summary plus its todos, in display order.
pub fn present_list(list: &TodoList) -> ListDetail {
    ListDetail {
        summary: ListSummary::from(list),
        todos: sort_todos(&list.todos)
            .into_iter()
            .map(TodoView::from)
            .collect(),
    }
}
