//! To-do item record and the fields a client may write.

use chrono::{DateTime, Utc};

#[derive(Debug, Clone, PartialEq)]
pub struct Todo {
    pub id: i64,
    pub name: String,
    pub completed: bool,
    pub created_at: DateTime<Utc>,
}

/// Client-writable fields. Both are required on create and on update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TodoFields {
    pub name: String,
    pub completed: bool,
}

/// Wire representation: `{id, name, completed}`.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct TodoView {
    pub id: i64,
    pub name: String,
    pub completed: bool,
}

impl From<&Todo> for TodoView {
    fn from(todo: &Todo) -> Self {
        Self {
            id: todo.id,
            name: todo.name.clone(),
            completed: todo.completed,
        }
    }
}

/// Path of the singular resource, used for `Location` headers.
pub fn todo_location(id: i64) -> String {
    format!("/api/v1/todos/{id}")
}
