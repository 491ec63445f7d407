//! To-do persistence port trait.

use crate::domain::error::TodosError;
use crate::domain::todo::{Todo, TodoFields};

pub trait TodoPort {
    /// All todos, oldest first.
    fn list_todos(&self) -> Result<Vec<Todo>, TodosError>;

    fn get_todo(&self, id: i64) -> Result<Option<Todo>, TodosError>;

    fn create_todo(&self, fields: &TodoFields) -> Result<Todo, TodosError>;

    /// Overwrites `name` and `completed`. Fails with [`TodosError::NotFound`]
    /// if the row is gone, without writing anything.
    fn update_todo(&self, id: i64, fields: &TodoFields) -> Result<Todo, TodosError>;

    /// Fails with [`TodosError::NotFound`] if there was nothing to delete.
    fn delete_todo(&self, id: i64) -> Result<(), TodosError>;

    fn count_todos(&self) -> Result<usize, TodosError>;
}
