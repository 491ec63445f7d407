//! SQLite persistence adapter for users and todos.

use crate::domain::error::TodosError;
use crate::domain::todo::{Todo, TodoFields};
use crate::domain::user::User;
use crate::ports::config_port::ConfigPort;
use crate::ports::todo_port::TodoPort;
use crate::ports::user_port::UserPort;
use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};
use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::{OptionalExtension, Row, params};

const DEFAULT_POOL_SIZE: i64 = 4;

pub struct SqliteAdapter {
    pool: Pool<SqliteConnectionManager>,
}

impl SqliteAdapter {
    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, TodosError> {
        let db_path =
            config
                .get_string("sqlite", "path")
                .ok_or_else(|| TodosError::ConfigMissing {
                    section: "sqlite".into(),
                    key: "path".into(),
                })?;

        if db_path == ":memory:" {
            return Self::in_memory();
        }

        let pool_size = pool_size(config.get_int("sqlite", "pool_size", DEFAULT_POOL_SIZE))?;

        let manager = SqliteConnectionManager::file(&db_path);
        let pool = Pool::builder().max_size(pool_size).build(manager)?;

        Ok(Self { pool })
    }

    /// Each in-memory connection is its own database, so the pool holds one.
    pub fn in_memory() -> Result<Self, TodosError> {
        let manager = SqliteConnectionManager::memory();
        let pool = Pool::builder().max_size(1).build(manager)?;

        Ok(Self { pool })
    }

    pub fn initialize_schema(&self) -> Result<(), TodosError> {
        let conn = self.conn()?;

        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS users (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                username TEXT NOT NULL UNIQUE,
                password_hash TEXT NOT NULL
            );
            CREATE TABLE IF NOT EXISTS todos (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                completed INTEGER NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_todos_created_at ON todos(created_at);",
        )?;

        Ok(())
    }

    /// Inserts incomplete todos in one transaction.
    pub fn seed_todos(&self, names: &[String]) -> Result<usize, TodosError> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;

        for name in names {
            tx.execute(
                "INSERT INTO todos (name, completed, created_at) VALUES (?1, 0, ?2)",
                params![name, timestamp(Utc::now())],
            )?;
        }

        tx.commit()?;
        Ok(names.len())
    }

    fn conn(&self) -> Result<PooledConnection<SqliteConnectionManager>, TodosError> {
        Ok(self.pool.get()?)
    }
}

fn pool_size(value: i64) -> Result<u32, TodosError> {
    u32::try_from(value)
        .ok()
        .filter(|v| *v > 0)
        .ok_or_else(|| TodosError::ConfigInvalid {
            section: "sqlite".into(),
            key: "pool_size".into(),
            reason: format!("pool_size must be a positive integer, got {value}"),
        })
}

/// Fixed-width so that text order is time order.
fn timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn user_from_row(row: &Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get(0)?,
        username: row.get(1)?,
        password_hash: row.get(2)?,
    })
}

fn todo_from_row(row: &Row<'_>) -> rusqlite::Result<Todo> {
    let created_str: String = row.get(3)?;
    let created_at = DateTime::parse_from_rfc3339(&created_str)
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(3, rusqlite::types::Type::Text, Box::new(e))
        })?
        .with_timezone(&Utc);
    Ok(Todo {
        id: row.get(0)?,
        name: row.get(1)?,
        completed: row.get(2)?,
        created_at,
    })
}

fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _)
            if e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
    )
}

const SELECT_TODO: &str = "SELECT id, name, completed, created_at FROM todos";

impl UserPort for SqliteAdapter {
    fn find_user_by_id(&self, id: i64) -> Result<Option<User>, TodosError> {
        let conn = self.conn()?;
        let user = conn
            .query_row(
                "SELECT id, username, password_hash FROM users WHERE id = ?1",
                params![id],
                user_from_row,
            )
            .optional()?;
        Ok(user)
    }

    fn find_user_by_username(&self, username: &str) -> Result<Option<User>, TodosError> {
        let conn = self.conn()?;
        let user = conn
            .query_row(
                "SELECT id, username, password_hash FROM users WHERE username = ?1",
                params![username],
                user_from_row,
            )
            .optional()?;
        Ok(user)
    }

    fn insert_user(&self, username: &str, password_hash: &str) -> Result<User, TodosError> {
        let conn = self.conn()?;
        match conn.execute(
            "INSERT INTO users (username, password_hash) VALUES (?1, ?2)",
            params![username, password_hash],
        ) {
            Ok(_) => Ok(User {
                id: conn.last_insert_rowid(),
                username: username.to_string(),
                password_hash: password_hash.to_string(),
            }),
            Err(e) if is_unique_violation(&e) => Err(TodosError::AlreadyExists {
                username: username.to_string(),
            }),
            Err(e) => Err(e.into()),
        }
    }

    fn count_users(&self) -> Result<usize, TodosError> {
        let conn = self.conn()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM users", [], |row| row.get(0))?;
        Ok(count as usize)
    }
}

impl TodoPort for SqliteAdapter {
    fn list_todos(&self) -> Result<Vec<Todo>, TodosError> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!("{SELECT_TODO} ORDER BY created_at ASC, id ASC"))?;
        let rows = stmt.query_map([], todo_from_row)?;

        let mut todos = Vec::new();
        for row in rows {
            todos.push(row?);
        }
        Ok(todos)
    }

    fn get_todo(&self, id: i64) -> Result<Option<Todo>, TodosError> {
        let conn = self.conn()?;
        let todo = conn
            .query_row(
                &format!("{SELECT_TODO} WHERE id = ?1"),
                params![id],
                todo_from_row,
            )
            .optional()?;
        Ok(todo)
    }

    fn create_todo(&self, fields: &TodoFields) -> Result<Todo, TodosError> {
        let conn = self.conn()?;
        // Stored at microsecond precision; keep the returned value identical.
        let created_at = Utc::now().trunc_subsecs(6);
        conn.execute(
            "INSERT INTO todos (name, completed, created_at) VALUES (?1, ?2, ?3)",
            params![fields.name, fields.completed, timestamp(created_at)],
        )?;
        Ok(Todo {
            id: conn.last_insert_rowid(),
            name: fields.name.clone(),
            completed: fields.completed,
            created_at,
        })
    }

    fn update_todo(&self, id: i64, fields: &TodoFields) -> Result<Todo, TodosError> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;

        let changed = tx.execute(
            "UPDATE todos SET name = ?1, completed = ?2 WHERE id = ?3",
            params![fields.name, fields.completed, id],
        )?;
        if changed == 0 {
            return Err(TodosError::NotFound { id });
        }

        let todo = tx.query_row(
            &format!("{SELECT_TODO} WHERE id = ?1"),
            params![id],
            todo_from_row,
        )?;
        tx.commit()?;
        Ok(todo)
    }

    fn delete_todo(&self, id: i64) -> Result<(), TodosError> {
        let conn = self.conn()?;
        let deleted = conn.execute("DELETE FROM todos WHERE id = ?1", params![id])?;
        if deleted == 0 {
            return Err(TodosError::NotFound { id });
        }
        Ok(())
    }

    fn count_todos(&self) -> Result<usize, TodosError> {
        let conn = self.conn()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM todos", [], |row| row.get(0))?;
        Ok(count as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct EmptyConfig;

    impl ConfigPort for EmptyConfig {
        fn get_string(&self, _section: &str, _key: &str) -> Option<String> {
            None
        }
        fn get_int(&self, _section: &str, _key: &str, default: i64) -> i64 {
            default
        }
        fn get_bool(&self, _section: &str, _key: &str, default: bool) -> bool {
            default
        }
    }

    fn adapter() -> SqliteAdapter {
        let adapter = SqliteAdapter::in_memory().unwrap();
        adapter.initialize_schema().unwrap();
        adapter
    }

    fn fields(name: &str, completed: bool) -> TodoFields {
        TodoFields {
            name: name.to_string(),
            completed,
        }
    }

    #[test]
    fn from_config_missing_path() {
        let result = SqliteAdapter::from_config(&EmptyConfig);
        match result {
            Err(TodosError::ConfigMissing { section, key }) => {
                assert_eq!(section, "sqlite");
                assert_eq!(key, "path");
            }
            Err(other) => panic!("expected ConfigMissing, got: {other}"),
            Ok(_) => panic!("expected error, got Ok"),
        }
    }

    #[test]
    fn from_config_rejects_out_of_range_pool_size() {
        struct PoolConfig(i64);

        impl ConfigPort for PoolConfig {
            fn get_string(&self, _section: &str, _key: &str) -> Option<String> {
                Some("unused.db".to_string())
            }
            fn get_int(&self, _section: &str, _key: &str, _default: i64) -> i64 {
                self.0
            }
            fn get_bool(&self, _section: &str, _key: &str, default: bool) -> bool {
                default
            }
        }

        for size in [0, -1, i64::from(u32::MAX) + 1] {
            match SqliteAdapter::from_config(&PoolConfig(size)) {
                Err(TodosError::ConfigInvalid { section, key, .. }) => {
                    assert_eq!(section, "sqlite");
                    assert_eq!(key, "pool_size");
                }
                Err(other) => panic!("expected ConfigInvalid, got: {other}"),
                Ok(_) => panic!("pool_size {size} was accepted"),
            }
        }
    }

    #[test]
    fn schema_initialization_is_idempotent() {
        let adapter = adapter();
        adapter.initialize_schema().unwrap();
    }

    #[test]
    fn insert_and_find_user() {
        let adapter = adapter();
        let user = adapter.insert_user("username", "hash").unwrap();
        assert_eq!(user.id, 1);

        let by_name = adapter.find_user_by_username("username").unwrap();
        assert_eq!(by_name, Some(user.clone()));
        let by_id = adapter.find_user_by_id(user.id).unwrap();
        assert_eq!(by_id, Some(user));
        assert_eq!(adapter.find_user_by_username("USERNAME").unwrap(), None);
    }

    #[test]
    fn unique_constraint_rejects_duplicate_username() {
        let adapter = adapter();
        adapter.insert_user("username", "hash").unwrap();
        let err = adapter.insert_user("username", "other").unwrap_err();
        assert!(matches!(err, TodosError::AlreadyExists { username } if username == "username"));
        assert_eq!(adapter.count_users().unwrap(), 1);
    }

    #[test]
    fn create_and_list_todos_in_creation_order() {
        let adapter = adapter();
        let first = adapter.create_todo(&fields("first", false)).unwrap();
        let second = adapter.create_todo(&fields("second", true)).unwrap();

        let todos = adapter.list_todos().unwrap();
        assert_eq!(todos.len(), 2);
        assert_eq!(todos[0].id, first.id);
        assert_eq!(todos[1].id, second.id);
        assert!(todos[1].completed);
    }

    #[test]
    fn update_overwrites_fields_and_keeps_created_at() {
        let adapter = adapter();
        let todo = adapter.create_todo(&fields("old", false)).unwrap();
        let updated = adapter.update_todo(todo.id, &fields("new", true)).unwrap();

        assert_eq!(updated.name, "new");
        assert!(updated.completed);
        assert_eq!(
            updated.created_at.timestamp(),
            todo.created_at.timestamp()
        );
    }

    #[test]
    fn update_missing_todo_is_not_found() {
        let adapter = adapter();
        let err = adapter.update_todo(9, &fields("x", true)).unwrap_err();
        assert!(matches!(err, TodosError::NotFound { id: 9 }));
        assert_eq!(adapter.count_todos().unwrap(), 0);
    }

    #[test]
    fn delete_removes_row_once() {
        let adapter = adapter();
        let todo = adapter.create_todo(&fields("gone", false)).unwrap();
        adapter.delete_todo(todo.id).unwrap();
        assert_eq!(adapter.get_todo(todo.id).unwrap(), None);
        assert!(matches!(
            adapter.delete_todo(todo.id),
            Err(TodosError::NotFound { .. })
        ));
    }

    #[test]
    fn deleted_ids_are_not_reused() {
        let adapter = adapter();
        let todo = adapter.create_todo(&fields("a", false)).unwrap();
        adapter.delete_todo(todo.id).unwrap();
        let next = adapter.create_todo(&fields("b", false)).unwrap();
        assert!(next.id > todo.id);
    }

    #[test]
    fn seed_inserts_incomplete_todos() {
        let adapter = adapter();
        let seeded = adapter
            .seed_todos(&["one".to_string(), "two".to_string()])
            .unwrap();
        assert_eq!(seeded, 2);
        let todos = adapter.list_todos().unwrap();
        assert!(todos.iter().all(|t| !t.completed));
    }
}
