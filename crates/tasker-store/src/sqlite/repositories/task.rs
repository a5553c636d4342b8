//! Task repository: SQL for the `tasks` table.
//!
//! Stateless; every method takes a `&Connection`. Ordering rules live here:
//! `NULL` deadlines are the smallest value, and ties break on `id` in the same
//! direction, so a descending list is the exact reverse of an ascending one.

use rusqlite::{Connection, OptionalExtension, params};
use tasker_core::{SortOrder, Task, TaskId};

use crate::errors::Result;

const SELECT_TASKS: &str = "SELECT id, title, description, deadline, is_completed FROM tasks";

/// Task repository, stateless.
pub struct TaskRepo;

impl TaskRepo {
    /// Insert a task without id, or upsert a task with one. Returns the id.
    pub fn save(conn: &Connection, task: &Task) -> Result<TaskId> {
        match task.id {
            None => {
                let _ = conn.execute(
                    "INSERT INTO tasks (title, description, deadline, is_completed)
                     VALUES (?1, ?2, ?3, ?4)",
                    params![task.title, task.description, task.deadline, task.is_completed],
                )?;
                Ok(conn.last_insert_rowid())
            }
            Some(id) => {
                let _ = conn.execute(
                    "INSERT INTO tasks (id, title, description, deadline, is_completed)
                     VALUES (?1, ?2, ?3, ?4, ?5)
                     ON CONFLICT(id) DO UPDATE SET
                         title = excluded.title,
                         description = excluded.description,
                         deadline = excluded.deadline,
                         is_completed = excluded.is_completed",
                    params![id, task.title, task.description, task.deadline, task.is_completed],
                )?;
                Ok(id)
            }
        }
    }

    /// Delete a task by id. Returns whether a row was removed.
    pub fn delete(conn: &Connection, id: TaskId) -> Result<bool> {
        let changed = conn.execute("DELETE FROM tasks WHERE id = ?1", params![id])?;
        Ok(changed > 0)
    }

    /// Get a task by id.
    pub fn get(conn: &Connection, id: TaskId) -> Result<Option<Task>> {
        let task = conn
            .query_row(
                &format!("{SELECT_TASKS} WHERE id = ?1"),
                params![id],
                Self::map_row,
            )
            .optional()?;
        Ok(task)
    }

    /// All tasks in id order.
    pub fn list_all(conn: &Connection) -> Result<Vec<Task>> {
        Self::query(conn, &format!("{SELECT_TASKS} ORDER BY id ASC"))
    }

    /// All tasks ordered by deadline.
    pub fn list_by_deadline(conn: &Connection, order: SortOrder) -> Result<Vec<Task>> {
        let dir = order.as_sql();
        Self::query(
            conn,
            &format!("{SELECT_TASKS} ORDER BY deadline {dir}, id {dir}"),
        )
    }

    /// Completed tasks in id order.
    pub fn list_completed(conn: &Connection) -> Result<Vec<Task>> {
        Self::query(
            conn,
            &format!("{SELECT_TASKS} WHERE is_completed = 1 ORDER BY id ASC"),
        )
    }

    /// Number of stored tasks.
    pub fn count(conn: &Connection) -> Result<u64> {
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM tasks", [], |row| row.get(0))?;
        Ok(u64::try_from(count).unwrap_or_default())
    }

    fn query(conn: &Connection, sql: &str) -> Result<Vec<Task>> {
        let mut stmt = conn.prepare_cached(sql)?;
        let rows = stmt
            .query_map([], Self::map_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    fn map_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Task> {
        Ok(Task {
            id: Some(row.get(0)?),
            title: row.get(1)?,
            description: row.get(2)?,
            deadline: row.get(3)?,
            is_completed: row.get(4)?,
        })
    }
}
