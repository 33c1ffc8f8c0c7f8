//! Task CRUD and the important-task query.

use super::employees::get_employee_internal;
use super::{Database, now_ms};
use crate::types::{ImportantTask, NewTask, Task, TaskId, TaskStatus, TaskUpdate};
use anyhow::{Result, anyhow};
use rusqlite::{Connection, Row, params};

pub(crate) fn parse_task_row(row: &Row) -> rusqlite::Result<Task> {
    let status: String = row.get("status")?;

    Ok(Task {
        id: row.get("id")?,
        name: row.get("name")?,
        description: row.get("description")?,
        created_at: row.get("created_at")?,
        deadline: row.get("deadline")?,
        // The schema CHECK constraint only admits known statuses.
        status: TaskStatus::parse(&status).unwrap_or_default(),
        performer_id: row.get("performer_id")?,
        parent_task_id: row.get("parent_task_id")?,
    })
}

/// Internal helper to get a task using an existing connection (avoids deadlock).
fn get_task_internal(conn: &Connection, task_id: TaskId) -> Result<Option<Task>> {
    let mut stmt = conn.prepare("SELECT * FROM tasks WHERE id = ?1")?;

    let result = stmt.query_row(params![task_id], parse_task_row);

    match result {
        Ok(task) => Ok(Some(task)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Validate that the referenced performer and parent task exist.
fn check_references(
    conn: &Connection,
    performer_id: Option<i64>,
    parent_task_id: Option<TaskId>,
) -> Result<()> {
    if let Some(performer_id) = performer_id {
        if get_employee_internal(conn, performer_id)?.is_none() {
            return Err(anyhow!("Employee {} not found", performer_id));
        }
    }
    if let Some(parent_id) = parent_task_id {
        if get_task_internal(conn, parent_id)?.is_none() {
            return Err(anyhow!("Task {} not found", parent_id));
        }
    }
    Ok(())
}

impl Database {
    /// Create a new task. Performer and parent references must exist.
    pub fn create_task(&self, input: NewTask) -> Result<Task> {
        let now = now_ms();

        self.with_conn(|conn| {
            check_references(conn, input.performer_id, input.parent_task_id)?;

            conn.execute(
                "INSERT INTO tasks (
                    name, description, created_at, deadline, status, performer_id, parent_task_id
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    input.name,
                    input.description,
                    now,
                    input.deadline,
                    input.status.as_str(),
                    input.performer_id,
                    input.parent_task_id,
                ],
            )?;

            let id = conn.last_insert_rowid();

            Ok(Task {
                id,
                name: input.name,
                description: input.description,
                created_at: now,
                deadline: input.deadline,
                status: input.status,
                performer_id: input.performer_id,
                parent_task_id: input.parent_task_id,
            })
        })
    }

    /// Get a task by id.
    pub fn get_task(&self, task_id: TaskId) -> Result<Option<Task>> {
        self.with_conn(|conn| get_task_internal(conn, task_id))
    }

    /// Update a task. Unset fields keep their current values.
    ///
    /// Rejects a task referencing itself as parent; referenced performer and
    /// parent must exist.
    pub fn update_task(&self, task_id: TaskId, update: TaskUpdate) -> Result<Task> {
        self.with_conn(|conn| {
            let task = get_task_internal(conn, task_id)?
                .ok_or_else(|| anyhow!("Task {} not found", task_id))?;

            let name = update.name.unwrap_or(task.name);
            let description = update.description.unwrap_or(task.description);
            let deadline = update.deadline.unwrap_or(task.deadline);
            let status = update.status.unwrap_or(task.status);
            let performer_id = update.performer_id.unwrap_or(task.performer_id);
            let parent_task_id = update.parent_task_id.unwrap_or(task.parent_task_id);

            if parent_task_id == Some(task_id) {
                return Err(anyhow!("Task {} cannot be its own parent", task_id));
            }
            check_references(conn, performer_id, parent_task_id)?;

            conn.execute(
                "UPDATE tasks SET
                    name = ?1, description = ?2, deadline = ?3, status = ?4,
                    performer_id = ?5, parent_task_id = ?6
                 WHERE id = ?7",
                params![
                    name,
                    description,
                    deadline,
                    status.as_str(),
                    performer_id,
                    parent_task_id,
                    task_id,
                ],
            )?;

            Ok(Task {
                id: task_id,
                name,
                description,
                created_at: task.created_at,
                deadline,
                status,
                performer_id,
                parent_task_id,
            })
        })
    }

    /// Delete a task. Sub-tasks keep existing with parent cleared
    /// (ON DELETE SET NULL). Returns false if no such task.
    pub fn delete_task(&self, task_id: TaskId) -> Result<bool> {
        self.with_conn(|conn| {
            let deleted = conn.execute("DELETE FROM tasks WHERE id = ?1", params![task_id])?;
            Ok(deleted > 0)
        })
    }

    /// List all tasks ordered by id.
    pub fn list_tasks(&self) -> Result<Vec<Task>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare("SELECT * FROM tasks ORDER BY id")?;

            let tasks = stmt
                .query_map([], parse_task_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?;

            Ok(tasks)
        })
    }

    /// List tasks performed by the given employee, ordered by id.
    pub fn list_tasks_for_performer(&self, employee_id: i64) -> Result<Vec<Task>> {
        self.with_conn(|conn| {
            let mut stmt =
                conn.prepare("SELECT * FROM tasks WHERE performer_id = ?1 ORDER BY id")?;

            let tasks = stmt
                .query_map(params![employee_id], parse_task_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?;

            Ok(tasks)
        })
    }

    /// Fetch important tasks: not completed, unassigned, with a parent task
    /// whose performer is known. The parent's performer id rides along.
    pub fn important_tasks(&self) -> Result<Vec<ImportantTask>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT t.*, p.performer_id AS parent_performer_id
                 FROM tasks t
                 JOIN tasks p ON p.id = t.parent_task_id
                 WHERE t.status != 'completed'
                   AND t.performer_id IS NULL
                   AND p.performer_id IS NOT NULL
                 ORDER BY t.id",
            )?;

            let tasks = stmt
                .query_map([], |row| {
                    let task = parse_task_row(row)?;
                    let parent_performer_id: i64 = row.get("parent_performer_id")?;
                    Ok(ImportantTask {
                        task,
                        parent_performer_id,
                    })
                })?
                .collect::<rusqlite::Result<Vec<_>>>()?;

            Ok(tasks)
        })
    }
}
