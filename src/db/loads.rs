//! Aggregation queries for employee task loads.

use super::Database;
use super::employees::parse_employee_row;
use crate::types::{EmployeeId, EmployeeWithTasks, TaskCounts, TaskStatus};
use anyhow::Result;
use rusqlite::params;
use std::collections::HashMap;

impl Database {
    /// Per-employee task totals, covering every employee.
    ///
    /// Two explicit passes: the first lists all employees with zeroed counts,
    /// the second merges in grouped aggregate rows, so employees without any
    /// tasks still appear with count 0.
    pub fn employee_task_counts(&self) -> Result<HashMap<EmployeeId, TaskCounts>> {
        self.with_conn(|conn| {
            let mut counts: HashMap<EmployeeId, TaskCounts> = HashMap::new();

            let mut stmt = conn.prepare("SELECT id FROM employees")?;
            let ids = stmt
                .query_map([], |row| row.get::<_, i64>(0))?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            for id in ids {
                counts.insert(id, TaskCounts::default());
            }

            let mut stmt = conn.prepare(
                "SELECT performer_id, status, COUNT(*)
                 FROM tasks
                 WHERE performer_id IS NOT NULL
                 GROUP BY performer_id, status",
            )?;
            let rows = stmt
                .query_map([], |row| {
                    let performer_id: i64 = row.get(0)?;
                    let status: String = row.get(1)?;
                    let count: i64 = row.get(2)?;
                    Ok((performer_id, status, count))
                })?
                .collect::<rusqlite::Result<Vec<_>>>()?;

            for (performer_id, status, count) in rows {
                // Tasks of a deleted employee have performer_id set NULL, so
                // every grouped row matches a live employee entry.
                let entry = counts.entry(performer_id).or_default();
                entry.total += count;
                if TaskStatus::parse(&status) == Some(TaskStatus::Completed) {
                    entry.completed += count;
                }
            }

            Ok(counts)
        })
    }

    /// Employees with at least one non-completed task, each carrying their
    /// full task list, sorted ascending by active-task count.
    pub fn employees_by_active_load(&self) -> Result<Vec<EmployeeWithTasks>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT DISTINCT e.* FROM employees e
                 JOIN tasks t ON t.performer_id = e.id
                 WHERE t.status != 'completed'
                 ORDER BY e.id",
            )?;
            let employees = stmt
                .query_map([], parse_employee_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?;

            let mut stmt =
                conn.prepare("SELECT * FROM tasks WHERE performer_id = ?1 ORDER BY id")?;
            let mut result = Vec::with_capacity(employees.len());
            for employee in employees {
                let tasks = stmt
                    .query_map(params![employee.id], super::tasks::parse_task_row)?
                    .collect::<rusqlite::Result<Vec<_>>>()?;
                result.push(EmployeeWithTasks { employee, tasks });
            }

            result.sort_by_key(|e| {
                e.tasks
                    .iter()
                    .filter(|t| t.status != TaskStatus::Completed)
                    .count()
            });

            Ok(result)
        })
    }
}
