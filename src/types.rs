//! Core types for the workboard backend.

use serde::{Deserialize, Serialize};

/// Employee identifier (database row id).
pub type EmployeeId = i64;

/// Task identifier (database row id).
pub type TaskId = i64;

/// Lifecycle status of a task.
///
/// The store accepts arbitrary writes between states; nothing in the
/// recommendation logic mutates status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    #[default]
    New,
    InProgress,
    Completed,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::New => "new",
            TaskStatus::InProgress => "in_progress",
            TaskStatus::Completed => "completed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "new" => Some(TaskStatus::New),
            "in_progress" => Some(TaskStatus::InProgress),
            "completed" => Some(TaskStatus::Completed),
            _ => None,
        }
    }
}

/// An employee.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Employee {
    pub id: EmployeeId,
    pub first_name: String,
    pub last_name: String,
    pub father_name: Option<String>,
    pub email: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub position: Option<String>,
    pub created_at: i64,
}

/// Input for creating an employee.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewEmployee {
    pub first_name: String,
    pub last_name: String,
    pub father_name: Option<String>,
    pub email: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub position: Option<String>,
}

/// Partial update for an employee. `None` fields are left unchanged; inner
/// `Option`s allow clearing nullable fields.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EmployeeUpdate {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub father_name: Option<Option<String>>,
    pub email: Option<String>,
    pub phone: Option<Option<String>>,
    pub address: Option<Option<String>>,
    pub position: Option<Option<String>>,
}

/// A task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub name: String,
    pub description: Option<String>,
    pub created_at: i64,
    /// Deadline as epoch milliseconds.
    pub deadline: Option<i64>,
    pub status: TaskStatus,
    pub performer_id: Option<EmployeeId>,
    pub parent_task_id: Option<TaskId>,
}

/// Input for creating a task.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewTask {
    pub name: String,
    pub description: Option<String>,
    pub deadline: Option<i64>,
    #[serde(default)]
    pub status: TaskStatus,
    pub performer_id: Option<EmployeeId>,
    pub parent_task_id: Option<TaskId>,
}

/// Partial update for a task. `None` fields are left unchanged; inner
/// `Option`s allow clearing nullable fields.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TaskUpdate {
    pub name: Option<String>,
    pub description: Option<Option<String>>,
    pub deadline: Option<Option<i64>>,
    pub status: Option<TaskStatus>,
    pub performer_id: Option<Option<EmployeeId>>,
    pub parent_task_id: Option<Option<TaskId>>,
}

/// A task awaiting assignment whose parent task already has a performer.
///
/// Derived from the store, never persisted: `status != completed`,
/// `performer_id` unset, `parent_task_id` set, parent's performer set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportantTask {
    #[serde(flatten)]
    pub task: Task,
    /// Performer of the parent task.
    pub parent_performer_id: EmployeeId,
}

/// Per-employee task totals used by the load index and free-employee finder.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TaskCounts {
    pub total: i64,
    pub completed: i64,
}

impl TaskCounts {
    /// Non-completed task count: the employee's load.
    pub fn active(&self) -> i64 {
        self.total - self.completed
    }

    /// An employee is free when they have no tasks, or every task they
    /// ever performed is completed.
    pub fn is_free(&self) -> bool {
        self.total == 0 || self.total == self.completed
    }
}

/// Who should take an important task.
///
/// A typed sum rather than one overloaded field: the free-set branch and the
/// reassignment branch carry different shapes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "employees", rename_all = "snake_case")]
pub enum Candidates {
    /// Every free employee may volunteer; the full set is surfaced.
    AnyFree(Vec<Employee>),
    /// Keep the sub-task with the parent task's performer.
    Reassign(Employee),
    /// Fall back to the employees tied at minimum load; ties are not broken.
    LeastLoaded(Vec<Employee>),
    /// No viable candidate (no employees, or the parent performer vanished).
    None,
}

/// One recommendation per important task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendationEntry {
    pub task_id: TaskId,
    pub name: String,
    pub deadline: Option<i64>,
    pub parent_task_id: TaskId,
    pub status: TaskStatus,
    pub candidates: Candidates,
}

/// An employee together with their tasks, for the load-sorted listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmployeeWithTasks {
    #[serde(flatten)]
    pub employee: Employee,
    pub tasks: Vec<Task>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_roundtrip() {
        for status in [TaskStatus::New, TaskStatus::InProgress, TaskStatus::Completed] {
            assert_eq!(TaskStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(TaskStatus::parse("done"), None);
    }

    #[test]
    fn counts_active_and_free() {
        let none = TaskCounts { total: 0, completed: 0 };
        assert!(none.is_free());
        assert_eq!(none.active(), 0);

        let all_done = TaskCounts { total: 3, completed: 3 };
        assert!(all_done.is_free());
        assert_eq!(all_done.active(), 0);

        let busy = TaskCounts { total: 5, completed: 2 };
        assert!(!busy.is_free());
        assert_eq!(busy.active(), 3);
    }
}
