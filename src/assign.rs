//! Assignment recommendations for important tasks.
//!
//! An important task is an unassigned, non-completed sub-task whose parent
//! task's performer is known. The recommender suggests who should take it:
//! free employees when any exist, otherwise the parent's performer if they
//! are not meaningfully more loaded than the least-busy employee, otherwise
//! the set of employees tied at minimum load.

use crate::db::Database;
use crate::types::{
    Candidates, Employee, EmployeeId, RecommendationEntry, TaskCounts,
};
use anyhow::Result;
use std::collections::HashMap;
use tracing::debug;

/// Load summary derived from per-employee task counts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadSummary {
    /// Non-completed task count per employee.
    pub loads: HashMap<EmployeeId, i64>,
    /// Employees with no tasks or only completed tasks, ascending by id.
    pub free: Vec<EmployeeId>,
    /// Minimum load over all employees; `None` when no employees exist.
    pub min_load: Option<i64>,
    /// Employees tied at the minimum load, ascending by id.
    pub least_loaded: Vec<EmployeeId>,
}

impl LoadSummary {
    /// Classify raw task counts into loads, the free set, and the
    /// least-loaded set.
    pub fn from_counts(counts: &HashMap<EmployeeId, TaskCounts>) -> Self {
        let loads: HashMap<EmployeeId, i64> =
            counts.iter().map(|(&id, c)| (id, c.active())).collect();

        let mut free: Vec<EmployeeId> = counts
            .iter()
            .filter(|(_, c)| c.is_free())
            .map(|(&id, _)| id)
            .collect();
        free.sort_unstable();

        let min_load = loads.values().copied().min();

        let mut least_loaded: Vec<EmployeeId> = match min_load {
            Some(min) => loads
                .iter()
                .filter(|&(_, &load)| load == min)
                .map(|(&id, _)| id)
                .collect(),
            None => Vec::new(),
        };
        least_loaded.sort_unstable();

        Self {
            loads,
            free,
            min_load,
            least_loaded,
        }
    }
}

/// Recommends performers for important tasks.
///
/// Stateless between calls: every invocation recomputes loads from the store,
/// so concurrent requests never observe a stale index. Read-only.
pub struct Recommender {
    db: Database,
    reassign_threshold: i64,
}

impl Recommender {
    pub fn new(db: Database, reassign_threshold: i64) -> Self {
        Self {
            db,
            reassign_threshold,
        }
    }

    /// Produce one recommendation entry per important task.
    ///
    /// Per-task lookup gaps (e.g. a performer deleted mid-flight) degrade to
    /// `Candidates::None`; only store I/O failures propagate.
    pub fn recommend(&self) -> Result<Vec<RecommendationEntry>> {
        let important = self.db.important_tasks()?;
        if important.is_empty() {
            return Ok(Vec::new());
        }

        let counts = self.db.employee_task_counts()?;
        let summary = LoadSummary::from_counts(&counts);
        let employees: HashMap<EmployeeId, Employee> = self
            .db
            .list_employees()?
            .into_iter()
            .map(|e| (e.id, e))
            .collect();

        debug!(
            important = important.len(),
            free = summary.free.len(),
            min_load = ?summary.min_load,
            "computing recommendations"
        );

        let free_set = resolve(&summary.free, &employees);
        let least_loaded_set = resolve(&summary.least_loaded, &employees);

        let entries = important
            .into_iter()
            .map(|it| {
                let candidates = if !free_set.is_empty() {
                    // Whole free set, identical for every entry: any free
                    // employee may volunteer.
                    Candidates::AnyFree(free_set.clone())
                } else {
                    self.pick_loaded(
                        it.parent_performer_id,
                        &summary,
                        &employees,
                        &least_loaded_set,
                    )
                };

                RecommendationEntry {
                    task_id: it.task.id,
                    name: it.task.name,
                    deadline: it.task.deadline,
                    // Important tasks always have a parent.
                    parent_task_id: it.task.parent_task_id.unwrap_or_default(),
                    status: it.task.status,
                    candidates,
                }
            })
            .collect();

        Ok(entries)
    }

    /// No free employees: keep the sub-task with the parent's performer when
    /// their load is within the threshold of the minimum, otherwise surface
    /// the whole least-loaded set.
    fn pick_loaded(
        &self,
        parent_performer_id: EmployeeId,
        summary: &LoadSummary,
        employees: &HashMap<EmployeeId, Employee>,
        least_loaded_set: &[Employee],
    ) -> Candidates {
        let Some(min_load) = summary.min_load else {
            // No employees at all; still no error.
            return Candidates::None;
        };

        let (Some(&performer_load), Some(performer)) = (
            summary.loads.get(&parent_performer_id),
            employees.get(&parent_performer_id),
        ) else {
            // Parent performer vanished between queries.
            return Candidates::None;
        };

        if performer_load - min_load <= self.reassign_threshold {
            Candidates::Reassign(performer.clone())
        } else if least_loaded_set.is_empty() {
            Candidates::None
        } else {
            Candidates::LeastLoaded(least_loaded_set.to_vec())
        }
    }
}

fn resolve(ids: &[EmployeeId], employees: &HashMap<EmployeeId, Employee>) -> Vec<Employee> {
    ids.iter()
        .filter_map(|id| employees.get(id).cloned())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn counts(entries: &[(EmployeeId, i64, i64)]) -> HashMap<EmployeeId, TaskCounts> {
        entries
            .iter()
            .map(|&(id, total, completed)| (id, TaskCounts { total, completed }))
            .collect()
    }

    fn employee(id: EmployeeId) -> Employee {
        Employee {
            id,
            first_name: format!("Employee {}", id),
            last_name: "Test".to_string(),
            father_name: None,
            email: format!("e{}@example.com", id),
            phone: None,
            address: None,
            position: None,
            created_at: 0,
        }
    }

    fn recommender() -> Recommender {
        let db = Database::open_in_memory().unwrap();
        Recommender::new(db, 2)
    }

    #[test]
    fn summary_empty_population() {
        let summary = LoadSummary::from_counts(&HashMap::new());
        assert!(summary.free.is_empty());
        assert!(summary.least_loaded.is_empty());
        assert_eq!(summary.min_load, None);
    }

    #[test]
    fn summary_free_includes_zero_and_all_completed() {
        let summary = LoadSummary::from_counts(&counts(&[(1, 0, 0), (2, 4, 4), (3, 3, 1)]));
        assert_eq!(summary.free, vec![1, 2]);
        assert_eq!(summary.loads[&3], 2);
    }

    #[test]
    fn summary_least_loaded_surfaces_ties() {
        let summary = LoadSummary::from_counts(&counts(&[(1, 5, 0), (2, 7, 0), (3, 5, 0)]));
        assert_eq!(summary.min_load, Some(5));
        assert_eq!(summary.least_loaded, vec![1, 3]);
        assert!(summary.free.is_empty());
    }

    #[test]
    fn summary_completed_tasks_reduce_load() {
        let summary = LoadSummary::from_counts(&counts(&[(1, 6, 4), (2, 3, 0)]));
        assert_eq!(summary.loads[&1], 2);
        assert_eq!(summary.min_load, Some(2));
        assert_eq!(summary.least_loaded, vec![1]);
    }

    #[test]
    fn pick_loaded_with_no_employees_yields_none() {
        let summary = LoadSummary::from_counts(&HashMap::new());

        let candidates = recommender().pick_loaded(1, &summary, &HashMap::new(), &[]);

        assert_eq!(candidates, Candidates::None);
    }

    #[test]
    fn pick_loaded_with_vanished_parent_performer_yields_none() {
        let summary = LoadSummary::from_counts(&counts(&[(1, 3, 0)]));
        let employees = HashMap::from([(1, employee(1))]);
        let least_loaded = vec![employee(1)];

        // Performer 9 is absent from the load index (deleted mid-flight).
        let candidates = recommender().pick_loaded(9, &summary, &employees, &least_loaded);

        assert_eq!(candidates, Candidates::None);
    }
}
