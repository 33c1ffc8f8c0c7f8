//! Integration tests for the database layer.
//!
//! These tests verify the core database operations using an in-memory SQLite
//! database. Tests are organized by module and functionality.

use workboard::db::Database;
use workboard::types::{EmployeeUpdate, NewEmployee, NewTask, TaskStatus, TaskUpdate};

/// Helper to create a fresh in-memory database for testing.
fn setup_db() -> Database {
    Database::open_in_memory().expect("Failed to create in-memory database")
}

fn new_employee(email: &str) -> NewEmployee {
    NewEmployee {
        first_name: "Test".to_string(),
        last_name: "Employee".to_string(),
        father_name: None,
        email: email.to_string(),
        phone: None,
        address: None,
        position: Some("engineer".to_string()),
    }
}

fn new_task(name: &str) -> NewTask {
    NewTask {
        name: name.to_string(),
        description: None,
        deadline: None,
        status: TaskStatus::New,
        performer_id: None,
        parent_task_id: None,
    }
}

mod employee_tests {
    use super::*;

    #[test]
    fn create_employee_assigns_id_and_timestamp() {
        let db = setup_db();

        let employee = db
            .create_employee(new_employee("alice@example.com"))
            .expect("Failed to create employee");

        assert!(employee.id > 0);
        assert!(employee.created_at > 0);
        assert_eq!(employee.email, "alice@example.com");
    }

    #[test]
    fn create_employee_rejects_duplicate_email() {
        let db = setup_db();
        db.create_employee(new_employee("dup@example.com")).unwrap();

        let result = db.create_employee(new_employee("dup@example.com"));

        assert!(result.is_err());
    }

    #[test]
    fn get_employee_returns_created_employee() {
        let db = setup_db();
        let created = db.create_employee(new_employee("bob@example.com")).unwrap();

        let found = db.get_employee(created.id).unwrap();

        assert_eq!(found, Some(created));
    }

    #[test]
    fn get_employee_returns_none_for_unknown_id() {
        let db = setup_db();

        let result = db.get_employee(9999).unwrap();

        assert!(result.is_none());
    }

    #[test]
    fn update_employee_changes_only_set_fields() {
        let db = setup_db();
        let created = db.create_employee(new_employee("carol@example.com")).unwrap();

        let updated = db
            .update_employee(
                created.id,
                EmployeeUpdate {
                    position: Some(Some("manager".to_string())),
                    phone: Some(Some("+1-234".to_string())),
                    ..Default::default()
                },
            )
            .unwrap();

        assert_eq!(updated.position.as_deref(), Some("manager"));
        assert_eq!(updated.phone.as_deref(), Some("+1-234"));
        assert_eq!(updated.email, "carol@example.com");
        assert_eq!(updated.created_at, created.created_at);
    }

    #[test]
    fn update_employee_can_clear_nullable_field() {
        let db = setup_db();
        let created = db.create_employee(new_employee("dan@example.com")).unwrap();
        assert!(created.position.is_some());

        let updated = db
            .update_employee(
                created.id,
                EmployeeUpdate {
                    position: Some(None),
                    ..Default::default()
                },
            )
            .unwrap();

        assert!(updated.position.is_none());
    }

    #[test]
    fn update_unknown_employee_fails() {
        let db = setup_db();

        let result = db.update_employee(42, EmployeeUpdate::default());

        assert!(result.is_err());
    }

    #[test]
    fn delete_employee_clears_performer_on_tasks() {
        let db = setup_db();
        let employee = db.create_employee(new_employee("eve@example.com")).unwrap();
        let task = db
            .create_task(NewTask {
                performer_id: Some(employee.id),
                ..new_task("assigned")
            })
            .unwrap();

        assert!(db.delete_employee(employee.id).unwrap());

        let task = db.get_task(task.id).unwrap().unwrap();
        assert!(task.performer_id.is_none());
    }

    #[test]
    fn delete_unknown_employee_returns_false() {
        let db = setup_db();

        assert!(!db.delete_employee(4242).unwrap());
    }

    #[test]
    fn list_employees_returns_all_in_id_order() {
        let db = setup_db();
        let a = db.create_employee(new_employee("a@example.com")).unwrap();
        let b = db.create_employee(new_employee("b@example.com")).unwrap();

        let employees = db.list_employees().unwrap();

        assert_eq!(employees, vec![a, b]);
    }
}

mod task_tests {
    use super::*;

    #[test]
    fn create_task_defaults_to_new_status() {
        let db = setup_db();

        let task = db.create_task(new_task("write report")).unwrap();

        assert!(task.id > 0);
        assert_eq!(task.status, TaskStatus::New);
        assert!(task.performer_id.is_none());
        assert!(task.parent_task_id.is_none());
    }

    #[test]
    fn create_task_rejects_unknown_performer() {
        let db = setup_db();

        let result = db.create_task(NewTask {
            performer_id: Some(77),
            ..new_task("orphan performer")
        });

        assert!(result.is_err());
    }

    #[test]
    fn create_task_rejects_unknown_parent() {
        let db = setup_db();

        let result = db.create_task(NewTask {
            parent_task_id: Some(77),
            ..new_task("orphan parent")
        });

        assert!(result.is_err());
    }

    #[test]
    fn update_task_rejects_self_parent() {
        let db = setup_db();
        let task = db.create_task(new_task("loop")).unwrap();

        let result = db.update_task(
            task.id,
            TaskUpdate {
                parent_task_id: Some(Some(task.id)),
                ..Default::default()
            },
        );

        assert!(result.is_err());
    }

    #[test]
    fn update_task_changes_status_and_performer() {
        let db = setup_db();
        let employee = db.create_employee(new_employee("w@example.com")).unwrap();
        let task = db.create_task(new_task("work")).unwrap();

        let updated = db
            .update_task(
                task.id,
                TaskUpdate {
                    status: Some(TaskStatus::InProgress),
                    performer_id: Some(Some(employee.id)),
                    ..Default::default()
                },
            )
            .unwrap();

        assert_eq!(updated.status, TaskStatus::InProgress);
        assert_eq!(updated.performer_id, Some(employee.id));
    }

    #[test]
    fn delete_task_clears_parent_on_subtasks() {
        let db = setup_db();
        let parent = db.create_task(new_task("parent")).unwrap();
        let child = db
            .create_task(NewTask {
                parent_task_id: Some(parent.id),
                ..new_task("child")
            })
            .unwrap();

        assert!(db.delete_task(parent.id).unwrap());

        let child = db.get_task(child.id).unwrap().unwrap();
        assert!(child.parent_task_id.is_none());
    }

    #[test]
    fn list_tasks_for_performer_filters_by_employee() {
        let db = setup_db();
        let a = db.create_employee(new_employee("a@example.com")).unwrap();
        let b = db.create_employee(new_employee("b@example.com")).unwrap();
        db.create_task(NewTask {
            performer_id: Some(a.id),
            ..new_task("for a")
        })
        .unwrap();
        db.create_task(NewTask {
            performer_id: Some(b.id),
            ..new_task("for b")
        })
        .unwrap();

        let tasks = db.list_tasks_for_performer(a.id).unwrap();

        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].name, "for a");
    }
}

mod important_task_tests {
    use super::*;

    #[test]
    fn important_tasks_match_all_conditions() {
        let db = setup_db();
        let performer = db.create_employee(new_employee("p@example.com")).unwrap();
        let parent = db
            .create_task(NewTask {
                performer_id: Some(performer.id),
                ..new_task("parent")
            })
            .unwrap();
        let child = db
            .create_task(NewTask {
                parent_task_id: Some(parent.id),
                ..new_task("child")
            })
            .unwrap();

        let important = db.important_tasks().unwrap();

        assert_eq!(important.len(), 1);
        assert_eq!(important[0].task.id, child.id);
        assert_eq!(important[0].parent_performer_id, performer.id);
    }

    #[test]
    fn completed_subtask_is_not_important() {
        let db = setup_db();
        let performer = db.create_employee(new_employee("p@example.com")).unwrap();
        let parent = db
            .create_task(NewTask {
                performer_id: Some(performer.id),
                ..new_task("parent")
            })
            .unwrap();
        db.create_task(NewTask {
            parent_task_id: Some(parent.id),
            status: TaskStatus::Completed,
            ..new_task("done child")
        })
        .unwrap();

        assert!(db.important_tasks().unwrap().is_empty());
    }

    #[test]
    fn assigned_subtask_is_not_important() {
        let db = setup_db();
        let performer = db.create_employee(new_employee("p@example.com")).unwrap();
        let parent = db
            .create_task(NewTask {
                performer_id: Some(performer.id),
                ..new_task("parent")
            })
            .unwrap();
        db.create_task(NewTask {
            parent_task_id: Some(parent.id),
            performer_id: Some(performer.id),
            ..new_task("claimed child")
        })
        .unwrap();

        assert!(db.important_tasks().unwrap().is_empty());
    }

    #[test]
    fn subtask_of_unassigned_parent_is_not_important() {
        let db = setup_db();
        let parent = db.create_task(new_task("unassigned parent")).unwrap();
        db.create_task(NewTask {
            parent_task_id: Some(parent.id),
            ..new_task("child")
        })
        .unwrap();

        assert!(db.important_tasks().unwrap().is_empty());
    }

    #[test]
    fn top_level_task_is_not_important() {
        let db = setup_db();
        db.create_task(new_task("no parent")).unwrap();

        assert!(db.important_tasks().unwrap().is_empty());
    }
}

mod load_tests {
    use super::*;

    #[test]
    fn counts_cover_employees_without_tasks() {
        let db = setup_db();
        let idle = db.create_employee(new_employee("idle@example.com")).unwrap();

        let counts = db.employee_task_counts().unwrap();

        assert_eq!(counts.len(), 1);
        assert_eq!(counts[&idle.id].total, 0);
        assert_eq!(counts[&idle.id].active(), 0);
    }

    #[test]
    fn counts_split_total_and_completed() {
        let db = setup_db();
        let worker = db.create_employee(new_employee("w@example.com")).unwrap();
        for status in [TaskStatus::New, TaskStatus::InProgress, TaskStatus::Completed] {
            db.create_task(NewTask {
                performer_id: Some(worker.id),
                status,
                ..new_task("t")
            })
            .unwrap();
        }

        let counts = db.employee_task_counts().unwrap();

        assert_eq!(counts[&worker.id].total, 3);
        assert_eq!(counts[&worker.id].completed, 1);
        assert_eq!(counts[&worker.id].active(), 2);
    }

    #[test]
    fn unassigned_tasks_do_not_count() {
        let db = setup_db();
        let worker = db.create_employee(new_employee("w@example.com")).unwrap();
        db.create_task(new_task("nobody's")).unwrap();

        let counts = db.employee_task_counts().unwrap();

        assert_eq!(counts[&worker.id].total, 0);
    }

    #[test]
    fn employees_by_active_load_sorts_lightest_first() {
        let db = setup_db();
        let light = db.create_employee(new_employee("light@example.com")).unwrap();
        let heavy = db.create_employee(new_employee("heavy@example.com")).unwrap();
        db.create_task(NewTask {
            performer_id: Some(light.id),
            ..new_task("one")
        })
        .unwrap();
        for name in ["a", "b", "c"] {
            db.create_task(NewTask {
                performer_id: Some(heavy.id),
                ..new_task(name)
            })
            .unwrap();
        }

        let listing = db.employees_by_active_load().unwrap();

        assert_eq!(listing.len(), 2);
        assert_eq!(listing[0].employee.id, light.id);
        assert_eq!(listing[1].employee.id, heavy.id);
        assert_eq!(listing[1].tasks.len(), 3);
    }

    #[test]
    fn employees_by_active_load_skips_free_employees() {
        let db = setup_db();
        db.create_employee(new_employee("idle@example.com")).unwrap();
        let done = db.create_employee(new_employee("done@example.com")).unwrap();
        db.create_task(NewTask {
            performer_id: Some(done.id),
            status: TaskStatus::Completed,
            ..new_task("finished")
        })
        .unwrap();

        assert!(db.employees_by_active_load().unwrap().is_empty());
    }
}

mod open_tests {
    use super::*;

    #[test]
    fn open_creates_file_backed_database() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("workboard.db");

        let db = Database::open(&path).expect("Failed to open database");
        db.create_employee(new_employee("file@example.com")).unwrap();

        // Reopen: migrations must be idempotent and data must persist.
        drop(db);
        let db = Database::open(&path).expect("Failed to reopen database");
        assert_eq!(db.list_employees().unwrap().len(), 1);
    }
}
