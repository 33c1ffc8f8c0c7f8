//! Employee CRUD operations.

use super::{Database, now_ms};
use crate::types::{Employee, EmployeeId, EmployeeUpdate, NewEmployee};
use anyhow::{Result, anyhow};
use rusqlite::{Connection, Row, params};

pub(crate) fn parse_employee_row(row: &Row) -> rusqlite::Result<Employee> {
    Ok(Employee {
        id: row.get("id")?,
        first_name: row.get("first_name")?,
        last_name: row.get("last_name")?,
        father_name: row.get("father_name")?,
        email: row.get("email")?,
        phone: row.get("phone")?,
        address: row.get("address")?,
        position: row.get("position")?,
        created_at: row.get("created_at")?,
    })
}

/// Internal helper to get an employee using an existing connection (avoids deadlock).
pub(crate) fn get_employee_internal(
    conn: &Connection,
    employee_id: EmployeeId,
) -> Result<Option<Employee>> {
    let mut stmt = conn.prepare("SELECT * FROM employees WHERE id = ?1")?;

    let result = stmt.query_row(params![employee_id], parse_employee_row);

    match result {
        Ok(employee) => Ok(Some(employee)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

impl Database {
    /// Create a new employee.
    pub fn create_employee(&self, input: NewEmployee) -> Result<Employee> {
        let now = now_ms();

        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO employees (
                    first_name, last_name, father_name, email, phone, address, position, created_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                params![
                    input.first_name,
                    input.last_name,
                    input.father_name,
                    input.email,
                    input.phone,
                    input.address,
                    input.position,
                    now,
                ],
            )?;

            let id = conn.last_insert_rowid();

            Ok(Employee {
                id,
                first_name: input.first_name,
                last_name: input.last_name,
                father_name: input.father_name,
                email: input.email,
                phone: input.phone,
                address: input.address,
                position: input.position,
                created_at: now,
            })
        })
    }

    /// Get an employee by id.
    pub fn get_employee(&self, employee_id: EmployeeId) -> Result<Option<Employee>> {
        self.with_conn(|conn| get_employee_internal(conn, employee_id))
    }

    /// Update an employee. Unset fields keep their current values.
    pub fn update_employee(
        &self,
        employee_id: EmployeeId,
        update: EmployeeUpdate,
    ) -> Result<Employee> {
        self.with_conn(|conn| {
            let employee = get_employee_internal(conn, employee_id)?
                .ok_or_else(|| anyhow!("Employee {} not found", employee_id))?;

            let first_name = update.first_name.unwrap_or(employee.first_name);
            let last_name = update.last_name.unwrap_or(employee.last_name);
            let father_name = update.father_name.unwrap_or(employee.father_name);
            let email = update.email.unwrap_or(employee.email);
            let phone = update.phone.unwrap_or(employee.phone);
            let address = update.address.unwrap_or(employee.address);
            let position = update.position.unwrap_or(employee.position);

            conn.execute(
                "UPDATE employees SET
                    first_name = ?1, last_name = ?2, father_name = ?3, email = ?4,
                    phone = ?5, address = ?6, position = ?7
                 WHERE id = ?8",
                params![
                    first_name,
                    last_name,
                    father_name,
                    email,
                    phone,
                    address,
                    position,
                    employee_id,
                ],
            )?;

            Ok(Employee {
                id: employee_id,
                first_name,
                last_name,
                father_name,
                email,
                phone,
                address,
                position,
                created_at: employee.created_at,
            })
        })
    }

    /// Delete an employee. Their tasks keep existing with performer cleared
    /// (ON DELETE SET NULL). Returns false if no such employee.
    pub fn delete_employee(&self, employee_id: EmployeeId) -> Result<bool> {
        self.with_conn(|conn| {
            let deleted = conn.execute(
                "DELETE FROM employees WHERE id = ?1",
                params![employee_id],
            )?;
            Ok(deleted > 0)
        })
    }

    /// List all employees ordered by id.
    pub fn list_employees(&self) -> Result<Vec<Employee>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare("SELECT * FROM employees ORDER BY id")?;

            let employees = stmt
                .query_map([], parse_employee_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?;

            Ok(employees)
        })
    }
}
