//! axum-based HTTP server exposing employee/task CRUD and the
//! assignment-recommendation endpoint.

use axum::{
    Json, Router,
    extract::{Path, State},
    routing::get,
};
use serde_json::{Value, json};
use std::net::SocketAddr;
use tokio::sync::oneshot;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::assign::Recommender;
use crate::config::Config;
use crate::db::Database;
use crate::error::{ApiError, ApiResult};
use crate::types::{
    Employee, EmployeeUpdate, EmployeeWithTasks, NewEmployee, NewTask, RecommendationEntry, Task,
    TaskUpdate,
};

/// Server state shared across handlers.
#[derive(Clone)]
pub struct AppServer {
    db: Database,
    config: Config,
}

impl AppServer {
    pub fn new(db: Database, config: Config) -> Self {
        Self { db, config }
    }

    fn recommender(&self) -> Recommender {
        Recommender::new(self.db.clone(), self.config.assignment.reassign_threshold)
    }
}

/// Health check response.
#[derive(serde::Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

// ---------------------------------------------------------------------------
// Employees
// ---------------------------------------------------------------------------

async fn list_employees(State(state): State<AppServer>) -> ApiResult<Json<Vec<Employee>>> {
    let employees = state.db.list_employees()?;
    Ok(Json(employees))
}

async fn create_employee(
    State(state): State<AppServer>,
    Json(input): Json<NewEmployee>,
) -> ApiResult<Json<Employee>> {
    if input.email.is_empty() {
        return Err(ApiError::missing_field("email"));
    }

    let employee = state.db.create_employee(input).map_err(unique_conflict)?;
    Ok(Json(employee))
}

async fn get_employee(
    State(state): State<AppServer>,
    Path(employee_id): Path<i64>,
) -> ApiResult<Json<Employee>> {
    let employee = state
        .db
        .get_employee(employee_id)?
        .ok_or_else(|| ApiError::employee_not_found(employee_id))?;
    Ok(Json(employee))
}

async fn update_employee(
    State(state): State<AppServer>,
    Path(employee_id): Path<i64>,
    Json(update): Json<EmployeeUpdate>,
) -> ApiResult<Json<Employee>> {
    if state.db.get_employee(employee_id)?.is_none() {
        return Err(ApiError::employee_not_found(employee_id));
    }

    let employee = state
        .db
        .update_employee(employee_id, update)
        .map_err(unique_conflict)?;
    Ok(Json(employee))
}

async fn delete_employee(
    State(state): State<AppServer>,
    Path(employee_id): Path<i64>,
) -> ApiResult<Json<Value>> {
    if !state.db.delete_employee(employee_id)? {
        return Err(ApiError::employee_not_found(employee_id));
    }
    Ok(Json(json!({ "message": format!("Employee {} deleted", employee_id) })))
}

/// Employees carrying non-completed tasks, lightest load first.
async fn employees_sorted_by_tasks(
    State(state): State<AppServer>,
) -> ApiResult<Json<Vec<EmployeeWithTasks>>> {
    let employees = state.db.employees_by_active_load()?;
    Ok(Json(employees))
}

// ---------------------------------------------------------------------------
// Tasks
// ---------------------------------------------------------------------------

async fn list_tasks(State(state): State<AppServer>) -> ApiResult<Json<Vec<Task>>> {
    let tasks = state.db.list_tasks()?;
    Ok(Json(tasks))
}

async fn create_task(
    State(state): State<AppServer>,
    Json(input): Json<NewTask>,
) -> ApiResult<Json<Task>> {
    if let Some(performer_id) = input.performer_id {
        if state.db.get_employee(performer_id)?.is_none() {
            return Err(ApiError::invalid_value(
                "performer_id",
                &format!("Employee {} does not exist", performer_id),
            ));
        }
    }
    if let Some(parent_id) = input.parent_task_id {
        if state.db.get_task(parent_id)?.is_none() {
            return Err(ApiError::invalid_value(
                "parent_task_id",
                &format!("Task {} does not exist", parent_id),
            ));
        }
    }

    let task = state.db.create_task(input)?;
    Ok(Json(task))
}

async fn get_task(
    State(state): State<AppServer>,
    Path(task_id): Path<i64>,
) -> ApiResult<Json<Task>> {
    let task = state
        .db
        .get_task(task_id)?
        .ok_or_else(|| ApiError::task_not_found(task_id))?;
    Ok(Json(task))
}

async fn update_task(
    State(state): State<AppServer>,
    Path(task_id): Path<i64>,
    Json(update): Json<TaskUpdate>,
) -> ApiResult<Json<Task>> {
    if state.db.get_task(task_id)?.is_none() {
        return Err(ApiError::task_not_found(task_id));
    }
    if update.parent_task_id == Some(Some(task_id)) {
        return Err(ApiError::self_parent(task_id));
    }
    if let Some(Some(performer_id)) = update.performer_id {
        if state.db.get_employee(performer_id)?.is_none() {
            return Err(ApiError::invalid_value(
                "performer_id",
                &format!("Employee {} does not exist", performer_id),
            ));
        }
    }
    if let Some(Some(parent_id)) = update.parent_task_id {
        if state.db.get_task(parent_id)?.is_none() {
            return Err(ApiError::invalid_value(
                "parent_task_id",
                &format!("Task {} does not exist", parent_id),
            ));
        }
    }

    let task = state.db.update_task(task_id, update)?;
    Ok(Json(task))
}

async fn delete_task(
    State(state): State<AppServer>,
    Path(task_id): Path<i64>,
) -> ApiResult<Json<Value>> {
    if !state.db.delete_task(task_id)? {
        return Err(ApiError::task_not_found(task_id));
    }
    Ok(Json(json!({ "message": format!("Task {} deleted", task_id) })))
}

/// Assignment recommendations for important tasks.
async fn important_tasks(
    State(state): State<AppServer>,
) -> ApiResult<Json<Vec<RecommendationEntry>>> {
    let entries = state.recommender().recommend()?;
    Ok(Json(entries))
}

/// Map UNIQUE-constraint violations (duplicate email) to a conflict error.
fn unique_conflict(err: anyhow::Error) -> ApiError {
    if err.to_string().contains("UNIQUE constraint failed") {
        ApiError::already_exists("Employee with this email")
    } else {
        err.into()
    }
}

/// Build the router with all routes.
pub fn build_router(state: AppServer) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/employees", get(list_employees).post(create_employee))
        .route("/employees/sorted_by_tasks", get(employees_sorted_by_tasks))
        .route(
            "/employees/{employee_id}",
            get(get_employee).put(update_employee).delete(delete_employee),
        )
        .route("/tasks", get(list_tasks).post(create_task))
        .route("/tasks/important", get(important_tasks))
        .route(
            "/tasks/{task_id}",
            get(get_task).put(update_task).delete(delete_task),
        )
        .route("/api/health", get(health))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Start the HTTP server on the configured port.
///
/// Returns a oneshot sender that can be used to signal shutdown,
/// and the actual address the server is bound to.
pub async fn start_server(
    db: Database,
    config: Config,
) -> anyhow::Result<(oneshot::Sender<()>, SocketAddr)> {
    let port = config.server.port;
    let state = AppServer::new(db, config);
    let app = build_router(state);

    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    let bound_addr = listener.local_addr()?;

    info!("API server listening on http://{}", bound_addr);

    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app)
            .with_graceful_shutdown(async {
                let _ = shutdown_rx.await;
                info!("API server shutting down");
            })
            .await
        {
            tracing::error!("API server error: {}", e);
        }
    });

    Ok((shutdown_tx, bound_addr))
}
