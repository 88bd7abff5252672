use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use missionlog_core::{
    Category, CreateTaskInput, Error, FocusEntry, FocusItem, RangeStats, StateChange, Task,
    TaskOrderUpdate, TaskState, TaskView, UpdateTaskInput,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::error::{ApiError, ApiResult};
use super::identity::CurrentUser;
use super::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct DateQuery {
    pub date: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RangeQuery {
    pub start: Option<String>,
    pub end: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SetStateRequest {
    pub state: String,
    #[serde(default)]
    pub date: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct StateResponse {
    pub task_id: Uuid,
    pub state: TaskState,
}

#[derive(Debug, Deserialize)]
pub struct FocusRequest {
    pub task_id: Uuid,
}

#[derive(Debug, Serialize)]
pub struct Health {
    pub status: &'static str,
    pub version: &'static str,
}

/// Run a storage-bound service call off the async workers.
async fn blocking<T, F>(work: F) -> ApiResult<T>
where
    F: FnOnce() -> missionlog_core::Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|err| Error::StorageUnavailable(format!("Worker failed: {}", err)))?
        .map_err(ApiError::from)
}

pub async fn health() -> Json<Health> {
    Json(Health {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

pub async fn list_tasks(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Query(query): Query<DateQuery>,
) -> ApiResult<Json<Vec<TaskView>>> {
    let missions = blocking(move || state.ledger.list_for_day(&user, query.date.as_deref())).await?;
    Ok(Json(missions))
}

pub async fn create_task(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(input): Json<CreateTaskInput>,
) -> ApiResult<(StatusCode, Json<Task>)> {
    let task = blocking(move || state.tasks.create_task(&user, input)).await?;
    Ok((StatusCode::CREATED, Json(task)))
}

pub async fn update_task(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
    Json(input): Json<UpdateTaskInput>,
) -> ApiResult<Json<Task>> {
    let task = blocking(move || state.tasks.update_task(&user, id, input)).await?;
    Ok(Json(task))
}

pub async fn delete_task(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    blocking(move || state.tasks.delete_task(&user, id)).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn reorder_tasks(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(updates): Json<Vec<TaskOrderUpdate>>,
) -> ApiResult<StatusCode> {
    blocking(move || state.tasks.reorder_tasks(&user, &updates)).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn get_task_state(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
    Query(query): Query<DateQuery>,
) -> ApiResult<Json<StateResponse>> {
    let resolved =
        blocking(move || state.ledger.resolve_state(&user, id, query.date.as_deref())).await?;
    Ok(Json(StateResponse {
        task_id: id,
        state: resolved,
    }))
}

pub async fn set_task_state(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
    Json(request): Json<SetStateRequest>,
) -> ApiResult<Json<StateChange>> {
    let new_state = TaskState::from_str(request.state.trim())
        .ok_or_else(|| Error::invalid(format!("Invalid state: {}", request.state)))?;
    let change = blocking(move || {
        state
            .ledger
            .set_state(&user, id, new_state, request.date.as_deref())
    })
    .await?;
    Ok(Json(change))
}

pub async fn range_stats(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Query(query): Query<RangeQuery>,
) -> ApiResult<Json<RangeStats>> {
    let stats = blocking(move || {
        state
            .stats
            .range_stats(&user, query.start.as_deref(), query.end.as_deref())
    })
    .await?;
    Ok(Json(stats))
}

pub async fn list_categories(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> ApiResult<Json<Vec<Category>>> {
    let categories = blocking(move || state.tasks.categories(&user)).await?;
    Ok(Json(categories))
}

pub async fn list_focus(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Query(query): Query<DateQuery>,
) -> ApiResult<Json<Vec<FocusItem>>> {
    let items = blocking(move || state.focus.list(&user, query.date.as_deref())).await?;
    Ok(Json(items))
}

pub async fn add_focus(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(request): Json<FocusRequest>,
) -> ApiResult<(StatusCode, Json<FocusEntry>)> {
    let entry = blocking(move || state.focus.add(&user, request.task_id)).await?;
    Ok((StatusCode::CREATED, Json(entry)))
}

pub async fn remove_focus(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(task_id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    blocking(move || state.focus.remove(&user, task_id)).await?;
    Ok(StatusCode::NO_CONTENT)
}
