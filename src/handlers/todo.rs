//! Todo handlers: lookup, listing, sorting, paging, filtering, grouping and CRUD.

use crate::error::AppError;
use crate::model::{TodoInput, TodoPatch, TodoReplacement};
use crate::query::{
    app_id_from_value, parse_app_id, parse_completed, CompletedQuery, FilterQuery, PageQuery, PageWindow, RecordId,
    SortQuery, SortSpec, TodoFilter,
};
use crate::response::{success_created, success_ok, success_with_message, PageBody};
use crate::state::AppState;
use crate::validation::TodoValidator;
use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use serde_json::Value;

pub const ALLOWED_METHODS: &str = "GET, POST, PUT, PATCH, DELETE, HEAD, OPTIONS";

/// GET /: first record matching `completed`, wrapped in a list.
pub async fn find_one(
    State(state): State<AppState>,
    query: Result<Query<CompletedQuery>, QueryRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Query(q) = query?;
    let filter = TodoFilter::by_completed(parse_completed(q.completed.as_deref()));
    let found = state
        .store
        .find_one(&filter)
        .await
        .map_err(AppError::store("fetching TodoItems"))?;
    Ok(success_ok(found.into_iter().collect::<Vec<_>>()))
}

pub async fn list_all(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let todos = state
        .store
        .list_all()
        .await
        .map_err(AppError::store("fetching all TodoItems"))?;
    Ok(success_ok(todos))
}

/// GET /sort: always ascending.
pub async fn sort(
    State(state): State<AppState>,
    query: Result<Query<SortQuery>, QueryRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Query(q) = query?;
    let spec = SortSpec::from_params(q.sort_by.as_deref(), None);
    let todos = state
        .store
        .find_sorted(&spec)
        .await
        .map_err(AppError::store("sorting TodoItems"))?;
    Ok(success_ok(todos))
}

pub async fn sort_with_order(
    State(state): State<AppState>,
    query: Result<Query<SortQuery>, QueryRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Query(q) = query?;
    let spec = SortSpec::from_params(q.sort_by.as_deref(), q.order.as_deref());
    let todos = state
        .store
        .find_sorted(&spec)
        .await
        .map_err(AppError::store("sorting TodoItems"))?;
    Ok(success_ok(todos))
}

pub async fn paginate(
    State(state): State<AppState>,
    query: Result<Query<PageQuery>, QueryRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Query(q) = query?;
    let window = PageWindow::from_params(q.page.as_deref(), q.limit.as_deref())?;
    let page = state
        .store
        .find_page(&window)
        .await
        .map_err(AppError::store("fetching paginated TodoItems"))?;
    Ok((
        StatusCode::OK,
        Json(PageBody {
            success: true,
            page: window.page,
            limit: window.limit,
            total_count: page.total_count,
            total_pages: window.total_pages(page.total_count),
            data: page.items,
        }),
    ))
}

pub async fn filter(
    State(state): State<AppState>,
    query: Result<Query<FilterQuery>, QueryRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Query(q) = query?;
    let filter = TodoFilter::from_query(q);
    tracing::debug!(?filter, "filter todos");
    let todos = state
        .store
        .find_filtered(&filter)
        .await
        .map_err(AppError::store("filtering TodoItems"))?;
    Ok(success_ok(todos))
}

pub async fn group_by_category(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let groups = state
        .store
        .group_by_category()
        .await
        .map_err(AppError::store("grouping todos by category"))?;
    Ok(success_ok(groups))
}

/// HEAD /head: nothing to probe without an id.
pub async fn probe_without_id() -> StatusCode {
    StatusCode::NOT_FOUND
}

/// GET /head: `head` is read as a record id, which it never is.
pub async fn read_head_segment() -> AppError {
    AppError::invalid_record_id()
}

/// HEAD /head/:id: 202 when the record exists, 404 otherwise (including unparseable ids).
pub async fn probe(
    State(state): State<AppState>,
    path: Result<Path<String>, PathRejection>,
) -> Result<StatusCode, AppError> {
    let Ok(Path(raw)) = path else {
        return Ok(StatusCode::NOT_FOUND);
    };
    let Some(filter) = TodoFilter::for_record(RecordId::parse(&raw)) else {
        return Ok(StatusCode::NOT_FOUND);
    };
    let found = state
        .store
        .find_one(&filter)
        .await
        .map_err(AppError::store("probing the TodoItem"))?;
    Ok(if found.is_some() { StatusCode::ACCEPTED } else { StatusCode::NOT_FOUND })
}

/// GET /:id: by store id or application id.
pub async fn read(
    State(state): State<AppState>,
    path: Result<Path<String>, PathRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Path(raw) = path?;
    let filter = TodoFilter::for_record(RecordId::parse(&raw)).ok_or_else(AppError::invalid_record_id)?;
    let todo = state
        .store
        .find_one(&filter)
        .await
        .map_err(AppError::store("fetching the TodoItem"))?
        .ok_or_else(AppError::todo_not_found)?;
    Ok(success_ok(todo))
}

pub async fn options() -> impl IntoResponse {
    (StatusCode::OK, [(header::ALLOW, ALLOWED_METHODS)])
}

pub async fn create(
    State(state): State<AppState>,
    body: Result<Json<TodoInput>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(input) = body?;
    TodoValidator::validate(&input.fields)?;
    let todo = state
        .store
        .create(input)
        .await
        .map_err(AppError::store("creating the TodoItem"))?;
    tracing::info!(id = todo.id, "todo created");
    Ok(success_created(todo))
}

/// PUT /:id: overwrite every field but the ids and `createdAt`.
pub async fn replace(
    State(state): State<AppState>,
    path: Result<Path<String>, PathRejection>,
    body: Result<Json<TodoReplacement>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Path(raw) = path?;
    let id = parse_app_id(&raw)?;
    let Json(replacement) = body?;
    TodoValidator::validate(&replacement)?;
    let todo = state
        .store
        .replace(id, replacement)
        .await
        .map_err(AppError::store("updating the TodoItem"))?
        .ok_or_else(AppError::todo_not_found)?;
    Ok(success_ok(todo))
}

pub async fn patch(
    State(state): State<AppState>,
    path: Result<Path<String>, PathRejection>,
    body: Result<Json<TodoPatch>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Path(raw) = path?;
    let id = parse_app_id(&raw)?;
    let Json(patch) = body?;
    TodoValidator::validate_partial(&patch)?;
    let todo = state
        .store
        .patch(id, patch)
        .await
        .map_err(AppError::store("patching the TodoItem"))?
        .ok_or_else(AppError::todo_not_found)?;
    Ok(success_ok(todo))
}

/// DELETE / with `{"id": n}` in the body.
pub async fn delete(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(body) = body?;
    let id = app_id_from_value(body.get("id"))?;
    let todo = state
        .store
        .delete(id)
        .await
        .map_err(AppError::store("deleting the TodoItem"))?
        .ok_or_else(AppError::todo_not_found)?;
    tracing::info!(id, "todo deleted");
    Ok(success_with_message("Todo item deleted successfully.", todo))
}
