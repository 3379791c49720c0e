//! OpenAPI document listing the request and response schemas.

use crate::model::{
    CategoryGroup, FilteredTodo, GroupedTodo, PageEntry, SortedTodo, Subtask, TodoInput, TodoItem, TodoPatch,
    TodoReplacement, TodoSummary,
};
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(components(schemas(
    Subtask,
    TodoItem,
    TodoInput,
    TodoReplacement,
    TodoPatch,
    TodoSummary,
    SortedTodo,
    PageEntry,
    FilteredTodo,
    GroupedTodo,
    CategoryGroup
)))]
pub struct ApiDoc;
