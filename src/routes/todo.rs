//! Todo routes. Static segments are matched before `/:id`.

use crate::handlers::todo::{
    create, delete, filter, find_one, group_by_category, list_all, options, paginate, patch, probe, probe_without_id,
    read, read_head_segment, replace, sort, sort_with_order,
};
use crate::state::AppState;
use axum::{
    routing::{get, head},
    Router,
};

pub fn todo_routes(state: AppState) -> Router {
    Router::new()
        .route("/", get(find_one).post(create).delete(delete).options(options))
        .route("/all", get(list_all))
        .route("/sort", get(sort))
        .route("/sortwithorder", get(sort_with_order))
        .route("/pagination", get(paginate))
        .route("/filter", get(filter))
        .route("/groupbycategory", get(group_by_category))
        .route("/head", head(probe_without_id).get(read_head_segment))
        .route("/head/:id", head(probe))
        .route("/:id", get(read).put(replace).patch(patch))
        .with_state(state)
}
