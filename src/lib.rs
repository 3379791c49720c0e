//! To-do list REST backend on MongoDB.
//!
//! Requests are translated into typed descriptors (`query`), executed through the
//! `TodoStore` interface (`store`), and answered in a `{success, data, message}` envelope.

pub mod config;
pub mod error;
pub mod handlers;
pub mod model;
pub mod openapi;
pub mod query;
pub mod response;
pub mod routes;
pub mod state;
pub mod store;
pub mod validation;

pub use config::Settings;
pub use error::{AppError, ConfigError};
pub use routes::{app, common_routes, todo_routes};
pub use state::AppState;
pub use store::{MemoryStore, MongoStore, StoreError, TodoStore};
