//! Record access layer: the narrow interface handlers use to reach the document store.

mod memory;
mod mongo;

pub use memory::MemoryStore;
pub use mongo::MongoStore;

use crate::model::{CategoryGroup, FilteredTodo, PageEntry, SortedTodo, TodoInput, TodoItem, TodoPatch, TodoReplacement, TodoSummary};
use crate::query::{PageWindow, SortSpec, TodoFilter};
use async_trait::async_trait;
use mongodb::bson;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("mongodb: {0}")]
    Mongo(#[from] mongodb::error::Error),
    #[error("bson encode: {0}")]
    Encode(#[from] bson::ser::Error),
    #[error("bson decode: {0}")]
    Decode(#[from] bson::de::Error),
    #[error("duplicate id {0}")]
    DuplicateId(i64),
    #[error("insert returned a non-ObjectId _id: {0}")]
    UnexpectedInsertedId(String),
}

/// One page of entries plus the total number of records.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total_count: u64,
}

#[async_trait]
pub trait TodoStore: Send + Sync {
    /// Every record, unfiltered.
    async fn list_all(&self) -> Result<Vec<TodoItem>, StoreError>;

    /// First match ordered by priority ascending.
    async fn find_one(&self, filter: &TodoFilter) -> Result<Option<TodoSummary>, StoreError>;

    async fn find_sorted(&self, sort: &SortSpec) -> Result<Vec<SortedTodo>, StoreError>;

    async fn find_page(&self, window: &PageWindow) -> Result<Page<PageEntry>, StoreError>;

    async fn find_filtered(&self, filter: &TodoFilter) -> Result<Vec<FilteredTodo>, StoreError>;

    /// A record with N categories lands in N groups; groups are ordered by category name.
    async fn group_by_category(&self) -> Result<Vec<CategoryGroup>, StoreError>;

    /// Fails on a duplicate application id.
    async fn create(&self, input: TodoInput) -> Result<TodoItem, StoreError>;

    async fn replace(&self, id: i64, replacement: TodoReplacement) -> Result<Option<TodoItem>, StoreError>;

    async fn patch(&self, id: i64, patch: TodoPatch) -> Result<Option<TodoItem>, StoreError>;

    async fn delete(&self, id: i64) -> Result<Option<TodoItem>, StoreError>;

    async fn ping(&self) -> Result<(), StoreError>;
}
