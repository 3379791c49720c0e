//! In-process store with the same query semantics as the MongoDB one. Backs the test suite.

use super::{Page, StoreError, TodoStore};
use crate::model::{CategoryGroup, FilteredTodo, GroupedTodo, PageEntry, SortedTodo, TodoInput, TodoItem, TodoPatch, TodoReplacement, TodoSummary};
use crate::query::{PageWindow, SortSpec, TodoFilter};
use async_trait::async_trait;
use mongodb::bson::{self, oid::ObjectId};
use std::collections::BTreeMap;
use tokio::sync::RwLock;

/// Records in insertion order, which stands in for the collection's natural order.
#[derive(Default)]
pub struct MemoryStore {
    todos: RwLock<Vec<TodoItem>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.todos.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.todos.read().await.is_empty()
    }
}

#[async_trait]
impl TodoStore for MemoryStore {
    async fn list_all(&self) -> Result<Vec<TodoItem>, StoreError> {
        Ok(self.todos.read().await.clone())
    }

    async fn find_one(&self, filter: &TodoFilter) -> Result<Option<TodoSummary>, StoreError> {
        let todos = self.todos.read().await;
        // min_by keeps the first of equal elements, matching a stable sort + limit 1.
        let found = todos
            .iter()
            .filter(|t| filter.matches(t))
            .min_by(|a, b| a.priority.cmp(&b.priority));
        Ok(found.map(TodoSummary::from))
    }

    async fn find_sorted(&self, sort: &SortSpec) -> Result<Vec<SortedTodo>, StoreError> {
        let guard = self.todos.read().await;
        let mut todos: Vec<&TodoItem> = guard.iter().collect();
        todos.sort_by(|a, b| sort.compare(a, b));
        Ok(todos.into_iter().map(SortedTodo::from).collect())
    }

    async fn find_page(&self, window: &PageWindow) -> Result<Page<PageEntry>, StoreError> {
        let todos = self.todos.read().await;
        let items = todos
            .iter()
            .skip(usize::try_from(window.skip()).unwrap_or(usize::MAX))
            .take(usize::try_from(window.limit).unwrap_or(usize::MAX))
            .map(PageEntry::from)
            .collect();
        Ok(Page {
            items,
            total_count: todos.len() as u64,
        })
    }

    async fn find_filtered(&self, filter: &TodoFilter) -> Result<Vec<FilteredTodo>, StoreError> {
        let todos = self.todos.read().await;
        Ok(todos.iter().filter(|t| filter.matches(t)).map(FilteredTodo::from).collect())
    }

    async fn group_by_category(&self) -> Result<Vec<CategoryGroup>, StoreError> {
        let todos = self.todos.read().await;
        let mut groups: BTreeMap<&str, Vec<GroupedTodo>> = BTreeMap::new();
        for t in todos.iter() {
            for category in &t.categories {
                groups.entry(category.as_str()).or_default().push(GroupedTodo::from(t));
            }
        }
        Ok(groups
            .into_iter()
            .map(|(category, todos)| CategoryGroup {
                category: category.to_string(),
                count: todos.len() as u64,
                todos,
            })
            .collect())
    }

    async fn create(&self, input: TodoInput) -> Result<TodoItem, StoreError> {
        let mut todos = self.todos.write().await;
        if todos.iter().any(|t| t.id == input.id) {
            return Err(StoreError::DuplicateId(input.id));
        }
        let item = TodoItem::from_input(ObjectId::new(), input, bson::DateTime::now());
        todos.push(item.clone());
        Ok(item)
    }

    async fn replace(&self, id: i64, replacement: TodoReplacement) -> Result<Option<TodoItem>, StoreError> {
        let mut todos = self.todos.write().await;
        Ok(todos.iter_mut().find(|t| t.id == id).map(|t| {
            t.replace_with(replacement, bson::DateTime::now());
            t.clone()
        }))
    }

    async fn patch(&self, id: i64, patch: TodoPatch) -> Result<Option<TodoItem>, StoreError> {
        let mut todos = self.todos.write().await;
        Ok(todos.iter_mut().find(|t| t.id == id).map(|t| {
            t.apply_patch(patch, bson::DateTime::now());
            t.clone()
        }))
    }

    async fn delete(&self, id: i64) -> Result<Option<TodoItem>, StoreError> {
        let mut todos = self.todos.write().await;
        Ok(todos.iter().position(|t| t.id == id).map(|i| todos.remove(i)))
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}
