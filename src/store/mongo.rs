//! MongoDB-backed store. Filters, projections and the category pipeline come from `query`.

use super::{Page, StoreError, TodoStore};
use crate::config::{Settings, DEFAULT_DATABASE};
use crate::model::{CategoryGroup, FilteredTodo, PageEntry, SortedTodo, TodoInput, TodoItem, TodoPatch, TodoReplacement, TodoSummary};
use crate::query::{
    filtered_projection, group_by_category_pipeline, page_projection, sorted_projection, summary_projection, PageWindow,
    SortSpec, TodoFilter,
};
use async_trait::async_trait;
use futures::stream::TryStreamExt;
use mongodb::bson::{self, doc, Document};
use mongodb::options::{ClientOptions, IndexOptions, ReturnDocument};
use mongodb::{Client, Collection, Database, IndexModel};

#[derive(Clone)]
pub struct MongoStore {
    db: Database,
    todos: Collection<TodoItem>,
}

impl MongoStore {
    /// Build the pooled client from settings. The driver connects lazily.
    pub async fn connect(settings: &Settings) -> Result<Self, StoreError> {
        let options = ClientOptions::parse(&settings.mongodb_uri).await?;
        let database = database_name(settings, &options);
        let client = Client::with_options(options)?;
        Ok(Self::new(client.database(&database), &settings.collection))
    }

    pub fn new(db: Database, collection: &str) -> Self {
        let todos = db.collection::<TodoItem>(collection);
        MongoStore { db, todos }
    }

    pub fn database_name(&self) -> &str {
        self.db.name()
    }

    /// Unique index on the application id.
    pub async fn ensure_indexes(&self) -> Result<(), StoreError> {
        let index = IndexModel::builder()
            .keys(doc! { "id": 1 })
            .options(IndexOptions::builder().unique(true).build())
            .build();
        self.todos.create_index(index).await?;
        Ok(())
    }

    async fn update_by_app_id(&self, id: i64, set: Document) -> Result<Option<TodoItem>, StoreError> {
        let update = set_with_timestamp(set, bson::DateTime::now());
        tracing::debug!(id, update = %update, "find_one_and_update");
        let updated = self
            .todos
            .find_one_and_update(doc! { "id": id }, update)
            .return_document(ReturnDocument::After)
            .await?;
        Ok(updated)
    }
}

#[async_trait]
impl TodoStore for MongoStore {
    async fn list_all(&self) -> Result<Vec<TodoItem>, StoreError> {
        let cursor = self.todos.find(doc! {}).await?;
        Ok(cursor.try_collect().await?)
    }

    async fn find_one(&self, filter: &TodoFilter) -> Result<Option<TodoSummary>, StoreError> {
        let filter = filter.to_document();
        tracing::debug!(filter = %filter, "find_one");
        let found = self
            .todos
            .clone_with_type::<TodoSummary>()
            .find_one(filter)
            .sort(doc! { "priority": 1 })
            .projection(summary_projection())
            .await?;
        Ok(found)
    }

    async fn find_sorted(&self, sort: &SortSpec) -> Result<Vec<SortedTodo>, StoreError> {
        let sort = sort.to_document();
        tracing::debug!(sort = %sort, "find_sorted");
        let cursor = self
            .todos
            .clone_with_type::<SortedTodo>()
            .find(doc! {})
            .sort(sort)
            .projection(sorted_projection())
            .await?;
        Ok(cursor.try_collect().await?)
    }

    async fn find_page(&self, window: &PageWindow) -> Result<Page<PageEntry>, StoreError> {
        tracing::debug!(skip = window.skip(), limit = window.limit, "find_page");
        let cursor = self
            .todos
            .clone_with_type::<PageEntry>()
            .find(doc! {})
            .skip(window.skip())
            .limit(window.limit as i64)
            .projection(page_projection())
            .await?;
        let items = cursor.try_collect().await?;
        let total_count = self.todos.count_documents(doc! {}).await?;
        Ok(Page { items, total_count })
    }

    async fn find_filtered(&self, filter: &TodoFilter) -> Result<Vec<FilteredTodo>, StoreError> {
        let filter = filter.to_document();
        tracing::debug!(filter = %filter, "find_filtered");
        let cursor = self
            .todos
            .clone_with_type::<FilteredTodo>()
            .find(filter)
            .projection(filtered_projection())
            .await?;
        Ok(cursor.try_collect().await?)
    }

    async fn group_by_category(&self) -> Result<Vec<CategoryGroup>, StoreError> {
        let docs: Vec<Document> = self.todos.aggregate(group_by_category_pipeline()).await?.try_collect().await?;
        docs.into_iter()
            .map(|d| bson::from_document(d).map_err(StoreError::from))
            .collect()
    }

    async fn create(&self, input: TodoInput) -> Result<TodoItem, StoreError> {
        let now = bson::DateTime::now();
        let doc = insert_document(&input, now)?;
        tracing::debug!(id = input.id, "insert_one");
        let inserted = self.todos.clone_with_type::<Document>().insert_one(doc).await?;
        let store_id = inserted
            .inserted_id
            .as_object_id()
            .ok_or_else(|| StoreError::UnexpectedInsertedId(inserted.inserted_id.to_string()))?;
        Ok(TodoItem::from_input(store_id, input, now))
    }

    async fn replace(&self, id: i64, replacement: TodoReplacement) -> Result<Option<TodoItem>, StoreError> {
        self.update_by_app_id(id, bson::to_document(&replacement)?).await
    }

    async fn patch(&self, id: i64, patch: TodoPatch) -> Result<Option<TodoItem>, StoreError> {
        self.update_by_app_id(id, bson::to_document(&patch)?).await
    }

    async fn delete(&self, id: i64) -> Result<Option<TodoItem>, StoreError> {
        tracing::debug!(id, "find_one_and_delete");
        Ok(self.todos.find_one_and_delete(doc! { "id": id }).await?)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        self.db.run_command(doc! { "ping": 1 }).await?;
        Ok(())
    }
}

/// `MONGODB_DATABASE`, then the database named in the connection string, then the default.
fn database_name(settings: &Settings, options: &ClientOptions) -> String {
    settings
        .database
        .clone()
        .or_else(|| options.default_database.clone())
        .unwrap_or_else(|| DEFAULT_DATABASE.into())
}

/// New document with both timestamps; the driver assigns `_id`.
fn insert_document(input: &TodoInput, now: bson::DateTime) -> Result<Document, StoreError> {
    let mut doc = bson::to_document(input)?;
    doc.insert("createdAt", now);
    doc.insert("updatedAt", now);
    Ok(doc)
}

/// `$set` of the given fields plus a fresh `updatedAt`.
fn set_with_timestamp(mut set: Document, now: bson::DateTime) -> Document {
    set.insert("updatedAt", now);
    doc! { "$set": set }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Subtask;

    fn replacement() -> TodoReplacement {
        TodoReplacement {
            title: "Complete the project".into(),
            description: "Finish the pending tasks".into(),
            completed: false,
            date: "2024-12-01".into(),
            categories: vec!["Work".into()],
            priority: "High".into(),
            due_time: "17:00".into(),
            tags: vec![],
            assigned_to: "John Doe".into(),
            subtasks: vec![Subtask { title: "Write code".into(), completed: false }],
            progress: 0,
            status: "Open".into(),
        }
    }

    fn settings(database: Option<&str>) -> Settings {
        let mut s = Settings::from_lookup(|_| None).unwrap();
        s.database = database.map(str::to_string);
        s
    }

    #[tokio::test]
    async fn database_name_resolution() {
        let options = ClientOptions::parse("mongodb://db:27017/tasks?retryWrites=true").await.unwrap();
        assert_eq!(database_name(&settings(None), &options), "tasks");
        assert_eq!(database_name(&settings(Some("other")), &options), "other");

        let bare = ClientOptions::parse("mongodb://db:27017/").await.unwrap();
        assert_eq!(database_name(&settings(None), &bare), DEFAULT_DATABASE);
    }

    #[test]
    fn insert_document_carries_timestamps_and_no_store_id() {
        let now = bson::DateTime::from_millis(1_700_000_000_000);
        let doc = insert_document(&TodoInput { id: 9, fields: replacement() }, now).unwrap();
        assert_eq!(doc.get_i64("id").unwrap(), 9);
        assert_eq!(doc.get_datetime("createdAt").unwrap(), &now);
        assert_eq!(doc.get_datetime("updatedAt").unwrap(), &now);
        assert!(!doc.contains_key("_id"));
    }

    #[test]
    fn replacement_update_sets_every_field_but_ids_and_created_at() {
        let now = bson::DateTime::from_millis(5_000);
        let update = set_with_timestamp(bson::to_document(&replacement()).unwrap(), now);
        assert_eq!(update.len(), 1);
        let set = update.get_document("$set").unwrap();
        assert_eq!(set.get_str("title").unwrap(), "Complete the project");
        assert_eq!(set.get_str("assignedTo").unwrap(), "John Doe");
        assert_eq!(set.get_datetime("updatedAt").unwrap(), &now);
        for key in ["_id", "id", "createdAt"] {
            assert!(!set.contains_key(key), "{key}");
        }
        assert_eq!(set.len(), 13);
    }

    #[test]
    fn patch_update_sets_only_present_fields() {
        let now = bson::DateTime::from_millis(5_000);
        let patch = TodoPatch { completed: Some(true), progress: Some(50), ..Default::default() };
        let update = set_with_timestamp(bson::to_document(&patch).unwrap(), now);
        assert_eq!(
            update,
            doc! { "$set": { "completed": true, "progress": 50, "updatedAt": now } }
        );
    }
}
