//! TodoItem document and the typed shapes written to and read from the store.
//!
//! Write payloads (`TodoInput`, `TodoReplacement`, `TodoPatch`) serialize to BSON with the
//! same camelCase keys the collection uses. Read shapes derive `Deserialize` for the driver
//! and serialize to JSON for responses: object ids as hex strings, timestamps as RFC 3339.

use chrono::{DateTime, SecondsFormat, Utc};
use mongodb::bson::{self, oid::ObjectId};
use serde::{Deserialize, Serialize, Serializer};
use utoipa::ToSchema;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Subtask {
    pub title: String,
    pub completed: bool,
}

/// Full stored record, as returned by list, create, update and delete.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TodoItem {
    #[serde(rename = "_id", serialize_with = "serialize_object_id")]
    #[schema(value_type = String)]
    pub store_id: ObjectId,
    pub id: i64,
    pub title: String,
    pub description: String,
    pub completed: bool,
    pub date: String,
    pub categories: Vec<String>,
    pub priority: String,
    pub due_time: String,
    pub tags: Vec<String>,
    pub assigned_to: String,
    pub subtasks: Vec<Subtask>,
    pub progress: i32,
    pub status: String,
    #[serde(serialize_with = "serialize_datetime")]
    #[schema(value_type = String, format = DateTime)]
    pub created_at: bson::DateTime,
    #[serde(serialize_with = "serialize_datetime")]
    #[schema(value_type = String, format = DateTime)]
    pub updated_at: bson::DateTime,
}

impl TodoItem {
    /// Build a stored record from a create payload.
    pub fn from_input(store_id: ObjectId, input: TodoInput, now: bson::DateTime) -> Self {
        let TodoInput { id, fields: r } = input;
        TodoItem {
            store_id,
            id,
            title: r.title,
            description: r.description,
            completed: r.completed,
            date: r.date,
            categories: r.categories,
            priority: r.priority,
            due_time: r.due_time,
            tags: r.tags,
            assigned_to: r.assigned_to,
            subtasks: r.subtasks,
            progress: r.progress,
            status: r.status,
            created_at: now,
            updated_at: now,
        }
    }

    /// Overwrite every field except the ids and `created_at`.
    pub fn replace_with(&mut self, r: TodoReplacement, now: bson::DateTime) {
        self.title = r.title;
        self.description = r.description;
        self.completed = r.completed;
        self.date = r.date;
        self.categories = r.categories;
        self.priority = r.priority;
        self.due_time = r.due_time;
        self.tags = r.tags;
        self.assigned_to = r.assigned_to;
        self.subtasks = r.subtasks;
        self.progress = r.progress;
        self.status = r.status;
        self.updated_at = now;
    }

    /// Overwrite only the fields present in the patch.
    pub fn apply_patch(&mut self, p: TodoPatch, now: bson::DateTime) {
        if let Some(v) = p.title {
            self.title = v;
        }
        if let Some(v) = p.description {
            self.description = v;
        }
        if let Some(v) = p.completed {
            self.completed = v;
        }
        if let Some(v) = p.date {
            self.date = v;
        }
        if let Some(v) = p.categories {
            self.categories = v;
        }
        if let Some(v) = p.priority {
            self.priority = v;
        }
        if let Some(v) = p.due_time {
            self.due_time = v;
        }
        if let Some(v) = p.tags {
            self.tags = v;
        }
        if let Some(v) = p.assigned_to {
            self.assigned_to = v;
        }
        if let Some(v) = p.subtasks {
            self.subtasks = v;
        }
        if let Some(v) = p.progress {
            self.progress = v;
        }
        if let Some(v) = p.status {
            self.status = v;
        }
        self.updated_at = now;
    }
}

/// Every writable field except the application id. Body of PUT; `id` in the body is ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TodoReplacement {
    pub title: String,
    pub description: String,
    pub completed: bool,
    pub date: String,
    pub categories: Vec<String>,
    pub priority: String,
    pub due_time: String,
    pub tags: Vec<String>,
    pub assigned_to: String,
    pub subtasks: Vec<Subtask>,
    pub progress: i32,
    pub status: String,
}

/// Body of POST: the full record including the application id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct TodoInput {
    pub id: i64,
    #[serde(flatten)]
    pub fields: TodoReplacement,
}

/// Body of PATCH. Absent (or null) fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TodoPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub categories: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assigned_to: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtasks: Option<Vec<Subtask>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub progress: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

/// Single-record lookup shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct TodoSummary {
    #[serde(rename = "_id", serialize_with = "serialize_object_id")]
    #[schema(value_type = String)]
    pub store_id: ObjectId,
    pub id: i64,
    pub title: String,
    pub description: String,
    pub priority: String,
}

impl From<&TodoItem> for TodoSummary {
    fn from(t: &TodoItem) -> Self {
        TodoSummary {
            store_id: t.store_id,
            id: t.id,
            title: t.title.clone(),
            description: t.description.clone(),
            priority: t.priority.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct SortedTodo {
    pub title: String,
    pub description: String,
    pub priority: String,
    pub completed: bool,
}

impl From<&TodoItem> for SortedTodo {
    fn from(t: &TodoItem) -> Self {
        SortedTodo {
            title: t.title.clone(),
            description: t.description.clone(),
            priority: t.priority.clone(),
            completed: t.completed,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct PageEntry {
    pub title: String,
    pub description: String,
    pub completed: bool,
}

impl From<&TodoItem> for PageEntry {
    fn from(t: &TodoItem) -> Self {
        PageEntry {
            title: t.title.clone(),
            description: t.description.clone(),
            completed: t.completed,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct FilteredTodo {
    pub title: String,
    pub description: String,
    pub categories: Vec<String>,
    pub completed: bool,
    pub priority: String,
}

impl From<&TodoItem> for FilteredTodo {
    fn from(t: &TodoItem) -> Self {
        FilteredTodo {
            title: t.title.clone(),
            description: t.description.clone(),
            categories: t.categories.clone(),
            completed: t.completed,
            priority: t.priority.clone(),
        }
    }
}

/// Entry inside a category group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct GroupedTodo {
    pub title: String,
    pub description: String,
    pub completed: bool,
    pub priority: String,
}

impl From<&TodoItem> for GroupedTodo {
    fn from(t: &TodoItem) -> Self {
        GroupedTodo {
            title: t.title.clone(),
            description: t.description.clone(),
            completed: t.completed,
            priority: t.priority.clone(),
        }
    }
}

/// One bucket of the category aggregation. The pipeline emits the key as `_id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct CategoryGroup {
    #[serde(alias = "_id")]
    pub category: String,
    pub todos: Vec<GroupedTodo>,
    pub count: u64,
}

fn serialize_object_id<S: Serializer>(oid: &ObjectId, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(&oid.to_hex())
}

fn serialize_datetime<S: Serializer>(dt: &bson::DateTime, s: S) -> Result<S::Ok, S::Error> {
    let ts = DateTime::<Utc>::from_timestamp_millis(dt.timestamp_millis()).unwrap_or_default();
    s.serialize_str(&ts.to_rfc3339_opts(SecondsFormat::Millis, true))
}
