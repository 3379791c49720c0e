//! Request parameters -> store descriptors: record ids, filters, sort order, page windows.

use crate::error::AppError;
use crate::model::TodoItem;
use mongodb::bson::{doc, oid::ObjectId, Document};
use serde::Deserialize;
use serde_json::Value;
use std::cmp::Ordering;

/// How a path parameter addresses a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordId {
    /// 24-character hex store identifier.
    ByStoreId(ObjectId),
    /// Numeric application id.
    ByAppId(i64),
    Invalid,
}

impl RecordId {
    /// Store ids win over numeric ids: a 24-digit string is read as an ObjectId.
    pub fn parse(raw: &str) -> Self {
        if let Ok(oid) = ObjectId::parse_str(raw) {
            return RecordId::ByStoreId(oid);
        }
        match raw.parse::<i64>() {
            Ok(n) => RecordId::ByAppId(n),
            Err(_) => RecordId::Invalid,
        }
    }
}

/// Application id from a PUT/PATCH path segment.
pub fn parse_app_id(raw: &str) -> Result<i64, AppError> {
    raw.parse()
        .map_err(|_| AppError::BadRequest("Invalid ID parameter. ID must be a number.".into()))
}

/// Application id from a JSON body value. Integers and numeric strings are accepted; zero is not.
pub fn app_id_from_value(value: Option<&Value>) -> Result<i64, AppError> {
    let id = match value {
        Some(Value::Number(n)) => n.as_i64(),
        Some(Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    };
    match id {
        Some(n) if n != 0 => Ok(n),
        _ => Err(AppError::BadRequest("Invalid ID parameter. ID must be a number.".into())),
    }
}

/// `"true"` is true, any other provided value is false, absence is no constraint.
pub fn parse_completed(raw: Option<&str>) -> Option<bool> {
    raw.map(|s| s == "true")
}

#[derive(Debug, Default, Deserialize)]
pub struct CompletedQuery {
    pub completed: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct SortQuery {
    #[serde(rename = "sortBy")]
    pub sort_by: Option<String>,
    pub order: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<String>,
    pub limit: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct FilterQuery {
    pub title: Option<String>,
    pub category: Option<String>,
    pub completed: Option<String>,
    pub priority: Option<String>,
}

/// Key a listing is sorted by. Every TodoItem field has a variant; any other key is passed
/// to the store as given and, like a field no document carries, leaves the order unchanged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SortField {
    StoreId,
    Id,
    Title,
    Description,
    Completed,
    Date,
    Categories,
    Priority,
    DueTime,
    Tags,
    AssignedTo,
    Subtasks,
    Progress,
    Status,
    CreatedAt,
    UpdatedAt,
    Other(String),
}

impl SortField {
    pub fn from_key(key: &str) -> Self {
        match key {
            "_id" => SortField::StoreId,
            "id" => SortField::Id,
            "title" => SortField::Title,
            "description" => SortField::Description,
            "completed" => SortField::Completed,
            "date" => SortField::Date,
            "categories" => SortField::Categories,
            "priority" => SortField::Priority,
            "dueTime" => SortField::DueTime,
            "tags" => SortField::Tags,
            "assignedTo" => SortField::AssignedTo,
            "subtasks" => SortField::Subtasks,
            "progress" => SortField::Progress,
            "status" => SortField::Status,
            "createdAt" => SortField::CreatedAt,
            "updatedAt" => SortField::UpdatedAt,
            other => SortField::Other(other.to_string()),
        }
    }

    /// Document key in the collection.
    pub fn key(&self) -> &str {
        match self {
            SortField::StoreId => "_id",
            SortField::Id => "id",
            SortField::Title => "title",
            SortField::Description => "description",
            SortField::Completed => "completed",
            SortField::Date => "date",
            SortField::Categories => "categories",
            SortField::Priority => "priority",
            SortField::DueTime => "dueTime",
            SortField::Tags => "tags",
            SortField::AssignedTo => "assignedTo",
            SortField::Subtasks => "subtasks",
            SortField::Progress => "progress",
            SortField::Status => "status",
            SortField::CreatedAt => "createdAt",
            SortField::UpdatedAt => "updatedAt",
            SortField::Other(key) => key,
        }
    }

    /// Ascending comparison of two records on this field. Arrays compare by their smallest
    /// element when ascending and their largest when descending, as MongoDB does.
    pub fn compare(&self, a: &TodoItem, b: &TodoItem, order: SortOrder) -> Ordering {
        match self {
            SortField::StoreId => a.store_id.bytes().cmp(&b.store_id.bytes()),
            SortField::Id => a.id.cmp(&b.id),
            SortField::Title => a.title.cmp(&b.title),
            SortField::Description => a.description.cmp(&b.description),
            SortField::Completed => a.completed.cmp(&b.completed),
            SortField::Date => a.date.cmp(&b.date),
            SortField::Categories => array_key(&a.categories, order).cmp(&array_key(&b.categories, order)),
            SortField::Priority => a.priority.cmp(&b.priority),
            SortField::DueTime => a.due_time.cmp(&b.due_time),
            SortField::Tags => array_key(&a.tags, order).cmp(&array_key(&b.tags, order)),
            SortField::AssignedTo => a.assigned_to.cmp(&b.assigned_to),
            SortField::Subtasks => subtask_key(a, order).cmp(&subtask_key(b, order)),
            SortField::Progress => a.progress.cmp(&b.progress),
            SortField::Status => a.status.cmp(&b.status),
            SortField::CreatedAt => a.created_at.timestamp_millis().cmp(&b.created_at.timestamp_millis()),
            SortField::UpdatedAt => a.updated_at.timestamp_millis().cmp(&b.updated_at.timestamp_millis()),
            SortField::Other(_) => Ordering::Equal,
        }
    }
}

fn array_key(values: &[String], order: SortOrder) -> Option<&String> {
    match order {
        SortOrder::Ascending => values.iter().min(),
        SortOrder::Descending => values.iter().max(),
    }
}

/// Subtask documents compare by title, then completion.
fn subtask_key(t: &TodoItem, order: SortOrder) -> Option<(&str, bool)> {
    let entries = t.subtasks.iter().map(|s| (s.title.as_str(), s.completed));
    match order {
        SortOrder::Ascending => entries.min(),
        SortOrder::Descending => entries.max(),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Ascending,
    Descending,
}

impl SortOrder {
    /// `"desc"` sorts descending; anything else, or nothing, ascending.
    pub fn from_token(token: Option<&str>) -> Self {
        match token {
            Some("desc") => SortOrder::Descending,
            _ => SortOrder::Ascending,
        }
    }

    pub fn direction(self) -> i32 {
        match self {
            SortOrder::Ascending => 1,
            SortOrder::Descending => -1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortSpec {
    pub field: SortField,
    pub order: SortOrder,
}

impl SortSpec {
    /// Absent or empty `sortBy` sorts by `id`.
    pub fn from_params(sort_by: Option<&str>, order: Option<&str>) -> Self {
        let key = sort_by.filter(|k| !k.is_empty()).unwrap_or("id");
        SortSpec { field: SortField::from_key(key), order: SortOrder::from_token(order) }
    }

    pub fn to_document(&self) -> Document {
        let mut d = Document::new();
        d.insert(self.field.key(), self.order.direction());
        d
    }

    pub fn compare(&self, a: &TodoItem, b: &TodoItem) -> Ordering {
        let ord = self.field.compare(a, b, self.order);
        match self.order {
            SortOrder::Ascending => ord,
            SortOrder::Descending => ord.reverse(),
        }
    }
}

/// 1-based page window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub page: u64,
    pub limit: u64,
}

impl PageWindow {
    pub const DEFAULT_PAGE: u64 = 1;
    pub const DEFAULT_LIMIT: u64 = 2;

    /// Absent values take the defaults; present values must be positive integers whose
    /// skip still fits the store's signed 64-bit offset.
    pub fn from_params(page: Option<&str>, limit: Option<&str>) -> Result<Self, AppError> {
        let page = positive_or(page, Self::DEFAULT_PAGE)?;
        let limit = positive_or(limit, Self::DEFAULT_LIMIT)?;
        match (page - 1).checked_mul(limit) {
            Some(skip) if skip <= i64::MAX as u64 => Ok(PageWindow { page, limit }),
            _ => Err(AppError::BadRequest(
                "Invalid page or limit parameter. The requested page is out of range.".into(),
            )),
        }
    }

    pub fn skip(&self) -> u64 {
        (self.page - 1).saturating_mul(self.limit)
    }

    pub fn total_pages(&self, total_count: u64) -> u64 {
        total_count.div_ceil(self.limit)
    }
}

fn positive_or(raw: Option<&str>, default: u64) -> Result<u64, AppError> {
    let Some(raw) = raw else { return Ok(default) };
    match raw.trim().parse::<i64>() {
        Ok(n) if n >= 1 => Ok(n as u64),
        _ => Err(AppError::BadRequest(
            "Invalid page or limit parameter. Both must be positive integers.".into(),
        )),
    }
}

/// Equality constraints on a listing. `None` means no constraint on that field.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TodoFilter {
    pub store_id: Option<ObjectId>,
    pub app_id: Option<i64>,
    pub title: Option<String>,
    /// Matches records whose `categories` contain this label.
    pub category: Option<String>,
    pub completed: Option<bool>,
    pub priority: Option<String>,
}

impl TodoFilter {
    /// Filter for a single record; `None` for an invalid id.
    pub fn for_record(id: RecordId) -> Option<Self> {
        match id {
            RecordId::ByStoreId(oid) => Some(TodoFilter { store_id: Some(oid), ..Default::default() }),
            RecordId::ByAppId(n) => Some(TodoFilter { app_id: Some(n), ..Default::default() }),
            RecordId::Invalid => None,
        }
    }

    pub fn by_completed(completed: Option<bool>) -> Self {
        TodoFilter { completed, ..Default::default() }
    }

    /// Empty strings count as absent.
    pub fn from_query(q: FilterQuery) -> Self {
        let non_empty = |v: Option<String>| v.filter(|s| !s.is_empty());
        TodoFilter {
            title: non_empty(q.title),
            category: non_empty(q.category),
            completed: parse_completed(q.completed.as_deref()),
            priority: non_empty(q.priority),
            ..Default::default()
        }
    }

    pub fn to_document(&self) -> Document {
        let mut d = Document::new();
        if let Some(oid) = self.store_id {
            d.insert("_id", oid);
        }
        if let Some(id) = self.app_id {
            d.insert("id", id);
        }
        if let Some(title) = &self.title {
            d.insert("title", title.as_str());
        }
        if let Some(category) = &self.category {
            d.insert("categories", category.as_str());
        }
        if let Some(completed) = self.completed {
            d.insert("completed", completed);
        }
        if let Some(priority) = &self.priority {
            d.insert("priority", priority.as_str());
        }
        d
    }

    pub fn matches(&self, t: &TodoItem) -> bool {
        self.store_id.map_or(true, |oid| t.store_id == oid)
            && self.app_id.map_or(true, |id| t.id == id)
            && self.title.as_ref().map_or(true, |v| &t.title == v)
            && self.category.as_ref().map_or(true, |v| t.categories.contains(v))
            && self.completed.map_or(true, |v| t.completed == v)
            && self.priority.as_ref().map_or(true, |v| &t.priority == v)
    }
}

/// Projection for single-record lookups.
pub fn summary_projection() -> Document {
    doc! { "_id": 1, "id": 1, "title": 1, "description": 1, "priority": 1 }
}

pub fn sorted_projection() -> Document {
    doc! { "_id": 0, "title": 1, "description": 1, "priority": 1, "completed": 1 }
}

pub fn page_projection() -> Document {
    doc! { "_id": 0, "title": 1, "description": 1, "completed": 1 }
}

pub fn filtered_projection() -> Document {
    doc! { "_id": 0, "title": 1, "description": 1, "categories": 1, "completed": 1, "priority": 1 }
}

/// Unwind categories, bucket per category, count, order by category name.
pub fn group_by_category_pipeline() -> Vec<Document> {
    vec![
        doc! { "$unwind": "$categories" },
        doc! {
            "$group": {
                "_id": "$categories",
                "todos": {
                    "$push": {
                        "title": "$title",
                        "description": "$description",
                        "completed": "$completed",
                        "priority": "$priority",
                    }
                },
                "count": { "$sum": 1 },
            }
        },
        doc! { "$sort": { "_id": 1 } },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn record_id_prefers_store_id() {
        let hex = "64b7f3c2a1d4e5f6a7b8c9d0";
        assert_eq!(RecordId::parse(hex), RecordId::ByStoreId(ObjectId::parse_str(hex).unwrap()));
        let digits = "123456789012345678901234";
        assert!(matches!(RecordId::parse(digits), RecordId::ByStoreId(_)));
    }

    #[test]
    fn record_id_numeric_and_invalid() {
        assert_eq!(RecordId::parse("42"), RecordId::ByAppId(42));
        assert_eq!(RecordId::parse("-3"), RecordId::ByAppId(-3));
        assert_eq!(RecordId::parse("abc"), RecordId::Invalid);
        assert_eq!(RecordId::parse("12abc"), RecordId::Invalid);
        assert_eq!(RecordId::parse("64b7f3c2a1d4e5f6a7b8c9dz"), RecordId::Invalid);
        assert_eq!(RecordId::parse(""), RecordId::Invalid);
    }

    #[test]
    fn completed_coercion() {
        assert_eq!(parse_completed(Some("true")), Some(true));
        assert_eq!(parse_completed(Some("false")), Some(false));
        assert_eq!(parse_completed(Some("TRUE")), Some(false));
        assert_eq!(parse_completed(Some("")), Some(false));
        assert_eq!(parse_completed(None), None);
    }

    #[test]
    fn sort_defaults_to_id_ascending() {
        let spec = SortSpec::from_params(None, None);
        assert_eq!(spec.to_document(), doc! { "id": 1 });
        assert_eq!(SortSpec::from_params(Some(""), None).field, SortField::Id);
    }

    #[test]
    fn sort_desc_and_unknown_order_token() {
        let desc = SortSpec::from_params(Some("dueTime"), Some("desc"));
        assert_eq!(desc.to_document(), doc! { "dueTime": -1 });
        let other = SortSpec::from_params(Some("title"), Some("DESC"));
        assert_eq!(other.order, SortOrder::Ascending);
    }

    #[test]
    fn sort_accepts_any_document_key() {
        for key in ["_id", "tags", "categories", "subtasks"] {
            let spec = SortSpec::from_params(Some(key), Some("desc"));
            assert!(!matches!(spec.field, SortField::Other(_)), "{key}");
            assert_eq!(spec.to_document(), doc! { key: -1 });
        }
        let unknown = SortSpec::from_params(Some("nope"), None);
        assert_eq!(unknown.field, SortField::Other("nope".into()));
        assert_eq!(unknown.to_document(), doc! { "nope": 1 });
    }

    fn item(id: i64, tags: &[&str]) -> TodoItem {
        let fields = crate::model::TodoReplacement {
            title: format!("t{id}"),
            description: String::new(),
            completed: false,
            date: String::new(),
            categories: vec![],
            priority: "Low".into(),
            due_time: String::new(),
            tags: tags.iter().map(|t| t.to_string()).collect(),
            assigned_to: String::new(),
            subtasks: vec![],
            progress: 0,
            status: String::new(),
        };
        let input = crate::model::TodoInput { id, fields };
        TodoItem::from_input(ObjectId::new(), input, mongodb::bson::DateTime::from_millis(0))
    }

    #[test]
    fn array_sort_uses_min_ascending_and_max_descending() {
        let a = item(1, &["b", "z"]);
        let b = item(2, &["c", "d"]);
        let asc = SortSpec::from_params(Some("tags"), None);
        assert_eq!(asc.compare(&a, &b), Ordering::Less);
        let desc = SortSpec::from_params(Some("tags"), Some("desc"));
        assert_eq!(desc.compare(&a, &b), Ordering::Less);
        let unknown = SortSpec::from_params(Some("nope"), Some("desc"));
        assert_eq!(unknown.compare(&a, &b), Ordering::Equal);
    }

    #[test]
    fn page_window_skip_and_total_pages() {
        let w = PageWindow::from_params(Some("3"), Some("4")).unwrap();
        assert_eq!(w.skip(), 8);
        assert_eq!(w.total_pages(0), 0);
        assert_eq!(w.total_pages(8), 2);
        assert_eq!(w.total_pages(9), 3);
    }

    #[test]
    fn page_window_defaults() {
        let w = PageWindow::from_params(None, None).unwrap();
        assert_eq!(w, PageWindow { page: 1, limit: 2 });
        assert_eq!(w.skip(), 0);
    }

    #[test]
    fn page_window_rejects_non_positive_and_garbage() {
        for (page, limit) in [("0", "2"), ("1", "0"), ("-1", "2"), ("x", "2"), ("1", "2.5"), ("", "2")] {
            assert!(
                matches!(PageWindow::from_params(Some(page), Some(limit)), Err(AppError::BadRequest(_))),
                "page={page} limit={limit}"
            );
        }
    }

    #[test]
    fn page_window_rejects_skip_beyond_i64() {
        let huge = u64::MAX.to_string();
        assert!(matches!(PageWindow::from_params(Some(&huge), None), Err(AppError::BadRequest(_))));
        let page = (i64::MAX / 2 + 2).to_string();
        assert!(matches!(PageWindow::from_params(Some(&page), Some("2")), Err(AppError::BadRequest(_))));
        let page = (i64::MAX / 2 + 1).to_string();
        let w = PageWindow::from_params(Some(&page), Some("2")).unwrap();
        assert_eq!(w.skip(), (i64::MAX - 1) as u64);
    }

    #[test]
    fn filter_omits_absent_fields() {
        let f = TodoFilter::from_query(FilterQuery {
            title: Some(String::new()),
            category: Some("Work".into()),
            completed: None,
            priority: Some("High".into()),
        });
        assert_eq!(f.to_document(), doc! { "categories": "Work", "priority": "High" });
        assert_eq!(TodoFilter::default().to_document(), Document::new());
    }

    #[test]
    fn filter_for_record() {
        assert_eq!(TodoFilter::for_record(RecordId::ByAppId(5)).unwrap().to_document(), doc! { "id": 5_i64 });
        assert!(TodoFilter::for_record(RecordId::Invalid).is_none());
    }

    fn included_keys(projection: &Document) -> Vec<String> {
        let mut keys: Vec<String> = projection
            .iter()
            .filter(|(_, v)| v.as_i32() == Some(1))
            .map(|(k, _)| k.clone())
            .collect();
        keys.sort();
        keys
    }

    fn shape_keys<T: serde::Serialize>(shape: &T) -> Vec<String> {
        let mut keys: Vec<String> = mongodb::bson::to_document(shape).unwrap().keys().cloned().collect();
        keys.sort();
        keys
    }

    #[test]
    fn projections_match_read_shapes() {
        use crate::model::{FilteredTodo, PageEntry, SortedTodo, TodoSummary};
        let t = item(1, &["x"]);
        assert_eq!(included_keys(&summary_projection()), shape_keys(&TodoSummary::from(&t)));
        assert_eq!(included_keys(&sorted_projection()), shape_keys(&SortedTodo::from(&t)));
        assert_eq!(included_keys(&page_projection()), shape_keys(&PageEntry::from(&t)));
        assert_eq!(included_keys(&filtered_projection()), shape_keys(&FilteredTodo::from(&t)));
        for p in [sorted_projection(), page_projection(), filtered_projection()] {
            assert_eq!(p.get_i32("_id").unwrap(), 0);
        }
    }

    #[test]
    fn category_pipeline_shape() {
        use crate::model::GroupedTodo;
        let pipeline = group_by_category_pipeline();
        assert_eq!(pipeline.len(), 3);
        assert_eq!(pipeline[0], doc! { "$unwind": "$categories" });

        let group = pipeline[1].get_document("$group").unwrap();
        assert_eq!(group.get_str("_id").unwrap(), "$categories");
        assert_eq!(group.get_document("count").unwrap(), &doc! { "$sum": 1 });
        let pushed = group.get_document("todos").unwrap().get_document("$push").unwrap();
        let mut pushed_keys: Vec<String> = pushed.keys().cloned().collect();
        pushed_keys.sort();
        assert_eq!(pushed_keys, shape_keys(&GroupedTodo::from(&item(1, &[]))));
        for (key, value) in pushed {
            assert_eq!(value.as_str().unwrap(), format!("${key}"));
        }

        assert_eq!(pipeline[2], doc! { "$sort": { "_id": 1 } });
    }

    #[test]
    fn delete_body_id() {
        assert_eq!(app_id_from_value(Some(&json!(9))).unwrap(), 9);
        assert_eq!(app_id_from_value(Some(&json!("12"))).unwrap(), 12);
        assert!(app_id_from_value(Some(&json!(0))).is_err());
        assert!(app_id_from_value(Some(&json!("abc"))).is_err());
        assert!(app_id_from_value(Some(&json!(1.5))).is_err());
        assert!(app_id_from_value(None).is_err());
    }

    #[test]
    fn path_app_id() {
        assert_eq!(parse_app_id("17").unwrap(), 17);
        assert!(parse_app_id("17x").is_err());
    }
}
