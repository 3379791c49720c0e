//! Round trip against a live MongoDB. Needs `MONGODB_URI`; run with `cargo test -- --ignored`.

use mongodb::bson::Document;
use todo_backend::model::{Subtask, TodoInput, TodoPatch, TodoReplacement};
use todo_backend::{MongoStore, Settings, TodoStore};

fn input(id: i64, title: &str, categories: &[&str]) -> TodoInput {
    TodoInput {
        id,
        fields: TodoReplacement {
            title: title.into(),
            description: format!("{title} description"),
            completed: false,
            date: "2024-12-01".into(),
            categories: categories.iter().map(|c| c.to_string()).collect(),
            priority: "High".into(),
            due_time: "17:00".into(),
            tags: vec!["live".into()],
            assigned_to: "John Doe".into(),
            subtasks: vec![Subtask { title: "Write code".into(), completed: false }],
            progress: 0,
            status: "Open".into(),
        },
    }
}

#[tokio::test]
#[ignore = "needs a running MongoDB at MONGODB_URI"]
async fn create_patch_group_round_trip() {
    let Ok(uri) = std::env::var("MONGODB_URI") else {
        panic!("MONGODB_URI must be set for this test");
    };
    let collection = format!("todoitems_test_{}", std::process::id());
    let settings = Settings::from_lookup(|key| match key {
        "MONGODB_URI" => Some(uri.clone()),
        "TODO_COLLECTION" => Some(collection.clone()),
        _ => None,
    })
    .unwrap();

    let store = MongoStore::connect(&settings).await.unwrap();
    store.ping().await.unwrap();
    store.ensure_indexes().await.unwrap();

    let created = store.create(input(1, "first", &["Work", "Urgent"])).await.unwrap();
    assert_eq!(created.id, 1);
    assert_eq!(created.created_at, created.updated_at);
    store.create(input(2, "second", &["Work"])).await.unwrap();
    assert!(store.create(input(1, "dup", &[])).await.is_err(), "unique index on id");

    let patched = store
        .patch(1, TodoPatch { completed: Some(true), ..Default::default() })
        .await
        .unwrap()
        .unwrap();
    assert!(patched.completed);
    assert_eq!(patched.title, "first");
    assert_eq!(patched.store_id, created.store_id);
    assert_eq!(patched.created_at.timestamp_millis(), created.created_at.timestamp_millis());

    let groups = store.group_by_category().await.unwrap();
    let summary: Vec<(&str, u64)> = groups.iter().map(|g| (g.category.as_str(), g.count)).collect();
    assert_eq!(summary, vec![("Urgent", 1), ("Work", 2)]);
    assert!(groups[0].todos[0].completed);

    let client = mongodb::Client::with_uri_str(&uri).await.unwrap();
    client
        .database(store.database_name())
        .collection::<Document>(&collection)
        .drop()
        .await
        .unwrap();
}
