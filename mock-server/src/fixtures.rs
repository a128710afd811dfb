//! Canned stack content served by the mock delivery API.

use serde_json::{json, Value};

pub const API_KEY: &str = "blt_mock_api_key";
pub const DELIVERY_TOKEN: &str = "cs_mock_delivery_token";
pub const ENVIRONMENT: &str = "production";

/// Everything the mock stack holds. Read-only after construction.
#[derive(Debug, Clone)]
pub struct Store {
    pub content_types: Vec<Value>,
    /// `(content type uid, entry)` pairs.
    pub entries: Vec<(String, Value)>,
    pub assets: Vec<Value>,
    pub global_fields: Vec<Value>,
    pub sync_items: Vec<Value>,
}

impl Store {
    pub fn entries_of<'a>(&'a self, content_type: &'a str) -> impl Iterator<Item = &'a Value> + 'a {
        self.entries
            .iter()
            .filter(move |(ct, _)| ct == content_type)
            .map(|(_, entry)| entry)
    }
}

fn publish(time: &str) -> Value {
    json!({"environment": ENVIRONMENT, "locale": "en-us", "time": time, "user": "blt_user_publisher"})
}

fn entry(uid: &str, title: &str, price: u32, tags: &[&str], terms: &[(&str, &str)]) -> Value {
    let taxonomies: Vec<Value> = terms
        .iter()
        .map(|(taxonomy, term)| json!({"taxonomy_uid": taxonomy, "term_uid": term}))
        .collect();
    json!({
        "uid": uid,
        "title": title,
        "url": format!("/blog/{uid}"),
        "locale": "en-us",
        "_version": 2,
        "price": price,
        "tags": tags,
        "taxonomies": taxonomies,
        "created_at": "2024-03-01T10:00:00.000Z",
        "created_by": "blt_user_author",
        "updated_at": "2024-03-02T10:00:00.000Z",
        "updated_by": "blt_user_editor",
        "publish_details": publish("2024-03-02T10:05:00.000Z"),
    })
}

pub fn store() -> Store {
    let hero = json!({
        "uid": "blt_asset_hero",
        "title": "Hero image",
        "filename": "hero.png",
        "url": "https://images.example.com/v3/assets/hero.png",
        "content_type": "image/png",
        "file_size": "204800",
        "is_dir": false,
        "_version": 1,
        "tags": ["banner"],
        "dimension": {"height": 600, "width": 1200},
        "created_at": "2024-02-01T09:00:00.000Z",
        "publish_details": publish("2024-02-01T09:30:00.000Z"),
    });
    let manual = json!({
        "uid": "blt_asset_manual",
        "title": "Manual",
        "filename": "manual.pdf",
        "url": "https://assets.example.com/v3/assets/manual.pdf",
        "content_type": "application/pdf",
        "file_size": "1048576",
        "is_dir": false,
        "_version": 3,
        "tags": [],
        "created_at": "2024-02-03T09:00:00.000Z",
        "publish_details": publish("2024-02-03T09:30:00.000Z"),
    });

    let mut first = entry(
        "blt_entry_rust",
        "Learning Rust",
        10,
        &["rust", "programming"],
        &[("color", "red"), ("computers", "laptop")],
    );
    first["hero"] = hero.clone();
    first["seo"] = json!({"meta_title": "Rust", "meta_description": "Ownership and borrowing"});
    let second = entry("blt_entry_ffi", "Calling C", 25, &["ffi"], &[("color", "blue")]);
    let third = entry("blt_entry_tokio", "Async IO", 40, &[], &[("color", "yellow"), ("computers", "desktop")]);

    Store {
        content_types: vec![
            json!({
                "uid": "blog_post",
                "title": "Blog Post",
                "description": "Articles for the blog",
                "_version": 5,
                "created_at": "2024-01-01T00:00:00.000Z",
                "updated_at": "2024-01-05T00:00:00.000Z",
                "schema": [
                    {"uid": "title", "data_type": "text", "mandatory": true},
                    {"uid": "price", "data_type": "number"},
                    {"uid": "hero", "data_type": "file"},
                    {"uid": "seo", "data_type": "global_field", "reference_to": "seo"},
                ],
            }),
            json!({
                "uid": "author",
                "title": "Author",
                "_version": 1,
                "schema": [{"uid": "title", "data_type": "text"}],
            }),
        ],
        entries: vec![
            ("blog_post".to_string(), first),
            ("blog_post".to_string(), second),
            ("blog_post".to_string(), third),
            (
                "author".to_string(),
                json!({"uid": "blt_author_ada", "title": "Ada", "locale": "en-us", "tags": []}),
            ),
        ],
        assets: vec![hero.clone(), manual],
        global_fields: vec![json!({
            "uid": "seo",
            "title": "SEO",
            "_version": 2,
            "schema": [
                {"uid": "meta_title", "data_type": "text"},
                {"uid": "meta_description", "data_type": "text"},
            ],
        })],
        sync_items: vec![
            json!({
                "type": "entry_published",
                "content_type_uid": "blog_post",
                "event_at": "2024-03-02T10:05:00.000Z",
                "data": {"uid": "blt_entry_rust", "title": "Learning Rust", "locale": "en-us"},
            }),
            json!({
                "type": "asset_published",
                "event_at": "2024-02-01T09:30:00.000Z",
                "data": hero,
            }),
            json!({
                "type": "entry_deleted",
                "content_type_uid": "blog_post",
                "event_at": "2024-03-03T00:00:00.000Z",
                "data": {"uid": "blt_entry_old", "locale": "en-us"},
            }),
        ],
    }
}
