//! Schema and store fixtures shared by scenario tests.

use canopy_core::{doc, Value};
use canopy_registry::{FieldDef, Registry, RegistryBuilder};
use canopy_store::MemoryStore;

/// A small blog schema exercising every field kind: scalars with storage
/// overrides and defaults, embedded types (single and list), a local
/// relation, a list-valued local relation, and a reverse relation.
pub fn blog_registry() -> Registry {
    let mut builder = RegistryBuilder::new();
    builder
        .add_model("Post", "posts")
        .field(FieldDef::scalar("id").stored_as("_id"))
        .field(FieldDef::scalar("title"))
        .field(
            FieldDef::scalar("published")
                .required()
                .with_default(Value::Bool(false)),
        )
        .field(FieldDef::embedded("meta", "Meta"))
        .field(FieldDef::embedded("notes", "Note").many())
        .field(FieldDef::ext_relation("comments", "Comment", "postId").many())
        .done()
        .unwrap();
    builder
        .add_embedded("Meta")
        .field(FieldDef::scalar("views"))
        .field(FieldDef::scalar("slug"))
        .done()
        .unwrap();
    builder
        .add_embedded("Note")
        .field(FieldDef::scalar("text"))
        .done()
        .unwrap();
    builder
        .add_model("Comment", "comments")
        .field(FieldDef::scalar("id").stored_as("_id"))
        .field(FieldDef::scalar("message").required())
        .field(FieldDef::relation("post", "Post"))
        .field(FieldDef::relation("likes", "User").stored_as("userIds").many())
        .done()
        .unwrap();
    builder
        .add_model("User", "users")
        .field(FieldDef::scalar("id").stored_as("_id"))
        .field(FieldDef::scalar("username"))
        .done()
        .unwrap();
    builder.build().unwrap()
}

/// A store seeded with two posts, three comments, and two users. All
/// seeds carry explicit ids, so the first allocated id is `id-1`.
pub fn seeded_store() -> MemoryStore {
    let mut store = MemoryStore::new();
    store.seed(
        "posts",
        doc! {
            "_id" => "p1",
            "title" => "first",
            "published" => true,
            "meta" => doc! { "views" => 10i64, "slug" => "first-post" },
        },
    );
    store.seed(
        "posts",
        doc! {
            "_id" => "p2",
            "title" => "second",
            "published" => false,
            "meta" => doc! { "views" => 5i64, "slug" => "second-post" },
        },
    );
    store.seed(
        "comments",
        doc! {
            "_id" => "c1",
            "postId" => "p1",
            "message" => "one",
            "userIds" => vec!["u1", "u2"],
        },
    );
    store.seed(
        "comments",
        doc! {
            "_id" => "c2",
            "postId" => "p1",
            "message" => "two",
            "userIds" => Value::List(vec![]),
        },
    );
    store.seed(
        "comments",
        doc! {
            "_id" => "c3",
            "postId" => "p2",
            "message" => "three",
            "userIds" => vec!["u2"],
        },
    );
    store.seed("users", doc! { "_id" => "u1", "username" => "alice" });
    store.seed("users", doc! { "_id" => "u2", "username" => "bo" });
    store
}
