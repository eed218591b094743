//! Mutation compilation scenarios: creates, updates, deletes, nested
//! inputs, and the dependency-before-consumer emission convention.

use canopy_plan::{OperationId, PlanError, Term, Transaction};
use canopy_tests::prelude::*;

fn compile(request: &Request) -> Transaction {
    let registry = blog_registry();
    PlanBuilder::new(&registry).build(request).unwrap()
}

fn deferred_display(data: &canopy_plan::TermDocument, field: &str) -> String {
    match data.get(field) {
        Some(Term::Deferred(dv)) => dv.to_string(),
        other => panic!("expected deferred for {field}, got {other:?}"),
    }
}

#[test]
fn create_with_scalars_is_one_operation() {
    // GIVEN - createPost(data: { title: "test-title" }) { id title }
    let request = Request::new().field(
        RootField::new("createPost")
            .data(InputObject::new().value("title", "test-title"))
            .select(Selection::field("id"))
            .select(Selection::field("title")),
    );

    // WHEN
    let txn = compile(&request);

    // THEN - single create, selection projected like a read
    assert_eq!(txn.len(), 1);
    let op = &txn.operations()[0];
    assert_eq!(op.kind(), OperationKind::Create);
    assert!(!op.many());
    assert_eq!(op.fields().unwrap().names(), vec!["_id", "title"]);
    let data = op.data().unwrap();
    assert_eq!(
        data.get("title"),
        Some(&Term::Value(Value::String("test-title".into())))
    );
    // AND the schema default filled the omitted required field
    assert_eq!(
        data.get("published"),
        Some(&Term::Value(Value::Bool(false)))
    );
}

#[test]
fn create_with_embedded_inputs_stays_inline() {
    // GIVEN - nested single and list embedded creates
    let request = Request::new().field(
        RootField::new("createPost")
            .data(
                InputObject::new()
                    .value("title", "test-title")
                    .create("meta", InputObject::new().value("views", 0i64).value("slug", "t"))
                    .create_many(
                        "notes",
                        vec![
                            InputObject::new().value("text", "note-1"),
                            InputObject::new().value("text", "note-2"),
                        ],
                    ),
            )
            .select(Selection::field("id")),
    );

    // WHEN
    let txn = compile(&request);

    // THEN - still one operation; embedded data nests in place
    assert_eq!(txn.len(), 1);
    let data = txn.operations()[0].data().unwrap();
    match data.get("meta") {
        Some(Term::Doc(meta)) => {
            assert_eq!(meta.get("views"), Some(&Term::Value(Value::Int(0))));
            assert_eq!(meta.get("slug"), Some(&Term::Value(Value::String("t".into()))));
        }
        other => panic!("expected embedded doc, got {other:?}"),
    }
    match data.get("notes") {
        Some(Term::List(notes)) => assert_eq!(notes.len(), 2),
        other => panic!("expected embedded list, got {other:?}"),
    }
}

#[test]
fn connect_lookups_precede_the_create() {
    // GIVEN - createComment with a singular and a list connect
    let request = Request::new().field(
        RootField::new("createComment")
            .data(
                InputObject::new()
                    .value("message", "comment-1")
                    .connect("post", "post-id")
                    .connect_many("likes", vec!["user-1".into(), "user-2".into()]),
            )
            .select(Selection::field("id"))
            .select(Selection::field("message")),
    );

    // WHEN
    let txn = compile(&request);

    // THEN - both reads are emitted before the create, which is the root
    assert_eq!(txn.len(), 3);
    let posts = &txn.operations()[0];
    assert_eq!(posts.collection(), "posts");
    assert_eq!(posts.kind(), OperationKind::Read);
    assert!(!posts.many());
    assert_eq!(
        posts.selector().unwrap().get("_id"),
        Some(&Term::Value(Value::String("post-id".into())))
    );

    let users = &txn.operations()[1];
    assert_eq!(users.collection(), "users");
    assert!(users.many());
    match users.selector().unwrap().get("$or") {
        Some(Term::List(branches)) => assert_eq!(branches.len(), 2),
        other => panic!("expected $or branches, got {other:?}"),
    }

    let create = &txn.operations()[2];
    assert_eq!(create.kind(), OperationKind::Create);
    let data = create.data().unwrap();
    assert_eq!(deferred_display(data, "postId"), "Operation-0 -> path('_id')");
    assert_eq!(
        deferred_display(data, "userIds"),
        "Operation-1 -> distinct('_id')"
    );
    assert_eq!(create.fields().unwrap().names(), vec!["_id", "message"]);

    assert_eq!(txn.roots()[0].field, "createComment");
    assert_eq!(txn.roots()[0].operation, OperationId(2));
    assert!(txn.is_well_ordered());
}

#[test]
fn nested_create_on_a_relation_creates_then_links() {
    // GIVEN - createComment(data: { message, post: { create: { title } } })
    let request = Request::new().field(
        RootField::new("createComment")
            .data(
                InputObject::new()
                    .value("message", "m")
                    .create("post", InputObject::new().value("title", "nested-post")),
            )
            .select(Selection::field("id")),
    );

    // WHEN
    let txn = compile(&request);

    // THEN - the sibling create runs first, the parent links by its id
    assert_eq!(txn.len(), 2);
    let sibling = &txn.operations()[0];
    assert_eq!(sibling.collection(), "posts");
    assert_eq!(sibling.kind(), OperationKind::Create);
    assert_eq!(
        sibling.data().unwrap().get("title"),
        Some(&Term::Value(Value::String("nested-post".into())))
    );

    let parent = &txn.operations()[1];
    assert_eq!(parent.collection(), "comments");
    assert_eq!(
        deferred_display(parent.data().unwrap(), "postId"),
        "Operation-0 -> path('_id')"
    );
    assert!(txn.is_well_ordered());
}

#[test]
fn update_lowers_where_and_data_without_defaults() {
    // GIVEN - updatePost(where: { id: "p1" }, data: { title: "renamed" })
    let request = Request::new().field(
        RootField::new("updatePost")
            .filter(Filter::new().eq("id", "p1"))
            .data(InputObject::new().value("title", "renamed"))
            .select(Selection::field("id"))
            .select(Selection::field("title")),
    );

    // WHEN
    let txn = compile(&request);

    // THEN
    assert_eq!(txn.len(), 1);
    let op = &txn.operations()[0];
    assert_eq!(op.kind(), OperationKind::Update);
    assert!(!op.many());
    assert_eq!(
        op.selector().unwrap().get("_id"),
        Some(&Term::Value(Value::String("p1".into())))
    );
    let data = op.data().unwrap();
    assert_eq!(
        data.get("title"),
        Some(&Term::Value(Value::String("renamed".into())))
    );
    // Updates are partial: no default injection
    assert!(data.get("published").is_none());
}

#[test]
fn delete_projects_the_predelete_selection() {
    // GIVEN - deletePost(where: { id: "p2" }) { id title }
    let request = Request::new().field(
        RootField::new("deletePost")
            .filter(Filter::new().eq("id", "p2"))
            .select(Selection::field("id"))
            .select(Selection::field("title")),
    );

    // WHEN
    let txn = compile(&request);

    // THEN
    let op = &txn.operations()[0];
    assert_eq!(op.kind(), OperationKind::Delete);
    assert!(!op.many());
    assert_eq!(op.fields().unwrap().names(), vec!["_id", "title"]);
    assert!(op.data().is_none());
}

#[test]
fn missing_required_input_without_default_fails() {
    // GIVEN - createComment with no message
    let registry = blog_registry();
    let request = Request::new().field(
        RootField::new("createComment")
            .data(InputObject::new().connect("post", "p1"))
            .select(Selection::field("id")),
    );

    // WHEN
    let result = PlanBuilder::new(&registry).build(&request);

    // THEN
    assert!(matches!(
        result.unwrap_err(),
        PlanError::RequiredDefaultMissing { model, field }
            if model == "Comment" && field == "message"
    ));
}

#[test]
fn connect_on_an_ext_relation_is_a_schema_mismatch() {
    // GIVEN - comments is a reverse relation: nothing local to write
    let registry = blog_registry();
    let request = Request::new().field(
        RootField::new("createPost").data(
            InputObject::new()
                .value("title", "t")
                .connect("comments", "c1"),
        ),
    );

    // WHEN
    let result = PlanBuilder::new(&registry).build(&request);

    // THEN
    assert!(matches!(
        result.unwrap_err(),
        PlanError::SchemaMismatch { .. }
    ));
}
