//! Read compilation scenarios: every request shape that only fetches.

use canopy_plan::{OperationId, Term, TermDocument, Transaction};
use canopy_tests::prelude::*;

fn compile(request: &Request) -> Transaction {
    let registry = blog_registry();
    PlanBuilder::new(&registry).build(request).unwrap()
}

/// Dig the `$in` deferred out of a `{field: {"$in": ...}}` selector.
fn in_clause_display(selector: &TermDocument, field: &str) -> String {
    match selector.get(field) {
        Some(Term::Doc(clause)) => match clause.get("$in") {
            Some(Term::Deferred(dv)) => dv.to_string(),
            other => panic!("expected deferred $in, got {other:?}"),
        },
        other => panic!("expected operator doc for {field}, got {other:?}"),
    }
}

#[test]
fn scalar_only_query_is_one_operation() {
    // GIVEN - { posts { id title } }
    let request = Request::new().field(
        RootField::new("posts")
            .select(Selection::field("id"))
            .select(Selection::field("title")),
    );

    // WHEN
    let txn = compile(&request);

    // THEN - one read, storage names in request order
    assert_eq!(txn.len(), 1);
    let op = &txn.operations()[0];
    assert_eq!(op.kind(), OperationKind::Read);
    assert_eq!(op.collection(), "posts");
    assert!(op.many());
    assert_eq!(op.fields().unwrap().names(), vec!["_id", "title"]);
    assert!(op.selector().is_none());
    assert_eq!(txn.roots()[0].field, "posts");
    assert_eq!(txn.roots()[0].operation, OperationId(0));
}

#[test]
fn repeated_scalar_stays_deduplicated() {
    // GIVEN - { posts { id title id } }
    let request = Request::new().field(
        RootField::new("posts")
            .select(Selection::field("id"))
            .select(Selection::field("title"))
            .select(Selection::field("id")),
    );

    // WHEN
    let txn = compile(&request);

    // THEN
    assert_eq!(txn.operations()[0].fields().unwrap().names(), vec!["_id", "title"]);
}

#[test]
fn local_relation_read_emits_two_operations() {
    // GIVEN - { comments { id post { id } } }
    let request = Request::new().field(
        RootField::new("comments")
            .select(Selection::field("id"))
            .select(Selection::field("post").select(Selection::field("id"))),
    );

    // WHEN
    let txn = compile(&request);

    // THEN - parent projects the FK, not the relation
    assert_eq!(txn.len(), 2);
    let parent = &txn.operations()[0];
    assert_eq!(parent.collection(), "comments");
    assert_eq!(parent.fields().unwrap().names(), vec!["_id", "postId"]);
    assert_eq!(
        parent.output().to_string(),
        "Operation-0 -> distinctReplace('post', 'postId', '_id', Operation-1)"
    );

    // AND the child reads the target collection by distinct FK values,
    // always with storage cardinality many
    let child = &txn.operations()[1];
    assert_eq!(child.collection(), "posts");
    assert!(child.many());
    assert_eq!(child.fields().unwrap().names(), vec!["_id"]);
    assert_eq!(
        in_clause_display(child.selector().unwrap(), "_id"),
        "Operation-0 -> distinct('postId')"
    );
    assert!(txn.is_well_ordered());
}

#[test]
fn ext_relation_read_wires_a_lookup() {
    // GIVEN - { posts { comments { message } } }, the literal scenario
    let request = Request::new().field(
        RootField::new("posts")
            .select(Selection::field("comments").select(Selection::field("message"))),
    );

    // WHEN
    let txn = compile(&request);

    // THEN - exactly two operations
    assert_eq!(txn.len(), 2);
    let posts = &txn.operations()[0];
    assert_eq!(posts.fields().unwrap().names(), vec!["_id"]);
    assert_eq!(
        posts.output().to_string(),
        "Operation-0 -> lookup('comments', '_id', 'postId', Operation-1)"
    );

    let comments = &txn.operations()[1];
    assert_eq!(comments.collection(), "comments");
    assert_eq!(comments.fields().unwrap().names(), vec!["message"]);
    assert_eq!(
        in_clause_display(comments.selector().unwrap(), "postId"),
        "Operation-0 -> distinct('_id')"
    );
}

#[test]
fn where_relation_dependency_precedes_the_root_read() {
    // GIVEN - { comments(where: { post: { title: "search-title" } }) { id message } }
    let request = Request::new().field(
        RootField::new("comments")
            .filter(Filter::new().nested("post", Filter::new().eq("title", "search-title")))
            .select(Selection::field("id"))
            .select(Selection::field("message")),
    );

    // WHEN
    let txn = compile(&request);

    // THEN - the dependency read on posts comes first
    assert_eq!(txn.len(), 2);
    let dep = &txn.operations()[0];
    assert_eq!(dep.collection(), "posts");
    assert_eq!(
        dep.selector().unwrap().get("title"),
        Some(&Term::Value(Value::String("search-title".into())))
    );

    // AND the root selector rewrites the relation path to an $in over
    // the dependency's ids
    let root = &txn.operations()[1];
    assert_eq!(root.collection(), "comments");
    assert_eq!(root.fields().unwrap().names(), vec!["_id", "message"]);
    assert_eq!(
        in_clause_display(root.selector().unwrap(), "postId"),
        "Operation-0 -> distinct('_id')"
    );
    assert_eq!(txn.roots()[0].operation, OperationId(1));
    assert!(txn.is_well_ordered());
}

#[test]
fn combined_filter_mixes_literals_and_relation_predicates() {
    // GIVEN - { comments(where: { message: "one", post: { title: "first" } }) { id } }
    let request = Request::new().field(
        RootField::new("comments")
            .filter(
                Filter::new()
                    .eq("message", "one")
                    .nested("post", Filter::new().eq("title", "first")),
            )
            .select(Selection::field("id")),
    );

    // WHEN
    let txn = compile(&request);

    // THEN - one dependency read; the root selector holds both predicates
    assert_eq!(txn.len(), 2);
    let root = &txn.operations()[1];
    let selector = root.selector().unwrap();
    assert_eq!(
        selector.get("message"),
        Some(&Term::Value(Value::String("one".into())))
    );
    assert_eq!(
        in_clause_display(selector, "postId"),
        "Operation-0 -> distinct('_id')"
    );
    assert!(txn.is_well_ordered());
}

#[test]
fn embedded_filter_lowers_to_dotted_selector_keys() {
    // GIVEN - { posts(where: { meta: { slug: "first-post" } }) { id } }
    let request = Request::new().field(
        RootField::new("posts")
            .filter(Filter::new().nested("meta", Filter::new().eq("slug", "first-post")))
            .select(Selection::field("id")),
    );

    // WHEN
    let txn = compile(&request);

    // THEN - no extra operation; the condition becomes a dotted key
    assert_eq!(txn.len(), 1);
    assert_eq!(
        txn.operations()[0].selector().unwrap().get("meta.slug"),
        Some(&Term::Value(Value::String("first-post".into())))
    );
}

#[test]
fn embedded_selection_flattens_to_dotted_storage_paths() {
    // GIVEN - { posts { title meta { views } } }
    let request = Request::new().field(
        RootField::new("posts")
            .select(Selection::field("title"))
            .select(Selection::field("meta").select(Selection::field("views"))),
    );

    // WHEN
    let txn = compile(&request);

    // THEN - no extra operation, dotted projection
    assert_eq!(txn.len(), 1);
    assert_eq!(
        txn.operations()[0].fields().unwrap().names(),
        vec!["title", "meta.views"]
    );
}

#[test]
fn multiple_roots_bind_in_request_order() {
    // GIVEN - { posts { id } users { username } }
    let request = Request::new()
        .field(RootField::new("posts").select(Selection::field("id")))
        .field(RootField::new("users").select(Selection::field("username")));

    // WHEN
    let txn = compile(&request);

    // THEN
    assert_eq!(txn.len(), 2);
    assert_eq!(txn.roots().len(), 2);
    assert_eq!(txn.roots()[0].field, "posts");
    assert_eq!(txn.roots()[1].field, "users");
}

#[test]
fn compilation_is_idempotent() {
    // GIVEN - a request mixing relations and filters
    let request = Request::new().field(
        RootField::new("comments")
            .filter(Filter::new().nested("post", Filter::new().eq("title", "x")))
            .select(Selection::field("id"))
            .select(Selection::field("post").select(Selection::field("title"))),
    );
    let registry = blog_registry();
    let builder = PlanBuilder::new(&registry);

    // WHEN
    let first = builder.build(&request).unwrap();
    let second = builder.build(&request).unwrap();

    // THEN - structurally identical graphs, identifiers from 0
    assert_eq!(first, second);
    assert!(first.is_well_ordered());
}

#[test]
fn single_record_read_has_cardinality_one() {
    // GIVEN - { post(where: { id: "p1" }) { title } }
    let request = Request::new().field(
        RootField::new("post")
            .filter(Filter::new().eq("id", "p1"))
            .select(Selection::field("title")),
    );

    // WHEN
    let txn = compile(&request);

    // THEN
    let op = &txn.operations()[0];
    assert!(!op.many());
    assert_eq!(
        op.selector().unwrap().get("_id"),
        Some(&Term::Value(Value::String("p1".into())))
    );
}
