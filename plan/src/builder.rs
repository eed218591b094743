//! The operation graph builder.
//!
//! Walks a request tree against the registry, one root field at a time,
//! and emits operations in depth-first pre-order. Dependency operations
//! (where-relation reads, connect lookups, nested creates) are always
//! emitted before the operation that consumes their output, so every
//! selector/data deferred reference points strictly backward and
//! execution order is simply index order.

use crate::{
    ContextStack, DeferredValue, Frame, OperationId, OperationKind, PlanError, PlanResult, Term,
    TermDocument, Transaction, Transform,
};
use canopy_registry::{FieldDef, FieldKind, Registry, RootKind};
use canopy_request::{Filter, FilterValue, InputObject, InputValue, Request, RootField, Selection};
use tracing::debug;

/// Compiles requests into transactions against a fixed registry.
pub struct PlanBuilder<'r> {
    registry: &'r Registry,
}

impl<'r> PlanBuilder<'r> {
    /// Create a builder over a registry.
    pub fn new(registry: &'r Registry) -> Self {
        Self { registry }
    }

    /// Compile a request into a transaction.
    pub fn build(&self, request: &Request) -> PlanResult<Transaction> {
        let mut txn = Transaction::new();
        let mut ctx = ContextStack::new();

        for root in &request.fields {
            self.build_root(root, &mut txn, &mut ctx)?;
        }

        Ok(txn)
    }

    // ==================== Root Fields ====================

    fn build_root(
        &self,
        root: &RootField,
        txn: &mut Transaction,
        ctx: &mut ContextStack,
    ) -> PlanResult<()> {
        let def = self.registry.resolve_root(&root.name)?;
        let model = def.model.clone();
        let kind = def.kind;
        let collection = self.registry.collection_of(&model)?.to_string();
        let pk = self.registry.primary_key_of(&model)?.to_string();

        // Dependencies of the root operation come first: the selector
        // (which may spawn where-relation reads) and, for mutations, the
        // data payload (which may spawn connect reads and nested
        // creates).
        let selector = match &root.filter {
            Some(filter) => Some(self.build_filter(&model, filter, txn)?),
            None => None,
        };
        let data = match kind {
            RootKind::Create => Some(self.build_data(&model, root.data.as_ref(), txn, true)?),
            RootKind::Update => Some(self.build_data(&model, root.data.as_ref(), txn, false)?),
            _ => None,
        };

        let op_kind = match kind {
            RootKind::ReadMany | RootKind::ReadOne => OperationKind::Read,
            RootKind::Create => OperationKind::Create,
            RootKind::Update => OperationKind::Update,
            RootKind::Delete => OperationKind::Delete,
        };
        let op_id = self.push_operation(txn, &collection, op_kind, kind.many());

        if let Some(selector) = selector.filter(|s| !s.is_empty()) {
            txn[op_id].set_selector(selector);
        }
        if let Some(data) = data {
            txn[op_id].set_data(data);
        }

        ctx.push(Frame::root(model, op_id, pk));
        self.build_selection(&root.selection, txn, ctx)?;
        ctx.pop();

        txn.bind_root(&root.name, op_id);
        Ok(())
    }

    // ==================== Selection Sets ====================

    fn build_selection(
        &self,
        selection: &[Selection],
        txn: &mut Transaction,
        ctx: &mut ContextStack,
    ) -> PlanResult<()> {
        for sel in selection {
            let frame = match ctx.current() {
                Some(frame) => frame.clone(),
                None => return Ok(()),
            };
            let field = self.registry.resolve_field(&frame.model, &sel.name)?.clone();

            match &field.kind {
                FieldKind::Scalar => {
                    let storage = frame.storage_path(&field.storage_name);
                    txn[frame.operation].fields_mut().add(storage);
                }
                FieldKind::Embedded { target } => {
                    ctx.push(frame.embedded(target, &field.storage_name));
                    self.build_selection(&sel.selection, txn, ctx)?;
                    ctx.pop();
                }
                FieldKind::Relation { target } => {
                    self.build_local_relation(&frame, &field, target, sel, txn, ctx)?;
                }
                FieldKind::ExtRelation {
                    target,
                    foreign_key,
                } => {
                    self.build_ext_relation(&frame, target, foreign_key, sel, txn, ctx)?;
                }
            }
        }
        Ok(())
    }

    /// Local relation read: project the FK instead of descending, fetch
    /// the target documents in one batched read, and splice them back in
    /// place of the raw FK values.
    fn build_local_relation(
        &self,
        frame: &Frame,
        field: &FieldDef,
        target: &str,
        sel: &Selection,
        txn: &mut Transaction,
        ctx: &mut ContextStack,
    ) -> PlanResult<()> {
        let fk_path = frame.storage_path(&field.storage_name);
        txn[frame.operation].fields_mut().add(fk_path.clone());

        let target_collection = self.registry.collection_of(target)?.to_string();
        let target_pk = self.registry.primary_key_of(target)?.to_string();

        // Storage cardinality is always many, even for a to-one
        // relation: one batched read serves every parent row.
        let child = self.push_operation(txn, &target_collection, OperationKind::Read, true);

        let mut selector = TermDocument::new();
        selector.insert(
            target_pk.clone(),
            in_clause(DeferredValue::distinct(frame.operation, fk_path.clone())),
        );
        txn[child].set_selector(selector);

        ctx.push(Frame::root(target, child, target_pk.clone()));
        self.build_selection(&sel.selection, txn, ctx)?;
        ctx.pop();

        // Reference the child's finished output chain so nested joins
        // evaluate with it.
        let child_output = txn[child].output().clone();
        txn[frame.operation].wrap_output(Transform::DistinctReplace {
            field: frame.storage_path(&sel.name),
            local_key: fk_path,
            foreign_key: target_pk,
            child: child_output,
        });
        Ok(())
    }

    /// Reverse relation read: no local key, so the child read selects by
    /// its FK over the parents' unique keys and a group-join attaches
    /// the matches per parent row.
    fn build_ext_relation(
        &self,
        frame: &Frame,
        target: &str,
        foreign_key: &str,
        sel: &Selection,
        txn: &mut Transaction,
        ctx: &mut ContextStack,
    ) -> PlanResult<()> {
        // The join key must be fetched even if the caller did not ask
        // for it.
        txn[frame.operation].fields_mut().add(frame.root_pk.clone());

        let target_collection = self.registry.collection_of(target)?.to_string();
        let target_pk = self.registry.primary_key_of(target)?.to_string();

        let child = self.push_operation(txn, &target_collection, OperationKind::Read, true);

        let mut selector = TermDocument::new();
        selector.insert(
            foreign_key.to_string(),
            in_clause(DeferredValue::distinct(frame.operation, frame.root_pk.clone())),
        );
        txn[child].set_selector(selector);

        ctx.push(Frame::root(target, child, target_pk));
        self.build_selection(&sel.selection, txn, ctx)?;
        ctx.pop();

        let child_output = txn[child].output().clone();
        txn[frame.operation].wrap_output(Transform::Lookup {
            field: frame.storage_path(&sel.name),
            local_key: frame.root_pk.clone(),
            foreign_key: foreign_key.to_string(),
            child: child_output,
        });
        Ok(())
    }

    // ==================== Filters ====================

    /// Lower a filter into a selector document, emitting dependency
    /// reads for relation predicates first so the enclosing selector
    /// only ever references earlier operations.
    fn build_filter(
        &self,
        model: &str,
        filter: &Filter,
        txn: &mut Transaction,
    ) -> PlanResult<TermDocument> {
        let mut selector = TermDocument::new();

        for (name, predicate) in &filter.predicates {
            let field = self.registry.resolve_field(model, name)?.clone();

            match (&field.kind, predicate) {
                (FieldKind::Scalar, FilterValue::Value(value)) => {
                    selector.insert(field.storage_name.clone(), Term::Value(value.clone()));
                }
                (FieldKind::Embedded { target }, FilterValue::Nested(nested)) => {
                    // Embedded conditions lower to dotted selector keys.
                    let inner = self.build_filter(target, nested, txn)?;
                    for (key, term) in inner {
                        selector.insert(format!("{}.{}", field.storage_name, key), term);
                    }
                }
                (FieldKind::Relation { target }, FilterValue::Nested(nested)) => {
                    let target_pk = self.registry.primary_key_of(target)?.to_string();
                    let dep = self.push_filter_read(target, nested, txn)?;
                    selector.insert(
                        field.storage_name.clone(),
                        in_clause(DeferredValue::distinct(dep, target_pk)),
                    );
                }
                (
                    FieldKind::ExtRelation {
                        target,
                        foreign_key,
                    },
                    FilterValue::Nested(nested),
                ) => {
                    let model_pk = self.registry.primary_key_of(model)?.to_string();
                    let foreign_key = foreign_key.clone();
                    let dep = self.push_filter_read(target, nested, txn)?;
                    selector.insert(
                        model_pk,
                        in_clause(DeferredValue::distinct(dep, foreign_key)),
                    );
                }
                _ => {
                    return Err(PlanError::schema_mismatch(format!(
                        "predicate on field {} of model {} does not match its kind",
                        name, model
                    )));
                }
            }
        }

        Ok(selector)
    }

    /// Emit a dependency read for a relation predicate.
    fn push_filter_read(
        &self,
        target: &str,
        nested: &Filter,
        txn: &mut Transaction,
    ) -> PlanResult<OperationId> {
        let collection = self.registry.collection_of(target)?.to_string();
        let selector = self.build_filter(target, nested, txn)?;
        let dep = self.push_operation(txn, &collection, OperationKind::Read, true);
        if !selector.is_empty() {
            txn[dep].set_selector(selector);
        }
        Ok(dep)
    }

    // ==================== Mutation Inputs ====================

    /// Lower a mutation input object into a data document. Connect
    /// lookups and nested creates are emitted before the consumer, so
    /// the data document only references earlier operations. When
    /// `apply_defaults` is set (create), required fields absent from the
    /// input take their schema default or fail.
    fn build_data(
        &self,
        model: &str,
        input: Option<&InputObject>,
        txn: &mut Transaction,
        apply_defaults: bool,
    ) -> PlanResult<TermDocument> {
        let empty = InputObject::new();
        let input = input.unwrap_or(&empty);
        let mut data = TermDocument::new();

        for (name, value) in &input.fields {
            let field = self.registry.resolve_field(model, name)?.clone();
            let term = self.build_input_value(&field, value, txn)?;
            data.insert(field.storage_name.clone(), term);
        }

        if apply_defaults {
            for field in self.registry.fields_of(model)? {
                if matches!(field.kind, FieldKind::ExtRelation { .. }) {
                    continue;
                }
                if data.contains_key(&field.storage_name) {
                    continue;
                }
                if let Some(default) = &field.default {
                    data.insert(field.storage_name.clone(), Term::Value(default.clone()));
                } else if field.required {
                    return Err(PlanError::required_default_missing(model, &field.name));
                }
            }
        }

        Ok(data)
    }

    fn build_input_value(
        &self,
        field: &FieldDef,
        value: &InputValue,
        txn: &mut Transaction,
    ) -> PlanResult<Term> {
        match (&field.kind, value) {
            (FieldKind::Scalar, InputValue::Value(v)) => Ok(Term::Value(v.clone())),
            (FieldKind::Scalar, InputValue::List(items)) => {
                let mut terms = Vec::with_capacity(items.len());
                for item in items {
                    match item {
                        InputValue::Value(v) => terms.push(Term::Value(v.clone())),
                        _ => {
                            return Err(PlanError::schema_mismatch(format!(
                                "scalar list field {} holds a non-literal element",
                                field.name
                            )))
                        }
                    }
                }
                Ok(Term::List(terms))
            }

            // Embedded inputs recurse inline; `create` wrappers and bare
            // objects are equivalent here.
            (FieldKind::Embedded { target }, InputValue::Object(obj)) => {
                Ok(Term::Doc(self.build_data(target, Some(obj), txn, true)?))
            }
            (FieldKind::Embedded { target }, InputValue::Create(obj)) => {
                Ok(Term::Doc(self.build_data(target, Some(&**obj), txn, true)?))
            }
            (FieldKind::Embedded { target }, InputValue::CreateMany(objs)) => {
                let mut terms = Vec::with_capacity(objs.len());
                for obj in objs {
                    terms.push(Term::Doc(self.build_data(target, Some(obj), txn, true)?));
                }
                Ok(Term::List(terms))
            }

            // connect: read the referenced document(s) first, then link
            // by unique key.
            (FieldKind::Relation { target }, InputValue::Connect(id)) => {
                let collection = self.registry.collection_of(target)?.to_string();
                let pk = self.registry.primary_key_of(target)?.to_string();
                let dep = self.push_operation(txn, &collection, OperationKind::Read, false);
                let mut selector = TermDocument::new();
                selector.insert(pk.clone(), Term::Value(id.clone()));
                txn[dep].set_selector(selector);
                Ok(Term::Deferred(DeferredValue::path(dep, pk)))
            }
            (FieldKind::Relation { target }, InputValue::ConnectMany(ids)) => {
                let collection = self.registry.collection_of(target)?.to_string();
                let pk = self.registry.primary_key_of(target)?.to_string();
                let dep = self.push_operation(txn, &collection, OperationKind::Read, true);
                let branches = ids
                    .iter()
                    .map(|id| {
                        let mut branch = TermDocument::new();
                        branch.insert(pk.clone(), Term::Value(id.clone()));
                        Term::Doc(branch)
                    })
                    .collect();
                let mut selector = TermDocument::new();
                selector.insert("$or".to_string(), Term::List(branches));
                txn[dep].set_selector(selector);
                Ok(Term::Deferred(DeferredValue::distinct(dep, pk)))
            }

            // Nested create on a true relation: create-then-link. The
            // sibling create runs before the parent and the parent's FK
            // takes its new unique key.
            (FieldKind::Relation { target }, InputValue::Create(obj)) => {
                Ok(Term::Deferred(self.push_nested_create(target, obj, txn)?))
            }
            (FieldKind::Relation { target }, InputValue::CreateMany(objs)) => {
                let mut terms = Vec::with_capacity(objs.len());
                for obj in objs {
                    terms.push(Term::Deferred(self.push_nested_create(target, obj, txn)?));
                }
                Ok(Term::List(terms))
            }

            _ => Err(PlanError::schema_mismatch(format!(
                "input for field {} does not match its kind",
                field.name
            ))),
        }
    }

    fn push_nested_create(
        &self,
        target: &str,
        input: &InputObject,
        txn: &mut Transaction,
    ) -> PlanResult<DeferredValue> {
        let collection = self.registry.collection_of(target)?.to_string();
        let pk = self.registry.primary_key_of(target)?.to_string();
        let data = self.build_data(target, Some(input), txn, true)?;
        let sibling = self.push_operation(txn, &collection, OperationKind::Create, false);
        txn[sibling].set_data(data);
        Ok(DeferredValue::path(sibling, pk))
    }

    fn push_operation(
        &self,
        txn: &mut Transaction,
        collection: &str,
        kind: OperationKind,
        many: bool,
    ) -> OperationId {
        let id = txn.push(collection, kind, many);
        debug!(operation = %id, collection, kind = %kind, many, "allocated operation");
        id
    }
}

/// Build a `{"$in": <deferred>}` operator document.
fn in_clause(deferred: DeferredValue) -> Term {
    let mut clause = TermDocument::new();
    clause.insert("$in".to_string(), Term::Deferred(deferred));
    Term::Doc(clause)
}
