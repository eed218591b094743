//! RegistryBuilder for constructing an immutable Registry.

use crate::{FieldDef, FieldKind, ModelDef, Registry, RootDef, RootKind};
use indexmap::IndexMap;
use std::collections::HashMap;
use thiserror::Error;

/// Errors that can occur during registry construction.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("Duplicate model name: {0}")]
    DuplicateModelName(String),

    #[error("Duplicate field {field} on model {model}")]
    DuplicateField { model: String, field: String },

    #[error("Duplicate root operation name: {0}")]
    DuplicateRootName(String),

    #[error("Unknown target model {target} for field {field} on model {model}")]
    UnknownTarget {
        model: String,
        field: String,
        target: String,
    },

    #[error("Relation field {field} on model {model} targets embedded type {target}")]
    RelationToEmbedded {
        model: String,
        field: String,
        target: String,
    },
}

/// Builder for constructing an immutable Registry.
#[derive(Debug, Default)]
pub struct RegistryBuilder {
    /// Models being built.
    models: HashMap<String, ModelDef>,
    /// Declaration order of collection models, for root generation.
    collection_order: Vec<String>,
}

impl RegistryBuilder {
    /// Create a new builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a collection-backed model. The primary key defaults to `_id`.
    pub fn add_model(
        &mut self,
        name: impl Into<String>,
        collection: impl Into<String>,
    ) -> ModelBuilder<'_> {
        ModelBuilder {
            builder: self,
            name: name.into(),
            collection: Some(collection.into()),
            primary_key: "_id".to_string(),
            fields: IndexMap::new(),
        }
    }

    /// Add an embedded type: stored inline, no collection, no roots.
    pub fn add_embedded(&mut self, name: impl Into<String>) -> ModelBuilder<'_> {
        ModelBuilder {
            builder: self,
            name: name.into(),
            collection: None,
            primary_key: "_id".to_string(),
            fields: IndexMap::new(),
        }
    }

    /// Build the immutable Registry.
    ///
    /// Validates relation/embedded targets and auto-registers the
    /// standard root set per collection model: plural read (named after
    /// the collection), singular read, `create<Model>`, `update<Model>`,
    /// `delete<Model>`.
    pub fn build(self) -> Result<Registry, RegistryError> {
        // Validate field targets
        for model in self.models.values() {
            for field in model.fields.values() {
                let target = match &field.kind {
                    FieldKind::Scalar => continue,
                    FieldKind::Embedded { target } => target,
                    FieldKind::Relation { target } => target,
                    FieldKind::ExtRelation { target, .. } => target,
                };
                let target_def = self.models.get(target).ok_or_else(|| {
                    RegistryError::UnknownTarget {
                        model: model.name.clone(),
                        field: field.name.clone(),
                        target: target.clone(),
                    }
                })?;
                // Relations need a collection to read from; embedding an
                // embedded type is the only inline case.
                let is_relation = matches!(
                    field.kind,
                    FieldKind::Relation { .. } | FieldKind::ExtRelation { .. }
                );
                if is_relation && target_def.is_embedded() {
                    return Err(RegistryError::RelationToEmbedded {
                        model: model.name.clone(),
                        field: field.name.clone(),
                        target: target.clone(),
                    });
                }
            }
        }

        // Auto-register roots for collection models, in declaration order
        let mut roots: HashMap<String, RootDef> = HashMap::new();
        for model_name in &self.collection_order {
            let model = &self.models[model_name];
            let collection = match model.collection.clone() {
                Some(collection) => collection,
                None => continue,
            };

            let root_set = [
                (collection, RootKind::ReadMany),
                (lowercase_first(model_name), RootKind::ReadOne),
                (format!("create{}", model_name), RootKind::Create),
                (format!("update{}", model_name), RootKind::Update),
                (format!("delete{}", model_name), RootKind::Delete),
            ];
            for (root_name, kind) in root_set {
                if roots.contains_key(&root_name) {
                    return Err(RegistryError::DuplicateRootName(root_name));
                }
                roots.insert(
                    root_name.clone(),
                    RootDef {
                        name: root_name,
                        model: model_name.clone(),
                        kind,
                    },
                );
            }
        }

        Ok(Registry::new(self.models, roots))
    }

    fn finish_model(&mut self, model: ModelDef) -> Result<(), RegistryError> {
        if self.models.contains_key(&model.name) {
            return Err(RegistryError::DuplicateModelName(model.name));
        }
        if model.collection.is_some() {
            self.collection_order.push(model.name.clone());
        }
        self.models.insert(model.name.clone(), model);
        Ok(())
    }
}

/// Builder for a single model definition.
pub struct ModelBuilder<'b> {
    builder: &'b mut RegistryBuilder,
    name: String,
    collection: Option<String>,
    primary_key: String,
    fields: IndexMap<String, FieldDef>,
}

impl<'b> ModelBuilder<'b> {
    /// Add a field definition.
    pub fn field(mut self, def: FieldDef) -> Self {
        self.fields.insert(def.name.clone(), def);
        self
    }

    /// Override the unique-key storage field (defaults to `_id`).
    pub fn primary_key(mut self, name: impl Into<String>) -> Self {
        self.primary_key = name.into();
        self
    }

    /// Finish this model and return to the registry builder.
    pub fn done(self) -> Result<(), RegistryError> {
        self.builder.finish_model(ModelDef {
            name: self.name,
            collection: self.collection,
            primary_key: self.primary_key,
            fields: self.fields,
        })
    }
}

fn lowercase_first(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}
