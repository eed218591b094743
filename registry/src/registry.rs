//! The Registry - immutable schema lookup.

use crate::{FieldDef, ModelDef, RootDef};
use std::collections::HashMap;
use thiserror::Error;

/// Result type for schema lookups.
pub type SchemaResult<T> = Result<T, SchemaError>;

/// Errors from schema lookups. These indicate a request (or programming)
/// error, never a storage error: the registry is total over valid schema.
#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("Unknown model: {name}")]
    UnknownModel { name: String },

    #[error("Unknown field: {field} on model {model}")]
    UnknownField { model: String, field: String },

    #[error("Unknown root operation: {name}")]
    UnknownRoot { name: String },

    #[error("Model {name} is embedded and has no collection")]
    NotACollection { name: String },
}

impl SchemaError {
    pub fn unknown_model(name: impl Into<String>) -> Self {
        Self::UnknownModel { name: name.into() }
    }

    pub fn unknown_field(model: impl Into<String>, field: impl Into<String>) -> Self {
        Self::UnknownField {
            model: model.into(),
            field: field.into(),
        }
    }

    pub fn unknown_root(name: impl Into<String>) -> Self {
        Self::UnknownRoot { name: name.into() }
    }
}

/// The Registry provides runtime lookup of schema definitions.
/// It is immutable after construction.
#[derive(Debug)]
pub struct Registry {
    /// Model definitions by name.
    models: HashMap<String, ModelDef>,
    /// Root operation definitions by name.
    roots: HashMap<String, RootDef>,
}

impl Registry {
    pub(crate) fn new(models: HashMap<String, ModelDef>, roots: HashMap<String, RootDef>) -> Self {
        Self { models, roots }
    }

    // ==================== Model Lookups ====================

    /// Get a model definition by name.
    pub fn model(&self, name: &str) -> SchemaResult<&ModelDef> {
        self.models
            .get(name)
            .ok_or_else(|| SchemaError::unknown_model(name))
    }

    /// Get the number of models.
    pub fn model_count(&self) -> usize {
        self.models.len()
    }

    /// Get the storage collection name of a model.
    pub fn collection_of(&self, model: &str) -> SchemaResult<&str> {
        let def = self.model(model)?;
        def.collection
            .as_deref()
            .ok_or_else(|| SchemaError::NotACollection {
                name: model.to_string(),
            })
    }

    /// Get the unique-key storage field of a model.
    pub fn primary_key_of(&self, model: &str) -> SchemaResult<&str> {
        Ok(&self.model(model)?.primary_key)
    }

    // ==================== Field Lookups ====================

    /// Resolve a field on a model. Total over valid schema; failure means
    /// the request named a field the schema does not have.
    pub fn resolve_field(&self, model: &str, field: &str) -> SchemaResult<&FieldDef> {
        self.model(model)?
            .get_field(field)
            .ok_or_else(|| SchemaError::unknown_field(model, field))
    }

    /// All fields of a model, in declaration order.
    pub fn fields_of(&self, model: &str) -> SchemaResult<impl Iterator<Item = &FieldDef>> {
        Ok(self.model(model)?.fields.values())
    }

    // ==================== Root Lookups ====================

    /// Resolve a root operation name.
    pub fn resolve_root(&self, name: &str) -> SchemaResult<&RootDef> {
        self.roots
            .get(name)
            .ok_or_else(|| SchemaError::unknown_root(name))
    }
}
