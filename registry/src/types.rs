//! Schema definition types.

use canopy_core::Value;
use indexmap::IndexMap;

/// The closed set of field kinds the plan builder dispatches on.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldKind {
    /// Plain stored value.
    Scalar,
    /// Nested structure stored inline in the same document.
    Embedded {
        /// Target type name (an embedded model in the registry).
        target: String,
    },
    /// Relation whose foreign key is stored on this document.
    /// The field's storage name IS the foreign-key field.
    Relation {
        /// Target model name.
        target: String,
    },
    /// Reverse relation with no local key; resolved via the target
    /// collection's foreign-key field.
    ExtRelation {
        /// Target model name.
        target: String,
        /// Foreign-key storage field on the target collection.
        foreign_key: String,
    },
}

/// Field definition within a model.
#[derive(Debug, Clone)]
pub struct FieldDef {
    /// Field name as requested by callers.
    pub name: String,
    /// Storage field name (for relations, the foreign-key field).
    pub storage_name: String,
    /// What kind of field this is.
    pub kind: FieldKind,
    /// Cardinality: true for list-valued fields.
    pub many: bool,
    /// Whether a create input must supply this field.
    pub required: bool,
    /// Default value applied when a create input omits the field.
    pub default: Option<Value>,
}

impl FieldDef {
    /// A scalar field stored under its own name.
    pub fn scalar(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            storage_name: name.clone(),
            name,
            kind: FieldKind::Scalar,
            many: false,
            required: false,
            default: None,
        }
    }

    /// An embedded field: nested document(s) of the target type stored
    /// inline.
    pub fn embedded(name: impl Into<String>, target: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            storage_name: name.clone(),
            name,
            kind: FieldKind::Embedded {
                target: target.into(),
            },
            many: false,
            required: false,
            default: None,
        }
    }

    /// A local relation: the foreign key lives on this document. The
    /// storage name defaults to `<name>Id` and can be overridden with
    /// [`FieldDef::stored_as`].
    pub fn relation(name: impl Into<String>, target: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            storage_name: format!("{}Id", name),
            name,
            kind: FieldKind::Relation {
                target: target.into(),
            },
            many: false,
            required: false,
            default: None,
        }
    }

    /// A reverse relation: no local key; `foreign_key` names the FK
    /// storage field on the target collection.
    pub fn ext_relation(
        name: impl Into<String>,
        target: impl Into<String>,
        foreign_key: impl Into<String>,
    ) -> Self {
        let name = name.into();
        Self {
            storage_name: name.clone(),
            name,
            kind: FieldKind::ExtRelation {
                target: target.into(),
                foreign_key: foreign_key.into(),
            },
            many: false,
            required: false,
            default: None,
        }
    }

    /// Override the storage field name (e.g. `id` stored as `_id`).
    pub fn stored_as(mut self, storage_name: impl Into<String>) -> Self {
        self.storage_name = storage_name.into();
        self
    }

    /// Mark this field list-valued. For a local relation this also
    /// switches the default storage name to `<name>Ids`.
    pub fn many(mut self) -> Self {
        if matches!(self.kind, FieldKind::Relation { .. })
            && self.storage_name == format!("{}Id", self.name)
        {
            self.storage_name = format!("{}Ids", self.name);
        }
        self.many = true;
        self
    }

    /// Mark this field required on create.
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Provide a default value for create inputs.
    pub fn with_default(mut self, value: Value) -> Self {
        self.default = Some(value);
        self
    }

    /// True if this field allocates no operation of its own when read.
    pub fn is_inline(&self) -> bool {
        matches!(self.kind, FieldKind::Scalar | FieldKind::Embedded { .. })
    }
}

/// Model definition: a storage collection or an embedded type.
#[derive(Debug, Clone)]
pub struct ModelDef {
    /// Model name.
    pub name: String,
    /// Storage collection name; `None` for embedded types.
    pub collection: Option<String>,
    /// Unique-key storage field name.
    pub primary_key: String,
    /// Field definitions, in declaration order.
    pub fields: IndexMap<String, FieldDef>,
}

impl ModelDef {
    /// Get a field definition by name.
    pub fn get_field(&self, name: &str) -> Option<&FieldDef> {
        self.fields.get(name)
    }

    /// True if this model is stored inline rather than in a collection.
    pub fn is_embedded(&self) -> bool {
        self.collection.is_none()
    }
}

/// What a root operation does.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RootKind {
    /// Collection query returning many documents.
    ReadMany,
    /// Single-record query.
    ReadOne,
    /// Create mutation.
    Create,
    /// Update mutation.
    Update,
    /// Delete mutation.
    Delete,
}

impl RootKind {
    /// Storage cardinality of the root operation.
    pub fn many(self) -> bool {
        matches!(self, RootKind::ReadMany)
    }
}

/// Root operation definition: maps a request root field to a model.
#[derive(Debug, Clone)]
pub struct RootDef {
    /// Root field name (`posts`, `post`, `createPost`, ...).
    pub name: String,
    /// Model the operation targets.
    pub model: String,
    /// What the operation does.
    pub kind: RootKind,
}
