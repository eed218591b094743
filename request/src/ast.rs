//! Request tree types.
//!
//! All constructors are fluent so tests and embedding callers can spell
//! a request roughly the way it would look in a query language.

use canopy_core::Value;
use indexmap::IndexMap;

/// A complete request: one or more root fields.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Request {
    pub fields: Vec<RootField>,
}

impl Request {
    /// Create an empty request.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a root field.
    pub fn field(mut self, field: RootField) -> Self {
        self.fields.push(field);
        self
    }
}

/// A root field: maps 1:1 to a storage operation.
#[derive(Debug, Clone, PartialEq)]
pub struct RootField {
    /// Root operation name (`posts`, `createPost`, ...).
    pub name: String,
    /// Filter predicates (`where`).
    pub filter: Option<Filter>,
    /// Mutation input (`data`).
    pub data: Option<InputObject>,
    /// Requested selection set.
    pub selection: Vec<Selection>,
}

impl RootField {
    /// Create a root field with an empty selection.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            filter: None,
            data: None,
            selection: Vec::new(),
        }
    }

    /// Attach a `where` filter.
    pub fn filter(mut self, filter: Filter) -> Self {
        self.filter = Some(filter);
        self
    }

    /// Attach mutation input data.
    pub fn data(mut self, data: InputObject) -> Self {
        self.data = Some(data);
        self
    }

    /// Add a field to the selection set.
    pub fn select(mut self, selection: Selection) -> Self {
        self.selection.push(selection);
        self
    }
}

/// A field in a selection set, with an optional nested selection.
#[derive(Debug, Clone, PartialEq)]
pub struct Selection {
    pub name: String,
    pub selection: Vec<Selection>,
}

impl Selection {
    /// A leaf field.
    pub fn field(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            selection: Vec::new(),
        }
    }

    /// Add a nested field under this one.
    pub fn select(mut self, selection: Selection) -> Self {
        self.selection.push(selection);
        self
    }
}

/// Filter predicates, in caller order.
///
/// A predicate value is either a literal to match by equality or a
/// nested condition on a relation/embedded field.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Filter {
    pub predicates: IndexMap<String, FilterValue>,
}

impl Filter {
    /// Create an empty filter.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an equality predicate on a field.
    pub fn eq(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.predicates
            .insert(field.into(), FilterValue::Value(value.into()));
        self
    }

    /// Add a nested condition on a relation or embedded field.
    pub fn nested(mut self, field: impl Into<String>, filter: Filter) -> Self {
        self.predicates
            .insert(field.into(), FilterValue::Nested(filter));
        self
    }
}

/// A single filter predicate value.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterValue {
    /// Match the field by equality.
    Value(Value),
    /// Nested condition object on a relation or embedded field.
    Nested(Filter),
}

/// A mutation input object, in caller order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct InputObject {
    pub fields: IndexMap<String, InputValue>,
}

impl InputObject {
    /// Create an empty input object.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a field to any input value.
    pub fn set(mut self, field: impl Into<String>, value: InputValue) -> Self {
        self.fields.insert(field.into(), value);
        self
    }

    /// Set a field to a literal value.
    pub fn value(self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(field, InputValue::Value(value.into()))
    }

    /// Set a field to a nested `create` input.
    pub fn create(self, field: impl Into<String>, input: InputObject) -> Self {
        self.set(field, InputValue::Create(Box::new(input)))
    }

    /// Set a field to a nested `create` list input.
    pub fn create_many(self, field: impl Into<String>, inputs: Vec<InputObject>) -> Self {
        self.set(field, InputValue::CreateMany(inputs))
    }

    /// Set a field to a `connect` by unique id.
    pub fn connect(self, field: impl Into<String>, id: impl Into<Value>) -> Self {
        self.set(field, InputValue::Connect(id.into()))
    }

    /// Set a field to a `connect` list of unique ids.
    pub fn connect_many(self, field: impl Into<String>, ids: Vec<Value>) -> Self {
        self.set(field, InputValue::ConnectMany(ids))
    }
}

/// A value in a mutation input.
#[derive(Debug, Clone, PartialEq)]
pub enum InputValue {
    /// Literal scalar or list of scalars.
    Value(Value),
    /// Embedded object literal, recursed inline.
    Object(InputObject),
    /// List of input values.
    List(Vec<InputValue>),
    /// Nested `create` of a single related/embedded object.
    Create(Box<InputObject>),
    /// Nested `create` of a list of related/embedded objects.
    CreateMany(Vec<InputObject>),
    /// `connect` to an existing document by unique id.
    Connect(Value),
    /// `connect` to a list of existing documents by unique ids.
    ConnectMany(Vec<Value>),
}
