//! Static descriptions of the entity kinds the service exposes.
//!
//! A [`TypeDescriptor`] lists the fields of one entity kind in declaration
//! order together with their scalar kind. It is the single source for both
//! the GraphQL API schema and the validation of mutation input.

use std::fmt;
use thiserror::Error;

use crate::data::value::{Object, Value};

/// The scalar types an entity field can have.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ScalarKind {
    Int,
    String,
    Boolean,
}

impl ScalarKind {
    /// Name of the matching built-in GraphQL scalar.
    pub fn graphql_name(self) -> &'static str {
        match self {
            ScalarKind::Int => "Int",
            ScalarKind::String => "String",
            ScalarKind::Boolean => "Boolean",
        }
    }

    /// Looks up the kind for a built-in GraphQL scalar name.
    pub fn from_graphql_name(name: &str) -> Option<ScalarKind> {
        match name {
            "Int" => Some(ScalarKind::Int),
            "String" => Some(ScalarKind::String),
            "Boolean" => Some(ScalarKind::Boolean),
            _ => None,
        }
    }

    pub fn accepts(self, value: &Value) -> bool {
        matches!(
            (self, value),
            (ScalarKind::Int, Value::Int(_))
                | (ScalarKind::String, Value::String(_))
                | (ScalarKind::Boolean, Value::Boolean(_))
        )
    }
}

impl fmt::Display for ScalarKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.graphql_name())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FieldDescriptor {
    /// Internal (snake_case) field name.
    pub name: &'static str,
    pub kind: ScalarKind,
    /// The field always has a value; creating an entity requires it unless
    /// it is `assigned`.
    pub required: bool,
    /// The store assigns the value; clients can never set it.
    pub assigned: bool,
}

/// Whether input is meant to create an entity or to patch an existing one.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InputMode {
    Create,
    Update,
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum SchemaError {
    #[error("type `{0}` has no field `{1}`")]
    UnknownField(String, String),
    #[error("field `{1}` of type `{0}` is assigned by the store and cannot be set")]
    AssignedField(String, String),
    #[error("field `{1}` of type `{0}` expects a {2} but got {3}")]
    KindMismatch(String, String, ScalarKind, String),
    #[error("field `{1}` of type `{0}` is required")]
    MissingField(String, String),
}

#[derive(Debug, PartialEq, Eq)]
pub struct TypeDescriptor {
    pub name: &'static str,
    pub fields: &'static [FieldDescriptor],
}

pub const BOOK: TypeDescriptor = TypeDescriptor {
    name: "Book",
    fields: &[
        FieldDescriptor {
            name: "id",
            kind: ScalarKind::Int,
            required: true,
            assigned: true,
        },
        FieldDescriptor {
            name: "title",
            kind: ScalarKind::String,
            required: true,
            assigned: false,
        },
        FieldDescriptor {
            name: "author",
            kind: ScalarKind::String,
            required: true,
            assigned: false,
        },
    ],
};

const ALL_KINDS: &[&TypeDescriptor] = &[&BOOK];

impl TypeDescriptor {
    /// Returns the descriptor for the entity kind with the given name.
    pub fn for_kind(name: &str) -> Option<&'static TypeDescriptor> {
        ALL_KINDS.iter().copied().find(|desc| desc.name == name)
    }

    /// Field names and kinds in declaration order.
    pub fn fields(&self) -> impl Iterator<Item = (&'static str, ScalarKind)> + '_ {
        self.fields.iter().map(|field| (field.name, field.kind))
    }

    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|field| field.name == name)
    }

    /// The store-assigned key field.
    pub fn key_field(&self) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|field| field.assigned)
    }

    /// Fields a client may supply.
    pub fn input_fields(&self) -> impl Iterator<Item = &FieldDescriptor> + '_ {
        self.fields.iter().filter(|field| !field.assigned)
    }

    /// Checks that `input` only names declared, client-settable fields with
    /// values of the right kind. For `InputMode::Create`, every required
    /// field must also be present and non-null.
    pub fn validate_input(&self, input: &Object, mode: InputMode) -> Result<(), SchemaError> {
        for (name, value) in input {
            let field = self
                .field(name)
                .ok_or_else(|| SchemaError::UnknownField(self.name.to_owned(), name.clone()))?;
            if field.assigned {
                return Err(SchemaError::AssignedField(
                    self.name.to_owned(),
                    name.clone(),
                ));
            }
            if value.is_null() && mode == InputMode::Update {
                continue;
            }
            if !field.kind.accepts(value) {
                return Err(SchemaError::KindMismatch(
                    self.name.to_owned(),
                    name.clone(),
                    field.kind,
                    value.type_name().to_owned(),
                ));
            }
        }

        if mode == InputMode::Create {
            if let Some(missing) = self
                .input_fields()
                .filter(|field| field.required)
                .find(|field| input.get(field.name).map_or(true, Value::is_null))
            {
                return Err(SchemaError::MissingField(
                    self.name.to_owned(),
                    missing.name.to_owned(),
                ));
            }
        }

        Ok(())
    }
}
