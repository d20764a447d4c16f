use std::collections::{HashMap, HashSet};
use std::fmt;
use thiserror::Error;

use bookshelf::prelude::{s, InputMode, TypeDescriptor};
use bookshelf::schema::FieldDescriptor;
use graphql_parser::Pos;

use crate::schema::ast::{self as sast, ObjectType, SchemaDocument};
use crate::schema::names;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum APISchemaError {
    #[error("no entity types given")]
    NoEntityTypes,
    #[error("entity type `{0}` is declared more than once")]
    DuplicateEntityType(String),
    #[error("entity type `{0}` has no store-assigned key field")]
    NoKeyField(String),
}

/// What a mutation field does with its arguments. Used to check the input
/// of a mutation against the entity's type descriptor before it runs.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MutationInput {
    pub descriptor: &'static TypeDescriptor,
    pub mode: InputMode,
}

/// The GraphQL API schema clients query, together with the lookups the
/// executor needs to validate operations against it.
#[derive(Clone, Debug)]
pub struct ApiSchema {
    document: SchemaDocument,
    pub query_type: ObjectType,
    pub mutation_type: ObjectType,
    /// Keyed by internal mutation field name
    inputs: HashMap<String, MutationInput>,
}

impl ApiSchema {
    pub fn document(&self) -> &SchemaDocument {
        &self.document
    }

    /// Returns the input contract of the mutation with the given internal
    /// name, if it creates or updates an entity.
    pub fn mutation_input(&self, field: &str) -> Option<MutationInput> {
        self.inputs.get(field).copied()
    }

    pub fn object_type(&self, name: &str) -> Option<&ObjectType> {
        sast::get_object_type(&self.document, name)
    }
}

impl fmt::Display for ApiSchema {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.document)
    }
}

fn named(name: &str) -> s::Type<'static, String> {
    s::Type::NamedType(name.to_owned())
}

fn non_null(t: s::Type<'static, String>) -> s::Type<'static, String> {
    s::Type::NonNullType(Box::new(t))
}

fn list(t: s::Type<'static, String>) -> s::Type<'static, String> {
    s::Type::ListType(Box::new(t))
}

fn object_type(
    name: String,
    description: Option<String>,
    fields: Vec<s::Field<'static, String>>,
) -> ObjectType {
    ObjectType {
        position: Pos::default(),
        description,
        name,
        implements_interfaces: vec![],
        directives: vec![],
        fields,
    }
}

fn field(
    internal_name: &str,
    description: Option<String>,
    arguments: Vec<s::InputValue<'static, String>>,
    field_type: s::Type<'static, String>,
) -> s::Field<'static, String> {
    s::Field {
        position: Pos::default(),
        description,
        name: names::to_external(internal_name),
        arguments,
        field_type,
        directives: vec![],
    }
}

fn argument(internal_name: &str, value_type: s::Type<'static, String>) -> s::InputValue<'static, String> {
    s::InputValue {
        position: Pos::default(),
        description: None,
        name: names::to_external(internal_name),
        value_type,
        default_value: None,
        directives: vec![],
    }
}

/// The type of an entity field, either in output or as required input.
fn field_type(desc: &FieldDescriptor) -> s::Type<'static, String> {
    let t = named(desc.kind.graphql_name());
    if desc.required {
        non_null(t)
    } else {
        t
    }
}

/// Everything the API schema declares for one entity type.
struct EntityApi {
    types: Vec<ObjectType>,
    query_fields: Vec<s::Field<'static, String>>,
    mutation_fields: Vec<s::Field<'static, String>>,
    inputs: Vec<(String, MutationInput)>,
}

fn entity_api(desc: &'static TypeDescriptor) -> Result<EntityApi, APISchemaError> {
    let kind = desc.name;
    let key = desc
        .key_field()
        .ok_or_else(|| APISchemaError::NoKeyField(kind.to_owned()))?;
    let single = names::single_field(kind);
    let key_arg = || argument(key.name, non_null(named(key.kind.graphql_name())));

    let entity = object_type(
        kind.to_owned(),
        None,
        desc.fields
            .iter()
            .map(|f| field(f.name, None, vec![], field_type(f)))
            .collect(),
    );

    let payload = |verb: &str| {
        object_type(
            names::payload_type(verb, kind),
            None,
            vec![field(&single, None, vec![], named(kind))],
        )
    };
    let delete_payload = object_type(
        names::payload_type("delete", kind),
        None,
        vec![field(
            "ok",
            Some(format!("Whether a {} was removed", kind)),
            vec![],
            non_null(named("Boolean")),
        )],
    );

    let query_fields = vec![
        field(
            &names::list_field(kind),
            Some(format!("All {}s in the order they were created", kind)),
            vec![],
            non_null(list(non_null(named(kind)))),
        ),
        field(
            &single,
            Some(format!("The {} with the given {}, if it exists", kind, key.name)),
            vec![key_arg()],
            named(kind),
        ),
    ];

    let create = names::mutation_field("create", kind);
    let update = names::mutation_field("update", kind);
    let delete = names::mutation_field("delete", kind);

    let mutation_fields = vec![
        field(
            &create,
            None,
            desc.input_fields()
                .map(|f| argument(f.name, field_type(f)))
                .collect(),
            named(&names::payload_type("create", kind)),
        ),
        field(
            &update,
            Some("Overwrites the given fields and leaves the others unchanged".to_owned()),
            std::iter::once(key_arg())
                .chain(
                    desc.input_fields()
                        .map(|f| argument(f.name, named(f.kind.graphql_name()))),
                )
                .collect(),
            named(&names::payload_type("update", kind)),
        ),
        field(
            &delete,
            None,
            vec![key_arg()],
            named(&names::payload_type("delete", kind)),
        ),
    ];

    let inputs = vec![
        (
            create,
            MutationInput {
                descriptor: desc,
                mode: InputMode::Create,
            },
        ),
        (
            update,
            MutationInput {
                descriptor: desc,
                mode: InputMode::Update,
            },
        ),
    ];

    Ok(EntityApi {
        types: vec![entity, payload("create"), payload("update"), delete_payload],
        query_fields,
        mutation_fields,
        inputs,
    })
}

/// Derives the API schema for the given entity types.
///
/// Every entity type gets a list and a lookup field on `Query` and create,
/// update and delete fields on `Mutation`, each returning a payload type.
pub fn api_schema(kinds: &[&'static TypeDescriptor]) -> Result<ApiSchema, APISchemaError> {
    if kinds.is_empty() {
        return Err(APISchemaError::NoEntityTypes);
    }

    let mut seen = HashSet::new();
    let mut types = vec![];
    let mut query_fields = vec![];
    let mut mutation_fields = vec![];
    let mut inputs = HashMap::new();

    for &desc in kinds {
        if !seen.insert(desc.name) {
            return Err(APISchemaError::DuplicateEntityType(desc.name.to_owned()));
        }
        let api = entity_api(desc)?;
        types.extend(api.types);
        query_fields.extend(api.query_fields);
        mutation_fields.extend(api.mutation_fields);
        inputs.extend(api.inputs);
    }

    let query_type = object_type("Query".to_owned(), None, query_fields);
    let mutation_type = object_type("Mutation".to_owned(), None, mutation_fields);

    let mut definitions = vec![s::Definition::SchemaDefinition(s::SchemaDefinition {
        position: Pos::default(),
        directives: vec![],
        query: Some(query_type.name.clone()),
        mutation: Some(mutation_type.name.clone()),
        subscription: None,
    })];
    definitions.extend(
        std::iter::once(query_type.clone())
            .chain(std::iter::once(mutation_type.clone()))
            .chain(types)
            .map(|t| s::Definition::TypeDefinition(s::TypeDefinition::Object(t))),
    );

    Ok(ApiSchema {
        document: s::Document { definitions },
        query_type,
        mutation_type,
        inputs,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use bookshelf::schema::{ScalarKind, BOOK};

    fn schema() -> ApiSchema {
        api_schema(&[&BOOK]).unwrap()
    }

    fn field_type_of(t: &ObjectType, name: &str) -> String {
        sast::get_field(t, name).unwrap().field_type.to_string()
    }

    #[test]
    fn derives_book_types() {
        let schema = schema();
        let book = schema.object_type("Book").unwrap();
        assert_eq!(field_type_of(book, "id"), "Int!");
        assert_eq!(field_type_of(book, "title"), "String!");
        assert_eq!(field_type_of(book, "author"), "String!");

        let delete = schema.object_type("DeleteBookPayload").unwrap();
        assert_eq!(field_type_of(delete, "ok"), "Boolean!");
        let create = schema.object_type("CreateBookPayload").unwrap();
        assert_eq!(field_type_of(create, "book"), "Book");
    }

    #[test]
    fn derives_root_fields() {
        let schema = schema();
        assert_eq!(field_type_of(&schema.query_type, "books"), "[Book!]!");
        assert_eq!(field_type_of(&schema.query_type, "book"), "Book");

        let update = sast::get_field(&schema.mutation_type, "updateBook").unwrap();
        let args: Vec<_> = update
            .arguments
            .iter()
            .map(|arg| format!("{}: {}", arg.name, arg.value_type))
            .collect();
        assert_eq!(args, vec!["id: Int!", "title: String", "author: String"]);

        let create = sast::get_field(&schema.mutation_type, "createBook").unwrap();
        let args: Vec<_> = create
            .arguments
            .iter()
            .map(|arg| format!("{}: {}", arg.name, arg.value_type))
            .collect();
        assert_eq!(args, vec!["title: String!", "author: String!"]);
    }

    #[test]
    fn mutation_inputs_follow_the_descriptor() {
        let schema = schema();
        assert_eq!(
            schema.mutation_input("create_book").map(|input| input.mode),
            Some(InputMode::Create)
        );
        assert_eq!(
            schema.mutation_input("update_book").map(|input| input.mode),
            Some(InputMode::Update)
        );
        assert_eq!(schema.mutation_input("delete_book"), None);
    }

    #[test]
    fn sdl_mentions_every_operation() {
        let sdl = schema().to_string();
        for op in ["books", "book(id: Int!)", "createBook", "updateBook", "deleteBook"] {
            assert!(sdl.contains(op), "missing {} in\n{}", op, sdl);
        }
    }

    #[test]
    fn rejects_bad_entity_sets() {
        assert_eq!(api_schema(&[]).unwrap_err(), APISchemaError::NoEntityTypes);
        assert_eq!(
            api_schema(&[&BOOK, &BOOK]).unwrap_err(),
            APISchemaError::DuplicateEntityType("Book".to_owned())
        );

        static KEYLESS: TypeDescriptor = TypeDescriptor {
            name: "Note",
            fields: &[FieldDescriptor {
                name: "text",
                kind: ScalarKind::String,
                required: true,
                assigned: false,
            }],
        };
        assert_eq!(
            api_schema(&[&KEYLESS]).unwrap_err(),
            APISchemaError::NoKeyField("Note".to_owned())
        );
    }
}
