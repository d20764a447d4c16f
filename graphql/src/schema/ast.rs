use bookshelf::prelude::s;

/// A schema document that owns its strings.
pub type SchemaDocument = s::Document<'static, String>;
pub type ObjectType = s::ObjectType<'static, String>;
pub type Field = s::Field<'static, String>;
pub type InputValue = s::InputValue<'static, String>;
pub type Type = s::Type<'static, String>;
pub type TypeDefinition = s::TypeDefinition<'static, String>;

/// Returns the schema definition of the document, if it has one.
pub fn get_schema_definition(schema: &SchemaDocument) -> Option<&s::SchemaDefinition<'static, String>> {
    schema.definitions.iter().find_map(|d| match d {
        s::Definition::SchemaDefinition(def) => Some(def),
        _ => None,
    })
}

/// Returns the root type named by `select` in the schema definition, or the
/// type called `default` if there is no schema definition.
fn get_root_type<'a>(
    schema: &'a SchemaDocument,
    select: impl for<'b> Fn(&'b s::SchemaDefinition<'static, String>) -> Option<&'b String>,
    default: &str,
) -> Option<&'a ObjectType> {
    let name = match get_schema_definition(schema) {
        Some(def) => select(def)?.as_str(),
        None => default,
    };
    get_object_type(schema, name)
}

/// Returns the root query type (if there is one).
pub fn get_root_query_type(schema: &SchemaDocument) -> Option<&ObjectType> {
    get_root_type(schema, |def| def.query.as_ref(), "Query")
}

/// Returns the root mutation type (if there is one).
pub fn get_root_mutation_type(schema: &SchemaDocument) -> Option<&ObjectType> {
    get_root_type(schema, |def| def.mutation.as_ref(), "Mutation")
}

/// Returns all type definitions in the schema.
pub fn get_type_definitions(schema: &SchemaDocument) -> impl Iterator<Item = &TypeDefinition> {
    schema.definitions.iter().filter_map(|d| match d {
        s::Definition::TypeDefinition(typedef) => Some(typedef),
        _ => None,
    })
}

/// Returns the type definition with the given name.
pub fn get_named_type<'a>(schema: &'a SchemaDocument, name: &str) -> Option<&'a TypeDefinition> {
    get_type_definitions(schema).find(|typedef| get_type_name(typedef) == name)
}

/// Returns the object type with the given name.
pub fn get_object_type<'a>(schema: &'a SchemaDocument, name: &str) -> Option<&'a ObjectType> {
    match get_named_type(schema, name)? {
        s::TypeDefinition::Object(t) => Some(t),
        _ => None,
    }
}

/// Returns the name of a type definition.
pub fn get_type_name(t: &TypeDefinition) -> &str {
    match t {
        s::TypeDefinition::Enum(t) => &t.name,
        s::TypeDefinition::InputObject(t) => &t.name,
        s::TypeDefinition::Interface(t) => &t.name,
        s::TypeDefinition::Object(t) => &t.name,
        s::TypeDefinition::Scalar(t) => &t.name,
        s::TypeDefinition::Union(t) => &t.name,
    }
}

/// Looks up a field definition on an object type by its external name.
pub fn get_field<'a>(object_type: &'a ObjectType, name: &str) -> Option<&'a Field> {
    object_type.fields.iter().find(|field| field.name == name)
}

/// Looks up an argument definition of a field by its external name.
pub fn get_argument_definition<'a>(field: &'a Field, name: &str) -> Option<&'a InputValue> {
    field.arguments.iter().find(|arg| arg.name == name)
}

/// Returns the type name at the bottom of any list and non-null wrappers.
pub fn get_base_type(t: &Type) -> &str {
    match t {
        s::Type::NamedType(name) => name,
        s::Type::ListType(inner) => get_base_type(inner),
        s::Type::NonNullType(inner) => get_base_type(inner),
    }
}

pub fn is_non_null_type(t: &Type) -> bool {
    matches!(t, s::Type::NonNullType(_))
}

/// Whether a named type is one of the built-in scalars.
pub fn is_scalar_type(schema: &SchemaDocument, name: &str) -> bool {
    matches!(get_named_type(schema, name), Some(s::TypeDefinition::Scalar(_)))
        || bookshelf::schema::ScalarKind::from_graphql_name(name).is_some()
}

/// Whether values of type `t` can be passed as variables or arguments.
/// Only scalars and lists of scalars are inputs in this schema.
pub fn is_input_type(schema: &SchemaDocument, t: &Type) -> bool {
    is_scalar_type(schema, get_base_type(t))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(sdl: &str) -> SchemaDocument {
        s::parse_schema::<String>(sdl).unwrap().into_static()
    }

    #[test]
    fn root_types_follow_the_schema_definition() {
        let schema = parse(
            "schema { query: Reads mutation: Writes }
             type Reads { n: Int }
             type Writes { ok: Boolean }
             type Query { unused: Int }",
        );

        assert_eq!(get_root_query_type(&schema).map(|t| t.name.as_str()), Some("Reads"));
        assert_eq!(
            get_root_mutation_type(&schema).map(|t| t.name.as_str()),
            Some("Writes")
        );
    }

    #[test]
    fn root_types_default_to_conventional_names() {
        let schema = parse("type Query { n: Int }");

        assert_eq!(get_root_query_type(&schema).map(|t| t.name.as_str()), Some("Query"));
        assert!(get_root_mutation_type(&schema).is_none());

        let schema = parse("schema { query: Query } type Query { n: Int }");
        assert!(get_root_mutation_type(&schema).is_none());
    }
}
