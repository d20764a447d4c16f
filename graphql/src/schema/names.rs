//! Translation between the names clients use and the names resolvers use.
//!
//! Operation, field and argument names are camelCase on the wire
//! (`createBook`) and snake_case inside the service (`create_book`). Names
//! starting with `__` belong to GraphQL itself and are never translated.

use inflector::Inflector;

/// Turns an internal name into the name clients see.
pub fn to_external(name: &str) -> String {
    if name.starts_with("__") {
        return name.to_owned();
    }
    name.to_camel_case()
}

/// Turns a name used by clients into the internal name.
pub fn to_internal(name: &str) -> String {
    if name.starts_with("__") {
        return name.to_owned();
    }
    name.to_snake_case()
}

/// Name of the root field that lists all entities of `kind`, e.g. `books`.
pub fn list_field(kind: &str) -> String {
    kind.to_snake_case().to_plural()
}

/// Name of the root field that looks up one entity of `kind` by id.
pub fn single_field(kind: &str) -> String {
    kind.to_snake_case()
}

/// Name of a mutation such as `create_book` for `verb = "create"`.
pub fn mutation_field(verb: &str, kind: &str) -> String {
    format!("{}_{}", verb, kind.to_snake_case())
}

/// Name of the payload type returned by a mutation, e.g.
/// `CreateBookPayload`.
pub fn payload_type(verb: &str, kind: &str) -> String {
    format!("{}{}Payload", verb.to_pascal_case(), kind.to_pascal_case())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_between_cases() {
        for (internal, external) in [
            ("create_book", "createBook"),
            ("update_book", "updateBook"),
            ("books", "books"),
            ("id", "id"),
        ] {
            assert_eq!(to_external(internal), external);
            assert_eq!(to_internal(external), internal);
        }
    }

    #[test]
    fn leaves_introspection_names_alone() {
        assert_eq!(to_external("__typename"), "__typename");
        assert_eq!(to_internal("__typename"), "__typename");
    }

    #[test]
    fn derives_operation_names_from_kind() {
        assert_eq!(list_field("Book"), "books");
        assert_eq!(single_field("Book"), "book");
        assert_eq!(mutation_field("delete", "Book"), "delete_book");
        assert_eq!(payload_type("update", "Book"), "UpdateBookPayload");
    }
}
