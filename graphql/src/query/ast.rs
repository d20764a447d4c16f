use std::collections::HashMap;

use bookshelf::prelude::{q, Document, QueryExecutionError};

pub type OperationDefinition = q::OperationDefinition<'static, String>;
pub type FragmentDefinition = q::FragmentDefinition<'static, String>;
pub type SelectionSet = q::SelectionSet<'static, String>;
pub type Selection = q::Selection<'static, String>;
pub type Field = q::Field<'static, String>;
pub type Directive = q::Directive<'static, String>;
pub type Value = q::Value<'static, String>;
pub type VariableDefinition = q::VariableDefinition<'static, String>;

/// Returns the operation for the given name (or the only operation if no name is defined).
pub fn get_operation<'a>(
    document: &'a Document,
    name: Option<&str>,
) -> Result<&'a OperationDefinition, QueryExecutionError> {
    let operations = get_operations(document);

    match (name, operations.len()) {
        (_, 0) => Err(QueryExecutionError::EmptyQuery),
        (None, 1) => Ok(operations[0]),
        (None, _) => Err(QueryExecutionError::OperationNameRequired),
        (Some(s), _) => operations
            .into_iter()
            .find(|op| get_operation_name(op) == Some(s))
            .ok_or_else(|| QueryExecutionError::OperationNotFound(s.to_string())),
    }
}

/// Returns all operation definitions in the document.
pub fn get_operations(document: &Document) -> Vec<&OperationDefinition> {
    document
        .definitions
        .iter()
        .filter_map(|d| match d {
            q::Definition::Operation(op) => Some(op),
            _ => None,
        })
        .collect()
}

/// Returns the name of the given operation (if it has one).
pub fn get_operation_name(operation: &OperationDefinition) -> Option<&str> {
    match operation {
        q::OperationDefinition::Mutation(m) => m.name.as_deref(),
        q::OperationDefinition::Query(q) => q.name.as_deref(),
        q::OperationDefinition::SelectionSet(_) => None,
        q::OperationDefinition::Subscription(s) => s.name.as_deref(),
    }
}

/// Returns the fragment definitions of a document, keyed by name.
pub fn get_fragments(document: &Document) -> HashMap<&str, &FragmentDefinition> {
    document
        .definitions
        .iter()
        .filter_map(|d| match d {
            q::Definition::Fragment(fd) => Some((fd.name.as_str(), fd)),
            _ => None,
        })
        .collect()
}

/// Returns the variable definitions for an operation.
pub fn get_variable_definitions(operation: &OperationDefinition) -> &[VariableDefinition] {
    match operation {
        q::OperationDefinition::Query(q) => &q.variable_definitions,
        q::OperationDefinition::Subscription(s) => &s.variable_definitions,
        q::OperationDefinition::Mutation(m) => &m.variable_definitions,
        q::OperationDefinition::SelectionSet(_) => &[],
    }
}

/// Returns the root selection set of an operation.
pub fn get_selection_set(operation: &OperationDefinition) -> &SelectionSet {
    match operation {
        q::OperationDefinition::Query(q) => &q.selection_set,
        q::OperationDefinition::Subscription(s) => &s.selection_set,
        q::OperationDefinition::Mutation(m) => &m.selection_set,
        q::OperationDefinition::SelectionSet(set) => set,
    }
}

/// Returns the directives attached to a selection.
pub fn get_directives(selection: &Selection) -> &[Directive] {
    match selection {
        q::Selection::Field(field) => &field.directives,
        q::Selection::FragmentSpread(spread) => &spread.directives,
        q::Selection::InlineFragment(fragment) => &fragment.directives,
    }
}

/// Looks up the value of an argument in a vector of (name, value) tuples.
pub fn get_argument_value<'a>(arguments: &'a [(String, Value)], name: &str) -> Option<&'a Value> {
    arguments.iter().find(|(n, _)| n == name).map(|(_, v)| v)
}

/// Evaluates the `if` argument of the directive `name` on `selection`.
/// Returns `None` if the directive is not present.
fn directive_condition(
    selection: &Selection,
    name: &str,
    variables: &HashMap<String, Value>,
) -> Option<bool> {
    let directive = get_directives(selection)
        .iter()
        .find(|directive| directive.name == name)?;
    let value = match get_argument_value(&directive.arguments, "if") {
        Some(q::Value::Variable(var)) => variables.get(var),
        other => other,
    };
    Some(matches!(value, Some(q::Value::Boolean(true))))
}

/// Returns true if a selection should be skipped (as per the `@skip` directive).
pub fn skip_selection(selection: &Selection, variables: &HashMap<String, Value>) -> bool {
    directive_condition(selection, "skip", variables).unwrap_or(false)
}

/// Returns true if a selection should be included (as per the `@include` directive).
pub fn include_selection(selection: &Selection, variables: &HashMap<String, Value>) -> bool {
    directive_condition(selection, "include", variables).unwrap_or(true)
}

/// Returns the response key of a field, which is either its name or its alias (if there is one).
pub fn get_response_key(field: &Field) -> &str {
    field.alias.as_deref().unwrap_or(field.name.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(query: &str) -> Document {
        q::parse_query::<String>(query).unwrap().into_static()
    }

    #[test]
    fn selects_operations_by_name() {
        let doc = parse("query A { books { id } } mutation B { deleteBook(id: 1) { ok } }");

        assert_eq!(
            get_operation(&doc, None).unwrap_err(),
            QueryExecutionError::OperationNameRequired
        );
        let op = get_operation(&doc, Some("B")).unwrap();
        assert_eq!(get_operation_name(op), Some("B"));
        assert_eq!(
            get_operation(&doc, Some("C")).unwrap_err(),
            QueryExecutionError::OperationNotFound("C".to_owned())
        );
    }

    #[test]
    fn anonymous_single_operation() {
        let doc = parse("{ books { id } }");
        let op = get_operation(&doc, None).unwrap();
        assert_eq!(get_operation_name(op), None);
        assert_eq!(get_selection_set(op).items.len(), 1);

        let doc = parse("fragment F on Book { id }");
        assert_eq!(
            get_operation(&doc, None).unwrap_err(),
            QueryExecutionError::EmptyQuery
        );
    }

    #[test]
    fn skip_and_include() {
        let doc = parse(
            "query($yes: Boolean) { a @skip(if: true) b @include(if: $yes) c @include(if: false) d }",
        );
        let op = get_operation(&doc, None).unwrap();
        let mut vars = HashMap::new();
        vars.insert("yes".to_owned(), q::Value::Boolean(true));

        let kept: Vec<_> = get_selection_set(op)
            .items
            .iter()
            .filter(|sel| !skip_selection(sel, &vars) && include_selection(sel, &vars))
            .filter_map(|sel| match sel {
                q::Selection::Field(f) => Some(f.name.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(kept, vec!["b", "d"]);
    }
}
