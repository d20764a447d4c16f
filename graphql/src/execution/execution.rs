use indexmap::IndexMap;
use std::collections::HashSet;
use std::sync::Arc;

use bookshelf::prelude::*;

use crate::execution::{OperationKind, Query, Resolver};
use crate::query::ast::{self as qast, Field, SelectionSet};
use crate::schema::ast::{self as sast, ObjectType, Type};
use crate::schema::names;
use crate::values::coercion::coerce_argument_values;

type JsonMap = serde_json::Map<String, serde_json::Value>;

/// Contextual information passed around during query execution.
pub struct ExecutionContext<R>
where
    R: Resolver,
{
    /// The logger to use.
    pub logger: Logger,

    /// The query to execute.
    pub query: Arc<Query>,

    /// The resolver to use.
    pub resolver: Arc<R>,
}

/// Executes the root selection set of a query.
///
/// The result always has `data`; it is `null` if a non-null root field
/// could not be resolved. Errors from fields that failed are collected
/// next to the data.
pub fn execute_root_selection_set<R>(ctx: &ExecutionContext<R>) -> QueryResult
where
    R: Resolver,
{
    let mut errors = vec![];
    let root_type = ctx.query.root_type();
    let data = execute_selection_set(
        ctx,
        &mut errors,
        &[&ctx.query.selection_set],
        root_type,
        None,
    )
    .map(serde_json::Value::Object)
    .unwrap_or(serde_json::Value::Null);

    QueryResult::new(Some(data)).with_errors(errors.into_iter().map(QueryError::from).collect())
}

/// Executes a selection set, requiring the result to be of the given object
/// type. `object_value` is `None` for the root selection set.
///
/// Returns `None` if a non-null field failed, which makes the whole object
/// `null`.
fn execute_selection_set<'a, R>(
    ctx: &'a ExecutionContext<R>,
    errors: &mut Vec<QueryExecutionError>,
    selection_sets: &[&'a SelectionSet],
    object_type: &'a ObjectType,
    object_value: Option<&Object>,
) -> Option<JsonMap>
where
    R: Resolver,
{
    let mut result_map = JsonMap::new();

    // Group fields with the same response key, so we can execute them
    // together. Fields are processed in order, so mutations run serially.
    let mut grouped_field_set = IndexMap::new();
    for &selection_set in selection_sets {
        collect_fields(
            ctx,
            object_type,
            selection_set,
            &mut HashSet::new(),
            &mut grouped_field_set,
        );
    }

    for (response_key, fields) in grouped_field_set {
        let field = fields[0];

        if field.name == "__typename" {
            result_map.insert(
                response_key.to_owned(),
                serde_json::Value::String(object_type.name.clone()),
            );
            continue;
        }

        let field_def = match sast::get_field(object_type, &field.name) {
            Some(def) => def,
            None => {
                errors.push(QueryExecutionError::UnknownField(
                    field.position,
                    object_type.name.clone(),
                    field.name.clone(),
                ));
                continue;
            }
        };

        let value = execute_field(
            ctx,
            errors,
            object_value,
            field,
            &field_def.field_type,
            &fields,
        )?;
        result_map.insert(response_key.to_owned(), value);
    }

    Some(result_map)
}

/// Collects fields of a selection set into `grouped_fields`, keyed by
/// response key, following fragments that apply to `object_type`.
fn collect_fields<'a, R>(
    ctx: &'a ExecutionContext<R>,
    object_type: &ObjectType,
    selection_set: &'a SelectionSet,
    visited_fragments: &mut HashSet<&'a str>,
    grouped_fields: &mut IndexMap<&'a str, Vec<&'a Field>>,
) where
    R: Resolver,
{
    let variables = &ctx.query.variables;

    // Only consider selections that are not skipped and should be included
    let selections = selection_set
        .items
        .iter()
        .filter(|selection| !qast::skip_selection(selection, variables))
        .filter(|selection| qast::include_selection(selection, variables));

    for selection in selections {
        match selection {
            q::Selection::Field(field) => {
                grouped_fields
                    .entry(qast::get_response_key(field))
                    .or_default()
                    .push(field);
            }

            q::Selection::FragmentSpread(spread) => {
                // Only consider the fragment if it hasn't already been
                // included, as would be the case if the same fragment spread
                // ...Foo appeared twice in the same selection set
                if !visited_fragments.insert(spread.fragment_name.as_str()) {
                    continue;
                }
                if let Some(fragment) = ctx.query.get_fragment(&spread.fragment_name) {
                    let q::TypeCondition::On(type_name) = &fragment.type_condition;
                    if type_name == &object_type.name {
                        collect_fields(
                            ctx,
                            object_type,
                            &fragment.selection_set,
                            visited_fragments,
                            grouped_fields,
                        );
                    }
                }
            }

            q::Selection::InlineFragment(fragment) => {
                let applies = match &fragment.type_condition {
                    Some(q::TypeCondition::On(type_name)) => type_name == &object_type.name,
                    None => true,
                };
                if applies {
                    collect_fields(
                        ctx,
                        object_type,
                        &fragment.selection_set,
                        visited_fragments,
                        grouped_fields,
                    );
                }
            }
        }
    }
}

/// Executes a field. Root fields are passed to the resolver, all other
/// fields are read from the parent object.
fn execute_field<'a, R>(
    ctx: &'a ExecutionContext<R>,
    errors: &mut Vec<QueryExecutionError>,
    object_value: Option<&Object>,
    field: &'a Field,
    field_type: &'a Type,
    fields: &[&'a Field],
) -> Option<serde_json::Value>
where
    R: Resolver,
{
    let resolved = match object_value {
        None => resolve_root_field(ctx, field),
        Some(object) => Ok(object
            .get(&names::to_internal(&field.name))
            .cloned()
            .unwrap_or(Value::Null)),
    };

    match resolved {
        Ok(value) => complete_value(ctx, errors, field, field_type, fields, value),
        Err(e) => {
            errors.extend(e);
            if sast::is_non_null_type(field_type) {
                None
            } else {
                Some(serde_json::Value::Null)
            }
        }
    }
}

fn resolve_root_field<R>(
    ctx: &ExecutionContext<R>,
    field: &Field,
) -> Result<Value, Vec<QueryExecutionError>>
where
    R: Resolver,
{
    let root_type = ctx.query.root_type();
    let field_def = sast::get_field(root_type, &field.name).ok_or_else(|| {
        vec![QueryExecutionError::UnknownField(
            field.position,
            root_type.name.clone(),
            field.name.clone(),
        )]
    })?;
    let arguments = coerce_argument_values(field_def, field, &ctx.query.variables)?;
    let name = names::to_internal(&field.name);

    trace!(ctx.logger, "Resolve root field"; "field" => &name);
    let context = &ctx.query.context;
    let resolved = match ctx.query.kind {
        OperationKind::Query => ctx.resolver.resolve_query_field(&name, &arguments, context),
        OperationKind::Mutation => ctx.resolver.resolve_mutation_field(&name, &arguments, context),
    };
    resolved.map_err(|e| vec![e])
}

/// Ensures that a value matches the expected return type and projects
/// objects onto the selected fields.
///
/// Returns `None` if the value must be `null` but its type is non-null; the
/// error has been recorded and the `null` propagates to the parent.
fn complete_value<'a, R>(
    ctx: &'a ExecutionContext<R>,
    errors: &mut Vec<QueryExecutionError>,
    field: &'a Field,
    field_type: &'a Type,
    fields: &[&'a Field],
    resolved_value: Value,
) -> Option<serde_json::Value>
where
    R: Resolver,
{
    match field_type {
        // Fail if the field type is non-null but the value is null
        s::Type::NonNullType(inner_type) => {
            match complete_nullable_value(ctx, errors, field, inner_type, fields, resolved_value)? {
                serde_json::Value::Null => {
                    errors.push(QueryExecutionError::NonNullError(
                        field.position,
                        field.name.clone(),
                    ));
                    None
                }
                value => Some(value),
            }
        }
        _ => Some(
            complete_nullable_value(ctx, errors, field, field_type, fields, resolved_value)
                .unwrap_or(serde_json::Value::Null),
        ),
    }
}

/// Completes a value of a type that is not wrapped in non-null. Returns
/// `None` if a non-null value nested inside failed.
fn complete_nullable_value<'a, R>(
    ctx: &'a ExecutionContext<R>,
    errors: &mut Vec<QueryExecutionError>,
    field: &'a Field,
    field_type: &'a Type,
    fields: &[&'a Field],
    resolved_value: Value,
) -> Option<serde_json::Value>
where
    R: Resolver,
{
    if resolved_value.is_null() {
        return Some(serde_json::Value::Null);
    }

    match field_type {
        s::Type::NonNullType(_) => {
            complete_value(ctx, errors, field, field_type, fields, resolved_value)
        }

        s::Type::ListType(inner_type) => {
            let values = match resolved_value {
                Value::List(values) => values,
                value => vec![value],
            };
            values
                .into_iter()
                .map(|value| complete_value(ctx, errors, field, inner_type, fields, value))
                .collect::<Option<Vec<_>>>()
                .map(serde_json::Value::Array)
        }

        s::Type::NamedType(name) => match ctx.query.schema.object_type(name) {
            // Objects are projected onto the merged selection sets of all
            // fields with this response key
            Some(object_type) => match resolved_value {
                Value::Object(object) => {
                    let selection_sets: Vec<_> =
                        fields.iter().map(|&field| &field.selection_set).collect();
                    execute_selection_set(
                        ctx,
                        errors,
                        &selection_sets,
                        object_type,
                        Some(&object),
                    )
                    .map(serde_json::Value::Object)
                }
                value => {
                    warn!(ctx.logger, "Resolver returned a non-object for an object field";
                          "field" => &field.name,
                          "type" => name,
                          "value" => value.to_string());
                    Some(serde_json::Value::Null)
                }
            },
            None => Some(resolved_value.into()),
        },
    }
}
