use std::collections::HashMap;

use bookshelf::prelude::{q, Object, QueryExecutionError, ScalarKind, Value};

use crate::query::ast as qast;
use crate::schema::ast::{self as sast, Field, InputValue, Type};
use crate::schema::names;

/// A GraphQL value that can be coerced according to a type.
pub trait MaybeCoercible<T> {
    fn coerce(&self, using_type: &T) -> Option<Value>;
}

impl MaybeCoercible<ScalarKind> for qast::Value {
    fn coerce(&self, kind: &ScalarKind) -> Option<Value> {
        match (kind, self) {
            (_, q::Value::Null) => Some(Value::Null),
            (ScalarKind::Boolean, q::Value::Boolean(b)) => Some(Value::Boolean(*b)),
            (ScalarKind::Int, q::Value::Int(num)) => {
                let num = num.as_i64()?;
                i32::try_from(num).ok().map(Value::Int)
            }
            (ScalarKind::String, q::Value::String(s)) => Some(Value::String(s.clone())),
            _ => None,
        }
    }
}

/// Coerces `value` into a value of type `ty`, replacing variable
/// references with their values. Returns `None` if that isn't possible.
pub fn coerce_value(
    value: &qast::Value,
    ty: &Type,
    variables: &HashMap<String, qast::Value>,
) -> Option<Value> {
    if let q::Value::Variable(name) = value {
        // Variables that were declared but not provided are null
        return match variables.get(name) {
            Some(value) => coerce_value(value, ty, variables),
            None => coerce_value(&q::Value::Null, ty, variables),
        };
    }

    match (ty, value) {
        // Null values cannot be coerced into non-null types.
        (Type::NonNullType(_), q::Value::Null) => None,

        // Non-null values may be coercible into non-null types
        (Type::NonNullType(t), _) => coerce_value(value, t, variables),

        // Nullable types can be null.
        (_, q::Value::Null) => Some(Value::Null),

        (Type::NamedType(name), _) => value.coerce(&ScalarKind::from_graphql_name(name)?),

        // List values are coercible if their values are coercible into the
        // inner type.
        (Type::ListType(t), q::Value::List(values)) => values
            .iter()
            .map(|value| coerce_value(value, t, variables))
            .collect::<Option<Vec<_>>>()
            .map(Value::List),

        // A single value is coerced into a list with one element
        (Type::ListType(t), _) => coerce_value(value, t, variables).map(|v| Value::List(vec![v])),
    }
}

/// Coerces an argument into a value. `Ok(None)` happens when no value is
/// given for a nullable argument.
pub(crate) fn coerce_input_value(
    value: Option<&qast::Value>,
    def: &InputValue,
    variables: &HashMap<String, qast::Value>,
    position: graphql_parser::Pos,
) -> Result<Option<Value>, QueryExecutionError> {
    // A variable without a value counts as not given
    let value = match value {
        Some(q::Value::Variable(name)) if !variables.contains_key(name) => None,
        value => value,
    };

    let value = match value {
        None => {
            return if sast::is_non_null_type(&def.value_type) {
                Err(QueryExecutionError::MissingArgumentError(
                    position,
                    def.name.to_owned(),
                ))
            } else {
                Ok(None)
            };
        }
        Some(value) => value,
    };

    coerce_value(value, &def.value_type, variables)
        .map(Some)
        .ok_or_else(|| {
            let shown = match value {
                q::Value::Variable(name) => variables.get(name).unwrap_or(value),
                _ => value,
            };
            QueryExecutionError::InvalidArgumentError(
                position,
                def.name.to_owned(),
                format!("expected {} but got {}", def.value_type, shown),
            )
        })
}

/// Coerces the arguments a query uses for `field` according to the field's
/// definition. The returned object is keyed by internal argument names.
pub(crate) fn coerce_argument_values(
    field_def: &Field,
    field: &qast::Field,
    variables: &HashMap<String, qast::Value>,
) -> Result<Object, Vec<QueryExecutionError>> {
    let mut coerced = Object::new();
    let mut errors = vec![];

    for (name, _) in &field.arguments {
        if sast::get_argument_definition(field_def, name).is_none() {
            errors.push(QueryExecutionError::UnknownArgument(
                field.position,
                field.name.clone(),
                name.clone(),
            ));
        }
    }

    for def in &field_def.arguments {
        let value = qast::get_argument_value(&field.arguments, &def.name);
        match coerce_input_value(value, def, variables, field.position) {
            Ok(Some(value)) => {
                coerced.insert(names::to_internal(&def.name), value);
            }
            Ok(None) => {}
            Err(e) => errors.push(e),
        }
    }

    if errors.is_empty() {
        Ok(coerced)
    } else {
        Err(errors)
    }
}
