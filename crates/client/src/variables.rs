use graphql_operation_store::{OperationDocument, TypeRef};
use serde_json::{Map, Value};

/// Variables of an operation call, keyed by name without the `$`.
pub type Variables = Map<String, Value>;

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum VariableError {
    /// returned if a non-null variable without default was not supplied or was null
    #[error("variable ${variable} of type {ty} is required by {operation}")]
    MissingRequired {
        operation: String,
        variable: String,
        ty: String,
    },
    /// returned if the caller supplied a variable the operation doesn't declare
    #[error("variable ${variable} is not declared by {operation}")]
    Undeclared { operation: String, variable: String },
    /// returned if a value can't be coerced to the declared type
    #[error("variable ${variable} of {operation} expects {expected}, got {found}")]
    InvalidValue {
        operation: String,
        variable: String,
        expected: String,
        found: &'static str,
    },
}

/// Checks the supplied variables against the declarations of `document`.
///
/// The result holds the supplied variables in declaration order. Omitted optional variables stay
/// omitted so the server applies their default. Built-in scalars are type checked, other named
/// types are passed through untouched.
pub(crate) fn coerce(document: &OperationDocument, supplied: &Variables) -> Result<Variables, VariableError> {
    if let Some(variable) = supplied.keys().find(|name| document.variable(name).is_none()) {
        return Err(VariableError::Undeclared {
            operation: document.name().to_owned(),
            variable: variable.clone(),
        });
    }

    let mut coerced = Variables::new();

    for definition in document.variables() {
        let value = supplied.get(&definition.name);

        if definition.is_required() && matches!(value, None | Some(Value::Null)) {
            return Err(VariableError::MissingRequired {
                operation: document.name().to_owned(),
                variable: definition.name.clone(),
                ty: definition.ty.to_string(),
            });
        }

        let Some(value) = value else {
            continue;
        };

        let value = coerce_value(&definition.ty, value).map_err(|found| VariableError::InvalidValue {
            operation: document.name().to_owned(),
            variable: definition.name.clone(),
            expected: definition.ty.to_string(),
            found,
        })?;

        coerced.insert(definition.name.clone(), value);
    }

    Ok(coerced)
}

/// Coerces a partial set of variables, as held by stub rules. Only undeclared variables and
/// values of the wrong type are errors.
pub(crate) fn coerce_subset(document: &OperationDocument, supplied: &Variables) -> Result<Variables, VariableError> {
    let mut coerced = Variables::new();

    for (name, value) in supplied {
        let Some(definition) = document.variable(name) else {
            return Err(VariableError::Undeclared {
                operation: document.name().to_owned(),
                variable: name.clone(),
            });
        };

        let value = coerce_value(&definition.ty, value).map_err(|found| VariableError::InvalidValue {
            operation: document.name().to_owned(),
            variable: name.clone(),
            expected: definition.ty.to_string(),
            found,
        })?;

        coerced.insert(name.clone(), value);
    }

    Ok(coerced)
}

/// Errors with the kind of the offending value.
fn coerce_value(ty: &TypeRef, value: &Value) -> Result<Value, &'static str> {
    match (ty, value) {
        (TypeRef::NonNull(_), Value::Null) => Err(kind_of(value)),
        (TypeRef::NonNull(inner), _) => coerce_value(inner, value),
        (_, Value::Null) => Ok(Value::Null),
        (TypeRef::List(inner), Value::Array(items)) => items
            .iter()
            .map(|item| coerce_value(inner, item))
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Array),
        // A single value is accepted where a list is expected.
        (TypeRef::List(inner), _) => Ok(Value::Array(vec![coerce_value(inner, value)?])),
        (TypeRef::Named(name), _) => coerce_scalar(name, value),
    }
}

fn coerce_scalar(name: &str, value: &Value) -> Result<Value, &'static str> {
    let valid = match name {
        "Int" => value.as_i64().is_some_and(|number| i32::try_from(number).is_ok()),
        "Float" => value.is_number(),
        "String" => value.is_string(),
        "Boolean" => value.is_boolean(),
        "ID" => {
            if let Some(number) = value.as_i64() {
                return Ok(Value::String(number.to_string()));
            }
            value.is_string()
        }
        _ => true,
    };

    if valid {
        Ok(value.clone())
    } else {
        Err(kind_of(value))
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(number) if number.is_f64() => "a float",
        Value::Number(_) => "an integer",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "an object",
    }
}
