//! Document validation against a [`SchemaDefinition`].
//!
//! Every rule runs and every violation is reported, not just the first.

use crate::define::{
    CREATION_TIME_FIELD, ID_FIELD, SchemaDefinition, TableDefinition, Validator,
};
use crate::whole_millis;
use serde_json::{Map, Value};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum ValidationError {
    #[error("unknown table: {table}")]
    UnknownTable { table: String },
    #[error("document must be an object, got {found}")]
    NotAnObject { found: String },
    #[error("missing required field: {field}")]
    MissingField { field: String },
    #[error("unknown field: {field}")]
    UnknownField { field: String },
    #[error("field {field}: expected {expected}, got {found}")]
    WrongType {
        field: String,
        expected: String,
        found: String,
    },
    #[error("field {field}: invalid value {value:?}, expected one of {allowed:?}")]
    InvalidLiteral {
        field: String,
        value: String,
        allowed: Vec<String>,
    },
    #[error("field {field}: must be non-negative")]
    Negative { field: String },
    #[error("field {field}: must be a whole number")]
    NotWholeNumber { field: String },
}

impl SchemaDefinition {
    /// Validate a document destined for `table`.
    pub fn validate(&self, table: &str, document: &Value) -> Result<(), Vec<ValidationError>> {
        match self.table(table) {
            Some(def) => validate_document(def, document),
            None => Err(vec![ValidationError::UnknownTable {
                table: table.to_string(),
            }]),
        }
    }
}

/// Validate a document by composing independent validators.
pub fn validate_document(
    table: &TableDefinition,
    document: &Value,
) -> Result<(), Vec<ValidationError>> {
    let Some(object) = document.as_object() else {
        return Err(vec![ValidationError::NotAnObject {
            found: json_type(document).to_string(),
        }]);
    };

    let validators: &[fn(&TableDefinition, &Map<String, Value>) -> Vec<ValidationError>] = &[
        validate_required_fields,
        validate_known_fields,
        validate_field_types,
        validate_system_fields,
        validate_non_negative,
    ];

    let errors: Vec<ValidationError> = validators
        .iter()
        .flat_map(|v| v(table, object))
        .collect();

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn validate_required_fields(
    table: &TableDefinition,
    object: &Map<String, Value>,
) -> Vec<ValidationError> {
    table
        .fields
        .iter()
        .filter(|f| !f.validator.is_optional() && !object.contains_key(f.name))
        .map(|f| ValidationError::MissingField {
            field: f.name.to_string(),
        })
        .collect()
}

fn validate_known_fields(
    table: &TableDefinition,
    object: &Map<String, Value>,
) -> Vec<ValidationError> {
    object
        .keys()
        .filter(|k| k.as_str() != ID_FIELD && k.as_str() != CREATION_TIME_FIELD)
        .filter(|k| table.field(k).is_none())
        .map(|k| ValidationError::UnknownField { field: k.clone() })
        .collect()
}

fn validate_field_types(
    table: &TableDefinition,
    object: &Map<String, Value>,
) -> Vec<ValidationError> {
    table
        .fields
        .iter()
        .filter_map(|f| {
            let value = object.get(f.name)?;
            check_value(f.name, &f.validator, value).err()
        })
        .collect()
}

fn validate_system_fields(
    _table: &TableDefinition,
    object: &Map<String, Value>,
) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    if let Some(id) = object.get(ID_FIELD) {
        if !id.is_string() {
            errors.push(wrong_type(ID_FIELD, "string", id));
        }
    }
    if let Some(time) = object.get(CREATION_TIME_FIELD) {
        if !time.is_number() {
            errors.push(wrong_type(CREATION_TIME_FIELD, "number", time));
        } else if is_negative(time) {
            errors.push(ValidationError::Negative {
                field: CREATION_TIME_FIELD.to_string(),
            });
        }
    }
    errors
}

/// Constrained number fields must be whole and `>= 0`, the range of
/// [`crate::Timestamp`].
fn validate_non_negative(
    table: &TableDefinition,
    object: &Map<String, Value>,
) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    for field in &table.non_negative {
        let Some(Value::Number(number)) = object.get(*field) else {
            continue;
        };
        if number.as_f64().is_some_and(|n| n < 0.0) {
            errors.push(ValidationError::Negative {
                field: field.to_string(),
            });
        }
        if whole_millis(number).is_none() {
            errors.push(ValidationError::NotWholeNumber {
                field: field.to_string(),
            });
        }
    }
    errors
}

/// Check a single value against a validator.
pub fn check_value(field: &str, validator: &Validator, value: &Value) -> Result<(), ValidationError> {
    match validator {
        // Absent optionals never reach here; an explicit null is not "absent".
        Validator::Optional { inner } => check_value(field, inner, value),
        Validator::String | Validator::Id { .. } => {
            if value.is_string() {
                Ok(())
            } else {
                Err(wrong_type(field, &validator.describe(), value))
            }
        }
        Validator::Number => {
            if value.is_number() {
                Ok(())
            } else {
                Err(wrong_type(field, "number", value))
            }
        }
        Validator::Union { members } if validator.literals().is_none() => {
            if members.iter().any(|m| check_value(field, m, value).is_ok()) {
                Ok(())
            } else {
                Err(wrong_type(field, &validator.describe(), value))
            }
        }
        Validator::Literal { .. } | Validator::Union { .. } => {
            let allowed = validator.literals().unwrap_or_default();
            match value.as_str() {
                Some(s) if allowed.iter().any(|a| *a == s) => Ok(()),
                Some(s) => Err(ValidationError::InvalidLiteral {
                    field: field.to_string(),
                    value: s.to_string(),
                    allowed: allowed.iter().map(|a| a.to_string()).collect(),
                }),
                None => Err(wrong_type(field, &validator.describe(), value)),
            }
        }
    }
}

fn wrong_type(field: &str, expected: &str, value: &Value) -> ValidationError {
    ValidationError::WrongType {
        field: field.to_string(),
        expected: expected.to_string(),
        found: json_type(value).to_string(),
    }
}

fn is_negative(value: &Value) -> bool {
    value.as_f64().is_some_and(|n| n < 0.0)
}

pub fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
