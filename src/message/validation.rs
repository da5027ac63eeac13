use serde_json::{Map, Number, Value};
use thiserror::Error;

use super::UpscaleRequest;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("message must be a JSON object")]
    NotAnObject,
    #[error("'{0}' is a required property")]
    MissingField(&'static str),
    #[error("'{field}' must be of type {expected}")]
    WrongType {
        field: &'static str,
        expected: &'static str,
    },
}

/// Check the message shape and extract the request.
///
/// Integers follow JSON Schema semantics: any number without a fractional part,
/// so `1024.0` and `2^63` pass while `1024.5`, `"1024"` and `true` do not.
/// The range is not limited to `i64`.
pub fn validate_message(message: &Value) -> Result<UpscaleRequest, ValidationError> {
    let object = message.as_object().ok_or(ValidationError::NotAnObject)?;

    let width = integer_field(object, "width")?;
    let height = integer_field(object, "height")?;
    let image_data = string_field(object, "image_data")?;

    Ok(UpscaleRequest {
        width,
        height,
        image_data,
    })
}

fn integer_field(object: &Map<String, Value>, field: &'static str) -> Result<Number, ValidationError> {
    match object.get(field) {
        None => Err(ValidationError::MissingField(field)),
        Some(Value::Number(number)) if is_integer(number) => Ok(number.clone()),
        Some(_) => Err(ValidationError::WrongType {
            field,
            expected: "integer",
        }),
    }
}

fn string_field(object: &Map<String, Value>, field: &'static str) -> Result<String, ValidationError> {
    match object.get(field) {
        None => Err(ValidationError::MissingField(field)),
        Some(Value::String(value)) => Ok(value.clone()),
        Some(_) => Err(ValidationError::WrongType {
            field,
            expected: "string",
        }),
    }
}

fn is_integer(number: &Number) -> bool {
    if number.is_i64() || number.is_u64() {
        return true;
    }

    number.as_f64().is_some_and(|value| value.is_finite() && value.fract() == 0.0)
}
