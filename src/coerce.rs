//! Coercion from raw request text to declared argument types.
//!
//! Every request parameter arrives as text or as an uploaded file; the
//! declared parameter type drives how that raw material becomes a generic
//! [`Value`]. Scalar targets take the last supplied value, list targets take
//! every supplied value in order, and absent parameters fall back per kind:
//! zero-defaulting scalars read as zero or `false`, everything else as null.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use thiserror::Error;

use crate::adapt::Value;
use crate::params::RawValue;
use crate::typed::{ScalarKind, TypeDescriptor};

/// Why a raw parameter could not be coerced.
#[derive(Debug, Error)]
pub enum CoerceError {
    /// The text does not parse as the declared scalar kind. Boolean text is
    /// strict: only `true` and `false` are accepted.
    #[error("cannot interpret {value:?} as {target}")]
    Malformed { value: String, target: String },
    /// The value category is wrong for the target, for example text
    /// supplied where uploaded content is required.
    #[error("{0}")]
    InvalidArgument(String),
    /// The declared type can never be produced from request parameters.
    /// This is a registration-side defect, not a client error.
    #[error("declared type {0} cannot be produced from request parameters")]
    UnsupportedType(String),
}

/// Parses one scalar literal. Numeric kinds parse at their declared width
/// before widening, so `300` fails for `i8` rather than wrapping.
pub fn parse_scalar(kind: ScalarKind, text: &str) -> Result<Value, CoerceError> {
    let malformed = || CoerceError::Malformed {
        value: text.to_string(),
        target: kind.to_string(),
    };
    match kind {
        ScalarKind::I8 => text
            .parse::<i8>()
            .map(|v| Value::Int(i64::from(v)))
            .map_err(|_| malformed()),
        ScalarKind::I16 => text
            .parse::<i16>()
            .map(|v| Value::Int(i64::from(v)))
            .map_err(|_| malformed()),
        ScalarKind::I32 => text
            .parse::<i32>()
            .map(|v| Value::Int(i64::from(v)))
            .map_err(|_| malformed()),
        ScalarKind::I64 => text.parse::<i64>().map(Value::Int).map_err(|_| malformed()),
        ScalarKind::F32 => text
            .parse::<f32>()
            .map(|v| Value::Float(f64::from(v)))
            .map_err(|_| malformed()),
        ScalarKind::F64 => text
            .parse::<f64>()
            .map(Value::Float)
            .map_err(|_| malformed()),
        ScalarKind::Bool => match text {
            "true" => Ok(Value::Bool(true)),
            "false" => Ok(Value::Bool(false)),
            _ => Err(malformed()),
        },
        ScalarKind::Text => Ok(Value::Text(text.to_string())),
        ScalarKind::Instant => {
            let millis = text.parse::<i64>().map_err(|_| malformed())?;
            Utc.timestamp_millis_opt(millis)
                .single()
                .map(Value::Instant)
                .ok_or_else(malformed)
        }
        ScalarKind::Date => text
            .parse::<NaiveDate>()
            .map(Value::Date)
            .map_err(|_| malformed()),
        ScalarKind::Time => text
            .parse::<NaiveTime>()
            .map(Value::Time)
            .map_err(|_| malformed()),
        ScalarKind::DateTime => text
            .parse::<NaiveDateTime>()
            .map(Value::DateTime)
            .map_err(|_| malformed()),
    }
}

/// Coerces the supplied values for one declared parameter.
///
/// `values` is everything the request supplied under the parameter's name,
/// in arrival order, or `None` when the name was absent.
pub fn coerce(values: Option<&[RawValue]>, target: &TypeDescriptor) -> Result<Value, CoerceError> {
    match target {
        TypeDescriptor::List(element) => {
            if !matches!(
                element.as_ref(),
                TypeDescriptor::Scalar(_) | TypeDescriptor::FileLocator
            ) {
                return Err(unsupported_target(target));
            }
            let Some(values) = values else {
                return Ok(Value::seq(Vec::new()));
            };
            let mut items = Vec::with_capacity(values.len());
            for raw in values {
                items.push(coerce_present(raw, element)?);
            }
            Ok(Value::seq(items))
        }
        _ => coerce_one(values.and_then(|values| values.last()), target),
    }
}

fn coerce_one(raw: Option<&RawValue>, target: &TypeDescriptor) -> Result<Value, CoerceError> {
    match target {
        TypeDescriptor::Scalar(kind) => match raw {
            Some(raw) => parse_scalar(*kind, &raw.as_text()),
            None => Ok(absent_scalar(*kind)),
        },
        TypeDescriptor::Optional(inner) => match raw {
            Some(raw) => coerce_present(raw, inner),
            None => Ok(Value::Null),
        },
        TypeDescriptor::FileLocator => match raw {
            Some(raw) => locator_from(raw),
            None => Ok(Value::Null),
        },
        other => Err(unsupported_target(other)),
    }
}

fn coerce_present(raw: &RawValue, target: &TypeDescriptor) -> Result<Value, CoerceError> {
    match target {
        TypeDescriptor::Scalar(kind) => parse_scalar(*kind, &raw.as_text()),
        TypeDescriptor::FileLocator => locator_from(raw),
        other => Err(unsupported_target(other)),
    }
}

fn absent_scalar(kind: ScalarKind) -> Value {
    if !kind.zero_defaulting() {
        return Value::Null;
    }
    match kind {
        ScalarKind::F32 | ScalarKind::F64 => Value::Float(0.0),
        ScalarKind::Bool => Value::Bool(false),
        _ => Value::Int(0),
    }
}

fn locator_from(raw: &RawValue) -> Result<Value, CoerceError> {
    match raw {
        RawValue::File(handle) => handle
            .locator()
            .map(Value::Locator)
            .ok_or_else(|| CoerceError::InvalidArgument("uploaded file has no usable path".into())),
        RawValue::Text(_) => Err(CoerceError::InvalidArgument(
            "file parameter requires uploaded content, not text".into(),
        )),
    }
}

fn unsupported_target(target: &TypeDescriptor) -> CoerceError {
    CoerceError::UnsupportedType(target.to_string())
}
