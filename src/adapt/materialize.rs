use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use url::Url;

use super::bean::derive_key;
use super::error::AdaptError;
use super::generic::{MapView, SeqView, Value};
use crate::coerce::parse_scalar;
use crate::typed::{ScalarKind, ShapeDescriptor, TypeDescriptor};

/// A typed reading of generic data.
///
/// Scalars materialize by value; `List`, `Map`, and `Shaped` stay lazy and
/// re-run materialization against their backing view on every read, so a
/// changed backing value is visible on the next access.
#[derive(Debug, Clone)]
pub enum TypedValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Instant(DateTime<Utc>),
    Date(NaiveDate),
    Time(NaiveTime),
    DateTime(NaiveDateTime),
    Locator(Url),
    List(TypedSeq),
    Map(TypedMap),
    Shaped(ShapeView),
}

impl TypedValue {
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, TypedValue::Null)
    }

    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            TypedValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            TypedValue::Int(i) => Some(*i),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            TypedValue::Float(f) => Some(*f),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            TypedValue::Text(t) => Some(t),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_list(&self) -> Option<&TypedSeq> {
        match self {
            TypedValue::List(seq) => Some(seq),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_map(&self) -> Option<&TypedMap> {
        match self {
            TypedValue::Map(map) => Some(map),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_shaped(&self) -> Option<&ShapeView> {
        match self {
            TypedValue::Shaped(view) => Some(view),
            _ => None,
        }
    }
}

// Scalar variants compare by value; the lazy views never compare equal since
// their contents are a function of the backing data at read time.
impl PartialEq for TypedValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (TypedValue::Null, TypedValue::Null) => true,
            (TypedValue::Bool(a), TypedValue::Bool(b)) => a == b,
            (TypedValue::Int(a), TypedValue::Int(b)) => a == b,
            (TypedValue::Float(a), TypedValue::Float(b)) => a == b,
            (TypedValue::Text(a), TypedValue::Text(b)) => a == b,
            (TypedValue::Instant(a), TypedValue::Instant(b)) => a == b,
            (TypedValue::Date(a), TypedValue::Date(b)) => a == b,
            (TypedValue::Time(a), TypedValue::Time(b)) => a == b,
            (TypedValue::DateTime(a), TypedValue::DateTime(b)) => a == b,
            (TypedValue::Locator(a), TypedValue::Locator(b)) => a == b,
            _ => false,
        }
    }
}

/// Lazy list reading of a generic sequence; elements materialize per access.
#[derive(Debug, Clone)]
pub struct TypedSeq {
    source: SeqView,
    element: TypeDescriptor,
}

impl TypedSeq {
    #[must_use]
    pub fn len(&self) -> usize {
        self.source.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.source.is_empty()
    }

    #[must_use]
    pub fn element_type(&self) -> &TypeDescriptor {
        &self.element
    }

    pub fn get(&self, index: usize) -> Result<TypedValue, AdaptError> {
        let value = self.source.get(index)?;
        materialize(&value, &self.element)
    }

    pub fn iter(&self) -> TypedSeqIter<'_> {
        TypedSeqIter {
            seq: self,
            index: 0,
        }
    }

    /// Typed views are read-only; always fails.
    pub fn set(&self, _index: usize, _value: TypedValue) -> Result<(), AdaptError> {
        Err(AdaptError::read_only())
    }

    /// Typed views are read-only; always fails.
    pub fn push(&self, _value: TypedValue) -> Result<(), AdaptError> {
        Err(AdaptError::read_only())
    }
}

pub struct TypedSeqIter<'a> {
    seq: &'a TypedSeq,
    index: usize,
}

impl Iterator for TypedSeqIter<'_> {
    type Item = Result<TypedValue, AdaptError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.index >= self.seq.len() {
            return None;
        }
        let item = self.seq.get(self.index);
        self.index += 1;
        Some(item)
    }
}

/// Lazy map reading of a generic mapping; values materialize per access and
/// keys pass through unchanged.
#[derive(Debug, Clone)]
pub struct TypedMap {
    source: MapView,
    value: TypeDescriptor,
}

impl TypedMap {
    pub fn len(&self) -> Result<usize, AdaptError> {
        self.source.len()
    }

    pub fn keys(&self) -> Result<Vec<String>, AdaptError> {
        self.source.keys()
    }

    #[must_use]
    pub fn value_type(&self) -> &TypeDescriptor {
        &self.value
    }

    /// Absent keys read as the materialization of null, so a map over a
    /// zero-defaulting scalar yields zero rather than null.
    pub fn get(&self, key: &str) -> Result<TypedValue, AdaptError> {
        let value = self.source.get(key)?;
        materialize(&value, &self.value)
    }

    pub fn entries(&self) -> Result<Vec<(String, TypedValue)>, AdaptError> {
        let keys = self.keys()?;
        let mut entries = Vec::with_capacity(keys.len());
        for key in keys {
            let value = self.get(&key)?;
            entries.push((key, value));
        }
        Ok(entries)
    }

    /// Typed views are read-only; always fails.
    pub fn insert(&self, _key: String, _value: TypedValue) -> Result<(), AdaptError> {
        Err(AdaptError::read_only())
    }

    /// Typed views are read-only; always fails.
    pub fn remove(&self, _key: &str) -> Result<(), AdaptError> {
        Err(AdaptError::read_only())
    }
}

/// Shape-typed reading of a generic mapping.
///
/// Each property read derives the property's mapping key, looks it up in the
/// backing view, and materializes the result against the property's declared
/// type. Nothing is copied up front; repeated reads observe the backing
/// data as it is now.
#[derive(Debug, Clone)]
pub struct ShapeView {
    source: MapView,
    shape: &'static ShapeDescriptor,
}

impl ShapeView {
    #[must_use]
    pub fn shape(&self) -> &'static ShapeDescriptor {
        self.shape
    }

    /// Reads one property by accessor name.
    pub fn get(&self, accessor: &str) -> Result<TypedValue, AdaptError> {
        let Some(property) = self.shape.property(accessor) else {
            return Err(AdaptError::UnsupportedOperation {
                reason: format!(
                    "shape {} declares no accessor {accessor:?}",
                    self.shape.name
                ),
            });
        };
        let key = match property.key {
            Some(key) => key.to_string(),
            None => derive_key(property.accessor)
                .ok_or_else(|| AdaptError::underivable(property.accessor))?,
        };
        let value = self.source.get(&key)?;
        materialize(&value, &(property.ty)())
    }
}

/// Produces a typed reading of `value` against `target`.
///
/// Values that already satisfy the target pass through; text parses with
/// the scalar coercion rules; null follows the absent-value rules, so
/// zero-defaulting scalar targets read zero or `false` and everything else
/// reads null. Container targets wrap lazily without copying.
pub fn materialize(value: &Value, target: &TypeDescriptor) -> Result<TypedValue, AdaptError> {
    match target {
        TypeDescriptor::Optional(inner) => match value {
            Value::Null => Ok(TypedValue::Null),
            _ => materialize(value, inner),
        },
        TypeDescriptor::Scalar(kind) => materialize_scalar(value, *kind),
        TypeDescriptor::FileLocator => match value {
            Value::Null => Ok(TypedValue::Null),
            Value::Locator(url) => Ok(TypedValue::Locator(url.clone())),
            other => Err(AdaptError::invalid(other.kind(), target)),
        },
        TypeDescriptor::List(element) => {
            ensure_plain(element)?;
            match value {
                Value::Null => Ok(TypedValue::Null),
                Value::Seq(view) => Ok(TypedValue::List(TypedSeq {
                    source: view.clone(),
                    element: (**element).clone(),
                })),
                other => Err(AdaptError::invalid(other.kind(), target)),
            }
        }
        TypeDescriptor::MapValue(inner) => {
            ensure_plain(inner)?;
            match value {
                Value::Null => Ok(TypedValue::Null),
                Value::Map(view) => Ok(TypedValue::Map(TypedMap {
                    source: view.clone(),
                    value: (**inner).clone(),
                })),
                other => Err(AdaptError::invalid(other.kind(), target)),
            }
        }
        TypeDescriptor::Shape(shape) => match value {
            Value::Null => Ok(TypedValue::Null),
            Value::Map(view) => Ok(TypedValue::Shaped(ShapeView {
                source: view.clone(),
                shape,
            })),
            other => Err(AdaptError::invalid(other.kind(), target)),
        },
    }
}

// One level of element/value typing only; a parameterized type nested in
// another parameterized type is outside the grammar.
fn ensure_plain(element: &TypeDescriptor) -> Result<(), AdaptError> {
    match element {
        TypeDescriptor::List(_) | TypeDescriptor::MapValue(_) | TypeDescriptor::Optional(_) => {
            Err(AdaptError::unsupported(element))
        }
        _ => Ok(()),
    }
}

fn materialize_scalar(value: &Value, kind: ScalarKind) -> Result<TypedValue, AdaptError> {
    if let Value::Null = value {
        return Ok(absent_scalar(kind));
    }
    if let Value::Text(text) = value {
        if kind != ScalarKind::Text {
            let parsed = parse_scalar(kind, text)
                .map_err(|_| AdaptError::invalid(format!("text {text:?}"), kind))?;
            return lift_parsed(parsed, kind);
        }
        return Ok(TypedValue::Text(text.clone()));
    }
    match kind {
        ScalarKind::I8 | ScalarKind::I16 | ScalarKind::I32 | ScalarKind::I64 => {
            let int = match value {
                Value::Int(i) => *i,
                Value::Float(f) => *f as i64,
                other => return Err(AdaptError::invalid(other.kind(), kind)),
            };
            if in_width(int, kind) {
                Ok(TypedValue::Int(int))
            } else {
                Err(AdaptError::invalid(format!("int {int}"), kind))
            }
        }
        ScalarKind::F32 => match value {
            Value::Int(i) => Ok(TypedValue::Float(f64::from(*i as f32))),
            Value::Float(f) => Ok(TypedValue::Float(f64::from(*f as f32))),
            other => Err(AdaptError::invalid(other.kind(), kind)),
        },
        ScalarKind::F64 => match value {
            Value::Int(i) => Ok(TypedValue::Float(*i as f64)),
            Value::Float(f) => Ok(TypedValue::Float(*f)),
            other => Err(AdaptError::invalid(other.kind(), kind)),
        },
        ScalarKind::Bool => match value {
            Value::Bool(b) => Ok(TypedValue::Bool(*b)),
            other => Err(AdaptError::invalid(other.kind(), kind)),
        },
        ScalarKind::Text => match value {
            Value::Text(t) => Ok(TypedValue::Text(t.clone())),
            other => Err(AdaptError::invalid(other.kind(), kind)),
        },
        ScalarKind::Instant => match value {
            Value::Instant(dt) => Ok(TypedValue::Instant(*dt)),
            Value::Int(millis) => DateTime::from_timestamp_millis(*millis)
                .map(TypedValue::Instant)
                .ok_or_else(|| AdaptError::invalid(format!("int {millis}"), kind)),
            other => Err(AdaptError::invalid(other.kind(), kind)),
        },
        ScalarKind::Date => match value {
            Value::Date(d) => Ok(TypedValue::Date(*d)),
            other => Err(AdaptError::invalid(other.kind(), kind)),
        },
        ScalarKind::Time => match value {
            Value::Time(t) => Ok(TypedValue::Time(*t)),
            other => Err(AdaptError::invalid(other.kind(), kind)),
        },
        ScalarKind::DateTime => match value {
            Value::DateTime(dt) => Ok(TypedValue::DateTime(*dt)),
            other => Err(AdaptError::invalid(other.kind(), kind)),
        },
    }
}

fn absent_scalar(kind: ScalarKind) -> TypedValue {
    if !kind.zero_defaulting() {
        return TypedValue::Null;
    }
    match kind {
        ScalarKind::F32 | ScalarKind::F64 => TypedValue::Float(0.0),
        ScalarKind::Bool => TypedValue::Bool(false),
        _ => TypedValue::Int(0),
    }
}

fn in_width(int: i64, kind: ScalarKind) -> bool {
    match kind {
        ScalarKind::I8 => i8::try_from(int).is_ok(),
        ScalarKind::I16 => i16::try_from(int).is_ok(),
        ScalarKind::I32 => i32::try_from(int).is_ok(),
        _ => true,
    }
}

fn lift_parsed(parsed: Value, kind: ScalarKind) -> Result<TypedValue, AdaptError> {
    match parsed {
        Value::Bool(b) => Ok(TypedValue::Bool(b)),
        Value::Int(i) => Ok(TypedValue::Int(i)),
        Value::Float(f) => Ok(TypedValue::Float(f)),
        Value::Text(t) => Ok(TypedValue::Text(t)),
        Value::Instant(v) => Ok(TypedValue::Instant(v)),
        Value::Date(v) => Ok(TypedValue::Date(v)),
        Value::Time(v) => Ok(TypedValue::Time(v)),
        Value::DateTime(v) => Ok(TypedValue::DateTime(v)),
        other => Err(AdaptError::invalid(other.kind(), kind)),
    }
}
