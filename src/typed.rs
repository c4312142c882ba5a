//! # Typed Module
//!
//! Declared-type grammar shared by the coercer, the materializer, and route
//! registration. A [`TypeDescriptor`] names the type a handler parameter or a
//! shape property expects; [`ShapeDescriptor`] groups named, individually
//! typed properties into a target shape for the materializer; [`Describe`]
//! maps ordinary Rust types onto the grammar so descriptor tables can be
//! generated ahead of time instead of inspected at run time.
//!
//! The grammar is deliberately closed: scalars and temporals, file locators,
//! one level of list/map nesting, and named shapes. Anything outside it is a
//! configuration defect surfaced at registration, not per request.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use url::Url;

/// Scalar kinds admitted by the coercion grammar.
///
/// Integer kinds parse with their own width (out-of-range text is a parse
/// failure) and widen to 64 bits in the generic representation; the same goes
/// for `F32` versus `F64`. The four temporal kinds cover an absolute instant
/// (epoch milliseconds) and the three local ISO-8601 forms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarKind {
    I8,
    I16,
    I32,
    I64,
    F32,
    F64,
    Bool,
    Text,
    Instant,
    Date,
    Time,
    DateTime,
}

impl ScalarKind {
    /// Whether absent values default to zero/false rather than null.
    #[must_use]
    pub fn zero_defaulting(&self) -> bool {
        matches!(
            self,
            ScalarKind::I8
                | ScalarKind::I16
                | ScalarKind::I32
                | ScalarKind::I64
                | ScalarKind::F32
                | ScalarKind::F64
                | ScalarKind::Bool
        )
    }
}

impl fmt::Display for ScalarKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ScalarKind::I8 => "i8",
            ScalarKind::I16 => "i16",
            ScalarKind::I32 => "i32",
            ScalarKind::I64 => "i64",
            ScalarKind::F32 => "f32",
            ScalarKind::F64 => "f64",
            ScalarKind::Bool => "bool",
            ScalarKind::Text => "text",
            ScalarKind::Instant => "instant",
            ScalarKind::Date => "date",
            ScalarKind::Time => "time",
            ScalarKind::DateTime => "datetime",
        };
        f.write_str(name)
    }
}

/// Declared type of a handler parameter or shape property.
///
/// `Scalar` carries the primitive reading of its kind (absent numeric/boolean
/// values default to zero/false); `Optional` carries the boxed reading
/// (absent defaults to null). `List` and `MapValue` take exactly one level of
/// element/value typing; `Shape` points at a static property table.
#[derive(Debug, Clone, PartialEq)]
pub enum TypeDescriptor {
    Scalar(ScalarKind),
    Optional(Box<TypeDescriptor>),
    FileLocator,
    List(Box<TypeDescriptor>),
    MapValue(Box<TypeDescriptor>),
    Shape(&'static ShapeDescriptor),
}

impl TypeDescriptor {
    /// Boxed (null-defaulting) reading of `inner`.
    #[must_use]
    pub fn optional(inner: TypeDescriptor) -> Self {
        TypeDescriptor::Optional(Box::new(inner))
    }

    /// Ordered list with the given element type.
    #[must_use]
    pub fn list(element: TypeDescriptor) -> Self {
        TypeDescriptor::List(Box::new(element))
    }

    /// String-keyed map with the given value type.
    #[must_use]
    pub fn map_value(value: TypeDescriptor) -> Self {
        TypeDescriptor::MapValue(Box::new(value))
    }

    /// Whether request parameters of this type can be coerced from raw
    /// values. List elements are restricted to scalars and file locators;
    /// map- and shape-typed parameters are outside the grammar entirely.
    #[must_use]
    pub fn is_coercible(&self) -> bool {
        match self {
            TypeDescriptor::Scalar(_) | TypeDescriptor::FileLocator => true,
            TypeDescriptor::Optional(inner) | TypeDescriptor::List(inner) => {
                matches!(**inner, TypeDescriptor::Scalar(_) | TypeDescriptor::FileLocator)
            }
            TypeDescriptor::MapValue(_) | TypeDescriptor::Shape(_) => false,
        }
    }
}

impl fmt::Display for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeDescriptor::Scalar(kind) => write!(f, "{kind}"),
            TypeDescriptor::Optional(inner) => write!(f, "optional<{inner}>"),
            TypeDescriptor::FileLocator => f.write_str("file"),
            TypeDescriptor::List(element) => write!(f, "list<{element}>"),
            TypeDescriptor::MapValue(value) => write!(f, "map<{value}>"),
            TypeDescriptor::Shape(shape) => write!(f, "shape<{}>", shape.name),
        }
    }
}

/// One named property of a shape: the accessor name its key derives from, an
/// optional explicit key override, and the property's declared type (behind
/// a function pointer so shape tables can live in statics).
#[derive(Debug, Clone, Copy)]
pub struct PropertySpec {
    pub accessor: &'static str,
    pub key: Option<&'static str>,
    pub ty: fn() -> TypeDescriptor,
}

/// A target shape: a named set of typed properties, usually generated by
/// `#[derive(Adapt)]` and referenced from statics.
#[derive(Debug)]
pub struct ShapeDescriptor {
    pub name: &'static str,
    pub properties: &'static [PropertySpec],
}

impl ShapeDescriptor {
    /// Looks up a property by accessor name.
    #[must_use]
    pub fn property(&self, accessor: &str) -> Option<&PropertySpec> {
        self.properties.iter().find(|p| p.accessor == accessor)
    }
}

// Shape descriptors live in statics; two references to the same table are
// the same shape.
impl PartialEq for ShapeDescriptor {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self, other)
    }
}

/// Maps a Rust type onto the descriptor grammar.
///
/// Implemented for the scalar and temporal primitives, [`Url`], `Option`,
/// `Vec`, and string-keyed `HashMap`; `#[derive(Adapt)]` implements it for
/// user structs with a `Shape` descriptor. Types without an impl (unsigned
/// integers, tuples, and so on) are outside the supported grammar.
pub trait Describe {
    fn type_descriptor() -> TypeDescriptor;
}

macro_rules! describe_scalar {
    ($($ty:ty => $kind:ident),* $(,)?) => {
        $(impl Describe for $ty {
            fn type_descriptor() -> TypeDescriptor {
                TypeDescriptor::Scalar(ScalarKind::$kind)
            }
        })*
    };
}

describe_scalar! {
    i8 => I8,
    i16 => I16,
    i32 => I32,
    i64 => I64,
    f32 => F32,
    f64 => F64,
    bool => Bool,
    String => Text,
    NaiveDate => Date,
    NaiveTime => Time,
    NaiveDateTime => DateTime,
}

impl Describe for DateTime<Utc> {
    fn type_descriptor() -> TypeDescriptor {
        TypeDescriptor::Scalar(ScalarKind::Instant)
    }
}

impl Describe for Url {
    fn type_descriptor() -> TypeDescriptor {
        TypeDescriptor::FileLocator
    }
}

impl<T: Describe> Describe for Option<T> {
    fn type_descriptor() -> TypeDescriptor {
        TypeDescriptor::optional(T::type_descriptor())
    }
}

impl<T: Describe> Describe for Vec<T> {
    fn type_descriptor() -> TypeDescriptor {
        TypeDescriptor::list(T::type_descriptor())
    }
}

impl<T: Describe> Describe for HashMap<String, T> {
    fn type_descriptor() -> TypeDescriptor {
        TypeDescriptor::map_value(T::type_descriptor())
    }
}

impl<T: Describe> Describe for Arc<T> {
    fn type_descriptor() -> TypeDescriptor {
        T::type_descriptor()
    }
}

impl<T: Describe> Describe for Box<T> {
    fn type_descriptor() -> TypeDescriptor {
        T::type_descriptor()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_nested_types() {
        let ty = TypeDescriptor::list(TypeDescriptor::Scalar(ScalarKind::I64));
        assert_eq!(ty.to_string(), "list<i64>");
        let ty = TypeDescriptor::optional(TypeDescriptor::Scalar(ScalarKind::Bool));
        assert_eq!(ty.to_string(), "optional<bool>");
        assert_eq!(TypeDescriptor::FileLocator.to_string(), "file");
    }

    #[test]
    fn describe_maps_rust_types() {
        assert_eq!(
            <Vec<i32>>::type_descriptor(),
            TypeDescriptor::list(TypeDescriptor::Scalar(ScalarKind::I32))
        );
        assert_eq!(
            <Option<f64>>::type_descriptor(),
            TypeDescriptor::optional(TypeDescriptor::Scalar(ScalarKind::F64))
        );
        assert_eq!(
            <HashMap<String, String>>::type_descriptor(),
            TypeDescriptor::map_value(TypeDescriptor::Scalar(ScalarKind::Text))
        );
        assert_eq!(Url::type_descriptor(), TypeDescriptor::FileLocator);
    }

    #[test]
    fn coercible_grammar() {
        assert!(TypeDescriptor::Scalar(ScalarKind::Text).is_coercible());
        assert!(TypeDescriptor::FileLocator.is_coercible());
        assert!(TypeDescriptor::optional(TypeDescriptor::Scalar(ScalarKind::I32)).is_coercible());
        assert!(TypeDescriptor::list(TypeDescriptor::FileLocator).is_coercible());
        // no nested generics inside a list
        assert!(!TypeDescriptor::list(TypeDescriptor::list(TypeDescriptor::Scalar(
            ScalarKind::I64
        )))
        .is_coercible());
        assert!(!TypeDescriptor::map_value(TypeDescriptor::Scalar(ScalarKind::Text)).is_coercible());
    }

    #[test]
    fn zero_defaulting_kinds() {
        assert!(ScalarKind::I8.zero_defaulting());
        assert!(ScalarKind::F64.zero_defaulting());
        assert!(ScalarKind::Bool.zero_defaulting());
        assert!(!ScalarKind::Text.zero_defaulting());
        assert!(!ScalarKind::Instant.zero_defaulting());
    }
}
