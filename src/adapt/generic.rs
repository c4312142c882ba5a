use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde::ser::{Error as _, SerializeMap, SerializeSeq};
use serde::{Serialize, Serializer};
use url::Url;

use super::error::AdaptError;

/// A generic, loosely typed value.
///
/// Scalars, the four temporal kinds, and resource locators pass through
/// adaptation unchanged; sequences and mappings are lazy views that re-adapt
/// their contents on every access. Integers widen to `i64` and floats to
/// `f64` regardless of the declared width they were coerced from.
#[derive(Clone)]
pub enum Value {
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
    Seq(SeqView),
    Map(MapView),
}

impl Value {
    /// An owned sequence over already-generic values.
    #[must_use]
    pub fn seq(values: Vec<Value>) -> Self {
        Value::Seq(SeqView::new(Arc::new(OwnedSeq(values))))
    }

    /// An owned, insertion-ordered mapping over already-generic values.
    #[must_use]
    pub fn map(entries: Vec<(String, Value)>) -> Self {
        Value::Map(MapView::new(Arc::new(OwnedMap(entries))))
    }

    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(t) => Some(t),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_seq(&self) -> Option<&SeqView> {
        match self {
            Value::Seq(v) => Some(v),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_map(&self) -> Option<&MapView> {
        match self {
            Value::Map(m) => Some(m),
            _ => None,
        }
    }

    /// Kind label used in error messages.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Text(_) => "text",
            Value::Instant(_) => "instant",
            Value::Date(_) => "date",
            Value::Time(_) => "time",
            Value::DateTime(_) => "datetime",
            Value::Locator(_) => "locator",
            Value::Seq(_) => "sequence",
            Value::Map(_) => "mapping",
        }
    }
}

/// Backing storage for a generic sequence view.
pub trait SeqSource: Send + Sync {
    fn len(&self) -> usize;
    fn get(&self, index: usize) -> Result<Value, AdaptError>;
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Backing storage for a generic mapping view. Absent keys read as null,
/// matching the lookup contract of the materializer's shape path.
pub trait MapSource: Send + Sync {
    fn keys(&self) -> Result<Vec<String>, AdaptError>;
    fn get(&self, key: &str) -> Result<Value, AdaptError>;
    fn len(&self) -> Result<usize, AdaptError> {
        Ok(self.keys()?.len())
    }
}

/// Lazy, read-only view over an ordered sequence.
#[derive(Clone)]
pub struct SeqView {
    source: Arc<dyn SeqSource>,
}

impl SeqView {
    #[must_use]
    pub fn new(source: Arc<dyn SeqSource>) -> Self {
        SeqView { source }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.source.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.source.is_empty()
    }

    /// Re-adapts the element at `index` on every call.
    pub fn get(&self, index: usize) -> Result<Value, AdaptError> {
        self.source.get(index)
    }

    pub fn iter(&self) -> SeqIter<'_> {
        SeqIter {
            view: self,
            index: 0,
        }
    }

    /// Sequence views are read-only; always fails.
    pub fn set(&self, _index: usize, _value: Value) -> Result<(), AdaptError> {
        Err(AdaptError::read_only())
    }

    /// Sequence views are read-only; always fails.
    pub fn push(&self, _value: Value) -> Result<(), AdaptError> {
        Err(AdaptError::read_only())
    }
}

pub struct SeqIter<'a> {
    view: &'a SeqView,
    index: usize,
}

impl Iterator for SeqIter<'_> {
    type Item = Result<Value, AdaptError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.index >= self.view.len() {
            return None;
        }
        let item = self.view.get(self.index);
        self.index += 1;
        Some(item)
    }
}

/// Lazy, read-only view over a string-keyed mapping.
#[derive(Clone)]
pub struct MapView {
    source: Arc<dyn MapSource>,
}

impl MapView {
    #[must_use]
    pub fn new(source: Arc<dyn MapSource>) -> Self {
        MapView { source }
    }

    pub fn len(&self) -> Result<usize, AdaptError> {
        self.source.len()
    }

    /// Key enumeration in source order (declaration order for adapted
    /// objects, insertion order for owned mappings).
    pub fn keys(&self) -> Result<Vec<String>, AdaptError> {
        self.source.keys()
    }

    /// Re-adapts the value for `key` on every call; absent keys are null.
    pub fn get(&self, key: &str) -> Result<Value, AdaptError> {
        self.source.get(key)
    }

    pub fn entries(&self) -> Result<Vec<(String, Value)>, AdaptError> {
        let keys = self.keys()?;
        let mut entries = Vec::with_capacity(keys.len());
        for key in keys {
            let value = self.get(&key)?;
            entries.push((key, value));
        }
        Ok(entries)
    }

    /// Mapping views are read-only; always fails.
    pub fn insert(&self, _key: String, _value: Value) -> Result<(), AdaptError> {
        Err(AdaptError::read_only())
    }

    /// Mapping views are read-only; always fails.
    pub fn remove(&self, _key: &str) -> Result<(), AdaptError> {
        Err(AdaptError::read_only())
    }
}

struct OwnedSeq(Vec<Value>);

impl SeqSource for OwnedSeq {
    fn len(&self) -> usize {
        self.0.len()
    }

    fn get(&self, index: usize) -> Result<Value, AdaptError> {
        self.0.get(index).cloned().ok_or(AdaptError::OutOfBounds {
            index,
            len: self.0.len(),
        })
    }
}

struct OwnedMap(Vec<(String, Value)>);

impl MapSource for OwnedMap {
    fn keys(&self) -> Result<Vec<String>, AdaptError> {
        Ok(self.0.iter().map(|(k, _)| k.clone()).collect())
    }

    fn get(&self, key: &str) -> Result<Value, AdaptError> {
        Ok(self
            .0
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.clone())
            .unwrap_or(Value::Null))
    }

    fn len(&self) -> Result<usize, AdaptError> {
        Ok(self.0.len())
    }
}

struct LazySeq<T> {
    items: Arc<Vec<T>>,
}

impl<T> SeqSource for LazySeq<T>
where
    T: ToGeneric + Send + Sync,
{
    fn len(&self) -> usize {
        self.items.len()
    }

    fn get(&self, index: usize) -> Result<Value, AdaptError> {
        self.items
            .get(index)
            .map(ToGeneric::to_generic)
            .ok_or(AdaptError::OutOfBounds {
                index,
                len: self.items.len(),
            })
    }
}

struct LazyMap<T> {
    map: Arc<HashMap<String, T>>,
}

impl<T> MapSource for LazyMap<T>
where
    T: ToGeneric + Send + Sync,
{
    fn keys(&self) -> Result<Vec<String>, AdaptError> {
        Ok(self.map.keys().cloned().collect())
    }

    fn get(&self, key: &str) -> Result<Value, AdaptError> {
        Ok(self
            .map
            .get(key)
            .map(ToGeneric::to_generic)
            .unwrap_or(Value::Null))
    }

    fn len(&self) -> Result<usize, AdaptError> {
        Ok(self.map.len())
    }
}

/// Conversion into a generic value, applied lazily per element when a
/// collection is adapted.
///
/// Scalars and temporals convert by value; collections clone one level into
/// a shared spine and re-adapt elements on access; `#[derive(Adapt)]` types
/// convert by wrapping a clone of themselves. Wrap an `Arc` around a large
/// object graph when that clone matters.
pub trait ToGeneric {
    fn to_generic(&self) -> Value;
}

impl ToGeneric for Value {
    fn to_generic(&self) -> Value {
        self.clone()
    }
}

macro_rules! to_generic_int {
    ($($ty:ty),*) => {
        $(impl ToGeneric for $ty {
            fn to_generic(&self) -> Value {
                Value::Int(i64::from(*self))
            }
        })*
    };
}

to_generic_int!(i8, i16, i32, i64);

impl ToGeneric for f32 {
    fn to_generic(&self) -> Value {
        Value::Float(f64::from(*self))
    }
}

impl ToGeneric for f64 {
    fn to_generic(&self) -> Value {
        Value::Float(*self)
    }
}

impl ToGeneric for bool {
    fn to_generic(&self) -> Value {
        Value::Bool(*self)
    }
}

impl ToGeneric for String {
    fn to_generic(&self) -> Value {
        Value::Text(self.clone())
    }
}

impl ToGeneric for DateTime<Utc> {
    fn to_generic(&self) -> Value {
        Value::Instant(*self)
    }
}

impl ToGeneric for NaiveDate {
    fn to_generic(&self) -> Value {
        Value::Date(*self)
    }
}

impl ToGeneric for NaiveTime {
    fn to_generic(&self) -> Value {
        Value::Time(*self)
    }
}

impl ToGeneric for NaiveDateTime {
    fn to_generic(&self) -> Value {
        Value::DateTime(*self)
    }
}

impl ToGeneric for Url {
    fn to_generic(&self) -> Value {
        Value::Locator(self.clone())
    }
}

impl<T: ToGeneric> ToGeneric for Option<T> {
    fn to_generic(&self) -> Value {
        match self {
            Some(value) => value.to_generic(),
            None => Value::Null,
        }
    }
}

impl<T: ToGeneric + ?Sized> ToGeneric for Arc<T> {
    fn to_generic(&self) -> Value {
        (**self).to_generic()
    }
}

impl<T: ToGeneric + ?Sized> ToGeneric for Box<T> {
    fn to_generic(&self) -> Value {
        (**self).to_generic()
    }
}

impl<T> ToGeneric for Vec<T>
where
    T: ToGeneric + Clone + Send + Sync + 'static,
{
    fn to_generic(&self) -> Value {
        Value::Seq(SeqView::new(Arc::new(LazySeq {
            items: Arc::new(self.clone()),
        })))
    }
}

impl<T> ToGeneric for HashMap<String, T>
where
    T: ToGeneric + Clone + Send + Sync + 'static,
{
    fn to_generic(&self) -> Value {
        Value::Map(MapView::new(Arc::new(LazyMap {
            map: Arc::new(self.clone()),
        })))
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(i64::from(v))
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl From<serde_json::Value> for Value {
    fn from(v: serde_json::Value) -> Self {
        match v {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Value::Int(i)
                } else {
                    n.as_f64().map(Value::Float).unwrap_or(Value::Null)
                }
            }
            serde_json::Value::String(s) => Value::Text(s),
            serde_json::Value::Array(items) => {
                Value::seq(items.into_iter().map(Value::from).collect())
            }
            serde_json::Value::Object(map) => {
                Value::map(map.into_iter().map(|(k, v)| (k, Value::from(v))).collect())
            }
        }
    }
}

// The serializer seam: an external encoder walks the lazy views through
// serde. Instants encode as epoch milliseconds, the local temporal kinds as
// their ISO-8601 literals.
impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Null => serializer.serialize_unit(),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Int(i) => serializer.serialize_i64(*i),
            Value::Float(f) => serializer.serialize_f64(*f),
            Value::Text(t) => serializer.serialize_str(t),
            Value::Instant(dt) => serializer.serialize_i64(dt.timestamp_millis()),
            Value::Date(d) => serializer.collect_str(d),
            Value::Time(t) => serializer.collect_str(t),
            Value::DateTime(dt) => {
                serializer.collect_str(&dt.format("%Y-%m-%dT%H:%M:%S%.f"))
            }
            Value::Locator(url) => serializer.serialize_str(url.as_str()),
            Value::Seq(view) => {
                let mut seq = serializer.serialize_seq(Some(view.len()))?;
                for element in view.iter() {
                    let element = element.map_err(S::Error::custom)?;
                    seq.serialize_element(&element)?;
                }
                seq.end()
            }
            Value::Map(view) => {
                let keys = view.keys().map_err(S::Error::custom)?;
                let mut map = serializer.serialize_map(Some(keys.len()))?;
                for key in keys {
                    let value = view.get(&key).map_err(S::Error::custom)?;
                    map.serialize_entry(&key, &value)?;
                }
                map.end()
            }
        }
    }
}

fn seq_eq(a: &SeqView, b: &SeqView) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b.iter()).all(|(x, y)| match (x, y) {
        (Ok(x), Ok(y)) => x == y,
        _ => false,
    })
}

fn map_eq(a: &MapView, b: &MapView) -> bool {
    let (Ok(a_keys), Ok(b_keys)) = (a.keys(), b.keys()) else {
        return false;
    };
    if a_keys.len() != b_keys.len() {
        return false;
    }
    let b_set: HashSet<&str> = b_keys.iter().map(String::as_str).collect();
    a_keys.iter().all(|key| {
        b_set.contains(key.as_str())
            && matches!((a.get(key), b.get(key)), (Ok(x), Ok(y)) if x == y)
    })
}

// Structural equality: sequences compare element-wise in order, mappings
// compare key sets and per-key values. Int and Float never compare equal.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Text(a), Value::Text(b)) => a == b,
            (Value::Instant(a), Value::Instant(b)) => a == b,
            (Value::Date(a), Value::Date(b)) => a == b,
            (Value::Time(a), Value::Time(b)) => a == b,
            (Value::DateTime(a), Value::DateTime(b)) => a == b,
            (Value::Locator(a), Value::Locator(b)) => a == b,
            (Value::Seq(a), Value::Seq(b)) => seq_eq(a, b),
            (Value::Map(a), Value::Map(b)) => map_eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Debug for SeqView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut list = f.debug_list();
        for element in self.iter() {
            match element {
                Ok(value) => {
                    list.entry(&value);
                }
                Err(e) => {
                    list.entry(&format_args!("<error: {e}>"));
                }
            }
        }
        list.finish()
    }
}

impl fmt::Debug for MapView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let keys = match self.keys() {
            Ok(keys) => keys,
            Err(e) => return write!(f, "{{<error: {e}>}}"),
        };
        let mut map = f.debug_map();
        for key in keys {
            match self.get(&key) {
                Ok(value) => {
                    map.entry(&key, &value);
                }
                Err(e) => {
                    map.entry(&key, &format_args!("<error: {e}>"));
                }
            }
        }
        map.finish()
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("Null"),
            Value::Bool(b) => write!(f, "Bool({b})"),
            Value::Int(i) => write!(f, "Int({i})"),
            Value::Float(v) => write!(f, "Float({v})"),
            Value::Text(t) => write!(f, "Text({t:?})"),
            Value::Instant(dt) => write!(f, "Instant({dt})"),
            Value::Date(d) => write!(f, "Date({d})"),
            Value::Time(t) => write!(f, "Time({t})"),
            Value::DateTime(dt) => write!(f, "DateTime({dt})"),
            Value::Locator(url) => write!(f, "Locator({url})"),
            Value::Seq(view) => view.fmt(f),
            Value::Map(view) => view.fmt(f),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn owned_map_preserves_insertion_order_and_reads_lazily() {
        let value = Value::map(vec![
            ("b".to_string(), Value::from(2)),
            ("a".to_string(), Value::from(1)),
        ]);
        let map = value.as_map().unwrap();
        assert_eq!(map.keys().unwrap(), vec!["b", "a"]);
        assert_eq!(map.get("a").unwrap(), Value::Int(1));
        assert_eq!(map.get("missing").unwrap(), Value::Null);
    }

    #[test]
    fn json_values_convert_structurally() {
        let json = serde_json::json!({
            "name": "abc",
            "count": 3,
            "ratio": 1.5,
            "tags": ["x", "y"],
            "nested": {"flag": true}
        });
        let value = Value::from(json.clone());
        assert_eq!(serde_json::to_value(&value).unwrap(), json);
    }

    #[test]
    fn lazy_vec_readapts_per_access() {
        let generic = vec![1i64, 2, 3].to_generic();
        let seq = generic.as_seq().unwrap();
        assert_eq!(seq.len(), 3);
        assert_eq!(seq.get(1).unwrap(), Value::Int(2));
        assert_eq!(seq.get(1).unwrap(), Value::Int(2));
        assert!(matches!(
            seq.get(7),
            Err(AdaptError::OutOfBounds { index: 7, len: 3 })
        ));
    }

    #[test]
    fn views_reject_mutation() {
        let seq = Value::seq(vec![Value::from(1)]);
        let seq = seq.as_seq().unwrap();
        assert!(matches!(
            seq.set(0, Value::Null),
            Err(AdaptError::UnsupportedOperation { .. })
        ));
        assert!(matches!(
            seq.push(Value::Null),
            Err(AdaptError::UnsupportedOperation { .. })
        ));

        let map = Value::map(vec![("k".to_string(), Value::from(1))]);
        let map = map.as_map().unwrap();
        assert!(matches!(
            map.insert("x".to_string(), Value::Null),
            Err(AdaptError::UnsupportedOperation { .. })
        ));
        assert!(matches!(
            map.remove("k"),
            Err(AdaptError::UnsupportedOperation { .. })
        ));
    }

    #[test]
    fn equality_is_structural_and_type_strict() {
        assert_ne!(Value::Int(1), Value::Float(1.0));
        let a = Value::map(vec![
            ("x".to_string(), Value::from("1")),
            ("y".to_string(), Value::from(2)),
        ]);
        let b = Value::map(vec![
            ("y".to_string(), Value::from(2)),
            ("x".to_string(), Value::from("1")),
        ]);
        assert_eq!(a, b);
        assert_eq!(
            Value::seq(vec![Value::from(1), Value::from(2)]),
            Value::seq(vec![Value::from(1), Value::from(2)])
        );
        assert_ne!(
            Value::seq(vec![Value::from(2), Value::from(1)]),
            Value::seq(vec![Value::from(1), Value::from(2)])
        );
    }

    #[test]
    fn instants_serialize_as_epoch_millis() {
        let instant = DateTime::<Utc>::from_timestamp_millis(86_400_000).unwrap();
        let value = Value::Instant(instant);
        assert_eq!(
            serde_json::to_value(&value).unwrap(),
            serde_json::json!(86_400_000i64)
        );
        let date = Value::Date(NaiveDate::from_ymd_opt(2014, 11, 28).unwrap());
        assert_eq!(
            serde_json::to_value(&date).unwrap(),
            serde_json::json!("2014-11-28")
        );
    }
}
