use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::Arc;

use dashmap::DashMap;
use once_cell::sync::Lazy;

use super::error::{AccessorError, AdaptError};
use super::generic::{MapSource, MapView, Value};

/// Reads one property from a type-erased receiver.
pub type ReadFn = fn(&dyn Any) -> Result<Value, AccessorError>;

/// One accessor of an adaptable type, registered in declaration order.
///
/// `key` overrides the name derived from `accessor`; descriptors whose
/// accessor name does not match the derivation grammar and carry no override
/// are skipped during table construction.
#[derive(Debug, Clone, Copy)]
pub struct PropertyDescriptor {
    pub accessor: &'static str,
    pub key: Option<&'static str>,
    pub read: ReadFn,
}

/// A typed object that can present itself as a generic mapping.
///
/// Usually implemented through `#[derive(Adapt)]`; hand implementations
/// supply a static descriptor slice and a type label for error reporting.
pub trait Adaptable: Send + Sync + 'static {
    fn descriptors(&self) -> &'static [PropertyDescriptor];
    fn as_any(&self) -> &dyn Any;
    fn type_label(&self) -> &'static str;
}

/// Derives the mapping key for an accessor name.
///
/// Strips a `get` or `is` prefix (plus an optional following underscore),
/// then lowercases the first remaining character unless it begins an
/// acronym: the character stays as-is when the next one is not lowercase.
/// `getURL` becomes `URL`, `getName` becomes `name`, `get_url` becomes
/// `url`. Names without a prefix, or with nothing after it, derive no key.
#[must_use]
pub fn derive_key(accessor: &str) -> Option<String> {
    let rest = accessor
        .strip_prefix("get")
        .or_else(|| accessor.strip_prefix("is"))?;
    let rest = rest.strip_prefix('_').unwrap_or(rest);
    let mut chars = rest.chars();
    let first = chars.next()?;
    let tail = chars.as_str();
    let keep_case = tail.chars().next().is_some_and(|next| !next.is_lowercase());
    if keep_case {
        Some(rest.to_string())
    } else {
        let mut key = String::with_capacity(rest.len());
        key.extend(first.to_lowercase());
        key.push_str(tail);
        Some(key)
    }
}

struct TableEntry {
    key: String,
    accessor: &'static str,
    read: ReadFn,
}

/// Resolved key-to-accessor index for one concrete type.
pub struct AccessorTable {
    entries: Vec<TableEntry>,
    index: HashMap<String, usize>,
}

impl AccessorTable {
    fn build(
        type_label: &'static str,
        descriptors: &'static [PropertyDescriptor],
    ) -> Result<Self, AdaptError> {
        let mut entries: Vec<TableEntry> = Vec::with_capacity(descriptors.len());
        let mut index: HashMap<String, usize> = HashMap::with_capacity(descriptors.len());
        for descriptor in descriptors {
            let key = match descriptor.key {
                Some(key) => key.to_string(),
                None => match derive_key(descriptor.accessor) {
                    Some(key) => key,
                    None => continue,
                },
            };
            if let Some(&first) = index.get(&key) {
                return Err(AdaptError::DuplicateKey {
                    type_name: type_label,
                    key,
                    first: entries[first].accessor,
                    second: descriptor.accessor,
                });
            }
            index.insert(key.clone(), entries.len());
            entries.push(TableEntry {
                key,
                accessor: descriptor.accessor,
                read: descriptor.read,
            });
        }
        Ok(AccessorTable { entries, index })
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|entry| entry.key.as_str())
    }

    fn entry(&self, key: &str) -> Option<&TableEntry> {
        self.index.get(key).map(|&i| &self.entries[i])
    }
}

// Process-wide table cache keyed by concrete TypeId. Failed builds are not
// cached; a colliding type errors again on the next wrap attempt.
static ACCESSOR_TABLES: Lazy<DashMap<TypeId, Arc<AccessorTable>>> = Lazy::new(DashMap::new);

pub(crate) fn table_for(bean: &dyn Adaptable) -> Result<Arc<AccessorTable>, AdaptError> {
    let type_id = bean.as_any().type_id();
    if let Some(table) = ACCESSOR_TABLES.get(&type_id) {
        return Ok(Arc::clone(&table));
    }
    let built = Arc::new(AccessorTable::build(bean.type_label(), bean.descriptors())?);
    let entry = ACCESSOR_TABLES.entry(type_id).or_insert(built);
    Ok(Arc::clone(entry.value()))
}

struct BeanSource {
    bean: Arc<dyn Adaptable>,
}

impl MapSource for BeanSource {
    fn keys(&self) -> Result<Vec<String>, AdaptError> {
        let table = table_for(self.bean.as_ref())?;
        Ok(table.keys().map(str::to_string).collect())
    }

    fn get(&self, key: &str) -> Result<Value, AdaptError> {
        let table = table_for(self.bean.as_ref())?;
        let Some(entry) = table.entry(key) else {
            return Ok(Value::Null);
        };
        (entry.read)(self.bean.as_any()).map_err(|source| AdaptError::AccessorInvocation {
            accessor: entry.accessor,
            type_name: self.bean.type_label(),
            source,
        })
    }

    fn len(&self) -> Result<usize, AdaptError> {
        Ok(table_for(self.bean.as_ref())?.len())
    }
}

/// Wraps a typed object as a lazy generic mapping.
///
/// The accessor table is primed eagerly, so a key collision surfaces here
/// rather than on first read. Accessors themselves run on access only.
pub fn wrap<T: Adaptable>(bean: T) -> Result<Value, AdaptError> {
    let bean: Arc<dyn Adaptable> = Arc::new(bean);
    table_for(bean.as_ref())?;
    Ok(Value::Map(MapView::new(Arc::new(BeanSource { bean }))))
}

/// Wraps a shared adaptable without priming the accessor table; table
/// construction failures surface on first read instead.
#[must_use]
pub fn wrap_arc(bean: Arc<dyn Adaptable>) -> Value {
    Value::Map(MapView::new(Arc::new(BeanSource { bean })))
}

#[cfg(test)]
mod tests {
    use super::super::error::receiver_mismatch;
    use super::*;
    use anyhow::anyhow;

    #[test]
    fn key_derivation_grammar() {
        assert_eq!(derive_key("getName").as_deref(), Some("name"));
        assert_eq!(derive_key("getURL").as_deref(), Some("URL"));
        assert_eq!(derive_key("getX2").as_deref(), Some("X2"));
        assert_eq!(derive_key("getA").as_deref(), Some("a"));
        assert_eq!(derive_key("get_url").as_deref(), Some("url"));
        assert_eq!(derive_key("is_active").as_deref(), Some("active"));
        assert_eq!(derive_key("isOpen").as_deref(), Some("open"));
        assert_eq!(derive_key("get"), None);
        assert_eq!(derive_key("is"), None);
        assert_eq!(derive_key("name"), None);
    }

    struct Page {
        url: String,
        size: i64,
    }

    fn read_page_url(receiver: &dyn Any) -> Result<Value, AccessorError> {
        let page = receiver
            .downcast_ref::<Page>()
            .ok_or_else(|| receiver_mismatch("Page"))?;
        Ok(Value::Text(page.url.clone()))
    }

    fn read_page_size(receiver: &dyn Any) -> Result<Value, AccessorError> {
        let page = receiver
            .downcast_ref::<Page>()
            .ok_or_else(|| receiver_mismatch("Page"))?;
        Ok(Value::Int(page.size))
    }

    static PAGE_PROPERTIES: &[PropertyDescriptor] = &[
        PropertyDescriptor {
            accessor: "getURL",
            key: None,
            read: read_page_url,
        },
        PropertyDescriptor {
            accessor: "get_size",
            key: None,
            read: read_page_size,
        },
        PropertyDescriptor {
            accessor: "helper",
            key: None,
            read: read_page_size,
        },
    ];

    impl Adaptable for Page {
        fn descriptors(&self) -> &'static [PropertyDescriptor] {
            PAGE_PROPERTIES
        }

        fn as_any(&self) -> &dyn Any {
            self
        }

        fn type_label(&self) -> &'static str {
            "Page"
        }
    }

    #[test]
    fn wrap_exposes_declared_keys_in_order() {
        let value = wrap(Page {
            url: "file:///tmp/a".to_string(),
            size: 12,
        })
        .unwrap();
        let map = value.as_map().unwrap();
        assert_eq!(map.keys().unwrap(), vec!["URL", "size"]);
        assert_eq!(
            map.get("URL").unwrap(),
            Value::Text("file:///tmp/a".to_string())
        );
        assert_eq!(map.get("size").unwrap(), Value::Int(12));
        assert_eq!(map.get("helper").unwrap(), Value::Null);
        assert_eq!(map.get("absent").unwrap(), Value::Null);
    }

    struct Clash;

    fn read_unit(_receiver: &dyn Any) -> Result<Value, AccessorError> {
        Ok(Value::Null)
    }

    static CLASH_PROPERTIES: &[PropertyDescriptor] = &[
        PropertyDescriptor {
            accessor: "getName",
            key: None,
            read: read_unit,
        },
        PropertyDescriptor {
            accessor: "get_name",
            key: None,
            read: read_unit,
        },
    ];

    impl Adaptable for Clash {
        fn descriptors(&self) -> &'static [PropertyDescriptor] {
            CLASH_PROPERTIES
        }

        fn as_any(&self) -> &dyn Any {
            self
        }

        fn type_label(&self) -> &'static str {
            "Clash"
        }
    }

    #[test]
    fn colliding_keys_fail_at_wrap() {
        let err = wrap(Clash).unwrap_err();
        match err {
            AdaptError::DuplicateKey {
                type_name,
                key,
                first,
                second,
            } => {
                assert_eq!(type_name, "Clash");
                assert_eq!(key, "name");
                assert_eq!(first, "getName");
                assert_eq!(second, "get_name");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    struct Faulty;

    fn read_boom(_receiver: &dyn Any) -> Result<Value, AccessorError> {
        Err(anyhow!("boom"))
    }

    static FAULTY_PROPERTIES: &[PropertyDescriptor] = &[PropertyDescriptor {
        accessor: "getValue",
        key: None,
        read: read_boom,
    }];

    impl Adaptable for Faulty {
        fn descriptors(&self) -> &'static [PropertyDescriptor] {
            FAULTY_PROPERTIES
        }

        fn as_any(&self) -> &dyn Any {
            self
        }

        fn type_label(&self) -> &'static str {
            "Faulty"
        }
    }

    #[test]
    fn accessor_failures_carry_context() {
        let value = wrap(Faulty).unwrap();
        let map = value.as_map().unwrap();
        let err = map.get("value").unwrap_err();
        match err {
            AdaptError::AccessorInvocation {
                accessor,
                type_name,
                ..
            } => {
                assert_eq!(accessor, "getValue");
                assert_eq!(type_name, "Faulty");
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
