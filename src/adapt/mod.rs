//! # Adapt Module
//!
//! Bidirectional, lazily evaluated adaptation between typed Rust data and
//! generic string-keyed values.
//!
//! ## Overview
//!
//! The module has two directions:
//!
//! - **Read direction** ([`wrap`]): presents a typed object graph as a
//!   generic, read-only [`MapView`]. Property keys derive from accessor
//!   names once per concrete type and the resulting table is cached
//!   process-wide; nested objects, sequences, and maps are re-wrapped
//!   per access, never copied eagerly.
//! - **Write direction** ([`materialize`]): produces a typed value from
//!   generic data and a [`TypeDescriptor`](crate::typed::TypeDescriptor).
//!   Scalars go through the coercion grammar, lists and maps become lazy
//!   typed views, and shapes become dynamically dispatched [`ShapeView`]s
//!   that re-run materialization on every property read.
//!
//! Both directions share the [`Value`] representation, which an external
//! serializer can walk through its `serde::Serialize` impl.
//!
//! ## Example
//!
//! ```rust,ignore
//! use webrpc::adapt::{wrap, materialize};
//! use webrpc::typed::Describe;
//!
//! #[derive(webrpc::Adapt, Clone)]
//! struct Account {
//!     name: String,
//!     active: bool,
//! }
//!
//! let generic = wrap(Account { name: "abc".into(), active: true })?;
//! // {"name": "abc", "active": true}
//! let typed = materialize(&generic, &Account::type_descriptor())?;
//! ```

mod bean;
mod error;
mod generic;
mod materialize;

pub use bean::{
    derive_key, wrap, wrap_arc, AccessorTable, Adaptable, PropertyDescriptor, ReadFn,
};
pub use error::{receiver_mismatch, AccessorError, AdaptError};
pub use generic::{MapSource, MapView, SeqIter, SeqSource, SeqView, ToGeneric, Value};
pub use materialize::{materialize, ShapeView, TypedMap, TypedSeq, TypedSeqIter, TypedValue};
