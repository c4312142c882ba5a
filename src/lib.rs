//! # webrpc
//!
//! **webrpc** exposes selected operations of a host process as
//! HTTP-addressable remote calls, and provides a bidirectional, lazily
//! evaluated adapter between typed Rust data and generic string-keyed
//! values.
//!
//! ## Overview
//!
//! The crate has two halves that meet at the dispatcher:
//!
//! 1. **Routing/dispatch** - an immutable resource tree maps verb + path to
//!    registered handlers; overloaded signatures on one route are resolved
//!    by closest match against the parameter names the request actually
//!    supplied; raw text and uploaded files are coerced into each declared
//!    argument type before the handler body runs.
//!
//! 2. **Data adaptation** - any value implementing [`adapt::Adaptable`]
//!    (usually via `#[derive(Adapt)]`) can be wrapped as a lazy, read-only
//!    generic mapping for a serializer to walk; the reverse direction
//!    materializes typed readings (scalars, lazy lists and maps, shaped
//!    views) out of generic data without copying it.
//!
//! ## Architecture
//!
//! The library is organized into several key modules:
//!
//! - **[`router`]** - resource tree construction and path resolution with
//!   wildcard capture
//! - **[`dispatch`]** - handler selection, argument coercion, invocation,
//!   and commit-aware error disposition
//! - **[`coerce`]** - the scalar/temporal/collection coercion grammar for
//!   raw request values
//! - **[`params`]** - the raw parameter multimap and request-scoped
//!   temporary file handles
//! - **[`handler`]** - handler descriptors and coerced argument access
//! - **[`adapt`]** - generic views, the per-type accessor cache, and the
//!   typed view materializer
//! - **[`typed`]** - the declared-type grammar shared by coercion and
//!   materialization
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use http::Method;
//! use webrpc::dispatch::DetachedResponse;
//! use webrpc::typed::{ScalarKind, TypeDescriptor};
//! use webrpc::{
//!     Dispatcher, HandlerDescriptor, ParameterDescriptor, ParameterSet, RouterBuilder, Value,
//! };
//!
//! let mut builder = RouterBuilder::new();
//! builder.route(
//!     Method::GET,
//!     "/math/sum",
//!     HandlerDescriptor::new(
//!         "sum",
//!         vec![
//!             ParameterDescriptor::new("a", TypeDescriptor::Scalar(ScalarKind::F64)),
//!             ParameterDescriptor::new("b", TypeDescriptor::Scalar(ScalarKind::F64)),
//!         ],
//!         |_ctx, args| {
//!             let a = args.at(0).and_then(Value::as_f64).unwrap_or(0.0);
//!             let b = args.at(1).and_then(Value::as_f64).unwrap_or(0.0);
//!             Ok(Some(Value::Float(a + b)))
//!         },
//!     ),
//! )?;
//!
//! let dispatcher = Dispatcher::new(builder.build());
//!
//! let mut params = ParameterSet::new();
//! params.insert_text("a", "2");
//! params.insert_text("b", "4");
//! let outcome = dispatcher.dispatch("get", "/math/sum", params, &DetachedResponse)?;
//! ```
//!
//! ## Adapting Typed Data
//!
//! ```rust,ignore
//! use webrpc::{wrap, Adapt};
//!
//! #[derive(Adapt, Clone)]
//! struct Pet {
//!     name: String,
//!     legs: i32,
//! }
//!
//! let view = wrap(Pet { name: "Rex".to_string(), legs: 4 })?;
//! // {"name":"Rex","legs":4}, with each property read on demand.
//! let body = serde_json::to_string(&view)?;
//! ```

pub mod adapt;
pub mod coerce;
pub mod dispatch;
pub mod handler;
pub mod params;
pub mod router;
pub mod typed;

pub use adapt::{materialize, wrap, ToGeneric, TypedValue, Value};
pub use dispatch::{
    DetachedResponse, DispatchError, DispatchOutcome, Dispatcher, RequestContext, ResponseChannel,
};
pub use handler::{Args, HandlerDescriptor, HandlerResult, ParameterDescriptor};
pub use params::{FileHandle, ParameterSet, RawValue};
pub use router::{Router, RouterBuilder};
pub use typed::{Describe, ScalarKind, ShapeDescriptor, TypeDescriptor};

pub use webrpc_macros::Adapt;
