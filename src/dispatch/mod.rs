//! # Dispatcher Module
//!
//! The dispatcher composes the full request pipeline: resolve the path in
//! the router, select the best-matching handler for the supplied parameter
//! names, coerce raw values into the handler's declared argument types, and
//! invoke the handler body.
//!
//! ## Overview
//!
//! The dispatcher is responsible for:
//! - Translating router misses into protocol-level error kinds
//! - Closest-match selection among overloaded handler signatures
//! - Argument coercion against each declared parameter type
//! - Threading per-request context (verb, path, captured keys) into the
//!   handler, never through ambient state
//! - Distinguishing pre-commit from post-commit failure so hosts know
//!   whether a structured error response is still possible
//!
//! ## Example
//!
//! ```rust,ignore
//! use webrpc::dispatch::{DetachedResponse, Dispatcher};
//! use webrpc::params::ParameterSet;
//!
//! let dispatcher = Dispatcher::new(router);
//!
//! let mut params = ParameterSet::new();
//! params.insert_text("a", "2");
//! params.insert_text("b", "4");
//!
//! let outcome = dispatcher.dispatch("get", "/math/sum", params, &DetachedResponse)?;
//! ```
//!
//! Uploaded files travel inside the [`ParameterSet`](crate::params::ParameterSet)
//! and are released when it drops at the end of the dispatch, on success and
//! failure alike.

mod core;
mod select;

pub use core::{
    DetachedResponse, DispatchError, DispatchOutcome, Dispatcher, RequestContext, ResponseChannel,
};
pub use select::select;
