//! # Router Module
//!
//! The router module maps verb + path pairs onto registered handler
//! descriptors. Paths are organized as a resource tree: one node per literal
//! segment, with at most one wildcard child per node capturing arbitrary
//! segment values positionally.
//!
//! ## Overview
//!
//! The router is responsible for:
//! - Building the resource tree from registered route templates
//! - Resolving incoming request paths to candidate handler lists
//! - Capturing wildcard segment values in traversal order
//! - Rejecting structurally invalid registrations up front
//!
//! ## Architecture
//!
//! The router uses a two-phase approach:
//!
//! 1. **Registration**: [`RouterBuilder`] splits each template on `/` and
//!    descends the tree, creating literal children as needed; the reserved
//!    `?` token descends into the node's single wildcard child. The handler
//!    is appended to the terminal node's per-verb list.
//!
//! 2. **Resolution**: [`Router::resolve`] walks the request path segment by
//!    segment, preferring literal children and falling back to the wildcard
//!    child, then looks up the verb at the terminal node. The built tree is
//!    immutable and shared read-only across request threads.
//!
//! ## Example
//!
//! ```rust,ignore
//! use http::Method;
//! use webrpc::router::RouterBuilder;
//!
//! let mut builder = RouterBuilder::new();
//! builder.route(Method::GET, "/users/?/roles", handler)?;
//! let router = builder.build();
//!
//! let matched = router.resolve("get", "/users/42/roles")?;
//! assert_eq!(matched.keys.as_slice(), ["42"]);
//! ```

mod core;
#[cfg(test)]
mod tests;

pub use core::{
    DuplicatePolicy, KeyVec, RegisterError, ResolveError, RouteMatch, Router, RouterBuilder,
    MAX_INLINE_KEYS, WILDCARD,
};
