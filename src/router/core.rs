//! Router core - registration-time tree construction and request-time
//! resolution.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use http::Method;
use smallvec::SmallVec;
use thiserror::Error;
use tracing::{debug, info};

use crate::handler::HandlerDescriptor;

/// Reserved path segment matching any literal value.
pub const WILDCARD: &str = "?";

/// Maximum number of captured wildcard keys before heap allocation.
/// Deeply parameterized routes beyond this depth still work, they just
/// spill to the heap.
pub const MAX_INLINE_KEYS: usize = 4;

/// Stack-allocated storage for captured wildcard values, in traversal
/// order.
pub type KeyVec = SmallVec<[String; MAX_INLINE_KEYS]>;

#[derive(Debug, Default)]
struct ResourceNode {
    children: HashMap<String, ResourceNode>,
    wildcard: Option<Box<ResourceNode>>,
    verbs: HashMap<String, Vec<Arc<HandlerDescriptor>>>,
}

/// What to do when a registration repeats an existing verb, path, and
/// parameter name set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DuplicatePolicy {
    /// The second registration fails. Default, since the selector could
    /// never pick the later handler anyway.
    #[default]
    Reject,
    /// The newer handler replaces the older one in place, keeping its
    /// position in the registration order.
    Replace,
}

/// Registration-time failures. All of these are configuration defects
/// caught while building the router, never per request.
#[derive(Debug, Error)]
pub enum RegisterError {
    #[error("{verb} {path} already has a handler with this parameter set")]
    DuplicateHandler { verb: String, path: String },
    #[error("handler {handler} declares parameter {name} more than once")]
    DuplicateParameter { handler: String, name: String },
    #[error("handler {handler} declares parameter {name} with type {ty}, which cannot be coerced from request parameters")]
    UnsupportedParameterType {
        handler: String,
        name: String,
        ty: String,
    },
}

/// Resolution failures, translated by the host into protocol statuses.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ResolveError {
    #[error("no resource registered at {path}")]
    NotFound { path: String },
    #[error("resource {path} does not support {verb}")]
    MethodNotAllowed { verb: String, path: String },
}

/// Result of resolving a request path.
///
/// Carries every handler registered for the verb at the terminal node, in
/// registration order, plus the wildcard values captured on the way down.
/// Selecting among the handlers is the dispatcher's job.
#[derive(Debug, Clone)]
pub struct RouteMatch {
    pub handlers: Vec<Arc<HandlerDescriptor>>,
    pub keys: KeyVec,
}

/// Builds the resource tree. Registration happens single-threaded at
/// startup; [`RouterBuilder::build`] freezes the tree into a shareable
/// [`Router`].
#[derive(Debug, Default)]
pub struct RouterBuilder {
    root: ResourceNode,
    policy: DuplicatePolicy,
}

impl RouterBuilder {
    #[must_use]
    pub fn new() -> Self {
        RouterBuilder::default()
    }

    pub fn duplicate_policy(&mut self, policy: DuplicatePolicy) -> &mut Self {
        self.policy = policy;
        self
    }

    /// Registers `handler` under `method` and `template`.
    ///
    /// The template is split on `/`, skipping empty segments; each literal
    /// segment descends into (creating if absent) the matching child, and
    /// the `?` token descends into the node's single wildcard child. The
    /// verb is normalized to lower case.
    ///
    /// # Errors
    ///
    /// Fails when the handler declares a duplicate or non-coercible
    /// parameter, or when an identical `(verb, path, parameter set)`
    /// registration already exists and the policy is
    /// [`DuplicatePolicy::Reject`].
    pub fn route(
        &mut self,
        method: Method,
        template: &str,
        handler: HandlerDescriptor,
    ) -> Result<&mut Self, RegisterError> {
        validate_parameters(&handler)?;
        let verb = method.as_str().to_ascii_lowercase();

        let mut node = &mut self.root;
        for segment in template.split('/').filter(|s| !s.is_empty()) {
            node = if segment == WILDCARD {
                node.wildcard.get_or_insert_with(Box::default)
            } else {
                node.children.entry(segment.to_string()).or_default()
            };
        }

        let names: BTreeSet<&str> = handler.parameter_names().collect();
        let handlers = node.verbs.entry(verb.clone()).or_default();
        let existing = handlers
            .iter()
            .position(|h| h.parameter_names().collect::<BTreeSet<&str>>() == names);

        if let Some(position) = existing {
            match self.policy {
                DuplicatePolicy::Reject => {
                    return Err(RegisterError::DuplicateHandler {
                        verb,
                        path: template.to_string(),
                    });
                }
                DuplicatePolicy::Replace => {
                    info!(
                        verb = %verb,
                        path = %template,
                        handler = %handler.name(),
                        "Replaced handler registration"
                    );
                    handlers[position] = Arc::new(handler);
                    return Ok(self);
                }
            }
        }

        info!(
            verb = %verb,
            path = %template,
            handler = %handler.name(),
            parameters = handler.parameters().len(),
            "Registered handler"
        );
        handlers.push(Arc::new(handler));
        Ok(self)
    }

    /// Freezes the tree. No further registration is possible afterwards.
    #[must_use]
    pub fn build(self) -> Router {
        Router {
            root: Arc::new(self.root),
        }
    }
}

fn validate_parameters(handler: &HandlerDescriptor) -> Result<(), RegisterError> {
    let mut seen = BTreeSet::new();
    for parameter in handler.parameters() {
        if !seen.insert(parameter.name.as_str()) {
            return Err(RegisterError::DuplicateParameter {
                handler: handler.name().to_string(),
                name: parameter.name.clone(),
            });
        }
        if !parameter.ty.is_coercible() {
            return Err(RegisterError::UnsupportedParameterType {
                handler: handler.name().to_string(),
                name: parameter.name.clone(),
                ty: parameter.ty.to_string(),
            });
        }
    }
    Ok(())
}

/// Immutable resource tree, shared read-only by all request threads.
#[derive(Debug, Clone)]
pub struct Router {
    root: Arc<ResourceNode>,
}

impl Router {
    #[must_use]
    pub fn builder() -> RouterBuilder {
        RouterBuilder::new()
    }

    /// Resolves a request path to its candidate handlers.
    ///
    /// Walks the path segment by segment. Literal children win over the
    /// wildcard child at every step, and descent is greedy: there is no
    /// backtracking into the wildcard subtree when a literal branch dead
    /// ends further down. Each wildcard hop captures the literal segment
    /// value, in traversal order. The empty path resolves to the root node.
    ///
    /// # Errors
    ///
    /// [`ResolveError::NotFound`] when a segment matches neither a literal
    /// nor a wildcard child; [`ResolveError::MethodNotAllowed`] when the
    /// terminal node has no handlers for the verb.
    pub fn resolve(&self, verb: &str, path: &str) -> Result<RouteMatch, ResolveError> {
        let mut node = self.root.as_ref();
        let mut keys = KeyVec::new();
        for segment in path.split('/').filter(|s| !s.is_empty()) {
            node = if let Some(child) = node.children.get(segment) {
                child
            } else if let Some(wildcard) = node.wildcard.as_deref() {
                keys.push(segment.to_string());
                wildcard
            } else {
                debug!(verb = %verb, path = %path, segment = %segment, "No resource for path");
                return Err(ResolveError::NotFound {
                    path: path.to_string(),
                });
            };
        }

        let verb_key = verb.to_ascii_lowercase();
        match node.verbs.get(&verb_key) {
            Some(handlers) if !handlers.is_empty() => {
                debug!(
                    verb = %verb_key,
                    path = %path,
                    candidates = handlers.len(),
                    keys = ?keys,
                    "Resolved route"
                );
                Ok(RouteMatch {
                    handlers: handlers.clone(),
                    keys,
                })
            }
            _ => {
                debug!(verb = %verb_key, path = %path, "Verb not registered for path");
                Err(ResolveError::MethodNotAllowed {
                    verb: verb_key,
                    path: path.to_string(),
                })
            }
        }
    }
}
