use std::collections::HashSet;

use thiserror::Error;
use tracing::{debug, error};

use crate::adapt::Value;
use crate::coerce::{coerce, CoerceError};
use crate::handler::Args;
use crate::params::ParameterSet;
use crate::router::{KeyVec, ResolveError, Router};

use super::select::select;

/// Commit state of the outbound response stream.
///
/// The dispatcher never writes the response itself, but error disposition
/// depends on whether the external channel already sent bytes: before
/// commit a structured error response is still possible, after commit the
/// failure can only surface as a transport fault.
pub trait ResponseChannel {
    fn is_committed(&self) -> bool;
}

/// Channel for callers without a live response stream (tests, in-process
/// invocation). Never committed.
#[derive(Debug, Default, Clone, Copy)]
pub struct DetachedResponse;

impl ResponseChannel for DetachedResponse {
    fn is_committed(&self) -> bool {
        false
    }
}

/// Per-request state threaded into the handler as an argument.
#[derive(Debug, Clone)]
pub struct RequestContext {
    verb: String,
    path: String,
    handler: String,
    keys: KeyVec,
}

impl RequestContext {
    #[must_use]
    pub fn new(verb: String, path: String, handler: String, keys: KeyVec) -> Self {
        RequestContext {
            verb,
            path,
            handler,
            keys,
        }
    }

    /// Normalized (lower-case) request verb.
    #[must_use]
    pub fn verb(&self) -> &str {
        &self.verb
    }

    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    #[must_use]
    pub fn handler_name(&self) -> &str {
        &self.handler
    }

    /// Captured wildcard value at `index`, in traversal order.
    #[must_use]
    pub fn key(&self, index: usize) -> Option<&str> {
        self.keys.get(index).map(String::as_str)
    }

    #[must_use]
    pub fn keys(&self) -> &[String] {
        &self.keys
    }
}

/// Successful dispatch disposition, handed to the serialization path.
#[derive(Debug)]
pub enum DispatchOutcome {
    /// The handler produced a generic value to serialize.
    Value(Value),
    /// The handler completed without content.
    NoContent,
    /// The handler wrote the response itself; nothing left to emit.
    Committed,
}

/// Dispatch-time failures, carrying enough for a host to pick a protocol
/// status.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("no resource registered at {path}")]
    NotFound { path: String },
    #[error("resource {path} does not support {verb}")]
    MethodNotAllowed { verb: String, path: String },
    #[error("invalid argument {name}")]
    BadArgument {
        name: String,
        #[source]
        source: CoerceError,
    },
    #[error("handler {name} declares an argument outside the coercion grammar")]
    Unsupported {
        name: String,
        #[source]
        source: CoerceError,
    },
    #[error("handler {name} failed")]
    Handler {
        name: String,
        #[source]
        source: anyhow::Error,
    },
    #[error("handler {name} failed after the response was committed")]
    Fault {
        name: String,
        #[source]
        source: anyhow::Error,
    },
}

impl DispatchError {
    /// Suggested protocol status. `Fault` carries none: the stream is
    /// already committed, so no status can be written.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            DispatchError::NotFound { .. } => Some(404),
            DispatchError::MethodNotAllowed { .. } => Some(405),
            DispatchError::BadArgument { .. } => Some(400),
            DispatchError::Unsupported { .. } | DispatchError::Handler { .. } => Some(500),
            DispatchError::Fault { .. } => None,
        }
    }
}

/// Composes router resolution, handler selection, argument coercion, and
/// invocation.
#[derive(Clone)]
pub struct Dispatcher {
    router: Router,
}

impl Dispatcher {
    #[must_use]
    pub fn new(router: Router) -> Self {
        Dispatcher { router }
    }

    /// Runs one request through the pipeline.
    ///
    /// `parameters` is consumed: whatever uploaded file handles it carries
    /// are released when the dispatch returns, on every path.
    ///
    /// # Errors
    ///
    /// `NotFound` and `MethodNotAllowed` translate router misses; a
    /// candidate list where no signature accepts the supplied names is also
    /// `MethodNotAllowed`. `BadArgument` is a client-visible coercion
    /// failure, `Unsupported` a registration defect. Handler failures
    /// surface as `Handler` before the response is committed and as `Fault`
    /// after.
    pub fn dispatch(
        &self,
        verb: &str,
        path: &str,
        parameters: ParameterSet,
        response: &dyn ResponseChannel,
    ) -> Result<DispatchOutcome, DispatchError> {
        let matched = self.router.resolve(verb, path).map_err(|e| match e {
            ResolveError::NotFound { path } => DispatchError::NotFound { path },
            ResolveError::MethodNotAllowed { verb, path } => {
                DispatchError::MethodNotAllowed { verb, path }
            }
        })?;

        let supplied: HashSet<&str> = parameters.names().collect();
        let Some(handler) = select(&matched.handlers, &supplied) else {
            debug!(
                verb = %verb,
                path = %path,
                supplied = ?supplied,
                candidates = matched.handlers.len(),
                "No handler signature accepts the supplied names"
            );
            return Err(DispatchError::MethodNotAllowed {
                verb: verb.to_ascii_lowercase(),
                path: path.to_string(),
            });
        };

        let mut values = Vec::with_capacity(handler.parameters().len());
        for parameter in handler.parameters() {
            let raw = parameters.get(&parameter.name);
            let value = coerce(raw, &parameter.ty).map_err(|source| match source {
                CoerceError::UnsupportedType(_) => DispatchError::Unsupported {
                    name: handler.name().to_string(),
                    source,
                },
                _ => DispatchError::BadArgument {
                    name: parameter.name.clone(),
                    source,
                },
            })?;
            values.push((parameter.name.clone(), value));
        }

        let context = RequestContext::new(
            verb.to_ascii_lowercase(),
            path.to_string(),
            handler.name().to_string(),
            matched.keys.clone(),
        );

        debug!(
            verb = %context.verb,
            path = %path,
            handler = %context.handler,
            args = values.len(),
            "Dispatching"
        );

        match handler.invoke(&context, Args::new(values)) {
            Ok(_) if response.is_committed() => Ok(DispatchOutcome::Committed),
            Ok(Some(value)) => Ok(DispatchOutcome::Value(value)),
            Ok(None) => Ok(DispatchOutcome::NoContent),
            Err(source) if response.is_committed() => {
                error!(
                    handler = %context.handler,
                    error = %source,
                    "Handler failed after response commit"
                );
                Err(DispatchError::Fault {
                    name: context.handler,
                    source,
                })
            }
            Err(source) => {
                error!(handler = %context.handler, error = %source, "Handler failed");
                Err(DispatchError::Handler {
                    name: context.handler,
                    source,
                })
            }
        }
    }
}
