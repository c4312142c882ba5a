//! Registered operations and their declared parameter shapes.
//!
//! A [`HandlerDescriptor`] pairs an operation body with the ordered list of
//! parameters it declares. The dispatcher selects among the descriptors
//! registered on one route by comparing declared parameter names against
//! what a request actually supplied, then invokes the body with coerced
//! arguments.

use std::fmt;
use std::sync::Arc;

use crate::adapt::Value;
use crate::dispatch::RequestContext;
use crate::typed::TypeDescriptor;

/// Outcome of a handler body: a generic value for the serialization path,
/// or `None` when the operation produces no content.
pub type HandlerResult = anyhow::Result<Option<Value>>;

/// The operation body behind a descriptor.
pub type HandlerFn = Arc<dyn Fn(&RequestContext, Args) -> HandlerResult + Send + Sync>;

/// One declared parameter: request name and declared type.
#[derive(Debug, Clone)]
pub struct ParameterDescriptor {
    pub name: String,
    pub ty: TypeDescriptor,
}

impl ParameterDescriptor {
    pub fn new(name: impl Into<String>, ty: TypeDescriptor) -> Self {
        ParameterDescriptor {
            name: name.into(),
            ty,
        }
    }
}

/// A registered operation.
#[derive(Clone)]
pub struct HandlerDescriptor {
    name: String,
    parameters: Vec<ParameterDescriptor>,
    op: HandlerFn,
}

impl HandlerDescriptor {
    pub fn new(
        name: impl Into<String>,
        parameters: Vec<ParameterDescriptor>,
        op: impl Fn(&RequestContext, Args) -> HandlerResult + Send + Sync + 'static,
    ) -> Self {
        HandlerDescriptor {
            name: name.into(),
            parameters,
            op: Arc::new(op),
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared parameters in declaration order.
    #[must_use]
    pub fn parameters(&self) -> &[ParameterDescriptor] {
        &self.parameters
    }

    pub fn parameter_names(&self) -> impl Iterator<Item = &str> {
        self.parameters.iter().map(|p| p.name.as_str())
    }

    pub fn invoke(&self, context: &RequestContext, args: Args) -> HandlerResult {
        (self.op)(context, args)
    }
}

impl fmt::Debug for HandlerDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerDescriptor")
            .field("name", &self.name)
            .field("parameters", &self.parameters)
            .finish_non_exhaustive()
    }
}

/// Coerced arguments for one invocation, in declaration order.
#[derive(Debug, Clone, Default)]
pub struct Args {
    values: Vec<(String, Value)>,
}

impl Args {
    #[must_use]
    pub fn new(values: Vec<(String, Value)>) -> Self {
        Args { values }
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v)
    }

    /// Argument at declaration position `index`.
    #[must_use]
    pub fn at(&self, index: usize) -> Option<&Value> {
        self.values.get(index).map(|(_, v)| v)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    #[must_use]
    pub fn into_values(self) -> Vec<(String, Value)> {
        self.values
    }
}
