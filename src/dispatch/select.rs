use std::collections::HashSet;
use std::sync::Arc;

use crate::handler::HandlerDescriptor;

/// Picks the closest-matching handler for the supplied parameter names.
///
/// A handler is eligible only when every supplied name appears among its
/// declared parameters; unknown names disqualify. The score is the number
/// of declared parameters the request left unsupplied, and the lowest score
/// wins. Exact ties keep the earlier-registered handler.
#[must_use]
pub fn select<'a>(
    handlers: &'a [Arc<HandlerDescriptor>],
    supplied: &HashSet<&str>,
) -> Option<&'a Arc<HandlerDescriptor>> {
    let mut best: Option<&'a Arc<HandlerDescriptor>> = None;
    let mut best_score = usize::MAX;

    for handler in handlers {
        let declared = handler.parameters().len();
        if supplied.len() > declared {
            continue;
        }

        let unused = handler
            .parameter_names()
            .filter(|name| !supplied.contains(name))
            .count();

        // declared - unused counts the declared names the request actually
        // supplied; anything short of supplied.len() means an unknown name.
        if declared - unused != supplied.len() {
            continue;
        }

        if unused < best_score {
            best = Some(handler);
            best_score = unused;
        }
    }

    best
}
