//! Static introspection of composed middleware.

use serde::Serialize;

use crate::error::Error;
use crate::meta::Meta;
use crate::middleware::Middleware;

/// One node of a reconstructed composition tree.
///
/// Serializes cleanly (empty parts are omitted), so the whole tree can be
/// dumped as JSON for diagnostics or tooling.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Node {
    /// The unit's descriptor, if it carries one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<Meta>,
    /// Nested units, in registration order. Empty for leaves.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<Node>,
}

/// Reconstructs the metadata tree beneath `root`.
///
/// Pure and synchronous: walks [`Middleware::stack`] recursively, never the
/// execution surface, so it is safe to call at any time after composition.
/// Sharing one unit across several positions is fine; a unit that (directly
/// or transitively) contains itself fails with [`Error::Cycle`] instead of
/// recursing forever.
pub fn hierarchy<C>(root: &dyn Middleware<C>) -> Result<Node, Error> {
    let mut trail = Vec::new();
    visit(root, &mut trail)
}

fn visit<C>(node: &dyn Middleware<C>, trail: &mut Vec<*const ()>) -> Result<Node, Error> {
    // Identity is the unit's data pointer. The trail only holds the current
    // path, so diamond-shaped sharing passes and genuine cycles fault.
    let id = node as *const dyn Middleware<C> as *const ();
    if trail.contains(&id) {
        return Err(Error::Cycle);
    }
    trail.push(id);

    let mut children = Vec::with_capacity(node.stack().len());
    for child in node.stack() {
        children.push(visit(child.as_ref(), trail)?);
    }

    trail.pop();
    Ok(Node { meta: node.meta().cloned(), children })
}
