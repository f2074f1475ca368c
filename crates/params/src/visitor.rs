//! Depth-first traversal of a param tree
//!
//! [`traverse_params`] visits a node, then walks arrays by index and every
//! other node by the names of its sub-descriptors. Children are resolved
//! through [`Param::get_param`], so the authorizer decides what is reached.

use crate::param::Param;
use catena_core::{Authorizer, Index, Path, Segment};
use std::sync::Arc;

/// Callbacks for [`traverse_params`]
pub trait ParamVisitor {
    /// Called for every node, parents before children
    fn visit(&mut self, param: &dyn Param);

    /// Called for a non-empty array, after `visit` and before its elements
    fn visit_array(&mut self, _param: &dyn Param, _len: usize) {}

    /// Called for each array element before the element is visited
    fn visit_array_element(&mut self, _param: &dyn Param, _index: usize) {}
}

/// Walk `param` and everything below it
///
/// Children that do not resolve are skipped: fields `authz` cannot read,
/// the inactive alternatives of a variant, and sub-params of scalars.
pub fn traverse_params<'p>(
    param: &mut (dyn Param + 'p),
    authz: &dyn Authorizer,
    visitor: &mut dyn ParamVisitor,
) {
    visitor.visit(param);

    if param.is_array_type() {
        let len = param.size();
        if len == 0 {
            return;
        }
        visitor.visit_array(param, len);
        for i in 0..len {
            let mut path = Path::from_segments([Segment::Index(Index::At(i))]);
            if let Ok(mut element) = param.get_param(&mut path, authz) {
                visitor.visit_array_element(element.as_ref(), i);
                traverse_params(element.as_mut(), authz, visitor);
            }
        }
        return;
    }

    let desc = Arc::clone(param.descriptor());
    for (name, _) in desc.sub_params() {
        let mut path = Path::from_segments([Segment::Name(name.to_string())]);
        if let Ok(mut child) = param.get_param(&mut path, authz) {
            traverse_params(child.as_mut(), authz, visitor);
        }
    }
}
