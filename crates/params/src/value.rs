//! The native value trait
//!
//! [`ParamValue`] is implemented by every native type that can sit behind a
//! parameter: the empty sentinel, `i32`, `f32`, `String`, `Vec<E>` of any
//! [`Element`](crate::Element), and struct / variant types registered with
//! [`catena_struct!`](crate::catena_struct) or
//! [`catena_variant!`](crate::catena_variant).
//!
//! The trait is object safe. Path traversal hands out `&mut dyn ParamValue`
//! borrows into the parent's storage together with the descriptor that
//! governs them, so a node never outlives the value it wraps.

use crate::transaction::SetValueTransaction;
use catena_core::{
    Authorizer, Error, Index, ParamDescriptor, ParamDescriptorBuilder, ParamType, Path, Result,
    Segment, Value,
};
use std::any::Any;
use std::sync::Arc;
use tracing::debug;

/// Upcast to `Any` for typed access through `dyn ParamValue`
///
/// Implemented for every `'static` type; the trait has no lifetime bound.
pub trait AsAny {
    /// `self` as `&dyn Any`
    fn as_any(&self) -> &dyn Any;
    /// `self` as `&mut dyn Any`
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Any> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// A resolved position: value borrow plus governing descriptor
pub struct Node<'a> {
    /// The value at the position
    pub value: &'a mut dyn ParamValue,
    /// Descriptor governing the position
    pub descriptor: Arc<ParamDescriptor>,
}

/// Native storage behind a parameter
pub trait ParamValue: AsAny + Send {
    /// Type tag of this value
    fn param_type(&self) -> ParamType;

    /// Element count for arrays, byte length for strings, 0 otherwise
    fn size(&self) -> usize {
        0
    }

    /// Serialize, leaving out sub-values the authorizer cannot read
    fn to_wire(&self, desc: &ParamDescriptor, authz: &dyn Authorizer) -> Value;

    /// Deserialize in place
    ///
    /// Values of the wrong kind are ignored. Constraints are honored: a
    /// value that does not satisfy a range constraint is clamped, any other
    /// unsatisfied value leaves the target unchanged.
    fn from_wire(&mut self, src: &Value, desc: &ParamDescriptor, authz: &dyn Authorizer);

    /// Resolve the (non-empty) `path` below this value
    fn get_param<'a>(
        &'a mut self,
        path: &mut Path,
        desc: &Arc<ParamDescriptor>,
        _authz: &dyn Authorizer,
    ) -> Result<Node<'a>> {
        Err(Error::invalid_argument(format!(
            "'{}' of type {} has no sub-params (path '{}')",
            desc.oid(),
            self.param_type(),
            path.remaining()
        )))
    }

    /// Append a default element; returns its index
    fn add_back(&mut self, desc: &ParamDescriptor, _authz: &dyn Authorizer) -> Result<usize> {
        Err(not_an_array(desc, self.param_type()))
    }

    /// Remove the last element
    fn pop_back(&mut self, desc: &ParamDescriptor, _authz: &dyn Authorizer) -> Result<()> {
        Err(not_an_array(desc, self.param_type()))
    }

    /// Validate `src` as a new value for this position without mutating it
    ///
    /// `index` is `None` to replace the whole value, or an element position
    /// (possibly [`Index::End`]) for arrays. Accepted length changes are
    /// recorded in `txn` under `oid`.
    fn check_set_value(
        &self,
        src: &Value,
        index: Option<Index>,
        desc: &ParamDescriptor,
        oid: &str,
        authz: &dyn Authorizer,
        txn: &mut SetValueTransaction,
    ) -> Result<()>;

    /// Apply a value that passed [`check_set_value`](Self::check_set_value)
    fn apply_set_value(
        &mut self,
        src: &Value,
        index: Option<Index>,
        desc: &ParamDescriptor,
        authz: &dyn Authorizer,
    ) -> Result<()> {
        reject_index(index, desc)?;
        self.from_wire(src, desc, authz);
        Ok(())
    }

    /// Verify that `desc` describes this value's shape
    fn check_descriptor(&self, desc: &ParamDescriptor) -> Result<()> {
        if desc.param_type() != self.param_type() {
            return Err(Error::internal(format!(
                "descriptor '{}' declares {} but the value is {}",
                desc.oid(),
                desc.param_type(),
                self.param_type()
            )));
        }
        self.check_layout(desc)
    }

    /// Verify sub-descriptors against fields or alternatives
    fn check_layout(&self, _desc: &ParamDescriptor) -> Result<()> {
        Ok(())
    }

    /// Add sub-descriptor skeletons for this value's fields or alternatives
    fn describe(&self, builder: ParamDescriptorBuilder) -> ParamDescriptorBuilder {
        builder
    }
}

/// Descriptor skeleton for a default `T`, with every sub-param declared
pub fn describe<T: ParamValue + Default>(oid: impl Into<String>) -> ParamDescriptorBuilder {
    let sample = T::default();
    sample.describe(ParamDescriptorBuilder::new(sample.param_type(), oid))
}

// ============================================================================
// Shared checks
// ============================================================================

pub(crate) fn require_read(desc: &ParamDescriptor, authz: &dyn Authorizer) -> Result<()> {
    if authz.read_authz(desc) {
        Ok(())
    } else {
        debug!(target: "catena::params", oid = %desc.oid(), "read denied");
        Err(Error::permission_denied(format!(
            "Not authorized to read '{}'",
            desc.oid()
        )))
    }
}

pub(crate) fn require_write(desc: &ParamDescriptor, authz: &dyn Authorizer) -> Result<()> {
    if authz.write_authz(desc) {
        Ok(())
    } else {
        debug!(target: "catena::params", oid = %desc.oid(), "write denied");
        Err(Error::permission_denied(format!(
            "Not authorized to write '{}'",
            desc.oid()
        )))
    }
}

pub(crate) fn reject_index(index: Option<Index>, desc: &ParamDescriptor) -> Result<()> {
    match index {
        None => Ok(()),
        Some(idx) => Err(Error::invalid_argument(format!(
            "'{}' is not an array and cannot be indexed with {}",
            desc.oid(),
            idx
        ))),
    }
}

pub(crate) fn mismatch(desc: &ParamDescriptor, expected: &str, got: &Value) -> Error {
    Error::invalid_argument(format!(
        "'{}' expects a {} value, got {}",
        desc.oid(),
        expected,
        got.kind()
    ))
}

pub(crate) fn too_long(desc: &ParamDescriptor, what: &str, len: usize, max: usize) -> Error {
    debug!(target: "catena::params", oid = %desc.oid(), what, len, max, "length budget exceeded");
    Error::out_of_range(format!(
        "'{}' {} {} exceeds maximum of {}",
        desc.oid(),
        what,
        len,
        max
    ))
}

pub(crate) fn not_an_array(desc: &ParamDescriptor, param_type: ParamType) -> Error {
    Error::invalid_argument(format!(
        "'{}' of type {} is not an array",
        desc.oid(),
        param_type
    ))
}

/// Front of `path` as a name, or `InvalidArgument`
pub(crate) fn front_name(path: &Path, desc: &ParamDescriptor) -> Result<String> {
    match path.front() {
        Some(Segment::Name(name)) => Ok(name.clone()),
        Some(Segment::Index(idx)) => Err(Error::invalid_argument(format!(
            "'{}' expects a name but got index {}",
            desc.oid(),
            idx
        ))),
        None => Err(Error::invalid_argument(format!(
            "empty path below '{}'",
            desc.oid()
        ))),
    }
}
