//! Parameter nodes
//!
//! [`ParamWithValue`] couples a borrowed native value with the descriptor
//! that governs it and the fully qualified oid of its position. It is the
//! only implementor of the type-erased [`Param`] trait: top-level params wrap
//! a concrete `T`, while nodes produced by [`Param::get_param`] and
//! [`Param::add_back`] wrap `dyn ParamValue` borrows into their parent's
//! storage.
//!
//! A node never owns its value; it cannot outlive the storage it borrows.

use crate::transaction::SetValueTransaction;
use crate::value::{require_read, require_write, AsAny, ParamValue};
use catena_core::{
    wire, Authorizer, CommandResponse, Constraint, Error, Index, ParamDescriptor,
    ParamInfoResponse, ParamType, Path, Result, Value,
};
use std::any::Any;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Type-erased parameter node
pub trait Param: Send {
    /// Fully qualified oid of this node
    fn oid(&self) -> &str;

    /// Governing descriptor
    fn descriptor(&self) -> &Arc<ParamDescriptor>;

    /// Type tag
    fn param_type(&self) -> ParamType {
        self.descriptor().param_type()
    }

    /// Read-only flag of the descriptor
    fn read_only(&self) -> bool {
        self.descriptor().read_only()
    }

    /// Effective scope of the descriptor
    fn scope(&self) -> String {
        self.descriptor().scope()
    }

    /// Constraint of the descriptor
    fn constraint(&self) -> Option<&Arc<dyn Constraint>> {
        self.descriptor().constraint()
    }

    /// True for array types
    fn is_array_type(&self) -> bool {
        self.param_type().is_array()
    }

    /// Element count for arrays, byte length for strings, 0 otherwise
    fn size(&self) -> usize;

    /// Serialize the value
    fn to_value(&self, authz: &dyn Authorizer) -> Result<Value>;

    /// Serialize metadata and value
    ///
    /// If the authorizer cannot read this node, nothing is written and
    /// `PermissionDenied` is returned.
    fn to_proto(&self, dst: &mut wire::Param, authz: &dyn Authorizer) -> Result<()>;

    /// Serialize identification only
    fn to_info_response(&self, dst: &mut ParamInfoResponse, authz: &dyn Authorizer) -> Result<()>;

    /// Overwrite the value from its wire form
    ///
    /// Requires read and write access. Constraints are honored as described
    /// on [`ParamValue::from_wire`].
    fn from_proto(&mut self, src: &Value, authz: &dyn Authorizer) -> Result<()>;

    /// Resolve `path` relative to this node
    fn get_param(&mut self, path: &mut Path, authz: &dyn Authorizer) -> Result<Box<dyn Param + '_>>;

    /// Append a default element and return a node for it
    fn add_back(&mut self, authz: &dyn Authorizer) -> Result<Box<dyn Param + '_>>;

    /// Remove the last element
    fn pop_back(&mut self, authz: &dyn Authorizer) -> Result<()>;

    /// Validate a set without applying it
    fn check_set_value(
        &self,
        src: &Value,
        index: Option<Index>,
        authz: &dyn Authorizer,
        txn: &mut SetValueTransaction,
    ) -> Result<()>;

    /// Validate a set and apply it on success
    ///
    /// On failure the value is left untouched.
    fn validate_set_value(
        &mut self,
        src: &Value,
        index: Option<Index>,
        authz: &dyn Authorizer,
        txn: &mut SetValueTransaction,
    ) -> Result<()>;

    /// Forget the size trackers of this node and everything below it
    fn reset_validate(&self, txn: &mut SetValueTransaction) {
        txn.forget_subtree(self.oid());
    }

    /// Run the descriptor's command handler
    fn execute_command(&self, value: Value) -> Result<CommandResponse>;

    /// Wrapped value as `Any`
    fn value_any(&self) -> &dyn Any;

    /// Wrapped value as mutable `Any`
    fn value_any_mut(&mut self) -> &mut dyn Any;
}

impl<'p> dyn Param + 'p {
    /// Wrapped value, if it is a `U`
    pub fn get<U: Any>(&self) -> Option<&U> {
        self.value_any().downcast_ref()
    }

    /// Mutable wrapped value, if it is a `U`
    pub fn get_mut<U: Any>(&mut self) -> Option<&mut U> {
        self.value_any_mut().downcast_mut()
    }
}

impl fmt::Debug for dyn Param + '_ {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Param")
            .field("oid", &self.oid())
            .field("param_type", &self.param_type())
            .finish()
    }
}

/// A value borrowed together with its descriptor
pub struct ParamWithValue<'a, T: ParamValue + ?Sized> {
    value: &'a mut T,
    descriptor: Arc<ParamDescriptor>,
    oid: String,
}

impl<'a, T: ParamValue + ?Sized> ParamWithValue<'a, T> {
    /// Wrap `value` at `oid`
    pub fn new(oid: impl Into<String>, value: &'a mut T, descriptor: Arc<ParamDescriptor>) -> Self {
        ParamWithValue {
            value,
            descriptor,
            oid: oid.into(),
        }
    }

    /// Wrap `value` after checking that `descriptor` matches its shape
    ///
    /// # Errors
    ///
    /// Returns `Internal` if the type tag or the sub-param layout differ.
    pub fn checked(
        oid: impl Into<String>,
        value: &'a mut T,
        descriptor: Arc<ParamDescriptor>,
    ) -> Result<Self> {
        value.check_descriptor(&descriptor)?;
        Ok(Self::new(oid, value, descriptor))
    }

    /// The wrapped value
    pub fn get(&self) -> &T {
        &*self.value
    }

    /// The wrapped value, mutably
    pub fn get_mut(&mut self) -> &mut T {
        &mut *self.value
    }
}

impl<'a, T: ParamValue + ?Sized> Param for ParamWithValue<'a, T> {
    fn oid(&self) -> &str {
        &self.oid
    }

    fn descriptor(&self) -> &Arc<ParamDescriptor> {
        &self.descriptor
    }

    // elements share the array descriptor, so ask the value
    fn is_array_type(&self) -> bool {
        self.value.param_type().is_array()
    }

    fn size(&self) -> usize {
        self.value.size()
    }

    fn to_value(&self, authz: &dyn Authorizer) -> Result<Value> {
        require_read(&self.descriptor, authz)?;
        Ok(self.value.to_wire(&self.descriptor, authz))
    }

    fn to_proto(&self, dst: &mut wire::Param, authz: &dyn Authorizer) -> Result<()> {
        require_read(&self.descriptor, authz)?;
        self.descriptor.to_proto(dst, authz);
        dst.value = Some(self.value.to_wire(&self.descriptor, authz));
        Ok(())
    }

    fn to_info_response(&self, dst: &mut ParamInfoResponse, authz: &dyn Authorizer) -> Result<()> {
        require_read(&self.descriptor, authz)?;
        self.descriptor.to_info(&mut dst.info);
        dst.info.oid = self.oid.clone();
        dst.array_length = if self.is_array_type() {
            Some(self.size() as u32)
        } else {
            None
        };
        Ok(())
    }

    fn from_proto(&mut self, src: &Value, authz: &dyn Authorizer) -> Result<()> {
        require_read(&self.descriptor, authz)?;
        require_write(&self.descriptor, authz)?;
        self.value.from_wire(src, &self.descriptor, authz);
        Ok(())
    }

    fn get_param(&mut self, path: &mut Path, authz: &dyn Authorizer) -> Result<Box<dyn Param + '_>> {
        if path.is_empty() {
            return Err(Error::invalid_argument(format!(
                "empty path below '{}'",
                self.oid
            )));
        }
        let mark = path.walked();
        let node = self.value.get_param(path, &self.descriptor, authz)?;
        let oid = format!("{}{}", self.oid, path.walked_since(mark));
        Ok(Box::new(ParamWithValue {
            value: node.value,
            descriptor: node.descriptor,
            oid,
        }))
    }

    fn add_back(&mut self, authz: &dyn Authorizer) -> Result<Box<dyn Param + '_>> {
        let index = self.value.add_back(&self.descriptor, authz)?;
        let mut path = Path::from_segments([catena_core::Segment::Index(Index::At(index))]);
        let node = self.value.get_param(&mut path, &self.descriptor, authz)?;
        Ok(Box::new(ParamWithValue {
            value: node.value,
            descriptor: node.descriptor,
            oid: format!("{}/{}", self.oid, index),
        }))
    }

    fn pop_back(&mut self, authz: &dyn Authorizer) -> Result<()> {
        self.value.pop_back(&self.descriptor, authz)
    }

    fn check_set_value(
        &self,
        src: &Value,
        index: Option<Index>,
        authz: &dyn Authorizer,
        txn: &mut SetValueTransaction,
    ) -> Result<()> {
        self.value
            .check_set_value(src, index, &self.descriptor, &self.oid, authz, txn)
    }

    fn validate_set_value(
        &mut self,
        src: &Value,
        index: Option<Index>,
        authz: &dyn Authorizer,
        txn: &mut SetValueTransaction,
    ) -> Result<()> {
        if let Err(e) = self
            .value
            .check_set_value(src, index, &self.descriptor, &self.oid, authz, txn)
        {
            debug!(target: "catena::params", oid = %self.oid, code = %e.code(), "set rejected");
            return Err(e);
        }
        self.value.apply_set_value(src, index, &self.descriptor, authz)
    }

    fn execute_command(&self, value: Value) -> Result<CommandResponse> {
        if !self.descriptor.is_command() {
            return Err(Error::invalid_argument(format!(
                "'{}' is not a command",
                self.oid
            )));
        }
        Ok(self.descriptor.execute_command(value))
    }

    fn value_any(&self) -> &dyn Any {
        AsAny::as_any(&*self.value)
    }

    fn value_any_mut(&mut self) -> &mut dyn Any {
        AsAny::as_any_mut(&mut *self.value)
    }
}
