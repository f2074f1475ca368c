//! Scalar values: the empty sentinel, `i32`, `f32` and `String`

use crate::array::Element;
use crate::transaction::SetValueTransaction;
use crate::value::{mismatch, reject_index, require_write, too_long, ParamValue};
use catena_core::{Authorizer, Error, Index, ParamDescriptor, ParamType, Result, Value};

/// Value of a param that carries no data (typically a command trigger)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EmptyValue;

impl ParamValue for EmptyValue {
    fn param_type(&self) -> ParamType {
        ParamType::Empty
    }

    fn to_wire(&self, _desc: &ParamDescriptor, _authz: &dyn Authorizer) -> Value {
        Value::Empty
    }

    fn from_wire(&mut self, _src: &Value, _desc: &ParamDescriptor, _authz: &dyn Authorizer) {}

    fn check_set_value(
        &self,
        _src: &Value,
        _index: Option<Index>,
        desc: &ParamDescriptor,
        _oid: &str,
        _authz: &dyn Authorizer,
        _txn: &mut SetValueTransaction,
    ) -> Result<()> {
        Err(Error::invalid_argument(format!(
            "'{}' is empty and accepts no value",
            desc.oid()
        )))
    }
}

/// Apply the descriptor's constraint to an incoming value
///
/// Returns the value to store, or `None` to leave the target unchanged.
fn constrained<T>(src: &Value, desc: &ParamDescriptor, extract: fn(&Value) -> Option<T>) -> Option<T> {
    let v = extract(src)?;
    match desc.constraint() {
        None => Some(v),
        Some(c) if c.satisfied(src) => Some(v),
        Some(c) if c.is_range() => extract(&c.apply(src)),
        Some(_) => None,
    }
}

fn check_scalar(
    src: &Value,
    index: Option<Index>,
    desc: &ParamDescriptor,
    authz: &dyn Authorizer,
    expected: &str,
    extract: fn(&Value) -> bool,
) -> Result<()> {
    reject_index(index, desc)?;
    require_write(desc, authz)?;
    if extract(src) {
        Ok(())
    } else {
        Err(mismatch(desc, expected, src))
    }
}

// ============================================================================
// int32
// ============================================================================

impl ParamValue for i32 {
    fn param_type(&self) -> ParamType {
        ParamType::Int32
    }

    fn to_wire(&self, _desc: &ParamDescriptor, _authz: &dyn Authorizer) -> Value {
        Value::Int32(*self)
    }

    fn from_wire(&mut self, src: &Value, desc: &ParamDescriptor, _authz: &dyn Authorizer) {
        if let Some(v) = constrained(src, desc, Value::as_i32) {
            *self = v;
        }
    }

    fn check_set_value(
        &self,
        src: &Value,
        index: Option<Index>,
        desc: &ParamDescriptor,
        _oid: &str,
        authz: &dyn Authorizer,
        _txn: &mut SetValueTransaction,
    ) -> Result<()> {
        check_scalar(src, index, desc, authz, "int32", |v| v.as_i32().is_some())
    }
}

impl Element for i32 {
    const ARRAY_TYPE: ParamType = ParamType::Int32Array;

    fn pack(items: Vec<Value>) -> Value {
        Value::Int32Array(items.iter().filter_map(Value::as_i32).collect())
    }

    fn unpack(src: &Value) -> Option<Vec<Value>> {
        match src {
            Value::Int32Array(v) => Some(v.iter().copied().map(Value::Int32).collect()),
            _ => None,
        }
    }

    fn decode(src: &Value, desc: &ParamDescriptor, _authz: &dyn Authorizer) -> Option<Self> {
        constrained(src, desc, Value::as_i32)
    }

    fn accepts(src: &Value, desc: &ParamDescriptor) -> bool {
        constrained(src, desc, Value::as_i32).is_some()
    }

    fn check_element(
        _current: Option<&Self>,
        src: &Value,
        desc: &ParamDescriptor,
        _oid: &str,
        _authz: &dyn Authorizer,
        _txn: &mut SetValueTransaction,
    ) -> Result<()> {
        match src {
            Value::Int32(_) => Ok(()),
            other => Err(mismatch(desc, "int32", other)),
        }
    }
}

// ============================================================================
// float32
// ============================================================================

impl ParamValue for f32 {
    fn param_type(&self) -> ParamType {
        ParamType::Float32
    }

    fn to_wire(&self, _desc: &ParamDescriptor, _authz: &dyn Authorizer) -> Value {
        Value::Float32(*self)
    }

    fn from_wire(&mut self, src: &Value, desc: &ParamDescriptor, _authz: &dyn Authorizer) {
        if let Some(v) = constrained(src, desc, Value::as_f32) {
            *self = v;
        }
    }

    fn check_set_value(
        &self,
        src: &Value,
        index: Option<Index>,
        desc: &ParamDescriptor,
        _oid: &str,
        authz: &dyn Authorizer,
        _txn: &mut SetValueTransaction,
    ) -> Result<()> {
        check_scalar(src, index, desc, authz, "float32", |v| v.as_f32().is_some())
    }
}

impl Element for f32 {
    const ARRAY_TYPE: ParamType = ParamType::Float32Array;

    fn pack(items: Vec<Value>) -> Value {
        Value::Float32Array(items.iter().filter_map(Value::as_f32).collect())
    }

    fn unpack(src: &Value) -> Option<Vec<Value>> {
        match src {
            Value::Float32Array(v) => Some(v.iter().copied().map(Value::Float32).collect()),
            _ => None,
        }
    }

    fn decode(src: &Value, desc: &ParamDescriptor, _authz: &dyn Authorizer) -> Option<Self> {
        constrained(src, desc, Value::as_f32)
    }

    fn accepts(src: &Value, desc: &ParamDescriptor) -> bool {
        constrained(src, desc, Value::as_f32).is_some()
    }

    fn check_element(
        _current: Option<&Self>,
        src: &Value,
        desc: &ParamDescriptor,
        _oid: &str,
        _authz: &dyn Authorizer,
        _txn: &mut SetValueTransaction,
    ) -> Result<()> {
        match src {
            Value::Float32(_) => Ok(()),
            other => Err(mismatch(desc, "float32", other)),
        }
    }
}

// ============================================================================
// string
// ============================================================================

fn as_string(v: &Value) -> Option<String> {
    v.as_str().map(str::to_string)
}

impl ParamValue for String {
    fn param_type(&self) -> ParamType {
        ParamType::String
    }

    fn size(&self) -> usize {
        self.len()
    }

    fn to_wire(&self, _desc: &ParamDescriptor, _authz: &dyn Authorizer) -> Value {
        Value::String(self.clone())
    }

    fn from_wire(&mut self, src: &Value, desc: &ParamDescriptor, _authz: &dyn Authorizer) {
        if let Some(v) = constrained(src, desc, as_string) {
            *self = v;
        }
    }

    fn check_set_value(
        &self,
        src: &Value,
        index: Option<Index>,
        desc: &ParamDescriptor,
        _oid: &str,
        authz: &dyn Authorizer,
        _txn: &mut SetValueTransaction,
    ) -> Result<()> {
        reject_index(index, desc)?;
        require_write(desc, authz)?;
        let Some(s) = src.as_str() else {
            return Err(mismatch(desc, "string", src));
        };
        let max = desc.max_length();
        if s.len() > max {
            return Err(too_long(desc, "string length", s.len(), max));
        }
        Ok(())
    }
}

impl Element for String {
    const ARRAY_TYPE: ParamType = ParamType::StringArray;
    const TRACKS_LENGTH: bool = true;

    fn pack(items: Vec<Value>) -> Value {
        Value::StringArray(
            items
                .into_iter()
                .filter_map(|v| match v {
                    Value::String(s) => Some(s),
                    _ => None,
                })
                .collect(),
        )
    }

    fn unpack(src: &Value) -> Option<Vec<Value>> {
        match src {
            Value::StringArray(v) => Some(v.iter().cloned().map(Value::String).collect()),
            _ => None,
        }
    }

    fn decode(src: &Value, desc: &ParamDescriptor, _authz: &dyn Authorizer) -> Option<Self> {
        constrained(src, desc, as_string)
    }

    fn accepts(src: &Value, desc: &ParamDescriptor) -> bool {
        constrained(src, desc, as_string).is_some()
    }

    fn check_element(
        _current: Option<&Self>,
        src: &Value,
        desc: &ParamDescriptor,
        _oid: &str,
        _authz: &dyn Authorizer,
        _txn: &mut SetValueTransaction,
    ) -> Result<()> {
        match src {
            Value::String(_) => Ok(()),
            other => Err(mismatch(desc, "string", other)),
        }
    }

    fn wire_len(src: &Value) -> usize {
        src.as_str().map(str::len).unwrap_or(0)
    }

    fn native_len(&self) -> usize {
        self.len()
    }
}
