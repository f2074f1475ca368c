//! Struct values
//!
//! A struct param is a plain Rust struct whose fields are themselves
//! [`ParamValue`]s. Declare it with [`catena_struct!`](crate::catena_struct),
//! which generates the field table ([`StructInfo`]) and the `ParamValue` /
//! [`Element`](crate::Element) impls on top of the functions in this module.
//!
//! Every field has a sub-descriptor in the struct's descriptor, keyed by the
//! field name. Serialization leaves out fields the authorizer cannot read;
//! deserialization skips fields it cannot write.
//!
//! ```ignore
//! catena_struct! {
//!     #[derive(Debug, Clone, Default, PartialEq)]
//!     pub struct Location {
//!         pub latitude: f32,
//!         pub longitude: f32,
//!     }
//! }
//! ```

use crate::transaction::SetValueTransaction;
use crate::value::{front_name, mismatch, reject_index, require_read, require_write, Node, ParamValue};
use catena_core::{
    Authorizer, Error, Index, ParamDescriptor, ParamDescriptorBuilder, ParamType, Path, Result,
    StructValue, Value,
};
use std::sync::Arc;

/// Field table of a struct value
pub trait StructInfo: ParamValue + Default + Clone {
    /// Field names in declaration order
    const FIELDS: &'static [&'static str];

    /// Field by name
    fn field(&self, name: &str) -> Option<&dyn ParamValue>;

    /// Mutable field by name
    fn field_mut(&mut self, name: &str) -> Option<&mut dyn ParamValue>;
}

fn no_field(desc: &ParamDescriptor, name: &str) -> Error {
    Error::not_found(format!("'{}' has no field named '{}'", desc.oid(), name))
}

#[doc(hidden)]
pub fn to_wire<T: StructInfo>(value: &T, desc: &ParamDescriptor, authz: &dyn Authorizer) -> Value {
    let mut out = StructValue::new();
    for &name in T::FIELDS {
        let (Some(field), Ok(sub)) = (value.field(name), desc.sub_param(name)) else {
            continue;
        };
        if authz.read_authz(sub) {
            out.fields.insert(name.to_string(), field.to_wire(sub, authz));
        }
    }
    Value::Struct(out)
}

#[doc(hidden)]
pub fn from_wire<T: StructInfo>(
    value: &mut T,
    src: &Value,
    desc: &ParamDescriptor,
    authz: &dyn Authorizer,
) {
    let Some(src) = src.as_struct() else {
        return;
    };
    for (name, item) in &src.fields {
        let Ok(sub) = desc.sub_param(name) else {
            continue;
        };
        if !authz.write_authz(sub) {
            continue;
        }
        if let Some(field) = value.field_mut(name) {
            field.from_wire(item, sub, authz);
        }
    }
}

#[doc(hidden)]
pub fn get_param<'a, T: StructInfo>(
    value: &'a mut T,
    path: &mut Path,
    desc: &Arc<ParamDescriptor>,
    authz: &dyn Authorizer,
) -> Result<Node<'a>> {
    require_read(desc, authz)?;
    let name = front_name(path, desc)?;
    let Some(field) = value.field_mut(&name) else {
        return Err(no_field(desc, &name));
    };
    let sub = Arc::clone(desc.sub_param(&name)?);
    require_read(&sub, authz)?;
    path.pop();
    if path.is_empty() {
        return Ok(Node {
            value: field,
            descriptor: sub,
        });
    }
    field.get_param(path, &sub, authz)
}

#[doc(hidden)]
#[allow(clippy::too_many_arguments)]
pub fn check_set_value<T: StructInfo>(
    value: &T,
    src: &Value,
    index: Option<Index>,
    desc: &ParamDescriptor,
    oid: &str,
    authz: &dyn Authorizer,
    txn: &mut SetValueTransaction,
) -> Result<()> {
    reject_index(index, desc)?;
    require_write(desc, authz)?;
    let Some(src) = src.as_struct() else {
        return Err(mismatch(desc, "struct", src));
    };
    for (name, item) in &src.fields {
        let field = value.field(name).ok_or_else(|| no_field(desc, name))?;
        let sub = desc.sub_param(name)?;
        field.check_set_value(item, None, sub, &format!("{}/{}", oid, name), authz, txn)?;
    }
    Ok(())
}

#[doc(hidden)]
pub fn check_layout<T: StructInfo>(value: &T, desc: &ParamDescriptor) -> Result<()> {
    for &name in T::FIELDS {
        let sub = desc.sub_param(name).map_err(|_| {
            Error::internal(format!(
                "descriptor '{}' is missing field '{}'",
                desc.oid(),
                name
            ))
        })?;
        if let Some(field) = value.field(name) {
            field.check_descriptor(sub)?;
        }
    }
    Ok(())
}

#[doc(hidden)]
pub fn describe<T: StructInfo>(value: &T, builder: ParamDescriptorBuilder) -> ParamDescriptorBuilder {
    let mut builder = builder;
    for &name in T::FIELDS {
        if let Some(field) = value.field(name) {
            builder = builder.sub_param_with(name, |child| describe_child(field, child));
        }
    }
    builder
}

/// Type a sub-descriptor after `value` unless it was typed explicitly
pub(crate) fn describe_child(value: &dyn ParamValue, child: ParamDescriptorBuilder) -> ParamDescriptorBuilder {
    let child = if child.get_param_type() == ParamType::Undefined {
        child.param_type(value.param_type())
    } else {
        child
    };
    value.describe(child)
}

#[doc(hidden)]
pub fn check_element<T: StructInfo>(
    current: Option<&T>,
    src: &Value,
    desc: &ParamDescriptor,
    oid: &str,
    authz: &dyn Authorizer,
    txn: &mut SetValueTransaction,
) -> Result<()> {
    match current {
        Some(current) => current.check_set_value(src, None, desc, oid, authz, txn),
        None => T::default().check_set_value(src, None, desc, oid, authz, txn),
    }
}

#[doc(hidden)]
pub fn pack(items: Vec<Value>) -> Value {
    Value::StructArray(
        items
            .into_iter()
            .filter_map(|v| match v {
                Value::Struct(s) => Some(s),
                _ => None,
            })
            .collect(),
    )
}

#[doc(hidden)]
pub fn unpack(src: &Value) -> Option<Vec<Value>> {
    match src {
        Value::StructArray(items) => Some(items.iter().cloned().map(Value::Struct).collect()),
        _ => None,
    }
}

/// Declare a struct usable as a param value
///
/// Every field type must implement [`ParamValue`](crate::ParamValue). The
/// struct must implement `Default` and `Clone`, usually by derive.
#[macro_export]
macro_rules! catena_struct {
    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident {
            $( $(#[$fmeta:meta])* $fvis:vis $field:ident : $fty:ty ),* $(,)?
        }
    ) => {
        $(#[$meta])*
        $vis struct $name {
            $( $(#[$fmeta])* $fvis $field: $fty ),*
        }

        impl $crate::StructInfo for $name {
            const FIELDS: &'static [&'static str] = &[$(stringify!($field)),*];

            fn field(&self, name: &str) -> ::std::option::Option<&dyn $crate::ParamValue> {
                match name {
                    $( stringify!($field) => ::std::option::Option::Some(&self.$field), )*
                    _ => ::std::option::Option::None,
                }
            }

            fn field_mut(&mut self, name: &str) -> ::std::option::Option<&mut dyn $crate::ParamValue> {
                match name {
                    $( stringify!($field) => ::std::option::Option::Some(&mut self.$field), )*
                    _ => ::std::option::Option::None,
                }
            }
        }

        impl $crate::ParamValue for $name {
            fn param_type(&self) -> $crate::__core::ParamType {
                $crate::__core::ParamType::Struct
            }

            fn to_wire(
                &self,
                desc: &$crate::__core::ParamDescriptor,
                authz: &dyn $crate::__core::Authorizer,
            ) -> $crate::__core::Value {
                $crate::structs::to_wire(self, desc, authz)
            }

            fn from_wire(
                &mut self,
                src: &$crate::__core::Value,
                desc: &$crate::__core::ParamDescriptor,
                authz: &dyn $crate::__core::Authorizer,
            ) {
                $crate::structs::from_wire(self, src, desc, authz)
            }

            fn get_param<'a>(
                &'a mut self,
                path: &mut $crate::__core::Path,
                desc: &::std::sync::Arc<$crate::__core::ParamDescriptor>,
                authz: &dyn $crate::__core::Authorizer,
            ) -> $crate::__core::Result<$crate::Node<'a>> {
                $crate::structs::get_param(self, path, desc, authz)
            }

            fn check_set_value(
                &self,
                src: &$crate::__core::Value,
                index: ::std::option::Option<$crate::__core::Index>,
                desc: &$crate::__core::ParamDescriptor,
                oid: &str,
                authz: &dyn $crate::__core::Authorizer,
                txn: &mut $crate::SetValueTransaction,
            ) -> $crate::__core::Result<()> {
                $crate::structs::check_set_value(self, src, index, desc, oid, authz, txn)
            }

            fn check_layout(&self, desc: &$crate::__core::ParamDescriptor) -> $crate::__core::Result<()> {
                $crate::structs::check_layout(self, desc)
            }

            fn describe(
                &self,
                builder: $crate::__core::ParamDescriptorBuilder,
            ) -> $crate::__core::ParamDescriptorBuilder {
                $crate::structs::describe(self, builder)
            }
        }

        impl $crate::Element for $name {
            const ARRAY_TYPE: $crate::__core::ParamType = $crate::__core::ParamType::StructArray;
            const COMPOSITE: bool = true;

            fn pack(items: ::std::vec::Vec<$crate::__core::Value>) -> $crate::__core::Value {
                $crate::structs::pack(items)
            }

            fn unpack(
                src: &$crate::__core::Value,
            ) -> ::std::option::Option<::std::vec::Vec<$crate::__core::Value>> {
                $crate::structs::unpack(src)
            }

            fn check_element(
                current: ::std::option::Option<&Self>,
                src: &$crate::__core::Value,
                desc: &$crate::__core::ParamDescriptor,
                oid: &str,
                authz: &dyn $crate::__core::Authorizer,
                txn: &mut $crate::SetValueTransaction,
            ) -> $crate::__core::Result<()> {
                $crate::structs::check_element(current, src, desc, oid, authz, txn)
            }
        }
    };
}
