//! Variant values
//!
//! A variant param is a Rust enum whose alternatives each wrap one
//! [`ParamValue`]. Declare it with [`catena_variant!`](crate::catena_variant).
//! On the wire it is a `StructVariant` carrying the active alternative's name
//! and payload; each alternative has a sub-descriptor keyed by that name.

use crate::structs::describe_child;
use crate::transaction::SetValueTransaction;
use crate::value::{front_name, mismatch, reject_index, require_read, require_write, Node, ParamValue};
use catena_core::{
    Authorizer, Error, Index, ParamDescriptor, ParamDescriptorBuilder, Path, Result,
    StructVariantValue, Value,
};
use std::sync::Arc;

/// Alternative table of a variant value
pub trait VariantInfo: ParamValue + Default + Clone {
    /// Alternative names in declaration order
    const ALTERNATIVES: &'static [&'static str];

    /// Name of the active alternative
    fn alternative(&self) -> &'static str;

    /// Payload of the active alternative
    fn value(&self) -> &dyn ParamValue;

    /// Mutable payload of the active alternative
    fn value_mut(&mut self) -> &mut dyn ParamValue;

    /// Switch to alternative `name`, keeping the payload if it is already
    /// active. Returns false for unknown names.
    fn select(&mut self, name: &str) -> bool;
}

fn selected<T: VariantInfo>(alternative: &str) -> T {
    let mut selected = T::default();
    selected.select(alternative);
    selected
}

#[doc(hidden)]
pub fn to_wire<T: VariantInfo>(value: &T, desc: &ParamDescriptor, authz: &dyn Authorizer) -> Value {
    let alternative = value.alternative();
    let payload = match desc.sub_param(alternative) {
        Ok(sub) if authz.read_authz(sub) => value.value().to_wire(sub, authz),
        _ => Value::Empty,
    };
    Value::StructVariant(StructVariantValue::new(alternative, payload))
}

#[doc(hidden)]
pub fn from_wire<T: VariantInfo>(
    value: &mut T,
    src: &Value,
    desc: &ParamDescriptor,
    authz: &dyn Authorizer,
) {
    let Some(src) = src.as_struct_variant() else {
        return;
    };
    let Ok(sub) = desc.sub_param(&src.struct_variant_type) else {
        return;
    };
    if authz.write_authz(sub) && value.select(&src.struct_variant_type) {
        value.value_mut().from_wire(&src.value, sub, authz);
    }
}

#[doc(hidden)]
pub fn get_param<'a, T: VariantInfo>(
    value: &'a mut T,
    path: &mut Path,
    desc: &Arc<ParamDescriptor>,
    authz: &dyn Authorizer,
) -> Result<Node<'a>> {
    require_read(desc, authz)?;
    let name = front_name(path, desc)?;
    if name != value.alternative() {
        return Err(Error::not_found(format!(
            "'{}' holds alternative '{}', not '{}'",
            desc.oid(),
            value.alternative(),
            name
        )));
    }
    let sub = Arc::clone(desc.sub_param(&name)?);
    require_read(&sub, authz)?;
    path.pop();
    let payload = value.value_mut();
    if path.is_empty() {
        return Ok(Node {
            value: payload,
            descriptor: sub,
        });
    }
    payload.get_param(path, &sub, authz)
}

#[doc(hidden)]
pub fn check_set_value<T: VariantInfo>(
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
    let Some(src) = src.as_struct_variant() else {
        return Err(mismatch(desc, "struct variant", src));
    };
    let alternative = src.struct_variant_type.as_str();
    if !T::ALTERNATIVES.contains(&alternative) {
        return Err(Error::not_found(format!(
            "'{}' has no alternative named '{}'",
            desc.oid(),
            alternative
        )));
    }
    let sub = desc.sub_param(alternative)?;
    let child_oid = format!("{}/{}", oid, alternative);
    if value.alternative() == alternative {
        value
            .value()
            .check_set_value(&src.value, None, sub, &child_oid, authz, txn)
    } else {
        selected::<T>(alternative)
            .value()
            .check_set_value(&src.value, None, sub, &child_oid, authz, txn)
    }
}

#[doc(hidden)]
pub fn check_layout<T: VariantInfo>(desc: &ParamDescriptor) -> Result<()> {
    for &alternative in T::ALTERNATIVES {
        let sub = desc.sub_param(alternative).map_err(|_| {
            Error::internal(format!(
                "descriptor '{}' is missing alternative '{}'",
                desc.oid(),
                alternative
            ))
        })?;
        selected::<T>(alternative).value().check_descriptor(sub)?;
    }
    Ok(())
}

#[doc(hidden)]
pub fn describe<T: VariantInfo>(builder: ParamDescriptorBuilder) -> ParamDescriptorBuilder {
    let mut builder = builder;
    for &alternative in T::ALTERNATIVES {
        let sample = selected::<T>(alternative);
        builder = builder.sub_param_with(alternative, |child| describe_child(sample.value(), child));
    }
    builder
}

#[doc(hidden)]
pub fn check_element<T: VariantInfo>(
    current: Option<&T>,
    src: &Value,
    desc: &ParamDescriptor,
    oid: &str,
    authz: &dyn Authorizer,
    txn: &mut SetValueTransaction,
) -> Result<()> {
    match current {
        Some(current) => check_set_value(current, src, None, desc, oid, authz, txn),
        None => check_set_value(&T::default(), src, None, desc, oid, authz, txn),
    }
}

#[doc(hidden)]
pub fn pack(items: Vec<Value>) -> Value {
    Value::StructVariantArray(
        items
            .into_iter()
            .filter_map(|v| match v {
                Value::StructVariant(s) => Some(s),
                _ => None,
            })
            .collect(),
    )
}

#[doc(hidden)]
pub fn unpack(src: &Value) -> Option<Vec<Value>> {
    match src {
        Value::StructVariantArray(items) => {
            Some(items.iter().cloned().map(Value::StructVariant).collect())
        }
        _ => None,
    }
}

/// Declare an enum usable as a variant param value
///
/// Each alternative wraps exactly one [`ParamValue`](crate::ParamValue). The
/// first alternative, with a default payload, is the enum's `Default`.
#[macro_export]
macro_rules! catena_variant {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident {
            $first:ident ( $fty:ty )
            $(, $alt:ident ( $aty:ty ) )* $(,)?
        }
    ) => {
        $(#[$meta])*
        $vis enum $name {
            $first($fty),
            $( $alt($aty), )*
        }

        impl ::std::default::Default for $name {
            fn default() -> Self {
                $name::$first(::std::default::Default::default())
            }
        }

        impl $crate::VariantInfo for $name {
            const ALTERNATIVES: &'static [&'static str] = &[stringify!($first) $(, stringify!($alt))*];

            fn alternative(&self) -> &'static str {
                match self {
                    $name::$first(_) => stringify!($first),
                    $( $name::$alt(_) => stringify!($alt), )*
                }
            }

            fn value(&self) -> &dyn $crate::ParamValue {
                match self {
                    $name::$first(v) => v as &dyn $crate::ParamValue,
                    $( $name::$alt(v) => v as &dyn $crate::ParamValue, )*
                }
            }

            fn value_mut(&mut self) -> &mut dyn $crate::ParamValue {
                match self {
                    $name::$first(v) => v as &mut dyn $crate::ParamValue,
                    $( $name::$alt(v) => v as &mut dyn $crate::ParamValue, )*
                }
            }

            fn select(&mut self, name: &str) -> bool {
                if $crate::VariantInfo::alternative(self) == name {
                    return true;
                }
                match name {
                    stringify!($first) => {
                        *self = $name::$first(::std::default::Default::default());
                        true
                    }
                    $(
                        stringify!($alt) => {
                            *self = $name::$alt(::std::default::Default::default());
                            true
                        }
                    )*
                    _ => false,
                }
            }
        }

        impl $crate::ParamValue for $name {
            fn param_type(&self) -> $crate::__core::ParamType {
                $crate::__core::ParamType::StructVariant
            }

            fn to_wire(
                &self,
                desc: &$crate::__core::ParamDescriptor,
                authz: &dyn $crate::__core::Authorizer,
            ) -> $crate::__core::Value {
                $crate::variant::to_wire(self, desc, authz)
            }

            fn from_wire(
                &mut self,
                src: &$crate::__core::Value,
                desc: &$crate::__core::ParamDescriptor,
                authz: &dyn $crate::__core::Authorizer,
            ) {
                $crate::variant::from_wire(self, src, desc, authz)
            }

            fn get_param<'a>(
                &'a mut self,
                path: &mut $crate::__core::Path,
                desc: &::std::sync::Arc<$crate::__core::ParamDescriptor>,
                authz: &dyn $crate::__core::Authorizer,
            ) -> $crate::__core::Result<$crate::Node<'a>> {
                $crate::variant::get_param(self, path, desc, authz)
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
                $crate::variant::check_set_value(self, src, index, desc, oid, authz, txn)
            }

            fn check_layout(&self, desc: &$crate::__core::ParamDescriptor) -> $crate::__core::Result<()> {
                $crate::variant::check_layout::<Self>(desc)
            }

            fn describe(
                &self,
                builder: $crate::__core::ParamDescriptorBuilder,
            ) -> $crate::__core::ParamDescriptorBuilder {
                $crate::variant::describe::<Self>(builder)
            }
        }

        impl $crate::Element for $name {
            const ARRAY_TYPE: $crate::__core::ParamType =
                $crate::__core::ParamType::StructVariantArray;
            const COMPOSITE: bool = true;

            fn pack(items: ::std::vec::Vec<$crate::__core::Value>) -> $crate::__core::Value {
                $crate::variant::pack(items)
            }

            fn unpack(
                src: &$crate::__core::Value,
            ) -> ::std::option::Option<::std::vec::Vec<$crate::__core::Value>> {
                $crate::variant::unpack(src)
            }

            fn check_element(
                current: ::std::option::Option<&Self>,
                src: &$crate::__core::Value,
                desc: &$crate::__core::ParamDescriptor,
                oid: &str,
                authz: &dyn $crate::__core::Authorizer,
                txn: &mut $crate::SetValueTransaction,
            ) -> $crate::__core::Result<()> {
                $crate::variant::check_element(current, src, desc, oid, authz, txn)
            }
        }
    };
}
