//! Parameter value model
//!
//! Native values implement [`ParamValue`]; a [`ParamWithValue`] borrows one
//! together with its [`ParamDescriptor`](catena_core::ParamDescriptor) and
//! exposes the path-addressed access and mutation protocol through the
//! type-erased [`Param`] trait:
//!
//! - `get_param`: walk a path into arrays, structs and variants
//! - `add_back` / `pop_back`: grow or shrink arrays
//! - `to_proto` / `from_proto`: wire conversion gated by the authorizer
//! - `check_set_value` / `validate_set_value`: length-budgeted mutation
//!
//! Struct and variant types are registered with [`catena_struct!`] and
//! [`catena_variant!`], which generate both the accessors and the layout
//! used to derive descriptor skeletons with [`describe`].

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod array;
pub mod param;
pub mod scalar;
pub mod structs;
pub mod transaction;
pub mod value;
pub mod variant;
pub mod visitor;

#[doc(hidden)]
pub use catena_core as __core;

pub use array::Element;
pub use param::{Param, ParamWithValue};
pub use scalar::EmptyValue;
pub use structs::StructInfo;
pub use transaction::{SetValueTransaction, SizeTracker};
pub use value::{describe, AsAny, Node, ParamValue};
pub use variant::VariantInfo;
pub use visitor::{traverse_params, ParamVisitor};
