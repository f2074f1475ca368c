//! Core types for the Catena parameter model
//!
//! This crate defines the leaf building blocks consumed by the param layer:
//! - Error / StatusCode: status taxonomy for every fallible operation
//! - Path: oid paths with a walkable front cursor
//! - Value: the wire value tagged union
//! - wire: metadata messages (Param, ParamInfo, Constraint, CommandResponse)
//! - Constraint: range, choice and picklist constraints
//! - DeviceDefaults: live device-wide length and scope defaults
//! - ParamDescriptor: per-position metadata trees
//! - Authorizer: read/write capability checks, ScopeAuthorizer

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod authz;
pub mod constraint;
pub mod defaults;
pub mod descriptor;
pub mod error;
pub mod path;
pub mod value;
pub mod wire;

pub use authz::{Authorizer, Scope, ScopeAuthorizer};
pub use constraint::{
    Constraint, IntChoiceConstraint, PicklistConstraint, RangeBound, RangeConstraint,
    StringChoiceConstraint,
};
pub use defaults::{DeviceDefaults, DEFAULT_MAX_LENGTH, DEFAULT_SCOPE, DEFAULT_TOTAL_LENGTH};
pub use descriptor::{CommandHandler, ParamDescriptor, ParamDescriptorBuilder};
pub use error::{Error, Result, StatusCode};
pub use path::{Index, Path, PathParseError, Segment};
pub use value::{StructValue, StructVariantValue, Value};
pub use wire::{CommandResponse, ParamInfo, ParamInfoResponse, ParamType, PolyglotText};
