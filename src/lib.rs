//! Catena - typed, constrained, authorization-checked parameter trees
//!
//! Catena models the parameters of a media device as a tree of native Rust
//! values. Each position in the tree is governed by a descriptor carrying
//! its metadata, constraint and access scope, and is addressed by an oid
//! path such as `/audio/channels/2/gain`.
//!
//! # Quick Start
//!
//! ```
//! use catena::{Device, ParamDescriptor, ParamType, ScopeAuthorizer, Value};
//!
//! let device = Device::new(1);
//! let gain = ParamDescriptor::builder(ParamType::Int32, "gain")
//!     .defaults(device.defaults())
//!     .build();
//! device.add_param("gain", 0i32, gain)?;
//!
//! let authz = ScopeAuthorizer::disabled();
//! let mut guard = device.lock();
//! guard.set_value("/gain", Value::Int32(12), authz)?;
//! assert_eq!(guard.get_value("/gain", authz)?, Value::Int32(12));
//! # Ok::<(), catena::Error>(())
//! ```
//!
//! # Architecture
//!
//! - `catena-core`: errors, paths, wire values, descriptors, constraints and
//!   the authorizer
//! - `catena-params`: the value model and the path access / mutation protocol
//! - `catena-device`: the device container, multi-set requests and config

pub use catena_core::{
    authz, constraint, descriptor, path, wire, Authorizer, CommandHandler, CommandResponse,
    Constraint, DeviceDefaults, Error, Index, IntChoiceConstraint, ParamDescriptor,
    ParamDescriptorBuilder, ParamInfo, ParamInfoResponse, ParamType, Path, PathParseError,
    PicklistConstraint, PolyglotText, RangeBound, RangeConstraint, Result, Scope, ScopeAuthorizer,
    Segment, StatusCode, StringChoiceConstraint, StructValue, StructVariantValue, Value,
    DEFAULT_MAX_LENGTH, DEFAULT_SCOPE, DEFAULT_TOTAL_LENGTH,
};
pub use catena_device::{
    DetailLevel, Device, DeviceConfig, DeviceGuard, DeviceHeader, DeviceMessage, SetValuePayload,
    CONFIG_FILE_NAME,
};
pub use catena_params::{
    catena_struct, catena_variant, describe, Element, EmptyValue, Param, ParamValue,
    ParamVisitor, ParamWithValue, SetValueTransaction, SizeTracker, StructInfo, traverse_params,
    VariantInfo,
};
