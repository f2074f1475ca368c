//! Device container for Catena parameter trees
//!
//! A [`Device`] registers top-level params and commands for one slot and
//! serializes access to them behind a mutex. On top of the per-param
//! protocol of `catena-params` it adds:
//! - oid lookup from the top of the tree
//! - validated, all-or-nothing multi-value set requests
//! - value-set listeners
//! - subscriptions and detail-level filtering of the serialized device
//! - [`DeviceConfig`], loaded from `catena.toml`

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod device;
pub mod message;

pub use config::{DetailLevel, DeviceConfig, CONFIG_FILE_NAME};
pub use device::{Device, DeviceGuard};
pub use message::{DeviceHeader, DeviceMessage, SetValuePayload};
