//! Device-level messages
//!
//! Payloads exchanged with a [`Device`](crate::Device) as a whole: the
//! serialized device stream and set-value requests.

use crate::config::DetailLevel;
use catena_core::{wire, Value};
use serde::{Deserialize, Serialize};

/// Device header, always the first item of a serialized device
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceHeader {
    /// Slot number
    pub slot: u32,
    /// Detail level the stream was produced with
    pub detail_level: DetailLevel,
    /// Scope of params that declare none
    pub default_scope: String,
    /// Multi-value set requests accepted
    pub multi_set_enabled: bool,
    /// Subscriptions accepted
    pub subscriptions: bool,
}

/// One item of a serialized device
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceMessage {
    /// Device-wide settings
    Header(DeviceHeader),
    /// A top-level param
    Param {
        /// Top-level oid
        oid: String,
        /// Metadata and value
        param: wire::Param,
    },
    /// A command
    Command {
        /// Top-level oid
        oid: String,
        /// Metadata
        param: wire::Param,
    },
}

/// One value of a set request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SetValuePayload {
    /// Fully qualified oid; may end in an array index or `-`
    pub oid: String,
    /// New value
    pub value: Value,
}

impl SetValuePayload {
    /// Build a payload
    pub fn new(oid: impl Into<String>, value: Value) -> Self {
        SetValuePayload {
            oid: oid.into(),
            value,
        }
    }
}
