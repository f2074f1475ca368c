//! Metadata messages
//!
//! Messages that carry parameter metadata alongside (or instead of) a wire
//! [`Value`]. These mirror the shape of the device-model protocol messages so
//! that transports can convert them field by field.

use crate::value::Value;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Parameter type tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ParamType {
    /// Not set
    #[default]
    Undefined,
    /// Holds no value
    Empty,
    /// int32 scalar
    Int32,
    /// float32 scalar
    Float32,
    /// UTF-8 string
    String,
    /// Fixed named fields
    Struct,
    /// Tagged union of named struct alternatives
    StructVariant,
    /// Array of int32
    Int32Array,
    /// Array of float32
    Float32Array,
    /// Array of strings
    StringArray,
    /// Array of structs
    StructArray,
    /// Array of tagged unions
    StructVariantArray,
}

impl ParamType {
    /// True for the array types
    pub fn is_array(&self) -> bool {
        matches!(
            self,
            ParamType::Int32Array
                | ParamType::Float32Array
                | ParamType::StringArray
                | ParamType::StructArray
                | ParamType::StructVariantArray
        )
    }
}

impl fmt::Display for ParamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ParamType::Undefined => "UNDEFINED",
            ParamType::Empty => "EMPTY",
            ParamType::Int32 => "INT32",
            ParamType::Float32 => "FLOAT32",
            ParamType::String => "STRING",
            ParamType::Struct => "STRUCT",
            ParamType::StructVariant => "STRUCT_VARIANT",
            ParamType::Int32Array => "INT32_ARRAY",
            ParamType::Float32Array => "FLOAT32_ARRAY",
            ParamType::StringArray => "STRING_ARRAY",
            ParamType::StructArray => "STRUCT_ARRAY",
            ParamType::StructVariantArray => "STRUCT_VARIANT_ARRAY",
        };
        f.write_str(s)
    }
}

/// Per-language display strings, keyed by language code
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PolyglotText {
    /// Language code to text
    #[serde(default)]
    pub display_strings: BTreeMap<String, String>,
}

impl PolyglotText {
    /// Build from `(language, text)` pairs
    pub fn from_pairs<I, L, T>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (L, T)>,
        L: Into<String>,
        T: Into<String>,
    {
        PolyglotText {
            display_strings: pairs
                .into_iter()
                .map(|(l, t)| (l.into(), t.into()))
                .collect(),
        }
    }

    /// Text for one language
    pub fn get(&self, language: &str) -> Option<&str> {
        self.display_strings.get(language).map(String::as_str)
    }

    /// True when no language has text
    pub fn is_empty(&self) -> bool {
        self.display_strings.is_empty()
    }
}

/// A labelled int32 choice
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntChoice {
    /// Value sent on the wire
    pub value: i32,
    /// Display label
    pub name: PolyglotText,
}

/// A labelled string choice
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StringStringChoice {
    /// Value sent on the wire
    pub value: String,
    /// Display label
    pub name: PolyglotText,
}

/// Constraint metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "type")]
pub enum Constraint {
    /// Bounded int32 range
    IntRange {
        /// Lowest accepted value
        min_value: i32,
        /// Highest accepted value
        max_value: i32,
        /// Step size; 0 means continuous
        step: i32,
        /// Lowest value a UI should offer
        display_min: i32,
        /// Highest value a UI should offer
        display_max: i32,
    },
    /// Bounded float32 range
    FloatRange {
        /// Lowest accepted value
        min_value: f32,
        /// Highest accepted value
        max_value: f32,
        /// Step size; 0 means continuous
        step: f32,
        /// Lowest value a UI should offer
        display_min: f32,
        /// Highest value a UI should offer
        display_max: f32,
    },
    /// Labelled int32 choices
    IntChoice {
        /// The choices
        choices: Vec<IntChoice>,
    },
    /// Plain string choices
    StringChoice {
        /// The choices
        choices: Vec<String>,
    },
    /// Labelled string choices
    StringStringChoice {
        /// The choices
        choices: Vec<StringStringChoice>,
    },
}

/// Full parameter message: metadata plus (authorization permitting) value
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Param {
    /// Type tag
    #[serde(rename = "type")]
    pub param_type: ParamType,
    /// Alternative oids
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub oid_aliases: Vec<String>,
    /// Display name
    #[serde(default)]
    pub name: PolyglotText,
    /// Widget hint for UIs
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub widget: String,
    /// Read-only flag
    #[serde(default)]
    pub read_only: bool,
    /// Part of the minimal set
    #[serde(default)]
    pub minimal_set: bool,
    /// Template the param was stamped from
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub template_oid: String,
    /// Inline constraint
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub constraint: Option<Constraint>,
    /// Oid of a shared constraint
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub constraint_ref_oid: String,
    /// Resolved maximum element count or string length
    #[serde(default)]
    pub max_length: u32,
    /// Resolved maximum cumulative string length
    #[serde(default)]
    pub total_length: u32,
    /// Current value; unset when reading was denied
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
    /// Metadata of readable sub-params
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub params: BTreeMap<String, Param>,
}

/// Basic identification of a param
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ParamInfo {
    /// Fully qualified oid
    pub oid: String,
    /// Display name
    #[serde(default)]
    pub name: PolyglotText,
    /// Type tag
    #[serde(rename = "type")]
    pub param_type: ParamType,
    /// Template the param was stamped from
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub template_oid: String,
}

/// Answer to a param info request
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ParamInfoResponse {
    /// The info
    pub info: ParamInfo,
    /// Element count for array params
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub array_length: Option<u32>,
}

/// Error reported by a command
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CommandException {
    /// Status code name, e.g. `UNIMPLEMENTED`
    #[serde(rename = "type")]
    pub exception_type: String,
    /// Localized message
    pub error_message: PolyglotText,
}

/// Result of executing a command
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommandResponse {
    /// Command completed with nothing to report
    NoResponse,
    /// Command completed with a value
    Response(Value),
    /// Command failed
    Exception(CommandException),
}

impl CommandResponse {
    /// Exception response with an English message
    pub fn exception(exception_type: impl Into<String>, message: impl Into<String>) -> Self {
        CommandResponse::Exception(CommandException {
            exception_type: exception_type.into(),
            error_message: PolyglotText::from_pairs([("en", message.into())]),
        })
    }
}
