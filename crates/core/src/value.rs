//! Wire value format
//!
//! [`Value`] is the tagged union exchanged with transport layers. Every
//! native parameter type maps onto exactly one variant:
//!
//! | Native type | Variant |
//! |-------------|---------|
//! | empty sentinel | `Empty` |
//! | `i32` / `f32` / `String` | `Int32` / `Float32` / `String` |
//! | `Vec<i32>` / `Vec<f32>` / `Vec<String>` | `Int32Array` / `Float32Array` / `StringArray` |
//! | struct | `Struct` |
//! | `Vec<struct>` | `StructArray` |
//! | variant | `StructVariant` |
//! | `Vec<variant>` | `StructVariantArray` |
//!
//! The serde representation uses the protobuf JSON field names
//! (`int32_value`, `struct_value`, ...) so REST transports can emit it
//! directly.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Wire value
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub enum Value {
    /// No value
    #[default]
    #[serde(rename = "empty_value")]
    Empty,
    /// 32-bit signed integer
    #[serde(rename = "int32_value")]
    Int32(i32),
    /// 32-bit float
    #[serde(rename = "float32_value")]
    Float32(f32),
    /// UTF-8 string
    #[serde(rename = "string_value")]
    String(String),
    /// Array of int32
    #[serde(rename = "int32_array_values")]
    Int32Array(Vec<i32>),
    /// Array of float32
    #[serde(rename = "float32_array_values")]
    Float32Array(Vec<f32>),
    /// Array of strings
    #[serde(rename = "string_array_values")]
    StringArray(Vec<String>),
    /// Named fields
    #[serde(rename = "struct_value")]
    Struct(StructValue),
    /// Array of structs
    #[serde(rename = "struct_array_values")]
    StructArray(Vec<StructValue>),
    /// One alternative of a tagged union, with its tag
    #[serde(rename = "struct_variant_value")]
    StructVariant(StructVariantValue),
    /// Array of tagged unions
    #[serde(rename = "struct_variant_array_values")]
    StructVariantArray(Vec<StructVariantValue>),
}

/// Field map of a struct value
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct StructValue {
    /// Field name to value
    #[serde(default)]
    pub fields: BTreeMap<String, Value>,
}

impl StructValue {
    /// Empty struct value
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style field insertion
    pub fn with(mut self, name: impl Into<String>, value: Value) -> Self {
        self.fields.insert(name.into(), value);
        self
    }

    /// Look up a field
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }
}

/// Tagged alternative of a variant value
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct StructVariantValue {
    /// Name of the active alternative
    pub struct_variant_type: String,
    /// Payload of the active alternative
    pub value: Box<Value>,
}

impl StructVariantValue {
    /// Create a tagged value
    pub fn new(alternative: impl Into<String>, value: Value) -> Self {
        StructVariantValue {
            struct_variant_type: alternative.into(),
            value: Box::new(value),
        }
    }
}

impl Value {
    /// Short name of the active variant, used in error messages
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Empty => "empty",
            Value::Int32(_) => "int32",
            Value::Float32(_) => "float32",
            Value::String(_) => "string",
            Value::Int32Array(_) => "int32 array",
            Value::Float32Array(_) => "float32 array",
            Value::StringArray(_) => "string array",
            Value::Struct(_) => "struct",
            Value::StructArray(_) => "struct array",
            Value::StructVariant(_) => "struct variant",
            Value::StructVariantArray(_) => "struct variant array",
        }
    }

    /// True for `Empty`
    pub fn is_empty(&self) -> bool {
        matches!(self, Value::Empty)
    }

    /// Get as int32
    pub fn as_i32(&self) -> Option<i32> {
        match self {
            Value::Int32(i) => Some(*i),
            _ => None,
        }
    }

    /// Get as float32
    pub fn as_f32(&self) -> Option<f32> {
        match self {
            Value::Float32(f) => Some(*f),
            _ => None,
        }
    }

    /// Get as string slice
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Get as struct
    pub fn as_struct(&self) -> Option<&StructValue> {
        match self {
            Value::Struct(s) => Some(s),
            _ => None,
        }
    }

    /// Get as tagged variant
    pub fn as_struct_variant(&self) -> Option<&StructVariantValue> {
        match self {
            Value::StructVariant(v) => Some(v),
            _ => None,
        }
    }

    /// Number of elements for array variants
    pub fn array_len(&self) -> Option<usize> {
        match self {
            Value::Int32Array(v) => Some(v.len()),
            Value::Float32Array(v) => Some(v.len()),
            Value::StringArray(v) => Some(v.len()),
            Value::StructArray(v) => Some(v.len()),
            Value::StructVariantArray(v) => Some(v.len()),
            _ => None,
        }
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Int32(i)
    }
}

impl From<f32> for Value {
    fn from(f: f32) -> Self {
        Value::Float32(f)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<StructValue> for Value {
    fn from(s: StructValue) -> Self {
        Value::Struct(s)
    }
}

impl From<StructVariantValue> for Value {
    fn from(v: StructVariantValue) -> Self {
        Value::StructVariant(v)
    }
}
