//! Value constraints
//!
//! A constraint restricts the values a param accepts from clients. The
//! param layer only calls through the [`Constraint`] trait:
//!
//! - `satisfied`: accept the value as is
//! - `apply`: for range constraints, the nearest acceptable value
//!
//! Constraints may be shared by many descriptors, in which case they are
//! referenced by oid in metadata instead of being inlined.

use crate::value::Value;
use crate::wire::{self, IntChoice, PolyglotText, StringStringChoice};
use std::collections::BTreeSet;
use std::fmt::Debug;

/// Polymorphic value constraint
pub trait Constraint: Debug + Send + Sync {
    /// True if `value` may be assigned unchanged
    fn satisfied(&self, value: &Value) -> bool;

    /// Constrained version of `value`; `Value::Empty` when not applicable
    fn apply(&self, value: &Value) -> Value;

    /// True for range constraints, whose `apply` yields a usable value
    fn is_range(&self) -> bool {
        false
    }

    /// True if several descriptors reference this constraint by oid
    fn is_shared(&self) -> bool;

    /// Oid of the constraint
    fn oid(&self) -> &str;

    /// Metadata form of the constraint
    fn to_proto(&self) -> wire::Constraint;
}

// ============================================================================
// Range
// ============================================================================

/// Numeric types usable in a [`RangeConstraint`]
pub trait RangeBound: Copy + PartialOrd + Debug + Send + Sync + 'static {
    /// Extract from a wire value of the matching kind
    fn from_value(value: &Value) -> Option<Self>;
    /// Wrap in a wire value
    fn into_value(self) -> Value;
    /// Distance of `v` above the step grid anchored at `min`
    fn off_grid(v: Self, min: Self, step: Self) -> Self;
    /// True when `step` means "continuous"
    fn is_zero(step: Self) -> bool;
    /// `a - b`
    fn sub(a: Self, b: Self) -> Self;
    /// Metadata form
    fn range_proto(min: Self, max: Self, step: Self, dmin: Self, dmax: Self) -> wire::Constraint;
}

impl RangeBound for i32 {
    fn from_value(value: &Value) -> Option<Self> {
        value.as_i32()
    }

    fn into_value(self) -> Value {
        Value::Int32(self)
    }

    fn off_grid(v: Self, min: Self, step: Self) -> Self {
        ((v as i64 - min as i64) % step as i64) as i32
    }

    fn is_zero(step: Self) -> bool {
        step == 0
    }

    fn sub(a: Self, b: Self) -> Self {
        a.saturating_sub(b)
    }

    fn range_proto(min: Self, max: Self, step: Self, dmin: Self, dmax: Self) -> wire::Constraint {
        wire::Constraint::IntRange {
            min_value: min,
            max_value: max,
            step,
            display_min: dmin,
            display_max: dmax,
        }
    }
}

impl RangeBound for f32 {
    fn from_value(value: &Value) -> Option<Self> {
        value.as_f32()
    }

    fn into_value(self) -> Value {
        Value::Float32(self)
    }

    fn off_grid(v: Self, min: Self, step: Self) -> Self {
        (v - min) % step
    }

    fn is_zero(step: Self) -> bool {
        step == 0.0
    }

    fn sub(a: Self, b: Self) -> Self {
        a - b
    }

    fn range_proto(min: Self, max: Self, step: Self, dmin: Self, dmax: Self) -> wire::Constraint {
        wire::Constraint::FloatRange {
            min_value: min,
            max_value: max,
            step,
            display_min: dmin,
            display_max: dmax,
        }
    }
}

/// Inclusive numeric range with an optional step grid
#[derive(Debug, Clone)]
pub struct RangeConstraint<T: RangeBound> {
    min: T,
    max: T,
    step: T,
    display_min: T,
    display_max: T,
    oid: String,
    shared: bool,
}

impl<T: RangeBound> RangeConstraint<T> {
    /// Range whose display bounds equal its limits
    pub fn new(min: T, max: T, step: T, oid: impl Into<String>, shared: bool) -> Self {
        RangeConstraint {
            min,
            max,
            step,
            display_min: min,
            display_max: max,
            oid: oid.into(),
            shared,
        }
    }

    /// Set the bounds a UI should offer
    pub fn with_display(mut self, display_min: T, display_max: T) -> Self {
        self.display_min = display_min;
        self.display_max = display_max;
        self
    }

    /// Lower limit
    pub fn min(&self) -> T {
        self.min
    }

    /// Upper limit
    pub fn max(&self) -> T {
        self.max
    }

    fn on_grid(&self, v: T) -> bool {
        T::is_zero(self.step) || T::is_zero(T::off_grid(v, self.min, self.step))
    }
}

impl<T: RangeBound> Constraint for RangeConstraint<T> {
    fn satisfied(&self, value: &Value) -> bool {
        match T::from_value(value) {
            Some(v) => v >= self.min && v <= self.max && self.on_grid(v),
            None => false,
        }
    }

    fn apply(&self, value: &Value) -> Value {
        let Some(v) = T::from_value(value) else {
            return Value::Empty;
        };
        let constrained = if v < self.min {
            self.min
        } else if v > self.max {
            self.max
        } else if !self.on_grid(v) {
            T::sub(v, T::off_grid(v, self.min, self.step))
        } else {
            v
        };
        constrained.into_value()
    }

    fn is_range(&self) -> bool {
        true
    }

    fn is_shared(&self) -> bool {
        self.shared
    }

    fn oid(&self) -> &str {
        &self.oid
    }

    fn to_proto(&self) -> wire::Constraint {
        T::range_proto(
            self.min,
            self.max,
            self.step,
            self.display_min,
            self.display_max,
        )
    }
}

// ============================================================================
// Choices
// ============================================================================

/// Labelled set of int32 values
#[derive(Debug, Clone)]
pub struct IntChoiceConstraint {
    choices: Vec<IntChoice>,
    oid: String,
    shared: bool,
}

impl IntChoiceConstraint {
    /// Create from `(value, label)` pairs
    pub fn new(
        choices: impl IntoIterator<Item = (i32, PolyglotText)>,
        oid: impl Into<String>,
        shared: bool,
    ) -> Self {
        IntChoiceConstraint {
            choices: choices
                .into_iter()
                .map(|(value, name)| IntChoice { value, name })
                .collect(),
            oid: oid.into(),
            shared,
        }
    }
}

impl Constraint for IntChoiceConstraint {
    fn satisfied(&self, value: &Value) -> bool {
        value
            .as_i32()
            .map(|v| self.choices.iter().any(|c| c.value == v))
            .unwrap_or(false)
    }

    fn apply(&self, _value: &Value) -> Value {
        Value::Empty
    }

    fn is_shared(&self) -> bool {
        self.shared
    }

    fn oid(&self) -> &str {
        &self.oid
    }

    fn to_proto(&self) -> wire::Constraint {
        wire::Constraint::IntChoice {
            choices: self.choices.clone(),
        }
    }
}

/// Labelled set of strings; non-strict instances accept anything
#[derive(Debug, Clone)]
pub struct StringChoiceConstraint {
    choices: Vec<StringStringChoice>,
    strict: bool,
    oid: String,
    shared: bool,
}

impl StringChoiceConstraint {
    /// Create from `(value, label)` pairs
    pub fn new(
        choices: impl IntoIterator<Item = (String, PolyglotText)>,
        strict: bool,
        oid: impl Into<String>,
        shared: bool,
    ) -> Self {
        StringChoiceConstraint {
            choices: choices
                .into_iter()
                .map(|(value, name)| StringStringChoice { value, name })
                .collect(),
            strict,
            oid: oid.into(),
            shared,
        }
    }
}

impl Constraint for StringChoiceConstraint {
    fn satisfied(&self, value: &Value) -> bool {
        if !self.strict {
            return true;
        }
        value
            .as_str()
            .map(|s| self.choices.iter().any(|c| c.value == s))
            .unwrap_or(false)
    }

    fn apply(&self, _value: &Value) -> Value {
        Value::Empty
    }

    fn is_shared(&self) -> bool {
        self.shared
    }

    fn oid(&self) -> &str {
        &self.oid
    }

    fn to_proto(&self) -> wire::Constraint {
        wire::Constraint::StringStringChoice {
            choices: self.choices.clone(),
        }
    }
}

/// Unlabelled string list
#[derive(Debug, Clone)]
pub struct PicklistConstraint {
    choices: BTreeSet<String>,
    strict: bool,
    oid: String,
    shared: bool,
}

impl PicklistConstraint {
    /// Create from a list of strings
    pub fn new<I, S>(choices: I, strict: bool, oid: impl Into<String>, shared: bool) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        PicklistConstraint {
            choices: choices.into_iter().map(Into::into).collect(),
            strict,
            oid: oid.into(),
            shared,
        }
    }
}

impl Constraint for PicklistConstraint {
    fn satisfied(&self, value: &Value) -> bool {
        if !self.strict {
            return true;
        }
        value
            .as_str()
            .map(|s| self.choices.contains(s))
            .unwrap_or(false)
    }

    fn apply(&self, _value: &Value) -> Value {
        Value::Empty
    }

    fn is_shared(&self) -> bool {
        self.shared
    }

    fn oid(&self) -> &str {
        &self.oid
    }

    fn to_proto(&self) -> wire::Constraint {
        wire::Constraint::StringChoice {
            choices: self.choices.iter().cloned().collect(),
        }
    }
}
