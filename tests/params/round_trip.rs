//! Wire Round-Trip Tests
//!
//! `from_proto(to_proto(v)) == v` for every value shape:
//! - scalars and strings
//! - scalar and string arrays
//! - structs, nested structs and struct arrays
//! - variants and variant arrays

use crate::common::*;
use catena::{wire, Param, ParamValue, ParamWithValue, ScopeAuthorizer, Value};
use proptest::prelude::*;
use std::fmt::Debug;

fn round_trip<T: ParamValue + Default + Debug>(mut source: T) -> T {
    let desc = descriptor_for::<T>("value");
    let authz = ScopeAuthorizer::disabled();

    let mut msg = wire::Param::default();
    ParamWithValue::new("/value", &mut source, desc.clone())
        .to_proto(&mut msg, authz)
        .unwrap();
    let value = msg.value.expect("readable value is serialized");

    let mut target = T::default();
    ParamWithValue::new("/value", &mut target, desc)
        .from_proto(&value, authz)
        .unwrap();
    target
}

fn float() -> impl Strategy<Value = f32> {
    -1.0e6f32..1.0e6f32
}

fn word() -> impl Strategy<Value = String> {
    "[a-z ]{0,8}"
}

fn struct1() -> impl Strategy<Value = TestStruct1> {
    (float(), any::<i32>()).prop_map(|(f1, f2)| TestStruct1 { f1, f2 })
}

fn struct2() -> impl Strategy<Value = TestStruct2> {
    (word(), struct1(), prop::collection::vec(word(), 0..4)).prop_map(|(label, inner, tags)| {
        TestStruct2 { label, inner, tags }
    })
}

fn variant() -> impl Strategy<Value = TestVariant> {
    prop_oneof![
        struct1().prop_map(TestVariant::TestStruct1),
        struct2().prop_map(TestVariant::TestStruct2),
        any::<i32>().prop_map(TestVariant::Count),
    ]
}

proptest! {
    #[test]
    fn int32_round_trips(v in any::<i32>()) {
        prop_assert_eq!(round_trip(v), v);
    }

    #[test]
    fn float32_round_trips(v in float()) {
        prop_assert_eq!(round_trip(v), v);
    }

    #[test]
    fn string_round_trips(v in word()) {
        prop_assert_eq!(round_trip(v.clone()), v);
    }

    #[test]
    fn int32_array_round_trips(v in prop::collection::vec(any::<i32>(), 0..8)) {
        prop_assert_eq!(round_trip(v.clone()), v);
    }

    #[test]
    fn float32_array_round_trips(v in prop::collection::vec(float(), 0..8)) {
        prop_assert_eq!(round_trip(v.clone()), v);
    }

    #[test]
    fn string_array_round_trips(v in prop::collection::vec(word(), 0..6)) {
        prop_assert_eq!(round_trip(v.clone()), v);
    }

    #[test]
    fn struct_round_trips(v in struct1()) {
        prop_assert_eq!(round_trip(v.clone()), v);
    }

    #[test]
    fn nested_struct_round_trips(v in struct2()) {
        prop_assert_eq!(round_trip(v.clone()), v);
    }

    #[test]
    fn struct_array_round_trips(v in prop::collection::vec(struct1(), 0..5)) {
        prop_assert_eq!(round_trip(v.clone()), v);
    }

    #[test]
    fn variant_round_trips(v in variant()) {
        prop_assert_eq!(round_trip(v.clone()), v);
    }

    #[test]
    fn variant_array_round_trips(v in prop::collection::vec(variant(), 0..5)) {
        prop_assert_eq!(round_trip(v.clone()), v);
    }
}

// ============================================================================
// Scalar end to end
// ============================================================================

#[test]
fn int32_param_end_to_end() {
    let desc = descriptor_for::<i32>("level");
    let authz = ScopeAuthorizer::disabled();
    let mut level = 16i32;
    let mut param = ParamWithValue::new("/level", &mut level, desc);

    let mut msg = wire::Param::default();
    param.to_proto(&mut msg, authz).unwrap();
    assert_eq!(msg.param_type, catena::ParamType::Int32);
    assert_eq!(msg.value, Some(Value::Int32(16)));

    param.from_proto(&Value::Int32(32), authz).unwrap();
    assert_eq!(*param.get(), 32);
    drop(param);
    assert_eq!(level, 32);
}

#[test]
fn wrong_kind_is_ignored_by_from_proto() {
    let desc = descriptor_for::<TestStruct1>("location");
    let authz = ScopeAuthorizer::disabled();
    let mut location = TestStruct1 { f1: 1.0, f2: 2 };
    ParamWithValue::new("/location", &mut location, desc)
        .from_proto(&Value::Int32(5), authz)
        .unwrap();
    assert_eq!(location, TestStruct1 { f1: 1.0, f2: 2 });
}
