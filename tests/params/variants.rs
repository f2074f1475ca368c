//! Variant Tests
//!
//! Only the active alternative of a variant is addressable; setting a value
//! for another alternative switches the variant.

use crate::common::*;
use catena::{
    Param, ParamWithValue, Path, ScopeAuthorizer, SetValueTransaction, StatusCode, StructValue,
    StructVariantValue, Value,
};

fn variant_value(alternative: &str, value: Value) -> Value {
    Value::StructVariant(StructVariantValue::new(alternative, value))
}

#[test]
fn active_alternative_is_addressable() {
    let desc = descriptor_for::<TestVariant>("shape");
    let authz = ScopeAuthorizer::disabled();
    let active = TestStruct1 { f1: 2.0, f2: 5 };
    let mut shape = TestVariant::TestStruct1(active.clone());
    let mut param = ParamWithValue::new("/shape", &mut shape, desc);

    {
        let node = param
            .get_param(&mut Path::parse_str("/TestStruct1").unwrap(), authz)
            .unwrap();
        assert_eq!(node.oid(), "/shape/TestStruct1");
        assert_eq!(node.get::<TestStruct1>(), Some(&active));
    }
    {
        let f2 = param
            .get_param(&mut Path::parse_str("/TestStruct1/f2").unwrap(), authz)
            .unwrap();
        assert_eq!(f2.to_value(authz).unwrap(), Value::Int32(5));
    }
}

#[test]
fn inactive_and_unknown_alternatives_are_not_found() {
    let desc = descriptor_for::<TestVariant>("shape");
    let authz = ScopeAuthorizer::disabled();
    let mut shape = TestVariant::Count(1);
    let mut param = ParamWithValue::new("/shape", &mut shape, desc);

    for oid in ["/TestStruct1", "/Nope"] {
        let err = param
            .get_param(&mut Path::parse_str(oid).unwrap(), authz)
            .map(|_| ())
            .unwrap_err();
        assert_eq!(err.code(), StatusCode::NotFound, "{}", oid);
    }
}

#[test]
fn set_switches_alternative() {
    let desc = descriptor_for::<TestVariant>("shape");
    let authz = ScopeAuthorizer::disabled();
    let mut shape = TestVariant::Count(1);
    {
        let mut param = ParamWithValue::new("/shape", &mut shape, desc);
        let mut txn = SetValueTransaction::new();
        let src = variant_value(
            "TestStruct2",
            Value::Struct(StructValue::new().with("label", Value::String("cam".into()))),
        );
        param.validate_set_value(&src, None, authz, &mut txn).unwrap();
    }
    match shape {
        TestVariant::TestStruct2(s) => {
            assert_eq!(s.label, "cam");
            assert_eq!(s.inner, TestStruct1::default());
        }
        other => panic!("unexpected alternative: {:?}", other),
    }
}

#[test]
fn set_with_unknown_alternative_is_rejected() {
    let desc = descriptor_for::<TestVariant>("shape");
    let authz = ScopeAuthorizer::disabled();
    let mut shape = TestVariant::Count(1);
    let param = ParamWithValue::new("/shape", &mut shape, desc);
    let mut txn = SetValueTransaction::new();

    let err = param
        .check_set_value(&variant_value("Circle", Value::Empty), None, authz, &mut txn)
        .unwrap_err();
    assert_eq!(err.code(), StatusCode::NotFound);

    let err = param
        .check_set_value(&Value::Int32(3), None, authz, &mut txn)
        .unwrap_err();
    assert_eq!(err.code(), StatusCode::InvalidArgument);
}

#[test]
fn variant_arrays_through_the_device() {
    let dev = test_device();
    let authz = ScopeAuthorizer::disabled();
    let mut guard = dev.lock();

    guard
        .set_value("/shapes/-", variant_value("Count", Value::Int32(3)), authz)
        .unwrap();
    guard
        .set_value(
            "/shapes/-",
            variant_value(
                "TestStruct1",
                Value::Struct(StructValue::new().with("f2", Value::Int32(6))),
            ),
            authz,
        )
        .unwrap();

    assert_eq!(guard.get_value("/shapes/0/Count", authz).unwrap(), Value::Int32(3));
    assert_eq!(guard.get_value("/shapes/1/TestStruct1/f2", authz).unwrap(), Value::Int32(6));
    let err = guard.get_value("/shapes/1/Count", authz).unwrap_err();
    assert_eq!(err.code(), StatusCode::NotFound);
}
