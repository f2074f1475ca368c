//! Path Resolution Tests
//!
//! `get_param` walks arrays by index and structs by field name; every node
//! it returns carries the fully qualified oid of its position.

use crate::common::*;
use catena::{Param, ParamWithValue, Path, ScopeAuthorizer, StatusCode, Value};

fn path(s: &str) -> Path {
    Path::parse_str(s).unwrap()
}

fn code_of(result: catena::Result<Box<dyn Param + '_>>) -> StatusCode {
    match result {
        Ok(_) => StatusCode::Ok,
        Err(e) => e.code(),
    }
}

// ============================================================================
// Arrays
// ============================================================================

#[test]
fn int_array_index_resolution() {
    let desc = int_array_descriptor("ints", 8);
    let authz = ScopeAuthorizer::disabled();
    let mut ints = vec![10, 20, 30];
    let mut param = ParamWithValue::new("/ints", &mut ints, desc);

    {
        let first = param.get_param(&mut path("/0"), authz).unwrap();
        assert_eq!(first.oid(), "/ints/0");
        assert_eq!(first.to_value(authz).unwrap(), Value::Int32(10));
    }
    assert_eq!(code_of(param.get_param(&mut path("/3"), authz)), StatusCode::OutOfRange);
    assert_eq!(code_of(param.get_param(&mut path("/abc"), authz)), StatusCode::InvalidArgument);
    assert_eq!(code_of(param.get_param(&mut path("/0/0"), authz)), StatusCode::NotFound);
    assert_eq!(code_of(param.get_param(&mut path("/-"), authz)), StatusCode::OutOfRange);
}

#[test]
fn element_writes_reach_the_array() {
    let desc = int_array_descriptor("ints", 8);
    let authz = ScopeAuthorizer::disabled();
    let mut ints = vec![10, 20, 30];
    {
        let mut param = ParamWithValue::new("/ints", &mut ints, desc);
        let mut second = param.get_param(&mut path("/1"), authz).unwrap();
        second.from_proto(&Value::Int32(99), authz).unwrap();
    }
    assert_eq!(ints, vec![10, 99, 30]);
}

// ============================================================================
// Structs
// ============================================================================

#[test]
fn nested_struct_field_resolution() {
    let desc = descriptor_for::<TestStruct2>("camera");
    let authz = ScopeAuthorizer::disabled();
    let mut camera = TestStruct2 {
        label: "main".to_string(),
        inner: TestStruct1 { f1: 0.5, f2: 7 },
        tags: vec!["a".to_string(), "b".to_string()],
    };
    let mut param = ParamWithValue::new("/camera", &mut camera, desc);

    {
        let f2 = param.get_param(&mut path("/inner/f2"), authz).unwrap();
        assert_eq!(f2.oid(), "/camera/inner/f2");
        assert_eq!(f2.get::<i32>(), Some(&7));
    }
    {
        let tag = param.get_param(&mut path("/tags/1"), authz).unwrap();
        assert_eq!(tag.oid(), "/camera/tags/1");
        assert_eq!(tag.get::<String>().map(String::as_str), Some("b"));
    }
    assert_eq!(code_of(param.get_param(&mut path("/nope"), authz)), StatusCode::NotFound);
    assert_eq!(code_of(param.get_param(&mut path("/0"), authz)), StatusCode::InvalidArgument);
    assert_eq!(code_of(param.get_param(&mut path("/label/x"), authz)), StatusCode::InvalidArgument);
}

#[test]
fn struct_array_element_field_resolution() {
    let desc = descriptor_for::<Vec<TestStruct1>>("pairs");
    let authz = ScopeAuthorizer::disabled();
    let mut pairs = vec![TestStruct1::default(), TestStruct1 { f1: 2.5, f2: 9 }];
    let mut param = ParamWithValue::new("/pairs", &mut pairs, desc);

    let mut f1 = param.get_param(&mut path("/1/f1"), authz).unwrap();
    assert_eq!(f1.oid(), "/pairs/1/f1");
    assert_eq!(f1.param_type(), catena::ParamType::Float32);
    f1.from_proto(&Value::Float32(4.0), authz).unwrap();
    assert_eq!(f1.get::<f32>(), Some(&4.0));
}

// ============================================================================
// Device lookup
// ============================================================================

#[test]
fn device_paths_start_at_top_level_params() {
    let dev = test_device();
    let authz = ScopeAuthorizer::disabled();
    let mut guard = dev.lock();

    assert_eq!(guard.get_value("/location/f2", authz).unwrap(), Value::Int32(3));
    assert_eq!(guard.get_value("/gains/1", authz).unwrap(), Value::Int32(2));
    assert_eq!(code_of(guard.get_param("/nothing", authz)), StatusCode::NotFound);
    assert_eq!(code_of(guard.get_param("/gains/7", authz)), StatusCode::OutOfRange);
    assert_eq!(code_of(guard.get_param("/location/", authz)), StatusCode::InvalidArgument);
}
