//! Multi-Set Tests
//!
//! A set request is validated as a whole before any value is applied.

use crate::common::*;
use catena::{
    Device, ParamDescriptor, ParamType, PicklistConstraint, ScopeAuthorizer, SetValuePayload,
    StatusCode, StructValue, Value,
};
use parking_lot::Mutex;
use std::sync::Arc;
use std::thread;

fn set(oid: &str, value: Value) -> SetValuePayload {
    SetValuePayload::new(oid, value)
}

fn text(s: &str) -> Value {
    Value::String(s.to_string())
}

#[test]
fn batch_applies_every_value_in_order() {
    init_tracing();
    let dev = test_device();
    let authz = ScopeAuthorizer::disabled();
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    dev.on_value_set_by_client(move |oid, _| sink.lock().push(oid.to_string()));

    let batch = [
        set("/counter", Value::Int32(5)),
        set("/camera/label", text("wide")),
        set("/camera/tags/-", text("outdoor")),
        set("/pairs/1/f2", Value::Int32(8)),
    ];
    let mut guard = dev.lock();
    guard.multi_set_value(&batch, authz).unwrap();

    assert_eq!(guard.get_value("/counter", authz).unwrap(), Value::Int32(5));
    assert_eq!(guard.get_value("/camera/label", authz).unwrap(), text("wide"));
    assert_eq!(guard.get_value("/camera/tags/0", authz).unwrap(), text("outdoor"));
    assert_eq!(guard.get_value("/pairs/1/f2", authz).unwrap(), Value::Int32(8));
    drop(guard);

    assert_eq!(
        *seen.lock(),
        vec!["/counter", "/camera/label", "/camera/tags/-", "/pairs/1/f2"]
    );
}

#[test]
fn failing_batch_applies_nothing() {
    init_tracing();
    let dev = test_device();
    let authz = ScopeAuthorizer::disabled();
    let fired = Arc::new(Mutex::new(0usize));
    let sink = Arc::clone(&fired);
    dev.on_value_set_by_client(move |_, _| *sink.lock() += 1);

    // "one" + "abcdef" + "abcd" is 13 characters against a budget of 12
    let batch = [
        set("/counter", Value::Int32(5)),
        set("/names/-", text("abcdef")),
        set("/names/-", text("abcd")),
    ];
    let mut guard = dev.lock();
    let err = guard.multi_set_value(&batch, authz).unwrap_err();
    assert_eq!(err.code(), StatusCode::OutOfRange);

    assert_eq!(guard.get_value("/counter", authz).unwrap(), Value::Int32(0));
    assert_eq!(
        guard.get_value("/names", authz).unwrap(),
        Value::StringArray(vec!["one".to_string()])
    );
    drop(guard);
    assert_eq!(*fired.lock(), 0);
}

#[test]
fn append_dropped_by_constraint_keeps_the_batch_going() {
    let dev = test_device();
    let authz = ScopeAuthorizer::disabled();
    let colours = ParamDescriptor::builder(ParamType::StringArray, "colours")
        .max_length(4)
        .constraint(Arc::new(PicklistConstraint::new(["red", "blue"], true, "", false)))
        .defaults(dev.defaults())
        .build();
    dev.add_param("colours", vec!["red".to_string()], colours).unwrap();

    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    dev.on_value_set_by_client(move |oid, param| {
        let value = param.to_value(ScopeAuthorizer::disabled()).unwrap();
        sink.lock().push((oid.to_string(), value));
    });

    let batch = [
        set("/colours/-", text("mauve")),
        set("/colours/-", text("blue")),
        set("/counter", Value::Int32(5)),
    ];
    let mut guard = dev.lock();
    guard.try_multi_set_value(&batch, authz).unwrap();
    guard.multi_set_value(&batch, authz).unwrap();

    assert_eq!(guard.get_value("/counter", authz).unwrap(), Value::Int32(5));
    assert_eq!(
        guard.get_value("/colours", authz).unwrap(),
        Value::StringArray(vec!["red".to_string(), "blue".to_string()])
    );
    drop(guard);
    assert_eq!(
        *seen.lock(),
        vec![
            ("/colours/-".to_string(), text("blue")),
            ("/counter".to_string(), Value::Int32(5)),
        ]
    );
}

#[test]
fn appends_share_the_element_budget() {
    let dev = test_device();
    let authz = ScopeAuthorizer::disabled();
    let mut guard = dev.lock();

    let two = [set("/gains/-", Value::Int32(3)), set("/gains/-", Value::Int32(4))];
    guard.multi_set_value(&two, authz).unwrap();
    assert_eq!(
        guard.get_value("/gains", authz).unwrap(),
        Value::Int32Array(vec![1, 2, 3, 4])
    );

    let err = guard
        .set_value("/gains/-", Value::Int32(5), authz)
        .unwrap_err();
    assert_eq!(err.code(), StatusCode::OutOfRange);
}

#[test]
fn overlapping_oids_are_rejected() {
    let dev = test_device();
    let authz = ScopeAuthorizer::disabled();
    let mut guard = dev.lock();

    let batch = [
        set("/location", Value::Struct(StructValue::new())),
        set("/location/f1", Value::Float32(1.0)),
    ];
    let err = guard.try_multi_set_value(&batch, authz).unwrap_err();
    assert_eq!(err.code(), StatusCode::InvalidArgument);

    let batch = [set("/pairs/0/f1", Value::Float32(1.0)), set("/pairs/0", Value::Struct(StructValue::new()))];
    let err = guard.try_multi_set_value(&batch, authz).unwrap_err();
    assert_eq!(err.code(), StatusCode::InvalidArgument);

    let batch = [set("/pairs/0/f1", Value::Float32(1.0)), set("/pairs/1/f1", Value::Float32(2.0))];
    guard.try_multi_set_value(&batch, authz).unwrap();
}

#[test]
fn try_never_mutates() {
    let dev = test_device();
    let authz = ScopeAuthorizer::disabled();
    let mut guard = dev.lock();

    let batch = [set("/counter", Value::Int32(5)), set("/gains/-", Value::Int32(3))];
    guard.try_multi_set_value(&batch, authz).unwrap();
    assert_eq!(guard.get_value("/counter", authz).unwrap(), Value::Int32(0));
    assert_eq!(
        guard.get_value("/gains", authz).unwrap(),
        Value::Int32Array(vec![1, 2])
    );
}

#[test]
fn restricted_client_cannot_write_admin_params() {
    let dev = Device::new(2);
    let secret = catena::ParamDescriptor::builder(catena::ParamType::Int32, "secret")
        .scope("st2138:adm")
        .defaults(dev.defaults())
        .build();
    dev.add_param("secret", 1i32, secret).unwrap();
    let operator = ScopeAuthorizer::new(["st2138:adm"]);
    let admin = ScopeAuthorizer::new(["st2138:adm:w"]);
    let mut guard = dev.lock();

    let err = guard.set_value("/secret", Value::Int32(2), &operator).unwrap_err();
    assert_eq!(err.code(), StatusCode::PermissionDenied);
    guard.set_value("/secret", Value::Int32(2), &admin).unwrap();
    assert_eq!(guard.get_value("/secret", &operator).unwrap(), Value::Int32(2));
}

#[test]
fn concurrent_clients_are_serialized() {
    let dev = Arc::new(test_device());
    let authz = ScopeAuthorizer::disabled();

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let dev = Arc::clone(&dev);
            thread::spawn(move || {
                for _ in 0..25 {
                    let mut guard = dev.lock();
                    let current = guard.get_value("/counter", authz).unwrap();
                    let next = current.as_i32().unwrap() + 1;
                    guard.set_value("/counter", Value::Int32(next), authz).unwrap();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let mut guard = dev.lock();
    assert_eq!(guard.get_value("/counter", authz).unwrap(), Value::Int32(100));
}
