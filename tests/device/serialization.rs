//! Serialization Tests
//!
//! What a client receives when it asks for the whole device.

use crate::common::*;
use catena::{
    CommandResponse, DetailLevel, Device, DeviceMessage, ParamDescriptor, ParamType,
    ScopeAuthorizer, StatusCode, Value,
};

const ALL_PARAMS: [&str; 8] = [
    "camera", "counter", "gains", "location", "names", "pairs", "shape", "shapes",
];

fn with_reboot(dev: &Device) {
    let reboot = ParamDescriptor::builder(ParamType::Int32, "reboot")
        .command(CommandResponse::Response)
        .defaults(dev.defaults())
        .build();
    dev.add_command("reboot", reboot).unwrap();
}

fn oids(items: &[DeviceMessage]) -> Vec<String> {
    items
        .iter()
        .filter_map(|item| match item {
            DeviceMessage::Header(_) => None,
            DeviceMessage::Param { oid, .. } => Some(oid.clone()),
            DeviceMessage::Command { oid, .. } => Some(format!("cmd:{}", oid)),
        })
        .collect()
}

fn serialize(dev: &Device, authz: &ScopeAuthorizer) -> Vec<String> {
    oids(&dev.lock().to_proto(authz, false))
}

// ============================================================================
// Detail levels
// ============================================================================

#[test]
fn header_comes_first() {
    let dev = test_device();
    let items = dev.lock().to_proto(ScopeAuthorizer::disabled(), false);
    match &items[0] {
        DeviceMessage::Header(header) => {
            assert_eq!(header.slot, 1);
            assert_eq!(header.detail_level, DetailLevel::Full);
        }
        other => panic!("unexpected first item: {:?}", other),
    }
    assert_eq!(items.len(), 1 + ALL_PARAMS.len());
}

#[test]
fn full_level_sends_everything_readable() {
    let dev = test_device();
    with_reboot(&dev);

    let mut expected: Vec<String> = ALL_PARAMS.iter().map(|s| s.to_string()).collect();
    expected.push("cmd:reboot".to_string());
    assert_eq!(serialize(&dev, ScopeAuthorizer::disabled()), expected);
}

#[test]
fn reduced_levels_filter_params() {
    let dev = test_device();
    with_reboot(&dev);
    let authz = ScopeAuthorizer::disabled();

    dev.set_detail_level(DetailLevel::Minimal);
    assert_eq!(serialize(&dev, authz), vec!["counter"]);

    dev.set_detail_level(DetailLevel::Commands);
    assert_eq!(serialize(&dev, authz), vec!["cmd:reboot"]);

    dev.set_detail_level(DetailLevel::None);
    assert!(serialize(&dev, authz).is_empty());
    assert_eq!(dev.lock().to_proto(authz, false).len(), 1);
}

#[test]
fn subscriptions_level_adds_subscribed_params() {
    let dev = test_device();
    let authz = ScopeAuthorizer::disabled();
    dev.set_detail_level(DetailLevel::Subscriptions);
    assert_eq!(serialize(&dev, authz), vec!["counter"]);

    assert!(dev.add_subscription("/location").unwrap());
    assert!(!dev.add_subscription("/location").unwrap());
    assert_eq!(serialize(&dev, authz), vec!["counter", "location"]);

    assert!(dev.add_subscription("/sha*").unwrap());
    assert_eq!(serialize(&dev, authz), vec!["counter", "location", "shape", "shapes"]);

    assert!(dev.remove_subscription("/location").unwrap());
    assert!(!dev.remove_subscription("/location").unwrap());
    assert_eq!(serialize(&dev, authz), vec!["counter", "shape", "shapes"]);
    assert_eq!(dev.subscribed_oids(), vec!["/sha*"]);
}

#[test]
fn shallow_sends_only_the_header() {
    let dev = test_device();
    let items = dev.lock().to_proto(ScopeAuthorizer::disabled(), true);
    assert_eq!(items.len(), 1);
    assert!(matches!(items[0], DeviceMessage::Header(_)));
}

// ============================================================================
// Authorization
// ============================================================================

#[test]
fn unreadable_params_are_left_out() {
    let dev = test_device();
    let secret = ParamDescriptor::builder(ParamType::Int32, "secret")
        .scope("st2138:adm")
        .defaults(dev.defaults())
        .build();
    dev.add_param("secret", 42i32, secret).unwrap();

    let monitor = ScopeAuthorizer::new(["st2138:mon"]);
    let listed = serialize(&dev, &monitor);
    assert_eq!(listed.len(), ALL_PARAMS.len());
    assert!(!listed.contains(&"secret".to_string()));

    let admin = ScopeAuthorizer::new(["st2138:mon", "st2138:adm"]);
    assert!(serialize(&dev, &admin).contains(&"secret".to_string()));
}

#[test]
fn struct_values_follow_field_authorization() {
    let dev = test_device();
    let authz = CountingAuthorizer::new().deny_read("f2");
    let items = dev.lock().to_proto(&authz, false);

    let location = items
        .iter()
        .find_map(|item| match item {
            DeviceMessage::Param { oid, param } if oid == "location" => Some(param),
            _ => None,
        })
        .unwrap();
    let value = location.value.as_ref().unwrap().as_struct().unwrap();
    assert_eq!(value.fields.get("f1"), Some(&Value::Float32(1.5)));
    assert!(value.fields.get("f2").is_none());
}

// ============================================================================
// Commands and encoding
// ============================================================================

#[test]
fn commands_execute_through_the_guard() {
    let dev = test_device();
    with_reboot(&dev);
    let authz = ScopeAuthorizer::disabled();
    let mut guard = dev.lock();

    let reboot = guard.get_command("/reboot", authz).unwrap();
    match reboot.execute_command(Value::Int32(2)).unwrap() {
        CommandResponse::Response(v) => assert_eq!(v, Value::Int32(2)),
        other => panic!("unexpected response: {:?}", other),
    }
    drop(reboot);

    let err = guard.get_command("/counter", authz).map(|_| ()).unwrap_err();
    assert_eq!(err.code(), StatusCode::NotFound);
}

#[test]
fn device_stream_encodes_as_json() {
    let dev = test_device();
    let items = dev.lock().to_proto(ScopeAuthorizer::disabled(), false);
    let json = serde_json::to_string(&items).unwrap();
    assert!(json.contains("\"header\""));
    assert!(json.contains("\"detail_level\":\"full\""));

    let decoded: Vec<DeviceMessage> = serde_json::from_str(&json).unwrap();
    assert_eq!(decoded, items);
}
