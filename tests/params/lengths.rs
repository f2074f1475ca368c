//! Length Budget Tests
//!
//! Arrays are bounded by `max_length` elements and string arrays by
//! `total_length` characters. Pending changes are tracked per transaction so
//! that several appends in one request count together.

use crate::common::*;
use catena::{Index, Param, ParamWithValue, SetValueTransaction, StatusCode, Value};

fn text(s: &str) -> Value {
    Value::String(s.to_string())
}

// ============================================================================
// add_back
// ============================================================================

#[test]
fn add_back_respects_max_length() {
    let authz = CountingAuthorizer::new();

    let mut full = vec![1, 2, 3];
    let mut param = ParamWithValue::new("/ints", &mut full, int_array_descriptor("ints", 3));
    let err = param.add_back(&authz).map(|_| ()).unwrap_err();
    assert_eq!(err.code(), StatusCode::OutOfRange);
    assert_eq!(param.size(), 3);

    let mut roomy = vec![1, 2, 3];
    let mut param = ParamWithValue::new("/ints", &mut roomy, int_array_descriptor("ints", 4));
    {
        let added = param.add_back(&authz).unwrap();
        assert_eq!(added.oid(), "/ints/3");
    }
    assert_eq!(param.size(), 4);
}

#[test]
fn device_default_max_length_applies_to_undeclared_limits() {
    let dev = test_device();
    let authz = CountingAuthorizer::new();
    dev.set_default_max_length(2);
    let mut guard = dev.lock();

    let pairs = guard.get_param("/pairs", &authz).unwrap();
    assert_eq!(pairs.descriptor().max_length(), 2);
    drop(pairs);

    let err = guard
        .set_value("/pairs/-", Value::Struct(Default::default()), &authz)
        .unwrap_err();
    assert_eq!(err.code(), StatusCode::OutOfRange);
}

// ============================================================================
// String total length
// ============================================================================

#[test]
fn string_total_length_is_checked_per_element() {
    let authz = CountingAuthorizer::new();
    let mut names = vec!["ab".to_string()];
    let mut txn = SetValueTransaction::new();
    {
        let mut param =
            ParamWithValue::new("/names", &mut names, string_array_descriptor("names", 4, 10));

        let err = param
            .validate_set_value(&text("abcdefghijkl"), Some(Index::At(0)), &authz, &mut txn)
            .unwrap_err();
        assert_eq!(err.code(), StatusCode::OutOfRange);

        param.reset_validate(&mut txn);
        param
            .validate_set_value(&text("abcdefgh"), Some(Index::At(0)), &authz, &mut txn)
            .unwrap();
    }
    assert_eq!(names, vec!["abcdefgh".to_string()]);
}

#[test]
fn string_total_length_counts_pending_appends() {
    let authz = CountingAuthorizer::new();
    let mut names = vec!["abcd".to_string()];
    let param = ParamWithValue::new("/names", &mut names, string_array_descriptor("names", 8, 10));
    let mut txn = SetValueTransaction::new();

    param
        .check_set_value(&text("abc"), Some(Index::End), &authz, &mut txn)
        .unwrap();
    let err = param
        .check_set_value(&text("abcd"), Some(Index::End), &authz, &mut txn)
        .unwrap_err();
    assert_eq!(err.code(), StatusCode::OutOfRange);

    let tracker = txn.tracker("/names").unwrap();
    assert_eq!(tracker.count, 2);
    assert_eq!(tracker.total_length(), 7);
    assert_eq!(param.size(), 1);
}

#[test]
fn whole_replacement_respects_both_budgets() {
    let authz = CountingAuthorizer::new();
    let mut names = vec!["x".to_string()];
    {
        let mut param =
            ParamWithValue::new("/names", &mut names, string_array_descriptor("names", 2, 6));
        let mut txn = SetValueTransaction::new();

        let too_many = Value::StringArray(vec!["a".into(), "b".into(), "c".into()]);
        let err = param
            .validate_set_value(&too_many, None, &authz, &mut txn)
            .unwrap_err();
        assert_eq!(err.code(), StatusCode::OutOfRange);

        let too_long = Value::StringArray(vec!["abcd".into(), "efg".into()]);
        let err = param
            .validate_set_value(&too_long, None, &authz, &mut txn)
            .unwrap_err();
        assert_eq!(err.code(), StatusCode::OutOfRange);

        let fits = Value::StringArray(vec!["abc".into(), "def".into()]);
        param.validate_set_value(&fits, None, &authz, &mut txn).unwrap();
    }
    assert_eq!(names, vec!["abc".to_string(), "def".to_string()]);
}

// ============================================================================
// Appends
// ============================================================================

#[test]
fn appends_accumulate_then_overflow() {
    let authz = CountingAuthorizer::new();
    let mut ints = vec![5, 6, 7];
    let start = ints.len();
    let mut param = ParamWithValue::new(
        "/ints",
        &mut ints,
        int_array_descriptor("ints", (start + 2) as u32),
    );
    let mut txn = SetValueTransaction::new();

    param
        .validate_set_value(&Value::Int32(8), Some(Index::End), &authz, &mut txn)
        .unwrap();
    param
        .validate_set_value(&Value::Int32(9), Some(Index::End), &authz, &mut txn)
        .unwrap();
    let err = param
        .validate_set_value(&Value::Int32(10), Some(Index::End), &authz, &mut txn)
        .unwrap_err();
    assert_eq!(err.code(), StatusCode::OutOfRange);
    assert_eq!(param.size(), start + 2);
    drop(param);
    assert_eq!(ints, vec![5, 6, 7, 8, 9]);
}

#[test]
fn index_past_the_end_is_out_of_range() {
    let authz = CountingAuthorizer::new();
    let mut ints = vec![1, 2];
    let param = ParamWithValue::new("/ints", &mut ints, int_array_descriptor("ints", 8));
    let mut txn = SetValueTransaction::new();

    let err = param
        .check_set_value(&Value::Int32(3), Some(Index::At(2)), &authz, &mut txn)
        .unwrap_err();
    assert_eq!(err.code(), StatusCode::OutOfRange);
}
