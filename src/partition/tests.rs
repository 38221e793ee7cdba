//! Tests for partition module

use super::*;
use pretty_assertions::assert_eq;
use serde_json::json;

fn record(value: serde_json::Value) -> crate::types::Record {
    value.as_object().cloned().unwrap()
}

// ============================================================================
// ChildContext Tests
// ============================================================================

#[test]
fn test_child_context_partition_key() {
    let context = ChildContext::new().with_value("checkId", "c-123");
    assert_eq!(context.partition_key(), "checkId=c-123");
    assert_eq!(context.to_string(), "checkId=c-123");
    assert_eq!(context.get("checkId"), Some(&json!("c-123")));
}

#[test]
fn test_child_context_multi_key_is_sorted() {
    let context = ChildContext::new()
        .with_value("pageId", 7)
        .with_value("checkId", "c1");
    assert_eq!(context.partition_key(), "checkId=c1,pageId=7");
    assert_eq!(context.to_json(), json!({"checkId": "c1", "pageId": 7}));
}

#[test]
fn test_child_context_empty() {
    assert!(ChildContext::new().is_empty());
    assert_eq!(ChildContext::new().partition_key(), "");
}

// ============================================================================
// ParentLink Tests
// ============================================================================

#[test]
fn test_parent_link_from_yaml() {
    let link: ParentLink = serde_yaml::from_str("stream: checks\ncontext:\n  checkId: id\n").unwrap();
    assert_eq!(link, ParentLink::new("checks", "checkId", "id"));
}

// ============================================================================
// ParentRouter Tests
// ============================================================================

#[test]
fn test_parent_router_context() {
    let router = ParentRouter::new(ParentLink::new("checks", "checkId", "id"));
    assert_eq!(router.parent_stream(), "checks");

    let context = router
        .context_for(&record(json!({"id": "c1", "name": "Homepage"})))
        .unwrap();
    assert_eq!(context.partition_key(), "checkId=c1");
}

#[test]
fn test_parent_router_numeric_and_nested_keys() {
    let router = ParentRouter::new(ParentLink::new("groups", "groupId", "meta.id"));
    let context = router
        .context_for(&record(json!({"meta": {"id": 42}})))
        .unwrap();
    assert_eq!(context.get("groupId"), Some(&json!(42)));
}

#[test]
fn test_parent_router_skips_unusable_records() {
    let router = ParentRouter::new(ParentLink::new("checks", "checkId", "id"));
    assert!(router.context_for(&record(json!({"name": "no id"}))).is_none());
    assert!(router.context_for(&record(json!({"id": null}))).is_none());
    assert!(router.context_for(&record(json!({"id": ""}))).is_none());
    assert!(router.context_for(&record(json!({"id": {"x": 1}}))).is_none());
}
