//! Tests for pagination module

use super::*;
use pretty_assertions::assert_eq;
use serde_json::json;
use test_case::test_case;

// ============================================================================
// PaginationConfig Tests
// ============================================================================

#[test]
fn test_pagination_config_from_yaml() {
    let config: PaginationConfig = serde_yaml::from_str("type: page_number").unwrap();
    assert_eq!(config, PaginationConfig::page_number());

    let config: PaginationConfig = serde_yaml::from_str("type: cursor").unwrap();
    assert_eq!(config, PaginationConfig::cursor());

    let config: PaginationConfig = serde_yaml::from_str("type: none").unwrap();
    assert_eq!(config, PaginationConfig::None);
}

#[test]
fn test_pagination_config_overrides() {
    let config: PaginationConfig =
        serde_yaml::from_str("type: page_number\npage_size: 25\nsize_param: per_page").unwrap();
    assert_eq!(
        config,
        PaginationConfig::PageNumber {
            page_param: "page".to_string(),
            size_param: "per_page".to_string(),
            page_size: 25,
        }
    );
}

#[test_case(PaginationConfig::None, "none")]
#[test_case(PaginationConfig::page_number(), "page_number")]
#[test_case(PaginationConfig::cursor(), "cursor")]
fn test_pagination_config_kind(config: PaginationConfig, expected: &str) {
    assert_eq!(config.kind(), expected);
}

// ============================================================================
// Page Number Tests
// ============================================================================

#[test]
fn test_page_number_initial_params() {
    let paginator = PaginationConfig::page_number().build();
    let token = paginator.initial_token();
    assert_eq!(token, PaginationToken::Page(1));

    let params = paginator.query_params(&token);
    assert_eq!(params.get("page"), Some(&"1".to_string()));
    assert_eq!(params.get("limit"), Some(&"100".to_string()));
}

#[test]
fn test_page_number_sequence_stops_on_empty_page() {
    let paginator = PageNumberPaginator::new("page", "limit", DEFAULT_PAGE_SIZE);
    let body = json!([]);

    let mut token = paginator.initial_token();
    let mut fetches = 0;
    for count in [100, 100, 37, 0] {
        fetches += 1;
        match paginator.next(&token, &body, count) {
            NextPage::Continue(next) => token = next,
            NextPage::Done => break,
        }
    }

    assert_eq!(fetches, 4);
    assert_eq!(token, PaginationToken::Page(4));
}

#[test]
fn test_page_number_short_page_continues() {
    let paginator = PageNumberPaginator::new("page", "limit", 100);
    let next = paginator.next(&PaginationToken::Page(3), &json!([]), 37);
    assert_eq!(next, NextPage::Continue(PaginationToken::Page(4)));
}

#[test]
fn test_page_number_first_page_empty() {
    let paginator = PageNumberPaginator::new("page", "limit", 100);
    assert_eq!(paginator.next(&PaginationToken::Page(1), &json!([]), 0), NextPage::Done);
}

// ============================================================================
// Cursor Tests
// ============================================================================

#[test]
fn test_cursor_initial_has_no_params() {
    let paginator = PaginationConfig::cursor().build();
    let token = paginator.initial_token();
    assert_eq!(token, PaginationToken::Initial);
    assert!(paginator.query_params(&token).is_empty());
}

#[test]
fn test_cursor_follows_next_id() {
    let paginator = CursorPaginator::new("nextId", "$.nextId");
    let body = json!({"entries": [{"id": "a1"}], "nextId": "abc"});

    let next = paginator.next(&PaginationToken::Initial, &body, 1);
    assert_eq!(next, NextPage::Continue(PaginationToken::Cursor("abc".into())));

    let params = paginator.query_params(&PaginationToken::Cursor("abc".into()));
    assert_eq!(params.get("nextId"), Some(&"abc".to_string()));
}

#[test_case(json!({"entries": [], "nextId": null}) ; "null cursor")]
#[test_case(json!({"entries": []}) ; "missing cursor")]
#[test_case(json!({"entries": [], "nextId": ""}) ; "empty cursor")]
fn test_cursor_stops(body: serde_json::Value) {
    let paginator = CursorPaginator::new("nextId", "$.nextId");
    assert_eq!(
        paginator.next(&PaginationToken::Cursor("abc".into()), &body, 0),
        NextPage::Done
    );
}

#[test]
fn test_cursor_two_fetch_sequence() {
    let paginator = PaginationConfig::cursor().build();
    let responses = [
        json!({"entries": [{"id": 1}, {"id": 2}], "nextId": "abc"}),
        json!({"entries": [{"id": 3}], "nextId": null}),
    ];

    let mut token = paginator.initial_token();
    let mut fetches = 0;
    for body in &responses {
        fetches += 1;
        match paginator.next(&token, body, 1) {
            NextPage::Continue(next) => token = next,
            NextPage::Done => break,
        }
    }

    assert_eq!(fetches, 2);
}

#[test]
fn test_cursor_repeated_value_stops() {
    let paginator = CursorPaginator::new("nextId", "$.nextId");
    let body = json!({"entries": [{"id": 1}], "nextId": "abc"});
    assert_eq!(
        paginator.next(&PaginationToken::Cursor("abc".into()), &body, 1),
        NextPage::Done
    );
}

// ============================================================================
// No Pagination Tests
// ============================================================================

#[test]
fn test_no_paginator_single_fetch() {
    let paginator = NoPaginator;
    let token = paginator.initial_token();
    assert!(paginator.query_params(&token).is_empty());
    assert_eq!(
        paginator.next(&token, &json!([{"region": "eu-west-1"}]), 1),
        NextPage::Done
    );
}

#[test]
fn test_token_display() {
    assert_eq!(PaginationToken::Initial.to_string(), "initial");
    assert_eq!(PaginationToken::Page(3).to_string(), "page 3");
    assert_eq!(PaginationToken::Cursor("x".into()).to_string(), "cursor x");
}
