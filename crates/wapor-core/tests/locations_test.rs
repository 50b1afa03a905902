//! Integration tests for workspace listing and the cached location table

mod common;

use common::*;
use serde_json::json;
use wapor_core::models::Workspace;
use wapor_core::ports::Method;
use wapor_core::WaporError;

fn location_table() -> serde_json::Value {
    json!([
        { "code": "ETH", "name": "Ethiopia", "type": "COUNTRY", "l1": true, "l2": true, "l3": false },
        { "code": "ODN", "name": "Office du Niger", "type": "AREA", "l1": true, "l2": true, "l3": true },
        { "code": "NIL", "name": "Nile", "type": "BASIN", "l1": true, "l2": false, "l3": false }
    ])
}

fn codes(locations: &[wapor_core::models::Location]) -> Vec<&str> {
    locations.iter().map(|loc| loc.code.as_str()).collect()
}

#[test]
fn test_location_table_is_fetched_once_per_workspace() {
    let mut h = Harness::new();
    h.transport.post("query/", location_table());

    let level3 = h.client.locations(2, Some(3)).unwrap();
    let all = h.client.locations(2, None).unwrap();

    assert_eq!(codes(&level3), vec!["ODN"]);
    assert_eq!(codes(&all), vec!["ETH", "ODN", "NIL"]);
    assert_eq!(h.transport.count(Method::Post, "query/"), 1);

    let request = h.transport.last_request(Method::Post, "query/").unwrap();
    let body = request.body.unwrap();
    assert_eq!(body["type"], "TableQuery_GetList_1");
    assert_eq!(body["params"]["table"]["workspaceCode"], "WAPOR_2");
    assert_eq!(body["params"]["table"]["code"], "LOCATION");
}

#[test]
fn test_level_filter_uses_level_flags() {
    let mut h = Harness::new();
    h.transport.post("query/", location_table());

    let level1 = h.client.locations(2, Some(1)).unwrap();
    let level2 = h.client.locations(2, Some(2)).unwrap();

    assert_eq!(codes(&level1), vec!["ETH", "ODN", "NIL"]);
    assert_eq!(codes(&level2), vec!["ETH", "ODN"]);
    let odn = &level2[1];
    assert_eq!(odn.name, "Office du Niger");
    assert_eq!(odn.kind, "AREA");
}

#[test]
fn test_other_version_fetches_its_own_table() {
    let mut h = Harness::new();
    h.transport.post("query/", location_table());

    h.client.locations(2, None).unwrap();
    h.client.locations(1, None).unwrap();

    assert_eq!(h.transport.count(Method::Post, "query/"), 2);
    let request = h.transport.last_request(Method::Post, "query/").unwrap();
    assert_eq!(request.body.unwrap()["params"]["table"]["workspaceCode"], "WAPOR");
}

#[test]
fn test_invalid_partition_makes_no_request() {
    let mut h = Harness::new();

    let err = h.client.locations(3, Some(1)).unwrap_err();

    assert!(matches!(err, WaporError::InvalidPartition { version: 3, .. }));
    assert_eq!(h.transport.count(Method::Post, "query/"), 0);
}

#[test]
fn test_workspaces_are_decoded() {
    let h = Harness::new();
    h.transport.get(
        "catalog/workspaces/?overview=false&paged=false&sort=code",
        json!([
            { "code": "WAPOR", "caption": "WaPOR v1", "description": "First release" },
            { "code": "WAPOR_2", "caption": "WaPOR v2" }
        ]),
    );

    let workspaces = h.client.workspaces().unwrap();

    assert_eq!(
        workspaces,
        vec![
            Workspace {
                code: "WAPOR".to_string(),
                caption: "WaPOR v1".to_string(),
                description: Some("First release".to_string()),
            },
            Workspace {
                code: "WAPOR_2".to_string(),
                caption: "WaPOR v2".to_string(),
                description: None,
            },
        ]
    );
    assert_eq!(
        h.transport
            .count(Method::Get, "catalog/workspaces/?overview=false&paged=false&sort=code"),
        1
    );
}
