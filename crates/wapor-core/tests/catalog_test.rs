//! Integration tests for catalog resolution and caching

mod common;

use common::*;
use serde_json::json;
use wapor_core::models::{DimensionKind, Partition};
use wapor_core::ports::Method;
use wapor_core::WaporError;

fn empty_listings(h: &Harness, partitions: &[(&str, u8)]) {
    for (workspace, level) in partitions {
        h.transport.get(&listing_path(workspace, *level), json!([]));
    }
}

#[test]
fn test_probe_stops_at_first_hit() {
    let mut h = Harness::new();
    empty_listings(&h, &[("WAPOR_2", 3), ("WAPOR_2", 2)]);
    script_aeti(&h.transport);
    empty_listings(&h, &[("WAPOR", 3), ("WAPOR", 2), ("WAPOR", 1)]);

    let cube = h.client.resolve("L1_AETI_D", None, None).unwrap();

    assert_eq!(cube.partition, Partition::new(2, Some(1)).unwrap());
    assert_eq!(cube.multiplier(), 0.1);
    assert_eq!(cube.caption, "L1_AETI_D caption");
    assert_eq!(cube.measure.unit.as_deref(), Some("mm"));
    assert_eq!(cube.time_dimension().map(|d| d.code.as_str()), Some("DEKAD"));

    assert_eq!(h.transport.count(Method::Get, &listing_path("WAPOR_2", 3)), 1);
    assert_eq!(h.transport.count(Method::Get, &listing_path("WAPOR_2", 2)), 1);
    assert_eq!(h.transport.count(Method::Get, &listing_path("WAPOR_2", 1)), 1);
    for level in 1..=3 {
        assert_eq!(h.transport.count(Method::Get, &listing_path("WAPOR", level)), 0);
    }
}

#[test]
fn test_hint_fetches_only_that_partition() {
    let mut h = Harness::new();
    script_aeti(&h.transport);

    let cube = h.client.resolve("L1_AETI_D", Some(2), Some(1)).unwrap();
    assert_eq!(cube.partition.to_string(), "WAPOR_2.L1");

    let listing_requests = h
        .transport
        .requests()
        .iter()
        .filter(|r| r.url.contains("/cubes?"))
        .count();
    assert_eq!(listing_requests, 1);
}

#[test]
fn test_hint_without_code_names_partition() {
    let mut h = Harness::new();
    h.transport.get(&listing_path("WAPOR_2", 2), json!([cube_entry("L2_AETI_D")]));

    let err = h.client.resolve("L1_AETI_D", Some(2), Some(2)).unwrap_err();
    match err {
        WaporError::ProductNotFound { code, probed } => {
            assert_eq!(code, "L1_AETI_D");
            assert_eq!(probed, vec![Partition::new(2, Some(2)).unwrap()]);
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(h.transport.count(Method::Get, &listing_path("WAPOR_2", 3)), 0);
}

#[test]
fn test_not_found_lists_every_partition() {
    let mut h = Harness::new();
    empty_listings(
        &h,
        &[("WAPOR_2", 3), ("WAPOR_2", 2), ("WAPOR_2", 1), ("WAPOR", 3), ("WAPOR", 2), ("WAPOR", 1)],
    );

    let err = h.client.resolve("L9_NOPE_D", None, None).unwrap_err();
    let text = err.to_string();
    match err {
        WaporError::ProductNotFound { probed, .. } => {
            assert_eq!(probed, Partition::PROBE_ORDER.to_vec());
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(text.contains("L9_NOPE_D"));
    assert!(text.contains("WAPOR.L1"));
}

#[test]
fn test_out_of_range_hint_is_ignored() {
    let mut h = Harness::new();
    empty_listings(&h, &[("WAPOR_2", 3), ("WAPOR_2", 2)]);
    script_aeti(&h.transport);

    let cube = h.client.resolve("L1_AETI_D", Some(3), Some(1)).unwrap();
    assert_eq!(cube.partition, Partition::new(2, Some(1)).unwrap());
    assert_eq!(h.transport.count(Method::Get, &listing_path("WAPOR_2", 3)), 1);
}

#[test]
fn test_listing_and_descriptor_are_cached() {
    let mut h = Harness::new();
    script_aeti(&h.transport);
    script_dekadal_cube(&h.transport, "WAPOR_2", "L1_NPP_D", 0.001);

    h.client.resolve("L1_AETI_D", Some(2), Some(1)).unwrap();
    h.client.resolve("L1_NPP_D", Some(2), Some(1)).unwrap();
    h.client.resolve("L1_AETI_D", Some(2), Some(1)).unwrap();

    assert_eq!(h.transport.count(Method::Get, &listing_path("WAPOR_2", 1)), 1);
    assert_eq!(
        h.transport.count(Method::Get, &cube_path("WAPOR_2", "L1_AETI_D", "measures")),
        1
    );
    assert_eq!(
        h.transport.count(Method::Get, &cube_path("WAPOR_2", "L1_NPP_D", "dimensions")),
        1
    );
}

#[test]
fn test_catalog_browsing_is_unauthenticated() {
    let mut h = Harness::new();
    script_aeti(&h.transport);

    let listing = h.client.catalog(&Partition::new(2, Some(1)).unwrap()).unwrap();
    assert_eq!(listing.len(), 2);
    assert_eq!(listing[0].data_type.as_deref(), Some("RASTER"));

    let request = h.transport.last_request(Method::Get, &listing_path("WAPOR_2", 1)).unwrap();
    assert!(request.header_value("Authorization").is_none());
}

#[test]
fn test_non_positive_multiplier_is_malformed() {
    let mut h = Harness::new();
    h.transport.get(&listing_path("WAPOR_2", 1), json!([cube_entry("L1_AETI_D")]));
    script_dekadal_cube(&h.transport, "WAPOR_2", "L1_AETI_D", 0.0);

    let err = h.client.resolve("L1_AETI_D", Some(2), Some(1)).unwrap_err();
    assert!(matches!(err, WaporError::MalformedResponse { .. }));
}

#[test]
fn test_listing_failure_propagates() {
    let mut h = Harness::new();
    h.transport.reply(Method::Get, &url(&listing_path("WAPOR_2", 3)), Reply::Http(503));

    let err = h.client.resolve("L1_AETI_D", None, None).unwrap_err();
    assert!(err.is_transport());
    assert_eq!(h.transport.count(Method::Get, &listing_path("WAPOR_2", 2)), 0);
}

#[test]
fn test_dimension_members() {
    let mut h = Harness::new();
    h.transport.get(&listing_path("WAPOR_2", 2), json!([cube_entry("L2_CTY_PHE_S")]));
    h.transport.get(
        &cube_path("WAPOR_2", "L2_CTY_PHE_S", "measures"),
        json!([{ "code": "PHE", "caption": "Phenology", "multiplier": 1 }]),
    );
    h.transport.get(
        &cube_path("WAPOR_2", "L2_CTY_PHE_S", "dimensions"),
        json!([
            { "code": "YEAR", "type": "TIME" },
            { "code": "COUNTRY", "type": "WHAT" },
            { "code": "STAGE", "type": "WHAT" }
        ]),
    );
    h.transport.get(
        &members_path("WAPOR_2", "L2_CTY_PHE_S", "STAGE"),
        json!([{ "code": "SOS", "caption": "Start" }, { "code": "EOS", "caption": "End" }]),
    );

    let cube = h.client.resolve("L2_CTY_PHE_S", Some(2), Some(2)).unwrap();
    assert_eq!(cube.what_dimensions().count(), 2);
    assert_eq!(cube.dimensions[1].kind, DimensionKind::What);

    let stages = h.client.dimension_members(&cube, "STAGE").unwrap();
    let codes: Vec<&str> = stages.iter().map(|m| m.code.as_str()).collect();
    assert_eq!(codes, vec!["SOS", "EOS"]);

    h.client.dimension_members(&cube, "STAGE").unwrap();
    assert_eq!(
        h.transport.count(Method::Get, &members_path("WAPOR_2", "L2_CTY_PHE_S", "STAGE")),
        1
    );
}
