//! Query URL builder tests

use analytics_gateway::cube::{CubeQuery, build_query_url};
use pretty_assertions::assert_eq;
use serde_json::{Value, json};

const BASE_URL: &str = "https://engine.example/cubejs-api/v1/load";

fn decoded_query_param(url: &str) -> String {
    let (base, encoded) = url
        .split_once("?query=")
        .expect("URL should carry a query parameter");
    assert_eq!(base, BASE_URL);
    urlencoding::decode(encoded)
        .expect("query parameter should percent-decode")
        .into_owned()
}

#[test]
fn builder_is_deterministic_across_calls() {
    let urls: Vec<String> = (0..5)
        .map(|_| build_query_url(BASE_URL, &CubeQuery::default()).unwrap())
        .collect();
    assert!(urls.windows(2).all(|pair| pair[0] == pair[1]));
}

#[test]
fn decoded_descriptor_matches_the_engine_contract_exactly() {
    let url = build_query_url(BASE_URL, &CubeQuery::default()).unwrap();
    let parsed: Value = serde_json::from_str(&decoded_query_param(&url)).unwrap();

    assert_eq!(
        parsed,
        json!({
            "dimensions": [
                "orders.status",
                "orders.users_age",
                "orders.users_city",
                "orders.users_state"
            ],
            "measures": [
                "orders.completed_count",
                "orders.completed_percentage",
                "orders.count",
                "orders.dau",
                "orders.mau",
                "orders.total",
                "orders.wau"
            ]
        })
    );
}

#[test]
fn descriptor_serializes_dimensions_before_measures() {
    let url = build_query_url(BASE_URL, &CubeQuery::default()).unwrap();
    assert_eq!(
        decoded_query_param(&url),
        r#"{"dimensions":["orders.status","orders.users_age","orders.users_city","orders.users_state"],"measures":["orders.completed_count","orders.completed_percentage","orders.count","orders.dau","orders.mau","orders.total","orders.wau"]}"#
    );
}

#[test]
fn builder_respects_custom_descriptors() {
    let query = CubeQuery {
        dimensions: vec!["orders.status".to_string()],
        measures: vec!["orders.count".to_string()],
    };
    let url = build_query_url(BASE_URL, &query).unwrap();
    assert_eq!(
        decoded_query_param(&url),
        r#"{"dimensions":["orders.status"],"measures":["orders.count"]}"#
    );
}

#[test]
fn encoding_follows_component_rules() {
    let url = build_query_url(BASE_URL, &CubeQuery::default()).unwrap();
    let encoded = url.split_once("?query=").unwrap().1;

    // '.' and '_' stay literal, structural JSON characters do not
    assert!(encoded.contains("orders.status"));
    assert!(encoded.contains("orders.users_age"));
    assert!(encoded.contains("%5B%22"));
    assert!(!encoded.contains('"'));
    assert!(!encoded.contains('{'));
    assert!(!encoded.contains(','));
}
