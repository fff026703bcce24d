use std::sync::Arc;

use biomecode_core::models::{Geometry, Region};
use biomecode_core::BiomeError;
use biomecode_engine::{
    EarthEngine, Expression, Image, Reducer, RestEngine, ServiceAccountKey, ServiceAccountTokens,
    StaticToken, TokenProvider, ValueNode,
};
use httpmock::prelude::*;
use serde_json::json;

const KEY_JSON: &str = include_str!("fixtures/service-account.json");

fn engine(server: &MockServer) -> RestEngine {
    RestEngine::new(server.base_url(), "demo-project", Arc::new(StaticToken::new("test-token")))
}

#[tokio::test]
async fn test_compute_value_posts_expression() {
    let server = MockServer::start_async().await;
    let expression = Expression::new(ValueNode::constant(42));

    let mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/v1/projects/demo-project/value:compute")
                .header("authorization", "Bearer test-token")
                .header("x-goog-user-project", "demo-project")
                .json_body(json!({
                    "expression": { "result": "0", "values": { "0": { "constantValue": 42 } } }
                }));
            then.status(200).json_body(json!({ "result": 42 }));
        })
        .await;

    let value = engine(&server).compute_value(&expression).await.unwrap();

    mock.assert_async().await;
    assert_eq!(value, json!(42));
}

#[tokio::test]
async fn test_compute_value_surfaces_remote_message() {
    let server = MockServer::start_async().await;

    server
        .mock_async(|when, then| {
            when.method(POST).path("/v1/projects/demo-project/value:compute");
            then.status(400).json_body(json!({
                "error": {
                    "code": 400,
                    "message": "Image.clip: Parameter 'input' is required.",
                    "status": "INVALID_ARGUMENT"
                }
            }));
        })
        .await;

    let err = engine(&server)
        .compute_value(&Expression::new(Image::load("missing")))
        .await
        .unwrap_err();

    match err {
        BiomeError::RemoteEvaluation { status, message } => {
            assert_eq!(status, "INVALID_ARGUMENT");
            assert_eq!(message, "Image.clip: Parameter 'input' is required.");
        }
        other => panic!("unexpected error: {:?}", other),
    }
}

#[tokio::test]
async fn test_unreachable_platform() {
    // Nothing listens on the discard port
    let engine =
        RestEngine::new("http://127.0.0.1:9", "demo-project", Arc::new(StaticToken::new("t")));

    let err = engine.compute_value(&Expression::new(ValueNode::constant(1))).await.unwrap_err();
    assert!(matches!(err, BiomeError::RemoteUnavailable { .. }));
}

#[tokio::test]
async fn test_create_map_returns_tile_template() {
    let server = MockServer::start_async().await;
    let region = Region::new(Geometry::bbox(10.0, 45.0, 10.1, 45.1));

    let mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/v1/projects/demo-project/maps")
                .body_contains("\"fileFormat\":\"PNG\"")
                .body_contains("Image.visualize");
            then.status(200).json_body(json!({
                "name": "projects/demo-project/maps/abc123",
                "expression": {}
            }));
        })
        .await;

    let engine = engine(&server);
    let image = Image::constant(0.5).clip(&region).visualize(0.0, 1.0);
    let handle = engine.create_map(&Expression::new(image)).await.unwrap();

    mock.assert_async().await;
    assert_eq!(handle.mapid, "projects/demo-project/maps/abc123");
    assert_eq!(handle.token, "");
    assert_eq!(
        engine.tile_url(&handle),
        format!(
            "{}/v1/projects/demo-project/maps/abc123/tiles/{{z}}/{{x}}/{{y}}",
            server.base_url()
        )
    );
}

#[tokio::test]
async fn test_reduce_region_wire_shape() {
    let server = MockServer::start_async().await;
    let region = Region::new(Geometry::point(1.0, 2.0));

    let mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/v1/projects/demo-project/value:compute")
                .body_contains("\"functionName\":\"Image.reduceRegion\"")
                .body_contains("\"functionName\":\"GeometryConstructors.Point\"")
                .body_contains("\"maxPixels\"");
            then.status(200).json_body(json!({ "result": { "constant": 1.0 } }));
        })
        .await;

    let dict = Image::constant(1.0).reduce_region(Reducer::mean(), &region, 30.0);
    let value = engine(&server).compute_value(&Expression::new(dict)).await.unwrap();

    mock.assert_async().await;
    assert_eq!(value, json!({ "constant": 1.0 }));
}

#[tokio::test]
async fn test_service_account_token_exchange_is_cached() {
    let server = MockServer::start_async().await;

    let token_mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/token")
                .header("content-type", "application/x-www-form-urlencoded")
                .body_contains("grant_type=urn%3Aietf%3Aparams%3Aoauth%3Agrant-type%3Ajwt-bearer")
                .body_contains("assertion=eyJ");
            then.status(200).json_body(json!({
                "access_token": "ya29.minted",
                "expires_in": 3599,
                "token_type": "Bearer"
            }));
        })
        .await;

    let mut key = ServiceAccountKey::from_json(KEY_JSON).unwrap();
    key.token_uri = server.url("/token");
    let tokens = ServiceAccountTokens::new(key, None).unwrap();

    assert_eq!(tokens.email(), "kpi-runner@biomecode-test.iam.gserviceaccount.com");
    assert_eq!(tokens.access_token().await.unwrap(), "ya29.minted");
    assert_eq!(tokens.access_token().await.unwrap(), "ya29.minted");

    token_mock.assert_hits_async(1).await;
}

#[tokio::test]
async fn test_rejected_token_exchange() {
    let server = MockServer::start_async().await;

    server
        .mock_async(|when, then| {
            when.method(POST).path("/token");
            then.status(401).json_body(json!({ "error": "invalid_grant" }));
        })
        .await;

    let mut key = ServiceAccountKey::from_json(KEY_JSON).unwrap();
    key.token_uri = server.url("/token");
    let email = Some("override@demo.iam.gserviceaccount.com".to_string());
    let tokens = ServiceAccountTokens::new(key, email).unwrap();

    assert_eq!(tokens.email(), "override@demo.iam.gserviceaccount.com");
    let err = tokens.access_token().await.unwrap_err();
    assert!(matches!(err, BiomeError::Authentication { .. }));
}

#[test]
fn test_assertion_claims() {
    let key = ServiceAccountKey::from_json(KEY_JSON).unwrap();
    let tokens = ServiceAccountTokens::new(key, None).unwrap();

    let now = chrono::DateTime::from_timestamp(1_700_000_000, 0).unwrap();
    let claims = tokens.claims(now);

    assert_eq!(claims.iss, "kpi-runner@biomecode-test.iam.gserviceaccount.com");
    assert_eq!(claims.aud, "https://oauth2.googleapis.com/token");
    assert_eq!(claims.exp - claims.iat, 3600);
    assert!(claims.scope.contains("auth/earthengine"));
}
