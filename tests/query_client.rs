mod common;

use common::{GRAPHQL_PATH, SECRET, endpoint_settings};
use fermentation_monitor::{
    HttpQueryClient, QueryClient, QueryClientError, queries::ENTITY_ID_QUERY,
};
use pretty_assertions::assert_eq;
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn posts_document_and_variables_with_fixed_headers() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(GRAPHQL_PATH))
        .and(header("content-type", "application/json"))
        .and(header("x-hasura-admin-secret", SECRET))
        .and(body_json(json!({
            "query": ENTITY_ID_QUERY,
            "variables": {"nombre": "tempeh"}
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {"Hongo": [{"id_Hongo": 1}]}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = HttpQueryClient::new(&endpoint_settings(&server));
    let response = client
        .execute(ENTITY_ID_QUERY, json!({"nombre": "tempeh"}))
        .await
        .unwrap();

    assert_eq!(response, json!({"data": {"Hongo": [{"id_Hongo": 1}]}}));
}

#[tokio::test]
async fn backend_errors_surface_as_query_errors() {
    let server = MockServer::start().await;
    let errors = json!([{
        "extensions": {"path": "$", "code": "access-denied"},
        "message": "x-hasura-admin-secret/x-hasura-access-key required, but not found"
    }]);
    Mock::given(method("POST"))
        .and(path(GRAPHQL_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"errors": errors.clone()})))
        .mount(&server)
        .await;

    let client = HttpQueryClient::new(&endpoint_settings(&server));
    match client.execute(ENTITY_ID_QUERY, json!({"nombre": "tempeh"})).await {
        Err(QueryClientError::Query { details }) => assert_eq!(details, errors),
        other => panic!("expected query error, got {:?}", other),
    }
}

#[tokio::test]
async fn non_json_body_is_a_decode_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(GRAPHQL_PATH))
        .respond_with(ResponseTemplate::new(502).set_body_string("Bad Gateway"))
        .mount(&server)
        .await;

    let client = HttpQueryClient::new(&endpoint_settings(&server));
    let result = client.execute(ENTITY_ID_QUERY, json!({})).await;
    assert!(matches!(result, Err(QueryClientError::Decode(_))));
}

#[tokio::test]
async fn unreachable_endpoint_is_a_transport_error() {
    // Non-pooled server: pooled ones keep listening after drop.
    let server = MockServer::builder().start().await;
    let settings = endpoint_settings(&server);
    drop(server);

    let client = HttpQueryClient::new(&settings);
    let result = client.execute(ENTITY_ID_QUERY, json!({})).await;
    assert!(matches!(result, Err(QueryClientError::Transport(_))));
}
