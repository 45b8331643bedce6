#![allow(dead_code)]

use bytes::Bytes;
use fermentation_monitor::{
    AppState, FermentationPipeline, HttpQueryClient, TwilioTransport,
    server::handle_request,
    settings::{EndpointSettings, MessagingSettings},
};
use http_body_util::{BodyExt, Full};
use hyper::{Request, StatusCode};
use serde_json::{Value, json};
use std::sync::Arc;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const GRAPHQL_PATH: &str = "/v1/graphql";
pub const SECRET: &str = "test-admin-secret";

pub fn endpoint_settings(server: &MockServer) -> EndpointSettings {
    EndpointSettings {
        url: Some(format!("{}{}", server.uri(), GRAPHQL_PATH)),
        secret: Some(SECRET.to_string()),
    }
}

pub fn messaging_settings(server: &MockServer) -> MessagingSettings {
    MessagingSettings {
        account_sid: Some("AC0123456789".to_string()),
        auth_token: Some("auth-token".to_string()),
        from_address: Some("whatsapp:+14155238886".to_string()),
        to_address: Some("whatsapp:+5215512345678".to_string()),
        api_base: server.uri(),
    }
}

pub fn app_state(graphql: &MockServer, messaging: MessagingSettings) -> Arc<AppState> {
    let pipeline =
        FermentationPipeline::new(Box::new(HttpQueryClient::new(&endpoint_settings(graphql))))
            .unwrap();
    Arc::new(AppState {
        pipeline,
        transport: Box::new(TwilioTransport::new(messaging.api_base.clone())),
        messaging,
    })
}

/// Answers GraphQL requests whose document mentions `root_field`.
pub async fn mount_rows(server: &MockServer, root_field: &str, rows: Value) {
    Mock::given(method("POST"))
        .and(path(GRAPHQL_PATH))
        .and(body_string_contains(root_field))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": { root_field: rows }
        })))
        .mount(server)
        .await;
}

pub fn detail_row(timestamp: &str, tempeh: f64) -> Value {
    json!({
        "fechaHoraRegistroDetalle": timestamp,
        "temperaturaByIdTemperaturaTempeh": {"temp": tempeh},
        "temperaturaByIdTemperaturaAmbiente": {"temp": 26.5},
        "Humedad": {"humed": 70.0},
        "AireAcondicionadoTemperatura": {"Temperatura": {"temp": 21.0}},
        "EstufaTemperatura": {"Temperatura": null},
        "Alarma": null
    })
}

pub async fn call(state: Arc<AppState>, request: Request<Full<Bytes>>) -> (StatusCode, Value) {
    let response = handle_request(request, state).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

pub fn get(uri: &str) -> Request<Full<Bytes>> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .body(Full::new(Bytes::new()))
        .unwrap()
}

pub fn post(uri: &str, body: &str) -> Request<Full<Bytes>> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("Content-Type", "application/json")
        .body(Full::new(Bytes::from(body.to_string())))
        .unwrap()
}
