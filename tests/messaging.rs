mod common;

use common::messaging_settings;
use fermentation_monitor::{
    MessageTransport, TwilioTransport,
    messaging::{Credentials, MessagingError},
};
use serde_json::json;
use wiremock::matchers::{basic_auth, body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const MESSAGES_PATH: &str = "/2010-04-01/Accounts/AC0123456789/Messages.json";

#[tokio::test]
async fn send_posts_form_and_returns_sid() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(MESSAGES_PATH))
        .and(basic_auth("AC0123456789", "auth-token"))
        .and(body_string_contains("Body=Alarma+de+temperatura"))
        .and(body_string_contains("From=whatsapp%3A%2B14155238886"))
        .and(body_string_contains("To=whatsapp%3A%2B5215512345678"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "sid": "SM0123456789abcdef",
            "status": "queued"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let credentials = Credentials::from_settings(&messaging_settings(&server)).unwrap();
    let transport = TwilioTransport::new(server.uri());

    let sid = transport
        .send(&credentials, "Alarma de temperatura")
        .await
        .unwrap();
    assert_eq!(sid, "SM0123456789abcdef");
}

#[tokio::test]
async fn provider_rejection_carries_its_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(MESSAGES_PATH))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "code": 20003,
            "message": "Authenticate",
            "status": 401
        })))
        .mount(&server)
        .await;

    let credentials = Credentials::from_settings(&messaging_settings(&server)).unwrap();
    let transport = TwilioTransport::new(server.uri());

    match transport.send(&credentials, "hola").await {
        Err(MessagingError::Rejected(message)) => assert_eq!(message, "Authenticate"),
        other => panic!("expected rejection, got {:?}", other),
    }
}

#[tokio::test]
async fn success_without_sid_is_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(MESSAGES_PATH))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"status": "queued"})))
        .mount(&server)
        .await;

    let credentials = Credentials::from_settings(&messaging_settings(&server)).unwrap();
    let result = TwilioTransport::new(server.uri())
        .send(&credentials, "hola")
        .await;
    assert!(matches!(result, Err(MessagingError::Transport(_))));
}
