use async_trait::async_trait;
use http::header::CONTENT_TYPE;
use serde_json::Value;
use thiserror::Error;

use crate::GraphQLRequest;
use crate::settings::EndpointSettings;

pub const ADMIN_SECRET_HEADER: &str = "x-hasura-admin-secret";

#[derive(Debug, Error)]
pub enum QueryClientError {
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Failed to decode response: {0}")]
    Decode(String),

    /// The backend answered but reported GraphQL errors.
    #[error("Query error: {details}")]
    Query { details: Value },
}

#[async_trait]
pub trait QueryClient {
    async fn execute(&self, document: &str, variables: Value) -> Result<Value, QueryClientError>;
}

pub struct HttpQueryClient {
    client: reqwest::Client,
    endpoint: Option<String>,
    secret: Option<String>,
}

impl HttpQueryClient {
    pub fn new(settings: &EndpointSettings) -> Self {
        HttpQueryClient {
            client: reqwest::Client::new(),
            endpoint: settings.url.clone(),
            secret: settings.secret.clone(),
        }
    }
}

#[async_trait]
impl QueryClient for HttpQueryClient {
    async fn execute(&self, document: &str, variables: Value) -> Result<Value, QueryClientError> {
        let endpoint = self
            .endpoint
            .as_deref()
            .ok_or_else(|| QueryClientError::Transport("No GraphQL endpoint configured".into()))?;

        let request_body = GraphQLRequest {
            query: document.to_string(),
            variables,
        };

        let mut request = self
            .client
            .post(endpoint)
            .header(CONTENT_TYPE, "application/json");
        if let Some(secret) = &self.secret {
            request = request.header(ADMIN_SECRET_HEADER, secret);
        }

        let response = request
            .json(&request_body)
            .send()
            .await
            .map_err(|e| QueryClientError::Transport(format!("Failed to send request to {}: {}", endpoint, e)))?;

        let json_response = response
            .json::<Value>()
            .await
            .map_err(|e| QueryClientError::Decode(format!("Failed to parse response from {}: {}", endpoint, e)))?;

        check_errors(json_response)
    }
}

/// Splits a GraphQL response into its payload or a [`QueryClientError::Query`]
/// carrying the raw `errors` collection.
pub fn check_errors(response: Value) -> Result<Value, QueryClientError> {
    match response.get("errors") {
        Some(errors) if !errors.is_null() => Err(QueryClientError::Query {
            details: errors.clone(),
        }),
        _ => Ok(response),
    }
}
