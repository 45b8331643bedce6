use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use thiserror::Error;

use crate::settings::MessagingSettings;

#[derive(Debug, Error)]
pub enum MessagingError {
    #[error("Missing messaging configuration: {}", .0.join(", "))]
    MissingConfig(Vec<&'static str>),

    #[error("Send failed: {0}")]
    Transport(String),

    /// The provider answered with a non-success status.
    #[error("{0}")]
    Rejected(String),
}

/// The four values a send needs, all known to be present.
#[derive(Clone, Debug, PartialEq)]
pub struct Credentials {
    pub account_sid: String,
    pub auth_token: String,
    pub from_address: String,
    pub to_address: String,
}

impl Credentials {
    pub fn from_settings(settings: &MessagingSettings) -> Result<Self, MessagingError> {
        let fields = [
            ("ACCOUNT_SID", &settings.account_sid),
            ("AUTH_TOKEN", &settings.auth_token),
            ("FROM_ADDRESS", &settings.from_address),
            ("TO_ADDRESS", &settings.to_address),
        ];
        let missing: Vec<&'static str> = fields
            .iter()
            .filter(|(_, value)| value.as_deref().is_none_or(str::is_empty))
            .map(|(name, _)| *name)
            .collect();
        if !missing.is_empty() {
            return Err(MessagingError::MissingConfig(missing));
        }

        Ok(Credentials {
            account_sid: settings.account_sid.clone().unwrap_or_default(),
            auth_token: settings.auth_token.clone().unwrap_or_default(),
            from_address: settings.from_address.clone().unwrap_or_default(),
            to_address: settings.to_address.clone().unwrap_or_default(),
        })
    }
}

#[async_trait]
pub trait MessageTransport {
    /// Sends `body` and returns the provider-assigned message id.
    async fn send(&self, credentials: &Credentials, body: &str) -> Result<String, MessagingError>;
}

/// Twilio Programmable Messaging over its REST API.
pub struct TwilioTransport {
    http_client: Client,
    api_base: String,
}

impl TwilioTransport {
    pub fn new(api_base: impl Into<String>) -> Self {
        Self {
            http_client: Client::new(),
            api_base: api_base.into().trim_end_matches('/').to_string(),
        }
    }

    fn messages_url(&self, account_sid: &str) -> String {
        format!("{}/2010-04-01/Accounts/{}/Messages.json", self.api_base, account_sid)
    }
}

#[async_trait]
impl MessageTransport for TwilioTransport {
    async fn send(&self, credentials: &Credentials, body: &str) -> Result<String, MessagingError> {
        let form = [
            ("From", credentials.from_address.as_str()),
            ("To", credentials.to_address.as_str()),
            ("Body", body),
        ];

        let response = self
            .http_client
            .post(self.messages_url(&credentials.account_sid))
            .basic_auth(&credentials.account_sid, Some(&credentials.auth_token))
            .form(&form)
            .send()
            .await
            .map_err(|e| MessagingError::Transport(e.to_string()))?;

        let status = response.status();
        let response_body: Value = response
            .json()
            .await
            .map_err(|e| MessagingError::Transport(e.to_string()))?;

        if !status.is_success() {
            let error = response_body["message"]
                .as_str()
                .map(str::to_string)
                .unwrap_or_else(|| format!("Unexpected status {}", status));
            return Err(MessagingError::Rejected(error));
        }

        match response_body["sid"].as_str() {
            Some(sid) if !sid.is_empty() => Ok(sid.to_string()),
            _ => Err(MessagingError::Transport(
                "Response did not include a message sid".to_string(),
            )),
        }
    }
}
