use serde::Deserialize;
use std::{fs, net::SocketAddr, path::Path};
use thiserror::Error;

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_MESSAGING_API_BASE: &str = "https://api.twilio.com";

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("Failed to read settings file {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },

    #[error("Failed to parse settings file {path}: {source}")]
    Parse {
        path: String,
        source: serde_yaml::Error,
    },
}

/// Process-wide configuration, built once at startup and shared read-only.
///
/// Every value is optional: a missing endpoint or messaging credential is
/// reported by the component that needs it, not at startup.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub server: ServerSettings,
    pub endpoint: EndpointSettings,
    pub messaging: MessagingSettings,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        ServerSettings {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
        }
    }
}

impl ServerSettings {
    pub fn socket_addr(&self) -> Result<SocketAddr, std::net::AddrParseError> {
        format!("{}:{}", self.host, self.port).parse()
    }
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct EndpointSettings {
    pub url: Option<String>,
    pub secret: Option<String>,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct MessagingSettings {
    pub account_sid: Option<String>,
    pub auth_token: Option<String>,
    pub from_address: Option<String>,
    pub to_address: Option<String>,
    pub api_base: String,
}

impl Default for MessagingSettings {
    fn default() -> Self {
        MessagingSettings {
            account_sid: None,
            auth_token: None,
            from_address: None,
            to_address: None,
            api_base: DEFAULT_MESSAGING_API_BASE.to_string(),
        }
    }
}

// Each setting is read from its generic name first, then from the
// Hasura/Twilio-specific name.
const ENDPOINT_URL: [&str; 2] = ["ENDPOINT_URL", "HASURA_URL"];
const ENDPOINT_SECRET: [&str; 2] = ["ENDPOINT_SECRET", "HASURA_SECRET"];
const ACCOUNT_SID: [&str; 2] = ["ACCOUNT_SID", "TWILIO_ACCOUNT_SID"];
const AUTH_TOKEN: [&str; 2] = ["AUTH_TOKEN", "TWILIO_AUTH_TOKEN"];
const FROM_ADDRESS: [&str; 2] = ["FROM_ADDRESS", "TWILIO_PHONE_NUMBER"];
const TO_ADDRESS: [&str; 2] = ["TO_ADDRESS", "DESTINO_WHATSAPP"];
const MESSAGING_API_BASE: [&str; 1] = ["MESSAGING_API_BASE"];

impl Settings {
    /// Loads the optional YAML file, then overlays the process environment.
    pub fn load(config_path: Option<&Path>) -> Result<Self, SettingsError> {
        let base = match config_path {
            Some(path) => Self::from_file(path)?,
            None => Settings::default(),
        };
        Ok(base.with_overrides(|key| std::env::var(key).ok()))
    }

    pub fn from_file(path: &Path) -> Result<Self, SettingsError> {
        let contents = fs::read_to_string(path).map_err(|source| SettingsError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_yaml(&contents).map_err(|source| SettingsError::Parse {
            path: path.display().to_string(),
            source,
        })
    }

    pub fn from_yaml(contents: &str) -> Result<Self, serde_yaml::Error> {
        // An empty file deserializes to unit, not to an empty mapping.
        if contents.trim().is_empty() {
            return Ok(Settings::default());
        }
        serde_yaml::from_str(contents)
    }

    /// Applies environment-style overrides through `lookup`. Blank values
    /// count as unset.
    pub fn with_overrides<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |names: &[&str]| {
            names
                .iter()
                .filter_map(|name| lookup(*name))
                .map(|value| value.trim().to_string())
                .find(|value| !value.is_empty())
        };

        override_with(&mut self.endpoint.url, read(&ENDPOINT_URL));
        override_with(&mut self.endpoint.secret, read(&ENDPOINT_SECRET));
        override_with(&mut self.messaging.account_sid, read(&ACCOUNT_SID));
        override_with(&mut self.messaging.auth_token, read(&AUTH_TOKEN));
        override_with(&mut self.messaging.from_address, read(&FROM_ADDRESS));
        override_with(&mut self.messaging.to_address, read(&TO_ADDRESS));
        if let Some(api_base) = read(&MESSAGING_API_BASE) {
            self.messaging.api_base = api_base;
        }
        self
    }
}

fn override_with(slot: &mut Option<String>, value: Option<String>) {
    if value.is_some() {
        *slot = value;
    }
}
