pub mod messaging;
pub mod navigate;
pub mod pipeline;
pub mod queries;
pub mod query_client;
pub mod server;
pub mod settings;
pub mod shaping;

pub use messaging::{MessageTransport, TwilioTransport};
pub use pipeline::FermentationPipeline;
pub use query_client::{HttpQueryClient, QueryClient, QueryClientError};
pub use server::AppState;
pub use settings::Settings;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Backend identifier for entities, processes and detail rows (`Int!`).
pub type Id = i64;

#[derive(Serialize, Deserialize, Debug)]
pub struct GraphQLRequest {
    pub query: String,
    pub variables: Value,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FungalEntity {
    pub id: Id,
    pub name: String,
}

/// One timestamped sensor/alarm snapshot of a fermentation process.
///
/// Optional fields stay `None` when the backend row lacks the related
/// object; placeholders are only applied by [`shaping`].
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct DetailRecord {
    pub timestamp: String,
    pub tempeh_temp: Option<f64>,
    pub ambient_temp: Option<f64>,
    pub humidity: Option<f64>,
    pub ac_temp: Option<f64>,
    pub stove_temp: Option<f64>,
    pub alarm_name: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessReport {
    pub process_id: Id,
    pub details: Vec<DetailRecord>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FermentationReport {
    pub entity: String,
    pub processes: Vec<ProcessReport>,
}
