use bytes::Bytes;
use http::header::{ACCESS_CONTROL_ALLOW_ORIGIN, CONTENT_TYPE};
use http_body_util::{BodyExt, Full, combinators::BoxBody};
use hyper::body::Body;
use hyper::{Method, Request, Response, StatusCode};
use percent_encoding::percent_decode_str;
use serde::Deserialize;
use serde_json::{Value, json};
use std::convert::Infallible;
use std::sync::Arc;
use tracing::{debug, error, info, warn};
use url::form_urlencoded;

use crate::{
    FermentationPipeline,
    messaging::{Credentials, MessageTransport},
    settings::MessagingSettings,
};

pub const ENTITY_NOT_FOUND: &str = "Hongo no encontrado";
pub const MISSING_MESSAGING_CONFIG: &str = "Faltan variables en el archivo .env";
pub const MISSING_MESSAGE: &str = "Falta el mensaje";
pub const MESSAGE_SENT: &str = "Mensaje enviado";

const FERMENTATION_PREFIXES: [&str; 2] = ["/fermentation/", "/fermentacion/"];
const SEND_MESSAGE_PATHS: [&str; 3] = ["/send-message", "/enviar-whatsapp", "/enviar-whatsapp/"];

/// Everything a request handler reads. Built once in `main`, never mutated.
pub struct AppState {
    pub pipeline: FermentationPipeline,
    pub transport: Box<dyn MessageTransport + Send + Sync>,
    pub messaging: MessagingSettings,
}

#[derive(Debug, Default, Deserialize)]
struct MessageBody {
    mensaje: Option<String>,
    message: Option<String>,
}

// Create a response body from a string
pub fn full<T: Into<Bytes>>(value: T) -> BoxBody<Bytes, hyper::Error> {
    Full::new(value.into())
        .map_err(|never| match never {})
        .boxed()
}

pub async fn handle_request<B>(
    req: Request<B>,
    state: Arc<AppState>,
) -> Result<Response<BoxBody<Bytes, hyper::Error>>, Infallible>
where
    B: Body<Data = Bytes>,
    B::Error: std::fmt::Display,
{
    debug!(method = %req.method(), path = req.uri().path(), "incoming request");
    let path = req.uri().path().to_string();

    let result = match (req.method(), path.as_str()) {
        (&Method::GET, "/") => json_response(
            StatusCode::OK,
            json!({"estado": "ok", "mensaje": "API de fermentación funcionando"}),
        ),

        (&Method::GET, path) if entity_segment(path).is_some() => {
            let name = entity_segment(path).map(decode_segment).unwrap_or_default();
            fermentation_report(&state, &name).await
        }

        (&Method::POST, path) if SEND_MESSAGE_PATHS.contains(&path) => {
            let from_query = query_message(req.uri().query());
            let message = match from_query {
                Some(message) => Some(message),
                None => match read_body_message(req).await {
                    Ok(message) => message,
                    Err(e) => {
                        return Ok(json_response(
                            StatusCode::BAD_REQUEST,
                            json!({"error": format!("Invalid JSON request: {}", e)}),
                        ));
                    }
                },
            };

            match message {
                Some(message) => json_response(StatusCode::OK, send_message(&state, &message).await),
                None => json_response(
                    StatusCode::UNPROCESSABLE_ENTITY,
                    json!({"error": MISSING_MESSAGE}),
                ),
            }
        }

        (&Method::OPTIONS, _) => Response::builder()
            .header(ACCESS_CONTROL_ALLOW_ORIGIN, "*")
            .header("Access-Control-Allow-Methods", "GET, POST, OPTIONS")
            .header("Access-Control-Allow-Headers", "Content-Type")
            .body(full(""))
            .unwrap_or_else(|_| internal_server_error()),

        _ => Response::builder()
            .status(StatusCode::NOT_FOUND)
            .header(ACCESS_CONTROL_ALLOW_ORIGIN, "*")
            .body(full("Not Found"))
            .unwrap_or_else(|_| internal_server_error()),
    };

    Ok(result)
}

async fn fermentation_report(state: &AppState, name: &str) -> Response<BoxBody<Bytes, hyper::Error>> {
    match state.pipeline.report(name).await {
        Some(report) => match serde_json::to_value(&report) {
            Ok(body) => json_response(StatusCode::OK, body),
            Err(e) => {
                error!("Failed to serialize report: {}", e);
                internal_server_error()
            }
        },
        None => {
            info!(entity = name, "entity not found");
            json_response(StatusCode::OK, json!({"error": ENTITY_NOT_FOUND}))
        }
    }
}

async fn send_message(state: &AppState, message: &str) -> Value {
    let credentials = match Credentials::from_settings(&state.messaging) {
        Ok(credentials) => credentials,
        Err(e) => {
            warn!("{}", e);
            return json!({"error": MISSING_MESSAGING_CONFIG});
        }
    };

    match state.transport.send(&credentials, message).await {
        Ok(sid) => {
            info!(%sid, "message sent");
            json!({"estado": MESSAGE_SENT, "sid": sid})
        }
        Err(e) => {
            error!("Failed to send message: {}", e);
            json!({"error": e.to_string()})
        }
    }
}

fn entity_segment(path: &str) -> Option<&str> {
    FERMENTATION_PREFIXES
        .iter()
        .find_map(|prefix| path.strip_prefix(prefix))
        .map(|rest| rest.trim_end_matches('/'))
        .filter(|segment| !segment.is_empty() && !segment.contains('/'))
}

/// Percent-decodes a path segment. `+` is literal in paths, unlike in forms.
fn decode_segment(segment: &str) -> String {
    percent_decode_str(segment).decode_utf8_lossy().into_owned()
}

fn query_message(query: Option<&str>) -> Option<String> {
    let query = query?;
    let pairs: Vec<(String, String)> = form_urlencoded::parse(query.as_bytes())
        .into_owned()
        .collect();
    ["mensaje", "message"].iter().find_map(|key| {
        pairs
            .iter()
            .find(|(k, v)| k.as_str() == *key && !v.is_empty())
            .map(|(_, v)| v.clone())
    })
}

async fn read_body_message<B>(req: Request<B>) -> Result<Option<String>, String>
where
    B: Body<Data = Bytes>,
    B::Error: std::fmt::Display,
{
    let body_bytes = req
        .into_body()
        .collect()
        .await
        .map_err(|e| format!("Failed to read request body: {}", e))?
        .to_bytes();

    if body_bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(None);
    }

    let body: MessageBody = serde_json::from_slice(&body_bytes).map_err(|e| e.to_string())?;
    Ok(body
        .mensaje
        .or(body.message)
        .filter(|message| !message.is_empty()))
}

fn json_response(status: StatusCode, body: Value) -> Response<BoxBody<Bytes, hyper::Error>> {
    let json = serde_json::to_string(&body).unwrap_or_default();
    Response::builder()
        .status(status)
        .header(CONTENT_TYPE, "application/json")
        .header(ACCESS_CONTROL_ALLOW_ORIGIN, "*")
        .body(full(json))
        .unwrap_or_else(|_| internal_server_error())
}

// Create a standard internal server error response
fn internal_server_error() -> Response<BoxBody<Bytes, hyper::Error>> {
    let mut response = Response::new(full("Internal Server Error"));
    *response.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
    response
}
