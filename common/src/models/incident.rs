//! Incident notification models.
//!
//! Alerting publishes incidents to Pub/Sub, which pushes them to the intake
//! endpoint wrapped in an envelope whose `message.data` is base64 JSON.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

use crate::errors::{AppError, AppResult};

/// Incident state that triggers deletion.
pub const INCIDENT_OPEN: &str = "open";

/// Decoded incident payload.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct IncidentNotification {
    pub incident: Incident,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Incident {
    /// `open` or `closed`.
    pub state: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub incident_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub policy_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
}

impl IncidentNotification {
    pub fn is_open(&self) -> bool {
        self.incident.state == INCIDENT_OPEN
    }

    /// Validates a raw push body and decodes the incident it carries.
    ///
    /// Every rejection is an [`AppError::BadRequest`] whose message says which
    /// part of the envelope or payload was wrong.
    pub fn from_push_body(body: &[u8]) -> AppResult<Self> {
        let envelope: Value = match serde_json::from_slice(body) {
            Ok(Value::Null) | Err(_) => return Err(bad_request("no Pub/Sub message received")),
            Ok(value) => value,
        };
        let message = envelope
            .as_object()
            .and_then(|obj| obj.get("message"))
            .ok_or_else(|| bad_request("invalid Pub/Sub message format"))?;
        let data = message
            .as_object()
            .and_then(|obj| obj.get("data"))
            .and_then(Value::as_str)
            .ok_or_else(|| bad_request("Pub/Sub message carries no data"))?;

        let decoded = STANDARD
            .decode(data.trim())
            .map_err(|e| bad_request(&format!("message data is not valid base64: {e}")))?;
        let text = String::from_utf8(decoded)
            .map_err(|_| bad_request("message data is not valid UTF-8"))?;

        serde_json::from_str(text.trim())
            .map_err(|e| bad_request(&format!("message data is not an incident payload: {e}")))
    }
}

fn bad_request(msg: &str) -> AppError {
    AppError::BadRequest(msg.to_string())
}
