use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

/// Request envelope carried on a subject queue.
///
/// `payload` is the raw JSON body handed to the store; `reply_to` names the
/// queue the caller listens on. Requests without `reply_to` are fire-and-forget.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BusRequest {
    pub request_id: String,
    #[serde(default)]
    pub reply_to: Option<String>,
    #[serde(default)]
    pub payload: Value,
}

impl BusRequest {
    pub fn new(payload: Value, reply_to: Option<String>) -> Self {
        let request_id = uuid::Uuid::now_v7().to_string();
        debug!(request_id = %request_id, reply_to = ?reply_to, "Creating bus request");
        Self {
            request_id,
            reply_to,
            payload,
        }
    }

    /// Body bytes as the store expects them.
    pub fn body(&self) -> Vec<u8> {
        // Serializing a `Value` cannot fail.
        serde_json::to_vec(&self.payload).unwrap_or_default()
    }
}

/// Reply envelope published on the requester's `reply_to` queue.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BusReply {
    pub request_id: String,
    pub payload: Value,
}

impl BusReply {
    /// Wraps encoded reply bytes. Bytes that are not JSON are carried as a string.
    pub fn from_bytes(request_id: impl Into<String>, body: &[u8]) -> Self {
        let payload = serde_json::from_slice(body)
            .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(body).into_owned()));
        Self {
            request_id: request_id.into(),
            payload,
        }
    }
}
