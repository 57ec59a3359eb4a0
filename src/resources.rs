//! Shared resource types exchanged with the bridge.
//!
//! These mirror the CLIP v2 payload shapes the caller already holds; unknown
//! JSON fields are ignored on deserialization so responses can be fed in
//! directly.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A bridge-side group of light channels configured for streaming.
///
/// Fetched and owned by the caller; the session records only the `id`, which
/// doubles as the group identifier on the streaming wire.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EntertainmentArea {
    pub id: String,
    pub channels: Vec<EntertainmentChannel>,
}

/// One addressable color output within an entertainment area.
///
/// The position metadata is for caller-side color mapping only; it never
/// reaches the wire.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EntertainmentChannel {
    pub channel_id: u8,
    #[serde(default)]
    pub position: Vec<Position>,
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

/// Reference to a bridge resource, as returned by control-plane mutations.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ResourceReference {
    pub rid: Uuid,
    pub rtype: String,
}

/// Credentials obtained when the application was registered on the bridge.
///
/// `app_key` authenticates control-plane requests and serves as the DTLS PSK
/// identity; `client_key` is the hex-encoded pre-shared key. Used to derive
/// the cipher context at connect time, never persisted by this crate.
#[derive(Clone, Deserialize, Serialize)]
pub struct SessionCredentials {
    pub app_key: String,
    pub client_key: String,
}

impl SessionCredentials {
    pub fn new(app_key: impl Into<String>, client_key: impl Into<String>) -> Self {
        Self {
            app_key: app_key.into(),
            client_key: client_key.into(),
        }
    }

    /// Decodes the hex client key into raw PSK bytes.
    pub fn psk_bytes(&self) -> Result<Vec<u8>, hex::FromHexError> {
        hex::decode(&self.client_key)
    }
}
