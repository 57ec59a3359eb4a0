//! Control-plane client for entertainment streaming transitions.
//!
//! The bridge must be told when streaming starts and stops: a `PUT` against
//! the entertainment configuration flips its status between `active` and
//! `inactive`. The session issues exactly one transition per lifecycle edge
//! and never retries; failures surface to the caller as-is.

use std::fmt;
use std::net::IpAddr;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Url;
use serde::{Deserialize, Serialize};

use crate::resources::{ResourceReference, SessionCredentials};

const APPLICATION_KEY_HEADER: &str = "hue-application-key";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Streaming transition requested from the control plane.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StreamAction {
    Start,
    Stop,
}

impl fmt::Display for StreamAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StreamAction::Start => write!(f, "start"),
            StreamAction::Stop => write!(f, "stop"),
        }
    }
}

/// Errors emitted by the control-plane client.
#[derive(Debug, thiserror::Error)]
pub enum ControlError {
    #[error("http request failed: {0}")]
    Http(String),
    #[error("bridge returned status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("could not decode bridge response: {0}")]
    Decode(String),
    #[error("bridge rejected the request: {0}")]
    Api(String),
    #[error("bridge response contained no data")]
    EmptyResponse,
}

/// The collaborator contract the streaming session depends on.
///
/// Called exactly twice per session: once with [`StreamAction::Start`] during
/// `start`, once with [`StreamAction::Stop`] during `stop`.
#[async_trait]
pub trait EntertainmentControl: Send + Sync {
    async fn set_streaming(
        &self,
        area_id: &str,
        action: StreamAction,
    ) -> Result<ResourceReference, ControlError>;
}

/// CLIP v2 response envelope: either a non-empty `errors` list or `data`.
#[derive(Debug, Deserialize)]
struct ClipResponse<T> {
    #[serde(default)]
    errors: Vec<ClipError>,
    #[serde(default = "Vec::new")]
    data: Vec<T>,
}

#[derive(Debug, Deserialize)]
struct ClipError {
    description: String,
}

fn unwrap_response<T>(response: ClipResponse<T>) -> Result<T, ControlError> {
    if let Some(error) = response.errors.into_iter().next() {
        return Err(ControlError::Api(error.description));
    }
    response
        .data
        .into_iter()
        .next()
        .ok_or(ControlError::EmptyResponse)
}

/// CLIP v2 HTTP implementation of [`EntertainmentControl`].
pub struct HueControlPlane {
    client: reqwest::Client,
    base_url: Url,
    app_key: String,
}

impl HueControlPlane {
    /// Builds a client for the bridge at `bridge`.
    ///
    /// The bridge serves a self-signed certificate, so certificate
    /// verification is disabled for this client only.
    pub fn new(bridge: IpAddr, credentials: &SessionCredentials) -> Result<Self, ControlError> {
        let client = reqwest::Client::builder()
            .danger_accept_invalid_certs(true)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| ControlError::Http(e.to_string()))?;
        let base_url = Url::parse(&format!("https://{bridge}/clip/v2/"))
            .map_err(|e| ControlError::Http(format!("invalid base url: {e}")))?;
        Ok(Self {
            client,
            base_url,
            app_key: credentials.app_key.clone(),
        })
    }
}

#[async_trait]
impl EntertainmentControl for HueControlPlane {
    async fn set_streaming(
        &self,
        area_id: &str,
        action: StreamAction,
    ) -> Result<ResourceReference, ControlError> {
        let url = self
            .base_url
            .join(&format!("resource/entertainment_configuration/{area_id}"))
            .map_err(|e| ControlError::Http(format!("invalid area id {area_id}: {e}")))?;

        let response = self
            .client
            .put(url)
            .header(APPLICATION_KEY_HEADER, &self.app_key)
            .json(&serde_json::json!({ "action": action }))
            .send()
            .await
            .map_err(|e| ControlError::Http(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".into());
            return Err(ControlError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: ClipResponse<ResourceReference> = response
            .json()
            .await
            .map_err(|e| ControlError::Decode(e.to_string()))?;
        unwrap_response(parsed)
    }
}
