//! Streaming session lifecycle: the only place session state is mutated.
//!
//! A controller owns one logical session at a time. `start` brackets the
//! control-plane transition and the DTLS connect into a single resolving
//! call; `send_frame` pushes one encoded frame over the established channel;
//! `stop` tears the channel down locally before informing the control plane.

use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::channel::{
    ChannelError, DatagramChannel, DtlsConnector, StreamConnector, STREAMING_PORT,
};
use crate::control::{ControlError, EntertainmentControl, StreamAction};
use crate::frame::{self, EncodeError, Rgb};
use crate::resources::{EntertainmentArea, SessionCredentials};

pub mod state;
pub use state::{SessionState, SessionStateError};

const CONNECT_TIMEOUT: Duration = Duration::from_millis(1000);

/// Errors emitted by the session lifecycle surface.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum SessionError {
    /// Operation attempted outside the session state that allows it.
    #[error("operation invalid in session state {0:?}")]
    InvalidState(SessionState),
    /// The start/stop transition was rejected or unreachable.
    #[error("control plane transition failed: {0}")]
    ControlPlane(#[source] ControlError),
    /// The hex client key could not be decoded into PSK bytes.
    #[error("invalid pre-shared key material: {0}")]
    Credentials(#[from] hex::FromHexError),
    /// The DTLS connect failed or timed out.
    #[error("dtls handshake failed: {0}")]
    Handshake(#[source] ChannelError),
    /// The start attempt was cancelled before the channel became writable.
    #[error("streaming start cancelled")]
    Cancelled,
    #[error(transparent)]
    Encoding(#[from] EncodeError),
    /// The local datagram write failed.
    #[error("datagram send failed: {0}")]
    Transport(#[source] ChannelError),
}

struct SessionInner<Ch> {
    state: SessionState,
    area_id: Option<String>,
    channel: Option<Arc<Ch>>,
    cancel: Option<CancellationToken>,
}

/// Controller for one entertainment streaming session.
///
/// Generic over the control-plane client and the stream connector so the
/// lifecycle can be exercised against recording fakes; production callers use
/// [`HueControlPlane`](crate::control::HueControlPlane) and the default
/// [`DtlsConnector`].
///
/// # Guarantees
/// * At most one session is live per controller; a `start` while not idle
///   fails with [`SessionError::InvalidState`] instead of replacing the
///   channel.
/// * Exactly one control-plane `start` and one `stop` transition per
///   completed session, never retried.
/// * All methods take `&self`; lifecycle state lives behind a short-held lock
///   so `stop` can run while `start` is still awaiting the handshake.
pub struct StreamingSession<C, N: StreamConnector = DtlsConnector> {
    control: C,
    connector: N,
    bridge: IpAddr,
    credentials: SessionCredentials,
    inner: Mutex<SessionInner<N::Channel>>,
}

impl<C: EntertainmentControl> StreamingSession<C> {
    /// Builds a controller that opens DTLS-PSK channels to `bridge`.
    ///
    /// The caller resolves the bridge address up front; no name resolution
    /// happens inside this crate.
    pub fn new(control: C, bridge: IpAddr, credentials: SessionCredentials) -> Self {
        Self::with_connector(control, DtlsConnector, bridge, credentials)
    }
}

impl<C, N> StreamingSession<C, N>
where
    C: EntertainmentControl,
    N: StreamConnector,
{
    pub fn with_connector(
        control: C,
        connector: N,
        bridge: IpAddr,
        credentials: SessionCredentials,
    ) -> Self {
        Self {
            control,
            connector,
            bridge,
            credentials,
            inner: Mutex::new(SessionInner {
                state: SessionState::Idle,
                area_id: None,
                channel: None,
                cancel: None,
            }),
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> SessionState {
        self.inner.lock().state
    }

    /// Starts streaming into `area`.
    ///
    /// # Behavior
    /// * Claims the session (`Idle -> Starting`) atomically, so a concurrent
    ///   second `start` fails with [`SessionError::InvalidState`].
    /// * Marks the area active on the control plane, then opens the DTLS
    ///   channel with a fixed 1000 ms handshake deadline. The returned future
    ///   resolves only once the channel is writable.
    /// * A control-plane failure restores `Idle` with no channel opened. A
    ///   connect failure or cancellation also restores `Idle`, but the
    ///   control-plane `start` already applied is not rolled back; callers
    ///   needing strict consistency issue a compensating [`stop`](Self::stop).
    ///
    /// # Errors
    /// [`SessionError::InvalidState`], [`SessionError::ControlPlane`],
    /// [`SessionError::Credentials`], [`SessionError::Handshake`], or
    /// [`SessionError::Cancelled`] when `stop` interrupted the attempt.
    pub async fn start(&self, area: &EntertainmentArea) -> Result<(), SessionError> {
        // The token is stored in the same critical section as the state claim
        // so a stop() arriving at any point of the attempt finds it.
        let cancel = CancellationToken::new();
        {
            let mut inner = self.inner.lock();
            inner.state = inner
                .state
                .transition(SessionState::Starting)
                .map_err(|err| SessionError::InvalidState(err.from))?;
            inner.area_id = Some(area.id.clone());
            inner.cancel = Some(cancel.clone());
        }
        debug!(area = %area.id, "starting entertainment streaming session");

        if let Err(err) = self
            .control
            .set_streaming(&area.id, StreamAction::Start)
            .await
        {
            self.abandon_start();
            return Err(SessionError::ControlPlane(err));
        }

        let key = match self.credentials.psk_bytes() {
            Ok(key) => key,
            Err(err) => {
                self.abandon_start();
                return Err(SessionError::Credentials(err));
            }
        };

        let addr = SocketAddr::new(self.bridge, STREAMING_PORT);
        let connected = self
            .connector
            .connect(
                addr,
                self.credentials.app_key.clone(),
                key,
                CONNECT_TIMEOUT,
                cancel,
            )
            .await;

        match connected {
            Ok(channel) => {
                let raced = {
                    let mut inner = self.inner.lock();
                    if inner.state == SessionState::Starting {
                        inner.state = SessionState::Active;
                        inner.channel = Some(Arc::new(channel));
                        inner.cancel = None;
                        None
                    } else {
                        // stop() claimed the session while the handshake was
                        // finishing; the fresh channel is ours to discard
                        Some(channel)
                    }
                };
                match raced {
                    None => {
                        debug!(area = %area.id, "streaming channel established");
                        Ok(())
                    }
                    Some(channel) => {
                        if let Err(err) = channel.close().await {
                            warn!(error = %err, "discarding raced channel failed");
                        }
                        Err(SessionError::Cancelled)
                    }
                }
            }
            Err(ChannelError::Cancelled) => {
                self.abandon_start();
                Err(SessionError::Cancelled)
            }
            Err(err) => {
                self.abandon_start();
                Err(SessionError::Handshake(err))
            }
        }
    }

    /// Sends one frame of color assignments, one `(r, g, b)` triple per
    /// channel in ascending channel order starting at 0.
    ///
    /// Requires an active session; succeeding means "accepted for
    /// transmission", nothing more. UDP gives no delivery guarantee and this
    /// layer adds no retry.
    pub async fn send_frame(&self, colors: &[Rgb]) -> Result<(), SessionError> {
        let (channel, area_id) = {
            let inner = self.inner.lock();
            match (inner.state, &inner.channel, &inner.area_id) {
                (SessionState::Active, Some(channel), Some(area_id)) => {
                    (Arc::clone(channel), area_id.clone())
                }
                _ => return Err(SessionError::InvalidState(inner.state)),
            }
        };
        let datagram = frame::encode_frame(&area_id, colors)?;
        channel
            .send(&datagram)
            .await
            .map_err(SessionError::Transport)
    }

    /// Stops the session.
    ///
    /// # Behavior
    /// * Valid while `Active`, and while `Starting` to cancel an in-flight
    ///   handshake; any other state fails with
    ///   [`SessionError::InvalidState`].
    /// * Cancels the outstanding handshake, closes the channel locally, then
    ///   marks the area inactive on the control plane, in that order. A
    ///   crash between the close and the control-plane call leaves the bridge
    ///   believing streaming is still active, so "stop acknowledged" is
    ///   best-effort, not transactional.
    /// * The session always returns to `Idle`, even when the control-plane
    ///   `stop` fails; the failure is still surfaced to the caller.
    pub async fn stop(&self) -> Result<(), SessionError> {
        let (channel, cancel, area_id) = {
            let mut inner = self.inner.lock();
            inner.state = inner
                .state
                .transition(SessionState::Stopping)
                .map_err(|err| SessionError::InvalidState(err.from))?;
            (inner.channel.take(), inner.cancel.take(), inner.area_id.take())
        };

        if let Some(cancel) = cancel {
            cancel.cancel();
        }
        if let Some(channel) = channel {
            if let Err(err) = channel.close().await {
                warn!(error = %err, "streaming channel close failed");
            }
        }

        let result = match &area_id {
            Some(area_id) => self
                .control
                .set_streaming(area_id, StreamAction::Stop)
                .await
                .map(|_| ())
                .map_err(SessionError::ControlPlane),
            None => Ok(()),
        };

        self.inner.lock().state = SessionState::Idle;
        debug!(area = area_id.as_deref().unwrap_or(""), "streaming session stopped");
        result
    }

    fn abandon_start(&self) {
        let mut inner = self.inner.lock();
        if inner.state == SessionState::Starting {
            inner.state = SessionState::Idle;
            inner.area_id = None;
            inner.cancel = None;
        }
    }
}
