//! Encrypted datagram channel to the bridge's streaming port.
//!
//! The bridge terminates DTLS 1.2 with the pre-shared-key suite
//! `TLS_PSK_WITH_AES_128_GCM_SHA256` on UDP port 2100. The channel offers
//! exactly three things: a cancellable connect with a deadline, single-datagram
//! sends with plain UDP semantics, and an idempotent close.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::net::UdpSocket;
use tokio::time;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use webrtc_dtls::cipher_suite::CipherSuiteId;
use webrtc_dtls::config::Config;
use webrtc_dtls::conn::DTLSConn;
use webrtc_util::Conn;

/// Fixed bridge-side port for entertainment streaming.
pub const STREAMING_PORT: u16 = 2100;

/// Errors emitted by the datagram channel.
#[derive(Debug, thiserror::Error)]
pub enum ChannelError {
    #[error("socket error: {0}")]
    Io(String),
    #[error("dtls handshake failed: {0}")]
    Handshake(String),
    #[error("dtls handshake timed out after {0:?}")]
    Timeout(Duration),
    #[error("connect cancelled")]
    Cancelled,
    #[error("channel already closed")]
    Closed,
}

/// Seam between the session controller and the wire: one established channel.
#[async_trait]
pub trait DatagramChannel: Send + Sync {
    /// Transmits one datagram. Not guaranteed delivered; no retry, no ack.
    async fn send(&self, datagram: &[u8]) -> Result<(), ChannelError>;

    /// Tears down the association. Closing twice is a no-op.
    async fn close(&self) -> Result<(), ChannelError>;
}

/// Factory seam for opening a channel during session start.
#[async_trait]
pub trait StreamConnector: Send + Sync {
    type Channel: DatagramChannel + 'static;

    /// Opens a channel to `addr`, resolving once the association is writable.
    ///
    /// The caller supplies the already-resolved bridge address; this layer
    /// never consults process-wide resolution state. A raised `cancel` aborts
    /// the attempt, releases any partially-open socket, and reports
    /// [`ChannelError::Cancelled`] rather than a handshake failure.
    async fn connect(
        &self,
        addr: SocketAddr,
        identity: String,
        key: Vec<u8>,
        timeout: Duration,
        cancel: CancellationToken,
    ) -> Result<Self::Channel, ChannelError>;
}

/// DTLS-PSK channel over an ephemeral local UDP socket.
pub struct DtlsChannel {
    conn: DTLSConn,
    closed: AtomicBool,
}

impl DtlsChannel {
    /// Binds a local socket, connects it to `addr`, and runs the PSK handshake.
    ///
    /// Resolves once the handshake completes; the cancellation token is
    /// checked ahead of the handshake outcome so a cancelled attempt reports
    /// [`ChannelError::Cancelled`] even if the deadline raced it.
    pub async fn connect(
        addr: SocketAddr,
        identity: String,
        key: Vec<u8>,
        handshake_timeout: Duration,
        cancel: CancellationToken,
    ) -> Result<Self, ChannelError> {
        let socket = UdpSocket::bind(("0.0.0.0", 0))
            .await
            .map_err(|e| ChannelError::Io(e.to_string()))?;
        socket
            .connect(addr)
            .await
            .map_err(|e| ChannelError::Io(e.to_string()))?;
        debug!(peer = %addr, "opening dtls-psk channel");

        let config = Config {
            psk: Some(Arc::new(move |_hint: &[u8]| Ok(key.clone()))),
            psk_identity_hint: Some(identity.into_bytes()),
            cipher_suites: vec![CipherSuiteId::Tls_Psk_With_Aes_128_Gcm_Sha256],
            ..Default::default()
        };

        let handshake = DTLSConn::new(Arc::new(socket), config, true, None);
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(ChannelError::Cancelled),
            outcome = time::timeout(handshake_timeout, handshake) => match outcome {
                Ok(Ok(conn)) => Ok(Self {
                    conn,
                    closed: AtomicBool::new(false),
                }),
                Ok(Err(err)) => Err(ChannelError::Handshake(err.to_string())),
                Err(_) => Err(ChannelError::Timeout(handshake_timeout)),
            },
        }
    }
}

#[async_trait]
impl DatagramChannel for DtlsChannel {
    async fn send(&self, datagram: &[u8]) -> Result<(), ChannelError> {
        if self.closed.load(Ordering::Acquire) {
            return Err(ChannelError::Closed);
        }
        self.conn
            .send(datagram)
            .await
            .map_err(|e| ChannelError::Io(e.to_string()))?;
        Ok(())
    }

    async fn close(&self) -> Result<(), ChannelError> {
        if self.closed.swap(true, Ordering::AcqRel) {
            return Ok(());
        }
        self.conn
            .close()
            .await
            .map_err(|e| ChannelError::Io(e.to_string()))
    }
}

/// Production connector: every `connect` opens a fresh [`DtlsChannel`].
#[derive(Debug, Clone, Copy, Default)]
pub struct DtlsConnector;

#[async_trait]
impl StreamConnector for DtlsConnector {
    type Channel = DtlsChannel;

    async fn connect(
        &self,
        addr: SocketAddr,
        identity: String,
        key: Vec<u8>,
        timeout: Duration,
        cancel: CancellationToken,
    ) -> Result<Self::Channel, ChannelError> {
        DtlsChannel::connect(addr, identity, key, timeout, cancel).await
    }
}
