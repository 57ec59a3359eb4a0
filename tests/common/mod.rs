//! Recording fakes for the control-plane and connector seams.
#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use huestream::{
    ChannelError, ControlError, DatagramChannel, EntertainmentControl, ResourceReference,
    StreamAction, StreamConnector,
};

/// Control-plane fake that records every transition request.
#[derive(Clone, Default)]
pub struct RecordingControl {
    calls: Arc<Mutex<Vec<(String, StreamAction)>>>,
    rejecting: Arc<AtomicBool>,
}

impl RecordingControl {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<(String, StreamAction)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn actions(&self) -> Vec<StreamAction> {
        self.calls().into_iter().map(|(_, action)| action).collect()
    }

    pub fn set_rejecting(&self, rejecting: bool) {
        self.rejecting.store(rejecting, Ordering::SeqCst);
    }
}

#[async_trait]
impl EntertainmentControl for RecordingControl {
    async fn set_streaming(
        &self,
        area_id: &str,
        action: StreamAction,
    ) -> Result<ResourceReference, ControlError> {
        self.calls
            .lock()
            .unwrap()
            .push((area_id.to_string(), action));
        if self.rejecting.load(Ordering::SeqCst) {
            return Err(ControlError::Api("transition rejected".into()));
        }
        Ok(ResourceReference {
            rid: Uuid::new_v4(),
            rtype: "entertainment_configuration".into(),
        })
    }
}

/// How the fake connector behaves on `connect`.
#[derive(Clone, Copy, PartialEq, Eq)]
pub enum ConnectorMode {
    /// Hand out a recording channel immediately.
    Connect,
    /// Fail the handshake.
    Fail,
    /// Park until the cancellation token fires.
    Park,
}

/// Connector fake whose channels record datagrams and closes.
#[derive(Clone)]
pub struct MockConnector {
    mode: Arc<Mutex<ConnectorMode>>,
    datagrams: Arc<Mutex<Vec<Vec<u8>>>>,
    closes: Arc<AtomicUsize>,
    connects: Arc<AtomicUsize>,
}

impl MockConnector {
    pub fn new(mode: ConnectorMode) -> Self {
        Self {
            mode: Arc::new(Mutex::new(mode)),
            datagrams: Arc::new(Mutex::new(Vec::new())),
            closes: Arc::new(AtomicUsize::new(0)),
            connects: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn set_mode(&self, mode: ConnectorMode) {
        *self.mode.lock().unwrap() = mode;
    }

    pub fn datagrams(&self) -> Vec<Vec<u8>> {
        self.datagrams.lock().unwrap().clone()
    }

    pub fn closes(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }

    pub fn connects(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }
}

pub struct RecordingChannel {
    datagrams: Arc<Mutex<Vec<Vec<u8>>>>,
    closes: Arc<AtomicUsize>,
}

#[async_trait]
impl DatagramChannel for RecordingChannel {
    async fn send(&self, datagram: &[u8]) -> Result<(), ChannelError> {
        self.datagrams.lock().unwrap().push(datagram.to_vec());
        Ok(())
    }

    async fn close(&self) -> Result<(), ChannelError> {
        self.closes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[async_trait]
impl StreamConnector for MockConnector {
    type Channel = RecordingChannel;

    async fn connect(
        &self,
        _addr: SocketAddr,
        _identity: String,
        _key: Vec<u8>,
        _timeout: Duration,
        cancel: CancellationToken,
    ) -> Result<Self::Channel, ChannelError> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        let mode = *self.mode.lock().unwrap();
        match mode {
            ConnectorMode::Connect => Ok(RecordingChannel {
                datagrams: Arc::clone(&self.datagrams),
                closes: Arc::clone(&self.closes),
            }),
            ConnectorMode::Fail => Err(ChannelError::Handshake("refused by fake".into())),
            ConnectorMode::Park => {
                cancel.cancelled().await;
                Err(ChannelError::Cancelled)
            }
        }
    }
}
