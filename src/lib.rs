//! Hue Entertainment streaming client (CLIP v2).
//!
//! Implements the entertainment streaming session lifecycle: the control-plane
//! start/stop transitions that bracket a session, the DTLS-PSK datagram channel
//! to the bridge's streaming port, and the HueStream v2 frame serialization.
//! Resource CRUD, bridge discovery, and registration are out of scope; callers
//! supply an already-fetched [`EntertainmentArea`] and registered credentials.

pub mod channel;
pub mod control;
pub mod frame;
pub mod resources;
pub mod session;

pub use channel::{
    ChannelError, DatagramChannel, DtlsChannel, DtlsConnector, StreamConnector, STREAMING_PORT,
};
pub use control::{ControlError, EntertainmentControl, HueControlPlane, StreamAction};
pub use frame::{encode_frame, EncodeError, Rgb};
pub use resources::{
    EntertainmentArea, EntertainmentChannel, Position, ResourceReference, SessionCredentials,
};
pub use session::{SessionError, SessionState, StreamingSession};
