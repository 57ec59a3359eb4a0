//! Minimal end-to-end walkthrough: mark the area active, stream a short
//! color sweep, then stop.

use std::net::IpAddr;
use std::time::Duration;

use huestream::{
    EntertainmentArea, EntertainmentChannel, HueControlPlane, SessionCredentials, StreamingSession,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Replace with your bridge address, the credentials obtained at
    // registration, and an entertainment area configured on the bridge.
    let bridge: IpAddr = "192.168.1.2".parse()?;
    let credentials = SessionCredentials::new(
        "your-registered-app-key",
        "00112233445566778899aabbccddeeff",
    );
    let area = EntertainmentArea {
        id: "5cda38d9-4a46-4b34-b1c8-54f971a2b9f0".into(),
        channels: vec![
            EntertainmentChannel {
                channel_id: 0,
                position: vec![],
            },
            EntertainmentChannel {
                channel_id: 1,
                position: vec![],
            },
        ],
    };

    let control = HueControlPlane::new(bridge, &credentials)?;
    let session = StreamingSession::new(control, bridge, credentials);

    session.start(&area).await?;
    for step in 0u16..=50 {
        let level = (step * 5).min(255) as u8;
        session
            .send_frame(&[(level, 0, 255 - level), (255 - level, 0, level)])
            .await?;
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    session.stop().await?;
    Ok(())
}
