//! HueStream v2 frame serialization.
//!
//! A streaming datagram is the fixed header followed by the raw area-id bytes
//! and one 7-byte record per channel. Receivers find the channel records by
//! working backwards from the fixed record length, so the area id carries no
//! length prefix or terminator.

use thiserror::Error;

/// ASCII magic opening every streaming datagram.
pub const PROTOCOL_NAME: &[u8; 9] = b"HueStream";

/// Protocol version 2.0, big-endian major/minor.
const VERSION: [u8; 2] = [0x02, 0x00];

/// Channel ids occupy a single byte, so a frame addresses at most 256 channels.
pub const MAX_CHANNELS: usize = 256;

/// One color assignment: 8-bit red, green, blue.
pub type Rgb = (u8, u8, u8);

/// Errors emitted while serializing a frame.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EncodeError {
    #[error("frame contains no channels")]
    EmptyFrame,
    #[error("frame addresses {0} channels; channel ids only cover 256")]
    TooManyChannels(usize),
}

/// Serializes one frame of color assignments for the given entertainment area.
///
/// Channel ids are assigned by position, ascending from 0, matching the order
/// in which the caller lists its channels. Each 8-bit component is written
/// twice; the bridge firmware expects that byte pattern rather than a true
/// 16-bit sample.
pub fn encode_frame(area_id: &str, colors: &[Rgb]) -> Result<Vec<u8>, EncodeError> {
    if colors.is_empty() {
        return Err(EncodeError::EmptyFrame);
    }
    if colors.len() > MAX_CHANNELS {
        return Err(EncodeError::TooManyChannels(colors.len()));
    }

    let mut datagram = Vec::with_capacity(16 + area_id.len() + colors.len() * 7);
    datagram.extend_from_slice(PROTOCOL_NAME);
    datagram.extend_from_slice(&VERSION);
    datagram.push(0x00); // sequence number, ignored by receivers
    datagram.extend_from_slice(&[0x00, 0x00]); // reserved
    datagram.push(0x00); // color space: RGB
    datagram.push(0x00); // reserved
    datagram.extend_from_slice(area_id.as_bytes());

    for (channel_id, (r, g, b)) in colors.iter().enumerate() {
        datagram.push(channel_id as u8);
        for component in [*r, *g, *b] {
            datagram.push(component);
            datagram.push(component);
        }
    }

    Ok(datagram)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_green_channel_matches_reference_bytes() {
        let datagram = encode_frame("test", &[(0, 255, 0)]).unwrap();
        let mut expected = b"HueStream".to_vec();
        expected.extend_from_slice(&[0x02, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00]);
        expected.extend_from_slice(b"test");
        expected.extend_from_slice(&[0x00, 0x00, 0x00, 0xff, 0xff, 0x00, 0x00]);
        assert_eq!(datagram, expected);
    }

    #[test]
    fn layout_is_header_then_area_then_fixed_records() {
        let area = "0e4a4d5a-6a3f-47fd-9d0d-a1a6f3c4f1a2";
        let colors = [(1, 2, 3), (40, 50, 60), (255, 0, 128)];
        let datagram = encode_frame(area, &colors).unwrap();

        assert_eq!(&datagram[..9], b"HueStream");
        assert_eq!(
            &datagram[9..16],
            &[0x02, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00]
        );
        assert_eq!(&datagram[16..16 + area.len()], area.as_bytes());
        assert_eq!(datagram.len(), 16 + area.len() + 7 * colors.len());
    }

    #[test]
    fn components_are_written_twice() {
        let datagram = encode_frame("a", &[(10, 20, 30), (200, 100, 0)]).unwrap();
        let records = &datagram[16 + 1..];
        for (index, record) in records.chunks(7).enumerate() {
            assert_eq!(record[0], index as u8);
            assert_eq!(record[1], record[2]);
            assert_eq!(record[3], record[4]);
            assert_eq!(record[5], record[6]);
        }
    }

    #[test]
    fn empty_frame_is_rejected() {
        assert_eq!(encode_frame("test", &[]), Err(EncodeError::EmptyFrame));
    }

    #[test]
    fn channel_id_overflow_is_rejected() {
        let colors = vec![(0, 0, 0); MAX_CHANNELS + 1];
        assert_eq!(
            encode_frame("test", &colors),
            Err(EncodeError::TooManyChannels(MAX_CHANNELS + 1))
        );
        let full = vec![(0, 0, 0); MAX_CHANNELS];
        assert!(encode_frame("test", &full).is_ok());
    }
}
