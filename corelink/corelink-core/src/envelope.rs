//! Fixed-size wire container exchanged between the two cores.
//!
//! Layout (packed, little-endian, no version field):
//!
//! | offset | size | field          |
//! |--------|------|----------------|
//! | 0      | 1    | client_id      |
//! | 1      | 2    | interrupt_mask |
//! | 3      | 4    | label_id       |
//! | 7      | 256  | label, NUL terminated, zero padded |
//!
//! Both cores must be built from the same layout. There is no negotiation.

use crate::buffer::{BufferReader, BufferWriter};
use crate::error::DecodeError;
use crate::payload::{DetectionPayload, PAYLOAD_WIRE_SIZE};

pub const ENVELOPE_WIRE_SIZE: usize = 1 + 2 + PAYLOAD_WIRE_SIZE;

/// One encoded envelope as it sits in a mailbox slot
pub type Frame = [u8; ENVELOPE_WIRE_SIZE];

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Envelope {
    /// Client id of the sending endpoint
    pub client_id: u8,
    /// Interrupt line(s) to assert on the receiving core
    pub interrupt_mask: u16,
    pub payload: DetectionPayload,
}

impl Envelope {
    pub fn new(client_id: u8, interrupt_mask: u16, payload: DetectionPayload) -> Self {
        Envelope {
            client_id,
            interrupt_mask,
            payload,
        }
    }

    pub fn encode(&self) -> Frame {
        Self::encode_parts(self.client_id, self.interrupt_mask, &self.payload)
    }

    /// Encodes a frame straight from a borrowed payload, so the producer's slot does not have to be
    /// moved into an owned envelope first.
    pub fn encode_parts(client_id: u8, interrupt_mask: u16, payload: &DetectionPayload) -> Frame {
        let mut writer = BufferWriter::<ENVELOPE_WIRE_SIZE>::new();
        writer.write_byte(client_id);
        writer.write_bytes(&interrupt_mask.to_le_bytes());
        payload.write_bytes(&mut writer);
        writer.into_inner()
    }

    pub fn decode(frame: &[u8]) -> Result<Self, DecodeError> {
        if frame.len() != ENVELOPE_WIRE_SIZE {
            return Err(DecodeError::Length {
                expected: ENVELOPE_WIRE_SIZE,
                actual: frame.len(),
            });
        }

        let mut reader = BufferReader::new(frame);
        let short = DecodeError::Length {
            expected: ENVELOPE_WIRE_SIZE,
            actual: frame.len(),
        };
        let client_id = reader.read_byte().ok_or(short)?;
        let interrupt_mask = reader.read_u16_le().ok_or(short)?;
        let payload = DetectionPayload::read_bytes(&mut reader)?;

        Ok(Envelope {
            client_id,
            interrupt_mask,
            payload,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_envelope_wire_layout() {
        let payload = DetectionPayload::with_label(5, "right_edge").unwrap();
        let frame = Envelope::new(5, 1 << 9, payload).encode();

        assert_eq!(frame.len(), 263);
        assert_eq!(frame[0], 5, "client id");
        assert_eq!(&frame[1..3], &[0x00, 0x02], "interrupt mask");
        assert_eq!(&frame[3..7], &[5, 0, 0, 0], "label id");
        assert_eq!(&frame[7..18], b"right_edge\0");
        assert!(frame[18..].iter().all(|&b| b == 0), "label padding");
    }

    #[test]
    fn test_decode_returns_the_encoded_envelope() {
        let envelope = Envelope::new(3, 0x0400, DetectionPayload::with_label(2, "top").unwrap());
        assert_eq!(Envelope::decode(&envelope.encode()), Ok(envelope));
    }

    #[test]
    fn test_decode_rejects_wrong_length() {
        let frame = Envelope::new(3, 0, DetectionPayload::empty()).encode();
        assert_eq!(
            Envelope::decode(&frame[..ENVELOPE_WIRE_SIZE - 1]),
            Err(DecodeError::Length {
                expected: ENVELOPE_WIRE_SIZE,
                actual: ENVELOPE_WIRE_SIZE - 1
            })
        );
    }

    #[test]
    fn test_decode_rejects_unterminated_label() {
        let mut frame = Envelope::new(3, 0, DetectionPayload::empty()).encode();
        frame[7..].fill(b'z');
        assert_eq!(Envelope::decode(&frame), Err(DecodeError::UnterminatedLabel));
    }
}
