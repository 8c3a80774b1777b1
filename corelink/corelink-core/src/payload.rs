use crate::buffer::{BufferReader, BufferWriter};
use crate::error::{DecodeError, LabelError};
use crate::label::{LABEL_FIELD_SIZE, Label};

/// label_id (4 bytes) followed by the fixed label field
pub const PAYLOAD_WIRE_SIZE: usize = 4 + LABEL_FIELD_SIZE;

/// A point-in-time classification result produced by the sensor core.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DetectionPayload {
    pub label_id: u32,
    pub label: Label,
}

impl DetectionPayload {
    pub const fn empty() -> Self {
        DetectionPayload {
            label_id: 0,
            label: Label::new(),
        }
    }

    pub fn new(label_id: u32, label: Label) -> Self {
        DetectionPayload { label_id, label }
    }

    pub fn with_label(label_id: u32, text: &str) -> Result<Self, LabelError> {
        Ok(DetectionPayload {
            label_id,
            label: Label::try_new(text)?,
        })
    }

    /// Class 0 is the idle/background class; everything above it counts as an event
    pub const fn is_event(&self) -> bool {
        self.label_id > 0
    }

    pub(crate) fn write_bytes<const N: usize>(&self, writer: &mut BufferWriter<N>) {
        writer.write_bytes(&self.label_id.to_le_bytes());
        self.label.write_field(writer);
    }

    pub(crate) fn read_bytes(reader: &mut BufferReader) -> Result<Self, DecodeError> {
        let label_id = reader.read_u32_le().ok_or(DecodeError::Length {
            expected: PAYLOAD_WIRE_SIZE,
            actual: reader.remaining(),
        })?;
        let label = Label::read_field(reader)?;

        Ok(DetectionPayload { label_id, label })
    }
}
