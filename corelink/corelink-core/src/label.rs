use crate::buffer::{BufferReader, BufferWriter};
use crate::error::{DecodeError, LabelError};

/// Size of the label field on the wire, including the terminating NUL
pub const LABEL_FIELD_SIZE: usize = 256;
/// Longest label text that still leaves room for the terminator
pub const LABEL_CAPACITY: usize = LABEL_FIELD_SIZE - 1;

/// Bounded label text of a detection. Carries its own length; on the wire it is written into a
/// fixed 256 byte field, NUL-terminated and zero padded.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Label(heapless::String<LABEL_CAPACITY>);

impl Label {
    pub const fn new() -> Self {
        Label(heapless::String::new())
    }

    /// Creates a label, rejecting text that does not fit or would be cut short by a NUL on the wire.
    pub fn try_new(text: &str) -> Result<Self, LabelError> {
        let mut label = Label::new();
        label.set(text)?;
        Ok(label)
    }

    /// Creates a label, keeping the longest prefix that fits. The cut happens at the first NUL or
    /// at the last char boundary within the capacity, whichever comes first.
    pub fn truncated(text: &str) -> Self {
        let text = match text.find('\0') {
            Some(nul) => &text[..nul],
            None => text,
        };

        let mut end = text.len().min(LABEL_CAPACITY);
        while !text.is_char_boundary(end) {
            end -= 1;
        }

        let mut label = Label::new();
        // fits by construction
        let _ = label.0.push_str(&text[..end]);
        label
    }

    /// Replaces the text in place. On error the previous text is kept.
    pub fn set(&mut self, text: &str) -> Result<(), LabelError> {
        if text.len() > LABEL_CAPACITY {
            return Err(LabelError::TooLong {
                len: text.len(),
                capacity: LABEL_CAPACITY,
            });
        }
        if text.contains('\0') {
            return Err(LabelError::InteriorNul);
        }

        self.0.clear();
        let _ = self.0.push_str(text);
        Ok(())
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Writes the fixed-size field: text, NUL, zero padding
    pub(crate) fn write_field<const N: usize>(&self, writer: &mut BufferWriter<N>) {
        writer.write_bytes(self.0.as_bytes());
        writer.skip(LABEL_FIELD_SIZE - self.0.len());
    }

    pub(crate) fn read_field(reader: &mut BufferReader) -> Result<Self, DecodeError> {
        let field = reader
            .read_bytes(LABEL_FIELD_SIZE)
            .ok_or(DecodeError::Length {
                expected: LABEL_FIELD_SIZE,
                actual: reader.remaining(),
            })?;

        let nul = field
            .iter()
            .position(|&b| b == 0)
            .ok_or(DecodeError::UnterminatedLabel)?;
        let text = core::str::from_utf8(&field[..nul]).map_err(|_| DecodeError::InvalidLabel)?;

        let mut label = Label::new();
        // nul <= LABEL_CAPACITY because the field holds LABEL_FIELD_SIZE bytes
        let _ = label.0.push_str(text);
        Ok(label)
    }
}

impl core::fmt::Display for Label {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for Label {
    type Error = LabelError;

    fn try_from(text: &str) -> Result<Self, Self::Error> {
        Label::try_new(text)
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for Label {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "{=str}", self.as_str())
    }
}
