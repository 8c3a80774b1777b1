/// Fixed-size frame writer. The backing array starts zeroed, so any bytes not written stay zero
/// (this is what pads the label field on the wire).
pub struct BufferWriter<const N: usize> {
    buffer: [u8; N],
    position: usize,
}

impl<const N: usize> BufferWriter<N> {
    pub const fn new() -> Self {
        BufferWriter {
            buffer: [0; N],
            position: 0,
        }
    }

    pub fn write_byte(&mut self, byte: u8) {
        self.buffer[self.position] = byte;
        self.position += 1;
    }

    /// Writes a slice of bytes into the buffer. Assumes there is enough space
    pub fn write_bytes(&mut self, data: &[u8]) {
        let len = data.len();
        self.buffer[self.position..self.position + len].copy_from_slice(data);
        self.position += len;
    }

    /// Skips `count` bytes, leaving them zeroed
    pub fn skip(&mut self, count: usize) {
        self.position += count;
    }

    /// Consumes the writer and returns the whole frame, including unwritten (zero) bytes
    pub fn into_inner(self) -> [u8; N] {
        self.buffer
    }
}

/// Simple buffer reader for reading bytes from a slice
pub struct BufferReader<'a> {
    buffer: &'a [u8],
    position: usize,
}

impl<'a> BufferReader<'a> {
    pub fn new(buffer: &'a [u8]) -> Self {
        BufferReader {
            buffer,
            position: 0,
        }
    }

    /// Reads a single byte from the buffer. Returns None if end of buffer is reached.
    pub fn read_byte(&mut self) -> Option<u8> {
        let byte = *self.buffer.get(self.position)?;
        self.position += 1;
        Some(byte)
    }

    /// Reads a slice of bytes of the given length from the buffer. Returns None if not enough data is available.
    pub fn read_bytes(&mut self, length: usize) -> Option<&'a [u8]> {
        if self.position + length > self.buffer.len() {
            return None;
        }

        let bytes = &self.buffer[self.position..self.position + length];
        self.position += length;
        Some(bytes)
    }

    pub fn read_u16_le(&mut self) -> Option<u16> {
        let bytes = self.read_bytes(2)?;
        Some(u16::from_le_bytes([bytes[0], bytes[1]]))
    }

    pub fn read_u32_le(&mut self) -> Option<u32> {
        let bytes = self.read_bytes(4)?;
        Some(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    pub fn remaining(&self) -> usize {
        self.buffer.len() - self.position
    }
}
