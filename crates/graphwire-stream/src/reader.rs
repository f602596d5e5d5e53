//! Sequential cursor over a fixed byte buffer; the dual of the writer.

use crate::error::{StreamError, StreamResult};

/// Sequential read cursor over an owned byte buffer.
///
/// Each read operation is the exact dual of the matching
/// [`StreamWriter`](crate::StreamWriter) append. Reading past the end of the
/// buffer fails with [`StreamError::OutOfBounds`]; that always indicates a
/// truncated or corrupt stream.
#[derive(Clone, Debug)]
pub struct StreamReader {
    data: Vec<u8>,
    index: usize,
}

impl StreamReader {
    /// Create a reader over the given buffer.
    pub fn new(data: Vec<u8>) -> Self {
        Self { data, index: 0 }
    }

    /// Returns `true` once the cursor has consumed the whole buffer.
    ///
    /// Callers use this to detect physical stream end, distinct from the
    /// format's explicit terminator record.
    pub fn finished(&self) -> bool {
        self.index >= self.data.len()
    }

    /// Current cursor position in bytes.
    pub fn position(&self) -> usize {
        self.index
    }

    /// Read a single byte.
    pub fn read_byte(&mut self) -> StreamResult<u8> {
        let bytes = self.consume(1)?;
        Ok(bytes[0])
    }

    /// Read a 32-bit signed integer.
    pub fn read_i32(&mut self) -> StreamResult<i32> {
        let bytes = self.consume(4)?;
        Ok(i32::from_ne_bytes(bytes.try_into().expect("4 bytes")))
    }

    /// Read a 64-bit signed integer.
    pub fn read_i64(&mut self) -> StreamResult<i64> {
        let bytes = self.consume(8)?;
        Ok(i64::from_ne_bytes(bytes.try_into().expect("8 bytes")))
    }

    /// Read a 64-bit IEEE float.
    pub fn read_f64(&mut self) -> StreamResult<f64> {
        let bytes = self.consume(8)?;
        Ok(f64::from_ne_bytes(bytes.try_into().expect("8 bytes")))
    }

    /// Read a length-prefixed byte string: int32 length, then that many
    /// raw bytes.
    pub fn read_string(&mut self) -> StreamResult<Vec<u8>> {
        let len = self.read_i32()?;
        if len < 0 {
            return Err(StreamError::InvalidLength(len as i64));
        }
        let bytes = self.consume(len as usize)?;
        Ok(bytes.to_vec())
    }

    /// Read an array of 64-bit integers: int64 count, then the raw 8-byte
    /// block.
    pub fn read_i64s(&mut self) -> StreamResult<Vec<i64>> {
        let count = self.read_i64()?;
        if count < 0 {
            return Err(StreamError::InvalidLength(count));
        }
        let mut ints = Vec::with_capacity(count as usize);
        for _ in 0..count {
            ints.push(self.read_i64()?);
        }
        Ok(ints)
    }

    fn consume(&mut self, wanted: usize) -> StreamResult<&[u8]> {
        let end = self.index.checked_add(wanted).ok_or(StreamError::OutOfBounds {
            offset: self.index,
            wanted,
            len: self.data.len(),
        })?;
        if end > self.data.len() {
            return Err(StreamError::OutOfBounds {
                offset: self.index,
                wanted,
                len: self.data.len(),
            });
        }
        let bytes = &self.data[self.index..end];
        self.index = end;
        Ok(bytes)
    }
}
