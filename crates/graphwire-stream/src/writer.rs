//! Append-only writer producing the format's length-prefixed primitives.

/// Append-only buffer of wire primitives.
///
/// All multi-byte values are written in native byte order. The stream is
/// therefore not portable across machines of different endianness; producer
/// and consumer are assumed to run on the same architecture.
///
/// Writes are infallible: the only failure mode is allocation failure, which
/// aborts the process.
#[derive(Clone, Debug, Default)]
pub struct StreamWriter {
    buf: Vec<u8>,
    bytecount: u64,
}

impl StreamWriter {
    /// Create an empty writer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a single byte.
    pub fn write_byte(&mut self, b: u8) {
        self.buf.push(b);
        self.bytecount += 1;
    }

    /// Append a 32-bit signed integer.
    pub fn write_i32(&mut self, i: i32) {
        self.write_raw(&i.to_ne_bytes());
    }

    /// Append a 64-bit signed integer.
    pub fn write_i64(&mut self, i: i64) {
        self.write_raw(&i.to_ne_bytes());
    }

    /// Append a 64-bit IEEE float.
    pub fn write_f64(&mut self, f: f64) {
        self.write_raw(&f.to_ne_bytes());
    }

    /// Append a length-prefixed byte string: int32 length, then the raw
    /// bytes with no encoding or escaping.
    pub fn write_string(&mut self, s: &[u8]) {
        self.write_i32(s.len() as i32);
        self.write_raw(s);
    }

    /// Append an array of 64-bit integers: int64 count, then the raw
    /// 8-byte block.
    pub fn write_i64s(&mut self, ints: &[i64]) {
        self.write_i64(ints.len() as i64);
        for i in ints {
            self.write_raw(&i.to_ne_bytes());
        }
    }

    /// Append an array of length-prefixed strings: int32 count, then each
    /// string.
    pub fn write_strings<S: AsRef<[u8]>>(&mut self, strings: &[S]) {
        self.write_i32(strings.len() as i32);
        for s in strings {
            self.write_string(s.as_ref());
        }
    }

    /// Total bytes written since creation or the last [`clear`].
    ///
    /// [`clear`]: StreamWriter::clear
    pub fn bytecount(&self) -> u64 {
        self.bytecount
    }

    /// The accumulated buffer.
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Hand off the accumulated buffer, leaving the writer empty.
    pub fn take(&mut self) -> Vec<u8> {
        self.bytecount = 0;
        std::mem::take(&mut self.buf)
    }

    /// Truncate the buffer back to empty and reset the byte count.
    pub fn clear(&mut self) {
        self.buf.clear();
        self.bytecount = 0;
    }

    fn write_raw(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
        self.bytecount += bytes.len() as u64;
    }
}
