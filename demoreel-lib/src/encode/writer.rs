//! Little-endian byte writer for container headers.

use std::io::{Cursor, Write};

/// Growable little-endian writer backed by an in-memory cursor.
#[derive(Debug, Default)]
pub struct ByteWriter {
    cursor: Cursor<Vec<u8>>,
}

impl ByteWriter {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            cursor: Cursor::new(Vec::with_capacity(capacity)),
        }
    }

    /// Write a four-character chunk tag such as `b"RIFF"`.
    pub fn write_tag(&mut self, tag: &[u8; 4]) {
        self.put(tag);
    }

    pub fn write_u16_le(&mut self, value: u16) {
        self.put(&value.to_le_bytes());
    }

    pub fn write_u32_le(&mut self, value: u32) {
        self.put(&value.to_le_bytes());
    }

    pub fn write_i16_le(&mut self, value: i16) {
        self.put(&value.to_le_bytes());
    }

    /// Bytes written so far.
    pub fn position(&self) -> u64 {
        self.cursor.position()
    }

    pub fn into_inner(self) -> Vec<u8> {
        self.cursor.into_inner()
    }

    fn put(&mut self, bytes: &[u8]) {
        // Writing into a Vec-backed cursor cannot fail short of allocation failure.
        let _ = self.cursor.write_all(bytes);
    }
}
