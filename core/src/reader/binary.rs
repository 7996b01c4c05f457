//! Little-endian reader over an in-memory byte slice.

use super::DataReader;

/// Bounded cursor over the bytes of a binary model file.
pub struct BinaryReader<'a> {
    bytes: &'a [u8],
    pos: usize,
    failed_at: Option<usize>,
}

impl<'a> BinaryReader<'a> {
    /// Create a reader at offset 0.
    pub fn new(bytes: &'a [u8]) -> Self {
        Self {
            bytes,
            pos: 0,
            failed_at: None,
        }
    }

    /// Take the next `n` bytes, or mark the reader invalid.
    fn take(&mut self, n: usize) -> Option<&'a [u8]> {
        if self.failed_at.is_some() {
            return None;
        }
        let end = match self.pos.checked_add(n) {
            Some(end) if end <= self.bytes.len() => end,
            _ => {
                self.failed_at = Some(self.pos);
                return None;
            }
        };
        let out = &self.bytes[self.pos..end];
        self.pos = end;
        Some(out)
    }

    fn take_array<const N: usize>(&mut self) -> [u8; N] {
        let mut out = [0u8; N];
        if let Some(raw) = self.take(N) {
            out.copy_from_slice(raw);
        }
        out
    }

    /// Advance `n` bytes without reading them.
    pub fn skip(&mut self, n: usize) {
        let _ = self.take(n);
    }

    /// Base-128 varint, low groups first, top bit set on all but the last byte.
    fn read_varint(&mut self) -> usize {
        let mut value = 0usize;
        let mut shift = 0u32;
        loop {
            let byte = self.read_u8();
            if !self.is_valid() {
                return 0;
            }
            if shift < usize::BITS {
                value |= ((byte & 0x7f) as usize) << shift;
            }
            if byte & 0x80 == 0 {
                return value;
            }
            shift += 7;
        }
    }
}

impl DataReader for BinaryReader<'_> {
    fn read_u32(&mut self) -> u32 {
        u32::from_le_bytes(self.take_array())
    }

    fn read_u16(&mut self) -> u16 {
        u16::from_le_bytes(self.take_array())
    }

    fn read_u8(&mut self) -> u8 {
        self.take_array::<1>()[0]
    }

    fn read_i16(&mut self) -> i16 {
        i16::from_le_bytes(self.take_array())
    }

    fn read_f32(&mut self) -> f32 {
        f32::from_le_bytes(self.take_array())
    }

    fn read_pascal_string(&mut self) -> String {
        let len = self.read_varint();
        if len == 0 {
            return String::new();
        }
        match self.take(len) {
            Some(raw) => String::from_utf8_lossy(raw).into_owned(),
            None => String::new(),
        }
    }

    fn is_valid(&self) -> bool {
        self.failed_at.is_none()
    }

    fn failure_offset(&self) -> Option<usize> {
        self.failed_at
    }

    fn position(&self) -> usize {
        self.pos
    }

    fn remaining(&self) -> Option<usize> {
        Some(self.bytes.len().saturating_sub(self.pos))
    }
}
