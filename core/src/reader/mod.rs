//! Sequential readers for model files.
//!
//! Both the binary ([`BinaryReader`]) and the text ([`TextReader`]) variant
//! implement [`DataReader`]. Reads never fail individually: the first read
//! that cannot be satisfied marks the reader invalid, records where it
//! happened, and every later read returns a default value without advancing.
//! Parsers check [`DataReader::is_valid`] at section boundaries and turn a
//! failure into a [`ModelError::PrematureEndOfFile`] for that section.

mod binary;
mod text;

pub use binary::BinaryReader;
pub use text::TextReader;

use crate::error::{ModelError, Section};

/// Field-level access to a model file.
pub trait DataReader {
    /// Read an unsigned 32-bit integer.
    fn read_u32(&mut self) -> u32;

    /// Read an unsigned 16-bit integer.
    fn read_u16(&mut self) -> u16;

    /// Read an unsigned 8-bit integer.
    fn read_u8(&mut self) -> u8;

    /// Read a signed 16-bit integer.
    fn read_i16(&mut self) -> i16;

    /// Read a 32-bit float.
    fn read_f32(&mut self) -> f32;

    /// Read a length-prefixed string (binary) or the rest of a line (text).
    fn read_pascal_string(&mut self) -> String;

    /// `false` once any read has failed. Never becomes `true` again.
    fn is_valid(&self) -> bool;

    /// Byte offset of the first failed read, if any.
    fn failure_offset(&self) -> Option<usize>;

    /// Current byte offset into the source.
    fn position(&self) -> usize;

    /// Bytes left to read, for readers that know it up front.
    ///
    /// Used to reject absurd counts before allocating for them.
    fn remaining(&self) -> Option<usize> {
        None
    }

    /// Whether nothing but whitespace or a comment is left on the current line.
    ///
    /// Only meaningful for line-oriented sources; binary readers return `false`.
    fn at_line_end(&mut self) -> bool {
        false
    }

    /// Fail with `PrematureEndOfFile` for `section` if the reader is invalid.
    fn checkpoint(&self, section: Section) -> Result<(), ModelError> {
        if self.is_valid() {
            Ok(())
        } else {
            Err(ModelError::PrematureEndOfFile {
                section,
                offset: self.failure_offset().unwrap_or_else(|| self.position()),
            })
        }
    }

    /// Fail with `PrematureEndOfFile` if `count` items of at least
    /// `min_item_size` bytes cannot possibly fit in the remaining input.
    fn ensure_fits(
        &self,
        count: usize,
        min_item_size: usize,
        section: Section,
    ) -> Result<(), ModelError> {
        let Some(remaining) = self.remaining() else {
            return Ok(());
        };
        match count.checked_mul(min_item_size) {
            Some(needed) if needed <= remaining => Ok(()),
            _ => Err(ModelError::PrematureEndOfFile {
                section,
                offset: self.position(),
            }),
        }
    }
}
