//! Token reader for `.mesh.ascii` files.
//!
//! Values are whitespace- or newline-delimited tokens. A `#` starts a comment
//! that runs to the end of the line and is skipped before every value. Every
//! integer width is parsed the same way from the leading digits of a token; a
//! token without them, or a value that does not fit the requested width,
//! invalidates the reader.

use super::DataReader;

/// Sequential token reader over the text of an ASCII model file.
pub struct TextReader<'a> {
    text: &'a str,
    pos: usize,
    failed_at: Option<usize>,
}

impl<'a> TextReader<'a> {
    /// Create a reader at the start of `text`.
    pub fn new(text: &'a str) -> Self {
        Self {
            text,
            pos: 0,
            failed_at: None,
        }
    }

    fn rest(&self) -> &'a str {
        &self.text[self.pos..]
    }

    fn fail(&mut self) {
        if self.failed_at.is_none() {
            self.failed_at = Some(self.pos);
        }
    }

    /// Skip to the end of the current line, leaving the newline in place.
    fn skip_to_newline(&mut self) {
        let rest = self.rest();
        self.pos += rest.find(['\n', '\r']).unwrap_or(rest.len());
    }

    /// Skip whitespace, newlines and comments up to the next value.
    fn skip_filler(&mut self) {
        loop {
            let rest = self.rest();
            let trimmed = rest.trim_start();
            self.pos += rest.len() - trimmed.len();
            if trimmed.starts_with('#') {
                self.skip_to_newline();
            } else {
                return;
            }
        }
    }

    /// The next whitespace-delimited token, or `None` (and invalid) at end of input.
    fn next_token(&mut self) -> Option<&'a str> {
        if self.failed_at.is_some() {
            return None;
        }
        self.skip_filler();
        let rest = self.rest();
        let len = rest
            .find(|c: char| c.is_whitespace())
            .unwrap_or(rest.len());
        if len == 0 {
            self.fail();
            return None;
        }
        self.pos += len;
        Some(&rest[..len])
    }

    /// Read the integer at the start of the next token.
    ///
    /// Only the leading sign and digits are consumed, so `1.5` yields 1 and
    /// leaves `.5` as the next token.
    fn read_integer<T: TryFrom<i64> + Default>(&mut self) -> T {
        if self.failed_at.is_some() {
            return T::default();
        }
        self.skip_filler();
        let rest = self.rest();
        let sign = usize::from(rest.starts_with(['-', '+']));
        let digits = rest[sign..]
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(rest.len() - sign);
        if digits == 0 {
            self.fail();
            return T::default();
        }
        let len = sign + digits;
        match rest[..len].parse::<i64>().ok().and_then(|v| T::try_from(v).ok()) {
            Some(value) => {
                self.pos += len;
                value
            }
            None => {
                self.fail();
                T::default()
            }
        }
    }
}

impl DataReader for TextReader<'_> {
    fn read_u32(&mut self) -> u32 {
        self.read_integer()
    }

    fn read_u16(&mut self) -> u16 {
        self.read_integer()
    }

    fn read_u8(&mut self) -> u8 {
        self.read_integer()
    }

    fn read_i16(&mut self) -> i16 {
        self.read_integer()
    }

    fn read_f32(&mut self) -> f32 {
        let start = self.pos;
        let Some(token) = self.next_token() else {
            return 0.0;
        };
        match token.parse::<f32>() {
            Ok(value) => value,
            Err(_) => {
                self.pos = start;
                self.skip_filler();
                self.fail();
                0.0
            }
        }
    }

    fn read_pascal_string(&mut self) -> String {
        if self.failed_at.is_some() {
            return String::new();
        }
        self.skip_filler();
        let rest = self.rest();
        if rest.is_empty() {
            self.fail();
            return String::new();
        }
        let end = rest.find(['\n', '\r']).unwrap_or(rest.len());
        self.pos += end;
        rest[..end].trim_end().to_string()
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

    fn at_line_end(&mut self) -> bool {
        if self.failed_at.is_some() {
            return true;
        }
        let rest = self.rest();
        let trimmed = rest.trim_start_matches([' ', '\t']);
        self.pos += rest.len() - trimmed.len();
        match trimmed.chars().next() {
            None | Some('\n') | Some('\r') => true,
            Some('#') => {
                self.skip_to_newline();
                true
            }
            Some(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokens_and_comments() {
        let text = "# header comment\n  3 # bones\n-1\n1.5 NaN\n";
        let mut r = TextReader::new(text);
        assert_eq!(r.read_u32(), 3);
        assert_eq!(r.read_i16(), -1);
        assert_eq!(r.read_f32(), 1.5);
        assert!(r.read_f32().is_nan());
        assert!(r.is_valid());
    }

    #[test]
    fn test_out_of_range_integer_invalidates() {
        let mut r = TextReader::new("70000 5");
        assert_eq!(r.read_u16(), 0);
        assert!(!r.is_valid());
        assert_eq!(r.failure_offset(), Some(0));
        assert_eq!(r.read_u32(), 0);
    }

    #[test]
    fn test_integer_reads_leading_digits() {
        let mut r = TextReader::new("1.5 +2 7abc\nx");
        assert_eq!(r.read_u32(), 1);
        assert_eq!(r.read_f32(), 0.5);
        assert_eq!(r.read_i16(), 2);
        assert_eq!(r.read_u8(), 7);
        assert!(!r.at_line_end());
        assert_eq!(r.read_pascal_string(), "abc");
        assert_eq!(r.read_u32(), 0);
        assert!(!r.is_valid());
        assert_eq!(r.failure_offset(), Some(12));
    }

    #[test]
    fn test_negative_unsigned_invalidates() {
        let mut r = TextReader::new("-1");
        assert_eq!(r.read_u32(), 0);
        assert!(!r.is_valid());
    }

    #[test]
    fn test_end_of_input_invalidates() {
        let mut r = TextReader::new("1\n# trailing comment\n");
        assert_eq!(r.read_u8(), 1);
        assert_eq!(r.read_u8(), 0);
        assert!(!r.is_valid());
    }

    #[test]
    fn test_pascal_string_is_rest_of_line() {
        let mut r = TextReader::new("2\n  body mesh 01  \r\nnext\n");
        assert_eq!(r.read_u32(), 2);
        assert_eq!(r.read_pascal_string(), "body mesh 01");
        assert_eq!(r.read_pascal_string(), "next");
        assert!(r.is_valid());
    }

    #[test]
    fn test_short_bone_list() {
        let mut r = TextReader::new("4 7 # two bones\n0.25 0.75\n9");
        let mut indices = Vec::new();
        for _ in 0..4 {
            indices.push(r.read_u16());
            if r.at_line_end() {
                break;
            }
        }
        assert_eq!(indices, vec![4, 7]);

        let mut weights = Vec::new();
        for _ in 0..4 {
            weights.push(r.read_f32());
            if r.at_line_end() {
                break;
            }
        }
        assert_eq!(weights, vec![0.25, 0.75]);
        assert_eq!(r.read_u32(), 9);
        assert!(r.at_line_end());
    }
}
