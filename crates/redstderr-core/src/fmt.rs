//! Allocation-free formatting for diagnostics emitted from inside `write`.

/// `fmt::Write` sink over a caller-provided byte buffer.
///
/// Output past the end of the buffer is dropped and [`truncated`] is set;
/// writing never fails, so `write!` results can be ignored.
///
/// [`truncated`]: StackWriter::truncated
pub struct StackWriter<'a> {
    buf: &'a mut [u8],
    pos: usize,
    truncated: bool,
}

impl<'a> StackWriter<'a> {
    pub fn new(buf: &'a mut [u8]) -> Self {
        Self {
            buf,
            pos: 0,
            truncated: false,
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.buf[..self.pos]
    }

    /// Written text, cut back to the last whole UTF-8 character.
    pub fn as_str(&self) -> &str {
        match std::str::from_utf8(self.as_bytes()) {
            Ok(s) => s,
            Err(e) => {
                // Truncation may split a multi-byte character.
                let valid = e.valid_up_to();
                std::str::from_utf8(&self.buf[..valid]).unwrap_or("")
            }
        }
    }

    pub fn len(&self) -> usize {
        self.pos
    }

    pub fn is_empty(&self) -> bool {
        self.pos == 0
    }

    pub fn truncated(&self) -> bool {
        self.truncated
    }
}

impl std::fmt::Write for StackWriter<'_> {
    fn write_str(&mut self, s: &str) -> std::fmt::Result {
        let bytes = s.as_bytes();
        let remaining = self.buf.len() - self.pos;
        let to_copy = std::cmp::min(bytes.len(), remaining);
        if to_copy < bytes.len() {
            self.truncated = true;
        }
        self.buf[self.pos..self.pos + to_copy].copy_from_slice(&bytes[..to_copy]);
        self.pos += to_copy;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fmt::Write;

    #[test]
    fn test_formats_into_buffer() {
        let mut buf = [0u8; 64];
        let mut w = StackWriter::new(&mut buf);
        write!(w, "[{}] {}", 42, "ok").unwrap();
        assert_eq!(w.as_str(), "[42] ok");
        assert_eq!(w.len(), 7);
        assert!(!w.truncated());
    }

    #[test]
    fn test_overflow_is_truncated_not_error() {
        let mut buf = [0u8; 4];
        let mut w = StackWriter::new(&mut buf);
        assert!(write!(w, "abcdefgh").is_ok());
        assert_eq!(w.as_bytes(), b"abcd");
        assert!(w.truncated());
    }

    #[test]
    fn test_split_multibyte_char_is_dropped_from_str() {
        let mut buf = [0u8; 2];
        let mut w = StackWriter::new(&mut buf);
        let _ = write!(w, "aé");
        assert_eq!(w.as_bytes().len(), 2);
        assert_eq!(w.as_str(), "a");
    }
}
