//! A minimal DER cursor.
//!
//! This is not a general BER/CER/DER framework — it reads exactly the
//! shapes `PKIMessage` and its descendants use (definite-length tag/length/
//! value, no indefinite lengths, no non-canonical length forms) and keeps
//! track of byte offsets so callers can recover the exact span they read
//! (needed for the raw protected part used in signature verification, and
//! for deferring MAC-parameter parsing to an offset).

use cmp_types::CmpError;

use crate::tag;

/// A read-only cursor over a DER-encoded buffer.
#[derive(Clone, Copy)]
pub struct Reader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    /// Absolute byte offset of the cursor within the original buffer the
    /// root reader was constructed from. Only meaningful for readers
    /// obtained via [`Reader::new`] directly on the wire buffer, not for
    /// child readers produced by `read_sequence`/`read_constructed`, which
    /// are scoped to their own content slice.
    pub fn pos(&self) -> usize {
        self.pos
    }

    pub fn is_empty(&self) -> bool {
        self.pos >= self.buf.len()
    }

    pub fn remaining(&self) -> &'a [u8] {
        &self.buf[self.pos..]
    }

    fn byte(&mut self) -> Result<u8, CmpError> {
        let b = *self
            .buf
            .get(self.pos)
            .ok_or_else(|| CmpError::bad_data("unexpected end of DER buffer"))?;
        self.pos += 1;
        Ok(b)
    }

    /// Look at the next tag byte without consuming it. Used for CHOICE
    /// dispatch and OPTIONAL-field detection.
    pub fn peek_tag(&self) -> Result<u8, CmpError> {
        self.buf
            .get(self.pos)
            .copied()
            .ok_or_else(|| CmpError::bad_data("unexpected end of DER buffer"))
    }

    pub fn peek_tag_opt(&self) -> Option<u8> {
        self.buf.get(self.pos).copied()
    }

    fn read_length(&mut self) -> Result<usize, CmpError> {
        let first = self.byte()?;
        if first & 0x80 == 0 {
            return Ok(first as usize);
        }
        let num_bytes = (first & 0x7F) as usize;
        if num_bytes == 0 {
            // Indefinite length (BER only) — not valid DER.
            return Err(CmpError::bad_data("indefinite-length DER is not supported"));
        }
        if num_bytes > 4 {
            return Err(CmpError::bad_data("DER length field too wide"));
        }
        let mut len: u64 = 0;
        for _ in 0..num_bytes {
            len = (len << 8) | self.byte()? as u64;
        }
        let len: usize =
            len.try_into().map_err(|_| CmpError::bad_data("DER length exceeds platform bounds"))?;
        if len > self.buf.len().saturating_sub(self.pos) {
            return Err(CmpError::bad_data("DER length exceeds remaining buffer"));
        }
        Ok(len)
    }

    /// Read a tag byte and length, returning the tag and the content slice.
    /// Advances the cursor past the content.
    pub fn read_tlv(&mut self) -> Result<(u8, &'a [u8]), CmpError> {
        let tag = self.byte()?;
        let len = self.read_length()?;
        let start = self.pos;
        let end = start
            .checked_add(len)
            .ok_or_else(|| CmpError::bad_data("DER length overflow"))?;
        if end > self.buf.len() {
            return Err(CmpError::bad_data("DER content runs past end of buffer"));
        }
        self.pos = end;
        Ok((tag, &self.buf[start..end]))
    }

    /// Read a full tag-length-value TLV and return its raw encoded bytes
    /// (tag byte, length bytes, and content), for callers that need the
    /// exact wire bytes rather than just the content (OID codec input,
    /// skipping unrecognised `generalInfo` entries, capturing raw spans).
    pub fn read_raw_tlv(&mut self) -> Result<&'a [u8], CmpError> {
        let start = self.pos;
        self.read_tlv()?;
        Ok(&self.buf[start..self.pos])
    }

    /// Read a TLV and assert its tag, returning the content slice.
    pub fn expect_tag(&mut self, expected: u8) -> Result<&'a [u8], CmpError> {
        let (tag, content) = self.read_tlv()?;
        if tag != expected {
            return Err(CmpError::bad_data(format!(
                "expected DER tag 0x{expected:02X}, found 0x{tag:02X}"
            )));
        }
        Ok(content)
    }

    /// Read a `SEQUENCE` and return a reader scoped to its content.
    pub fn read_sequence(&mut self) -> Result<Reader<'a>, CmpError> {
        let content = self.expect_tag(tag::SEQUENCE)?;
        Ok(Reader::new(content))
    }

    /// Read a constructed value under an arbitrary tag (explicit context
    /// tagging, `SET`, etc.) and return a reader scoped to its content.
    pub fn read_constructed(&mut self, expected_tag: u8) -> Result<Reader<'a>, CmpError> {
        let content = self.expect_tag(expected_tag)?;
        Ok(Reader::new(content))
    }

    /// Read an `INTEGER`, requiring it to fit in an `i64`.
    ///
    /// Rejects content with more than 8 significant bytes the same way the
    /// OID arc decoder rejects overflowing arcs: a peer claiming an
    /// absurd integer is malformed input, not something to silently
    /// truncate.
    pub fn read_integer(&mut self) -> Result<i64, CmpError> {
        let content = self.expect_tag(tag::INTEGER)?;
        Self::decode_integer(content)
    }

    fn decode_integer(content: &[u8]) -> Result<i64, CmpError> {
        if content.is_empty() {
            return Err(CmpError::bad_data("empty INTEGER content"));
        }
        if content.len() > 8 {
            return Err(CmpError::bad_data("INTEGER too large to represent"));
        }
        let negative = content[0] & 0x80 != 0;
        let mut value: i64 = if negative { -1 } else { 0 };
        for &b in content {
            value = (value << 8) | b as i64;
        }
        Ok(value)
    }

    /// Read an `OCTET STRING`.
    pub fn read_octet_string(&mut self) -> Result<&'a [u8], CmpError> {
        self.expect_tag(tag::OCTET_STRING)
    }

    /// Read a `BIT STRING`, returning (unused bit count, content bytes).
    pub fn read_bit_string(&mut self) -> Result<(u8, &'a [u8]), CmpError> {
        let content = self.expect_tag(tag::BIT_STRING)?;
        let (unused, bytes) =
            content.split_first().ok_or_else(|| CmpError::bad_data("empty BIT STRING"))?;
        if *unused > 7 {
            return Err(CmpError::bad_data("invalid unused-bit count in BIT STRING"));
        }
        Ok((*unused, bytes))
    }

    /// Read a `UTF8String`.
    pub fn read_utf8_string(&mut self) -> Result<&'a str, CmpError> {
        let content = self.expect_tag(tag::UTF8_STRING)?;
        std::str::from_utf8(content).map_err(|_| CmpError::bad_data("invalid UTF-8 in UTF8String"))
    }

    /// Skip over one TLV without interpreting it — used for unrecognised
    /// `generalInfo` entries, which are skipped silently.
    pub fn skip_value(&mut self) -> Result<(), CmpError> {
        self.read_tlv().map(|_| ())
    }
}
