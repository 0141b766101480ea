//! DER encoding helpers matching [`crate::reader::Reader`]'s shapes.

use crate::tag;

/// Encode a DER definite-length header for `len` bytes of content.
fn encode_length(len: usize, out: &mut Vec<u8>) {
    if len < 0x80 {
        out.push(len as u8);
        return;
    }
    let be = len.to_be_bytes();
    let first_significant = be.iter().position(|&b| b != 0).unwrap_or(be.len() - 1);
    let significant = &be[first_significant..];
    out.push(0x80 | significant.len() as u8);
    out.extend_from_slice(significant);
}

/// Write a single TLV: tag byte, DER length, then `content` verbatim.
pub fn write_tlv(tag: u8, content: &[u8], out: &mut Vec<u8>) {
    out.push(tag);
    encode_length(content.len(), out);
    out.extend_from_slice(content);
}

/// Build a `SEQUENCE` (or any constructed tag) whose content is produced by
/// `build`, wrapping the result with the appropriate tag/length header.
pub fn write_constructed(tag: u8, out: &mut Vec<u8>, build: impl FnOnce(&mut Vec<u8>)) {
    let mut content = Vec::new();
    build(&mut content);
    write_tlv(tag, &content, out);
}

pub fn write_sequence(out: &mut Vec<u8>, build: impl FnOnce(&mut Vec<u8>)) {
    write_constructed(tag::SEQUENCE, out, build);
}

/// Write an `INTEGER`, using the minimal two's-complement encoding DER
/// requires (no unnecessary leading 0x00/0xFF bytes beyond the one needed
/// to disambiguate sign).
pub fn write_integer(value: i64, out: &mut Vec<u8>) {
    let be = value.to_be_bytes();
    let mut start = 0;
    while start < be.len() - 1 {
        let this = be[start];
        let next = be[start + 1];
        let redundant_positive = this == 0x00 && next & 0x80 == 0;
        let redundant_negative = this == 0xFF && next & 0x80 != 0;
        if redundant_positive || redundant_negative {
            start += 1;
        } else {
            break;
        }
    }
    write_tlv(tag::INTEGER, &be[start..], out);
}

pub fn write_octet_string(bytes: &[u8], out: &mut Vec<u8>) {
    write_tlv(tag::OCTET_STRING, bytes, out);
}

pub fn write_bit_string(unused_bits: u8, bytes: &[u8], out: &mut Vec<u8>) {
    let mut content = Vec::with_capacity(bytes.len() + 1);
    content.push(unused_bits);
    content.extend_from_slice(bytes);
    write_tlv(tag::BIT_STRING, &content, out);
}

pub fn write_utf8_string(s: &str, out: &mut Vec<u8>) {
    write_tlv(tag::UTF8_STRING, s.as_bytes(), out);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reader::Reader;

    #[test]
    fn round_trips_octet_string() {
        let mut out = Vec::new();
        write_octet_string(&[1, 2, 3, 4], &mut out);
        let mut r = Reader::new(&out);
        assert_eq!(r.read_octet_string().unwrap(), &[1, 2, 3, 4]);
    }

    #[test]
    fn round_trips_negative_integer() {
        let mut out = Vec::new();
        write_integer(-1, &mut out);
        assert_eq!(out, vec![0x02, 0x01, 0xFF]);
        let mut r = Reader::new(&out);
        assert_eq!(r.read_integer().unwrap(), -1);
    }

    #[test]
    fn round_trips_positive_integer_needing_no_padding() {
        let mut out = Vec::new();
        write_integer(127, &mut out);
        assert_eq!(out, vec![0x02, 0x01, 0x7F]);
    }

    #[test]
    fn long_form_length_for_large_content() {
        let mut out = Vec::new();
        let content = vec![0xAAu8; 200];
        write_octet_string(&content, &mut out);
        assert_eq!(&out[..3], &[0x04, 0x81, 0xC8]);
    }

    #[test]
    fn sequence_round_trip() {
        let mut out = Vec::new();
        write_sequence(&mut out, |inner| {
            write_integer(2, inner);
            write_octet_string(b"abc", inner);
        });
        let mut r = Reader::new(&out);
        let mut seq = r.read_sequence().unwrap();
        assert_eq!(seq.read_integer().unwrap(), 2);
        assert_eq!(seq.read_octet_string().unwrap(), b"abc");
    }
}
