//! DER `OBJECT IDENTIFIER` codec: dotted-decimal text in both directions.
//!
//! Every other component names algorithms and extensions by OID text
//! (`"1.2.840.113549.1.1.1"`) rather than by raw DER bytes, so this is the
//! one place that walks the X.690 arc encoding.

use cmp_asn1::{tag, Reader};
use cmp_types::constants::{
    MAX_ARC_VALUE, MAX_OID_SIZE, MAX_OID_TEXT_LEN, MIN_OID_SIZE, MIN_OID_TEXT_LEN,
};
use cmp_types::CmpError;

/// Decode a DER `OBJECT IDENTIFIER` TLV (tag, length, and content together)
/// into its dotted-decimal text form.
///
/// `der` must be exactly one TLV: no leading junk, no trailing bytes. This
/// also enforces that the declared content length matches the buffer size,
/// since a `Reader` left non-empty after the single TLV means there was
/// something else in the buffer.
pub fn oid_to_text(der: &[u8]) -> Result<String, CmpError> {
    if der.len() < MIN_OID_SIZE || der.len() > MAX_OID_SIZE {
        return Err(CmpError::bad_data(format!(
            "OBJECT IDENTIFIER DER is {} bytes, outside [{}, {}]",
            der.len(),
            MIN_OID_SIZE,
            MAX_OID_SIZE
        )));
    }
    let mut r = Reader::new(der);
    let content = r.expect_tag(tag::OBJECT_IDENTIFIER)?;
    if !r.is_empty() {
        return Err(CmpError::bad_data("trailing bytes after OBJECT IDENTIFIER"));
    }
    decode_content(content)
}

fn decode_content(content: &[u8]) -> Result<String, CmpError> {
    let (&first, rest) = content
        .split_first()
        .ok_or_else(|| CmpError::bad_data("empty OBJECT IDENTIFIER content"))?;

    let arc1 = if first < 80 { (first / 40) as u64 } else { 2 };
    let arc2 = first as u64 - arc1 * 40;
    let mut arcs = vec![arc1, arc2];

    let mut value: u64 = 0;
    let mut in_progress = false;
    for &b in rest {
        in_progress = true;
        value = (value << 7) | (b & 0x7F) as u64;
        if value > MAX_ARC_VALUE {
            return Err(CmpError::bad_data("OBJECT IDENTIFIER arc exceeds bound"));
        }
        if b & 0x80 == 0 {
            arcs.push(value);
            value = 0;
            in_progress = false;
        }
    }
    if in_progress {
        return Err(CmpError::bad_data("truncated OBJECT IDENTIFIER arc"));
    }

    Ok(arcs.iter().map(u64::to_string).collect::<Vec<_>>().join(" "))
}

/// Encode dotted- or space-separated OID text into a DER `OBJECT IDENTIFIER`
/// TLV. Mixed separators (`"1.2 840.113549"`) are tolerated, matching
/// IETF-style liberal parsing of the few inputs that carry OIDs as text
/// (e.g. configuration files naming an algorithm).
pub fn text_to_oid(text: &str) -> Result<Vec<u8>, CmpError> {
    if text.len() < MIN_OID_TEXT_LEN || text.len() > MAX_OID_TEXT_LEN {
        return Err(CmpError::bad_data(format!(
            "OID text is {} bytes, outside [{}, {}]",
            text.len(),
            MIN_OID_TEXT_LEN,
            MAX_OID_TEXT_LEN
        )));
    }

    let normalized = text.replace('.', " ");
    let arcs: Vec<u64> = normalized
        .split_whitespace()
        .map(|tok| tok.parse::<u64>().map_err(|_| CmpError::bad_data(format!("non-numeric OID arc {tok:?}"))))
        .collect::<Result<_, _>>()?;

    if arcs.len() < 2 {
        return Err(CmpError::bad_data("OID text needs at least two arcs"));
    }
    let arc1 = arcs[0];
    let arc2 = arcs[1];
    if arc1 > 2 {
        return Err(CmpError::bad_data("OID first arc must be 0, 1, or 2"));
    }
    if arc2 == 0 {
        return Err(CmpError::bad_data("OID second arc must be at least 1"));
    }
    let max_arc2 = if arc1 < 2 { 39 } else { 175 };
    if arc2 > max_arc2 {
        return Err(CmpError::bad_data(format!(
            "OID second arc {arc2} exceeds {max_arc2} for first arc {arc1}"
        )));
    }

    let mut content = Vec::new();
    content.push((arc1 * 40 + arc2) as u8);
    for &arc in &arcs[2..] {
        if arc > MAX_ARC_VALUE {
            return Err(CmpError::bad_data("OID arc exceeds encodable bound"));
        }
        encode_arc(arc, &mut content);
    }

    let mut out = Vec::with_capacity(content.len() + 2);
    cmp_asn1::writer::write_tlv(tag::OBJECT_IDENTIFIER, &content, &mut out);
    Ok(out)
}

fn encode_arc(value: u64, out: &mut Vec<u8>) {
    let mut groups = vec![(value & 0x7F) as u8];
    let mut rest = value >> 7;
    while rest > 0 {
        groups.push((rest & 0x7F) as u8);
        rest >>= 7;
    }
    groups.reverse();
    let last = groups.len() - 1;
    for (i, g) in groups.iter().enumerate() {
        out.push(if i == last { *g } else { g | 0x80 });
    }
}
