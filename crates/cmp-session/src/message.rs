//! The outer `PKIMessage ::= SEQUENCE { header, body, protection [0]
//! OPTIONAL, extraCerts [1] OPTIONAL }` envelope, plus capture of the exact
//! `header || body` byte span integrity is computed over.
//!
//! `protection` and `extraCerts` are a CHOICE's context tags (`body` is a
//! CHOICE), and RFC 4210's ASN.1 module is declared under `EXPLICIT TAGS`,
//! so both are explicit: a `[0]`/`[1]` TLV wrapping the real BIT STRING /
//! SEQUENCE OF Certificate TLV, not an implicitly retagged one.

use cmp_asn1::{tag, writer, Reader};
use cmp_body::{body, PkiBody};
use cmp_header::{HeaderWriteParams, PkiHeader};
use cmp_types::CmpError;

/// A fully decoded incoming message, with the exact bytes protection was
/// computed over (`header || body`, as they appeared on the wire) kept
/// alongside the parsed header and body.
pub struct DecodedMessage<'a> {
    pub header: PkiHeader<'a>,
    pub body: PkiBody,
    /// The raw `header || body` bytes, exactly as they appeared on the
    /// wire — owned, because the two TLVs are read out of the same buffer
    /// as two non-contiguous-typed slices and need to be joined.
    pub protected: Vec<u8>,
    pub protection: Option<Vec<u8>>,
    pub extra_certs: Vec<Vec<u8>>,
}

/// Encode a header and a body back to back into one buffer. Because
/// `PkiHeader::decode` and `body::decode` each consume exactly one
/// top-level TLV, this buffer is exactly the span integrity protects:
/// [`decode_message`] recovers the same bytes by reading the header and
/// body TLVs raw and concatenating them, before parsing either.
pub fn compose_protected(params: &HeaderWriteParams, body: &PkiBody) -> Result<Vec<u8>, CmpError> {
    let mut out = Vec::new();
    cmp_header::encode(params, &mut out)?;
    body::encode(body, &mut out);
    Ok(out)
}

/// Wrap an already-composed protected span plus its protection tag and any
/// `extraCerts` into the outer `PKIMessage` SEQUENCE.
pub fn encode_message(
    protected: &[u8],
    protection: Option<&[u8]>,
    extra_certs: &[Vec<u8>],
    out: &mut Vec<u8>,
) {
    writer::write_sequence(out, |seq| {
        seq.extend_from_slice(protected);
        if let Some(bits) = protection {
            writer::write_constructed(tag::context_constructed(0), seq, |inner| {
                writer::write_bit_string(0, bits, inner);
            });
        }
        if !extra_certs.is_empty() {
            writer::write_constructed(tag::context_constructed(1), seq, |inner| {
                writer::write_sequence(inner, |set| {
                    for cert in extra_certs {
                        set.extend_from_slice(cert);
                    }
                });
            });
        }
    });
}

pub fn decode_message(wire: &[u8]) -> Result<DecodedMessage<'_>, CmpError> {
    let mut outer = Reader::new(wire);
    let mut msg = outer.read_sequence()?;

    let header_tlv = msg.read_raw_tlv()?;
    let body_tlv = msg.read_raw_tlv()?;
    let mut protected = Vec::with_capacity(header_tlv.len() + body_tlv.len());
    protected.extend_from_slice(header_tlv);
    protected.extend_from_slice(body_tlv);

    let header = PkiHeader::decode(&mut Reader::new(header_tlv))?;
    let body = body::decode(&mut Reader::new(body_tlv))?;

    let protection = match msg.peek_tag_opt() {
        Some(t) if t == tag::context_constructed(0) => {
            let mut inner = msg.read_constructed(tag::context_constructed(0))?;
            let (_, bytes) = inner.read_bit_string()?;
            Some(bytes.to_vec())
        }
        _ => None,
    };

    let extra_certs = match msg.peek_tag_opt() {
        Some(t) if t == tag::context_constructed(1) => {
            let mut inner = msg.read_constructed(tag::context_constructed(1))?;
            let mut list = inner.read_sequence()?;
            let mut certs = Vec::new();
            while !list.is_empty() {
                certs.push(list.read_raw_tlv()?.to_vec());
            }
            certs
        }
        _ => Vec::new(),
    };

    Ok(DecodedMessage { header, body, protected, protection, extra_certs })
}
