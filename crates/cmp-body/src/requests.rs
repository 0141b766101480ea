//! `ir`/`cr`/`kur`/`p10cr` request bodies and `rr` revocation requests.

use cmp_asn1::{tag, writer, Reader};
use cmp_types::CmpError;

use crate::domain::{CertRequest, CertTemplate, ProofOfPossession, RevocationReason, RevocationTarget};

/// `CertReqMessages ::= SEQUENCE SIZE (1..MAX) OF CertReqMsg`.
pub fn decode_cert_req_messages(content: &[u8]) -> Result<Vec<CertRequest>, CmpError> {
    let mut outer = Reader::new(content);
    let mut r = outer.read_sequence()?;
    let mut out = Vec::new();
    while !r.is_empty() {
        out.push(decode_cert_req_msg(&mut r)?);
    }
    if out.is_empty() {
        return Err(CmpError::bad_data("CertReqMessages must contain at least one entry"));
    }
    Ok(out)
}

fn decode_cert_req_msg(r: &mut Reader) -> Result<CertRequest, CmpError> {
    let mut msg = r.read_sequence()?;
    let mut cert_req = msg.read_sequence()?;
    let cert_req_id = cert_req.read_integer()?;
    let template = decode_cert_template(&mut cert_req)?;
    // `controls` is not consumed by this core.

    let pop = if msg.is_empty() {
        ProofOfPossession::None
    } else {
        decode_pop(&mut msg)?
    };

    Ok(CertRequest { cert_req_id, template, pop })
}

fn decode_cert_template(r: &mut Reader) -> Result<CertTemplate, CmpError> {
    let mut fields = r.read_sequence()?;
    let mut template = CertTemplate::default();
    while !fields.is_empty() {
        let peek = fields.peek_tag()?;
        let n = tag::context_number(peek);
        match n {
            5 => {
                template.subject_der = Some(fields.read_raw_tlv()?.to_vec());
            }
            6 => {
                let content = fields.expect_tag(tag::context_constructed(6))?;
                template.public_key_der = content.to_vec();
            }
            9 => {
                template.extensions_der = Some(fields.read_raw_tlv()?.to_vec());
            }
            _ => {
                // version/serialNumber/signingAlg/issuer/validity/UIDs are
                // not used by this core; skip whatever is present.
                fields.skip_value()?;
            }
        }
    }
    Ok(template)
}

/// Simplified `ProofOfPossession` decode: only distinguishes "a raw
/// signature was supplied" from "no/encryption-based POP", which is all
/// the signing-key POP rule needs to check.
fn decode_pop(r: &mut Reader) -> Result<ProofOfPossession, CmpError> {
    let (tag_byte, content) = r.read_tlv()?;
    match tag::context_number(tag_byte) {
        1 => {
            // POPOSigningKey ::= SEQUENCE { poposkInput OPTIONAL,
            // algorithmIdentifier, signature BIT STRING }. The signature
            // is the last element; walk to it without interpreting the
            // rest.
            let mut inner = Reader::new(content);
            let mut last_bit_string = None;
            while !inner.is_empty() {
                if inner.peek_tag()? == cmp_asn1::tag::BIT_STRING {
                    let (_, bytes) = inner.read_bit_string()?;
                    last_bit_string = Some(bytes.to_vec());
                } else {
                    inner.skip_value()?;
                }
            }
            let sig = last_bit_string
                .ok_or_else(|| CmpError::bad_data("POPOSigningKey missing signature"))?;
            Ok(ProofOfPossession::Signature(sig))
        }
        0 => Ok(ProofOfPossession::None),
        2 | 3 => Ok(ProofOfPossession::Encryption),
        other => Err(CmpError::bad_data(format!("unrecognised ProofOfPossession choice {other}"))),
    }
}

pub fn encode_cert_req_messages(requests: &[CertRequest], out: &mut Vec<u8>) {
    writer::write_sequence(out, |seq| {
        for req in requests {
            encode_cert_req_msg(req, seq);
        }
    });
}

fn encode_cert_req_msg(req: &CertRequest, out: &mut Vec<u8>) {
    writer::write_sequence(out, |msg| {
        writer::write_sequence(msg, |cert_req| {
            writer::write_integer(req.cert_req_id, cert_req);
            encode_cert_template(&req.template, cert_req);
        });
        match &req.pop {
            ProofOfPossession::Signature(sig) => {
                writer::write_constructed(tag::context_constructed(1), msg, |poposk| {
                    writer::write_bit_string(0, sig, poposk);
                });
            }
            ProofOfPossession::Encryption => {
                writer::write_constructed(tag::context_constructed(2), msg, |_| {});
            }
            ProofOfPossession::None => {}
        }
    });
}

fn encode_cert_template(template: &CertTemplate, out: &mut Vec<u8>) {
    writer::write_sequence(out, |seq| {
        if let Some(subject) = &template.subject_der {
            seq.extend_from_slice(subject);
        }
        writer::write_constructed(tag::context_constructed(6), seq, |pk| {
            pk.extend_from_slice(&template.public_key_der);
        });
        if let Some(ext) = &template.extensions_der {
            seq.extend_from_slice(ext);
        }
    });
}

/// `RevReqContent ::= SEQUENCE OF RevDetails`; this core only ever sends
/// or reads a single entry. `RevDetails.certDetails` reuses the
/// `CertTemplate` shape but only issuer/serial are read here — the
/// signing-key POP rule and subject reconciliation that apply to an `ir`
/// request have no bearing on identifying a certificate to revoke.
pub fn decode_revocation_request(content: &[u8]) -> Result<RevocationTarget, CmpError> {
    let mut r = Reader::new(content);
    let mut seq_of = r.read_sequence()?;
    let mut details = seq_of.read_sequence()?;
    let mut template = details.read_sequence()?;

    let mut issuer_der = None;
    let mut serial = None;
    while !template.is_empty() {
        let peek = template.peek_tag()?;
        match tag::context_number(peek) {
            1 => {
                let content = template.expect_tag(tag::context_primitive(1))?;
                serial = Some(content.to_vec());
            }
            3 => {
                issuer_der = Some(template.read_raw_tlv()?.to_vec());
            }
            _ => {
                template.skip_value()?;
            }
        }
    }

    let mut reason = RevocationReason::Unspecified;
    if !details.is_empty() {
        // crlEntryDetails: SEQUENCE OF Extension, we only look for the
        // reasonCode extension's integer value.
        let mut extensions = details.read_sequence()?;
        while !extensions.is_empty() {
            let mut ext = extensions.read_sequence()?;
            let _oid = ext.read_raw_tlv()?;
            if ext.peek_tag_opt() == Some(cmp_asn1::tag::BOOLEAN) {
                ext.skip_value()?;
            }
            let value = ext.read_octet_string()?;
            let mut inner = Reader::new(value);
            if let Ok(code) = inner.read_integer() {
                reason = RevocationReason::from_code(code);
            }
        }
    }

    Ok(RevocationTarget {
        issuer_der: issuer_der
            .ok_or_else(|| CmpError::bad_data("revocation request missing issuer"))?,
        serial: serial.ok_or_else(|| CmpError::bad_data("revocation request missing serial"))?,
        reason,
    })
}

pub fn encode_revocation_request(target: &RevocationTarget, out: &mut Vec<u8>) {
    writer::write_sequence(out, |req_list| {
        writer::write_sequence(req_list, |details| {
            writer::write_sequence(details, |template| {
                template.extend_from_slice(&target.issuer_der);
                writer::write_tlv(tag::context_primitive(1), &target.serial, template);
            });
            writer::write_sequence(details, |extensions| {
                writer::write_sequence(extensions, |ext| {
                    let oid_der = cmp_oid::text_to_oid("2 5 29 21").expect("valid OID");
                    ext.extend_from_slice(&oid_der);
                    let mut reason_der = Vec::new();
                    writer::write_integer(target.reason.code(), &mut reason_der);
                    writer::write_octet_string(&reason_der, ext);
                });
            });
        });
    });
}

/// `p10cr` wraps a raw PKCS#10 `CertificationRequest`, passed through
/// without reinterpretation — X.509/CRMF parsing is out of this core's
/// scope.
pub fn decode_p10cr(content: &[u8]) -> Vec<u8> {
    content.to_vec()
}
