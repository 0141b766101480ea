//! `ip`/`cp`/`kup` response bodies and `rp` revocation responses.

use cmp_asn1::{tag, writer, Reader};
use cmp_crypto::{CryptoProvider, EnvelopeOpener};
use cmp_status::PkiStatusInfo;
use cmp_types::CmpError;

use crate::domain::{CertResponseEntry, CertificateDelivery};

/// `CertRepMessage ::= SEQUENCE { caPubs SEQUENCE OF Certificate OPTIONAL,
/// response SEQUENCE OF CertResponse }`.
pub fn decode_cert_rep_message(content: &[u8]) -> Result<Vec<CertResponseEntry>, CmpError> {
    let mut outer = Reader::new(content);
    let mut r = outer.read_sequence()?;
    if r.peek_tag_opt() == Some(tag::context_constructed(1)) {
        // caPubs — not consumed by this core beyond skipping it.
        r.skip_value()?;
    }
    let mut responses = r.read_sequence()?;
    let mut out = Vec::new();
    while !responses.is_empty() {
        out.push(decode_cert_response(&mut responses)?);
    }
    if out.is_empty() {
        return Err(CmpError::bad_data("CertRepMessage carried zero CertResponse entries"));
    }
    Ok(out)
}

fn decode_cert_response(r: &mut Reader) -> Result<CertResponseEntry, CmpError> {
    let mut entry = r.read_sequence()?;
    let _cert_req_id = entry.read_integer()?;
    let status = PkiStatusInfo::decode(&mut entry)?;

    let certificate = if entry.is_empty() {
        None
    } else {
        Some(decode_certified_key_pair(&mut entry)?)
    };

    Ok(CertResponseEntry { status, certificate })
}

/// `CertifiedKeyPair ::= SEQUENCE { certOrEncCert CertOrEncCert, ... }`,
/// where `CertOrEncCert` is a CHOICE between a plain certificate [0] and
/// an `EncryptedValue`/`EncryptedKey` [1] (legacy CBC-wrapped or CMS
/// `EnvelopedData`).
fn decode_certified_key_pair(r: &mut Reader) -> Result<CertificateDelivery, CmpError> {
    let mut pair = r.read_sequence()?;
    let (tag_byte, content) = pair.read_tlv()?;
    match tag::context_number(tag_byte) {
        0 => {
            let mut choice = Reader::new(content);
            let cert_der = choice.read_raw_tlv()?;
            Ok(CertificateDelivery::Plaintext(cert_der.to_vec()))
        }
        1 => {
            // `EncryptedKey ::= CHOICE { encryptedValue EncryptedValue,
            // envelopedData [0] EnvelopedData }` — distinguish by the
            // inner TLV's tag.
            let mut inner = Reader::new(content);
            let inner_tag = inner.peek_tag()?;
            if inner_tag == tag::SEQUENCE {
                let ev = inner.read_sequence()?;
                decode_encrypted_value(ev.remaining())
            } else if tag::context_number(inner_tag) == 0 {
                let enveloped = inner.expect_tag(tag::context_constructed(0))?;
                Ok(CertificateDelivery::CmsEnveloped(enveloped.to_vec()))
            } else {
                Err(CmpError::bad_data("unrecognised EncryptedKey choice"))
            }
        }
        other => Err(CmpError::bad_data(format!("unrecognised CertOrEncCert choice {other}"))),
    }
}

/// `EncryptedValue ::= SEQUENCE { intendedAlg AlgorithmIdentifier OPTIONAL,
/// symmAlg AlgorithmIdentifier OPTIONAL, encSymmKey BIT STRING OPTIONAL,
/// keyAlg AlgorithmIdentifier OPTIONAL, valueHint OCTET STRING OPTIONAL,
/// encValue BIT STRING }`, trimmed to the fields this core needs to
/// recover the plaintext certificate.
fn decode_encrypted_value(content: &[u8]) -> Result<CertificateDelivery, CmpError> {
    let mut r = Reader::new(content);
    let mut cek_alg_oid = None;
    let mut enc_cek = None;
    let mut encrypted_cert = None;

    while !r.is_empty() {
        let peek = r.peek_tag()?;
        match tag::context_number(peek) {
            1 => {
                let alg = r.expect_tag(tag::context_constructed(1))?;
                let mut alg_reader = Reader::new(alg);
                let oid_der = alg_reader.read_raw_tlv()?;
                cek_alg_oid = Some(cmp_oid::oid_to_text(oid_der)?);
            }
            2 => {
                let content = r.expect_tag(tag::context_primitive(2))?;
                let (_, bytes) = bit_string_from_primitive(content)?;
                enc_cek = Some(bytes);
            }
            _ => {
                r.skip_value()?;
            }
        }
    }

    // `encValue` is the final, mandatory BIT STRING. We re-scan content for
    // the last BIT-STRING-tagged TLV, since its context tag number ([6] in
    // RFC 4211) is implicit and may be encoded as primitive.
    let mut rescan = Reader::new(content);
    while !rescan.is_empty() {
        let (tag_byte, bytes) = rescan.read_tlv()?;
        if tag::context_number(tag_byte) == 6 {
            let (_, value) = bit_string_from_primitive(bytes)?;
            encrypted_cert = Some(value);
        }
    }

    Ok(CertificateDelivery::LegacyEncrypted {
        cek_alg_oid: cek_alg_oid
            .ok_or_else(|| CmpError::bad_data("EncryptedValue missing symmAlg"))?,
        enc_cek: enc_cek.ok_or_else(|| CmpError::bad_data("EncryptedValue missing encSymmKey"))?,
        encrypted_cert: encrypted_cert
            .ok_or_else(|| CmpError::bad_data("EncryptedValue missing encValue"))?,
    })
}

/// `BIT STRING` content is `unused-bit-count || bytes`, whether reached
/// through an explicit `BIT STRING` tag or an implicit context tag of the
/// same shape.
fn bit_string_from_primitive(content: &[u8]) -> Result<(u8, Vec<u8>), CmpError> {
    let (unused, bytes) =
        content.split_first().ok_or_else(|| CmpError::bad_data("empty BIT STRING content"))?;
    Ok((*unused, bytes.to_vec()))
}

/// Recover the plaintext certificate DER from a [`CertificateDelivery`].
pub async fn recover_certificate(
    delivery: &CertificateDelivery,
    crypto: &dyn CryptoProvider,
    private_key_der: Option<&[u8]>,
    envelope_opener: Option<&dyn EnvelopeOpener>,
) -> Result<Vec<u8>, CmpError> {
    match delivery {
        CertificateDelivery::Plaintext(der) => Ok(der.clone()),
        CertificateDelivery::LegacyEncrypted { enc_cek, encrypted_cert, .. } => {
            let private_key_der = private_key_der
                .ok_or_else(|| CmpError::bad_data("legacy encrypted cert requires private key"))?;
            let cek = crypto.pkcs1v15_unwrap(private_key_der, enc_cek)?;
            // cryptlib-style legacy encoding prepends the CBC IV as the
            // first block of `encValue`.
            if encrypted_cert.len() < 16 {
                return Err(CmpError::bad_data("encrypted certificate shorter than one IV block"));
            }
            let (iv, ciphertext) = encrypted_cert.split_at(16);
            crypto.cbc_decrypt(&cek, iv, ciphertext)
        }
        CertificateDelivery::CmsEnveloped(der) => {
            let opener = envelope_opener.ok_or_else(|| {
                CmpError::bad_data("CMS enveloped certificate delivery requires an envelope opener")
            })?;
            tracing::debug!("delegating CMS enveloped certificate delivery to envelope opener");
            opener.open_enveloped_data(der).await
        }
    }
}

pub fn encode_cert_rep_message(entries: &[CertResponseEntry], out: &mut Vec<u8>) {
    writer::write_sequence(out, |seq| {
        writer::write_sequence(seq, |responses| {
            for (idx, entry) in entries.iter().enumerate() {
                encode_cert_response(idx as i64, entry, responses);
            }
        });
    });
}

fn encode_cert_response(cert_req_id: i64, entry: &CertResponseEntry, out: &mut Vec<u8>) {
    writer::write_sequence(out, |resp| {
        writer::write_integer(cert_req_id, resp);
        entry.status.encode(resp);
        if let Some(delivery) = &entry.certificate {
            encode_certified_key_pair(delivery, resp);
        }
    });
}

fn encode_certified_key_pair(delivery: &CertificateDelivery, out: &mut Vec<u8>) {
    writer::write_sequence(out, |pair| match delivery {
        CertificateDelivery::Plaintext(der) => {
            writer::write_constructed(tag::context_constructed(0), pair, |c| {
                c.extend_from_slice(der);
            });
        }
        CertificateDelivery::CmsEnveloped(der) => {
            writer::write_constructed(tag::context_constructed(1), pair, |choice| {
                writer::write_constructed(tag::context_constructed(0), choice, |c| {
                    c.extend_from_slice(der);
                });
            });
        }
        CertificateDelivery::LegacyEncrypted { cek_alg_oid, enc_cek, encrypted_cert } => {
            writer::write_constructed(tag::context_constructed(1), pair, |choice| {
                writer::write_sequence(choice, |enc| {
                    writer::write_constructed(tag::context_constructed(1), enc, |alg| {
                        let oid_der = cmp_oid::text_to_oid(cek_alg_oid).expect("valid OID");
                        alg.extend_from_slice(&oid_der);
                    });
                    let mut enc_cek_content = vec![0u8];
                    enc_cek_content.extend_from_slice(enc_cek);
                    writer::write_tlv(tag::context_primitive(2), &enc_cek_content, enc);
                    let mut enc_value_content = vec![0u8];
                    enc_value_content.extend_from_slice(encrypted_cert);
                    writer::write_tlv(tag::context_primitive(6), &enc_value_content, enc);
                });
            });
        }
    });
}

/// `rp`: `RevRepContent ::= SEQUENCE { status SEQUENCE OF PKIStatusInfo,
/// ... }`. This core only issues/expects a single revocation at a time.
pub fn decode_revocation_response(content: &[u8]) -> Result<PkiStatusInfo, CmpError> {
    let mut outer = Reader::new(content);
    let mut rev_rep = outer.read_sequence()?;
    let mut statuses = rev_rep.read_sequence()?;
    PkiStatusInfo::decode(&mut statuses)
}

pub fn encode_revocation_response(status: &PkiStatusInfo, out: &mut Vec<u8>) {
    writer::write_sequence(out, |seq| {
        writer::write_sequence(seq, |statuses| {
            status.encode(statuses);
        });
    });
}
