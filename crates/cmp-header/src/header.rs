//! `PKIHeader` read/write and the identity/nonce/transaction bookkeeping
//! that goes with it.
//!

use cmp_asn1::{tag, writer, Reader};
use cmp_types::constants::GENERATED_ID_LEN;
use cmp_types::{CmpError, FailBit, FailInfoFlags, OctetId, PeerDetail};

use crate::oids::{CRYPTLIB_PRESENCE_OID, ESS_CERT_ID_OID, PASSWORD_BASED_MAC_OID};

/// The protection algorithm a header declares, with the MAC parameter
/// block deferred as a raw slice rather than parsed eagerly — the session
/// doesn't know the authenticating password until later, so there is
/// nothing useful to decode yet — MAC parameter parsing is deferred until
/// the caller determines the authenticating password.
///
/// This is the Rust-native equivalent of "record the buffer offset": a
/// borrowed slice tied to the original wire buffer's lifetime carries the
/// same deferred reference without needing a separate offset/length pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProtectionAlgorithm<'a> {
    Mac { params_der: Option<&'a [u8]> },
    Signature { oid: String },
}

/// A parsed `PKIHeader`, borrowing from the wire buffer it was decoded
/// from wherever the content is only needed for byte-exact comparison
/// (sender/recipient identity).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PkiHeader<'a> {
    /// Raw `GeneralName` TLV bytes — never re-interpreted, only compared.
    pub sender_der: &'a [u8],
    pub recipient_der: &'a [u8],
    pub message_time: Option<&'a [u8]>,
    pub protection_alg: ProtectionAlgorithm<'a>,
    pub sender_kid: Option<&'a [u8]>,
    pub recipient_kid: Option<&'a [u8]>,
    pub transaction_id: OctetId,
    pub sender_nonce: OctetId,
    pub recipient_nonce: Option<OctetId>,
    pub is_peer_cryptlib: bool,
    pub ess_cert_id_fingerprint: Option<[u8; 20]>,
}

impl<'a> PkiHeader<'a> {
    pub fn decode(r: &mut Reader<'a>) -> Result<Self, CmpError> {
        let mut seq = r.read_sequence()?;

        let version = seq.read_integer()?;
        if version != 2 {
            return Err(CmpError::bad_data(format!("unsupported PKIHeader version {version}")));
        }

        let sender_der = seq.read_raw_tlv()?;
        let recipient_der = seq.read_raw_tlv()?;

        let message_time = take_field(&mut seq, 0)?;

        let protection_alg = {
            let content = take_field(&mut seq, 1)?
                .ok_or_else(|| CmpError::bad_data("PKIHeader missing protectionAlg"))?;
            decode_protection_algorithm(content)?
        };

        let sender_kid = take_field(&mut seq, 2)?;
        let recipient_kid = take_field(&mut seq, 3)?;

        let transaction_id = take_field(&mut seq, 4)?
            .ok_or_else(|| CmpError::bad_data("PKIHeader missing transactionID"))?;
        let transaction_id = OctetId::new(transaction_id.to_vec())?;

        let sender_nonce = take_field(&mut seq, 5)?
            .ok_or_else(|| CmpError::bad_data("PKIHeader missing senderNonce"))?;
        let sender_nonce = OctetId::new(sender_nonce.to_vec())?;

        let recipient_nonce =
            take_field(&mut seq, 6)?.map(|b| OctetId::new(b.to_vec())).transpose()?;

        // freeText [7] is not consumed by this core; skip if present.
        let _free_text = take_field(&mut seq, 7)?;

        let mut is_peer_cryptlib = false;
        let mut ess_cert_id_fingerprint = None;
        if let Some(general_info) = take_field(&mut seq, 8)? {
            let mut gi = Reader::new(general_info);
            while !gi.is_empty() {
                let mut entry = gi.read_sequence()?;
                let oid_der = entry.read_raw_tlv()?;
                let oid_text = cmp_oid::oid_to_text(oid_der)?;
                let value = if entry.is_empty() { None } else { Some(entry.read_raw_tlv()?) };
                if oid_text == CRYPTLIB_PRESENCE_OID {
                    is_peer_cryptlib = true;
                } else if oid_text == ESS_CERT_ID_OID {
                    if let Some(v) = value {
                        ess_cert_id_fingerprint = extract_ess_cert_id_fingerprint(v)?;
                    }
                }
                // Anything else is skipped silently.
            }
        }

        Ok(Self {
            sender_der,
            recipient_der,
            message_time,
            protection_alg,
            sender_kid,
            recipient_kid,
            transaction_id,
            sender_nonce,
            recipient_nonce,
            is_peer_cryptlib,
            ess_cert_id_fingerprint,
        })
    }
}

/// Read an OPTIONAL context-tagged field at position `n`, consuming it if
/// present. Treats every optional header field as IMPLICIT-tagged: the
/// content slice is returned as-is.
fn take_field<'a>(seq: &mut Reader<'a>, n: u8) -> Result<Option<&'a [u8]>, CmpError> {
    let primitive = tag::context_primitive(n);
    let constructed = tag::context_constructed(n);
    match seq.peek_tag_opt() {
        Some(t) if t == primitive || t == constructed => Ok(Some(seq.read_tlv()?.1)),
        _ => Ok(None),
    }
}

fn decode_protection_algorithm(content: &[u8]) -> Result<ProtectionAlgorithm<'_>, CmpError> {
    let mut alg = Reader::new(content);
    let oid_der = alg.read_raw_tlv()?;
    let oid_text = cmp_oid::oid_to_text(oid_der)?;
    if oid_text == PASSWORD_BASED_MAC_OID {
        let params = if alg.is_empty() { None } else { Some(alg.remaining()) };
        Ok(ProtectionAlgorithm::Mac { params_der: params })
    } else {
        Ok(ProtectionAlgorithm::Signature { oid: oid_text })
    }
}

fn extract_ess_cert_id_fingerprint(value: &[u8]) -> Result<Option<[u8; 20]>, CmpError> {
    // ESSCertID ::= SEQUENCE { certHash OCTET STRING (SIZE(20)), issuerSerial IssuerSerial OPTIONAL }
    // `value` here is the raw TLV of the `ANY` infoValue, which wraps a
    // SEQUENCE OF ESSCertID (only the first entry is used).
    let mut outer = Reader::new(value);
    let (tag_byte, content) = outer.read_tlv()?;
    if tag_byte != cmp_asn1::tag::SEQUENCE {
        return Ok(None);
    }
    let mut list = Reader::new(content);
    if list.is_empty() {
        return Ok(None);
    }
    let mut first = list.read_sequence()?;
    let hash = first.read_octet_string()?;
    if hash.len() != 20 {
        return Err(CmpError::bad_data("ESSCertID certHash is not 20 bytes"));
    }
    let mut out = [0u8; 20];
    out.copy_from_slice(hash);
    Ok(Some(out))
}

/// Build a fresh header for an outgoing message.
///
pub struct HeaderWriteParams<'a> {
    pub sender_der: &'a [u8],
    pub recipient_der: &'a [u8],
    pub protection_alg_oid: &'a str,
    pub mac_params_der: Option<&'a [u8]>,
    pub sender_kid: Option<&'a [u8]>,
    pub recipient_kid: Option<&'a [u8]>,
    pub transaction_id: &'a OctetId,
    pub sender_nonce: &'a OctetId,
    pub recipient_nonce: Option<&'a OctetId>,
    pub ess_cert_id_fingerprint: Option<[u8; 20]>,
    pub announce_cryptlib_presence: bool,
}

pub fn encode(params: &HeaderWriteParams, out: &mut Vec<u8>) -> Result<(), CmpError> {
    writer::write_sequence(out, |seq| {
        writer::write_integer(2, seq);
        seq.extend_from_slice(params.sender_der);
        seq.extend_from_slice(params.recipient_der);

        write_context_field(seq, 1, |alg| {
            let oid_der = cmp_oid::text_to_oid(params.protection_alg_oid).expect("valid OID text");
            alg.extend_from_slice(&oid_der);
            if let Some(mac_params) = params.mac_params_der {
                alg.extend_from_slice(mac_params);
            }
        });

        if let Some(kid) = params.sender_kid {
            write_context_primitive(seq, 2, kid);
        }
        if let Some(kid) = params.recipient_kid {
            write_context_primitive(seq, 3, kid);
        }
        write_context_primitive(seq, 4, params.transaction_id.as_bytes());
        write_context_primitive(seq, 5, params.sender_nonce.as_bytes());
        if let Some(nonce) = params.recipient_nonce {
            write_context_primitive(seq, 6, nonce.as_bytes());
        }

        if params.ess_cert_id_fingerprint.is_some() || params.announce_cryptlib_presence {
            write_context_field(seq, 8, |gi| {
                if let Some(fp) = params.ess_cert_id_fingerprint {
                    write_general_info_entry(gi, ESS_CERT_ID_OID, |value| {
                        writer::write_sequence(value, |ess_list| {
                            writer::write_sequence(ess_list, |ess| {
                                writer::write_octet_string(&fp, ess);
                            });
                        });
                    });
                }
                if params.announce_cryptlib_presence {
                    write_general_info_entry(gi, CRYPTLIB_PRESENCE_OID, |_| {});
                }
            });
        }
    });
    Ok(())
}

fn write_context_field(out: &mut Vec<u8>, n: u8, build: impl FnOnce(&mut Vec<u8>)) {
    writer::write_constructed(tag::context_constructed(n), out, build);
}

fn write_context_primitive(out: &mut Vec<u8>, n: u8, content: &[u8]) {
    writer::write_tlv(tag::context_primitive(n), content, out);
}

fn write_general_info_entry(out: &mut Vec<u8>, oid_text: &str, build_value: impl FnOnce(&mut Vec<u8>)) {
    writer::write_sequence(out, |entry| {
        let oid_der = cmp_oid::text_to_oid(oid_text).expect("valid OID text");
        entry.extend_from_slice(&oid_der);
        build_value(entry);
    });
}

/// Generate a fresh 16-byte nonce or transaction ID.
///
/// "fresh 16-byte random on a new client exchange").
pub fn generate_octet_id(crypto: &impl cmp_crypto::CryptoProvider) -> OctetId {
    let bytes = crypto.random_bytes(GENERATED_ID_LEN);
    OctetId::from_generated(bytes)
}

/// Updates the mutable, session-scoped header bookkeeping (transaction ID
/// record/compare, nonce chaining) for one incoming header.
///
/// exchange, record it; on any subsequent message, compare with the
/// recorded value...Extract sender nonce; store it as the next outgoing
/// recipient nonce").
#[derive(Debug, Default)]
pub struct HeaderState {
    pub transaction_id: Option<OctetId>,
    pub next_recipient_nonce: Option<OctetId>,
    pub is_peer_cryptlib: bool,
}

impl HeaderState {
    pub fn process_incoming(&mut self, header: &PkiHeader<'_>) -> Result<(), CmpError> {
        match &self.transaction_id {
            None => self.transaction_id = Some(header.transaction_id.clone()),
            Some(recorded) if recorded.as_bytes() == header.transaction_id.as_bytes() => {}
            Some(_) => {
                let mut fail_info = FailInfoFlags::empty();
                fail_info.set(FailBit::BadRecipientNonce);
                return Err(CmpError::signature_with(
                    "transaction ID does not match the recorded exchange",
                    PeerDetail { fail_info: Some(fail_info), ..PeerDetail::none() },
                ));
            }
        }
        self.next_recipient_nonce = Some(header.sender_nonce.clone());
        if header.is_peer_cryptlib {
            self.is_peer_cryptlib = true;
        }
        Ok(())
    }
}

/// Requires at least one of the two identity-establishing mechanisms
/// (MAC-path userID keyID, or signature-path ESSCertID) to be present on
/// the first server-side message.
///
pub fn check_identity_selected(header: &PkiHeader<'_>) -> Result<(), CmpError> {
    let has_key_id = header.sender_kid.is_some();
    let has_ess_cert_id = header.ess_cert_id_fingerprint.is_some();
    if !has_key_id && !has_ess_cert_id {
        return Err(CmpError::signature(
            "neither a userID keyID nor an ESSCertID identified the sender",
        ));
    }
    Ok(())
}
