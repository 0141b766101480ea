//! `genm`/`genp` general messages, including `PKIBoot` trust-list
//! retrieval and CA-key-update announcements.

use cmp_asn1::{writer, Reader};
use cmp_types::CmpError;

use crate::domain::{CertTrustList, InfoTypeAndValue};
use crate::oids::{CA_KEY_UPDATE_OID, PKI_BOOT_OID};

/// `GenMsgContent ::= SEQUENCE OF InfoTypeAndValue`.
pub fn decode_general_message(content: &[u8]) -> Result<Vec<InfoTypeAndValue>, CmpError> {
    let mut outer = Reader::new(content);
    let mut r = outer.read_sequence()?;
    let mut out = Vec::new();
    while !r.is_empty() {
        out.push(decode_info_type_and_value(&mut r)?);
    }
    Ok(out)
}

fn decode_info_type_and_value(r: &mut Reader) -> Result<InfoTypeAndValue, CmpError> {
    let mut entry = r.read_sequence()?;
    let oid_der = entry.read_raw_tlv()?;
    let oid = cmp_oid::oid_to_text(oid_der)?;
    let value_der = if entry.is_empty() { None } else { Some(entry.read_raw_tlv()?.to_vec()) };
    Ok(InfoTypeAndValue { oid, value_der })
}

pub fn encode_general_message(entries: &[InfoTypeAndValue], out: &mut Vec<u8>) {
    writer::write_sequence(out, |seq| {
        for entry in entries {
            encode_info_type_and_value(entry, seq);
        }
    });
}

fn encode_info_type_and_value(entry: &InfoTypeAndValue, out: &mut Vec<u8>) {
    writer::write_sequence(out, |seq| {
        let oid_der = cmp_oid::text_to_oid(&entry.oid).expect("valid OID");
        seq.extend_from_slice(&oid_der);
        if let Some(value) = &entry.value_der {
            seq.extend_from_slice(value);
        }
    });
}

/// `GenRepContent ::= SEQUENCE OF InfoTypeAndValue`, same shape as `genm`.
pub fn decode_general_response(content: &[u8]) -> Result<Vec<InfoTypeAndValue>, CmpError> {
    decode_general_message(content)
}

pub fn encode_general_response(entries: &[InfoTypeAndValue], out: &mut Vec<u8>) {
    encode_general_message(entries, out)
}

/// Recover a [`CertTrustList`] from a `PKIBoot` `genp` response — a bare
/// list of DER certificates, with no signature verification of the chain
/// itself.
pub fn parse_pki_boot_response(entries: &[InfoTypeAndValue]) -> Result<CertTrustList, CmpError> {
    let boot = entries
        .iter()
        .find(|e| e.oid == PKI_BOOT_OID)
        .ok_or_else(|| CmpError::bad_data("genp response did not carry a PKIBoot entry"))?;
    let value = boot
        .value_der
        .as_deref()
        .ok_or_else(|| CmpError::bad_data("PKIBoot entry carried no value"))?;

    let mut r = Reader::new(value);
    let mut sequence = r.read_sequence()?;
    let mut certificates_der = Vec::new();
    while !sequence.is_empty() {
        certificates_der.push(sequence.read_raw_tlv()?.to_vec());
    }
    Ok(CertTrustList { certificates_der })
}

/// `true` if any entry announces a CA key update (clients should refresh
/// their trust anchors before the next transaction).
pub fn announces_ca_key_update(entries: &[InfoTypeAndValue]) -> bool {
    entries.iter().any(|e| e.oid == CA_KEY_UPDATE_OID)
}

/// Build a `genm` requesting a `PKIBoot` trust list, with an empty value
/// (the request carries only the infoType OID).
pub fn pki_boot_request() -> Vec<InfoTypeAndValue> {
    vec![InfoTypeAndValue { oid: PKI_BOOT_OID.to_string(), value_der: None }]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_general_message() {
        let entries = vec![
            InfoTypeAndValue { oid: PKI_BOOT_OID.to_string(), value_der: None },
            InfoTypeAndValue {
                oid: CA_KEY_UPDATE_OID.to_string(),
                value_der: Some(vec![0x04, 0x01, 0xAA]),
            },
        ];
        let mut out = Vec::new();
        encode_general_message(&entries, &mut out);
        let decoded = decode_general_message(&out).unwrap();
        assert_eq!(decoded, entries);
    }

    #[test]
    fn ca_key_update_is_detected() {
        let entries =
            vec![InfoTypeAndValue { oid: CA_KEY_UPDATE_OID.to_string(), value_der: None }];
        assert!(announces_ca_key_update(&entries));
    }

    #[test]
    fn parses_pki_boot_certificate_list() {
        let mut cert_list = Vec::new();
        writer::write_sequence(&mut cert_list, |seq| {
            writer::write_octet_string(b"cert-one", seq);
            writer::write_octet_string(b"cert-two", seq);
        });
        let entries = vec![InfoTypeAndValue {
            oid: PKI_BOOT_OID.to_string(),
            value_der: Some(cert_list),
        }];
        let ctl = parse_pki_boot_response(&entries).unwrap();
        assert_eq!(ctl.certificates_der.len(), 2);
    }

    #[test]
    fn missing_pki_boot_entry_is_rejected() {
        let entries: Vec<InfoTypeAndValue> = Vec::new();
        assert!(parse_pki_boot_response(&entries).is_err());
    }
}
