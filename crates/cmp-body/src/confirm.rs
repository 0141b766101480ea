//! `certConf`/`pkiConf` handling.

use cmp_asn1::{tag, writer, Reader};
use cmp_crypto::HashAlgorithm;
use cmp_status::PkiStatusInfo;
use cmp_types::CmpError;

use crate::domain::PendingConfirmation;

/// `CertConfirmContent ::= SEQUENCE OF CertStatus`. This core only ever
/// confirms a single certificate per transaction, so it decodes (and
/// encodes) exactly one `CertStatus` entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CertConfirmation {
    pub cert_hash: Vec<u8>,
    pub cert_req_id: i64,
}

/// An empty `certConf` body is a client rejection of the issued
/// certificate, not malformed input.
pub fn decode_cert_confirm(content: &[u8]) -> Result<Option<CertConfirmation>, CmpError> {
    let mut r = Reader::new(content);
    let mut entries = r.read_sequence()?;
    if entries.is_empty() {
        return Ok(None);
    }
    let mut status_seq = entries.read_sequence()?;
    let cert_hash = status_seq.read_octet_string()?.to_vec();
    let cert_req_id = status_seq.read_integer()?;
    // An optional trailing `statusInfo` is not needed by this core.
    Ok(Some(CertConfirmation { cert_hash, cert_req_id }))
}

pub fn encode_cert_confirm(confirmation: Option<&CertConfirmation>, out: &mut Vec<u8>) {
    writer::write_sequence(out, |seq| {
        if let Some(confirmation) = confirmation {
            writer::write_sequence(seq, |status| {
                writer::write_octet_string(&confirmation.cert_hash, status);
                writer::write_integer(confirmation.cert_req_id, status);
            });
        }
    });
}

/// Compute the hash used to confirm a certificate. Legacy peers hash
/// with MD5 or SHA-1, never a stronger algorithm; only those two are
/// accepted for this step.
pub fn hash_for_confirmation(
    crypto: &dyn cmp_crypto::CryptoProvider,
    pending: &PendingConfirmation,
) -> Result<Vec<u8>, CmpError> {
    match pending.hash_algorithm {
        HashAlgorithm::Md5 | HashAlgorithm::Sha1 => {
            Ok(crypto.hash(pending.hash_algorithm, &pending.certificate_der))
        }
        HashAlgorithm::Sha256 => {
            Err(CmpError::bad_data("certConf hashing only supports MD5 or SHA-1"))
        }
    }
}

/// Build a `CertConfirmation` for an accepted certificate.
pub fn confirm_accepted(
    crypto: &dyn cmp_crypto::CryptoProvider,
    pending: &PendingConfirmation,
    cert_req_id: i64,
) -> Result<CertConfirmation, CmpError> {
    Ok(CertConfirmation { cert_hash: hash_for_confirmation(crypto, pending)?, cert_req_id })
}

/// `pkiConf` carries no content; its body is an ASN.1 `NULL`.
pub fn decode_pki_conf(content: &[u8]) -> Result<(), CmpError> {
    let mut r = Reader::new(content);
    if r.is_empty() {
        return Ok(());
    }
    r.expect_tag(tag::NULL)?;
    Ok(())
}

pub fn encode_pki_conf(out: &mut Vec<u8>) {
    writer::write_tlv(tag::NULL, &[], out);
}

/// A decoded server-side response to a confirmation, re-using the status
/// machinery (`pkiConf` on acceptance, an `error` body on a server-side
/// rejection is modeled in `error.rs`).
pub fn check_status(status: &PkiStatusInfo) -> Result<(), CmpError> {
    status.check()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_single_confirmation() {
        let confirmation = CertConfirmation { cert_hash: vec![1, 2, 3, 4], cert_req_id: 0 };
        let mut out = Vec::new();
        encode_cert_confirm(Some(&confirmation), &mut out);
        let decoded = decode_cert_confirm(&out).unwrap();
        assert_eq!(decoded, Some(confirmation));
    }

    #[test]
    fn empty_cert_confirm_is_rejection() {
        let mut out = Vec::new();
        encode_cert_confirm(None, &mut out);
        assert_eq!(decode_cert_confirm(&out).unwrap(), None);
    }

    #[test]
    fn round_trips_pki_conf() {
        let mut out = Vec::new();
        encode_pki_conf(&mut out);
        decode_pki_conf(&out).unwrap();
    }

    #[test]
    fn rejects_sha256_for_cert_confirmation_hash() {
        let crypto = cmp_crypto::RustCryptoProvider;
        let pending =
            PendingConfirmation { certificate_der: vec![1, 2, 3], hash_algorithm: HashAlgorithm::Sha256 };
        assert!(hash_for_confirmation(&crypto, &pending).is_err());
    }
}
