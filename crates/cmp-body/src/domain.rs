//! Shared request/response data types for the body processor.

use cmp_crypto::HashAlgorithm;

/// `CertTemplate ::= SEQUENCE { subject Name OPTIONAL, publicKey
/// SubjectPublicKeyInfo OPTIONAL, extensions Extensions OPTIONAL, ... }`,
/// trimmed to the fields this core actually inspects.
///
/// Subject may be empty in an `ir` — the CA fills it in from the
/// corresponding `PKIUser` record during server-side IR handling.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CertTemplate {
    pub subject_der: Option<Vec<u8>>,
    pub public_key_der: Vec<u8>,
    pub extensions_der: Option<Vec<u8>>,
    pub key_usage: Option<KeyUsage>,
}

/// The subset of `KeyUsage` bits relevant to the signing-key proof-of-
/// possession rule: a requested `digitalSignature`/`nonRepudiation` usage
/// requires a self-signature over the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct KeyUsage {
    pub digital_signature: bool,
    pub non_repudiation: bool,
}

impl KeyUsage {
    pub fn requires_signature_pop(self) -> bool {
        self.digital_signature || self.non_repudiation
    }
}

/// Proof of possession accompanying a `CertReqMessage`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProofOfPossession {
    /// Self-signed proof over the certificate request, required when the
    /// requested key usage includes signing.
    Signature(Vec<u8>),
    /// Proof by decrypting a server-issued challenge.
    Encryption,
    /// No POP supplied yet (deferred POP, encryption-only keys).
    None,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CertRequest {
    pub cert_req_id: i64,
    pub template: CertTemplate,
    pub pop: ProofOfPossession,
}

/// One of the three ways a certificate can arrive in `ip`/`cp`/`kup`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CertificateDelivery {
    Plaintext(Vec<u8>),
    /// Legacy-CMP `encryptedCert`: RSA-wrapped CEK plus a CBC-encrypted
    /// certificate, both recovered via the crypto backend.
    LegacyEncrypted { cek_alg_oid: String, enc_cek: Vec<u8>, encrypted_cert: Vec<u8> },
    /// CMS `EnvelopedData`, delegated to [`cmp_crypto::EnvelopeOpener`].
    CmsEnveloped(Vec<u8>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct CertResponseEntry {
    pub status: cmp_status::PkiStatusInfo,
    pub certificate: Option<CertificateDelivery>,
}

/// A certificate the client is waiting to confirm or has already
/// confirmed/rejected.
///
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingConfirmation {
    pub certificate_der: Vec<u8>,
    pub hash_algorithm: HashAlgorithm,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RevocationReason {
    Unspecified,
    KeyCompromise,
    CaCompromise,
    AffiliationChanged,
    Superseded,
    CessationOfOperation,
    CertificateHold,
}

impl RevocationReason {
    pub fn code(self) -> i64 {
        match self {
            RevocationReason::Unspecified => 0,
            RevocationReason::KeyCompromise => 1,
            RevocationReason::CaCompromise => 2,
            RevocationReason::AffiliationChanged => 3,
            RevocationReason::Superseded => 4,
            RevocationReason::CessationOfOperation => 5,
            RevocationReason::CertificateHold => 6,
        }
    }

    pub fn from_code(code: i64) -> Self {
        match code {
            1 => RevocationReason::KeyCompromise,
            2 => RevocationReason::CaCompromise,
            3 => RevocationReason::AffiliationChanged,
            4 => RevocationReason::Superseded,
            5 => RevocationReason::CessationOfOperation,
            6 => RevocationReason::CertificateHold,
            _ => RevocationReason::Unspecified,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RevocationTarget {
    pub issuer_der: Vec<u8>,
    pub serial: Vec<u8>,
    pub reason: RevocationReason,
}

/// One `InfoTypeAndValue` entry carried by `genm`/`genp`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InfoTypeAndValue {
    pub oid: String,
    pub value_der: Option<Vec<u8>>,
}

/// A certificate trust list recovered from a `PKIBoot` `genp` response —
/// a bare list of DER certificates, with no signature verification of the
/// chain itself.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CertTrustList {
    pub certificates_der: Vec<Vec<u8>>,
}
