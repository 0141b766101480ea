//! Driven port standing in for the X.509 introspection capability this
//! core excludes from its own scope: certificate parsing is an external
//! capability consumed through this trait, not implemented here.

use crate::ports::crypto::HashAlgorithm;

/// A single certificate's identity-relevant fields, as the header/body
/// processors need them. Never constructs or validates a certificate
/// chain — that is explicitly out of scope.
pub trait CertificateHandle {
    /// DER encoding of the certificate's `subject` `Name`.
    fn subject_der(&self) -> &[u8];

    /// DER encoding of the certificate's `SubjectPublicKeyInfo`.
    fn spki_der(&self) -> &[u8];

    /// SHA-1 fingerprint, for `ESSCertID` signer identification.
    fn sha1_fingerprint(&self) -> [u8; 20];

    /// Hash algorithm the certificate's own signature was produced with.
    fn signature_hash_algorithm(&self) -> HashAlgorithm;

    /// Raw public key material (for PKCS#1 v1.5 key-unwrap or signature
    /// verification), distinct from the full SPKI DER.
    fn public_key_der(&self) -> &[u8];
}
