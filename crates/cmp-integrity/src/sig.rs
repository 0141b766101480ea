//! Signature-based integrity context.

use cmp_crypto::{CertificateHandle, CryptoProvider, HashAlgorithm};
use cmp_types::CmpError;

/// How the session identifies the expected signer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignerReference {
    /// Legacy peers only send the subject DN; match on that.
    SubjectDer(Vec<u8>),
    /// Well-behaved peers send an `ESSCertID` SHA-1 fingerprint.
    Sha1Fingerprint([u8; 20]),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SigContext {
    pub signer: SignerReference,
    pub hash_alg: HashAlgorithm,
}

impl SigContext {
    /// Confirm `candidate` is the expected signer, then verify `signature`
    /// over `protected` (the raw `ProtectedPart` bytes, as received on the
    /// wire — never re-encoded).
    pub fn verify(
        &self,
        crypto: &impl CryptoProvider,
        candidate: &(impl CertificateHandle + ?Sized),
        protected: &[u8],
        signature: &[u8],
    ) -> Result<(), CmpError> {
        let identity_matches = match &self.signer {
            SignerReference::SubjectDer(expected) => candidate.subject_der() == expected.as_slice(),
            SignerReference::Sha1Fingerprint(expected) => {
                candidate.sha1_fingerprint() == *expected
            }
        };
        if !identity_matches {
            return Err(CmpError::signature("signer certificate does not match session identity"));
        }

        let digest = crypto.hash(self.hash_alg, protected);
        let ok = crypto
            .verify_signature(candidate.spki_der(), self.hash_alg, &digest, signature)
            .map_err(|_| CmpError::signature("signature verification backend failed"))?;
        if !ok {
            return Err(CmpError::signature("signature does not verify over the protected part"));
        }
        Ok(())
    }
}
