//! Driven port for the cryptographic primitives this core treats as
//! assumed available: hashing, MAC key derivation, HMAC, raw-signature
//! verification over a precomputed digest, PKCS#1 v1.5 key unwrap, CBC
//! decryption, and randomness.

use cmp_types::CmpError;

/// Digest algorithm selector. Only the three algorithms the protocol
/// actually names are modeled — MD5 and SHA-1 for legacy `certConf`
/// fingerprints, SHA-256 for modern MAC/signature protection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HashAlgorithm {
    Md5,
    Sha1,
    Sha256,
}

impl HashAlgorithm {
    pub fn output_len(self) -> usize {
        match self {
            HashAlgorithm::Md5 => 16,
            HashAlgorithm::Sha1 => 20,
            HashAlgorithm::Sha256 => 32,
        }
    }
}

/// The cryptographic backend a session is configured with.
///
/// This is a pure computation port: no key storage, no certificate
/// lookup. `Send`, not required to be `Sync` — a session owns one and
/// uses it from a single thread at a time.
pub trait CryptoProvider: Send {
    fn hash(&self, alg: HashAlgorithm, data: &[u8]) -> Vec<u8>;

    /// Derive a MAC key by iterated hashing of `password || salt`.
    ///
    /// Callers are responsible for enforcing the iteration-count ceiling
    /// before calling this — this port just does the hashing.
    fn derive_mac_key(
        &self,
        alg: HashAlgorithm,
        password: &[u8],
        salt: &[u8],
        iterations: u32,
    ) -> Vec<u8>;

    fn hmac(&self, alg: HashAlgorithm, key: &[u8], data: &[u8]) -> Vec<u8>;

    fn verify_hmac(&self, alg: HashAlgorithm, key: &[u8], data: &[u8], expected: &[u8]) -> bool {
        self.hmac(alg, key, data) == expected
    }

    /// Verify a raw signature over an already-computed digest.
    ///
    /// `public_key_der` is the signer's SubjectPublicKeyInfo DER (from
    /// [`CertificateHandle::spki_der`]).
    fn verify_signature(
        &self,
        public_key_der: &[u8],
        alg: HashAlgorithm,
        digest: &[u8],
        signature: &[u8],
    ) -> Result<bool, CmpError>;

    /// Sign an already-computed digest with the caller's own private key.
    ///
    /// The counterpart to [`CryptoProvider::verify_signature`], needed when
    /// a session protects its own outgoing messages with a signature
    /// rather than a MAC.
    fn sign_digest(
        &self,
        private_key_der: &[u8],
        alg: HashAlgorithm,
        digest: &[u8],
    ) -> Result<Vec<u8>, CmpError>;

    /// Unwrap an RSA PKCS#1 v1.5-wrapped content-encryption key with the
    /// recipient's private key.
    fn pkcs1v15_unwrap(&self, private_key_der: &[u8], wrapped: &[u8]) -> Result<Vec<u8>, CmpError>;

    /// Decrypt a CBC-mode ciphertext. Callers must validate that
    /// `ciphertext.len()` is a multiple of the cipher's block length
    /// before calling.
    fn cbc_decrypt(&self, key: &[u8], iv: &[u8], ciphertext: &[u8]) -> Result<Vec<u8>, CmpError>;

    fn random_bytes(&self, len: usize) -> Vec<u8>;
}
