//! `CryptoProvider` backed by commodity RustCrypto crates, so the
//! workspace builds and the integration suite runs end-to-end without
//! requiring callers to bring their own backend.

use aes::cipher::{block_padding::Pkcs7, BlockDecryptMut, KeyIvInit};
use cmp_types::CmpError;
use hmac::{Hmac, Mac};
use md5::Md5;
use rand::RngCore;
use rsa::pkcs1v15::Pkcs1v15Sign;
use rsa::pkcs8::{DecodePrivateKey, DecodePublicKey};
use rsa::{Pkcs1v15Encrypt, RsaPrivateKey, RsaPublicKey};
use sha1::Sha1;
use sha2::{Digest, Sha256};

use crate::ports::crypto::{CryptoProvider, HashAlgorithm};

type Aes128CbcDec = cbc::Decryptor<aes::Aes128>;
type Aes192CbcDec = cbc::Decryptor<aes::Aes192>;
type Aes256CbcDec = cbc::Decryptor<aes::Aes256>;

#[derive(Debug, Default, Clone, Copy)]
pub struct RustCryptoProvider;

impl RustCryptoProvider {
    pub fn new() -> Self {
        Self
    }
}

impl CryptoProvider for RustCryptoProvider {
    fn hash(&self, alg: HashAlgorithm, data: &[u8]) -> Vec<u8> {
        match alg {
            HashAlgorithm::Md5 => Md5::digest(data).to_vec(),
            HashAlgorithm::Sha1 => Sha1::digest(data).to_vec(),
            HashAlgorithm::Sha256 => Sha256::digest(data).to_vec(),
        }
    }

    fn derive_mac_key(
        &self,
        alg: HashAlgorithm,
        password: &[u8],
        salt: &[u8],
        iterations: u32,
    ) -> Vec<u8> {
        let mut input = Vec::with_capacity(password.len() + salt.len());
        input.extend_from_slice(password);
        input.extend_from_slice(salt);

        let count = iterations.max(1);
        let mut digest = self.hash(alg, &input);
        for _ in 1..count {
            digest = self.hash(alg, &digest);
        }
        digest
    }

    fn hmac(&self, alg: HashAlgorithm, key: &[u8], data: &[u8]) -> Vec<u8> {
        match alg {
            HashAlgorithm::Md5 => {
                let mut mac = Hmac::<Md5>::new_from_slice(key).expect("HMAC accepts any key length");
                mac.update(data);
                mac.finalize().into_bytes().to_vec()
            }
            HashAlgorithm::Sha1 => {
                let mut mac = Hmac::<Sha1>::new_from_slice(key).expect("HMAC accepts any key length");
                mac.update(data);
                mac.finalize().into_bytes().to_vec()
            }
            HashAlgorithm::Sha256 => {
                let mut mac =
                    Hmac::<Sha256>::new_from_slice(key).expect("HMAC accepts any key length");
                mac.update(data);
                mac.finalize().into_bytes().to_vec()
            }
        }
    }

    fn verify_signature(
        &self,
        public_key_der: &[u8],
        alg: HashAlgorithm,
        digest: &[u8],
        signature: &[u8],
    ) -> Result<bool, CmpError> {
        let key = RsaPublicKey::from_public_key_der(public_key_der)
            .map_err(|e| CmpError::bad_data(format!("invalid SubjectPublicKeyInfo: {e}")))?;
        let scheme = match alg {
            HashAlgorithm::Md5 => {
                return Err(CmpError::bad_data("MD5 is not a supported signature digest"));
            }
            HashAlgorithm::Sha1 => Pkcs1v15Sign::new::<Sha1>(),
            HashAlgorithm::Sha256 => Pkcs1v15Sign::new::<Sha256>(),
        };
        Ok(key.verify(scheme, digest, signature).is_ok())
    }

    fn sign_digest(
        &self,
        private_key_der: &[u8],
        alg: HashAlgorithm,
        digest: &[u8],
    ) -> Result<Vec<u8>, CmpError> {
        let key = RsaPrivateKey::from_pkcs8_der(private_key_der)
            .map_err(|e| CmpError::bad_data(format!("invalid PKCS#8 private key: {e}")))?;
        let scheme = match alg {
            HashAlgorithm::Md5 => {
                return Err(CmpError::bad_data("MD5 is not a supported signature digest"));
            }
            HashAlgorithm::Sha1 => Pkcs1v15Sign::new::<Sha1>(),
            HashAlgorithm::Sha256 => Pkcs1v15Sign::new::<Sha256>(),
        };
        key.sign(scheme, digest)
            .map_err(|e| CmpError::bad_data(format!("signing failed: {e}")))
    }

    fn pkcs1v15_unwrap(&self, private_key_der: &[u8], wrapped: &[u8]) -> Result<Vec<u8>, CmpError> {
        let key = RsaPrivateKey::from_pkcs8_der(private_key_der)
            .map_err(|e| CmpError::bad_data(format!("invalid PKCS#8 private key: {e}")))?;
        key.decrypt(Pkcs1v15Encrypt, wrapped)
            .map_err(|_| CmpError::bad_data("PKCS#1 v1.5 key unwrap failed"))
    }

    fn cbc_decrypt(&self, key: &[u8], iv: &[u8], ciphertext: &[u8]) -> Result<Vec<u8>, CmpError> {
        if ciphertext.is_empty() || ciphertext.len() % 16 != 0 {
            return Err(CmpError::bad_data("ciphertext is not a multiple of the block length"));
        }
        let mut buf = ciphertext.to_vec();
        let plaintext: &[u8] = match key.len() {
            16 => {
                let dec = Aes128CbcDec::new_from_slices(key, iv)
                    .map_err(|_| CmpError::bad_data("invalid AES-128 key/IV length"))?;
                dec.decrypt_padded_mut::<Pkcs7>(&mut buf)
                    .map_err(|_| CmpError::bad_data("CBC padding invalid"))?
            }
            24 => {
                let dec = Aes192CbcDec::new_from_slices(key, iv)
                    .map_err(|_| CmpError::bad_data("invalid AES-192 key/IV length"))?;
                dec.decrypt_padded_mut::<Pkcs7>(&mut buf)
                    .map_err(|_| CmpError::bad_data("CBC padding invalid"))?
            }
            32 => {
                let dec = Aes256CbcDec::new_from_slices(key, iv)
                    .map_err(|_| CmpError::bad_data("invalid AES-256 key/IV length"))?;
                dec.decrypt_padded_mut::<Pkcs7>(&mut buf)
                    .map_err(|_| CmpError::bad_data("CBC padding invalid"))?
            }
            other => {
                return Err(CmpError::bad_data(format!("unsupported CEK length {other}")));
            }
        };
        Ok(plaintext.to_vec())
    }

    fn random_bytes(&self, len: usize) -> Vec<u8> {
        let mut buf = vec![0u8; len];
        rand::thread_rng().fill_bytes(&mut buf);
        buf
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_lengths_match_algorithm() {
        let provider = RustCryptoProvider::new();
        assert_eq!(provider.hash(HashAlgorithm::Md5, b"abc").len(), 16);
        assert_eq!(provider.hash(HashAlgorithm::Sha1, b"abc").len(), 20);
        assert_eq!(provider.hash(HashAlgorithm::Sha256, b"abc").len(), 32);
    }

    #[test]
    fn mac_derivation_is_deterministic() {
        let provider = RustCryptoProvider::new();
        let a = provider.derive_mac_key(HashAlgorithm::Sha1, b"hunter2", b"salt", 100);
        let b = provider.derive_mac_key(HashAlgorithm::Sha1, b"hunter2", b"salt", 100);
        assert_eq!(a, b);
        let c = provider.derive_mac_key(HashAlgorithm::Sha1, b"hunter2", b"salt", 101);
        assert_ne!(a, c);
    }

    #[test]
    fn hmac_round_trip_verifies() {
        let provider = RustCryptoProvider::new();
        let key = b"key-material";
        let tag = provider.hmac(HashAlgorithm::Sha256, key, b"message body");
        assert!(provider.verify_hmac(HashAlgorithm::Sha256, key, b"message body", &tag));
        assert!(!provider.verify_hmac(HashAlgorithm::Sha256, key, b"tampered body", &tag));
    }

    #[test]
    fn cbc_decrypt_rejects_misaligned_ciphertext() {
        let provider = RustCryptoProvider::new();
        let key = [0u8; 16];
        let iv = [0u8; 16];
        assert!(provider.cbc_decrypt(&key, &iv, &[0u8; 5]).is_err());
    }

    #[test]
    fn sign_digest_round_trips_with_verify_signature() {
        use rsa::pkcs8::{EncodePrivateKey, EncodePublicKey};

        let provider = RustCryptoProvider::new();
        let mut rng = rand::thread_rng();
        let private_key = RsaPrivateKey::new(&mut rng, 2048).expect("key generation");
        let public_key = RsaPublicKey::from(&private_key);
        let private_der = private_key.to_pkcs8_der().unwrap().as_bytes().to_vec();
        let public_der = public_key.to_public_key_der().unwrap().as_bytes().to_vec();

        let digest = provider.hash(HashAlgorithm::Sha256, b"protected part");
        let signature =
            provider.sign_digest(&private_der, HashAlgorithm::Sha256, &digest).unwrap();

        assert!(provider
            .verify_signature(&public_der, HashAlgorithm::Sha256, &digest, &signature)
            .unwrap());
    }

    #[test]
    fn sign_digest_rejects_md5() {
        use rsa::pkcs8::EncodePrivateKey;

        let provider = RustCryptoProvider::new();
        let mut rng = rand::thread_rng();
        let private_key = RsaPrivateKey::new(&mut rng, 2048).expect("key generation");
        let private_der = private_key.to_pkcs8_der().unwrap().as_bytes().to_vec();
        assert!(provider.sign_digest(&private_der, HashAlgorithm::Md5, &[0u8; 16]).is_err());
    }
}
