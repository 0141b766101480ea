//! MAC-based integrity context: iterated-hash key derivation plus the
//! alternate-slot caching needed for peers that vary MAC parameters
//! across a single exchange.

use cmp_crypto::{CryptoProvider, HashAlgorithm};
use cmp_types::constants::MAX_PASSWORD_ITERATIONS;
use cmp_types::{CmpError, FailBit, FailInfoFlags, PeerDetail};

/// The parameters that uniquely key a derived MAC instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MacParams {
    pub salt: Vec<u8>,
    pub iterations: u32,
    pub hash_alg: HashAlgorithm,
    pub mac_alg: HashAlgorithm,
}

/// A MAC context: parameters plus the derived key.
#[derive(Debug, Clone)]
pub struct MacContext {
    pub params: MacParams,
    pub key: Vec<u8>,
}

impl MacContext {
    /// Derive a new MAC context from a password, enforcing the iteration
    /// ceiling before any hashing happens: exceeding
    /// [`MAX_PASSWORD_ITERATIONS`] yields `BadData` with the `BadAlg`
    /// failure flag set.
    pub fn derive(
        crypto: &impl CryptoProvider,
        password: &[u8],
        params: MacParams,
    ) -> Result<Self, CmpError> {
        if params.iterations == 0 || params.iterations > MAX_PASSWORD_ITERATIONS {
            let mut fail_info = FailInfoFlags::empty();
            fail_info.set(FailBit::BadAlg);
            return Err(CmpError::bad_data_with(
                format!(
                    "MAC iteration count {} outside [1, {}]",
                    params.iterations, MAX_PASSWORD_ITERATIONS
                ),
                PeerDetail { fail_info: Some(fail_info), ..PeerDetail::none() },
            ));
        }
        let key = crypto.derive_mac_key(
            params.hash_alg,
            password,
            &params.salt,
            params.iterations,
        );
        Ok(Self { params, key })
    }

    pub fn mac(&self, crypto: &impl CryptoProvider, data: &[u8]) -> Vec<u8> {
        crypto.hmac(self.params.mac_alg, &self.key, data)
    }

    pub fn verify(&self, crypto: &impl CryptoProvider, data: &[u8], tag: &[u8]) -> bool {
        crypto.verify_hmac(self.params.mac_alg, &self.key, data, tag)
    }
}

/// Holds the session's primary MAC context plus, optionally, one alternate
/// derived for a peer that varies MAC parameters per message. A changed
/// set of parameters derives into the alternate slot without replacing
/// the primary; if a later message reverts to the primary parameters,
/// the primary is reused rather than re-derived.
#[derive(Debug, Clone)]
pub struct MacSlots {
    pub primary: MacContext,
    pub alternate: Option<MacContext>,
}

impl MacSlots {
    pub fn new(primary: MacContext) -> Self {
        Self { primary, alternate: None }
    }

    /// Returns the context matching `params`, deriving and caching it as
    /// the alternate slot if neither the primary nor an existing alternate
    /// match.
    pub fn resolve(
        &mut self,
        crypto: &impl CryptoProvider,
        password: &[u8],
        params: MacParams,
    ) -> Result<&MacContext, CmpError> {
        if self.primary.params == params {
            return Ok(&self.primary);
        }
        if let Some(alt) = &self.alternate {
            if alt.params == params {
                return Ok(self.alternate.as_ref().unwrap());
            }
        }
        tracing::debug!("deriving alternate MAC context for changed parameters");
        let fresh = MacContext::derive(crypto, password, params)?;
        self.alternate = Some(fresh);
        Ok(self.alternate.as_ref().unwrap())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cmp_crypto::RustCryptoProvider;

    fn params(iterations: u32) -> MacParams {
        MacParams {
            salt: vec![1, 2, 3, 4],
            iterations,
            hash_alg: HashAlgorithm::Sha1,
            mac_alg: HashAlgorithm::Sha256,
        }
    }

    #[test]
    fn rejects_iteration_count_above_ceiling() {
        let crypto = RustCryptoProvider::new();
        let err = MacContext::derive(&crypto, b"pw", params(MAX_PASSWORD_ITERATIONS + 1))
            .unwrap_err();
        assert!(matches!(err, CmpError::BadData { .. }));
    }

    #[test]
    fn alternate_slot_is_reused_on_revert() {
        let crypto = RustCryptoProvider::new();
        let primary = MacContext::derive(&crypto, b"pw", params(10)).unwrap();
        let mut slots = MacSlots::new(primary);

        let alt_params = params(20);
        slots.resolve(&crypto, b"pw", alt_params.clone()).unwrap();
        assert!(slots.alternate.is_some());

        // Revert to primary parameters: resolve must return the primary,
        // not re-derive or touch the alternate slot's identity.
        let primary_params = slots.primary.params.clone();
        let resolved = slots.resolve(&crypto, b"pw", primary_params.clone()).unwrap();
        assert_eq!(resolved.params, primary_params);
    }
}
