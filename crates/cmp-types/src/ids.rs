//! Size-bounded octet strings used as transaction IDs and nonces.

use std::fmt;

use crate::constants::{GENERATED_ID_LEN, MAX_ID_LEN, MIN_ID_LEN};
use crate::errors::CmpError;

/// An opaque octet string in the 1..=64 byte range used for transaction IDs
/// and sender/recipient nonces.
///
/// Transaction ID, sender nonce, and recipient nonce all share this one
/// size invariant; modeling them as a single validated newtype means the
/// bound is enforced once, at construction, rather than at every call
/// site that reads one off the wire.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct OctetId(Vec<u8>);

impl OctetId {
    /// Validate and wrap a buffer read off the wire.
    pub fn new(bytes: Vec<u8>) -> Result<Self, CmpError> {
        if bytes.len() < MIN_ID_LEN || bytes.len() > MAX_ID_LEN {
            return Err(CmpError::bad_data(format!(
                "octet id length {} outside [{MIN_ID_LEN}, {MAX_ID_LEN}]",
                bytes.len()
            )));
        }
        Ok(Self(bytes))
    }

    /// Wrap freshly generated random bytes. The caller (cmp-header, via the
    /// `cmp-crypto` random source) is responsible for supplying exactly
    /// `GENERATED_ID_LEN` bytes; this is a debug assertion rather than a
    /// runtime error because it only guards our own code, not wire input.
    pub fn from_generated(bytes: Vec<u8>) -> Self {
        debug_assert_eq!(bytes.len(), GENERATED_ID_LEN);
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }
}

impl AsRef<[u8]> for OctetId {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for OctetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "OctetId(")?;
        for b in &self.0 {
            write!(f, "{b:02x}")?;
        }
        write!(f, ")")
    }
}
