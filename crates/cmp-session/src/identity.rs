//! What a session authenticates itself (and its peer) with.
//!
//! protection), §4.6 caller-facing `new_session(role, ..., identity)`.

use cmp_body::domain::CertificateDelivery;
use cmp_crypto::CertificateHandle;
use cmp_integrity::MacParams;

/// How this session protects its own outgoing messages and identifies
/// itself to the peer.
///
/// path, an ESSCertID/subject for the signature path).
pub enum Identity {
    /// Password-based MAC protection (the "Entrust-MAC" path).
    Mac {
        /// Carried as the header's `senderKID`, identifying which shared
        /// secret the peer should look up.
        reference: Vec<u8>,
        password: Vec<u8>,
        params: MacParams,
    },
    /// Signature-based protection.
    Signature {
        /// Carried as the header's `senderKID`, when the peer expects one
        /// in addition to (or instead of) the ESSCertID `generalInfo`
        /// entry.
        own_sender_kid: Option<Vec<u8>>,
        signing_certificate: Box<dyn CertificateHandle + Send>,
        signing_key_der: Vec<u8>,
        /// The certificate this session trusts to verify the peer's
        /// protection. X.509 path validation is out of this core's scope,
        /// so the expected signer is supplied up front rather than
        /// resolved dynamically from `extraCerts`.
        peer_certificate: Box<dyn CertificateHandle + Send>,
    },
}

/// The result of a successful `ir`/`cr`/`kur` exchange.
///
/// The delivery form is handed back un-recovered: recovering a
/// `LegacyEncrypted` or `CmsEnveloped` delivery needs inputs (a private
/// key, an envelope opener) this session's caller-facing API does not
/// accept, so recovery is left to [`cmp_body::response::recover_certificate`],
/// called directly by the caller once those inputs are available.
///
/// `caPubs` and `extraCerts` fields are transferred to the caller upon
/// successful transaction").
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedCertificate {
    pub delivery: CertificateDelivery,
    /// Raw `extraCerts` entries carried on the final `ip`/`cp`/`kup`
    /// message, transferred to the caller as-is.
    pub ca_certs_der: Vec<Vec<u8>>,
}
