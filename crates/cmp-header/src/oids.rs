//! Well-known OIDs the header processor recognises by text, so it never
//! has to special-case raw DER bytes.

/// `id-PasswordBasedMac`, the "Entrust-MAC" protection algorithm used to
/// distinguish MAC protection from signature protection.
pub const PASSWORD_BASED_MAC_OID: &str = "1 2 840 113533 7 66 13";

/// cryptlib's private enterprise arc, used as a `generalInfo` presence
/// marker some peers send to announce "I am the reference implementation".
pub const CRYPTLIB_PRESENCE_OID: &str = "1 3 6 1 4 1 3029 3 1 1";

/// `id-aa-signingCertificate`, carrying an `ESSCertID` used for signer
/// identification.
pub const ESS_CERT_ID_OID: &str = "1 2 840 113549 1 9 16 2 12";

/// PKIBoot informational OID recognised by the General message handler.
pub const PKI_BOOT_OID: &str = "1 3 6 1 5 5 7 4 13";

/// CA key update announcement, recognised the same way.
pub const CA_KEY_UPDATE_OID: &str = "1 3 6 1 5 5 7 4 14";
