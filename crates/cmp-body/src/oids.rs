//! Well-known OIDs the general-message handler recognises by text.

/// PKIBoot informational OID recognised by the General message handler.
pub const PKI_BOOT_OID: &str = "1 3 6 1 5 5 7 4 13";

/// CA key update announcement, recognised the same way.
pub const CA_KEY_UPDATE_OID: &str = "1 3 6 1 5 5 7 4 14";
