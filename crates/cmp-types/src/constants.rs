//! Protocol-wide size and timing bounds.

/// DER encoding of an `OBJECT IDENTIFIER` must be between tag+length+1 arc
/// byte (5) and this many bytes, inclusive. Beyond this the codec rejects
/// the input as malformed rather than walking an unbounded buffer.
pub const MAX_OID_SIZE: usize = 64;

/// Minimum size of a DER `OBJECT IDENTIFIER` TLV (tag + length + one
/// content byte covering both initial arcs).
pub const MIN_OID_SIZE: usize = 5;

/// Hard upper bound on MAC password-hash iteration counts. A peer claiming
/// more than this is rejected before any hashing begins.
pub const MAX_PASSWORD_ITERATIONS: u32 = 10_000;

/// Transaction IDs and nonces must be within `[MIN_ID_LEN, MAX_ID_LEN]`
/// octets on the wire.
pub const MIN_ID_LEN: usize = 1;
pub const MAX_ID_LEN: usize = 64;

/// Length of a freshly generated transaction ID or nonce.
pub const GENERATED_ID_LEN: usize = 16;

/// Length of the SHA-1 fingerprint carried in an `ESSCertID`.
pub const ESS_CERT_ID_FINGERPRINT_LEN: usize = 20;

/// Default and minimum session timeout budgets.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const MIN_TIMEOUT_SECS: u64 = 5;

/// Bounded range for dotted/space-separated OID text input.
pub const MIN_OID_TEXT_LEN: usize = 1;
pub const MAX_OID_TEXT_LEN: usize = 256;

/// Each decoded OID arc (beyond the first combined byte) is bounded to keep
/// decoding constant-cost and to make the encoder/decoder symmetric.
pub const MAX_ARC_VALUE: u64 = 1 << 28;
