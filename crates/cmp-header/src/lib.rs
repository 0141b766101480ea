//! # Header Processor
//!
//! Reads and writes `PKIHeader`, tracks transaction ID/nonce chaining, and
//! applies the identity-selection rule.
//!

pub mod header;
pub mod oids;

pub use header::{
    check_identity_selected, encode, generate_octet_id, HeaderState, HeaderWriteParams,
    PkiHeader, ProtectionAlgorithm,
};
