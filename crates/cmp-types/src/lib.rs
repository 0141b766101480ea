//! # CMP Shared Types
//!
//! Error taxonomy, size-bounded newtypes, and small enums shared across
//! every crate in the CMP message-processing core.

pub mod constants;
pub mod errors;
pub mod failinfo;
pub mod ids;
pub mod role;
pub mod status;

pub use errors::{CmpError, PeerDetail};
pub use failinfo::{FailBit, FailInfoFlags, FailureClass};
pub use ids::OctetId;
pub use role::Role;
pub use status::PkiStatus;
