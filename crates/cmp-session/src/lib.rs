//! Transaction Orchestrator: a client-driven CMP exchange built from the
//! lower-level wire codec (`cmp-asn1`, `cmp-header`, `cmp-body`), integrity
//! (`cmp-integrity`), and crypto/transport ports.

pub mod identity;
pub mod message;
pub mod oids;
pub mod pbm;
pub mod session;
pub mod transport;

pub use identity::{Identity, IssuedCertificate};
pub use message::{compose_protected, decode_message, encode_message, DecodedMessage};
pub use session::Session;
pub use transport::{Transport, TransportError};
