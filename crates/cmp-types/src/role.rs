//! Session role.

/// Which side of the exchange a `Session` plays. Fixed for the session's
/// lifetime once chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// End entity requesting certificates.
    Client,
    /// Certification authority / registration authority responding.
    Server,
}
