//! `PKIStatus` values.

use serde::{Deserialize, Serialize};

/// Decoded `PKIStatus ::= INTEGER`. Values 0-6 are the ones RFC 4210 names;
/// anything else within the sane range is kept as `Other` so the decoder
/// never has to invent semantics the peer didn't assert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PkiStatus {
    Accepted,
    GrantedWithMods,
    Rejection,
    Waiting,
    RevocationWarning,
    RevocationNotification,
    KeyUpdateWarning,
    Other(i32),
}

impl PkiStatus {
    /// Only `Accepted`/`GrantedWithMods` count as a successful outcome.
    pub fn is_ok(self) -> bool {
        matches!(self, PkiStatus::Accepted | PkiStatus::GrantedWithMods)
    }

    pub fn raw(self) -> i32 {
        match self {
            PkiStatus::Accepted => 0,
            PkiStatus::GrantedWithMods => 1,
            PkiStatus::Rejection => 2,
            PkiStatus::Waiting => 3,
            PkiStatus::RevocationWarning => 4,
            PkiStatus::RevocationNotification => 5,
            PkiStatus::KeyUpdateWarning => 6,
            PkiStatus::Other(v) => v,
        }
    }
}

impl From<i32> for PkiStatus {
    fn from(value: i32) -> Self {
        match value {
            0 => PkiStatus::Accepted,
            1 => PkiStatus::GrantedWithMods,
            2 => PkiStatus::Rejection,
            3 => PkiStatus::Waiting,
            4 => PkiStatus::RevocationWarning,
            5 => PkiStatus::RevocationNotification,
            6 => PkiStatus::KeyUpdateWarning,
            other => PkiStatus::Other(other),
        }
    }
}
