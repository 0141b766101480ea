//! `PKIFailureInfo` bit flags and their mapping onto the host error
//! taxonomy.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Bit positions of `PKIFailureInfo ::= BIT STRING`, per RFC 4210 §5.2.3.
/// Bit 0 is the most-significant bit of the BIT STRING as transmitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum FailBit {
    BadAlg = 0,
    BadMessageCheck = 1,
    BadRequest = 2,
    BadTime = 3,
    BadCertId = 4,
    BadDataFormat = 5,
    WrongAuthority = 6,
    IncorrectData = 7,
    MissingTimeStamp = 8,
    BadPop = 9,
    CertRevoked = 10,
    CertConfirmed = 11,
    WrongIntegrity = 12,
    BadRecipientNonce = 13,
    TimeNotAvailable = 14,
    UnacceptedPolicy = 15,
    UnacceptedExtension = 16,
    AddInfoNotAvailable = 17,
    BadSenderNonce = 18,
    BadCertTemplate = 19,
    SignerNotTrusted = 20,
    TransactionIdInUse = 21,
    UnsupportedVersion = 22,
    NotAuthorized = 23,
    SystemUnavail = 24,
    SystemFailure = 25,
    DuplicateCertReq = 26,
}

impl FailBit {
    const ALL: [FailBit; 27] = [
        FailBit::BadAlg,
        FailBit::BadMessageCheck,
        FailBit::BadRequest,
        FailBit::BadTime,
        FailBit::BadCertId,
        FailBit::BadDataFormat,
        FailBit::WrongAuthority,
        FailBit::IncorrectData,
        FailBit::MissingTimeStamp,
        FailBit::BadPop,
        FailBit::CertRevoked,
        FailBit::CertConfirmed,
        FailBit::WrongIntegrity,
        FailBit::BadRecipientNonce,
        FailBit::TimeNotAvailable,
        FailBit::UnacceptedPolicy,
        FailBit::UnacceptedExtension,
        FailBit::AddInfoNotAvailable,
        FailBit::BadSenderNonce,
        FailBit::BadCertTemplate,
        FailBit::SignerNotTrusted,
        FailBit::TransactionIdInUse,
        FailBit::UnsupportedVersion,
        FailBit::NotAuthorized,
        FailBit::SystemUnavail,
        FailBit::SystemFailure,
        FailBit::DuplicateCertReq,
    ];

    fn name(self) -> &'static str {
        match self {
            FailBit::BadAlg => "badAlg",
            FailBit::BadMessageCheck => "badMessageCheck",
            FailBit::BadRequest => "badRequest",
            FailBit::BadTime => "badTime",
            FailBit::BadCertId => "badCertId",
            FailBit::BadDataFormat => "badDataFormat",
            FailBit::WrongAuthority => "wrongAuthority",
            FailBit::IncorrectData => "incorrectData",
            FailBit::MissingTimeStamp => "missingTimeStamp",
            FailBit::BadPop => "badPOP",
            FailBit::CertRevoked => "certRevoked",
            FailBit::CertConfirmed => "certConfirmed",
            FailBit::WrongIntegrity => "wrongIntegrity",
            FailBit::BadRecipientNonce => "badRecipientNonce",
            FailBit::TimeNotAvailable => "timeNotAvailable",
            FailBit::UnacceptedPolicy => "unacceptedPolicy",
            FailBit::UnacceptedExtension => "unacceptedExtension",
            FailBit::AddInfoNotAvailable => "addInfoNotAvailable",
            FailBit::BadSenderNonce => "badSenderNonce",
            FailBit::BadCertTemplate => "badCertTemplate",
            FailBit::SignerNotTrusted => "signerNotTrusted",
            FailBit::TransactionIdInUse => "transactionIdInUse",
            FailBit::UnsupportedVersion => "unsupportedVersion",
            FailBit::NotAuthorized => "notAuthorized",
            FailBit::SystemUnavail => "systemUnavail",
            FailBit::SystemFailure => "systemFailure",
            FailBit::DuplicateCertReq => "duplicateCertReq",
        }
    }
}

/// The host taxonomy class a `FailInfoFlags` set maps to, per the
/// priority order [`FailInfoFlags::highest_priority_class`] implements.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureClass {
    NotAvailable,
    WrongKey,
    Permission,
    Invalid,
    Duplicate,
    BadData,
}

/// A decoded `PKIFailureInfo` bit set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FailInfoFlags(u32);

impl FailInfoFlags {
    pub fn empty() -> Self {
        Self(0)
    }

    pub fn from_bits(bits: u32) -> Self {
        Self(bits)
    }

    pub fn bits(self) -> u32 {
        self.0
    }

    pub fn set(&mut self, bit: FailBit) {
        self.0 |= 1 << (bit as u32);
    }

    pub fn is_set(self, bit: FailBit) -> bool {
        self.0 & (1 << (bit as u32)) != 0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    fn set_bits(self) -> Vec<FailBit> {
        FailBit::ALL.iter().copied().filter(|b| self.is_set(*b)).collect()
    }

    /// Look up the `FailBit` at a given BIT STRING position (0 = most
    /// significant bit of the first content byte). Positions beyond 26
    /// are unassigned and return `None`.
    pub fn bit_at(index: u8) -> Option<FailBit> {
        FailBit::ALL.get(index as usize).copied()
    }

    /// Map the highest-priority failure class present to a host error
    /// taxonomy class, in priority order:
    /// algorithm not available > wrong key > permission > invalid >
    /// duplicate > bad data > generic failure.
    pub fn highest_priority_class(self) -> Option<FailureClass> {
        if self.is_set(FailBit::BadAlg) {
            return Some(FailureClass::NotAvailable);
        }
        if self.is_set(FailBit::BadMessageCheck)
            || self.is_set(FailBit::BadPop)
            || self.is_set(FailBit::WrongIntegrity)
        {
            return Some(FailureClass::WrongKey);
        }
        if self.is_set(FailBit::NotAuthorized)
            || self.is_set(FailBit::BadRequest)
            || self.is_set(FailBit::SignerNotTrusted)
        {
            return Some(FailureClass::Permission);
        }
        if self.is_set(FailBit::BadCertTemplate) || self.is_set(FailBit::UnacceptedPolicy) {
            return Some(FailureClass::Invalid);
        }
        if self.is_set(FailBit::TransactionIdInUse) || self.is_set(FailBit::DuplicateCertReq) {
            return Some(FailureClass::Duplicate);
        }
        if self.is_set(FailBit::BadDataFormat) {
            return Some(FailureClass::BadData);
        }
        if self.is_empty() {
            None
        } else {
            // A failure bit is set but it isn't one of the classes above
            // (e.g. badTime, certRevoked) — fall through to the generic
            // catch-all at the call site.
            None
        }
    }

    /// Textual form listing which bit is set, or all bits in binary when
    /// more than one is set.
    pub fn to_text(self) -> String {
        let bits = self.set_bits();
        match bits.as_slice() {
            [] => String::new(),
            [single] => format!("failure bit {}: {}", *single as u8, single.name()),
            many => {
                let mut s = String::from("multiple failure bits set: ");
                for (i, b) in many.iter().enumerate() {
                    if i > 0 {
                        s.push_str(", ");
                    }
                    s.push_str(b.name());
                }
                s
            }
        }
    }
}

impl fmt::Display for FailInfoFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_text())
    }
}
