//! Decode and encode `PKIStatusInfo` and map it onto the host error
//! taxonomy.
//!

use cmp_asn1::{tag, writer, Reader};
use cmp_types::{CmpError, FailInfoFlags, FailureClass, PeerDetail, PkiStatus};
use serde::{Deserialize, Serialize};

/// A decoded `PKIStatusInfo ::= SEQUENCE { status INTEGER, statusString
/// SEQUENCE OF UTF8String OPTIONAL, failInfo BIT STRING OPTIONAL }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PkiStatusInfo {
    pub status: PkiStatus,
    /// Only the first `statusString` entry is retained.
    pub status_string: Option<String>,
    /// Set when `statusString` carried more than one entry, all but the
    /// first silently discarded.
    pub extra_status_strings_discarded: bool,
    pub fail_info: Option<FailInfoFlags>,
}

impl PkiStatusInfo {
    /// Decode from the current position of `r`.
    pub fn decode(r: &mut Reader) -> Result<Self, CmpError> {
        let mut seq = r.read_sequence()?;
        let status = PkiStatus::from(seq.read_integer()? as i32);

        let mut status_string = None;
        let mut extra_status_strings_discarded = false;
        if seq.peek_tag_opt() == Some(tag::SEQUENCE) {
            let mut strings = seq.read_sequence()?;
            let mut first = true;
            while !strings.is_empty() {
                let s = strings.read_utf8_string()?;
                if first {
                    status_string = Some(s.to_string());
                    first = false;
                } else {
                    extra_status_strings_discarded = true;
                }
            }
        }

        let fail_info = if seq.peek_tag_opt() == Some(tag::BIT_STRING) {
            let (_, bytes) = seq.read_bit_string()?;
            Some(decode_fail_info(bytes))
        } else {
            None
        };

        Ok(Self { status, status_string, extra_status_strings_discarded, fail_info })
    }

    /// Encode this status info as a `PKIStatusInfo` SEQUENCE. Only ever
    /// emits zero or one `statusString` entry — this core never composes
    /// multi-string status responses.
    pub fn encode(&self, out: &mut Vec<u8>) {
        writer::write_sequence(out, |seq| {
            writer::write_integer(self.status.raw() as i64, seq);
            if let Some(s) = &self.status_string {
                writer::write_sequence(seq, |strings| {
                    writer::write_utf8_string(s, strings);
                });
            }
            if let Some(flags) = self.fail_info {
                writer::write_bit_string(0, &encode_fail_info(flags), seq);
            }
        });
    }

    /// `Ok(())` when `status` is `accepted` or `grantedWithMods`; otherwise
    /// the mapped taxonomy error with peer status/fail-info/text attached.
    ///
    pub fn check(&self) -> Result<(), CmpError> {
        if self.status.is_ok() {
            return Ok(());
        }
        let detail = PeerDetail {
            status: Some(self.status.raw()),
            fail_info: self.fail_info,
            peer_text: self.status_string.clone(),
            unauthenticated: false,
        };
        let description = format!("peer returned non-accepted status {}", self.status.raw());
        let class = self.fail_info.and_then(FailInfoFlags::highest_priority_class);
        Err(match class {
            Some(FailureClass::NotAvailable) => CmpError::NotAvailable { description, detail },
            Some(FailureClass::WrongKey) => CmpError::WrongKey { description, detail },
            Some(FailureClass::Permission) => CmpError::Permission { description, detail },
            Some(FailureClass::Invalid) => CmpError::Invalid { description, detail },
            Some(FailureClass::Duplicate) => CmpError::Duplicate { description, detail },
            Some(FailureClass::BadData) => CmpError::BadData { description, detail },
            None => CmpError::Failed { description, detail },
        })
    }
}

fn decode_fail_info(bytes: &[u8]) -> FailInfoFlags {
    let mut flags = FailInfoFlags::empty();
    for (byte_idx, byte) in bytes.iter().enumerate() {
        for bit_in_byte in 0..8u8 {
            let index = byte_idx as u8 * 8 + bit_in_byte;
            let mask = 0x80u8 >> bit_in_byte;
            if byte & mask != 0 {
                if let Some(bit) = FailInfoFlags::bit_at(index) {
                    flags.set(bit);
                }
            }
        }
    }
    flags
}

fn encode_fail_info(flags: FailInfoFlags) -> Vec<u8> {
    // 27 named bits need 4 bytes (ceil(27 / 8)).
    let mut bytes = vec![0u8; 4];
    for index in 0u8..27 {
        if let Some(bit) = FailInfoFlags::bit_at(index) {
            if flags.is_set(bit) {
                let byte_idx = (index / 8) as usize;
                let mask = 0x80u8 >> (index % 8);
                bytes[byte_idx] |= mask;
            }
        }
    }
    while bytes.last() == Some(&0) && bytes.len() > 1 {
        bytes.pop();
    }
    bytes
}

#[cfg(test)]
mod tests {
    use super::*;
    use cmp_types::FailBit;

    fn build(status: i32, text: Option<&str>, fail: Option<FailBit>) -> Vec<u8> {
        let mut out = Vec::new();
        writer::write_sequence(&mut out, |seq| {
            writer::write_integer(status as i64, seq);
            if let Some(t) = text {
                writer::write_sequence(seq, |strings| writer::write_utf8_string(t, strings));
            }
            if let Some(bit) = fail {
                let mut flags = FailInfoFlags::empty();
                flags.set(bit);
                writer::write_bit_string(0, &encode_fail_info(flags), seq);
            }
        });
        out
    }

    #[test]
    fn accepted_status_checks_ok() {
        let der = build(0, None, None);
        let mut r = Reader::new(&der);
        let info = PkiStatusInfo::decode(&mut r).unwrap();
        assert!(info.check().is_ok());
    }

    #[test]
    fn rejection_with_bad_cert_template_maps_to_invalid() {
        let der = build(2, Some("template rejected"), Some(FailBit::BadCertTemplate));
        let mut r = Reader::new(&der);
        let info = PkiStatusInfo::decode(&mut r).unwrap();
        match info.check() {
            Err(CmpError::Invalid { detail, .. }) => {
                assert_eq!(detail.peer_text.as_deref(), Some("template rejected"));
            }
            other => panic!("expected Invalid, got {other:?}"),
        }
    }

    #[test]
    fn only_first_status_string_is_kept() {
        let mut out = Vec::new();
        writer::write_sequence(&mut out, |seq| {
            writer::write_integer(2, seq);
            writer::write_sequence(seq, |strings| {
                writer::write_utf8_string("first", strings);
                writer::write_utf8_string("second", strings);
            });
        });
        let mut r = Reader::new(&out);
        let info = PkiStatusInfo::decode(&mut r).unwrap();
        assert_eq!(info.status_string.as_deref(), Some("first"));
        assert!(info.extra_status_strings_discarded);
    }

    #[test]
    fn fail_info_round_trips_through_encode() {
        let mut flags = FailInfoFlags::empty();
        flags.set(FailBit::BadAlg);
        let info = PkiStatusInfo {
            status: PkiStatus::Rejection,
            status_string: None,
            extra_status_strings_discarded: false,
            fail_info: Some(flags),
        };
        let mut out = Vec::new();
        info.encode(&mut out);
        let mut r = Reader::new(&out);
        let decoded = PkiStatusInfo::decode(&mut r).unwrap();
        assert_eq!(decoded.fail_info, Some(flags));
    }

    #[test]
    fn no_fail_info_maps_to_generic_failed() {
        let der = build(2, None, None);
        let mut r = Reader::new(&der);
        let info = PkiStatusInfo::decode(&mut r).unwrap();
        assert!(matches!(info.check(), Err(CmpError::Failed { .. })));
    }
}
