//! `error` PKIBody: returned to the caller without integrity
//! verification, so the caller can see why a peer rejected the exchange
//! even when the message fails integrity verification.

use cmp_asn1::{writer, Reader};
use cmp_status::PkiStatusInfo;
use cmp_types::{CmpError, PeerDetail};

/// `ErrorMsgContent ::= SEQUENCE { pKIStatusInfo PKIStatusInfo,
/// errorCode INTEGER OPTIONAL, errorDetails SEQUENCE OF UTF8String
/// OPTIONAL }`.
#[derive(Debug, Clone, PartialEq)]
pub struct ErrorBody {
    pub status: PkiStatusInfo,
    pub error_code: Option<i64>,
    pub error_detail: Option<String>,
}

pub fn decode_error(content: &[u8]) -> Result<ErrorBody, CmpError> {
    let mut outer = Reader::new(content);
    let mut r = outer.read_sequence()?;
    let status = PkiStatusInfo::decode(&mut r)?;

    let error_code = if r.peek_tag_opt() == Some(cmp_asn1::tag::INTEGER) {
        Some(r.read_integer()?)
    } else {
        None
    };

    let error_detail = if r.peek_tag_opt() == Some(cmp_asn1::tag::SEQUENCE) {
        let mut details = r.read_sequence()?;
        let mut first = None;
        while !details.is_empty() {
            let s = details.read_utf8_string()?;
            if first.is_none() {
                first = Some(s.to_string());
            }
        }
        first
    } else {
        None
    };

    Ok(ErrorBody { status, error_code, error_detail })
}

pub fn encode_error(error: &ErrorBody, out: &mut Vec<u8>) {
    writer::write_sequence(out, |seq| {
        error.status.encode(seq);
        if let Some(code) = error.error_code {
            writer::write_integer(code, seq);
        }
        if let Some(detail) = &error.error_detail {
            writer::write_sequence(seq, |details| {
                writer::write_utf8_string(detail, details);
            });
        }
    });
}

/// Turn a received `error` body into the taxonomy error the caller sees,
/// always marked `unauthenticated` since an `error` body is surfaced
/// without integrity verification having passed — callers must not treat
/// its content as authenticated.
pub fn to_cmp_error(error: &ErrorBody) -> CmpError {
    match error.status.check() {
        Ok(()) => CmpError::Failed {
            description: "peer sent an error body with an accepted status".to_string(),
            detail: unauthenticated_detail(error),
        },
        Err(mapped) => mark_unauthenticated(mapped, error),
    }
}

fn unauthenticated_detail(error: &ErrorBody) -> PeerDetail {
    PeerDetail {
        status: Some(error.status.status.raw()),
        fail_info: error.status.fail_info,
        peer_text: error
            .error_detail
            .clone()
            .or_else(|| error.status.status_string.clone()),
        unauthenticated: true,
    }
}

fn mark_unauthenticated(mapped: CmpError, error: &ErrorBody) -> CmpError {
    let detail = unauthenticated_detail(error);
    match mapped {
        CmpError::BadData { description, .. } => CmpError::BadData { description, detail },
        CmpError::Signature { description, .. } => CmpError::Signature { description, detail },
        CmpError::WrongKey { description, .. } => CmpError::WrongKey { description, detail },
        CmpError::Permission { description, .. } => CmpError::Permission { description, detail },
        CmpError::Invalid { description, .. } => CmpError::Invalid { description, detail },
        CmpError::Duplicate { description, .. } => CmpError::Duplicate { description, detail },
        CmpError::NotAvailable { description, .. } => CmpError::NotAvailable { description, detail },
        CmpError::Failed { description, .. } => CmpError::Failed { description, detail },
        timeout @ CmpError::Timeout { .. } => timeout,
    }
}
