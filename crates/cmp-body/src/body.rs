//! `PKIBody` CHOICE: dispatch on the implicit tag number to the right
//! variant decoder/encoder.

use cmp_asn1::{tag, writer, Reader};
use cmp_status::PkiStatusInfo;
use cmp_types::CmpError;

use crate::body_tag;
use crate::confirm::CertConfirmation;
use crate::domain::{CertRequest, CertResponseEntry, InfoTypeAndValue, RevocationTarget};
use crate::error::ErrorBody;
use crate::{confirm, error, general, requests, response};

/// A decoded `PKIBody`, covering every variant this core processes.
#[derive(Debug, Clone, PartialEq)]
pub enum PkiBody {
    Ir(Vec<CertRequest>),
    Cr(Vec<CertRequest>),
    Kur(Vec<CertRequest>),
    P10cr(Vec<u8>),
    Rr(RevocationTarget),
    Ip(Vec<CertResponseEntry>),
    Cp(Vec<CertResponseEntry>),
    Kup(Vec<CertResponseEntry>),
    Rp(PkiStatusInfo),
    CertConf(Option<CertConfirmation>),
    PkiConf,
    Genm(Vec<InfoTypeAndValue>),
    Genp(Vec<InfoTypeAndValue>),
    Error(ErrorBody),
}

impl PkiBody {
    /// The `PKIBody` CHOICE tag number this variant is carried under.
    pub fn tag(&self) -> u8 {
        match self {
            PkiBody::Ir(_) => body_tag::IR,
            PkiBody::Cr(_) => body_tag::CR,
            PkiBody::Kur(_) => body_tag::KUR,
            PkiBody::P10cr(_) => body_tag::P10CR,
            PkiBody::Rr(_) => body_tag::RR,
            PkiBody::Ip(_) => body_tag::IP,
            PkiBody::Cp(_) => body_tag::CP,
            PkiBody::Kup(_) => body_tag::KUP,
            PkiBody::Rp(_) => body_tag::RP,
            PkiBody::CertConf(_) => body_tag::CERT_CONF,
            PkiBody::PkiConf => body_tag::PKICONF,
            PkiBody::Genm(_) => body_tag::GENM,
            PkiBody::Genp(_) => body_tag::GENP,
            PkiBody::Error(_) => body_tag::ERROR,
        }
    }
}

/// Decode a `PKIBody` from its position in a `PKIMessage` (an explicitly
/// tagged `[n]` CHOICE selector wrapping the variant's content type).
pub fn decode(r: &mut Reader) -> Result<PkiBody, CmpError> {
    let peek = r.peek_tag()?;
    let n = tag::context_number(peek);
    let content = r.expect_tag(tag::context_constructed(n))?;

    Ok(match n {
        body_tag::IR => PkiBody::Ir(requests::decode_cert_req_messages(content)?),
        body_tag::CR => PkiBody::Cr(requests::decode_cert_req_messages(content)?),
        body_tag::KUR => PkiBody::Kur(requests::decode_cert_req_messages(content)?),
        body_tag::P10CR => PkiBody::P10cr(requests::decode_p10cr(content)),
        body_tag::RR => PkiBody::Rr(requests::decode_revocation_request(content)?),
        body_tag::IP => PkiBody::Ip(response::decode_cert_rep_message(content)?),
        body_tag::CP => PkiBody::Cp(response::decode_cert_rep_message(content)?),
        body_tag::KUP => PkiBody::Kup(response::decode_cert_rep_message(content)?),
        body_tag::RP => PkiBody::Rp(response::decode_revocation_response(content)?),
        body_tag::CERT_CONF => PkiBody::CertConf(confirm::decode_cert_confirm(content)?),
        body_tag::PKICONF => {
            confirm::decode_pki_conf(content)?;
            PkiBody::PkiConf
        }
        body_tag::GENM => PkiBody::Genm(general::decode_general_message(content)?),
        body_tag::GENP => PkiBody::Genp(general::decode_general_response(content)?),
        body_tag::ERROR => PkiBody::Error(error::decode_error(content)?),
        other => return Err(CmpError::bad_data(format!("unrecognised PKIBody choice [{other}]"))),
    })
}

pub fn encode(body: &PkiBody, out: &mut Vec<u8>) {
    writer::write_constructed(tag::context_constructed(body.tag()), out, |content| match body {
        PkiBody::Ir(reqs) | PkiBody::Cr(reqs) | PkiBody::Kur(reqs) => {
            requests::encode_cert_req_messages(reqs, content)
        }
        PkiBody::P10cr(der) => content.extend_from_slice(der),
        PkiBody::Rr(target) => requests::encode_revocation_request(target, content),
        PkiBody::Ip(entries) | PkiBody::Cp(entries) | PkiBody::Kup(entries) => {
            response::encode_cert_rep_message(entries, content)
        }
        PkiBody::Rp(status) => response::encode_revocation_response(status, content),
        PkiBody::CertConf(confirmation) => {
            confirm::encode_cert_confirm(confirmation.as_ref(), content)
        }
        PkiBody::PkiConf => confirm::encode_pki_conf(content),
        PkiBody::Genm(entries) | PkiBody::Genp(entries) => {
            general::encode_general_message(entries, content)
        }
        PkiBody::Error(err) => error::encode_error(err, content),
    });
}
