//! Server-side `ir` reconciliation against the pre-registered requester
//! record, and the signing-key proof-of-possession rule.

use cmp_types::{CmpError, FailBit, FailInfoFlags, PeerDetail};

use crate::domain::{CertRequest, ProofOfPossession};

/// The subset of a pre-registered requester ("PKIUser") record a server
/// needs to reconcile an incoming `ir` against: the subject distinguished
/// name it should stamp onto the certificate when the request omitted
/// one, and whether this requester is pre-authorized at all.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PkiUser {
    pub subject_der: Vec<u8>,
}

/// Driven port resolving a requester identity (keyed by the header's
/// `senderKID`) to its pre-registered record.
pub trait PkiUserDirectory: Send {
    fn lookup(&self, sender_kid: &[u8]) -> Result<PkiUser, CmpError>;
}

/// Fill in a missing `CertTemplate.subject` from the requester's
/// pre-registered record, and enforce the signing-key POP rule: a
/// `CertTemplate` whose key usage requires signing must carry a
/// signature POP, never encryption-only or absent POP.
pub fn reconcile_ir_request(
    directory: &dyn PkiUserDirectory,
    sender_kid: &[u8],
    mut request: CertRequest,
) -> Result<CertRequest, CmpError> {
    if request.template.subject_der.is_none() {
        let user = directory.lookup(sender_kid)?;
        tracing::debug!(cert_req_id = request.cert_req_id, "substituting subject from PKIUser record");
        request.template.subject_der = Some(user.subject_der);
    }

    enforce_signing_key_pop(&request)?;
    Ok(request)
}

/// Reject a request whose key usage demands signing but whose POP is not
/// a signature.
pub fn enforce_signing_key_pop(request: &CertRequest) -> Result<(), CmpError> {
    let requires_signature = request
        .template
        .key_usage
        .map(|usage| usage.requires_signature_pop())
        .unwrap_or(false);

    if requires_signature && !matches!(request.pop, ProofOfPossession::Signature(_)) {
        let mut fail_info = FailInfoFlags::empty();
        fail_info.set(FailBit::BadCertTemplate);
        return Err(CmpError::Invalid {
            description: "certificate request with signing key usage must carry a signature proof of possession".into(),
            detail: PeerDetail { fail_info: Some(fail_info), ..PeerDetail::none() },
        });
    }
    Ok(())
}
