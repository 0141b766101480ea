//! In-process CA/RA fixtures plus a closure-backed [`Transport`], so a
//! [`cmp_session::Session`] can be driven through a full exchange without a
//! socket.
//!
//! `MacCa` answers password-MAC-protected exchanges (`ir`/`kur`/`rr`);
//! `SigCa` answers signature-protected ones (`kur`). Neither reuses
//! `cmp_session::Session` on the server side — a real CA's response
//! construction is deliberately hand-rolled here, directly against
//! `cmp-header`/`cmp-body`/`cmp-integrity`, the way the client-side fixture
//! in `cmp-session`'s own tests builds its scripted responses.

use std::time::Duration;

use cmp_body::domain::{CertResponseEntry, CertTemplate, CertificateDelivery, RevocationReason, RevocationTarget};
use cmp_body::reconcile::{reconcile_ir_request, PkiUser, PkiUserDirectory};
use cmp_body::{ErrorBody, PkiBody};
use cmp_crypto::{CertificateHandle, CryptoProvider, HashAlgorithm, RustCryptoProvider};
use cmp_header::{generate_octet_id, HeaderWriteParams, ProtectionAlgorithm};
use cmp_integrity::{MacContext, MacParams, SigContext, SignerReference};
use cmp_session::{compose_protected, decode_message, encode_message, oids as session_oids, pbm};
use cmp_session::{Identity, Session, Transport, TransportError};
use cmp_status::PkiStatusInfo;
use cmp_types::constants::MAX_PASSWORD_ITERATIONS;
use cmp_types::{CmpError, FailBit, FailInfoFlags, PkiStatus, Role};

const EMPTY_DIRECTORY_NAME: &[u8] = &[0xA4, 0x00];

/// A [`Transport`] that hands every outgoing request straight to a closure
/// and returns whatever it produces, standing in for a socket round trip.
pub struct LoopbackTransport<F> {
    handler: F,
}

impl<F> LoopbackTransport<F> {
    pub fn new(handler: F) -> Self {
        Self { handler }
    }
}

impl<F: FnMut(&[u8]) -> Vec<u8> + Send> Transport for LoopbackTransport<F> {
    fn send_receive(&mut self, request: &[u8], _timeout: Duration) -> Result<Vec<u8>, TransportError> {
        Ok((self.handler)(request))
    }
}

/// A certificate double whose identity fields are supplied directly rather
/// than parsed from a real X.509 structure — this core never inspects
/// certificates beyond the handful of fields [`CertificateHandle`] exposes.
#[derive(Clone)]
pub struct FakeCert {
    subject: Vec<u8>,
    spki: Vec<u8>,
    fingerprint: [u8; 20],
    hash_alg: HashAlgorithm,
}

impl CertificateHandle for FakeCert {
    fn subject_der(&self) -> &[u8] {
        &self.subject
    }
    fn spki_der(&self) -> &[u8] {
        &self.spki
    }
    fn sha1_fingerprint(&self) -> [u8; 20] {
        self.fingerprint
    }
    fn signature_hash_algorithm(&self) -> HashAlgorithm {
        self.hash_alg
    }
    fn public_key_der(&self) -> &[u8] {
        &self.spki
    }
}

/// Generate a real RSA-2048 keypair and wrap its public half in a
/// [`FakeCert`], so signature-protection tests exercise genuine PKCS#1 v1.5
/// sign/verify rather than stub bytes.
pub fn generate_signing_identity(fingerprint_seed: u8) -> (FakeCert, Vec<u8>) {
    use rsa::pkcs8::{EncodePrivateKey, EncodePublicKey};

    let mut rng = rand::thread_rng();
    let private_key = rsa::RsaPrivateKey::new(&mut rng, 2048).expect("key generation");
    let public_key = rsa::RsaPublicKey::from(&private_key);
    let private_der = private_key.to_pkcs8_der().unwrap().as_bytes().to_vec();
    let spki = public_key.to_public_key_der().unwrap().as_bytes().to_vec();

    let cert = FakeCert {
        subject: vec![0x30, 0x03, 0x02, 0x01, fingerprint_seed],
        spki,
        fingerprint: [fingerprint_seed; 20],
        hash_alg: HashAlgorithm::Sha256,
    };
    (cert, private_der)
}

pub fn mac_identity(password: &[u8], reference: &[u8], params: MacParams) -> Identity {
    Identity::Mac { reference: reference.to_vec(), password: password.to_vec(), params }
}

pub fn signature_identity(own_cert: FakeCert, own_key_der: Vec<u8>, peer_cert: FakeCert) -> Identity {
    Identity::Signature {
        own_sender_kid: None,
        signing_certificate: Box::new(own_cert),
        signing_key_der: own_key_der,
        peer_certificate: Box::new(peer_cert),
    }
}

/// A [`PkiUserDirectory`] with a single pre-registered requester record,
/// standing in for the CA's enrollment database.
struct FixedDirectory {
    subject_der: Vec<u8>,
}

impl PkiUserDirectory for FixedDirectory {
    fn lookup(&self, _sender_kid: &[u8]) -> Result<PkiUser, CmpError> {
        Ok(PkiUser { subject_der: self.subject_der.clone() })
    }
}

fn accepted_status() -> PkiStatusInfo {
    PkiStatusInfo { status: PkiStatus::Accepted, status_string: None, extra_status_strings_discarded: false, fail_info: None }
}

fn unknown_reference_error() -> PkiBody {
    let mut fail_info = FailInfoFlags::empty();
    fail_info.set(FailBit::BadCertTemplate);
    PkiBody::Error(ErrorBody {
        status: PkiStatusInfo {
            status: PkiStatus::Rejection,
            status_string: Some("unrecognised reference value".to_string()),
            extra_status_strings_discarded: false,
            fail_info: Some(fail_info),
        },
        error_code: None,
        error_detail: None,
    })
}

/// A hand-built CA/RA answering password-MAC-protected exchanges.
///
/// `known_reference` is the only `senderKID` this fixture recognises — an
/// `ir` carrying any other value gets an unauthenticated `error` body back,
/// the same way a real CA can't even pick a shared secret to verify against
/// for a reference it has never seen.
pub struct MacCa {
    crypto: RustCryptoProvider,
    known_reference: Vec<u8>,
    params: MacParams,
    mac_ctx: MacContext,
    issued_cert_der: Vec<u8>,
    tamper_transaction_id: bool,
    declare_bogus_iterations: bool,
}

impl MacCa {
    pub fn new(password: Vec<u8>, known_reference: Vec<u8>, params: MacParams) -> Self {
        let crypto = RustCryptoProvider::new();
        let mac_ctx = MacContext::derive(&crypto, &password, params.clone()).expect("valid params");
        Self {
            crypto,
            known_reference,
            params,
            mac_ctx,
            issued_cert_der: vec![0x30, 0x03, 0x02, 0x01, 0x2a],
            tamper_transaction_id: false,
            declare_bogus_iterations: false,
        }
    }

    /// On the `certConf` leg of the exchange, echo back a freshly generated
    /// transaction ID instead of the client's own.
    pub fn tampering_transaction_id(mut self) -> Self {
        self.tamper_transaction_id = true;
        self
    }

    /// Declare an iteration count above [`MAX_PASSWORD_ITERATIONS`] in the
    /// response's `PBMParameter`, while still tagging the response with the
    /// context's real (sane) key — the client must reject the declared
    /// parameters before it ever gets to checking the tag.
    pub fn declaring_bogus_iterations(mut self) -> Self {
        self.declare_bogus_iterations = true;
        self
    }

    /// Run every request in an `ir`/`kur` through [`reconcile_ir_request`]
    /// (subject defaulting plus the signing-key POP rule), turning each
    /// into an issued certificate or a rejected entry — the same
    /// reconciliation path a real CA runs before it ever signs a reply.
    fn reconcile_and_issue(&self, reqs: &[cmp_body::domain::CertRequest]) -> Vec<CertResponseEntry> {
        let directory = FixedDirectory { subject_der: vec![0x30, 0x03, 0x02, 0x01, 0x01] };
        reqs.iter()
            .cloned()
            .map(|req| match reconcile_ir_request(&directory, &self.known_reference, req) {
                Ok(_) => CertResponseEntry {
                    status: accepted_status(),
                    certificate: Some(CertificateDelivery::Plaintext(self.issued_cert_der.clone())),
                },
                Err(CmpError::Invalid { description, detail }) => CertResponseEntry {
                    status: PkiStatusInfo {
                        status: PkiStatus::Rejection,
                        status_string: Some(description),
                        extra_status_strings_discarded: false,
                        fail_info: detail.fail_info,
                    },
                    certificate: None,
                },
                Err(other) => panic!("unexpected reconciliation error: {other:?}"),
            })
            .collect()
    }

    pub fn handle(&mut self, wire: &[u8]) -> Vec<u8> {
        let decoded = decode_message(wire).expect("client sent malformed wire");

        if decoded.header.sender_kid != Some(self.known_reference.as_slice()) {
            return self.encode_outgoing(
                &decoded.header.transaction_id.clone(),
                &decoded.header.sender_nonce.clone(),
                &unknown_reference_error(),
                false,
            );
        }

        let protection = decoded.protection.as_ref().expect("client message carried no protection");
        assert!(
            self.mac_ctx.verify(&self.crypto, &decoded.protected, protection),
            "client MAC did not verify"
        );

        let response_body = match &decoded.body {
            PkiBody::Ir(reqs) => PkiBody::Ip(self.reconcile_and_issue(reqs)),
            PkiBody::Kur(reqs) => PkiBody::Kup(self.reconcile_and_issue(reqs)),
            PkiBody::CertConf(_) => PkiBody::PkiConf,
            PkiBody::Rr(_) => PkiBody::Rp(accepted_status()),
            other => panic!("MacCa fixture does not handle PKIBody choice [{}]", other.tag()),
        };

        let transaction_id = if self.tamper_transaction_id && matches!(decoded.body, PkiBody::CertConf(_)) {
            generate_octet_id(&self.crypto)
        } else {
            decoded.header.transaction_id.clone()
        };

        self.encode_outgoing(&transaction_id, &decoded.header.sender_nonce.clone(), &response_body, true)
    }

    fn encode_outgoing(
        &mut self,
        transaction_id: &cmp_types::OctetId,
        client_sender_nonce: &cmp_types::OctetId,
        body: &PkiBody,
        protect: bool,
    ) -> Vec<u8> {
        let fresh_sender_nonce = generate_octet_id(&self.crypto);

        let declared_params = if self.declare_bogus_iterations {
            MacParams { iterations: MAX_PASSWORD_ITERATIONS + 1, ..self.params.clone() }
        } else {
            self.params.clone()
        };
        let mut mac_params_der = Vec::new();
        pbm::encode_pbm_parameter(&declared_params, &mut mac_params_der).expect("valid params");

        let header_params = HeaderWriteParams {
            sender_der: EMPTY_DIRECTORY_NAME,
            recipient_der: EMPTY_DIRECTORY_NAME,
            protection_alg_oid: cmp_header::oids::PASSWORD_BASED_MAC_OID,
            mac_params_der: if protect { Some(&mac_params_der) } else { None },
            sender_kid: None,
            recipient_kid: None,
            transaction_id,
            sender_nonce: &fresh_sender_nonce,
            recipient_nonce: Some(client_sender_nonce),
            ess_cert_id_fingerprint: None,
            announce_cryptlib_presence: false,
        };

        let protected = compose_protected(&header_params, body).expect("valid header params");
        let protection = protect.then(|| self.mac_ctx.mac(&self.crypto, &protected));

        let mut wire = Vec::new();
        encode_message(&protected, protection.as_deref(), &[], &mut wire);
        wire
    }
}

/// A hand-built CA answering signature-protected `kur` exchanges, using a
/// real RSA keypair both to verify the client and to sign its own
/// responses.
pub struct SigCa {
    crypto: RustCryptoProvider,
    client_cert: FakeCert,
    ca_cert: FakeCert,
    ca_private_der: Vec<u8>,
    issued_cert_der: Vec<u8>,
}

impl SigCa {
    /// Run every request in an `ir`/`kur` through [`reconcile_ir_request`],
    /// same as [`MacCa::reconcile_and_issue`] — signature-protected
    /// exchanges go through the identical server-side reconciliation path.
    fn reconcile_and_issue(&self, reqs: &[cmp_body::domain::CertRequest]) -> Vec<CertResponseEntry> {
        let directory = FixedDirectory { subject_der: self.client_cert.subject_der().to_vec() };
        reqs.iter()
            .cloned()
            .map(|req| match reconcile_ir_request(&directory, &self.client_cert.sha1_fingerprint(), req) {
                Ok(_) => CertResponseEntry {
                    status: accepted_status(),
                    certificate: Some(CertificateDelivery::Plaintext(self.issued_cert_der.clone())),
                },
                Err(CmpError::Invalid { description, detail }) => CertResponseEntry {
                    status: PkiStatusInfo {
                        status: PkiStatus::Rejection,
                        status_string: Some(description),
                        extra_status_strings_discarded: false,
                        fail_info: detail.fail_info,
                    },
                    certificate: None,
                },
                Err(other) => panic!("unexpected reconciliation error: {other:?}"),
            })
            .collect()
    }

    pub fn new(client_cert: FakeCert, ca_cert: FakeCert, ca_private_der: Vec<u8>) -> Self {
        Self {
            crypto: RustCryptoProvider::new(),
            client_cert,
            ca_cert,
            ca_private_der,
            issued_cert_der: vec![0x30, 0x03, 0x02, 0x01, 0x07],
        }
    }

    pub fn handle(&mut self, wire: &[u8]) -> Vec<u8> {
        let decoded = decode_message(wire).expect("client sent malformed wire");

        let hash_alg = match &decoded.header.protection_alg {
            ProtectionAlgorithm::Signature { oid } => {
                session_oids::signature_oid_to_hash_alg(oid).expect("recognised signature OID")
            }
            ProtectionAlgorithm::Mac { .. } => panic!("SigCa fixture only handles signature protection"),
        };
        let protection = decoded.protection.as_ref().expect("client message carried no protection");
        let sig_ctx =
            SigContext { signer: SignerReference::Sha1Fingerprint(self.client_cert.sha1_fingerprint()), hash_alg };
        sig_ctx
            .verify(&self.crypto, &self.client_cert, &decoded.protected, protection)
            .expect("client signature verifies");

        let response_body = match &decoded.body {
            PkiBody::Ir(reqs) | PkiBody::Kur(reqs) => PkiBody::Kup(self.reconcile_and_issue(reqs)),
            PkiBody::CertConf(_) => PkiBody::PkiConf,
            other => panic!("SigCa fixture does not handle PKIBody choice [{}]", other.tag()),
        };

        let fresh_sender_nonce = generate_octet_id(&self.crypto);
        let protection_alg_oid = session_oids::signature_oid_for(hash_alg).expect("supported digest");
        let header_params = HeaderWriteParams {
            sender_der: EMPTY_DIRECTORY_NAME,
            recipient_der: EMPTY_DIRECTORY_NAME,
            protection_alg_oid,
            mac_params_der: None,
            sender_kid: None,
            recipient_kid: None,
            transaction_id: &decoded.header.transaction_id,
            sender_nonce: &fresh_sender_nonce,
            recipient_nonce: Some(&decoded.header.sender_nonce),
            ess_cert_id_fingerprint: Some(self.ca_cert.sha1_fingerprint()),
            announce_cryptlib_presence: false,
        };

        let protected = compose_protected(&header_params, &response_body).expect("valid header params");
        let digest = self.crypto.hash(hash_alg, &protected);
        let signature =
            self.crypto.sign_digest(&self.ca_private_der, hash_alg, &digest).expect("CA signing key is valid");

        let mut wire_out = Vec::new();
        encode_message(&protected, Some(&signature), &[], &mut wire_out);
        wire_out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ir_with_mac_protection_completes_the_confirm_round_trip() {
        let crypto = RustCryptoProvider::new();
        let password = b"correct horse battery staple".to_vec();
        let reference = b"ra-1".to_vec();
        let params = MacParams {
            salt: vec![4, 8, 15, 16, 23, 42],
            iterations: 500,
            hash_alg: HashAlgorithm::Sha1,
            mac_alg: HashAlgorithm::Sha256,
        };

        let mut ca = MacCa::new(password.clone(), reference.clone(), params.clone());
        let mut transport = LoopbackTransport::new(move |wire: &[u8]| ca.handle(wire));

        let identity = mac_identity(&password, &reference, params);
        let mut session = Session::new_session(Role::Client, identity);

        let template = CertTemplate { public_key_der: vec![0x30, 0x00], ..CertTemplate::default() };
        let issued = session.request_initial(&mut transport, &crypto, template).unwrap();
        assert_eq!(issued.delivery, CertificateDelivery::Plaintext(vec![0x30, 0x03, 0x02, 0x01, 0x2a]));
        assert!(session.last_error().is_none());
    }

    #[test]
    fn ir_with_unknown_reference_is_rejected_as_invalid() {
        let crypto = RustCryptoProvider::new();
        let password = b"correct horse battery staple".to_vec();
        let known_reference = b"ra-1".to_vec();
        let wrong_reference = b"ra-9".to_vec();
        let params = MacParams { salt: vec![1, 2, 3], iterations: 200, hash_alg: HashAlgorithm::Sha1, mac_alg: HashAlgorithm::Sha1 };

        let mut ca = MacCa::new(password.clone(), known_reference, params.clone());
        let mut transport = LoopbackTransport::new(move |wire: &[u8]| ca.handle(wire));

        let identity = mac_identity(&password, &wrong_reference, params);
        let mut session = Session::new_session(Role::Client, identity);

        let template = CertTemplate { public_key_der: vec![0x30, 0x00], ..CertTemplate::default() };
        let err = session.request_initial(&mut transport, &crypto, template).unwrap_err();
        assert!(matches!(err, CmpError::Invalid { .. }));
        assert!(err.detail().unwrap().unauthenticated);
        assert!(session.last_error().is_some());
    }

    #[test]
    fn kur_with_signature_protection_completes_the_confirm_round_trip() {
        let crypto = RustCryptoProvider::new();
        let (client_cert, client_key_der) = generate_signing_identity(1);
        let (ca_cert, ca_key_der) = generate_signing_identity(2);

        let mut ca = SigCa::new(client_cert.clone(), ca_cert.clone(), ca_key_der);
        let mut transport = LoopbackTransport::new(move |wire: &[u8]| ca.handle(wire));

        let identity = signature_identity(client_cert.clone(), client_key_der, ca_cert);
        let mut session = Session::new_session(Role::Client, identity);

        let template = CertTemplate::default();
        let issued = session.request_update(&mut transport, &crypto, &client_cert, template).unwrap();
        assert_eq!(issued.delivery, CertificateDelivery::Plaintext(vec![0x30, 0x03, 0x02, 0x01, 0x07]));
        assert!(session.last_error().is_none());
    }

    #[test]
    fn revocation_request_completes_successfully() {
        let crypto = RustCryptoProvider::new();
        let password = b"shared-secret".to_vec();
        let reference = b"ra-1".to_vec();
        let params = MacParams { salt: vec![5, 6, 7], iterations: 50, hash_alg: HashAlgorithm::Sha1, mac_alg: HashAlgorithm::Sha256 };

        let mut ca = MacCa::new(password.clone(), reference.clone(), params.clone());
        let mut transport = LoopbackTransport::new(move |wire: &[u8]| ca.handle(wire));

        let identity = mac_identity(&password, &reference, params);
        let mut session = Session::new_session(Role::Client, identity);

        let target = RevocationTarget {
            issuer_der: vec![0x30, 0x03, 0x02, 0x01, 0x01],
            serial: vec![0x2a],
            reason: RevocationReason::KeyCompromise,
        };
        let status = session.request_revocation(&mut transport, &crypto, target).unwrap();
        assert_eq!(status.status, PkiStatus::Accepted);
    }

    #[test]
    fn transaction_id_tamper_invalidates_the_session() {
        let crypto = RustCryptoProvider::new();
        let password = b"pw".to_vec();
        let reference = b"ra-1".to_vec();
        let params = MacParams { salt: vec![1], iterations: 10, hash_alg: HashAlgorithm::Sha1, mac_alg: HashAlgorithm::Sha1 };

        let mut ca = MacCa::new(password.clone(), reference.clone(), params.clone()).tampering_transaction_id();
        let mut transport = LoopbackTransport::new(move |wire: &[u8]| ca.handle(wire));

        let identity = mac_identity(&password, &reference, params);
        let mut session = Session::new_session(Role::Client, identity);

        let template = CertTemplate { public_key_der: vec![0x30, 0x00], ..CertTemplate::default() };
        let err = session.request_initial(&mut transport, &crypto, template.clone()).unwrap_err();
        assert!(matches!(err, CmpError::Signature { .. }));
        assert!(session.last_error().is_some());

        // A second attempt short-circuits on the recorded failure without
        // touching the transport again.
        let second = session.request_initial(&mut transport, &crypto, template).unwrap_err();
        assert_eq!(second, err);
    }

    #[test]
    fn ir_with_signing_key_usage_and_no_signature_pop_is_rejected_as_invalid() {
        let crypto = RustCryptoProvider::new();
        let password = b"correct horse battery staple".to_vec();
        let reference = b"ra-1".to_vec();
        let params = MacParams { salt: vec![2, 4, 6], iterations: 300, hash_alg: HashAlgorithm::Sha1, mac_alg: HashAlgorithm::Sha256 };

        let mut ca = MacCa::new(password.clone(), reference.clone(), params.clone());
        let mut transport = LoopbackTransport::new(move |wire: &[u8]| ca.handle(wire));

        let identity = mac_identity(&password, &reference, params);
        let mut session = Session::new_session(Role::Client, identity);

        // A client session never attaches a signature POP to its own `ir`
        // (see `enroll_inner`), so a template demanding one is always
        // rejected by `reconcile_and_issue`'s `enforce_signing_key_pop`.
        let template = cmp_body::domain::CertTemplate {
            public_key_der: vec![0x30, 0x00],
            key_usage: Some(cmp_body::domain::KeyUsage { digital_signature: true, non_repudiation: false }),
            ..CertTemplate::default()
        };
        let err = session.request_initial(&mut transport, &crypto, template).unwrap_err();
        match err {
            CmpError::Invalid { detail, .. } => {
                assert!(detail.fail_info.unwrap().is_set(FailBit::BadCertTemplate));
            }
            other => panic!("expected Invalid with badCertTemplate, got {other:?}"),
        }
    }

    #[test]
    fn server_declared_iteration_count_above_ceiling_is_rejected_before_mac_verification() {
        let crypto = RustCryptoProvider::new();
        let password = b"pw".to_vec();
        let reference = b"ra-1".to_vec();
        let params = MacParams { salt: vec![9, 9], iterations: 10, hash_alg: HashAlgorithm::Sha1, mac_alg: HashAlgorithm::Sha256 };

        let mut ca = MacCa::new(password.clone(), reference.clone(), params.clone()).declaring_bogus_iterations();
        let mut transport = LoopbackTransport::new(move |wire: &[u8]| ca.handle(wire));

        let identity = mac_identity(&password, &reference, params);
        let mut session = Session::new_session(Role::Client, identity);

        let template = CertTemplate { public_key_der: vec![0x30, 0x00], ..CertTemplate::default() };
        let err = session.request_initial(&mut transport, &crypto, template).unwrap_err();
        match err {
            CmpError::BadData { detail, .. } => {
                let fail_info = detail.fail_info.expect("iteration ceiling failure carries a fail-info flag");
                assert!(fail_info.is_set(FailBit::BadAlg));
            }
            other => panic!("expected BadData, got {other:?}"),
        }
    }
}
