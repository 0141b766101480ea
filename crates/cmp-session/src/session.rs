//! The Transaction Orchestrator: drives one client-side CMP exchange to
//! completion over a [`Transport`], per the state machine and per-message
//! procedures.
//!

use std::marker::PhantomData;
use std::time::Duration;

use cmp_body::domain::{
    CertRequest, CertTemplate, CertificateDelivery, InfoTypeAndValue, PendingConfirmation,
    ProofOfPossession, RevocationTarget,
};
use cmp_body::{confirm, error, PkiBody};
use cmp_crypto::{CertificateHandle, CryptoProvider, HashAlgorithm};
use cmp_header::{generate_octet_id, HeaderState, HeaderWriteParams, ProtectionAlgorithm};
use cmp_integrity::{MacContext, MacParams, MacSlots, SigContext, SignerReference};
use cmp_status::PkiStatusInfo;
use cmp_types::constants::{DEFAULT_TIMEOUT_SECS, MIN_TIMEOUT_SECS};
use cmp_types::{CmpError, OctetId, PeerDetail, Role};

use crate::identity::{Identity, IssuedCertificate};
use crate::message::{self, DecodedMessage};
use crate::oids;
use crate::pbm;
use crate::transport::{Transport, TransportError};

/// Placeholder `GeneralName` (an empty `directoryName` choice). This core
/// never constructs or inspects X.509 `Name`s, so every outgoing
/// header's `sender`/`recipient` carries this rather than a real DN.
const EMPTY_DIRECTORY_NAME: &[u8] = &[0xA4, 0x00];

enum EnrollKind {
    Initial,
    Update,
}

/// Identity, flattened into the values one round trip needs to protect a
/// message, detached from `self.identity`'s borrow so the mutable
/// bookkeeping below (MAC slot derivation) doesn't fight the borrow
/// checker over the same field.
enum ProtectMode {
    Mac { reference: Vec<u8>, password: Vec<u8>, params: MacParams },
    Sig { own_sender_kid: Option<Vec<u8>>, signing_key_der: Vec<u8>, hash_alg: HashAlgorithm, ess_fp: [u8; 20] },
}

impl ProtectMode {
    fn from_identity(identity: &Identity) -> Self {
        match identity {
            Identity::Mac { reference, password, params } => ProtectMode::Mac {
                reference: reference.clone(),
                password: password.clone(),
                params: params.clone(),
            },
            Identity::Signature { own_sender_kid, signing_certificate, signing_key_der, .. } => {
                ProtectMode::Sig {
                    own_sender_kid: own_sender_kid.clone(),
                    signing_key_der: signing_key_der.clone(),
                    hash_alg: signing_certificate.signature_hash_algorithm(),
                    ess_fp: signing_certificate.sha1_fingerprint(),
                }
            }
        }
    }
}

/// Drives one client-side CMP exchange: `ir`/`kur` enrollment (with the
/// trailing `certConf`/`pkiConf` round trip folded in), `rr` revocation, or
/// a `genm`/`genp` general-message exchange.
///
/// `Send`: every field is `Send` (including `Identity`'s boxed certificate
/// handles). Never `Sync`: `Identity::Signature`'s `Box<dyn
/// CertificateHandle + Send>` fields are not automatically `Sync`, which
/// keeps a session pinned to a single thread without a manual marker.
pub struct Session<T: Transport, C: CryptoProvider> {
    role: Role,
    identity: Identity,
    /// Lazily derived on first use (password-based key derivation needs a
    /// [`CryptoProvider`], which `new_session` doesn't receive). Only
    /// populated for [`Identity::Mac`]; the signature path is stateless
    /// per message and needs no cache.
    mac_context: Option<MacSlots>,
    header_state: HeaderState,
    timeout: Duration,
    /// Once set, every public method short-circuits to a clone of this —
    /// a failed exchange invalidates the session.
    last_error: Option<CmpError>,
    _transport: PhantomData<T>,
    _crypto: PhantomData<C>,
}

impl<T: Transport, C: CryptoProvider> Session<T, C> {
    pub fn new_session(role: Role, identity: Identity) -> Self {
        Self {
            role,
            identity,
            mac_context: None,
            header_state: HeaderState::default(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            last_error: None,
            _transport: PhantomData,
            _crypto: PhantomData,
        }
    }

    pub fn role(&self) -> Role {
        self.role
    }

    /// Clamped to [`MIN_TIMEOUT_SECS`].
    pub fn set_timeout(&mut self, timeout: Duration) {
        self.timeout = timeout.max(Duration::from_secs(MIN_TIMEOUT_SECS));
    }

    pub fn last_error(&self) -> Option<&CmpError> {
        self.last_error.as_ref()
    }

    fn fail_fast(&self) -> Result<(), CmpError> {
        match &self.last_error {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }

    /// The exchange's transaction ID: a fresh 16-byte random value is
    /// recorded on first use, reused for every message of the same
    /// exchange after that.
    fn transaction_id(&mut self, crypto: &C) -> OctetId {
        if let Some(tx) = &self.header_state.transaction_id {
            return tx.clone();
        }
        let fresh = generate_octet_id(crypto);
        self.header_state.transaction_id = Some(fresh.clone());
        fresh
    }

    pub fn request_initial(
        &mut self,
        transport: &mut T,
        crypto: &C,
        template: CertTemplate,
    ) -> Result<IssuedCertificate, CmpError> {
        self.enroll(transport, crypto, template, EnrollKind::Initial)
    }

    /// `current`'s subject defaults a template that omits one — mirroring
    /// how a CA's IR reconciliation fills in a missing subject from its
    /// own records, applied here on the client side from the certificate
    /// being renewed.
    pub fn request_update(
        &mut self,
        transport: &mut T,
        crypto: &C,
        current: &dyn CertificateHandle,
        mut template: CertTemplate,
    ) -> Result<IssuedCertificate, CmpError> {
        if template.subject_der.is_none() {
            template.subject_der = Some(current.subject_der().to_vec());
        }
        self.enroll(transport, crypto, template, EnrollKind::Update)
    }

    fn enroll(
        &mut self,
        transport: &mut T,
        crypto: &C,
        template: CertTemplate,
        kind: EnrollKind,
    ) -> Result<IssuedCertificate, CmpError> {
        self.fail_fast()?;
        let result = self.enroll_inner(transport, crypto, template, kind);
        if let Err(err) = &result {
            self.last_error = Some(err.clone());
        }
        result
    }

    fn enroll_inner(
        &mut self,
        transport: &mut T,
        crypto: &C,
        template: CertTemplate,
        kind: EnrollKind,
    ) -> Result<IssuedCertificate, CmpError> {
        let req = CertRequest { cert_req_id: 0, template, pop: ProofOfPossession::None };
        let request_body = match kind {
            EnrollKind::Initial => PkiBody::Ir(vec![req]),
            EnrollKind::Update => PkiBody::Kur(vec![req]),
        };

        let (response_body, extra_certs) = self.round_trip(transport, crypto, request_body)?;
        let mut entries = match response_body {
            PkiBody::Ip(entries) | PkiBody::Kup(entries) => entries,
            other => {
                return Err(CmpError::bad_data(format!(
                    "expected ip/kup, got PKIBody choice [{}]",
                    other.tag()
                )));
            }
        };
        if entries.is_empty() {
            return Err(CmpError::bad_data("CertRepMessage carried no entries"));
        }
        let entry = entries.remove(0);

        if let Err(rejection) = entry.status.check() {
            // Best-effort courtesy rejection; the original failure is what
            // the caller sees either way.
            let _ = self.round_trip(transport, crypto, PkiBody::CertConf(None));
            return Err(rejection);
        }

        let delivery = entry
            .certificate
            .ok_or_else(|| CmpError::bad_data("accepted CertResponse carried no certificate"))?;

        let plaintext = match &delivery {
            CertificateDelivery::Plaintext(der) => der.clone(),
            _ => {
                return Err(CmpError::NotAvailable {
                    description: "automatic certConf is only supported for plaintext certificate \
                        delivery; recover the certificate out of band and confirm separately"
                        .to_string(),
                    detail: PeerDetail::none(),
                });
            }
        };

        let hash_algorithm =
            if self.header_state.is_peer_cryptlib { HashAlgorithm::Md5 } else { HashAlgorithm::Sha1 };
        let pending = PendingConfirmation { certificate_der: plaintext, hash_algorithm };
        let confirmation = confirm::confirm_accepted(crypto, &pending, 0)?;

        let (confirm_response, _) =
            self.round_trip(transport, crypto, PkiBody::CertConf(Some(confirmation)))?;
        match confirm_response {
            PkiBody::PkiConf => {}
            other => {
                return Err(CmpError::bad_data(format!(
                    "expected pkiConf, got PKIBody choice [{}]",
                    other.tag()
                )));
            }
        }

        Ok(IssuedCertificate { delivery, ca_certs_der: extra_certs })
    }

    pub fn request_revocation(
        &mut self,
        transport: &mut T,
        crypto: &C,
        target: RevocationTarget,
    ) -> Result<PkiStatusInfo, CmpError> {
        self.fail_fast()?;
        let result = self.request_revocation_inner(transport, crypto, target);
        if let Err(err) = &result {
            self.last_error = Some(err.clone());
        }
        result
    }

    fn request_revocation_inner(
        &mut self,
        transport: &mut T,
        crypto: &C,
        target: RevocationTarget,
    ) -> Result<PkiStatusInfo, CmpError> {
        let (response_body, _) = self.round_trip(transport, crypto, PkiBody::Rr(target))?;
        match response_body {
            PkiBody::Rp(status) => {
                status.check()?;
                Ok(status)
            }
            other => {
                Err(CmpError::bad_data(format!("expected rp, got PKIBody choice [{}]", other.tag())))
            }
        }
    }

    pub fn send_general(
        &mut self,
        transport: &mut T,
        crypto: &C,
        oid: &str,
        payload: Vec<u8>,
    ) -> Result<Vec<InfoTypeAndValue>, CmpError> {
        self.fail_fast()?;
        let result = self.send_general_inner(transport, crypto, oid, payload);
        if let Err(err) = &result {
            self.last_error = Some(err.clone());
        }
        result
    }

    fn send_general_inner(
        &mut self,
        transport: &mut T,
        crypto: &C,
        oid: &str,
        payload: Vec<u8>,
    ) -> Result<Vec<InfoTypeAndValue>, CmpError> {
        let value_der = if payload.is_empty() { None } else { Some(payload) };
        let request = vec![InfoTypeAndValue { oid: oid.to_string(), value_der }];
        let (response_body, _) = self.round_trip(transport, crypto, PkiBody::Genm(request))?;
        match response_body {
            PkiBody::Genp(entries) => Ok(entries),
            other => {
                Err(CmpError::bad_data(format!("expected genp, got PKIBody choice [{}]", other.tag())))
            }
        }
    }

    /// One send/receive cycle: compose and protect an outgoing message,
    /// round-trip it over `transport`, then decode and verify the
    /// response. `error` bodies are returned as the mapped error directly,
    /// without an integrity check.
    fn round_trip(
        &mut self,
        transport: &mut T,
        crypto: &C,
        request_body: PkiBody,
    ) -> Result<(PkiBody, Vec<Vec<u8>>), CmpError> {
        let transaction_id = self.transaction_id(crypto);
        let sender_nonce = generate_octet_id(crypto);
        let recipient_nonce = self.header_state.next_recipient_nonce.clone();

        let protect_mode = ProtectMode::from_identity(&self.identity);
        let (sender_kid, protection_alg_oid, mac_params_der) = match &protect_mode {
            ProtectMode::Mac { reference, params, .. } => {
                let mut buf = Vec::new();
                pbm::encode_pbm_parameter(params, &mut buf)?;
                (Some(reference.clone()), cmp_header::oids::PASSWORD_BASED_MAC_OID.to_string(), Some(buf))
            }
            ProtectMode::Sig { own_sender_kid, hash_alg, .. } => {
                let oid = oids::signature_oid_for(*hash_alg)?;
                (own_sender_kid.clone(), oid.to_string(), None)
            }
        };
        let ess_fp = match &protect_mode {
            ProtectMode::Sig { ess_fp, .. } => Some(*ess_fp),
            ProtectMode::Mac { .. } => None,
        };

        let header_params = HeaderWriteParams {
            sender_der: EMPTY_DIRECTORY_NAME,
            recipient_der: EMPTY_DIRECTORY_NAME,
            protection_alg_oid: &protection_alg_oid,
            mac_params_der: mac_params_der.as_deref(),
            sender_kid: sender_kid.as_deref(),
            recipient_kid: None,
            transaction_id: &transaction_id,
            sender_nonce: &sender_nonce,
            recipient_nonce: recipient_nonce.as_ref(),
            ess_cert_id_fingerprint: ess_fp,
            announce_cryptlib_presence: false,
        };

        let protected = message::compose_protected(&header_params, &request_body)?;

        let protection_bytes = match &protect_mode {
            ProtectMode::Mac { password, params, .. } => {
                if self.mac_context.is_none() {
                    let primary = MacContext::derive(crypto, password, params.clone())?;
                    self.mac_context = Some(MacSlots::new(primary));
                }
                let slots = self.mac_context.as_mut().expect("just initialized above");
                let resolved = slots.resolve(crypto, password, params.clone())?;
                resolved.mac(crypto, &protected)
            }
            ProtectMode::Sig { signing_key_der, hash_alg, .. } => {
                let digest = crypto.hash(*hash_alg, &protected);
                crypto.sign_digest(signing_key_der, *hash_alg, &digest)?
            }
        };

        let mut wire = Vec::new();
        message::encode_message(&protected, Some(&protection_bytes), &[], &mut wire);

        let response_bytes = transport.send_receive(&wire, self.timeout).map_err(|e| match e {
            TransportError::Timeout => CmpError::timeout("transport timed out waiting for a response"),
            TransportError::Io(msg) => CmpError::bad_data(format!("transport I/O failure: {msg}")),
        })?;

        let decoded = message::decode_message(&response_bytes)?;

        if let PkiBody::Error(error_body) = &decoded.body {
            return Err(error::to_cmp_error(error_body));
        }

        let protection = decoded
            .protection
            .as_ref()
            .ok_or_else(|| CmpError::signature("response message carried no protection"))?;

        self.verify_protection(crypto, &decoded, protection)?;
        self.header_state.process_incoming(&decoded.header)?;

        Ok((decoded.body, decoded.extra_certs))
    }

    fn verify_protection(
        &mut self,
        crypto: &C,
        decoded: &DecodedMessage<'_>,
        protection: &[u8],
    ) -> Result<(), CmpError> {
        match (&self.identity, &decoded.header.protection_alg) {
            (Identity::Mac { password, .. }, ProtectionAlgorithm::Mac { params_der }) => {
                let params_der = params_der.ok_or_else(|| {
                    CmpError::bad_data("MAC-protected response carried no PBMParameter")
                })?;
                let params = pbm::decode_pbm_parameter(params_der)?;
                let password = password.clone();
                if self.mac_context.is_none() {
                    let primary = MacContext::derive(crypto, &password, params.clone())?;
                    self.mac_context = Some(MacSlots::new(primary));
                }
                let slots = self.mac_context.as_mut().expect("just initialized above");
                let ctx = slots.resolve(crypto, &password, params)?;
                if !ctx.verify(crypto, &decoded.protected, protection) {
                    return Err(CmpError::signature("MAC does not verify over the protected part"));
                }
                Ok(())
            }
            (
                Identity::Signature { peer_certificate, .. },
                ProtectionAlgorithm::Signature { oid },
            ) => {
                let hash_alg = oids::signature_oid_to_hash_alg(oid)?;
                let sig_ctx = SigContext {
                    signer: SignerReference::Sha1Fingerprint(peer_certificate.sha1_fingerprint()),
                    hash_alg,
                };
                sig_ctx.verify(crypto, peer_certificate.as_ref(), &decoded.protected, protection)
            }
            _ => Err(CmpError::signature(
                "response protection mechanism does not match this session's configured identity",
            )),
        }
    }
}
