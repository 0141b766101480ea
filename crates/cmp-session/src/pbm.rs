//! `PBMParameter ::= SEQUENCE { salt OCTET STRING, owf AlgorithmIdentifier,
//! iterationCount INTEGER, mac AlgorithmIdentifier }` — the deferred content
//! of a MAC-protected header's `protectionAlg` parameters, bridged to and
//! from [`cmp_integrity::MacParams`].
//!
//! `cmp-header` borrows these bytes wholesale (it doesn't know the password
//! yet); this module is what actually parses and builds them once a
//! [`cmp_session::identity::Identity::Mac`] is in play.

use cmp_asn1::{reader::Reader, tag, writer};
use cmp_integrity::MacParams;
use cmp_types::CmpError;

use crate::oids::{hash_alg_to_oid, hmac_alg_to_oid, oid_to_hash_alg, oid_to_hmac_alg};

fn write_algorithm_identifier_no_params(oid_text: &str, out: &mut Vec<u8>) -> Result<(), CmpError> {
    let oid_der = cmp_oid::codec::text_to_oid(oid_text)?;
    writer::write_sequence(out, |seq| {
        writer::write_tlv(tag::OBJECT_IDENTIFIER, &oid_der, seq);
        writer::write_tlv(tag::NULL, &[], seq);
    });
    Ok(())
}

fn read_algorithm_identifier_oid(r: &mut Reader<'_>) -> Result<String, CmpError> {
    let mut seq = r.read_sequence()?;
    let oid_der = seq.expect_tag(tag::OBJECT_IDENTIFIER)?;
    let oid_text = cmp_oid::codec::oid_to_text(oid_der)?;
    if !seq.is_empty() {
        seq.skip_value()?;
    }
    Ok(oid_text)
}

pub fn encode_pbm_parameter(params: &MacParams, out: &mut Vec<u8>) -> Result<(), CmpError> {
    let mut content = Vec::new();
    writer::write_octet_string(&params.salt, &mut content);
    write_algorithm_identifier_no_params(hash_alg_to_oid(params.hash_alg), &mut content)?;
    writer::write_integer(i64::from(params.iterations), &mut content);
    write_algorithm_identifier_no_params(hmac_alg_to_oid(params.mac_alg), &mut content)?;

    writer::write_sequence(out, |seq| {
        seq.extend_from_slice(&content);
    });
    Ok(())
}

pub fn decode_pbm_parameter(der: &[u8]) -> Result<MacParams, CmpError> {
    let mut reader = Reader::new(der);
    let mut seq = reader.read_sequence()?;

    let salt = seq.read_octet_string()?.to_vec();
    let owf_oid = read_algorithm_identifier_oid(&mut seq)?;
    let hash_alg = oid_to_hash_alg(&owf_oid)?;
    let iterations = seq.read_integer()?;
    let iterations = u32::try_from(iterations)
        .map_err(|_| CmpError::bad_data("PBMParameter iterationCount out of range"))?;
    let mac_oid = read_algorithm_identifier_oid(&mut seq)?;
    let mac_alg = oid_to_hmac_alg(&mac_oid)?;

    Ok(MacParams { salt, iterations, hash_alg, mac_alg })
}

#[cfg(test)]
mod tests {
    use super::*;
    use cmp_crypto::HashAlgorithm;

    #[test]
    fn pbm_parameter_round_trips() {
        let params = MacParams {
            salt: vec![1, 2, 3, 4],
            iterations: 1000,
            hash_alg: HashAlgorithm::Sha1,
            mac_alg: HashAlgorithm::Sha256,
        };
        let mut der = Vec::new();
        encode_pbm_parameter(&params, &mut der).unwrap();
        let decoded = decode_pbm_parameter(&der).unwrap();
        assert_eq!(decoded, params);
    }
}
