//! OIDs needed to build the `AlgorithmIdentifier`s inside a
//! `PBMParameter` and to select a raw-RSA signature protection algorithm,
//! recognised by text the same way `cmp-header`/`cmp-body` recognise
//! theirs.

use cmp_crypto::HashAlgorithm;
use cmp_types::CmpError;

pub const MD5_OID: &str = "1 2 840 113549 2 5";
pub const SHA1_OID: &str = "1 3 14 3 2 26";
pub const SHA256_OID: &str = "2 16 840 1 101 3 4 2 1";

pub const HMAC_MD5_OID: &str = "1 2 840 113549 2 6";
pub const HMAC_SHA1_OID: &str = "1 2 840 113549 2 7";
pub const HMAC_SHA256_OID: &str = "1 2 840 113549 2 9";

pub const SHA1_WITH_RSA_OID: &str = "1 2 840 113549 1 1 5";
pub const SHA256_WITH_RSA_OID: &str = "1 2 840 113549 1 1 11";

pub fn hash_alg_to_oid(alg: HashAlgorithm) -> &'static str {
    match alg {
        HashAlgorithm::Md5 => MD5_OID,
        HashAlgorithm::Sha1 => SHA1_OID,
        HashAlgorithm::Sha256 => SHA256_OID,
    }
}

pub fn oid_to_hash_alg(oid: &str) -> Result<HashAlgorithm, CmpError> {
    match oid {
        MD5_OID => Ok(HashAlgorithm::Md5),
        SHA1_OID => Ok(HashAlgorithm::Sha1),
        SHA256_OID => Ok(HashAlgorithm::Sha256),
        other => Err(CmpError::bad_data(format!("unrecognised digest algorithm OID {other}"))),
    }
}

pub fn hmac_alg_to_oid(alg: HashAlgorithm) -> &'static str {
    match alg {
        HashAlgorithm::Md5 => HMAC_MD5_OID,
        HashAlgorithm::Sha1 => HMAC_SHA1_OID,
        HashAlgorithm::Sha256 => HMAC_SHA256_OID,
    }
}

pub fn oid_to_hmac_alg(oid: &str) -> Result<HashAlgorithm, CmpError> {
    match oid {
        HMAC_MD5_OID => Ok(HashAlgorithm::Md5),
        HMAC_SHA1_OID => Ok(HashAlgorithm::Sha1),
        HMAC_SHA256_OID => Ok(HashAlgorithm::Sha256),
        other => Err(CmpError::bad_data(format!("unrecognised MAC algorithm OID {other}"))),
    }
}

pub fn signature_oid_for(alg: HashAlgorithm) -> Result<&'static str, CmpError> {
    match alg {
        HashAlgorithm::Sha1 => Ok(SHA1_WITH_RSA_OID),
        HashAlgorithm::Sha256 => Ok(SHA256_WITH_RSA_OID),
        HashAlgorithm::Md5 => Err(CmpError::bad_data("MD5 is not a supported signature digest")),
    }
}

pub fn signature_oid_to_hash_alg(oid: &str) -> Result<HashAlgorithm, CmpError> {
    match oid {
        SHA1_WITH_RSA_OID => Ok(HashAlgorithm::Sha1),
        SHA256_WITH_RSA_OID => Ok(HashAlgorithm::Sha256),
        other => Err(CmpError::bad_data(format!("unrecognised signature algorithm OID {other}"))),
    }
}
