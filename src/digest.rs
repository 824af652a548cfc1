use sha2::{Digest, Sha256};

/// Errors from the digest backend
#[derive(Debug, thiserror::Error)]
pub enum DigestError {
    #[error("SHA-256 self-check failed: expected {expected}, got {actual}")]
    SelfCheckFailed { expected: String, actual: String },
}

/// FIPS 180-2 test vector: SHA-256("abc")
const SELF_CHECK_INPUT: &str = "abc";
const SELF_CHECK_DIGEST: &str = "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad";

/// Hex-encoded SHA-256 of the UTF-8 bytes of `data`
pub fn sha256_hex(data: &str) -> String {
    let digest = Sha256::digest(data.as_bytes());
    hex::encode(digest)
}

/// Digest for one mining attempt: the fixed prefix followed by the
/// decimal rendering of the nonce
pub fn attempt_digest(prefix: &str, nonce: u64) -> String {
    sha256_hex(&format!("{}{}", prefix, nonce))
}

/// Verify the digest backend against a known vector.
///
/// Must pass before a search is allowed to start; a failure is fatal and
/// not retried.
pub fn self_check() -> Result<(), DigestError> {
    let actual = sha256_hex(SELF_CHECK_INPUT);
    if actual != SELF_CHECK_DIGEST {
        return Err(DigestError::SelfCheckFailed {
            expected: SELF_CHECK_DIGEST.to_string(),
            actual,
        });
    }
    Ok(())
}
