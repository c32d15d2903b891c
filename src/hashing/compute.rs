// Digest computation and verification

use super::policy::{Algorithm, HashMode, HashPolicy, HMAC_SHA256_BLOCK};
use crate::error::{Error, Result};
use base64::{engine::general_purpose, Engine as _};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;
use tracing::debug;

/// Raw secret plus the caller's length ceiling. Never pre-truncated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HashRequest {
    pub raw_secret: Vec<u8>,
    pub max_length: usize,
}

impl HashRequest {
    pub fn new(raw_secret: impl Into<Vec<u8>>) -> Self {
        Self {
            raw_secret: raw_secret.into(),
            max_length: HashPolicy::default().max_input_len,
        }
    }

    pub fn with_max_length(mut self, max_length: usize) -> Self {
        self.max_length = max_length;
        self
    }
}

/// The persisted credential record.
///
/// `salt` and `digest` are base64 (standard alphabet). For bcrypt the digest
/// is the modular-crypt string, which already embeds its salt, so `salt` is
/// `None`. The digest alone never verifies a PBKDF2 record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HashResult {
    pub salt: Option<String>,
    pub digest: String,
    pub algorithm: Algorithm,
    pub work_factor: u32,
}

impl HashResult {
    pub fn salt_bytes(&self) -> Result<Option<Vec<u8>>> {
        self.salt
            .as_deref()
            .map(|s| decode(s, "salt"))
            .transpose()
    }

    pub fn digest_bytes(&self) -> Result<Vec<u8>> {
        match self.algorithm {
            Algorithm::Pbkdf2Sha256 => decode(&self.digest, "digest"),
            Algorithm::Bcrypt => Ok(self.digest.as_bytes().to_vec()),
        }
    }
}

/// Hash under the default policy
pub fn compute_hash(request: &HashRequest, mode: HashMode) -> Result<HashResult> {
    HashPolicy::default().compute(request, mode)
}

impl HashPolicy {
    pub fn compute(&self, request: &HashRequest, mode: HashMode) -> Result<HashResult> {
        self.validate()?;

        // Only the unsafe static-salt path skips the ceiling.
        if mode != HashMode::UnsafeStaticSalt {
            let max = self.effective_ceiling(request.max_length);
            if request.raw_secret.len() > max {
                return Err(Error::InputTooLong {
                    length: request.raw_secret.len(),
                    max,
                });
            }
        }

        let work_factor = self.work_factor(mode);
        let result = match self.algorithm {
            Algorithm::Pbkdf2Sha256 => {
                let salt = match mode {
                    HashMode::UnsafeStaticSalt => self.static_salt.as_bytes().to_vec(),
                    _ => random_salt(self.salt_len),
                };
                let key = derive_pbkdf2(&request.raw_secret, &salt, work_factor, self.output_len);
                HashResult {
                    salt: Some(general_purpose::STANDARD.encode(&salt)),
                    digest: general_purpose::STANDARD.encode(key),
                    algorithm: Algorithm::Pbkdf2Sha256,
                    work_factor,
                }
            }
            Algorithm::Bcrypt => {
                let salt = match mode {
                    HashMode::UnsafeStaticSalt => static_bcrypt_salt(&self.static_salt),
                    _ => fresh_bcrypt_salt(),
                };
                // bcrypt silently drops bytes past 72; SAFE already refused those.
                bcrypt_record(&request.raw_secret, work_factor, salt)?
            }
        };

        debug!(
            algorithm = %result.algorithm,
            mode = %mode,
            work_factor = result.work_factor,
            "computed credential digest"
        );
        Ok(result)
    }
}

/// Check a secret against a stored record under the default policy
pub fn verify(secret: &[u8], record: &HashResult) -> Result<bool> {
    HashPolicy::default().verify(secret, record)
}

impl HashPolicy {
    /// Check a secret against a stored record using the record's own salt and
    /// work factor. A PBKDF2 digest must be exactly `output_len` bytes wide.
    pub fn verify(&self, secret: &[u8], record: &HashResult) -> Result<bool> {
        match record.algorithm {
            Algorithm::Pbkdf2Sha256 => {
                let salt = record
                    .salt_bytes()?
                    .ok_or_else(|| Error::InvalidInput("PBKDF2 record has no salt".to_string()))?;
                if record.work_factor == 0 {
                    return Err(Error::UnsupportedAlgorithm("zero work factor".to_string()));
                }
                let expected = record.digest_bytes()?;
                if expected.is_empty() || expected.len() != self.output_len {
                    return Err(Error::InvalidInput(format!(
                        "digest is {} bytes, expected {}",
                        expected.len(),
                        self.output_len
                    )));
                }
                let actual = derive_pbkdf2(secret, &salt, record.work_factor, self.output_len);
                Ok(bool::from(actual.as_slice().ct_eq(expected.as_slice())))
            }
            Algorithm::Bcrypt => bcrypt::verify(secret, &record.digest)
                .map_err(|e| Error::InvalidInput(e.to_string())),
        }
    }

    /// bcrypt at the SAFE cost with a fresh salt but no length ceiling.
    ///
    /// Input past 72 bytes is dropped without notice, which is the defect the
    /// combined-credential scenario shows.
    pub fn bcrypt_unchecked(&self, secret: &[u8]) -> Result<HashResult> {
        self.validate()?;
        bcrypt_record(secret, self.bcrypt_cost, fresh_bcrypt_salt())
    }
}

/// The key an HMAC-SHA-256 based KDF actually uses for an over-long secret.
///
/// Secrets longer than the 64-byte block are hashed first, so the secret and
/// this digest derive the same key. `None` when the secret fits the block.
pub fn prehash_equivalent(secret: &[u8]) -> Option<Vec<u8>> {
    if secret.len() > HMAC_SHA256_BLOCK {
        Some(Sha256::digest(secret).to_vec())
    } else {
        None
    }
}

/// `username|password`, the combined credential string of the bcrypt defect
pub fn combined_credential(username: &str, password: &str) -> Vec<u8> {
    format!("{}|{}", username, password).into_bytes()
}

fn derive_pbkdf2(secret: &[u8], salt: &[u8], iterations: u32, output_len: usize) -> Vec<u8> {
    let mut key = vec![0u8; output_len];
    pbkdf2::pbkdf2_hmac::<Sha256>(secret, salt, iterations, &mut key);
    key
}

fn bcrypt_record(secret: &[u8], cost: u32, salt: [u8; 16]) -> Result<HashResult> {
    let parts = bcrypt::hash_with_salt(secret, cost, salt)
        .map_err(|e| Error::UnsupportedAlgorithm(e.to_string()))?;
    Ok(HashResult {
        salt: None,
        digest: parts.format_for_version(bcrypt::Version::TwoB),
        algorithm: Algorithm::Bcrypt,
        work_factor: cost,
    })
}

fn fresh_bcrypt_salt() -> [u8; 16] {
    let mut salt = [0u8; 16];
    rand::rng().fill_bytes(&mut salt);
    salt
}

fn random_salt(len: usize) -> Vec<u8> {
    let mut salt = vec![0u8; len];
    rand::rng().fill_bytes(&mut salt);
    salt
}

/// Static salt bytes, zero padded or cut to bcrypt's 16
fn static_bcrypt_salt(static_salt: &str) -> [u8; 16] {
    let mut salt = [0u8; 16];
    for (slot, byte) in salt.iter_mut().zip(static_salt.as_bytes()) {
        *slot = *byte;
    }
    salt
}

fn decode(value: &str, what: &str) -> Result<Vec<u8>> {
    general_purpose::STANDARD
        .decode(value)
        .map_err(|e| Error::InvalidInput(format!("{} is not base64: {}", what, e)))
}
