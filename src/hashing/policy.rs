// Hash policy parameters and their validation

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Minimum PBKDF2 iteration count accepted in SAFE mode
pub const PBKDF2_SAFE_FLOOR: u32 = 65_536;
/// Minimum bcrypt cost accepted in SAFE mode
pub const BCRYPT_SAFE_FLOOR: u32 = 12;
/// bcrypt only reads the first 72 bytes of its input
pub const BCRYPT_MAX_INPUT: usize = 72;
/// HMAC-SHA-256 block size; longer keys are pre-hashed
pub const HMAC_SHA256_BLOCK: usize = 64;

const BCRYPT_COST_RANGE: std::ops::RangeInclusive<u32> = 4..=31;

/// Password hashing primitive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Algorithm {
    #[serde(rename = "pbkdf2-sha256")]
    Pbkdf2Sha256,
    #[serde(rename = "bcrypt")]
    Bcrypt,
}

impl Algorithm {
    /// Whether the salt must be stored next to the digest
    pub fn needs_external_salt(&self) -> bool {
        matches!(self, Algorithm::Pbkdf2Sha256)
    }

    pub fn safe_floor(&self) -> u32 {
        match self {
            Algorithm::Pbkdf2Sha256 => PBKDF2_SAFE_FLOOR,
            Algorithm::Bcrypt => BCRYPT_SAFE_FLOOR,
        }
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Algorithm::Pbkdf2Sha256 => write!(f, "pbkdf2-sha256"),
            Algorithm::Bcrypt => write!(f, "bcrypt"),
        }
    }
}

impl FromStr for Algorithm {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "pbkdf2-sha256" | "pbkdf2" | "pbkdf2withhmacsha256" => Ok(Algorithm::Pbkdf2Sha256),
            "bcrypt" => Ok(Algorithm::Bcrypt),
            other => Err(Error::UnsupportedAlgorithm(other.to_string())),
        }
    }
}

/// How a digest is computed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum HashMode {
    /// One hardcoded salt shared by every call, sub-floor work factor, no ceiling
    UnsafeStaticSalt,
    /// Fresh salt and ceiling like SAFE, but the work factor is forced below the floor
    UnsafeLowIteration,
    Safe,
}

impl fmt::Display for HashMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HashMode::UnsafeStaticSalt => write!(f, "unsafe-static-salt"),
            HashMode::UnsafeLowIteration => write!(f, "unsafe-low-iteration"),
            HashMode::Safe => write!(f, "safe"),
        }
    }
}

impl FromStr for HashMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().replace('_', "-").as_str() {
            "safe" => Ok(HashMode::Safe),
            "unsafe-static-salt" => Ok(HashMode::UnsafeStaticSalt),
            "unsafe-low-iteration" => Ok(HashMode::UnsafeLowIteration),
            other => Err(Error::UnsupportedAlgorithm(format!("unknown hash mode '{}'", other))),
        }
    }
}

/// The auditable parameter set behind every digest.
///
/// Deserializable from the `hash` section of the configuration file; missing
/// fields take the defaults below.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HashPolicy {
    pub algorithm: Algorithm,
    /// Upper bound on secret length in SAFE mode, in bytes
    pub max_input_len: usize,
    pub salt_len: usize,
    /// PBKDF2 iterations in SAFE mode
    pub iterations: u32,
    /// PBKDF2 iterations in both UNSAFE modes
    pub unsafe_iterations: u32,
    pub bcrypt_cost: u32,
    pub unsafe_bcrypt_cost: u32,
    /// Derived key width in bytes
    pub output_len: usize,
    /// The hardcoded salt of UNSAFE_STATIC_SALT
    pub static_salt: String,
}

impl Default for HashPolicy {
    fn default() -> Self {
        Self {
            algorithm: Algorithm::Pbkdf2Sha256,
            max_input_len: 1024,
            salt_len: 16,
            iterations: PBKDF2_SAFE_FLOOR,
            unsafe_iterations: 10_000,
            bcrypt_cost: BCRYPT_SAFE_FLOOR,
            unsafe_bcrypt_cost: 4,
            output_len: 32,
            static_salt: "12345678".to_string(),
        }
    }
}

impl HashPolicy {
    /// Same parameters, different primitive
    pub fn with_algorithm(mut self, algorithm: Algorithm) -> Self {
        self.algorithm = algorithm;
        self
    }

    /// Reject parameter sets that would make SAFE unsafe or UNSAFE safe.
    pub fn validate(&self) -> Result<()> {
        if self.iterations < PBKDF2_SAFE_FLOOR {
            return Err(Error::UnsupportedAlgorithm(format!(
                "safe iterations {} below floor {}",
                self.iterations, PBKDF2_SAFE_FLOOR
            )));
        }
        if self.unsafe_iterations == 0 || self.unsafe_iterations >= PBKDF2_SAFE_FLOOR {
            return Err(Error::UnsupportedAlgorithm(format!(
                "unsafe iterations must be in 1..{}, got {}",
                PBKDF2_SAFE_FLOOR, self.unsafe_iterations
            )));
        }
        if !BCRYPT_COST_RANGE.contains(&self.bcrypt_cost) || self.bcrypt_cost < BCRYPT_SAFE_FLOOR {
            return Err(Error::UnsupportedAlgorithm(format!(
                "safe bcrypt cost must be in {}..=31, got {}",
                BCRYPT_SAFE_FLOOR, self.bcrypt_cost
            )));
        }
        if !BCRYPT_COST_RANGE.contains(&self.unsafe_bcrypt_cost)
            || self.unsafe_bcrypt_cost >= BCRYPT_SAFE_FLOOR
        {
            return Err(Error::UnsupportedAlgorithm(format!(
                "unsafe bcrypt cost must be in 4..{}, got {}",
                BCRYPT_SAFE_FLOOR, self.unsafe_bcrypt_cost
            )));
        }
        if self.salt_len == 0 || self.output_len == 0 {
            return Err(Error::UnsupportedAlgorithm(
                "salt and output widths must be non-zero".to_string(),
            ));
        }
        if self.static_salt.is_empty() {
            return Err(Error::UnsupportedAlgorithm("static salt is empty".to_string()));
        }
        Ok(())
    }

    /// Work factor the given mode runs at under this policy's algorithm
    pub fn work_factor(&self, mode: HashMode) -> u32 {
        match (self.algorithm, mode) {
            (Algorithm::Pbkdf2Sha256, HashMode::Safe) => self.iterations,
            (Algorithm::Pbkdf2Sha256, _) => self.unsafe_iterations,
            (Algorithm::Bcrypt, HashMode::Safe) => self.bcrypt_cost,
            (Algorithm::Bcrypt, _) => self.unsafe_bcrypt_cost,
        }
    }

    /// Longest secret SAFE mode accepts for a request ceiling
    pub fn effective_ceiling(&self, requested: usize) -> usize {
        let ceiling = requested.min(self.max_input_len);
        match self.algorithm {
            Algorithm::Bcrypt => ceiling.min(BCRYPT_MAX_INPUT),
            Algorithm::Pbkdf2Sha256 => ceiling,
        }
    }
}
