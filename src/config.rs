//! Configuration constants and types for paper vault records.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Default record capacity in length units (bytes of sealed data region).
pub const DEFAULT_CAPACITY: usize = 1024;

/// Default header region size (three 16-byte slots).
pub const DEFAULT_HEADER_SIZE: usize = 48;

/// Size of a single header slot.
pub const HEADER_SLOT_SIZE: usize = 16;

/// Per-secret overhead charged when threshold sharing is active.
pub const SHARE_OVERHEAD: usize = 56;

/// Maximum label length in characters.
pub const MAX_LABEL_LENGTH: usize = 64;

/// Maximum number of secrets packed into one record.
pub const MAX_SECRETS: usize = 3;

/// Marker prefixed to every share carried as a secret message.
pub const SHARE_MARKER: &[u8; 7] = b"shamir:";

/// Number of hex characters in a short hash.
pub const SHORT_HASH_LENGTH: usize = 8;

/// Argon2id parameters for key derivation.
pub mod argon2_params {
    /// Memory cost in KiB (64 MB).
    pub const MEMORY_COST: u32 = 65536;

    /// Time cost (iterations).
    pub const TIME_COST: u32 = 3;

    /// Parallelism factor.
    pub const PARALLELISM: u32 = 4;

    /// Legacy memory cost in KiB (32 MB).
    pub const LEGACY_MEMORY_COST: u32 = 32768;

    /// Legacy time cost.
    pub const LEGACY_TIME_COST: u32 = 2;

    /// Legacy parallelism factor.
    pub const LEGACY_PARALLELISM: u32 = 1;

    /// Output length in bytes (256 bits).
    pub const OUTPUT_LENGTH: usize = 32;

    /// Salt length in bytes.
    pub const SALT_LENGTH: usize = 16;
}

/// Argon2id cost parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct KdfParams {
    /// Memory cost in KiB.
    pub memory_cost: u32,
    /// Iterations.
    pub time_cost: u32,
    /// Lanes.
    pub parallelism: u32,
}

impl KdfParams {
    /// Parameters for records written today.
    pub const fn current() -> Self {
        Self {
            memory_cost: argon2_params::MEMORY_COST,
            time_cost: argon2_params::TIME_COST,
            parallelism: argon2_params::PARALLELISM,
        }
    }

    /// Parameters used by the older record scheme.
    pub const fn legacy() -> Self {
        Self {
            memory_cost: argon2_params::LEGACY_MEMORY_COST,
            time_cost: argon2_params::LEGACY_TIME_COST,
            parallelism: argon2_params::LEGACY_PARALLELISM,
        }
    }

    /// Cheap parameters for tests and quick experiments. Not for real backups.
    pub const fn interactive() -> Self {
        Self {
            memory_cost: 64,
            time_cost: 1,
            parallelism: 1,
        }
    }

    /// Validate against Argon2 minimums.
    pub fn validate(&self) -> Result<()> {
        if self.parallelism == 0 || self.time_cost == 0 {
            return Err(Error::Validation(
                "KDF time cost and parallelism must be greater than 0".to_string(),
            ));
        }
        if self.memory_cost < 8 * self.parallelism {
            return Err(Error::Validation(format!(
                "KDF memory cost must be at least {} KiB",
                8 * self.parallelism
            )));
        }
        Ok(())
    }
}

impl Default for KdfParams {
    fn default() -> Self {
        Self::current()
    }
}

/// Engine configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Size of the sealed data region of a record.
    pub capacity: usize,

    /// Size of the header region of a record.
    pub header_size: usize,

    /// Overhead charged per secret in threshold mode.
    pub share_overhead: usize,

    /// Maximum label length in characters.
    pub max_label_length: usize,

    /// KDF parameters of the current scheme.
    pub kdf: KdfParams,

    /// KDF parameters of the legacy scheme.
    pub legacy_kdf: KdfParams,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
            header_size: DEFAULT_HEADER_SIZE,
            share_overhead: SHARE_OVERHEAD,
            max_label_length: MAX_LABEL_LENGTH,
            kdf: KdfParams::current(),
            legacy_kdf: KdfParams::legacy(),
        }
    }
}

impl EngineConfig {
    /// Reference layout with cheap KDF parameters for both schemes.
    pub fn interactive() -> Self {
        Self {
            kdf: KdfParams::interactive(),
            legacy_kdf: KdfParams {
                time_cost: 2,
                ..KdfParams::interactive()
            },
            ..Self::default()
        }
    }

    /// Number of header slots, i.e. the most secrets one record can carry.
    pub fn header_slots(&self) -> usize {
        self.header_size / HEADER_SLOT_SIZE
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.capacity == 0 {
            return Err(Error::Validation(
                "Capacity must be greater than 0".to_string(),
            ));
        }
        if self.header_size == 0 || self.header_size % HEADER_SLOT_SIZE != 0 {
            return Err(Error::Validation(format!(
                "Header size must be a positive multiple of {}",
                HEADER_SLOT_SIZE
            )));
        }
        if self.capacity > u32::MAX as usize {
            return Err(Error::Validation("Capacity is too large".to_string()));
        }
        self.kdf.validate()?;
        self.legacy_kdf.validate()
    }
}

/// How a set of secrets is written out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Mode {
    /// One record holding the secrets directly.
    Direct,
    /// `shares` records, any `threshold` of which recover the secrets.
    Threshold { shares: u8, threshold: u8 },
}

impl Mode {
    /// Whether threshold sharing is active.
    pub fn is_threshold(&self) -> bool {
        matches!(self, Mode::Threshold { .. })
    }

    /// Number of records this mode produces.
    pub fn record_count(&self) -> usize {
        match self {
            Mode::Direct => 1,
            Mode::Threshold { shares, .. } => *shares as usize,
        }
    }

    /// Validate share and threshold counts.
    pub fn validate(&self) -> Result<()> {
        match *self {
            Mode::Direct => Ok(()),
            Mode::Threshold { shares, threshold } => {
                if threshold == 0 || shares == 0 {
                    return Err(Error::Validation(
                        "Number of shares and threshold must be positive".to_string(),
                    ));
                }
                if threshold > shares {
                    return Err(Error::Validation(format!(
                        "Threshold {} exceeds number of shares {}",
                        threshold, shares
                    )));
                }
                Ok(())
            }
        }
    }
}

/// Named threshold configuration such as `2of3`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThresholdProfile {
    /// Shares required to recover.
    pub threshold: u8,
    /// Shares produced.
    pub shares: u8,
}

impl ThresholdProfile {
    /// 2-of-3.
    pub const TWO_OF_THREE: Self = Self {
        threshold: 2,
        shares: 3,
    };

    /// 3-of-5.
    pub const THREE_OF_FIVE: Self = Self {
        threshold: 3,
        shares: 5,
    };

    /// 4-of-7.
    pub const FOUR_OF_SEVEN: Self = Self {
        threshold: 4,
        shares: 7,
    };

    /// The mode this profile selects.
    pub fn mode(&self) -> Mode {
        Mode::Threshold {
            shares: self.shares,
            threshold: self.threshold,
        }
    }
}

impl FromStr for ThresholdProfile {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = || Error::Validation(format!("Invalid threshold profile: {}", s));
        let (threshold, shares) = s.trim().split_once("of").ok_or_else(invalid)?;
        let profile = Self {
            threshold: threshold.trim().parse().map_err(|_| invalid())?,
            shares: shares.trim().parse().map_err(|_| invalid())?,
        };
        profile.mode().validate()?;
        Ok(profile)
    }
}

impl fmt::Display for ThresholdProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}of{}", self.threshold, self.shares)
    }
}
