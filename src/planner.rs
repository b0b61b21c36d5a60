//! Capacity accounting, run before any key derivation.

use crate::config::EngineConfig;
use crate::crypto::HiddenVolumeCipher;
use crate::error::{Error, Result};
use crate::secret::Secret;

/// How the record budget is split between the primary and hidden secrets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DataLengths {
    /// Whole record budget.
    pub total: usize,
    /// Units used by the primary secret.
    pub primary: usize,
    /// Units left for hidden secrets after the primary one.
    pub max_hidden: usize,
    /// Units still free after all hidden secrets.
    pub remaining_hidden: usize,
}

/// Checks that a set of secrets fits in one record.
#[derive(Debug, Clone)]
pub struct CapacityPlanner {
    capacity: usize,
    share_overhead: usize,
    max_secrets: usize,
}

impl CapacityPlanner {
    /// Create a planner for the given configuration.
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            capacity: config.capacity,
            share_overhead: config.share_overhead,
            max_secrets: config.header_slots(),
        }
    }

    /// Units a single secret consumes.
    pub fn required<C>(&self, secret: &Secret, threshold: bool, cipher: &C) -> usize
    where
        C: HiddenVolumeCipher + ?Sized,
    {
        let mut length = cipher.estimate_length(secret.message().len());
        if threshold {
            length += self.share_overhead;
        }
        length
    }

    /// Account for `secrets` in declaration order.
    ///
    /// The first secret may use the whole capacity; each hidden secret uses
    /// what the secrets before it left over. Fails on the first secret that
    /// does not fit.
    pub fn plan<C>(&self, secrets: &[Secret], threshold: bool, cipher: &C) -> Result<DataLengths>
    where
        C: HiddenVolumeCipher + ?Sized,
    {
        if secrets.is_empty() || secrets.len() > self.max_secrets {
            return Err(Error::Validation(format!(
                "Expected between 1 and {} secrets, got {}",
                self.max_secrets,
                secrets.len()
            )));
        }

        let mut remaining = self.capacity;
        let mut primary = 0;
        for (index, secret) in secrets.iter().enumerate() {
            let needed = self.required(secret, threshold, cipher);
            if needed > remaining {
                return Err(Error::CapacityExceeded {
                    secret: index + 1,
                    needed,
                    available: remaining,
                });
            }
            if index == 0 {
                primary = needed;
            }
            remaining -= needed;
        }

        Ok(DataLengths {
            total: self.capacity,
            primary,
            max_hidden: self.capacity - primary,
            remaining_hidden: remaining,
        })
    }
}
