//! Per-record layer sets for threshold mode.

use crate::crypto::Layer;
use crate::error::Result;
use crate::secret::Secret;
use crate::sharing::share::tag;
use crate::sharing::splitter::split;
use zeroize::Zeroizing;

/// Layers for each share index: record `i` carries share `i` of every secret.
#[derive(Debug)]
pub struct ShareSet {
    records: Vec<Vec<Layer>>,
}

impl ShareSet {
    /// Split every secret and regroup the tagged shares by index.
    pub fn build(secrets: &[Secret], shares: u8, threshold: u8) -> Result<Self> {
        let mut records: Vec<Vec<Layer>> = (0..shares).map(|_| Vec::new()).collect();

        for secret in secrets {
            let passphrase = secret.passphrase();
            for (index, share) in split(secret.message(), shares, threshold)?
                .iter()
                .enumerate()
            {
                records[index].push(Layer {
                    message: Zeroizing::new(tag(share)),
                    passphrase: passphrase.clone(),
                });
            }
        }

        Ok(Self { records })
    }

    /// Number of records to produce.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the set is empty.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Layers of each record, in index order.
    pub fn into_records(self) -> impl Iterator<Item = Vec<Layer>> {
        self.records.into_iter()
    }
}
