//! Threshold splitting and reconstruction over `sharks`.

use crate::config::Mode;
use crate::error::{Error, Result};
use crate::sharing::share::{Share, SplitId, SPLIT_ID_LENGTH};
use rand::RngCore;
use sha2::{Digest, Sha256};
use sharks::Sharks;
use std::collections::BTreeMap;
use zeroize::Zeroizing;

/// Bytes of SHA-256 appended to the secret before splitting.
pub const CHECKSUM_LENGTH: usize = 8;

fn checksum(message: &[u8]) -> [u8; CHECKSUM_LENGTH] {
    let digest = Sha256::digest(message);
    let mut sum = [0u8; CHECKSUM_LENGTH];
    sum.copy_from_slice(&digest[..CHECKSUM_LENGTH]);
    sum
}

/// Split `message` into `shares` shares, any `threshold` of which reconstruct it.
///
/// # Example
///
/// ```
/// use paper_vault::sharing::{combine, split};
///
/// let shares = split(b"hello world", 3, 2).unwrap();
/// let message = combine(&shares[1..]).unwrap();
///
/// assert_eq!(message.as_slice(), b"hello world");
/// ```
pub fn split(message: &[u8], shares: u8, threshold: u8) -> Result<Vec<Share>> {
    Mode::Threshold { shares, threshold }.validate()?;
    if message.is_empty() {
        return Err(Error::Validation("Cannot split an empty secret".to_string()));
    }

    let mut split_id: SplitId = [0u8; SPLIT_ID_LENGTH];
    rand::thread_rng().fill_bytes(&mut split_id);

    let mut secret = Zeroizing::new(Vec::with_capacity(message.len() + CHECKSUM_LENGTH));
    secret.extend_from_slice(message);
    secret.extend_from_slice(&checksum(message));

    let dealer = Sharks(threshold).dealer(&secret);
    Ok(dealer
        .take(shares as usize)
        .map(|share| Share {
            split_id,
            threshold,
            data: Vec::from(&share),
        })
        .collect())
}

/// Reconstruct the message from shares of a single split.
///
/// Duplicates are ignored and order does not matter. Too few distinct
/// shares, shares of different splits, and corrupt shares all fail with
/// `ReconstructionFailed`.
pub fn combine(shares: &[Share]) -> Result<Zeroizing<Vec<u8>>> {
    let first = shares
        .first()
        .ok_or_else(|| Error::ReconstructionFailed("no shares".to_string()))?;

    if shares
        .iter()
        .any(|s| s.split_id != first.split_id || s.threshold != first.threshold)
    {
        return Err(Error::ReconstructionFailed(
            "shares belong to different splits".to_string(),
        ));
    }

    let mut distinct: BTreeMap<u8, &Share> = BTreeMap::new();
    for share in shares {
        match distinct.get(&share.index()) {
            Some(existing) if existing.data != share.data => {
                return Err(Error::ReconstructionFailed(format!(
                    "conflicting shares for index {}",
                    share.index()
                )));
            }
            Some(_) => {}
            None => {
                distinct.insert(share.index(), share);
            }
        }
    }

    let threshold = first.threshold as usize;
    if distinct.len() < threshold {
        return Err(Error::ReconstructionFailed(format!(
            "need {} shares, have {}",
            threshold,
            distinct.len()
        )));
    }

    let parsed = distinct
        .values()
        .map(|share| {
            sharks::Share::try_from(share.data.as_slice())
                .map_err(|e| Error::ReconstructionFailed(e.to_string()))
        })
        .collect::<Result<Vec<_>>>()?;

    let recovered = Zeroizing::new(
        Sharks(first.threshold)
            .recover(&parsed)
            .map_err(|e| Error::ReconstructionFailed(e.to_string()))?,
    );

    if recovered.len() <= CHECKSUM_LENGTH {
        return Err(Error::ReconstructionFailed(
            "reconstructed secret is too short".to_string(),
        ));
    }
    let (message, sum) = recovered.split_at(recovered.len() - CHECKSUM_LENGTH);
    if checksum(message) != sum {
        return Err(Error::ReconstructionFailed(
            "checksum mismatch".to_string(),
        ));
    }

    Ok(Zeroizing::new(message.to_vec()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const MESSAGE: &[u8] = b"hello world";

    #[test]
    fn test_any_threshold_subset_combines() {
        let shares = split(MESSAGE, 5, 3).unwrap();
        assert_eq!(shares.len(), 5);

        for a in 0..5 {
            for b in (a + 1)..5 {
                for c in (b + 1)..5 {
                    let subset = [shares[a].clone(), shares[b].clone(), shares[c].clone()];
                    assert_eq!(combine(&subset).unwrap().as_slice(), MESSAGE);
                }
            }
        }
    }

    #[test]
    fn test_below_threshold_fails() {
        let shares = split(MESSAGE, 5, 3).unwrap();

        assert!(matches!(
            combine(&shares[..2]),
            Err(Error::ReconstructionFailed(_))
        ));
        assert!(combine(&shares[..1]).is_err());
        assert!(combine(&[]).is_err());
    }

    #[test]
    fn test_superset_with_duplicates_combines() {
        let shares = split(MESSAGE, 3, 2).unwrap();
        let mut all = shares.clone();
        all.push(shares[0].clone());
        all.push(shares[2].clone());
        all.reverse();

        assert_eq!(combine(&all).unwrap().as_slice(), MESSAGE);
    }

    #[test]
    fn test_duplicates_do_not_count_toward_threshold() {
        let shares = split(MESSAGE, 3, 2).unwrap();
        let twice = [shares[1].clone(), shares[1].clone()];

        assert!(combine(&twice).is_err());
    }

    #[test]
    fn test_different_splits_do_not_mix() {
        let a = split(MESSAGE, 3, 2).unwrap();
        let b = split(b"other secret", 3, 2).unwrap();

        assert!(matches!(
            combine(&[a[0].clone(), b[1].clone()]),
            Err(Error::ReconstructionFailed(_))
        ));
    }

    #[test]
    fn test_corrupt_share_detected() {
        let mut shares = split(MESSAGE, 3, 2).unwrap();
        let last = shares[1].data.len() - 1;
        shares[1].data[last] ^= 0x55;

        assert!(combine(&shares[..2]).is_err());
    }

    #[test]
    fn test_threshold_of_one() {
        let shares = split(MESSAGE, 2, 1).unwrap();

        assert_eq!(combine(&shares[1..]).unwrap().as_slice(), MESSAGE);
    }

    #[test]
    fn test_invalid_parameters() {
        assert!(matches!(split(MESSAGE, 2, 3), Err(Error::Validation(_))));
        assert!(matches!(split(MESSAGE, 0, 0), Err(Error::Validation(_))));
        assert!(matches!(split(b"", 3, 2), Err(Error::Validation(_))));
    }
}
