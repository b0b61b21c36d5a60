//! Share envelope carried inside a hidden layer.

use crate::config::SHARE_MARKER;
use crate::error::{Error, Result};
use std::fmt;

/// Length of the identifier shared by all shares of one split.
pub const SPLIT_ID_LENGTH: usize = 8;

/// Identifier shared by all shares of one split.
pub type SplitId = [u8; SPLIT_ID_LENGTH];

/// One share of a split secret.
///
/// Encoded as `split_id (8) || threshold (1) || x (1) || y (..)`.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Share {
    pub(crate) split_id: SplitId,
    pub(crate) threshold: u8,
    /// Share bytes as produced by `sharks`: x-coordinate then y-values.
    pub(crate) data: Vec<u8>,
}

impl Share {
    /// The split this share belongs to.
    pub fn split_id(&self) -> &SplitId {
        &self.split_id
    }

    /// Shares needed to reconstruct.
    pub fn threshold(&self) -> u8 {
        self.threshold
    }

    /// The share's x-coordinate.
    pub fn index(&self) -> u8 {
        self.data[0]
    }

    /// Encode the envelope.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(SPLIT_ID_LENGTH + 1 + self.data.len());
        bytes.extend_from_slice(&self.split_id);
        bytes.push(self.threshold);
        bytes.extend_from_slice(&self.data);
        bytes
    }

    /// Decode an envelope produced by [`to_bytes`](Self::to_bytes).
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        // split id, threshold, x and at least one y byte
        if bytes.len() < SPLIT_ID_LENGTH + 3 {
            return Err(Error::ReconstructionFailed("share is truncated".to_string()));
        }
        let (split_id, rest) = bytes.split_at(SPLIT_ID_LENGTH);
        let threshold = rest[0];
        if threshold == 0 {
            return Err(Error::ReconstructionFailed(
                "share has a zero threshold".to_string(),
            ));
        }
        if rest[1] == 0 {
            return Err(Error::ReconstructionFailed(
                "share has a zero x-coordinate".to_string(),
            ));
        }

        let mut id = [0u8; SPLIT_ID_LENGTH];
        id.copy_from_slice(split_id);
        Ok(Self {
            split_id: id,
            threshold,
            data: rest[1..].to_vec(),
        })
    }
}

impl fmt::Debug for Share {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Share")
            .field("split_id", &hex::encode(self.split_id))
            .field("threshold", &self.threshold)
            .field("index", &self.index())
            .field("len", &self.data.len())
            .finish()
    }
}

/// Prefix a share with the share marker so it can travel as a secret message.
pub fn tag(share: &Share) -> Vec<u8> {
    let mut message = SHARE_MARKER.to_vec();
    message.extend_from_slice(&share.to_bytes());
    message
}

/// The share body of a decrypted message, if it carries the share marker.
pub fn untag(message: &[u8]) -> Option<&[u8]> {
    message.strip_prefix(SHARE_MARKER.as_slice())
}
