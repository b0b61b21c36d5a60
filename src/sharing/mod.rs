//! Threshold secret sharing.
//!
//! Shares travel as ordinary secret messages prefixed with a marker, so the
//! same hidden-volume encoding serves direct and threshold modes.

mod set;
mod share;
mod splitter;

pub use set::ShareSet;
pub use share::{tag, untag, Share, SplitId, SPLIT_ID_LENGTH};
pub use splitter::{combine, split, CHECKSUM_LENGTH};
