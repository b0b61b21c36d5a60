//! Hidden-volume encoding of secrets into records.
//!
//! Encoding seals every secret of a record in one pass; decoding opens the
//! single layer a passphrase belongs to.

mod decoder;
mod encoder;

pub use decoder::decode;
pub use encoder::encode;
