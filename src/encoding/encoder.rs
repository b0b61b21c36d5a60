//! Packs secrets into a hidden-volume record.

use crate::config::EngineConfig;
use crate::crypto::{HiddenVolumeCipher, Layer};
use crate::error::Result;
use crate::record::{Metadata, Record};

/// Seal 1 to `config.header_slots()` layers into one record.
///
/// Each layer is opened by its own passphrase and reveals nothing about the
/// others. Key derivation runs once per layer, in order.
///
/// # Example
///
/// ```
/// use paper_vault::config::EngineConfig;
/// use paper_vault::crypto::{BlockVolume, Layer};
/// use paper_vault::encoding::{decode, encode};
/// use paper_vault::record::Metadata;
///
/// let config = EngineConfig::interactive();
/// let volume = BlockVolume::new(config.kdf, config.legacy_kdf);
///
/// let layers = [Layer::new("seed words", "passphrase")];
/// let record = encode(&volume, &layers, Metadata::default(), &config).unwrap();
///
/// let message = decode(&volume, "passphrase", &record).unwrap();
/// assert_eq!(message.as_slice(), b"seed words");
/// ```
pub fn encode<C>(
    cipher: &C,
    layers: &[Layer],
    metadata: Metadata,
    config: &EngineConfig,
) -> Result<Record>
where
    C: HiddenVolumeCipher + ?Sized,
{
    let mut record = cipher.encrypt_hidden(layers, config.header_size, config.capacity)?;
    record.metadata = metadata;
    Ok(record)
}
