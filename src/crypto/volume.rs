//! Hidden-volume layout: several passphrase-protected layers in one block.
//!
//! A block has a header region of 16-byte slots and a data region of fixed
//! capacity. Each layer owns one slot, masked with a key derived from its
//! passphrase, pointing at its AES-256-GCM sealed message in the data region.
//! Unused slots and unused data are random bytes, so a block carrying one
//! layer looks the same as a block carrying three.
//!
//! ```text
//! slot = (offset u32 LE || length u32 LE || 0u8 x 8) XOR header_mask
//! ```

use crate::config::{KdfParams, HEADER_SLOT_SIZE};
use crate::crypto::cipher::{sealed_length, Cipher, NONCE_SIZE};
use crate::crypto::kdf::{KeyDerivation, Salt};
use crate::error::{Error, Result};
use crate::record::{Metadata, Record};
use rand::seq::SliceRandom;
use rand::RngCore;
use std::fmt;
use zeroize::Zeroizing;

/// One layer to seal: a message and the passphrase that opens it.
#[derive(Clone)]
pub struct Layer {
    /// Plaintext message.
    pub message: Zeroizing<Vec<u8>>,
    /// Concatenated passphrase.
    pub passphrase: Zeroizing<String>,
}

impl Layer {
    /// Create a layer.
    pub fn new(message: impl Into<Vec<u8>>, passphrase: impl Into<String>) -> Self {
        Self {
            message: Zeroizing::new(message.into()),
            passphrase: Zeroizing::new(passphrase.into()),
        }
    }
}

impl fmt::Debug for Layer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Layer")
            .field("len", &self.message.len())
            .finish()
    }
}

/// Key derivation scheme a block is sealed or opened with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scheme {
    /// Parameters used for new records.
    Current,
    /// Parameters of the older record format.
    Legacy,
}

/// Cipher/KDF primitive that packs layers into one record.
///
/// Implementations must make every layer indistinguishable from a record
/// that only carries that layer.
pub trait HiddenVolumeCipher {
    /// Sealed length of a message of `message_len` bytes.
    fn estimate_length(&self, message_len: usize) -> usize;

    /// Seal `layers` into a record with the given header size and data capacity.
    fn encrypt_hidden(&self, layers: &[Layer], header_size: usize, capacity: usize)
        -> Result<Record>;

    /// Open the layer of `record` belonging to `passphrase`.
    ///
    /// `legacy` selects the older key derivation scheme.
    fn decrypt(
        &self,
        passphrase: &str,
        record: &Record,
        legacy: bool,
    ) -> Result<Zeroizing<Vec<u8>>>;
}

/// Argon2id + AES-256-GCM hidden-volume cipher.
#[derive(Debug, Clone)]
pub struct BlockVolume {
    kdf: KdfParams,
    legacy_kdf: KdfParams,
}

impl BlockVolume {
    /// Create a cipher with the current and legacy KDF parameters.
    pub fn new(kdf: KdfParams, legacy_kdf: KdfParams) -> Self {
        Self { kdf, legacy_kdf }
    }

    fn params(&self, scheme: Scheme) -> KdfParams {
        match scheme {
            Scheme::Current => self.kdf,
            Scheme::Legacy => self.legacy_kdf,
        }
    }

    /// Seal layers under an explicit scheme.
    pub fn seal(
        &self,
        layers: &[Layer],
        header_size: usize,
        capacity: usize,
        scheme: Scheme,
    ) -> Result<Record> {
        if header_size == 0 || header_size % HEADER_SLOT_SIZE != 0 {
            return Err(Error::Validation(format!(
                "Header size must be a positive multiple of {}",
                HEADER_SLOT_SIZE
            )));
        }
        let slots = header_size / HEADER_SLOT_SIZE;
        if layers.is_empty() || layers.len() > slots {
            return Err(Error::Validation(format!(
                "A block holds between 1 and {} layers",
                slots
            )));
        }

        let needed: usize = layers
            .iter()
            .map(|layer| sealed_length(layer.message.len()))
            .sum();
        if needed > capacity || capacity > u32::MAX as usize {
            return Err(Error::CapacityExceeded {
                secret: layers.len(),
                needed,
                available: capacity,
            });
        }

        let mut rng = rand::thread_rng();
        let kdf = KeyDerivation::new(self.params(scheme));

        let mut iv = [0u8; NONCE_SIZE];
        rng.fill_bytes(&mut iv);

        let mut headers = vec![0u8; header_size];
        rng.fill_bytes(&mut headers);
        let mut data = vec![0u8; capacity];
        rng.fill_bytes(&mut data);

        let mut slot_order: Vec<usize> = (0..slots).collect();
        slot_order.shuffle(&mut rng);

        let mut offset = 0usize;
        for (layer, &slot) in layers.iter().zip(slot_order.iter()) {
            let keys = kdf.derive_layer_keys(&layer.passphrase, &iv)?;
            let sealed = Cipher::new(&keys.data_key).seal(&iv, &layer.message)?;

            data[offset..offset + sealed.len()].copy_from_slice(&sealed);

            let mut entry = [0u8; HEADER_SLOT_SIZE];
            entry[..4].copy_from_slice(&(offset as u32).to_le_bytes());
            entry[4..8].copy_from_slice(&(sealed.len() as u32).to_le_bytes());
            for (byte, mask) in entry.iter_mut().zip(keys.header_mask.iter()) {
                *byte ^= mask;
            }

            let start = slot * HEADER_SLOT_SIZE;
            headers[start..start + HEADER_SLOT_SIZE].copy_from_slice(&entry);
            offset += sealed.len();
        }

        Ok(Record {
            salt: kdf.salt().to_vec(),
            iv: iv.to_vec(),
            headers,
            data,
            metadata: Metadata::default(),
        })
    }

    /// Open a layer under an explicit scheme.
    pub fn open(&self, passphrase: &str, record: &Record, scheme: Scheme) -> Result<Zeroizing<Vec<u8>>> {
        let salt: Salt = record
            .salt
            .as_slice()
            .try_into()
            .map_err(|_| Error::CipherMismatch)?;
        let iv: [u8; NONCE_SIZE] = record
            .iv
            .as_slice()
            .try_into()
            .map_err(|_| Error::CipherMismatch)?;
        if record.headers.is_empty() || record.headers.len() % HEADER_SLOT_SIZE != 0 {
            return Err(Error::CipherMismatch);
        }

        let kdf = KeyDerivation::from_salt(salt, self.params(scheme));
        let keys = kdf.derive_layer_keys(passphrase, &iv)?;
        let cipher = Cipher::new(&keys.data_key);

        for slot in record.headers.chunks_exact(HEADER_SLOT_SIZE) {
            let mut entry = Zeroizing::new([0u8; HEADER_SLOT_SIZE]);
            for ((out, byte), mask) in entry.iter_mut().zip(slot).zip(keys.header_mask.iter()) {
                *out = byte ^ mask;
            }
            if entry[8..].iter().any(|&b| b != 0) {
                continue;
            }

            let offset = u32::from_le_bytes([entry[0], entry[1], entry[2], entry[3]]) as usize;
            let length = u32::from_le_bytes([entry[4], entry[5], entry[6], entry[7]]) as usize;
            let end = match offset.checked_add(length) {
                Some(end) if end <= record.data.len() => end,
                _ => continue,
            };

            if let Ok(message) = cipher.open(&iv, &record.data[offset..end]) {
                return Ok(Zeroizing::new(message));
            }
        }

        Err(Error::CipherMismatch)
    }
}

impl HiddenVolumeCipher for BlockVolume {
    fn estimate_length(&self, message_len: usize) -> usize {
        sealed_length(message_len)
    }

    fn encrypt_hidden(
        &self,
        layers: &[Layer],
        header_size: usize,
        capacity: usize,
    ) -> Result<Record> {
        self.seal(layers, header_size, capacity, Scheme::Current)
    }

    fn decrypt(
        &self,
        passphrase: &str,
        record: &Record,
        legacy: bool,
    ) -> Result<Zeroizing<Vec<u8>>> {
        let scheme = if legacy { Scheme::Legacy } else { Scheme::Current };
        self.open(passphrase, record, scheme)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;

    fn volume() -> BlockVolume {
        let config = EngineConfig::interactive();
        BlockVolume::new(config.kdf, config.legacy_kdf)
    }

    #[test]
    fn test_single_layer_roundtrip() {
        let volume = volume();
        let record = volume
            .encrypt_hidden(&[Layer::new("seed words", "correct horse")], 48, 1024)
            .unwrap();

        assert_eq!(record.headers.len(), 48);
        assert_eq!(record.data.len(), 1024);

        let message = volume.decrypt("correct horse", &record, false).unwrap();
        assert_eq!(message.as_slice(), b"seed words");
    }

    #[test]
    fn test_each_passphrase_opens_its_layer() {
        let volume = volume();
        let layers = [
            Layer::new("first", "alpha passphrase"),
            Layer::new("second", "bravo passphrase"),
            Layer::new("third", "charlie passphrase"),
        ];
        let record = volume.encrypt_hidden(&layers, 48, 1024).unwrap();

        for layer in &layers {
            let message = volume.decrypt(&layer.passphrase, &record, false).unwrap();
            assert_eq!(message.as_slice(), layer.message.as_slice());
        }
    }

    #[test]
    fn test_unknown_passphrase_fails_the_same_way() {
        let volume = volume();
        let one = volume
            .encrypt_hidden(&[Layer::new("a", "alpha passphrase")], 48, 1024)
            .unwrap();
        let three = volume
            .encrypt_hidden(
                &[
                    Layer::new("a", "alpha passphrase"),
                    Layer::new("b", "bravo passphrase"),
                    Layer::new("c", "charlie passphrase"),
                ],
                48,
                1024,
            )
            .unwrap();

        assert_eq!(one.headers.len(), three.headers.len());
        assert_eq!(one.data.len(), three.data.len());
        assert!(matches!(
            volume.decrypt("delta passphrase", &one, false),
            Err(Error::CipherMismatch)
        ));
        assert!(matches!(
            volume.decrypt("delta passphrase", &three, false),
            Err(Error::CipherMismatch)
        ));
    }

    #[test]
    fn test_legacy_scheme_needs_legacy_flag() {
        let volume = volume();
        let record = volume
            .seal(&[Layer::new("old", "passphrase")], 48, 1024, Scheme::Legacy)
            .unwrap();

        assert!(volume.decrypt("passphrase", &record, false).is_err());
        assert_eq!(
            volume.decrypt("passphrase", &record, true).unwrap().as_slice(),
            b"old"
        );
    }

    #[test]
    fn test_too_many_layers_rejected() {
        let volume = volume();
        let layers = vec![Layer::new("x", "p"); 4];

        assert!(matches!(
            volume.encrypt_hidden(&layers, 48, 1024),
            Err(Error::Validation(_))
        ));
    }

    #[test]
    fn test_over_capacity_rejected() {
        let volume = volume();
        let layers = [Layer::new(vec![0u8; 1009], "p")];

        assert!(matches!(
            volume.encrypt_hidden(&layers, 48, 1024),
            Err(Error::CapacityExceeded { .. })
        ));
    }

    #[test]
    fn test_exact_capacity_fits() {
        let volume = volume();
        let layers = [Layer::new(vec![9u8; 1008], "p")];
        let record = volume.encrypt_hidden(&layers, 48, 1024).unwrap();

        assert_eq!(volume.decrypt("p", &record, false).unwrap().len(), 1008);
    }

    #[test]
    fn test_truncated_record_fails_cleanly() {
        let volume = volume();
        let mut record = volume
            .encrypt_hidden(&[Layer::new("msg", "p")], 48, 1024)
            .unwrap();
        record.data.truncate(4);

        assert!(matches!(
            volume.decrypt("p", &record, false),
            Err(Error::CipherMismatch)
        ));
    }
}
