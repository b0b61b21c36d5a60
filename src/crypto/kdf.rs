//! Argon2id key derivation for passphrase-protected layers.

use crate::config::{argon2_params, KdfParams};
use crate::error::{Error, Result};
use argon2::{Algorithm, Argon2, Params, Version};
use hkdf::Hkdf;
use rand::RngCore;
use sha2::Sha256;
use zeroize::Zeroizing;

/// Salt used by a single record.
pub type Salt = [u8; argon2_params::SALT_LENGTH];

/// Keys for one hidden layer, expanded from the passphrase-derived master key.
pub struct LayerKeys {
    /// Mask applied to the layer's header slot.
    pub header_mask: Zeroizing<[u8; 16]>,
    /// AES-256-GCM key for the layer's data.
    pub data_key: Zeroizing<[u8; 32]>,
}

/// Key derivation using Argon2id.
#[derive(Debug, Clone)]
pub struct KeyDerivation {
    salt: Salt,
    params: KdfParams,
}

impl KeyDerivation {
    /// Create a new KDF with a random salt.
    pub fn new(params: KdfParams) -> Self {
        let mut salt = [0u8; argon2_params::SALT_LENGTH];
        rand::thread_rng().fill_bytes(&mut salt);
        Self { salt, params }
    }

    /// Create a KDF from an existing salt (for decryption).
    pub fn from_salt(salt: Salt, params: KdfParams) -> Self {
        Self { salt, params }
    }

    /// Get the salt for storage.
    pub fn salt(&self) -> &Salt {
        &self.salt
    }

    /// Derive a 256-bit master key from a passphrase.
    pub fn derive_key(&self, passphrase: &str) -> Result<Zeroizing<[u8; 32]>> {
        let params = Params::new(
            self.params.memory_cost,
            self.params.time_cost,
            self.params.parallelism,
            Some(argon2_params::OUTPUT_LENGTH),
        )
        .map_err(|e| Error::KeyDerivation(e.to_string()))?;

        let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);

        let mut key = Zeroizing::new([0u8; 32]);
        argon2
            .hash_password_into(passphrase.as_bytes(), &self.salt, &mut key[..])
            .map_err(|e| Error::KeyDerivation(e.to_string()))?;

        Ok(key)
    }

    /// Derive the header mask and data key for one layer.
    ///
    /// The record's iv is the HKDF salt, so the same passphrase and salt
    /// still yield unrelated keys across records.
    pub fn derive_layer_keys(&self, passphrase: &str, iv: &[u8]) -> Result<LayerKeys> {
        let master = self.derive_key(passphrase)?;
        let hk = Hkdf::<Sha256>::new(Some(iv), &master[..]);

        let mut header_mask = Zeroizing::new([0u8; 16]);
        hk.expand(b"paper-vault header", &mut header_mask[..])
            .map_err(|e| Error::KeyDerivation(e.to_string()))?;

        let mut data_key = Zeroizing::new([0u8; 32]);
        hk.expand(b"paper-vault data", &mut data_key[..])
            .map_err(|e| Error::KeyDerivation(e.to_string()))?;

        Ok(LayerKeys {
            header_mask,
            data_key,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> KdfParams {
        KdfParams::interactive()
    }

    #[test]
    fn test_key_derivation_deterministic() {
        let kdf = KeyDerivation::from_salt([1u8; 16], params());

        let key1 = kdf.derive_key("password123").unwrap();
        let key2 = kdf.derive_key("password123").unwrap();

        assert_eq!(*key1, *key2);
    }

    #[test]
    fn test_different_passwords_different_keys() {
        let kdf = KeyDerivation::from_salt([2u8; 16], params());

        let key1 = kdf.derive_key("password1").unwrap();
        let key2 = kdf.derive_key("password2").unwrap();

        assert_ne!(*key1, *key2);
    }

    #[test]
    fn test_different_params_different_keys() {
        let current = KeyDerivation::from_salt([3u8; 16], params());
        let legacy = KeyDerivation::from_salt(
            [3u8; 16],
            KdfParams {
                time_cost: 2,
                ..params()
            },
        );

        assert_ne!(
            *current.derive_key("password").unwrap(),
            *legacy.derive_key("password").unwrap()
        );
    }

    #[test]
    fn test_layer_keys_depend_on_iv() {
        let kdf = KeyDerivation::from_salt([4u8; 16], params());

        let a = kdf.derive_layer_keys("password", &[0u8; 12]).unwrap();
        let b = kdf.derive_layer_keys("password", &[1u8; 12]).unwrap();

        assert_ne!(*a.data_key, *b.data_key);
        assert_ne!(*a.header_mask, *b.header_mask);
    }

    #[test]
    fn test_new_generates_random_salt() {
        let kdf1 = KeyDerivation::new(params());
        let kdf2 = KeyDerivation::new(params());

        assert_ne!(kdf1.salt(), kdf2.salt());
    }

    #[test]
    fn test_invalid_params_rejected() {
        let kdf = KeyDerivation::from_salt(
            [5u8; 16],
            KdfParams {
                memory_cost: 1,
                time_cost: 1,
                parallelism: 1,
            },
        );

        assert!(matches!(
            kdf.derive_key("password"),
            Err(Error::KeyDerivation(_))
        ));
    }
}
