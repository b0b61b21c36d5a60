//! Cryptographic primitives for paper vault.
//!
//! This module provides:
//! - Argon2id passphrase-based key derivation
//! - AES-256-GCM authenticated encryption
//! - The hidden-volume block layout

mod cipher;
mod kdf;
mod volume;

pub use cipher::{sealed_length, Cipher, NONCE_SIZE, TAG_SIZE};
pub use kdf::{KeyDerivation, LayerKeys, Salt};
pub use volume::{BlockVolume, HiddenVolumeCipher, Layer, Scheme};
