//! BIP39 seed phrases: generation and checksum validation.

use crate::error::{Error, Result};
use bip39::Mnemonic;
use std::fmt;
use std::str::FromStr;
use zeroize::Zeroizing;

/// Entropy of a generated seed phrase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Strength {
    /// 128 bits, 12 words.
    Bits128,
    /// 256 bits, 24 words.
    #[default]
    Bits256,
}

impl Strength {
    /// Strength for a bit count; only 128 and 256 are accepted.
    pub fn from_bits(bits: u16) -> Result<Self> {
        match bits {
            128 => Ok(Strength::Bits128),
            256 => Ok(Strength::Bits256),
            _ => Err(Error::Validation(format!("Invalid strength: {}", bits))),
        }
    }

    /// Entropy in bits.
    pub fn bits(&self) -> u16 {
        match self {
            Strength::Bits128 => 128,
            Strength::Bits256 => 256,
        }
    }

    /// Words in a phrase of this strength.
    pub fn word_count(&self) -> usize {
        self.bits() as usize * 3 / 32
    }
}

impl FromStr for Strength {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let bits = s
            .trim()
            .parse()
            .map_err(|_| Error::Validation(format!("Invalid strength: {}", s)))?;
        Self::from_bits(bits)
    }
}

impl fmt::Display for Strength {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.bits())
    }
}

/// Generate an English seed phrase.
pub fn generate_mnemonic(strength: Strength) -> Result<Zeroizing<String>> {
    let mnemonic = Mnemonic::generate(strength.word_count())
        .map_err(|e| Error::Validation(format!("Mnemonic generation failed: {}", e)))?;
    Ok(Zeroizing::new(mnemonic.to_string()))
}

/// Whether `phrase` is an English seed phrase with a valid checksum.
pub fn validate_mnemonic(phrase: &str) -> bool {
    Mnemonic::parse(phrase).is_ok()
}
