//! Secrets supplied to the create flow.

use crate::crypto::Layer;
use crate::error::{Error, Result};
use std::fmt;
use zeroize::Zeroizing;

/// A message and the passphrases that together protect it.
#[derive(Clone)]
pub struct Secret {
    message: Zeroizing<Vec<u8>>,
    passphrases: Vec<Zeroizing<String>>,
}

impl Secret {
    /// Create a secret protected by a single passphrase.
    pub fn new(message: impl Into<Vec<u8>>, passphrase: impl Into<String>) -> Self {
        Self::with_passphrases(message, [passphrase.into()])
    }

    /// Create a secret protected by several passphrases, all needed to unlock it.
    pub fn with_passphrases<I, P>(message: impl Into<Vec<u8>>, passphrases: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<String>,
    {
        Self {
            message: Zeroizing::new(message.into()),
            passphrases: passphrases
                .into_iter()
                .map(|p| Zeroizing::new(p.into()))
                .collect(),
        }
    }

    /// The message bytes.
    pub fn message(&self) -> &[u8] {
        &self.message
    }

    /// The passphrases, concatenated in order.
    pub fn passphrase(&self) -> Zeroizing<String> {
        concatenate_passphrases(self.passphrases.iter().map(|p| p.as_str()))
    }

    /// Reject empty messages and missing passphrases.
    pub fn validate(&self) -> Result<()> {
        if self.message.is_empty() {
            return Err(Error::Validation("Secret message is empty".to_string()));
        }
        if self.passphrases.is_empty() || self.passphrases.iter().all(|p| p.is_empty()) {
            return Err(Error::Validation("Secret has no passphrase".to_string()));
        }
        Ok(())
    }

    /// The layer sealing this secret's message directly.
    pub fn to_layer(&self) -> Layer {
        Layer {
            message: self.message.clone(),
            passphrase: self.passphrase(),
        }
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Secret")
            .field("len", &self.message.len())
            .field("passphrases", &self.passphrases.len())
            .finish()
    }
}

/// Concatenate passphrases into the key material of one layer.
pub fn concatenate_passphrases<'a>(passphrases: impl IntoIterator<Item = &'a str>) -> Zeroizing<String> {
    let mut joined = Zeroizing::new(String::new());
    for passphrase in passphrases {
        joined.push_str(passphrase);
    }
    joined
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_passphrases_concatenate_in_order() {
        let secret = Secret::with_passphrases("msg", ["alpha", "bravo"]);

        assert_eq!(secret.passphrase().as_str(), "alphabravo");
        assert_eq!(secret.to_layer().passphrase.as_str(), "alphabravo");
    }

    #[test]
    fn test_validate() {
        assert!(Secret::new("msg", "pass").validate().is_ok());
        assert!(Secret::new("", "pass").validate().is_err());
        assert!(Secret::new("msg", "").validate().is_err());
        assert!(Secret::with_passphrases("msg", Vec::<String>::new())
            .validate()
            .is_err());
    }

    #[test]
    fn test_debug_hides_message() {
        let secret = Secret::new("hunter2 seed", "pass");

        assert!(!format!("{:?}", secret).contains("hunter2"));
    }
}
