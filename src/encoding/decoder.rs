//! Opens one layer of a record, falling back to the legacy scheme.

use crate::crypto::HiddenVolumeCipher;
use crate::error::Result;
use crate::record::Record;
use tracing::debug;
use zeroize::Zeroizing;

/// Decrypt the layer of `record` that `passphrase` opens.
///
/// The current scheme is always tried first, then the legacy scheme.
/// Fails with `CipherMismatch` when neither opens a layer.
pub fn decode<C>(cipher: &C, passphrase: &str, record: &Record) -> Result<Zeroizing<Vec<u8>>>
where
    C: HiddenVolumeCipher + ?Sized,
{
    match cipher.decrypt(passphrase, record, false) {
        Ok(message) => Ok(message),
        Err(primary) => {
            debug!(error = %primary, "current scheme failed, trying legacy scheme");
            let message = cipher.decrypt(passphrase, record, true)?;
            debug!("record opened with legacy scheme");
            Ok(message)
        }
    }
}
