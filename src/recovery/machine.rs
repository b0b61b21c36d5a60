//! Drives scans and passphrases through a recovery session.

use crate::config::EngineConfig;
use crate::crypto::HiddenVolumeCipher;
use crate::encoding::decode;
use crate::error::{Error, Result};
use crate::record::PayloadCodec;
use crate::recovery::session::{RecoverySession, RecoveryState, ShareProgress};
use crate::secret::concatenate_passphrases;
use crate::sharing::{combine, untag, Share};
use std::fmt;
use tracing::{debug, info, trace, warn};
use zeroize::Zeroizing;

/// Result of feeding one input to the state machine.
pub enum Step {
    /// The scanned text is not a record; keep scanning.
    Ignored,
    /// A record was scanned; supply its passphrase.
    AwaitingPassphrase,
    /// A share was collected but more are needed; keep scanning.
    AwaitingMoreShares(ShareProgress),
    /// The passphrase opened nothing; ask for it again.
    PassphraseRejected,
    /// The secret. The session has been reset.
    Recovered(Zeroizing<Vec<u8>>),
}

impl fmt::Debug for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Step::Ignored => write!(f, "Ignored"),
            Step::AwaitingPassphrase => write!(f, "AwaitingPassphrase"),
            Step::AwaitingMoreShares(progress) => {
                f.debug_tuple("AwaitingMoreShares").field(progress).finish()
            }
            Step::PassphraseRejected => write!(f, "PassphraseRejected"),
            Step::Recovered(message) => write!(f, "Recovered(<{} bytes>)", message.len()),
        }
    }
}

/// Recovery protocol over a hidden-volume cipher.
///
/// The machine holds no per-recovery state; every call takes the session it
/// acts on, so one machine can serve any number of sessions.
pub struct RecoveryStateMachine<'a, C: ?Sized> {
    cipher: &'a C,
    codec: PayloadCodec,
}

impl<'a, C> RecoveryStateMachine<'a, C>
where
    C: HiddenVolumeCipher + ?Sized,
{
    /// Create a state machine.
    pub fn new(cipher: &'a C, config: &EngineConfig) -> Self {
        Self {
            cipher,
            codec: PayloadCodec::new(config),
        }
    }

    /// Feed scanned text.
    ///
    /// Text that is not a record is ignored without touching the session.
    /// Every record, including one scanned before, waits for a passphrase:
    /// its other layers may hold shares of other secrets.
    pub fn scan(&self, session: &mut RecoverySession, text: &str) -> Step {
        let record = match self.codec.deserialize(text) {
            Ok(record) => record,
            Err(e) => {
                trace!(session = %session.id(), error = %e, "ignoring scanned text");
                return Step::Ignored;
            }
        };

        session.pending = Some(record);
        session.state = RecoveryState::AwaitingPassphrase;
        Step::AwaitingPassphrase
    }

    /// Try to open the scanned record with the given passphrases.
    ///
    /// A rejected passphrase keeps the record so it can be retried. Errors
    /// are returned only for failures other than a wrong passphrase or
    /// missing shares.
    pub fn unlock<P: AsRef<str>>(
        &self,
        session: &mut RecoverySession,
        passphrases: &[P],
    ) -> Result<Step> {
        let pending = session.pending.take().ok_or_else(|| {
            Error::Validation("No scanned record is waiting for a passphrase".to_string())
        })?;
        session.state = RecoveryState::Unlocking;

        let passphrase = concatenate_passphrases(passphrases.iter().map(|p| p.as_ref()));
        let message = match decode(self.cipher, &passphrase, &pending) {
            Ok(message) => message,
            Err(Error::CipherMismatch) => {
                debug!(session = %session.id(), "passphrase rejected");
                session.pending = Some(pending);
                session.state = RecoveryState::PassphraseRejected;
                return Ok(Step::PassphraseRejected);
            }
            Err(e) => {
                session.pending = Some(pending);
                session.state = RecoveryState::AwaitingPassphrase;
                return Err(e);
            }
        };

        let share = match untag(&message).map(Share::from_bytes) {
            Some(Ok(share)) => share,
            Some(Err(e)) => {
                warn!(session = %session.id(), error = %e, "decrypted share is malformed");
                session.state = match session.progress {
                    Some(progress) => RecoveryState::AwaitingMoreShares(progress),
                    None => RecoveryState::Idle,
                };
                return Err(e);
            }
            None => {
                info!(session = %session.id(), "secret recovered");
                session.reset();
                return Ok(Step::Recovered(message));
            }
        };

        Ok(self.accept_share(session, share))
    }

    /// Scan text and, if it is a new record, unlock it right away.
    pub fn submit<P: AsRef<str>>(
        &self,
        session: &mut RecoverySession,
        text: &str,
        passphrases: &[P],
    ) -> Result<Step> {
        match self.scan(session, text) {
            Step::AwaitingPassphrase => self.unlock(session, passphrases),
            step => Ok(step),
        }
    }

    fn accept_share(&self, session: &mut RecoverySession, share: Share) -> Step {
        let split_id = *share.split_id();
        let threshold = share.threshold();
        let added = session.insert(share);

        let progress = ShareProgress {
            collected: session.shares_for(&split_id).len(),
            threshold,
            duplicate: !added,
        };
        session.progress = Some(progress);
        session.state = RecoveryState::AwaitingMoreShares(progress);

        if !added {
            debug!(session = %session.id(), "share already collected");
            return Step::AwaitingMoreShares(progress);
        }

        match combine(session.shares_for(&split_id)) {
            Ok(message) => {
                info!(session = %session.id(), "secret reconstructed from shares");
                session.reset();
                Step::Recovered(message)
            }
            Err(e) => {
                debug!(
                    session = %session.id(),
                    collected = progress.collected,
                    threshold,
                    error = %e,
                    "waiting for more shares"
                );
                Step::AwaitingMoreShares(progress)
            }
        }
    }
}
