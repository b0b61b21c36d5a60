//! Public entry points: create, duplicate, and recovery sessions.

use crate::config::{EngineConfig, Mode};
use crate::crypto::{BlockVolume, HiddenVolumeCipher, Layer};
use crate::encoding::encode;
use crate::error::{Error, Result};
use crate::planner::{CapacityPlanner, DataLengths};
use crate::record::{EncodedCard, Metadata, PayloadCodec, Record};
use crate::recovery::{RecoverySession, RecoveryStateMachine, SessionId, SessionRegistry, Step};
use crate::secret::Secret;
use crate::sharing::ShareSet;
use tracing::{debug, info};

/// Secret encoding and recovery engine.
///
/// Generic over the hidden-volume cipher so tests can observe how often it
/// is invoked. The default is [`BlockVolume`].
pub struct Engine<C = BlockVolume> {
    config: EngineConfig,
    cipher: C,
    codec: PayloadCodec,
    planner: CapacityPlanner,
    sessions: SessionRegistry,
}

impl Engine<BlockVolume> {
    /// Create an engine backed by [`BlockVolume`].
    pub fn new(config: EngineConfig) -> Result<Self> {
        let cipher = BlockVolume::new(config.kdf, config.legacy_kdf);
        Self::with_cipher(config, cipher)
    }
}

impl<C: HiddenVolumeCipher> Engine<C> {
    /// Create an engine with a custom cipher.
    pub fn with_cipher(config: EngineConfig, cipher: C) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            codec: PayloadCodec::new(&config),
            planner: CapacityPlanner::new(&config),
            sessions: SessionRegistry::new(),
            config,
            cipher,
        })
    }

    /// Engine configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// The cipher in use.
    pub fn cipher(&self) -> &C {
        &self.cipher
    }

    /// Payload codec matching this configuration.
    pub fn codec(&self) -> &PayloadCodec {
        &self.codec
    }

    /// Check that `secrets` fit without deriving any key.
    pub fn plan(&self, secrets: &[Secret], mode: Mode) -> Result<DataLengths> {
        self.planner.plan(secrets, mode.is_threshold(), &self.cipher)
    }

    /// Encode secrets into cards.
    ///
    /// Direct mode yields one card holding every secret as its own layer.
    /// Threshold mode yields one card per share index; card `i` holds share
    /// `i` of every secret. All validation and capacity checks run before
    /// the first key derivation, and cards are sealed one at a time in
    /// index order.
    pub fn create(
        &self,
        secrets: &[Secret],
        mode: Mode,
        metadata: Metadata,
    ) -> Result<Vec<EncodedCard>> {
        self.validate(secrets, mode, &metadata)?;
        self.plan(secrets, mode)?;

        let records: Vec<Vec<Layer>> = match mode {
            Mode::Direct => vec![secrets.iter().map(Secret::to_layer).collect()],
            Mode::Threshold { shares, threshold } => {
                ShareSet::build(secrets, shares, threshold)?.into_records().collect()
            }
        };

        let mut cards = Vec::with_capacity(records.len());
        for layers in records {
            let record = encode(&self.cipher, &layers, metadata.clone(), &self.config)?;
            let card = EncodedCard::compute(&self.codec, record)?;
            debug!(short_hash = %card.short_hash, "record sealed");
            cards.push(card);
        }

        info!(cards = cards.len(), "cards created");
        Ok(cards)
    }

    /// Recompute the card for an existing record, for reprinting.
    pub fn duplicate(&self, record: Record) -> Result<EncodedCard> {
        EncodedCard::compute(&self.codec, record)
    }

    /// Parse scanned text into a record.
    pub fn parse(&self, text: &str) -> Result<Record> {
        self.codec.deserialize(text)
    }

    /// A recovery state machine over this engine's cipher.
    pub fn machine(&self) -> RecoveryStateMachine<'_, C> {
        RecoveryStateMachine::new(&self.cipher, &self.config)
    }

    /// Open a recovery session.
    pub fn open_session(&mut self) -> SessionId {
        self.sessions.open()
    }

    /// Look up a recovery session.
    pub fn session(&self, id: SessionId) -> Option<&RecoverySession> {
        self.sessions.get(id)
    }

    /// Discard a recovery session and everything it collected.
    pub fn close_session(&mut self, id: SessionId) -> bool {
        self.sessions.close(id)
    }

    /// Reset a session to `Idle`, dropping its shares.
    pub fn reset_session(&mut self, id: SessionId) -> Result<()> {
        self.session_mut(id)?.reset();
        Ok(())
    }

    /// Feed scanned text to a session.
    pub fn scan(&mut self, id: SessionId, text: &str) -> Result<Step> {
        let machine = RecoveryStateMachine::new(&self.cipher, &self.config);
        let session = self
            .sessions
            .get_mut(id)
            .ok_or_else(|| unknown_session(id))?;
        Ok(machine.scan(session, text))
    }

    /// Unlock the record pending in a session.
    pub fn unlock<P: AsRef<str>>(&mut self, id: SessionId, passphrases: &[P]) -> Result<Step> {
        let machine = RecoveryStateMachine::new(&self.cipher, &self.config);
        let session = self
            .sessions
            .get_mut(id)
            .ok_or_else(|| unknown_session(id))?;
        machine.unlock(session, passphrases)
    }

    /// Scan and unlock in one call.
    pub fn submit<P: AsRef<str>>(
        &mut self,
        id: SessionId,
        text: &str,
        passphrases: &[P],
    ) -> Result<Step> {
        let machine = RecoveryStateMachine::new(&self.cipher, &self.config);
        let session = self
            .sessions
            .get_mut(id)
            .ok_or_else(|| unknown_session(id))?;
        machine.submit(session, text, passphrases)
    }

    fn session_mut(&mut self, id: SessionId) -> Result<&mut RecoverySession> {
        self.sessions.get_mut(id).ok_or_else(|| unknown_session(id))
    }

    fn validate(&self, secrets: &[Secret], mode: Mode, metadata: &Metadata) -> Result<()> {
        mode.validate()?;

        for secret in secrets {
            secret.validate()?;
        }

        let passphrases: Vec<_> = secrets.iter().map(Secret::passphrase).collect();
        for (index, passphrase) in passphrases.iter().enumerate() {
            if passphrases[..index].iter().any(|p| p.as_str() == passphrase.as_str()) {
                return Err(Error::Validation(
                    "Secrets must use different passphrases".to_string(),
                ));
            }
        }

        if let Some(label) = &metadata.label {
            if label.chars().count() > self.config.max_label_length {
                return Err(Error::Validation(format!(
                    "Label exceeds {} characters",
                    self.config.max_label_length
                )));
            }
        }
        Ok(())
    }
}

fn unknown_session(id: SessionId) -> Error {
    Error::Validation(format!("Unknown recovery session {}", id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ThresholdProfile;
    use crate::crypto::Scheme;
    use std::cell::Cell;
    use std::collections::HashSet;
    use zeroize::Zeroizing;

    /// Counts seal and open calls on a real volume.
    struct CountingCipher {
        inner: BlockVolume,
        seals: Cell<usize>,
        opens: Cell<usize>,
    }

    impl CountingCipher {
        fn new(config: &EngineConfig) -> Self {
            Self {
                inner: BlockVolume::new(config.kdf, config.legacy_kdf),
                seals: Cell::new(0),
                opens: Cell::new(0),
            }
        }
    }

    impl HiddenVolumeCipher for CountingCipher {
        fn estimate_length(&self, message_len: usize) -> usize {
            self.inner.estimate_length(message_len)
        }

        fn encrypt_hidden(
            &self,
            layers: &[Layer],
            header_size: usize,
            capacity: usize,
        ) -> Result<Record> {
            self.seals.set(self.seals.get() + 1);
            self.inner.seal(layers, header_size, capacity, Scheme::Current)
        }

        fn decrypt(
            &self,
            passphrase: &str,
            record: &Record,
            legacy: bool,
        ) -> Result<Zeroizing<Vec<u8>>> {
            self.opens.set(self.opens.get() + 1);
            self.inner.decrypt(passphrase, record, legacy)
        }
    }

    fn engine() -> Engine<CountingCipher> {
        let config = EngineConfig::interactive();
        let cipher = CountingCipher::new(&config);
        Engine::with_cipher(config, cipher).unwrap()
    }

    #[test]
    fn test_direct_create_and_recover() {
        let mut engine = engine();
        let cards = engine
            .create(
                &[Secret::new("hello world", "pass")],
                Mode::Direct,
                Metadata {
                    label: Some("wallet".to_string()),
                    challenge: None,
                },
            )
            .unwrap();
        assert_eq!(cards.len(), 1);
        assert_eq!(cards[0].label.as_deref(), Some("wallet"));
        assert_eq!(cards[0].copies, 1);

        let id = engine.open_session();
        match engine.submit(id, &cards[0].payload_text, &["pass"]).unwrap() {
            Step::Recovered(message) => assert_eq!(message.as_slice(), b"hello world"),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_threshold_create_one_card_per_share() {
        let engine = engine();
        let cards = engine
            .create(
                &[Secret::new("a", "p1"), Secret::new("b", "p2")],
                ThresholdProfile::THREE_OF_FIVE.mode(),
                Metadata::default(),
            )
            .unwrap();

        assert_eq!(cards.len(), 5);
        assert_eq!(engine.cipher().seals.get(), 5);
        let hashes: HashSet<_> = cards.iter().map(|c| c.hash.clone()).collect();
        assert_eq!(hashes.len(), 5);
    }

    #[test]
    fn test_capacity_rejected_before_any_seal() {
        let engine = engine();
        let secrets = [
            Secret::new(vec![0u8; 600], "a"),
            Secret::new(vec![0u8; 600], "b"),
        ];

        let err = engine
            .create(&secrets, Mode::Direct, Metadata::default())
            .unwrap_err();

        assert!(matches!(err, Error::CapacityExceeded { secret: 2, .. }));
        assert_eq!(engine.cipher().seals.get(), 0);
    }

    #[test]
    fn test_threshold_overhead_counts_against_capacity() {
        let engine = engine();
        let secret = [Secret::new(vec![0u8; 1000], "a")];

        assert!(engine.plan(&secret, Mode::Direct).is_ok());
        assert!(matches!(
            engine.create(&secret, ThresholdProfile::TWO_OF_THREE.mode(), Metadata::default()),
            Err(Error::CapacityExceeded { secret: 1, .. })
        ));
        assert_eq!(engine.cipher().seals.get(), 0);
    }

    #[test]
    fn test_invalid_inputs() {
        let engine = engine();
        let one = [Secret::new("m", "p")];

        assert!(matches!(
            engine.create(&one, Mode::Threshold { shares: 2, threshold: 3 }, Metadata::default()),
            Err(Error::Validation(_))
        ));
        assert!(matches!(
            engine.create(&one, Mode::Threshold { shares: 2, threshold: 0 }, Metadata::default()),
            Err(Error::Validation(_))
        ));
        assert!(matches!(
            engine.create(&[Secret::new("", "p")], Mode::Direct, Metadata::default()),
            Err(Error::Validation(_))
        ));
        assert!(matches!(
            engine.create(
                &[Secret::new("a", "same"), Secret::new("b", "same")],
                Mode::Direct,
                Metadata::default()
            ),
            Err(Error::Validation(_))
        ));
        assert!(matches!(
            engine.create(
                &one,
                Mode::Direct,
                Metadata {
                    label: Some("x".repeat(65)),
                    challenge: None,
                }
            ),
            Err(Error::Validation(_))
        ));
        assert_eq!(engine.cipher().seals.get(), 0);
    }

    #[test]
    fn test_one_of_one_threshold() {
        let mut engine = engine();
        let cards = engine
            .create(
                &[Secret::new("solo", "p")],
                Mode::Threshold {
                    shares: 1,
                    threshold: 1,
                },
                Metadata::default(),
            )
            .unwrap();
        assert_eq!(cards.len(), 1);

        let id = engine.open_session();
        match engine.submit(id, &cards[0].payload_text, &["p"]).unwrap() {
            Step::Recovered(message) => assert_eq!(message.as_slice(), b"solo"),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_duplicate_matches_created_card() {
        let engine = engine();
        let cards = engine
            .create(&[Secret::new("m", "p")], Mode::Direct, Metadata::default())
            .unwrap();

        let record = engine.parse(&cards[0].payload_text).unwrap();
        let copy = engine.duplicate(record).unwrap();

        assert_eq!(copy.hash, cards[0].hash);
        assert_eq!(copy.short_hash, cards[0].short_hash);
        assert_eq!(copy.copies, 1);
    }

    #[test]
    fn test_rescan_decrypts_and_reports_duplicate_share() {
        let mut engine = engine();
        let cards = engine
            .create(
                &[Secret::new("m", "p")],
                ThresholdProfile::TWO_OF_THREE.mode(),
                Metadata::default(),
            )
            .unwrap();
        let id = engine.open_session();

        engine.submit(id, &cards[0].payload_text, &["p"]).unwrap();
        let opens = engine.cipher().opens.get();
        match engine.submit(id, &cards[0].payload_text, &["p"]).unwrap() {
            Step::AwaitingMoreShares(progress) => assert!(progress.duplicate),
            other => panic!("unexpected {:?}", other),
        }
        assert!(engine.cipher().opens.get() > opens);
        assert_eq!(engine.session(id).unwrap().share_count(), 1);
    }

    #[test]
    fn test_sessions_are_isolated() {
        let mut engine = engine();
        let cards = engine
            .create(
                &[Secret::new("m", "p")],
                ThresholdProfile::TWO_OF_THREE.mode(),
                Metadata::default(),
            )
            .unwrap();
        let first = engine.open_session();
        let second = engine.open_session();

        engine.submit(first, &cards[0].payload_text, &["p"]).unwrap();
        assert!(matches!(
            engine.submit(second, &cards[1].payload_text, &["p"]).unwrap(),
            Step::AwaitingMoreShares(_)
        ));

        engine.reset_session(first).unwrap();
        assert!(matches!(
            engine.submit(first, &cards[1].payload_text, &["p"]).unwrap(),
            Step::AwaitingMoreShares(_)
        ));
        assert!(matches!(
            engine.submit(second, &cards[2].payload_text, &["p"]).unwrap(),
            Step::Recovered(_)
        ));

        assert!(engine.close_session(first));
        assert!(engine.scan(first, "{}").is_err());
    }
}
