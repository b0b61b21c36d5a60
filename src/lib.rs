//! Paper Vault
//!
//! Encodes secrets into printable records and recovers them from scans.
//! Up to three secrets share one record as hidden layers, each opened by its
//! own passphrase; optionally every secret is split so that any `t` of `n`
//! records recover it.
//!
//! # Features
//!
//! - **Hidden layers**: a record reveals only the layer its passphrase opens
//! - **AES-256-GCM Encryption**: Argon2id key derivation with a legacy fallback
//! - **Threshold sharing**: `t`-of-`n` splitting with tagged, self-describing shares
//! - **Seed phrases**: BIP39 generation and checksum validation
//! - **Multi-scan recovery**: sessions that collect and deduplicate shares
//! - **CLI Interface**: create, restore, duplicate, and inspect cards
//!
//! # Architecture
//!
//! ```text
//! create:  Secrets → Plan → [Split] → Seal (per record) → Serialize + Hash → Cards
//! restore: Scan → Parse → Open (current, then legacy) → [Combine] → Secret
//! ```
//!
//! # Example
//!
//! ```rust
//! use paper_vault::{Engine, EngineConfig, Metadata, Secret, Step, ThresholdProfile};
//!
//! let mut engine = Engine::new(EngineConfig::interactive()).unwrap();
//! let cards = engine
//!     .create(
//!         &[Secret::new("hello world", "passphrase")],
//!         ThresholdProfile::TWO_OF_THREE.mode(),
//!         Metadata::default(),
//!     )
//!     .unwrap();
//!
//! let session = engine.open_session();
//! engine.submit(session, &cards[2].payload_text, &["passphrase"]).unwrap();
//! match engine.submit(session, &cards[0].payload_text, &["passphrase"]).unwrap() {
//!     Step::Recovered(secret) => assert_eq!(secret.as_slice(), b"hello world"),
//!     other => panic!("unexpected {:?}", other),
//! }
//! ```

pub mod config;
pub mod crypto;
pub mod encoding;
pub mod engine;
pub mod error;
pub mod mnemonic;
pub mod planner;
pub mod record;
pub mod recovery;
pub mod secret;
pub mod sharing;

pub use config::{EngineConfig, KdfParams, Mode, ThresholdProfile};
pub use engine::Engine;
pub use error::{Error, Result};
pub use mnemonic::{generate_mnemonic, validate_mnemonic, Strength};
pub use planner::{CapacityPlanner, DataLengths};
pub use record::{EncodedCard, Metadata, PayloadCodec, Record};
pub use recovery::{RecoverySession, RecoveryState, RecoveryStateMachine, SessionId, Step};
pub use secret::Secret;
