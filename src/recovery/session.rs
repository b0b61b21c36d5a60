//! Recovery sessions: shares accumulated across scans.

use crate::record::Record;
use crate::sharing::{Share, SplitId};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use tracing::debug;

/// Identifier of a recovery session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionId(u64);

impl SessionId {
    /// Wrap a raw id.
    pub fn new(id: u64) -> Self {
        Self(id)
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Shares collected for one split.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShareProgress {
    /// Distinct shares held.
    pub collected: usize,
    /// Shares needed.
    pub threshold: u8,
    /// Whether the last scan added nothing new.
    pub duplicate: bool,
}

/// Where a session stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoveryState {
    /// Nothing scanned yet.
    Idle,
    /// A record was scanned and waits for a passphrase.
    AwaitingPassphrase,
    /// Decryption in progress.
    Unlocking,
    /// Shares held but not enough to reconstruct.
    AwaitingMoreShares(ShareProgress),
    /// The last passphrase opened nothing; the scanned record is kept.
    PassphraseRejected,
}

/// Mutable state of one recovery attempt.
///
/// Sessions never share shares with each other. Dropping or resetting a
/// session discards everything it collected.
pub struct RecoverySession {
    id: SessionId,
    pub(crate) state: RecoveryState,
    shares: BTreeMap<SplitId, Vec<Share>>,
    pub(crate) pending: Option<Record>,
    pub(crate) progress: Option<ShareProgress>,
}

impl RecoverySession {
    /// Start an empty session.
    pub fn new(id: SessionId) -> Self {
        Self {
            id,
            state: RecoveryState::Idle,
            shares: BTreeMap::new(),
            pending: None,
            progress: None,
        }
    }

    /// Session id.
    pub fn id(&self) -> SessionId {
        self.id
    }

    /// Current state.
    pub fn state(&self) -> RecoveryState {
        self.state
    }

    /// Total shares held, across all splits.
    pub fn share_count(&self) -> usize {
        self.shares.values().map(Vec::len).sum()
    }

    /// Shares held for one split.
    pub fn shares_for(&self, split_id: &SplitId) -> &[Share] {
        self.shares.get(split_id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Whether this exact share is already held.
    pub fn contains(&self, share: &Share) -> bool {
        self.shares_for(share.split_id()).contains(share)
    }

    /// Add a share. Returns `false` if it was already held.
    pub fn insert(&mut self, share: Share) -> bool {
        if self.contains(&share) {
            return false;
        }
        self.shares.entry(*share.split_id()).or_default().push(share);
        true
    }

    /// Drop all shares and pending input and return to `Idle`.
    pub fn reset(&mut self) {
        self.shares.clear();
        self.pending = None;
        self.progress = None;
        self.state = RecoveryState::Idle;
        debug!(session = %self.id, "recovery session reset");
    }
}

impl fmt::Debug for RecoverySession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecoverySession")
            .field("id", &self.id)
            .field("state", &self.state)
            .field("shares", &self.share_count())
            .finish()
    }
}

/// Independent sessions for concurrent recovery flows.
#[derive(Debug, Default)]
pub struct SessionRegistry {
    sessions: HashMap<SessionId, RecoverySession>,
    next_id: u64,
}

impl SessionRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a new session.
    pub fn open(&mut self) -> SessionId {
        let id = SessionId(self.next_id);
        self.next_id += 1;
        self.sessions.insert(id, RecoverySession::new(id));
        id
    }

    /// Get a session.
    pub fn get(&self, id: SessionId) -> Option<&RecoverySession> {
        self.sessions.get(&id)
    }

    /// Get a session mutably.
    pub fn get_mut(&mut self, id: SessionId) -> Option<&mut RecoverySession> {
        self.sessions.get_mut(&id)
    }

    /// Close a session, discarding its shares.
    pub fn close(&mut self, id: SessionId) -> bool {
        self.sessions.remove(&id).is_some()
    }

    /// Number of open sessions.
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    /// Whether no session is open.
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
