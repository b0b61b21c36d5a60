//! Multi-scan recovery of direct and threshold secrets.
//!
//! ```text
//! Idle -> AwaitingPassphrase -> Unlocking -> Recovered (reset to Idle)
//!                                         -> AwaitingMoreShares (keep scanning)
//!                                         -> PassphraseRejected (ask again)
//! ```

mod machine;
mod session;

pub use machine::{RecoveryStateMachine, Step};
pub use session::{
    RecoverySession, RecoveryState, SessionId, SessionRegistry, ShareProgress,
};
