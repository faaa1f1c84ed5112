//! Session-wallet subsystem for the Shitter client.
//!
//! Two cooperating pieces:
//! - [`wallet`]: derives a deterministic Ed25519 session keypair from a
//!   wallet signature plus a user-chosen PIN, valid for a bounded duration.
//! - [`ledger`]: tracks the session-scoped GoodShits balance and gates every
//!   spend through a uniform 20% fee policy.
//!
//! [`session::SessionContext`] ties them together: the host obtains a
//! signature from the user's wallet, calls [`session::SessionContext::connect`]
//! to mint the session wallet, and routes every social action through
//! `spend`/`earn`. The balance (never key material) survives reloads through
//! a [`store::SnapshotStore`] adapter.

pub mod clock;
pub mod error;
pub mod ledger;
pub mod session;
pub mod store;
pub mod wallet;

pub use clock::{Clock, ManualClock, SystemClock};
pub use error::SessionError;
pub use ledger::{calculate_fee, total_cost, Action, Ledger, SpendOutcome};
pub use session::SessionContext;
pub use store::{FileStore, MemoryStore, Snapshot, SnapshotStore};
pub use wallet::{verify_signature, SessionWallet};
