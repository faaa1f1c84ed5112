use tracing::{error, info, warn};

use crate::clock::{Clock, SystemClock};
use crate::error::SessionError;
use crate::ledger::{Action, Ledger, SpendOutcome, INITIAL_BALANCE};
use crate::store::{Snapshot, SnapshotStore};
use crate::wallet::SessionWallet;

/// Host-constructed session context: the session wallet, the GoodShits
/// ledger, the snapshot store, and the clock, wired together explicitly.
///
/// One context per host instance; there is no process-wide singleton. The
/// context persists a [`Snapshot`] after every mutating operation and
/// restores the balance (wallet stays inactive) when constructed over a
/// store holding a non-expired snapshot.
///
/// Expiry is checked lazily at every entry point through the single
/// [`SessionWallet::is_expired`] predicate and self-heals by clearing the
/// session rather than erroring.
pub struct SessionContext<S: SnapshotStore, C: Clock = SystemClock> {
    store: S,
    clock: C,
    wallet: Option<SessionWallet>,
    ledger: Ledger,
    balance_known: bool,
}

impl<S: SnapshotStore> SessionContext<S, SystemClock> {
    pub fn new(store: S) -> Self {
        Self::with_clock(store, SystemClock)
    }
}

impl<S: SnapshotStore, C: Clock> SessionContext<S, C> {
    /// Build the context and restore any persisted balance.
    ///
    /// An expired snapshot is discarded rather than restored; a snapshot
    /// that fails to load is logged and ignored so a corrupt store never
    /// wedges the host.
    pub fn with_clock(store: S, clock: C) -> Self {
        let now = clock.now_ms();
        let mut ledger = Ledger::new(0);
        let mut balance_known = false;
        match store.load() {
            Ok(Some(snapshot)) => {
                if now > snapshot.expires_at {
                    info!(
                        event = "snapshot_discarded",
                        address = %snapshot.address,
                        expires_at = snapshot.expires_at,
                        "Persisted session expired, discarding snapshot"
                    );
                    if let Err(e) = store.remove() {
                        error!(event = "store_error", error = %e, "Failed to remove expired snapshot");
                    }
                } else {
                    info!(
                        event = "session_restored",
                        address = %snapshot.address,
                        balance = snapshot.balance,
                        "Restored balance, wallet inactive until re-derivation"
                    );
                    ledger = Ledger::new(snapshot.balance);
                    balance_known = true;
                }
            }
            Ok(None) => {}
            Err(e) => {
                warn!(event = "snapshot_load_failed", error = %e, "Ignoring unreadable snapshot");
            }
        }
        Self {
            store,
            clock,
            wallet: None,
            ledger,
            balance_known,
        }
    }

    /// Mint the session wallet from a fresh wallet signature and PIN.
    ///
    /// First onboarding seeds the ledger with [`INITIAL_BALANCE`]; a restored
    /// balance is kept. Replaces any previous wallet: an old keypair is never
    /// resurrected.
    pub fn connect(
        &mut self,
        signature: &[u8],
        user_address: &str,
        pin: &str,
    ) -> Result<&SessionWallet, SessionError> {
        let now = self.clock.now_ms();
        let wallet = SessionWallet::derive(signature, user_address, pin, now)?;
        if !self.balance_known {
            self.ledger = Ledger::new(INITIAL_BALANCE);
            self.balance_known = true;
        }
        info!(
            event = "session_created",
            address = %wallet.address(),
            expires_at = wallet.expires_at(),
            balance = self.ledger.balance(),
            "Session wallet created"
        );
        self.wallet = Some(wallet);
        self.persist()?;
        Ok(self.wallet.as_ref().expect("wallet just set"))
    }

    /// True iff a non-expired session wallet is held. Detecting expiry here
    /// clears the session as a side effect.
    pub fn is_active(&mut self) -> bool {
        let now = self.clock.now_ms();
        match &self.wallet {
            Some(wallet) if wallet.is_expired(now) => {
                info!(
                    event = "session_expired",
                    address = %wallet.address(),
                    "Session expired, clearing"
                );
                self.clear();
                false
            }
            Some(_) => true,
            None => false,
        }
    }

    /// Spend `amount` GoodShits plus fee. Requires an active session;
    /// insufficient balance is reported in the outcome, not as an error.
    pub fn spend(&mut self, amount: u64, reason: &str) -> Result<SpendOutcome, SessionError> {
        self.require_active()?;
        let outcome = self.ledger.spend(amount, reason);
        if outcome.success {
            self.persist()?;
        }
        Ok(outcome)
    }

    /// Spend for a named social action at its fixed base cost.
    pub fn spend_action(&mut self, action: Action) -> Result<SpendOutcome, SessionError> {
        self.spend(action.base_cost(), action.name())
    }

    /// Credit GoodShits (no fee). Requires an active session.
    pub fn earn(&mut self, amount: u64, source: &str) -> Result<(), SessionError> {
        self.require_active()?;
        self.ledger.earn(amount, source);
        self.persist()?;
        Ok(())
    }

    /// Whole minutes until the active session expires.
    pub fn remaining_minutes(&mut self) -> Result<u64, SessionError> {
        self.require_active()?;
        let now = self.clock.now_ms();
        let wallet = self.wallet.as_ref().expect("checked active");
        Ok(wallet.remaining_minutes(now))
    }

    /// Drop the wallet, zero the balance, and remove the persisted snapshot.
    pub fn clear(&mut self) {
        self.wallet = None;
        self.ledger = Ledger::new(0);
        self.balance_known = false;
        if let Err(e) = self.store.remove() {
            error!(event = "store_error", error = %e, "Failed to remove snapshot");
        }
        info!(event = "session_cleared", "Session cleared");
    }

    pub fn balance(&self) -> u64 {
        self.ledger.balance()
    }

    pub fn wallet(&self) -> Option<&SessionWallet> {
        self.wallet.as_ref()
    }

    fn require_active(&mut self) -> Result<(), SessionError> {
        if self.is_active() {
            Ok(())
        } else {
            Err(SessionError::NoActiveSession)
        }
    }

    fn persist(&self) -> Result<(), SessionError> {
        let wallet = self.wallet.as_ref().ok_or(SessionError::NoActiveSession)?;
        let snapshot = Snapshot {
            address: wallet.address().to_string(),
            created_at: wallet.created_at(),
            expires_at: wallet.expires_at(),
            balance: self.ledger.balance(),
            is_active: true,
        };
        self.store.save(&snapshot)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::store::MemoryStore;
    use crate::wallet::SESSION_DURATION_MS;

    const SIG: &[u8] = b"deadbeefdeadbeefdeadbeefdeadbeefdeadbeefdeadbeefdeadbeefdeadbeef";
    const USER: &str = "7sP9wkzqBoTnpFuZvPPdEgTTs9wyyXYsZyWyPpNnYbHv";

    fn connected() -> (SessionContext<MemoryStore, ManualClock>, ManualClock) {
        let clock = ManualClock::new(1_000);
        let mut ctx = SessionContext::with_clock(MemoryStore::new(), clock.clone());
        ctx.connect(SIG, USER, "1234").expect("connect");
        (ctx, clock)
    }

    #[test]
    fn test_connect_seeds_initial_balance() {
        let (mut ctx, _clock) = connected();
        assert!(ctx.is_active());
        assert_eq!(ctx.balance(), INITIAL_BALANCE);
    }

    #[test]
    fn test_spend_requires_session() {
        let mut ctx = SessionContext::with_clock(MemoryStore::new(), ManualClock::new(0));
        assert!(matches!(
            ctx.spend(1, "like"),
            Err(SessionError::NoActiveSession)
        ));
        assert!(matches!(
            ctx.earn(1, "bonus"),
            Err(SessionError::NoActiveSession)
        ));
        assert!(matches!(
            ctx.remaining_minutes(),
            Err(SessionError::NoActiveSession)
        ));
    }

    #[test]
    fn test_spend_and_earn_update_balance() {
        let (mut ctx, _clock) = connected();
        let outcome = ctx.spend_action(Action::Comment).expect("spend");
        assert!(outcome.success);
        assert_eq!(ctx.balance(), INITIAL_BALANCE - 4);
        ctx.earn(10, "post-reward").expect("earn");
        assert_eq!(ctx.balance(), INITIAL_BALANCE - 4 + 10);
    }

    #[test]
    fn test_insufficient_balance_is_not_an_error() {
        let (mut ctx, _clock) = connected();
        let outcome = ctx.spend(1_000, "whale-tip").expect("spend");
        assert!(!outcome.success);
        assert_eq!(outcome.total, 1_200);
        assert_eq!(ctx.balance(), INITIAL_BALANCE);
    }

    #[test]
    fn test_expiry_clears_session_lazily() {
        let (mut ctx, clock) = connected();
        clock.advance(SESSION_DURATION_MS + 1);
        assert!(!ctx.is_active());
        assert!(ctx.wallet().is_none());
        assert_eq!(ctx.balance(), 0);
        // Repeated checks stay inactive
        assert!(!ctx.is_active());
        assert!(matches!(
            ctx.spend(1, "like"),
            Err(SessionError::NoActiveSession)
        ));
    }

    #[test]
    fn test_remaining_minutes_counts_down() {
        let (mut ctx, clock) = connected();
        assert_eq!(ctx.remaining_minutes().expect("active"), 120);
        clock.advance(30 * 60_000);
        assert_eq!(ctx.remaining_minutes().expect("active"), 90);
    }

    #[test]
    fn test_clear_removes_snapshot() {
        let (mut ctx, _clock) = connected();
        ctx.clear();
        assert!(!ctx.is_active());
        assert_eq!(ctx.balance(), 0);
    }

    #[test]
    fn test_reconnect_after_clear_reseeds_balance() {
        let (mut ctx, _clock) = connected();
        ctx.spend(10, "like").expect("spend");
        ctx.clear();
        ctx.connect(SIG, USER, "1234").expect("connect");
        assert_eq!(ctx.balance(), INITIAL_BALANCE);
    }
}
