use serde::{Deserialize, Serialize};
use std::str::FromStr;
use tracing::debug;

use crate::error::SessionError;

/// GoodShits per base-currency (GORB) unit.
pub const UNIT_EXCHANGE_RATE: u64 = 10_000;

/// Flat fee on every spend, percent.
pub const FEE_RATE_PERCENT: u64 = 20;

/// Balance granted on first onboarding: 100 GoodShits = 0.01 GORB.
pub const INITIAL_BALANCE: u64 = 100;

/// Fee for spending `amount` GoodShits: 20% rounded up.
pub fn calculate_fee(amount: u64) -> u64 {
    amount.saturating_mul(FEE_RATE_PERCENT).div_ceil(100)
}

/// Amount plus fee.
pub fn total_cost(amount: u64) -> u64 {
    amount.saturating_add(calculate_fee(amount))
}

/// Convert GoodShits to fractional GORB for display.
pub fn to_base_units(goodshits: u64) -> f64 {
    goodshits as f64 / UNIT_EXCHANGE_RATE as f64
}

/// Convert whole GORB units to GoodShits.
pub fn from_base_units(units: u64) -> u64 {
    units * UNIT_EXCHANGE_RATE
}

/// Social actions with fixed base costs in GoodShits.
///
/// The charged total per action is `total_cost(base_cost)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Action {
    Like,
    Share,
    GoodShit,
    BadShit,
    Comment,
}

impl Action {
    pub const ALL: [Action; 5] = [
        Action::Like,
        Action::Share,
        Action::GoodShit,
        Action::BadShit,
        Action::Comment,
    ];

    pub fn base_cost(self) -> u64 {
        match self {
            Action::Like => 1,
            Action::Share => 2,
            Action::GoodShit => 2,
            Action::BadShit => 1,
            Action::Comment => 3,
        }
    }

    /// Wire name used by the host protocol.
    pub fn name(self) -> &'static str {
        match self {
            Action::Like => "like",
            Action::Share => "share",
            Action::GoodShit => "goodShit",
            Action::BadShit => "badShit",
            Action::Comment => "comment",
        }
    }
}

impl FromStr for Action {
    type Err = SessionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "like" => Ok(Action::Like),
            "share" => Ok(Action::Share),
            "goodShit" => Ok(Action::GoodShit),
            "badShit" => Ok(Action::BadShit),
            "comment" => Ok(Action::Comment),
            other => Err(SessionError::UnknownAction(other.to_string())),
        }
    }
}

/// Result of a spend attempt. `success: false` means insufficient balance,
/// a normal outcome the host surfaces to the user with the exact shortfall;
/// it is never reported as an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpendOutcome {
    pub success: bool,
    pub fee: u64,
    pub total: u64,
}

/// Pure in-memory GoodShits balance.
///
/// No clock, no I/O: session gating lives in the context and persistence in
/// the snapshot store, so the fee/balance rules are testable in isolation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ledger {
    balance: u64,
}

impl Ledger {
    pub fn new(balance: u64) -> Self {
        Self { balance }
    }

    pub fn balance(&self) -> u64 {
        self.balance
    }

    /// Deduct `amount` plus fee, atomically: either the full total comes off
    /// the balance or nothing does.
    pub fn spend(&mut self, amount: u64, reason: &str) -> SpendOutcome {
        let fee = calculate_fee(amount);
        let total = amount.saturating_add(fee);
        if self.balance < total {
            debug!(
                event = "spend_rejected",
                reason = reason,
                amount = amount,
                total = total,
                balance = self.balance,
                missing = total - self.balance,
                "Insufficient balance"
            );
            return SpendOutcome {
                success: false,
                fee,
                total,
            };
        }
        self.balance -= total;
        debug!(
            event = "spend_accepted",
            reason = reason,
            amount = amount,
            fee = fee,
            total = total,
            balance = self.balance,
            "Spend accepted"
        );
        SpendOutcome {
            success: true,
            fee,
            total,
        }
    }

    /// Credit `amount` GoodShits. Earns carry no fee.
    pub fn earn(&mut self, amount: u64, source: &str) {
        self.balance = self.balance.saturating_add(amount);
        debug!(
            event = "earn",
            source = source,
            amount = amount,
            balance = self.balance,
            "Earned GoodShits"
        );
    }
}
