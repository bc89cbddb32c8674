use ethers_core::types::U256;
use serde::Serialize;

use crate::connector::ConnectionState;

/// Presale deposit window as reported by the contract, in epoch seconds.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct PresaleWindow {
    pub start_epoch_seconds: u64,
    pub end_epoch_seconds: u64,
}

impl PresaleWindow {
    pub fn new(start_epoch_seconds: u64, end_epoch_seconds: u64) -> Self {
        Self {
            start_epoch_seconds,
            end_epoch_seconds,
        }
    }

    pub fn start_ms(&self) -> u64 {
        self.start_epoch_seconds.saturating_mul(1_000)
    }

    pub fn end_ms(&self) -> u64 {
        self.end_epoch_seconds.saturating_mul(1_000)
    }

    pub fn is_before_start(&self, now_ms: u64) -> bool {
        now_ms < self.start_ms()
    }

    pub fn is_after_end(&self, now_ms: u64) -> bool {
        now_ms > self.end_ms()
    }

    pub fn contains(&self, now_ms: u64) -> bool {
        !self.is_before_start(now_ms) && !self.is_after_end(now_ms)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct TierThreshold {
    pub tier_level: u8,
    pub required_token_amount: U256,
}

/// Reference-token amounts required for tiers 1 to 3.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct TierThresholds {
    levels: [TierThreshold; 3],
}

impl TierThresholds {
    pub const LEVELS: [u8; 3] = [1, 2, 3];

    pub fn new(tier_1: U256, tier_2: U256, tier_3: U256) -> Self {
        Self {
            levels: [
                TierThreshold {
                    tier_level: 1,
                    required_token_amount: tier_1,
                },
                TierThreshold {
                    tier_level: 2,
                    required_token_amount: tier_2,
                },
                TierThreshold {
                    tier_level: 3,
                    required_token_amount: tier_3,
                },
            ],
        }
    }

    pub fn levels(&self) -> &[TierThreshold; 3] {
        &self.levels
    }
}

/// Whitelist tier in `0..=3`; 0 means not eligible.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct UserTier(u8);

impl UserTier {
    pub const NONE: UserTier = UserTier(0);
    pub const MAX_LEVEL: u8 = 3;

    /// Clamps `level` into the valid tier range.
    pub fn new(level: u8) -> Self {
        Self(level.min(Self::MAX_LEVEL))
    }

    pub fn level(self) -> u8 {
        self.0
    }

    pub fn is_whitelisted(self) -> bool {
        self.0 > 0
    }
}

/// Contract-held deposit record for an address.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct UserRecord {
    pub deposit: U256,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct DepositStatus {
    pub has_deposited: bool,
}

impl DepositStatus {
    /// Sets the flag when the record shows a deposit. Never clears it.
    pub fn observe(&mut self, record: &UserRecord) {
        if !record.deposit.is_zero() {
            self.has_deposited = true;
        }
    }
}

/// Balances of the connected account; `None` means unknown.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Balances {
    pub native: Option<U256>,
    pub presale_token: Option<U256>,
}

/// Everything the derivation functions read, captured at one point in time.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PresaleSnapshot {
    pub connection: ConnectionState,
    pub window: PresaleWindow,
    pub tier: UserTier,
    pub deposit: DepositStatus,
    pub balances: Balances,
    pub total_raised: Option<U256>,
    pub pending: bool,
}

impl PresaleSnapshot {
    /// Fresh state for a connection; everything derived starts unknown.
    pub fn for_connection(connection: ConnectionState) -> Self {
        Self {
            connection,
            ..Self::default()
        }
    }

    pub fn is_active(&self) -> bool {
        self.connection.is_active
    }
}
