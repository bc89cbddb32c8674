//! Presale session state, derivations and the controller driving them.

pub mod controller;
pub mod derive;
pub mod format;
pub mod state;

pub use controller::{DepositOutcome, PresaleController, SessionSettings};
pub use derive::{ContributeLabel, NetworkStatus, PresaleView};
pub use state::{
    Balances, DepositStatus, PresaleSnapshot, PresaleWindow, TierThreshold, TierThresholds,
    UserRecord, UserTier,
};
