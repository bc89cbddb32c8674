//! Client for a tiered, whitelist-gated token presale.
//!
//! A wallet is attached through one of the [`connector::ConnectorKind`]s and
//! the presale contract is read through [`contract::PresaleContract`]. The
//! [`presale::PresaleController`] keeps the per-connection snapshot
//! (balances, tier, deposit status, window, total raised) and submits the
//! tier-capped deposit, while the pure functions in [`presale::derive`] turn a
//! snapshot into the labels and messages shown to the user.
//!
//! [`runtime::PresalePoller`] drives the countdown and total-raised timers.
//! The iced front end lives in `ui` behind the `gui` feature; the
//! `presale-dapp` binary exposes the same operations on the command line.

pub mod config;
pub mod connector;
pub mod contract;
pub mod errors;
pub mod notify;
pub mod presale;
pub mod rpc;
pub mod runtime;
#[cfg(feature = "gui")]
pub mod ui;

pub use config::{PresaleConfig, PresaleRules};
pub use connector::{ConnectionErrorKind, ConnectionState, ConnectorKind, WalletConnector};
pub use errors::{PresaleError, PresaleResult};
pub use presale::{DepositOutcome, PresaleController, PresaleView};
