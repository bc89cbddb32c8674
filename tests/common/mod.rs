#![allow(dead_code)]

use std::sync::Arc;

use async_trait::async_trait;
use ethers_core::types::{Address, H256, U256};
use ethers_core::utils::parse_ether;
use parking_lot::Mutex;
use tokio::sync::Notify;

use presale_dapp::config::PresaleConfig;
use presale_dapp::connector::ConnectionState;
use presale_dapp::contract::{DepositReceipt, PresaleContract};
use presale_dapp::errors::{PresaleError, PresaleResult};
use presale_dapp::notify::{NotificationKind, Notifier};
use presale_dapp::presale::{PresaleController, PresaleWindow, SessionSettings, UserRecord};

pub const NOW_SECS: u64 = 1_700_000_000;
pub const NOW_MS: u64 = NOW_SECS * 1_000;

pub fn eth(value: &str) -> U256 {
    parse_ether(value).expect("ether amount")
}

pub fn account() -> Address {
    Address::repeat_byte(0x5a)
}

/// Presale token kept apart from the reference token so the two balances
/// can be told apart.
pub fn presale_token() -> Address {
    Address::repeat_byte(0x33)
}

pub fn settings() -> SessionSettings {
    let mut config = PresaleConfig::default();
    config.contracts.presale_token = presale_token();
    SessionSettings::from_config(&config).expect("settings")
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SubmitMode {
    Confirm,
    Revert,
    Reject,
    LoseReceipt,
}

/// Scripted chain state backing [`FakeContract`].
pub struct FakeChain {
    pub thresholds: [U256; 3],
    pub reference_balance: Mutex<U256>,
    pub native_balance: Mutex<Option<U256>>,
    pub presale_balance: Mutex<Option<U256>>,
    pub deposit: Mutex<U256>,
    pub window: Mutex<Option<PresaleWindow>>,
    pub total_raised: Mutex<Option<U256>>,
    pub submit_mode: Mutex<SubmitMode>,
    pub submissions: Mutex<Vec<(Address, U256)>>,
    /// When set, `submit_deposit` waits for a notification before returning.
    pub hold_submission: Mutex<Option<Arc<Notify>>>,
}

impl Default for FakeChain {
    fn default() -> Self {
        Self {
            thresholds: [eth("1000"), eth("2000"), eth("3000")],
            reference_balance: Mutex::new(eth("2500")),
            native_balance: Mutex::new(Some(eth("1"))),
            presale_balance: Mutex::new(Some(U256::zero())),
            deposit: Mutex::new(U256::zero()),
            window: Mutex::new(Some(PresaleWindow::new(NOW_SECS - 10, NOW_SECS + 3_661))),
            total_raised: Mutex::new(Some(eth("12"))),
            submit_mode: Mutex::new(SubmitMode::Confirm),
            submissions: Mutex::new(Vec::new()),
            hold_submission: Mutex::new(None),
        }
    }
}

#[derive(Clone, Default)]
pub struct FakeContract {
    pub chain: Arc<FakeChain>,
}

fn unavailable(what: &str) -> PresaleError {
    PresaleError::Abi(format!("{what} unavailable"))
}

#[async_trait]
impl PresaleContract for FakeContract {
    async fn tier_threshold(&self, level: u8) -> PresaleResult<U256> {
        Ok(self.chain.thresholds[usize::from(level) - 1])
    }

    async fn user_record(&self, _account: Address) -> PresaleResult<UserRecord> {
        Ok(UserRecord {
            deposit: *self.chain.deposit.lock(),
        })
    }

    async fn presale_window(&self) -> PresaleResult<PresaleWindow> {
        (*self.chain.window.lock()).ok_or_else(|| unavailable("window"))
    }

    async fn total_raised(&self) -> PresaleResult<U256> {
        (*self.chain.total_raised.lock()).ok_or_else(|| unavailable("total raised"))
    }

    async fn token_balance(&self, token: Address, _account: Address) -> PresaleResult<U256> {
        if token == presale_token() {
            (*self.chain.presale_balance.lock()).ok_or_else(|| unavailable("token balance"))
        } else {
            Ok(*self.chain.reference_balance.lock())
        }
    }

    async fn native_balance(&self, _account: Address) -> PresaleResult<U256> {
        (*self.chain.native_balance.lock())
            .ok_or_else(|| PresaleError::BalanceFetchFailed("node unavailable".into()))
    }

    async fn submit_deposit(&self, from: Address, amount: U256) -> PresaleResult<H256> {
        let hold = self.chain.hold_submission.lock().clone();
        if let Some(hold) = hold {
            hold.notified().await;
        }
        if *self.chain.submit_mode.lock() == SubmitMode::Reject {
            return Err(PresaleError::TransactionRejectedOrFailed(
                "user rejected the request".into(),
            ));
        }
        self.chain.submissions.lock().push((from, amount));
        Ok(H256::repeat_byte(0x77))
    }

    async fn await_confirmation(&self, transaction: H256) -> PresaleResult<DepositReceipt> {
        let mode = *self.chain.submit_mode.lock();
        let status = match mode {
            SubmitMode::Confirm => true,
            SubmitMode::Revert => false,
            SubmitMode::Reject | SubmitMode::LoseReceipt => {
                return Err(PresaleError::TransactionRejectedOrFailed(
                    "receipt never arrived".into(),
                ))
            }
        };
        if status {
            let amount = self
                .chain
                .submissions
                .lock()
                .last()
                .map(|(_, amount)| *amount)
                .unwrap_or_default();
            *self.chain.deposit.lock() += amount;
            if let Some(total) = self.chain.total_raised.lock().as_mut() {
                *total += amount;
            }
            if let Some(balance) = self.chain.native_balance.lock().as_mut() {
                *balance -= amount;
            }
        }
        Ok(DepositReceipt {
            transaction_hash: transaction,
            block_number: Some(42),
            status,
        })
    }
}

#[derive(Clone, Default)]
pub struct RecordingNotifier {
    pub events: Arc<Mutex<Vec<(NotificationKind, String)>>>,
}

impl RecordingNotifier {
    pub fn events(&self) -> Vec<(NotificationKind, String)> {
        self.events.lock().clone()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, kind: NotificationKind, message: &str) {
        self.events.lock().push((kind, message.to_owned()));
    }
}

pub fn controller_with(
    contract: FakeContract,
) -> (PresaleController<FakeContract, RecordingNotifier>, RecordingNotifier) {
    let notifier = RecordingNotifier::default();
    let controller = PresaleController::new(
        contract,
        notifier.clone(),
        ConnectionState::active(account(), 1),
        settings(),
    );
    (controller, notifier)
}
