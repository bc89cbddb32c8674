use std::fmt;
use std::sync::Arc;

use ethers_core::types::{Address, U256};
use parking_lot::Mutex;
use tracing::{debug, info, warn};

use crate::config::{ContractsConfig, MessagesConfig, PresaleConfig, PresaleRules};
use crate::connector::ConnectionState;
use crate::contract::{DepositReceipt, PresaleContract};
use crate::errors::PresaleResult;
use crate::notify::{NotificationKind, Notifier};

use super::derive::{self, PresaleView};
use super::state::{PresaleSnapshot, TierThresholds, UserTier};

/// Resolved configuration a controller needs for one session.
#[derive(Clone, Debug)]
pub struct SessionSettings {
    pub rules: PresaleRules,
    pub contracts: ContractsConfig,
    pub messages: MessagesConfig,
}

impl SessionSettings {
    pub fn from_config(config: &PresaleConfig) -> PresaleResult<Self> {
        Ok(Self {
            rules: config.rules()?,
            contracts: config.contracts.clone(),
            messages: config.messages.clone(),
        })
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DepositOutcome {
    /// The gate was closed or the tier carries no deposit amount. Only the
    /// latter is reported through the notifier.
    Skipped,
    Confirmed(DepositReceipt),
    Failed(DepositReceipt),
    Rejected,
}

/// Owns the derived state of one wallet connection.
///
/// A controller is created per connection. Results of reads that finish after
/// [`PresaleController::disconnect`] are dropped.
pub struct PresaleController<C, N> {
    inner: Arc<Inner<C, N>>,
}

struct Inner<C, N> {
    contract: C,
    notifier: N,
    settings: SessionSettings,
    state: Mutex<PresaleSnapshot>,
}

impl<C, N> Clone for PresaleController<C, N> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<C, N> fmt::Debug for PresaleController<C, N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PresaleController")
            .field("state", &*self.inner.state.lock())
            .finish_non_exhaustive()
    }
}

impl<C, N> PresaleController<C, N>
where
    C: PresaleContract,
    N: Notifier,
{
    pub fn new(
        contract: C,
        notifier: N,
        connection: ConnectionState,
        settings: SessionSettings,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                contract,
                notifier,
                settings,
                state: Mutex::new(PresaleSnapshot::for_connection(connection)),
            }),
        }
    }

    pub fn contract(&self) -> &C {
        &self.inner.contract
    }

    pub fn rules(&self) -> &PresaleRules {
        &self.inner.settings.rules
    }

    pub fn snapshot(&self) -> PresaleSnapshot {
        self.inner.state.lock().clone()
    }

    pub fn view(&self, now_ms: u64) -> PresaleView {
        let snapshot = self.snapshot();
        PresaleView::derive(&snapshot, self.rules(), now_ms)
    }

    /// Resets every derived value to unknown.
    pub fn disconnect(&self) {
        *self.inner.state.lock() = PresaleSnapshot::default();
    }

    fn account(&self) -> Option<Address> {
        let state = self.inner.state.lock();
        if state.connection.is_usable() {
            state.connection.address
        } else {
            None
        }
    }

    /// Applies `update` unless the connection was dropped meanwhile.
    fn apply(&self, update: impl FnOnce(&mut PresaleSnapshot)) {
        let mut state = self.inner.state.lock();
        if state.is_active() {
            update(&mut state);
        }
    }

    /// Fetches balances, deposit status, window and tier concurrently.
    pub async fn refresh_all(&self) {
        let Some(account) = self.account() else {
            return;
        };
        let contract = &self.inner.contract;
        let presale_token = self.inner.settings.contracts.presale_token;
        let (native, token, record, window, tier) = tokio::join!(
            contract.native_balance(account),
            contract.token_balance(presale_token, account),
            contract.user_record(account),
            contract.presale_window(),
            self.fetch_tier(account),
        );

        self.apply(|state| {
            state.balances.native = balance_or_unknown("native", native);
            state.balances.presale_token = balance_or_unknown("presale token", token);
            match record {
                Ok(record) => state.deposit.observe(&record),
                Err(error) => warn!(%error, "failed to read user record"),
            }
            match window {
                Ok(window) => state.window = window,
                Err(error) => warn!(%error, "failed to read presale window"),
            }
            match tier {
                Ok(tier) => state.tier = tier,
                Err(error) => warn!(%error, "failed to resolve whitelist tier"),
            }
            info!(
                account = ?account,
                tier = state.tier.level(),
                deposited = state.deposit.has_deposited,
                start = state.window.start_epoch_seconds,
                end = state.window.end_epoch_seconds,
                "presale state refreshed"
            );
        });
    }

    async fn fetch_tier(&self, account: Address) -> PresaleResult<UserTier> {
        let contract = &self.inner.contract;
        let reference_token = self.inner.settings.contracts.reference_token;
        let (tier_1, tier_2, tier_3, balance) = tokio::try_join!(
            contract.tier_threshold(1),
            contract.tier_threshold(2),
            contract.tier_threshold(3),
            contract.token_balance(reference_token, account),
        )?;
        let thresholds = TierThresholds::new(tier_1, tier_2, tier_3);
        Ok(derive::user_tier(&thresholds, balance))
    }

    pub async fn refresh_total_raised(&self) {
        if self.account().is_none() {
            return;
        }
        match self.inner.contract.total_raised().await {
            Ok(total) => self.apply(|state| state.total_raised = Some(total)),
            Err(error) => warn!(%error, "failed to read total raised"),
        }
    }

    pub async fn refresh_native_balance(&self) {
        let Some(account) = self.account() else {
            return;
        };
        let balance = self.inner.contract.native_balance(account).await;
        self.apply(|state| state.balances.native = balance_or_unknown("native", balance));
    }

    pub async fn refresh_deposit_status(&self) {
        let Some(account) = self.account() else {
            return;
        };
        match self.inner.contract.user_record(account).await {
            Ok(record) => self.apply(|state| state.deposit.observe(&record)),
            Err(error) => warn!(%error, "failed to read user record"),
        }
    }

    /// Sends the tier's deposit when the gate is open and reports the
    /// outcome through the notifier.
    pub async fn submit_deposit(&self, now_ms: u64) -> DepositOutcome {
        let Some((account, amount)) = self.begin_deposit(now_ms) else {
            return DepositOutcome::Skipped;
        };

        let result = self.send_and_confirm(account, amount).await;
        self.apply(|state| state.pending = false);

        let messages = &self.inner.settings.messages;
        let outcome = match result {
            Ok(receipt) if receipt.status => {
                info!(transaction = ?receipt.transaction_hash, %amount, "deposit confirmed");
                self.inner
                    .notifier
                    .notify(NotificationKind::Success, &messages.transaction_success);
                DepositOutcome::Confirmed(receipt)
            }
            Ok(receipt) => {
                warn!(transaction = ?receipt.transaction_hash, "deposit reverted");
                self.inner
                    .notifier
                    .notify(NotificationKind::Error, &messages.transaction_fail);
                DepositOutcome::Failed(receipt)
            }
            Err(error) => {
                warn!(%error, "deposit rejected");
                self.inner
                    .notifier
                    .notify(NotificationKind::Warning, &messages.transaction_reject);
                return DepositOutcome::Rejected;
            }
        };

        tokio::join!(
            self.refresh_native_balance(),
            self.refresh_deposit_status(),
            self.refresh_total_raised(),
        );
        outcome
    }

    async fn send_and_confirm(
        &self,
        account: Address,
        amount: U256,
    ) -> PresaleResult<DepositReceipt> {
        let contract = &self.inner.contract;
        let transaction = contract.submit_deposit(account, amount).await?;
        contract.await_confirmation(transaction).await
    }

    fn begin_deposit(&self, now_ms: u64) -> Option<(Address, U256)> {
        let mut state = self.inner.state.lock();
        if !derive::can_contribute(&state, self.rules(), now_ms) {
            debug!("deposit gate closed");
            return None;
        }
        let account = state.connection.address?;
        let Some(amount) = self.rules().deposit_amount(state.tier.level()) else {
            debug!("account has no whitelist tier, nothing to deposit");
            drop(state);
            self.inner.notifier.notify(
                NotificationKind::Warning,
                &self.inner.settings.messages.not_whitelisted,
            );
            return None;
        };
        state.pending = true;
        Some((account, amount))
    }
}

fn balance_or_unknown(asset: &str, balance: PresaleResult<U256>) -> Option<U256> {
    balance
        .map_err(|error| warn!(asset, %error, "balance unknown"))
        .ok()
}
