use std::time::Duration;

use async_trait::async_trait;
use ethers_core::types::{Address, TransactionRequest, H256, U256};
use tokio::time;
use tracing::{debug, info};

use crate::config::{ContractsConfig, PollingConfig};
use crate::connector::WalletSession;
use crate::errors::{PresaleError, PresaleResult};
use crate::presale::state::{PresaleWindow, UserRecord};
use crate::rpc::EthRpcClientError;

use super::abi;
use super::{DepositReceipt, PresaleContract};

/// [`PresaleContract`] implementation issuing JSON-RPC calls through a
/// connected [`WalletSession`].
#[derive(Clone, Debug)]
pub struct RpcPresaleContract {
    session: WalletSession,
    contracts: ContractsConfig,
    confirmation_poll: Duration,
    confirmation_timeout: Duration,
}

impl RpcPresaleContract {
    pub fn new(session: WalletSession, contracts: ContractsConfig, polling: &PollingConfig) -> Self {
        Self {
            session,
            contracts,
            confirmation_poll: polling.confirmation_poll(),
            confirmation_timeout: polling.confirmation_timeout(),
        }
    }

    pub fn session(&self) -> &WalletSession {
        &self.session
    }

    async fn read_uint(
        &self,
        to: Address,
        signature: &str,
        args: &[ethers_core::abi::Token],
    ) -> PresaleResult<U256> {
        let data = self
            .session
            .reader
            .eth_call(to, abi::encode_call(signature, args))
            .await?;
        abi::decode_first_uint(signature, &data)
    }

    async fn read_timestamp(&self, signature: &str) -> PresaleResult<u64> {
        let data = self
            .session
            .reader
            .eth_call(self.contracts.presale, abi::encode_call(signature, &[]))
            .await?;
        abi::decode_timestamp(signature, &data)
    }

    async fn poll_receipt(&self, transaction: H256) -> Result<DepositReceipt, EthRpcClientError> {
        let mut ticker = time::interval(self.confirmation_poll);
        loop {
            ticker.tick().await;
            if let Some(receipt) = self.session.reader.transaction_receipt(transaction).await? {
                return Ok(DepositReceipt {
                    transaction_hash: receipt.transaction_hash,
                    block_number: receipt.block_number.map(|number| number.as_u64()),
                    status: receipt.succeeded(),
                });
            }
            debug!(?transaction, "deposit not mined yet");
        }
    }
}

#[async_trait]
impl PresaleContract for RpcPresaleContract {
    async fn tier_threshold(&self, level: u8) -> PresaleResult<U256> {
        self.read_uint(
            self.contracts.presale,
            abi::TIERS,
            &[abi::uint_arg(u64::from(level))],
        )
        .await
    }

    async fn user_record(&self, account: Address) -> PresaleResult<UserRecord> {
        let deposit = self
            .read_uint(
                self.contracts.presale,
                abi::USER_INFO,
                &[abi::address_arg(account)],
            )
            .await?;
        Ok(UserRecord { deposit })
    }

    async fn presale_window(&self) -> PresaleResult<PresaleWindow> {
        let start = self.read_timestamp(abi::TIME_START).await?;
        let end = self.read_timestamp(abi::TIME_END).await?;
        Ok(PresaleWindow::new(start, end))
    }

    async fn total_raised(&self) -> PresaleResult<U256> {
        self.read_uint(self.contracts.presale, abi::TOTAL_DEPOSIT, &[])
            .await
    }

    async fn token_balance(&self, token: Address, account: Address) -> PresaleResult<U256> {
        self.read_uint(token, abi::BALANCE_OF, &[abi::address_arg(account)])
            .await
    }

    async fn native_balance(&self, account: Address) -> PresaleResult<U256> {
        self.session
            .reader
            .get_balance(account)
            .await
            .map_err(|error| PresaleError::BalanceFetchFailed(error.to_string()))
    }

    async fn submit_deposit(&self, from: Address, amount: U256) -> PresaleResult<H256> {
        let transaction = TransactionRequest::new()
            .from(from)
            .to(self.contracts.presale)
            .value(amount)
            .data(abi::encode_call(abi::DEPOSIT, &[]));
        let hash = self
            .session
            .signer
            .send_transaction(&transaction)
            .await
            .map_err(|error| PresaleError::TransactionRejectedOrFailed(error.describe()))?;
        info!(?hash, %amount, "deposit transaction submitted");
        Ok(hash)
    }

    async fn await_confirmation(&self, transaction: H256) -> PresaleResult<DepositReceipt> {
        match time::timeout(self.confirmation_timeout, self.poll_receipt(transaction)).await {
            Ok(Ok(receipt)) => Ok(receipt),
            Ok(Err(error)) => Err(PresaleError::TransactionRejectedOrFailed(error.describe())),
            Err(_) => Err(PresaleError::TransactionRejectedOrFailed(format!(
                "transaction {transaction:?} not mined within {}s",
                self.confirmation_timeout.as_secs()
            ))),
        }
    }
}
