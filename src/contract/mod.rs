//! Presale contract client.

pub mod abi;
pub mod rpc;

use async_trait::async_trait;
use ethers_core::types::{Address, H256, U256};

use crate::errors::PresaleResult;
use crate::presale::state::{PresaleWindow, UserRecord};

pub use rpc::RpcPresaleContract;

/// Outcome of a mined deposit transaction.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DepositReceipt {
    pub transaction_hash: H256,
    pub block_number: Option<u64>,
    pub status: bool,
}

/// Read and write operations the presale session issues against the chain.
#[async_trait]
pub trait PresaleContract: Send + Sync {
    /// Reference-token amount required for `level` (1 to 3).
    async fn tier_threshold(&self, level: u8) -> PresaleResult<U256>;

    async fn user_record(&self, account: Address) -> PresaleResult<UserRecord>;

    async fn presale_window(&self) -> PresaleResult<PresaleWindow>;

    async fn total_raised(&self) -> PresaleResult<U256>;

    /// ERC-20 balance of `account` for `token`.
    async fn token_balance(&self, token: Address, account: Address) -> PresaleResult<U256>;

    async fn native_balance(&self, account: Address) -> PresaleResult<U256>;

    /// Sends the payable `deposit()` call and returns the transaction hash.
    async fn submit_deposit(&self, from: Address, amount: U256) -> PresaleResult<H256>;

    /// Waits until the transaction is mined.
    async fn await_confirmation(&self, transaction: H256) -> PresaleResult<DepositReceipt>;
}
