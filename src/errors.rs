use std::io;

use thiserror::Error;

use crate::rpc::client::EthRpcClientError;

#[derive(Debug, Error)]
pub enum PresaleError {
    #[error("no ethereum provider reachable: {0}")]
    ProviderMissing(String),
    #[error("unsupported network: chain id {0}")]
    UnsupportedNetwork(u64),
    #[error("transaction rejected or failed: {0}")]
    TransactionRejectedOrFailed(String),
    #[error("balance fetch failed: {0}")]
    BalanceFetchFailed(String),
    #[error("rpc error: {0}")]
    Rpc(#[from] EthRpcClientError),
    #[error("abi error: {0}")]
    Abi(String),
    #[error("configuration error: {0}")]
    Config(String),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

pub type PresaleResult<T> = Result<T, PresaleError>;
