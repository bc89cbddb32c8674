//! Ethereum JSON-RPC plumbing shared by the wallet connector and the
//! presale contract client.

pub mod client;
pub mod dto;
pub mod error;

pub use client::{EthRpcClient, EthRpcClientError};
pub use dto::ReceiptDto;
pub use error::{describe_rpc_error, ErrorDescription, EthRpcErrorCode};
