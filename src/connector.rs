//! Wallet connection management.
//!
//! Two connector kinds exist: an injected wallet that exposes a local
//! JSON-RPC endpoint, and a bridge-based remote wallet reached through a
//! relay. Both resolve to the same [`ConnectionState`] shape and, when the
//! connection is usable, to a [`WalletSession`] carrying the RPC clients.

use std::fmt;

use async_trait::async_trait;
use ethers_core::types::Address;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::config::{NetworkConfig, WalletEndpointConfig};
use crate::errors::{PresaleError, PresaleResult};
use crate::rpc::EthRpcClient;

/// Provider selected by the user at connect time.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectorKind {
    Injected,
    BridgeBased,
}

impl ConnectorKind {
    pub const ALL: [ConnectorKind; 2] = [ConnectorKind::Injected, ConnectorKind::BridgeBased];

    pub fn title(self) -> &'static str {
        match self {
            ConnectorKind::Injected => "Injected wallet",
            ConnectorKind::BridgeBased => "Wallet bridge",
        }
    }
}

impl fmt::Display for ConnectorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.title())
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ConnectionErrorKind {
    #[default]
    None,
    UnsupportedNetwork,
    NoProvider,
}

/// Connection status as seen by the derivation logic.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ConnectionState {
    pub address: Option<Address>,
    pub chain_id: Option<u64>,
    pub is_active: bool,
    pub error: ConnectionErrorKind,
}

impl ConnectionState {
    pub fn disconnected() -> Self {
        Self::default()
    }

    pub fn active(address: Address, chain_id: u64) -> Self {
        Self {
            address: Some(address),
            chain_id: Some(chain_id),
            is_active: true,
            error: ConnectionErrorKind::None,
        }
    }

    pub fn failed(error: ConnectionErrorKind, chain_id: Option<u64>) -> Self {
        Self {
            address: None,
            chain_id,
            is_active: false,
            error,
        }
    }

    /// True when contract reads may be issued for this connection.
    pub fn is_usable(&self) -> bool {
        self.is_active && self.error == ConnectionErrorKind::None && self.address.is_some()
    }
}

/// RPC handles for an active connection.
#[derive(Clone, Debug)]
pub struct WalletSession {
    pub kind: ConnectorKind,
    pub account: Address,
    pub chain_id: u64,
    /// Client used for account and signing requests.
    pub signer: EthRpcClient,
    /// Client used for reads; equal to `signer` unless a read endpoint is configured.
    pub reader: EthRpcClient,
}

#[async_trait]
pub trait WalletConnector: Send + Sync {
    async fn connect(&self, kind: ConnectorKind) -> ConnectionState;

    fn disconnect(&self) -> ConnectionState;

    fn state(&self) -> ConnectionState;
}

/// [`WalletConnector`] backed by Ethereum JSON-RPC endpoints.
pub struct RpcWalletConnector {
    network: NetworkConfig,
    endpoints: WalletEndpointConfig,
    current: RwLock<Connected>,
}

#[derive(Default)]
struct Connected {
    state: ConnectionState,
    session: Option<WalletSession>,
}

impl RpcWalletConnector {
    pub fn new(network: NetworkConfig, endpoints: WalletEndpointConfig) -> Self {
        Self {
            network,
            endpoints,
            current: RwLock::new(Connected::default()),
        }
    }

    /// Session of the current connection, if it is usable.
    pub fn session(&self) -> Option<WalletSession> {
        self.current.read().session.clone()
    }

    async fn establish(&self, kind: ConnectorKind) -> PresaleResult<WalletSession> {
        let timeout = self.endpoints.request_timeout();
        let signer = match kind {
            ConnectorKind::Injected => {
                EthRpcClient::from_endpoint(&self.endpoints.injected_endpoint, None, timeout)?
            }
            ConnectorKind::BridgeBased => EthRpcClient::from_endpoint(
                &self.endpoints.bridge_endpoint,
                self.endpoints.bridge_auth_token.clone(),
                timeout,
            )?,
        };

        let chain_id = signer.chain_id().await.map_err(|error| {
            if error.is_unreachable() {
                PresaleError::ProviderMissing(format!("{}: {error}", signer.endpoint()))
            } else {
                PresaleError::Rpc(error)
            }
        })?;
        if !self.network.is_supported(chain_id) {
            return Err(PresaleError::UnsupportedNetwork(chain_id));
        }

        let accounts = signer.request_accounts().await?;
        let account = accounts.first().copied().ok_or_else(|| {
            PresaleError::ProviderMissing(format!("{} exposes no accounts", signer.endpoint()))
        })?;

        let reader = match (kind, self.endpoints.rpc_url(chain_id)) {
            (ConnectorKind::BridgeBased, Some(url)) => {
                EthRpcClient::from_endpoint(url, None, timeout)?
            }
            _ => signer.clone(),
        };

        Ok(WalletSession {
            kind,
            account,
            chain_id,
            signer,
            reader,
        })
    }
}

#[async_trait]
impl WalletConnector for RpcWalletConnector {
    async fn connect(&self, kind: ConnectorKind) -> ConnectionState {
        let (state, session) = match self.establish(kind).await {
            Ok(session) => {
                info!(
                    %kind,
                    account = ?session.account,
                    chain_id = session.chain_id,
                    "wallet connected"
                );
                (
                    ConnectionState::active(session.account, session.chain_id),
                    Some(session),
                )
            }
            Err(PresaleError::UnsupportedNetwork(chain_id)) => {
                warn!(%kind, chain_id, "wallet connected to an unsupported network");
                (
                    ConnectionState::failed(ConnectionErrorKind::UnsupportedNetwork, Some(chain_id)),
                    None,
                )
            }
            Err(error) => {
                warn!(%kind, %error, "no usable ethereum provider");
                (
                    ConnectionState::failed(ConnectionErrorKind::NoProvider, None),
                    None,
                )
            }
        };

        let mut current = self.current.write();
        current.state = state.clone();
        current.session = session;
        state
    }

    fn disconnect(&self) -> ConnectionState {
        let mut current = self.current.write();
        if current.state.is_active {
            info!("wallet disconnected");
        }
        *current = Connected::default();
        current.state.clone()
    }

    fn state(&self) -> ConnectionState {
        self.current.read().state.clone()
    }
}
