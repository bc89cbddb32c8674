use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::time::Duration;

use ethers_core::types::{Address, U256};
use ethers_core::utils::parse_ether;
use serde::{Deserialize, Serialize};

use crate::errors::{PresaleError, PresaleResult};

const DEFAULT_CHAIN_ID: u64 = 1;
const DEFAULT_CHAIN_NAME: &str = "ETH MAINNET";
const DEFAULT_INJECTED_ENDPOINT: &str = "http://127.0.0.1:1248";
const DEFAULT_BRIDGE_ENDPOINT: &str = "http://127.0.0.1:8545";
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 15;
const DEFAULT_PRESALE_ADDRESS: &str = "0xfc902c04d8fcf67735432ada207ad8061a8e63a6";
const DEFAULT_TOKEN_ADDRESS: &str = "0xd1cbfc7f417e9f5511a7502c83f2074f675995f5";
const DEFAULT_COUNTDOWN_INTERVAL_MS: u64 = 1_000;
const DEFAULT_TOTAL_RAISED_INTERVAL_MS: u64 = 5_000;
const DEFAULT_CONFIRMATION_POLL_MS: u64 = 2_000;
const DEFAULT_CONFIRMATION_TIMEOUT_SECS: u64 = 600;
const MIN_POLL_INTERVAL_MS: u64 = 100;
const DEFAULT_TOKEN_RATE: u64 = 1_000_000;

/// Top-level presale client configuration.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(default)]
pub struct PresaleConfig {
    pub network: NetworkConfig,
    pub wallet: WalletEndpointConfig,
    pub contracts: ContractsConfig,
    pub deposit: DepositConfig,
    pub polling: PollingConfig,
    pub messages: MessagesConfig,
}

impl PresaleConfig {
    pub fn load(path: &Path) -> PresaleResult<Self> {
        let content = fs::read_to_string(path)?;
        toml::from_str(&content)
            .map_err(|err| PresaleError::Config(format!("unable to parse config: {err}")))
    }

    pub fn save(&self, path: &Path) -> PresaleResult<()> {
        let parent = path.parent().unwrap_or_else(|| Path::new("."));
        fs::create_dir_all(parent)?;
        let encoded = toml::to_string_pretty(self)
            .map_err(|err| PresaleError::Config(format!("unable to encode config: {err}")))?;
        fs::write(path, encoded)?;
        Ok(())
    }

    /// Loads `path` when it exists, falling back to defaults otherwise.
    pub fn load_or_default(path: &Path) -> PresaleResult<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Resolves the decimal amounts into base units once, so the derivation
    /// functions never have to deal with parse failures.
    pub fn rules(&self) -> PresaleResult<PresaleRules> {
        let deposit = &self.deposit;
        if deposit.tier_amounts.len() != 3 {
            return Err(PresaleError::Config(format!(
                "expected 3 tier amounts, found {}",
                deposit.tier_amounts.len()
            )));
        }
        if deposit.token_rate == 0 {
            return Err(PresaleError::Config("token rate must be positive".into()));
        }
        let mut tier_amounts = [U256::zero(); 3];
        for (slot, raw) in tier_amounts.iter_mut().zip(&deposit.tier_amounts) {
            *slot = parse_amount("tier amount", raw)?;
        }
        Ok(PresaleRules {
            tier_amounts,
            tier_amount_labels: [
                deposit.tier_amounts[0].trim().to_owned(),
                deposit.tier_amounts[1].trim().to_owned(),
                deposit.tier_amounts[2].trim().to_owned(),
            ],
            base_amount: parse_amount("base amount", &deposit.base_amount)?,
            fee_buffer: parse_amount("fee buffer", &deposit.fee_buffer)?,
            min_contribution_balance: parse_amount(
                "minimum contribution balance",
                &deposit.min_contribution_balance,
            )?,
            hard_cap: parse_amount("hard cap", &deposit.hard_cap)?,
            token_rate: deposit.token_rate,
            native_symbol: deposit.native_symbol.clone(),
            token_symbol: deposit.token_symbol.clone(),
            chain_name: self.network.chain_name.clone(),
        })
    }
}

fn parse_amount(field: &str, raw: &str) -> PresaleResult<U256> {
    parse_ether(raw.trim())
        .map_err(|err| PresaleError::Config(format!("invalid {field} `{raw}`: {err}")))
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct NetworkConfig {
    /// Chain ids the connector accepts; anything else is reported as a wrong network.
    pub supported_chain_ids: Vec<u64>,
    /// Human readable name shown once connected.
    pub chain_name: String,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            supported_chain_ids: vec![DEFAULT_CHAIN_ID],
            chain_name: DEFAULT_CHAIN_NAME.to_owned(),
        }
    }
}

impl NetworkConfig {
    pub fn is_supported(&self, chain_id: u64) -> bool {
        self.supported_chain_ids.contains(&chain_id)
    }
}

/// Endpoints used by the two connector kinds.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct WalletEndpointConfig {
    /// JSON-RPC endpoint exposed by a local wallet (accounts and signing).
    pub injected_endpoint: String,
    /// JSON-RPC endpoint of the remote signing bridge.
    pub bridge_endpoint: String,
    /// Optional bearer token sent to the bridge endpoint.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bridge_auth_token: Option<String>,
    pub request_timeout_secs: u64,
    /// Read endpoints keyed by chain id, used by bridge sessions when present.
    pub rpc_urls: BTreeMap<String, String>,
}

impl Default for WalletEndpointConfig {
    fn default() -> Self {
        Self {
            injected_endpoint: DEFAULT_INJECTED_ENDPOINT.to_owned(),
            bridge_endpoint: DEFAULT_BRIDGE_ENDPOINT.to_owned(),
            bridge_auth_token: None,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            rpc_urls: BTreeMap::new(),
        }
    }
}

impl WalletEndpointConfig {
    pub fn rpc_url(&self, chain_id: u64) -> Option<&str> {
        self.rpc_urls
            .get(&chain_id.to_string())
            .map(String::as_str)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ContractsConfig {
    /// Presale contract receiving deposits.
    pub presale: Address,
    /// Token whose holdings decide the whitelist tier.
    pub reference_token: Address,
    /// Token sold by the presale.
    pub presale_token: Address,
}

impl Default for ContractsConfig {
    fn default() -> Self {
        let token: Address = DEFAULT_TOKEN_ADDRESS.parse().expect("valid token address");
        Self {
            presale: DEFAULT_PRESALE_ADDRESS
                .parse()
                .expect("valid presale address"),
            reference_token: token,
            presale_token: token,
        }
    }
}

/// Deposit amounts, expressed as decimal strings of the native currency.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct DepositConfig {
    /// Deposit for tiers 1, 2 and 3.
    pub tier_amounts: Vec<String>,
    /// Per-tier step used by the insufficient balance check.
    pub base_amount: String,
    /// Gas headroom added on top of the tier amount.
    pub fee_buffer: String,
    /// Balance below which the contribute action is disabled.
    pub min_contribution_balance: String,
    /// Raise target used for the progress indicator.
    pub hard_cap: String,
    /// Presale tokens received per native unit.
    pub token_rate: u64,
    pub native_symbol: String,
    pub token_symbol: String,
}

impl Default for DepositConfig {
    fn default() -> Self {
        Self {
            tier_amounts: vec!["0.2".into(), "0.4".into(), "0.6".into()],
            base_amount: "0.2".into(),
            fee_buffer: "0.02".into(),
            min_contribution_balance: "0.32".into(),
            hard_cap: "60".into(),
            token_rate: DEFAULT_TOKEN_RATE,
            native_symbol: "ETH".into(),
            token_symbol: "TMX".into(),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct PollingConfig {
    pub countdown_interval_ms: u64,
    pub total_raised_interval_ms: u64,
    pub confirmation_poll_ms: u64,
    pub confirmation_timeout_secs: u64,
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            countdown_interval_ms: DEFAULT_COUNTDOWN_INTERVAL_MS,
            total_raised_interval_ms: DEFAULT_TOTAL_RAISED_INTERVAL_MS,
            confirmation_poll_ms: DEFAULT_CONFIRMATION_POLL_MS,
            confirmation_timeout_secs: DEFAULT_CONFIRMATION_TIMEOUT_SECS,
        }
    }
}

impl PollingConfig {
    pub fn countdown_interval(&self) -> Duration {
        Duration::from_millis(self.countdown_interval_ms.max(MIN_POLL_INTERVAL_MS))
    }

    pub fn total_raised_interval(&self) -> Duration {
        Duration::from_millis(self.total_raised_interval_ms.max(MIN_POLL_INTERVAL_MS))
    }

    pub fn confirmation_poll(&self) -> Duration {
        Duration::from_millis(self.confirmation_poll_ms.max(MIN_POLL_INTERVAL_MS))
    }

    pub fn confirmation_timeout(&self) -> Duration {
        Duration::from_secs(self.confirmation_timeout_secs.max(1))
    }
}

/// Notification texts shown after a deposit attempt.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct MessagesConfig {
    pub transaction_success: String,
    pub transaction_fail: String,
    pub transaction_reject: String,
    pub not_whitelisted: String,
}

impl Default for MessagesConfig {
    fn default() -> Self {
        Self {
            transaction_success: "Transaction Success".into(),
            transaction_fail: "Transaction Fail".into(),
            transaction_reject: "Transaction Reject".into(),
            not_whitelisted: "Account is not in whitelist".into(),
        }
    }
}

/// Amounts and labels resolved from [`PresaleConfig`], consumed by the
/// derivation functions.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PresaleRules {
    pub tier_amounts: [U256; 3],
    pub tier_amount_labels: [String; 3],
    pub base_amount: U256,
    pub fee_buffer: U256,
    pub min_contribution_balance: U256,
    pub hard_cap: U256,
    pub token_rate: u64,
    pub native_symbol: String,
    pub token_symbol: String,
    pub chain_name: String,
}

impl PresaleRules {
    /// Deposit amount for `tier`; tier 0 has none.
    pub fn deposit_amount(&self, tier: u8) -> Option<U256> {
        match tier {
            1..=3 => Some(self.tier_amounts[usize::from(tier) - 1]),
            _ => None,
        }
    }
}

impl Default for PresaleRules {
    fn default() -> Self {
        PresaleConfig::default()
            .rules()
            .expect("default presale config resolves")
    }
}
