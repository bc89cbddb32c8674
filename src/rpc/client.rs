use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use ethers_core::types::{Address, Bytes, TransactionRequest, H256, U256, U64};
use reqwest::{Client, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use tracing::debug;

use super::dto::{CallRequest, JsonRpcRequest, JsonRpcResponse, ReceiptDto};
use super::error::{describe_rpc_error, EthRpcErrorCode};

/// Typed Ethereum JSON-RPC client over HTTP.
#[derive(Clone, Debug)]
pub struct EthRpcClient {
    inner: Client,
    url: Url,
    auth_token: Option<String>,
    next_id: Arc<AtomicU64>,
}

impl EthRpcClient {
    /// Builds a new client from a string endpoint.
    pub fn from_endpoint(
        endpoint: &str,
        auth_token: Option<String>,
        timeout: Duration,
    ) -> Result<Self, EthRpcClientError> {
        let url = Self::normalize_endpoint(endpoint)?;
        Self::from_url(url, auth_token, timeout)
    }

    /// Builds a new client from an already parsed [`Url`].
    pub fn from_url(
        url: Url,
        auth_token: Option<String>,
        timeout: Duration,
    ) -> Result<Self, EthRpcClientError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            inner: client,
            url,
            auth_token,
            next_id: Arc::new(AtomicU64::new(1)),
        })
    }

    /// Returns the RPC endpoint used by the client.
    pub fn endpoint(&self) -> &Url {
        &self.url
    }

    /// Issues a raw JSON-RPC call returning the untyped [`Value`] payload.
    ///
    /// A `null` result is returned as [`Value::Null`]; callers that expect an
    /// optional value decode it into `Option<T>`.
    pub async fn request(&self, method: &str, params: Value) -> Result<Value, EthRpcClientError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let payload = JsonRpcRequest::new(id, method, params);

        let mut request = self.inner.post(self.url.clone()).json(&payload);
        if let Some(token) = &self.auth_token {
            request = request.bearer_auth(token);
        }

        debug!(method, id, endpoint = %self.url, "sending json-rpc request");
        let response = request.send().await?;
        if !response.status().is_success() {
            return Err(EthRpcClientError::HttpStatus(response.status()));
        }

        let response: JsonRpcResponse = response.json().await?;
        if let Some(error) = response.error {
            return Err(EthRpcClientError::Rpc {
                code: EthRpcErrorCode::from_code(error.code),
                message: error.message,
                data: error.data,
            });
        }

        Ok(response.result.unwrap_or(Value::Null))
    }

    /// Issues a JSON-RPC call and deserialises the result into `R`.
    pub async fn call<R>(&self, method: &str, params: Value) -> Result<R, EthRpcClientError>
    where
        R: DeserializeOwned,
    {
        let value = self.request(method, params).await?;
        Ok(serde_json::from_value(value)?)
    }

    pub async fn chain_id(&self) -> Result<u64, EthRpcClientError> {
        let chain_id: U64 = self.call("eth_chainId", json!([])).await?;
        Ok(chain_id.as_u64())
    }

    pub async fn accounts(&self) -> Result<Vec<Address>, EthRpcClientError> {
        self.call("eth_accounts", json!([])).await
    }

    /// Asks the wallet to expose its accounts, falling back to
    /// `eth_accounts` for providers that predate EIP-1102.
    pub async fn request_accounts(&self) -> Result<Vec<Address>, EthRpcClientError> {
        match self.call("eth_requestAccounts", json!([])).await {
            Err(EthRpcClientError::Rpc { code, .. }) if code.is_method_missing() => {
                self.accounts().await
            }
            other => other,
        }
    }

    pub async fn get_balance(&self, address: Address) -> Result<U256, EthRpcClientError> {
        self.call("eth_getBalance", json!([address, "latest"])).await
    }

    pub async fn eth_call(&self, to: Address, data: Bytes) -> Result<Bytes, EthRpcClientError> {
        let call = CallRequest { to, data };
        self.call("eth_call", json!([call, "latest"])).await
    }

    pub async fn send_transaction(
        &self,
        transaction: &TransactionRequest,
    ) -> Result<H256, EthRpcClientError> {
        self.call("eth_sendTransaction", json!([transaction])).await
    }

    pub async fn transaction_receipt(
        &self,
        hash: H256,
    ) -> Result<Option<ReceiptDto>, EthRpcClientError> {
        self.call("eth_getTransactionReceipt", json!([hash])).await
    }

    fn normalize_endpoint(endpoint: &str) -> Result<Url, EthRpcClientError> {
        let url = Url::parse(endpoint.trim())
            .map_err(|err| EthRpcClientError::InvalidEndpoint(err.to_string()))?;
        match url.scheme() {
            "http" | "https" => Ok(url),
            other => Err(EthRpcClientError::InvalidEndpoint(format!(
                "unsupported scheme `{other}`"
            ))),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum EthRpcClientError {
    #[error("invalid RPC endpoint: {0}")]
    InvalidEndpoint(String),
    #[error("provider JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("provider transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("provider transport error: HTTP status {0}")]
    HttpStatus(StatusCode),
    #[error("provider error [{code}]: {message}")]
    Rpc {
        code: EthRpcErrorCode,
        message: String,
        data: Option<Value>,
    },
}

impl EthRpcClientError {
    /// True when the endpoint could not be reached at all.
    pub fn is_unreachable(&self) -> bool {
        match self {
            EthRpcClientError::Transport(error) => {
                error.is_connect() || error.is_timeout() || error.is_request()
            }
            EthRpcClientError::HttpStatus(status) => {
                *status == StatusCode::NOT_FOUND || status.is_server_error()
            }
            _ => false,
        }
    }

    pub fn rpc_code(&self) -> Option<&EthRpcErrorCode> {
        match self {
            EthRpcClientError::Rpc { code, .. } => Some(code),
            _ => None,
        }
    }

    /// One-line summary combining the mapped description and provider message.
    pub fn describe(&self) -> String {
        match self {
            EthRpcClientError::Rpc {
                code,
                message,
                data,
            } => {
                let description = describe_rpc_error(code, data.as_ref());
                match description.technical {
                    Some(detail) => format!("{} ({message}; {detail})", description.headline),
                    None => format!("{} ({message})", description.headline),
                }
            }
            other => other.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_non_http_endpoints() {
        let error = EthRpcClient::from_endpoint("ws://127.0.0.1:8546", None, Duration::from_secs(1))
            .expect_err("websocket endpoints are not supported");
        assert!(matches!(error, EthRpcClientError::InvalidEndpoint(_)));

        let client =
            EthRpcClient::from_endpoint(" http://127.0.0.1:1248 ", None, Duration::from_secs(1))
                .expect("client");
        assert_eq!(client.endpoint().as_str(), "http://127.0.0.1:1248/");
    }

    #[test]
    fn describes_user_rejections() {
        let error = EthRpcClientError::Rpc {
            code: EthRpcErrorCode::UserRejected,
            message: "User denied transaction signature.".into(),
            data: None,
        };
        assert_eq!(
            error.describe(),
            "The request was rejected in the wallet. (User denied transaction signature.)"
        );
        assert!(!error.is_unreachable());
        assert_eq!(error.rpc_code(), Some(&EthRpcErrorCode::UserRejected));
    }

    #[tokio::test]
    async fn unreachable_endpoint_is_reported_as_such() {
        let client = EthRpcClient::from_endpoint("http://127.0.0.1:1", None, Duration::from_secs(1))
            .expect("client");
        let error = client.chain_id().await.expect_err("nothing listens on port 1");
        assert!(error.is_unreachable(), "unexpected error: {error}");
    }
}
