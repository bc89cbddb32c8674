use std::borrow::Cow;
use std::fmt;

use serde_json::Value;

/// JSON-RPC error codes reported by Ethereum providers (EIP-1193 and EIP-1474).
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum EthRpcErrorCode {
    ExecutionReverted,
    UserRejected,
    Unauthorized,
    UnsupportedMethod,
    Disconnected,
    ChainDisconnected,
    ParseError,
    InvalidRequest,
    MethodNotFound,
    InvalidParams,
    InternalError,
    InvalidInput,
    ResourceNotFound,
    ResourceUnavailable,
    TransactionRejected,
    MethodNotSupported,
    LimitExceeded,
    Other(i64),
}

impl EthRpcErrorCode {
    pub fn from_code(code: i64) -> Self {
        match code {
            3 => EthRpcErrorCode::ExecutionReverted,
            4001 => EthRpcErrorCode::UserRejected,
            4100 => EthRpcErrorCode::Unauthorized,
            4200 => EthRpcErrorCode::UnsupportedMethod,
            4900 => EthRpcErrorCode::Disconnected,
            4901 => EthRpcErrorCode::ChainDisconnected,
            -32700 => EthRpcErrorCode::ParseError,
            -32600 => EthRpcErrorCode::InvalidRequest,
            -32601 => EthRpcErrorCode::MethodNotFound,
            -32602 => EthRpcErrorCode::InvalidParams,
            -32603 => EthRpcErrorCode::InternalError,
            -32000 => EthRpcErrorCode::InvalidInput,
            -32001 => EthRpcErrorCode::ResourceNotFound,
            -32002 => EthRpcErrorCode::ResourceUnavailable,
            -32003 => EthRpcErrorCode::TransactionRejected,
            -32004 => EthRpcErrorCode::MethodNotSupported,
            -32005 => EthRpcErrorCode::LimitExceeded,
            other => EthRpcErrorCode::Other(other),
        }
    }

    pub fn as_i64(&self) -> i64 {
        match self {
            EthRpcErrorCode::ExecutionReverted => 3,
            EthRpcErrorCode::UserRejected => 4001,
            EthRpcErrorCode::Unauthorized => 4100,
            EthRpcErrorCode::UnsupportedMethod => 4200,
            EthRpcErrorCode::Disconnected => 4900,
            EthRpcErrorCode::ChainDisconnected => 4901,
            EthRpcErrorCode::ParseError => -32700,
            EthRpcErrorCode::InvalidRequest => -32600,
            EthRpcErrorCode::MethodNotFound => -32601,
            EthRpcErrorCode::InvalidParams => -32602,
            EthRpcErrorCode::InternalError => -32603,
            EthRpcErrorCode::InvalidInput => -32000,
            EthRpcErrorCode::ResourceNotFound => -32001,
            EthRpcErrorCode::ResourceUnavailable => -32002,
            EthRpcErrorCode::TransactionRejected => -32003,
            EthRpcErrorCode::MethodNotSupported => -32004,
            EthRpcErrorCode::LimitExceeded => -32005,
            EthRpcErrorCode::Other(code) => *code,
        }
    }

    pub fn as_str(&self) -> Cow<'_, str> {
        match self {
            EthRpcErrorCode::ExecutionReverted => Cow::Borrowed("EXECUTION_REVERTED"),
            EthRpcErrorCode::UserRejected => Cow::Borrowed("USER_REJECTED"),
            EthRpcErrorCode::Unauthorized => Cow::Borrowed("UNAUTHORIZED"),
            EthRpcErrorCode::UnsupportedMethod => Cow::Borrowed("UNSUPPORTED_METHOD"),
            EthRpcErrorCode::Disconnected => Cow::Borrowed("DISCONNECTED"),
            EthRpcErrorCode::ChainDisconnected => Cow::Borrowed("CHAIN_DISCONNECTED"),
            EthRpcErrorCode::ParseError => Cow::Borrowed("PARSE_ERROR"),
            EthRpcErrorCode::InvalidRequest => Cow::Borrowed("INVALID_REQUEST"),
            EthRpcErrorCode::MethodNotFound => Cow::Borrowed("METHOD_NOT_FOUND"),
            EthRpcErrorCode::InvalidParams => Cow::Borrowed("INVALID_PARAMS"),
            EthRpcErrorCode::InternalError => Cow::Borrowed("INTERNAL_ERROR"),
            EthRpcErrorCode::InvalidInput => Cow::Borrowed("INVALID_INPUT"),
            EthRpcErrorCode::ResourceNotFound => Cow::Borrowed("RESOURCE_NOT_FOUND"),
            EthRpcErrorCode::ResourceUnavailable => Cow::Borrowed("RESOURCE_UNAVAILABLE"),
            EthRpcErrorCode::TransactionRejected => Cow::Borrowed("TRANSACTION_REJECTED"),
            EthRpcErrorCode::MethodNotSupported => Cow::Borrowed("METHOD_NOT_SUPPORTED"),
            EthRpcErrorCode::LimitExceeded => Cow::Borrowed("LIMIT_EXCEEDED"),
            EthRpcErrorCode::Other(code) => Cow::Owned(format!("JSON_RPC_{code}")),
        }
    }

    /// True when the wallet user declined the request.
    pub fn is_user_rejection(&self) -> bool {
        matches!(self, EthRpcErrorCode::UserRejected)
    }

    /// True when the method itself is unknown to the provider.
    pub fn is_method_missing(&self) -> bool {
        matches!(
            self,
            EthRpcErrorCode::MethodNotFound
                | EthRpcErrorCode::UnsupportedMethod
                | EthRpcErrorCode::MethodNotSupported
        )
    }
}

impl fmt::Display for EthRpcErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_str())
    }
}

/// Mapped error description surfaced to users and logs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorDescription {
    pub headline: String,
    pub technical: Option<String>,
}

impl ErrorDescription {
    pub fn new(headline: impl Into<String>) -> Self {
        Self {
            headline: headline.into(),
            technical: None,
        }
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.technical = Some(detail.into());
        self
    }
}

/// Maps a provider error code into a user facing description.
pub fn describe_rpc_error(code: &EthRpcErrorCode, data: Option<&Value>) -> ErrorDescription {
    let headline = match code {
        EthRpcErrorCode::ExecutionReverted => "The contract reverted the call.",
        EthRpcErrorCode::UserRejected => "The request was rejected in the wallet.",
        EthRpcErrorCode::Unauthorized => "The wallet has not authorised this account.",
        EthRpcErrorCode::UnsupportedMethod => "The wallet does not support this request.",
        EthRpcErrorCode::Disconnected => "The wallet is disconnected from all chains.",
        EthRpcErrorCode::ChainDisconnected => "The wallet is disconnected from this chain.",
        EthRpcErrorCode::ParseError => "The provider could not parse the request.",
        EthRpcErrorCode::InvalidRequest => "The request was malformed.",
        EthRpcErrorCode::MethodNotFound => "The provider does not know this method.",
        EthRpcErrorCode::InvalidParams => "The provider rejected the request parameters.",
        EthRpcErrorCode::InternalError => "The provider encountered an internal error.",
        EthRpcErrorCode::InvalidInput => "The node rejected the transaction input.",
        EthRpcErrorCode::ResourceNotFound => "The requested resource does not exist.",
        EthRpcErrorCode::ResourceUnavailable => "The requested resource is not available yet.",
        EthRpcErrorCode::TransactionRejected => "The node rejected the transaction.",
        EthRpcErrorCode::MethodNotSupported => "The node does not support this method.",
        EthRpcErrorCode::LimitExceeded => "The provider rate limit was exceeded.",
        EthRpcErrorCode::Other(code) => {
            return ErrorDescription::new(format!("Provider error {code}"));
        }
    };

    let mut description = ErrorDescription::new(headline);
    if let Some(detail) = data.and_then(stringify_details) {
        description = description.with_detail(detail);
    }
    description
}

fn stringify_details(details: &Value) -> Option<String> {
    match details {
        Value::String(value) => Some(value.clone()),
        Value::Number(number) => Some(number.to_string()),
        Value::Bool(boolean) => Some(boolean.to_string()),
        Value::Array(_) | Value::Object(_) => Some(details.to_string()),
        Value::Null => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn maps_known_provider_codes() {
        assert_eq!(EthRpcErrorCode::from_code(4001), EthRpcErrorCode::UserRejected);
        assert!(EthRpcErrorCode::from_code(4001).is_user_rejection());
        assert!(EthRpcErrorCode::from_code(-32601).is_method_missing());
        assert_eq!(EthRpcErrorCode::from_code(-32003).as_i64(), -32003);
        assert_eq!(EthRpcErrorCode::from_code(1234).as_str(), "JSON_RPC_1234");
    }

    #[test]
    fn describes_reverts_with_data() {
        let description =
            describe_rpc_error(&EthRpcErrorCode::ExecutionReverted, Some(&json!("0x08c379a0")));
        assert_eq!(description.headline, "The contract reverted the call.");
        assert_eq!(description.technical.as_deref(), Some("0x08c379a0"));

        let description = describe_rpc_error(&EthRpcErrorCode::Other(7), None);
        assert_eq!(description.headline, "Provider error 7");
        assert!(description.technical.is_none());
    }
}
