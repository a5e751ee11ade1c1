use alloy::primitives::{Address, B256};
use error_stack::Report;
use std::fmt;

pub type EvmResult<T> = Result<T, Report<EvmError>>;

/// Top level error for every chain-facing operation
#[derive(Debug, thiserror::Error)]
pub enum EvmError {
    #[error("RPC error: {0}")]
    Rpc(#[from] RpcError),
    #[error("transaction error: {0}")]
    Transaction(#[from] TransactionError),
    #[error("codec error: {0}")]
    Codec(#[from] CodecError),
    #[error("signer error: {0}")]
    Signer(#[from] SignerError),
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
}

#[derive(Debug, thiserror::Error)]
pub enum RpcError {
    /// The endpoint could not be reached at all
    #[error("endpoint {endpoint} is unreachable: {message}")]
    Unreachable { endpoint: String, message: String },
    /// The node answered with an error, or rejected a payload
    #[error("node error: {0}")]
    NodeError(String),
    #[error("invalid response: {0}")]
    InvalidResponse(String),
    #[error("no receipt for transaction {tx_hash} after {seconds}s")]
    ReceiptTimeout { tx_hash: B256, seconds: u64 },
}

#[derive(Debug, thiserror::Error)]
pub enum TransactionError {
    #[error("missing required field '{0}'")]
    MissingField(&'static str),
    #[error("{0}")]
    InvalidType(String),
    #[error("execution reverted{}", .reason.as_ref().map(|r| format!(": {r}")).unwrap_or_default())]
    Reverted { reason: Option<String> },
    #[error("sender cannot pay for the transaction: {0}")]
    InsufficientFunds(String),
    #[error("invalid fees: {0}")]
    InvalidFees(String),
    #[error("failed to build transaction envelope: {0}")]
    EnvelopeFailed(String),
    #[error("deployment receipt for {0} holds no contract address")]
    MissingContractAddress(B256),
}

#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    #[error("function '{name}' not found in ABI")]
    FunctionNotFound { name: String },
    #[error("event '{name}' not found in ABI")]
    EventNotFound { name: String },
    #[error("ABI has no constructor but {0} constructor arguments were given")]
    ConstructorNotFound(usize),
    #[error("expected {expected} arguments, got {got}")]
    ArgumentCountMismatch { expected: usize, got: usize },
    #[error("expected {expected}, received {received}")]
    InvalidType { expected: String, received: String },
    #[error("invalid address: {0}")]
    InvalidAddress(String),
    #[error("invalid hex: {0}")]
    InvalidHex(String),
    #[error("failed to parse type specifier: {0}")]
    TypeSpecifierParseFailed(String),
    #[error("ABI encoding failed: {0}")]
    AbiEncodingFailed(String),
    #[error("ABI decoding failed: {0}")]
    AbiDecodingFailed(String),
    #[error("invalid contract artifact: {0}")]
    InvalidArtifact(String),
}

#[derive(Debug, thiserror::Error)]
pub enum SignerError {
    #[error("invalid secret key: {0}")]
    InvalidSecretKey(String),
    #[error("secret not available: {0}")]
    MissingSecret(String),
    #[error("signing failed: {0}")]
    SigningFailed(String),
    #[error("invalid mnemonic: {0}")]
    InvalidMnemonic(String),
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid value for '{field}': {value}")]
    InvalidValue { field: String, value: String },
    #[error("missing field '{0}'")]
    MissingField(String),
    #[error("file not found: {0}")]
    FileNotFound(String),
    #[error("failed to parse {0}")]
    ParseFailed(String),
}

/// RPC request details attached to every failed node call
#[derive(Debug, Clone)]
pub struct RpcContext {
    pub endpoint: String,
    pub method: String,
    pub params: Option<String>,
}

impl fmt::Display for RpcContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at {}", self.method, self.endpoint)?;
        if let Some(params) = &self.params {
            write!(f, " with params {}", params)?;
        }
        Ok(())
    }
}

/// Transaction details for debugging
#[derive(Debug, Clone, Default)]
pub struct TransactionContext {
    pub tx_hash: Option<B256>,
    pub from: Option<Address>,
    pub to: Option<Address>,
    pub value: Option<u128>,
    pub gas_limit: Option<u64>,
    pub chain_id: Option<u64>,
}

impl fmt::Display for TransactionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "transaction")?;
        if let Some(hash) = &self.tx_hash {
            write!(f, " {}", hash)?;
        }
        if let Some(from) = &self.from {
            write!(f, " from {}", from)?;
        }
        match &self.to {
            Some(to) => write!(f, " to {}", to)?,
            None => write!(f, " (create)")?,
        }
        if let Some(gas) = &self.gas_limit {
            write!(f, " gas: {}", gas)?;
        }
        Ok(())
    }
}

/// Contract information for deployment/interaction errors
#[derive(Debug, Clone)]
pub struct ContractInfo {
    pub name: String,
    pub address: Option<Address>,
    pub method: Option<String>,
}

impl fmt::Display for ContractInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Contract: {}", self.name)?;
        if let Some(addr) = &self.address {
            write!(f, " at {}", addr)?;
        }
        if let Some(method) = &self.method {
            write!(f, " method: {}", method)?;
        }
        Ok(())
    }
}

pub trait EvmErrorExt {
    /// Attach contract information
    fn with_contract_info(
        self,
        name: impl Into<String>,
        address: Option<Address>,
        method: Option<String>,
    ) -> Self;
}

impl<T> EvmErrorExt for EvmResult<T> {
    fn with_contract_info(
        self,
        name: impl Into<String>,
        address: Option<Address>,
        method: Option<String>,
    ) -> Self {
        self.map_err(|e| e.attach(ContractInfo { name: name.into(), address, method }))
    }
}

impl EvmError {
    /// Whether this error is a contract revert, as opposed to a transport or validation failure
    pub fn is_revert(&self) -> bool {
        matches!(self, EvmError::Transaction(TransactionError::Reverted { .. }))
    }

    pub fn revert_reason(&self) -> Option<&str> {
        match self {
            EvmError::Transaction(TransactionError::Reverted { reason }) => reason.as_deref(),
            _ => None,
        }
    }
}

/// Helper macro for creating EVM errors
#[macro_export]
macro_rules! evm_error {
    ($error:expr, $($arg:tt)*) => {{
        error_stack::Report::new($crate::errors::EvmError::from($error))
            .attach_printable(format!($($arg)*))
    }};
}
