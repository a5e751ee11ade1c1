use std::future::Future;
use std::time::{Duration, Instant};

use alloy::primitives::{Address, Bytes, B256, U256};
use alloy::providers::{Provider, ProviderBuilder, RootProvider};
use alloy::providers::fillers::{
    BlobGasFiller, ChainIdFiller, FillProvider, GasFiller, JoinFill, NonceFiller,
};
use alloy::providers::Identity;
use alloy::rpc::types::{BlockNumberOrTag, TransactionRequest};
use alloy::sol_types::decode_revert_reason;
use alloy::transports::http::reqwest::Url;
use alloy::transports::TransportError;
use error_stack::{Report, ResultExt};

use crate::constants::{
    INSUFFICIENT_FUNDS_MESSAGE, READ_RETRIES, READ_RETRY_BACKOFF_MS, RECEIPT_POLL_INTERVAL_MS,
    REVERT_MESSAGE_PREFIX,
};
use crate::errors::{
    ConfigError, EvmError, EvmResult, RpcContext, RpcError, TransactionError,
};

mod receipt;
#[cfg(test)]
pub(crate) mod test_node;

pub use receipt::Receipt;

pub type HttpProvider = FillProvider<
    JoinFill<
        Identity,
        JoinFill<GasFiller, JoinFill<BlobGasFiller, JoinFill<NonceFiller, ChainIdFiller>>>,
    >,
    RootProvider,
>;

/// JSON-RPC client for an Ethereum-compatible node
#[derive(Clone, Debug)]
pub struct EvmRpc {
    pub url: Url,
    pub provider: HttpProvider,
}

impl EvmRpc {
    /// Parses the endpoint without touching the network
    pub fn new(url: &str) -> EvmResult<Self> {
        let url = Url::parse(url).map_err(|e| {
            Report::new(EvmError::Config(ConfigError::InvalidValue {
                field: "rpc_api_url".to_string(),
                value: format!("{}: {}", url, e),
            }))
        })?;

        let provider = ProviderBuilder::new().on_http(url.clone());
        Ok(Self { url, provider })
    }

    /// Opens a client and checks that the node answers
    pub async fn connect(url: &str) -> EvmResult<Self> {
        let rpc = Self::new(url)?;
        rpc.provider.get_chain_id().await.map_err(|e| {
            Report::new(EvmError::Rpc(RpcError::Unreachable {
                endpoint: rpc.url.to_string(),
                message: e.to_string(),
            }))
            .attach(rpc.context("eth_chainId", None))
        })?;
        Ok(rpc)
    }

    pub async fn is_connected(&self) -> bool {
        self.provider.get_block_number().await.is_ok()
    }

    pub async fn get_chain_id(&self) -> EvmResult<u64> {
        self.retry_read(|| async {
            self.provider
                .get_chain_id()
                .await
                .map_err(|e| self.transport_failure(e, "eth_chainId", None))
        })
        .await
    }

    pub async fn get_block_number(&self) -> EvmResult<u64> {
        self.retry_read(|| async {
            self.provider
                .get_block_number()
                .await
                .map_err(|e| self.transport_failure(e, "eth_blockNumber", None))
        })
        .await
    }

    pub async fn get_nonce(&self, address: &Address) -> EvmResult<u64> {
        self.retry_read(|| async {
            self.provider
                .get_transaction_count(*address)
                .await
                .map_err(|e| {
                    self.transport_failure(
                        e,
                        "eth_getTransactionCount",
                        Some(format!("[\"{:?}\", \"latest\"]", address)),
                    )
                })
                .attach_printable(format!("Getting nonce for address {}", address))
        })
        .await
    }

    pub async fn get_balance(&self, address: &Address) -> EvmResult<U256> {
        self.retry_read(|| async {
            self.provider
                .get_balance(*address)
                .await
                .map_err(|e| {
                    self.transport_failure(
                        e,
                        "eth_getBalance",
                        Some(format!("[\"{:?}\", \"latest\"]", address)),
                    )
                })
                .attach_printable(format!("Getting balance for address {}", address))
        })
        .await
    }

    pub async fn get_gas_price(&self) -> EvmResult<u128> {
        self.retry_read(|| async {
            self.provider
                .get_gas_price()
                .await
                .map_err(|e| self.transport_failure(e, "eth_gasPrice", None))
        })
        .await
    }

    pub async fn get_base_fee_per_gas(&self) -> EvmResult<u128> {
        let block = self
            .provider
            .get_block_by_number(BlockNumberOrTag::Latest)
            .await
            .map_err(|e| {
                self.transport_failure(e, "eth_getBlockByNumber", Some("[\"latest\", false]".into()))
            })?
            .ok_or_else(|| {
                Report::new(EvmError::Rpc(RpcError::InvalidResponse(
                    "latest block not found".to_string(),
                )))
            })?;
        block.header.base_fee_per_gas.map(|fee| fee as u128).ok_or_else(|| {
            Report::new(EvmError::Rpc(RpcError::InvalidResponse(
                "latest block has no base fee".to_string(),
            )))
        })
    }

    pub async fn get_code(&self, address: &Address) -> EvmResult<Bytes> {
        self.retry_read(|| async {
            self.provider.get_code_at(*address).await.map_err(|e| {
                self.transport_failure(
                    e,
                    "eth_getCode",
                    Some(format!("[\"{:?}\", \"latest\"]", address)),
                )
            })
        })
        .await
    }

    /// `eth_estimateGas`; a revert during estimation surfaces as [TransactionError::Reverted]
    pub async fn estimate_gas(&self, tx: &TransactionRequest) -> EvmResult<u64> {
        self.provider
            .estimate_gas(tx.clone())
            .await
            .map_err(|e| self.transport_failure(e, "eth_estimateGas", Some(format!("{:?}", tx))))
            .attach_printable("Estimating gas for transaction")
    }

    /// `eth_call` against the latest block
    pub async fn call(&self, tx: &TransactionRequest) -> EvmResult<Bytes> {
        self.provider
            .call(tx.clone())
            .await
            .map_err(|e| self.transport_failure(e, "eth_call", Some(format!("{:?}", tx))))
    }

    /// Broadcasts an already signed, EIP-2718 encoded transaction. Never retried.
    pub async fn send_raw(&self, signed_bytes: &[u8]) -> EvmResult<B256> {
        if signed_bytes.is_empty() {
            return Err(Report::new(EvmError::Rpc(RpcError::NodeError(
                "empty transaction payload".to_string(),
            ))));
        }
        let pending = self
            .provider
            .send_raw_transaction(signed_bytes)
            .await
            .map_err(|e| {
                self.transport_failure(
                    e,
                    "eth_sendRawTransaction",
                    Some(format!("[\"0x{}\"]", alloy::hex::encode(signed_bytes))),
                )
            })
            .attach_printable("Failed to send raw transaction")?;
        Ok(*pending.tx_hash())
    }

    pub async fn get_receipt(&self, tx_hash: &B256) -> EvmResult<Option<Receipt>> {
        let receipt = self
            .provider
            .get_transaction_receipt(*tx_hash)
            .await
            .map_err(|e| {
                self.transport_failure(
                    e,
                    "eth_getTransactionReceipt",
                    Some(format!("[\"{}\"]", tx_hash)),
                )
            })?;
        Ok(receipt.map(Receipt::new))
    }

    /// Polls until the transaction is mined or `timeout` elapses.
    /// A mined receipt with a failed status is reported as a revert.
    pub async fn wait_for_receipt(&self, tx_hash: &B256, timeout: Duration) -> EvmResult<Receipt> {
        let started = Instant::now();
        let poll_interval = Duration::from_millis(RECEIPT_POLL_INTERVAL_MS);
        loop {
            if let Some(receipt) = self.get_receipt(tx_hash).await? {
                if receipt.block_number().is_some() {
                    if !receipt.status() {
                        return Err(Report::new(EvmError::Transaction(
                            TransactionError::Reverted { reason: None },
                        ))
                        .attach_printable(format!(
                            "Transaction {} was mined in block {} with a failed status",
                            tx_hash,
                            receipt.block_number().unwrap_or_default()
                        )));
                    }
                    return Ok(receipt);
                }
            }
            if started.elapsed() >= timeout {
                return Err(Report::new(EvmError::Rpc(RpcError::ReceiptTimeout {
                    tx_hash: *tx_hash,
                    seconds: timeout.as_secs(),
                }))
                .attach(self.context("eth_getTransactionReceipt", Some(format!("[\"{}\"]", tx_hash)))));
            }
            tokio::time::sleep(poll_interval).await;
        }
    }

    /// Timestamp the next block will at least carry
    pub async fn pending_timestamp(&self) -> EvmResult<u64> {
        let block = self
            .provider
            .get_block_by_number(BlockNumberOrTag::Latest)
            .await
            .map_err(|e| {
                self.transport_failure(e, "eth_getBlockByNumber", Some("[\"latest\", false]".into()))
            })?
            .ok_or_else(|| {
                Report::new(EvmError::Rpc(RpcError::InvalidResponse(
                    "latest block not found".to_string(),
                )))
            })?;
        Ok(block.header.timestamp + 1)
    }

    /// `evm_snapshot`, supported by anvil and hardhat nodes
    pub async fn snapshot(&self) -> EvmResult<U256> {
        self.provider
            .raw_request::<_, U256>("evm_snapshot".into(), ())
            .await
            .map_err(|e| self.transport_failure(e, "evm_snapshot", None))
    }

    /// `evm_revert`; the snapshot is consumed by the node
    pub async fn revert_to(&self, snapshot_id: U256) -> EvmResult<bool> {
        self.provider
            .raw_request::<_, bool>("evm_revert".into(), (snapshot_id,))
            .await
            .map_err(|e| self.transport_failure(e, "evm_revert", Some(format!("[\"{}\"]", snapshot_id))))
    }

    fn context(&self, method: &str, params: Option<String>) -> RpcContext {
        RpcContext { endpoint: self.url.to_string(), method: method.to_string(), params }
    }

    fn transport_failure(
        &self,
        error: TransportError,
        method: &str,
        params: Option<String>,
    ) -> Report<EvmError> {
        let context = self.context(method, params);
        let evm_error = if let Some(payload) = error.as_error_resp() {
            match classify_node_error(&payload.message, payload.as_revert_data()) {
                Some(revert) => EvmError::Transaction(revert),
                None => EvmError::Rpc(RpcError::NodeError(format!(
                    "error (code {}): {}",
                    payload.code, payload.message
                ))),
            }
        } else if error.is_transport_error() {
            EvmError::Rpc(RpcError::Unreachable {
                endpoint: context.endpoint.clone(),
                message: error.to_string(),
            })
        } else {
            EvmError::Rpc(RpcError::NodeError(error.to_string()))
        };
        Report::new(evm_error).attach(context)
    }

    /// Retries a read while the endpoint is unreachable. Answers from the
    /// node, errors included, are returned as they are.
    async fn retry_read<T, Fut, F>(&self, f: F) -> EvmResult<T>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = EvmResult<T>>,
    {
        let mut retries = 0;
        loop {
            match f().await {
                Ok(result) => return Ok(result),
                Err(e) => {
                    if retries >= READ_RETRIES || !is_retryable(&e) {
                        return Err(e);
                    }
                    retries += 1;
                    tokio::time::sleep(Duration::from_millis(READ_RETRY_BACKOFF_MS * retries)).await;
                }
            }
        }
    }
}

impl std::fmt::Display for EvmRpc {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.url)
    }
}

fn is_retryable(error: &Report<EvmError>) -> bool {
    matches!(error.current_context(), EvmError::Rpc(RpcError::Unreachable { .. }))
}

/// Decides whether a node error message describes a contract revert or an
/// unfunded sender, and extracts the revert reason from the returned data or
/// from the message.
pub fn classify_node_error(message: &str, revert_data: Option<Bytes>) -> Option<TransactionError> {
    if message.to_ascii_lowercase().contains(INSUFFICIENT_FUNDS_MESSAGE) {
        return Some(TransactionError::InsufficientFunds(message.to_string()));
    }
    let is_revert = revert_data.is_some() || message.to_ascii_lowercase().contains("revert");
    if !is_revert {
        return None;
    }
    let reason = revert_data
        .as_deref()
        .and_then(|data| decode_revert_reason(data))
        .or_else(|| revert_reason_from_message(message));
    Some(TransactionError::Reverted { reason })
}

fn revert_reason_from_message(message: &str) -> Option<String> {
    let (_, rest) = message.split_once(REVERT_MESSAGE_PREFIX)?;
    let reason = rest.trim_start_matches(':').trim();
    if reason.is_empty() {
        None
    } else {
        Some(reason.to_string())
    }
}
