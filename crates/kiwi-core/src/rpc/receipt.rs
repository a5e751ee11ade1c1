use alloy::primitives::{Address, B256};
use alloy::rpc::types::{Log, TransactionReceipt};

/// A mined transaction, as returned by `eth_getTransactionReceipt`
#[derive(Clone, Debug)]
pub struct Receipt {
    inner: TransactionReceipt,
}

impl Receipt {
    pub fn new(inner: TransactionReceipt) -> Self {
        Self { inner }
    }

    pub fn status(&self) -> bool {
        self.inner.status()
    }

    pub fn tx_hash(&self) -> B256 {
        self.inner.transaction_hash
    }

    /// Only set for contract creations
    pub fn contract_address(&self) -> Option<Address> {
        self.inner.contract_address
    }

    pub fn block_number(&self) -> Option<u64> {
        self.inner.block_number
    }

    pub fn gas_used(&self) -> u64 {
        self.inner.gas_used
    }

    pub fn logs(&self) -> &[Log] {
        self.inner.inner.logs()
    }
}

impl From<TransactionReceipt> for Receipt {
    fn from(inner: TransactionReceipt) -> Self {
        Self::new(inner)
    }
}
