use alloy::dyn_abi::DynSolValue;
use alloy::json_abi::JsonAbi;
use alloy::network::TransactionBuilder;
use alloy::primitives::{Address, Bytes};
use alloy::rpc::types::TransactionRequest;
use error_stack::{Report, ResultExt};

use crate::codec::abi::{abi_decode_function_output, abi_decode_logs, encode_function_call, DecodedEvent};
use crate::errors::{CodecError, EvmError, EvmErrorExt, EvmResult};
use crate::rpc::{EvmRpc, Receipt};

/// A deployed contract. All state lives on chain.
#[derive(Clone, Debug)]
pub struct ContractHandle {
    pub name: String,
    pub address: Address,
    pub abi: JsonAbi,
}

impl ContractHandle {
    pub fn new(name: impl Into<String>, address: Address, abi: JsonAbi) -> Self {
        Self { name: name.into(), address, abi }
    }

    pub fn encode_call(&self, method: &str, args: &[DynSolValue]) -> EvmResult<Bytes> {
        encode_function_call(&self.abi, method, args).with_contract_info(
            &self.name,
            Some(self.address),
            Some(method.to_string()),
        )
    }

    /// Read-only `eth_call`, decoded against the method's outputs
    pub async fn call(
        &self,
        rpc: &EvmRpc,
        from: Option<Address>,
        method: &str,
        args: &[DynSolValue],
    ) -> EvmResult<Vec<DynSolValue>> {
        let input = self.encode_call(method, args)?;
        let mut tx = TransactionRequest::default().with_to(self.address).with_input(input);
        if let Some(from) = from {
            tx = tx.with_from(from);
        }
        let output = rpc.call(&tx).await.with_contract_info(
            &self.name,
            Some(self.address),
            Some(method.to_string()),
        )?;
        abi_decode_function_output(&self.abi, method, args.len(), &output)
    }

    /// Like [ContractHandle::call] for methods returning exactly one value
    pub async fn call_one(
        &self,
        rpc: &EvmRpc,
        method: &str,
        args: &[DynSolValue],
    ) -> EvmResult<DynSolValue> {
        let mut values = self.call(rpc, None, method, args).await?;
        if values.len() != 1 {
            return Err(Report::new(EvmError::Codec(CodecError::AbiDecodingFailed(format!(
                "'{}' returned {} values, expected one",
                method,
                values.len()
            )))));
        }
        Ok(values.remove(0))
    }

    /// Logs of `event_name` emitted by this contract in `receipt`
    pub fn decode_events(&self, receipt: &Receipt, event_name: &str) -> EvmResult<Vec<DecodedEvent>> {
        let own_logs: Vec<_> = receipt
            .logs()
            .iter()
            .filter(|log| log.address() == self.address)
            .cloned()
            .collect();
        abi_decode_logs(&self.abi, event_name, &own_logs)
            .attach_printable(format!("Decoding {} logs of {}", event_name, self.name))
    }
}

impl std::fmt::Display for ContractHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} at {}", self.name, self.address)
    }
}
