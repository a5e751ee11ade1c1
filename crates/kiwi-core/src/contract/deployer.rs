use std::time::Duration;

use alloy::dyn_abi::DynSolValue;
use alloy::primitives::{Address, Bytes, U256};
use alloy::rpc::types::TransactionRequest;
use error_stack::{Report, ResultExt};

use super::ContractHandle;
use crate::codec::abi::encode_constructor_args;
use crate::codec::artifacts::ContractArtifact;
use crate::codec::transaction::{
    build_call, build_deployment, fill_transaction_fields, CommonTransactionFields,
    TransactionType,
};
use crate::constants::DEFAULT_RECEIPT_TIMEOUT_SECS;
use crate::errors::{EvmError, EvmErrorExt, EvmResult, TransactionContext, TransactionError};
use crate::rpc::{EvmRpc, Receipt};
use crate::signers::{secret_key_to_address, sign_transaction, SecretSource};

/// Gas and timing settings applied to every transaction a [Deployer] sends.
/// Unset values are fetched from the node.
#[derive(Clone, Debug)]
pub struct TransactionSettings {
    pub tx_type: TransactionType,
    pub chain_id: Option<u64>,
    pub gas_limit: Option<u64>,
    pub gas_price: Option<u128>,
    pub max_fee_per_gas: Option<u128>,
    pub max_priority_fee_per_gas: Option<u128>,
    pub receipt_timeout: Duration,
}

impl Default for TransactionSettings {
    fn default() -> Self {
        Self {
            tx_type: TransactionType::default(),
            chain_id: None,
            gas_limit: None,
            gas_price: None,
            max_fee_per_gas: None,
            max_priority_fee_per_gas: None,
            receipt_timeout: Duration::from_secs(DEFAULT_RECEIPT_TIMEOUT_SECS),
        }
    }
}

/// Sends transactions on behalf of one account: build, sign, submit, then
/// wait for the receipt. The secret key is resolved for each signature and
/// dropped right after.
#[derive(Clone, Debug)]
pub struct Deployer {
    pub rpc: EvmRpc,
    pub sender: Address,
    secret: SecretSource,
    pub settings: TransactionSettings,
}

impl Deployer {
    pub fn new(rpc: EvmRpc, secret: SecretSource) -> EvmResult<Self> {
        let sender = secret_key_to_address(&secret.resolve()?)?;
        Ok(Self { rpc, sender, secret, settings: TransactionSettings::default() })
    }

    pub fn with_settings(mut self, settings: TransactionSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Deploys `artifact`, returning a handle on the created contract
    pub async fn deploy(
        &self,
        artifact: &ContractArtifact,
        constructor_args: &[DynSolValue],
    ) -> EvmResult<(ContractHandle, Receipt)> {
        let tx = self.prepare_deployment(artifact, constructor_args).await?;
        self.submit_deployment(artifact, tx).await
    }

    /// Builds the creation transaction with every field filled, without sending it
    pub async fn prepare_deployment(
        &self,
        artifact: &ContractArtifact,
        constructor_args: &[DynSolValue],
    ) -> EvmResult<TransactionRequest> {
        let constructor = artifact.abi.constructor.as_ref();
        let encoded_args = encode_constructor_args(constructor, constructor_args)
            .with_contract_info(&artifact.name, None, Some("constructor".to_string()))?;
        let init_code: Bytes = [artifact.bytecode.as_ref(), encoded_args.as_slice()].concat().into();

        let fields = fill_transaction_fields(&self.rpc, &self.fields(U256::ZERO), None, &init_code)
            .await
            .with_contract_info(&artifact.name, None, Some("constructor".to_string()))?;
        build_deployment(&artifact.bytecode, constructor, constructor_args, &fields)
    }

    /// Signs and sends a request from [Deployer::prepare_deployment]
    pub async fn submit_deployment(
        &self,
        artifact: &ContractArtifact,
        tx: TransactionRequest,
    ) -> EvmResult<(ContractHandle, Receipt)> {
        let receipt = self
            .submit(tx)
            .await
            .with_contract_info(&artifact.name, None, Some("constructor".to_string()))?;
        let address = receipt.contract_address().ok_or_else(|| {
            Report::new(EvmError::Transaction(TransactionError::MissingContractAddress(
                receipt.tx_hash(),
            )))
        })?;

        Ok((ContractHandle::new(artifact.name.clone(), address, artifact.abi.clone()), receipt))
    }

    /// Calls a state-changing `method`, optionally transferring `value` wei
    pub async fn send(
        &self,
        contract: &ContractHandle,
        method: &str,
        args: &[DynSolValue],
        value: U256,
    ) -> EvmResult<Receipt> {
        let input = contract.encode_call(method, args)?;
        let fields = fill_transaction_fields(
            &self.rpc,
            &self.fields(value),
            Some(contract.address),
            &input,
        )
        .await
        .with_contract_info(&contract.name, Some(contract.address), Some(method.to_string()))?;
        let tx = build_call(contract.address, input, &fields)?;
        self.submit(tx).await.with_contract_info(
            &contract.name,
            Some(contract.address),
            Some(method.to_string()),
        )
    }

    /// Plain value transfer with empty calldata, which lands in the
    /// recipient's fallback when it is a contract.
    pub async fn transfer_value(&self, to: Address, value: U256) -> EvmResult<Receipt> {
        let input = Bytes::new();
        let fields =
            fill_transaction_fields(&self.rpc, &self.fields(value), Some(to), &input).await?;
        let tx = build_call(to, input, &fields)?;
        self.submit(tx).await
    }

    fn fields(&self, value: U256) -> CommonTransactionFields {
        CommonTransactionFields {
            from: Some(self.sender),
            nonce: None,
            chain_id: self.settings.chain_id,
            value,
            gas_limit: self.settings.gas_limit,
            gas_price: self.settings.gas_price,
            max_fee_per_gas: self.settings.max_fee_per_gas,
            max_priority_fee_per_gas: self.settings.max_priority_fee_per_gas,
            tx_type: self.settings.tx_type,
        }
    }

    async fn submit(&self, tx: TransactionRequest) -> EvmResult<Receipt> {
        let mut tx_context = TransactionContext {
            tx_hash: None,
            from: tx.from,
            to: tx.to.and_then(|kind| kind.to().copied()),
            value: tx.value.map(|v| v.saturating_to::<u128>()),
            gas_limit: tx.gas,
            chain_id: tx.chain_id,
        };

        let signed = {
            let secret_key = self.secret.resolve()?;
            sign_transaction(tx, &secret_key).await?
        };
        tx_context.tx_hash = Some(signed.tx_hash);

        let tx_hash = self.rpc.send_raw(&signed.raw).await.attach(tx_context.clone())?;
        self.rpc
            .wait_for_receipt(&tx_hash, self.settings.receipt_timeout)
            .await
            .attach(tx_context)
    }
}
