use std::fmt;
use std::str::FromStr;

use alloy::primitives::{Address, U256};
use error_stack::Report;

use crate::errors::{ConfigError, EvmError, EvmResult, TransactionError};

/// Ethereum transaction types. Manifests may spell them `legacy`,
/// `eip1559` or `EIP-1559`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum TransactionType {
    #[default]
    Legacy,
    Eip2930,
    Eip1559,
    Eip4844,
}

impl TransactionType {
    /// The type actually built. Access lists are not supported, so EIP-2930
    /// is sent as EIP-1559.
    pub fn effective(&self) -> Self {
        match self {
            TransactionType::Eip2930 => TransactionType::Eip1559,
            other => *other,
        }
    }
}

impl FromStr for TransactionType {
    type Err = Report<EvmError>;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        match input.to_ascii_lowercase().replace('-', "").as_ref() {
            "legacy" => Ok(TransactionType::Legacy),
            "eip2930" => Ok(TransactionType::Eip2930),
            "eip1559" => Ok(TransactionType::Eip1559),
            "eip4844" => Ok(TransactionType::Eip4844),
            other => Err(Report::new(EvmError::Config(ConfigError::InvalidValue {
                field: "tx_type".to_string(),
                value: other.to_string(),
            }))),
        }
    }
}

impl TryFrom<String> for TransactionType {
    type Error = Report<EvmError>;

    fn try_from(input: String) -> Result<Self, Self::Error> {
        input.parse()
    }
}

impl fmt::Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TransactionType::Legacy => "legacy",
            TransactionType::Eip2930 => "EIP-2930",
            TransactionType::Eip1559 => "EIP-1559",
            TransactionType::Eip4844 => "EIP-4844",
        };
        write!(f, "{}", name)
    }
}

/// Fields shared by deployments and calls. Anything left `None` can be
/// filled from the node with `fill_transaction_fields`.
#[derive(Clone, Debug, Default)]
pub struct CommonTransactionFields {
    pub from: Option<Address>,
    pub nonce: Option<u64>,
    pub chain_id: Option<u64>,
    pub value: U256,
    pub gas_limit: Option<u64>,
    pub gas_price: Option<u128>,
    pub max_fee_per_gas: Option<u128>,
    pub max_priority_fee_per_gas: Option<u128>,
    pub tx_type: TransactionType,
}

/// Pricing of a filled transaction
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FeeFields {
    Legacy { gas_price: u128 },
    Eip1559 { max_fee_per_gas: u128, max_priority_fee_per_gas: u128 },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FilledTransactionFields {
    pub from: Address,
    pub nonce: u64,
    pub chain_id: u64,
    pub value: U256,
    pub gas_limit: u64,
    pub fees: FeeFields,
}

impl CommonTransactionFields {
    pub fn new(from: Address) -> Self {
        Self { from: Some(from), ..Default::default() }
    }

    pub fn with_value(mut self, value: U256) -> Self {
        self.value = value;
        self
    }

    /// Checks that every field needed to build the transaction is present.
    /// Performs no I/O.
    pub fn require_filled(&self) -> EvmResult<FilledTransactionFields> {
        let from = self.from.ok_or_else(|| missing("from"))?;
        let nonce = self.nonce.ok_or_else(|| missing("nonce"))?;
        let chain_id = self.chain_id.ok_or_else(|| missing("chain_id"))?;
        let gas_limit = self.gas_limit.ok_or_else(|| missing("gas_limit"))?;

        let fees = match self.tx_type.effective() {
            TransactionType::Legacy => {
                FeeFields::Legacy { gas_price: self.gas_price.ok_or_else(|| missing("gas_price"))? }
            }
            TransactionType::Eip1559 => {
                let max_fee_per_gas =
                    self.max_fee_per_gas.ok_or_else(|| missing("max_fee_per_gas"))?;
                let max_priority_fee_per_gas = self
                    .max_priority_fee_per_gas
                    .ok_or_else(|| missing("max_priority_fee_per_gas"))?;
                if max_priority_fee_per_gas > max_fee_per_gas {
                    return Err(Report::new(EvmError::Transaction(TransactionError::InvalidFees(
                        format!(
                            "priority fee {} wei exceeds max fee {} wei",
                            max_priority_fee_per_gas, max_fee_per_gas
                        ),
                    ))));
                }
                FeeFields::Eip1559 { max_fee_per_gas, max_priority_fee_per_gas }
            }
            TransactionType::Eip2930 | TransactionType::Eip4844 => {
                return Err(Report::new(EvmError::Transaction(TransactionError::InvalidType(
                    format!("transaction type {} is not supported", self.tx_type),
                ))))
            }
        };

        Ok(FilledTransactionFields { from, nonce, chain_id, value: self.value, gas_limit, fees })
    }
}

fn missing(field: &'static str) -> Report<EvmError> {
    Report::new(EvmError::Transaction(TransactionError::MissingField(field)))
}
