pub const DEFAULT_DERIVATION_PATH_PREFIX: &str = "m/44'/60'/0'/0";

pub const DEFAULT_MANIFEST_PATH: &str = "./kiwi.yml";
pub const DEFAULT_ENVIRONMENT: &str = "default";
pub const DEFAULT_SECRET_KEY_ENV: &str = "KIWI_SECRET_KEY";
pub const ENVIRONMENT_ENV: &str = "KIWI_ENV";

pub const DEFAULT_RECEIPT_TIMEOUT_SECS: u64 = 120;
pub const RECEIPT_POLL_INTERVAL_MS: u64 = 500;

// Retries for read-only queries; writes are never retried
pub const READ_RETRIES: u64 = 3;
pub const READ_RETRY_BACKOFF_MS: u64 = 100;

// Percentage added on top of eth_estimateGas
pub const GAS_LIMIT_BUFFER_PERCENT: u64 = 10;

pub const DEFAULT_PRIORITY_FEE_PER_GAS: u128 = 2_000_000_000;

pub const GWEI: u128 = 1_000_000_000;

// EIP-712 domain of the KIWI token
pub const PERMIT_DOMAIN_NAME: &str = "KIWI";
pub const PERMIT_DOMAIN_VERSION: &str = "1.0";

pub const REVERT_MESSAGE_PREFIX: &str = "execution reverted";
/// Lowercased marker of the node message for an unfunded sender
pub const INSUFFICIENT_FUNDS_MESSAGE: &str = "insufficient funds";
