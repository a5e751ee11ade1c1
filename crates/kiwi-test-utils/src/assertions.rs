use std::fmt::Debug;

use alloy::primitives::U256;
use error_stack::Report;
use kiwi_core::{EvmError, EvmResult};

/// Denominator of the token's fee rates
pub const FEE_BASIS: u64 = 10_000;

/// Panics unless `result` is a contract revert, returning the report
#[track_caller]
pub fn assert_reverts<T: Debug>(result: EvmResult<T>) -> Report<EvmError> {
    match result {
        Ok(value) => panic!("expected a revert, got success: {:?}", value),
        Err(report) => {
            assert!(
                report.current_context().is_revert(),
                "expected a revert, got another failure: {:?}",
                report
            );
            report
        }
    }
}

/// Panics unless `result` reverted with exactly `reason`
#[track_caller]
pub fn assert_reverts_with<T: Debug>(result: EvmResult<T>, reason: &str) {
    let report = assert_reverts(result);
    assert_eq!(
        report.current_context().revert_reason(),
        Some(reason),
        "unexpected revert reason in {:?}",
        report
    );
}

/// Fee rates of the token, in basis points of the transferred amount.
/// Mirrors what the deployed token charges; used only to compute expectations.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FeeSchedule {
    pub txfee: u64,
    pub burnfee: u64,
}

impl FeeSchedule {
    pub fn new(txfee: u64, burnfee: u64) -> Self {
        Self { txfee, burnfee }
    }

    pub fn fee_for(amount: U256, rate: u64) -> U256 {
        amount * U256::from(rate) / U256::from(FEE_BASIS)
    }

    /// Sent to the fee address on each transfer
    pub fn transfer_fee(&self, amount: U256) -> U256 {
        Self::fee_for(amount, self.txfee)
    }

    /// Sent to the zero address on each transfer
    pub fn burn_fee(&self, amount: U256) -> U256 {
        Self::fee_for(amount, self.burnfee)
    }
}
