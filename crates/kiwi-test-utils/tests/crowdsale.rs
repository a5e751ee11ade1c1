use alloy::dyn_abi::DynSolValue;
use alloy::primitives::U256;
use kiwi_core::{EvmRpc, Receipt};
use kiwi_test_utils::fixtures::{call_address, call_uint};
use kiwi_test_utils::{address, assert_event, session, KiwiSession};
use serial_test::serial;

const PURCHASE: u64 = 100;
const ALLOWANCE: u64 = 100_000;

fn starting_balance() -> U256 {
    U256::from(1_000_000u64) * U256::from(10u64).pow(U256::from(18u64))
}

async fn setup() -> (&'static KiwiSession, EvmRpc) {
    let session = session().await.expect("session deploys");
    let rpc = session.isolate().await.expect("snapshot restored");
    (session, rpc)
}

/// Lets the crowdsale move tokens out of the owner's balance, signed by the
/// owner and submitted by the buyer.
async fn permit_crowdsale(session: &KiwiSession, rpc: &EvmRpc) {
    let buyer = session.account(6).deployer(rpc.clone()).unwrap();
    let spender = session.crowdsale.address;
    let value = U256::from(ALLOWANCE);
    let deadline = session.deadline_in(rpc, 60).await.unwrap();
    let signature =
        session.sign_permit(rpc, &session.owner, spender, value, deadline).await.unwrap();

    buyer
        .send(
            &session.token,
            "permit",
            &[
                address(session.owner.address),
                address(spender),
                DynSolValue::Uint(value, 256),
                DynSolValue::Uint(deadline, 256),
                DynSolValue::Bytes(signature.to_vec()),
            ],
            U256::ZERO,
        )
        .await
        .unwrap();
    assert_eq!(
        call_uint(
            rpc,
            &session.token,
            "allowance",
            &[address(session.owner.address), address(spender)]
        )
        .await
        .unwrap(),
        value
    );
}

async fn assert_purchase(session: &KiwiSession, rpc: &EvmRpc, tx: &Receipt, wallet_before: U256) {
    let buyer = session.account(6).address;
    let crowdsale = &session.crowdsale;

    assert!(rpc.get_balance(&buyer).await.unwrap() < starting_balance());
    assert_eq!(call_uint(rpc, crowdsale, "gweiRaised", &[]).await.unwrap(), U256::from(PURCHASE));
    assert_eq!(
        rpc.get_balance(&session.wallet.address).await.unwrap(),
        wallet_before + U256::from(PURCHASE)
    );
    assert_eq!(
        call_uint(rpc, &session.token, "balanceOf", &[address(buyer)]).await.unwrap(),
        U256::from(PURCHASE)
    );

    let logs = crowdsale.decode_events(tx, "TokenPurchase").unwrap();
    assert_eq!(logs.len(), 1);
    assert_event(&logs[0])
        .field_address("purchaser", buyer)
        .field_address("beneficiary", buyer)
        .field_uint("value", PURCHASE)
        .field_uint("amount", PURCHASE);
}

#[tokio::test]
#[serial]
#[ignore = "requires anvil and compiled artifacts"]
async fn test_initial_state() {
    let (session, rpc) = setup().await;
    let crowdsale = &session.crowdsale;

    assert_eq!(
        call_address(&rpc, crowdsale, "kiwiToken", &[]).await.unwrap(),
        session.token.address
    );
    assert_eq!(call_address(&rpc, crowdsale, "wallet", &[]).await.unwrap(), session.wallet.address);
    assert_eq!(call_uint(&rpc, crowdsale, "rate", &[]).await.unwrap(), U256::from(1u64));
    assert_eq!(call_uint(&rpc, crowdsale, "gweiRaised", &[]).await.unwrap(), U256::ZERO);
    assert_eq!(call_address(&rpc, crowdsale, "owner", &[]).await.unwrap(), session.owner.address);
}

#[tokio::test]
#[serial]
#[ignore = "requires anvil and compiled artifacts"]
async fn test_fallback_purchase() {
    let (session, rpc) = setup().await;
    let buyer = session.account(6).deployer(rpc.clone()).unwrap();
    assert_eq!(rpc.get_balance(&buyer.sender).await.unwrap(), starting_balance());
    let wallet_before = rpc.get_balance(&session.wallet.address).await.unwrap();

    permit_crowdsale(session, &rpc).await;
    let tx = buyer
        .transfer_value(session.crowdsale.address, U256::from(PURCHASE))
        .await
        .unwrap();

    assert_eq!(
        call_uint(
            &rpc,
            &session.token,
            "allowance",
            &[address(session.owner.address), address(buyer.sender)]
        )
        .await
        .unwrap(),
        U256::ZERO
    );
    assert_purchase(session, &rpc, &tx, wallet_before).await;
}

#[tokio::test]
#[serial]
#[ignore = "requires anvil and compiled artifacts"]
async fn test_buy_tokens() {
    let (session, rpc) = setup().await;
    let buyer = session.account(6).deployer(rpc.clone()).unwrap();
    assert_eq!(rpc.get_balance(&buyer.sender).await.unwrap(), starting_balance());
    let wallet_before = rpc.get_balance(&session.wallet.address).await.unwrap();

    permit_crowdsale(session, &rpc).await;
    let tx = buyer
        .send(
            &session.crowdsale,
            "buyTokens",
            &[address(buyer.sender)],
            U256::from(PURCHASE),
        )
        .await
        .unwrap();

    assert_purchase(session, &rpc, &tx, wallet_before).await;
}
