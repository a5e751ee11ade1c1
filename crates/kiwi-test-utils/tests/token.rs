use alloy::dyn_abi::DynSolValue;
use alloy::primitives::{Address, U256};
use kiwi_core::Deployer;
use kiwi_test_utils::fixtures::{call_address, call_bool, call_string, call_uint};
use kiwi_test_utils::{
    address, assert_event, assert_reverts, assert_reverts_with, session, uint, FeeSchedule,
    KiwiSession, TestAccount,
};
use serial_test::serial;

fn initial_supply() -> U256 {
    U256::from(10_000_000_000_000u64) * U256::from(10u64).pow(U256::from(18u64))
}

async fn setup() -> (&'static KiwiSession, kiwi_core::EvmRpc) {
    let session = session().await.expect("session deploys");
    let rpc = session.isolate().await.expect("snapshot restored");
    (session, rpc)
}

fn deployer(rpc: &kiwi_core::EvmRpc, account: &TestAccount) -> Deployer {
    account.deployer(rpc.clone()).unwrap()
}

async fn balance_of(rpc: &kiwi_core::EvmRpc, session: &KiwiSession, who: Address) -> U256 {
    call_uint(rpc, &session.token, "balanceOf", &[address(who)]).await.unwrap()
}

#[tokio::test]
#[serial]
#[ignore = "requires anvil and compiled artifacts"]
async fn test_initial_state() {
    let (session, rpc) = setup().await;
    let token = &session.token;

    assert_eq!(call_string(&rpc, token, "name", &[]).await.unwrap(), "KIWINATIVE");
    assert_eq!(call_string(&rpc, token, "symbol", &[]).await.unwrap(), "KWN");
    assert_eq!(call_uint(&rpc, token, "decimals", &[]).await.unwrap(), U256::from(18u64));

    assert_eq!(call_address(&rpc, token, "owner", &[]).await.unwrap(), session.owner.address);
    assert!(!call_bool(&rpc, token, "isPaused", &[]).await.unwrap());

    assert_eq!(call_uint(&rpc, token, "totalSupply", &[]).await.unwrap(), initial_supply());
    assert_eq!(balance_of(&rpc, session, session.owner.address).await, initial_supply());
    assert_eq!(balance_of(&rpc, session, session.receiver.address).await, U256::ZERO);
}

#[tokio::test]
#[serial]
#[ignore = "requires anvil and compiled artifacts"]
async fn test_pause_blocks_transfers() {
    let (session, rpc) = setup().await;
    let token = &session.token;
    let owner = deployer(&rpc, &session.owner);
    let spender = deployer(&rpc, session.account(3));

    owner.send(token, "pause", &[], U256::ZERO).await.unwrap();
    assert!(call_bool(&rpc, token, "isPaused", &[]).await.unwrap());

    let receiver = address(session.receiver.address);
    assert_reverts(owner.send(token, "transfer", &[receiver.clone(), uint(100)], U256::ZERO).await);
    assert_reverts(
        owner.send(token, "approve", &[address(spender.sender), uint(300)], U256::ZERO).await,
    );
    assert_reverts(
        spender
            .send(
                token,
                "transferFrom",
                &[address(owner.sender), receiver, uint(300)],
                U256::ZERO,
            )
            .await,
    );

    assert_eq!(balance_of(&rpc, session, owner.sender).await, initial_supply());
}

#[tokio::test]
#[serial]
#[ignore = "requires anvil and compiled artifacts"]
async fn test_unpause_restores_transfers() {
    let (session, rpc) = setup().await;
    let token = &session.token;
    let owner = deployer(&rpc, &session.owner);
    let spender = deployer(&rpc, session.account(3));
    let receiver = address(session.receiver.address);

    owner.send(token, "pause", &[], U256::ZERO).await.unwrap();
    owner.send(token, "unpause", &[], U256::ZERO).await.unwrap();
    assert!(!call_bool(&rpc, token, "isPaused", &[]).await.unwrap());

    owner.send(token, "transfer", &[receiver.clone(), uint(100)], U256::ZERO).await.unwrap();
    owner
        .send(token, "approve", &[address(spender.sender), uint(300)], U256::ZERO)
        .await
        .unwrap();
    spender
        .send(token, "transferFrom", &[address(owner.sender), receiver, uint(300)], U256::ZERO)
        .await
        .unwrap();

    assert_eq!(
        balance_of(&rpc, session, owner.sender).await,
        initial_supply() - U256::from(400u64)
    );
}

#[tokio::test]
#[serial]
#[ignore = "requires anvil and compiled artifacts"]
async fn test_transfer() {
    let (session, rpc) = setup().await;
    let token = &session.token;
    let owner = deployer(&rpc, &session.owner);
    let receiver = deployer(&rpc, &session.receiver);
    let fees = FeeSchedule::new(1, 1);
    let amount = U256::from(100u64);

    let tx = owner
        .send(token, "transfer", &[address(receiver.sender), uint(100)], U256::ZERO)
        .await
        .unwrap();

    let logs = token.decode_events(&tx, "Transfer").unwrap();
    assert_eq!(logs.len(), 3);
    assert_event(&logs[0])
        .field_address("sender", owner.sender)
        .field_address("receiver", session.feeaddress.address)
        .field_u256("amount", fees.transfer_fee(amount));
    assert_event(&logs[1])
        .field_address("sender", owner.sender)
        .field_address("receiver", Address::ZERO)
        .field_u256("amount", fees.burn_fee(amount));
    assert_event(&logs[2])
        .field_address("sender", owner.sender)
        .field_address("receiver", receiver.sender)
        .field_uint("amount", 100);

    assert_eq!(balance_of(&rpc, session, receiver.sender).await, amount);
    assert_eq!(balance_of(&rpc, session, owner.sender).await, initial_supply() - amount);

    // more than the receiver holds
    assert_reverts(
        receiver.send(token, "transfer", &[address(owner.sender), uint(200)], U256::ZERO).await,
    );

    let tx = owner
        .send(token, "transfer", &[address(owner.sender), uint(0)], U256::ZERO)
        .await
        .unwrap();
    assert!(!token.decode_events(&tx, "Transfer").unwrap().is_empty());
}

#[tokio::test]
#[serial]
#[ignore = "requires anvil and compiled artifacts"]
async fn test_transfer_from() {
    let (session, rpc) = setup().await;
    let token = &session.token;
    let owner = deployer(&rpc, &session.owner);
    let spender = deployer(&rpc, session.account(3));
    let receiver = session.receiver.address;
    let fees = FeeSchedule::new(1, 1);

    assert_eq!(balance_of(&rpc, session, receiver).await, U256::ZERO);

    let transfer_from = |amount: u64| [address(owner.sender), address(receiver), uint(amount)];

    // no allowance yet
    assert_reverts(spender.send(token, "transferFrom", &transfer_from(300), U256::ZERO).await);

    let tx = owner
        .send(token, "approve", &[address(spender.sender), uint(300)], U256::ZERO)
        .await
        .unwrap();
    let logs = token.decode_events(&tx, "Approval").unwrap();
    assert_eq!(logs.len(), 1);
    assert_event(&logs[0])
        .field_address("owner", owner.sender)
        .field_address("spender", spender.sender)
        .field_uint("amount", 300);
    assert_eq!(
        call_uint(&rpc, token, "allowance", &[address(owner.sender), address(spender.sender)])
            .await
            .unwrap(),
        U256::from(300u64)
    );

    let tx = spender.send(token, "transferFrom", &transfer_from(200), U256::ZERO).await.unwrap();
    let logs = token.decode_events(&tx, "Transfer").unwrap();
    assert_eq!(logs.len(), 3);
    assert_event(&logs[0])
        .field_address("sender", owner.sender)
        .field_address("receiver", session.feeaddress.address)
        .field_u256("amount", fees.transfer_fee(U256::from(200u64)));
    assert_event(&logs[1])
        .field_address("sender", owner.sender)
        .field_address("receiver", Address::ZERO)
        .field_u256("amount", fees.burn_fee(U256::from(200u64)));
    assert_event(&logs[2])
        .field_address("sender", owner.sender)
        .field_address("receiver", receiver)
        .field_uint("amount", 200);
    assert_eq!(
        call_uint(&rpc, token, "allowance", &[address(owner.sender), address(spender.sender)])
            .await
            .unwrap(),
        U256::from(100u64)
    );

    // exceeds the remaining allowance
    assert_reverts(spender.send(token, "transferFrom", &transfer_from(200), U256::ZERO).await);

    spender.send(token, "transferFrom", &transfer_from(100), U256::ZERO).await.unwrap();
    assert_eq!(balance_of(&rpc, session, spender.sender).await, U256::ZERO);
    assert_eq!(balance_of(&rpc, session, receiver).await, U256::from(300u64));
    assert_eq!(
        balance_of(&rpc, session, owner.sender).await,
        initial_supply() - U256::from(300u64)
    );
}

#[tokio::test]
#[serial]
#[ignore = "requires anvil and compiled artifacts"]
async fn test_approve() {
    let (session, rpc) = setup().await;
    let token = &session.token;
    let owner = deployer(&rpc, &session.owner);
    let spender = session.receiver.address;

    for amount in [300u64, 0] {
        let tx = owner
            .send(token, "approve", &[address(spender), uint(amount)], U256::ZERO)
            .await
            .unwrap();
        let logs = token.decode_events(&tx, "Approval").unwrap();
        assert_eq!(logs.len(), 1);
        assert_event(&logs[0])
            .field_address("owner", owner.sender)
            .field_address("spender", spender)
            .field_uint("amount", amount);
        assert_eq!(
            call_uint(&rpc, token, "allowance", &[address(owner.sender), address(spender)])
                .await
                .unwrap(),
            U256::from(amount)
        );
    }
}

#[tokio::test]
#[serial]
#[ignore = "requires anvil and compiled artifacts"]
async fn test_mint() {
    let (session, rpc) = setup().await;
    let token = &session.token;
    let owner = deployer(&rpc, &session.owner);
    let receiver = session.receiver.address;

    let tx = owner.send(token, "mint", &[address(receiver), uint(420)], U256::ZERO).await.unwrap();
    let logs = token.decode_events(&tx, "Transfer").unwrap();
    assert_eq!(logs.len(), 1);
    assert_event(&logs[0])
        .field_address("sender", Address::ZERO)
        .field_address("receiver", receiver)
        .field_uint("amount", 420);

    assert_eq!(balance_of(&rpc, session, receiver).await, U256::from(420u64));
    assert_eq!(
        call_uint(&rpc, token, "totalSupply", &[]).await.unwrap(),
        initial_supply() + U256::from(420u64)
    );
}

#[tokio::test]
#[serial]
#[ignore = "requires anvil and compiled artifacts"]
async fn test_add_minter() {
    let (session, rpc) = setup().await;
    let token = &session.token;
    let owner = deployer(&rpc, &session.owner);
    let target = address(session.receiver.address);

    assert!(!call_bool(&rpc, token, "isMinter", &[target.clone()]).await.unwrap());
    owner.send(token, "addMinter", &[target.clone()], U256::ZERO).await.unwrap();
    assert!(call_bool(&rpc, token, "isMinter", &[target]).await.unwrap());
}

#[tokio::test]
#[serial]
#[ignore = "requires anvil and compiled artifacts"]
async fn test_add_minter_rejects_zero_address() {
    let (session, rpc) = setup().await;
    let owner = deployer(&rpc, &session.owner);

    assert_reverts_with(
        owner.send(&session.token, "addMinter", &[address(Address::ZERO)], U256::ZERO).await,
        "Cannot add zero address as minter.",
    );
}

#[tokio::test]
#[serial]
#[ignore = "requires anvil and compiled artifacts"]
async fn test_burn() {
    let (session, rpc) = setup().await;
    let token = &session.token;
    let owner = deployer(&rpc, &session.owner);

    let tx = owner.send(token, "burn", &[uint(420)], U256::ZERO).await.unwrap();
    let logs = token.decode_events(&tx, "Transfer").unwrap();
    assert_eq!(logs.len(), 1);
    assert_event(&logs[0]).field_address("sender", owner.sender).field_uint("amount", 420);

    let expected = initial_supply() - U256::from(420u64);
    assert_eq!(balance_of(&rpc, session, owner.sender).await, expected);
    assert_eq!(call_uint(&rpc, token, "totalSupply", &[]).await.unwrap(), expected);
}

#[tokio::test]
#[serial]
#[ignore = "requires anvil and compiled artifacts"]
async fn test_permit() {
    let (session, rpc) = setup().await;
    let token = &session.token;
    let owner = session.owner.address;
    let receiver = deployer(&rpc, &session.receiver);
    let amount = U256::from(100u64);
    let deadline = session.deadline_in(&rpc, 60).await.unwrap();

    assert_eq!(
        call_uint(&rpc, token, "allowance", &[address(owner), address(receiver.sender)])
            .await
            .unwrap(),
        U256::ZERO
    );
    let signature = session
        .sign_permit(&rpc, &session.owner, receiver.sender, amount, deadline)
        .await
        .unwrap();

    let permit = |owner: Address, spender: Address, value: U256, deadline: U256| {
        [
            address(owner),
            address(spender),
            DynSolValue::Uint(value, 256),
            DynSolValue::Uint(deadline, 256),
            DynSolValue::Bytes(signature.to_vec()),
        ]
    };
    let one = U256::from(1u64);

    let mismatches = [
        permit(receiver.sender, receiver.sender, amount, deadline),
        permit(owner, owner, amount, deadline),
        permit(owner, receiver.sender, amount + one, deadline),
        permit(owner, receiver.sender, amount, deadline + one),
    ];
    for args in mismatches.iter() {
        assert_reverts(receiver.send(token, "permit", args, U256::ZERO).await);
    }

    let valid = permit(owner, receiver.sender, amount, deadline);
    receiver.send(token, "permit", &valid, U256::ZERO).await.unwrap();
    assert_eq!(
        call_uint(&rpc, token, "allowance", &[address(owner), address(receiver.sender)])
            .await
            .unwrap(),
        amount
    );
    assert_eq!(
        call_uint(&rpc, token, "nonces", &[address(owner)]).await.unwrap(),
        U256::from(1u64)
    );

    // the nonce moved on, so the same signature no longer verifies
    assert_reverts(receiver.send(token, "permit", &valid, U256::ZERO).await);
}

#[tokio::test]
#[serial]
#[ignore = "requires anvil and compiled artifacts"]
async fn test_update_fees() {
    let (session, rpc) = setup().await;
    let token = &session.token;
    let owner = deployer(&rpc, &session.owner);
    let feeaddress = session.feeaddress.address;

    assert_eq!(call_uint(&rpc, token, "txfee", &[]).await.unwrap(), U256::from(1u64));
    assert_eq!(call_uint(&rpc, token, "burnfee", &[]).await.unwrap(), U256::from(1u64));
    assert_eq!(call_address(&rpc, token, "feeAddress", &[]).await.unwrap(), feeaddress);

    let tx = owner
        .send(token, "updateFees", &[uint(10), uint(10), address(feeaddress)], U256::ZERO)
        .await
        .unwrap();

    assert_eq!(call_uint(&rpc, token, "txfee", &[]).await.unwrap(), U256::from(10u64));
    assert_eq!(call_uint(&rpc, token, "burnfee", &[]).await.unwrap(), U256::from(10u64));
    assert_eq!(call_address(&rpc, token, "feeAddress", &[]).await.unwrap(), feeaddress);

    let logs = token.decode_events(&tx, "UpdateFees").unwrap();
    assert_eq!(logs.len(), 1);
    assert_event(&logs[0]).field_uint("txfee", 10).field_address("feeAddress", feeaddress);
}

#[tokio::test]
#[serial]
#[ignore = "requires anvil and compiled artifacts"]
async fn test_blacklist() {
    let (session, rpc) = setup().await;
    let token = &session.token;
    let owner = deployer(&rpc, &session.owner);
    let spender = deployer(&rpc, session.account(3));
    let receiver = session.receiver.address;

    for who in [receiver, session.feeaddress.address, spender.sender] {
        assert!(!call_bool(&rpc, token, "blackListAddresses", &[address(who)]).await.unwrap());
    }

    let blacklisted = address(spender.sender);
    let tx = owner
        .send(token, "blacklist", &[blacklisted.clone(), DynSolValue::Bool(true)], U256::ZERO)
        .await
        .unwrap();
    assert!(call_bool(&rpc, token, "blackListAddresses", &[blacklisted.clone()]).await.unwrap());

    owner.send(token, "transfer", &[blacklisted, uint(500)], U256::ZERO).await.unwrap();
    assert_reverts(
        spender.send(token, "transfer", &[address(receiver), uint(100)], U256::ZERO).await,
    );

    let logs = token.decode_events(&tx, "Blacklist").unwrap();
    assert_eq!(logs.len(), 1);
    assert_event(&logs[0]).field_address("blackListed", spender.sender).field_bool("value", true);
}

#[tokio::test]
#[serial]
#[ignore = "requires anvil and compiled artifacts"]
async fn test_transfer_ownership() {
    let (session, rpc) = setup().await;
    let token = &session.token;
    let owner = deployer(&rpc, &session.owner);
    let new_owner = session.account(4).address;

    assert_eq!(call_address(&rpc, token, "owner", &[]).await.unwrap(), owner.sender);

    let tx = owner
        .send(token, "transferOwnership", &[address(new_owner)], U256::ZERO)
        .await
        .unwrap();
    assert_eq!(call_address(&rpc, token, "owner", &[]).await.unwrap(), new_owner);

    let logs = token.decode_events(&tx, "OwnershipTransferred").unwrap();
    assert_eq!(logs.len(), 1);
    assert_event(&logs[0])
        .field_address("previousOwner", owner.sender)
        .field_address("newOwner", new_owner);
}
