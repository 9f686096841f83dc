//! Integration tests for plain transfers through both validation phases

mod common;

use common::{sign, Harness, Keypair, HEIGHT};
use lib_blockchain::{ErrorKind, TxValidateError};
use lib_script::ScriptError;
use lib_types::contract::deposit_program_hash;
use lib_types::payload::CoinBase;
use lib_types::transaction::LOCKED_SEQUENCE;
use lib_types::{Attribute, AttributeUsage, Hash256, Input, OutPoint, Payload, Transaction, MAX_AMOUNT};

#[test]
fn test_signed_transfer_passes_and_sets_fee() {
    let h = Harness::new();
    let alice = Keypair::from_seed(1);
    let bob = Keypair::from_seed(2);
    let utxo = h.fund(alice.address(), 10_000);

    let mut tx = h.transfer(&[utxo], vec![h.output(bob.address(), 9_000)]);
    sign(&mut tx, &[&alice]);

    h.validator.check_transaction(HEIGHT, &mut tx).unwrap();
    assert_eq!(tx.fee, 1_000);
    assert_eq!(tx.fee_per_kb, 1_000 * 1000 / tx.serialized_size() as i64);
}

#[test]
fn test_output_values_above_supply_are_rejected() {
    let h = Harness::new();
    let alice = Keypair::from_seed(1);
    let bob = Keypair::from_seed(2);
    let utxo = h.fund(alice.address(), 10_000);

    let huge = 1_i64 << 62;
    let mut tx = h.transfer(&[utxo], vec![h.output(bob.address(), huge); 3]);
    sign(&mut tx, &[&alice]);
    assert_eq!(
        h.validator.check_transaction(HEIGHT, &mut tx),
        Err(TxValidateError::InvalidOutputValue(huge))
    );

    // The fee is computed with checked arithmetic even without sanity
    let err = h.validator.check_context(HEIGHT, &mut tx).unwrap_err();
    assert_eq!(err, TxValidateError::AmountOverflow);
    assert_eq!(err.kind(), ErrorKind::Structural);
    assert_eq!(tx.fee, 0);
}

#[test]
fn test_output_total_above_supply_is_rejected() {
    let h = Harness::new();
    let alice = Keypair::from_seed(1);
    let utxo = h.fund(alice.address(), 10_000);

    let mut tx = h.transfer(&[utxo], vec![h.output(alice.address(), MAX_AMOUNT); 2]);
    sign(&mut tx, &[&alice]);
    assert_eq!(h.validator.check_sanity(HEIGHT, &tx), Err(TxValidateError::AmountOverflow));
}

#[test]
fn test_double_spend_after_confirmation() {
    let h = Harness::new();
    let alice = Keypair::from_seed(1);
    let utxo = h.fund(alice.address(), 10_000);

    let mut b = h.transfer(&[utxo], vec![h.output(Keypair::from_seed(2).address(), 9_000)]);
    sign(&mut b, &[&alice]);
    let mut c = h.transfer(&[utxo], vec![h.output(Keypair::from_seed(3).address(), 9_000)]);
    sign(&mut c, &[&alice]);

    h.validator.check_transaction(HEIGHT, &mut b).unwrap();
    h.validator.check_transaction(HEIGHT, &mut c).unwrap();
    h.confirm(&b, HEIGHT);

    assert!(h.resolver.is_double_spend(&c));
    assert_eq!(
        h.validator.check_transaction(HEIGHT + 1, &mut c),
        Err(TxValidateError::DoubleSpend)
    );
    assert_eq!(
        h.validator.check_transaction(HEIGHT + 1, &mut b),
        Err(TxValidateError::DuplicateTransaction)
    );
}

#[test]
fn test_unknown_input_is_not_yet_valid() {
    let h = Harness::new();
    let alice = Keypair::from_seed(1);
    let missing = OutPoint::new(Hash256::new([0xAB; 32]), 0);
    let mut tx = h.transfer(&[missing], vec![h.output(alice.address(), 1)]);
    sign(&mut tx, &[&alice]);

    let err = h.validator.check_transaction(HEIGHT, &mut tx).unwrap_err();
    assert!(matches!(err, TxValidateError::NotYetValid(_)));
    assert_eq!(err.kind(), ErrorKind::Resolution);
}

#[test]
fn test_output_index_out_of_range_is_not_yet_valid() {
    let h = Harness::new();
    let alice = Keypair::from_seed(1);
    let utxo = h.fund(alice.address(), 10_000);
    let mut tx = h.transfer(&[OutPoint::new(utxo.tx_id, 5)], vec![h.output(alice.address(), 1)]);
    sign(&mut tx, &[&alice]);

    let err = h.validator.check_transaction(HEIGHT, &mut tx).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Resolution);
}

#[test]
fn test_fee_below_minimum() {
    let h = Harness::new();
    let alice = Keypair::from_seed(1);
    let utxo = h.fund(alice.address(), 10_000);
    let mut tx = h.transfer(&[utxo], vec![h.output(alice.address(), 9_950)]);
    sign(&mut tx, &[&alice]);

    assert_eq!(
        h.validator.check_transaction(HEIGHT, &mut tx),
        Err(TxValidateError::FeeNotEnough)
    );
}

#[test]
fn test_wrong_signer_is_authorization_failure() {
    let h = Harness::new();
    let alice = Keypair::from_seed(1);
    let mallory = Keypair::from_seed(9);
    let utxo = h.fund(alice.address(), 10_000);
    let mut tx = h.transfer(&[utxo], vec![h.output(mallory.address(), 9_000)]);
    sign(&mut tx, &[&mallory]);

    let err = h.validator.check_transaction(HEIGHT, &mut tx).unwrap_err();
    assert_eq!(err, TxValidateError::Script(ScriptError::CodeHashMismatch));
    assert_eq!(err.kind(), ErrorKind::Authorization);
}

#[test]
fn test_tampered_transaction_fails_signature() {
    let h = Harness::new();
    let alice = Keypair::from_seed(1);
    let utxo = h.fund(alice.address(), 10_000);
    let mut signed = h.transfer(&[utxo], vec![h.output(alice.address(), 9_000)]);
    sign(&mut signed, &[&alice]);

    let mut tampered = h.transfer(&[utxo], vec![h.output(alice.address(), 8_000)]);
    tampered.programs = signed.programs.clone();
    let err = h.validator.check_transaction(HEIGHT, &mut tampered).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Authorization);
}

#[test]
fn test_two_owners_sign_in_any_order() {
    let h = Harness::new();
    let alice = Keypair::from_seed(1);
    let bob = Keypair::from_seed(2);
    let a = h.fund(alice.address(), 5_000);
    let b = h.fund(bob.address(), 5_000);

    let mut tx = h.transfer(&[a, b], vec![h.output(alice.address(), 9_000)]);
    sign(&mut tx, &[&bob, &alice]);
    h.validator.check_transaction(HEIGHT, &mut tx).unwrap();

    let mut missing = h.transfer(&[a, b], vec![h.output(alice.address(), 8_000)]);
    sign(&mut missing, &[&alice]);
    assert_eq!(
        h.validator.check_transaction(HEIGHT, &mut missing).unwrap_err().kind(),
        ErrorKind::Structural
    );
}

#[test]
fn test_script_attribute_requires_extra_signer() {
    let h = Harness::new();
    let alice = Keypair::from_seed(1);
    let witness = Keypair::from_seed(4);
    let utxo = h.fund(alice.address(), 10_000);

    let mut tx = h.transfer(&[utxo], vec![h.output(alice.address(), 9_000)]);
    tx.attributes.push(Attribute::new(
        AttributeUsage::Script,
        witness.address().as_bytes().to_vec(),
    ));
    sign(&mut tx, &[&alice]);
    assert!(h.validator.check_transaction(HEIGHT, &mut tx).is_err());

    sign(&mut tx, &[&alice, &witness]);
    h.validator.check_transaction(HEIGHT, &mut tx).unwrap();
}

#[test]
fn test_locked_output_needs_sequence_and_lock_time() {
    let h = Harness::new();
    let alice = Keypair::from_seed(1);
    let mut locked = h.output(alice.address(), 10_000);
    locked.output_lock = 500;
    let utxo = h.fund_output(locked, 1);

    let build = |sequence: u32, lock_time: u32| {
        let mut tx = h.transfer(&[utxo], vec![h.output(alice.address(), 9_000)]);
        tx.inputs = vec![Input::new(utxo, sequence)];
        tx.lock_time = lock_time;
        sign(&mut tx, &[&alice]);
        tx
    };

    assert_eq!(
        h.validator.check_transaction(HEIGHT, &mut build(u32::MAX, 600)),
        Err(TxValidateError::InvalidInputSequence)
    );
    assert_eq!(
        h.validator.check_transaction(HEIGHT, &mut build(LOCKED_SEQUENCE, 499)),
        Err(TxValidateError::UtxoLocked)
    );
    h.validator
        .check_transaction(HEIGHT, &mut build(LOCKED_SEQUENCE, 500))
        .unwrap();
}

#[test]
fn test_coinbase_maturity() {
    let h = Harness::new();
    let alice = Keypair::from_seed(1);
    let maturity = h.params.coinbase_maturity;
    let utxo = h.fund_coinbase(alice.address(), 10_000, HEIGHT - maturity + 1);

    let mut tx = h.transfer(&[utxo], vec![h.output(alice.address(), 9_000)]);
    sign(&mut tx, &[&alice]);
    assert_eq!(
        h.validator.check_transaction(HEIGHT, &mut tx),
        Err(TxValidateError::ImmatureCoinbase)
    );
    h.validator.check_transaction(HEIGHT + 1, &mut tx).unwrap();
}

#[test]
fn test_deposit_utxo_only_for_deposit_return() {
    let h = Harness::new();
    let owner = Keypair::from_seed(1);
    let deposit = deposit_program_hash(&owner.public_key).unwrap();
    let utxo = h.fund(deposit, 10_000);

    let mut transfer = h.transfer(&[utxo], vec![h.output(owner.address(), 9_000)]);
    sign(&mut transfer, &[&owner]);
    assert_eq!(
        h.validator.check_transaction(HEIGHT, &mut transfer),
        Err(TxValidateError::DepositUtxoNotAllowed)
    );

    let mut ret = Transaction::new(Payload::ReturnDepositCoin);
    ret.inputs = vec![Input::new(utxo, u32::MAX)];
    ret.outputs = vec![h.output(owner.address(), 9_000)];
    sign(&mut ret, &[&owner]);
    h.validator.check_transaction(HEIGHT, &mut ret).unwrap();

    let plain = h.fund(owner.address(), 10_000);
    let mut wrong = Transaction::new(Payload::ReturnDepositCoin);
    wrong.inputs = vec![Input::new(plain, u32::MAX)];
    wrong.outputs = vec![h.output(owner.address(), 9_000)];
    sign(&mut wrong, &[&owner]);
    assert_eq!(
        h.validator.check_transaction(HEIGHT, &mut wrong),
        Err(TxValidateError::DepositReturnInput)
    );
}

#[test]
fn test_deposit_output_needs_known_owner() {
    let h = Harness::new();
    let alice = Keypair::from_seed(1);
    let deposit = deposit_program_hash(&Keypair::from_seed(6).public_key).unwrap();
    let utxo = h.fund(alice.address(), 10_000);

    let mut tx = h.transfer(&[utxo], vec![h.output(deposit, 9_000)]);
    sign(&mut tx, &[&alice]);
    assert_eq!(
        h.validator.check_transaction(HEIGHT, &mut tx),
        Err(TxValidateError::InvalidDepositOutput)
    );

    h.state.add_deposit_owner(deposit);
    h.validator.check_transaction(HEIGHT, &mut tx).unwrap();
}

#[test]
fn test_destroyed_utxo_unspendable() {
    let h = Harness::new();
    let utxo = h.fund(h.params.destroy_address, 10_000);
    let alice = Keypair::from_seed(1);
    let mut tx = h.transfer(&[utxo], vec![h.output(alice.address(), 9_000)]);
    sign(&mut tx, &[&alice]);
    assert_eq!(
        h.validator.check_transaction(HEIGHT, &mut tx),
        Err(TxValidateError::DestroyedUtxo)
    );
}

#[test]
fn test_coinbase_end_to_end() {
    let h = Harness::new();
    let miner = Keypair::from_seed(3).address();
    let height = h.params.public_dpos_height - 1;

    let coinbase = |foundation: i64, reward: i64| {
        let mut tx = Transaction::new(Payload::CoinBase(CoinBase { content: vec![] }));
        tx.inputs.push(Input::coinbase());
        tx.outputs = vec![h.output(h.params.foundation, foundation), h.output(miner, reward)];
        tx
    };

    h.validator.check_transaction(height, &mut coinbase(30, 70)).unwrap();
    let err = h.validator.check_transaction(height, &mut coinbase(29, 71)).unwrap_err();
    assert_eq!(err.to_string(), "reward to foundation in coinbase < 30%");
}
