//! Multi-signature rules through the public program verification API

use lib_crypto::{ecdsa, schnorr};
use lib_script::{run_programs, verify_multisig, ScriptError};
use lib_types::contract::{
    create_cross_chain_code, create_schnorr_code, multisig_parameter, parse_cross_chain_code,
};
use lib_types::hashing::sha256d;
use lib_types::{PrefixType, Program, ProgramHash};

const DATA: &[u8] = b"unsigned transaction bytes";

struct Signer {
    private: Vec<u8>,
    public: Vec<u8>,
}

fn signers(n: u8) -> Vec<Signer> {
    (1..=n)
        .map(|seed| {
            let private = vec![seed; 32];
            let public = ecdsa::public_key_from_private(&private).unwrap().to_vec();
            Signer { private, public }
        })
        .collect()
}

fn sign_all(signers: &[&Signer]) -> Vec<u8> {
    let sigs: Vec<Vec<u8>> = signers
        .iter()
        .map(|s| ecdsa::sign(&s.private, DATA).unwrap().to_vec())
        .collect();
    multisig_parameter(&sigs)
}

fn public_keys(signers: &[Signer]) -> Vec<Vec<u8>> {
    signers.iter().map(|s| s.public.clone()).collect()
}

#[test]
fn test_three_of_five_every_subset_of_three_passes() {
    let s = signers(5);
    let keys = public_keys(&s);
    let mut subsets = 0;
    for a in 0..5 {
        for b in a + 1..5 {
            for c in b + 1..5 {
                let params = sign_all(&[&s[a], &s[b], &s[c]]);
                assert_eq!(verify_multisig(3, 5, &keys, &params, DATA), Ok(()), "{a} {b} {c}");
                subsets += 1;
            }
        }
    }
    assert_eq!(subsets, 10);
}

#[test]
fn test_three_of_five_rejections() {
    let s = signers(5);
    let keys = public_keys(&s);
    let outsider = &signers(6)[5];

    let two = sign_all(&[&s[1], &s[4]]);
    assert_eq!(verify_multisig(3, 5, &keys, &two, DATA), Err(ScriptError::NotEnoughSignatures));

    let repeated = sign_all(&[&s[0], &s[3], &s[3]]);
    assert_eq!(verify_multisig(3, 5, &keys, &repeated, DATA), Err(ScriptError::DuplicatedSignatures));

    // A sixth key never counts toward the threshold
    let with_outsider = sign_all(&[&s[0], &s[2], outsider]);
    assert_eq!(
        verify_multisig(3, 5, &keys, &with_outsider, DATA),
        Err(ScriptError::MatchedSignaturesNotEnough)
    );
    let extra_outsider = sign_all(&[&s[0], outsider, &s[2], &s[4]]);
    assert_eq!(verify_multisig(3, 5, &keys, &extra_outsider, DATA), Ok(()));
}

#[test]
fn test_three_of_four_passes_with_three_signatures() {
    let s = signers(4);
    let params = sign_all(&[&s[0], &s[2], &s[3]]);
    assert_eq!(verify_multisig(3, 4, &public_keys(&s), &params, DATA), Ok(()));
}

#[test]
fn test_three_of_four_with_two_signatures_is_not_enough() {
    let s = signers(4);
    let params = sign_all(&[&s[0], &s[1]]);
    let err = verify_multisig(3, 4, &public_keys(&s), &params, DATA).unwrap_err();
    assert_eq!(err, ScriptError::NotEnoughSignatures);
    assert_eq!(err.to_string(), "invalid signatures, not enough signatures");
}

#[test]
fn test_more_signatures_than_keys_rejected() {
    let s = signers(2);
    let params = sign_all(&[&s[0], &s[1], &s[0]]);
    assert_eq!(
        verify_multisig(1, 2, &public_keys(&s), &params, DATA),
        Err(ScriptError::TooManySignatures)
    );
}

#[test]
fn test_same_key_twice_is_duplicated() {
    let s = signers(3);
    let params = sign_all(&[&s[1], &s[1]]);
    assert_eq!(
        verify_multisig(2, 3, &public_keys(&s), &params, DATA),
        Err(ScriptError::DuplicatedSignatures)
    );
}

#[test]
fn test_foreign_signature_leaves_threshold_unmet() {
    let s = signers(3);
    let outsider = &signers(9)[8];
    let params = sign_all(&[&s[0], outsider]);
    assert_eq!(
        verify_multisig(2, 3, &public_keys(&s), &params, DATA),
        Err(ScriptError::MatchedSignaturesNotEnough)
    );
}

#[test]
fn test_ragged_signature_bytes_rejected() {
    let s = signers(2);
    let mut params = sign_all(&[&s[0]]);
    params.push(0);
    assert_eq!(
        verify_multisig(1, 2, &public_keys(&s), &params, DATA),
        Err(ScriptError::InvalidSignatureLength(66))
    );
}

#[test]
fn test_key_count_must_equal_n() {
    let s = signers(3);
    let params = sign_all(&[&s[0]]);
    assert_eq!(
        verify_multisig(1, 4, &public_keys(&s), &params, DATA),
        Err(ScriptError::InvalidPublicKeyCount { expected: 4, actual: 3 })
    );
}

#[test]
fn test_cross_chain_prefix_skips_code_binding() {
    let s = signers(5);
    let code = create_cross_chain_code(3, &public_keys(&s)).unwrap();
    let parsed = parse_cross_chain_code(&code).unwrap();
    assert_eq!((parsed.m, parsed.n), (3, 5));

    // side-chain genesis addresses are not derived from the arbitrator code
    let mut genesis = [0x77u8; 21];
    genesis[0] = PrefixType::CrossChain as u8;
    let program = Program::new(code, sign_all(&[&s[0], &s[1], &s[4]]));
    assert_eq!(
        run_programs(DATA, &[ProgramHash::new(genesis)], &[program]),
        Ok(())
    );
}

#[test]
fn test_cross_chain_schnorr_program() {
    let s = signers(3);
    let privs: Vec<Vec<u8>> = s.iter().map(|x| x.private.clone()).collect();
    let agg = schnorr::aggregate_public_keys(&public_keys(&s)).unwrap();
    let code = create_schnorr_code(&agg).unwrap();
    let sig = schnorr::aggregate(&privs, &sha256d(DATA)).unwrap();
    let hash = ProgramHash::from_code(PrefixType::CrossChain, &code);
    assert_eq!(run_programs(DATA, &[hash], &[Program::new(code, sig.to_vec())]), Ok(()));
}
