//! Program dispatch and signature rules
//!
//! `run_programs` pairs program hashes with programs positionally; callers
//! sort both sides by code hash first so the pairing is deterministic.

use std::collections::HashSet;

use lib_crypto::{ecdsa, schnorr, SIGNATURE_LENGTH};
use lib_types::contract::{self, SIGNATURE_SCRIPT_LEN};
use lib_types::hashing::sha256d;
use lib_types::{CodeHash, PrefixType, ProgramHash, Program};
use tracing::debug;

use crate::errors::{ScriptError, ScriptResult};
use crate::vm::{ExecutionEngine, VmState};

/// Verify every `(program_hash, program)` pair against `data`, the unsigned
/// transaction encoding.
pub fn run_programs(
    data: &[u8],
    program_hashes: &[ProgramHash],
    programs: &[Program],
) -> ScriptResult<()> {
    if program_hashes.len() != programs.len() {
        return Err(ScriptError::ProgramCountMismatch {
            hashes: program_hashes.len(),
            programs: programs.len(),
        });
    }

    for (program_hash, program) in program_hashes.iter().zip(programs) {
        match program_hash.prefix_type() {
            Some(PrefixType::CrossChain) => {
                if contract::is_schnorr_code(&program.code) {
                    check_schnorr_signature(program, &sha256d(data))?;
                } else {
                    check_cross_chain_signatures(program, data)?;
                }
            }
            Some(PrefixType::Standard | PrefixType::Deposit | PrefixType::DposV2) => {
                check_code_binding(program_hash, &program.code)?;
                if contract::is_schnorr_code(&program.code) {
                    check_schnorr_signature(program, &sha256d(data))?;
                } else {
                    execute_program(program, data)?;
                }
            }
            Some(PrefixType::MultiSig) => {
                check_code_binding(program_hash, &program.code)?;
                execute_program(program, data)?;
            }
            _ => return Err(ScriptError::UnknownPrefix(program_hash.prefix())),
        }
    }
    Ok(())
}

fn check_code_binding(program_hash: &ProgramHash, code: &[u8]) -> ScriptResult<()> {
    if program_hash.code_hash() != CodeHash::from_code(code) {
        return Err(ScriptError::CodeHashMismatch);
    }
    Ok(())
}

fn execute_program(program: &Program, data: &[u8]) -> ScriptResult<()> {
    let mut engine = ExecutionEngine::new(data);
    engine.load_script(&program.code);
    engine.load_script(&program.parameter);
    if engine.execute() != VmState::Halt {
        let reason = engine.fault_reason().unwrap_or("not halted").to_string();
        debug!(steps = engine.steps(), %reason, "program execution faulted");
        return Err(ScriptError::VmFault(reason));
    }
    let stack = engine.evaluation_stack();
    if stack.len() != 1 {
        return Err(ScriptError::VmStackCount(stack.len()));
    }
    if !stack[0].to_bool() {
        return Err(ScriptError::VmReturnedFalse);
    }
    Ok(())
}

fn check_cross_chain_signatures(program: &Program, data: &[u8]) -> ScriptResult<()> {
    let parsed = contract::parse_cross_chain_code(&program.code)?;
    verify_multisig(parsed.m, parsed.n, &parsed.public_keys, &program.parameter, data)
}

/// M-of-N signature rule shared by cross-chain programs and the arbitrator
/// checks of the validator.
///
/// `signatures` is a concatenation of 65-byte slices, each a one-byte push
/// prefix followed by a signature. Each signature is matched to the first
/// public key it verifies under; matching a key twice is rejected.
pub fn verify_multisig(
    m: usize,
    n: usize,
    public_keys: &[Vec<u8>],
    signatures: &[u8],
    data: &[u8],
) -> ScriptResult<()> {
    if public_keys.len() != n {
        return Err(ScriptError::InvalidPublicKeyCount { expected: n, actual: public_keys.len() });
    }
    if signatures.len() % SIGNATURE_SCRIPT_LEN != 0 {
        return Err(ScriptError::InvalidSignatureLength(signatures.len()));
    }
    let count = signatures.len() / SIGNATURE_SCRIPT_LEN;
    if count < m {
        return Err(ScriptError::NotEnoughSignatures);
    }
    if count > n {
        return Err(ScriptError::TooManySignatures);
    }

    let mut used: HashSet<&[u8]> = HashSet::new();
    let mut verified = 0usize;
    for slice in signatures.chunks(SIGNATURE_SCRIPT_LEN) {
        let sig = &slice[1..];
        let matched = public_keys
            .iter()
            .find(|pk| ecdsa::verify(pk, data, sig).is_ok());
        if let Some(pk) = matched {
            if !used.insert(pk.as_slice()) {
                return Err(ScriptError::DuplicatedSignatures);
            }
            verified += 1;
        }
    }
    if verified < m {
        return Err(ScriptError::MatchedSignaturesNotEnough);
    }
    Ok(())
}

/// Single-key check without the VM: `PUSHBYTES64 <sig>` against a standard code
pub fn check_standard_signature(program: &Program, data: &[u8]) -> ScriptResult<()> {
    if program.parameter.len() != SIGNATURE_SCRIPT_LEN {
        return Err(ScriptError::InvalidParameterLength {
            expected: SIGNATURE_SCRIPT_LEN,
            actual: program.parameter.len(),
        });
    }
    if !contract::is_standard_code(&program.code) {
        return Err(ScriptError::InvalidCode("not a standard code".into()));
    }
    let public_key = contract::single_key_of(&program.code)?;
    ecdsa::verify(public_key, data, &program.parameter[1..])?;
    Ok(())
}

/// Aggregated Schnorr check; `digest` is SHA-256d of the signable data
pub fn check_schnorr_signature(program: &Program, digest: &[u8; 32]) -> ScriptResult<()> {
    if !contract::is_schnorr_code(&program.code) {
        return Err(ScriptError::InvalidCode("not a schnorr code".into()));
    }
    if program.parameter.len() != SIGNATURE_LENGTH {
        return Err(ScriptError::InvalidParameterLength {
            expected: SIGNATURE_LENGTH,
            actual: program.parameter.len(),
        });
    }
    let public_key = contract::single_key_of(&program.code)?;
    if !schnorr::verify(public_key, digest, &program.parameter)? {
        return Err(ScriptError::SchnorrVerifyFailed);
    }
    Ok(())
}

/// Ascending code-hash order; ties keep their relative order
pub fn sort_program_hashes(hashes: &mut [ProgramHash]) {
    hashes.sort_by_key(|h| h.code_hash());
}

/// Ascending code-hash order of each program's code
pub fn sort_programs(programs: &mut [Program]) {
    programs.sort_by_cached_key(|p| CodeHash::from_code(&p.code));
}
