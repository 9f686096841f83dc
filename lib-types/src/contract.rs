//! Contract code templates and program-hash prefixes
//!
//! A contract code is the script an output owner commits to; its program hash
//! is `prefix || RIPEMD160(SHA256(code))`. The templates here are the only
//! shapes the verification fast paths recognise:
//!
//! - standard: `PUSHBYTES33 <pk> CHECKSIG`
//! - schnorr: `PUSHBYTES33 <aggregated pk> SCHNORR`
//! - multisig: `PUSH_M (PUSHBYTES33 <pk>)*n PUSH_N CHECKMULTISIG`
//! - cross-chain: same as multisig, terminated by `CROSSCHAIN`

use crate::errors::{TypesError, TypesResult};
use crate::primitives::ProgramHash;

pub const PUBLIC_KEY_LEN: usize = 33;
pub const SIGNATURE_LEN: usize = 64;
/// Signature plus its one-byte push prefix
pub const SIGNATURE_SCRIPT_LEN: usize = 65;
/// Maximum signers expressible with a single PUSH opcode
pub const MAX_MULTISIG_KEYS: usize = 16;

/// Opcodes shared by the code templates and the stack VM
pub mod opcode {
    pub const PUSH0: u8 = 0x00;
    pub const PUSHBYTES1: u8 = 0x01;
    pub const PUSHBYTES33: u8 = 0x21;
    pub const PUSHBYTES64: u8 = 0x40;
    pub const PUSHBYTES75: u8 = 0x4B;
    pub const PUSHDATA1: u8 = 0x4C;
    pub const PUSHDATA2: u8 = 0x4D;
    pub const PUSHDATA4: u8 = 0x4E;
    pub const PUSHM1: u8 = 0x4F;
    pub const PUSH1: u8 = 0x51;
    pub const PUSH16: u8 = 0x60;
    pub const NOP: u8 = 0x61;
    pub const RET: u8 = 0x66;
    pub const DROP: u8 = 0x75;
    pub const DUP: u8 = 0x76;
    pub const SWAP: u8 = 0x7C;
    pub const EQUAL: u8 = 0x87;
    pub const CHECKSIG: u8 = 0xAC;
    pub const CHECKMULTISIG: u8 = 0xAE;
    pub const CROSSCHAIN: u8 = 0xAF;
    /// Template marker only, never executed by the VM
    pub const SCHNORR: u8 = 0x41;
}

// ============================================================================
// PREFIX TYPES
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum PrefixType {
    Standard = 0x21,
    MultiSig = 0x12,
    CrossChain = 0x4B,
    Deposit = 0x1F,
    DposV2 = 0x3F,
    /// CR treasury; spent only by administrative transactions
    CrExpenses = 0x1C,
}

impl PrefixType {
    pub fn from_u8(b: u8) -> Option<Self> {
        match b {
            0x21 => Some(Self::Standard),
            0x12 => Some(Self::MultiSig),
            0x4B => Some(Self::CrossChain),
            0x1F => Some(Self::Deposit),
            0x3F => Some(Self::DposV2),
            0x1C => Some(Self::CrExpenses),
            _ => None,
        }
    }
}

// ============================================================================
// TEMPLATE CONSTRUCTION
// ============================================================================

fn check_public_key(pk: &[u8]) -> TypesResult<()> {
    if pk.len() != PUBLIC_KEY_LEN {
        return Err(TypesError::InvalidPublicKeyLength(pk.len()));
    }
    Ok(())
}

fn single_key_code(pk: &[u8], terminator: u8) -> TypesResult<Vec<u8>> {
    check_public_key(pk)?;
    let mut code = Vec::with_capacity(PUBLIC_KEY_LEN + 2);
    code.push(opcode::PUSHBYTES33);
    code.extend_from_slice(pk);
    code.push(terminator);
    Ok(code)
}

/// `PUSHBYTES33 <pk> CHECKSIG`
pub fn create_standard_code(pk: &[u8]) -> TypesResult<Vec<u8>> {
    single_key_code(pk, opcode::CHECKSIG)
}

/// `PUSHBYTES33 <aggregated pk> SCHNORR`
pub fn create_schnorr_code(aggregated_pk: &[u8]) -> TypesResult<Vec<u8>> {
    single_key_code(aggregated_pk, opcode::SCHNORR)
}

fn multi_key_code(m: usize, public_keys: &[Vec<u8>], terminator: u8) -> TypesResult<Vec<u8>> {
    let n = public_keys.len();
    if m == 0 || m > n || n > MAX_MULTISIG_KEYS {
        return Err(TypesError::InvalidMultisigParams { m, n });
    }
    let mut keys = public_keys.to_vec();
    for pk in &keys {
        check_public_key(pk)?;
    }
    keys.sort();

    let mut code = Vec::with_capacity(n * (PUBLIC_KEY_LEN + 1) + 3);
    code.push(opcode::PUSH1 + (m as u8 - 1));
    for pk in &keys {
        code.push(opcode::PUSHBYTES33);
        code.extend_from_slice(pk);
    }
    code.push(opcode::PUSH1 + (n as u8 - 1));
    code.push(terminator);
    Ok(code)
}

/// M-of-N code; public keys are sorted ascending before embedding
pub fn create_multisig_code(m: usize, public_keys: &[Vec<u8>]) -> TypesResult<Vec<u8>> {
    multi_key_code(m, public_keys, opcode::CHECKMULTISIG)
}

/// M-of-N arbitrator code used by cross-chain and side-chain withdraw spends
pub fn create_cross_chain_code(m: usize, public_keys: &[Vec<u8>]) -> TypesResult<Vec<u8>> {
    multi_key_code(m, public_keys, opcode::CROSSCHAIN)
}

/// `PUSHBYTES64 <sig>`; the parameter that satisfies a standard code
pub fn standard_parameter(signature: &[u8]) -> Vec<u8> {
    let mut param = Vec::with_capacity(signature.len() + 1);
    param.push(signature.len() as u8);
    param.extend_from_slice(signature);
    param
}

/// Concatenated `PUSHBYTES64 <sig>` slices for multi-signature codes
pub fn multisig_parameter(signatures: &[Vec<u8>]) -> Vec<u8> {
    signatures.iter().flat_map(|s| standard_parameter(s)).collect()
}

// ============================================================================
// PROGRAM HASHES
// ============================================================================

pub fn standard_program_hash(pk: &[u8]) -> TypesResult<ProgramHash> {
    Ok(ProgramHash::from_code(PrefixType::Standard, &create_standard_code(pk)?))
}

/// Deposit address of a producer or CR candidate owner key
pub fn deposit_program_hash(pk: &[u8]) -> TypesResult<ProgramHash> {
    Ok(ProgramHash::from_code(PrefixType::Deposit, &create_standard_code(pk)?))
}

/// DPoS v2 stake address of a standard owner
pub fn stake_program_hash(pk: &[u8]) -> TypesResult<ProgramHash> {
    Ok(ProgramHash::from_code(PrefixType::DposV2, &create_standard_code(pk)?))
}

pub fn multisig_program_hash(m: usize, public_keys: &[Vec<u8>]) -> TypesResult<ProgramHash> {
    Ok(ProgramHash::from_code(
        PrefixType::MultiSig,
        &create_multisig_code(m, public_keys)?,
    ))
}

// ============================================================================
// TEMPLATE RECOGNITION
// ============================================================================

pub fn is_standard_code(code: &[u8]) -> bool {
    code.len() == PUBLIC_KEY_LEN + 2
        && code[0] == opcode::PUSHBYTES33
        && code[PUBLIC_KEY_LEN + 1] == opcode::CHECKSIG
}

pub fn is_schnorr_code(code: &[u8]) -> bool {
    code.len() == PUBLIC_KEY_LEN + 2
        && code[0] == opcode::PUSHBYTES33
        && code[PUBLIC_KEY_LEN + 1] == opcode::SCHNORR
}

pub fn is_multisig_code(code: &[u8]) -> bool {
    code.last() == Some(&opcode::CHECKMULTISIG) && parse_multisig_code(code).is_ok()
}

pub fn is_cross_chain_code(code: &[u8]) -> bool {
    code.last() == Some(&opcode::CROSSCHAIN) && parse_cross_chain_code(code).is_ok()
}

/// Public key embedded in a standard or Schnorr code
pub fn single_key_of(code: &[u8]) -> TypesResult<&[u8]> {
    if !is_standard_code(code) && !is_schnorr_code(code) {
        return Err(TypesError::InvalidCode("not a single-key code".into()));
    }
    Ok(&code[1..code.len() - 1])
}

/// Parsed M-of-N code
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MultisigCode {
    pub m: usize,
    pub n: usize,
    /// Raw 33-byte keys in script order
    pub public_keys: Vec<Vec<u8>>,
}

fn push_count(op: u8) -> Option<usize> {
    if (opcode::PUSH1..=opcode::PUSH16).contains(&op) {
        Some((op - opcode::PUSH1) as usize + 1)
    } else {
        None
    }
}

fn parse_multi_key_code(code: &[u8], terminator: u8) -> TypesResult<MultisigCode> {
    if code.len() < PUBLIC_KEY_LEN + 4 {
        return Err(TypesError::InvalidCode(format!("code too short: {}", code.len())));
    }
    let last = code.len() - 1;
    if code[last] != terminator {
        return Err(TypesError::InvalidCode(format!(
            "unexpected terminator {:#04x}",
            code[last]
        )));
    }
    let m = push_count(code[0]).ok_or_else(|| TypesError::InvalidCode("invalid m opcode".into()))?;
    let n = push_count(code[last - 1])
        .ok_or_else(|| TypesError::InvalidCode("invalid n opcode".into()))?;

    let body = &code[1..last - 1];
    let chunk = PUBLIC_KEY_LEN + 1;
    if body.len() % chunk != 0 {
        return Err(TypesError::InvalidCode("malformed public key section".into()));
    }
    let mut public_keys = Vec::with_capacity(body.len() / chunk);
    for slice in body.chunks(chunk) {
        if slice[0] != opcode::PUSHBYTES33 {
            return Err(TypesError::InvalidCode("public key is not a 33-byte push".into()));
        }
        public_keys.push(slice[1..].to_vec());
    }
    if public_keys.len() != n || m > n {
        return Err(TypesError::InvalidMultisigParams { m, n: public_keys.len() });
    }
    Ok(MultisigCode { m, n, public_keys })
}

pub fn parse_multisig_code(code: &[u8]) -> TypesResult<MultisigCode> {
    parse_multi_key_code(code, opcode::CHECKMULTISIG)
}

pub fn parse_cross_chain_code(code: &[u8]) -> TypesResult<MultisigCode> {
    parse_multi_key_code(code, opcode::CROSSCHAIN)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(seed: u8) -> Vec<u8> {
        let mut pk = vec![0x02];
        pk.extend_from_slice(&[seed; 32]);
        pk
    }

    #[test]
    fn test_standard_code_layout() {
        let code = create_standard_code(&key(1)).unwrap();
        assert_eq!(code.len(), 35);
        assert_eq!(code[0], opcode::PUSHBYTES33);
        assert_eq!(code[34], opcode::CHECKSIG);
        assert!(is_standard_code(&code));
        assert!(!is_schnorr_code(&code));
        assert_eq!(single_key_of(&code).unwrap(), key(1).as_slice());
    }

    #[test]
    fn test_standard_code_rejects_bad_key_length() {
        assert_eq!(
            create_standard_code(&[0x02; 32]),
            Err(TypesError::InvalidPublicKeyLength(32))
        );
    }

    #[test]
    fn test_multisig_code_sorts_keys_and_parses_back() {
        let keys = vec![key(3), key(1), key(2)];
        let code = create_multisig_code(2, &keys).unwrap();
        let parsed = parse_multisig_code(&code).unwrap();
        assert_eq!(parsed.m, 2);
        assert_eq!(parsed.n, 3);
        assert_eq!(parsed.public_keys, vec![key(1), key(2), key(3)]);
        assert!(is_multisig_code(&code));
        assert!(!is_cross_chain_code(&code));
    }

    #[test]
    fn test_cross_chain_code_terminator() {
        let code = create_cross_chain_code(1, &[key(7)]).unwrap();
        assert_eq!(*code.last().unwrap(), opcode::CROSSCHAIN);
        assert!(parse_multisig_code(&code).is_err());
        assert_eq!(parse_cross_chain_code(&code).unwrap().public_keys, vec![key(7)]);
    }

    #[test]
    fn test_multisig_rejects_m_above_n() {
        assert_eq!(
            create_multisig_code(3, &[key(1), key(2)]),
            Err(TypesError::InvalidMultisigParams { m: 3, n: 2 })
        );
    }

    #[test]
    fn test_deposit_and_standard_share_code_hash() {
        let std_hash = standard_program_hash(&key(9)).unwrap();
        let dep_hash = deposit_program_hash(&key(9)).unwrap();
        assert_eq!(std_hash.code_hash(), dep_hash.code_hash());
        assert_eq!(dep_hash.prefix_type(), Some(PrefixType::Deposit));
    }
}
