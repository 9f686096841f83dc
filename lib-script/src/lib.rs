//! Program Verification Engine
//!
//! A transaction is authorized when every program hash it must satisfy is
//! paired with a program whose code hashes to it and whose parameter makes
//! that code succeed.
//!
//! # Dispatch by prefix
//!
//! | prefix               | binding check | verification                      |
//! |----------------------|---------------|-----------------------------------|
//! | cross-chain          | no            | Schnorr, or arbitrator M-of-N     |
//! | standard/deposit/v2  | yes           | Schnorr fast path, or the VM      |
//! | multi-signature      | yes           | the VM                            |
//! | anything else        | -             | rejected                          |

pub mod errors;
pub mod verify;
pub mod vm;

pub use errors::{ScriptError, ScriptResult};
pub use verify::{
    check_schnorr_signature, check_standard_signature, run_programs, sort_program_hashes,
    sort_programs, verify_multisig,
};
pub use vm::{ExecutionEngine, VmState, MAX_STEPS};
