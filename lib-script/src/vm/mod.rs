//! Stack VM for contract codes
//!
//! ## Invariants
//! - Execution is a pure function of (scripts, signable data)
//! - At most [`MAX_STEPS`] instructions run; exceeding the bound faults
//! - A faulting instruction stops execution and records the reason
//!
//! The parameter is loaded after the code so it runs first and leaves its
//! signatures on the evaluation stack for the code to consume.

pub mod context;
pub mod stack;

use std::collections::HashSet;

use lib_crypto::ecdsa;
use lib_types::contract::{opcode, MAX_MULTISIG_KEYS};

use self::context::InvocationStack;
pub use self::stack::StackItem;

/// Instruction budget per engine run
pub const MAX_STEPS: usize = 1200;

/// Maximum evaluation stack depth
pub const MAX_STACK_SIZE: usize = 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VmState {
    None,
    Halt,
    Fault,
}

pub struct ExecutionEngine<'a> {
    /// Data that CHECKSIG and CHECKMULTISIG verify signatures over
    data: &'a [u8],
    invocation_stack: InvocationStack,
    evaluation_stack: Vec<StackItem>,
    state: VmState,
    steps: usize,
    fault: Option<String>,
}

impl<'a> ExecutionEngine<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            data,
            invocation_stack: InvocationStack::new(),
            evaluation_stack: Vec::new(),
            state: VmState::None,
            steps: 0,
            fault: None,
        }
    }

    /// Load a script; the last loaded script executes first
    pub fn load_script(&mut self, script: &[u8]) {
        if let Err(reason) = self.invocation_stack.push(script.to_vec()) {
            self.fail(reason);
        }
    }

    pub fn execute(&mut self) -> VmState {
        if self.state == VmState::Fault {
            return self.state;
        }
        loop {
            let finished = match self.invocation_stack.current_mut() {
                None => {
                    self.state = VmState::Halt;
                    break;
                }
                Some(ctx) => ctx.is_finished(),
            };
            if finished {
                self.invocation_stack.pop();
                continue;
            }
            if self.steps >= MAX_STEPS {
                self.fail(format!("exceeded {} steps", MAX_STEPS));
                break;
            }
            self.steps += 1;
            if let Err(reason) = self.step() {
                self.fail(reason);
                break;
            }
        }
        self.state
    }

    pub fn state(&self) -> VmState {
        self.state
    }

    pub fn fault_reason(&self) -> Option<&str> {
        self.fault.as_deref()
    }

    pub fn steps(&self) -> usize {
        self.steps
    }

    pub fn evaluation_stack(&self) -> &[StackItem] {
        &self.evaluation_stack
    }

    fn fail(&mut self, reason: String) {
        self.state = VmState::Fault;
        self.fault = Some(reason);
    }

    fn push(&mut self, item: StackItem) -> Result<(), String> {
        if self.evaluation_stack.len() >= MAX_STACK_SIZE {
            return Err("evaluation stack overflow".into());
        }
        self.evaluation_stack.push(item);
        Ok(())
    }

    fn pop(&mut self) -> Result<StackItem, String> {
        self.evaluation_stack
            .pop()
            .ok_or_else(|| "evaluation stack underflow".to_string())
    }

    fn current(&mut self) -> Result<&mut context::ExecutionContext, String> {
        self.invocation_stack
            .current_mut()
            .ok_or_else(|| "no script loaded".to_string())
    }

    fn step(&mut self) -> Result<(), String> {
        let op = self.current()?.read_u8()?;
        match op {
            opcode::PUSH0 => self.push(StackItem::Bytes(Vec::new())),
            opcode::PUSHBYTES1..=opcode::PUSHBYTES75 => {
                let bytes = self.current()?.read_bytes(op as usize)?;
                self.push(StackItem::Bytes(bytes))
            }
            opcode::PUSHDATA1 => {
                let len = self.current()?.read_u8()? as usize;
                let bytes = self.current()?.read_bytes(len)?;
                self.push(StackItem::Bytes(bytes))
            }
            opcode::PUSHDATA2 => {
                let len = self.current()?.read_u16()? as usize;
                let bytes = self.current()?.read_bytes(len)?;
                self.push(StackItem::Bytes(bytes))
            }
            opcode::PUSHDATA4 => {
                let len = self.current()?.read_u32()? as usize;
                let bytes = self.current()?.read_bytes(len)?;
                self.push(StackItem::Bytes(bytes))
            }
            opcode::PUSHM1 => self.push(StackItem::Integer(-1)),
            opcode::PUSH1..=opcode::PUSH16 => {
                self.push(StackItem::Integer((op - opcode::PUSH1) as i64 + 1))
            }
            opcode::NOP => Ok(()),
            opcode::RET => {
                self.invocation_stack.pop();
                Ok(())
            }
            opcode::DUP => {
                let top = self
                    .evaluation_stack
                    .last()
                    .cloned()
                    .ok_or_else(|| "evaluation stack underflow".to_string())?;
                self.push(top)
            }
            opcode::DROP => self.pop().map(|_| ()),
            opcode::SWAP => {
                let a = self.pop()?;
                let b = self.pop()?;
                self.push(a)?;
                self.push(b)
            }
            opcode::EQUAL => {
                let a = self.pop()?;
                let b = self.pop()?;
                self.push(StackItem::Boolean(a.to_bytes() == b.to_bytes()))
            }
            opcode::CHECKSIG => {
                let public_key = self.pop()?.to_bytes();
                let signature = self.pop()?.to_bytes();
                let ok = ecdsa::verify(&public_key, self.data, &signature).is_ok();
                self.push(StackItem::Boolean(ok))
            }
            opcode::CHECKMULTISIG => self.check_multisig(),
            other => Err(format!("unsupported opcode {:#04x}", other)),
        }
    }

    /// Pops `n`, n keys, `m`, then every remaining item as a signature
    fn check_multisig(&mut self) -> Result<(), String> {
        let n = self.pop()?.to_integer()?;
        if n < 1 || n as usize > MAX_MULTISIG_KEYS {
            return Err(format!("invalid public key count {}", n));
        }
        let mut public_keys = Vec::with_capacity(n as usize);
        for _ in 0..n {
            public_keys.push(self.pop()?.to_bytes());
        }
        public_keys.reverse();

        let m = self.pop()?.to_integer()?;
        if m < 1 || m > n {
            return Err(format!("invalid signature threshold {} of {}", m, n));
        }
        let mut signatures: Vec<Vec<u8>> =
            self.evaluation_stack.drain(..).map(|item| item.to_bytes()).collect();
        signatures.reverse();

        let count = signatures.len() as i64;
        if count < m || count > n {
            return self.push(StackItem::Boolean(false));
        }

        let mut used: HashSet<&[u8]> = HashSet::new();
        let mut verified = 0i64;
        for sig in &signatures {
            let matched = public_keys
                .iter()
                .find(|pk| ecdsa::verify(pk, self.data, sig).is_ok());
            if let Some(pk) = matched {
                if !used.insert(pk.as_slice()) {
                    return self.push(StackItem::Boolean(false));
                }
                verified += 1;
            }
        }
        self.push(StackItem::Boolean(verified >= m))
    }
}
