//! Invocation stack
//!
//! Each loaded script runs in its own context; the most recently loaded
//! script executes first. Depth is bounded so a script can never grow the
//! stack without limit.

/// Maximum number of simultaneously loaded scripts
pub const MAX_INVOCATION_DEPTH: usize = 16;

#[derive(Debug, Clone)]
pub struct ExecutionContext {
    script: Vec<u8>,
    ip: usize,
}

impl ExecutionContext {
    pub fn new(script: Vec<u8>) -> Self {
        Self { script, ip: 0 }
    }

    pub fn is_finished(&self) -> bool {
        self.ip >= self.script.len()
    }

    pub fn read_u8(&mut self) -> Result<u8, String> {
        let b = *self
            .script
            .get(self.ip)
            .ok_or_else(|| format!("read past end of script at {}", self.ip))?;
        self.ip += 1;
        Ok(b)
    }

    pub fn read_bytes(&mut self, n: usize) -> Result<Vec<u8>, String> {
        let end = self
            .ip
            .checked_add(n)
            .filter(|end| *end <= self.script.len())
            .ok_or_else(|| format!("push of {} bytes overruns script at {}", n, self.ip))?;
        let out = self.script[self.ip..end].to_vec();
        self.ip = end;
        Ok(out)
    }

    pub fn read_u16(&mut self) -> Result<u16, String> {
        let b = self.read_bytes(2)?;
        Ok(u16::from_le_bytes([b[0], b[1]]))
    }

    pub fn read_u32(&mut self) -> Result<u32, String> {
        let b = self.read_bytes(4)?;
        Ok(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }
}

/// Loaded scripts, top = currently executing
#[derive(Debug, Clone, Default)]
pub struct InvocationStack {
    contexts: Vec<ExecutionContext>,
}

impl InvocationStack {
    pub fn new() -> Self {
        Self { contexts: Vec::new() }
    }

    pub fn push(&mut self, script: Vec<u8>) -> Result<usize, String> {
        if self.contexts.len() >= MAX_INVOCATION_DEPTH {
            return Err(format!(
                "invocation depth {} exceeds maximum of {}",
                self.contexts.len(),
                MAX_INVOCATION_DEPTH
            ));
        }
        self.contexts.push(ExecutionContext::new(script));
        Ok(self.contexts.len())
    }

    pub fn pop(&mut self) -> Option<ExecutionContext> {
        self.contexts.pop()
    }

    pub fn current_mut(&mut self) -> Option<&mut ExecutionContext> {
        self.contexts.last_mut()
    }

    pub fn depth(&self) -> usize {
        self.contexts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contexts.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_last_pushed_runs_first() {
        let mut stack = InvocationStack::new();
        stack.push(vec![1]).unwrap();
        stack.push(vec![2]).unwrap();
        assert_eq!(stack.current_mut().unwrap().read_u8(), Ok(2));
        stack.pop();
        assert_eq!(stack.current_mut().unwrap().read_u8(), Ok(1));
    }

    #[test]
    fn test_depth_limit() {
        let mut stack = InvocationStack::new();
        for _ in 0..MAX_INVOCATION_DEPTH {
            stack.push(Vec::new()).unwrap();
        }
        assert!(stack.push(Vec::new()).is_err());
        assert_eq!(stack.depth(), MAX_INVOCATION_DEPTH);
    }

    #[test]
    fn test_read_past_end() {
        let mut ctx = ExecutionContext::new(vec![1, 2]);
        assert!(ctx.read_bytes(3).is_err());
        assert_eq!(ctx.read_u16(), Ok(0x0201));
        assert!(ctx.is_finished());
    }
}
