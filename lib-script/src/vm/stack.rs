//! Evaluation stack items

/// Largest integer operand the VM accepts, in bytes
const MAX_INTEGER_BYTES: usize = 8;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StackItem {
    Bytes(Vec<u8>),
    Integer(i64),
    Boolean(bool),
}

impl StackItem {
    /// Any non-zero byte, integer or `true` is truthy
    pub fn to_bool(&self) -> bool {
        match self {
            StackItem::Bytes(b) => b.iter().any(|x| *x != 0),
            StackItem::Integer(i) => *i != 0,
            StackItem::Boolean(b) => *b,
        }
    }

    /// Little-endian two's complement for byte items
    pub fn to_integer(&self) -> Result<i64, String> {
        match self {
            StackItem::Integer(i) => Ok(*i),
            StackItem::Boolean(b) => Ok(*b as i64),
            StackItem::Bytes(b) if b.is_empty() => Ok(0),
            StackItem::Bytes(b) if b.len() > MAX_INTEGER_BYTES => {
                Err(format!("integer operand too large: {} bytes", b.len()))
            }
            StackItem::Bytes(b) => {
                let fill = if b[b.len() - 1] & 0x80 != 0 { 0xFF } else { 0x00 };
                let mut buf = [fill; MAX_INTEGER_BYTES];
                buf[..b.len()].copy_from_slice(b);
                Ok(i64::from_le_bytes(buf))
            }
        }
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        match self {
            StackItem::Bytes(b) => b.clone(),
            StackItem::Integer(0) => Vec::new(),
            StackItem::Integer(i) => {
                let bytes = i.to_le_bytes();
                let negative = *i < 0;
                let mut len = bytes.len();
                // trim redundant sign-extension bytes
                while len > 1 {
                    let top = bytes[len - 1];
                    let next_sign = bytes[len - 2] & 0x80 != 0;
                    if (top == 0x00 && !negative && !next_sign) || (top == 0xFF && negative && next_sign) {
                        len -= 1;
                    } else {
                        break;
                    }
                }
                bytes[..len].to_vec()
            }
            StackItem::Boolean(true) => vec![1],
            StackItem::Boolean(false) => Vec::new(),
        }
    }
}
