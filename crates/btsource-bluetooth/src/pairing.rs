//! Legacy PIN pairing policy.
//!
//! The sink is a cooperating demo device, so the reply is a fixed code: sixteen
//! zero bytes when the peer insists on a 16-digit PIN, "1234" otherwise.

use std::fmt;

/// Longest PIN the radio stack accepts.
pub const MAX_PIN_LEN: usize = 16;

/// Fixed short PIN.
pub const DEFAULT_PIN: &[u8; 4] = b"1234";

/// PIN code sent in a pairing reply.
#[derive(Clone, PartialEq, Eq)]
pub struct PinCode {
    digits: [u8; MAX_PIN_LEN],
    len: usize,
}

impl PinCode {
    /// Build a PIN from raw bytes. Returns `None` if empty or too long.
    pub fn new(code: &[u8]) -> Option<Self> {
        if code.is_empty() || code.len() > MAX_PIN_LEN {
            return None;
        }
        let mut digits = [0u8; MAX_PIN_LEN];
        digits[..code.len()].copy_from_slice(code);
        Some(Self {
            digits,
            len: code.len(),
        })
    }

    /// Code bytes actually sent (length = `len()`).
    pub fn as_bytes(&self) -> &[u8] {
        &self.digits[..self.len]
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

// Never print the code itself.
impl fmt::Debug for PinCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PinCode").field("len", &self.len).finish()
    }
}

/// Static PIN reply policy.
#[derive(Debug, Clone, Copy, Default)]
pub struct PinPolicy;

impl PinPolicy {
    /// PIN to answer a request with.
    pub fn reply_for(&self, min_16_digit: bool) -> PinCode {
        if min_16_digit {
            PinCode {
                digits: [0u8; MAX_PIN_LEN],
                len: MAX_PIN_LEN,
            }
        } else {
            let mut digits = [0u8; MAX_PIN_LEN];
            digits[..DEFAULT_PIN.len()].copy_from_slice(DEFAULT_PIN);
            PinCode {
                digits,
                len: DEFAULT_PIN.len(),
            }
        }
    }
}
