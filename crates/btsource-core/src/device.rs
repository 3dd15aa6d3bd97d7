//! Bluetooth device identity: hardware addresses and device names.

use std::fmt;
use std::str::FromStr;

use serde::Deserialize;

use crate::error::{ConfigError, ParseError};

/// Longest device name the radio stack accepts, in bytes.
pub const MAX_DEVICE_NAME_LEN: usize = 248;

/// Default sink name when none is configured.
pub const DEFAULT_TARGET_NAME: &str = "ESP_SINK_STREAM_DEMO";

/// 6-byte Bluetooth hardware address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize)]
#[serde(try_from = "String")]
pub struct Address(pub [u8; 6]);

impl Address {
    /// Parse a hardware address from string.
    ///
    /// Supports formats:
    /// - Colon-separated: "AA:BB:CC:DD:EE:FF"
    /// - Hyphen-separated: "AA-BB-CC-DD-EE-FF"
    /// - Bare hex: "AABBCCDDEEFF"
    pub fn from_mac_string(s: &str) -> Result<Self, ParseError> {
        let s = s.trim();

        let parts: Vec<&str> = if s.contains(':') {
            s.split(':').collect()
        } else if s.contains('-') {
            s.split('-').collect()
        } else {
            if s.len() != 12 || !s.is_ascii() {
                return Err(ParseError::InvalidFormat(format!(
                    "address must be 12 hex characters, got {}",
                    s.len()
                )));
            }
            (0..6).map(|i| &s[i * 2..i * 2 + 2]).collect()
        };

        if parts.len() != 6 {
            return Err(ParseError::InvalidFormat(format!(
                "address must have 6 bytes, got {}",
                parts.len()
            )));
        }

        let mut arr = [0u8; 6];
        for (slot, part) in arr.iter_mut().zip(&parts) {
            *slot = u8::from_str_radix(part, 16)
                .map_err(|_| ParseError::InvalidHex(part.to_string()))?;
        }
        Ok(Self(arr))
    }

    /// Raw address bytes, most significant first.
    pub fn as_bytes(&self) -> &[u8; 6] {
        &self.0
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let b = &self.0;
        write!(
            f,
            "{:02x}:{:02x}:{:02x}:{:02x}:{:02x}:{:02x}",
            b[0], b[1], b[2], b[3], b[4], b[5]
        )
    }
}

impl FromStr for Address {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_mac_string(s)
    }
}

impl TryFrom<String> for Address {
    type Error = ParseError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::from_mac_string(&s)
    }
}

/// Cut a name down to what the radio stack stores, keeping whole characters.
pub fn truncate_device_name(name: &str) -> &str {
    if name.len() <= MAX_DEVICE_NAME_LEN {
        return name;
    }
    let mut end = MAX_DEVICE_NAME_LEN;
    while !name.is_char_boundary(end) {
        end -= 1;
    }
    &name[..end]
}

/// Advertised name of the sink we are looking for.
///
/// Fixed at startup. Never empty, never longer than [`MAX_DEVICE_NAME_LEN`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetName(String);

impl TargetName {
    pub fn new(name: impl AsRef<str>) -> Result<Self, ConfigError> {
        let name = truncate_device_name(name.as_ref());
        if name.is_empty() {
            return Err(ConfigError::EmptyTargetName);
        }
        Ok(Self(name.to_string()))
    }

    /// Byte-for-byte comparison against a name pulled from a radio payload.
    pub fn matches(&self, advertised: &[u8]) -> bool {
        self.0.as_bytes() == advertised
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for TargetName {
    fn default() -> Self {
        Self(DEFAULT_TARGET_NAME.to_string())
    }
}

impl fmt::Display for TargetName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod address {
        use super::*;

        #[test]
        fn parses_colon_separated() {
            let addr = Address::from_mac_string("AA:BB:CC:DD:EE:FF").unwrap();
            assert_eq!(addr.0, [0xAA, 0xBB, 0xCC, 0xDD, 0xEE, 0xFF]);
        }

        #[test]
        fn parses_hyphen_separated() {
            let addr = Address::from_mac_string("00-11-22-33-44-55").unwrap();
            assert_eq!(addr.0, [0x00, 0x11, 0x22, 0x33, 0x44, 0x55]);
        }

        #[test]
        fn parses_bare_hex() {
            let addr: Address = "a1b2c3d4e5f6".parse().unwrap();
            assert_eq!(addr.0, [0xA1, 0xB2, 0xC3, 0xD4, 0xE5, 0xF6]);
        }

        #[test]
        fn rejects_short_address() {
            assert!(matches!(
                Address::from_mac_string("AA:BB:CC"),
                Err(ParseError::InvalidFormat(_))
            ));
            assert!(Address::from_mac_string("AABB").is_err());
        }

        #[test]
        fn rejects_bad_hex() {
            assert!(matches!(
                Address::from_mac_string("AA:BB:CC:DD:EE:GG"),
                Err(ParseError::InvalidHex(_))
            ));
        }

        #[test]
        fn displays_lowercase_colon_form() {
            let addr = Address([0xAA, 0x0B, 0xCC, 0xDD, 0xEE, 0x01]);
            assert_eq!(addr.to_string(), "aa:0b:cc:dd:ee:01");
        }
    }

    mod target_name {
        use super::*;

        #[test]
        fn rejects_empty() {
            assert!(matches!(TargetName::new(""), Err(ConfigError::EmptyTargetName)));
        }

        #[test]
        fn truncates_to_radio_limit() {
            let long = "x".repeat(300);
            let name = TargetName::new(&long).unwrap();
            assert_eq!(name.as_str().len(), MAX_DEVICE_NAME_LEN);
        }

        #[test]
        fn truncation_keeps_char_boundary() {
            let long = "é".repeat(200);
            let name = TargetName::new(&long).unwrap();
            assert!(name.as_str().len() <= MAX_DEVICE_NAME_LEN);
            assert!(name.as_str().chars().all(|c| c == 'é'));
        }

        #[test]
        fn matches_exact_bytes_only() {
            let name = TargetName::new("SINK-A").unwrap();
            assert!(name.matches(b"SINK-A"));
            assert!(!name.matches(b"SINK-A "));
            assert!(!name.matches(b"sink-a"));
            assert!(!name.matches(b"SINK"));
        }

        #[test]
        fn default_is_demo_sink() {
            assert_eq!(TargetName::default().as_str(), DEFAULT_TARGET_NAME);
        }
    }
}
