//! On-chain user address identifier.
//!
//! Addresses are always stored and compared lower-cased so that two
//! requests spelling the same account differently still hash to the
//! same shard (spec §4.1 "Addressing").

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// 20-byte on-chain account identifier, `0x`-prefixed hex, lower-cased.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct UserAddress(String);

impl UserAddress {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, thiserror::Error)]
#[error("invalid address {0:?}: expected 0x-prefixed 40 hex characters")]
pub struct InvalidAddress(String);

impl FromStr for UserAddress {
    type Err = InvalidAddress;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.to_lowercase();
        let hex_part = lower.strip_prefix("0x").ok_or_else(|| InvalidAddress(s.to_string()))?;
        if hex_part.len() != 40 || !hex_part.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(InvalidAddress(s.to_string()));
        }
        Ok(UserAddress(lower))
    }
}

impl TryFrom<String> for UserAddress {
    type Error = InvalidAddress;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<UserAddress> for String {
    fn from(value: UserAddress) -> Self {
        value.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lowercases_on_parse() {
        let addr: UserAddress = "0xABCDEF0123456789ABCDEF0123456789ABCDEF01".parse().unwrap();
        assert_eq!(addr.as_str(), "0xabcdef0123456789abcdef0123456789abcdef01");
    }

    #[test]
    fn rejects_short_address() {
        let result: Result<UserAddress, _> = "0x1234".parse();
        assert!(result.is_err());
    }

    #[test]
    fn rejects_missing_prefix() {
        let result: Result<UserAddress, _> = "abcdef0123456789abcdef0123456789abcdef01".parse();
        assert!(result.is_err());
    }

    #[test]
    fn same_address_different_case_are_equal() {
        let a: UserAddress = "0xAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA".parse().unwrap();
        let b: UserAddress = "0xaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa".parse().unwrap();
        assert_eq!(a, b);
    }
}
