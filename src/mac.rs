//! Parses an IEEE EUI-48 MAC address in its textual form.
use std::{fmt, str::FromStr};

use thiserror::Error;

pub const MAC_LEN: usize = 6;

/// A 6-byte link-layer address.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct MacAddr([u8; MAC_LEN]);

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ParseError {
    /// Not exactly six octets
    #[error("invalid length")]
    InvalidLength,

    /// Octet is empty, longer than two digits or not hexadecimal
    #[error("invalid octet at position '{0}'")]
    InvalidOctet(usize),
}

impl MacAddr {
    pub const BROADCAST: MacAddr = MacAddr([0xFF; MAC_LEN]);

    pub const fn new(octets: [u8; MAC_LEN]) -> Self {
        MacAddr(octets)
    }

    pub fn as_bytes(&self) -> &[u8; MAC_LEN] {
        &self.0
    }
}

/// Parses six hexadecimal octets of one or two digits each. Octets may be separated by hyphens
/// (IEEE notation) or colons, and the two may be mixed.
fn parse_eui48(input: &str) -> Result<[u8; MAC_LEN], ParseError> {
    let mut octets = [0u8; MAC_LEN];
    let mut count = 0;

    for (index, part) in input.split([':', '-']).enumerate() {
        if index >= MAC_LEN {
            return Err(ParseError::InvalidLength);
        }
        if part.is_empty() || part.len() > 2 || !part.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(ParseError::InvalidOctet(index));
        }
        octets[index] = u8::from_str_radix(part, 16).map_err(|_| ParseError::InvalidOctet(index))?;
        count += 1;
    }

    if count != MAC_LEN {
        return Err(ParseError::InvalidLength);
    }
    Ok(octets)
}

impl FromStr for MacAddr {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_eui48(s).map(MacAddr)
    }
}

impl fmt::Display for MacAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c, d, e, g] = self.0;
        write!(f, "{a:02x}:{b:02x}:{c:02x}:{d:02x}:{e:02x}:{g:02x}")
    }
}
