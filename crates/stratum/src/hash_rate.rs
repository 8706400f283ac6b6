use super::*;

/// Hashes per second.
#[derive(Debug, Clone, Copy, Default, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HashRate(pub f64);

impl HashRate {
    /// Parses a `0x` prefixed hex integer of up to 256 bits, the format
    /// miners use for `eth_submitHashrate`.
    pub fn from_hex(s: &str) -> Result<Self> {
        let digits = hex_integer_digits(s)?;

        ensure!(digits.len() <= 64, error::IntegerSnafu { input: s });

        let value = U256::from_str_radix(digits, 16).map_err(|_| ParseError::Integer {
            input: s.to_string(),
        })?;

        Ok(Self(target::u256_to_f64(value)))
    }
}

impl Display for HashRate {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        format_si(self.0, "H/s", f)
    }
}
