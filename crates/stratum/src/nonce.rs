use super::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, DeserializeFromStr, SerializeDisplay)]
pub struct Nonce(u64);

impl FromStr for Nonce {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self> {
        let digits = hex_integer_digits(s)?;

        ensure!(
            digits.len() == 16,
            error::LengthSnafu {
                input: s,
                expected: 16usize,
                actual: digits.len(),
            }
        );

        u64::from_str_radix(digits, 16)
            .map(Nonce)
            .map_err(|_| ParseError::Integer {
                input: s.to_string(),
            })
    }
}

impl Display for Nonce {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:016x}", self.0)
    }
}

impl From<Nonce> for u64 {
    fn from(n: Nonce) -> u64 {
        n.0
    }
}

impl From<u64> for Nonce {
    fn from(n: u64) -> Nonce {
        Nonce(n)
    }
}
