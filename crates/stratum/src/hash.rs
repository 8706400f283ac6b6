use super::*;

/// A 32 byte value written as `0x` followed by exactly 64 hex digits, used
/// for header hashes, seed hashes and mix digests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, DeserializeFromStr, SerializeDisplay)]
pub struct Hash([u8; 32]);

impl Hash {
    pub const ZERO: Self = Self([0; 32]);

    pub fn from_byte_array(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl FromStr for Hash {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self> {
        let digits = strip_hex_prefix(s)?;

        ensure!(
            digits.len() == 64,
            error::LengthSnafu {
                input: s,
                expected: 64usize,
                actual: digits.len(),
            }
        );

        let mut bytes = [0; 32];
        hex::decode_to_slice(digits, &mut bytes).context(error::HexSnafu { input: s })?;

        Ok(Self(bytes))
    }
}

impl Display for Hash {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

#[cfg(test)]
mod tests {
    use {super::*, pretty_assertions::assert_eq};

    #[test]
    fn parse_and_display() {
        let s = "0x5fcbc7fc6d0dcb0d7d6a9e3e0c0d5b8ab8a8f3f4a1c5d9b2a2e3c4d5e6f70812";
        assert_eq!(s.parse::<Hash>().unwrap().to_string(), s);
    }

    #[test]
    fn uppercase_digits_are_normalized() {
        let hash = "0xAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA"
            .parse::<Hash>()
            .unwrap();
        assert_eq!(hash, Hash::from_byte_array([0xaa; 32]));
    }

    #[test]
    fn rejects_wrong_shapes() {
        assert!(matches!(
            "5fcbc7fc6d0dcb0d7d6a9e3e0c0d5b8ab8a8f3f4a1c5d9b2a2e3c4d5e6f70812".parse::<Hash>(),
            Err(ParseError::MissingPrefix { .. })
        ));
        assert!(matches!(
            "0x5fcb".parse::<Hash>(),
            Err(ParseError::Length {
                expected: 64,
                actual: 4,
                ..
            })
        ));
        assert!(matches!(
            "0xzzcbc7fc6d0dcb0d7d6a9e3e0c0d5b8ab8a8f3f4a1c5d9b2a2e3c4d5e6f70812".parse::<Hash>(),
            Err(ParseError::Hex { .. })
        ));
    }
}
