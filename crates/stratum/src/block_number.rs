use super::*;

#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    DeserializeFromStr,
    SerializeDisplay,
)]
pub struct BlockNumber(u64);

impl BlockNumber {
    pub fn new(number: u64) -> Self {
        Self(number)
    }

    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl FromStr for BlockNumber {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self> {
        let digits = hex_integer_digits(s)?;

        u64::from_str_radix(digits, 16)
            .map(Self)
            .map_err(|_| ParseError::Integer {
                input: s.to_string(),
            })
    }
}

impl Display for BlockNumber {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:x}", self.0)
    }
}

impl From<u64> for BlockNumber {
    fn from(number: u64) -> Self {
        Self(number)
    }
}

impl From<BlockNumber> for u64 {
    fn from(number: BlockNumber) -> Self {
        number.0
    }
}
