use super::*;

/// Pool share difficulty. Every share a miner submits is checked against
/// the target derived from it, `floor(2^256 / difficulty)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, DeserializeFromStr, SerializeDisplay)]
pub struct Difficulty(u64);

impl Difficulty {
    pub fn new(difficulty: u64) -> Option<Self> {
        (difficulty > 0).then_some(Self(difficulty))
    }

    pub fn as_u64(self) -> u64 {
        self.0
    }

    pub fn as_f64(self) -> f64 {
        self.0 as f64
    }

    /// A difficulty of one would need a target of exactly 2^256, which does
    /// not fit, so it saturates to the largest 256 bit target.
    pub fn to_target(self) -> Target {
        let quotient = (U512::one() << 256) / U512::from(self.0);
        Target::new(U256::try_from(quotient).unwrap_or(U256::MAX))
    }
}

impl FromStr for Difficulty {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self> {
        let value = match s.trim().parse::<u64>() {
            Ok(value) => value,
            Err(_) => {
                let value = parse_si(s, &["H"])?;
                ensure!(
                    value.fract() == 0.0 && value < u64::MAX as f64,
                    error::InvalidValueSnafu {
                        reason: format!("difficulty '{s}' is not a whole number of hashes"),
                    }
                );
                value as u64
            }
        };

        Self::new(value).ok_or_else(|| ParseError::InvalidValue {
            reason: "difficulty must be greater than zero".into(),
        })
    }
}

impl Display for Difficulty {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
