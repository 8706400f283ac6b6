use super::*;

/// A 256 bit proof-of-work boundary. A hash meets the target when it is
/// numerically at or below it, so a lower target is harder.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, DeserializeFromStr, SerializeDisplay,
)]
pub struct Target(U256);

impl Target {
    pub const MAX: Self = Self(U256::MAX);

    pub fn new(value: U256) -> Self {
        Self(value)
    }

    pub fn as_u256(&self) -> U256 {
        self.0
    }

    /// Difficulty for display and accounting, `2^256 / target`.
    pub fn difficulty(&self) -> f64 {
        if self.0.is_zero() {
            return f64::INFINITY;
        }

        limbs_to_f64(&((U512::one() << 256) / U512::from(self.0)).0)
    }
}

impl From<U256> for Target {
    fn from(value: U256) -> Self {
        Self(value)
    }
}

impl From<Target> for U256 {
    fn from(target: Target) -> Self {
        target.0
    }
}

/// Accepts any `0x` prefixed hex integer up to 64 digits so node supplied
/// targets that are not zero padded still parse.
impl FromStr for Target {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self> {
        let digits = hex_integer_digits(s)?;

        ensure!(digits.len() <= 64, error::IntegerSnafu { input: s });

        U256::from_str_radix(digits, 16)
            .map(Self)
            .map_err(|_| ParseError::Integer {
                input: s.to_string(),
            })
    }
}

impl Display for Target {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0.to_big_endian()))
    }
}

pub(crate) fn u256_to_f64(value: U256) -> f64 {
    limbs_to_f64(&value.0)
}

fn limbs_to_f64(limbs: &[u64]) -> f64 {
    limbs
        .iter()
        .rev()
        .fold(0.0, |acc, &limb| acc * 18_446_744_073_709_551_616.0 + limb as f64)
}

#[cfg(test)]
mod tests {
    use {super::*, pretty_assertions::assert_eq};

    #[test]
    fn display_is_zero_padded_to_32_bytes() {
        assert_eq!(
            Target::new(U256::from(0x0400)).to_string(),
            "0x0000000000000000000000000000000000000000000000000000000000000400"
        );
        assert_eq!(Target::MAX.to_string(), format!("0x{}", "f".repeat(64)));
    }

    #[test]
    fn parse_accepts_short_and_padded_forms() {
        assert_eq!(
            "0x400".parse::<Target>().unwrap(),
            Target::new(U256::from(1024))
        );
        assert_eq!(
            "0x0000000000000000000000000000000000000000000000000000000000000400"
                .parse::<Target>()
                .unwrap(),
            Target::new(U256::from(1024))
        );
    }

    #[test]
    fn parse_rejects_garbage() {
        assert!("400".parse::<Target>().is_err());
        assert!("0x".parse::<Target>().is_err());
        assert!("0xnothex".parse::<Target>().is_err());
        assert!(format!("0x1{}", "0".repeat(64)).parse::<Target>().is_err());
    }

    #[test]
    fn lower_target_is_harder() {
        let easy = Target::new(U256::from(0x0400));
        let hard = Target::new(U256::from(0x0200));
        assert!(hard < easy);
        assert!(hard.difficulty() > easy.difficulty());
    }

    #[test]
    fn difficulty_of_max_target_is_one() {
        assert_eq!(Target::MAX.difficulty(), 1.0);
        assert_eq!(Target::new(U256::zero()).difficulty(), f64::INFINITY);
    }

    #[test]
    fn difficulty_divides_two_to_the_256() {
        assert_eq!(Target::new(U256::one() << 255).difficulty(), 2.0);
        assert_eq!(Target::new(U256::one() << 224).difficulty(), 4_294_967_296.0);
        assert_eq!(Target::new(U256::one()).difficulty(), 2f64.powi(256));
        assert_eq!(Difficulty::new(1 << 20).unwrap().to_target().difficulty(), 1_048_576.0);
    }

    #[test]
    fn u256_conversion() {
        assert_eq!(u256_to_f64(U256::from(4_000_000_000u64)), 4e9);
        assert_eq!(u256_to_f64(U256::one() << 64), 18_446_744_073_709_551_616.0);
    }
}
