use super::*;

/// `eth_submitHashrate` params: `[hashrate, clientId]`. Only the hashrate is
/// kept.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SubmitHashrate {
    pub hashrate: HashRate,
}

impl SubmitHashrate {
    pub fn from_params(params: &Value) -> Result<Self> {
        let Some(first) = params.get(0) else {
            return Err(ParseError::FieldCount {
                expected: 1,
                actual: params.as_array().map(Vec::len).unwrap_or_default(),
            });
        };

        let Some(hashrate) = first.as_str() else {
            return Err(ParseError::InvalidValue {
                reason: format!("hashrate must be a hex string, got {first}"),
            });
        };

        Ok(Self {
            hashrate: HashRate::from_hex(hashrate)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use {super::*, pretty_assertions::assert_eq, serde_json::json};

    #[test]
    fn from_params() {
        assert_eq!(
            SubmitHashrate::from_params(&json!([
                "0x1dcd6500",
                "0x59daa26581d0acd1fce254fb7e85952f4c09d0915afd33d3886cd914bc7d283c"
            ]))
            .unwrap(),
            SubmitHashrate {
                hashrate: HashRate(500_000_000.0)
            }
        );
    }

    #[test]
    fn bad_params() {
        assert!(SubmitHashrate::from_params(&json!([])).is_err());
        assert!(SubmitHashrate::from_params(&json!([500])).is_err());
        assert!(SubmitHashrate::from_params(&json!(["lots"])).is_err());
        assert!(SubmitHashrate::from_params(&json!({"rate": "0x1"})).is_err());
    }
}
