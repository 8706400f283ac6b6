use super::*;

/// A job as pushed by the node and handed to miners: header hash, seed hash,
/// boundary target and block number. On the wire it is a 4 element array of
/// hex strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Work {
    pub header_hash: Hash,
    pub seed_hash: Hash,
    pub target: Target,
    pub block_number: BlockNumber,
}

impl Work {
    pub const FIELDS: usize = 4;

    pub fn from_fields<S: AsRef<str>>(fields: &[S]) -> Result<Self> {
        let [header_hash, seed_hash, target, block_number] = fields else {
            return Err(ParseError::FieldCount {
                expected: Self::FIELDS,
                actual: fields.len(),
            });
        };

        Ok(Self {
            header_hash: header_hash.as_ref().parse()?,
            seed_hash: seed_hash.as_ref().parse()?,
            target: target.as_ref().parse()?,
            block_number: block_number.as_ref().parse()?,
        })
    }

    /// Copy of this job with the boundary replaced, used to hand out the pool
    /// share target instead of the network target.
    pub fn with_target(&self, target: Target) -> Self {
        Self { target, ..*self }
    }
}

impl Serialize for Work {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut seq = serializer.serialize_seq(Some(Self::FIELDS))?;
        seq.serialize_element(&self.header_hash)?;
        seq.serialize_element(&self.seed_hash)?;
        seq.serialize_element(&self.target)?;
        seq.serialize_element(&self.block_number)?;
        seq.end()
    }
}

impl<'de> Deserialize<'de> for Work {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let fields = Vec::<String>::deserialize(deserializer)?;
        Work::from_fields(&fields).map_err(de::Error::custom)
    }
}
