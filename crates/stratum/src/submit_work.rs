use super::*;

/// `eth_submitWork` params: `[nonce, headerHash, mixDigest]`, exactly 18, 66
/// and 66 characters long.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubmitWork {
    pub nonce: Nonce,
    pub header_hash: Hash,
    pub mix_digest: Hash,
}

impl Serialize for SubmitWork {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        (&self.nonce, &self.header_hash, &self.mix_digest).serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for SubmitWork {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let (nonce, header_hash, mix_digest) = <(Nonce, Hash, Hash)>::deserialize(deserializer)?;

        Ok(SubmitWork {
            nonce,
            header_hash,
            mix_digest,
        })
    }
}
