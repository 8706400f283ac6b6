use super::*;

/// Outcome of checking a share against a target. `actual_target` is the
/// boundary the solution achieves, reported whether or not it passed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct Verification {
    pub(crate) valid: bool,
    pub(crate) actual_target: Target,
}

/// Ethash proof-of-work check. The gateway does not hash; it asks
/// something that does.
#[async_trait]
pub(crate) trait PowVerifier: Send + Sync {
    async fn verify(
        &self,
        work: &Work,
        submission: &SubmitWork,
        target: Target,
    ) -> Result<Verification>;
}

/// Calls `ethash_verify` on an external verifier service with
/// `[headerHash, nonce, mixDigest, blockNumber, target]`.
#[derive(Debug)]
pub(crate) struct RpcVerifier {
    rpc: RpcClient,
}

impl RpcVerifier {
    pub(crate) fn new(url: Url) -> Result<Self> {
        Ok(Self {
            rpc: RpcClient::new(url, VERIFIER_RPC_TIMEOUT)?,
        })
    }
}

#[async_trait]
impl PowVerifier for RpcVerifier {
    async fn verify(
        &self,
        work: &Work,
        submission: &SubmitWork,
        target: Target,
    ) -> Result<Verification> {
        self.rpc
            .call(
                "ethash_verify",
                json!([
                    work.header_hash,
                    submission.nonce,
                    submission.mix_digest,
                    work.block_number,
                    target,
                ]),
            )
            .await
            .with_context(|| format!("verifier at {} failed", self.rpc.url()))
    }
}
