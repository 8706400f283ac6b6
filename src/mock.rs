use super::*;

#[derive(Debug, Default)]
struct Chain {
    head: u64,
    canonical: BTreeMap<u64, Block>,
    uncles: BTreeMap<u64, Vec<Block>>,
    submitted: Vec<SubmitWork>,
    reject_work: bool,
    failing: bool,
}

/// In-memory chain standing in for a node.
#[derive(Debug, Default)]
pub(crate) struct MockNode {
    chain: Mutex<Chain>,
    head_reads: AtomicUsize,
}

impl MockNode {
    pub(crate) fn block(number: u64, hash: u8, nonce: u64, difficulty: u64) -> Block {
        Block {
            number: BlockNumber::new(number),
            hash: Hash::from_byte_array([hash; 32]),
            nonce: Nonce::from(nonce),
            difficulty,
            timestamp: 1_600_000_000 + number * 13,
        }
    }

    pub(crate) fn set_head(&self, head: u64) {
        self.chain.lock().head = head;
    }

    pub(crate) fn add_block(&self, block: Block) {
        self.chain
            .lock()
            .canonical
            .insert(block.number.as_u64(), block);
    }

    pub(crate) fn add_uncle(&self, included_in: u64, uncle: Block) {
        self.chain
            .lock()
            .uncles
            .entry(included_in)
            .or_default()
            .push(uncle);
    }

    pub(crate) fn reject_work(&self) {
        self.chain.lock().reject_work = true;
    }

    pub(crate) fn set_failing(&self, failing: bool) {
        self.chain.lock().failing = failing;
    }

    pub(crate) fn submitted(&self) -> Vec<SubmitWork> {
        self.chain.lock().submitted.clone()
    }

    pub(crate) fn head_reads(&self) -> usize {
        self.head_reads.load(Ordering::Relaxed)
    }

    fn chain(&self) -> Result<parking_lot::MutexGuard<'_, Chain>> {
        let chain = self.chain.lock();
        ensure!(!chain.failing, "node unreachable");
        Ok(chain)
    }
}

#[async_trait]
impl Node for MockNode {
    async fn client_version(&self) -> Result<String> {
        let _chain = self.chain()?;
        Ok("Geth/v1.10.8-stable/linux-amd64/go1.16.4".into())
    }

    async fn block_number(&self) -> Result<u64> {
        self.head_reads.fetch_add(1, Ordering::Relaxed);
        Ok(self.chain()?.head)
    }

    async fn submit_work(&self, submission: &SubmitWork) -> Result<bool> {
        let mut chain = self.chain()?;
        chain.submitted.push(*submission);
        Ok(!chain.reject_work)
    }

    async fn block_by_number(&self, number: u64) -> Result<Option<Block>> {
        let chain = self.chain()?;

        if number > chain.head {
            return Ok(None);
        }

        Ok(chain.canonical.get(&number).copied())
    }

    async fn block_by_hash(&self, hash: Hash) -> Result<Option<Block>> {
        let chain = self.chain()?;

        Ok(chain
            .canonical
            .values()
            .chain(chain.uncles.values().flatten())
            .find(|block| block.hash == hash)
            .copied())
    }

    async fn uncle_count_by_block_number(&self, number: u64) -> Result<u64> {
        Ok(self
            .chain()?
            .uncles
            .get(&number)
            .map(|uncles| uncles.len() as u64)
            .unwrap_or_default())
    }

    async fn uncle_by_block_number_and_index(
        &self,
        number: u64,
        index: u64,
    ) -> Result<Option<Block>> {
        Ok(self
            .chain()?
            .uncles
            .get(&number)
            .and_then(|uncles| uncles.get(usize::try_from(index).ok()?))
            .copied())
    }
}

#[derive(Debug, Clone, Copy)]
enum Reply {
    Fixed(Verification),
    EchoNonce,
    Fail,
}

impl Default for Reply {
    fn default() -> Self {
        Self::Fixed(Verification {
            valid: false,
            actual_target: Target::MAX,
        })
    }
}

/// Verifier with a scripted answer.
#[derive(Debug, Default)]
pub(crate) struct MockVerifier {
    reply: Mutex<Reply>,
    calls: Mutex<Vec<(Work, SubmitWork, Target)>>,
}

impl MockVerifier {
    pub(crate) fn set(&self, valid: bool, actual_target: Target) {
        *self.reply.lock() = Reply::Fixed(Verification {
            valid,
            actual_target,
        });
    }

    /// Passes every share, reporting the nonce as the achieved target.
    pub(crate) fn echo_nonce(&self) {
        *self.reply.lock() = Reply::EchoNonce;
    }

    pub(crate) fn fail(&self) {
        *self.reply.lock() = Reply::Fail;
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.lock().len()
    }

    pub(crate) fn last_call(&self) -> Option<(Work, SubmitWork, Target)> {
        self.calls.lock().last().copied()
    }
}

#[async_trait]
impl PowVerifier for MockVerifier {
    async fn verify(
        &self,
        work: &Work,
        submission: &SubmitWork,
        target: Target,
    ) -> Result<Verification> {
        self.calls.lock().push((*work, *submission, target));

        match *self.reply.lock() {
            Reply::Fixed(verification) => Ok(verification),
            Reply::EchoNonce => Ok(Verification {
                valid: true,
                actual_target: Target::new(U256::from(u64::from(submission.nonce))),
            }),
            Reply::Fail => bail!("verifier unreachable"),
        }
    }
}
