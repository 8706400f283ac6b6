use super::*;

/// The last few jobs handed to miners, keyed by header hash, so shares for a
/// job that was just replaced can still be checked against it.
#[derive(Debug)]
pub(crate) struct WorkHistory {
    capacity: usize,
    entries: VecDeque<Work>,
}

impl WorkHistory {
    pub(crate) fn new(capacity: usize) -> Self {
        Self {
            capacity,
            entries: VecDeque::with_capacity(capacity + 1),
        }
    }

    /// Inserts a job, evicting the oldest insertion once over capacity. A
    /// job with a known header replaces the stored record in place.
    pub(crate) fn insert(&mut self, work: Work) {
        if let Some(existing) = self
            .entries
            .iter_mut()
            .find(|entry| entry.header_hash == work.header_hash)
        {
            *existing = work;
            return;
        }

        self.entries.push_back(work);

        while self.entries.len() > self.capacity {
            self.entries.pop_front();
        }
    }

    pub(crate) fn get(&self, header_hash: &Hash) -> Option<Work> {
        self.entries
            .iter()
            .find(|entry| entry.header_hash == *header_hash)
            .copied()
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }
}

impl Default for WorkHistory {
    fn default() -> Self {
        Self::new(WORK_HISTORY_SIZE)
    }
}
