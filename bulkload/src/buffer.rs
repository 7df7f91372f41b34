use crate::record::Record;

/// Pending records for every domain, indexed by partition.
///
/// Owned by the task driving the load; not shared.
#[derive(Debug)]
pub struct BatchBuffers {
    pending: Vec<Vec<Record>>,
    batch_count: usize,
}

impl BatchBuffers {
    pub fn new(domain_count: usize, batch_count: usize) -> Self {
        BatchBuffers {
            pending: (0..domain_count).map(|_| Vec::with_capacity(batch_count + 1)).collect(),
            batch_count,
        }
    }

    pub fn append(&mut self, partition: usize, record: Record) {
        self.pending[partition].push(record);
    }

    /// True once a buffer holds more than `batch_count` records.
    pub fn should_flush(&self, partition: usize) -> bool {
        self.pending[partition].len() > self.batch_count
    }

    /// Hands back everything pending for `partition` and leaves an empty buffer behind.
    pub fn take_and_reset(&mut self, partition: usize) -> Vec<Record> {
        let fresh = Vec::with_capacity(self.batch_count + 1);
        std::mem::replace(&mut self.pending[partition], fresh)
    }

    pub fn len(&self, partition: usize) -> usize {
        self.pending[partition].len()
    }

    /// Partitions with at least one pending record, in index order.
    pub fn non_empty(&self) -> Vec<usize> {
        self.pending
            .iter()
            .enumerate()
            .filter(|(_, records)| !records.is_empty())
            .map(|(partition, _)| partition)
            .collect()
    }
}
