/// Records are sharded across a fixed set of domains. The assignment has to be stable:
/// loading the same key twice must hit the same domain so the second write overwrites the
/// first instead of leaving two copies behind.
///
/// Synthetic test data is keyed by a sequence number, which would fill every domain's
/// buffer at the same moment and send the writes off in bursts. Running the sequence
/// number through an integer hash first staggers them.
use std::num::NonZeroU32;

#[derive(Clone, Copy, Debug)]
pub struct PartitionAssigner {
    domain_count: NonZeroU32,
}

impl PartitionAssigner {
    pub fn new(domain_count: NonZeroU32) -> Self {
        PartitionAssigner { domain_count }
    }

    pub fn domain_count(&self) -> usize {
        self.domain_count.get() as usize
    }

    /// Partition for an integer id, `abs(id) mod domain_count`.
    pub fn for_id(&self, id: i32) -> usize {
        (id.unsigned_abs() % self.domain_count.get()) as usize
    }

    /// Partition for a string key, from the CRC-32 of its UTF-8 bytes.
    pub fn for_key(&self, key: &str) -> usize {
        (crc32fast::hash(key.as_bytes()) % self.domain_count.get()) as usize
    }
}

/// Thomas Wang's 32-bit integer hash.
pub fn avalanche(input: u32) -> u32 {
    let mut key = (!input).wrapping_add(input << 15);
    key ^= key >> 12;
    key = key.wrapping_add(key << 2);
    key ^= key >> 4;
    key = key.wrapping_mul(2057);
    key ^= key >> 16;
    key
}

/// Names of the domains a run writes to.
#[derive(Clone, Debug)]
pub struct Domains {
    prefix: String,
    count: NonZeroU32,
}

impl Domains {
    pub fn new(prefix: impl Into<String>, count: NonZeroU32) -> Self {
        Domains {
            prefix: prefix.into(),
            count,
        }
    }

    pub fn count(&self) -> usize {
        self.count.get() as usize
    }

    pub fn name(&self, index: usize) -> String {
        format!("{}{:02}", self.prefix, index)
    }

    pub fn names(&self) -> impl Iterator<Item = String> + '_ {
        (0..self.count()).map(|index| self.name(index))
    }
}
