//! Output partitioner: balanced contiguous shards.

use crate::error::{HarnessError, Result};

/// Split `items` into `shard_count` contiguous slices.
///
/// The first `len % shard_count` shards get one extra element, so sizes differ
/// by at most one. Order is preserved and nothing is dropped or duplicated;
/// with fewer items than shards the trailing shards are empty.
pub fn partition<T>(items: &[T], shard_count: usize) -> Result<Vec<&[T]>> {
    if shard_count == 0 {
        return Err(HarnessError::InvalidConfig(
            "shard_count must be positive".into(),
        ));
    }

    let base = items.len() / shard_count;
    let extra = items.len() % shard_count;

    let mut shards = Vec::with_capacity(shard_count);
    let mut start = 0;
    for i in 0..shard_count {
        let len = base + usize::from(i < extra);
        shards.push(&items[start..start + len]);
        start += len;
    }
    Ok(shards)
}
