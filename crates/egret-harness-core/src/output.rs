//! Shard and summary writers.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::partition::partition;
use crate::record::PatternRecord;
use crate::summary::BatchSummary;

/// Default shard file stem: shards are named `<prefix>_<i>.json`.
pub const DEFAULT_SHARD_PREFIX: &str = "output";

pub const SUMMARY_FILE_NAME: &str = "summary.json";

pub fn shard_path(dir: &Path, prefix: &str, index: usize) -> PathBuf {
    dir.join(format!("{prefix}_{index}.json"))
}

/// Partition `records` and write each shard as a JSON array.
///
/// Every shard file is written, including empty ones, so a run always leaves
/// `shard_count` files behind. Returns the paths in shard order.
pub fn write_shards(
    dir: &Path,
    prefix: &str,
    records: &[PatternRecord],
    shard_count: usize,
) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(dir).with_context(|| format!("create {:?}", dir))?;

    let shards = partition(records, shard_count)?;
    let mut paths = Vec::with_capacity(shards.len());
    for (index, shard) in shards.into_iter().enumerate() {
        let path = shard_path(dir, prefix, index);
        let content = serde_json::to_string(shard).context("serialize shard")?;
        std::fs::write(&path, content).with_context(|| format!("write {:?}", path))?;
        paths.push(path);
    }
    Ok(paths)
}

/// Write summary.json in pretty JSON format.
pub fn write_summary(path: &Path, summary: &BatchSummary) -> Result<()> {
    let content = serde_json::to_string_pretty(summary).context("serialize summary")?;
    std::fs::write(path, content).with_context(|| format!("write {:?}", path))?;
    Ok(())
}
