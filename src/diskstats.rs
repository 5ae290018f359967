// Counter snapshots from the kernel's per-device I/O accounting feed

use crate::device::{DeviceId, DeviceSet};
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;

/// Cumulative sector counters for one device, kept as the kernel's decimal
/// text. Only equality (changed vs. unchanged) matters, so the values are
/// never parsed to integers; wrapping 64-bit counters compare fine as text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CounterPair {
    pub sectors_read: String,
    pub sectors_written: String,
}

/// One cycle's counters for every tracked device present in the feed.
/// A device absent from the feed is simply absent from the snapshot.
pub type Snapshot = HashMap<DeviceId, CounterPair>;

/// Reading the counter feed failed outright. Kept distinct from a device
/// being absent from the feed: a failed read must never be mistaken for
/// "no counters changed".
#[derive(Debug, Error)]
#[error("cannot read {path}: {source}")]
pub struct FeedError {
    pub path: String,
    #[source]
    pub source: std::io::Error,
}

/// Parses one feed line:
///
/// ```text
/// 8       0 sda 19912 11150 4603573 10996 76961 88315 4666256 72070 ...
/// ==  ===================================
///  1  major number
///  2  minor number
///  3  device name
///  6  sectors read
/// 10  sectors written
/// ==  ===================================
/// ```
///
/// Lines with fewer than ten fields yield `None`; most feed lines describe
/// untracked devices or partitions, so skipping is the normal case.
pub fn parse_line(line: &str) -> Option<(DeviceId, CounterPair)> {
    let mut fields = line.split_whitespace();
    let device = fields.nth(2)?;
    let sectors_read = fields.nth(2)?;
    let sectors_written = fields.nth(3)?;
    Some((
        DeviceId::normalize(device),
        CounterPair {
            sectors_read: sectors_read.to_string(),
            sectors_written: sectors_written.to_string(),
        },
    ))
}

/// Builds a snapshot from the full feed contents, keeping only tracked
/// devices. Malformed lines are skipped, never escalated.
pub fn build_snapshot(contents: &str, tracked: &DeviceSet) -> Snapshot {
    let mut snapshot = Snapshot::new();
    for line in contents.lines() {
        if let Some((device, counters)) = parse_line(line)
            && tracked.contains(&device)
        {
            snapshot.insert(device, counters);
        }
    }
    snapshot
}

/// Reads the feed in full and builds the cycle's snapshot.
pub fn read_snapshot(path: &Path, tracked: &DeviceSet) -> Result<Snapshot, FeedError> {
    let contents = std::fs::read_to_string(path).map_err(|source| FeedError {
        path: path.display().to_string(),
        source,
    })?;
    Ok(build_snapshot(&contents, tracked))
}
