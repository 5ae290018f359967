// Device identity, /dev discovery, tracked-device set

use std::collections::BTreeSet;
use std::fmt;
use std::path::Path;

/// Normalized block-device name (`sda`, `dm-0`).
///
/// Normalization happens once, at every ingestion point (config, discovery,
/// kernel feed), so comparisons elsewhere are plain equality.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DeviceId(String);

impl DeviceId {
    /// Normalizes a raw device reference: trims, lowercases, and keeps only
    /// the last path component (`/dev/SDA ` becomes `sda`).
    pub fn normalize(raw: &str) -> Self {
        let lowered = raw.trim().to_ascii_lowercase();
        let name = lowered.rsplit('/').next().unwrap_or(&lowered);
        Self(name.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Set of devices the daemon is allowed to touch. Computed once at startup
/// and fixed for the life of the process.
pub type DeviceSet = BTreeSet<DeviceId>;

/// Whether a normalized name is a whole-disk candidate: `sd[a-z]`, `hd[a-z]`,
/// or `dm-<digits>`. Partitions (`sda1`) and other nodes never match.
pub fn is_disk_name(name: &str) -> bool {
    if let Some(rest) = name.strip_prefix("dm-") {
        return !rest.is_empty() && rest.bytes().all(|b| b.is_ascii_digit());
    }
    let b = name.as_bytes();
    b.len() == 3 && (b[0] == b's' || b[0] == b'h') && b[1] == b'd' && b[2].is_ascii_lowercase()
}

/// Lists whole-disk candidates under a device directory (normally `/dev`).
pub fn discover(dev_dir: &Path) -> anyhow::Result<DeviceSet> {
    let mut found = DeviceSet::new();
    for entry in std::fs::read_dir(dev_dir)? {
        let entry = entry?;
        let device = DeviceId::normalize(&entry.file_name().to_string_lossy());
        if is_disk_name(device.as_str()) {
            found.insert(device);
        }
    }
    Ok(found)
}

/// Intersects discovered devices with the configured list. An empty
/// configured list means "track every discovered device".
pub fn tracked_set(discovered: DeviceSet, configured: &[DeviceId]) -> DeviceSet {
    if configured.is_empty() {
        return discovered;
    }
    discovered
        .into_iter()
        .filter(|d| configured.contains(d))
        .collect()
}
