// Activity classifier and per-disk state machine

use crate::device::DeviceId;
use crate::diskstats::Snapshot;
use std::collections::HashMap;
use std::fmt;
use std::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Active,
    Idle,
    Poweroff,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Phase::Active => "ACTIVE",
            Phase::Idle => "IDLE",
            Phase::Poweroff => "POWEROFF",
        })
    }
}

#[derive(Debug, Clone, Copy)]
pub struct DiskState {
    pub phase: Phase,
    /// Time of the last phase transition, not of the last poll.
    pub since: Instant,
}

/// Classifier signal: `false` only when the device is present in both
/// snapshots with byte-equal counters. Everything else (newly appeared,
/// dropped out of the feed, counters changed) counts as activity, so a
/// missing reading can never be mistaken for idleness.
pub fn activity_observed(prev: &Snapshot, cur: &Snapshot, device: &DeviceId) -> bool {
    match (prev.get(device), cur.get(device)) {
        (Some(p), Some(c)) => p != c,
        _ => true,
    }
}

/// Per-device states, created lazily on first classification and kept for
/// the life of the process.
#[derive(Debug, Default)]
pub struct StateTable {
    entries: HashMap<DeviceId, DiskState>,
}

impl StateTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, device: &DeviceId) -> Option<&DiskState> {
        self.entries.get(device)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&DeviceId, &DiskState)> {
        self.entries.iter()
    }

    /// Applies one classifier signal. Activity returns the device to ACTIVE
    /// from any phase and resets `since`; a no-change signal moves ACTIVE to
    /// IDLE once and otherwise leaves the entry untouched. Never produces
    /// POWEROFF: that phase is written only by the poweroff trigger.
    pub fn observe(&mut self, device: &DeviceId, activity: bool, now: Instant) {
        match self.entries.get_mut(device) {
            None => {
                let phase = if activity { Phase::Active } else { Phase::Idle };
                self.entries
                    .insert(device.clone(), DiskState { phase, since: now });
                tracing::info!(device = %device, phase = %phase, "Disk state changed");
            }
            Some(state) => {
                let next = match (activity, state.phase) {
                    (true, Phase::Active) => None,
                    (true, _) => Some(Phase::Active),
                    (false, Phase::Active) => Some(Phase::Idle),
                    (false, _) => None,
                };
                if let Some(phase) = next {
                    *state = DiskState { phase, since: now };
                    tracing::info!(device = %device, phase = %phase, "Disk state changed");
                }
            }
        }
    }

    /// Records a poweroff action outcome. `since` is deliberately left
    /// untouched: it keeps measuring time since the last observed activity,
    /// so repeated POWEROFF re-affirmations never restart the idle clock.
    pub fn mark_poweroff(&mut self, device: &DeviceId) {
        if let Some(state) = self.entries.get_mut(device)
            && state.phase != Phase::Poweroff
        {
            state.phase = Phase::Poweroff;
            tracing::info!(device = %device, phase = %Phase::Poweroff, "Disk state changed");
        }
    }
}
