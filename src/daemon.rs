// Polling daemon: read -> classify -> transition -> trigger, forever.

use crate::config::Config;
use crate::device::{self, DeviceId, DeviceSet};
use crate::diskstats::{self, Snapshot};
use crate::power::PowerControl;
use crate::state::{self, DiskState, StateTable};
use crate::trigger;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tokio::time::{MissedTickBehavior, interval};

pub const DISKSTATS_PATH: &str = "/proc/diskstats";
pub const DEV_DIR: &str = "/dev";

/// Owns everything one polling cycle touches: the tracked set, the current
/// and previous snapshots, the state table, and the power actions.
pub struct Daemon {
    polling_interval: Duration,
    timeout: Duration,
    diskstats_path: PathBuf,
    tracked: DeviceSet,
    prev: Snapshot,
    cur: Snapshot,
    states: StateTable,
    power: Box<dyn PowerControl + Send>,
}

fn join(devices: &DeviceSet) -> String {
    devices
        .iter()
        .map(DeviceId::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

impl Daemon {
    /// Builds a daemon against the real /dev and /proc/diskstats.
    pub fn new(config: &Config, power: Box<dyn PowerControl + Send>) -> anyhow::Result<Self> {
        let discovered = device::discover(Path::new(DEV_DIR))?;
        Ok(Self::with_environment(
            config,
            discovered,
            PathBuf::from(DISKSTATS_PATH),
            power,
        ))
    }

    /// Construction with an explicit environment (discovered devices, feed
    /// path), e.g. for tests.
    pub fn with_environment(
        config: &Config,
        discovered: DeviceSet,
        diskstats_path: PathBuf,
        power: Box<dyn PowerControl + Send>,
    ) -> Self {
        tracing::info!(devices = %join(&discovered), "Available devices");
        if config.devices.is_empty() {
            tracing::info!("No devices in config, tracking all available devices");
        }
        let tracked = device::tracked_set(discovered, &config.devices);
        tracing::info!(
            polling_interval_secs = config.polling_interval.as_secs(),
            timeout_secs = config.timeout.as_secs(),
            devices = %join(&tracked),
            "Tracking devices"
        );
        Self {
            polling_interval: config.polling_interval,
            timeout: config.timeout,
            diskstats_path,
            tracked,
            prev: Snapshot::new(),
            cur: Snapshot::new(),
            states: StateTable::new(),
            power,
        }
    }

    pub fn tracked(&self) -> &DeviceSet {
        &self.tracked
    }

    pub fn disk_state(&self, device: &DeviceId) -> Option<DiskState> {
        self.states.get(device).copied()
    }

    /// One polling cycle. Per-device problems never abort the rest of the
    /// cycle; only an unreadable feed skips it entirely.
    pub fn tick(&mut self, now: Instant) {
        let snapshot = match diskstats::read_snapshot(&self.diskstats_path, &self.tracked) {
            Ok(s) => s,
            Err(e) => {
                // An empty snapshot would look exactly like "no counters
                // changed" and demote every device to IDLE; skip the cycle
                // instead.
                tracing::error!(
                    error = %e,
                    operation = "read_snapshot",
                    "Counter feed unreadable, skipping cycle"
                );
                return;
            }
        };
        self.prev = std::mem::replace(&mut self.cur, snapshot);
        for device in &self.tracked {
            let activity = state::activity_observed(&self.prev, &self.cur, device);
            self.states.observe(device, activity, now);
        }
        trigger::run(&mut self.states, self.power.as_ref(), self.timeout, now);
    }

    /// Runs the polling loop until the shutdown signal fires. Each cycle runs
    /// on a blocking thread because the external power commands can take
    /// seconds while a drive changes state.
    pub async fn run(
        mut self,
        mut shutdown_rx: tokio::sync::oneshot::Receiver<()>,
    ) -> anyhow::Result<()> {
        let mut tick = interval(self.polling_interval);
        tick.set_missed_tick_behavior(MissedTickBehavior::Skip);
        loop {
            tokio::select! {
                _ = tick.tick() => {
                    self = tokio::task::spawn_blocking(move || {
                        self.tick(Instant::now());
                        self
                    })
                    .await
                    .map_err(|e| anyhow::anyhow!("daemon tick task join: {e}"))?;
                }
                _ = &mut shutdown_rx => {
                    tracing::debug!("Daemon shutting down");
                    return Ok(());
                }
            }
        }
    }
}
