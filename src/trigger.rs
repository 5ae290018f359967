// Poweroff trigger: timeout gating plus the external spin-down actions

use crate::device::DeviceId;
use crate::power::{PowerControl, SleepStatus};
use crate::state::{Phase, StateTable};
use std::time::{Duration, Instant};

/// Evaluates every known device and spins down those that have sat in IDLE
/// or POWEROFF for at least `timeout`.
///
/// A device already marked POWEROFF is re-checked every qualifying cycle:
/// querying or commanding some drives bumps their counters, which flips them
/// back to ACTIVE on the next classification, and the daemon has to re-settle
/// them rather than trust a one-shot poweroff.
pub fn run(states: &mut StateTable, power: &dyn PowerControl, timeout: Duration, now: Instant) {
    let due: Vec<DeviceId> = states
        .iter()
        .filter(|(_, s)| matches!(s.phase, Phase::Idle | Phase::Poweroff))
        .filter(|(_, s)| now.duration_since(s.since) >= timeout)
        .map(|(d, _)| d.clone())
        .collect();

    for device in due {
        // The drive may have been woken since the last cycle; re-check the
        // real sleep state before commanding anything.
        if power.query_asleep(&device) != SleepStatus::Asleep
            && let Err(e) = power.spin_down(&device)
        {
            tracing::warn!(
                device = %device,
                error = %e,
                operation = "spin_down",
                "Spin-down command failed"
            );
        }
        states.mark_poweroff(&device);
    }
}
