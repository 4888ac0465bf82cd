//! Cooperative driver loop.
//!
//! Sleeps until the hub's ticker is due, then runs one tick to completion.
//! A tick that overruns its interval defers the next one; ticks never overlap.

use std::sync::atomic::{AtomicBool, Ordering};

use cm_core::{Clock, ServiceBus, StateReader};
use tracing::debug;

use crate::hub::{Hub, TickContext};

/// When to stop driving.
#[derive(Debug, Default, Clone, Copy)]
pub struct RunLimits<'a> {
    /// Stop after this many ticks.
    pub max_ticks: Option<u64>,
    /// Checked between ticks.
    pub stop: Option<&'a AtomicBool>,
}

impl RunLimits<'_> {
    fn should_stop(&self, ticks: u64) -> bool {
        self.max_ticks.is_some_and(|max| ticks >= max)
            || self.stop.is_some_and(|flag| flag.load(Ordering::Relaxed))
    }
}

/// Drive an initialized hub until a limit is hit or the hub is destroyed.
///
/// `on_tick` sees the hub after every completed tick. Returns the number of
/// ticks run.
pub fn run<C, F>(
    hub: &mut Hub,
    states: &dyn StateReader,
    services: &mut dyn ServiceBus,
    clock: &C,
    limits: RunLimits<'_>,
    mut on_tick: F,
) -> u64
where
    C: Clock + ?Sized,
    F: FnMut(u64, &Hub),
{
    let mut ticks = 0;
    while !limits.should_stop(ticks) {
        let now = clock.now();
        let Some(wait) = hub.time_until_tick(now) else {
            debug!("hub not running, driver exiting");
            break;
        };
        if !wait.is_zero() {
            clock.sleep(wait);
            continue;
        }

        let ran = hub.poll(TickContext {
            states,
            services: &mut *services,
            now,
        });
        if ran {
            ticks += 1;
            on_tick(ticks, hub);
        }
    }
    ticks
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::{MemoryServices, MemoryStates};
    use cm_core::{ManualClock, NullDisplay};
    use cm_project::HubConfig;
    use std::time::{Duration, Instant};

    fn hub() -> Hub {
        let config: HubConfig = cm_project::config_from_yaml_str("name: Test Hub\n").unwrap();
        Hub::from_config(&config, &mut NullDisplay).unwrap()
    }

    #[test]
    fn runs_requested_ticks_on_simulated_clock() {
        let t0 = Instant::now();
        let clock = ManualClock::new(t0);
        let mut hub = hub();
        hub.initialize(clock.now());

        let states = MemoryStates::default();
        let mut services = MemoryServices::default();
        let mut seen = Vec::new();
        let ticks = run(
            &mut hub,
            &states,
            &mut services,
            &clock,
            RunLimits {
                max_ticks: Some(3),
                stop: None,
            },
            |n, _| seen.push(n),
        );

        assert_eq!(ticks, 3);
        assert_eq!(seen, vec![1, 2, 3]);
        assert_eq!(clock.now(), t0 + Duration::from_secs(3));
    }

    #[test]
    fn stopped_hub_ends_the_loop() {
        let clock = ManualClock::new(Instant::now());
        let mut hub = hub();
        let states = MemoryStates::default();
        let mut services = MemoryServices::default();

        let ticks = run(
            &mut hub,
            &states,
            &mut services,
            &clock,
            RunLimits::default(),
            |_, _| {},
        );
        assert_eq!(ticks, 0);
    }

    #[test]
    fn stop_flag_is_honoured_between_ticks() {
        let clock = ManualClock::new(Instant::now());
        let mut hub = hub();
        hub.initialize(clock.now());
        let states = MemoryStates::default();
        let mut services = MemoryServices::default();
        let stop = AtomicBool::new(false);

        let ticks = run(
            &mut hub,
            &states,
            &mut services,
            &clock,
            RunLimits {
                max_ticks: Some(100),
                stop: Some(&stop),
            },
            |n, _| {
                if n == 2 {
                    stop.store(true, Ordering::Relaxed);
                }
            },
        );
        assert_eq!(ticks, 2);
    }
}
