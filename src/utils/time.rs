//! Simulated time helpers.
//!
//! Simulated time is a plain [`Duration`] since the start of the run. Periodic
//! instants are computed as `k * period` rather than by repeated addition so
//! that long runs do not drift.

use serde::Serializer;
use std::time::Duration;

/// Time since the start of the simulation
pub type SimTime = Duration;

/// Number of whole periods that fit into `total`
pub fn whole_periods(total: Duration, period: Duration) -> u64 {
    if period.is_zero() {
        return 0;
    }
    (total.as_nanos() / period.as_nanos()) as u64
}

/// Instants `0, period, 2 * period, ...` strictly before `stop`
pub fn periodic_instants(period: Duration, stop: SimTime) -> impl Iterator<Item = SimTime> {
    let nanos = period.as_nanos();
    let count = if nanos == 0 {
        0
    } else {
        stop.as_nanos().div_ceil(nanos)
    };
    (0..count).map(move |k| nanos_to_duration(k * nanos))
}

/// `period * k` without going through floating point
pub fn nth_period(period: Duration, k: u64) -> SimTime {
    nanos_to_duration(period.as_nanos() * u128::from(k))
}

fn nanos_to_duration(nanos: u128) -> Duration {
    const NANOS_PER_SEC: u128 = 1_000_000_000;
    Duration::new((nanos / NANOS_PER_SEC) as u64, (nanos % NANOS_PER_SEC) as u32)
}

/// Serialize a simulated time as fractional seconds
pub fn serialize_secs<S: Serializer>(time: &SimTime, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_f64(time.as_secs_f64())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_whole_periods() {
        assert_eq!(whole_periods(Duration::from_secs(120), Duration::from_millis(100)), 1200);
        assert_eq!(whole_periods(Duration::from_millis(250), Duration::from_millis(100)), 2);
        assert_eq!(whole_periods(Duration::from_secs(1), Duration::ZERO), 0);
    }

    #[test]
    fn test_periodic_instants() {
        let instants: Vec<SimTime> =
            periodic_instants(Duration::from_millis(200), Duration::from_secs(1)).collect();
        assert_eq!(instants.len(), 5);
        assert_eq!(instants[0], Duration::ZERO);
        assert_eq!(instants[4], Duration::from_millis(800));

        // A stop that is not a multiple still includes the last instant before it
        let instants: Vec<SimTime> =
            periodic_instants(Duration::from_millis(200), Duration::from_millis(1100)).collect();
        assert_eq!(instants.len(), 6);
        assert_eq!(instants[5], Duration::from_secs(1));

        assert_eq!(periodic_instants(Duration::ZERO, Duration::from_secs(1)).count(), 0);
    }

    #[test]
    fn test_nth_period_does_not_drift() {
        let period = Duration::from_millis(100);
        assert_eq!(nth_period(period, 1199), Duration::from_millis(119_900));
        assert_eq!(nth_period(period, 0), Duration::ZERO);
    }
}
