//! Wall-clock `Instant` and signed `Duration` value types used at the
//! library boundary. These are defined by the core so that collaborators
//! (§6.1) can hand back plain values rather than depend on `std::time`,
//! keeping the crate usable under `no_std`.

use core::cmp::Ordering;
use core::ops::{Add, Sub};

/// A signed Unix-epoch instant: `epoch_second` seconds plus `nano`
/// nanoseconds (always `0 <= nano < 1_000_000_000`) since
/// 1970-01-01T00:00:00Z.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct Instant {
    epoch_second: i64,
    nano: u32,
}

impl Instant {
    /// Builds an instant, normalizing `nano` into `[0, 1_000_000_000)` by
    /// borrowing/carrying whole seconds.
    #[must_use]
    pub fn new(epoch_second: i64, nano: u32) -> Self {
        let carry = i64::from(nano) / 1_000_000_000;
        let nano = nano % 1_000_000_000;
        Instant { epoch_second: epoch_second + carry, nano }
    }

    #[must_use]
    pub const fn epoch_second(&self) -> i64 {
        self.epoch_second
    }

    #[must_use]
    pub const fn nano(&self) -> u32 {
        self.nano
    }

    /// Elapsed duration from `earlier` to `later` (negative if `later` is
    /// actually before `earlier`).
    #[must_use]
    pub fn between(earlier: Instant, later: Instant) -> Duration {
        let mut seconds = later.epoch_second - earlier.epoch_second;
        let mut nanos = i64::from(later.nano) - i64::from(earlier.nano);
        if nanos < 0 {
            nanos += 1_000_000_000;
            seconds -= 1;
        }
        Duration::new(seconds, u32::try_from(nanos).expect("normalized to [0, 1e9)"))
    }
}

impl Add<Duration> for Instant {
    type Output = Instant;

    fn add(self, rhs: Duration) -> Instant {
        let mut seconds = self.epoch_second + rhs.seconds;
        let mut nanos = i64::from(self.nano) + i64::from(rhs.nanos) * rhs.sign();

        if nanos < 0 {
            nanos += 1_000_000_000;
            seconds -= 1;
        } else if nanos >= 1_000_000_000 {
            nanos -= 1_000_000_000;
            seconds += 1;
        }

        Instant::new(seconds, u32::try_from(nanos).expect("normalized to [0, 1e9)"))
    }
}

impl Ord for Instant {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.epoch_second, self.nano).cmp(&(other.epoch_second, other.nano))
    }
}

impl PartialOrd for Instant {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// A signed duration: `seconds` whole seconds plus `nanos` nanoseconds of
/// additional magnitude, with `0 <= nanos < 1_000_000_000`. The sign of the
/// duration lives entirely in `seconds` (for a negative sub-second-only
/// duration, `seconds` is `-1` and `nanos` holds the 1s-complement
/// remainder, matching how [`Instant::between`] and [`Instant::add`]
/// produce values) — use [`Duration::is_negative`]/[`Duration::signum`]
/// rather than inspecting the fields directly.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct Duration {
    seconds: i64,
    nanos: u32,
}

impl Duration {
    pub const ZERO: Duration = Duration { seconds: 0, nanos: 0 };

    #[must_use]
    pub fn new(seconds: i64, nanos: u32) -> Self {
        debug_assert!(nanos < 1_000_000_000);
        Duration { seconds, nanos }
    }

    /// Builds a duration from a (possibly negative) total nanosecond count.
    #[must_use]
    pub fn from_nanos(total_nanos: i128) -> Self {
        let seconds = total_nanos.div_euclid(1_000_000_000);
        let nanos = total_nanos.rem_euclid(1_000_000_000);
        Duration {
            seconds: i64::try_from(seconds).expect("duration fits in i64 seconds"),
            nanos: u32::try_from(nanos).expect("reduced mod 1e9"),
        }
    }

    #[must_use]
    pub const fn seconds(&self) -> i64 {
        self.seconds
    }

    #[must_use]
    pub const fn subsec_nanos(&self) -> u32 {
        self.nanos
    }

    #[must_use]
    pub fn is_negative(&self) -> bool {
        self.total_nanos() < 0
    }

    #[must_use]
    pub fn total_nanos(&self) -> i128 {
        i128::from(self.seconds) * 1_000_000_000 + i128::from(self.nanos)
    }

    fn sign(self) -> i64 {
        if self.is_negative() {
            -1
        } else {
            1
        }
    }

    /// Truncating (toward zero) integer division by a scalar.
    #[must_use]
    pub fn checked_div(&self, rhs: i64) -> Option<Duration> {
        if rhs == 0 {
            return None;
        }
        Some(Duration::from_nanos(self.total_nanos() / i128::from(rhs)))
    }
}

impl Add for Duration {
    type Output = Duration;

    fn add(self, rhs: Duration) -> Duration {
        Duration::from_nanos(self.total_nanos() + rhs.total_nanos())
    }
}

impl Sub for Duration {
    type Output = Duration;

    fn sub(self, rhs: Duration) -> Duration {
        Duration::from_nanos(self.total_nanos() - rhs.total_nanos())
    }
}

impl Ord for Duration {
    fn cmp(&self, other: &Self) -> Ordering {
        self.total_nanos().cmp(&other.total_nanos())
    }
}

impl PartialOrd for Duration {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn between_is_symmetric_around_zero() {
        let a = Instant::new(100, 500_000_000);
        let b = Instant::new(101, 200_000_000);
        let fwd = Instant::between(a, b);
        let back = Instant::between(b, a);
        assert_eq!(fwd.total_nanos(), -back.total_nanos());
    }

    #[test]
    fn add_duration_normalizes() {
        let a = Instant::new(0, 900_000_000);
        let d = Duration::new(0, 200_000_000);
        let b = a + d;
        assert_eq!(b.epoch_second(), 1);
        assert_eq!(b.nano(), 100_000_000);
    }

    #[test]
    fn checked_div_truncates_toward_zero() {
        let d = Duration::new(-1, 0); // -1s exactly
        let half = d.checked_div(2).unwrap();
        assert_eq!(half.total_nanos(), -500_000_000);

        let seven_ns = Duration::from_nanos(-7);
        let third = seven_ns.checked_div(3).unwrap();
        assert_eq!(third.total_nanos(), -2);
    }
}
