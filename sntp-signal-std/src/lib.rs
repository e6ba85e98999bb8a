//! `std::net`/`std::time`/`rand`-backed implementations of `sntp-signal`'s
//! collaborator traits, for embedders that are happy to depend on the
//! standard library and a blocking UDP socket.

use std::io::ErrorKind;
use std::net::{self, ToSocketAddrs, UdpSocket};
use std::time::{Instant as StdInstant, SystemTime, UNIX_EPOCH};

use rand::RngCore;
use sntp_signal::{
    ClockPrecision, Duration, FailureKind, Instant, InstantSource, IpAddr, NtpUdpSocket, Random,
    RecvError, Resolver, SocketAddr, Ticker,
};

fn to_std_addr(addr: SocketAddr) -> net::SocketAddr {
    match addr.ip {
        IpAddr::V4(o) => net::SocketAddr::V4(net::SocketAddrV4::new(o.into(), addr.port)),
        IpAddr::V6(o) => {
            net::SocketAddr::V6(net::SocketAddrV6::new(o.into(), addr.port, 0, 0))
        }
    }
}

fn from_std_addr(addr: net::SocketAddr) -> SocketAddr {
    match addr {
        net::SocketAddr::V4(v4) => SocketAddr::new(IpAddr::V4(v4.ip().octets()), v4.port()),
        net::SocketAddr::V6(v6) => SocketAddr::new(IpAddr::V6(v6.ip().octets()), v6.port()),
    }
}

/// A blocking UDP socket, wrapping [`std::net::UdpSocket`]. Each
/// [`NtpUdpSocket::recv_from`] call sets the socket's read timeout to the
/// requested duration before blocking on `recv_from`, per spec.md §4.5.
pub struct StdUdpSocket(UdpSocket);

impl StdUdpSocket {
    /// Binds a socket on `0.0.0.0:0` (or `[::]:0` — whichever the OS picks
    /// for an unspecified v4 bind), suitable for one client query.
    ///
    /// # Errors
    ///
    /// Returns the underlying `std::io::Error` if the bind fails.
    pub fn bind() -> std::io::Result<Self> {
        Ok(StdUdpSocket(UdpSocket::bind("0.0.0.0:0")?))
    }
}

impl NtpUdpSocket for StdUdpSocket {
    type Error = std::io::Error;

    async fn send_to(&mut self, buf: &[u8], addr: SocketAddr) -> Result<(), Self::Error> {
        self.0.send_to(buf, to_std_addr(addr))?;
        Ok(())
    }

    async fn recv_from(
        &mut self,
        buf: &mut [u8],
        timeout: Duration,
    ) -> Result<(usize, SocketAddr), RecvError<Self::Error>> {
        let std_timeout = std::time::Duration::new(
            timeout.seconds().max(0) as u64,
            timeout.subsec_nanos(),
        );
        self.0.set_read_timeout(Some(std_timeout)).map_err(RecvError::Other)?;

        match self.0.recv_from(buf) {
            Ok((len, from)) => Ok((len, from_std_addr(from))),
            Err(e) if matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) => {
                Err(RecvError::Timeout)
            }
            Err(e) => Err(RecvError::Other(e)),
        }
    }
}

/// Resolves a hostname with the OS stub resolver via
/// `std::net::ToSocketAddrs`.
pub struct StdResolver;

impl Resolver for StdResolver {
    type Error = std::io::Error;

    async fn resolve(&mut self, host: &str) -> Result<Vec<IpAddr>, Self::Error> {
        // Port 0 is a placeholder: only the address half of the lookup is
        // used, the real port comes from `SntpClientConfig::port`.
        let addrs = (host, 0u16).to_socket_addrs()?;
        Ok(addrs
            .map(|a| match a {
                net::SocketAddr::V4(v4) => IpAddr::V4(v4.ip().octets()),
                net::SocketAddr::V6(v6) => IpAddr::V6(v6.ip().octets()),
            })
            .collect())
    }
}

/// A monotonic tick source backed by [`std::time::Instant`].
#[derive(Debug, Default)]
pub struct MonotonicTicker;

impl Ticker for MonotonicTicker {
    type Ticks = StdInstant;

    fn now(&mut self) -> StdInstant {
        StdInstant::now()
    }

    fn duration_between(&self, start: StdInstant, end: StdInstant) -> Duration {
        let elapsed = end.saturating_duration_since(start);
        Duration::new(
            i64::try_from(elapsed.as_secs()).unwrap_or(i64::MAX),
            elapsed.subsec_nanos(),
        )
    }
}

/// A wall clock backed by [`std::time::SystemTime`], reporting nanosecond
/// precision.
#[derive(Debug, Default)]
pub struct SystemClock;

impl InstantSource for SystemClock {
    fn now(&mut self) -> Instant {
        match SystemTime::now().duration_since(UNIX_EPOCH) {
            Ok(since_epoch) => {
                Instant::new(i64::try_from(since_epoch.as_secs()).unwrap_or(i64::MAX),
                    since_epoch.subsec_nanos())
            }
            // A clock set before 1970 is a misconfigured host, not a
            // condition this crate can recover from meaningfully.
            Err(e) => {
                let before = e.duration();
                Instant::new(-i64::try_from(before.as_secs()).unwrap_or(i64::MAX), 0)
            }
        }
    }

    fn precision(&self) -> ClockPrecision {
        ClockPrecision::Nanos
    }
}

/// A cryptographically-irrelevant RNG backed by `rand`'s thread-local
/// generator, used only for [`sntp_signal::SntpClientConfig::data_minimization`].
#[derive(Debug, Default)]
pub struct OsRandom;

impl Random for OsRandom {
    fn next_u32(&mut self) -> u32 {
        rand::thread_rng().next_u32()
    }
}

/// The one failure a query against a live `StdUdpSocket` can surface that
/// the core's [`FailureKind`] does not already classify: the socket could
/// not be created at all. Embedders typically map [`StdUdpSocket::bind`]'s
/// `io::Error` to this before starting a query.
#[must_use]
pub fn socket_bind_failure() -> FailureKind {
    FailureKind::SocketCreate
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn std_addr_round_trips() {
        let original = SocketAddr::new(IpAddr::V4([127, 0, 0, 1]), 123);
        assert_eq!(from_std_addr(to_std_addr(original)), original);
    }

    #[test]
    fn ticker_duration_between_is_never_negative_for_well_ordered_ticks() {
        let mut ticker = MonotonicTicker;
        let start = ticker.now();
        let end = ticker.now();
        let d = ticker.duration_between(start, end);
        assert!(!d.is_negative());
    }
}
