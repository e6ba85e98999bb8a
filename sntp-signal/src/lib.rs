//! SNTP (RFC 4330) / NTP (RFC 5905) client core: wire codec, clustered
//! query engine, and clock-offset calculation, with every I/O boundary
//! (socket, DNS, wall clock, monotonic ticks, randomness) expressed as a
//! trait so the core builds under `no_std` and plugs into any executor.
//!
//! Concrete `std`-backed implementations of those traits live in the
//! sibling `sntp-signal-std` crate.
#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

mod addr;
mod calc;
mod cluster;
mod config;
mod duration64;
mod error;
mod header;
mod instant;
mod log;
mod query;
mod result;
mod timestamp;
mod wire;

pub use addr::{IpAddr, SocketAddr};
pub use calc::{perform_ntp_calculations, TimeSignal};
pub use cluster::{execute_cluster_query, Resolver};
pub use config::SntpClientConfig;
pub use duration64::Duration64;
pub use error::{ClusterError, FailureKind, KissCode, ReadError};
pub use header::{NtpHeader, NtpHeaderBuilder, POLL_RANGE_LENIENT, POLL_RANGE_STRICT};
pub use instant::{Duration, Instant};
pub use query::{
    query_once, ClockPrecision, InstantSource, NetworkOperationResult, NtpUdpSocket, Random,
    RecvError, SuccessResult, Ticker,
};
pub use result::{DebugInfo, SntpQueryResult};
pub use timestamp::Timestamp64;

/// Queries `host` for the current time, trying every address it resolves
/// to until one answers or the configured budget runs out (spec.md §4.6,
/// §6.3). This is the one call most embedders need; [`execute_cluster_query`]
/// is the same operation under its full name, for callers that prefer to
/// import the module path directly.
#[allow(clippy::too_many_arguments)]
pub async fn execute_query<S, T, I, R, Res>(
    config: &SntpClientConfig,
    host: &str,
    socket: &mut S,
    ticker: &mut T,
    instant_source: &mut I,
    random: &mut R,
    resolver: &mut Res,
    time_allowed: Option<Duration>,
) -> SntpQueryResult<T::Ticks>
where
    S: NtpUdpSocket,
    T: Ticker,
    I: InstantSource,
    R: Random,
    Res: Resolver,
{
    execute_cluster_query(
        config,
        host,
        socket,
        ticker,
        instant_source,
        random,
        resolver,
        time_allowed,
    )
    .await
}

/// A blocking entry point for embedders that do not already run an async
/// executor, built on the same `miniloop` crate the teacher project uses
/// for its own synchronous facade.
#[cfg(feature = "sync")]
pub mod sync {
    use super::{
        execute_query, InstantSource, NtpUdpSocket, Random, Resolver, SntpClientConfig,
        SntpQueryResult, Ticker,
    };

    /// Blocks the calling thread until [`execute_query`] completes.
    #[allow(clippy::too_many_arguments)]
    pub fn execute_query_blocking<S, T, I, R, Res>(
        config: &SntpClientConfig,
        host: &str,
        socket: &mut S,
        ticker: &mut T,
        instant_source: &mut I,
        random: &mut R,
        resolver: &mut Res,
        time_allowed: Option<super::Duration>,
    ) -> SntpQueryResult<T::Ticks>
    where
        S: NtpUdpSocket,
        T: Ticker,
        I: InstantSource,
        R: Random,
        Res: Resolver,
    {
        miniloop::executor::block_on(execute_query(
            config,
            host,
            socket,
            ticker,
            instant_source,
            random,
            resolver,
            time_allowed,
        ))
    }
}

/// Helpers for turning a [`TimeSignal`] into a corrected wall-clock
/// reading via `chrono`, for embedders that want a `DateTime` rather than
/// the raw offset (spec.md §4.7, "adjusted_instant").
#[cfg(feature = "utils")]
pub mod utils {
    use chrono::{DateTime, TimeZone, Utc};

    use super::Instant;

    /// Converts a corrected [`Instant`] (e.g. [`super::TimeSignal::adjusted_instant`])
    /// into a `chrono` UTC timestamp.
    ///
    /// # Panics
    ///
    /// Panics if `instant` is out of `chrono`'s representable range; this
    /// cannot happen for any instant within a few hundred years of 1970.
    #[must_use]
    pub fn adjusted_instant_to_utc(instant: Instant) -> DateTime<Utc> {
        Utc.timestamp_opt(instant.epoch_second(), instant.nano())
            .single()
            .expect("instant in chrono's representable range")
    }
}
