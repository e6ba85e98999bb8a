//! The traits an embedder plugs in (spec.md §6.1 "external collaborators")
//! and the single-address query operation (spec.md §4.5) built on them.
//!
//! None of these traits name a platform type: [`crate::addr::SocketAddr`]
//! replaces `std::net::SocketAddr`, [`Instant`] replaces `std::time::*`.
//! Socket and resolver operations are `async fn`s in the trait itself
//! (stable since 1.75, no `async-trait` macro needed) so the same trait
//! works whether the embedder drives it with tokio, embassy, or the
//! blocking [`crate::sync`] wrapper.

use crate::addr::SocketAddr;
use crate::config::SntpClientConfig;
use crate::error::FailureKind;
use crate::header::{NtpHeader, NtpHeaderBuilder};
use crate::instant::{Duration, Instant};
use crate::timestamp::Timestamp64;

/// A free-running monotonic tick source, used only to measure elapsed time
/// between sending a request and receiving its response — never fed into
/// the wire protocol itself (spec.md §4.5/§4.7).
pub trait Ticker {
    type Ticks: Copy;

    fn now(&mut self) -> Self::Ticks;

    /// `end - start`, always non-negative for a well-behaved monotonic
    /// source.
    fn duration_between(&self, start: Self::Ticks, end: Self::Ticks) -> Duration;
}

/// Which precision a wall-clock source claims, reported in the NTP header's
/// `precision` field (spec.md §4.4).
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum ClockPrecision {
    Millis,
    Nanos,
}

impl ClockPrecision {
    /// The `log2` exponent this precision corresponds to, for the header's
    /// `precision` field.
    #[must_use]
    pub fn exponent(self) -> i8 {
        match self {
            ClockPrecision::Millis => -10,
            ClockPrecision::Nanos => -30,
        }
    }
}

/// A source of wall-clock [`Instant`]s, used both to stamp the outgoing
/// request's transmit timestamp and to read the client's own receive time.
pub trait InstantSource {
    fn now(&mut self) -> Instant;
    fn precision(&self) -> ClockPrecision;
}

/// A source of random bits, used only for the data-minimization sub-
/// millisecond randomization of outgoing timestamps (spec.md §4.4, §9) —
/// never for anything security-sensitive.
pub trait Random {
    fn next_u32(&mut self) -> u32;
}

/// Why a `recv_from` call did not produce a datagram.
#[derive(Debug)]
pub enum RecvError<E> {
    /// The per-attempt `response_timeout` elapsed with nothing received.
    Timeout,
    /// Some other I/O failure.
    Other(E),
}

/// The UDP transport an embedder provides. `async fn`s in trait position:
/// no executor is assumed, and [`crate::sync`] supplies a blocking caller
/// for embedders that want one.
pub trait NtpUdpSocket {
    type Error;

    async fn send_to(&mut self, buf: &[u8], addr: SocketAddr) -> Result<(), Self::Error>;

    /// Waits up to `timeout` for a datagram. Implementations are expected
    /// to race the receive against the timeout themselves (spec.md §4.5) —
    /// this crate never assumes a settable socket-level timeout option
    /// exists on every platform.
    async fn recv_from(
        &mut self,
        buf: &mut [u8],
        timeout: Duration,
    ) -> Result<(usize, SocketAddr), RecvError<Self::Error>>;
}

/// Everything learned from one successful exchange with one address.
#[derive(Debug, Clone)]
pub struct SuccessResult<Ticks> {
    pub header: NtpHeader,
    pub server_addr: SocketAddr,
    pub request_instant: Instant,
    pub request_ticks: Ticks,
    pub response_ticks: Ticks,
}

/// The outcome of one [`query_once`] call against one resolved address
/// (spec.md §3.1 `NetworkOperationResult`, kind ∈ {Success, Failure,
/// TimeAllowedExceeded}).
#[derive(Debug, Clone)]
pub enum NetworkOperationResult<Ticks> {
    Success(SuccessResult<Ticks>),
    Failure(FailureKind),
    /// The overall `time_allowed` budget, not the per-attempt
    /// `response_timeout`, was the dominant deadline and it fired while
    /// waiting for this address's response (spec.md §4.5 step 2/8).
    TimeAllowedExceeded,
}

const MODE_CLIENT: u8 = 3;
const MODE_SERVER: u8 = 4;

/// Sends one request to `server_addr` and validates the single response it
/// receives, per spec.md §4.5. Always closes over the socket it is given —
/// callers own the socket's lifetime and nothing here leaks it past return.
///
/// `time_allowed_remaining` is the overall cluster budget left before this
/// attempt starts (spec.md §4.6 step 3a). The receive is bounded by
/// `min(config.response_timeout, time_allowed_remaining)`; if that minimum
/// is the remaining budget and it is what fires, the attempt is reported
/// as [`NetworkOperationResult::TimeAllowedExceeded`] rather than a plain
/// per-attempt timeout, so the cluster loop can short-circuit instead of
/// trying the next address (spec.md §4.5 step 8, §5 "two granularities").
#[allow(clippy::too_many_arguments)]
pub async fn query_once<S, T, I, R>(
    config: &SntpClientConfig,
    socket: &mut S,
    server_addr: SocketAddr,
    ticker: &mut T,
    instant_source: &mut I,
    random: &mut R,
    time_allowed_remaining: Duration,
) -> NetworkOperationResult<T::Ticks>
where
    S: NtpUdpSocket,
    T: Ticker,
    I: InstantSource,
    R: Random,
{
    let time_allowed_dominates = time_allowed_remaining < config.response_timeout;
    let recv_timeout = if time_allowed_dominates {
        time_allowed_remaining
    } else {
        config.response_timeout
    };
    let request_instant = instant_source.now();
    let transmit_timestamp = if config.data_minimization {
        // No wall-clock information at all — a fully random nonce (spec.md
        // §4.7, §9: this is the default precisely so requests can't be
        // fingerprinted by the client's real clock value).
        Timestamp64::from_components(random.next_u32(), random.next_u32())
    } else {
        let ts = match Timestamp64::from_instant(request_instant) {
            Ok(ts) => ts,
            Err(_) => return NetworkOperationResult::Failure(FailureKind::SocketSend),
        };
        if instant_source.precision() == ClockPrecision::Millis {
            ts.randomize_sub_millis(&mut || random.next_u32())
        } else {
            ts
        }
    };

    let mut builder = NtpHeaderBuilder::new();
    builder.leap(0).expect("0 is in range");
    // The wire field is 3 bits; mask rather than panic if a caller's
    // config carries an out-of-range version number.
    builder.version(config.version & 0b0111).expect("masked to [0, 7]");
    builder.mode(MODE_CLIENT).expect("3 is in range");
    builder.precision(instant_source.precision().exponent()).expect("negative exponent");
    builder.transmit_timestamp(transmit_timestamp);
    let request = builder.build();

    let request_ticks = ticker.now();

    if socket.send_to(&request.to_bytes(), server_addr).await.is_err() {
        return NetworkOperationResult::Failure(FailureKind::SocketSend);
    }

    let mut buf = [0u8; 48];
    let (len, from) = match socket.recv_from(&mut buf, recv_timeout).await {
        Ok(ok) => ok,
        Err(RecvError::Timeout) if time_allowed_dominates => {
            return NetworkOperationResult::TimeAllowedExceeded
        }
        Err(RecvError::Timeout) => {
            return NetworkOperationResult::Failure(FailureKind::SocketReceiveTimeout)
        }
        Err(RecvError::Other(_)) => {
            return NetworkOperationResult::Failure(FailureKind::SocketReceive)
        }
    };
    let response_ticks = ticker.now();

    if len != buf.len() {
        return NetworkOperationResult::Failure(FailureKind::SocketReceive);
    }
    if from != server_addr {
        return NetworkOperationResult::Failure(FailureKind::UnexpectedOrigin);
    }

    let header = NtpHeader::from_bytes(buf);

    if header.originate_timestamp() != transmit_timestamp {
        return NetworkOperationResult::Failure(FailureKind::MismatchedOriginateTimestamp);
    }
    if header.mode() != MODE_SERVER {
        return NetworkOperationResult::Failure(FailureKind::BadServerMode);
    }
    if header.stratum() == 0 {
        let code = header.reference_identifier_bytes();
        return NetworkOperationResult::Failure(FailureKind::classify_kiss_code(code));
    }
    if header.stratum() > 15 {
        return NetworkOperationResult::Failure(FailureKind::UntrustedStratum);
    }
    if header.transmit_timestamp().is_zero() {
        return NetworkOperationResult::Failure(FailureKind::ZeroTransmitTimestamp);
    }
    if header.leap() == 3 {
        return NetworkOperationResult::Failure(FailureKind::UnsynchronizedServer);
    }
    if header.reference_timestamp().is_zero() {
        return NetworkOperationResult::Failure(FailureKind::ReferenceTimestampZero);
    }

    NetworkOperationResult::Success(SuccessResult {
        header,
        server_addr,
        request_instant,
        request_ticks,
        response_ticks,
    })
}
