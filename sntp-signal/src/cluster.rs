//! Clustered querying across every address a hostname resolves to
//! (spec.md §4.6): try each address in turn, bail out immediately on a
//! halting failure, and give up after `time_allowed` elapses.

use alloc::vec::Vec;

use crate::addr::{IpAddr, SocketAddr};
use crate::calc::perform_ntp_calculations;
use crate::config::SntpClientConfig;
use crate::error::{ClusterError, FailureKind};
use crate::instant::Duration;
use crate::log::{debug, warn};
use crate::query::{query_once, InstantSource, NetworkOperationResult, NtpUdpSocket, Random, Ticker};
use crate::result::{DebugInfo, SntpQueryResult};

/// Resolves a hostname to the addresses a clustered query should try.
/// `no_std` embedders without DNS can implement this trivially over a
/// fixed address list.
pub trait Resolver {
    type Error;

    async fn resolve(&mut self, host: &str) -> Result<Vec<IpAddr>, Self::Error>;
}

/// Queries every address `host` resolves to until one succeeds, a halting
/// failure is hit, or `time_allowed` elapses, per spec.md §4.6. `None`
/// means no overall deadline — only `config.response_timeout` bounds each
/// attempt (spec.md §4.6 "total time allowed (optional)").
#[allow(clippy::too_many_arguments)]
pub async fn execute_cluster_query<S, T, I, R, Res>(
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
    let mut debug_info: DebugInfo<T::Ticks> = DebugInfo::new();

    let addresses = match resolver.resolve(host).await {
        Ok(addrs) if !addrs.is_empty() => addrs,
        // DNS hiccups are typically transient, unlike a halting protocol
        // violation from a server that did answer — a caller can
        // reasonably retry the whole cluster shortly (spec.md §9, Open
        // Question: classification of resolver failure).
        _ => return SntpQueryResult::RetryLater(debug_info, ClusterError::UnknownHost),
    };

    let start = instant_source.now();
    let mut causes: Vec<FailureKind> = Vec::new();

    for ip in addresses {
        let remaining = match time_allowed {
            Some(budget) => {
                let elapsed = crate::instant::Instant::between(start, instant_source.now());
                let remaining = budget - elapsed;
                if remaining <= Duration::ZERO {
                    warn!(
                        "time_allowed budget exceeded after {} attempts",
                        debug_info.attempts.len()
                    );
                    return SntpQueryResult::TimeAllowedExceeded(debug_info);
                }
                remaining
            }
            // Unbounded: let the per-attempt response_timeout be the only
            // deadline query_once ever hits.
            None => config.response_timeout,
        };

        let server_addr = SocketAddr::new(ip, config.port);
        let outcome = query_once(
            config, socket, server_addr, ticker, instant_source, random, remaining,
        )
        .await;

        match outcome {
            NetworkOperationResult::Success(ref success) => {
                debug_info.attempts.push(outcome.clone());
                match perform_ntp_calculations(success, ticker) {
                    Ok(signal) => {
                        debug!("synchronized against {}", success.server_addr);
                        return SntpQueryResult::Success(signal, debug_info);
                    }
                    Err(kind) => {
                        if kind.is_halting() {
                            return SntpQueryResult::ProtocolError(
                                debug_info,
                                ClusterError::AddressesExhausted(alloc::vec![kind]),
                            );
                        }
                        causes.push(kind);
                    }
                }
            }
            NetworkOperationResult::Failure(kind) => {
                debug_info.attempts.push(outcome.clone());
                warn!("query against {server_addr} failed: {kind}");
                if kind.is_halting() {
                    return SntpQueryResult::ProtocolError(
                        debug_info,
                        ClusterError::AddressesExhausted(alloc::vec![kind]),
                    );
                }
                causes.push(kind);
            }
            NetworkOperationResult::TimeAllowedExceeded => {
                debug_info.attempts.push(outcome.clone());
                warn!("time_allowed budget exceeded while waiting on {server_addr}");
                return SntpQueryResult::TimeAllowedExceeded(debug_info);
            }
        }
    }

    SntpQueryResult::RetryLater(debug_info, ClusterError::AddressesExhausted(causes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instant::{Duration, Instant};
    use crate::query::{ClockPrecision, RecvError};

    struct FixedTicker;
    impl Ticker for FixedTicker {
        type Ticks = u64;
        fn now(&mut self) -> u64 {
            0
        }
        fn duration_between(&self, _start: u64, _end: u64) -> Duration {
            Duration::ZERO
        }
    }

    struct FixedClock(i64);
    impl InstantSource for FixedClock {
        fn now(&mut self) -> Instant {
            let i = Instant::new(self.0, 0);
            self.0 += 1;
            i
        }
        fn precision(&self) -> ClockPrecision {
            ClockPrecision::Nanos
        }
    }

    struct ZeroRandom;
    impl Random for ZeroRandom {
        fn next_u32(&mut self) -> u32 {
            0
        }
    }

    struct AlwaysTimeoutSocket;
    impl NtpUdpSocket for AlwaysTimeoutSocket {
        type Error = ();
        async fn send_to(&mut self, _buf: &[u8], _addr: SocketAddr) -> Result<(), ()> {
            Ok(())
        }
        async fn recv_from(
            &mut self,
            _buf: &mut [u8],
            _timeout: Duration,
        ) -> Result<(usize, SocketAddr), RecvError<()>> {
            Err(RecvError::Timeout)
        }
    }

    struct FixedResolver(Vec<IpAddr>);
    impl Resolver for FixedResolver {
        type Error = ();
        async fn resolve(&mut self, _host: &str) -> Result<Vec<IpAddr>, ()> {
            Ok(self.0.clone())
        }
    }

    #[test]
    fn exhausting_every_address_with_timeouts_yields_retry_later() {
        let config = SntpClientConfig::default();
        let mut socket = AlwaysTimeoutSocket;
        let mut ticker = FixedTicker;
        let mut clock = FixedClock(1_700_000_000);
        let mut rng = ZeroRandom;
        let mut resolver =
            FixedResolver(alloc::vec![IpAddr::V4([192, 0, 2, 1]), IpAddr::V4([192, 0, 2, 2])]);

        let result = miniloop::executor::block_on(execute_cluster_query(
            &config, "pool.example", &mut socket, &mut ticker, &mut clock, &mut rng, &mut resolver,
            None,
        ));

        match result {
            SntpQueryResult::RetryLater(debug, ClusterError::AddressesExhausted(causes)) => {
                assert_eq!(debug.attempts.len(), 2);
                assert_eq!(causes.len(), 2);
                assert!(causes.iter().all(|c| matches!(c, FailureKind::SocketReceiveTimeout)));
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn tight_time_allowed_budget_dominates_per_attempt_timeout() {
        let config = SntpClientConfig::default();
        // Tighter than the per-attempt response_timeout (5s default), so
        // the very first receive is bounded by the overall budget instead
        // (spec.md §4.5 step 2/8).
        let time_allowed = Some(Duration::new(2, 0));
        let mut socket = AlwaysTimeoutSocket;
        let mut ticker = FixedTicker;
        let mut clock = FixedClock(1_700_000_000);
        let mut rng = ZeroRandom;
        let mut resolver =
            FixedResolver(alloc::vec![IpAddr::V4([192, 0, 2, 1]), IpAddr::V4([192, 0, 2, 2])]);

        let result = miniloop::executor::block_on(execute_cluster_query(
            &config, "pool.example", &mut socket, &mut ticker, &mut clock, &mut rng, &mut resolver,
            time_allowed,
        ));

        match result {
            SntpQueryResult::TimeAllowedExceeded(debug) => {
                assert_eq!(debug.attempts.len(), 1);
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn unresolvable_host_yields_retry_later_with_unknown_host() {
        let config = SntpClientConfig::default();
        let mut socket = AlwaysTimeoutSocket;
        let mut ticker = FixedTicker;
        let mut clock = FixedClock(1_700_000_000);
        let mut rng = ZeroRandom;
        let mut resolver = FixedResolver(Vec::new());

        let result = miniloop::executor::block_on(execute_cluster_query(
            &config, "nowhere.example", &mut socket, &mut ticker, &mut clock, &mut rng,
            &mut resolver, None,
        ));

        assert!(matches!(
            result,
            SntpQueryResult::RetryLater(_, ClusterError::UnknownHost)
        ));
    }

    // --- end-to-end scenarios mirroring spec.md §8.3 --------------------

    use crate::header::{NtpHeader, NtpHeaderBuilder};
    use crate::timestamp::Timestamp64;
    use alloc::boxed::Box;

    struct IncrementingTicker(u64);
    impl Ticker for IncrementingTicker {
        type Ticks = u64;
        fn now(&mut self) -> u64 {
            let t = self.0;
            self.0 += 1;
            t
        }
        fn duration_between(&self, start: u64, end: u64) -> Duration {
            // Ten seconds per tick: the two `now()` calls `query_once` makes
            // (before send, after receive) are always exactly one tick
            // apart, so every successful exchange measures a 10s
            // transaction regardless of how many addresses preceded it.
            Duration::new(10 * i64::try_from(end - start).unwrap_or(0), 0)
        }
    }

    /// A socket whose reply is scripted per call, in order, and that
    /// echoes whatever transmit timestamp it was actually sent (so the
    /// originate-timestamp check passes unless a script deliberately
    /// returns a mismatched one).
    struct ScriptedSocket {
        scripts: Vec<Box<dyn Fn(Timestamp64) -> [u8; 48]>>,
        idx: usize,
        last_transmit: Timestamp64,
        last_addr: SocketAddr,
    }

    impl NtpUdpSocket for ScriptedSocket {
        type Error = ();

        async fn send_to(&mut self, buf: &[u8], addr: SocketAddr) -> Result<(), ()> {
            let mut bytes = [0u8; 48];
            bytes.copy_from_slice(buf);
            self.last_transmit = NtpHeader::from_bytes(bytes).transmit_timestamp();
            self.last_addr = addr;
            Ok(())
        }

        async fn recv_from(
            &mut self,
            buf: &mut [u8],
            _timeout: Duration,
        ) -> Result<(usize, SocketAddr), RecvError<()>> {
            let script = &self.scripts[self.idx];
            self.idx += 1;
            buf[..48].copy_from_slice(&script(self.last_transmit));
            Ok((48, self.last_addr))
        }
    }

    fn reply_unsynchronized(originate: Timestamp64) -> [u8; 48] {
        let mut b = NtpHeaderBuilder::new();
        b.leap(3).unwrap(); // NOSYNC, non-halting per spec.md §4.5
        b.version(4).unwrap();
        b.mode(4).unwrap();
        b.stratum(1);
        b.originate_timestamp(originate);
        b.reference_timestamp(Timestamp64::from_components(1, 1));
        b.transmit_timestamp(Timestamp64::from_components(2, 2));
        b.build().to_bytes()
    }

    fn reply_success(originate: Timestamp64) -> [u8; 48] {
        let mut b = NtpHeaderBuilder::new();
        b.leap(0).unwrap();
        b.version(4).unwrap();
        b.mode(4).unwrap();
        b.stratum(1);
        b.originate_timestamp(originate);
        b.reference_timestamp(Timestamp64::from_components(100, 0));
        // Equal receive/transmit timestamps: zero reported server
        // processing time, trivially within the 10s round trip.
        b.receive_timestamp(Timestamp64::from_components(200, 0));
        b.transmit_timestamp(Timestamp64::from_components(200, 0));
        b.build().to_bytes()
    }

    fn reply_mismatched_originate(_originate: Timestamp64) -> [u8; 48] {
        let mut b = NtpHeaderBuilder::new();
        b.leap(0).unwrap();
        b.version(4).unwrap();
        b.mode(4).unwrap();
        b.stratum(1);
        // Deliberately does not echo the request's transmit timestamp.
        b.originate_timestamp(Timestamp64::from_components(9, 9));
        b.reference_timestamp(Timestamp64::from_components(1, 1));
        b.transmit_timestamp(Timestamp64::from_components(2, 2));
        b.build().to_bytes()
    }

    fn reply_kiss_of_death(code: &'static str) -> impl Fn(Timestamp64) -> [u8; 48] {
        move |originate| {
            let mut b = NtpHeaderBuilder::new();
            b.leap(0).unwrap();
            b.version(4).unwrap();
            b.mode(4).unwrap();
            b.stratum(0);
            b.originate_timestamp(originate);
            b.reference_identifier_ascii(code).unwrap();
            b.build().to_bytes()
        }
    }

    fn five_addresses() -> Vec<IpAddr> {
        (1..=5).map(|n| IpAddr::V4([192, 0, 2, n])).collect()
    }

    #[test]
    fn mismatched_originate_timestamp_halts_after_one_address() {
        let config = SntpClientConfig::default();
        let mut socket = ScriptedSocket {
            scripts: alloc::vec![Box::new(reply_mismatched_originate)],
            idx: 0,
            last_transmit: Timestamp64::ZERO,
            last_addr: SocketAddr::new(IpAddr::V4([192, 0, 2, 1]), 123),
        };
        let mut ticker = IncrementingTicker(0);
        let mut clock = FixedClock(1_700_000_000);
        let mut rng = ZeroRandom;
        let mut resolver = FixedResolver(five_addresses());

        let result = miniloop::executor::block_on(execute_cluster_query(
            &config, "pool.example", &mut socket, &mut ticker, &mut clock, &mut rng, &mut resolver,
            None,
        ));

        match result {
            SntpQueryResult::ProtocolError(debug, ClusterError::AddressesExhausted(causes)) => {
                assert_eq!(debug.attempts.len(), 1);
                assert_eq!(causes.len(), 1);
                assert!(matches!(causes[0], FailureKind::MismatchedOriginateTimestamp));
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn kiss_of_death_deny_halts_after_one_address() {
        let config = SntpClientConfig::default();
        let mut socket = ScriptedSocket {
            scripts: alloc::vec![Box::new(reply_kiss_of_death("DENY"))],
            idx: 0,
            last_transmit: Timestamp64::ZERO,
            last_addr: SocketAddr::new(IpAddr::V4([192, 0, 2, 1]), 123),
        };
        let mut ticker = IncrementingTicker(0);
        let mut clock = FixedClock(1_700_000_000);
        let mut rng = ZeroRandom;
        let mut resolver = FixedResolver(five_addresses());

        let result = miniloop::executor::block_on(execute_cluster_query(
            &config, "pool.example", &mut socket, &mut ticker, &mut clock, &mut rng, &mut resolver,
            None,
        ));

        match result {
            SntpQueryResult::ProtocolError(debug, ClusterError::AddressesExhausted(causes)) => {
                assert_eq!(debug.attempts.len(), 1);
                assert!(matches!(causes[0], FailureKind::KissOfDeath(code) if &code == b"DENY"));
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn succeeds_after_two_non_halting_failures() {
        let config = SntpClientConfig::default();
        let mut socket = ScriptedSocket {
            scripts: alloc::vec![
                Box::new(reply_unsynchronized),
                Box::new(reply_unsynchronized),
                Box::new(reply_success),
            ],
            idx: 0,
            last_transmit: Timestamp64::ZERO,
            last_addr: SocketAddr::new(IpAddr::V4([192, 0, 2, 1]), 123),
        };
        let mut ticker = IncrementingTicker(0);
        let mut clock = FixedClock(1_700_000_000);
        let mut rng = ZeroRandom;
        let mut resolver = FixedResolver(five_addresses());

        let result = miniloop::executor::block_on(execute_cluster_query(
            &config, "pool.example", &mut socket, &mut ticker, &mut clock, &mut rng, &mut resolver,
            None,
        ));

        match result {
            SntpQueryResult::Success(signal, debug) => {
                assert_eq!(debug.attempts.len(), 3);
                assert!(matches!(debug.attempts[0], NetworkOperationResult::Failure(_)));
                assert!(matches!(debug.attempts[1], NetworkOperationResult::Failure(_)));
                assert!(matches!(debug.attempts[2], NetworkOperationResult::Success(_)));
                assert_eq!(signal.total_transaction_duration.seconds(), 10);
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }
}
