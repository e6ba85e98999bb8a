//! Read-time and protocol-level error taxonomies (spec.md §7).
//!
//! Two families, matching how the teacher crate distinguishes write-time
//! "programmer error" panics from the single checked `Error` enum it
//! returns from the network path (`sntpc/src/types.rs::Error`) — except
//! here the checked side is split in two because the expanded spec needs
//! both a constructor-validation error and a richer, per-address
//! classified protocol/network error with a stable identifier.

use alloc::vec::Vec;
use core::fmt;

/// A malformed constructor argument, or a header field that exists on the
/// wire but is outside the range this crate supports when accessed.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
#[non_exhaustive]
pub enum ReadError {
    /// A field was read from a packet and is syntactically present but
    /// outside of its supported range (e.g. a poll exponent read back
    /// outside `[0, 17]`).
    InvalidNtpValue(&'static str),
    /// A constructor argument was malformed (e.g. a bad timestamp string).
    InvalidArgument(&'static str),
}

impl fmt::Display for ReadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReadError::InvalidNtpValue(msg) => write!(f, "invalid NTP value: {msg}"),
            ReadError::InvalidArgument(msg) => write!(f, "invalid argument: {msg}"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for ReadError {}

/// The four-letter Kiss-o'-Death code carried in a stratum-0 response's
/// reference identifier field.
pub type KissCode = [u8; 4];

const HALTING_KISS_CODES: &[&[u8; 4]] = &[
    b"ACST", b"AUTH", b"AUTO", b"BCST", b"CRYP", b"DENY", b"DROP", b"RSTR", b"MCST", b"NKEY",
    b"RATE", b"RMOT",
];
const NON_HALTING_KISS_CODES: &[&[u8; 4]] = &[b"INIT", b"STEP"];

/// Per-address query failures, each carrying a stable `failure_identifier`
/// so external tooling can bucket issues without string parsing
/// (spec.md §7, §9). The halting/non-halting classification (spec.md §4.5)
/// is exposed via [`FailureKind::is_halting`].
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
#[non_exhaustive]
pub enum FailureKind {
    /// The hostname could not be resolved to any address.
    UnknownHost,
    /// A UDP socket could not be created.
    SocketCreate,
    /// Sending the request datagram failed.
    SocketSend,
    /// Receiving the response datagram failed for a reason other than a
    /// timeout.
    SocketReceive,
    /// Receiving the response datagram timed out against the per-attempt
    /// `response_timeout` (not the overall `time_allowed` budget).
    SocketReceiveTimeout,
    /// The datagram came from a different address/port than the request
    /// was sent to.
    UnexpectedOrigin,
    /// The response's originate timestamp did not echo the request's
    /// transmit timestamp.
    MismatchedOriginateTimestamp,
    /// The response's mode field was not 4 (server).
    BadServerMode,
    /// A Kiss-o'-Death response (`stratum == 0`) carrying one of the
    /// halting codes (service-level condition presumed to affect every
    /// address in the cluster).
    KissOfDeath(KissCode),
    /// A Kiss-o'-Death response carrying a code this crate does not
    /// recognize at all.
    UnknownKissCode(KissCode),
    /// The response's transmit timestamp was the all-zero sentinel.
    ZeroTransmitTimestamp,
    /// `stratum > 15`; the server is reporting itself as unsynchronized
    /// past the trusted range.
    UntrustedStratum,
    /// The response's leap indicator was 3 (NOSYNC).
    UnsynchronizedServer,
    /// The response's reference timestamp was the all-zero sentinel.
    ReferenceTimestampZero,
    /// `0 <= server_processing_duration <= total_transaction_duration`
    /// did not hold when computing the offset (spec.md §4.7).
    InvalidServerProcessingDuration,
}

impl FailureKind {
    /// Classifies a stratum-0 Kiss-o'-Death reference identifier.
    #[must_use]
    pub fn classify_kiss_code(code: KissCode) -> FailureKind {
        if HALTING_KISS_CODES.iter().any(|c| **c == code) {
            FailureKind::KissOfDeath(code)
        } else if NON_HALTING_KISS_CODES.iter().any(|c| **c == code) {
            // Non-halting kiss codes (INIT, STEP) are reported distinctly
            // from unrecognized codes, but share the non-halting behavior.
            FailureKind::KissOfDeath(code)
        } else {
            FailureKind::UnknownKissCode(code)
        }
    }

    /// Whether other addresses in the cluster should still be tried after
    /// this failure (spec.md §4.5/§4.6).
    #[must_use]
    pub fn is_halting(&self) -> bool {
        match self {
            FailureKind::UnexpectedOrigin
            | FailureKind::MismatchedOriginateTimestamp
            | FailureKind::BadServerMode
            | FailureKind::UnknownKissCode(_)
            | FailureKind::ZeroTransmitTimestamp
            | FailureKind::InvalidServerProcessingDuration => true,
            FailureKind::KissOfDeath(code) => HALTING_KISS_CODES.iter().any(|c| **c == *code),
            FailureKind::UnknownHost
            | FailureKind::SocketCreate
            | FailureKind::SocketSend
            | FailureKind::SocketReceive
            | FailureKind::SocketReceiveTimeout
            | FailureKind::UntrustedStratum
            | FailureKind::UnsynchronizedServer
            | FailureKind::ReferenceTimestampZero => false,
        }
    }

    /// Stable numeric identifier for this failure kind, independent of
    /// enum variant order, suitable for dashboards/metrics.
    #[must_use]
    pub fn failure_identifier(&self) -> u16 {
        match self {
            FailureKind::UnknownHost => 1,
            FailureKind::SocketCreate => 2,
            FailureKind::SocketSend => 3,
            FailureKind::SocketReceive => 4,
            FailureKind::SocketReceiveTimeout => 5,
            FailureKind::UnexpectedOrigin => 6,
            FailureKind::MismatchedOriginateTimestamp => 7,
            FailureKind::BadServerMode => 8,
            FailureKind::KissOfDeath(_) => 9,
            FailureKind::UnknownKissCode(_) => 10,
            FailureKind::ZeroTransmitTimestamp => 11,
            FailureKind::UntrustedStratum => 12,
            FailureKind::UnsynchronizedServer => 13,
            FailureKind::ReferenceTimestampZero => 14,
            FailureKind::InvalidServerProcessingDuration => 15,
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::UnknownHost => write!(f, "hostname did not resolve to any address"),
            FailureKind::SocketCreate => write!(f, "could not create UDP socket"),
            FailureKind::SocketSend => write!(f, "failed to send request datagram"),
            FailureKind::SocketReceive => write!(f, "failed to receive response datagram"),
            FailureKind::SocketReceiveTimeout => write!(f, "timed out waiting for response"),
            FailureKind::UnexpectedOrigin => {
                write!(f, "response came from an unexpected address")
            }
            FailureKind::MismatchedOriginateTimestamp => {
                write!(f, "originate timestamp did not match request")
            }
            FailureKind::BadServerMode => write!(f, "response mode was not server (4)"),
            FailureKind::KissOfDeath(code) => {
                write!(f, "kiss-o'-death: {}", kiss_code_str(code))
            }
            FailureKind::UnknownKissCode(code) => {
                write!(f, "unknown kiss-o'-death code: {}", kiss_code_str(code))
            }
            FailureKind::ZeroTransmitTimestamp => write!(f, "response transmit timestamp was zero"),
            FailureKind::UntrustedStratum => write!(f, "response stratum exceeds 15"),
            FailureKind::UnsynchronizedServer => write!(f, "server reported leap indicator NOSYNC"),
            FailureKind::ReferenceTimestampZero => write!(f, "response reference timestamp was zero"),
            FailureKind::InvalidServerProcessingDuration => {
                write!(f, "server processing duration outside [0, round trip]")
            }
        }
    }
}

fn kiss_code_str(code: &KissCode) -> &str {
    core::str::from_utf8(code).unwrap_or("????")
}

#[cfg(feature = "std")]
impl std::error::Error for FailureKind {}

/// Whole-cluster failure: either the hostname never resolved, or every
/// address in the cluster was exhausted without success (spec.md §4.6
/// step 4). Carries every per-address [`FailureKind`] encountered so a
/// caller (or its logs) can see why.
#[derive(Debug, Clone)]
#[non_exhaustive]
pub enum ClusterError {
    /// DNS resolution of the hostname itself failed.
    UnknownHost,
    /// Every resolved address was tried and none succeeded.
    AddressesExhausted(Vec<FailureKind>),
}

impl fmt::Display for ClusterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClusterError::UnknownHost => write!(f, "hostname did not resolve to any address"),
            ClusterError::AddressesExhausted(causes) => {
                write!(f, "all {} resolved addresses failed", causes.len())
            }
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for ClusterError {}
