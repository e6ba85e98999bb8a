//! Round-trip timing and clock-offset calculation (spec.md §4.7).

use crate::addr::SocketAddr;
use crate::duration64::Duration64;
use crate::error::FailureKind;
use crate::header::NtpHeader;
use crate::instant::{Duration, Instant};
use crate::query::{SuccessResult, Ticker};
use crate::timestamp::Timestamp64;

/// Everything derived from one successful exchange: the raw header plus
/// every timing quantity spec.md §4.7 defines.
#[derive(Debug, Clone)]
pub struct TimeSignal {
    pub server_addr: SocketAddr,
    pub header: NtpHeader,
    /// Wall-clock instant at which the response was judged to have
    /// arrived, reckoned by adding the tick-measured transaction duration
    /// to the request instant rather than re-reading the wall clock (so a
    /// clock step mid-exchange cannot corrupt the measurement).
    pub response_instant: Instant,
    pub round_trip_duration: Duration,
    pub total_transaction_duration: Duration,
    /// `(receive_timestamp - transmit_timestamp)` reported by the server:
    /// how long it held the request before replying.
    pub server_processing_duration: Duration,
    /// The client clock's estimated offset from the server's (add this to
    /// a client wall-clock reading to correct it).
    pub client_offset: Duration,
    /// `response_instant + client_offset`: the corrected instant.
    pub adjusted_instant: Instant,
}

/// Validates and reduces one [`SuccessResult`] into a [`TimeSignal`].
///
/// # Errors
///
/// Returns [`FailureKind::InvalidServerProcessingDuration`] if
/// `0 <= server_processing_duration <= total_transaction_duration` does not
/// hold (spec.md §4.7) — a sign that the client or server clock stepped
/// mid-exchange, making the rest of the calculation meaningless.
pub fn perform_ntp_calculations<Ticks: Copy>(
    success: &SuccessResult<Ticks>,
    ticker: &impl Ticker<Ticks = Ticks>,
) -> Result<TimeSignal, FailureKind> {
    let total_transaction_duration =
        ticker.duration_between(success.request_ticks, success.response_ticks);

    let t1 = Timestamp64::from_instant(success.request_instant)
        .map_err(|_| FailureKind::InvalidServerProcessingDuration)?;
    let t2 = success.header.receive_timestamp();
    let t3 = success.header.transmit_timestamp();

    let server_processing_duration = Duration64::between(t2, t3).to_duration();
    if server_processing_duration.is_negative()
        || server_processing_duration > total_transaction_duration
    {
        return Err(FailureKind::InvalidServerProcessingDuration);
    }

    let round_trip_duration = total_transaction_duration - server_processing_duration;
    let response_instant = success.request_instant + total_transaction_duration;

    let t4 = Timestamp64::from_instant(response_instant)
        .map_err(|_| FailureKind::InvalidServerProcessingDuration)?;

    // offset = ((T2 - T1) + (T3 - T4)) / 2, the classic NTP formula
    // (spec.md §4.7), computed in the wraparound-safe 64-bit domain and
    // only converted to a wall-clock Duration at the end.
    let offset_64 = (Duration64::between(t1, t2) + Duration64::between(t4, t3)) / 2;
    let client_offset = offset_64.to_duration();

    let adjusted_instant = response_instant + client_offset;

    Ok(TimeSignal {
        server_addr: success.server_addr,
        header: success.header,
        response_instant,
        round_trip_duration,
        total_transaction_duration,
        server_processing_duration,
        client_offset,
        adjusted_instant,
    })
}
