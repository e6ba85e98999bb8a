//! The caller-facing result of a clustered query (spec.md §4.6).

use alloc::vec::Vec;

use crate::calc::TimeSignal;
use crate::error::ClusterError;
use crate::query::NetworkOperationResult;

/// Every per-address attempt made during one clustered query, kept around
/// for logging/diagnostics even on success (spec.md §4.6).
#[derive(Debug, Clone)]
pub struct DebugInfo<Ticks> {
    pub attempts: Vec<NetworkOperationResult<Ticks>>,
}

impl<Ticks> DebugInfo<Ticks> {
    #[must_use]
    pub fn new() -> Self {
        DebugInfo { attempts: Vec::new() }
    }
}

impl<Ticks> Default for DebugInfo<Ticks> {
    fn default() -> Self {
        Self::new()
    }
}

/// The outcome of a single [`crate::execute_query`] call.
#[derive(Debug, Clone)]
pub enum SntpQueryResult<Ticks> {
    /// One address answered successfully.
    Success(TimeSignal, DebugInfo<Ticks>),
    /// Every address failed, but only with transient, non-halting
    /// failures — a caller may reasonably retry the whole cluster later.
    RetryLater(DebugInfo<Ticks>, ClusterError),
    /// A halting failure was encountered (a protocol violation, or a
    /// halting Kiss-o'-Death code) — retrying immediately is pointless.
    ProtocolError(DebugInfo<Ticks>, ClusterError),
    /// The overall `time_allowed` budget elapsed before any address
    /// answered successfully.
    TimeAllowedExceeded(DebugInfo<Ticks>),
}
