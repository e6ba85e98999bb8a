//! Client-wide configuration (spec.md §5).

use crate::instant::Duration;

/// Tunables for a single [`crate::execute_query`] call. Defaults match
/// spec.md §5's suggested values.
#[derive(Debug, Clone)]
pub struct SntpClientConfig {
    /// UDP port to query on the resolved host, absent an explicit port in
    /// the address itself.
    pub port: u16,
    /// How long to wait for a response to one request before giving up on
    /// that address and trying the next (spec.md §4.5).
    pub response_timeout: Duration,
    /// NTP version placed in outgoing requests.
    pub version: u8,
    /// When `true` (the default), the outgoing transmit timestamp is a
    /// fully random nonce carrying no wall-clock information. When
    /// `false`, the real clock instant is used, with its sub-millisecond
    /// bits randomized if the clock's precision is coarse (spec.md §4.4,
    /// §4.7, §9).
    pub data_minimization: bool,
}

impl Default for SntpClientConfig {
    fn default() -> Self {
        SntpClientConfig {
            port: 123,
            response_timeout: Duration::new(5, 0),
            version: 3,
            data_minimization: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let c = SntpClientConfig::default();
        assert_eq!(c.port, 123);
        assert_eq!(c.response_timeout.seconds(), 5);
        assert_eq!(c.version, 3);
        assert!(c.data_minimization);
    }
}
