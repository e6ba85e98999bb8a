//! A minimal, `no_std`-friendly socket address, standing in for
//! `std::net::SocketAddr` so the core crate never names a platform network
//! type (spec.md §6.1 "external collaborators"). Adapter crates (e.g.
//! `sntp-signal-std`) convert to/from their platform's native address type
//! at the boundary.

use core::fmt;

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum IpAddr {
    V4([u8; 4]),
    V6([u8; 16]),
}

impl fmt::Display for IpAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IpAddr::V4(o) => write!(f, "{}.{}.{}.{}", o[0], o[1], o[2], o[3]),
            IpAddr::V6(segments) => {
                for (i, chunk) in segments.chunks(2).enumerate() {
                    if i > 0 {
                        write!(f, ":")?;
                    }
                    write!(f, "{:x}", u16::from_be_bytes([chunk[0], chunk[1]]))?;
                }
                Ok(())
            }
        }
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct SocketAddr {
    pub ip: IpAddr,
    pub port: u16,
}

impl SocketAddr {
    #[must_use]
    pub const fn new(ip: IpAddr, port: u16) -> Self {
        SocketAddr { ip, port }
    }
}

impl fmt::Display for SocketAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.ip {
            IpAddr::V4(_) => write!(f, "{}:{}", self.ip, self.port),
            IpAddr::V6(_) => write!(f, "[{}]:{}", self.ip, self.port),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn v4_display_is_dotted_quad_with_port() {
        let a = SocketAddr::new(IpAddr::V4([192, 0, 2, 1]), 123);
        assert_eq!(a.to_string(), "192.0.2.1:123");
    }

    #[test]
    fn v6_display_is_bracketed() {
        let a = SocketAddr::new(IpAddr::V6([0u8; 16]), 123);
        assert_eq!(a.to_string(), "[0:0:0:0:0:0:0:0]:123");
    }
}
