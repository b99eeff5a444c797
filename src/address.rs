//! Address classification and the resolved-address data model.
//!
//! Everything here is plain data: the literal-IP predicates never touch DNS,
//! and the resolution engine that fills these types in lives in
//! [`crate::tokio`].

use std::{
    fmt,
    net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr},
    time::Duration,
};

use crate::{
    Error,
    options::{ServerType, SrvPolicy},
};

/// Whether `s` is a literal IPv4 address.
///
/// Exact-match only: partial or abbreviated dotted quads are rejected, and
/// no name resolution is involved.
#[must_use]
pub fn is_ipv4(s: &str) -> bool {
    s.parse::<Ipv4Addr>().is_ok()
}

/// Whether `s` is a literal IPv6 address, optionally carrying a `%zone`
/// suffix.
#[must_use]
pub fn is_ipv6(s: &str) -> bool {
    strip_zone(s).parse::<Ipv6Addr>().is_ok()
}

/// Whether `s` is a literal IPv4 or IPv6 address.
#[must_use]
pub fn is_ip(s: &str) -> bool {
    is_ipv6(s) || is_ipv4(s)
}

/// Parse a literal address, if `s` is one. Scoped IPv6 literals drop their
/// zone, since [`IpAddr`] carries none.
pub(crate) fn parse_ip(s: &str) -> Option<IpAddr> {
    if let Ok(v4) = s.parse::<Ipv4Addr>() {
        return Some(IpAddr::V4(v4));
    }
    strip_zone(s).parse::<Ipv6Addr>().ok().map(IpAddr::V6)
}

fn strip_zone(s: &str) -> &str {
    s.split_once('%').map_or(s, |(addr, _zone)| addr)
}

/// An address family, used both as a hard filter during resolution and as a
/// socket-family candidate for the Bedrock hostname path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AddressFamily {
    V4,
    V6,
}

impl AddressFamily {
    /// Whether `ip` belongs to this family.
    #[must_use]
    pub const fn contains(self, ip: IpAddr) -> bool {
        match self {
            Self::V4 => ip.is_ipv4(),
            Self::V6 => ip.is_ipv6(),
        }
    }

    /// The unspecified bind address of this family, port 0.
    #[must_use]
    pub const fn unspecified(self) -> SocketAddr {
        match self {
            Self::V4 => SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), 0),
            Self::V6 => SocketAddr::new(IpAddr::V6(Ipv6Addr::UNSPECIFIED), 0),
        }
    }
}

/// One concrete socket destination a client may attempt to reach for a
/// logical server address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectPoint {
    pub ip: IpAddr,
    pub port: u16,
}

impl ConnectPoint {
    #[must_use]
    pub const fn socket_addr(self) -> SocketAddr {
        SocketAddr::new(self.ip, self.port)
    }
}

impl From<ConnectPoint> for SocketAddr {
    fn from(point: ConnectPoint) -> Self {
        point.socket_addr()
    }
}

impl From<SocketAddr> for ConnectPoint {
    fn from(addr: SocketAddr) -> Self {
        Self {
            ip: addr.ip(),
            port: addr.port(),
        }
    }
}

impl fmt::Display for ConnectPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.socket_addr().fmt(f)
    }
}

/// A `_minecraft._tcp` SRV record: the redirected target host and port.
///
/// The target is also what a Java client presents as the hostname inside its
/// handshake after following the redirection.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SrvRecord {
    pub target: String,
    pub port: u16,
}

/// Options accepted by [`crate::tokio::resolve_address`].
///
/// At least one of `server_type` and `server_port` must be set, otherwise
/// there is no way to determine a port.
#[derive(Debug, Clone, Default)]
pub struct ResolveOptions {
    /// The edition whose default port applies when `server_port` is unset.
    pub server_type: Option<ServerType>,
    /// An explicit port. Setting this also disables automatic SRV
    /// redirection, which would conflict with it.
    pub server_port: Option<u16>,
    /// SRV lookup policy. The default attempts SRV only where the Java
    /// convention applies.
    pub srv_policy: SrvPolicy,
    /// Restrict the result to one address family. This is a hard
    /// constraint; a literal or resolved address of the other family makes
    /// the result invalid.
    pub family: Option<AddressFamily>,
    /// Prefer an AAAA answer over an A answer when both exist. Unlike
    /// `family`, this is only a tie-break.
    pub prefer_ipv6: bool,
    /// Time budget for each individual SRV/A/AAAA query.
    /// [`crate::DEFAULT_TIMEOUT`] when unset.
    pub lookup_timeout: Option<Duration>,
}

/// A successfully resolved server address.
#[derive(Debug, Clone)]
pub struct ResolvedAddress {
    /// The address string the caller asked about.
    pub server_addr: String,
    /// The selected connect address.
    pub ip: IpAddr,
    /// The selected connect port.
    pub port: u16,
    /// Connect points in preference order; the first entry is always
    /// `(ip, port)`, an alternate-family address may follow as a fallback.
    pub connect_points: Vec<ConnectPoint>,
    /// The SRV record that redirected the lookup, when one was followed.
    pub srv_record: Option<SrvRecord>,
}

impl ResolvedAddress {
    /// The primary connect point.
    #[must_use]
    pub const fn primary(&self) -> ConnectPoint {
        ConnectPoint {
            ip: self.ip,
            port: self.port,
        }
    }
}

/// The outcome of address resolution.
///
/// Invalidity is data, not an error: the orchestrator inspects it and keeps
/// going with the other edition. Callers that prefer failing fast can use
/// [`ServerAddressInfo::into_result`].
#[derive(Debug)]
pub enum ServerAddressInfo {
    Valid(ResolvedAddress),
    Invalid { server_addr: String, reason: Error },
}

impl ServerAddressInfo {
    #[must_use]
    pub const fn is_valid(&self) -> bool {
        matches!(self, Self::Valid(_))
    }

    #[must_use]
    pub const fn as_valid(&self) -> Option<&ResolvedAddress> {
        match self {
            Self::Valid(resolved) => Some(resolved),
            Self::Invalid { .. } => None,
        }
    }

    /// Convert into a hard `Result`, surfacing the recorded reason.
    ///
    /// # Errors
    /// The first failure the resolution engine hit.
    pub fn into_result(self) -> Result<ResolvedAddress, Error> {
        match self {
            Self::Valid(resolved) => Ok(resolved),
            Self::Invalid { reason, .. } => Err(reason),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ipv4_literals_match_exactly() {
        assert!(is_ipv4("127.0.0.1"));
        assert!(is_ipv4("255.255.255.255"));
        assert!(!is_ipv4("256.0.0.1"));
        assert!(!is_ipv4("1.2.3"));
        assert!(!is_ipv4("1.2.3.4.5"));
        assert!(!is_ipv4("01.2.3.4"));
        assert!(!is_ipv4("example.com"));
        assert!(!is_ipv4(""));
    }

    #[test]
    fn ipv6_literals_match_exactly() {
        assert!(is_ipv6("::1"));
        assert!(is_ipv6("2001:db8::7334"));
        assert!(is_ipv6("::ffff:192.0.2.128"));
        assert!(is_ipv6("fe80::1%eth0"));
        assert!(!is_ipv6("2001:db8::g"));
        assert!(!is_ipv6("127.0.0.1"));
        assert!(!is_ipv6("example.com"));
    }

    #[test]
    fn is_ip_accepts_either_family() {
        assert!(is_ip("192.0.2.1"));
        assert!(is_ip("::1"));
        assert!(!is_ip("play.example.org"));
    }

    #[test]
    fn scoped_ipv6_drops_its_zone_on_parse() {
        let ip = parse_ip("fe80::1%eth0").unwrap();
        assert_eq!(ip, "fe80::1".parse::<IpAddr>().unwrap());
    }

    #[test]
    fn connect_point_round_trips_through_socket_addr() {
        let point = ConnectPoint {
            ip: IpAddr::V4(Ipv4Addr::new(192, 0, 2, 7)),
            port: 25565,
        };
        let addr: SocketAddr = point.into();
        assert_eq!(ConnectPoint::from(addr), point);
        assert_eq!(point.to_string(), "192.0.2.7:25565");
    }
}
