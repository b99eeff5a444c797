//! The address resolution engine: literal detection, SRV redirection, and
//! DNS fallback with family preference, composed into one pass.

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

use tracing::debug;

use super::dns::{resolve_a, resolve_aaaa, resolve_srv};
use crate::{
    DEFAULT_TIMEOUT, Error, bedrock, java,
    address::{AddressFamily, ConnectPoint, ResolveOptions, ResolvedAddress, ServerAddressInfo, parse_ip},
    options::{ServerType, SrvPolicy},
};

/// Resolve `server_addr` into concrete connect points.
///
/// The engine never returns an error; invalidity is captured in the
/// [`ServerAddressInfo::Invalid`] arm together with the first reason that
/// made the address unusable. The steps, in order: determine the port
/// (explicit, or the edition default), adopt a literal address as-is, follow
/// the Java SRV convention where it applies, enforce the family filter, and
/// finally fall back to A/AAAA lookups with `prefer_ipv6` as the tie-break.
///
/// When both DNS families answer, the first address of the family that was
/// not selected is kept as a fallback connect point.
pub async fn resolve_address(server_addr: &str, options: ResolveOptions) -> ServerAddressInfo {
    match resolve_steps(server_addr, &options).await {
        Ok(resolved) => ServerAddressInfo::Valid(resolved),
        Err(reason) => {
            debug!(server_addr, reason = %reason, "address resolution failed");
            ServerAddressInfo::Invalid {
                server_addr: server_addr.to_string(),
                reason,
            }
        }
    }
}

async fn resolve_steps(
    server_addr: &str,
    options: &ResolveOptions,
) -> Result<ResolvedAddress, Error> {
    let lookup_timeout = options.lookup_timeout.unwrap_or(DEFAULT_TIMEOUT);

    // without an edition there is no default port to fall back on
    let mut port = match (options.server_port, options.server_type) {
        (Some(explicit), _) => explicit,
        (None, Some(ServerType::Java)) => java::DEFAULT_PORT,
        (None, Some(ServerType::Bedrock)) => bedrock::DEFAULT_PORT,
        (None, _) => return Err(Error::MissingTypeOrPort),
    };

    let mut working_host = server_addr.to_string();
    let mut ip = parse_ip(server_addr);

    let try_srv = srv_applies(options, ip.is_some());

    let mut srv_record = None;
    if try_srv {
        srv_record = resolve_srv(&working_host, lookup_timeout).await;
        match &srv_record {
            Some(record) => {
                working_host = record.target.clone();
                port = record.port;
            }
            None if options.srv_policy == SrvPolicy::Force => {
                return Err(Error::SrvLookupFailed(server_addr.to_string()));
            }
            None => {}
        }
    }

    // the SRV target may itself be a literal address rather than a name
    if ip.is_none() {
        ip = parse_ip(&working_host);
    }

    if let (Some(family), Some(found)) = (options.family, ip) {
        if !family.contains(found) {
            return Err(Error::AddressFamilyMismatch(server_addr.to_string()));
        }
    }

    let mut connect_points = Vec::with_capacity(2);
    let ip = match ip {
        Some(literal) => literal,
        None => {
            let want_v4 = options.family != Some(AddressFamily::V6);
            let want_v6 = options.family != Some(AddressFamily::V4);
            let dns_ip4 = if want_v4 {
                resolve_a(&working_host, lookup_timeout).await.unwrap_or_default()
            } else {
                Vec::new()
            };
            let dns_ip6 = if want_v6 {
                resolve_aaaa(&working_host, lookup_timeout).await.unwrap_or_default()
            } else {
                Vec::new()
            };

            let Some(selected) = select_ip(&dns_ip4, &dns_ip6, options.prefer_ipv6) else {
                return Err(Error::DnsLookupFailed(working_host));
            };
            if let Some(alternate) = alternate_ip(&dns_ip4, &dns_ip6, options.prefer_ipv6) {
                connect_points.push(ConnectPoint {
                    ip: alternate,
                    port,
                });
            }
            selected
        }
    };

    connect_points.insert(0, ConnectPoint { ip, port });
    debug_assert!(!connect_points.is_empty());

    debug!(server_addr, %ip, port, srv = srv_record.is_some(), "address resolved");
    Ok(ResolvedAddress {
        server_addr: server_addr.to_string(),
        ip,
        port,
        connect_points,
        srv_record,
    })
}

/// Whether SRV resolution applies. SRV redirection is a Java-only
/// convention, and an explicitly pinned port signals the caller does not
/// want it; `Force` overrides both.
const fn srv_applies(options: &ResolveOptions, is_literal: bool) -> bool {
    match options.srv_policy {
        SrvPolicy::Force => true,
        SrvPolicy::Auto => {
            !is_literal
                && options.server_port.is_none()
                && matches!(options.server_type, Some(ServerType::Java))
        }
        SrvPolicy::Disabled => false,
    }
}

/// Pick the primary address from the two DNS answer lists. IPv4 wins unless
/// the caller prefers IPv6 and an AAAA answer exists; either family alone is
/// taken as-is.
fn select_ip(dns_ip4: &[Ipv4Addr], dns_ip6: &[Ipv6Addr], prefer_ipv6: bool) -> Option<IpAddr> {
    if prefer_ipv6 {
        if let Some(first) = dns_ip6.first() {
            return Some(IpAddr::V6(*first));
        }
    }
    if let Some(first) = dns_ip4.first() {
        return Some(IpAddr::V4(*first));
    }
    dns_ip6.first().map(|first| IpAddr::V6(*first))
}

/// The first address of the family `select_ip` did not pick, when both
/// families answered.
fn alternate_ip(dns_ip4: &[Ipv4Addr], dns_ip6: &[Ipv6Addr], prefer_ipv6: bool) -> Option<IpAddr> {
    let (first_v4, first_v6) = (dns_ip4.first(), dns_ip6.first());
    match (first_v4, first_v6) {
        (Some(v4), Some(v6)) => Some(if prefer_ipv6 {
            IpAddr::V4(*v4)
        } else {
            IpAddr::V6(*v6)
        }),
        _ => None,
    }
}
