//! SRV and A/AAAA lookups, each raced against a timeout.
//!
//! A query error, an empty answer, and a timeout all mean the same thing to
//! the resolution engine — "no data" — so every lookup here settles to an
//! `Option` rather than an error. An answer arriving after the timer has
//! fired is discarded with the cancelled future.

use std::{
    net::{Ipv4Addr, Ipv6Addr},
    time::Duration,
};

use tokio::time::timeout;
use tracing::{debug, trace};

use super::resolver;
use crate::address::SrvRecord;

/// The service name prefix Java edition clients use for redirection.
const SRV_SERVICE: &str = "_minecraft._tcp";

/// Look up the `_minecraft._tcp.<host>` SRV record.
///
/// The first record wins; no priority/weight ordering is applied among
/// multiple answers.
pub async fn resolve_srv(host: &str, limit: Duration) -> Option<SrvRecord> {
    let name = format!("{SRV_SERVICE}.{host}");
    let lookup = timeout(limit, resolver().srv_lookup(name)).await;
    let record = match lookup {
        Ok(Ok(answer)) => answer.iter().next().map(|srv| SrvRecord {
            // SRV targets come back fully qualified; the root dot would
            // confuse both literal detection and the handshake hostname
            target: srv.target().to_utf8().trim_end_matches('.').to_string(),
            port: srv.port(),
        }),
        Ok(Err(e)) => {
            trace!(host, error = %e, "srv lookup failed");
            None
        }
        Err(_elapsed) => {
            trace!(host, "srv lookup timed out");
            None
        }
    };
    if let Some(record) = &record {
        debug!(host, target = %record.target, port = record.port, "srv record found");
    }
    record
}

/// Look up the A records of `host`. `None` on error, empty answer, or
/// timeout.
pub async fn resolve_a(host: &str, limit: Duration) -> Option<Vec<Ipv4Addr>> {
    match timeout(limit, resolver().ipv4_lookup(host.to_string())).await {
        Ok(Ok(answer)) => {
            let addresses: Vec<Ipv4Addr> = answer.iter().map(|a| a.0).collect();
            trace!(host, count = addresses.len(), "a lookup answered");
            (!addresses.is_empty()).then_some(addresses)
        }
        _ => None,
    }
}

/// Look up the AAAA records of `host`. `None` on error, empty answer, or
/// timeout.
pub async fn resolve_aaaa(host: &str, limit: Duration) -> Option<Vec<Ipv6Addr>> {
    match timeout(limit, resolver().ipv6_lookup(host.to_string())).await {
        Ok(Ok(answer)) => {
            let addresses: Vec<Ipv6Addr> = answer.iter().map(|aaaa| aaaa.0).collect();
            trace!(host, count = addresses.len(), "aaaa lookup answered");
            (!addresses.is_empty()).then_some(addresses)
        }
        _ => None,
    }
}
