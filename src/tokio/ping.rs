//! The ping orchestrator: resolve the address for each requested edition,
//! run the matching protocol client, and report partial success.

use serde_json::Value;
use tracing::debug;

use super::{get_status, resolve_address};
use crate::{
    Error,
    address::{ResolveOptions, ResolvedAddress, ServerAddressInfo},
    bedrock::{Bedrock, BedrockResponse, BedrockTarget},
    java::Java,
    options::{PingOptions, ServerType},
};

/// The outcome of one edition's resolve-filter-ping sequence.
#[derive(Debug)]
pub struct ProtocolReport<T> {
    /// The resolved address this attempt used, when resolution succeeded.
    pub address: Option<ResolvedAddress>,
    /// `false` only when the caller's address filter rejected the address.
    pub address_accepted: bool,
    /// `(latency_ms, payload)` on success; the resolution, filter, or
    /// protocol failure otherwise.
    pub result: Result<(u64, T), Error>,
}

impl<T> ProtocolReport<T> {
    fn unresolved(reason: Error) -> Self {
        Self {
            address: None,
            address_accepted: true,
            result: Err(reason),
        }
    }

    /// The successful payload, if this edition answered.
    #[must_use]
    pub fn response(&self) -> Option<&T> {
        self.result.as_ref().ok().map(|(_, response)| response)
    }

    /// The measured latency, if this edition answered.
    #[must_use]
    pub fn latency(&self) -> Option<u64> {
        self.result.as_ref().ok().map(|(latency, _)| *latency)
    }
}

/// What [`ping_server`] found out about a server.
///
/// One edition failing never hides the other succeeding; a Java-only answer
/// to an `Unknown`-type ping is still an online server.
#[derive(Debug, Default)]
pub struct PingReport {
    /// The Java attempt, when the Java edition was requested.
    pub java: Option<ProtocolReport<Value>>,
    /// The Bedrock attempt, when the Bedrock edition was requested.
    pub bedrock: Option<ProtocolReport<BedrockResponse>>,
}

impl PingReport {
    /// Whether at least one requested edition answered.
    #[must_use]
    pub fn online(&self) -> bool {
        self.java.as_ref().is_some_and(|report| report.result.is_ok())
            || self
                .bedrock
                .as_ref()
                .is_some_and(|report| report.result.is_ok())
    }

    /// Every recorded failure reason, in java-then-bedrock order.
    pub fn failures(&self) -> impl Iterator<Item = &Error> {
        let java = self.java.as_ref().and_then(|report| report.result.as_ref().err());
        let bedrock = self
            .bedrock
            .as_ref()
            .and_then(|report| report.result.as_ref().err());
        java.into_iter().chain(bedrock)
    }

    /// Escalate an all-editions failure into an error, consuming the
    /// report. A single recorded reason is surfaced directly; several are
    /// combined into [`Error::Aggregate`].
    ///
    /// # Errors
    /// The aggregated failure reason when no edition answered.
    pub fn into_result(self) -> Result<Self, Error> {
        if self.online() {
            return Ok(self);
        }
        let mut reasons = Vec::new();
        if let Some(Err(reason)) = self.java.map(|report| report.result) {
            reasons.push(reason);
        }
        if let Some(Err(reason)) = self.bedrock.map(|report| report.result) {
            reasons.push(reason);
        }
        if reasons.len() == 1 {
            Err(reasons.remove(0))
        } else {
            Err(Error::Aggregate(reasons))
        }
    }
}

/// Ping `host`, trying the edition(s) the options request (both, by
/// default) and collecting per-edition outcomes.
///
/// The options accept shorthands: a bare port (`u16`) or a bare
/// [`ServerType`]. Failures are captured in the report rather than
/// returned; use [`PingReport::into_result`] for fail-fast semantics.
///
/// # Examples
///
/// ```no_run
/// # async {
/// use mcstatus::ServerType;
///
/// let report = mcstatus::tokio::ping_server("mc.example.org", ServerType::Java).await;
/// if let Some(java) = &report.java {
///     if let Some(document) = java.response() {
///         println!("motd: {}", document["description"]);
///     }
/// }
/// # };
/// ```
pub async fn ping_server(host: &str, options: impl Into<PingOptions>) -> PingReport {
    let options = options.into();
    debug!(host, ?options, "pinging server");

    // the editions touch disjoint sockets and lookups, and neither outcome
    // depends on the other; evaluation order is not observable in the report
    let java = if options.server_type.includes_java() {
        Some(java_attempt(host, &options).await)
    } else {
        None
    };
    let bedrock = if options.server_type.includes_bedrock() {
        Some(bedrock_attempt(host, &options).await)
    } else {
        None
    };

    PingReport { java, bedrock }
}

async fn java_attempt(host: &str, options: &PingOptions) -> ProtocolReport<Value> {
    let info = resolve_for(host, options, ServerType::Java).await;
    let resolved = match info {
        ServerAddressInfo::Valid(resolved) => resolved,
        ServerAddressInfo::Invalid { reason, .. } => return ProtocolReport::unresolved(reason),
    };

    if let Some(rejection) = apply_filter(options, &resolved) {
        return rejection;
    }

    // prefer the caller's override, then the SRV target the resolution
    // followed, then whatever the caller originally asked about
    let status_hostname = options.force_hostname.clone().unwrap_or_else(|| {
        resolved
            .srv_record
            .as_ref()
            .map_or_else(|| host.to_string(), |record| record.target.clone())
    });

    let result = get_status(Java {
        target: resolved.primary(),
        status_hostname,
        timeout: options.timeout,
    })
    .await;

    ProtocolReport {
        address: Some(resolved),
        address_accepted: true,
        result,
    }
}

async fn bedrock_attempt(host: &str, options: &PingOptions) -> ProtocolReport<BedrockResponse> {
    let info = resolve_for(host, options, ServerType::Bedrock).await;
    let resolved = match info {
        ServerAddressInfo::Valid(resolved) => resolved,
        ServerAddressInfo::Invalid { reason, .. } => return ProtocolReport::unresolved(reason),
    };

    if let Some(rejection) = apply_filter(options, &resolved) {
        return rejection;
    }

    let result = get_status(Bedrock {
        target: BedrockTarget::Addr(resolved.ip),
        port: resolved.port,
        timeout: options.timeout,
    })
    .await;

    ProtocolReport {
        address: Some(resolved),
        address_accepted: true,
        result,
    }
}

async fn resolve_for(
    host: &str,
    options: &PingOptions,
    edition: ServerType,
) -> ServerAddressInfo {
    resolve_address(
        host,
        ResolveOptions {
            server_type: Some(edition),
            server_port: options.server_port,
            srv_policy: options.srv_policy,
            family: options.family,
            prefer_ipv6: options.prefer_ipv6,
            lookup_timeout: options.timeout,
        },
    )
    .await
}

fn apply_filter<T>(options: &PingOptions, resolved: &ResolvedAddress) -> Option<ProtocolReport<T>> {
    let filter = options.address_filter.as_ref()?;
    if filter(resolved.ip, resolved.port) {
        return None;
    }
    debug!(ip = %resolved.ip, port = resolved.port, "address rejected by filter");
    Some(ProtocolReport {
        address: Some(resolved.clone()),
        address_accepted: false,
        result: Err(Error::AddressRejected),
    })
}

#[cfg(test)]
mod tests {
    use std::{sync::Arc, time::Duration};

    use tokio::{
        io::{AsyncReadExt, AsyncWriteExt},
        net::{TcpListener, UdpSocket},
    };

    use super::*;
    use crate::{address::AddressFamily, options::SrvPolicy};

    /// A loopback Java responder answering one status ping with `json`.
    async fn spawn_java_server(json: &'static [u8]) -> u16 {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            let mut scratch = [0; 512];
            let _ = stream.read(&mut scratch).await.unwrap();
            let mut body = vec![0x00];
            body.push(json.len() as u8);
            body.extend_from_slice(json);
            let mut framed = vec![body.len() as u8];
            framed.extend_from_slice(&body);
            stream.write_all(&framed).await.unwrap();
            stream.flush().await.unwrap();
            tokio::time::sleep(Duration::from_millis(200)).await;
        });
        port
    }

    /// A loopback Bedrock responder answering one ping.
    async fn spawn_bedrock_server(advertise: &'static str) -> u16 {
        let socket = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let port = socket.local_addr().unwrap().port();
        tokio::spawn(async move {
            let mut buffer = [0; 1500];
            let (_, peer) = socket.recv_from(&mut buffer).await.unwrap();
            let mut pong = vec![0x1c];
            pong.extend_from_slice(&1_u64.to_be_bytes());
            pong.extend_from_slice(&2_u64.to_be_bytes());
            pong.extend_from_slice(crate::bedrock::OFFLINE_MESSAGE_DATA_ID);
            pong.extend_from_slice(&(advertise.len() as u16).to_be_bytes());
            pong.extend_from_slice(advertise.as_bytes());
            socket.send_to(&pong, peer).await.unwrap();
        });
        port
    }

    fn options_for(server_type: ServerType, port: u16) -> PingOptions {
        PingOptions {
            server_type,
            server_port: Some(port),
            srv_policy: SrvPolicy::Disabled,
            timeout: Some(Duration::from_millis(500)),
            ..Default::default()
        }
    }

    const JSON: &[u8] = br#"{"version":{"name":"1.21","protocol":767},"players":{"max":20,"online":1},"description":"up"}"#;

    #[tokio::test]
    async fn a_java_only_answer_is_an_online_server() {
        // the same port carries a TCP responder and no UDP listener, so the
        // bedrock half of an unknown-type ping must fail on its own
        let port = spawn_java_server(JSON).await;
        let report = ping_server("127.0.0.1", options_for(ServerType::Unknown, port)).await;

        assert!(report.online());
        let java = report.java.as_ref().unwrap();
        assert_eq!(java.response().unwrap()["players"]["online"], 1);
        assert_eq!(java.address.as_ref().unwrap().connect_points.len(), 1);

        let bedrock = report.bedrock.as_ref().unwrap();
        assert!(bedrock.result.is_err());
        assert_eq!(report.failures().count(), 1);
        assert!(report.into_result().is_ok());
    }

    #[tokio::test]
    async fn a_bedrock_server_answers_a_bedrock_ping() {
        let port = spawn_bedrock_server("MCPE;Hello;712;1.21.50;1;10").await;
        let report = ping_server("127.0.0.1", options_for(ServerType::Bedrock, port)).await;

        assert!(report.online());
        assert!(report.java.is_none());
        let bedrock = report.bedrock.as_ref().unwrap();
        assert_eq!(
            bedrock.response().unwrap().motd_1.as_deref(),
            Some("Hello")
        );
        assert!(bedrock.latency().is_some());
    }

    #[tokio::test]
    async fn filter_rejection_skips_the_protocol() {
        let options = PingOptions {
            address_filter: Some(Arc::new(|_ip, _port| false)),
            ..options_for(ServerType::Bedrock, 19132)
        };
        let report = ping_server("127.0.0.1", options).await;

        assert!(!report.online());
        let bedrock = report.bedrock.as_ref().unwrap();
        assert!(!bedrock.address_accepted);
        assert!(bedrock.address.is_some());
        assert!(matches!(
            report.into_result(),
            Err(Error::AddressRejected)
        ));
    }

    #[tokio::test]
    async fn filter_sees_the_resolved_address() {
        let port = spawn_bedrock_server("MCPE;Hi").await;
        let expected = port;
        let options = PingOptions {
            address_filter: Some(Arc::new(move |ip, port| {
                ip.is_loopback() && port == expected
            })),
            ..options_for(ServerType::Bedrock, port)
        };
        let report = ping_server("127.0.0.1", options).await;
        assert!(report.online());
    }

    #[tokio::test]
    async fn both_editions_failing_aggregates_both_reasons() {
        let report = ping_server("127.0.0.1", options_for(ServerType::Unknown, 1)).await;
        assert!(!report.online());
        assert_eq!(report.failures().count(), 2);
        assert!(matches!(
            report.into_result(),
            Err(Error::Aggregate(reasons)) if reasons.len() == 2
        ));
    }

    #[tokio::test]
    async fn resolution_failures_are_captured_not_thrown() {
        let options = PingOptions {
            server_type: ServerType::Java,
            family: Some(AddressFamily::V6),
            timeout: Some(Duration::from_millis(200)),
            ..Default::default()
        };
        let report = ping_server("127.0.0.1", options).await;

        let java = report.java.as_ref().unwrap();
        assert!(java.address.is_none());
        assert!(java.address_accepted);
        assert!(matches!(
            report.into_result(),
            Err(Error::AddressFamilyMismatch(_))
        ));
    }
}
