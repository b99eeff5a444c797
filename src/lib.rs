#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]
//! `mcstatus` is a Rust crate that determines whether an address refers to a
//! reachable Minecraft server (Java or Bedrock edition) and retrieves its
//! live status: version, player counts, MOTD, server icon, etc.
//!
//! The crate turns an ambiguous user-supplied address into concrete connect
//! points (literal-IP detection, SRV record lookup, DNS lookup with family
//! preference) and then speaks the matching wire protocol — the Java status
//! ping over TCP or the `RakNet` Unconnected Ping over UDP — within a bounded
//! time budget.
//!
//! The main API surface is [`tokio::ping_server`], which tries one or both
//! editions and reports partial success. The lower layers
//! ([`tokio::resolve_address`], [`tokio::get_status`]) are exported for
//! callers that want to drive resolution and pinging separately.

pub mod tokio;

mod address;
mod bedrock;
mod chat;
mod java;
mod options;

use std::time::Duration;

pub use address::{
    AddressFamily, ConnectPoint, ResolveOptions, ResolvedAddress, ServerAddressInfo, SrvRecord,
    is_ip, is_ipv4, is_ipv6,
};
pub use bedrock::{
    Bedrock, BedrockEdition, BedrockResponse, BedrockTarget, OFFLINE_MESSAGE_DATA_ID,
};
pub use chat::{Chat, ChatComponent, strip_color_codes};
pub use java::{Java, JavaResponse, ModInfo, Player, Players, Version};
pub use options::{AddressFilter, PingOptions, ServerType, SrvPolicy};

/// The timeout applied to every network operation whose caller did not
/// supply one.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(5000);

/// Errors that can occur while resolving a server address or pinging a
/// server.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// An invalid or malformed packet was received.
    #[error("an invalid packet was received")]
    InvalidPacket,
    /// A reply arrived with a packet id other than the expected one.
    #[error("received an unexpected packet")]
    UnexpectedPacket,
    /// A `VarInt` length was negative or too large.
    #[error("VarInt length was negative or too large")]
    InvalidVarInt(#[from] std::num::TryFromIntError),
    /// An I/O error occurred.
    #[error("an I/O error occurred: {0}")]
    IoError(#[from] std::io::Error),
    /// A JSON error occurred.
    #[error("a JSON error occurred: {0}")]
    JsonErr(#[from] serde_json::Error),
    /// Neither a server type nor an explicit port was supplied, so no
    /// default port can be determined.
    #[error("cannot determine a port: neither a server type nor a port was given")]
    MissingTypeOrPort,
    /// An option failed the pre-flight sanity check.
    #[error("invalid option: {0}")]
    InvalidOption(&'static str),
    /// A literal address did not match the requested address family.
    #[error("address family mismatch for `{0}`")]
    AddressFamilyMismatch(String),
    /// DNS lookup for the host provided no usable data.
    #[error("no DNS data for `{0}`")]
    DnsLookupFailed(String),
    /// SRV resolution was forced but no record exists.
    #[error("no SRV record found for `{0}`")]
    SrvLookupFailed(String),
    /// The operation did not settle within its time budget.
    #[error("the operation timed out")]
    Timeout,
    /// The caller-supplied address filter rejected the resolved address.
    #[error("address check fail from the address filter")]
    AddressRejected,
    /// More than one failure occurred across the attempted protocols.
    #[error("{}", join_reasons(.0))]
    Aggregate(Vec<Error>),
}

fn join_reasons(reasons: &[Error]) -> String {
    if reasons.is_empty() {
        return "no ping was attempted".to_string();
    }
    let list = reasons
        .iter()
        .map(Error::to_string)
        .collect::<Vec<_>>()
        .join("; ");
    format!("multiple failures: {list}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aggregate_error_lists_every_reason() {
        let err = Error::Aggregate(vec![Error::Timeout, Error::AddressRejected]);
        let message = err.to_string();
        assert!(message.contains("timed out"));
        assert!(message.contains("address filter"));
    }
}
