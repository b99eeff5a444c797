//! Types for the `RakNet` ping/pong protocol used by Bedrock servers.
//! [Raknet: Unconnected Ping](https://wiki.vg/Raknet_Protocol#Unconnected_Ping)
//!
//! The wire exchange itself lives in [`crate::tokio`].

use std::{fmt, net::IpAddr, time::Duration};

use crate::address::{AddressFamily, parse_ip};

/// Raknets default `OFFLINE_MESSAGE_DATA_ID`.
/// See more: [Raknet: Data Types](https://wiki.vg/Raknet_Protocol#Data_types)
pub const OFFLINE_MESSAGE_DATA_ID: &[u8] = &[
    0x00, 0xff, 0xff, 0x00, 0xfe, 0xfe, 0xfe, 0xfe, 0xfd, 0xfd, 0xfd, 0xfd, 0x12, 0x34, 0x56, 0x78,
];

/// The default port of a Raknet Bedrock Server.
pub const DEFAULT_PORT: u16 = 19132;

/// What a Bedrock ping should be aimed at.
///
/// A pre-resolved address pins the socket family. A raw hostname instead
/// walks an ordered v6-then-v4 socket candidate list, because binding and
/// per-family hostname resolution can fail independently of address
/// resolution proper.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum BedrockTarget {
    Addr(IpAddr),
    Hostname(String),
}

impl BedrockTarget {
    /// Socket families to attempt, in order.
    pub(crate) fn socket_families(&self) -> &'static [AddressFamily] {
        match self {
            Self::Addr(IpAddr::V4(_)) => &[AddressFamily::V4],
            Self::Addr(IpAddr::V6(_)) => &[AddressFamily::V6],
            Self::Hostname(_) => &[AddressFamily::V6, AddressFamily::V4],
        }
    }
}

impl From<IpAddr> for BedrockTarget {
    fn from(ip: IpAddr) -> Self {
        Self::Addr(ip)
    }
}

impl From<&str> for BedrockTarget {
    fn from(host: &str) -> Self {
        parse_ip(host).map_or_else(|| Self::Hostname(host.to_string()), Self::Addr)
    }
}

impl fmt::Display for BedrockTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Addr(ip) => ip.fmt(f),
            Self::Hostname(host) => f.write_str(host),
        }
    }
}

/// Configuration for pinging a Bedrock server.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
///
/// use mcstatus::{Bedrock, BedrockTarget};
///
/// let bedrock_config = Bedrock {
///     target: BedrockTarget::from("play.example.org"),
///     port: 19132,
///     timeout: Some(Duration::from_secs(10)),
/// };
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Bedrock {
    /// The server to ping: a pre-resolved address or a raw hostname.
    pub target: BedrockTarget,
    /// The UDP port to ping.
    pub port: u16,
    /// The time budget for the whole exchange.
    /// [`crate::DEFAULT_TIMEOUT`] when unset.
    pub timeout: Option<Duration>,
}

/// Represents the edition of a bedrock server.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub enum BedrockEdition {
    PocketEdition,
    EducationEdition,
    /// An unknown edition string.
    Other(String),
}

impl fmt::Display for BedrockEdition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PocketEdition => f.write_str("MCPE"),
            Self::EducationEdition => f.write_str("MCEE"),
            Self::Other(s) => f.write_str(s),
        }
    }
}

impl From<String> for BedrockEdition {
    fn from(edition: String) -> Self {
        match edition.to_lowercase().as_ref() {
            "mcpe" => Self::PocketEdition,
            "mcee" => Self::EducationEdition,
            _ => Self::Other(edition),
        }
    }
}

/// Bedrock Server Payload Response
///
/// The semicolon-separated advertise fields of an Unconnected Pong, plus
/// the server GUID carried in the packet itself. Servers routinely truncate
/// the advertise string; any field it does not carry is `None` rather than
/// an error.
///
/// See More: [Raknet: Unconnected Pong](https://wiki.vg/Raknet_Protocol#Unconnected_Pong)
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct BedrockResponse {
    /// The server's edition.
    pub edition: BedrockEdition,
    /// The first line of the server's Message Of The Day (MOTD).
    ///
    /// In practice, this seems to be the only line that the bedrock clients
    /// display, and therefore the only line servers usually send.
    pub motd_1: Option<String>,
    /// The server's protocol version (ex: 390).
    pub protocol_version: Option<i64>,
    /// The name of the servers version (ex: 1.16.200).
    pub version_name: Option<String>,
    /// The numbers of players online.
    pub players_online: Option<i64>,
    /// The maximum number of players that could be online at once.
    pub players_max: Option<i64>,
    /// The server UUID as advertised in the status line.
    pub server_id: Option<i64>,
    /// The second line of the server's MOTD.
    ///
    /// In practice, it looks like servers don't really use this. It seems
    /// to get used sometimes to communicate the server software being used
    /// (e.g. PocketMine-MP).
    pub motd_2: Option<String>,
    /// The game mode the server defaults new users to (e.g. "Survival").
    pub game_mode: Option<String>,
    /// The numerical representation of `game_mode` (e.g. "1").
    pub game_mode_id: Option<i64>,
    /// The port to connect to the server on with an IPv4 address.
    pub port_v4: Option<u16>,
    /// The port to connect to the server on with an IPv6 address.
    pub port_v6: Option<u16>,
    /// The server GUID from the pong packet header.
    pub server_guid: u64,
}

impl BedrockResponse {
    /// Extracts information from the semicolon-separated advertise payload.
    ///
    /// Edition (MCPE or MCEE for Education Edition)
    /// MOTD line 1
    /// Protocol Version
    /// Version Name
    /// Player Count
    /// Max Player Count
    /// Server Unique ID
    /// MOTD line 2
    /// Game mode
    /// Game mode (numeric)
    /// Port (IPv4)
    /// Port (IPv6)
    pub(crate) fn extract(payload: &str, server_guid: u64) -> Self {
        let mut parts = payload.split(';').map(ToString::to_string);

        Self {
            edition: BedrockEdition::from(parts.next().unwrap_or_default()),
            motd_1: parts.next(),
            protocol_version: parts.next().and_then(|s| s.parse().ok()),
            version_name: parts.next(),
            players_online: parts.next().and_then(|s| s.parse().ok()),
            players_max: parts.next().and_then(|s| s.parse().ok()),
            server_id: parts.next().and_then(|s| s.parse().ok()),
            motd_2: parts.next(),
            game_mode: parts.next(),
            game_mode_id: parts.next().and_then(|s| s.parse().ok()),
            port_v4: parts.next().and_then(|s| s.parse().ok()),
            port_v6: parts.next().and_then(|s| s.parse().ok()),
            server_guid,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_advertise_string_extracts_every_field() {
        let payload = "MCPE;A Bedrock Server;712;1.21.50;5;20;1234567890;Second line;Survival;1;19132;19133";
        let response = BedrockResponse::extract(payload, 42);
        assert_eq!(response.edition, BedrockEdition::PocketEdition);
        assert_eq!(response.motd_1.as_deref(), Some("A Bedrock Server"));
        assert_eq!(response.protocol_version, Some(712));
        assert_eq!(response.version_name.as_deref(), Some("1.21.50"));
        assert_eq!(response.players_online, Some(5));
        assert_eq!(response.players_max, Some(20));
        assert_eq!(response.server_id, Some(1_234_567_890));
        assert_eq!(response.motd_2.as_deref(), Some("Second line"));
        assert_eq!(response.game_mode.as_deref(), Some("Survival"));
        assert_eq!(response.game_mode_id, Some(1));
        assert_eq!(response.port_v4, Some(19132));
        assert_eq!(response.port_v6, Some(19133));
        assert_eq!(response.server_guid, 42);
    }

    #[test]
    fn truncated_advertise_string_degrades_to_none() {
        let response = BedrockResponse::extract("MCEE;Hi", 0);
        assert_eq!(response.edition, BedrockEdition::EducationEdition);
        assert_eq!(response.motd_1.as_deref(), Some("Hi"));
        assert_eq!(response.protocol_version, None);
        assert_eq!(response.players_online, None);
        assert_eq!(response.port_v6, None);
    }

    #[test]
    fn zero_length_motd_survives_extraction() {
        let response = BedrockResponse::extract("MCPE;;390;1.16.200", 7);
        assert_eq!(response.motd_1.as_deref(), Some(""));
        assert_eq!(response.protocol_version, Some(390));
    }

    #[test]
    fn unknown_edition_is_preserved_verbatim() {
        let response = BedrockResponse::extract("Custom;x", 0);
        assert_eq!(
            response.edition,
            BedrockEdition::Other("Custom".to_string())
        );
        assert_eq!(response.edition.to_string(), "Custom");
    }

    #[test]
    fn hostname_targets_walk_both_socket_families() {
        let target = BedrockTarget::from("play.example.org");
        assert_eq!(
            target.socket_families(),
            [AddressFamily::V6, AddressFamily::V4]
        );

        let pinned = BedrockTarget::from("192.0.2.1");
        assert_eq!(pinned.socket_families(), [AddressFamily::V4]);
        assert!(matches!(pinned, BedrockTarget::Addr(IpAddr::V4(_))));
    }
}
