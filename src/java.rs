//! Types for the Java Minecraft ping protocol.
//! [Server List Ping](https://wiki.vg/Server_List_Ping)
//!
//! The wire exchange itself lives in [`crate::tokio`].

use std::time::Duration;

use serde::Deserialize;

use crate::{Error, address::ConnectPoint, chat::Chat};

/// The default port of a Java edition server.
pub const DEFAULT_PORT: u16 = 25565;

/// Configuration for pinging a Java server.
///
/// The target is a pre-resolved connect point; hostname-level concerns (SRV
/// redirection, DNS, family preference) are handled by address resolution
/// before this type is built. `status_hostname` is what the handshake
/// presents to the server, which virtual-hosting servers use to pick the
/// status they answer with.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
///
/// use mcstatus::{ConnectPoint, Java};
///
/// let java_config = Java {
///     target: ConnectPoint {
///         ip: "198.51.100.7".parse().unwrap(),
///         port: 25565,
///     },
///     status_hostname: "mc.example.org".to_string(),
///     timeout: Some(Duration::from_secs(10)),
/// };
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Java {
    /// The socket destination to connect to.
    pub target: ConnectPoint,
    /// The hostname presented inside the handshake packet.
    pub status_hostname: String,
    /// The time budget for the whole exchange.
    /// [`crate::DEFAULT_TIMEOUT`] when unset.
    pub timeout: Option<Duration>,
}

#[derive(Debug, Deserialize)]
pub struct ForgeModMetadata {
    pub modid: String,
    pub version: String,
}

#[derive(Debug, Deserialize)]
pub struct ForgeModInfoList {
    #[serde(rename = "modList")]
    pub mod_list: Vec<ForgeModMetadata>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
pub enum ModInfo {
    #[serde(rename = "FML")]
    Fml(ForgeModInfoList),
}

/// A typed view of the Java status document.
///
/// The ping itself yields the raw JSON document, since servers are free to
/// extend or mangle the schema; this view is an opt-in decode of the common
/// shape via [`JavaResponse::from_value`].
///
/// More information can be found [here](https://wiki.vg/Server_List_Ping).
#[derive(Debug, Deserialize)]
pub struct JavaResponse {
    /// The version of the server.
    pub version: Version,
    /// Information about online players.
    pub players: Players,
    /// The description of the server (MOTD).
    pub description: Chat,
    /// The server icon (a Base64-encoded PNG image).
    pub favicon: Option<String>,
    /// Mod information.
    pub modinfo: Option<ModInfo>,
    /// Does this server enforce chat signing?
    #[serde(rename = "enforcesSecureChat")]
    pub enforces_secure_chat: Option<bool>,
    /// Does this server have chat previews?
    #[serde(rename = "previewsChat")]
    pub previews_chat: Option<bool>,
}

impl JavaResponse {
    /// Decode the raw status document into the typed view.
    ///
    /// # Errors
    /// [`Error::JsonErr`] when the document does not match the common
    /// schema.
    pub fn from_value(value: &serde_json::Value) -> Result<Self, Error> {
        Self::deserialize(value).map_err(Error::from)
    }

    /// The MOTD as plain text.
    #[must_use]
    pub fn motd(&self, strip_color_codes: bool) -> String {
        self.description.decode(strip_color_codes)
    }
}

/// Information about the server's version.
#[derive(Debug, Deserialize)]
pub struct Version {
    /// The name of the version the server is running.
    ///
    /// In practice this comes in a large variety of different formats.
    pub name: String,
    /// See [Protocol Version Numbers](https://wiki.vg/Protocol_version_numbers)
    pub protocol: i64,
}

/// An online player of the server.
#[derive(Debug, Deserialize)]
pub struct Player {
    /// The name of the player.
    pub name: String,
    /// The player's UUID.
    pub id: String,
}

/// The stats for players on the server.
#[derive(Debug, Deserialize)]
pub struct Players {
    /// The max amount of players.
    pub max: i64,
    /// The amount of players online.
    pub online: i64,
    /// A preview of which players are online.
    ///
    /// In practice servers often don't send this or use it for more
    /// advertising.
    pub sample: Option<Vec<Player>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn typed_view_decodes_a_real_status_document() {
        let document = serde_json::json!({
            "version": {"name": "1.21.4", "protocol": 769},
            "players": {"max": 100, "online": 3, "sample": [
                {"name": "jeb_", "id": "853c80ef-3c37-49fd-aa49-938b674adae6"}
            ]},
            "description": {"text": "A Minecraft Server"},
            "favicon": "data:image/png;base64,AAAA",
            "enforcesSecureChat": true,
        });
        let response = JavaResponse::from_value(&document).unwrap();
        assert_eq!(response.version.protocol, 769);
        assert_eq!(response.players.online, 3);
        assert_eq!(response.motd(false), "A Minecraft Server");
        assert_eq!(response.enforces_secure_chat, Some(true));
    }

    #[test]
    fn typed_view_rejects_an_unrelated_document() {
        let document = serde_json::json!({"hello": "world"});
        assert!(matches!(
            JavaResponse::from_value(&document),
            Err(Error::JsonErr(_))
        ));
    }

    #[test]
    fn string_descriptions_decode_too() {
        let document = serde_json::json!({
            "version": {"name": "Paper 1.20", "protocol": 763},
            "players": {"max": 20, "online": 0},
            "description": "§aHello",
        });
        let response = JavaResponse::from_value(&document).unwrap();
        assert_eq!(response.motd(true), "Hello");
    }
}
