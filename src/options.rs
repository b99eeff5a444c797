//! Options accepted by the ping orchestrator, plus the pre-flight sanity
//! check over them.

use std::{fmt, net::IpAddr, sync::Arc, time::Duration};

use crate::{
    Error,
    address::AddressFamily,
};

/// Which edition(s) a ping should try.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum ServerType {
    Java,
    Bedrock,
    /// Try both editions and report whichever answers.
    #[default]
    Unknown,
}

impl ServerType {
    pub(crate) const fn includes_java(self) -> bool {
        matches!(self, Self::Java | Self::Unknown)
    }

    pub(crate) const fn includes_bedrock(self) -> bool {
        matches!(self, Self::Bedrock | Self::Unknown)
    }
}

impl fmt::Display for ServerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Java => "java",
            Self::Bedrock => "bedrock",
            Self::Unknown => "unknown",
        })
    }
}

/// SRV lookup policy for address resolution.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum SrvPolicy {
    /// Attempt SRV resolution where the convention applies: a Java lookup
    /// of a non-literal host with no explicitly pinned port.
    #[default]
    Auto,
    /// Never attempt SRV resolution.
    Disabled,
    /// Always attempt SRV resolution; a missing record makes the whole
    /// resolution invalid. May conflict with an explicit port, whose value
    /// the record then overrides.
    Force,
}

/// A caller-supplied acceptance check over the resolved address, invoked
/// before any socket is opened. Returning `false` records the rejection and
/// skips that protocol.
pub type AddressFilter = Arc<dyn Fn(IpAddr, u16) -> bool + Send + Sync>;

/// Configuration for [`crate::tokio::ping_server`].
///
/// Bare shorthands convert into this struct: a `u16` pins the port, a
/// [`ServerType`] pins the edition.
///
/// # Examples
///
/// ```
/// use mcstatus::{PingOptions, ServerType};
///
/// let options = PingOptions {
///     server_type: ServerType::Java,
///     ..Default::default()
/// };
/// assert!(options.validate().is_ok());
/// ```
#[derive(Clone, Default)]
pub struct PingOptions {
    /// The edition(s) to try. `Unknown` tries both.
    pub server_type: ServerType,
    /// An explicit port, overriding the edition default.
    pub server_port: Option<u16>,
    /// Present this hostname inside the Java handshake instead of the
    /// queried host or SRV target.
    pub force_hostname: Option<String>,
    /// SRV lookup policy, passed through to address resolution.
    pub srv_policy: SrvPolicy,
    /// Hard address-family restriction.
    pub family: Option<AddressFamily>,
    /// Prefer IPv6 DNS answers when both families resolve.
    pub prefer_ipv6: bool,
    /// Per-operation time budget. [`crate::DEFAULT_TIMEOUT`] when unset.
    pub timeout: Option<Duration>,
    /// Optional address-acceptance filter.
    pub address_filter: Option<AddressFilter>,
}

impl PingOptions {
    /// Pre-flight sanity check, mirroring what a caller-facing surface
    /// would validate before handing options to the core. The core itself
    /// never consults this.
    ///
    /// # Errors
    /// [`Error::InvalidOption`] naming the offending field.
    pub fn validate(&self) -> Result<(), Error> {
        if self.server_port == Some(0) {
            return Err(Error::InvalidOption("server_port must be in [1, 65535]"));
        }
        if self.timeout == Some(Duration::ZERO) {
            return Err(Error::InvalidOption("timeout must be non-zero"));
        }
        if self.force_hostname.as_deref() == Some("") {
            return Err(Error::InvalidOption("force_hostname must not be empty"));
        }
        Ok(())
    }
}

impl fmt::Debug for PingOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PingOptions")
            .field("server_type", &self.server_type)
            .field("server_port", &self.server_port)
            .field("force_hostname", &self.force_hostname)
            .field("srv_policy", &self.srv_policy)
            .field("family", &self.family)
            .field("prefer_ipv6", &self.prefer_ipv6)
            .field("timeout", &self.timeout)
            .field("address_filter", &self.address_filter.as_ref().map(|_| ".."))
            .finish()
    }
}

impl From<ServerType> for PingOptions {
    fn from(server_type: ServerType) -> Self {
        Self {
            server_type,
            ..Self::default()
        }
    }
}

impl From<u16> for PingOptions {
    fn from(server_port: u16) -> Self {
        Self {
            server_port: Some(server_port),
            ..Self::default()
        }
    }
}
