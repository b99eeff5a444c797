//! The async implementation, on top of the tokio runtime.

mod address;
mod bedrock;
mod dns;
mod java;
mod ping;

use std::sync::OnceLock;

use hickory_resolver::{
    TokioAsyncResolver,
    config::{ResolverConfig, ResolverOpts},
};

use crate::Error;

pub use address::resolve_address;
pub use dns::{resolve_a, resolve_aaaa, resolve_srv};
pub use ping::{PingReport, ProtocolReport, ping_server};

/// Represents a pingable entity.
pub trait AsyncPingable {
    /// The type of response that is expected in reply to the ping.
    type Response;

    /// Ping the entity, gathering the latency and response.
    fn ping(self)
    -> impl std::future::Future<Output = Result<(u64, Self::Response), Error>> + Send;
}

/// Retrieve the status of a given Minecraft server using a `AsyncPingable`
/// configuration.
///
/// Returns `(latency_ms, response)` where response is a response type of the
/// `AsyncPingable` configuration. Latency is measured from the status
/// request to the first byte of the reply.
///
/// The configurations take a pre-resolved target; see
/// [`resolve_address`] for turning a user-supplied address into one, or
/// [`ping_server`] for the whole pipeline in one call.
///
/// # Examples
///
/// Ping a Java server at a known address:
///
/// ```no_run
/// # async {
/// use mcstatus::{ConnectPoint, Java};
///
/// let (latency, response) = mcstatus::tokio::get_status(Java {
///     target: ConnectPoint {
///         ip: "198.51.100.7".parse().unwrap(),
///         port: 25565,
///     },
///     status_hostname: "mc.example.org".into(),
///     timeout: None,
/// }).await?;
/// # Ok::<(), mcstatus::Error>(())
/// # };
/// ```
///
/// Ping a Bedrock server by hostname, letting the socket-family fallback do
/// its thing:
///
/// ```no_run
/// # async {
/// use mcstatus::{Bedrock, BedrockTarget};
///
/// let (latency, response) = mcstatus::tokio::get_status(Bedrock {
///     target: BedrockTarget::from("play.example.org"),
///     port: 19132,
///     timeout: None,
/// }).await?;
/// # Ok::<(), mcstatus::Error>(())
/// # };
/// ```
///
/// # Errors
/// If the server status cannot be recieved
pub async fn get_status<P: AsyncPingable + Send>(pingable: P) -> Result<(u64, P::Response), Error> {
    pingable.ping().await
}

fn new_resolver() -> TokioAsyncResolver {
    let config = ResolverConfig::cloudflare();
    let mut opts = ResolverOpts::default();
    opts.cache_size = 64;
    opts.attempts = 3;
    TokioAsyncResolver::tokio(config, opts)
}

pub fn resolver() -> &'static TokioAsyncResolver {
    static RESOLVER: OnceLock<TokioAsyncResolver> = OnceLock::new();
    RESOLVER.get_or_init(new_resolver)
}
