//! The `RakNet` Unconnected Ping exchange over UDP, with the v6-then-v4
//! socket fallback for raw hostname targets.
//! [Raknet: Unconnected Ping](https://wiki.vg/Raknet_Protocol#Unconnected_Ping)

use std::{net::SocketAddr, time::Instant};

use tokio::{
    net::{UdpSocket, lookup_host},
    time::timeout,
};
use tracing::{debug, trace};

use super::AsyncPingable;
use crate::{
    DEFAULT_TIMEOUT, Error,
    address::AddressFamily,
    bedrock::{Bedrock, BedrockResponse, BedrockTarget, OFFLINE_MESSAGE_DATA_ID},
};

const UNCONNECTED_PING_ID: u8 = 0x01;
const UNCONNECTED_PONG_ID: u8 = 0x1c;

/// Unconnected Ping wire size: message id, ping id, magic, client GUID
/// placeholder, and two bytes of legacy padding.
const PING_LEN: usize = 35;

/// Pong header: message id, ping id echo, server GUID, magic. The advertise
/// string follows.
const PONG_HEADER_LEN: usize = 33;

/// Large enough for any single advertise datagram.
const RECV_BUFFER_LEN: usize = 1500;

impl AsyncPingable for Bedrock {
    type Response = BedrockResponse;

    async fn ping(self) -> Result<(u64, BedrockResponse), Error> {
        let limit = self.timeout.unwrap_or(DEFAULT_TIMEOUT);
        match timeout(limit, candidate_walk(&self.target, self.port)).await {
            Ok(outcome) => outcome,
            // cancelling the walk drops whichever socket was live
            Err(_elapsed) => Err(Error::Timeout),
        }
    }
}

/// Try each socket-family candidate in order. A candidate that cannot bind,
/// resolve, or address the target is skipped; anything that fails after the
/// ping left the socket is terminal.
async fn candidate_walk(target: &BedrockTarget, port: u16) -> Result<(u64, BedrockResponse), Error> {
    let mut last_skip: Option<Error> = None;

    for family in target.socket_families() {
        let socket = match UdpSocket::bind(family.unspecified()).await {
            Ok(socket) => socket,
            Err(e) => {
                trace!(?family, error = %e, "socket bind failed, trying next family");
                last_skip = Some(e.into());
                continue;
            }
        };

        let Some(destination) = destination_for(target, *family, port).await else {
            trace!(?family, %target, "no address of this family, trying next");
            continue;
        };

        if let Err(e) = socket.connect(destination).await {
            trace!(?family, %destination, error = %e, "socket connect failed, trying next family");
            last_skip = Some(e.into());
            continue;
        }

        return exchange(&socket, destination).await;
    }

    Err(last_skip.unwrap_or_else(|| Error::DnsLookupFailed(target.to_string())))
}

/// The concrete destination for one socket-family candidate, or `None` when
/// the target has no address of that family.
async fn destination_for(
    target: &BedrockTarget,
    family: AddressFamily,
    port: u16,
) -> Option<SocketAddr> {
    match target {
        BedrockTarget::Addr(ip) => Some(SocketAddr::new(*ip, port)),
        BedrockTarget::Hostname(host) => match lookup_host((host.as_str(), port)).await {
            Ok(addresses) => addresses.into_iter().find(|addr| family.contains(addr.ip())),
            Err(_) => None,
        },
    }
}

async fn exchange(socket: &UdpSocket, destination: SocketAddr) -> Result<(u64, BedrockResponse), Error> {
    let ping = build_unconnected_ping(rand::random());
    socket.send(&ping).await?;
    let sent_at = Instant::now();
    trace!(%destination, "unconnected ping sent");

    let mut buffer = [0; RECV_BUFFER_LEN];
    let received = socket.recv(&mut buffer).await?;
    let latency = u64::try_from(sent_at.elapsed().as_millis()).unwrap_or(u64::MAX);

    let datagram = &buffer[..received];
    if datagram.first() != Some(&UNCONNECTED_PONG_ID) {
        return Err(Error::UnexpectedPacket);
    }

    let response = parse_unconnected_pong(datagram)?;
    debug!(%destination, latency, "unconnected pong received");
    Ok((latency, response))
}

fn build_unconnected_ping(ping_id: u64) -> [u8; PING_LEN] {
    let mut packet = [0; PING_LEN];
    packet[0] = UNCONNECTED_PING_ID;
    packet[1..9].copy_from_slice(&ping_id.to_be_bytes());
    packet[9..25].copy_from_slice(OFFLINE_MESSAGE_DATA_ID);
    // bytes 25..33 stay zero: the client GUID placeholder
    packet
}

fn parse_unconnected_pong(datagram: &[u8]) -> Result<BedrockResponse, Error> {
    if datagram.len() < PONG_HEADER_LEN {
        return Err(Error::InvalidPacket);
    }
    // the ping id echo is parsed but deliberately not matched against what
    // was sent; real servers echo whatever arrives
    let _ping_id = read_u64(datagram, 1)?;
    let server_guid = read_u64(datagram, 9)?;
    // bytes 17..33 carry the offline-message magic, echoed verbatim

    let advertise = decode_advertise(&datagram[PONG_HEADER_LEN..]);
    Ok(BedrockResponse::extract(&advertise, server_guid))
}

/// Decode the advertise string, tolerating both framings seen in the wild:
/// a 2-byte big-endian length prefix when it is consistent with the
/// datagram, otherwise the raw remainder.
fn decode_advertise(tail: &[u8]) -> String {
    if tail.len() >= 2 {
        let declared = usize::from(u16::from_be_bytes([tail[0], tail[1]]));
        if let Some(framed) = tail.get(2..2 + declared) {
            return String::from_utf8_lossy(framed).into_owned();
        }
    }
    String::from_utf8_lossy(tail).into_owned()
}

fn read_u64(data: &[u8], offset: usize) -> Result<u64, Error> {
    let bytes = data
        .get(offset..offset + 8)
        .and_then(|slice| <[u8; 8]>::try_from(slice).ok())
        .ok_or(Error::InvalidPacket)?;
    Ok(u64::from_be_bytes(bytes))
}
