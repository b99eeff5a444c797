//! The Java status ping exchange: varint-framed packets over TCP.
//! [Server List Ping](https://wiki.vg/Server_List_Ping)

use std::time::Instant;

use serde_json::Value;
use tokio::{
    io::{AsyncRead, AsyncReadExt, AsyncWriteExt},
    net::TcpStream,
    time::timeout,
};
use tracing::{debug, trace};

use super::AsyncPingable;
use crate::{DEFAULT_TIMEOUT, Error, address::ConnectPoint, java::Java};

/// Status pings always present protocol version 0; servers answer them
/// regardless of their own version.
const PROTOCOL_VERSION: i32 = 0;
const HANDSHAKE_ID: i32 = 0x00;
const STATUS_REQUEST_ID: i32 = 0x00;
const STATUS_RESPONSE_ID: i32 = 0x00;
const NEXT_STATE_STATUS: i32 = 1;

/// Upper bound on a status response. Far above anything legitimate (the
/// packet format itself caps out around 2 MiB), well below a memory hazard.
const MAX_RESPONSE_LEN: usize = 1 << 21;

impl AsyncPingable for Java {
    type Response = Value;

    async fn ping(self) -> Result<(u64, Value), Error> {
        let limit = self.timeout.unwrap_or(DEFAULT_TIMEOUT);
        match timeout(limit, status_exchange(self.target, &self.status_hostname)).await {
            Ok(outcome) => outcome,
            // cancelling the exchange future drops the socket with it
            Err(_elapsed) => Err(Error::Timeout),
        }
    }
}

async fn status_exchange(target: ConnectPoint, status_hostname: &str) -> Result<(u64, Value), Error> {
    let mut stream = TcpStream::connect(target.socket_addr()).await?;
    // flush every write immediately; coalescing would skew the latency stamp
    stream.set_nodelay(true)?;
    trace!(%target, "connected for status ping");

    let mut handshake = Vec::with_capacity(status_hostname.len() + 16);
    write_varint(&mut handshake, HANDSHAKE_ID);
    write_varint(&mut handshake, PROTOCOL_VERSION);
    write_string(&mut handshake, status_hostname);
    handshake.extend_from_slice(&target.port.to_be_bytes());
    write_varint(&mut handshake, NEXT_STATE_STATUS);
    stream.write_all(&frame_packet(&handshake)?).await?;

    let mut request = Vec::with_capacity(1);
    write_varint(&mut request, STATUS_REQUEST_ID);
    stream.write_all(&frame_packet(&request)?).await?;
    stream.flush().await?;
    let sent_at = Instant::now();

    // the first reply byte stamps the measured delay; the rest of the
    // length varint may still be in flight
    let first = stream.read_u8().await?;
    let latency = u64::try_from(sent_at.elapsed().as_millis()).unwrap_or(u64::MAX);

    let packet_len = usize::try_from(read_varint_after(&mut stream, first).await?)?;
    if packet_len < 2 || packet_len > MAX_RESPONSE_LEN {
        return Err(Error::InvalidPacket);
    }

    // a single read is not guaranteed to carry the whole packet; read_exact
    // keeps pulling until the declared length is buffered
    let mut body = vec![0; packet_len];
    stream.read_exact(&mut body).await?;

    let mut offset = 0;
    if decode_varint(&body, &mut offset)? != STATUS_RESPONSE_ID {
        return Err(Error::UnexpectedPacket);
    }
    let json_len = usize::try_from(decode_varint(&body, &mut offset)?)?;
    let end = offset.checked_add(json_len).ok_or(Error::InvalidPacket)?;
    if end > body.len() {
        return Err(Error::InvalidPacket);
    }

    let document: Value = serde_json::from_slice(&body[offset..end])?;
    debug!(%target, latency, "status response received");
    Ok((latency, document))
}

/// Prefix `body` with its varint-encoded length.
fn frame_packet(body: &[u8]) -> Result<Vec<u8>, Error> {
    let mut framed = Vec::with_capacity(body.len() + 5);
    write_varint(&mut framed, i32::try_from(body.len())?);
    framed.extend_from_slice(body);
    Ok(framed)
}

fn write_varint(out: &mut Vec<u8>, value: i32) {
    let mut remaining = value as u32;
    loop {
        if remaining & !0x7f == 0 {
            out.push(remaining as u8);
            return;
        }
        out.push((remaining & 0x7f | 0x80) as u8);
        remaining >>= 7;
    }
}

fn write_string(out: &mut Vec<u8>, s: &str) {
    write_varint(out, s.len() as i32);
    out.extend_from_slice(s.as_bytes());
}

/// Decode a varint whose first byte has already been consumed.
///
/// VarInts are never longer than 5 bytes.
async fn read_varint_after<R: AsyncRead + Unpin>(reader: &mut R, first: u8) -> Result<i32, Error> {
    let mut value = i32::from(first & 0x7f);
    let mut byte = first;
    for position in 1..5 {
        if byte & 0x80 == 0 {
            return Ok(value);
        }
        byte = reader.read_u8().await?;
        value |= i32::from(byte & 0x7f) << (7 * position);
    }
    if byte & 0x80 == 0 {
        Ok(value)
    } else {
        Err(Error::InvalidPacket)
    }
}

/// Decode a varint from an in-memory packet body, advancing `offset`.
fn decode_varint(data: &[u8], offset: &mut usize) -> Result<i32, Error> {
    let mut value = 0i32;
    for position in 0..5 {
        let byte = *data.get(*offset).ok_or(Error::InvalidPacket)?;
        *offset += 1;
        value |= i32::from(byte & 0x7f) << (7 * position);
        if byte & 0x80 == 0 {
            return Ok(value);
        }
    }
    Err(Error::InvalidPacket)
}
