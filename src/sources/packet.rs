//! Engine.IO v4 polling payloads and the Socket.IO packets riding on them.

use serde::Deserialize;
use serde_json::Value;

use crate::error::{Error, Result};

/// Packets in one polling payload are separated by a record separator.
pub const SEPARATOR: char = '\x1e';

/// Sent by the server in the open packet.
#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Handshake {
    pub sid: String,
    /// Milliseconds
    pub ping_interval: u64,
    /// Milliseconds
    pub ping_timeout: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Packet {
    Open(Handshake),
    Close,
    Ping(String),
    Pong(String),
    Message(String),
    Upgrade,
    Noop,
    /// Base64 binary attachment, never used for post snapshots.
    Binary(String),
}

/// What this client ever sends: pongs, and messages such as the namespace join.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientPacket {
    Pong(String),
    Message(String),
}

impl ClientPacket {
    pub fn encode(&self) -> String {
        match self {
            ClientPacket::Pong(data) => format!("3{data}"),
            ClientPacket::Message(data) => format!("4{data}"),
        }
    }
}

pub const DEFAULT_NAMESPACE: &str = "/";

/// A Socket.IO packet and the namespace it was addressed to.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pub namespace: String,
    pub packet: SocketPacket,
}

/// Socket.IO packet carried inside an Engine.IO message.
#[derive(Debug, Clone, PartialEq)]
pub enum SocketPacket {
    Connect,
    Disconnect,
    Event { name: String, data: Value },
    ConnectError(String),
    /// Acks and binary events. Nothing here needs them.
    Other(u8),
}

impl Packet {
    pub fn decode(raw: &str) -> Result<Packet> {
        let mut chars = raw.chars();
        let kind = chars
            .next()
            .ok_or_else(|| Error::Protocol("empty packet".into()))?;
        let data = chars.as_str();

        Ok(match kind {
            '0' => Packet::Open(serde_json::from_str(data)?),
            '1' => Packet::Close,
            '2' => Packet::Ping(data.into()),
            '3' => Packet::Pong(data.into()),
            '4' => Packet::Message(data.into()),
            '5' => Packet::Upgrade,
            '6' => Packet::Noop,
            'b' => Packet::Binary(data.into()),
            other => return Err(Error::Protocol(format!("unknown packet type `{other}`"))),
        })
    }
}

/// Splits a polling response body into packets.
pub fn decode_payload(body: &str) -> Result<Vec<Packet>> {
    body.split(SEPARATOR)
        .filter(|raw| !raw.is_empty())
        .map(Packet::decode)
        .collect()
}

impl Frame {
    /// Decodes `<type>[/namespace,][ack id][json]`.
    pub fn decode(raw: &str) -> Result<Frame> {
        let mut chars = raw.chars();
        let kind = chars
            .next()
            .and_then(|c| c.to_digit(10))
            .ok_or_else(|| Error::Protocol(format!("bad socket.io packet `{raw}`")))?;
        let mut rest = chars.as_str();

        let mut namespace = DEFAULT_NAMESPACE;
        if rest.starts_with('/') {
            (namespace, rest) = match rest.find(',') {
                Some(pos) => (&rest[..pos], &rest[pos + 1..]),
                None => (rest, ""),
            };
        }
        let rest = rest.trim_start_matches(|c: char| c.is_ascii_digit());

        let packet = match kind {
            0 => SocketPacket::Connect,
            1 => SocketPacket::Disconnect,
            2 => {
                let mut args = match serde_json::from_str::<Value>(rest)? {
                    Value::Array(args) => args.into_iter(),
                    _ => return Err(Error::Protocol("event is not an array".into())),
                };
                let name = match args.next() {
                    Some(Value::String(name)) => name,
                    _ => return Err(Error::Protocol("event without a name".into())),
                };
                SocketPacket::Event {
                    name,
                    data: args.next().unwrap_or(Value::Null),
                }
            }
            4 => {
                let message = serde_json::from_str::<Value>(rest)
                    .ok()
                    .and_then(|v| v.get("message").and_then(Value::as_str).map(String::from))
                    .unwrap_or_else(|| rest.to_string());
                SocketPacket::ConnectError(message)
            }
            other => SocketPacket::Other(other as u8),
        };

        Ok(Frame {
            namespace: namespace.to_string(),
            packet,
        })
    }

    pub fn is_default_namespace(&self) -> bool {
        self.namespace == DEFAULT_NAMESPACE
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn packet(raw: &str) -> SocketPacket {
        Frame::decode(raw).unwrap().packet
    }

    #[test]
    fn open_packet() {
        let packets = decode_payload(
            r#"0{"sid":"lv_VI97HAXpY6yYWAAAC","upgrades":["websocket"],"pingInterval":25000,"pingTimeout":20000,"maxPayload":1000000}"#,
        )
        .unwrap();

        assert_eq!(
            packets,
            vec![Packet::Open(Handshake {
                sid: "lv_VI97HAXpY6yYWAAAC".into(),
                ping_interval: 25000,
                ping_timeout: 20000,
            })]
        );
    }

    #[test]
    fn batched_payload() {
        let body = "2\x1e40{\"sid\":\"x\"}\x1e\x1e42[\"newPosts\",[]]\x1e6";
        assert_eq!(
            decode_payload(body).unwrap(),
            vec![
                Packet::Ping(String::new()),
                Packet::Message("0{\"sid\":\"x\"}".into()),
                Packet::Message("2[\"newPosts\",[]]".into()),
                Packet::Noop,
            ]
        );
    }

    #[test]
    fn unknown_packet_type() {
        assert!(decode_payload("9oops").is_err());
    }

    #[test]
    fn client_packets() {
        assert_eq!(ClientPacket::Message("0".into()).encode(), "40");
        assert_eq!(ClientPacket::Pong(String::new()).encode(), "3");
        assert_eq!(ClientPacket::Pong("42".into()).encode(), "342");
    }

    #[test]
    fn event_with_namespace_and_ack() {
        let frame = Frame::decode(r#"2/wall,17["newPosts",[{"type":"youtube"}]]"#).unwrap();
        assert_eq!(frame.namespace, "/wall");
        assert!(!frame.is_default_namespace());
        assert_eq!(
            frame.packet,
            SocketPacket::Event {
                name: "newPosts".into(),
                data: json!([{ "type": "youtube" }]),
            }
        );
    }

    #[test]
    fn namespace_defaults_to_root() {
        let frame = Frame::decode(r#"2["ping"]"#).unwrap();
        assert!(frame.is_default_namespace());
        assert_eq!(
            frame.packet,
            SocketPacket::Event {
                name: "ping".into(),
                data: Value::Null,
            }
        );

        let bare = Frame::decode("0/admin").unwrap();
        assert_eq!(bare.namespace, "/admin");
        assert_eq!(bare.packet, SocketPacket::Connect);
    }

    #[test]
    fn control_packets() {
        assert_eq!(packet(r#"0{"sid":"a"}"#), SocketPacket::Connect);
        assert_eq!(packet("1"), SocketPacket::Disconnect);
        assert_eq!(
            packet(r#"4{"message":"Not authorized"}"#),
            SocketPacket::ConnectError("Not authorized".into())
        );
        assert_eq!(packet("3[]"), SocketPacket::Other(3));
        assert!(Frame::decode("x").is_err());
        assert!(Frame::decode(r#"2{"not":"array"}"#).is_err());
    }
}
