use std::time::Duration;

use reqwest::header::CONTENT_TYPE;
use tokio::sync::mpsc;

use super::packet::{decode_payload, ClientPacket, Frame, Packet, SocketPacket};
use super::{PostSource, Subscription, SNAPSHOT_BUFFER};
use crate::error::{Error, Result};
use crate::post::{parse_snapshot, Post};

/// Reconnect delays, same as socket.io-client's defaults.
const MIN_RECONNECT_DELAY: Duration = Duration::from_secs(1);
const MAX_RECONNECT_DELAY: Duration = Duration::from_secs(5);

/// Socket.IO server reached over the Engine.IO v4 long-polling transport.
#[derive(Clone)]
pub struct SocketIoSource {
    /// Backend origin, e.g. `https://example.org`
    pub endpoint: String,
    /// Event carrying snapshots
    pub event: String,
    client: reqwest::Client,
}

/// Reconnect delay: doubles after every failed attempt, back to the
/// minimum once a handshake succeeds.
#[derive(Debug)]
struct Backoff {
    current: Duration,
}

impl Backoff {
    fn new() -> Self {
        Self {
            current: MIN_RECONNECT_DELAY,
        }
    }

    fn reset(&mut self) {
        self.current = MIN_RECONNECT_DELAY;
    }

    fn next(&mut self) -> Duration {
        let delay = self.current;
        self.current = (self.current * 2).min(MAX_RECONNECT_DELAY);
        delay
    }
}

enum Outcome {
    /// Server ended the session.
    Closed,
    /// Nobody listens anymore.
    Unsubscribed,
}

impl SocketIoSource {
    pub fn new(endpoint: impl Into<String>, event: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            event: event.into(),
            client: reqwest::Client::new(),
        }
    }

    fn base_url(&self) -> String {
        format!("{}/socket.io/", self.endpoint.trim_end_matches('/'))
    }

    async fn send(&self, sid: &str, packet: ClientPacket) -> Result<()> {
        self.client
            .post(self.base_url())
            .query(&[("EIO", "4"), ("transport", "polling"), ("sid", sid)])
            .header(CONTENT_TYPE, "text/plain;charset=UTF-8")
            .body(packet.encode())
            .send()
            .await?
            .error_for_status()?;

        Ok(())
    }

    async fn poll(&self, sid: Option<&str>, timeout: Option<Duration>) -> Result<Vec<Packet>> {
        let mut req = self
            .client
            .get(self.base_url())
            .query(&[("EIO", "4"), ("transport", "polling")]);
        if let Some(sid) = sid {
            req = req.query(&[("sid", sid)]);
        }
        if let Some(timeout) = timeout {
            req = req.timeout(timeout);
        }

        let body = req.send().await?.error_for_status()?.text().await?;
        decode_payload(&body)
    }

    /// One Engine.IO session, from handshake until it is closed or lost.
    async fn session(&self, tx: &mpsc::Sender<Vec<Post>>, backoff: &mut Backoff) -> Result<Outcome> {
        let handshake = match self.poll(None, None).await?.into_iter().next() {
            Some(Packet::Open(handshake)) => handshake,
            other => return Err(Error::Handshake(format!("expected open packet, got {other:?}"))),
        };
        let sid = handshake.sid.as_str();
        backoff.reset();

        // join the default namespace
        self.send(sid, ClientPacket::Message("0".into())).await?;
        tracing::info!(endpoint = %self.endpoint, sid, "push channel open");

        // the server pings every interval, a poll idle longer than that means it's gone
        let timeout = Duration::from_millis(handshake.ping_interval + handshake.ping_timeout);

        loop {
            for packet in self.poll(Some(sid), Some(timeout)).await? {
                tracing::debug!(?packet, "received");

                let frame = match packet {
                    Packet::Ping(data) => {
                        self.send(sid, ClientPacket::Pong(data)).await?;
                        continue;
                    }
                    Packet::Close => return Ok(Outcome::Closed),
                    Packet::Message(message) => match Frame::decode(&message) {
                        Ok(frame) => frame,
                        Err(e) => {
                            tracing::warn!("skipping socket.io packet: {e}");
                            continue;
                        }
                    },
                    _ => continue,
                };

                // only the default namespace was joined
                if !frame.is_default_namespace() {
                    tracing::debug!(namespace = %frame.namespace, "ignoring packet for another namespace");
                    continue;
                }

                match frame.packet {
                    SocketPacket::Event { name, data } if name == self.event => {
                        let posts = match parse_snapshot(data) {
                            Ok(posts) => posts,
                            Err(e) => {
                                tracing::warn!("ignoring {} payload: {e}", self.event);
                                continue;
                            }
                        };
                        tracing::debug!(count = posts.len(), "snapshot received");
                        if tx.send(posts).await.is_err() {
                            return Ok(Outcome::Unsubscribed);
                        }
                    }
                    SocketPacket::Connect => tracing::debug!("namespace joined"),
                    SocketPacket::Disconnect => return Ok(Outcome::Closed),
                    SocketPacket::ConnectError(message) => return Err(Error::Handshake(message)),
                    _ => {}
                }
            }

            if tx.is_closed() {
                return Ok(Outcome::Unsubscribed);
            }
        }
    }

    /// Keeps a session alive until the subscription is dropped.
    /// Failures are only logged, the wall keeps showing its last snapshot.
    async fn run(self, tx: mpsc::Sender<Vec<Post>>) {
        let mut backoff = Backoff::new();

        loop {
            match self.session(&tx, &mut backoff).await {
                Ok(Outcome::Unsubscribed) => return,
                Ok(Outcome::Closed) => tracing::info!("push channel closed by server"),
                Err(e) => tracing::warn!("push channel lost: {e}"),
            }

            if tx.is_closed() {
                return;
            }

            let delay = backoff.next();
            tracing::debug!(?delay, "reconnecting");
            tokio::time::sleep(delay).await;
        }
    }
}

impl PostSource for SocketIoSource {
    fn subscribe(&self) -> Subscription {
        let (tx, rx) = mpsc::channel(SNAPSHOT_BUFFER);
        let task = tokio::spawn(self.clone().run(tx));
        Subscription::new(rx, task)
    }
}
