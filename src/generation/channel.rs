//! Streaming progress channel for generation jobs.
//!
//! [`ProgressChannel`] delivers [`ProgressEvent`]s over a pluggable
//! transport and owns the reconnect policy: an unexpectedly closed or
//! unreachable connection is retried with linear backoff, a delivered event
//! resets the failure counter, and the third consecutive failure degrades
//! the channel exactly once. A deliberate [`ProgressChannel::close`] or a
//! terminal event ends the channel with no further connection attempts.

use std::time::Duration;

use thiserror::Error;
use tracing::{debug, warn};

use crate::api::types::ProgressEvent;

use super::session::GenerationPhase;

#[derive(Debug, Error)]
pub enum ChannelError {
    #[error("connection failed: {0}")]
    Connection(String),
    #[error("protocol error: {0}")]
    Protocol(String),
}

/// One item pulled from an open event stream.
#[derive(Debug)]
pub enum StreamItem {
    Event(ProgressEvent),
    /// The peer closed the stream (or the transport erred out).
    Closed,
}

/// An open, ordered stream of progress events.
pub trait EventStream {
    fn next_event(&mut self) -> impl Future<Output = StreamItem> + Send;
}

/// Connection factory for progress streams. The production implementation
/// is [`WsTransport`]; tests substitute a scripted fake.
pub trait ProgressTransport {
    type Stream: EventStream + Send;

    fn connect(
        &mut self,
        podcast_id: i64,
    ) -> impl Future<Output = Result<Self::Stream, ChannelError>> + Send;
}

/// What a [`ProgressChannel::next`] call produced.
#[derive(Debug)]
pub enum ChannelUpdate {
    Event(ProgressEvent),
    /// Reconnection attempts are exhausted. Delivered at most once; every
    /// later call answers `Closed`.
    Degraded,
    /// The channel is closed and will never deliver again.
    Closed,
}

pub struct ProgressChannel<T: ProgressTransport> {
    transport: T,
    podcast_id: i64,
    stream: Option<T::Stream>,
    consecutive_failures: u32,
    max_attempts: u32,
    base_delay: Duration,
    closed: bool,
}

impl<T: ProgressTransport> ProgressChannel<T> {
    pub fn new(
        transport: T,
        podcast_id: i64,
        max_attempts: u32,
        base_delay: Duration,
    ) -> Self {
        Self {
            transport,
            podcast_id,
            stream: None,
            consecutive_failures: 0,
            max_attempts,
            base_delay,
            closed: false,
        }
    }

    /// Deliver the next update, transparently reconnecting on unexpected
    /// closure. Attempt `n` of a reconnect run waits `n × base_delay`
    /// before dialing; the first connect of a healthy channel dials
    /// immediately.
    pub async fn next(&mut self) -> ChannelUpdate {
        loop {
            if self.closed {
                return ChannelUpdate::Closed;
            }
            match &mut self.stream {
                Some(stream) => match stream.next_event().await {
                    StreamItem::Event(event) => {
                        self.consecutive_failures = 0;
                        if is_terminal_status(&event.status) {
                            // The job is over; an ensuing server-side close
                            // is expected, not a failure.
                            self.closed = true;
                            self.stream = None;
                        }
                        return ChannelUpdate::Event(event);
                    }
                    StreamItem::Closed => {
                        debug!(podcast_id = self.podcast_id, "progress stream closed");
                        self.stream = None;
                        if self.record_failure() {
                            return ChannelUpdate::Degraded;
                        }
                    }
                },
                None => {
                    if self.consecutive_failures > 0 {
                        let delay = self.base_delay * self.consecutive_failures;
                        debug!(
                            podcast_id = self.podcast_id,
                            attempt = self.consecutive_failures + 1,
                            delay_ms = delay.as_millis() as u64,
                            "reconnecting"
                        );
                        tokio::time::sleep(delay).await;
                    }
                    match self.transport.connect(self.podcast_id).await {
                        Ok(stream) => self.stream = Some(stream),
                        Err(error) => {
                            warn!(podcast_id = self.podcast_id, %error, "connect failed");
                            if self.record_failure() {
                                return ChannelUpdate::Degraded;
                            }
                        }
                    }
                }
            }
        }
    }

    /// Count one consecutive failure; exhausting the budget closes the
    /// channel and reports the single `Degraded` delivery.
    fn record_failure(&mut self) -> bool {
        self.consecutive_failures += 1;
        if self.consecutive_failures >= self.max_attempts {
            self.closed = true;
            true
        } else {
            false
        }
    }

    /// Deliberately close the channel. No reconnect will follow, whatever
    /// the failure counter says.
    pub fn close(&mut self) {
        self.closed = true;
        self.stream = None;
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }
}

fn is_terminal_status(status: &str) -> bool {
    GenerationPhase::from_wire(status).is_some_and(GenerationPhase::is_terminal)
}

/// WebSocket transport against the backend's per-podcast progress endpoint.
pub struct WsTransport {
    ws_url: String,
}

impl WsTransport {
    /// `ws_url` is the backend base with a ws/wss scheme, e.g.
    /// `ws://localhost:8080`.
    pub fn new(ws_url: String) -> Self {
        Self { ws_url }
    }
}

impl ProgressTransport for WsTransport {
    type Stream = WsStream;

    async fn connect(&mut self, podcast_id: i64) -> Result<WsStream, ChannelError> {
        let url = format!("{}/api/ws/podcast-generation/{podcast_id}", self.ws_url);
        debug!(%url, "dialing progress socket");
        let (socket, _) = tokio_tungstenite::connect_async(&url)
            .await
            .map_err(|error| ChannelError::Connection(error.to_string()))?;
        Ok(WsStream { socket })
    }
}

pub struct WsStream {
    socket: tokio_tungstenite::WebSocketStream<
        tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>,
    >,
}

impl EventStream for WsStream {
    async fn next_event(&mut self) -> StreamItem {
        use futures::StreamExt;
        use tokio_tungstenite::tungstenite::Message;

        while let Some(frame) = self.socket.next().await {
            match frame {
                Ok(Message::Text(text)) => match serde_json::from_str(&text) {
                    Ok(event) => return StreamItem::Event(event),
                    Err(error) => {
                        // Malformed frames are dropped; the stream goes on.
                        warn!(%error, "unparseable progress frame");
                    }
                },
                Ok(Message::Ping(_) | Message::Pong(_) | Message::Binary(_)) => {}
                Ok(Message::Close(_)) => return StreamItem::Closed,
                Ok(Message::Frame(_)) => {}
                Err(error) => {
                    warn!(%error, "progress socket error");
                    return StreamItem::Closed;
                }
            }
        }
        StreamItem::Closed
    }
}
