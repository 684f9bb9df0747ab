//! Request/response correlation over the browser WebSocket.
//!
//! One socket carries every page session (flattened targets). Commands are
//! matched to replies by id; events are not consumed by the bot and are
//! dropped after tracing.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use parking_lot::Mutex;
use serde_json::Value;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use tracing::{debug, trace, warn};

use super::error::CdpError;
use super::protocol::{CdpRequest, CdpResponse};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;
type WsSink = SplitSink<WsStream, Message>;
pub(crate) type WsSource = SplitStream<WsStream>;
type Reply = tokio::sync::oneshot::Sender<Result<Value, CdpError>>;

/// Upper bound for a single CDP round trip.
pub(crate) const COMMAND_TIMEOUT: Duration = Duration::from_secs(30);

pub(crate) struct Transport {
    sink: tokio::sync::Mutex<WsSink>,
    in_flight: Mutex<HashMap<u64, Reply>>,
    next_id: AtomicU64,
}

impl Transport {
    /// Split a connected socket into the shared transport and its read half.
    pub(crate) fn split(stream: WsStream) -> (Self, WsSource) {
        let (sink, source) = stream.split();
        let transport = Self {
            sink: tokio::sync::Mutex::new(sink),
            in_flight: Mutex::new(HashMap::new()),
            next_id: AtomicU64::new(1),
        };
        (transport, source)
    }

    fn next_id(&self) -> u64 {
        self.next_id.fetch_add(1, Ordering::SeqCst)
    }

    /// Send one command (browser-level when `session_id` is `None`) and
    /// wait for its reply.
    pub(crate) async fn send(
        &self,
        method: &str,
        params: Option<Value>,
        session_id: Option<&str>,
    ) -> Result<Value, CdpError> {
        let id = self.next_id();
        let request = CdpRequest {
            id,
            method: method.to_string(),
            params,
            session_id: session_id.map(str::to_string),
        };
        let text = serde_json::to_string(&request)?;
        trace!("CDP send: {}", text);

        let (tx, rx) = tokio::sync::oneshot::channel();
        self.in_flight.lock().insert(id, tx);

        let sent = self.sink.lock().await.send(Message::Text(text.into())).await;
        if let Err(e) = sent {
            self.in_flight.lock().remove(&id);
            return Err(e.into());
        }

        match tokio::time::timeout(COMMAND_TIMEOUT, rx).await {
            Ok(Ok(result)) => result,
            Ok(Err(_)) => Err(CdpError::SessionClosed),
            Err(_) => {
                self.in_flight.lock().remove(&id);
                Err(CdpError::Timeout(format!("{} got no reply", method)))
            }
        }
    }

    /// Route one incoming frame. Returns `false` once the socket is done.
    pub(crate) fn dispatch(&self, frame: Result<Message, tokio_tungstenite::tungstenite::Error>) -> bool {
        let text = match frame {
            Ok(Message::Text(text)) => text,
            Ok(Message::Close(_)) => {
                debug!("Browser socket closed");
                return false;
            }
            Ok(_) => return true,
            Err(e) => {
                warn!("Browser socket error: {}", e);
                return false;
            }
        };

        trace!("CDP recv: {}", text.as_str());
        match parse_frame(text.as_str()) {
            Incoming::Reply { id, result } => self.resolve(id, result),
            Incoming::Event { method, session_id } => {
                trace!(session = ?session_id, "CDP event {}", method);
            }
            Incoming::Unknown => {}
        }
        true
    }

    fn resolve(&self, id: u64, result: Result<Value, CdpError>) {
        if let Some(reply) = self.in_flight.lock().remove(&id) {
            let _ = reply.send(result);
        }
    }

    /// Fail every waiting caller now rather than at their timeout.
    pub(crate) fn close(&self) {
        for (_, reply) in self.in_flight.lock().drain() {
            let _ = reply.send(Err(CdpError::SessionClosed));
        }
    }

    /// Drain `source` until the browser goes away.
    pub(crate) async fn pump(&self, mut source: WsSource) {
        while let Some(frame) = source.next().await {
            if !self.dispatch(frame) {
                break;
            }
        }
        self.close();
    }
}

/// A decoded frame from the browser socket.
#[derive(Debug)]
pub(crate) enum Incoming {
    Reply {
        id: u64,
        result: Result<Value, CdpError>,
    },
    Event {
        method: String,
        session_id: Option<String>,
    },
    Unknown,
}

pub(crate) fn parse_frame(text: &str) -> Incoming {
    let response: CdpResponse = match serde_json::from_str(text) {
        Ok(response) => response,
        Err(e) => {
            warn!("Unparseable CDP frame: {}", e);
            return Incoming::Unknown;
        }
    };

    match (response.id, response.method) {
        (Some(id), _) => Incoming::Reply {
            id,
            result: match response.error {
                Some(error) => Err(CdpError::Protocol {
                    code: error.code,
                    message: error.message,
                }),
                None => Ok(response.result.unwrap_or(Value::Null)),
            },
        },
        (None, Some(method)) => Incoming::Event {
            method,
            session_id: response.session_id,
        },
        (None, None) => Incoming::Unknown,
    }
}
