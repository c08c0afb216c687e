//! Realtime task changes over a `graphql-transport-ws` websocket.
//!
//! One connection carries the three task subscriptions. Every `next`
//! payload is validated into a [`TaskChange`] before it is pushed to the
//! application event channel. The subscriptions are opened and released
//! together; [`SubscriptionHandle::close`] is the only teardown path.

#[cfg(test)]
#[path = "subscription_test.rs"]
mod tests;

use std::collections::HashMap;
use std::time::Duration;

use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use thiserror::Error;
use tokio::net::TcpStream;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::HeaderValue;
use tokio_tungstenite::tungstenite::{self, Message};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tokio_util::sync::CancellationToken;

use crate::backend::documents;
use crate::config::constants::{ACK_TIMEOUT_SECS, CLOSE_TIMEOUT, CONNECT_TIMEOUT};
use crate::models::{ArcEventTx, Event, NoticeMessage, SubscriptionKind, TaskChange};
use crate::{error_notice, warn_notice};

pub const SUBPROTOCOL: &str = "graphql-transport-ws";

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;
type WsSender = SplitSink<WsStream, Message>;
type WsReader = SplitStream<WsStream>;

#[derive(Debug, Error)]
pub enum SubscriptionError {
    #[error("connecting to {0} timed out")]
    ConnectTimeout(String),

    #[error("websocket error: {0}")]
    WebSocket(#[from] tungstenite::Error),

    #[error("encoding message: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("connection rejected: {0}")]
    Rejected(String),

    #[error("connection closed before acknowledgement")]
    Closed,

    #[error("no connection_ack within {0:?}")]
    AckTimeout(Duration),
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ClientMessage<'a> {
    ConnectionInit {
        #[serde(skip_serializing_if = "Option::is_none")]
        payload: Option<Value>,
    },
    Subscribe {
        id: &'a str,
        payload: SubscribePayload<'a>,
    },
    Complete {
        id: &'a str,
    },
    Pong,
}

#[derive(Debug, Serialize)]
struct SubscribePayload<'a> {
    query: &'a str,
    variables: Value,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ServerMessage {
    ConnectionAck {},
    Next {
        id: String,
        payload: Value,
    },
    Error {
        id: String,
        #[serde(default)]
        payload: Value,
    },
    Complete {
        id: String,
    },
    Ping {},
    Pong {},
}

/// What the reader loop does with one server frame.
#[derive(Debug)]
enum Reply {
    Change(TaskChange),
    Pong,
    Notice(NoticeMessage),
    Completed(SubscriptionKind),
    Ignore,
}

pub struct SubscriptionClient {
    endpoint: String,
    api_key: Option<String>,
    auth_token: Option<String>,
    ack_timeout: Duration,
}

/// SubscriptionHandle owns the three running subscriptions.
pub struct SubscriptionHandle {
    token: CancellationToken,
    worker: JoinHandle<()>,
}

impl SubscriptionClient {
    pub fn new(endpoint: &str) -> Self {
        Self {
            endpoint: endpoint.to_string(),
            api_key: None,
            auth_token: None,
            ack_timeout: Duration::from_secs(ACK_TIMEOUT_SECS),
        }
    }

    pub fn with_api_key(mut self, api_key: &str) -> Self {
        self.api_key = Some(api_key.to_string());
        self
    }

    pub fn with_auth_token(mut self, token: &str) -> Self {
        self.auth_token = Some(token.to_string());
        self
    }

    pub fn with_ack_timeout(mut self, timeout: Duration) -> Self {
        self.ack_timeout = timeout;
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// connect opens the websocket, completes the handshake and starts the
    /// create, update and delete subscriptions. Changes are pushed to
    /// `event_tx` until the handle is closed or the server goes away.
    pub async fn connect(&self, event_tx: ArcEventTx) -> Result<SubscriptionHandle, SubscriptionError> {
        let mut request = self.endpoint.as_str().into_client_request()?;
        request
            .headers_mut()
            .insert("Sec-WebSocket-Protocol", HeaderValue::from_static(SUBPROTOCOL));

        let (ws_stream, _response) = tokio::time::timeout(CONNECT_TIMEOUT, connect_async(request))
            .await
            .map_err(|_| {
                log::warn!("Connecting to {} timed out", self.endpoint);
                SubscriptionError::ConnectTimeout(self.endpoint.clone())
            })??;

        let (mut sender, mut reader) = ws_stream.split();

        send(
            &mut sender,
            &ClientMessage::ConnectionInit {
                payload: self.init_payload(),
            },
        )
        .await?;

        tokio::time::timeout(self.ack_timeout, wait_for_ack(&mut reader))
            .await
            .map_err(|_| SubscriptionError::AckTimeout(self.ack_timeout))??;
        log::info!("Connected to realtime endpoint {}", self.endpoint);

        let mut operations = HashMap::new();
        for kind in SubscriptionKind::ALL {
            let id = uuid::Uuid::new_v4().to_string();
            send(
                &mut sender,
                &ClientMessage::Subscribe {
                    id: id.as_str(),
                    payload: SubscribePayload {
                        query: documents::subscription(kind),
                        variables: json!({}),
                    },
                },
            )
            .await?;
            log::debug!("Subscribed to {} as {}", kind, id);
            operations.insert(id, kind);
        }

        if let Err(err) = event_tx.send(Event::SubscriptionReady).await {
            log::error!("Failed to send subscription ready event: {}", err);
        }

        let token = CancellationToken::new();
        let worker = tokio::spawn(reader_loop(
            sender,
            reader,
            operations,
            event_tx,
            token.clone(),
        ));

        Ok(SubscriptionHandle { token, worker })
    }

    fn init_payload(&self) -> Option<Value> {
        let mut payload = serde_json::Map::new();
        if let Some(api_key) = &self.api_key {
            payload.insert("x-api-key".to_string(), Value::String(api_key.clone()));
        }
        if let Some(token) = &self.auth_token {
            payload.insert(
                "Authorization".to_string(),
                Value::String(format!("Bearer {}", token)),
            );
        }
        if payload.is_empty() {
            None
        } else {
            Some(Value::Object(payload))
        }
    }
}

impl SubscriptionHandle {
    /// close releases all three subscriptions and waits for the connection
    /// to shut down.
    pub async fn close(self) {
        self.token.cancel();
        if let Err(err) = self.worker.await {
            log::error!("Subscription worker failed: {}", err);
        }
    }

    pub fn is_closed(&self) -> bool {
        self.worker.is_finished()
    }
}

async fn send(sender: &mut WsSender, msg: &ClientMessage<'_>) -> Result<(), SubscriptionError> {
    let text = serde_json::to_string(msg)?;
    log::trace!("-> {}", text);
    sender.send(Message::Text(text.into())).await?;
    Ok(())
}

async fn wait_for_ack(reader: &mut WsReader) -> Result<(), SubscriptionError> {
    while let Some(frame) = reader.next().await {
        match frame? {
            Message::Text(text) => match serde_json::from_str::<ServerMessage>(text.as_str()) {
                Ok(ServerMessage::ConnectionAck { .. }) => return Ok(()),
                Ok(ServerMessage::Error { payload, .. }) => {
                    return Err(SubscriptionError::Rejected(payload.to_string()));
                }
                Ok(other) => log::debug!("Ignoring {:?} before acknowledgement", other),
                Err(err) => log::warn!("Unreadable frame before acknowledgement: {}", err),
            },
            Message::Close(frame) => {
                return Err(match frame {
                    Some(frame) => SubscriptionError::Rejected(format!(
                        "{} {}",
                        u16::from(frame.code),
                        frame.reason
                    )),
                    None => SubscriptionError::Closed,
                });
            }
            _ => {}
        }
    }
    Err(SubscriptionError::Closed)
}

async fn reader_loop(
    mut sender: WsSender,
    mut reader: WsReader,
    mut operations: HashMap<String, SubscriptionKind>,
    event_tx: ArcEventTx,
    token: CancellationToken,
) {
    let reason = loop {
        let frame = tokio::select! {
            _ = token.cancelled() => {
                release(&mut sender, &mut reader, &operations).await;
                log::debug!("Subscriptions released");
                return;
            }
            frame = reader.next() => frame,
        };

        let text = match frame {
            Some(Ok(Message::Text(text))) => text,
            Some(Ok(Message::Close(frame))) => {
                break frame.map(|frame| frame.reason.to_string());
            }
            Some(Ok(_)) => continue,
            Some(Err(err)) => break Some(err.to_string()),
            None => break None,
        };
        log::trace!("<- {}", text.as_str());

        let event = match interpret(text.as_str(), &operations) {
            Reply::Change(change) => Event::TaskChanged(change),
            Reply::Notice(notice) => Event::Notice(notice),
            Reply::Pong => {
                if let Err(err) = send(&mut sender, &ClientMessage::Pong).await {
                    log::warn!("Failed to answer ping: {}", err);
                }
                continue;
            }
            Reply::Completed(kind) => {
                operations.retain(|_, k| *k != kind);
                if operations.is_empty() {
                    break Some("all subscriptions completed".to_string());
                }
                Event::Notice(warn_notice!(format!("Subscription {} ended", kind)))
            }
            Reply::Ignore => continue,
        };

        if let Err(err) = event_tx.send(event).await {
            log::error!("Failed to forward subscription event: {}", err);
            release(&mut sender, &mut reader, &operations).await;
            return;
        }
    };

    log::warn!("Realtime connection closed: {:?}", reason);
    if let Err(err) = event_tx.send(Event::SubscriptionClosed(reason)).await {
        log::error!("Failed to send subscription closed event: {}", err);
    }
}

/// interpret maps one text frame to what the reader loop should do.
fn interpret(text: &str, operations: &HashMap<String, SubscriptionKind>) -> Reply {
    let msg = match serde_json::from_str::<ServerMessage>(text) {
        Ok(msg) => msg,
        Err(err) => {
            log::warn!("Dropping unreadable frame: {}", err);
            return Reply::Ignore;
        }
    };

    match msg {
        ServerMessage::Next { id, payload } => {
            let Some(kind) = operations.get(&id) else {
                log::debug!("Dropping payload for unknown operation {}", id);
                return Reply::Ignore;
            };
            match TaskChange::decode(*kind, &payload) {
                Ok(change) => Reply::Change(change),
                Err(err) => {
                    log::warn!("Rejecting {} payload: {}", kind, err);
                    Reply::Ignore
                }
            }
        }
        ServerMessage::Error { id, payload } => {
            let name = operations
                .get(&id)
                .map(|kind| kind.to_string())
                .unwrap_or(id);
            log::error!("Subscription {} failed: {}", name, payload);
            Reply::Notice(error_notice!(format!("Subscription {} failed: {}", name, payload)))
        }
        ServerMessage::Complete { id } => match operations.get(&id) {
            Some(kind) => Reply::Completed(*kind),
            None => Reply::Ignore,
        },
        ServerMessage::Ping { .. } => Reply::Pong,
        ServerMessage::ConnectionAck { .. } | ServerMessage::Pong { .. } => Reply::Ignore,
    }
}

/// release completes every operation, then closes the socket and waits for
/// the server's close so no `complete` frame is lost to a reset.
async fn release(
    sender: &mut WsSender,
    reader: &mut WsReader,
    operations: &HashMap<String, SubscriptionKind>,
) {
    for id in operations.keys() {
        if let Err(err) = send(sender, &ClientMessage::Complete { id: id.as_str() }).await {
            log::debug!("Failed to complete {}: {}", id, err);
        }
    }
    if let Err(err) = sender.close().await {
        log::debug!("Failed to close realtime connection: {}", err);
        return;
    }

    let drain = async {
        while let Some(frame) = reader.next().await {
            match frame {
                Ok(Message::Close(_)) | Err(_) => break,
                Ok(_) => {}
            }
        }
    };
    if tokio::time::timeout(CLOSE_TIMEOUT, drain).await.is_err() {
        log::debug!("Realtime server did not confirm close within {:?}", CLOSE_TIMEOUT);
    }
}
