//! GraphQL transport client.
//!
//! Queries and mutations go over HTTP POST; subscriptions ride one shared
//! `graphql-transport-ws` socket, opened lazily on first subscribe and
//! reused for every subscription after that. Unsubscribing ends a single
//! subscription id -- the socket stays open while any other subscription
//! is live.
//!
//! The client holds no retry logic beyond two bounded loops: the startup
//! health probe (`reconnect_with_backoff`) and the socket connect
//! (3 attempts, linear 1s backoff).

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex as StdMutex};
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use serde_json::{json, Value};
use tokio::sync::{mpsc, Mutex};
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::HeaderValue;
use tokio_tungstenite::tungstenite::Message;

use crate::config::ClientConfig;
use crate::error::TransportError;
use crate::graphql::HEALTH_QUERY;

const HEALTH_TIMEOUT: Duration = Duration::from_secs(5);
const BACKOFF_BASE: Duration = Duration::from_millis(500);
const SOCKET_CONNECT_ATTEMPTS: u32 = 3;
const SOCKET_BACKOFF: Duration = Duration::from_secs(1);
const ACK_TIMEOUT: Duration = Duration::from_secs(5);

type DataHandler = Box<dyn Fn(Value) + Send + 'static>;
type ErrorHandler = Box<dyn Fn(String) + Send + 'static>;

struct SubscriptionHandlers {
    on_data: DataHandler,
    on_error: ErrorHandler,
}

type HandlerMap = Arc<StdMutex<HashMap<u64, SubscriptionHandlers>>>;

/// Shared subscription socket: a sender feeding the write half and the
/// handler registry the read task dispatches into. `alive` is cleared by
/// whichever half dies first, so the next subscribe reconnects instead of
/// reusing a half-dead socket.
struct SharedSocket {
    outgoing: mpsc::UnboundedSender<Message>,
    handlers: HandlerMap,
    alive: Arc<AtomicBool>,
}

/// GraphQL client over HTTP + WebSocket.
///
/// Constructed once at process start and injected wherever needed; never
/// ambient global state.
pub struct GraphqlClient {
    http: reqwest::Client,
    http_url: String,
    ws_url: String,
    socket: Mutex<Option<SharedSocket>>,
    next_subscription_id: AtomicU64,
}

impl GraphqlClient {
    pub fn new(config: &ClientConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            http_url: config.http_url.clone(),
            ws_url: config.ws_url.clone(),
            socket: Mutex::new(None),
            next_subscription_id: AtomicU64::new(1),
        }
    }

    // ── HTTP: queries and mutations ─────────────────────────────────

    /// Execute a query and return its `data` field.
    pub async fn query(&self, document: &str, variables: Value) -> Result<Value, TransportError> {
        self.execute(document, variables).await
    }

    /// Execute a mutation. An empty `data` field is a failure: the caller
    /// cannot assume success from a null body.
    pub async fn mutate(
        &self,
        operation: &'static str,
        document: &str,
        variables: Value,
    ) -> Result<Value, TransportError> {
        let data = self.execute(document, variables).await?;
        if data.is_null() {
            return Err(TransportError::EmptyResponse { operation });
        }
        Ok(data)
    }

    async fn execute(&self, document: &str, variables: Value) -> Result<Value, TransportError> {
        let body = json!({ "query": document, "variables": variables });
        let response = self.http.post(&self.http_url).json(&body).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::Status(status));
        }
        let payload: Value = response.json().await?;
        if let Some(errors) = payload.get("errors").and_then(Value::as_array) {
            if !errors.is_empty() {
                return Err(TransportError::Graphql(concat_error_messages(errors)));
            }
        }
        Ok(payload.get("data").cloned().unwrap_or(Value::Null))
    }

    // ── Health probing ──────────────────────────────────────────────

    /// Issue a trivial probe with a bounded timeout. Returns `false` on any
    /// failure without raising.
    pub async fn health_check(&self) -> bool {
        let body = json!({ "query": HEALTH_QUERY });
        let request = self
            .http
            .post(&self.http_url)
            .timeout(HEALTH_TIMEOUT)
            .json(&body);
        match request.send().await {
            Ok(response) => response.status().is_success(),
            Err(_) => false,
        }
    }

    /// Repeat the health check up to `max_attempts` times, stopping at the
    /// first success. The delay after failed attempt `n` is `500ms * n`.
    pub async fn reconnect_with_backoff(&self, max_attempts: u32) -> bool {
        for attempt in 1..=max_attempts {
            if self.health_check().await {
                return true;
            }
            tracing::debug!(attempt, max_attempts, "health probe failed");
            if attempt < max_attempts {
                tokio::time::sleep(BACKOFF_BASE * attempt).await;
            }
        }
        false
    }

    // ── Subscriptions ───────────────────────────────────────────────

    /// Start a subscription on the shared socket, connecting it first if
    /// needed. `on_data` receives each `next` payload's `data` object.
    pub async fn subscribe<F, E>(
        &self,
        document: &str,
        variables: Value,
        on_data: F,
        on_error: E,
    ) -> Result<Subscription, TransportError>
    where
        F: Fn(Value) + Send + 'static,
        E: Fn(String) + Send + 'static,
    {
        let mut guard = self.socket.lock().await;
        let stale = match guard.as_ref() {
            Some(socket) => {
                !socket.alive.load(Ordering::Acquire) || socket.outgoing.is_closed()
            }
            None => true,
        };
        if stale {
            *guard = Some(self.open_socket().await?);
        }
        let socket = guard.as_ref().expect("socket just ensured");

        let id = self.next_subscription_id.fetch_add(1, Ordering::Relaxed);
        socket.handlers.lock().expect("handler lock").insert(
            id,
            SubscriptionHandlers {
                on_data: Box::new(on_data),
                on_error: Box::new(on_error),
            },
        );

        let frame = subscribe_frame(id, document, &variables);
        if socket.outgoing.send(Message::Text(frame)).is_err() {
            socket.handlers.lock().expect("handler lock").remove(&id);
            return Err(TransportError::Socket(
                "subscription socket closed before subscribe".into(),
            ));
        }

        Ok(Subscription {
            inner: Some(SubscriptionInner {
                id,
                outgoing: socket.outgoing.clone(),
                handlers: Arc::clone(&socket.handlers),
            }),
        })
    }

    /// Connect the shared socket and complete the `graphql-transport-ws`
    /// handshake. Bounded retry: 3 attempts, 1s linear backoff.
    async fn open_socket(&self) -> Result<SharedSocket, TransportError> {
        let build_request = || {
            let mut request = self
                .ws_url
                .as_str()
                .into_client_request()
                .map_err(|e| TransportError::Socket(format!("invalid ws request: {e}")))?;
            request.headers_mut().insert(
                "Sec-WebSocket-Protocol",
                HeaderValue::from_static("graphql-transport-ws"),
            );
            Ok::<_, TransportError>(request)
        };

        let mut attempt = 1u32;
        let (mut ws, _) = loop {
            match connect_async(build_request()?).await {
                Ok(ok) => break ok,
                Err(err) if attempt < SOCKET_CONNECT_ATTEMPTS => {
                    tracing::warn!(attempt, "subscription socket connect failed: {err}");
                    tokio::time::sleep(SOCKET_BACKOFF * attempt).await;
                    attempt += 1;
                }
                Err(err) => {
                    return Err(TransportError::Socket(format!("connect failed: {err}")));
                }
            }
        };

        ws.send(Message::Text(json!({"type": "connection_init"}).to_string()))
            .await
            .map_err(|e| TransportError::Socket(format!("connection_init failed: {e}")))?;

        // Wait for connection_ack before accepting any subscription.
        let ack = tokio::time::timeout(ACK_TIMEOUT, async {
            while let Some(message) = ws.next().await {
                let message =
                    message.map_err(|e| TransportError::Socket(format!("handshake read: {e}")))?;
                if let Message::Text(text) = message {
                    if matches!(parse_server_frame(&text), ServerFrame::Ack) {
                        return Ok(());
                    }
                }
            }
            Err(TransportError::Socket(
                "socket closed during handshake".into(),
            ))
        })
        .await;
        match ack {
            Ok(result) => result?,
            Err(_) => {
                return Err(TransportError::Socket(
                    "timed out waiting for connection_ack".into(),
                ))
            }
        }

        let handlers: HandlerMap = Arc::new(StdMutex::new(HashMap::new()));
        let alive = Arc::new(AtomicBool::new(true));
        let (outgoing, mut outgoing_rx) = mpsc::unbounded_channel::<Message>();
        let (mut sink, mut stream) = ws.split();

        let writer_alive = Arc::clone(&alive);
        tokio::spawn(async move {
            while let Some(message) = outgoing_rx.recv().await {
                if sink.send(message).await.is_err() {
                    break;
                }
            }
            writer_alive.store(false, Ordering::Release);
        });

        let reader_handlers = Arc::clone(&handlers);
        let reader_outgoing = outgoing.clone();
        let reader_alive = Arc::clone(&alive);
        tokio::spawn(async move {
            while let Some(message) = stream.next().await {
                let text = match message {
                    Ok(Message::Text(text)) => text,
                    Ok(Message::Close(_)) | Err(_) => break,
                    Ok(_) => continue,
                };
                match parse_server_frame(&text) {
                    ServerFrame::Next { id, data } => {
                        if let Some(handler) =
                            reader_handlers.lock().expect("handler lock").get(&id)
                        {
                            (handler.on_data)(data);
                        }
                    }
                    ServerFrame::Error { id, message } => {
                        if let Some(handler) =
                            reader_handlers.lock().expect("handler lock").get(&id)
                        {
                            (handler.on_error)(message);
                        }
                    }
                    ServerFrame::Complete { id } => {
                        reader_handlers.lock().expect("handler lock").remove(&id);
                    }
                    ServerFrame::Ping => {
                        let _ = reader_outgoing
                            .send(Message::Text(json!({"type": "pong"}).to_string()));
                    }
                    ServerFrame::Ack | ServerFrame::Other => {}
                }
            }
            // Socket gone: mark it dead before telling subscribers, so a
            // subscribe racing the close reconnects instead of reusing it.
            reader_alive.store(false, Ordering::Release);
            let mut map = reader_handlers.lock().expect("handler lock");
            for (_, handler) in map.iter() {
                (handler.on_error)("subscription socket closed".into());
            }
            map.clear();
        });

        Ok(SharedSocket {
            outgoing,
            handlers,
            alive,
        })
    }
}

/// Handle to one live subscription. Unsubscribing (or dropping) ends this
/// subscription only; the shared socket is untouched.
pub struct Subscription {
    inner: Option<SubscriptionInner>,
}

struct SubscriptionInner {
    id: u64,
    outgoing: mpsc::UnboundedSender<Message>,
    handlers: HandlerMap,
}

impl Subscription {
    /// Synchronous and idempotent; calling twice is a no-op.
    pub fn unsubscribe(&mut self) {
        if let Some(inner) = self.inner.take() {
            inner.handlers.lock().expect("handler lock").remove(&inner.id);
            let _ = inner.outgoing.send(Message::Text(complete_frame(inner.id)));
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}

// ── graphql-transport-ws frames ─────────────────────────────────────

fn subscribe_frame(id: u64, document: &str, variables: &Value) -> String {
    json!({
        "id": id.to_string(),
        "type": "subscribe",
        "payload": { "query": document, "variables": variables },
    })
    .to_string()
}

fn complete_frame(id: u64) -> String {
    json!({ "id": id.to_string(), "type": "complete" }).to_string()
}

#[derive(Debug)]
enum ServerFrame {
    Ack,
    Ping,
    Next { id: u64, data: Value },
    Error { id: u64, message: String },
    Complete { id: u64 },
    Other,
}

fn parse_server_frame(text: &str) -> ServerFrame {
    let frame: Value = match serde_json::from_str(text) {
        Ok(frame) => frame,
        Err(_) => return ServerFrame::Other,
    };
    let id = frame
        .get("id")
        .and_then(Value::as_str)
        .and_then(|s| s.parse::<u64>().ok());
    match frame.get("type").and_then(Value::as_str) {
        Some("connection_ack") => ServerFrame::Ack,
        Some("ping") => ServerFrame::Ping,
        Some("next") => match id {
            Some(id) => {
                let payload = frame.get("payload").cloned().unwrap_or(Value::Null);
                if let Some(errors) = payload.get("errors").and_then(Value::as_array) {
                    if !errors.is_empty() {
                        return ServerFrame::Error {
                            id,
                            message: concat_error_messages(errors),
                        };
                    }
                }
                let data = payload.get("data").cloned().unwrap_or(Value::Null);
                ServerFrame::Next { id, data }
            }
            None => ServerFrame::Other,
        },
        Some("error") => match id {
            Some(id) => {
                let errors = frame
                    .get("payload")
                    .and_then(Value::as_array)
                    .cloned()
                    .unwrap_or_default();
                ServerFrame::Error {
                    id,
                    message: concat_error_messages(&errors),
                }
            }
            None => ServerFrame::Other,
        },
        Some("complete") => match id {
            Some(id) => ServerFrame::Complete { id },
            None => ServerFrame::Other,
        },
        _ => ServerFrame::Other,
    }
}

/// Collapse a GraphQL `errors` array into one message.
fn concat_error_messages(errors: &[Value]) -> String {
    let messages: Vec<&str> = errors
        .iter()
        .map(|e| e.get("message").and_then(Value::as_str).unwrap_or("unknown error"))
        .collect();
    messages.join("; ")
}
