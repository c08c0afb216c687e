use super::*;

use std::sync::Arc;

use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio_tungstenite::accept_hdr_async;
use tokio_tungstenite::tungstenite::handshake::server::{ErrorResponse, Request, Response};

use crate::models::Task;

fn operations() -> HashMap<String, SubscriptionKind> {
    HashMap::from([
        ("op-create".to_string(), SubscriptionKind::Created),
        ("op-update".to_string(), SubscriptionKind::Updated),
        ("op-delete".to_string(), SubscriptionKind::Deleted),
    ])
}

#[test]
fn test_interpret_next_created() {
    let frame = json!({
        "type": "next",
        "id": "op-create",
        "payload": {"data": {"onCreateTask": {"id": "1", "title": "a"}}}
    })
    .to_string();

    match interpret(&frame, &operations()) {
        Reply::Change(change) => assert_eq!(change, TaskChange::Created(Task::new("1", "a"))),
        other => panic!("unexpected reply: {other:?}"),
    }
}

#[test]
fn test_interpret_next_deleted_only_needs_id() {
    let frame = json!({
        "type": "next",
        "id": "op-delete",
        "payload": {"data": {"onDeleteTask": {"id": "9"}}}
    })
    .to_string();

    match interpret(&frame, &operations()) {
        Reply::Change(change) => assert_eq!(change, TaskChange::Deleted("9".to_string())),
        other => panic!("unexpected reply: {other:?}"),
    }
}

#[test]
fn test_interpret_routes_by_operation_id() {
    // An update payload arriving on the create operation does not validate
    let frame = json!({
        "type": "next",
        "id": "op-create",
        "payload": {"data": {"onUpdateTask": {"id": "1", "title": "a"}}}
    })
    .to_string();

    assert!(matches!(interpret(&frame, &operations()), Reply::Ignore));
}

#[test]
fn test_interpret_drops_invalid_payloads() {
    let frames = [
        "not json".to_string(),
        json!({"type": "next", "id": "unknown", "payload": {}}).to_string(),
        json!({"type": "next", "id": "op-update", "payload": {"data": {"onUpdateTask": null}}})
            .to_string(),
        json!({"type": "next", "id": "op-update", "payload": {"data": {"onUpdateTask": {"title": "x"}}}})
            .to_string(),
        json!({"type": "next", "id": "op-delete", "payload": {"data": {"onDeleteTask": {"id": ""}}}})
            .to_string(),
        json!({"type": "complete", "id": "unknown"}).to_string(),
        json!({"type": "connection_ack"}).to_string(),
    ];

    for frame in frames {
        assert!(
            matches!(interpret(&frame, &operations()), Reply::Ignore),
            "frame should be dropped: {frame}"
        );
    }
}

#[test]
fn test_interpret_ping_and_complete() {
    let ping = json!({"type": "ping"}).to_string();
    assert!(matches!(interpret(&ping, &operations()), Reply::Pong));

    let complete = json!({"type": "complete", "id": "op-update"}).to_string();
    assert!(matches!(
        interpret(&complete, &operations()),
        Reply::Completed(SubscriptionKind::Updated)
    ));
}

#[test]
fn test_interpret_error_becomes_notice() {
    let frame = json!({
        "type": "error",
        "id": "op-delete",
        "payload": [{"message": "Unauthorized"}]
    })
    .to_string();

    match interpret(&frame, &operations()) {
        Reply::Notice(notice) => {
            assert!(notice.sticky());
            assert!(notice.message().contains("onDeleteTask"));
            assert!(notice.message().contains("Unauthorized"));
        }
        other => panic!("unexpected reply: {other:?}"),
    }
}

#[test]
fn test_init_payload() {
    let client = SubscriptionClient::new("ws://localhost/graphql");
    assert!(client.init_payload().is_none());

    let client = client.with_api_key("key").with_auth_token("token");
    assert_eq!(
        client.init_payload(),
        Some(json!({"x-api-key": "key", "Authorization": "Bearer token"}))
    );
}

#[test]
fn test_client_messages_are_tagged() {
    let subscribe = ClientMessage::Subscribe {
        id: "abc",
        payload: SubscribePayload {
            query: "subscription { x }",
            variables: json!({}),
        },
    };
    assert_eq!(
        serde_json::to_value(&subscribe).expect("Failed to serialize"),
        json!({
            "type": "subscribe",
            "id": "abc",
            "payload": {"query": "subscription { x }", "variables": {}}
        })
    );

    let init = ClientMessage::ConnectionInit { payload: None };
    assert_eq!(
        serde_json::to_value(&init).expect("Failed to serialize"),
        json!({"type": "connection_init"})
    );
}

/// What the fake server observed during a session.
#[derive(Debug, Default)]
struct ServerLog {
    init_payload: Option<Value>,
    subscriptions: HashMap<String, String>, // operation id -> query
    completed: Vec<String>,
}

fn accept_subprotocol(_req: &Request, mut resp: Response) -> Result<Response, ErrorResponse> {
    resp.headers_mut()
        .insert("Sec-WebSocket-Protocol", HeaderValue::from_static(SUBPROTOCOL));
    Ok(resp)
}

async fn recv_json(ws: &mut WebSocketStream<TcpStream>) -> Option<Value> {
    while let Some(frame) = ws.next().await {
        match frame.ok()? {
            Message::Text(text) => return serde_json::from_str(text.as_str()).ok(),
            Message::Close(_) => return None,
            _ => {}
        }
    }
    None
}

/// Runs a single session: acknowledges the client, records the three
/// subscriptions, pushes one created task and then waits for teardown.
async fn fake_server(listener: TcpListener, log_tx: mpsc::UnboundedSender<ServerLog>) {
    let (stream, _) = listener.accept().await.expect("Failed to accept");
    let mut ws = accept_hdr_async(stream, accept_subprotocol)
        .await
        .expect("Failed to upgrade");

    let mut log = ServerLog::default();
    let init = recv_json(&mut ws).await.expect("Missing connection_init");
    assert_eq!(init["type"], "connection_init");
    log.init_payload = init.get("payload").cloned();

    ws.send(Message::Text(json!({"type": "connection_ack"}).to_string().into()))
        .await
        .expect("Failed to ack");

    while log.subscriptions.len() < 3 {
        let msg = recv_json(&mut ws).await.expect("Missing subscribe");
        assert_eq!(msg["type"], "subscribe");
        log.subscriptions.insert(
            msg["id"].as_str().unwrap_or_default().to_string(),
            msg["payload"]["query"].as_str().unwrap_or_default().to_string(),
        );
    }

    let create_id = log
        .subscriptions
        .iter()
        .find(|(_, query)| query.contains("onCreateTask"))
        .map(|(id, _)| id.clone())
        .expect("No create subscription");

    let next = json!({
        "type": "next",
        "id": create_id,
        "payload": {"data": {"onCreateTask": {"id": "1", "title": "from server"}}}
    });
    ws.send(Message::Text(next.to_string().into()))
        .await
        .expect("Failed to push change");
    ws.send(Message::Text(json!({"type": "ping"}).to_string().into()))
        .await
        .expect("Failed to ping");

    while let Some(msg) = recv_json(&mut ws).await {
        if msg["type"] == "complete" {
            log.completed.push(msg["id"].as_str().unwrap_or_default().to_string());
        }
    }

    log_tx.send(log).expect("Failed to report");
}

#[tokio::test]
async fn test_subscription_lifecycle() {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("Failed to bind");
    let addr = listener.local_addr().expect("No local address");
    let (log_tx, mut log_rx) = mpsc::unbounded_channel();
    tokio::spawn(fake_server(listener, log_tx));

    let (event_tx, mut event_rx) = mpsc::unbounded_channel::<Event>();
    let client = SubscriptionClient::new(&format!("ws://{addr}/graphql")).with_api_key("key");
    let handle = client
        .connect(Arc::new(event_tx))
        .await
        .expect("Failed to connect");

    assert!(matches!(event_rx.recv().await, Some(Event::SubscriptionReady)));
    match event_rx.recv().await {
        Some(Event::TaskChanged(change)) => {
            assert_eq!(change, TaskChange::Created(Task::new("1", "from server")))
        }
        other => panic!("unexpected event: {other:?}"),
    }
    assert!(!handle.is_closed());

    handle.close().await;

    let log = tokio::time::timeout(Duration::from_secs(5), log_rx.recv())
        .await
        .expect("Server did not finish")
        .expect("Server dropped the report");

    assert_eq!(log.init_payload, Some(json!({"x-api-key": "key"})));
    assert_eq!(log.subscriptions.len(), 3);
    for kind in SubscriptionKind::ALL {
        assert!(log.subscriptions.values().any(|query| query.contains(kind.field())));
    }

    let mut completed = log.completed.clone();
    completed.sort();
    let mut subscribed: Vec<String> = log.subscriptions.keys().cloned().collect();
    subscribed.sort();
    assert_eq!(completed, subscribed);

    // Closing releases everything without reporting a dropped connection
    assert!(event_rx.try_recv().is_err());
}

#[tokio::test]
async fn test_close_delivers_every_complete_while_server_is_talking() {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("Failed to bind");
    let addr = listener.local_addr().expect("No local address");
    let (completed_tx, mut completed_rx) = mpsc::unbounded_channel();

    tokio::spawn(async move {
        let (stream, _) = listener.accept().await.expect("Failed to accept");
        let mut ws = accept_hdr_async(stream, accept_subprotocol)
            .await
            .expect("Failed to upgrade");
        recv_json(&mut ws).await;
        ws.send(Message::Text(json!({"type": "connection_ack"}).to_string().into()))
            .await
            .expect("Failed to ack");

        let mut subscribed = vec![];
        while subscribed.len() < 3 {
            let msg = recv_json(&mut ws).await.expect("Missing subscribe");
            subscribed.push(msg["id"].as_str().unwrap_or_default().to_string());
        }

        // Keep frames in flight while the client tears down
        let mut completed = vec![];
        while let Some(msg) = recv_json(&mut ws).await {
            if msg["type"] == "complete" {
                completed.push(msg["id"].as_str().unwrap_or_default().to_string());
                for _ in 0..16 {
                    let ping = Message::Text(json!({"type": "ping"}).to_string().into());
                    if ws.send(ping).await.is_err() {
                        break;
                    }
                }
            }
        }
        subscribed.sort();
        completed.sort();
        completed_tx
            .send((subscribed, completed))
            .expect("Failed to report");
    });

    let (event_tx, mut event_rx) = mpsc::unbounded_channel::<Event>();
    let handle = SubscriptionClient::new(&format!("ws://{addr}/graphql"))
        .connect(Arc::new(event_tx))
        .await
        .expect("Failed to connect");
    assert!(matches!(event_rx.recv().await, Some(Event::SubscriptionReady)));

    handle.close().await;

    let (subscribed, completed) = tokio::time::timeout(Duration::from_secs(5), completed_rx.recv())
        .await
        .expect("Server did not finish")
        .expect("Server dropped the report");
    assert_eq!(completed, subscribed);
}

#[tokio::test]
async fn test_server_close_is_reported() {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("Failed to bind");
    let addr = listener.local_addr().expect("No local address");

    tokio::spawn(async move {
        let (stream, _) = listener.accept().await.expect("Failed to accept");
        let mut ws = accept_hdr_async(stream, accept_subprotocol)
            .await
            .expect("Failed to upgrade");
        recv_json(&mut ws).await;
        ws.send(Message::Text(json!({"type": "connection_ack"}).to_string().into()))
            .await
            .expect("Failed to ack");
        for _ in 0..3 {
            recv_json(&mut ws).await;
        }
        let _ = ws.close(None).await;
    });

    let (event_tx, mut event_rx) = mpsc::unbounded_channel::<Event>();
    let handle = SubscriptionClient::new(&format!("ws://{addr}/graphql"))
        .connect(Arc::new(event_tx))
        .await
        .expect("Failed to connect");

    assert!(matches!(event_rx.recv().await, Some(Event::SubscriptionReady)));
    let closed = tokio::time::timeout(Duration::from_secs(5), event_rx.recv())
        .await
        .expect("No close event");
    assert!(matches!(closed, Some(Event::SubscriptionClosed(_))));

    handle.close().await;
}

#[tokio::test]
async fn test_missing_ack_times_out() {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("Failed to bind");
    let addr = listener.local_addr().expect("No local address");

    tokio::spawn(async move {
        let (stream, _) = listener.accept().await.expect("Failed to accept");
        let mut ws = accept_hdr_async(stream, accept_subprotocol)
            .await
            .expect("Failed to upgrade");
        // Never acknowledge
        while recv_json(&mut ws).await.is_some() {}
    });

    let (event_tx, _event_rx) = mpsc::unbounded_channel::<Event>();
    let result = SubscriptionClient::new(&format!("ws://{addr}/graphql"))
        .with_ack_timeout(Duration::from_millis(200))
        .connect(Arc::new(event_tx))
        .await;

    assert!(matches!(result, Err(SubscriptionError::AckTimeout(_))));
}

#[tokio::test]
async fn test_connection_refused() {
    let (event_tx, _event_rx) = mpsc::unbounded_channel::<Event>();
    let result = SubscriptionClient::new("ws://127.0.0.1:9/graphql")
        .connect(Arc::new(event_tx))
        .await;

    assert!(matches!(result, Err(SubscriptionError::WebSocket(_))));
}
