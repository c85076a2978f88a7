//! Hand-written fakes shared by the integration tests

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex as StdMutex};
use std::time::Duration;

use async_trait::async_trait;
use iot_console::io::{
    FrameReader, FrameWriter, HttpClient, HttpRequest, HttpResponse, SocketConnector, SocketPair,
};
use iot_console::ConsoleError;
use tokio::sync::{mpsc, Notify};

pub const OPEN: &str = r#"0{"sid":"engine-1","upgrades":[],"pingInterval":25000,"pingTimeout":20000}"#;
pub const CONNECTED: &str = r#"40{"sid":"socket-1"}"#;

// ============================================================================
// Websocket fakes
// ============================================================================

struct ChannelReader {
    frames: mpsc::UnboundedReceiver<String>,
}

#[async_trait]
impl FrameReader for ChannelReader {
    async fn read_frame(&mut self) -> iot_console::Result<Option<String>> {
        Ok(self.frames.recv().await)
    }
}

struct RecordingWriter {
    sent: Arc<StdMutex<Vec<String>>>,
}

#[async_trait]
impl FrameWriter for RecordingWriter {
    async fn write_frame(&mut self, frame: &str) -> iot_console::Result<()> {
        self.sent.lock().unwrap().push(frame.to_string());
        Ok(())
    }

    async fn close(&mut self) -> iot_console::Result<()> {
        Ok(())
    }
}

/// Server side of one fake connection
pub struct FakeConnection {
    frames: Option<mpsc::UnboundedSender<String>>,
    pub sent: Arc<StdMutex<Vec<String>>>,
}

impl FakeConnection {
    pub fn push(&self, frame: &str) {
        if let Some(frames) = &self.frames {
            frames.send(frame.to_string()).unwrap();
        }
    }

    /// Close the connection from the server side
    pub fn drop_connection(&mut self) {
        self.frames.take();
    }

    pub fn sent(&self) -> Vec<String> {
        self.sent.lock().unwrap().clone()
    }

    pub fn has_sent(&self, frame: &str) -> bool {
        self.sent.lock().unwrap().iter().any(|f| f == frame)
    }
}

type PendingConnection = (
    mpsc::UnboundedReceiver<String>,
    Arc<StdMutex<Vec<String>>>,
);

/// Hands out scripted connections in order; fails once they run out
#[derive(Default)]
pub struct FakeConnector {
    pending: StdMutex<VecDeque<PendingConnection>>,
    connects: AtomicU32,
}

impl FakeConnector {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Queue a connection whose handshake succeeds
    pub fn accept(&self) -> FakeConnection {
        let connection = self.add_connection();
        connection.push(OPEN);
        connection.push(CONNECTED);
        connection
    }

    /// Queue a connection that answers with the given frames
    pub fn add_connection(&self) -> FakeConnection {
        let (tx, rx) = mpsc::unbounded_channel();
        let sent = Arc::new(StdMutex::new(Vec::new()));
        self.pending.lock().unwrap().push_back((rx, sent.clone()));
        FakeConnection {
            frames: Some(tx),
            sent,
        }
    }

    pub fn connect_count(&self) -> u32 {
        self.connects.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SocketConnector for FakeConnector {
    async fn connect(&self, _url: &str) -> iot_console::Result<SocketPair> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        match self.pending.lock().unwrap().pop_front() {
            Some((frames, sent)) => Ok(SocketPair {
                reader: Box::new(ChannelReader { frames }),
                writer: Box::new(RecordingWriter { sent }),
            }),
            None => Err(ConsoleError::Live("Connection refused".to_string())),
        }
    }
}

// ============================================================================
// HTTP fake
// ============================================================================

/// Answers requests from a queue of canned responses and records them
#[derive(Default)]
pub struct FakeHttp {
    responses: StdMutex<VecDeque<HttpResponse>>,
    pub requests: StdMutex<Vec<HttpRequest>>,
    gate: StdMutex<Option<Arc<Notify>>>,
}

impl FakeHttp {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn respond(&self, status: u16, body: serde_json::Value) {
        self.responses.lock().unwrap().push_back(HttpResponse {
            status,
            body: body.to_string(),
        });
    }

    pub fn respond_raw(&self, status: u16, body: &str) {
        self.responses.lock().unwrap().push_back(HttpResponse {
            status,
            body: body.to_string(),
        });
    }

    /// Hold every following request until the returned notify fires
    pub fn hold(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *self.gate.lock().unwrap() = Some(gate.clone());
        gate
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl HttpClient for FakeHttp {
    async fn send(&self, request: HttpRequest) -> iot_console::Result<HttpResponse> {
        self.requests.lock().unwrap().push(request);
        let gate = self.gate.lock().unwrap().clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| ConsoleError::Http("No canned response".to_string()))
    }
}

/// Wrap `data` in a success envelope
pub fn ok(data: serde_json::Value) -> serde_json::Value {
    serde_json::json!({ "success": true, "message": "ok", "data": data })
}

pub fn project_json(readings_on_a0: usize) -> serde_json::Value {
    let data: Vec<serde_json::Value> = (0..readings_on_a0)
        .map(|n| serde_json::json!({"datetime": format!("t{}", n), "value": n as f64}))
        .collect();
    serde_json::json!({
        "projectId": "p1",
        "projectName": "Greenhouse",
        "sensordata": [
            {"id": "s1", "title": "Soil", "pinNumber": "A0", "data": data},
            {"id": "s2", "title": "Air", "pinNumber": "A1", "data": []}
        ]
    })
}

pub fn sensor_event(pin: &str, value: f64, timestamp: &str) -> String {
    format!(
        r#"42["sensor-data",{{"sensorId":"{}","value":{},"timestamp":"{}"}}]"#,
        pin, value, timestamp
    )
}

/// Poll `check` until it holds or two seconds pass
pub async fn eventually<F: Fn() -> bool>(what: &str, check: F) {
    let waited = tokio::time::timeout(Duration::from_secs(2), async {
        while !check() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await;
    assert!(waited.is_ok(), "timed out waiting for {}", what);
}
