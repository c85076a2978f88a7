//! Live connection to the dashboard's Socket.IO server
//!
//! One [`LiveSubscriber`] per session. A supervisor task owns the frame
//! reader, answers engine pings, publishes each `sensor-data` reading to a
//! `watch` channel and reconnects when the socket drops.

use std::sync::{Arc, Mutex as StdMutex, MutexGuard};
use std::time::Duration;

use chrono::{SecondsFormat, Utc};
use serde_json::Value;
use tokio::sync::{broadcast, watch, Mutex, RwLock};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::protocol::{self, Frame};
use crate::config::ReconnectConfig;
use crate::error::{ConsoleError, Result};
use crate::io::{FrameReader, FrameWriter, SocketConnector, SocketPair};
use crate::model::SensorReading;

const HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(10);

/// Readings buffered per subscriber of [`LiveSubscriber::readings`]
const READING_BUFFER: usize = 1024;

/// Observable connection state
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConnectionState {
    pub connected: bool,
    pub reconnecting: bool,
    /// Socket id assigned by the server on namespace connect
    pub sid: Option<String>,
}

/// Where and how to connect
#[derive(Debug, Clone)]
pub struct LiveOptions {
    pub endpoint: String,
    pub token: Option<String>,
    pub reconnect: ReconnectConfig,
}

/// State shared between the subscriber handle and its supervisor task
#[derive(Clone)]
struct Shared {
    state: Arc<RwLock<ConnectionState>>,
    writer: Arc<Mutex<Option<Box<dyn FrameWriter>>>>,
    latest: Arc<watch::Sender<Option<SensorReading>>>,
    readings: broadcast::Sender<SensorReading>,
    joined: Arc<StdMutex<Option<String>>>,
}

impl Shared {
    async fn send_frame(&self, frame: &str) -> Result<()> {
        let mut writer = self.writer.lock().await;
        match writer.as_mut() {
            Some(writer) => {
                debug!("Sending frame: {}", frame);
                writer.write_frame(frame).await
            }
            None => Err(ConsoleError::Live("Not connected".to_string())),
        }
    }

    async fn emit(&self, event: &str, arg: &Value) -> Result<()> {
        self.send_frame(&protocol::event_frame(event, arg)).await
    }

    fn publish(&self, mut reading: SensorReading) {
        if reading.timestamp.is_empty() {
            reading.timestamp = Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);
        }
        debug!("Reading on pin {}: {}", reading.pin, reading.value);
        // No receivers is fine
        let _ = self.readings.send(reading.clone());
        self.latest.send_replace(Some(reading));
    }

    fn joined(&self) -> MutexGuard<'_, Option<String>> {
        match self.joined.lock() {
            Ok(joined) => joined,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    async fn install(&self, writer: Box<dyn FrameWriter>, sid: Option<String>) {
        *self.writer.lock().await = Some(writer);
        let mut state = self.state.write().await;
        state.connected = true;
        state.reconnecting = false;
        state.sid = sid;
    }

    async fn teardown(&self) {
        if let Some(mut writer) = self.writer.lock().await.take() {
            if let Err(e) = writer.close().await {
                debug!("Closing writer: {}", e);
            }
        }
        let mut state = self.state.write().await;
        state.connected = false;
        state.sid = None;
    }
}

/// Handle to the live channel
///
/// Dropping the handle cancels the supervisor task; [`LiveSubscriber::disconnect`]
/// additionally waits for it and closes the socket.
pub struct LiveSubscriber {
    shared: Shared,
    cancel: CancellationToken,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl std::fmt::Debug for LiveSubscriber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LiveSubscriber")
            .field("cancelled", &self.cancel.is_cancelled())
            .finish()
    }
}

impl LiveSubscriber {
    /// Open the socket, authenticate and start receiving readings
    ///
    /// Fails if the first connection cannot be established; later drops are
    /// handled by reconnecting according to `options.reconnect`.
    pub async fn connect(
        connector: Arc<dyn SocketConnector>,
        options: LiveOptions,
    ) -> Result<Self> {
        let (reader, writer, sid) =
            open_session(connector.as_ref(), &options.endpoint, options.token.as_deref()).await?;
        info!("Live channel connected to {}", options.endpoint);

        let (latest, _) = watch::channel(None);
        let (readings, _) = broadcast::channel(READING_BUFFER);
        let shared = Shared {
            state: Arc::new(RwLock::new(ConnectionState::default())),
            writer: Arc::new(Mutex::new(None)),
            latest: Arc::new(latest),
            readings,
            joined: Arc::new(StdMutex::new(None)),
        };
        shared.install(writer, sid).await;

        let cancel = CancellationToken::new();
        let task = tokio::spawn(supervise(
            reader,
            connector,
            options,
            shared.clone(),
            cancel.clone(),
        ));

        Ok(Self {
            shared,
            cancel,
            task: Mutex::new(Some(task)),
        })
    }

    pub async fn is_connected(&self) -> bool {
        self.shared.state.read().await.connected
    }

    pub async fn state(&self) -> ConnectionState {
        self.shared.state.read().await.clone()
    }

    /// Most recent reading; each new reading replaces the previous one
    pub fn latest(&self) -> watch::Receiver<Option<SensorReading>> {
        self.shared.latest.subscribe()
    }

    /// Every reading received from now on, in arrival order
    ///
    /// Receivers that fall more than the buffer size behind lose the oldest
    /// readings and see `RecvError::Lagged`.
    pub fn readings(&self) -> broadcast::Receiver<SensorReading> {
        self.shared.readings.subscribe()
    }

    /// Start receiving readings for `project_id`
    ///
    /// The project is remembered and re-joined after a reconnect, even when
    /// the emit itself fails.
    pub async fn join_project(&self, project_id: &str) -> Result<()> {
        *self.shared.joined() = Some(project_id.to_string());
        self.shared
            .emit(protocol::JOIN_PROJECT, &Value::from(project_id))
            .await
    }

    pub async fn leave_project(&self, project_id: &str) -> Result<()> {
        self.forget_project(project_id);
        self.shared
            .emit(protocol::LEAVE_PROJECT, &Value::from(project_id))
            .await
    }

    /// Stop re-joining `project_id` after a reconnect, without emitting anything
    ///
    /// Returns whether `project_id` was the joined project.
    pub fn forget_project(&self, project_id: &str) -> bool {
        let mut joined = self.shared.joined();
        if joined.as_deref() == Some(project_id) {
            *joined = None;
            true
        } else {
            false
        }
    }

    /// Send an ad-hoc command for a sensor over the live channel
    pub async fn send_command(&self, sensor_id: &str, command: &str, value: Value) -> Result<()> {
        self.shared
            .emit(
                protocol::SENSOR_COMMAND,
                &serde_json::json!({
                    "sensorId": sensor_id,
                    "command": command,
                    "value": value,
                }),
            )
            .await
    }

    /// Stop the supervisor and close the socket
    pub async fn disconnect(&self) {
        self.cancel.cancel();
        if let Some(task) = self.task.lock().await.take() {
            if let Err(e) = task.await {
                warn!("Live supervisor task failed: {}", e);
            }
        }
        if let Err(e) = self.shared.send_frame("41").await {
            debug!("Socket disconnect packet not sent: {}", e);
        }
        self.shared.teardown().await;
        info!("Live channel disconnected");
    }
}

impl Drop for LiveSubscriber {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

/// Connect and complete the engine and namespace handshakes
async fn open_session(
    connector: &dyn SocketConnector,
    endpoint: &str,
    token: Option<&str>,
) -> Result<(Box<dyn FrameReader>, Box<dyn FrameWriter>, Option<String>)> {
    let SocketPair {
        mut reader,
        mut writer,
    } = connector.connect(endpoint).await?;

    let sid = tokio::time::timeout(
        HANDSHAKE_TIMEOUT,
        handshake(reader.as_mut(), writer.as_mut(), token),
    )
    .await
    .map_err(|_| ConsoleError::Live("Handshake timed out".to_string()))??;

    Ok((reader, writer, sid))
}

async fn handshake(
    reader: &mut dyn FrameReader,
    writer: &mut dyn FrameWriter,
    token: Option<&str>,
) -> Result<Option<String>> {
    loop {
        let text = reader
            .read_frame()
            .await?
            .ok_or_else(|| ConsoleError::Live("Connection closed during handshake".to_string()))?;
        match protocol::decode(&text)? {
            Frame::Open(handshake) => {
                debug!("Engine session {} opened", handshake.sid);
                writer.write_frame(&protocol::connect_frame(token)).await?;
            }
            Frame::Ping => writer.write_frame(protocol::PONG).await?,
            Frame::Connected { sid } => return Ok(sid),
            Frame::ConnectError { message } => return Err(ConsoleError::Rejected(message)),
            Frame::Close => {
                return Err(ConsoleError::Live(
                    "Server closed the connection during handshake".to_string(),
                ))
            }
            other => debug!("Ignoring frame during handshake: {:?}", other),
        }
    }
}

/// Run sessions until cancelled or reconnection gives up
async fn supervise(
    mut reader: Box<dyn FrameReader>,
    connector: Arc<dyn SocketConnector>,
    options: LiveOptions,
    shared: Shared,
    cancel: CancellationToken,
) {
    loop {
        let reason = match read_frames(reader.as_mut(), &shared, &cancel).await {
            SessionEnd::Cancelled => return,
            SessionEnd::Closed(reason) => {
                warn!("Live session ended by server: {}", reason);
                shared.teardown().await;
                return;
            }
            SessionEnd::Lost(reason) => reason,
        };
        warn!("Live connection lost: {}", reason);
        shared.teardown().await;

        if !options.reconnect.enabled {
            return;
        }
        match reconnect(connector.as_ref(), &options, &shared, &cancel).await {
            Some(next) => reader = next,
            None => return,
        }
    }
}

/// Why a session stopped reading
#[derive(Debug, PartialEq, Eq)]
enum SessionEnd {
    Cancelled,
    /// The transport went away; worth reconnecting
    Lost(String),
    /// The server ended the session on purpose; not retried
    Closed(String),
}

/// Handle frames of one session until it ends
async fn read_frames(
    reader: &mut dyn FrameReader,
    shared: &Shared,
    cancel: &CancellationToken,
) -> SessionEnd {
    loop {
        let frame = tokio::select! {
            _ = cancel.cancelled() => return SessionEnd::Cancelled,
            frame = reader.read_frame() => frame,
        };

        let text = match frame {
            Ok(Some(text)) => text,
            Ok(None) => return SessionEnd::Lost("Connection closed by remote".to_string()),
            Err(e) => return SessionEnd::Lost(format!("Read error: {}", e)),
        };

        match protocol::decode(&text) {
            Ok(Frame::Ping) => {
                if let Err(e) = shared.send_frame(protocol::PONG).await {
                    warn!("Failed to answer ping: {}", e);
                }
            }
            Ok(Frame::Event { name, args }) if name == protocol::SENSOR_DATA => {
                match protocol::sensor_reading(&args) {
                    Ok(reading) => shared.publish(reading),
                    Err(e) => warn!("{}", e),
                }
            }
            Ok(Frame::Event { name, .. }) => debug!("Ignoring event '{}'", name),
            Ok(Frame::Close) => {
                return SessionEnd::Lost("Engine closed by server".to_string())
            }
            Ok(Frame::Disconnect) => {
                return SessionEnd::Closed("Server disconnected the socket".to_string())
            }
            Ok(Frame::ConnectError { message }) => return SessionEnd::Closed(message),
            Ok(_) => {}
            Err(e) => warn!("Dropping frame {:?}: {}", text, e),
        }
    }
}

/// Retry the connection at a fixed interval
///
/// On success the new writer is installed, the joined project re-joined and
/// the new reader returned.
async fn reconnect(
    connector: &dyn SocketConnector,
    options: &LiveOptions,
    shared: &Shared,
    cancel: &CancellationToken,
) -> Option<Box<dyn FrameReader>> {
    shared.state.write().await.reconnecting = true;
    let interval = Duration::from_secs(options.reconnect.interval_seconds);
    let max_retries = options.reconnect.max_retries;
    let mut attempt = 0u32;

    let reader = loop {
        attempt += 1;
        if let Some(max) = max_retries {
            if attempt > max {
                warn!("Reconnection failed: max retries ({}) exceeded", max);
                break None;
            }
        }

        if attempt > 1 {
            tokio::select! {
                _ = tokio::time::sleep(interval) => {}
                _ = cancel.cancelled() => break None,
            }
        }

        info!(
            "Reconnecting live channel (attempt {}/{})",
            attempt,
            max_retries.map_or("unlimited".to_string(), |m| m.to_string())
        );
        let opened = tokio::select! {
            _ = cancel.cancelled() => break None,
            opened = open_session(connector, &options.endpoint, options.token.as_deref()) => opened,
        };
        match opened {
            Ok((reader, writer, sid)) => {
                shared.install(writer, sid).await;
                break Some(reader);
            }
            Err(ConsoleError::Rejected(message)) => {
                warn!("Reconnect rejected by server, giving up: {}", message);
                break None;
            }
            Err(e) => debug!("Reconnect attempt {} failed: {}", attempt, e),
        }
    };

    shared.state.write().await.reconnecting = false;

    if reader.is_some() {
        info!("Live channel reconnected");
        let joined = shared.joined().clone();
        if let Some(project_id) = joined {
            if let Err(e) = shared
                .emit(protocol::JOIN_PROJECT, &Value::from(project_id.as_str()))
                .await
            {
                warn!("Failed to re-join project {}: {}", project_id, e);
            }
        }
    }
    reader
}
