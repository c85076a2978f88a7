//! I/O traits and implementations for the IoT console
//!
//! This module provides trait abstractions for HTTP requests and for the
//! websocket frames that carry the push channel. These traits enable
//! mockall-based testing without requiring actual network operations.
//!
//! The default implementations use reqwest and tokio-tungstenite.

use std::time::Duration;

use async_trait::async_trait;
use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use tracing::debug;

use crate::error::{ConsoleError, Result};

// ============================================================================
// HttpClient trait and implementations
// ============================================================================

/// HTTP method of a request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Method::Get => write!(f, "GET"),
            Method::Post => write!(f, "POST"),
            Method::Put => write!(f, "PUT"),
            Method::Delete => write!(f, "DELETE"),
        }
    }
}

/// A fully resolved HTTP request
#[derive(Debug, Clone, PartialEq)]
pub struct HttpRequest {
    pub method: Method,
    pub url: String,
    pub bearer: Option<String>,
    pub query: Vec<(String, String)>,
    pub body: Option<serde_json::Value>,
}

/// HTTP response from a request
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

/// Abstraction over HTTP client for dependency injection
#[async_trait]
#[cfg_attr(test, mockall::automock)]
pub trait HttpClient: Send + Sync {
    /// Send a request with an optional JSON body
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse>;
}

/// Production HTTP client using reqwest
#[derive(Default)]
pub struct ReqwestHttpClient {
    client: reqwest::Client,
}

impl ReqwestHttpClient {
    /// Create a client, optionally bounding every request by `timeout`
    pub fn new(timeout: Option<Duration>) -> Result<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| ConsoleError::Http(format!("Building HTTP client: {}", e)))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl HttpClient for ReqwestHttpClient {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse> {
        let HttpRequest {
            method,
            url,
            bearer,
            query,
            body,
        } = request;
        debug!("{} {}", method, url);

        let mut builder = match method {
            Method::Get => self.client.get(&url),
            Method::Post => self.client.post(&url),
            Method::Put => self.client.put(&url),
            Method::Delete => self.client.delete(&url),
        };
        if let Some(token) = &bearer {
            builder = builder.bearer_auth(token);
        }
        if !query.is_empty() {
            builder = builder.query(&query);
        }
        if let Some(body) = &body {
            builder = builder.json(body);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| ConsoleError::Http(format!("{} {} failed: {}", method, url, e)))?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| ConsoleError::Http(format!("Reading response body: {}", e)))?;

        debug!("{} {} -> {} ({} bytes)", method, url, status, body.len());
        Ok(HttpResponse { status, body })
    }
}

// ============================================================================
// Websocket frame traits and implementations
// ============================================================================

/// Reader and writer halves of one websocket connection
pub struct SocketPair {
    pub reader: Box<dyn FrameReader>,
    pub writer: Box<dyn FrameWriter>,
}

/// Trait for reading text frames from a connection
#[async_trait]
#[cfg_attr(test, mockall::automock)]
pub trait FrameReader: Send {
    /// Read the next text frame
    ///
    /// Returns `Ok(None)` once the connection has been closed.
    async fn read_frame(&mut self) -> Result<Option<String>>;
}

/// Trait for writing text frames to a connection
#[async_trait]
#[cfg_attr(test, mockall::automock)]
pub trait FrameWriter: Send {
    async fn write_frame(&mut self, frame: &str) -> Result<()>;

    async fn close(&mut self) -> Result<()>;
}

/// Trait for opening websocket connections
#[async_trait]
#[cfg_attr(test, mockall::automock)]
pub trait SocketConnector: Send + Sync {
    async fn connect(&self, url: &str) -> Result<SocketPair>;
}

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// tokio-tungstenite implementation of FrameReader
pub struct WsFrameReader {
    stream: SplitStream<WsStream>,
}

#[async_trait]
impl FrameReader for WsFrameReader {
    async fn read_frame(&mut self) -> Result<Option<String>> {
        loop {
            match self.stream.next().await {
                None => return Ok(None),
                Some(Err(e)) => return Err(ConsoleError::Live(e.to_string())),
                Some(Ok(Message::Text(text))) => return Ok(Some(text.as_str().to_owned())),
                Some(Ok(Message::Close(frame))) => {
                    debug!("Websocket closed by remote: {:?}", frame);
                    return Ok(None);
                }
                Some(Ok(_)) => continue,
            }
        }
    }
}

/// tokio-tungstenite implementation of FrameWriter
pub struct WsFrameWriter {
    sink: SplitSink<WsStream, Message>,
}

#[async_trait]
impl FrameWriter for WsFrameWriter {
    async fn write_frame(&mut self, frame: &str) -> Result<()> {
        self.sink
            .send(Message::text(frame.to_owned()))
            .await
            .map_err(|e| ConsoleError::Live(format!("Sending frame: {}", e)))
    }

    async fn close(&mut self) -> Result<()> {
        self.sink
            .close()
            .await
            .map_err(|e| ConsoleError::Live(format!("Closing websocket: {}", e)))
    }
}

/// Production connector using tokio-tungstenite
#[derive(Debug, Default)]
pub struct WsConnector;

#[async_trait]
impl SocketConnector for WsConnector {
    async fn connect(&self, url: &str) -> Result<SocketPair> {
        debug!("Opening websocket to {}", url);
        let (stream, _response) = tokio_tungstenite::connect_async(url)
            .await
            .map_err(|e| ConsoleError::Live(format!("Connecting to {} failed: {}", url, e)))?;
        let (sink, stream) = stream.split();
        Ok(SocketPair {
            reader: Box::new(WsFrameReader { stream }),
            writer: Box::new(WsFrameWriter { sink }),
        })
    }
}
