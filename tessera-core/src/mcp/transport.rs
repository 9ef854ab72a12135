//! MCP message transports
//!
//! Transports move JSON-RPC messages between the server and a client.

use super::protocol::{JsonRpcError, JsonRpcRequest, JsonRpcResponse, RequestId};
use async_trait::async_trait;
use std::collections::VecDeque;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader, Stdin, Stdout};
use tracing::warn;

/// Transport-level failures
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to serialize response: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Moves JSON-RPC messages to and from a client
#[async_trait]
pub trait MessageTransport: Send {
    /// Receive the next request. `None` means the client went away.
    async fn receive(&mut self) -> Result<Option<JsonRpcRequest>, TransportError>;

    /// Send a response
    async fn send(&mut self, response: JsonRpcResponse) -> Result<(), TransportError>;
}

/// Newline-delimited JSON over a byte stream, stdin/stdout by default
///
/// Lines that are not valid JSON-RPC (including invalid UTF-8) are answered
/// with a parse error and skipped.
pub struct StdioTransport<R = Stdin, W = Stdout> {
    reader: BufReader<R>,
    writer: W,
}

impl StdioTransport {
    pub fn new() -> Self {
        Self::with_io(tokio::io::stdin(), tokio::io::stdout())
    }
}

impl Default for StdioTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl<R, W> StdioTransport<R, W>
where
    R: AsyncRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    /// Speak the same framing over arbitrary streams
    pub fn with_io(reader: R, writer: W) -> Self {
        Self {
            reader: BufReader::new(reader),
            writer,
        }
    }

    /// Give back the writer, e.g. to inspect what was sent
    pub fn into_writer(self) -> W {
        self.writer
    }
}

#[async_trait]
impl<R, W> MessageTransport for StdioTransport<R, W>
where
    R: AsyncRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    async fn receive(&mut self) -> Result<Option<JsonRpcRequest>, TransportError> {
        let mut line = Vec::new();
        loop {
            line.clear();
            if self.reader.read_until(b'\n', &mut line).await? == 0 {
                return Ok(None);
            }

            let trimmed = line.trim_ascii();
            if trimmed.is_empty() {
                continue;
            }

            match serde_json::from_slice(trimmed) {
                Ok(request) => return Ok(Some(request)),
                Err(e) => {
                    warn!(error = %e, "Discarding malformed JSON-RPC message");
                    self.send(JsonRpcResponse::error(RequestId::Null, JsonRpcError::parse_error()))
                        .await?;
                }
            }
        }
    }

    async fn send(&mut self, response: JsonRpcResponse) -> Result<(), TransportError> {
        let mut json = serde_json::to_string(&response)?;
        json.push('\n');
        self.writer.write_all(json.as_bytes()).await?;
        self.writer.flush().await?;
        Ok(())
    }
}

/// In-memory transport for testing
#[derive(Debug, Default)]
pub struct MemoryTransport {
    requests: VecDeque<JsonRpcRequest>,
    responses: Vec<JsonRpcResponse>,
}

impl MemoryTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a request to be received
    pub fn push_request(&mut self, request: JsonRpcRequest) {
        self.requests.push_back(request);
    }

    /// All sent responses
    pub fn responses(&self) -> &[JsonRpcResponse] {
        &self.responses
    }

    /// Take the last response
    pub fn pop_response(&mut self) -> Option<JsonRpcResponse> {
        self.responses.pop()
    }
}

#[async_trait]
impl MessageTransport for MemoryTransport {
    async fn receive(&mut self) -> Result<Option<JsonRpcRequest>, TransportError> {
        Ok(self.requests.pop_front())
    }

    async fn send(&mut self, response: JsonRpcResponse) -> Result<(), TransportError> {
        self.responses.push(response);
        Ok(())
    }
}

#[async_trait]
impl<T: MessageTransport + ?Sized> MessageTransport for &mut T {
    async fn receive(&mut self) -> Result<Option<JsonRpcRequest>, TransportError> {
        (**self).receive().await
    }

    async fn send(&mut self, response: JsonRpcResponse) -> Result<(), TransportError> {
        (**self).send(response).await
    }
}
