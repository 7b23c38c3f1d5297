//! Request/Reply Transport Sessions
//!
//! A session owns one outbound request/reply socket to a single endpoint and
//! carries exactly one exchange. Every wait is bounded by [`ProbeOptions`] and
//! the socket is released on every exit path: explicitly through
//! [`TransportSession::close`], or by drop when a session is abandoned.

use crate::core::probe::config::ProbeOptions;
use crate::core::probe::types::ServerEndpoint;

#[cfg(feature = "network-monitoring")]
use zeromq::{ReqSocket, Socket, SocketRecv, SocketSend, ZmqMessage};

/// Transport failures, kept distinct for diagnostics
///
/// The status probe never returns these to its caller; they are logged and
/// collapsed into the fallback result.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    #[error("connect failed: {0}")]
    ConnectFailed(String),
    #[error("send timed out after {timeout_ms}ms")]
    SendTimeout { timeout_ms: u64 },
    #[error("send failed: {0}")]
    SendFailed(String),
    #[error("no reply within {timeout_ms}ms")]
    ReceiveTimeout { timeout_ms: u64 },
    #[error("receive failed: {0}")]
    ReceiveFailed(String),
}

impl TransportError {
    /// Stable machine-readable failure code
    pub fn code(&self) -> &'static str {
        match self {
            TransportError::ConnectFailed(_) => "connect_failed",
            TransportError::SendTimeout { .. } => "send_timeout",
            TransportError::SendFailed(_) => "send_failed",
            TransportError::ReceiveTimeout { .. } => "receive_timeout",
            TransportError::ReceiveFailed(_) => "receive_failed",
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(
            self,
            TransportError::SendTimeout { .. } | TransportError::ReceiveTimeout { .. }
        )
    }
}

/// Opens request/reply sessions
///
/// The seam between the status probe and the network, so the probe can be
/// driven by in-memory transports in tests.
#[async_trait::async_trait]
pub trait StatusTransport: Send + Sync {
    /// Connect to `endpoint`, bounded by the configured send timeout
    async fn open(
        &self,
        endpoint: &ServerEndpoint,
    ) -> Result<Box<dyn TransportSession>, TransportError>;
}

/// One connected request/reply channel
#[async_trait::async_trait]
pub trait TransportSession: Send {
    /// Send `request` and wait for the single reply
    ///
    /// A session supports one exchange; later calls fail with `SendFailed`.
    async fn send_and_receive(&mut self, request: &[u8]) -> Result<Vec<u8>, TransportError>;

    /// Release the socket. Idempotent and infallible.
    async fn close(&mut self);
}

/// Production transport over ZeroMQ REQ sockets
#[cfg(feature = "network-monitoring")]
#[derive(Debug, Clone, Default)]
pub struct ZmqTransport {
    options: ProbeOptions,
}

#[cfg(feature = "network-monitoring")]
impl ZmqTransport {
    pub fn new(options: ProbeOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &ProbeOptions {
        &self.options
    }
}

#[cfg(feature = "network-monitoring")]
#[async_trait::async_trait]
impl StatusTransport for ZmqTransport {
    async fn open(
        &self,
        endpoint: &ServerEndpoint,
    ) -> Result<Box<dyn TransportSession>, TransportError> {
        let address = endpoint.socket_address();
        let mut socket = ReqSocket::new();
        // Connecting and handing over the request share one send window
        let send_deadline = tokio::time::Instant::now() + self.options.send_timeout();

        // The connect future retries until a peer answers, so the deadline is the only bound
        match tokio::time::timeout_at(send_deadline, socket.connect(&address)).await {
            Ok(Ok(())) => Ok(Box::new(ZmqSession {
                socket: Some(socket),
                options: self.options.clone(),
                send_deadline,
                exchanged: false,
            })),
            Ok(Err(e)) => Err(TransportError::ConnectFailed(format!("{}: {}", address, e))),
            Err(_) => Err(TransportError::ConnectFailed(format!(
                "{}: not connected within {}ms",
                address, self.options.send_timeout_ms
            ))),
        }
    }
}

/// Session over a connected REQ socket
#[cfg(feature = "network-monitoring")]
pub struct ZmqSession {
    /// `None` once closed
    socket: Option<ReqSocket>,
    options: ProbeOptions,
    /// End of the send window opened by connect
    send_deadline: tokio::time::Instant,
    exchanged: bool,
}

#[cfg(feature = "network-monitoring")]
#[async_trait::async_trait]
impl TransportSession for ZmqSession {
    async fn send_and_receive(&mut self, request: &[u8]) -> Result<Vec<u8>, TransportError> {
        if self.exchanged {
            return Err(TransportError::SendFailed(
                "session already carried an exchange".to_string(),
            ));
        }
        let socket = self
            .socket
            .as_mut()
            .ok_or_else(|| TransportError::SendFailed("session is closed".to_string()))?;
        self.exchanged = true;

        let message = ZmqMessage::from(request.to_vec());
        match tokio::time::timeout_at(self.send_deadline, socket.send(message)).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => return Err(TransportError::SendFailed(e.to_string())),
            Err(_) => {
                return Err(TransportError::SendTimeout {
                    timeout_ms: self.options.send_timeout_ms,
                })
            }
        }

        let reply = match tokio::time::timeout(self.options.receive_timeout(), socket.recv()).await
        {
            Ok(Ok(reply)) => reply,
            Ok(Err(e)) => return Err(TransportError::ReceiveFailed(e.to_string())),
            Err(_) => {
                return Err(TransportError::ReceiveTimeout {
                    timeout_ms: self.options.receive_timeout_ms,
                })
            }
        };

        // Only the first frame carries the reply document
        Ok(reply.get(0).map(|frame| frame.to_vec()).unwrap_or_default())
    }

    async fn close(&mut self) {
        let Some(socket) = self.socket.take() else {
            return;
        };
        if self.options.linger_ms == 0 {
            drop(socket);
        } else {
            let _ = tokio::time::timeout(self.options.linger(), socket.close()).await;
        }
    }
}

/// Stand-in used when the crate is built without `network-monitoring`
///
/// Every open fails, so probes report the fallback result.
#[cfg(not(feature = "network-monitoring"))]
#[derive(Debug, Clone, Default)]
pub struct DisabledTransport;

#[cfg(not(feature = "network-monitoring"))]
#[async_trait::async_trait]
impl StatusTransport for DisabledTransport {
    async fn open(
        &self,
        endpoint: &ServerEndpoint,
    ) -> Result<Box<dyn TransportSession>, TransportError> {
        Err(TransportError::ConnectFailed(format!(
            "{}: built without network-monitoring",
            endpoint.socket_address()
        )))
    }
}

/// Transport for the current build configuration
pub fn default_transport(options: &ProbeOptions) -> Box<dyn StatusTransport> {
    #[cfg(feature = "network-monitoring")]
    {
        Box::new(ZmqTransport::new(options.clone()))
    }
    #[cfg(not(feature = "network-monitoring"))]
    {
        let _ = options;
        Box::new(DisabledTransport)
    }
}
