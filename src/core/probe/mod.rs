//! Analytic Server Status Probing
//!
//! This module asks a remote analytic server whether it is running:
//! - One ZeroMQ request/reply exchange per probe, bounded by send/receive timeouts
//! - XML request encoding and total, never-failing reply decoding
//! - A single normalized result (`Running` + pid, or `Unknown` + 0) on every path
//! - Advisory diagnostics on stderr and an optional JSON-lines debug log

pub mod checker;
pub mod codec;
pub mod config;
pub mod debug_logger;
pub mod transport;
pub mod types;


// Re-export public API
pub use checker::{block_on_probe, check_status, check_status_with_options, StatusProbe};
pub use codec::{decode_reply, encode_request, read_reply, DecodedReply, FALLBACK_REPLY};
pub use config::ProbeOptions;
pub use debug_logger::{get_debug_logger, DebugLogger, DiagnosticsOptions};
pub use transport::{default_transport, StatusTransport, TransportError, TransportSession};
pub use types::{ReplySource, ServerEndpoint, ServerStatus, StatusResult, DEFAULT_OPERATION};

#[cfg(feature = "network-monitoring")]
pub use transport::{ZmqSession, ZmqTransport};

#[cfg(not(feature = "network-monitoring"))]
pub use transport::DisabledTransport;
