//! Analytic Server Status Probe
//!
//! Runs one status request against one endpoint and always produces a
//! [`StatusResult`]:
//! - Transport failures of any kind are logged and replaced by the synthetic
//!   fallback reply
//! - Bad replies and missing replies go through the same decode path
//! - The session is closed on every path once it was opened

use crate::core::probe::codec::{decode_reply, encode_request, parse_reply, FALLBACK_REPLY};
use crate::core::probe::config::ProbeOptions;
use crate::core::probe::debug_logger::{new_correlation_id, DebugLogger, DiagnosticsOptions};
use crate::core::probe::transport::{default_transport, StatusTransport, TransportError};
use crate::core::probe::types::{ReplySource, ServerEndpoint, StatusResult};
use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use std::time::Instant;

/// Probe orchestrating a transport and the reply codec
pub struct StatusProbe {
    transport: Box<dyn StatusTransport>,
    logger: DebugLogger,
    options: ProbeOptions,
}

impl StatusProbe {
    /// Probe over the default transport for this build
    pub fn new(options: ProbeOptions, diagnostics: &DiagnosticsOptions) -> Self {
        Self {
            transport: default_transport(&options),
            logger: DebugLogger::from_options(diagnostics),
            options,
        }
    }

    /// Probe with an injected transport and logger
    pub fn with_transport(
        transport: Box<dyn StatusTransport>,
        logger: DebugLogger,
        options: ProbeOptions,
    ) -> Self {
        Self {
            transport,
            logger,
            options,
        }
    }

    pub fn options(&self) -> &ProbeOptions {
        &self.options
    }

    /// Ask `endpoint` for its status using `operation`
    ///
    /// Never fails: anything short of a well-formed `Running` reply with a
    /// numeric pid yields `Unknown` with pid 0.
    pub async fn check_status(&self, endpoint: &ServerEndpoint, operation: &str) -> StatusResult {
        let correlation_id = new_correlation_id();
        let started = Instant::now();
        self.logger
            .probe_start(endpoint, operation, &self.options, &correlation_id);

        let request = encode_request(operation);

        let reply = match AssertUnwindSafe(self.exchange(endpoint, &request, &correlation_id))
            .catch_unwind()
            .await
        {
            Ok(reply) => reply,
            Err(_) => {
                self.logger.error_sync(
                    "transport_panic",
                    &format!("Transport panicked while probing {}", endpoint),
                );
                None
            }
        };

        let (result, source) = match reply {
            Some(bytes) => (self.decode(&bytes, &correlation_id), ReplySource::Remote),
            None => (
                decode_reply(FALLBACK_REPLY.as_bytes()),
                ReplySource::Fallback,
            ),
        };

        self.logger.probe_end(
            &result,
            source,
            started.elapsed().as_millis() as u64,
            &correlation_id,
        );
        result
    }

    /// Open, exchange once, close. `None` when no reply bytes were obtained.
    async fn exchange(
        &self,
        endpoint: &ServerEndpoint,
        request: &[u8],
        correlation_id: &str,
    ) -> Option<Vec<u8>> {
        let mut session = match self.transport.open(endpoint).await {
            Ok(session) => session,
            Err(error) => {
                self.report(&error, endpoint, correlation_id);
                return None;
            }
        };

        let outcome = session.send_and_receive(request).await;
        session.close().await;

        match outcome {
            Ok(bytes) => Some(bytes),
            Err(error) => {
                self.report(&error, endpoint, correlation_id);
                None
            }
        }
    }

    fn decode(&self, bytes: &[u8], correlation_id: &str) -> StatusResult {
        if let Err(reason) = parse_reply(bytes) {
            self.logger.decode_fallback(&reason.to_string(), correlation_id);
        }
        decode_reply(bytes)
    }

    fn report(&self, error: &TransportError, endpoint: &ServerEndpoint, correlation_id: &str) {
        self.logger.transport_failure(error, endpoint, correlation_id);
    }
}

/// Blocking probe with default socket options and diagnostics
///
/// Must not be called from inside an async runtime; use
/// [`StatusProbe::check_status`] there instead.
pub fn check_status(endpoint: &ServerEndpoint, operation: &str) -> StatusResult {
    check_status_with_options(endpoint, operation, &ProbeOptions::default())
}

/// Blocking probe with explicit socket options
pub fn check_status_with_options(
    endpoint: &ServerEndpoint,
    operation: &str,
    options: &ProbeOptions,
) -> StatusResult {
    let probe = StatusProbe::new(options.clone(), &DiagnosticsOptions::default());
    block_on_probe(&probe, endpoint, operation)
}

/// Run `probe` to completion on a private runtime that is torn down afterwards
pub fn block_on_probe(
    probe: &StatusProbe,
    endpoint: &ServerEndpoint,
    operation: &str,
) -> StatusResult {
    #[cfg(feature = "network-monitoring")]
    {
        match tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
        {
            Ok(runtime) => runtime.block_on(probe.check_status(endpoint, operation)),
            Err(e) => {
                probe
                    .logger
                    .error_sync("runtime_unavailable", &format!("Runtime creation failed: {}", e));
                decode_reply(FALLBACK_REPLY.as_bytes())
            }
        }
    }
    #[cfg(not(feature = "network-monitoring"))]
    {
        futures::executor::block_on(probe.check_status(endpoint, operation))
    }
}
