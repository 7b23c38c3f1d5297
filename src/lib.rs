//! Status probe client for analytic servers.
//!
//! Sends one XML status request over a ZeroMQ request/reply socket and always
//! returns a normalized [`StatusResult`], whatever happens on the wire.
//!
//! ```no_run
//! use analytic_probe::{check_status, ServerEndpoint};
//!
//! let result = check_status(&ServerEndpoint::new("127.0.0.1", 4000), "AnalyticServerStatus");
//! println!("{} {}", result.status(), result.pid());
//! ```

pub mod cli;
pub mod config;
pub mod core;

pub use crate::core::probe::{
    check_status, check_status_with_options, ProbeOptions, ServerEndpoint, ServerStatus,
    StatusProbe, StatusResult,
};
