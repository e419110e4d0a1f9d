//! `fetch` - a content-aware HTTP, gRPC, and WebSocket client
//!
//! This library backs the `fetch` binary. It is organized into the
//! following modules:
//!
//! - `cli`: command-line interface definition
//! - `config`: configuration loading, merging, and validation
//! - `error`: error types and the crate-wide result alias
//! - `request`: request planning, authentication, retry, and the
//!   connect-through-response executor state machine
//! - `response`: the response envelope and content classifier
//! - `format`: content-aware pretty-printers, dispatched by classified kind
//! - `grpc`: gRPC framing and schema-aware protobuf decoding
//! - `tls`: TLS client config assembly and certificate inspection
//! - `session`: cookie jar persistence
//! - `dns`: DNS-over-HTTPS and plain UDP resolution
//! - `ws`: WebSocket duplex loop
//! - `progress`: stderr progress/timing observer
//! - `printer`: ANSI styling and the destination writer
//! - `output`: response-body destination resolution

pub mod cli;
pub mod config;
pub mod dns;
pub mod error;
pub mod format;
pub mod grpc;
pub mod output;
pub mod printer;
pub mod progress;
pub mod request;
pub mod response;
pub mod session;
pub mod tls;
pub mod ws;

pub use cli::Cli;
pub use config::Config;
pub use error::{FetchError, Result};

#[cfg(test)]
pub mod test_utils;
