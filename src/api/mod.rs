//! HTTP API for the Bespoke Model service.
//!
//! Run with the `bespoke-server` binary.

pub mod handlers;
pub mod server;

pub use server::{run_server, ServerConfig};
