//! HTTP API for the workboard backend.

mod server;

pub use server::{AppServer, build_router, start_server};
