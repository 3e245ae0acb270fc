//! Control4 proxy integration module
//!
//! - `client`: `get`/`set` variable commands over HTTP

pub mod client;

pub use client::ProxyCommandClient;
