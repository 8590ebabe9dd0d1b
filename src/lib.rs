//! Courier - minimal HTTP/1.1 server
//!
//! Core library for request parsing, routing, and response framing.

pub mod config;
pub mod http;
pub mod server;
