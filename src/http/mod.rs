//! HTTP protocol implementation.
//!
//! A deliberately small HTTP/1.1 server: one request per connection, no
//! keep-alive, no chunked bodies.
//!
//! # Architecture
//!
//! - **`connection`**: Per-connection state machine (read, handle, write, close)
//! - **`parser`**: Parses requests (and, for tests, responses) from byte buffers
//! - **`request`**: Request representation and the ordered header list
//! - **`response`**: Response representation with builder pattern
//! - **`negotiation`**: Accept-Encoding handling
//! - **`writer`**: Serializes responses, applying gzip when requested
//! - **`router`**: Ordered exact/prefix route table
//! - **`handler`**: Root, echo, user-agent and file handlers
//! - **`files`**: Directory-backed file store with create-only writes
//!
//! # Connection State Machine
//!
//! ```text
//!        ┌─────────────┐
//!        │   Reading   │ ← Buffer bytes until the head terminator
//!        └──────┬──────┘
//!               │ Request parsed (EOF with no data → Closed)
//!               ▼
//!        ┌──────────────────┐
//!        │   Processing     │ ← Route and run handler
//!        └──────┬───────────┘
//!               │ Response ready
//!               ▼
//!        ┌──────────────────┐
//!        │    Writing       │ ← Send response to client
//!        └──────┬───────────┘
//!               │ Response sent
//!               ▼
//!        ┌──────────────────┐
//!        │     Closed       │
//!        └──────────────────┘
//! ```
//!
//! A parse error ends the connection from `Reading` without a response.

pub mod connection;
pub mod files;
pub mod handler;
pub mod negotiation;
pub mod parser;
pub mod request;
pub mod response;
pub mod router;
pub mod writer;
