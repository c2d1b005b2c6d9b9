//! taskbridge exposes project/task operations and Gemini planning helpers as
//! MCP-style tools over HTTP.
//!
//! Every tool is a thin relay: arguments are validated against a fixed schema,
//! forwarded to the project/task REST backend or to the Gemini completion API,
//! and the result is wrapped in a uniform `{isError, ...}` envelope. The
//! interesting part lives in [`registry`] (envelope + validation) and
//! [`transport`] (JSON-RPC over HTTP, stateless or session-based).

pub mod backend;
pub mod config;
pub mod error;
pub mod gemini;
pub mod prompts;
pub mod registry;
pub mod session;
pub mod tools;
pub mod transport;
