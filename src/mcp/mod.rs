//! MCP (Model Context Protocol) serving surface.
//!
//! A stdio JSON-RPC 2.0 server exposing the retrieval service as a callable
//! tool for an external agent/orchestration layer.

#[cfg(test)]
mod tests;

pub mod protocol;
pub mod server;
pub mod tools;
