// MCP JSON-RPC surface: wire types and the tool dispatcher
pub mod handler;
pub mod protocol;
pub mod tools;
