//! Host-facing wire contract and the stdin/stdout bridge.

pub mod contract;
pub mod stdio;

pub use contract::{LIST_TOOLS, ToolRequest, ToolResponse};
pub use stdio::{handle_request, run_stdio_bridge, serve};
