//! Tool protocol (MCP), served with `rmcp`

pub mod error;
pub mod tools;
pub mod transport;

pub use tools::HarborMcp;
