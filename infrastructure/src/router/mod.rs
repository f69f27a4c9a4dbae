//! Model Router adapter: HTTP client, wire protocol, and the gateway
//! implementation of the application's `ModelGateway` port.

pub mod client;
pub mod error;
pub mod gateway;
pub mod protocol;

pub use client::RouterClient;
pub use error::RouterError;
pub use gateway::RouterGateway;
pub use protocol::{CallMetadata, ModelInfo};
