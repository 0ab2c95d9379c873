mod context;
mod host_behavior;
mod host_command;
mod negotiation;
mod orchestrator;
mod peer_link;

pub use context::*;
pub use host_behavior::*;
pub use host_command::*;
pub use orchestrator::*;
pub use peer_link::*;
