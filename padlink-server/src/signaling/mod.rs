mod peer_directory;
mod signaling_service;
mod ws_handler;

pub use peer_directory::*;
pub use signaling_service::*;
pub use ws_handler::*;
