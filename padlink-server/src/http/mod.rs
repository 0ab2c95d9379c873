mod client_log;
mod ice_handler;

pub use client_log::*;
pub use ice_handler::*;
