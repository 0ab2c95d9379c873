mod app;
mod config;
mod http;
mod registry;
mod signaling;

pub use app::*;
pub use config::*;
pub use http::*;
pub use registry::*;
pub use signaling::*;
