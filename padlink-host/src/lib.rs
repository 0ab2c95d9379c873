mod capture;
mod config;
mod error;
mod orchestrator;
mod session;
mod signaling;
mod transport;

pub use capture::*;
pub use config::*;
pub use error::*;
pub use orchestrator::*;
pub use session::*;
pub use signaling::*;
pub use transport::*;
