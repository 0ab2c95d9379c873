mod ice_fetch;
mod relay_client;
mod signaling_output;

pub use ice_fetch::*;
pub use relay_client::*;
pub use signaling_output::*;
