mod registry_error;
mod room_registry;
mod session;

pub use registry_error::*;
pub use room_registry::*;
pub use session::*;
