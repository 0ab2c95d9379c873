pub use padlink_core::model::{ControlMessage, EndpointId, RoomCode};

pub mod model {
    pub use padlink_core::model::*;
}

#[cfg(feature = "server")]
pub mod server {
    pub use padlink_server::*;
}

#[cfg(feature = "host")]
pub mod host {
    pub use padlink_host::*;
}
