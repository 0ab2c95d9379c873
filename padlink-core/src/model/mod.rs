mod chat;
mod control;
mod peer;
mod room;
mod signaling;

pub use chat::ChatMessage;
pub use control::{
    ControlKey, ControlMessage, ControlValue, GamepadInput, GamepadInputType, InputState,
    KeyState, KeyboardInput, MouseInput,
};
pub use peer::EndpointId;
pub use room::{Member, RoomCode};
pub use signaling::{
    ClientMessage, IceServerConfig, IceServersResponse, Relayed, ServerMessage, Signal, SignalKind,
    default_ice_servers,
};
