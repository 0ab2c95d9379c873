mod host_context;

pub use host_context::*;
