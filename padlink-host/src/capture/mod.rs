mod capture_source;
mod sample_source;
mod shared_capture;

pub use capture_source::*;
pub use sample_source::*;
pub use shared_capture::*;
