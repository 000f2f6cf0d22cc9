pub mod annotations;
pub mod interpolate;
pub mod jitter;

pub use annotations::*;
pub use interpolate::interpolate;
pub use jitter::{Jitter, NoJitter, RngJitter};
