pub mod birth;
pub mod ganzhi;
pub mod predictions;
pub mod transforms;

pub use birth::*;
pub use ganzhi::*;
pub use predictions::*;
