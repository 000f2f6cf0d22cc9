pub mod import;
pub mod normalize;
pub mod validate;

#[cfg(feature = "provider")]
pub mod generate;
