pub mod cleaner;
pub mod instructions;
pub mod prompter;

#[cfg(feature = "provider")]
pub mod anthropic;
pub mod core;
