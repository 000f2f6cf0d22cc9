pub mod destiny;
pub mod providers;

pub use destiny::import::{export_result, import_result, ImportError};
pub use destiny::normalize::normalize;
pub use destiny::validate::{validate, validate_into, ValidationError};
pub use providers::cleaner::{clean_markdown, parse_model_json};
pub use providers::core::{AiProvider, Completion, TokenUsage};
pub use providers::prompter::{build_prompt, build_prompt_for_chart, build_prompt_for_manual, prompt_hash};

#[cfg(feature = "provider")]
pub use destiny::generate::{generate_destiny, generate_from_prompt, GeneratedDestiny};
#[cfg(feature = "provider")]
pub use providers::anthropic::AnthropicProvider;
