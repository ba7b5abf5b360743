// Gateway module for prompt construction

mod builder;

pub use builder::PromptBuilder;
