pub mod openai;

pub use openai::{OpenAIClient, DEFAULT_API_BASE, REQUEST_TIMEOUT};
