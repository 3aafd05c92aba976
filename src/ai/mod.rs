//! Text-generation proxy: structured prompts in, typed results out.

pub mod client;
pub mod flows;
pub mod job;

use crate::error::Result;
use serde_json::Value;

/// A service that turns a prompt into JSON text shaped by `response_schema`.
pub trait TextGenerator: Send + Sync {
    fn generate(&self, prompt: &str, response_schema: &Value) -> Result<String>;
}
