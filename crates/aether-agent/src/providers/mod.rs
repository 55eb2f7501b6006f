// ABOUTME: Provider module aggregating the model-service adapters.
// ABOUTME: Each sub-module implements LlmClient for a specific LLM API.

pub mod gemini;

pub use gemini::GeminiClient;
