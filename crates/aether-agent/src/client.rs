// ABOUTME: Factory function for creating LLM clients by provider name.
// ABOUTME: Resolves provider name + optional model into a configured (Arc<dyn LlmClient>, model) pair.

use std::env;
use std::sync::Arc;

use crate::llm::LlmClient;
use crate::providers::GeminiClient;
use crate::providers::gemini::{DEFAULT_BASE_URL, DEFAULT_MODEL};

/// Create an LLM client for the given provider name.
///
/// Returns a tuple of (client, resolved_model). The model is resolved from:
/// 1. The explicit `model` parameter (if Some)
/// 2. A provider-specific environment variable (e.g. GEMINI_MODEL)
/// 3. A sensible default for that provider
pub fn create_llm_client(
    provider: &str,
    model: Option<&str>,
) -> Result<(Arc<dyn LlmClient>, String), anyhow::Error> {
    match provider {
        "gemini" => {
            let api_key = env::var("GEMINI_API_KEY")
                .ok()
                .filter(|k| !k.is_empty())
                .ok_or_else(|| anyhow::anyhow!("GEMINI_API_KEY environment variable not set"))?;
            let resolved_model = model
                .map(String::from)
                .or_else(|| env::var("GEMINI_MODEL").ok().filter(|m| !m.is_empty()))
                .unwrap_or_else(|| DEFAULT_MODEL.to_string());
            let base_url =
                env::var("GEMINI_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
            let client = GeminiClient::new(api_key, base_url, resolved_model.clone());
            Ok((Arc::new(client), resolved_model))
        }
        unknown => Err(anyhow::anyhow!("unsupported LLM provider: {}", unknown)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Serialize all tests that read/write env vars to prevent race conditions.
    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    /// Uses match instead of unwrap_err() because Arc<dyn LlmClient> doesn't impl Debug.
    fn expect_err(result: Result<(Arc<dyn LlmClient>, String), anyhow::Error>) -> String {
        match result {
            Err(e) => e.to_string(),
            Ok((_client, model)) => panic!("expected error, got Ok with model: {}", model),
        }
    }

    #[test]
    fn unknown_provider_returns_error() {
        let err = expect_err(create_llm_client("anthropic", None));
        assert!(
            err.contains("unsupported LLM provider"),
            "expected 'unsupported LLM provider' in error, got: {}",
            err
        );
    }

    #[test]
    fn gemini_missing_api_key_returns_error() {
        let _guard = ENV_MUTEX.lock().unwrap();
        unsafe { env::remove_var("GEMINI_API_KEY") };
        let err = expect_err(create_llm_client("gemini", None));
        assert!(
            err.contains("GEMINI_API_KEY"),
            "expected mention of GEMINI_API_KEY in error, got: {}",
            err
        );
    }

    #[test]
    fn explicit_model_param_overrides_default() {
        let _guard = ENV_MUTEX.lock().unwrap();
        unsafe { env::set_var("GEMINI_API_KEY", "test-key-456") };

        let result = create_llm_client("gemini", Some("gemini-2.5-pro"));

        unsafe { env::remove_var("GEMINI_API_KEY") };

        let (client, resolved_model) = match result {
            Ok(pair) => pair,
            Err(e) => panic!("expected Ok, got Err: {}", e),
        };
        assert_eq!(resolved_model, "gemini-2.5-pro");
        assert_eq!(client.model_name(), "gemini-2.5-pro");
        assert_eq!(client.provider_name(), "gemini");
    }

    #[test]
    fn gemini_success_returns_default_model() {
        let _guard = ENV_MUTEX.lock().unwrap();
        unsafe {
            env::set_var("GEMINI_API_KEY", "test-key-123");
            env::remove_var("GEMINI_MODEL");
        }

        let result = create_llm_client("gemini", None);

        unsafe { env::remove_var("GEMINI_API_KEY") };

        let (_client, resolved_model) = match result {
            Ok(pair) => pair,
            Err(e) => panic!("expected Ok, got Err: {}", e),
        };
        assert_eq!(
            resolved_model, DEFAULT_MODEL,
            "expected default Gemini model, got: {}",
            resolved_model
        );
    }
}
