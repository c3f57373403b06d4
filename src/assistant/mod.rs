//! Chat helper for the analysis dashboard.
//!
//! Answers questions about the current analysis through the Gemini API,
//! enriching the prompt with analysis-type focus areas and patient-journey
//! rules. Without a usable API key, or when the call fails, it falls back to
//! canned keyword-matched responses.

pub mod context;
pub mod gemini;
pub mod mock;

pub use context::{context_profile, AnalysisContext, ContextProfile, CONTEXT_PROFILES};
pub use gemini::GeminiClient;
pub use mock::canned_response;

use crate::error::AssistantError;
use crate::knowledge::KnowledgeBase;
use tracing::{info, warn};

/// Placeholder shipped in sample configs.
pub const API_KEY_PLACEHOLDER: &str = "YOUR_GEMINI_API_KEY_HERE";

pub const DEFAULT_API_URL: &str =
    "https://generativelanguage.googleapis.com/v1beta/models/gemini-pro:generateContent";

/// Configuration for the assistant.
#[derive(Debug, Clone)]
pub struct AssistantConfig {
    pub api_url: String,
    pub api_key: Option<String>,
    pub temperature: f32,
    pub max_tokens: u32,
    pub timeout_seconds: u64,
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            api_key: None,
            temperature: 0.7,
            max_tokens: 1000,
            timeout_seconds: 30,
        }
    }
}

impl AssistantConfig {
    /// The key, if it is set to something other than blank or the placeholder.
    pub fn usable_api_key(&self) -> Option<&str> {
        self.api_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty() && *k != API_KEY_PLACEHOLDER)
    }
}

/// Answers dashboard questions, never failing.
pub struct Assistant {
    client: Option<GeminiClient>,
    knowledge: KnowledgeBase,
}

impl Assistant {
    pub fn new(config: &AssistantConfig, knowledge: KnowledgeBase) -> Result<Self, AssistantError> {
        let client = match config.usable_api_key() {
            Some(key) => Some(GeminiClient::new(
                &config.api_url,
                key,
                config.temperature,
                config.max_tokens,
                config.timeout_seconds,
            )?),
            None => None,
        };

        Ok(Self { client, knowledge })
    }

    /// Assistant that only ever gives canned responses.
    pub fn offline(knowledge: KnowledgeBase) -> Self {
        Self {
            client: None,
            knowledge,
        }
    }

    pub fn is_online(&self) -> bool {
        self.client.is_some()
    }

    /// Answer `message` in the context of the current analysis.
    pub async fn generate_response(&self, ctx: &AnalysisContext, message: &str) -> String {
        let Some(client) = &self.client else {
            info!("Gemini API key not configured, using mock response");
            return canned_response(ctx, message);
        };

        let prompt = self.build_prompt(ctx, message);
        match client.generate(&prompt).await {
            Ok(text) => text,
            Err(e) => {
                warn!("Error calling Gemini API: {}", e);
                canned_response(ctx, message)
            }
        }
    }

    /// Full prompt sent to the model.
    pub fn build_prompt(&self, ctx: &AnalysisContext, message: &str) -> String {
        let profile = ctx.profile();
        let indication = ctx.indication_label();
        let analysis_type = ctx.analysis_type_label();

        let mut prompt = String::new();
        prompt.push_str(SYSTEM_PROMPT);
        prompt.push_str("\n\n");
        prompt.push_str(&format!("Current Analysis: {} for {}\n", profile.context, indication));
        prompt.push_str(&format!("Analysis Type: {}\n", analysis_type));
        prompt.push_str(&format!("Key Focus Areas: {}\n", profile.keywords.join(", ")));
        prompt.push_str(&format!("Relevant Metrics: {}\n\n", profile.metrics.join(", ")));

        if let Some(indication) = &ctx.indication {
            prompt.push_str(&self.knowledge.llm_context(indication, message));
        }

        prompt.push_str(&format!("User Question: {}\n\n", message));
        prompt.push_str("Please provide a focused, data-driven response that:\n");
        prompt.push_str(&format!(
            "1. Addresses the specific question in the context of {} {}\n",
            indication, analysis_type
        ));
        prompt.push_str("2. References relevant healthcare analytics concepts\n");
        prompt.push_str("3. Provides actionable insights when possible\n");
        prompt.push_str("4. Keeps the response concise and business-focused");

        prompt
    }
}

const SYSTEM_PROMPT: &str = r#"You are a healthcare analytics AI assistant helping analyze patient journey data.
You have access to detailed claims data, market access information, treatment patterns, and patient outcomes.

Current Analysis Context:
- Focus on providing insights about market access barriers
- Explain payer coverage patterns and prior authorization requirements
- Analyze treatment pathways and patient flow
- Identify care gaps and improvement opportunities
- Provide actionable recommendations based on data

Keep responses concise, data-driven, and business-focused. Always reference specific metrics when available."#;

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx() -> AnalysisContext {
        AnalysisContext::new(
            Some("Breast Cancer".to_string()),
            Some("treatment-pathway".to_string()),
        )
    }

    #[test]
    fn test_usable_api_key() {
        let mut config = AssistantConfig::default();
        assert!(config.usable_api_key().is_none());

        config.api_key = Some("  ".to_string());
        assert!(config.usable_api_key().is_none());

        config.api_key = Some(API_KEY_PLACEHOLDER.to_string());
        assert!(config.usable_api_key().is_none());

        config.api_key = Some("abc123".to_string());
        assert_eq!(config.usable_api_key(), Some("abc123"));
    }

    #[test]
    fn test_prompt_contains_context_and_rules() {
        let assistant = Assistant::offline(KnowledgeBase::builtin());
        let prompt = assistant.build_prompt(&ctx(), "How do patients progress between lines?");

        assert!(prompt.starts_with("You are a healthcare analytics AI assistant"));
        assert!(prompt.contains(
            "Current Analysis: Treatment Pathway Analysis mapping patient treatment journeys for Breast Cancer\n"
        ));
        assert!(prompt.contains("Analysis Type: treatment-pathway\n"));
        assert!(prompt.contains("Relevant Metrics: line progression, switching rate"));
        assert!(prompt.contains("Based on validated Patient Journey Rules for Breast Cancer"));
        assert!(prompt.contains("Line of Therapy Progression Rules:"));
        assert!(prompt.contains("User Question: How do patients progress between lines?"));
        assert!(prompt.ends_with("4. Keeps the response concise and business-focused"));
    }

    #[test]
    fn test_prompt_without_known_indication() {
        let assistant = Assistant::offline(KnowledgeBase::builtin());
        let ctx = AnalysisContext::new(Some("Migraine".to_string()), None);
        let prompt = assistant.build_prompt(&ctx, "drug line patient");
        assert!(!prompt.contains("Patient Journey Rules"));
        assert!(prompt.contains("Market Access Analysis for healthcare indication for Migraine"));
    }

    #[tokio::test]
    async fn test_offline_uses_canned_response() {
        let assistant = Assistant::offline(KnowledgeBase::builtin());
        assert!(!assistant.is_online());
        let response = assistant.generate_response(&ctx(), "what about switching?").await;
        assert!(response.starts_with("Switching patterns in Breast Cancer"));
    }

    #[tokio::test]
    async fn test_placeholder_key_stays_offline() {
        let config = AssistantConfig {
            api_key: Some(API_KEY_PLACEHOLDER.to_string()),
            ..AssistantConfig::default()
        };
        let assistant = Assistant::new(&config, KnowledgeBase::builtin()).unwrap();
        assert!(!assistant.is_online());
    }

    #[tokio::test]
    async fn test_failed_call_falls_back() {
        let config = AssistantConfig {
            api_url: "http://127.0.0.1:9/v1beta/models/gemini-pro:generateContent".to_string(),
            api_key: Some("real-looking-key".to_string()),
            timeout_seconds: 2,
            ..AssistantConfig::default()
        };
        let assistant = Assistant::new(&config, KnowledgeBase::builtin()).unwrap();
        assert!(assistant.is_online());

        let response = assistant.generate_response(&ctx(), "how long is the duration?").await;
        assert!(response.starts_with("Treatment duration analysis shows median time"));
    }
}
