//! Classification oracle — the external language-model capability.
//!
//! The pipeline does not understand natural language itself; it delegates
//! to an [`Oracle`] and owns everything around the call: the response
//! schema, the system instruction, and all validation of what comes back.
//! The concrete Gemini client lives in [`gemini`].

pub mod gemini;

pub use gemini::GeminiOracle;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Value, json};

use crate::error::OracleError;
use crate::registry::AgencyRegistry;

/// External classification capability, behind a narrow async seam.
///
/// Implementations must propagate every failure mode (transport, timeout,
/// unparseable body) as an [`OracleError`] rather than swallowing it — the
/// pipeline's fallback policy depends on seeing the failure.
#[async_trait]
pub trait Oracle: Send + Sync {
    /// Classify one inbound report into a raw candidate object.
    async fn classify(&self, text: &str) -> Result<RawClassification, OracleError>;
}

// ── Raw candidate types ─────────────────────────────────────────────

/// The oracle's candidate output, deserialized but not yet trusted.
///
/// Field types are deliberately loose (free strings, optional booleans);
/// the triage pipeline is the only place they are promoted to the typed
/// domain model, and only after validation.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawClassification {
    #[serde(default)]
    pub user_message: String,
    #[serde(default)]
    pub internal_actions: Option<RawInternalActions>,
    #[serde(default)]
    pub case_object: Option<RawCaseObject>,
    #[serde(default)]
    pub agency_alert: Option<RawAgencyAlert>,
}

impl RawClassification {
    /// Parse a candidate from the oracle's text output.
    ///
    /// Tolerates markdown code fences and surrounding prose around the
    /// JSON object; anything that still fails to parse is a
    /// `MalformedResponse`.
    pub fn from_text(raw: &str) -> Result<Self, OracleError> {
        let json_str = extract_json_object(raw);
        serde_json::from_str(&json_str)
            .map_err(|e| OracleError::MalformedResponse(format!("candidate JSON: {e}")))
    }
}

/// The oracle's `internal_actions` block.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawInternalActions {
    #[serde(default)]
    pub intent: String,
    /// Advisory only — the pipeline decides ticket eligibility.
    #[serde(default)]
    pub create_ticket: Option<bool>,
}

/// The oracle's proposed case object, all fields as free strings.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawCaseObject {
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub urgency: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub agency: String,
    #[serde(default)]
    pub sentiment: String,
}

/// The oracle's proposed agency alert. Loosely typed by contract; the
/// agency string is cross-checked against the registry before any use.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawAgencyAlert {
    #[serde(default)]
    pub send_sms: bool,
    #[serde(default)]
    pub agency: Option<String>,
    #[serde(default)]
    pub ticket_id: Option<String>,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
}

// ── Oracle contract: schema & instruction ───────────────────────────

/// Build the JSON response schema sent with every oracle call.
///
/// Mirrors the shape the pipeline validates: `user_message` and
/// `internal_actions.intent` required, closed enums for intent, urgency,
/// sentiment, and the agency list taken verbatim from the registry.
pub fn response_schema(registry: &AgencyRegistry) -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "user_message": { "type": "STRING" },
            "internal_actions": {
                "type": "OBJECT",
                "properties": {
                    "intent": {
                        "type": "STRING",
                        "enum": ["new_report", "status_check", "update_report", "spam"]
                    },
                    "create_ticket": { "type": "BOOLEAN" }
                },
                "required": ["intent"]
            },
            "case_object": {
                "type": "OBJECT",
                "nullable": true,
                "properties": {
                    "category": { "type": "STRING" },
                    "urgency": { "type": "STRING", "enum": ["High", "Medium", "Low"] },
                    "location": { "type": "STRING" },
                    "summary": { "type": "STRING" },
                    "agency": { "type": "STRING", "enum": registry.names() },
                    "sentiment": {
                        "type": "STRING",
                        "enum": ["positive", "neutral", "negative"]
                    }
                }
            },
            "agency_alert": {
                "type": "OBJECT",
                "nullable": true,
                "properties": {
                    "send_sms": { "type": "BOOLEAN" },
                    "agency": { "type": "STRING" },
                    "ticket_id": { "type": "STRING" },
                    "summary": { "type": "STRING" },
                    "location": { "type": "STRING" }
                }
            }
        },
        "required": ["user_message", "internal_actions"]
    })
}

/// Build the fixed system instruction: persona, task, and the agency list.
pub fn system_instruction(registry: &AgencyRegistry) -> String {
    let agencies = serde_json::to_string(registry.names()).unwrap_or_default();
    format!(
        "You are Kwara PulseAI, the official AI assistant for the Kwara State Government.\n\
         Your goal is to help citizens report issues (water, roads, security, trash) via WhatsApp.\n\n\
         1. Parse the citizen's message.\n\
         2. Route new reports to the correct agency from this list: {agencies}.\n\
         3. Determine urgency (High/Medium/Low).\n\
         4. Provide a friendly, empathetic response in 'user_message'."
    )
}

// ── JSON extraction ─────────────────────────────────────────────────

/// Extract a JSON object from oracle output (handles markdown wrapping).
pub(crate) fn extract_json_object(text: &str) -> String {
    let trimmed = text.trim();

    // Already a JSON object
    if trimmed.starts_with('{') {
        return trimmed.to_string();
    }

    // Wrapped in a markdown code block
    if let Some(start) = trimmed.find("```json") {
        let after = &trimmed[start + 7..];
        if let Some(end) = after.find("```") {
            return after[..end].trim().to_string();
        }
    }

    if let Some(start) = trimmed.find("```") {
        let after = &trimmed[start + 3..];
        if let Some(end) = after.find("```") {
            let inner = after[..end].trim();
            if inner.starts_with('{') {
                return inner.to_string();
            }
        }
    }

    // Try to find object bounds
    if let (Some(start), Some(end)) = (trimmed.find('{'), trimmed.rfind('}'))
        && end > start
    {
        return trimmed[start..=end].to_string();
    }

    trimmed.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_full_candidate() {
        let raw = r#"{
            "user_message": "Thank you, we are on it.",
            "internal_actions": { "intent": "new_report", "create_ticket": true },
            "case_object": {
                "category": "water",
                "urgency": "High",
                "location": "Taiwo road",
                "summary": "Burst pipe flooding the road",
                "agency": "Kwara State Water Corporation",
                "sentiment": "negative"
            },
            "agency_alert": {
                "send_sms": true,
                "agency": "Kwara State Water Corporation",
                "summary": "Burst pipe flooding Taiwo road",
                "location": "Taiwo road"
            }
        }"#;
        let candidate = RawClassification::from_text(raw).unwrap();
        assert_eq!(candidate.user_message, "Thank you, we are on it.");
        assert_eq!(candidate.internal_actions.unwrap().intent, "new_report");
        assert_eq!(candidate.case_object.unwrap().urgency, "High");
        assert!(candidate.agency_alert.unwrap().send_sms);
    }

    #[test]
    fn parse_reply_only_candidate() {
        let raw = r#"{"user_message": "Your case is still open.", "internal_actions": {"intent": "status_check"}}"#;
        let candidate = RawClassification::from_text(raw).unwrap();
        assert!(candidate.case_object.is_none());
        assert!(candidate.agency_alert.is_none());
        assert_eq!(candidate.internal_actions.unwrap().create_ticket, None);
    }

    #[test]
    fn parse_candidate_wrapped_in_markdown() {
        let raw = "Here you go:\n```json\n{\"user_message\": \"ok\", \"internal_actions\": {\"intent\": \"spam\"}}\n```";
        let candidate = RawClassification::from_text(raw).unwrap();
        assert_eq!(candidate.user_message, "ok");
    }

    #[test]
    fn parse_candidate_with_surrounding_text() {
        let raw = "Classification: {\"user_message\": \"noted\", \"internal_actions\": {\"intent\": \"spam\"}} done.";
        let candidate = RawClassification::from_text(raw).unwrap();
        assert_eq!(candidate.user_message, "noted");
    }

    #[test]
    fn parse_garbage_is_malformed() {
        let result = RawClassification::from_text("I could not classify this message.");
        assert!(matches!(result, Err(OracleError::MalformedResponse(_))));
    }

    #[test]
    fn schema_requires_message_and_actions() {
        let registry = AgencyRegistry::new();
        let schema = response_schema(&registry);
        assert_eq!(schema["required"], serde_json::json!(["user_message", "internal_actions"]));
        assert_eq!(
            schema["properties"]["internal_actions"]["required"],
            serde_json::json!(["intent"])
        );
    }

    #[test]
    fn schema_embeds_registry_agencies() {
        let registry = AgencyRegistry::new();
        let schema = response_schema(&registry);
        let agencies = schema["properties"]["case_object"]["properties"]["agency"]["enum"]
            .as_array()
            .unwrap();
        assert_eq!(agencies.len(), registry.names().len());
        assert!(agencies.contains(&serde_json::json!("Kwara State Fire Service")));
    }

    #[test]
    fn system_instruction_lists_agencies() {
        let registry = AgencyRegistry::new();
        let instruction = system_instruction(&registry);
        assert!(instruction.contains("Kwara PulseAI"));
        assert!(instruction.contains("Kwara State Water Corporation"));
        assert!(instruction.contains("High/Medium/Low"));
    }

    #[test]
    fn extract_json_direct_object() {
        let input = r#"{"user_message": "hi"}"#;
        assert_eq!(extract_json_object(input), input);
    }

    #[test]
    fn extract_json_from_markdown_block() {
        let input = "```json\n{\"user_message\": \"hi\"}\n```";
        let result = extract_json_object(input);
        assert!(result.starts_with('{'));
        assert!(result.contains("user_message"));
    }
}
