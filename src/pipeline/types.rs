//! Shared types for the triage pipeline.
//!
//! These are the *validated* domain types. The loosely-typed candidate the
//! oracle actually returns lives in `crate::oracle`; nothing raw crosses
//! the pipeline boundary.

use serde::{Deserialize, Serialize};

use crate::registry::AgencyId;

// ── Closed enumerations ─────────────────────────────────────────────

/// What the citizen is trying to do. Determines which downstream
/// obligations are legal: only `NewReport` may produce a case or an alert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntentKind {
    NewReport,
    StatusCheck,
    UpdateReport,
    Spam,
}

impl IntentKind {
    /// Parse the oracle's raw intent string. Unknown values are a schema
    /// violation, not a default.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "new_report" => Some(Self::NewReport),
            "status_check" => Some(Self::StatusCheck),
            "update_report" => Some(Self::UpdateReport),
            "spam" => Some(Self::Spam),
            _ => None,
        }
    }

    /// Short label for logging.
    pub fn label(&self) -> &'static str {
        match self {
            Self::NewReport => "new_report",
            Self::StatusCheck => "status_check",
            Self::UpdateReport => "update_report",
            Self::Spam => "spam",
        }
    }
}

/// Report urgency, present only on a case object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UrgencyLevel {
    High,
    Medium,
    Low,
}

impl UrgencyLevel {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "High" => Some(Self::High),
            "Medium" => Some(Self::Medium),
            "Low" => Some(Self::Low),
            _ => None,
        }
    }
}

/// Citizen sentiment. Informational only — never affects routing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SentimentLabel {
    Positive,
    Neutral,
    Negative,
}

impl SentimentLabel {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "positive" => Some(Self::Positive),
            "neutral" => Some(Self::Neutral),
            "negative" => Some(Self::Negative),
            _ => None,
        }
    }
}

// ── Case & alert ────────────────────────────────────────────────────

/// Identifier of an opened case, minted by the ticket store.
///
/// The pipeline never invents these; it threads through whatever the
/// datastore returned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TicketId(pub String);

impl std::fmt::Display for TicketId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A fully validated civic-issue record, ready for the ticket store.
///
/// Exists only when `intent == new_report` and every field passed
/// validation, including the registry check on `agency`.
#[derive(Debug, Clone, Serialize)]
pub struct CaseObject {
    pub category: String,
    pub urgency: UrgencyLevel,
    pub location: String,
    pub summary: String,
    pub agency: AgencyId,
    pub sentiment: SentimentLabel,
}

/// A validated agency alert obligation.
///
/// `ticket_id` starts out empty and is filled by the dispatcher once the
/// ticket store has confirmed creation. An alert is never sent without it.
#[derive(Debug, Clone, Serialize)]
pub struct AgencyAlert {
    pub agency: AgencyId,
    pub summary: String,
    pub location: String,
    pub ticket_id: Option<TicketId>,
}

// ── Triage result ───────────────────────────────────────────────────

/// The pipeline's output: one per inbound message, immutable once built.
///
/// Invariants (enforced by the pipeline, relied on by dispatch):
/// - `case_object`/`agency_alert` are present only for `NewReport` intent;
/// - `create_ticket` implies `case_object` is present;
/// - `agency_alert` present implies `create_ticket`.
#[derive(Debug, Clone, Serialize)]
pub struct TriageResult {
    /// Reply body for the citizen. Always present — worst case the fixed
    /// apology text.
    pub user_message: String,
    /// Classified intent; `None` when classification fell back.
    pub intent: Option<IntentKind>,
    /// Whether a ticket should be opened. Final authority is the
    /// pipeline, not the oracle.
    pub create_ticket: bool,
    pub case_object: Option<CaseObject>,
    pub agency_alert: Option<AgencyAlert>,
}

impl TriageResult {
    /// A reply-only result carrying a known intent.
    pub fn reply_only(user_message: String, intent: IntentKind) -> Self {
        Self {
            user_message,
            intent: Some(intent),
            create_ticket: false,
            case_object: None,
            agency_alert: None,
        }
    }

    /// The fixed fallback used whenever classification cannot be trusted.
    pub fn fallback(user_message: &str) -> Self {
        Self {
            user_message: user_message.to_string(),
            intent: None,
            create_ticket: false,
            case_object: None,
            agency_alert: None,
        }
    }

    /// Short label for logging.
    pub fn label(&self) -> &'static str {
        match self.intent {
            None => "fallback",
            Some(intent) => intent.label(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::AgencyRegistry;

    #[test]
    fn intent_parse_accepts_known_values() {
        assert_eq!(IntentKind::parse("new_report"), Some(IntentKind::NewReport));
        assert_eq!(
            IntentKind::parse("status_check"),
            Some(IntentKind::StatusCheck)
        );
        assert_eq!(
            IntentKind::parse("update_report"),
            Some(IntentKind::UpdateReport)
        );
        assert_eq!(IntentKind::parse("spam"), Some(IntentKind::Spam));
    }

    #[test]
    fn intent_parse_rejects_unknown_values() {
        assert_eq!(IntentKind::parse("escalate"), None);
        assert_eq!(IntentKind::parse(""), None);
        assert_eq!(IntentKind::parse("NEW_REPORT"), None);
    }

    #[test]
    fn urgency_parse_is_case_sensitive() {
        assert_eq!(UrgencyLevel::parse("High"), Some(UrgencyLevel::High));
        assert_eq!(UrgencyLevel::parse("high"), None);
    }

    #[test]
    fn sentiment_parse_matches_schema_casing() {
        assert_eq!(
            SentimentLabel::parse("negative"),
            Some(SentimentLabel::Negative)
        );
        assert_eq!(SentimentLabel::parse("Negative"), None);
    }

    #[test]
    fn fallback_result_has_no_obligations() {
        let result = TriageResult::fallback("sorry");
        assert_eq!(result.user_message, "sorry");
        assert!(result.intent.is_none());
        assert!(!result.create_ticket);
        assert!(result.case_object.is_none());
        assert!(result.agency_alert.is_none());
        assert_eq!(result.label(), "fallback");
    }

    #[test]
    fn case_object_serializes_agency_as_string() {
        let registry = AgencyRegistry::new();
        let case = CaseObject {
            category: "water".into(),
            urgency: UrgencyLevel::High,
            location: "Taiwo road".into(),
            summary: "Burst pipe".into(),
            agency: registry.resolve("Kwara State Water Corporation").unwrap(),
            sentiment: SentimentLabel::Negative,
        };
        let json = serde_json::to_value(&case).unwrap();
        assert_eq!(json["agency"], "Kwara State Water Corporation");
        assert_eq!(json["urgency"], "High");
        assert_eq!(json["sentiment"], "negative");
    }
}
