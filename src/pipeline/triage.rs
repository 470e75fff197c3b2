//! The triage pipeline — validation, routing, and obligation derivation.
//!
//! **Core invariant: the citizen always gets exactly one reply**, even when
//! classification fails. The oracle's output is a candidate, never a
//! decision: every enum value, every agency name, and the ticket/alert
//! booleans are re-validated here before anything is dispatched.
//!
//! Flow per message (stateless across messages):
//! 1. Guard rules (fast, no oracle) → may short-circuit
//! 2. Oracle call → raw candidate, or fallback on any failure
//! 3. Validation + derivation → `TriageResult`

use std::sync::Arc;

use tracing::{debug, warn};

use crate::oracle::{Oracle, RawAgencyAlert, RawCaseObject, RawClassification};
use crate::pipeline::rules::GuardRules;
use crate::pipeline::types::{
    AgencyAlert, CaseObject, IntentKind, SentimentLabel, TriageResult, UrgencyLevel,
};
use crate::registry::AgencyRegistry;

/// Fixed apology sent whenever classification cannot be trusted.
pub const FALLBACK_REPLY: &str =
    "I'm having a little trouble connecting to the server right now. Please try again in a moment.";

/// The decision core: validates oracle candidates and derives the
/// reply/ticket/alert obligations.
pub struct TriagePipeline {
    oracle: Arc<dyn Oracle>,
    registry: Arc<AgencyRegistry>,
    rules: GuardRules,
}

impl TriagePipeline {
    pub fn new(oracle: Arc<dyn Oracle>, registry: Arc<AgencyRegistry>) -> Self {
        Self {
            oracle,
            registry,
            rules: GuardRules::new(),
        }
    }

    /// Triage one inbound report.
    ///
    /// Infallible by design: oracle failure, malformed candidates, and
    /// schema violations all collapse into the fixed fallback result. No
    /// retries — a failed classification is answered immediately.
    pub async fn triage(&self, raw_text: &str) -> TriageResult {
        if let Some(reply) = self.rules.short_circuit(raw_text) {
            return TriageResult::fallback(reply);
        }

        let prepared = self.rules.prepare(raw_text);
        let candidate = match self.oracle.classify(&prepared).await {
            Ok(candidate) => candidate,
            Err(e) => {
                warn!(error = %e, "Oracle call failed, using fallback reply");
                return TriageResult::fallback(FALLBACK_REPLY);
            }
        };

        let result = self.derive(candidate);
        debug!(
            intent = result.label(),
            create_ticket = result.create_ticket,
            alert = result.agency_alert.is_some(),
            "Triage decision"
        );
        result
    }

    /// Promote a raw candidate to a validated `TriageResult`.
    ///
    /// Violations are handled at two levels:
    /// - top-level contract breaks (empty `user_message`, missing or
    ///   unknown `intent`) discard the whole candidate → fallback;
    /// - breaks inside `case_object`/`agency_alert` suppress only that
    ///   sub-object, keeping the valid reply text.
    fn derive(&self, candidate: RawClassification) -> TriageResult {
        let user_message = candidate.user_message.trim().to_string();
        if user_message.is_empty() {
            warn!("Candidate missing user_message, using fallback reply");
            return TriageResult::fallback(FALLBACK_REPLY);
        }

        let Some(actions) = candidate.internal_actions else {
            warn!("Candidate missing internal_actions, using fallback reply");
            return TriageResult::fallback(FALLBACK_REPLY);
        };

        let Some(intent) = IntentKind::parse(&actions.intent) else {
            warn!(intent = %actions.intent, "Unknown intent, using fallback reply");
            return TriageResult::fallback(FALLBACK_REPLY);
        };

        // Only a new report may open a case or alert an agency, no matter
        // what else the oracle supplied.
        if intent != IntentKind::NewReport {
            return TriageResult::reply_only(user_message, intent);
        }

        let case_object = candidate.case_object.and_then(|raw| self.validate_case(raw));

        // Ticket eligibility: a valid case is mandatory; the oracle's
        // boolean can only lower the decision, never raise it.
        let create_ticket = case_object.is_some() && actions.create_ticket != Some(false);
        if actions.create_ticket == Some(true) && case_object.is_none() {
            warn!("Oracle requested a ticket without a valid case object, overriding to false");
        }

        let agency_alert = if create_ticket {
            candidate
                .agency_alert
                .and_then(|raw| self.validate_alert(raw, case_object.as_ref()))
        } else {
            // An alert referencing a nonexistent ticket is invalid.
            None
        };

        TriageResult {
            user_message,
            intent: Some(intent),
            create_ticket,
            case_object,
            agency_alert,
        }
    }

    /// Validate the oracle's proposed case object.
    ///
    /// All six fields are required; `agency` must resolve against the
    /// registry and `urgency`/`sentiment` must be members of their closed
    /// sets. Any violation drops the case in its entirety.
    fn validate_case(&self, raw: RawCaseObject) -> Option<CaseObject> {
        let Some(agency) = self.registry.resolve(&raw.agency) else {
            warn!(agency = %raw.agency, "Case agency not in registry, suppressing case");
            return None;
        };

        let Some(urgency) = UrgencyLevel::parse(&raw.urgency) else {
            warn!(urgency = %raw.urgency, "Invalid urgency, suppressing case");
            return None;
        };

        let Some(sentiment) = SentimentLabel::parse(&raw.sentiment) else {
            warn!(sentiment = %raw.sentiment, "Invalid sentiment, suppressing case");
            return None;
        };

        let category = raw.category.trim();
        let location = raw.location.trim();
        let summary = raw.summary.trim();
        if category.is_empty() || location.is_empty() || summary.is_empty() {
            warn!("Case object has empty required fields, suppressing case");
            return None;
        }

        Some(CaseObject {
            category: category.to_string(),
            urgency,
            location: location.to_string(),
            summary: summary.to_string(),
            agency,
            sentiment,
        })
    }

    /// Validate the oracle's proposed agency alert against the case.
    ///
    /// The case object's agency is the canonical routing target. An alert
    /// naming a different agency — registered or not — is a routing
    /// inconsistency and is suppressed rather than re-routed; an alert is
    /// never sent to an unvalidated destination.
    fn validate_alert(&self, raw: RawAgencyAlert, case: Option<&CaseObject>) -> Option<AgencyAlert> {
        let case = case?;
        if !raw.send_sms {
            return None;
        }

        let agency = match raw.agency.as_deref() {
            None => case.agency,
            Some(name) => match self.registry.resolve(name) {
                Some(id) if id == case.agency => id,
                Some(id) => {
                    warn!(
                        alert_agency = %id,
                        case_agency = %case.agency,
                        "Alert agency disagrees with case agency, suppressing alert"
                    );
                    return None;
                }
                None => {
                    warn!(agency = %name, "Alert agency not in registry, suppressing alert");
                    return None;
                }
            },
        };

        let summary = raw
            .summary
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| case.summary.clone());
        let location = raw
            .location
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| case.location.clone());

        Some(AgencyAlert {
            agency,
            summary,
            location,
            // Filled by the dispatcher once the ticket store confirms.
            ticket_id: None,
        })
    }
}
