//! Integration tests for the WhatsApp webhook surface.
//!
//! Each test spins up an Axum server on a random port and drives the real
//! HTTP contract with a reqwest client, with the oracle and Twilio
//! collaborators stubbed out.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::net::TcpListener;
use tokio::sync::Mutex;

use pulseai::channels::webhook_routes;
use pulseai::dispatch::{
    AgencyNotifier, Dispatcher, InMemoryTicketStore, ReplySender,
};
use pulseai::error::{DispatchError, OracleError};
use pulseai::oracle::{Oracle, RawClassification};
use pulseai::pipeline::{FALLBACK_REPLY, TriagePipeline};
use pulseai::pipeline::types::AgencyAlert;
use pulseai::registry::AgencyRegistry;

/// Stub oracle returning a fixed candidate (no real API calls).
struct StubOracle {
    json: Option<&'static str>,
}

#[async_trait]
impl Oracle for StubOracle {
    async fn classify(&self, _text: &str) -> Result<RawClassification, OracleError> {
        match self.json {
            Some(json) => RawClassification::from_text(json),
            None => Err(OracleError::Timeout(Duration::from_secs(20))),
        }
    }
}

#[derive(Default)]
struct RecordingReplies {
    sent: Mutex<Vec<(String, String)>>,
}

#[async_trait]
impl ReplySender for RecordingReplies {
    async fn send_reply(&self, to: &str, body: &str) -> Result<(), DispatchError> {
        self.sent.lock().await.push((to.into(), body.into()));
        Ok(())
    }
}

#[derive(Default)]
struct RecordingNotifier {
    alerts: Mutex<Vec<AgencyAlert>>,
}

#[async_trait]
impl AgencyNotifier for RecordingNotifier {
    async fn notify(&self, alert: &AgencyAlert) -> Result<(), DispatchError> {
        self.alerts.lock().await.push(alert.clone());
        Ok(())
    }
}

const NEW_REPORT_JSON: &str = r#"{
    "user_message": "Thank you for reporting the burst pipe. Help is on the way.",
    "internal_actions": { "intent": "new_report", "create_ticket": true },
    "case_object": {
        "category": "water",
        "urgency": "High",
        "location": "Taiwo road",
        "summary": "Burst pipe flooding the road",
        "agency": "Kwara State Water Corporation",
        "sentiment": "negative"
    },
    "agency_alert": { "send_sms": true, "agency": "Kwara State Water Corporation" }
}"#;

struct TestHarness {
    base_url: String,
    replies: Arc<RecordingReplies>,
    tickets: Arc<InMemoryTicketStore>,
    notifier: Arc<RecordingNotifier>,
}

/// Start a server on a random port with the given stub oracle response.
async fn start_server(oracle_json: Option<&'static str>) -> TestHarness {
    let replies = Arc::new(RecordingReplies::default());
    let tickets = Arc::new(InMemoryTicketStore::new());
    let notifier = Arc::new(RecordingNotifier::default());

    let pipeline = TriagePipeline::new(
        Arc::new(StubOracle { json: oracle_json }),
        Arc::new(AgencyRegistry::new()),
    );
    let dispatcher = Arc::new(Dispatcher::new(
        pipeline,
        Arc::clone(&replies) as Arc<dyn ReplySender>,
        Arc::clone(&tickets) as Arc<dyn pulseai::dispatch::TicketStore>,
        Arc::clone(&notifier) as Arc<dyn AgencyNotifier>,
    ));
    let app = webhook_routes(dispatcher);

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    // Give the server a moment to start accepting connections.
    tokio::time::sleep(Duration::from_millis(50)).await;

    TestHarness {
        base_url: format!("http://127.0.0.1:{port}"),
        replies,
        tickets,
        notifier,
    }
}

async fn post_message(harness: &TestHarness, from: &str, body: &str) -> reqwest::Response {
    reqwest::Client::new()
        .post(format!("{}/webhook", harness.base_url))
        .form(&[("From", from), ("Body", body)])
        .send()
        .await
        .unwrap()
}

#[tokio::test]
async fn new_report_flows_end_to_end() {
    let harness = start_server(Some(NEW_REPORT_JSON)).await;

    let resp = post_message(
        &harness,
        "whatsapp:+2348000000001",
        "There's a burst pipe flooding Taiwo road",
    )
    .await;
    assert_eq!(resp.status(), 200);

    // Exactly one reply, to the sender, with the oracle's message.
    let sent = harness.replies.sent.lock().await;
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].0, "whatsapp:+2348000000001");
    assert!(sent[0].1.contains("burst pipe"));

    // Ticket opened, and the alert carries the minted id.
    let open = harness.tickets.open_tickets().await;
    assert_eq!(open.len(), 1);
    assert_eq!(open[0].case.agency.as_str(), "Kwara State Water Corporation");

    let alerts = harness.notifier.alerts.lock().await;
    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts[0].ticket_id.as_ref().unwrap(), &open[0].id);
}

#[tokio::test]
async fn oracle_outage_still_acks_and_apologizes() {
    let harness = start_server(None).await;

    let resp = post_message(&harness, "whatsapp:+2348000000002", "pothole on Offa road").await;
    assert_eq!(resp.status(), 200);

    let sent = harness.replies.sent.lock().await;
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].1, FALLBACK_REPLY);

    assert!(harness.tickets.open_tickets().await.is_empty());
    assert!(harness.notifier.alerts.lock().await.is_empty());
}

#[tokio::test]
async fn unregistered_agency_keeps_reply_suppresses_ticket_and_alert() {
    let harness = start_server(Some(
        r#"{
            "user_message": "We have logged your report.",
            "internal_actions": { "intent": "new_report", "create_ticket": true },
            "case_object": {
                "category": "other",
                "urgency": "Low",
                "location": "Ilorin",
                "summary": "Something odd",
                "agency": "Ministry of Fun",
                "sentiment": "neutral"
            },
            "agency_alert": { "send_sms": true, "agency": "Ministry of Fun" }
        }"#,
    ))
    .await;

    let resp = post_message(&harness, "whatsapp:+2348000000004", "strange report").await;
    assert_eq!(resp.status(), 200);

    // The valid user_message still goes out, exactly once.
    let sent = harness.replies.sent.lock().await;
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].1, "We have logged your report.");

    // The unroutable case never becomes a ticket or an alert.
    assert!(harness.tickets.open_tickets().await.is_empty());
    assert!(harness.notifier.alerts.lock().await.is_empty());
}

#[tokio::test]
async fn status_check_produces_reply_only() {
    let harness = start_server(Some(
        r#"{"user_message": "Your case is in progress.", "internal_actions": {"intent": "status_check"}}"#,
    ))
    .await;

    let resp = post_message(&harness, "whatsapp:+2348000000003", "any update?").await;
    assert_eq!(resp.status(), 200);

    assert_eq!(harness.replies.sent.lock().await.len(), 1);
    assert!(harness.tickets.open_tickets().await.is_empty());
    assert!(harness.notifier.alerts.lock().await.is_empty());
}

#[tokio::test]
async fn health_and_root_endpoints_respond() {
    let harness = start_server(Some(NEW_REPORT_JSON)).await;
    let client = reqwest::Client::new();

    let health = client
        .get(format!("{}/health", harness.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(health.status(), 200);
    let body: serde_json::Value = health.json().await.unwrap();
    assert_eq!(body["status"], "ok");

    let root = client
        .get(format!("{}/", harness.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(root.status(), 200);
    assert!(root.text().await.unwrap().contains("PulseAI"));
}
