//! Twilio gateway — WhatsApp replies to citizens, SMS alerts to agencies.
//!
//! One REST call shape serves both obligations: `POST /Messages.json`
//! with basic auth and a form body. Failures map to [`DispatchError`] and
//! are absorbed by the dispatcher, never retried here.

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};

use crate::config::AppConfig;
use crate::dispatch::{AgencyNotifier, ReplySender};
use crate::error::DispatchError;
use crate::pipeline::types::AgencyAlert;

const TWILIO_API_BASE: &str = "https://api.twilio.com/2010-04-01/Accounts";

/// Twilio messaging client.
pub struct TwilioGateway {
    client: reqwest::Client,
    account_sid: String,
    auth_token: SecretString,
    /// WhatsApp sender identity, e.g. "whatsapp:+14155238886".
    whatsapp_from: String,
    /// Plain SMS sender identity (the WhatsApp number without its prefix).
    sms_from: String,
    /// Duty number receiving agency alert SMS.
    agency_alert_number: String,
}

impl TwilioGateway {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            account_sid: config.twilio_account_sid.clone(),
            auth_token: config.twilio_auth_token.clone(),
            whatsapp_from: config.whatsapp_from.clone(),
            sms_from: strip_whatsapp_prefix(&config.whatsapp_from),
            agency_alert_number: config.agency_alert_number.clone(),
        }
    }

    fn messages_url(&self) -> String {
        format!("{TWILIO_API_BASE}/{}/Messages.json", self.account_sid)
    }

    async fn send_message(&self, from: &str, to: &str, body: &str) -> Result<(), DispatchError> {
        let params = [("From", from), ("To", to), ("Body", body)];

        let resp = self
            .client
            .post(self.messages_url())
            .basic_auth(&self.account_sid, Some(self.auth_token.expose_secret()))
            .form(&params)
            .send()
            .await
            .map_err(|e| DispatchError::ReplyFailed {
                to: to.to_string(),
                reason: e.to_string(),
            })?;

        let status = resp.status();
        if !status.is_success() {
            let err_body = resp.text().await.unwrap_or_default();
            return Err(DispatchError::ReplyFailed {
                to: to.to_string(),
                reason: format!("Twilio returned {status}: {err_body}"),
            });
        }

        Ok(())
    }
}

#[async_trait]
impl ReplySender for TwilioGateway {
    async fn send_reply(&self, to: &str, body: &str) -> Result<(), DispatchError> {
        self.send_message(&self.whatsapp_from, to, body).await
    }
}

#[async_trait]
impl AgencyNotifier for TwilioGateway {
    async fn notify(&self, alert: &AgencyAlert) -> Result<(), DispatchError> {
        let body = format_alert_body(alert);
        self.send_message(&self.sms_from, &self.agency_alert_number, &body)
            .await
            .map_err(|e| DispatchError::NotifyFailed {
                agency: alert.agency.to_string(),
                reason: e.to_string(),
            })
    }
}

/// Compose the SMS body carrying the routed alert.
fn format_alert_body(alert: &AgencyAlert) -> String {
    let ticket = alert
        .ticket_id
        .as_ref()
        .map(|t| t.0.as_str())
        .unwrap_or("unassigned");
    format!(
        "[PulseAI] {} | Ticket {} | {} | Location: {}",
        alert.agency, ticket, alert.summary, alert.location
    )
}

fn strip_whatsapp_prefix(from: &str) -> String {
    from.strip_prefix("whatsapp:").unwrap_or(from).to_string()
}
