//! Process configuration, read once from the environment at startup.

use std::time::Duration;

use secrecy::SecretString;

use crate::error::ConfigError;

/// Default Gemini model for classification.
const DEFAULT_MODEL: &str = "gemini-2.5-flash";

/// Default bound on the oracle call. Timeouts fall back to the apology
/// reply, so this caps how long a citizen waits for an acknowledgement.
const DEFAULT_ORACLE_TIMEOUT_SECS: u64 = 20;

/// Service configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Gemini API key.
    pub gemini_api_key: SecretString,
    /// Gemini model name.
    pub gemini_model: String,
    /// Upper bound on a single oracle call.
    pub oracle_timeout: Duration,
    /// Twilio account SID.
    pub twilio_account_sid: String,
    /// Twilio auth token.
    pub twilio_auth_token: SecretString,
    /// WhatsApp sender identity, e.g. "whatsapp:+14155238886".
    pub whatsapp_from: String,
    /// Duty number that receives agency alert SMS.
    pub agency_alert_number: String,
    /// HTTP listen port for the webhook server.
    pub port: u16,
}

impl AppConfig {
    /// Load configuration from environment variables.
    ///
    /// `GEMINI_API_KEY`, `TWILIO_ACCOUNT_SID`, `TWILIO_AUTH_TOKEN`,
    /// `TWILIO_WHATSAPP_FROM` and `AGENCY_ALERT_NUMBER` are required;
    /// everything else has a default.
    pub fn from_env() -> Result<Self, ConfigError> {
        let gemini_api_key = require("GEMINI_API_KEY")?;
        let twilio_account_sid = require("TWILIO_ACCOUNT_SID")?;
        let twilio_auth_token = require("TWILIO_AUTH_TOKEN")?;
        let whatsapp_from = require("TWILIO_WHATSAPP_FROM")?;
        let agency_alert_number = require("AGENCY_ALERT_NUMBER")?;

        let gemini_model =
            std::env::var("GEMINI_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string());

        let timeout_secs: u64 = match std::env::var("ORACLE_TIMEOUT_SECS") {
            Ok(raw) => raw.parse().map_err(|_| ConfigError::InvalidValue {
                key: "ORACLE_TIMEOUT_SECS".into(),
                message: format!("not a number: {raw}"),
            })?,
            Err(_) => DEFAULT_ORACLE_TIMEOUT_SECS,
        };

        let port: u16 = match std::env::var("PORT") {
            Ok(raw) => raw.parse().map_err(|_| ConfigError::InvalidValue {
                key: "PORT".into(),
                message: format!("not a port number: {raw}"),
            })?,
            Err(_) => 3000,
        };

        Ok(Self {
            gemini_api_key: SecretString::from(gemini_api_key),
            gemini_model,
            oracle_timeout: Duration::from_secs(timeout_secs),
            twilio_account_sid,
            twilio_auth_token: SecretString::from(twilio_auth_token),
            whatsapp_from,
            agency_alert_number,
            port,
        })
    }
}

fn require(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}
