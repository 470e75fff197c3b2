use std::sync::Arc;

use pulseai::channels::webhook_routes;
use pulseai::config::AppConfig;
use pulseai::dispatch::{Dispatcher, InMemoryTicketStore, TwilioGateway};
use pulseai::oracle::GeminiOracle;
use pulseai::pipeline::TriagePipeline;
use pulseai::registry::AgencyRegistry;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let config = AppConfig::from_env().unwrap_or_else(|e| {
        eprintln!("Error: {e}");
        eprintln!("  Required: GEMINI_API_KEY, TWILIO_ACCOUNT_SID, TWILIO_AUTH_TOKEN,");
        eprintln!("            TWILIO_WHATSAPP_FROM, AGENCY_ALERT_NUMBER");
        std::process::exit(1);
    });

    eprintln!("📟 PulseAI v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   Model: {}", config.gemini_model);
    eprintln!("   Oracle timeout: {:?}", config.oracle_timeout);
    eprintln!("   Webhook: http://0.0.0.0:{}/webhook", config.port);
    eprintln!("   WhatsApp from: {}\n", config.whatsapp_from);

    // Process-wide read-only collaborators, built once.
    let registry = Arc::new(AgencyRegistry::new());
    let oracle = Arc::new(GeminiOracle::new(&config, &registry));
    let gateway = Arc::new(TwilioGateway::new(&config));
    let tickets = Arc::new(InMemoryTicketStore::new());

    let replies: Arc<dyn pulseai::dispatch::ReplySender> = gateway.clone();
    let notifier: Arc<dyn pulseai::dispatch::AgencyNotifier> = gateway;

    let pipeline = TriagePipeline::new(oracle, Arc::clone(&registry));
    let dispatcher = Arc::new(Dispatcher::new(pipeline, replies, tickets, notifier));

    let app = webhook_routes(dispatcher);
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", config.port)).await?;
    tracing::info!(port = config.port, "Webhook server started");
    axum::serve(listener, app).await?;

    Ok(())
}
