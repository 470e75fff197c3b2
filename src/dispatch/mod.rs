//! Dispatch boundary — reply, ticket, and agency-alert collaborators.
//!
//! The traits here are the pipeline's only view of the outside world.
//! The [`Dispatcher`] enforces the ordering contract: the citizen's reply
//! is sent first and unconditionally; ticket creation follows; the agency
//! alert goes out only after the ticket store has confirmed and handed
//! back an id. A failure in any one obligation never blocks the others.

pub mod memory;
pub mod twilio;

pub use memory::InMemoryTicketStore;
pub use twilio::TwilioGateway;

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{error, info, warn};

use crate::error::DispatchError;
use crate::pipeline::types::{AgencyAlert, CaseObject, TicketId, TriageResult};
use crate::pipeline::TriagePipeline;

/// Sends the acknowledgement reply back to the citizen.
#[async_trait]
pub trait ReplySender: Send + Sync {
    async fn send_reply(&self, to: &str, body: &str) -> Result<(), DispatchError>;
}

/// Opens trackable cases. Mints the ticket id — the pipeline never does.
#[async_trait]
pub trait TicketStore: Send + Sync {
    async fn create_ticket(&self, case: &CaseObject) -> Result<TicketId, DispatchError>;
}

/// Delivers alerts to the responsible agency.
#[async_trait]
pub trait AgencyNotifier: Send + Sync {
    async fn notify(&self, alert: &AgencyAlert) -> Result<(), DispatchError>;
}

/// Orchestrates one inbound message end to end: triage, then the three
/// dispatch obligations in their causal order.
pub struct Dispatcher {
    pipeline: TriagePipeline,
    replies: Arc<dyn ReplySender>,
    tickets: Arc<dyn TicketStore>,
    notifier: Arc<dyn AgencyNotifier>,
}

impl Dispatcher {
    pub fn new(
        pipeline: TriagePipeline,
        replies: Arc<dyn ReplySender>,
        tickets: Arc<dyn TicketStore>,
        notifier: Arc<dyn AgencyNotifier>,
    ) -> Self {
        Self {
            pipeline,
            replies,
            tickets,
            notifier,
        }
    }

    /// Handle one inbound chat message.
    ///
    /// Never fails from the transport's point of view: dispatch errors are
    /// logged and absorbed. Returns the triage result for observability.
    pub async fn handle_inbound(&self, sender: &str, text: &str) -> TriageResult {
        info!(sender = %sender, chars = text.len(), "Inbound message");

        let result = self.pipeline.triage(text).await;

        // Reply delivery is the highest-priority obligation: attempted
        // first, regardless of what the ticket/alert steps will do.
        if let Err(e) = self.replies.send_reply(sender, &result.user_message).await {
            error!(sender = %sender, error = %e, "Reply send failed");
        }

        let ticket_id = match (&result.case_object, result.create_ticket) {
            (Some(case), true) => match self.tickets.create_ticket(case).await {
                Ok(id) => {
                    info!(ticket = %id, agency = %case.agency, "Ticket created");
                    Some(id)
                }
                Err(e) => {
                    error!(error = %e, "Ticket creation failed");
                    None
                }
            },
            _ => None,
        };

        if let Some(alert) = &result.agency_alert {
            match &ticket_id {
                Some(id) => {
                    let alert = AgencyAlert {
                        ticket_id: Some(id.clone()),
                        ..alert.clone()
                    };
                    match self.notifier.notify(&alert).await {
                        Ok(()) => info!(agency = %alert.agency, ticket = %id, "Agency alerted"),
                        Err(e) => error!(agency = %alert.agency, error = %e, "Agency alert failed"),
                    }
                }
                // A ticketless alert would reference a case that does not
                // exist, so it is dropped here.
                None => warn!(agency = %alert.agency, "Suppressing alert: no ticket was created"),
            }
        }

        result
    }
}
