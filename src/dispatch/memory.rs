//! In-memory ticket store.
//!
//! Persistence schema design is out of scope for the core; this store
//! backs the [`TicketStore`] seam with a process-local list so the full
//! pipeline runs without external infrastructure. A database-backed
//! implementation slots in behind the same trait.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::dispatch::TicketStore;
use crate::error::DispatchError;
use crate::pipeline::types::{CaseObject, TicketId};

/// An open case held in memory.
#[derive(Debug, Clone)]
pub struct OpenTicket {
    pub id: TicketId,
    pub case: CaseObject,
    pub opened_at: DateTime<Utc>,
}

/// Process-local ticket store that mints `KW-` ids.
#[derive(Default)]
pub struct InMemoryTicketStore {
    tickets: RwLock<Vec<OpenTicket>>,
}

impl InMemoryTicketStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all open tickets, oldest first.
    pub async fn open_tickets(&self) -> Vec<OpenTicket> {
        self.tickets.read().await.clone()
    }

    fn mint_id() -> TicketId {
        // Short, citizen-quotable form of a v4 UUID.
        let raw = Uuid::new_v4().simple().to_string();
        TicketId(format!("KW-{}", raw[..8].to_uppercase()))
    }
}

#[async_trait]
impl TicketStore for InMemoryTicketStore {
    async fn create_ticket(&self, case: &CaseObject) -> Result<TicketId, DispatchError> {
        let id = Self::mint_id();
        let ticket = OpenTicket {
            id: id.clone(),
            case: case.clone(),
            opened_at: Utc::now(),
        };
        self.tickets.write().await.push(ticket);
        Ok(id)
    }
}
