use chrono::{DateTime, Utc};
use tokio::sync::mpsc;
use tracing::error;

use super::AuditEvent;

/// An audit event stamped with the moment it was emitted.
///
/// The timestamp is taken at the emitting call site, not when the writer
/// drains the channel, so audit ordering reflects operation order.
#[derive(Debug, Clone)]
pub struct AuditEventEnvelope {
    pub timestamp: DateTime<Utc>,
    pub event: AuditEvent,
}

/// Cloneable sender side of the audit pipeline.
///
/// Every holder feeds the same channel; the writer task on the other end
/// persists the events. Dropping all handles closes the channel and lets
/// the writer drain and exit.
#[derive(Clone)]
pub struct AuditHandle {
    tx: mpsc::Sender<AuditEventEnvelope>,
}

impl AuditHandle {
    pub fn new(tx: mpsc::Sender<AuditEventEnvelope>) -> Self {
        Self { tx }
    }

    /// Queue an audit event for the writer.
    ///
    /// Audit delivery never fails the operation that produced the event:
    /// a full or closed channel is logged and the event is lost.
    pub async fn emit(&self, event: AuditEvent) {
        let envelope = AuditEventEnvelope {
            timestamp: Utc::now(),
            event,
        };
        if let Err(e) = self.tx.send(envelope).await {
            error!("audit event dropped: {}", e);
        }
    }
}
