//! Turn service: the single entry point for every queue operation.
//!
//! Each operation persists its outcome first, then records an audit event and
//! publishes a notification. Audit and notification delivery are best-effort
//! side channels; their failures are logged and never surface to the caller.

use std::sync::Arc;

use chrono::{DateTime, FixedOffset, NaiveDate, Offset, Utc};
use thiserror::Error;

use crate::audit::{AuditEvent, AuditHandle};
use crate::codegen::{CodeGenError, CodeGenerator};
use crate::hub::{EventHub, QueueEvent};
use crate::lifecycle::{InvalidTransition, TurnAction};
use crate::queue::{ClaimError, QueueSelector, SectorLocks};
use crate::redirect::{RedirectError, Redirector};
use crate::sector::{Sector, SectorError, SectorStore};
use crate::turn::{Turn, TurnError, TurnKind, TurnState, TurnStore};

/// Error type for queue service operations.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    InvalidTransition(#[from] InvalidTransition),

    #[error("turn not found: {0}")]
    NotFound(String),

    #[error("sector not found: {0}")]
    SectorNotFound(String),

    #[error("sector is not accepting turns: {0}")]
    SectorInactive(String),

    #[error("turn {turn_id} is already in sector {sector_id}")]
    SameSector { turn_id: String, sector_id: String },

    #[error("turn {turn_id} is not assigned to operator {employee_id}")]
    Forbidden { turn_id: String, employee_id: String },

    #[error("sector {sector_id} has no appointment capacity left on {day}")]
    CapacityExceeded { sector_id: String, day: String },

    #[error("operation kept losing to competing writers: {0}")]
    Contended(String),

    #[error("storage error: {0}")]
    Store(String),
}

impl From<TurnError> for ServiceError {
    fn from(e: TurnError) -> Self {
        match e {
            TurnError::NotFound(id) => ServiceError::NotFound(id),
            TurnError::Database(msg) => ServiceError::Store(msg),
        }
    }
}

impl From<SectorError> for ServiceError {
    fn from(e: SectorError) -> Self {
        match e {
            SectorError::NotFound(id) => ServiceError::SectorNotFound(id),
            SectorError::Database(msg) => ServiceError::Store(msg),
        }
    }
}

impl From<CodeGenError> for ServiceError {
    fn from(e: CodeGenError) -> Self {
        match e {
            CodeGenError::Store(msg) => ServiceError::Store(msg),
        }
    }
}

impl From<ClaimError> for ServiceError {
    fn from(e: ClaimError) -> Self {
        match e {
            ClaimError::Contended { .. } => ServiceError::Contended(e.to_string()),
            ClaimError::Store(e) => e.into(),
        }
    }
}

impl From<RedirectError> for ServiceError {
    fn from(e: RedirectError) -> Self {
        match e {
            RedirectError::SameSector { turn_id, sector_id } => {
                ServiceError::SameSector { turn_id, sector_id }
            }
            RedirectError::NotFound(id) => ServiceError::NotFound(id),
            RedirectError::Transition(t) => ServiceError::InvalidTransition(t),
            RedirectError::Contended { .. } => ServiceError::Contended(e.to_string()),
            RedirectError::Store(e) => e.into(),
        }
    }
}

/// Request to issue a new turn.
#[derive(Debug, Clone, serde::Deserialize)]
pub struct CreateTurnRequest {
    pub sector_id: String,
    pub citizen_id: String,
    #[serde(default = "default_kind")]
    pub kind: TurnKind,
    #[serde(default)]
    pub priority: u16,
}

fn default_kind() -> TurnKind {
    TurnKind::Normal
}

/// Calendar day of an instant in the office's timezone. Ticket counters
/// reset at this local midnight, not at UTC midnight.
fn local_day(at: DateTime<Utc>, offset: FixedOffset) -> NaiveDate {
    at.with_timezone(&offset).date_naive()
}

/// The queue service.
pub struct TurnService {
    turns: Arc<dyn TurnStore>,
    sectors: Arc<dyn SectorStore>,
    codes: Arc<dyn CodeGenerator>,
    selector: QueueSelector,
    redirector: Redirector,
    hub: Arc<EventHub>,
    audit: Option<AuditHandle>,
    day_offset: FixedOffset,
    retries: u32,
}

impl TurnService {
    pub fn new(
        turns: Arc<dyn TurnStore>,
        sectors: Arc<dyn SectorStore>,
        codes: Arc<dyn CodeGenerator>,
        hub: Arc<EventHub>,
        claim_retries: u32,
    ) -> Self {
        let locks = Arc::new(SectorLocks::new());
        let retries = claim_retries.max(1);
        Self {
            selector: QueueSelector::new(turns.clone(), locks.clone(), retries),
            redirector: Redirector::new(turns.clone(), locks, retries),
            turns,
            sectors,
            codes,
            hub,
            audit: None,
            day_offset: Utc.fix(),
            retries,
        }
    }

    /// Attach an audit handle. Operations emit lifecycle events through it.
    pub fn with_audit(mut self, audit: AuditHandle) -> Self {
        self.audit = Some(audit);
        self
    }

    /// Set the office's UTC offset in minutes. Out-of-range offsets are
    /// rejected by config validation and ignored here.
    pub fn with_utc_offset(mut self, minutes: i32) -> Self {
        if let Some(offset) = minutes.checked_mul(60).and_then(FixedOffset::east_opt) {
            self.day_offset = offset;
        }
        self
    }

    pub fn hub(&self) -> &Arc<EventHub> {
        &self.hub
    }

    async fn emit_audit(&self, event: AuditEvent) {
        if let Some(audit) = &self.audit {
            audit.emit(event).await;
        }
    }

    fn active_sector(&self, sector_id: &str) -> Result<Sector, ServiceError> {
        let sector = self
            .sectors
            .get(sector_id)?
            .ok_or_else(|| ServiceError::SectorNotFound(sector_id.to_string()))?;
        if !sector.active {
            return Err(ServiceError::SectorInactive(sector_id.to_string()));
        }
        Ok(sector)
    }

    /// Issue a new turn into a sector's queue.
    pub async fn create_turn(&self, req: CreateTurnRequest) -> Result<Turn, ServiceError> {
        let sector = self.active_sector(&req.sector_id)?;

        if let TurnKind::Special { appointment_at } = &req.kind {
            if let Some(cap) = sector.max_capacity {
                let day = appointment_at.date_naive();
                let booked = self.turns.count_special_for_day(&sector.id, day)?;
                if booked >= cap as i64 {
                    return Err(ServiceError::CapacityExceeded {
                        sector_id: sector.id,
                        day: day.to_string(),
                    });
                }
            }
        }

        let day = local_day(Utc::now(), self.day_offset);
        let code = self.codes.next_code(&sector.code, day)?;
        let turn = Turn::new(code, &sector.id, &req.citizen_id, req.kind, req.priority);
        self.turns.insert(&turn)?;

        self.emit_audit(AuditEvent::TurnCreated {
            turn_id: turn.id.clone(),
            code: turn.code.clone(),
            sector_id: turn.sector_id.clone(),
            citizen_id: turn.citizen_id.clone(),
            kind: turn.kind.as_str().to_string(),
            priority: turn.priority,
        })
        .await;
        self.hub
            .publish(&turn.sector_id, QueueEvent::TurnCreated { turn: turn.clone() });

        Ok(turn)
    }

    /// Claim the next pending turn of a sector for an operator.
    ///
    /// Returns `Ok(None)` when the sector's queue is empty.
    pub async fn claim_next(
        &self,
        sector_id: &str,
        employee_id: &str,
    ) -> Result<Option<Turn>, ServiceError> {
        self.active_sector(sector_id)?;

        let Some((turn, from_state)) = self.selector.claim_next(sector_id, employee_id).await?
        else {
            return Ok(None);
        };

        self.emit_audit(AuditEvent::TurnStateChanged {
            turn_id: turn.id.clone(),
            from_state: from_state.as_str().to_string(),
            to_state: turn.state.as_str().to_string(),
            employee_id: Some(employee_id.to_string()),
            note: None,
        })
        .await;
        self.hub
            .publish(sector_id, QueueEvent::TurnCalled { turn: turn.clone() });

        Ok(Some(turn))
    }

    /// The citizen arrived at the counter; service begins.
    pub async fn start_service(
        &self,
        turn_id: &str,
        employee_id: &str,
    ) -> Result<Turn, ServiceError> {
        let turn = self
            .commit_transition(turn_id, TurnAction::StartService, Some(employee_id), None)
            .await?;
        self.hub
            .publish(&turn.sector_id, QueueEvent::TurnStarted { turn: turn.clone() });
        Ok(turn)
    }

    /// Service completed.
    pub async fn finish(
        &self,
        turn_id: &str,
        employee_id: &str,
        notes: Option<String>,
    ) -> Result<Turn, ServiceError> {
        let turn = self
            .commit_transition(turn_id, TurnAction::Finish, Some(employee_id), notes)
            .await?;
        self.hub
            .publish(&turn.sector_id, QueueEvent::TurnFinished { turn: turn.clone() });
        Ok(turn)
    }

    /// The citizen did not respond to the call.
    pub async fn mark_absent(
        &self,
        turn_id: &str,
        employee_id: &str,
        notes: Option<String>,
    ) -> Result<Turn, ServiceError> {
        let turn = self
            .commit_transition(turn_id, TurnAction::MarkAbsent, Some(employee_id), notes)
            .await?;
        self.hub
            .publish(&turn.sector_id, QueueEvent::TurnAbsent { turn: turn.clone() });
        Ok(turn)
    }

    /// Withdraw a turn. Citizens cancel their own turns (no operator);
    /// operators may cancel any non-terminal turn.
    pub async fn cancel(
        &self,
        turn_id: &str,
        employee_id: Option<&str>,
        reason: Option<String>,
    ) -> Result<Turn, ServiceError> {
        let turn = self
            .commit_transition_as(turn_id, TurnAction::Cancel, None, employee_id, reason)
            .await?;
        self.hub
            .publish(&turn.sector_id, QueueEvent::TurnCancelled { turn: turn.clone() });
        Ok(turn)
    }

    /// Move a turn to another sector's queue, preserving its seniority.
    pub async fn redirect(
        &self,
        turn_id: &str,
        to_sector_id: &str,
        employee_id: &str,
        reason: Option<String>,
    ) -> Result<Turn, ServiceError> {
        self.active_sector(to_sector_id)?;

        let outcome = self.redirector.redirect(turn_id, to_sector_id).await?;

        self.emit_audit(AuditEvent::TurnRedirected {
            turn_id: outcome.turn.id.clone(),
            from_sector_id: outcome.from_sector_id.clone(),
            to_sector_id: to_sector_id.to_string(),
            reason,
            employee_id: Some(employee_id.to_string()),
        })
        .await;
        // The destination queue is the one whose displays change.
        self.hub.publish(
            to_sector_id,
            QueueEvent::TurnRedirected {
                turn: outcome.turn.clone(),
                from_sector_id: outcome.from_sector_id,
                to_sector_id: to_sector_id.to_string(),
            },
        );

        Ok(outcome.turn)
    }

    pub fn get(&self, turn_id: &str) -> Result<Option<Turn>, ServiceError> {
        Ok(self.turns.get(turn_id)?)
    }

    pub fn get_by_code(&self, code: &str) -> Result<Option<Turn>, ServiceError> {
        Ok(self.turns.get_by_code(code)?)
    }

    /// Pending turns of a sector in claim order.
    pub fn queue(&self, sector_id: &str) -> Result<Vec<Turn>, ServiceError> {
        self.sectors
            .get(sector_id)?
            .ok_or_else(|| ServiceError::SectorNotFound(sector_id.to_string()))?;
        Ok(self.turns.list_pending(sector_id)?)
    }

    pub fn list_sectors(&self) -> Result<Vec<Sector>, ServiceError> {
        Ok(self.sectors.list()?)
    }

    pub fn get_sector(&self, sector_id: &str) -> Result<Option<Sector>, ServiceError> {
        Ok(self.sectors.get(sector_id)?)
    }

    /// Activate or deactivate a sector.
    pub async fn set_sector_active(
        &self,
        sector_id: &str,
        active: bool,
        employee_id: Option<&str>,
    ) -> Result<(), ServiceError> {
        self.sectors.set_active(sector_id, active)?;
        self.emit_audit(AuditEvent::SectorUpdated {
            sector_id: sector_id.to_string(),
            active,
            employee_id: employee_id.map(String::from),
        })
        .await;
        Ok(())
    }

    async fn commit_transition(
        &self,
        turn_id: &str,
        action: TurnAction,
        expect_owner: Option<&str>,
        notes: Option<String>,
    ) -> Result<Turn, ServiceError> {
        self.commit_transition_as(turn_id, action, expect_owner, expect_owner, notes)
            .await
    }

    /// Persist a non-queue transition as a compare-and-swap on the turn's
    /// current state, retrying when a competing writer wins the race.
    ///
    /// `expect_owner` enforces the operator assignment; `actor` is who gets
    /// recorded in the audit trail (cancel allows any actor).
    async fn commit_transition_as(
        &self,
        turn_id: &str,
        action: TurnAction,
        expect_owner: Option<&str>,
        actor: Option<&str>,
        notes: Option<String>,
    ) -> Result<Turn, ServiceError> {
        for _ in 0..self.retries {
            let current = self
                .turns
                .get(turn_id)?
                .ok_or_else(|| ServiceError::NotFound(turn_id.to_string()))?;

            // Legality of the transition is checked before ownership: an
            // unclaimed turn has no assigned operator to mismatch, so the
            // caller learns the action itself is wrong, not who owns it.
            let from_state = current.state;
            let next_state = from_state.apply(action)?;

            if let Some(employee_id) = expect_owner {
                if current.employee_id.as_deref() != Some(employee_id) {
                    return Err(ServiceError::Forbidden {
                        turn_id: turn_id.to_string(),
                        employee_id: employee_id.to_string(),
                    });
                }
            }

            let now = Utc::now();
            let mut updated = current;
            updated.state = next_state;
            updated.updated_at = now;
            match action {
                TurnAction::StartService => updated.attended_at = Some(now),
                TurnAction::Finish => updated.finished_at = Some(now),
                _ => {}
            }
            if notes.is_some() {
                updated.notes = notes.clone();
            }

            if self.turns.update_if_state(&updated, &[from_state])? {
                self.emit_audit(AuditEvent::TurnStateChanged {
                    turn_id: updated.id.clone(),
                    from_state: from_state.as_str().to_string(),
                    to_state: next_state.as_str().to_string(),
                    employee_id: actor.map(String::from),
                    note: updated.notes.clone(),
                })
                .await;
                return Ok(updated);
            }
        }

        Err(ServiceError::Contended(format!(
            "could not apply {} to turn {}",
            action, turn_id
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codegen::SqliteCodeGenerator;
    use crate::sector::SqliteSectorStore;
    use crate::turn::SqliteTurnStore;

    fn service() -> TurnService {
        let turns = Arc::new(SqliteTurnStore::in_memory().unwrap());
        let sectors = Arc::new(SqliteSectorStore::in_memory().unwrap());
        let codes = Arc::new(SqliteCodeGenerator::in_memory().unwrap());

        sectors.upsert(&Sector::new("mesa", "MESA", "Mesa")).unwrap();
        sectors.upsert(&Sector::new("caja", "CAJA", "Caja")).unwrap();
        let mut closed = Sector::new("cerrado", "CERR", "Cerrado");
        closed.active = false;
        sectors.upsert(&closed).unwrap();

        TurnService::new(turns, sectors, codes, Arc::new(EventHub::default()), 3)
    }

    fn walk_in(sector: &str) -> CreateTurnRequest {
        CreateTurnRequest {
            sector_id: sector.to_string(),
            citizen_id: "citizen-1".to_string(),
            kind: TurnKind::Normal,
            priority: 0,
        }
    }

    #[tokio::test]
    async fn test_create_turn_issues_code() {
        let service = service();
        let turn = service.create_turn(walk_in("mesa")).await.unwrap();
        assert_eq!(turn.code, "MESA-00001");
        assert_eq!(turn.state, TurnState::Generated);

        let second = service.create_turn(walk_in("mesa")).await.unwrap();
        assert_eq!(second.code, "MESA-00002");
    }

    #[test]
    fn test_local_day_follows_office_timezone() {
        use chrono::TimeZone;
        // 01:30 UTC is still the previous evening three hours west.
        let at = Utc.with_ymd_and_hms(2026, 8, 27, 1, 30, 0).unwrap();
        let west = FixedOffset::west_opt(3 * 3600).unwrap();
        assert_eq!(local_day(at, west).to_string(), "2026-08-26");
        assert_eq!(local_day(at, Utc.fix()).to_string(), "2026-08-27");

        // 23:30 UTC is already the next morning two hours east.
        let at = Utc.with_ymd_and_hms(2026, 8, 27, 23, 30, 0).unwrap();
        let east = FixedOffset::east_opt(2 * 3600).unwrap();
        assert_eq!(local_day(at, east).to_string(), "2026-08-28");
    }

    #[test]
    fn test_with_utc_offset_ignores_out_of_range() {
        let service = service().with_utc_offset(-180);
        assert_eq!(service.day_offset.local_minus_utc(), -180 * 60);

        // Beyond +-24h FixedOffset cannot represent it; the default stays.
        let service = self::service().with_utc_offset(100_000);
        assert_eq!(service.day_offset.local_minus_utc(), 0);
    }

    #[tokio::test]
    async fn test_create_turn_with_offset_still_issues_sequential_codes() {
        let service = service().with_utc_offset(-180);
        let first = service.create_turn(walk_in("mesa")).await.unwrap();
        let second = service.create_turn(walk_in("mesa")).await.unwrap();
        assert_eq!(first.code, "MESA-00001");
        assert_eq!(second.code, "MESA-00002");
    }

    #[tokio::test]
    async fn test_create_turn_unknown_sector() {
        let service = service();
        let err = service.create_turn(walk_in("nope")).await.unwrap_err();
        assert!(matches!(err, ServiceError::SectorNotFound(_)));
    }

    #[tokio::test]
    async fn test_create_turn_inactive_sector() {
        let service = service();
        let err = service.create_turn(walk_in("cerrado")).await.unwrap_err();
        assert!(matches!(err, ServiceError::SectorInactive(_)));
    }

    #[tokio::test]
    async fn test_special_turn_capacity() {
        let turns = Arc::new(SqliteTurnStore::in_memory().unwrap());
        let sectors = Arc::new(SqliteSectorStore::in_memory().unwrap());
        let codes = Arc::new(SqliteCodeGenerator::in_memory().unwrap());
        let mut limited = Sector::new("mesa", "MESA", "Mesa");
        limited.max_capacity = Some(2);
        sectors.upsert(&limited).unwrap();
        let service =
            TurnService::new(turns, sectors, codes, Arc::new(EventHub::default()), 3);

        let appointment_at = Utc::now() + chrono::Duration::days(1);
        let special = |citizen: &str| CreateTurnRequest {
            sector_id: "mesa".to_string(),
            citizen_id: citizen.to_string(),
            kind: TurnKind::Special { appointment_at },
            priority: 0,
        };

        service.create_turn(special("c1")).await.unwrap();
        service.create_turn(special("c2")).await.unwrap();
        let err = service.create_turn(special("c3")).await.unwrap_err();
        assert!(matches!(err, ServiceError::CapacityExceeded { .. }));

        // Walk-ins are not limited by appointment capacity.
        service.create_turn(walk_in("mesa")).await.unwrap();
    }

    #[tokio::test]
    async fn test_full_lifecycle() {
        let service = service();
        let turn = service.create_turn(walk_in("mesa")).await.unwrap();

        let called = service.claim_next("mesa", "emp-1").await.unwrap().unwrap();
        assert_eq!(called.id, turn.id);
        assert_eq!(called.state, TurnState::Called);

        let serving = service.start_service(&turn.id, "emp-1").await.unwrap();
        assert_eq!(serving.state, TurnState::InService);
        assert!(serving.attended_at.is_some());

        let done = service
            .finish(&turn.id, "emp-1", Some("resolved".to_string()))
            .await
            .unwrap();
        assert_eq!(done.state, TurnState::Finished);
        assert!(done.finished_at.is_some());
        assert_eq!(done.notes.as_deref(), Some("resolved"));
        assert!(done.timestamps_consistent());
    }

    #[tokio::test]
    async fn test_other_operator_cannot_advance_turn() {
        let service = service();
        let turn = service.create_turn(walk_in("mesa")).await.unwrap();
        service.claim_next("mesa", "emp-1").await.unwrap().unwrap();

        let err = service.start_service(&turn.id, "emp-2").await.unwrap_err();
        assert!(matches!(err, ServiceError::Forbidden { .. }));

        // The turn stays assigned and Called.
        let stored = service.get(&turn.id).unwrap().unwrap();
        assert_eq!(stored.state, TurnState::Called);
        assert_eq!(stored.employee_id.as_deref(), Some("emp-1"));
    }

    #[tokio::test]
    async fn test_claim_empty_queue_returns_none() {
        let service = service();
        assert!(service.claim_next("mesa", "emp-1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_mark_absent() {
        let service = service();
        let turn = service.create_turn(walk_in("mesa")).await.unwrap();
        service.claim_next("mesa", "emp-1").await.unwrap().unwrap();

        let absent = service
            .mark_absent(&turn.id, "emp-1", Some("no show".to_string()))
            .await
            .unwrap();
        assert_eq!(absent.state, TurnState::Absent);
        assert!(absent.timestamps_consistent());
    }

    #[tokio::test]
    async fn test_cancel_by_citizen() {
        let service = service();
        let turn = service.create_turn(walk_in("mesa")).await.unwrap();

        let cancelled = service
            .cancel(&turn.id, None, Some("changed my mind".to_string()))
            .await
            .unwrap();
        assert_eq!(cancelled.state, TurnState::Cancelled);
        assert_eq!(cancelled.notes.as_deref(), Some("changed my mind"));

        // Terminal turns cannot be cancelled again.
        let err = service.cancel(&turn.id, None, None).await.unwrap_err();
        assert!(matches!(err, ServiceError::InvalidTransition(_)));
    }

    #[tokio::test]
    async fn test_invalid_transition_leaves_turn_unchanged() {
        let service = service();
        let turn = service.create_turn(walk_in("mesa")).await.unwrap();

        // Finishing or marking absent a turn that was never claimed is an
        // illegal transition, regardless of who asks.
        let err = service.finish(&turn.id, "emp-1", None).await.unwrap_err();
        assert!(matches!(err, ServiceError::InvalidTransition(_)));
        let err = service
            .mark_absent(&turn.id, "emp-1", None)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidTransition(_)));

        let stored = service.get(&turn.id).unwrap().unwrap();
        assert_eq!(stored.state, TurnState::Generated);
        assert!(stored.employee_id.is_none());
    }

    #[tokio::test]
    async fn test_redirect_and_reclaim() {
        let service = service();
        let turn = service.create_turn(walk_in("mesa")).await.unwrap();
        service.claim_next("mesa", "emp-1").await.unwrap().unwrap();

        let moved = service
            .redirect(&turn.id, "caja", "emp-1", Some("wrong desk".to_string()))
            .await
            .unwrap();
        assert_eq!(moved.sector_id, "caja");
        assert_eq!(moved.state, TurnState::Redirected);
        assert!(moved.employee_id.is_none());

        // The destination sector can now claim it.
        let reclaimed = service.claim_next("caja", "emp-9").await.unwrap().unwrap();
        assert_eq!(reclaimed.id, turn.id);
        assert_eq!(reclaimed.employee_id.as_deref(), Some("emp-9"));
    }

    #[tokio::test]
    async fn test_redirect_to_inactive_sector() {
        let service = service();
        let turn = service.create_turn(walk_in("mesa")).await.unwrap();

        let err = service
            .redirect(&turn.id, "cerrado", "emp-1", None)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::SectorInactive(_)));
    }

    #[tokio::test]
    async fn test_queue_listing() {
        let service = service();
        let t1 = service.create_turn(walk_in("mesa")).await.unwrap();
        let mut urgent = walk_in("mesa");
        urgent.priority = 5;
        let t2 = service.create_turn(urgent).await.unwrap();

        let queue = service.queue("mesa").unwrap();
        let ids: Vec<&str> = queue.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec![t2.id.as_str(), t1.id.as_str()]);

        assert!(matches!(
            service.queue("nope"),
            Err(ServiceError::SectorNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_get_by_code() {
        let service = service();
        let turn = service.create_turn(walk_in("mesa")).await.unwrap();
        let fetched = service.get_by_code(&turn.code).unwrap().unwrap();
        assert_eq!(fetched.id, turn.id);
    }
}
