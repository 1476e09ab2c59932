//! The consultation-completion workflow.
//!
//! One call takes a "doctor sees a patient" event and reconciles the four
//! related aggregates — Patient, Visit, Prescription, Bill — as a single
//! atomic unit: resolve-or-create each one, apply the clinical and billing
//! mutations, mark the visit complete, commit. The whole body runs inside
//! one transaction and is re-executed from scratch on transient store
//! failures.
//!
//! Resolution order is fixed (Patient → Visit → Prescription → Bill):
//! the later aggregates are keyed by the visit id.

mod billing;
mod clinical;
mod reconcile;
pub mod request;
mod result;

pub use request::ConsultationRequest;
pub use result::ConsultationResult;

use crate::actor::Actor;
use crate::config::CoreConfig;
use crate::entities::VisitStatus;
use crate::keylock::{VisitKey, VisitKeyLock};
use crate::retry;
use crate::store::{EncounterStore, StoreTx};
use crate::{OpdError, OpdResult};
use chrono::{DateTime, Utc};
use std::sync::Arc;

/// Orchestrates consultation completion over an [`EncounterStore`].
pub struct CompletionWorkflow<S> {
    store: S,
    cfg: Arc<CoreConfig>,
    visit_locks: VisitKeyLock,
}

impl<S: EncounterStore> CompletionWorkflow<S> {
    pub fn new(store: S, cfg: Arc<CoreConfig>) -> Self {
        Self {
            store,
            cfg,
            visit_locks: VisitKeyLock::new(),
        }
    }

    /// The backing store, for read-side inspection.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Completes a consultation as of now.
    pub fn complete_consultation(
        &self,
        request: &ConsultationRequest,
        performed_by: &Actor,
    ) -> OpdResult<ConsultationResult> {
        self.complete_consultation_at(request, performed_by, Utc::now())
    }

    /// Completes a consultation at an explicit point in time.
    ///
    /// Validation failures surface before any storage work. For requests
    /// that target an existing patient, the (patient, doctor, day) advisory
    /// lock is held from before resolution until after commit so that two
    /// concurrent calls cannot both create "today's visit". A brand-new
    /// patient gets a fresh id and cannot race with anyone.
    ///
    /// # Errors
    ///
    /// `Validation` for malformed requests or an incompletable visit,
    /// `NotFound` for dangling references, `Transient` once retries are
    /// exhausted.
    pub fn complete_consultation_at(
        &self,
        request: &ConsultationRequest,
        performed_by: &Actor,
        now: DateTime<Utc>,
    ) -> OpdResult<ConsultationResult> {
        request.validate()?;

        tracing::info!(
            doctor_id = %request.doctor_id,
            new_patient = request.patient.new_patient.is_some(),
            performed_by = %performed_by,
            "completing consultation"
        );

        let _guard = request.patient.existing_patient_id.map(|patient_id| {
            self.visit_locks.acquire(VisitKey::new(
                patient_id,
                request.doctor_id,
                now.date_naive(),
            ))
        });

        let outcome = retry::run_with_retry(&self.cfg, || {
            self.store
                .run_in_transaction(|tx| self.run(tx, request, performed_by, now))
        })?;

        tracing::info!(
            consultation_id = %outcome.consultation_id,
            total = %outcome.total_amount,
            due = %outcome.due_amount,
            "consultation completed"
        );
        Ok(outcome)
    }

    /// The retried workflow body: a pure function from current store state
    /// to the desired mutations. Must stay free of side effects outside the
    /// transaction so that replays are safe.
    fn run(
        &self,
        tx: &mut dyn StoreTx,
        request: &ConsultationRequest,
        performed_by: &Actor,
        now: DateTime<Utc>,
    ) -> OpdResult<ConsultationResult> {
        if !tx.doctor_exists(request.doctor_id) {
            return Err(OpdError::not_found("doctor", request.doctor_id));
        }

        let patient = reconcile::resolve_patient(tx, &request.patient, now)?;
        let mut visit = reconcile::resolve_visit(
            tx,
            patient.id(),
            request.doctor_id,
            request.allow_multiple_visits_per_day,
            now,
        )?;
        let prescription = reconcile::resolve_prescription(tx, &mut visit, request, now)?;
        let mut bill = reconcile::resolve_bill(tx, &mut visit, request, now)?;

        billing::apply_payment(&mut bill, request.payment.as_ref(), performed_by, now)?;
        clinical::apply(&mut visit, request.consultation_details.as_ref())?;
        clinical::apply_follow_up(&mut visit, request.follow_up.as_ref(), now);

        if visit.status() != VisitStatus::Completed {
            visit.complete(performed_by, now)?;
        }

        tx.update_visit(visit.clone())?;
        if let Some(prescription) = &prescription {
            tx.update_prescription(prescription.clone())?;
        }
        tx.update_bill(bill.clone())?;

        Ok(result::assemble(patient, visit, prescription, bill))
    }
}
