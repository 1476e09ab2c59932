//! Entity store contracts: repository access and the transaction boundary.
//!
//! The workflow consumes storage through two narrow contracts. [`StoreTx`]
//! is the view inside one transaction: typed lookups, find-by-key queries
//! and writes per aggregate. [`EncounterStore`] owns the transaction
//! boundary: `run_in_transaction` commits every write of a successful
//! closure as one atomic unit and discards everything on error, so a
//! failure partway through a consultation never leaves a half-updated
//! encounter behind.
//!
//! Resolution queries run inside the same transaction as the commit — there
//! is no separate existence-check transaction.

pub mod memory;

use crate::entities::{AdviceItem, Bill, Doctor, Dose, Medicine, Patient, Prescription, Visit};
use crate::OpdResult;
use chrono::NaiveDate;
use opd_types::{AdviceId, BillId, DoctorId, DoseId, MedicineId, PatientId, PrescriptionId, VisitId};

/// Repository access within one transaction.
///
/// Reads return owned snapshots; mutate the snapshot and hand it back via
/// the matching `update_*` call. `update_*` fails with `NotFound` for a row
/// that does not exist — intent to create must be explicit via `insert_*`,
/// never inferred from change tracking.
pub trait StoreTx {
    // -- patients ---------------------------------------------------------
    fn patient(&self, id: PatientId) -> Option<Patient>;
    fn insert_patient(&mut self, patient: Patient);
    fn update_patient(&mut self, patient: Patient) -> OpdResult<()>;

    // -- visits -----------------------------------------------------------
    fn visit(&self, id: VisitId) -> Option<Visit>;
    /// Finds the non-void visit of `(patient, doctor)` on `day`, if any.
    /// Cancelled and no-show visits never match.
    fn find_open_visit(
        &self,
        patient_id: PatientId,
        doctor_id: DoctorId,
        day: NaiveDate,
    ) -> Option<Visit>;
    fn insert_visit(&mut self, visit: Visit);
    fn update_visit(&mut self, visit: Visit) -> OpdResult<()>;

    // -- prescriptions ------------------------------------------------------
    fn prescription(&self, id: PrescriptionId) -> Option<Prescription>;
    fn prescription_for_visit(&self, visit_id: VisitId) -> Option<Prescription>;
    fn insert_prescription(&mut self, prescription: Prescription);
    fn update_prescription(&mut self, prescription: Prescription) -> OpdResult<()>;

    // -- bills --------------------------------------------------------------
    fn bill(&self, id: BillId) -> Option<Bill>;
    fn bill_for_visit(&self, visit_id: VisitId) -> Option<Bill>;
    fn insert_bill(&mut self, bill: Bill);
    fn update_bill(&mut self, bill: Bill) -> OpdResult<()>;

    // -- master data ---------------------------------------------------------
    fn doctor_exists(&self, id: DoctorId) -> bool;
    fn medicine_exists(&self, id: MedicineId) -> bool;
    fn dose_exists(&self, id: DoseId) -> bool;
    fn advice_exists(&self, id: AdviceId) -> bool;
    fn insert_doctor(&mut self, doctor: Doctor);
    fn insert_medicine(&mut self, medicine: Medicine);
    fn insert_dose(&mut self, dose: Dose);
    fn insert_advice_item(&mut self, item: AdviceItem);
}

/// The transaction boundary over an entity store.
///
/// Implementations must guarantee that the writes made through the `work`
/// closure become visible atomically on `Ok` and not at all on `Err`.
/// Callers may re-invoke `run_in_transaction` with the same closure after a
/// [`Transient`](crate::OpdError::Transient) failure; because the closure
/// re-runs its resolution queries against current state, find-or-create
/// replays are safe as long as no partial commit occurred.
pub trait EncounterStore: Send + Sync {
    fn run_in_transaction<R, F>(&self, work: F) -> OpdResult<R>
    where
        F: FnMut(&mut dyn StoreTx) -> OpdResult<R>;
}
