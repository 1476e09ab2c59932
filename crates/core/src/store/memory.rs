//! In-memory entity store.
//!
//! Transactions work on a cloned snapshot of the whole state. The clone is
//! swapped back in under the write lock only when the closure succeeds, so
//! commit is atomic and rollback is simply dropping the snapshot. The write
//! lock also serialises transactions, which matches the
//! one-transaction-per-call model of the workflow.

use super::{EncounterStore, StoreTx};
use crate::entities::{AdviceItem, Bill, Doctor, Dose, Medicine, Patient, Prescription, Visit};
use crate::{OpdError, OpdResult};
use chrono::NaiveDate;
use opd_types::{
    AdviceId, BillId, DoctorId, DoseId, MedicineId, PatientId, PrescriptionId, VisitId,
};
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

#[derive(Clone, Debug, Default)]
struct State {
    patients: HashMap<PatientId, Patient>,
    visits: HashMap<VisitId, Visit>,
    prescriptions: HashMap<PrescriptionId, Prescription>,
    bills: HashMap<BillId, Bill>,
    doctors: HashMap<DoctorId, Doctor>,
    medicines: HashMap<MedicineId, Medicine>,
    doses: HashMap<DoseId, Dose>,
    advice_items: HashMap<AdviceId, AdviceItem>,
}

/// An in-memory [`EncounterStore`].
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: RwLock<State>,
}

/// One open transaction against a [`MemoryStore`].
struct MemoryTx {
    working: State,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    // ------------------------------------------------------------------
    // Read-only accessors for inspection outside a transaction.
    // ------------------------------------------------------------------

    pub fn patient(&self, id: PatientId) -> Option<Patient> {
        self.read(|s| s.patients.get(&id).cloned())
    }

    pub fn visit(&self, id: VisitId) -> Option<Visit> {
        self.read(|s| s.visits.get(&id).cloned())
    }

    pub fn prescription(&self, id: PrescriptionId) -> Option<Prescription> {
        self.read(|s| s.prescriptions.get(&id).cloned())
    }

    pub fn bill(&self, id: BillId) -> Option<Bill> {
        self.read(|s| s.bills.get(&id).cloned())
    }

    pub fn patient_count(&self) -> usize {
        self.read(|s| s.patients.len())
    }

    pub fn visit_count(&self) -> usize {
        self.read(|s| s.visits.len())
    }

    pub fn prescription_count(&self) -> usize {
        self.read(|s| s.prescriptions.len())
    }

    pub fn bill_count(&self) -> usize {
        self.read(|s| s.bills.len())
    }

    pub fn doctor_count(&self) -> usize {
        self.read(|s| s.doctors.len())
    }

    pub fn medicine_count(&self) -> usize {
        self.read(|s| s.medicines.len())
    }

    fn read<R>(&self, f: impl FnOnce(&State) -> R) -> R {
        let guard = self
            .state
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        f(&guard)
    }
}

impl EncounterStore for MemoryStore {
    fn run_in_transaction<R, F>(&self, mut work: F) -> OpdResult<R>
    where
        F: FnMut(&mut dyn StoreTx) -> OpdResult<R>,
    {
        let mut guard = self
            .state
            .write()
            .unwrap_or_else(PoisonError::into_inner);

        let mut tx = MemoryTx {
            working: guard.clone(),
        };

        match work(&mut tx) {
            Ok(outcome) => {
                *guard = tx.working;
                tracing::debug!("transaction committed");
                Ok(outcome)
            }
            Err(err) => {
                tracing::debug!(error = %err, "transaction rolled back");
                Err(err)
            }
        }
    }
}

impl StoreTx for MemoryTx {
    fn patient(&self, id: PatientId) -> Option<Patient> {
        self.working.patients.get(&id).cloned()
    }

    fn insert_patient(&mut self, patient: Patient) {
        self.working.patients.insert(patient.id(), patient);
    }

    fn update_patient(&mut self, patient: Patient) -> OpdResult<()> {
        if !self.working.patients.contains_key(&patient.id()) {
            return Err(OpdError::not_found("patient", patient.id()));
        }
        self.working.patients.insert(patient.id(), patient);
        Ok(())
    }

    fn visit(&self, id: VisitId) -> Option<Visit> {
        self.working.visits.get(&id).cloned()
    }

    fn find_open_visit(
        &self,
        patient_id: PatientId,
        doctor_id: DoctorId,
        day: NaiveDate,
    ) -> Option<Visit> {
        self.working
            .visits
            .values()
            .find(|v| {
                v.patient_id() == patient_id
                    && v.doctor_id() == doctor_id
                    && v.occurred_on() == day
                    && !v.status().is_void()
            })
            .cloned()
    }

    fn insert_visit(&mut self, visit: Visit) {
        self.working.visits.insert(visit.id(), visit);
    }

    fn update_visit(&mut self, visit: Visit) -> OpdResult<()> {
        if !self.working.visits.contains_key(&visit.id()) {
            return Err(OpdError::not_found("visit", visit.id()));
        }
        self.working.visits.insert(visit.id(), visit);
        Ok(())
    }

    fn prescription(&self, id: PrescriptionId) -> Option<Prescription> {
        self.working.prescriptions.get(&id).cloned()
    }

    fn prescription_for_visit(&self, visit_id: VisitId) -> Option<Prescription> {
        self.working
            .prescriptions
            .values()
            .find(|p| p.visit_id() == visit_id)
            .cloned()
    }

    fn insert_prescription(&mut self, prescription: Prescription) {
        self.working
            .prescriptions
            .insert(prescription.id(), prescription);
    }

    fn update_prescription(&mut self, prescription: Prescription) -> OpdResult<()> {
        if !self.working.prescriptions.contains_key(&prescription.id()) {
            return Err(OpdError::not_found("prescription", prescription.id()));
        }
        self.working
            .prescriptions
            .insert(prescription.id(), prescription);
        Ok(())
    }

    fn bill(&self, id: BillId) -> Option<Bill> {
        self.working.bills.get(&id).cloned()
    }

    fn bill_for_visit(&self, visit_id: VisitId) -> Option<Bill> {
        self.working
            .bills
            .values()
            .find(|b| b.visit_id() == visit_id)
            .cloned()
    }

    fn insert_bill(&mut self, bill: Bill) {
        self.working.bills.insert(bill.id(), bill);
    }

    fn update_bill(&mut self, bill: Bill) -> OpdResult<()> {
        if !self.working.bills.contains_key(&bill.id()) {
            return Err(OpdError::not_found("bill", bill.id()));
        }
        self.working.bills.insert(bill.id(), bill);
        Ok(())
    }

    fn doctor_exists(&self, id: DoctorId) -> bool {
        self.working.doctors.contains_key(&id)
    }

    fn medicine_exists(&self, id: MedicineId) -> bool {
        self.working.medicines.contains_key(&id)
    }

    fn dose_exists(&self, id: DoseId) -> bool {
        self.working.doses.contains_key(&id)
    }

    fn advice_exists(&self, id: AdviceId) -> bool {
        self.working.advice_items.contains_key(&id)
    }

    fn insert_doctor(&mut self, doctor: Doctor) {
        self.working.doctors.insert(doctor.id, doctor);
    }

    fn insert_medicine(&mut self, medicine: Medicine) {
        self.working.medicines.insert(medicine.id, medicine);
    }

    fn insert_dose(&mut self, dose: Dose) {
        self.working.doses.insert(dose.id, dose);
    }

    fn insert_advice_item(&mut self, item: AdviceItem) {
        self.working.advice_items.insert(item.id, item);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{Gender, Patient};
    use chrono::Utc;
    use opd_types::NonEmptyText;

    fn sample_patient() -> Patient {
        Patient::register(
            NonEmptyText::new("Tomas Ives").unwrap(),
            None,
            Gender::Male,
            NonEmptyText::new("555-0101").unwrap(),
            None,
            Utc::now(),
        )
    }

    #[test]
    fn successful_transaction_commits() {
        let store = MemoryStore::new();
        let patient = sample_patient();
        let id = patient.id();

        store
            .run_in_transaction(|tx| {
                tx.insert_patient(patient.clone());
                Ok(())
            })
            .expect("transaction should commit");

        assert!(store.patient(id).is_some());
        assert_eq!(store.patient_count(), 1);
    }

    #[test]
    fn failed_transaction_rolls_back_every_write() {
        let store = MemoryStore::new();
        let patient = sample_patient();

        let result: OpdResult<()> = store.run_in_transaction(|tx| {
            tx.insert_patient(patient.clone());
            tx.insert_visit(Visit::check_in(patient.id(), DoctorId::new(), Utc::now()));
            Err(OpdError::Validation("forced failure".into()))
        });

        assert!(result.is_err());
        assert_eq!(store.patient_count(), 0, "patient write must be rolled back");
        assert_eq!(store.visit_count(), 0, "visit write must be rolled back");
    }

    #[test]
    fn find_open_visit_skips_void_visits_and_other_days() {
        let store = MemoryStore::new();
        let patient_id = PatientId::new();
        let doctor_id = DoctorId::new();
        let now = Utc::now();

        store
            .run_in_transaction(|tx| {
                let mut cancelled = Visit::check_in(patient_id, doctor_id, now);
                cancelled.cancel().expect("cancel from checked-in");
                tx.insert_visit(cancelled);

                let yesterday =
                    Visit::check_in(patient_id, doctor_id, now - chrono::Duration::days(1));
                tx.insert_visit(yesterday);

                assert!(
                    tx.find_open_visit(patient_id, doctor_id, now.date_naive())
                        .is_none(),
                    "cancelled and prior-day visits must not match"
                );

                let open = Visit::check_in(patient_id, doctor_id, now);
                let open_id = open.id();
                tx.insert_visit(open);

                let found = tx
                    .find_open_visit(patient_id, doctor_id, now.date_naive())
                    .expect("open same-day visit should match");
                assert_eq!(found.id(), open_id);
                Ok(())
            })
            .expect("transaction should commit");
    }

    #[test]
    fn updates_replace_existing_rows() {
        let store = MemoryStore::new();
        let mut patient = sample_patient();
        let id = patient.id();

        store
            .run_in_transaction(|tx| {
                tx.insert_patient(patient.clone());
                Ok(())
            })
            .expect("insert should commit");

        patient.update_contact(
            NonEmptyText::new("Tomas Ives-Clark").unwrap(),
            NonEmptyText::new("555-0202").unwrap(),
        );
        store
            .run_in_transaction(|tx| tx.update_patient(patient.clone()))
            .expect("update should commit");

        let stored = store.patient(id).expect("patient should exist");
        assert_eq!(stored.name().as_str(), "Tomas Ives-Clark");
    }

    #[test]
    fn update_of_missing_row_reports_not_found() {
        let store = MemoryStore::new();

        let result: OpdResult<()> = store.run_in_transaction(|tx| {
            tx.update_visit(Visit::check_in(PatientId::new(), DoctorId::new(), Utc::now()))
        });

        assert!(matches!(
            result,
            Err(OpdError::NotFound { entity: "visit", .. })
        ));
    }
}
