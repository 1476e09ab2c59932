//! The Visit aggregate: one clinical encounter of a patient with a doctor
//! on a given day.
//!
//! Status lifecycle:
//!
//! ```text
//! CheckedIn -> InProgress -> Completed
//!     |-> Cancelled
//!     |-> NoShow
//! ```
//!
//! `Cancelled` and `NoShow` are only reachable from `CheckedIn` — a visit
//! that never actually happened. Such visits are "void": they do not count
//! towards the at-most-one-visit-per-day rule.
//!
//! A visit owns at most one prescription and at most one bill. The links are
//! set once and never reassigned; relinking is a no-op.

use crate::actor::Actor;
use crate::{OpdError, OpdResult};
use chrono::{DateTime, NaiveDate, Utc};
use opd_types::{BillId, DoctorId, PatientId, PrescriptionId, VisitId};

#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VisitStatus {
    CheckedIn,
    InProgress,
    Completed,
    Cancelled,
    NoShow,
}

impl VisitStatus {
    /// True for visits that never took place and are excluded from the
    /// one-visit-per-day resolution query.
    pub fn is_void(&self) -> bool {
        matches!(self, VisitStatus::Cancelled | VisitStatus::NoShow)
    }
}

/// Recorded vital signs. All fields optional — vitals are filled
/// progressively over the course of a consultation.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize)]
pub struct Vitals {
    pub blood_pressure: Option<String>,
    pub temperature_celsius: Option<f64>,
    pub pulse_bpm: Option<f64>,
    pub respiratory_rate: Option<f64>,
    pub spo2_percent: Option<f64>,
    pub weight_kg: Option<f64>,
    pub height_cm: Option<f64>,
}

/// A partial vitals update. `None` fields leave the previously recorded
/// values untouched.
#[derive(Clone, Debug, Default, serde::Deserialize)]
pub struct VitalsUpdate {
    #[serde(default)]
    pub blood_pressure: Option<String>,
    #[serde(default)]
    pub temperature_celsius: Option<f64>,
    #[serde(default)]
    pub pulse_bpm: Option<f64>,
    #[serde(default)]
    pub respiratory_rate: Option<f64>,
    #[serde(default)]
    pub spo2_percent: Option<f64>,
    #[serde(default)]
    pub weight_kg: Option<f64>,
    #[serde(default)]
    pub height_cm: Option<f64>,
}

impl VitalsUpdate {
    pub fn is_empty(&self) -> bool {
        self.blood_pressure.as_deref().map_or(true, str::is_empty)
            && self.temperature_celsius.is_none()
            && self.pulse_bpm.is_none()
            && self.respiratory_rate.is_none()
            && self.spo2_percent.is_none()
            && self.weight_kg.is_none()
            && self.height_cm.is_none()
    }
}

/// One clinical encounter.
#[derive(Clone, Debug, serde::Serialize)]
pub struct Visit {
    id: VisitId,
    patient_id: PatientId,
    doctor_id: DoctorId,
    visit_date: DateTime<Utc>,
    status: VisitStatus,
    chief_complaint: Option<String>,
    history: Option<String>,
    vitals: Vitals,
    examination: Option<String>,
    diagnosis: Option<String>,
    treatment_plan: Option<String>,
    notes: Option<String>,
    follow_up_date: Option<DateTime<Utc>>,
    follow_up_instructions: Option<String>,
    prescription_id: Option<PrescriptionId>,
    bill_id: Option<BillId>,
    completed_at: Option<DateTime<Utc>>,
    completed_by: Option<Actor>,
}

impl Visit {
    /// Checks a patient in with a doctor, creating a fresh visit.
    pub fn check_in(patient_id: PatientId, doctor_id: DoctorId, visit_date: DateTime<Utc>) -> Self {
        Self {
            id: VisitId::new(),
            patient_id,
            doctor_id,
            visit_date,
            status: VisitStatus::CheckedIn,
            chief_complaint: None,
            history: None,
            vitals: Vitals::default(),
            examination: None,
            diagnosis: None,
            treatment_plan: None,
            notes: None,
            follow_up_date: None,
            follow_up_instructions: None,
            prescription_id: None,
            bill_id: None,
            completed_at: None,
            completed_by: None,
        }
    }

    pub fn id(&self) -> VisitId {
        self.id
    }

    pub fn patient_id(&self) -> PatientId {
        self.patient_id
    }

    pub fn doctor_id(&self) -> DoctorId {
        self.doctor_id
    }

    pub fn visit_date(&self) -> DateTime<Utc> {
        self.visit_date
    }

    /// The calendar day this visit belongs to, for same-day resolution.
    pub fn occurred_on(&self) -> NaiveDate {
        self.visit_date.date_naive()
    }

    pub fn status(&self) -> VisitStatus {
        self.status
    }

    pub fn chief_complaint(&self) -> Option<&str> {
        self.chief_complaint.as_deref()
    }

    pub fn history(&self) -> Option<&str> {
        self.history.as_deref()
    }

    pub fn vitals(&self) -> &Vitals {
        &self.vitals
    }

    pub fn examination(&self) -> Option<&str> {
        self.examination.as_deref()
    }

    pub fn diagnosis(&self) -> Option<&str> {
        self.diagnosis.as_deref()
    }

    pub fn treatment_plan(&self) -> Option<&str> {
        self.treatment_plan.as_deref()
    }

    pub fn notes(&self) -> Option<&str> {
        self.notes.as_deref()
    }

    pub fn follow_up_date(&self) -> Option<DateTime<Utc>> {
        self.follow_up_date
    }

    pub fn follow_up_instructions(&self) -> Option<&str> {
        self.follow_up_instructions.as_deref()
    }

    pub fn prescription_id(&self) -> Option<PrescriptionId> {
        self.prescription_id
    }

    pub fn bill_id(&self) -> Option<BillId> {
        self.bill_id
    }

    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }

    // ------------------------------------------------------------------
    // State transitions
    // ------------------------------------------------------------------

    /// Moves a freshly checked-in visit into consultation.
    ///
    /// # Errors
    ///
    /// Returns `Validation` unless the visit is in `CheckedIn`.
    pub fn start_consultation(&mut self) -> OpdResult<()> {
        if self.status != VisitStatus::CheckedIn {
            return Err(OpdError::Validation(format!(
                "consultation can only start from a checked-in visit (status: {:?})",
                self.status
            )));
        }
        self.status = VisitStatus::InProgress;
        Ok(())
    }

    /// Completes the visit.
    ///
    /// A consultation without any chief complaint ever recorded is not a
    /// completable encounter.
    ///
    /// # Errors
    ///
    /// Returns `Validation` if no chief complaint was recorded, or if the
    /// visit is cancelled, a no-show, or already completed.
    pub fn complete(&mut self, performed_by: &Actor, now: DateTime<Utc>) -> OpdResult<()> {
        match self.status {
            VisitStatus::CheckedIn | VisitStatus::InProgress => {}
            other => {
                return Err(OpdError::Validation(format!(
                    "visit cannot be completed from status {other:?}"
                )))
            }
        }

        if self.chief_complaint.is_none() {
            return Err(OpdError::Validation(
                "visit cannot be completed without a recorded chief complaint".into(),
            ));
        }

        self.status = VisitStatus::Completed;
        self.completed_at = Some(now);
        self.completed_by = Some(performed_by.clone());
        Ok(())
    }

    /// Cancels a visit that has not started.
    ///
    /// # Errors
    ///
    /// Returns `Validation` unless the visit is in `CheckedIn`.
    pub fn cancel(&mut self) -> OpdResult<()> {
        if self.status != VisitStatus::CheckedIn {
            return Err(OpdError::Validation(format!(
                "only a checked-in visit can be cancelled (status: {:?})",
                self.status
            )));
        }
        self.status = VisitStatus::Cancelled;
        Ok(())
    }

    /// Marks a visit as a no-show.
    ///
    /// # Errors
    ///
    /// Returns `Validation` unless the visit is in `CheckedIn`.
    pub fn mark_no_show(&mut self) -> OpdResult<()> {
        if self.status != VisitStatus::CheckedIn {
            return Err(OpdError::Validation(format!(
                "only a checked-in visit can be marked no-show (status: {:?})",
                self.status
            )));
        }
        self.status = VisitStatus::NoShow;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Aggregate links (1:1, set once)
    // ------------------------------------------------------------------

    /// Links the visit to its prescription. Returns `true` if the link was
    /// newly set, `false` if a prescription link already existed (the
    /// existing link is kept).
    pub fn link_prescription(&mut self, prescription_id: PrescriptionId) -> bool {
        if self.prescription_id.is_some() {
            return false;
        }
        self.prescription_id = Some(prescription_id);
        true
    }

    /// Links the visit to its bill. Same set-once semantics as
    /// [`link_prescription`](Visit::link_prescription).
    pub fn link_bill(&mut self, bill_id: BillId) -> bool {
        if self.bill_id.is_some() {
            return false;
        }
        self.bill_id = Some(bill_id);
        true
    }

    // ------------------------------------------------------------------
    // Clinical field mutators (partial-update semantics)
    // ------------------------------------------------------------------

    pub fn set_chief_complaint(&mut self, text: impl Into<String>) {
        self.chief_complaint = Some(text.into());
    }

    pub fn set_history(&mut self, text: impl Into<String>) {
        self.history = Some(text.into());
    }

    pub fn set_examination(&mut self, text: impl Into<String>) {
        self.examination = Some(text.into());
    }

    pub fn set_diagnosis(&mut self, text: impl Into<String>) {
        self.diagnosis = Some(text.into());
    }

    pub fn set_treatment_plan(&mut self, text: impl Into<String>) {
        self.treatment_plan = Some(text.into());
    }

    pub fn set_notes(&mut self, text: impl Into<String>) {
        self.notes = Some(text.into());
    }

    /// Merges the supplied vitals into the recorded set. Absent fields keep
    /// their previous values.
    ///
    /// # Errors
    ///
    /// Returns `Validation` for out-of-range measurements (non-positive or
    /// non-finite values, SpO2 above 100%).
    pub fn update_vitals(&mut self, update: &VitalsUpdate) -> OpdResult<()> {
        fn positive(name: &str, value: Option<f64>) -> OpdResult<Option<f64>> {
            match value {
                Some(v) if !v.is_finite() || v <= 0.0 => Err(OpdError::Validation(format!(
                    "{name} must be a positive number, got {v}"
                ))),
                other => Ok(other),
            }
        }

        let temperature = positive("temperature", update.temperature_celsius)?;
        let pulse = positive("pulse", update.pulse_bpm)?;
        let respiratory_rate = positive("respiratory rate", update.respiratory_rate)?;
        let spo2 = positive("SpO2", update.spo2_percent)?;
        if let Some(v) = spo2 {
            if v > 100.0 {
                return Err(OpdError::Validation(format!(
                    "SpO2 cannot exceed 100%, got {v}"
                )));
            }
        }
        let weight = positive("weight", update.weight_kg)?;
        let height = positive("height", update.height_cm)?;

        if let Some(bp) = update.blood_pressure.as_deref().filter(|s| !s.is_empty()) {
            self.vitals.blood_pressure = Some(bp.to_owned());
        }
        if temperature.is_some() {
            self.vitals.temperature_celsius = temperature;
        }
        if pulse.is_some() {
            self.vitals.pulse_bpm = pulse;
        }
        if respiratory_rate.is_some() {
            self.vitals.respiratory_rate = respiratory_rate;
        }
        if spo2.is_some() {
            self.vitals.spo2_percent = spo2;
        }
        if weight.is_some() {
            self.vitals.weight_kg = weight;
        }
        if height.is_some() {
            self.vitals.height_cm = height;
        }

        Ok(())
    }

    /// Schedules a follow-up appointment.
    pub fn schedule_follow_up(&mut self, date: DateTime<Utc>, instructions: Option<String>) {
        self.follow_up_date = Some(date);
        if let Some(text) = instructions.filter(|s| !s.is_empty()) {
            self.follow_up_instructions = Some(text);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use opd_types::NonEmptyText;

    fn clinician() -> Actor {
        Actor::new(
            NonEmptyText::new("Dr Rivera").unwrap(),
            NonEmptyText::new("Clinician").unwrap(),
        )
    }

    fn fresh_visit() -> Visit {
        Visit::check_in(PatientId::new(), DoctorId::new(), Utc::now())
    }

    #[test]
    fn happy_path_runs_checked_in_to_completed() {
        let mut visit = fresh_visit();
        assert_eq!(visit.status(), VisitStatus::CheckedIn);

        visit.start_consultation().expect("start should succeed");
        assert_eq!(visit.status(), VisitStatus::InProgress);

        visit.set_chief_complaint("persistent cough");
        visit
            .complete(&clinician(), Utc::now())
            .expect("complete should succeed");
        assert_eq!(visit.status(), VisitStatus::Completed);
        assert!(visit.completed_at().is_some());
    }

    #[test]
    fn completion_requires_a_chief_complaint() {
        let mut visit = fresh_visit();
        visit.start_consultation().expect("start should succeed");

        let err = visit
            .complete(&clinician(), Utc::now())
            .expect_err("completing without a complaint should fail");
        assert!(matches!(err, OpdError::Validation(_)));
        assert_eq!(visit.status(), VisitStatus::InProgress);
    }

    #[test]
    fn cancel_and_no_show_only_from_checked_in() {
        let mut visit = fresh_visit();
        visit.start_consultation().expect("start should succeed");

        assert!(visit.cancel().is_err());
        assert!(visit.mark_no_show().is_err());

        let mut fresh = fresh_visit();
        fresh.cancel().expect("cancel from checked-in should work");
        assert!(fresh.status().is_void());
    }

    #[test]
    fn completed_visit_cannot_be_completed_again() {
        let mut visit = fresh_visit();
        visit.start_consultation().expect("start should succeed");
        visit.set_chief_complaint("headache");
        visit
            .complete(&clinician(), Utc::now())
            .expect("first completion should succeed");

        let err = visit
            .complete(&clinician(), Utc::now())
            .expect_err("second completion should fail");
        assert!(matches!(err, OpdError::Validation(_)));
    }

    #[test]
    fn prescription_link_is_set_once() {
        let mut visit = fresh_visit();
        let first = PrescriptionId::new();
        let second = PrescriptionId::new();

        assert!(visit.link_prescription(first));
        assert!(!visit.link_prescription(second), "relink must be a no-op");
        assert_eq!(visit.prescription_id(), Some(first));
    }

    #[test]
    fn bill_link_is_set_once() {
        let mut visit = fresh_visit();
        let first = BillId::new();

        assert!(visit.link_bill(first));
        assert!(!visit.link_bill(BillId::new()));
        assert_eq!(visit.bill_id(), Some(first));
    }

    #[test]
    fn vitals_merge_preserves_absent_fields() {
        let mut visit = fresh_visit();
        visit
            .update_vitals(&VitalsUpdate {
                blood_pressure: Some("120/80".into()),
                pulse_bpm: Some(72.0),
                ..VitalsUpdate::default()
            })
            .expect("initial vitals should record");

        visit
            .update_vitals(&VitalsUpdate {
                temperature_celsius: Some(37.8),
                ..VitalsUpdate::default()
            })
            .expect("partial update should record");

        let vitals = visit.vitals();
        assert_eq!(vitals.blood_pressure.as_deref(), Some("120/80"));
        assert_eq!(vitals.pulse_bpm, Some(72.0));
        assert_eq!(vitals.temperature_celsius, Some(37.8));
    }

    #[test]
    fn vitals_reject_out_of_range_measurements() {
        let mut visit = fresh_visit();

        let err = visit
            .update_vitals(&VitalsUpdate {
                spo2_percent: Some(104.0),
                ..VitalsUpdate::default()
            })
            .expect_err("SpO2 above 100 should fail");
        assert!(matches!(err, OpdError::Validation(_)));

        let err = visit
            .update_vitals(&VitalsUpdate {
                pulse_bpm: Some(-10.0),
                ..VitalsUpdate::default()
            })
            .expect_err("negative pulse should fail");
        assert!(matches!(err, OpdError::Validation(_)));
    }
}
