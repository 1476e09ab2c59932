//! The consultation-completion request.
//!
//! One request describes a whole encounter: who the patient is (new or
//! existing), which doctor saw them, optional clinical detail, the medicine
//! and advice lines, the fee and an optional payment. Field-level invariants
//! (non-empty text, bounded percentages, non-negative money) are carried by
//! the types themselves; [`ConsultationRequest::validate`] checks the
//! cross-field rules before any storage work begins.

use crate::entities::{Gender, PaymentMode, VitalsUpdate};
use crate::{OpdError, OpdResult};
use chrono::NaiveDate;
use opd_types::{AdviceId, DoctorId, DoseId, MedicineId, Money, NonEmptyText, PatientId, Percentage};

/// Demographics for a patient registered as part of the consultation.
#[derive(Clone, Debug, serde::Deserialize)]
pub struct NewPatientRequest {
    pub name: NonEmptyText,
    #[serde(default)]
    pub title: Option<String>,
    pub gender: Gender,
    pub mobile: NonEmptyText,
    #[serde(default)]
    pub date_of_birth: Option<NaiveDate>,
}

/// Selects the patient for the encounter: either a new-patient payload or an
/// existing patient id — exactly one of the two.
#[derive(Clone, Debug, Default, serde::Deserialize)]
pub struct PatientSelector {
    #[serde(default)]
    pub new_patient: Option<NewPatientRequest>,
    #[serde(default)]
    pub existing_patient_id: Option<PatientId>,
}

impl PatientSelector {
    pub fn for_new_patient(payload: NewPatientRequest) -> Self {
        Self {
            new_patient: Some(payload),
            existing_patient_id: None,
        }
    }

    pub fn for_existing(id: PatientId) -> Self {
        Self {
            new_patient: None,
            existing_patient_id: Some(id),
        }
    }

    fn validate(&self) -> OpdResult<()> {
        match (&self.new_patient, &self.existing_patient_id) {
            (None, None) => Err(OpdError::Validation(
                "either a new-patient payload or an existing patient id is required".into(),
            )),
            (Some(_), Some(_)) => Err(OpdError::Validation(
                "a request cannot supply both a new-patient payload and an existing patient id"
                    .into(),
            )),
            _ => Ok(()),
        }
    }
}

/// Optional clinical detail. Every field is optional; absent fields leave
/// previously recorded values untouched.
#[derive(Clone, Debug, Default, serde::Deserialize)]
pub struct ConsultationDetails {
    #[serde(default)]
    pub chief_complaint: Option<String>,
    #[serde(default)]
    pub history: Option<String>,
    #[serde(default)]
    pub vitals: Option<VitalsUpdate>,
    #[serde(default)]
    pub examination: Option<String>,
    #[serde(default)]
    pub diagnosis: Option<String>,
    #[serde(default)]
    pub treatment_plan: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

/// One requested medicine line.
#[derive(Clone, Debug, serde::Deserialize)]
pub struct MedicineLineRequest {
    pub medicine_id: MedicineId,
    pub dose_id: DoseId,
    pub duration_days: u32,
    pub quantity: u32,
    #[serde(default)]
    pub instructions: Option<String>,
}

/// One requested advice line. At least one of the two fields must be set.
#[derive(Clone, Debug, Default, serde::Deserialize)]
pub struct AdviceLineRequest {
    #[serde(default)]
    pub advised_id: Option<AdviceId>,
    #[serde(default)]
    pub custom_advice: Option<String>,
}

/// An optional payment accompanying the consultation.
#[derive(Clone, Debug, serde::Deserialize)]
pub struct PaymentRequest {
    pub amount: Money,
    pub mode: PaymentMode,
    #[serde(default)]
    pub transaction_id: Option<String>,
}

/// An optional follow-up to schedule, expressed in days from today.
#[derive(Clone, Debug, serde::Deserialize)]
pub struct FollowUpRequest {
    pub days: u32,
    #[serde(default)]
    pub instructions: Option<String>,
}

/// The complete consultation-completion request.
#[derive(Clone, Debug, serde::Deserialize)]
pub struct ConsultationRequest {
    pub patient: PatientSelector,
    pub doctor_id: DoctorId,
    #[serde(default)]
    pub consultation_details: Option<ConsultationDetails>,
    #[serde(default)]
    pub medicines: Vec<MedicineLineRequest>,
    #[serde(default)]
    pub advice: Vec<AdviceLineRequest>,
    pub consultation_fee: Money,
    #[serde(default = "Percentage::zero")]
    pub discount_percentage: Percentage,
    #[serde(default = "Percentage::zero")]
    pub tax_percentage: Percentage,
    #[serde(default)]
    pub payment: Option<PaymentRequest>,
    #[serde(default)]
    pub follow_up: Option<FollowUpRequest>,
    #[serde(default)]
    pub allow_multiple_visits_per_day: bool,
    #[serde(default)]
    pub override_existing: bool,
}

impl ConsultationRequest {
    /// Checks the cross-field rules that the field types cannot carry.
    ///
    /// # Errors
    ///
    /// Returns `Validation` on the first violated rule.
    pub fn validate(&self) -> OpdResult<()> {
        self.patient.validate()?;

        for line in &self.medicines {
            if line.duration_days == 0 {
                return Err(OpdError::Validation(
                    "medicine duration must be at least one day".into(),
                ));
            }
            if line.quantity == 0 {
                return Err(OpdError::Validation(
                    "medicine quantity must be at least one".into(),
                ));
            }
        }

        for entry in &self.advice {
            let has_text = entry
                .custom_advice
                .as_deref()
                .is_some_and(|s| !s.trim().is_empty());
            if entry.advised_id.is_none() && !has_text {
                return Err(OpdError::Validation(
                    "an advice entry needs a predefined advice id or custom text".into(),
                ));
            }
        }

        if let Some(follow_up) = &self.follow_up {
            if follow_up.days == 0 {
                return Err(OpdError::Validation(
                    "follow-up must be at least one day ahead".into(),
                ));
            }
        }

        Ok(())
    }
}
