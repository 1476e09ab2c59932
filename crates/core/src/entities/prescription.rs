//! The Prescription aggregate: the clinical order document of a visit.
//!
//! Exactly one prescription exists per visit, created lazily the first time
//! medicines or advice are recorded. Lines are appended across calls until
//! the visit completes; a caller may explicitly clear and re-populate the
//! lines instead of appending.

use crate::{OpdError, OpdResult};
use chrono::{DateTime, Utc};
use opd_types::{AdviceId, DoseId, MedicineId, PrescriptionId, VisitId};

/// One prescribed medicine.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct MedicineLine {
    pub medicine_id: MedicineId,
    pub dose_id: DoseId,
    pub duration_days: u32,
    pub quantity: u32,
    pub instructions: Option<String>,
}

impl MedicineLine {
    /// Builds a medicine line, validating its argument ranges.
    ///
    /// # Errors
    ///
    /// Returns `Validation` if duration or quantity is zero.
    pub fn new(
        medicine_id: MedicineId,
        dose_id: DoseId,
        duration_days: u32,
        quantity: u32,
        instructions: Option<String>,
    ) -> OpdResult<Self> {
        if duration_days == 0 {
            return Err(OpdError::Validation(
                "medicine duration must be at least one day".into(),
            ));
        }
        if quantity == 0 {
            return Err(OpdError::Validation(
                "medicine quantity must be at least one".into(),
            ));
        }
        Ok(Self {
            medicine_id,
            dose_id,
            duration_days,
            quantity,
            instructions: instructions.filter(|s| !s.is_empty()),
        })
    }
}

/// One advice line: a reference to a predefined advice item, free text, or
/// both.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct AdviceLine {
    pub advised_id: Option<AdviceId>,
    pub custom_advice: Option<String>,
}

impl AdviceLine {
    /// Builds an advice line.
    ///
    /// # Errors
    ///
    /// Returns `Validation` when neither a predefined advice id nor custom
    /// text is supplied.
    pub fn new(advised_id: Option<AdviceId>, custom_advice: Option<String>) -> OpdResult<Self> {
        let custom_advice = custom_advice.filter(|s| !s.trim().is_empty());
        if advised_id.is_none() && custom_advice.is_none() {
            return Err(OpdError::Validation(
                "an advice entry needs a predefined advice id or custom text".into(),
            ));
        }
        Ok(Self {
            advised_id,
            custom_advice,
        })
    }
}

/// The clinical order document tied to exactly one visit.
#[derive(Clone, Debug, serde::Serialize)]
pub struct Prescription {
    id: PrescriptionId,
    visit_id: VisitId,
    diagnosis: Option<String>,
    instructions: Option<String>,
    medicines: Vec<MedicineLine>,
    advice: Vec<AdviceLine>,
    created_at: DateTime<Utc>,
}

impl Prescription {
    /// Opens a new, empty prescription for a visit.
    pub fn open(visit_id: VisitId, created_at: DateTime<Utc>) -> Self {
        Self {
            id: PrescriptionId::new(),
            visit_id,
            diagnosis: None,
            instructions: None,
            medicines: Vec::new(),
            advice: Vec::new(),
            created_at,
        }
    }

    pub fn id(&self) -> PrescriptionId {
        self.id
    }

    pub fn visit_id(&self) -> VisitId {
        self.visit_id
    }

    pub fn diagnosis(&self) -> Option<&str> {
        self.diagnosis.as_deref()
    }

    pub fn instructions(&self) -> Option<&str> {
        self.instructions.as_deref()
    }

    pub fn medicines(&self) -> &[MedicineLine] {
        &self.medicines
    }

    pub fn advice(&self) -> &[AdviceLine] {
        &self.advice
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn set_diagnosis(&mut self, text: impl Into<String>) {
        self.diagnosis = Some(text.into());
    }

    pub fn set_instructions(&mut self, text: impl Into<String>) {
        self.instructions = Some(text.into());
    }

    /// Appends a medicine line.
    pub fn add_medicine(&mut self, line: MedicineLine) {
        self.medicines.push(line);
    }

    /// Appends an advice line.
    pub fn add_advice(&mut self, line: AdviceLine) {
        self.advice.push(line);
    }

    /// Removes all medicine and advice lines and the recorded diagnosis so
    /// the prescription can be re-populated from scratch.
    pub fn clear_lines(&mut self) {
        self.medicines.clear();
        self.advice.clear();
        self.diagnosis = None;
        self.instructions = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn medicine_line_rejects_zero_ranges() {
        let err = MedicineLine::new(MedicineId::new(), DoseId::new(), 0, 10, None)
            .expect_err("zero duration should fail");
        assert!(matches!(err, OpdError::Validation(_)));

        let err = MedicineLine::new(MedicineId::new(), DoseId::new(), 5, 0, None)
            .expect_err("zero quantity should fail");
        assert!(matches!(err, OpdError::Validation(_)));
    }

    #[test]
    fn advice_line_requires_some_content() {
        let err = AdviceLine::new(None, Some("   ".into()))
            .expect_err("blank advice without an id should fail");
        assert!(matches!(err, OpdError::Validation(_)));

        AdviceLine::new(Some(AdviceId::new()), None).expect("id alone should suffice");
        AdviceLine::new(None, Some("plenty of fluids".into())).expect("text alone should suffice");
    }

    #[test]
    fn clear_lines_resets_the_clinical_content() {
        let mut prescription = Prescription::open(VisitId::new(), Utc::now());
        prescription.set_diagnosis("acute bronchitis");
        prescription.add_medicine(
            MedicineLine::new(MedicineId::new(), DoseId::new(), 5, 10, None)
                .expect("valid line"),
        );
        prescription
            .add_advice(AdviceLine::new(None, Some("rest".into())).expect("valid advice"));

        prescription.clear_lines();

        assert!(prescription.medicines().is_empty());
        assert!(prescription.advice().is_empty());
        assert!(prescription.diagnosis().is_none());
    }
}
