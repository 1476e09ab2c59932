//! Master-data seeding.
//!
//! The workflow resolves doctor, medicine, dose and advice references against
//! master tables it does not manage. `SeedData` loads those tables from a
//! JSON document, typically once at startup.

use crate::entities::{AdviceItem, Doctor, Dose, Medicine};
use crate::store::EncounterStore;
use crate::{OpdError, OpdResult};

/// Master data loaded from a seed file.
#[derive(Debug, Default, serde::Deserialize)]
pub struct SeedData {
    #[serde(default)]
    pub doctors: Vec<Doctor>,
    #[serde(default)]
    pub medicines: Vec<Medicine>,
    #[serde(default)]
    pub doses: Vec<Dose>,
    #[serde(default)]
    pub advice_items: Vec<AdviceItem>,
}

impl SeedData {
    /// Parses a seed document from JSON.
    ///
    /// # Errors
    ///
    /// Returns `Validation` when the document does not parse.
    pub fn from_json(input: &str) -> OpdResult<Self> {
        serde_json::from_str(input)
            .map_err(|e| OpdError::Validation(format!("seed data does not parse: {e}")))
    }

    /// Inserts all records into the store in one transaction.
    pub fn apply<S: EncounterStore>(&self, store: &S) -> OpdResult<()> {
        store.run_in_transaction(|tx| {
            for doctor in &self.doctors {
                tx.insert_doctor(doctor.clone());
            }
            for medicine in &self.medicines {
                tx.insert_medicine(medicine.clone());
            }
            for dose in &self.doses {
                tx.insert_dose(dose.clone());
            }
            for advice in &self.advice_items {
                tx.insert_advice_item(advice.clone());
            }
            Ok(())
        })?;

        tracing::info!(
            doctors = self.doctors.len(),
            medicines = self.medicines.len(),
            doses = self.doses.len(),
            advice_items = self.advice_items.len(),
            "seeded master data"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::MemoryStore;

    #[test]
    fn seed_document_parses_and_applies() {
        let json = r#"{
            "doctors": [
                {"id": "7b3e1f9a-2c4d-4e6f-8a1b-3c5d7e9f0a2b", "name": "Dr Mensah", "specialty": "General Medicine"}
            ],
            "medicines": [
                {"id": "1a2b3c4d-5e6f-4a8b-9c0d-1e2f3a4b5c6d", "name": "Amoxicillin", "strength": "500mg"}
            ],
            "doses": [
                {"id": "9f8e7d6c-5b4a-4f2e-8d0c-b9a8f7e6d5c4", "label": "1-0-1 after food"}
            ],
            "advice_items": [
                {"id": "0a1b2c3d-4e5f-4a7b-8c9d-0e1f2a3b4c5d", "text": "Drink plenty of fluids"}
            ]
        }"#;

        let seed = SeedData::from_json(json).expect("document should parse");
        let store = MemoryStore::new();
        seed.apply(&store).expect("seeding should commit");

        assert_eq!(store.doctor_count(), 1);
        assert_eq!(store.medicine_count(), 1);
    }

    #[test]
    fn missing_sections_default_to_empty() {
        let seed = SeedData::from_json("{}").expect("empty document should parse");
        assert!(seed.doctors.is_empty());
        assert!(seed.advice_items.is_empty());
    }

    #[test]
    fn malformed_documents_are_a_validation_error() {
        let err = SeedData::from_json("not json").expect_err("garbage should fail");
        assert!(matches!(err, OpdError::Validation(_)));
    }
}
