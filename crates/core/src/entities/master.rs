//! Master-data lookup records.
//!
//! These tables (doctors, formulary medicines, dose patterns, predefined
//! advice) are managed elsewhere; the workflow only resolves references
//! against them. They deserialize directly from the seed file.

use opd_types::{AdviceId, DoctorId, DoseId, MedicineId};

/// A doctor who can hold consultations.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct Doctor {
    pub id: DoctorId,
    pub name: String,
    #[serde(default)]
    pub specialty: Option<String>,
}

/// A medicine in the formulary.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct Medicine {
    pub id: MedicineId,
    pub name: String,
    #[serde(default)]
    pub strength: Option<String>,
}

/// A dose pattern (e.g. "1-0-1 after food").
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct Dose {
    pub id: DoseId,
    pub label: String,
}

/// A predefined advice item.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct AdviceItem {
    pub id: AdviceId,
    pub text: String,
}
