//! Patient identity and demographics.
//!
//! A patient row is immutable identity-wise once created: the id never
//! changes. Contact details (name, mobile) may be edited afterwards.

use chrono::{DateTime, NaiveDate, Utc};
use opd_types::{NonEmptyText, PatientId};

/// Patient gender as recorded at registration.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Gender {
    Male,
    Female,
    Other,
}

/// A registered patient.
#[derive(Clone, Debug, serde::Serialize)]
pub struct Patient {
    id: PatientId,
    name: NonEmptyText,
    title: Option<String>,
    gender: Gender,
    mobile: NonEmptyText,
    date_of_birth: Option<NaiveDate>,
    registered_at: DateTime<Utc>,
}

impl Patient {
    /// Registers a new patient with a fresh identifier.
    pub fn register(
        name: NonEmptyText,
        title: Option<String>,
        gender: Gender,
        mobile: NonEmptyText,
        date_of_birth: Option<NaiveDate>,
        registered_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: PatientId::new(),
            name,
            title,
            gender,
            mobile,
            date_of_birth,
            registered_at,
        }
    }

    pub fn id(&self) -> PatientId {
        self.id
    }

    pub fn name(&self) -> &NonEmptyText {
        &self.name
    }

    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    pub fn gender(&self) -> Gender {
        self.gender
    }

    pub fn mobile(&self) -> &NonEmptyText {
        &self.mobile
    }

    pub fn date_of_birth(&self) -> Option<NaiveDate> {
        self.date_of_birth
    }

    pub fn registered_at(&self) -> DateTime<Utc> {
        self.registered_at
    }

    /// Updates editable contact details. The id never changes.
    pub fn update_contact(&mut self, name: NonEmptyText, mobile: NonEmptyText) {
        self.name = name;
        self.mobile = mobile;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_patient() -> Patient {
        Patient::register(
            NonEmptyText::new("Aisha Khan").unwrap(),
            Some("Ms".into()),
            Gender::Female,
            NonEmptyText::new("+44 7700 900123").unwrap(),
            NaiveDate::from_ymd_opt(1988, 4, 2),
            Utc::now(),
        )
    }

    #[test]
    fn registration_allocates_a_fresh_id() {
        let first = sample_patient();
        let second = sample_patient();
        assert_ne!(first.id(), second.id());
    }

    #[test]
    fn update_contact_keeps_the_id() {
        let mut patient = sample_patient();
        let original_id = patient.id();

        patient.update_contact(
            NonEmptyText::new("Aisha Begum").unwrap(),
            NonEmptyText::new("+44 7700 900999").unwrap(),
        );

        assert_eq!(patient.id(), original_id);
        assert_eq!(patient.name().as_str(), "Aisha Begum");
        assert_eq!(patient.mobile().as_str(), "+44 7700 900999");
    }
}
