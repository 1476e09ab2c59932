//! Clinical mutation applier.
//!
//! Pure field-update contract over a visit: a field is written only when the
//! request actually carries a value for it. Absent or blank fields leave
//! prior values untouched — partial update, never overwrite-with-null.

use crate::entities::Visit;
use crate::workflow::request::{ConsultationDetails, FollowUpRequest};
use crate::OpdResult;
use chrono::{DateTime, Duration, Utc};

fn present(field: &Option<String>) -> Option<&str> {
    field.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

/// Applies the supplied clinical detail to the visit.
pub(super) fn apply(visit: &mut Visit, details: Option<&ConsultationDetails>) -> OpdResult<()> {
    let Some(details) = details else {
        return Ok(());
    };

    if let Some(text) = present(&details.chief_complaint) {
        visit.set_chief_complaint(text);
    }
    if let Some(text) = present(&details.history) {
        visit.set_history(text);
    }
    if let Some(vitals) = &details.vitals {
        if !vitals.is_empty() {
            visit.update_vitals(vitals)?;
        }
    }
    if let Some(text) = present(&details.examination) {
        visit.set_examination(text);
    }
    if let Some(text) = present(&details.diagnosis) {
        visit.set_diagnosis(text);
    }
    if let Some(text) = present(&details.treatment_plan) {
        visit.set_treatment_plan(text);
    }
    if let Some(text) = present(&details.notes) {
        visit.set_notes(text);
    }

    Ok(())
}

/// Schedules the requested follow-up, counted in days from now.
pub(super) fn apply_follow_up(
    visit: &mut Visit,
    follow_up: Option<&FollowUpRequest>,
    now: DateTime<Utc>,
) {
    if let Some(follow_up) = follow_up {
        let date = now + Duration::days(i64::from(follow_up.days));
        visit.schedule_follow_up(date, follow_up.instructions.clone());
    }
}
