//! The consolidated outcome returned to the caller.

use crate::entities::{Bill, Patient, Prescription, Visit};
use chrono::{DateTime, Utc};
use opd_types::{Money, VisitId};

/// Snapshot of everything a completed consultation produced or touched.
///
/// Returned only on success; a failed call never yields a partial result.
#[derive(Debug, serde::Serialize)]
pub struct ConsultationResult {
    /// The visit id doubles as the consultation id.
    pub consultation_id: VisitId,
    pub patient: Patient,
    pub visit: Visit,
    pub prescription: Option<Prescription>,
    pub bill: Bill,
    pub total_amount: Money,
    pub paid_amount: Money,
    pub due_amount: Money,
    pub is_fully_paid: bool,
    pub consultation_date: DateTime<Utc>,
    pub follow_up_date: Option<DateTime<Utc>>,
}

/// Assembles the result from the committed aggregates.
pub(super) fn assemble(
    patient: Patient,
    visit: Visit,
    prescription: Option<Prescription>,
    bill: Bill,
) -> ConsultationResult {
    ConsultationResult {
        consultation_id: visit.id(),
        total_amount: bill.total(),
        paid_amount: bill.paid(),
        due_amount: bill.due(),
        is_fully_paid: bill.is_fully_paid(),
        consultation_date: visit.visit_date(),
        follow_up_date: visit.follow_up_date(),
        patient,
        visit,
        prescription,
        bill,
    }
}
