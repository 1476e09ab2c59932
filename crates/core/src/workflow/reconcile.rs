//! Aggregate reconciliation: reuse-or-create decisions for each aggregate
//! touched by a consultation.
//!
//! All resolution runs inside the caller's transaction, against current
//! store state, so a retried workflow body re-resolves everything and
//! find-or-create stays idempotent.

use crate::entities::{AdviceLine, Bill, MedicineLine, Patient, Prescription, Visit};
use crate::store::StoreTx;
use crate::workflow::request::{ConsultationRequest, PatientSelector};
use crate::{OpdError, OpdResult};
use chrono::{DateTime, Utc};
use opd_types::{DoctorId, PatientId};

/// Resolves the patient: stages a new one or fetches the referenced one.
pub(super) fn resolve_patient(
    tx: &mut dyn StoreTx,
    selector: &PatientSelector,
    now: DateTime<Utc>,
) -> OpdResult<Patient> {
    if let Some(payload) = &selector.new_patient {
        let patient = Patient::register(
            payload.name.clone(),
            payload.title.clone(),
            payload.gender,
            payload.mobile.clone(),
            payload.date_of_birth,
            now,
        );
        tracing::debug!(patient_id = %patient.id(), "registering new patient");
        tx.insert_patient(patient.clone());
        return Ok(patient);
    }

    // validate() guarantees exactly one selector variant is present.
    let id = selector
        .existing_patient_id
        .ok_or_else(|| OpdError::Validation("patient selector is empty".into()))?;
    tx.patient(id).ok_or_else(|| OpdError::not_found("patient", id))
}

/// Resolves today's visit for `(patient, doctor)`: reuses the open one
/// unless the caller opted into multiple visits per day, in which case a new
/// visit is created and moved straight into consultation.
pub(super) fn resolve_visit(
    tx: &mut dyn StoreTx,
    patient_id: PatientId,
    doctor_id: DoctorId,
    allow_multiple_per_day: bool,
    now: DateTime<Utc>,
) -> OpdResult<Visit> {
    if !allow_multiple_per_day {
        if let Some(existing) = tx.find_open_visit(patient_id, doctor_id, now.date_naive()) {
            tracing::debug!(visit_id = %existing.id(), "reusing existing visit");
            return Ok(existing);
        }
    }

    let mut visit = Visit::check_in(patient_id, doctor_id, now);
    visit.start_consultation()?;
    tracing::debug!(visit_id = %visit.id(), "created new visit");
    tx.insert_visit(visit.clone());
    Ok(visit)
}

/// Resolves the visit's prescription.
///
/// Created lazily: a visit with no medicines, advice or diagnosis in the
/// request (and no previously created prescription) stays without one.
/// `override_existing` clears the lines of an existing prescription before
/// re-populating; otherwise new lines are appended. Every line — including
/// re-added ones — is validated against the formulary.
pub(super) fn resolve_prescription(
    tx: &mut dyn StoreTx,
    visit: &mut Visit,
    request: &ConsultationRequest,
    now: DateTime<Utc>,
) -> OpdResult<Option<Prescription>> {
    let diagnosis = request
        .consultation_details
        .as_ref()
        .and_then(|d| d.diagnosis.as_deref())
        .map(str::trim)
        .filter(|s| !s.is_empty());

    let has_content =
        !request.medicines.is_empty() || !request.advice.is_empty() || diagnosis.is_some();

    let mut prescription = match tx.prescription_for_visit(visit.id()) {
        Some(mut existing) => {
            if request.override_existing {
                tracing::debug!(prescription_id = %existing.id(), "clearing prescription lines for re-population");
                existing.clear_lines();
            }
            existing
        }
        None if has_content => {
            let fresh = Prescription::open(visit.id(), now);
            tracing::debug!(prescription_id = %fresh.id(), "created new prescription");
            // Set-once link: a no-op if some earlier flow already linked one.
            visit.link_prescription(fresh.id());
            tx.insert_prescription(fresh.clone());
            fresh
        }
        None => return Ok(None),
    };

    append_lines(tx, &mut prescription, request)?;
    if let Some(text) = diagnosis {
        prescription.set_diagnosis(text);
    }

    Ok(Some(prescription))
}

fn append_lines(
    tx: &dyn StoreTx,
    prescription: &mut Prescription,
    request: &ConsultationRequest,
) -> OpdResult<()> {
    for line in &request.medicines {
        if !tx.medicine_exists(line.medicine_id) {
            return Err(OpdError::not_found("medicine", line.medicine_id));
        }
        if !tx.dose_exists(line.dose_id) {
            return Err(OpdError::not_found("dose", line.dose_id));
        }
        prescription.add_medicine(MedicineLine::new(
            line.medicine_id,
            line.dose_id,
            line.duration_days,
            line.quantity,
            line.instructions.clone(),
        )?);
    }

    for entry in &request.advice {
        if let Some(id) = entry.advised_id {
            if !tx.advice_exists(id) {
                return Err(OpdError::not_found("advice item", id));
            }
        }
        prescription.add_advice(AdviceLine::new(entry.advised_id, entry.custom_advice.clone())?);
    }

    Ok(())
}

/// Resolves the visit's bill: reuses the existing one (updating discount and
/// tax) or creates one with the supplied consultation fee.
pub(super) fn resolve_bill(
    tx: &mut dyn StoreTx,
    visit: &mut Visit,
    request: &ConsultationRequest,
    now: DateTime<Utc>,
) -> OpdResult<Bill> {
    let mut bill = match tx.bill_for_visit(visit.id()) {
        Some(existing) => {
            tracing::debug!(bill_id = %existing.id(), "reusing existing bill");
            existing
        }
        None => {
            let fresh = Bill::open(visit.id(), request.consultation_fee, now);
            tracing::debug!(bill_id = %fresh.id(), "created new bill");
            visit.link_bill(fresh.id());
            tx.insert_bill(fresh.clone());
            fresh
        }
    };

    bill.apply_discount(request.discount_percentage)?;
    bill.apply_tax(request.tax_percentage)?;
    Ok(bill)
}
