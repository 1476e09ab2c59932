//! Advisory lock keyed by (patient, doctor, calendar day).
//!
//! Two concurrent completion calls for the same patient, doctor and day can
//! both pass the "no existing visit" resolution query before either commits,
//! producing two visits. Holding this lock from before resolution until
//! after commit closes that window at the application level. Different keys
//! never contend, so independent consultations proceed in parallel.

use chrono::NaiveDate;
use opd_types::{DoctorId, PatientId};
use std::collections::HashSet;
use std::sync::{Condvar, Mutex, PoisonError};

/// The same-day visit key.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct VisitKey {
    pub patient_id: PatientId,
    pub doctor_id: DoctorId,
    pub day: NaiveDate,
}

impl VisitKey {
    pub fn new(patient_id: PatientId, doctor_id: DoctorId, day: NaiveDate) -> Self {
        Self {
            patient_id,
            doctor_id,
            day,
        }
    }
}

/// A set of short-lived per-key mutual exclusions.
#[derive(Debug, Default)]
pub struct VisitKeyLock {
    held: Mutex<HashSet<VisitKey>>,
    released: Condvar,
}

impl VisitKeyLock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Blocks until `key` is free, then holds it until the returned guard is
    /// dropped.
    pub fn acquire(&self, key: VisitKey) -> VisitKeyGuard<'_> {
        let mut held = self.held.lock().unwrap_or_else(PoisonError::into_inner);
        while held.contains(&key) {
            held = self
                .released
                .wait(held)
                .unwrap_or_else(PoisonError::into_inner);
        }
        held.insert(key);
        VisitKeyGuard { lock: self, key }
    }
}

/// Releases its key on drop.
#[derive(Debug)]
pub struct VisitKeyGuard<'a> {
    lock: &'a VisitKeyLock,
    key: VisitKey,
}

impl Drop for VisitKeyGuard<'_> {
    fn drop(&mut self) {
        let mut held = self
            .lock
            .held
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        held.remove(&self.key);
        self.lock.released.notify_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use std::sync::Arc;

    #[test]
    fn same_key_is_mutually_exclusive() {
        let lock = Arc::new(VisitKeyLock::new());
        let key = VisitKey::new(PatientId::new(), DoctorId::new(), Utc::now().date_naive());
        let counter = Arc::new(Mutex::new(0u32));
        let peak = Arc::new(Mutex::new(0u32));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let lock = Arc::clone(&lock);
                let counter = Arc::clone(&counter);
                let peak = Arc::clone(&peak);
                std::thread::spawn(move || {
                    let _guard = lock.acquire(key);
                    {
                        let mut active = counter.lock().unwrap();
                        *active += 1;
                        let mut peak = peak.lock().unwrap();
                        *peak = (*peak).max(*active);
                    }
                    std::thread::sleep(std::time::Duration::from_millis(2));
                    *counter.lock().unwrap() -= 1;
                })
            })
            .collect();

        for handle in handles {
            handle.join().expect("thread should finish");
        }

        assert_eq!(*peak.lock().unwrap(), 1, "at most one holder per key");
    }

    #[test]
    fn different_keys_do_not_contend() {
        let lock = VisitKeyLock::new();
        let day = Utc::now().date_naive();
        let first = lock.acquire(VisitKey::new(PatientId::new(), DoctorId::new(), day));
        // Acquiring an unrelated key while `first` is held must not block.
        let second = lock.acquire(VisitKey::new(PatientId::new(), DoctorId::new(), day));
        drop(first);
        drop(second);
    }
}
